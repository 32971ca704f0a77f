use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::metrics::{numeric_value, percent_value, EngagementSample};

/// A loosely typed source cell. Spreadsheet exports encode numbers as
/// decorated strings, booleans as `"True"`, and lists as Python literals, so
/// every field is kept in this shape and parsed on access.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum LooseValue {
    Null,
    Flag(bool),
    Number(f64),
    Text(String),
}

impl From<Value> for LooseValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => LooseValue::Null,
            Value::Bool(flag) => LooseValue::Flag(flag),
            Value::Number(number) => number
                .as_f64()
                .map(LooseValue::Number)
                .unwrap_or(LooseValue::Null),
            Value::String(text) => LooseValue::Text(text),
            other => LooseValue::Text(other.to_string()),
        }
    }
}

impl From<LooseValue> for Value {
    fn from(value: LooseValue) -> Self {
        match value {
            LooseValue::Null => Value::Null,
            LooseValue::Flag(flag) => Value::Bool(flag),
            LooseValue::Number(number) => serde_json::Number::from_f64(number)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            LooseValue::Text(text) => Value::String(text),
        }
    }
}

impl From<&str> for LooseValue {
    fn from(value: &str) -> Self {
        LooseValue::Text(value.to_string())
    }
}

impl From<f64> for LooseValue {
    fn from(value: f64) -> Self {
        LooseValue::Number(value)
    }
}

impl From<bool> for LooseValue {
    fn from(value: bool) -> Self {
        LooseValue::Flag(value)
    }
}

impl LooseValue {
    /// Text content, with empty strings and the literal `"null"` treated as absent.
    pub fn as_text(&self) -> Option<String> {
        match self {
            LooseValue::Text(text) => {
                let trimmed = text.trim();
                if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("null") {
                    None
                } else {
                    Some(trimmed.to_string())
                }
            }
            LooseValue::Number(number) => Some(format_plain_number(*number)),
            LooseValue::Flag(_) | LooseValue::Null => None,
        }
    }

    pub fn is_true(&self) -> bool {
        match self {
            LooseValue::Flag(flag) => *flag,
            LooseValue::Text(text) => text.trim().eq_ignore_ascii_case("true"),
            LooseValue::Number(_) | LooseValue::Null => false,
        }
    }

    /// Items of a Python-style list literal such as `"['joy', 'comfort']"`.
    pub fn as_list(&self) -> Vec<String> {
        let Some(text) = self.as_text() else {
            return Vec::new();
        };
        text.chars()
            .filter(|c| !matches!(c, '[' | ']' | '\'' | '"'))
            .collect::<String>()
            .split(',')
            .map(|item| item.trim().to_string())
            .filter(|item| !item.is_empty() && !item.eq_ignore_ascii_case("null"))
            .collect()
    }
}

fn format_plain_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

fn text_of(field: &Option<LooseValue>) -> Option<String> {
    field.as_ref().and_then(LooseValue::as_text)
}

fn number_of(field: &Option<LooseValue>) -> f64 {
    numeric_value(field.as_ref())
}

fn percent_of(field: &Option<LooseValue>) -> f64 {
    percent_value(field.as_ref())
}

/// One organic post from the content-analysis export.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPost {
    #[serde(rename = "video_id", default)]
    pub video_id: Option<LooseValue>,
    #[serde(rename = "InfluencerID", default)]
    pub influencer_id: Option<LooseValue>,
    #[serde(rename = "date", default)]
    pub date: Option<LooseValue>,
    #[serde(rename = "Platform & post metadata_views", default)]
    pub views: Option<LooseValue>,
    #[serde(rename = "Platform & post metadata_likes", default)]
    pub likes: Option<LooseValue>,
    #[serde(rename = "Platform & post metadata_comments", default)]
    pub comments: Option<LooseValue>,
    #[serde(rename = "Platform & post metadata_shares", default)]
    pub shares: Option<LooseValue>,
    #[serde(rename = "Platform & post metadata_engagement_rate", default)]
    pub engagement_rate: Option<LooseValue>,
    #[serde(rename = "Temporal dynamics_duration_seconds", default)]
    pub duration_seconds: Option<LooseValue>,
    /// Every remaining column (content-analysis attributes, URLs, ratios).
    #[serde(flatten)]
    pub attributes: BTreeMap<String, LooseValue>,
}

impl RawPost {
    pub fn influencer_id(&self) -> String {
        text_of(&self.influencer_id).unwrap_or_default()
    }

    pub fn video_id(&self) -> Option<String> {
        text_of(&self.video_id)
    }

    pub fn date(&self) -> Option<String> {
        text_of(&self.date)
    }

    pub fn views(&self) -> f64 {
        number_of(&self.views)
    }

    pub fn likes(&self) -> f64 {
        number_of(&self.likes)
    }

    pub fn comments(&self) -> f64 {
        number_of(&self.comments)
    }

    pub fn shares(&self) -> f64 {
        number_of(&self.shares)
    }

    /// Engagement rate as exported: a fraction, not a percentage.
    pub fn engagement_fraction(&self) -> f64 {
        percent_of(&self.engagement_rate)
    }

    pub fn duration_seconds(&self) -> f64 {
        number_of(&self.duration_seconds)
    }

    pub fn attribute(&self, key: &str) -> Option<&LooseValue> {
        self.attributes.get(key)
    }

    pub fn attribute_text(&self, key: &str) -> Option<String> {
        self.attribute(key).and_then(LooseValue::as_text)
    }

    pub fn attribute_number(&self, key: &str) -> f64 {
        numeric_value(self.attribute(key))
    }

    pub fn attribute_flag(&self, key: &str) -> bool {
        self.attribute(key).map(LooseValue::is_true).unwrap_or(false)
    }

    pub fn attribute_list(&self, key: &str) -> Vec<String> {
        self.attribute(key).map(LooseValue::as_list).unwrap_or_default()
    }
}

impl EngagementSample for RawPost {
    fn views(&self) -> f64 {
        RawPost::views(self)
    }

    fn likes(&self) -> f64 {
        RawPost::likes(self)
    }

    fn comments(&self) -> f64 {
        RawPost::comments(self)
    }

    fn shares(&self) -> f64 {
        RawPost::shares(self)
    }
}

/// One sponsored post row from the campaign tracker.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawCampaignRecord {
    #[serde(rename = "HANDLE", default)]
    pub handle: Option<LooseValue>,
    #[serde(rename = "CAMPAIGN", default)]
    pub campaign: Option<LooseValue>,
    #[serde(rename = "CAMPAIGN POST NUMBER", default)]
    pub post_number: Option<LooseValue>,
    #[serde(rename = "POST DATE", default)]
    pub post_date: Option<LooseValue>,
    #[serde(rename = "PLATFORM", default)]
    pub platform: Option<LooseValue>,
    #[serde(rename = "CONTENT TYPE", default)]
    pub content_type: Option<LooseValue>,
    #[serde(rename = "PET PARENT NAME", default)]
    pub pet_parent_name: Option<LooseValue>,
    #[serde(rename = "PET NAME", default)]
    pub pet_name: Option<LooseValue>,
    #[serde(rename = "FOLLOWER COUNT", default)]
    pub follower_count: Option<LooseValue>,
    #[serde(rename = "TIER", default)]
    pub tier: Option<LooseValue>,
    #[serde(rename = "CATEGORY", default)]
    pub category: Option<LooseValue>,
    #[serde(rename = "PARTNER TYPE", default)]
    pub partner_type: Option<LooseValue>,
    #[serde(rename = "CITY", default)]
    pub city: Option<LooseValue>,
    #[serde(rename = "STATE", default)]
    pub state: Option<LooseValue>,
    #[serde(rename = "RATE", default)]
    pub rate: Option<LooseValue>,
    #[serde(rename = "TOTAL IMPRESSIONS", default)]
    pub impressions: Option<LooseValue>,
    #[serde(rename = "ACCOUNTS REACHED", default)]
    pub reach: Option<LooseValue>,
    #[serde(rename = "TOTAL ENGAGEMENTS", default)]
    pub engagements: Option<LooseValue>,
    #[serde(rename = "TOTAL LIKES ", alias = "TOTAL LIKES", default)]
    pub likes: Option<LooseValue>,
    #[serde(rename = "TOTAL COMMENTS ", alias = "TOTAL COMMENTS", default)]
    pub comments: Option<LooseValue>,
    #[serde(rename = "TOTAL SHARES ", alias = "TOTAL SHARES", default)]
    pub shares: Option<LooseValue>,
    #[serde(rename = "TOTAL SAVES ", alias = "TOTAL SAVES", default)]
    pub saves: Option<LooseValue>,
    #[serde(rename = "TOTAL CLICKS ", alias = "TOTAL CLICKS", default)]
    pub clicks: Option<LooseValue>,
    #[serde(rename = "TOTAL REVENUE", default)]
    pub revenue: Option<LooseValue>,
    #[serde(rename = "TOTAL CONVERSIONS", default)]
    pub conversions: Option<LooseValue>,
    #[serde(rename = "CPM", default)]
    pub cpm: Option<LooseValue>,
    #[serde(rename = "CPE ", alias = "CPE", default)]
    pub cpe: Option<LooseValue>,
    #[serde(rename = "CPA", default)]
    pub cpa: Option<LooseValue>,
    #[serde(rename = "ROAS ($)", alias = "ROAS", default)]
    pub roas: Option<LooseValue>,
    #[serde(rename = "ER", default)]
    pub engagement_rate: Option<LooseValue>,
}

impl RawCampaignRecord {
    pub fn handle(&self) -> String {
        text_of(&self.handle).unwrap_or_default()
    }

    pub fn campaign(&self) -> String {
        text_of(&self.campaign).unwrap_or_default()
    }

    pub fn post_number(&self) -> Option<String> {
        text_of(&self.post_number)
    }

    pub fn post_date(&self) -> String {
        text_of(&self.post_date).unwrap_or_default()
    }

    pub fn platform(&self) -> Option<String> {
        text_of(&self.platform).map(|platform| platform.to_lowercase())
    }

    pub fn content_type(&self) -> String {
        text_of(&self.content_type).unwrap_or_default()
    }

    pub fn pet_parent_name(&self) -> Option<String> {
        text_of(&self.pet_parent_name)
    }

    pub fn pet_name(&self) -> Option<String> {
        text_of(&self.pet_name)
    }

    pub fn follower_count(&self) -> f64 {
        number_of(&self.follower_count)
    }

    pub fn tier(&self) -> Option<String> {
        text_of(&self.tier)
    }

    pub fn category(&self) -> Option<String> {
        text_of(&self.category)
    }

    pub fn partner_type(&self) -> Option<String> {
        text_of(&self.partner_type)
    }

    pub fn city(&self) -> Option<String> {
        text_of(&self.city)
    }

    pub fn state(&self) -> Option<String> {
        text_of(&self.state)
    }

    pub fn rate(&self) -> f64 {
        number_of(&self.rate)
    }

    pub fn impressions(&self) -> f64 {
        number_of(&self.impressions)
    }

    pub fn reach(&self) -> f64 {
        number_of(&self.reach)
    }

    pub fn engagements(&self) -> f64 {
        number_of(&self.engagements)
    }

    pub fn likes(&self) -> f64 {
        number_of(&self.likes)
    }

    pub fn comments(&self) -> f64 {
        number_of(&self.comments)
    }

    pub fn shares(&self) -> f64 {
        number_of(&self.shares)
    }

    pub fn saves(&self) -> f64 {
        number_of(&self.saves)
    }

    pub fn clicks(&self) -> f64 {
        number_of(&self.clicks)
    }

    pub fn revenue(&self) -> f64 {
        number_of(&self.revenue)
    }

    pub fn conversions(&self) -> f64 {
        number_of(&self.conversions)
    }

    pub fn cpm(&self) -> f64 {
        number_of(&self.cpm)
    }

    pub fn cpe(&self) -> f64 {
        number_of(&self.cpe)
    }

    pub fn cpa(&self) -> f64 {
        number_of(&self.cpa)
    }

    pub fn roas(&self) -> f64 {
        number_of(&self.roas)
    }

    /// Engagement rate as a percentage (`"4.99%"` -> 4.99).
    pub fn engagement_rate(&self) -> f64 {
        percent_of(&self.engagement_rate)
    }
}

/// Precomputed per-influencer financial roll-up.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialSummary {
    #[serde(default)]
    pub rate: Option<LooseValue>,
    #[serde(default, alias = "total_views")]
    pub views: Option<LooseValue>,
    #[serde(default)]
    pub engagement_rate: Option<LooseValue>,
    #[serde(default, alias = "average_roas")]
    pub avg_roas: Option<LooseValue>,
    #[serde(default, alias = "average_aov")]
    pub avg_aov: Option<LooseValue>,
    #[serde(default, alias = "average_cpe")]
    pub avg_cpe: Option<LooseValue>,
    #[serde(default, alias = "average_cpv")]
    pub avg_cpv: Option<LooseValue>,
}

impl FinancialSummary {
    pub fn rate(&self) -> f64 {
        number_of(&self.rate)
    }

    pub fn views(&self) -> f64 {
        number_of(&self.views)
    }

    pub fn engagement_rate(&self) -> f64 {
        percent_of(&self.engagement_rate)
    }

    pub fn avg_roas(&self) -> f64 {
        number_of(&self.avg_roas)
    }

    pub fn avg_aov(&self) -> f64 {
        number_of(&self.avg_aov)
    }

    pub fn avg_cpe(&self) -> f64 {
        number_of(&self.avg_cpe)
    }

    pub fn avg_cpv(&self) -> f64 {
        number_of(&self.avg_cpv)
    }
}

/// One row of the predictive-rankings export: two models' forecasts for
/// engagement rate and views.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PredictionRecord {
    #[serde(default)]
    pub influencer: Option<LooseValue>,
    #[serde(default)]
    pub current_engagement_rate: Option<LooseValue>,
    #[serde(default)]
    pub current_views: Option<LooseValue>,
    #[serde(default)]
    pub er_lgbm_prediction: Option<LooseValue>,
    #[serde(default)]
    pub er_rf_prediction: Option<LooseValue>,
    #[serde(default)]
    pub views_lgbm_prediction: Option<LooseValue>,
    #[serde(default)]
    pub views_rf_prediction: Option<LooseValue>,
    #[serde(default)]
    pub er_lgbm_percentile: Option<LooseValue>,
    #[serde(default)]
    pub er_rf_percentile: Option<LooseValue>,
    #[serde(default)]
    pub views_lgbm_percentile: Option<LooseValue>,
    #[serde(default)]
    pub views_rf_percentile: Option<LooseValue>,
    #[serde(default)]
    pub er_direction_agreement: Option<LooseValue>,
    #[serde(default)]
    pub views_direction_agreement: Option<LooseValue>,
}

impl PredictionRecord {
    pub fn influencer(&self) -> String {
        text_of(&self.influencer).unwrap_or_default()
    }

    pub fn current_engagement_rate(&self) -> f64 {
        number_of(&self.current_engagement_rate)
    }

    pub fn current_views(&self) -> f64 {
        number_of(&self.current_views)
    }

    pub fn er_lgbm_prediction(&self) -> f64 {
        number_of(&self.er_lgbm_prediction)
    }

    pub fn er_rf_prediction(&self) -> f64 {
        number_of(&self.er_rf_prediction)
    }

    pub fn views_lgbm_prediction(&self) -> f64 {
        number_of(&self.views_lgbm_prediction)
    }

    pub fn views_rf_prediction(&self) -> f64 {
        number_of(&self.views_rf_prediction)
    }

    pub fn percentile_labels(&self) -> [String; 4] {
        [
            text_of(&self.er_lgbm_percentile).unwrap_or_default(),
            text_of(&self.er_rf_percentile).unwrap_or_default(),
            text_of(&self.views_lgbm_percentile).unwrap_or_default(),
            text_of(&self.views_rf_percentile).unwrap_or_default(),
        ]
    }

    pub fn engagement_agreement(&self) -> bool {
        self.er_direction_agreement
            .as_ref()
            .map(LooseValue::is_true)
            .unwrap_or(false)
    }

    pub fn views_agreement(&self) -> bool {
        self.views_direction_agreement
            .as_ref()
            .map(LooseValue::is_true)
            .unwrap_or(false)
    }
}
