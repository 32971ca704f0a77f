pub mod analytics;
pub mod config;
pub mod content;
pub mod error;
pub mod identity;
pub mod metrics;
pub mod pipeline;
pub mod predictions;
pub mod ranking;
pub mod sources;

use serde::{Deserialize, Serialize};

use crate::metrics::EngagementSample;
use crate::predictions::{ConfidenceTier, PredictionSummary};
use crate::sources::RawCampaignRecord;

pub use crate::pipeline::{assemble, Dashboard, Pipeline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Up,
    Down,
}

impl TrendDirection {
    pub fn from_delta(delta: f64) -> Self {
        if delta >= 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TrendDirection::Up => "up",
            TrendDirection::Down => "down",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RankCategory {
    TopPerformer,
    HighestPotential,
    FastestGrowing,
}

impl RankCategory {
    pub fn classify(tier: Option<&str>, engagement_rate: f64) -> Self {
        if tier.map(|tier| tier.contains("250K+")).unwrap_or(false) {
            RankCategory::TopPerformer
        } else if engagement_rate > 5.0 {
            RankCategory::HighestPotential
        } else {
            RankCategory::FastestGrowing
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RankCategory::TopPerformer => "Top Performer",
            RankCategory::HighestPotential => "Highest Potential",
            RankCategory::FastestGrowing => "Fastest Growing",
        }
    }
}

/// A sponsored post from the campaign tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub campaign: String,
    pub post_date: String,
    pub platform: String,
    pub content_type: String,
    pub impressions: f64,
    pub reach: f64,
    pub engagements: f64,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub saves: f64,
    pub clicks: f64,
    pub revenue: f64,
    pub conversions: f64,
    pub rate: f64,
    pub cpm: f64,
    pub cpe: f64,
    pub cpa: f64,
    pub roas: f64,
    pub engagement_rate: f64,
}

impl Post {
    pub fn from_campaign(record: &RawCampaignRecord, canonical_id: &str, index: usize) -> Self {
        let impressions = record.impressions();
        let likes = record.likes();
        let comments = record.comments();
        let shares = record.shares();
        let reach = match record.reach() {
            value if value > 0.0 => value,
            _ => impressions,
        };
        let engagements = match record.engagements() {
            value if value > 0.0 => value,
            _ => likes + comments + shares,
        };

        Self {
            id: record
                .post_number()
                .unwrap_or_else(|| derive_post_id(canonical_id, record, index)),
            campaign: record.campaign(),
            post_date: record.post_date(),
            platform: record.platform().unwrap_or_else(|| "instagram".to_string()),
            content_type: record.content_type(),
            impressions,
            reach,
            engagements,
            likes,
            comments,
            shares,
            saves: record.saves(),
            clicks: record.clicks(),
            revenue: record.revenue(),
            conversions: record.conversions(),
            rate: record.rate(),
            cpm: record.cpm(),
            cpe: record.cpe(),
            cpa: record.cpa(),
            roas: record.roas(),
            engagement_rate: record.engagement_rate(),
        }
    }
}

impl EngagementSample for Post {
    fn views(&self) -> f64 {
        self.impressions
    }

    fn likes(&self) -> f64 {
        self.likes
    }

    fn comments(&self) -> f64 {
        self.comments
    }

    fn shares(&self) -> f64 {
        self.shares
    }
}

/// Which sources contributed to an influencer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceCoverage {
    pub campaign_posts: usize,
    pub analytics_posts: usize,
    pub financial_summary: bool,
    pub prediction: bool,
}

/// One real influencer after reconciliation, metric derivation and ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalInfluencer {
    pub id: String,
    pub handle: String,
    pub display_name: String,
    pub pet_name: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub platform: String,
    pub tier: Option<String>,
    pub category: Option<String>,
    pub partner_type: Option<String>,
    /// `None` when no source reports a follower count.
    pub follower_count: Option<u64>,
    pub rate: f64,
    pub engagement_rate: f64,
    pub content_impressions: f64,
    pub roas: f64,
    pub aov: f64,
    pub cpe: f64,
    pub cpv: f64,
    pub total_revenue: f64,
    pub posts: Vec<Post>,
    /// Raw analytics identifiers folded into this influencer.
    pub analytics_ids: Vec<String>,
    pub prediction: Option<PredictionSummary>,
    pub predicted_engagement_rate: Option<f64>,
    pub predicted_views: Option<f64>,
    pub growth_potential: Option<f64>,
    pub confidence: Option<ConfidenceTier>,
    pub trend: TrendDirection,
    pub trend_delta: f64,
    pub rank_category: RankCategory,
    pub coverage: SourceCoverage,
    pub rank: usize,
}

impl CanonicalInfluencer {
    pub fn location(&self) -> Option<String> {
        match (self.city.as_deref(), self.state.as_deref()) {
            (Some(city), Some(state)) => Some(format!("{}, {}", city, state)),
            (Some(city), None) => Some(city.to_string()),
            (None, Some(state)) => Some(state.to_string()),
            (None, None) => None,
        }
    }
}

fn derive_post_id(canonical_id: &str, record: &RawCampaignRecord, index: usize) -> String {
    let payload = format!(
        "{}:{}:{}:{}",
        canonical_id,
        record.campaign(),
        record.post_date(),
        index
    );
    format!("post_{:x}", stable_hash64(&payload))
}

fn stable_hash64(value: &str) -> u64 {
    use sha2::{Digest, Sha256};

    let mut hasher = Sha256::new();
    hasher.update(value.as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}

pub fn format_number(value: f64) -> String {
    let rounded = value.round().max(0.0) as i64;
    let mut chars: Vec<char> = rounded.to_string().chars().collect();
    let mut result = String::new();
    let mut count = 0usize;

    while let Some(ch) = chars.pop() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(ch);
        count += 1;
    }

    result.chars().rev().collect()
}

pub fn format_currency(value: f64) -> String {
    if value < 0.0 {
        return format!("-${}", format_number(-value));
    }
    format!("${}", format_number(value))
}

/// Formats a value that is already a percentage.
pub fn format_percent(value: f64) -> String {
    format!("{:.1}%", value)
}

pub fn format_signed_percent(value: f64) -> String {
    format!("{:+.1}%", value)
}

pub fn format_float(value: f64, digits: usize) -> String {
    format!("{:.1$}", value, digits)
}
