use serde::{Deserialize, Serialize};

use pawrank::analytics::AnalyticsReport;
use pawrank::content::ContentProfile;
use pawrank::predictions::ConfidenceTier;
use pawrank::ranking::{InfluencerQuery, Overview, SortKey, SortOrder};
use pawrank::{CanonicalInfluencer, RankCategory, TrendDirection};

/// Query-string form of [`InfluencerQuery`].
#[derive(Debug, Default, Deserialize)]
pub struct ApiListParams {
    pub search: Option<String>,
    pub tier: Option<String>,
    pub partner_type: Option<String>,
    pub platform: Option<String>,
    pub sort_by: Option<String>,
    pub order: Option<String>,
    pub limit: Option<usize>,
}

impl ApiListParams {
    pub fn into_query(self) -> Result<InfluencerQuery, String> {
        let sort_by = match self.sort_by.as_deref() {
            Some(value) => {
                SortKey::from_str(value).ok_or_else(|| format!("invalid sort key: {}", value))?
            }
            None => SortKey::default(),
        };
        let order = match self.order.as_deref() {
            Some(value) => {
                SortOrder::from_str(value).ok_or_else(|| format!("invalid sort order: {}", value))?
            }
            None => SortOrder::default(),
        };

        Ok(InfluencerQuery {
            search: self.search,
            tier: self.tier,
            partner_type: self.partner_type,
            platform: self.platform,
            sort_by,
            order,
            limit: self.limit,
        })
    }
}

/// One row of the listing.
#[derive(Debug, Serialize)]
pub struct ApiInfluencerRow {
    pub id: String,
    pub rank: usize,
    pub handle: String,
    pub display_name: String,
    pub pet_name: Option<String>,
    pub location: Option<String>,
    pub platform: String,
    pub tier: Option<String>,
    pub partner_type: Option<String>,
    pub follower_count: Option<u64>,
    pub engagement_rate: f64,
    pub total_revenue: f64,
    pub roas: f64,
    pub growth_potential: Option<f64>,
    pub confidence: Option<ConfidenceTier>,
    pub trend: TrendDirection,
    pub trend_delta: f64,
    pub rank_category: RankCategory,
}

impl ApiInfluencerRow {
    pub fn from_influencer(influencer: &CanonicalInfluencer) -> Self {
        Self {
            id: influencer.id.clone(),
            rank: influencer.rank,
            handle: influencer.handle.clone(),
            display_name: influencer.display_name.clone(),
            pet_name: influencer.pet_name.clone(),
            location: influencer.location(),
            platform: influencer.platform.clone(),
            tier: influencer.tier.clone(),
            partner_type: influencer.partner_type.clone(),
            follower_count: influencer.follower_count,
            engagement_rate: influencer.engagement_rate,
            total_revenue: influencer.total_revenue,
            roas: influencer.roas,
            growth_potential: influencer.growth_potential,
            confidence: influencer.confidence,
            trend: influencer.trend,
            trend_delta: influencer.trend_delta,
            rank_category: influencer.rank_category,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiListResponse {
    /// Influencers in the snapshot before filtering.
    pub total: usize,
    pub count: usize,
    pub influencers: Vec<ApiInfluencerRow>,
}

#[derive(Debug, Serialize)]
pub struct ApiAnalyticsResponse {
    pub id: String,
    pub report: AnalyticsReport,
    pub content: ContentProfile,
}

#[derive(Debug, Serialize)]
pub struct ApiOverviewResponse {
    #[serde(flatten)]
    pub overview: Overview,
    pub built_at: String,
}

#[derive(Debug, Serialize)]
pub struct ApiHealthResponse {
    pub status: &'static str,
    pub influencers: usize,
    pub built_at: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
