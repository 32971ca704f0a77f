use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::{CanonicalInfluencer, TrendDirection};

/// Rising influencers first (largest gain first), then declining ones
/// (smallest decline first). Ties fall back to the canonical id.
pub fn compare_trend(a: &CanonicalInfluencer, b: &CanonicalInfluencer) -> Ordering {
    let by_trend = match (a.trend, b.trend) {
        (TrendDirection::Up, TrendDirection::Down) => Ordering::Less,
        (TrendDirection::Down, TrendDirection::Up) => Ordering::Greater,
        (TrendDirection::Up, TrendDirection::Up) => {
            b.trend_delta.abs().total_cmp(&a.trend_delta.abs())
        }
        (TrendDirection::Down, TrendDirection::Down) => {
            a.trend_delta.abs().total_cmp(&b.trend_delta.abs())
        }
    };
    by_trend.then_with(|| a.id.cmp(&b.id))
}

/// Sorts the whole set with [`compare_trend`] and assigns ranks 1..=N.
/// Any rank carried in from an earlier build is overwritten.
pub fn rank_influencers(mut influencers: Vec<CanonicalInfluencer>) -> Vec<CanonicalInfluencer> {
    influencers.sort_by(compare_trend);
    for (index, influencer) in influencers.iter_mut().enumerate() {
        influencer.rank = index + 1;
    }
    influencers
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Rank,
    Followers,
    EngagementRate,
    Revenue,
    Roas,
    Growth,
}

impl SortKey {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().replace('-', "_").as_str() {
            "rank" => Some(SortKey::Rank),
            "followers" | "follower_count" | "followercount" => Some(SortKey::Followers),
            "engagement" | "engagement_rate" | "engagementrate" | "er" => {
                Some(SortKey::EngagementRate)
            }
            "revenue" | "total_revenue" | "totalrevenue" => Some(SortKey::Revenue),
            "roas" => Some(SortKey::Roas),
            "growth" | "recent_growth" | "growth_potential" => Some(SortKey::Growth),
            _ => None,
        }
    }

    fn value(self, influencer: &CanonicalInfluencer) -> f64 {
        match self {
            SortKey::Rank => influencer.rank as f64,
            SortKey::Followers => influencer.follower_count.unwrap_or(0) as f64,
            SortKey::EngagementRate => influencer.engagement_rate,
            SortKey::Revenue => influencer.total_revenue,
            SortKey::Roas => influencer.roas,
            SortKey::Growth => influencer.growth_potential.unwrap_or(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "asc" | "ascending" => Some(SortOrder::Asc),
            "desc" | "descending" => Some(SortOrder::Desc),
            _ => None,
        }
    }
}

/// Filter and sort controls over a ranked snapshot. Never changes ranks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InfluencerQuery {
    pub search: Option<String>,
    pub tier: Option<String>,
    pub partner_type: Option<String>,
    pub platform: Option<String>,
    pub sort_by: SortKey,
    pub order: SortOrder,
    pub limit: Option<usize>,
}

impl InfluencerQuery {
    pub fn matches(&self, influencer: &CanonicalInfluencer) -> bool {
        let search_match = match non_empty(self.search.as_deref()) {
            Some(term) => {
                let term = term.to_lowercase();
                influencer.handle.to_lowercase().contains(&term)
                    || influencer.display_name.to_lowercase().contains(&term)
                    || influencer
                        .pet_name
                        .as_deref()
                        .map(|name| name.to_lowercase().contains(&term))
                        .unwrap_or(false)
            }
            None => true,
        };

        search_match
            && filter_matches(self.tier.as_deref(), influencer.tier.as_deref())
            && filter_matches(
                self.partner_type.as_deref(),
                influencer.partner_type.as_deref(),
            )
            && filter_matches(self.platform.as_deref(), Some(influencer.platform.as_str()))
    }

    pub fn apply<'a>(&self, influencers: &'a [CanonicalInfluencer]) -> Vec<&'a CanonicalInfluencer> {
        let mut selected: Vec<&CanonicalInfluencer> = influencers
            .iter()
            .filter(|influencer| self.matches(influencer))
            .collect();

        let key = self.sort_by;
        selected.sort_by(|a, b| {
            let ordering = key.value(a).total_cmp(&key.value(b));
            let ordering = match self.order {
                SortOrder::Asc => ordering,
                SortOrder::Desc => ordering.reverse(),
            };
            ordering.then_with(|| a.rank.cmp(&b.rank))
        });

        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

fn filter_matches(filter: Option<&str>, value: Option<&str>) -> bool {
    match non_empty(filter) {
        None => true,
        Some(filter) if filter.eq_ignore_ascii_case("all") => true,
        Some(filter) => value
            .map(|value| value.trim().eq_ignore_ascii_case(filter))
            .unwrap_or(false),
    }
}

/// Headline totals across the whole snapshot.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub total_influencers: usize,
    pub known_followers: u64,
    pub total_revenue: f64,
    pub avg_engagement_rate: f64,
    pub rising: usize,
    pub declining: usize,
}

impl Overview {
    pub fn from_influencers(influencers: &[CanonicalInfluencer]) -> Self {
        let rates: Vec<f64> = influencers
            .iter()
            .map(|influencer| influencer.engagement_rate)
            .collect();
        let rising = influencers
            .iter()
            .filter(|influencer| influencer.trend == TrendDirection::Up)
            .count();

        Self {
            total_influencers: influencers.len(),
            known_followers: influencers
                .iter()
                .filter_map(|influencer| influencer.follower_count)
                .sum(),
            total_revenue: influencers
                .iter()
                .map(|influencer| influencer.total_revenue)
                .sum(),
            avg_engagement_rate: crate::metrics::mean(&rates),
            rising,
            declining: influencers.len() - rising,
        }
    }
}
