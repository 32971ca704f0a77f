//! Load-once assembly: campaign records, organic analytics, financial
//! summaries and forecasts are folded into one ranked influencer list.

use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info};

use crate::analytics::{self, AnalyticsReport};
use crate::config::IdentityConfig;
use crate::content::{self, ContentProfile};
use crate::identity::{comparison_key, IdentityNormalizer, MatchPolicy};
use crate::metrics::{self, ratio};
use crate::predictions::{find_prediction_with, PredictionSummary};
use crate::ranking::{rank_influencers, InfluencerQuery, Overview};
use crate::sources::{FinancialSummary, RawCampaignRecord, RawPost, SourceLoader, SourceSet};
use crate::{CanonicalInfluencer, Post, RankCategory, SourceCoverage, TrendDirection};

const TOP_POSTS: usize = 10;
const RECENT_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Default)]
pub struct Pipeline {
    normalizer: IdentityNormalizer,
    policy: MatchPolicy,
}

impl Pipeline {
    pub fn new(normalizer: IdentityNormalizer, policy: MatchPolicy) -> Self {
        Self { normalizer, policy }
    }

    pub fn from_config(config: &IdentityConfig) -> Self {
        Self::new(config.normalizer(), config.policy())
    }

    pub fn normalizer(&self) -> &IdentityNormalizer {
        &self.normalizer
    }

    pub fn policy(&self) -> &MatchPolicy {
        &self.policy
    }

    /// Reads every source through `loader` and assembles a fresh snapshot.
    pub fn build(&self, loader: &dyn SourceLoader) -> Dashboard {
        self.build_from(SourceSet::load(loader))
    }

    pub fn build_from(&self, sources: SourceSet) -> Dashboard {
        let influencers = self.assemble(&sources);
        Dashboard {
            influencers,
            sources: Arc::new(sources),
            built_at: Utc::now(),
        }
    }

    /// Pure transform from raw sources to ranked influencers.
    pub fn assemble(&self, sources: &SourceSet) -> Vec<CanonicalInfluencer> {
        let mut drafts: BTreeMap<String, Draft<'_>> = BTreeMap::new();

        for record in &sources.campaigns {
            let id = self.normalizer.normalize(&record.handle());
            if id.is_empty() {
                debug!(campaign = %record.campaign(), "campaign record without a handle");
                continue;
            }
            let draft = drafts
                .entry(id.clone())
                .or_insert_with(|| Draft::new(id.clone(), None));
            draft.absorb_campaign(record);
        }

        for (id, group) in group_analytics(&self.normalizer, &sources.posts) {
            let target = match self.attach_target(&drafts, &id) {
                Some(target) => target,
                None => {
                    drafts.insert(id.clone(), Draft::new(id.clone(), Some("tiktok")));
                    id
                }
            };
            if let Some(draft) = drafts.get_mut(&target) {
                draft.analytics_ids.extend(group.raw_ids);
                draft.analytics.extend(group.posts);
            }
        }

        for (stem, summary) in &sources.financials {
            let id = self.normalizer.normalize(stem);
            if id.is_empty() {
                continue;
            }
            let target = match self.attach_target(&drafts, &id) {
                Some(target) => target,
                None => {
                    drafts.insert(id.clone(), Draft::new(id.clone(), None));
                    id
                }
            };
            if let Some(draft) = drafts.get_mut(&target) {
                if draft.financial.is_none() {
                    draft.financial = Some(summary);
                }
            }
        }

        let influencers: Vec<CanonicalInfluencer> = drafts
            .into_values()
            .map(|draft| {
                let prediction = find_prediction_with(
                    &draft.id,
                    &sources.predictions,
                    &self.normalizer,
                    &self.policy,
                )
                .map(PredictionSummary::from_record);
                draft.finish(prediction)
            })
            .collect();

        let ranked = rank_influencers(influencers);
        info!(
            influencers = ranked.len(),
            with_predictions = ranked.iter().filter(|i| i.prediction.is_some()).count(),
            "assembled influencer snapshot"
        );
        ranked
    }

    fn attach_target(&self, drafts: &BTreeMap<String, Draft<'_>>, id: &str) -> Option<String> {
        let matched = self
            .policy
            .resolve(id, drafts.keys().map(String::as_str))?
            .to_string();
        if !self.policy.keys_equal(&matched, id) {
            debug!(raw = id, canonical = %matched, "containment identity match");
        }
        Some(matched)
    }
}

/// Assembles with the built-in alias table and the default match policy.
pub fn assemble(sources: &SourceSet) -> Vec<CanonicalInfluencer> {
    Pipeline::default().assemble(sources)
}

struct AnalyticsGroup<'a> {
    raw_ids: BTreeSet<String>,
    posts: Vec<&'a RawPost>,
}

fn group_analytics<'a>(
    normalizer: &IdentityNormalizer,
    posts: &'a [RawPost],
) -> BTreeMap<String, AnalyticsGroup<'a>> {
    let mut groups: BTreeMap<String, AnalyticsGroup<'a>> = BTreeMap::new();
    for post in posts {
        let raw_id = post.influencer_id();
        let id = normalizer.normalize(&raw_id);
        if id.is_empty() {
            debug!(video = ?post.video_id(), "analytics post without an influencer id");
            continue;
        }
        let group = groups.entry(id).or_insert_with(|| AnalyticsGroup {
            raw_ids: BTreeSet::new(),
            posts: Vec::new(),
        });
        group.raw_ids.insert(raw_id);
        group.posts.push(post);
    }
    groups
}

struct Draft<'a> {
    id: String,
    pet_parent_name: Option<String>,
    pet_name: Option<String>,
    city: Option<String>,
    state: Option<String>,
    platform: Option<String>,
    tier: Option<String>,
    category: Option<String>,
    partner_type: Option<String>,
    follower_count: Option<u64>,
    campaign_rate: f64,
    posts: Vec<Post>,
    analytics: Vec<&'a RawPost>,
    analytics_ids: BTreeSet<String>,
    financial: Option<&'a FinancialSummary>,
}

impl<'a> Draft<'a> {
    fn new(id: String, platform: Option<&str>) -> Self {
        Self {
            id,
            pet_parent_name: None,
            pet_name: None,
            city: None,
            state: None,
            platform: platform.map(str::to_string),
            tier: None,
            category: None,
            partner_type: None,
            follower_count: None,
            campaign_rate: 0.0,
            posts: Vec::new(),
            analytics: Vec::new(),
            analytics_ids: BTreeSet::new(),
            financial: None,
        }
    }

    fn absorb_campaign(&mut self, record: &RawCampaignRecord) {
        fill(&mut self.pet_parent_name, record.pet_parent_name());
        fill(&mut self.pet_name, record.pet_name());
        fill(&mut self.city, record.city());
        fill(&mut self.state, record.state());
        fill(&mut self.platform, record.platform());
        fill(&mut self.tier, record.tier().map(|tier| strip_tier_prefix(&tier)));
        fill(&mut self.category, record.category());
        fill(&mut self.partner_type, record.partner_type());

        let followers = record.follower_count();
        if self.follower_count.is_none() && followers > 0.0 {
            self.follower_count = Some(followers.round() as u64);
        }
        if self.campaign_rate <= 0.0 {
            self.campaign_rate = record.rate();
        }

        let index = self.posts.len();
        self.posts.push(Post::from_campaign(record, &self.id, index));
    }

    fn finish(self, prediction: Option<PredictionSummary>) -> CanonicalInfluencer {
        let financial = self.financial;
        let spend: f64 = self.posts.iter().map(|post| post.rate).sum();
        let revenue: f64 = self.posts.iter().map(|post| post.revenue).sum();
        let conversions: f64 = self.posts.iter().map(|post| post.conversions).sum();

        let rate = if self.campaign_rate > 0.0 {
            self.campaign_rate
        } else {
            financial.map(FinancialSummary::rate).unwrap_or(0.0)
        };

        let analytics_views = metrics::total_impressions(&self.analytics);
        let content_impressions = if analytics_views > 0.0 {
            analytics_views
        } else {
            financial.map(FinancialSummary::views).unwrap_or(0.0)
        };

        let financial_er = financial
            .map(FinancialSummary::engagement_rate)
            .unwrap_or(0.0);
        let engagement_rate = if analytics_views > 0.0 {
            metrics::engagement_rate(&self.analytics)
        } else if financial_er > 0.0 {
            financial_er
        } else {
            metrics::engagement_rate(&self.posts)
        };

        let cpe = first_positive(
            metrics::cost_per_engagement(&self.posts, spend),
            financial.map(FinancialSummary::avg_cpe),
        );
        let cpv = first_positive(
            metrics::cost_per_thousand_views(&self.posts, spend),
            financial.map(FinancialSummary::avg_cpv),
        );
        let (roas, aov) = match financial {
            Some(summary) => (summary.avg_roas(), summary.avg_aov()),
            None => (ratio(revenue, spend), ratio(revenue, conversions)),
        };

        let trend_delta = prediction
            .as_ref()
            .map(PredictionSummary::engagement_delta)
            .filter(|delta| delta.is_finite())
            .unwrap_or(0.0);
        let display_name = self
            .pet_parent_name
            .clone()
            .unwrap_or_else(|| title_case(&self.id));
        let coverage = SourceCoverage {
            campaign_posts: self.posts.len(),
            analytics_posts: self.analytics.len(),
            financial_summary: financial.is_some(),
            prediction: prediction.is_some(),
        };

        CanonicalInfluencer {
            handle: self.id.clone(),
            display_name,
            pet_name: self.pet_name,
            city: self.city,
            state: self.state,
            platform: self.platform.unwrap_or_else(|| "instagram".to_string()),
            rank_category: RankCategory::classify(self.tier.as_deref(), engagement_rate),
            tier: self.tier,
            category: self.category,
            partner_type: self.partner_type,
            follower_count: self.follower_count,
            rate,
            engagement_rate,
            content_impressions,
            roas,
            aov,
            cpe,
            cpv,
            total_revenue: revenue,
            posts: self.posts,
            analytics_ids: self.analytics_ids.into_iter().collect(),
            predicted_engagement_rate: prediction.as_ref().map(|p| p.predicted_engagement_rate),
            predicted_views: prediction.as_ref().map(|p| p.predicted_views),
            growth_potential: prediction.as_ref().map(|p| p.engagement_growth),
            confidence: prediction.as_ref().map(|p| p.confidence),
            trend: TrendDirection::from_delta(trend_delta),
            trend_delta,
            prediction,
            coverage,
            rank: 0,
            id: self.id,
        }
    }
}

fn fill(slot: &mut Option<String>, value: Option<String>) {
    if slot.is_none() {
        *slot = value;
    }
}

fn first_positive(primary: f64, fallback: Option<f64>) -> f64 {
    if primary > 0.0 {
        primary
    } else {
        fallback.filter(|value| value.is_finite()).unwrap_or(0.0)
    }
}

/// `"TIER 2: 50K-250K"` -> `"50K-250K"`.
pub fn strip_tier_prefix(tier: &str) -> String {
    let trimmed = tier.trim();
    let has_prefix = trimmed
        .get(..4)
        .map(|head| head.eq_ignore_ascii_case("tier"))
        .unwrap_or(false);
    if has_prefix {
        if let Some((_, rest)) = trimmed.split_once(':') {
            return rest.trim().to_string();
        }
    }
    trimmed.to_string()
}

/// `"jane.doe_pets"` -> `"Jane Doe Pets"`.
pub fn title_case(id: &str) -> String {
    id.split(|c: char| c == '.' || c == '_' || c.is_whitespace())
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// A ranked, read-only snapshot plus the sources it was built from.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub influencers: Vec<CanonicalInfluencer>,
    pub sources: Arc<SourceSet>,
    pub built_at: DateTime<Utc>,
}

impl Dashboard {
    pub fn len(&self) -> usize {
        self.influencers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.influencers.is_empty()
    }

    /// Lookup by canonical id: exact, then case-insensitive, then by
    /// punctuation-free comparison key.
    pub fn find(&self, id: &str) -> Option<&CanonicalInfluencer> {
        let trimmed = id.trim().trim_start_matches('@');
        if trimmed.is_empty() {
            return None;
        }
        let key = comparison_key(trimmed);
        self.influencers
            .iter()
            .find(|influencer| influencer.id == trimmed)
            .or_else(|| {
                self.influencers
                    .iter()
                    .find(|influencer| influencer.id.eq_ignore_ascii_case(trimmed))
            })
            .or_else(|| {
                self.influencers
                    .iter()
                    .find(|influencer| !key.is_empty() && comparison_key(&influencer.id) == key)
            })
    }

    pub fn query(&self, query: &InfluencerQuery) -> Vec<&CanonicalInfluencer> {
        query.apply(&self.influencers)
    }

    pub fn overview(&self) -> Overview {
        Overview::from_influencers(&self.influencers)
    }

    /// Organic posts folded into `influencer`. Never exposed as [`Post`]s.
    pub fn raw_posts_for(&self, influencer: &CanonicalInfluencer) -> Vec<&RawPost> {
        self.sources
            .posts
            .iter()
            .filter(|post| {
                influencer
                    .analytics_ids
                    .iter()
                    .any(|raw_id| *raw_id == post.influencer_id())
            })
            .collect()
    }

    pub fn analytics(&self, id: &str) -> Option<AnalyticsReport> {
        let influencer = self.find(id)?;
        let posts = analytics::analytics_posts(self.raw_posts_for(influencer));
        Some(AnalyticsReport::build(posts, TOP_POSTS, RECENT_WINDOW_DAYS))
    }

    /// Content profile for one influencer, or across every organic post when
    /// `id` is `None`.
    pub fn content_profile(&self, id: Option<&str>) -> Option<ContentProfile> {
        match id {
            Some(id) => {
                let influencer = self.find(id)?;
                Some(content::profile(&self.raw_posts_for(influencer)))
            }
            None => {
                let posts: Vec<&RawPost> = self.sources.posts.iter().collect();
                Some(content::profile(&posts))
            }
        }
    }
}
