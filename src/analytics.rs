use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::{mean, ratio, EngagementSample};
use crate::sources::RawPost;

/// Cleaned view of one organic post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PostMetrics {
    pub video_id: Option<String>,
    pub influencer_id: String,
    pub date: Option<NaiveDate>,
    pub views: f64,
    pub likes: f64,
    pub comments: f64,
    pub shares: f64,
    pub engagements: f64,
    /// Percentage.
    pub engagement_rate: f64,
    pub duration_seconds: f64,
}

impl PostMetrics {
    pub fn from_raw(post: &RawPost) -> Self {
        let views = post.views();
        let likes = post.likes();
        let comments = post.comments();
        let shares = post.shares();
        let engagements = likes + comments + shares;
        let engagement_rate = match post.engagement_fraction() * 100.0 {
            rate if rate > 0.0 => rate,
            _ => ratio(engagements, views) * 100.0,
        };

        Self {
            video_id: post.video_id(),
            influencer_id: post.influencer_id(),
            date: post.date().as_deref().and_then(parse_post_date),
            views,
            likes,
            comments,
            shares,
            engagements,
            engagement_rate,
            duration_seconds: post.duration_seconds(),
        }
    }
}

impl EngagementSample for PostMetrics {
    fn views(&self) -> f64 {
        self.views
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

/// Accepts `2024-03-01`, ISO datetimes (with or without offset) and `03/01/2024`.
pub fn parse_post_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(datetime) = DateTime::parse_from_rfc3339(text) {
        return Some(datetime.date_naive());
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(text, format) {
            return Some(datetime.date());
        }
    }
    NaiveDate::parse_from_str(text, "%m/%d/%Y").ok()
}

/// Posts usable for time-based analytics: dated and with at least one view.
pub fn analytics_posts<'a, I>(posts: I) -> Vec<PostMetrics>
where
    I: IntoIterator<Item = &'a RawPost>,
{
    posts
        .into_iter()
        .map(PostMetrics::from_raw)
        .filter(|post| post.date.is_some() && post.views > 0.0)
        .collect()
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceSummary {
    pub post_count: usize,
    pub total_views: f64,
    pub total_likes: f64,
    pub total_comments: f64,
    pub total_shares: f64,
    pub total_engagements: f64,
    pub avg_engagement_rate: f64,
}

pub fn performance_summary(posts: &[PostMetrics]) -> PerformanceSummary {
    let rates: Vec<f64> = posts.iter().map(|post| post.engagement_rate).collect();
    PerformanceSummary {
        post_count: posts.len(),
        total_views: posts.iter().map(|post| post.views).sum(),
        total_likes: posts.iter().map(|post| post.likes).sum(),
        total_comments: posts.iter().map(|post| post.comments).sum(),
        total_shares: posts.iter().map(|post| post.shares).sum(),
        total_engagements: posts.iter().map(|post| post.engagements).sum(),
        avg_engagement_rate: mean(&rates),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyPoint {
    /// `YYYY-MM`.
    pub month: String,
    pub posts: usize,
    pub views: f64,
    pub engagements: f64,
    pub avg_engagement_rate: f64,
}

/// Per-month totals in ascending month order. Undated posts are skipped.
pub fn monthly_series(posts: &[PostMetrics]) -> Vec<MonthlyPoint> {
    let mut months: BTreeMap<String, Vec<&PostMetrics>> = BTreeMap::new();
    for post in posts {
        if let Some(date) = post.date {
            months
                .entry(date.format("%Y-%m").to_string())
                .or_default()
                .push(post);
        }
    }

    months
        .into_iter()
        .map(|(month, bucket)| {
            let rates: Vec<f64> = bucket.iter().map(|post| post.engagement_rate).collect();
            MonthlyPoint {
                month,
                posts: bucket.len(),
                views: bucket.iter().map(|post| post.views).sum(),
                engagements: bucket.iter().map(|post| post.engagements).sum(),
                avg_engagement_rate: mean(&rates),
            }
        })
        .collect()
}

/// Highest engagement rate first; views break ties.
pub fn top_posts(posts: &[PostMetrics], limit: usize) -> Vec<PostMetrics> {
    let mut sorted = posts.to_vec();
    sorted.sort_by(|a, b| {
        b.engagement_rate
            .total_cmp(&a.engagement_rate)
            .then_with(|| b.views.total_cmp(&a.views))
    });
    sorted.truncate(limit);
    sorted
}

/// Posts dated in `[reference - days, reference]`.
pub fn posts_within(posts: &[PostMetrics], reference: NaiveDate, days: i64) -> Vec<PostMetrics> {
    let cutoff = reference
        .checked_sub_signed(Duration::days(days.clamp(0, 365_000)))
        .unwrap_or(NaiveDate::MIN);
    posts
        .iter()
        .filter(|post| {
            post.date
                .map(|date| date >= cutoff && date <= reference)
                .unwrap_or(false)
        })
        .cloned()
        .collect()
}

/// Everything the detail view shows for one influencer's organic posts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalyticsReport {
    pub summary: PerformanceSummary,
    pub monthly: Vec<MonthlyPoint>,
    pub top_posts: Vec<PostMetrics>,
    /// Latest post date; the recent window ends here.
    pub reference_date: Option<NaiveDate>,
    pub window_days: i64,
    pub recent: PerformanceSummary,
}

impl AnalyticsReport {
    pub fn build(posts: Vec<PostMetrics>, top_limit: usize, window_days: i64) -> Self {
        let reference_date = posts.iter().filter_map(|post| post.date).max();
        let recent = reference_date
            .map(|reference| performance_summary(&posts_within(&posts, reference, window_days)))
            .unwrap_or_default();

        Self {
            summary: performance_summary(&posts),
            monthly: monthly_series(&posts),
            top_posts: top_posts(&posts, top_limit),
            reference_date,
            window_days,
            recent,
        }
    }
}
