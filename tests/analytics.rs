use chrono::NaiveDate;
use pawrank::analytics::{
    analytics_posts, monthly_series, parse_post_date, performance_summary, posts_within,
    top_posts, AnalyticsReport, PostMetrics,
};
use pawrank::content::profile;
use pawrank::sources::{LooseValue, RawPost};

fn post(id: &str, date: &str, views: f64, likes: f64, er_fraction: Option<f64>) -> RawPost {
    RawPost {
        video_id: Some(LooseValue::from(id)),
        influencer_id: Some(LooseValue::from("tabby.tales")),
        date: Some(LooseValue::from(date)),
        views: Some(LooseValue::from(views)),
        likes: Some(LooseValue::from(likes)),
        engagement_rate: er_fraction.map(LooseValue::from),
        ..RawPost::default()
    }
}

fn with_attributes(mut post: RawPost, attributes: &[(&str, LooseValue)]) -> RawPost {
    for (key, value) in attributes {
        post.attributes.insert(key.to_string(), value.clone());
    }
    post
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid date")
}

#[test]
fn parses_common_date_shapes() {
    assert_eq!(parse_post_date("2024-03-01"), Some(ymd(2024, 3, 1)));
    assert_eq!(parse_post_date("2024-03-01T18:30:00"), Some(ymd(2024, 3, 1)));
    assert_eq!(parse_post_date("2024-03-01T18:30:00Z"), Some(ymd(2024, 3, 1)));
    assert_eq!(parse_post_date("2024-03-01 08:15:00"), Some(ymd(2024, 3, 1)));
    assert_eq!(parse_post_date("03/01/2024"), Some(ymd(2024, 3, 1)));
    assert_eq!(parse_post_date("last tuesday"), None);
    assert_eq!(parse_post_date(""), None);
}

#[test]
fn engagement_rate_prefers_exported_fraction() {
    let exported = PostMetrics::from_raw(&post("v1", "2024-03-01", 1000.0, 10.0, Some(0.08)));
    assert!((exported.engagement_rate - 8.0).abs() < 1e-9);

    let derived = PostMetrics::from_raw(&post("v2", "2024-03-01", 1000.0, 30.0, None));
    assert!((derived.engagement_rate - 3.0).abs() < 1e-9);
}

#[test]
fn analytics_posts_require_date_and_views() {
    let raw = vec![
        post("v1", "2024-03-01", 1000.0, 10.0, None),
        post("v2", "not a date", 1000.0, 10.0, None),
        post("v3", "2024-03-02", 0.0, 10.0, None),
    ];
    let posts = analytics_posts(&raw);
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].video_id.as_deref(), Some("v1"));
}

#[test]
fn summary_of_nothing_is_zero() {
    let summary = performance_summary(&[]);
    assert_eq!(summary.post_count, 0);
    assert_eq!(summary.avg_engagement_rate, 0.0);
    assert!(monthly_series(&[]).is_empty());
    assert!(top_posts(&[], 5).is_empty());
}

#[test]
fn monthly_series_is_ascending() {
    let raw = vec![
        post("v1", "2024-04-10", 2000.0, 40.0, Some(0.02)),
        post("v2", "2024-03-02", 1000.0, 40.0, Some(0.04)),
        post("v3", "2024-03-20", 1000.0, 60.0, Some(0.06)),
    ];
    let posts = analytics_posts(&raw);
    let series = monthly_series(&posts);
    let months: Vec<&str> = series.iter().map(|p| p.month.as_str()).collect();
    assert_eq!(months, vec!["2024-03", "2024-04"]);
    assert_eq!(series[0].posts, 2);
    assert!((series[0].views - 2000.0).abs() < 1e-9);
    assert!((series[0].avg_engagement_rate - 5.0).abs() < 1e-9);
}

#[test]
fn top_posts_and_recent_window() {
    let raw = vec![
        post("old", "2024-01-01", 1000.0, 10.0, Some(0.09)),
        post("mid", "2024-03-10", 1000.0, 10.0, Some(0.03)),
        post("new", "2024-03-30", 1000.0, 10.0, Some(0.05)),
    ];
    let posts = analytics_posts(&raw);

    let top: Vec<Option<String>> = top_posts(&posts, 2).into_iter().map(|p| p.video_id).collect();
    assert_eq!(top, vec![Some("old".to_string()), Some("new".to_string())]);

    let recent = posts_within(&posts, ymd(2024, 3, 30), 30);
    assert_eq!(recent.len(), 2);

    let report = AnalyticsReport::build(posts, 10, 30);
    assert_eq!(report.reference_date, Some(ymd(2024, 3, 30)));
    assert_eq!(report.recent.post_count, 2);
    assert_eq!(report.summary.post_count, 3);
}

#[test]
fn content_profile_of_nothing_is_empty() {
    let empty = profile(&[]);
    assert_eq!(empty.post_count, 0);
    assert_eq!(empty.trust.trust_score, 0.0);
    assert!(empty.quality.brand_fit.is_none());
}

#[test]
fn content_profile_counts_attributes() {
    let first = with_attributes(
        post("v1", "2024-03-01", 1000.0, 10.0, None),
        &[
            ("Audio & prosody_tone", "playful".into()),
            ("Audio & prosody_music", "True".into()),
            ("Audio & prosody_num_speakers", LooseValue::from(2.0)),
            ("Visual Content Semantics_close_up_hook", true.into()),
            ("Visual Content Semantics_detected_brand_logos", "['Chewy', 'Purina']".into()),
            ("Visual Content Semantics_pet_breed", "corgi".into()),
            ("Emotion & affect_top_viewer_emotions", "['joy', 'amusement']".into()),
            ("Trust & authority cues_expert_titles_visible", "True".into()),
            ("Trust & authority cues_influencer_face_visible", "True".into()),
            ("Narrative & topic_hook_effectiveness_score", LooseValue::from(4.0)),
            ("Narrative & topic_audience_brand_fit_fit_level", "high".into()),
        ],
    );
    let second = with_attributes(
        post("v2", "2024-03-02", 1000.0, 10.0, None),
        &[
            ("Audio & prosody_tone", "Playful".into()),
            ("Audio & prosody_music", "False".into()),
            ("Visual Content Semantics_detected_brand_logos", "['Chewy']".into()),
            ("Emotion & affect_top_viewer_emotions", "['joy']".into()),
            ("Trust & authority cues_influencer_face_visible", "True".into()),
            ("Narrative & topic_hook_effectiveness_score", LooseValue::from(3.0)),
            ("Narrative & topic_audience_brand_fit_fit_level", "high".into()),
        ],
    );

    let posts = vec![&first, &second];
    let content = profile(&posts);
    assert_eq!(content.post_count, 2);

    assert_eq!(content.audio.tones.len(), 1);
    assert_eq!(content.audio.tones[0].name, "Playful");
    assert_eq!(content.audio.tones[0].count, 2);
    assert_eq!(content.audio.music_share, 50.0);
    assert!((content.audio.avg_speakers - 2.0).abs() < 1e-9);
    assert_eq!(content.visual.close_up_hook_share, 50.0);

    assert_eq!(content.brands[0].name, "Chewy");
    assert_eq!(content.brands[0].count, 2);
    assert!((content.brands[0].percentage - 67.0).abs() < 1e-9);
    assert_eq!(content.breeds[0].name, "Corgi");
    assert_eq!(content.emotions[0].name, "Joy");

    // expert titles 50% * 0.25 + face visible 100% * 0.20
    assert!((content.trust.trust_score - 33.0).abs() < 1e-9);
    assert!(content.trust.cues.iter().any(|cue| cue.cue == "Face Visible" && cue.percentage == 100.0));

    assert_eq!(content.quality.scores.len(), 1);
    assert!((content.quality.scores[0].score - 3.5).abs() < 1e-9);
    assert!((content.quality.overall - 3.5).abs() < 1e-9);
    assert_eq!(content.quality.brand_fit.as_deref(), Some("High"));
}
