use pawrank::predictions::{
    average_prediction, confidence_tier, find_prediction, growth_category, growth_percent,
    growth_percentile, percentile_score, scale_growth, ConfidenceTier, PredictionSummary,
};
use pawrank::sources::{LooseValue, PredictionRecord};
use proptest::prelude::*;

fn record(name: &str, er_agree: LooseValue, views_agree: LooseValue) -> PredictionRecord {
    PredictionRecord {
        influencer: Some(LooseValue::from(name)),
        current_engagement_rate: Some(LooseValue::from(0.04)),
        current_views: Some(LooseValue::from(10_000.0)),
        er_lgbm_prediction: Some(LooseValue::from(0.05)),
        er_rf_prediction: Some(LooseValue::from(0.07)),
        views_lgbm_prediction: Some(LooseValue::from(12_000.0)),
        views_rf_prediction: Some(LooseValue::from("14,000")),
        er_lgbm_percentile: Some(LooseValue::from("90-100")),
        er_rf_percentile: Some(LooseValue::from("75-90")),
        views_lgbm_percentile: Some(LooseValue::from("50-75")),
        views_rf_percentile: Some(LooseValue::from("0-25")),
        er_direction_agreement: Some(er_agree),
        views_direction_agreement: Some(views_agree),
    }
}

#[test]
fn averages_both_models() {
    let averaged = average_prediction(&record("a", true.into(), true.into()));
    assert!((averaged.engagement_rate - 0.06).abs() < 1e-9);
    assert!((averaged.views - 13_000.0).abs() < 1e-9);
}

#[test]
fn growth_percent_guards_zero_baseline() {
    assert!((growth_percent(4.0, 6.0) - 50.0).abs() < 1e-9);
    assert!((growth_percent(4.0, 2.0) + 50.0).abs() < 1e-9);
    assert_eq!(growth_percent(0.0, 6.0), 0.0);
    assert_eq!(growth_percent(0.0, 0.0), 0.0);
}

#[test]
fn scale_growth_is_identity_in_band() {
    for value in [-50.0, -12.5, 0.0, 42.0, 100.0] {
        assert!((scale_growth(value) - value).abs() < 1e-12);
    }
}

#[test]
fn scale_growth_compresses_outliers() {
    assert!((scale_growth(1000.0) - 150.0).abs() < 1e-9);
    assert!((scale_growth(-500.0) + 75.0).abs() < 1e-9);
    assert!(scale_growth(5000.0) < 200.0);
    assert!(scale_growth(-1e9) >= -75.0);
    assert_eq!(scale_growth(f64::NAN), 0.0);
}

#[test]
fn scale_growth_is_continuous_at_breakpoints() {
    let epsilon = 1e-6;
    assert_eq!(scale_growth(100.0), 100.0);
    assert!((scale_growth(100.0 + epsilon) - 100.0).abs() < 1e-4);
    assert!((scale_growth(-50.0 - epsilon) + 50.0).abs() < 1e-4);
}

#[test]
fn confidence_follows_agreement_flags() {
    assert_eq!(
        confidence_tier(&record("a", true.into(), "True".into())),
        ConfidenceTier::High
    );
    assert_eq!(
        confidence_tier(&record("a", "False".into(), true.into())),
        ConfidenceTier::Medium
    );
    assert_eq!(
        confidence_tier(&record("a", true.into(), false.into())),
        ConfidenceTier::Medium
    );
    assert_eq!(
        confidence_tier(&record("a", false.into(), LooseValue::Null)),
        ConfidenceTier::Low
    );
}

#[test]
fn percentile_labels_map_to_midpoints() {
    assert_eq!(percentile_score("90-100"), 95.0);
    assert_eq!(percentile_score("75-90"), 82.5);
    assert_eq!(percentile_score("50-75"), 62.5);
    assert_eq!(percentile_score("25-50"), 37.5);
    assert_eq!(percentile_score("bottom"), 12.5);

    let percentile = growth_percentile(&record("a", true.into(), true.into()));
    assert!((percentile - (95.0 + 82.5 + 62.5 + 12.5) / 4.0).abs() < 1e-9);
    assert_eq!(growth_category(percentile), "Moderate Growth Potential");
    assert_eq!(growth_category(80.0), "High Growth Potential");
    assert_eq!(growth_category(10.0), "Stable Performance");
}

#[test]
fn find_prediction_matches_case_insensitively_then_loosely() {
    let predictions = vec![
        record("Corgi_Club", true.into(), true.into()),
        record("adam wickens", true.into(), false.into()),
    ];
    let found = find_prediction("corgi_club", &predictions).map(|p| p.influencer());
    assert_eq!(found.as_deref(), Some("Corgi_Club"));

    let aliased = find_prediction("Adam_Wickens", &predictions).map(|p| p.influencer());
    assert_eq!(aliased.as_deref(), Some("adam wickens"));

    let contained = find_prediction("corgi_club_official", &predictions).map(|p| p.influencer());
    assert_eq!(contained.as_deref(), Some("Corgi_Club"));

    assert!(find_prediction("golden_hour", &predictions).is_none());
    assert!(find_prediction("", &predictions).is_none());
}

#[test]
fn summary_expresses_rates_as_percentages() {
    let summary = PredictionSummary::from_record(&record("a", true.into(), true.into()));
    assert!((summary.current_engagement_rate - 4.0).abs() < 1e-9);
    assert!((summary.predicted_engagement_rate - 6.0).abs() < 1e-9);
    assert!((summary.engagement_growth - 50.0).abs() < 1e-9);
    assert!((summary.views_growth - 30.0).abs() < 1e-9);
    assert!((summary.engagement_delta() - 2.0).abs() < 1e-9);
    assert!(!summary.growth_baseline_missing);
    assert_eq!(summary.confidence, ConfidenceTier::High);
}

#[test]
fn summary_flags_missing_baseline() {
    let mut zero = record("a", true.into(), true.into());
    zero.current_engagement_rate = Some(LooseValue::from(0.0));
    let summary = PredictionSummary::from_record(&zero);
    assert!(summary.growth_baseline_missing);
    assert_eq!(summary.engagement_growth, 0.0);
}

proptest! {
    #[test]
    fn scale_growth_is_monotonic(a in -1e6f64..1e6, b in -1e6f64..1e6) {
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(scale_growth(low) <= scale_growth(high) + 1e-9);
    }
}
