use serde::{Deserialize, Serialize};

use crate::identity::{IdentityNormalizer, MatchPolicy};
use crate::sources::PredictionRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn label(self) -> &'static str {
        match self {
            ConfidenceTier::High => "high",
            ConfidenceTier::Medium => "medium",
            ConfidenceTier::Low => "low",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AveragedPrediction {
    pub engagement_rate: f64,
    pub views: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelAgreement {
    pub engagement: bool,
    pub views: bool,
}

/// Forecast data attached to one influencer. Engagement rates are percentages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionSummary {
    pub matched_name: String,
    pub current_engagement_rate: f64,
    pub current_views: f64,
    pub predicted_engagement_rate: f64,
    pub predicted_views: f64,
    /// Scaled engagement-rate growth, in percent.
    pub engagement_growth: f64,
    /// Scaled views growth, in percent.
    pub views_growth: f64,
    /// True when the current engagement rate is 0, so growth could not be
    /// measured and was reported as 0.
    pub growth_baseline_missing: bool,
    pub confidence: ConfidenceTier,
    pub model_agreement: ModelAgreement,
    pub growth_percentile: f64,
    pub growth_category: String,
}

impl PredictionSummary {
    pub fn from_record(record: &PredictionRecord) -> Self {
        let averaged = average_prediction(record);
        let current_engagement_rate = record.current_engagement_rate() * 100.0;
        let current_views = record.current_views();
        let predicted_engagement_rate = averaged.engagement_rate * 100.0;
        let predicted_views = averaged.views;
        let growth_percentile = growth_percentile(record);

        Self {
            matched_name: record.influencer(),
            current_engagement_rate,
            current_views,
            predicted_engagement_rate,
            predicted_views,
            engagement_growth: scale_growth(growth_percent(
                current_engagement_rate,
                predicted_engagement_rate,
            )),
            views_growth: scale_growth(growth_percent(current_views, predicted_views)),
            growth_baseline_missing: current_engagement_rate == 0.0,
            confidence: confidence_tier(record),
            model_agreement: ModelAgreement {
                engagement: record.engagement_agreement(),
                views: record.views_agreement(),
            },
            growth_percentile,
            growth_category: growth_category(growth_percentile).to_string(),
        }
    }

    /// Predicted minus current engagement rate, in percentage points.
    pub fn engagement_delta(&self) -> f64 {
        self.predicted_engagement_rate - self.current_engagement_rate
    }
}

/// Finds the forecast row for `canonical_id` with the default identity rules.
pub fn find_prediction<'a>(
    canonical_id: &str,
    predictions: &'a [PredictionRecord],
) -> Option<&'a PredictionRecord> {
    find_prediction_with(
        canonical_id,
        predictions,
        &IdentityNormalizer::default(),
        &MatchPolicy::default(),
    )
}

/// Exact case-insensitive match on the normalized name first, then
/// punctuation-stripped equality, then containment if the policy allows it.
pub fn find_prediction_with<'a>(
    canonical_id: &str,
    predictions: &'a [PredictionRecord],
    normalizer: &IdentityNormalizer,
    policy: &MatchPolicy,
) -> Option<&'a PredictionRecord> {
    if canonical_id.trim().is_empty() {
        return None;
    }
    let names: Vec<String> = predictions
        .iter()
        .map(|record| normalizer.normalize(&record.influencer()))
        .collect();
    let lowered = canonical_id.to_lowercase();

    let position = names
        .iter()
        .position(|name| !name.is_empty() && name.to_lowercase() == lowered)
        .or_else(|| names.iter().position(|name| policy.keys_equal(name, canonical_id)))
        .or_else(|| {
            names
                .iter()
                .position(|name| policy.contains_either(name, canonical_id))
        })?;
    predictions.get(position)
}

/// Mean of the two models' raw forecasts for each metric.
pub fn average_prediction(record: &PredictionRecord) -> AveragedPrediction {
    AveragedPrediction {
        engagement_rate: (record.er_lgbm_prediction() + record.er_rf_prediction()) / 2.0,
        views: (record.views_lgbm_prediction() + record.views_rf_prediction()) / 2.0,
    }
}

/// Relative change in percent; 0 when there is no baseline.
pub fn growth_percent(current: f64, predicted: f64) -> f64 {
    if current == 0.0 {
        return 0.0;
    }
    let growth = (predicted - current) / current * 100.0;
    if growth.is_finite() {
        growth
    } else {
        0.0
    }
}

/// Compresses extreme growth figures while keeping order: identity on
/// [-50, 100], logarithmic above 100 and below -50 (floored at -75).
pub fn scale_growth(percent: f64) -> f64 {
    if percent.is_nan() {
        return 0.0;
    }
    if percent > 100.0 {
        100.0 + (percent / 100.0).log10() * 50.0
    } else if percent < -50.0 {
        (-50.0 - (percent.abs() / 50.0).log10() * 25.0).max(-75.0)
    } else {
        percent
    }
}

pub fn confidence_tier(record: &PredictionRecord) -> ConfidenceTier {
    match (record.engagement_agreement(), record.views_agreement()) {
        (true, true) => ConfidenceTier::High,
        (true, false) | (false, true) => ConfidenceTier::Medium,
        (false, false) => ConfidenceTier::Low,
    }
}

/// Midpoint of a percentile bucket label such as `"75-90"`.
pub fn percentile_score(label: &str) -> f64 {
    if label.contains("90-100") {
        95.0
    } else if label.contains("75-90") {
        82.5
    } else if label.contains("50-75") {
        62.5
    } else if label.contains("25-50") {
        37.5
    } else {
        12.5
    }
}

/// Mean bucket midpoint over both metrics and both models.
pub fn growth_percentile(record: &PredictionRecord) -> f64 {
    let labels = record.percentile_labels();
    labels.iter().map(|label| percentile_score(label)).sum::<f64>() / labels.len() as f64
}

pub fn growth_category(percentile: f64) -> &'static str {
    if percentile >= 75.0 {
        "High Growth Potential"
    } else if percentile >= 50.0 {
        "Moderate Growth Potential"
    } else if percentile >= 25.0 {
        "Steady Growth"
    } else {
        "Stable Performance"
    }
}
