//! Content-analysis profile over the organic posts' loose attribute columns.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::metrics::mean;
use crate::sources::RawPost;

const TONE: &str = "Audio & prosody_tone";
const MUSIC: &str = "Audio & prosody_music";
const ASMR: &str = "Audio & prosody_asmr";
const SPEAKERS: &str = "Audio & prosody_num_speakers";
const SPEECH_RATE: &str = "Audio & prosody_speech_rate";

const SCENE_TYPE: &str = "Visual Content Semantics_primary_scene_type";
const CLOSE_UP_HOOK: &str = "Visual Content Semantics_close_up_hook";
const ACTION_HOOK: &str = "Visual Content Semantics_action_or_movement_hook";
const NUM_PETS: &str = "Visual Content Semantics_num_of_pets";
const ANIMAL_SCREEN_TIME: &str = "Visual Content Semantics_animal_screen_time_percentage";
const HUMAN_SCREEN_TIME: &str = "Visual Content Semantics_human_screen_time_percentage";
const BRAND_LOGOS: &str = "Visual Content Semantics_detected_brand_logos";
const PET_BREED: &str = "Visual Content Semantics_pet_breed";
const TOTAL_CUTS: &str = "Temporal dynamics_total_cuts";

const VIEWER_EMOTIONS: &str = "Emotion & affect_top_viewer_emotions";

const AUTHENTICITY_MARKERS: &str = "Trust & authority cues_authenticity_markers";

const BRAND_FIT_LEVEL: &str = "Narrative & topic_audience_brand_fit_fit_level";

// (label, column, weight in the trust score)
const TRUST_CUES: [(&str, &str, f64); 5] = [
    (
        "Expert Titles Visible",
        "Trust & authority cues_expert_titles_visible",
        0.25,
    ),
    (
        "Scientific References",
        "Trust & authority cues_scientific_refs_spoken",
        0.25,
    ),
    (
        "Brand Collaboration Disclosed",
        "Trust & authority cues_brand_collab_disclosed",
        0.15,
    ),
    (
        "Face Visible",
        "Trust & authority cues_influencer_face_visible",
        0.20,
    ),
    (
        "Eye Contact with Camera",
        "Trust & authority cues_eye_contact_with_camera",
        0.15,
    ),
];

const QUALITY_SCORES: [(&str, &str); 5] = [
    (
        "Hook Effectiveness",
        "Narrative & topic_hook_effectiveness_score",
    ),
    (
        "Emotional Resonance",
        "Emotion & affect_emotional_resonance_score",
    ),
    (
        "Production Quality",
        "Visual Style & Production_overall_quality_score",
    ),
    (
        "Narrative Clarity",
        "Narrative & topic_narrative_clarity_score",
    ),
    ("Brand Fit", "Narrative & topic_audience_brand_fit_score"),
];

const TOP_BRANDS: usize = 10;
const TOP_BREEDS: usize = 10;
const TOP_EMOTIONS: usize = 4;
const TOP_MARKERS: usize = 5;

/// A label with its count and rounded share of the total, in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Share {
    pub name: String,
    pub count: usize,
    pub percentage: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AudioProfile {
    pub tones: Vec<Share>,
    pub music_share: f64,
    pub asmr_share: f64,
    pub avg_speakers: f64,
    pub dominant_speech_rate: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisualProfile {
    pub scene_types: Vec<Share>,
    pub close_up_hook_share: f64,
    pub action_hook_share: f64,
    pub avg_pets: f64,
    pub avg_cuts: f64,
    pub avg_animal_screen_time: f64,
    pub avg_human_screen_time: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrustCue {
    pub cue: String,
    pub percentage: f64,
    pub present: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrustProfile {
    pub cues: Vec<TrustCue>,
    pub authenticity_markers: Vec<Share>,
    pub trust_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityScore {
    pub metric: String,
    pub score: f64,
    pub max_score: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QualityProfile {
    /// Only scores some post actually reported.
    pub scores: Vec<QualityScore>,
    pub overall: f64,
    pub brand_fit: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentProfile {
    pub post_count: usize,
    pub audio: AudioProfile,
    pub visual: VisualProfile,
    pub brands: Vec<Share>,
    pub breeds: Vec<Share>,
    pub emotions: Vec<Share>,
    pub trust: TrustProfile,
    pub quality: QualityProfile,
}

pub fn profile(posts: &[&RawPost]) -> ContentProfile {
    if posts.is_empty() {
        return ContentProfile::default();
    }

    ContentProfile {
        post_count: posts.len(),
        audio: audio_profile(posts),
        visual: visual_profile(posts),
        brands: top_shares(posts.iter().flat_map(|post| post.attribute_list(BRAND_LOGOS)), TOP_BRANDS),
        breeds: top_shares(posts.iter().flat_map(|post| post.attribute_list(PET_BREED)), TOP_BREEDS),
        emotions: top_shares(
            posts.iter().flat_map(|post| post.attribute_list(VIEWER_EMOTIONS)),
            TOP_EMOTIONS,
        ),
        trust: trust_profile(posts),
        quality: quality_profile(posts),
    }
}

fn audio_profile(posts: &[&RawPost]) -> AudioProfile {
    AudioProfile {
        tones: top_shares(
            posts.iter().filter_map(|post| post.attribute_text(TONE)),
            usize::MAX,
        ),
        music_share: flag_share(posts, MUSIC),
        asmr_share: flag_share(posts, ASMR),
        avg_speakers: round_to(positive_mean(posts, SPEAKERS), 1),
        dominant_speech_rate: dominant(posts.iter().filter_map(|post| post.attribute_text(SPEECH_RATE))),
    }
}

fn visual_profile(posts: &[&RawPost]) -> VisualProfile {
    VisualProfile {
        scene_types: top_shares(
            posts.iter().filter_map(|post| post.attribute_text(SCENE_TYPE)),
            usize::MAX,
        ),
        close_up_hook_share: flag_share(posts, CLOSE_UP_HOOK),
        action_hook_share: flag_share(posts, ACTION_HOOK),
        avg_pets: round_to(positive_mean(posts, NUM_PETS), 1),
        avg_cuts: round_to(positive_mean(posts, TOTAL_CUTS), 1),
        avg_animal_screen_time: positive_mean(posts, ANIMAL_SCREEN_TIME).round(),
        avg_human_screen_time: positive_mean(posts, HUMAN_SCREEN_TIME).round(),
    }
}

fn trust_profile(posts: &[&RawPost]) -> TrustProfile {
    let total = posts.len() as f64;
    let mut score = 0.0;
    let mut cues = Vec::with_capacity(TRUST_CUES.len());
    for (label, column, weight) in TRUST_CUES {
        let count = posts.iter().filter(|post| post.attribute_flag(column)).count();
        score += count as f64 / total * weight * 100.0;
        cues.push(TrustCue {
            cue: label.to_string(),
            percentage: percentage(count, posts.len()),
            present: count > 0,
        });
    }

    TrustProfile {
        cues,
        authenticity_markers: top_shares(
            posts
                .iter()
                .flat_map(|post| post.attribute_list(AUTHENTICITY_MARKERS)),
            TOP_MARKERS,
        ),
        trust_score: score.round(),
    }
}

fn quality_profile(posts: &[&RawPost]) -> QualityProfile {
    let scores: Vec<QualityScore> = QUALITY_SCORES
        .iter()
        .map(|(metric, column)| QualityScore {
            metric: metric.to_string(),
            score: round_to(positive_mean(posts, column), 1),
            max_score: 5.0,
        })
        .filter(|score| score.score > 0.0)
        .collect();
    let values: Vec<f64> = scores.iter().map(|score| score.score).collect();

    QualityProfile {
        overall: round_to(mean(&values), 1),
        scores,
        brand_fit: dominant(
            posts
                .iter()
                .filter_map(|post| post.attribute_text(BRAND_FIT_LEVEL)),
        ),
    }
}

/// Share of posts whose flag column is true, as a rounded percentage.
fn flag_share(posts: &[&RawPost], column: &str) -> f64 {
    let count = posts.iter().filter(|post| post.attribute_flag(column)).count();
    percentage(count, posts.len())
}

/// Mean over the posts that report a positive value for `column`.
fn positive_mean(posts: &[&RawPost], column: &str) -> f64 {
    let values: Vec<f64> = posts
        .iter()
        .map(|post| post.attribute_number(column))
        .filter(|value| *value > 0.0)
        .collect();
    mean(&values)
}

/// Counts capitalized labels, most frequent first (ties by name), keeping `limit`.
fn top_shares(labels: impl Iterator<Item = String>, limit: usize) -> Vec<Share> {
    let counts = tally(labels);
    let total: usize = counts.values().sum();
    let mut shares: Vec<Share> = counts
        .into_iter()
        .map(|(name, count)| Share {
            percentage: percentage(count, total),
            name,
            count,
        })
        .collect();
    shares.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    shares.truncate(limit);
    shares
}

fn dominant(labels: impl Iterator<Item = String>) -> Option<String> {
    top_shares(labels, 1).into_iter().next().map(|share| share.name)
}

fn tally(labels: impl Iterator<Item = String>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for label in labels {
        let label = capitalize(label.trim());
        if label.is_empty() {
            continue;
        }
        *counts.entry(label).or_insert(0) += 1;
    }
    counts
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    (count as f64 / total as f64 * 100.0).round()
}

fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}
