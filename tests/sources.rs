use pawrank::config::SourcePaths;
use pawrank::sources::{FileSourceLoader, LooseValue, SourceLoader, SourceSet};
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn write(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create dir");
    }
    fs::write(path, contents).expect("write fixture");
}

fn paths(root: &Path) -> SourcePaths {
    SourcePaths {
        posts: root.join("influencers"),
        campaigns: root.join("campaigns"),
        financials: root.join("financials"),
        predictions: root.join("predictions.json"),
    }
}

#[test]
fn missing_sources_load_as_empty() {
    let dir = TempDir::new().expect("tempdir");
    let loader = FileSourceLoader::new(paths(dir.path()));
    let sources = SourceSet::load(&loader);
    assert!(sources.is_empty());
}

#[test]
fn loads_directories_in_sorted_order() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    write(
        &root.join("campaigns/b_second.json"),
        r#"[{"HANDLE": "@second", "TOTAL LIKES ": "1,200", "ER": "4.5%"}]"#,
    );
    write(
        &root.join("campaigns/a_first.json"),
        r#"[{"HANDLE": "@first", "TOTAL LIKES": 10}]"#,
    );
    write(&root.join("campaigns/notes.txt"), "not json");

    let loader = FileSourceLoader::new(paths(root));
    let campaigns = loader.load_campaigns();
    let handles: Vec<String> = campaigns.iter().map(|c| c.handle()).collect();
    assert_eq!(handles, vec!["@first", "@second"]);
    assert!((campaigns[0].likes() - 10.0).abs() < 1e-9);
    assert!((campaigns[1].likes() - 1200.0).abs() < 1e-9);
    assert!((campaigns[1].engagement_rate() - 4.5).abs() < 1e-9);
}

#[test]
fn malformed_files_and_records_are_skipped() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    write(&root.join("influencers/broken.json"), "{ not json");
    write(&root.join("influencers/object.json"), r#"{"InfluencerID": "x"}"#);
    write(
        &root.join("influencers/good.json"),
        r#"[{"InfluencerID": "tabby.tales", "Platform & post metadata_views": "1,000"}, 42]"#,
    );

    let loader = FileSourceLoader::new(paths(root));
    let posts = loader.load_posts();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].influencer_id(), "tabby.tales");
    assert!((posts[0].views() - 1000.0).abs() < 1e-9);
}

#[test]
fn missing_identifiers_fall_back_to_file_stem() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    write(
        &root.join("influencers/corgi_club.json"),
        r#"[{"video_id": "v1", "Audio & prosody_tone": "playful"}]"#,
    );
    write(
        &root.join("campaigns/golden.hour.json"),
        r#"[{"CAMPAIGN": "Fall Walks", "HANDLE": ""}]"#,
    );

    let loader = FileSourceLoader::new(paths(root));
    let posts = loader.load_posts();
    assert_eq!(posts[0].influencer_id(), "corgi_club");
    assert_eq!(posts[0].attribute_text("Audio & prosody_tone").as_deref(), Some("playful"));

    let campaigns = loader.load_campaigns();
    assert_eq!(campaigns[0].handle(), "golden.hour");
}

#[test]
fn financials_are_keyed_by_file_stem() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    write(
        &root.join("financials/corgi_club.json"),
        r#"{"rate": "$500", "total_views": 12000, "avg_roas": "2.5"}"#,
    );
    write(
        &root.join("financials/tabby.tales.json"),
        r#"[{"average_cpe": 0.3}]"#,
    );
    write(&root.join("financials/empty.json"), "[]");

    let loader = FileSourceLoader::new(paths(root));
    let financials = loader.load_financials();
    assert_eq!(financials.len(), 2);
    let corgi = &financials["corgi_club"];
    assert!((corgi.rate() - 500.0).abs() < 1e-9);
    assert!((corgi.views() - 12_000.0).abs() < 1e-9);
    assert!((corgi.avg_roas() - 2.5).abs() < 1e-9);
    assert!((financials["tabby.tales"].avg_cpe() - 0.3).abs() < 1e-9);
}

#[test]
fn predictions_load_from_single_file() {
    let dir = TempDir::new().expect("tempdir");
    let root = dir.path();
    write(
        &root.join("predictions.json"),
        r#"[{"influencer": "corgi_club", "er_direction_agreement": "True", "views_direction_agreement": false}]"#,
    );

    let loader = FileSourceLoader::new(paths(root));
    let predictions = loader.load_predictions();
    assert_eq!(predictions.len(), 1);
    assert!(predictions[0].engagement_agreement());
    assert!(!predictions[0].views_agreement());
}

#[test]
fn loose_values_parse_lists_and_flags() {
    let list = LooseValue::from("['Joy', 'comfort', null, '']");
    assert_eq!(list.as_list(), vec!["Joy".to_string(), "comfort".to_string()]);
    assert!(LooseValue::from("TRUE").is_true());
    assert!(!LooseValue::from("no").is_true());
    assert_eq!(LooseValue::from("null").as_text(), None);
    assert_eq!(LooseValue::from(42.0).as_text().as_deref(), Some("42"));
}
