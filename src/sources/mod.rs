pub mod records;

use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::SourcePaths;
use crate::error::SourceError;

pub use records::{FinancialSummary, LooseValue, PredictionRecord, RawCampaignRecord, RawPost};

/// Reads the four raw collections. Implementations fail soft: a missing or
/// malformed collection comes back empty and a bad record is skipped, so
/// callers never see an error.
pub trait SourceLoader: Send + Sync {
    fn load_posts(&self) -> Vec<RawPost>;
    fn load_campaigns(&self) -> Vec<RawCampaignRecord>;
    fn load_financials(&self) -> BTreeMap<String, FinancialSummary>;
    fn load_predictions(&self) -> Vec<PredictionRecord>;
}

/// In-memory copy of every source, taken once and shared by reference.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub posts: Vec<RawPost>,
    pub campaigns: Vec<RawCampaignRecord>,
    pub financials: BTreeMap<String, FinancialSummary>,
    pub predictions: Vec<PredictionRecord>,
}

impl SourceSet {
    pub fn load(loader: &dyn SourceLoader) -> Self {
        let sources = Self {
            posts: loader.load_posts(),
            campaigns: loader.load_campaigns(),
            financials: loader.load_financials(),
            predictions: loader.load_predictions(),
        };
        info!(
            posts = sources.posts.len(),
            campaigns = sources.campaigns.len(),
            financials = sources.financials.len(),
            predictions = sources.predictions.len(),
            "sources loaded"
        );
        sources
    }

    pub fn is_empty(&self) -> bool {
        self.posts.is_empty()
            && self.campaigns.is_empty()
            && self.financials.is_empty()
            && self.predictions.is_empty()
    }
}

impl SourceLoader for SourceSet {
    fn load_posts(&self) -> Vec<RawPost> {
        self.posts.clone()
    }

    fn load_campaigns(&self) -> Vec<RawCampaignRecord> {
        self.campaigns.clone()
    }

    fn load_financials(&self) -> BTreeMap<String, FinancialSummary> {
        self.financials.clone()
    }

    fn load_predictions(&self) -> Vec<PredictionRecord> {
        self.predictions.clone()
    }
}

/// Loads each collection from a JSON file or a directory of `*.json` files.
#[derive(Debug, Clone)]
pub struct FileSourceLoader {
    paths: SourcePaths,
}

impl FileSourceLoader {
    pub fn new(paths: SourcePaths) -> Self {
        Self { paths }
    }

    pub fn paths(&self) -> &SourcePaths {
        &self.paths
    }
}

impl SourceLoader for FileSourceLoader {
    fn load_posts(&self) -> Vec<RawPost> {
        load_records(&self.paths.posts, "posts", |post: &mut RawPost, stem| {
            if post.influencer_id().is_empty() {
                post.influencer_id = Some(LooseValue::from(stem));
            }
        })
    }

    fn load_campaigns(&self) -> Vec<RawCampaignRecord> {
        load_records(
            &self.paths.campaigns,
            "campaigns",
            |record: &mut RawCampaignRecord, stem| {
                if record.handle().is_empty() {
                    record.handle = Some(LooseValue::from(stem));
                }
            },
        )
    }

    fn load_financials(&self) -> BTreeMap<String, FinancialSummary> {
        let mut summaries = BTreeMap::new();
        for path in soft(json_files(&self.paths.financials), "financials") {
            let Some(stem) = file_stem(&path) else {
                continue;
            };
            match read_financial(&path) {
                Ok(Some(summary)) => {
                    summaries.insert(stem, summary);
                }
                Ok(None) => debug!(path = %path.display(), "financial summary file is empty"),
                Err(err) => warn!(error = %err, "skipping financial summary"),
            }
        }
        summaries
    }

    fn load_predictions(&self) -> Vec<PredictionRecord> {
        load_records(&self.paths.predictions, "predictions", |_: &mut PredictionRecord, _| {})
    }
}

fn load_records<T, F>(path: &Path, label: &'static str, fill_from_stem: F) -> Vec<T>
where
    T: DeserializeOwned,
    F: Fn(&mut T, &str),
{
    let mut records = Vec::new();
    for file in soft(json_files(path), label) {
        let stem = file_stem(&file).unwrap_or_default();
        let items = match read_json(&file).and_then(|value| into_array(&file, value)) {
            Ok(items) => items,
            Err(err) => {
                warn!(source = label, error = %err, "skipping source file");
                continue;
            }
        };
        for (index, item) in items.into_iter().enumerate() {
            match serde_json::from_value::<T>(item) {
                Ok(mut record) => {
                    fill_from_stem(&mut record, &stem);
                    records.push(record);
                }
                Err(err) => debug!(
                    source = label,
                    file = %file.display(),
                    index,
                    error = %err,
                    "dropping unparseable record"
                ),
            }
        }
    }
    records
}

fn soft(result: Result<Vec<PathBuf>, SourceError>, label: &'static str) -> Vec<PathBuf> {
    result.unwrap_or_else(|err| {
        warn!(source = label, error = %err, "source unavailable, treating as empty");
        Vec::new()
    })
}

fn json_files(path: &Path) -> Result<Vec<PathBuf>, SourceError> {
    if !path.exists() {
        warn!(path = %path.display(), "source path does not exist");
        return Ok(Vec::new());
    }
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let entries = std::fs::read_dir(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|entry| entry.path()))
        .filter(|candidate| {
            candidate.is_file()
                && candidate
                    .extension()
                    .map(|ext| ext.eq_ignore_ascii_case("json"))
                    .unwrap_or(false)
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_json(path: &Path) -> Result<Value, SourceError> {
    let contents = std::fs::read_to_string(path).map_err(|source| SourceError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    if contents.trim().is_empty() {
        return Ok(Value::Array(Vec::new()));
    }
    serde_json::from_str(&contents).map_err(|source| SourceError::Json {
        path: path.to_path_buf(),
        source,
    })
}

fn into_array(path: &Path, value: Value) -> Result<Vec<Value>, SourceError> {
    match value {
        Value::Array(items) => Ok(items),
        _ => Err(SourceError::UnexpectedShape {
            path: path.to_path_buf(),
            expected: "a JSON array of records",
        }),
    }
}

fn read_financial(path: &Path) -> Result<Option<FinancialSummary>, SourceError> {
    let value = match read_json(path)? {
        Value::Array(items) => match items.into_iter().next() {
            Some(first) => first,
            None => return Ok(None),
        },
        object @ Value::Object(_) => object,
        _ => {
            return Err(SourceError::UnexpectedShape {
                path: path.to_path_buf(),
                expected: "a JSON object",
            })
        }
    };
    serde_json::from_value(value)
        .map(Some)
        .map_err(|source| SourceError::Json {
            path: path.to_path_buf(),
            source,
        })
}

fn file_stem(path: &Path) -> Option<String> {
    path.file_stem()
        .and_then(|stem| stem.to_str())
        .map(|stem| stem.to_string())
}
