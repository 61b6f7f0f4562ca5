use std::path::PathBuf;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_DATASET_PATH: &str = "./常見濫用管制藥品資料集.json";

pub const FIELD_NAME: &str = "藥物名稱";
pub const FIELD_LEVEL: &str = "分級";
pub const FIELD_MEDICAL_USE: &str = "醫療用途";
pub const FIELD_CATEGORY: &str = "類別";
pub const FIELD_ABUSE_METHOD: &str = "濫用方式";
pub const FIELD_ALIAS: &str = "俗名";
pub const FIELD_DESCRIPTION: &str = "說明";
pub const FIELD_IMAGES: &str = "圖片";
pub const FIELD_IMAGE_CAPTIONS: &str = "圖片文字";

/// One catalog row. Read-only once loaded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Entry {
    /// Position in the source array.
    #[serde(skip)]
    pub id: usize,
    #[serde(rename = "藥物名稱")]
    pub name: String,
    #[serde(rename = "分級")]
    pub level: String,
    #[serde(rename = "醫療用途")]
    pub medical_use: String,
    #[serde(rename = "類別")]
    pub category: String,
    #[serde(rename = "濫用方式")]
    pub abuse_method: String,
    #[serde(rename = "俗名")]
    pub alias: String,
    #[serde(rename = "說明")]
    pub description: String,
    #[serde(rename = "圖片")]
    pub images: String,
    #[serde(rename = "圖片文字")]
    pub image_captions: String,
}

fn text_field(obj: &Map<String, Value>, key: &str) -> String {
    match obj.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(true)) => "true".to_string(),
        Some(Value::Number(n)) if n.as_f64() != Some(0.0) => n.to_string(),
        _ => String::new(),
    }
}

impl Entry {
    /// Builds an entry from one array element; missing or non-text fields
    /// come out empty and non-objects yield an all-empty entry.
    pub fn from_value(id: usize, value: &Value) -> Self {
        let Some(obj) = value.as_object() else {
            return Self {
                id,
                ..Self::default()
            };
        };
        Self {
            id,
            name: text_field(obj, FIELD_NAME),
            level: text_field(obj, FIELD_LEVEL),
            medical_use: text_field(obj, FIELD_MEDICAL_USE),
            category: text_field(obj, FIELD_CATEGORY),
            abuse_method: text_field(obj, FIELD_ABUSE_METHOD),
            alias: text_field(obj, FIELD_ALIAS),
            description: text_field(obj, FIELD_DESCRIPTION),
            images: text_field(obj, FIELD_IMAGES),
            image_captions: text_field(obj, FIELD_IMAGE_CAPTIONS),
        }
    }

    /// Labelled fields shown on cards and in the detail view, empty ones
    /// left out.
    pub fn info_rows(&self) -> Vec<(&'static str, &str)> {
        [
            (FIELD_LEVEL, self.level.as_str()),
            (FIELD_CATEGORY, self.category.as_str()),
            (FIELD_MEDICAL_USE, self.medical_use.as_str()),
            (FIELD_ABUSE_METHOD, self.abuse_method.as_str()),
            (FIELD_ALIAS, self.alias.as_str()),
        ]
        .into_iter()
        .filter(|(_, v)| !v.is_empty())
        .collect()
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DatasetSource {
    Path(PathBuf),
    Url(String),
}

impl DatasetSource {
    pub fn parse(value: &str) -> Option<Self> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return None;
        }
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            return Some(Self::Url(trimmed.to_string()));
        }
        Some(Self::Path(crate::config::expand_tilde(trimmed)))
    }

    pub fn describe(&self) -> String {
        match self {
            Self::Path(p) => p.display().to_string(),
            Self::Url(u) => u.clone(),
        }
    }
}

impl Default for DatasetSource {
    fn default() -> Self {
        Self::Path(PathBuf::from(DEFAULT_DATASET_PATH))
    }
}

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("dataset source is empty")]
    EmptySource,

    #[error("failed to read dataset file: {path}: {source}")]
    FileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to fetch dataset: {url}: {source}")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("failed to fetch dataset: {url}: HTTP {status}")]
    HttpStatus { url: String, status: u16 },

    #[error("failed to parse dataset JSON: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
    },
}

/// Parses dataset text. Anything other than a JSON array is an empty dataset.
/// A leading byte order mark is ignored.
pub fn parse_dataset(text: &str) -> Result<Vec<Entry>, DatasetError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let json: Value =
        serde_json::from_str(text).map_err(|source| DatasetError::Parse { source })?;
    let Value::Array(items) = json else {
        warn!("dataset is not a JSON array, treating it as empty");
        return Ok(Vec::new());
    };
    let entries: Vec<Entry> = items
        .iter()
        .enumerate()
        .map(|(id, v)| Entry::from_value(id, v))
        .collect();
    debug!(count = entries.len(), "parsed dataset entries");
    Ok(entries)
}

async fn fetch_text(url: &str) -> Result<String, DatasetError> {
    let resp = reqwest::get(url)
        .await
        .map_err(|source| DatasetError::HttpRequest {
            url: url.to_string(),
            source,
        })?;
    let status = resp.status();
    if !status.is_success() {
        return Err(DatasetError::HttpStatus {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }
    resp.text().await.map_err(|source| DatasetError::HttpRequest {
        url: url.to_string(),
        source,
    })
}

pub async fn load_dataset(source: &DatasetSource) -> Result<Vec<Entry>, DatasetError> {
    debug!(source = %source.describe(), "loading dataset");
    let text = match source {
        DatasetSource::Path(path) => {
            if path.as_os_str().is_empty() {
                return Err(DatasetError::EmptySource);
            }
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| DatasetError::FileRead {
                    path: path.display().to_string(),
                    source,
                })?
        }
        DatasetSource::Url(url) => fetch_text(url).await?,
    };
    parse_dataset(&text)
}
