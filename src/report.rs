//! Per-file output of the `predict` command.

use std::fmt;
use std::path::Path;

use serde::Serialize;

use crate::condition::PredictionResult;

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum FileReport {
    Classified {
        /// Lossy for non-UTF-8 names so a report can always be printed.
        path: String,
        #[serde(flatten)]
        result: PredictionResult,
    },
    Failed {
        path: String,
        error: String,
    },
}

impl FileReport {
    pub fn new(path: &Path, outcome: anyhow::Result<PredictionResult>) -> Self {
        let path = path.display().to_string();
        match outcome {
            Ok(result) => Self::Classified { path, result },
            Err(err) => Self::Failed {
                path,
                error: format!("{err:#}"),
            },
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }

    pub fn to_json(&self) -> String {
        // Strings and numbers only
        serde_json::to_string(self).unwrap_or_default()
    }
}

impl fmt::Display for FileReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Classified { path, result } => {
                write!(f, "{path}: {result}\n  {}", result.description)
            }
            Self::Failed { path, error } => write!(f, "{path}: error: {error}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::condition::present;

    #[test]
    fn classified_json_is_flat() {
        let result = present(&[0.9, 0.05, 0.05]).unwrap();
        let report = FileReport::new(Path::new("nails/a.jpg"), Ok(result));
        assert!(!report.is_failure());

        let json: Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["path"], "nails/a.jpg");
        assert_eq!(json["label"], "Healthy");
        assert_eq!(json["class_index"], 0);
    }

    #[test]
    fn failure_keeps_error_chain() {
        let err = anyhow::anyhow!("truncated").context("failed to decode image");
        let report = FileReport::new(Path::new("b.png"), Err(err));
        assert!(report.is_failure());
        assert_eq!(report.to_string(), "b.png: error: failed to decode image: truncated");

        let json: Value = serde_json::from_str(&report.to_json()).unwrap();
        assert_eq!(json["error"], "failed to decode image: truncated");
    }

    #[cfg(unix)]
    #[test]
    fn non_utf8_path_still_serializes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let path = Path::new(OsStr::from_bytes(b"nail-\xff.png"));
        let report = FileReport::new(path, Err(anyhow::anyhow!("missing")));

        let json: Value = serde_json::from_str(&report.to_json()).unwrap();
        assert!(json["path"].as_str().unwrap().starts_with("nail-"));
        assert!(json["path"].as_str().unwrap().ends_with(".png"));
    }
}
