//! JSON annotation records and the directory-backed store.

use log::debug;
use scanmark_core::{BBox, ExpectedDetection};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Minimum IoU applied when a record does not specify one.
pub const DEFAULT_MIN_IOU: f64 = 0.5;

fn default_min_iou() -> f64 {
    DEFAULT_MIN_IOU
}

/// Errors from loading, validating or persisting annotation records.
///
/// A structural violation means a broken test fixture, not a transient
/// condition; callers are expected to abort the whole run on it.
#[derive(thiserror::Error, Debug)]
pub enum AnnotationError {
    #[error("no annotation record for `{identifier}`")]
    NotFound { identifier: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid annotation `{identifier}`: expected_detections[{index}].{field}: {detail}")]
    Invalid {
        identifier: String,
        index: usize,
        field: &'static str,
        detail: String,
    },
}

/// Ground truth for one test image.
///
/// The serialized field names (`description`, `image`, `expected_detections`
/// with `data`/`bbox`, `min_iou`) are an external contract shared with the
/// annotation tooling; records are pretty-printed JSON so they can be
/// hand-corrected.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AnnotationRecord {
    #[serde(default)]
    pub description: String,
    /// File name of the test image, relative to the store directory.
    pub image: String,
    pub expected_detections: Vec<ExpectedDetection>,
    #[serde(default = "default_min_iou")]
    pub min_iou: f64,
}

impl AnnotationRecord {
    /// Store identifier of this record: the image file stem.
    pub fn identifier(&self) -> String {
        Path::new(&self.image)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.image.clone())
    }
}

/// Serde mirror used on load, so structural violations are reported with
/// the offending index instead of a bare parse error.
#[derive(Deserialize)]
struct RawRecord {
    #[serde(default)]
    description: String,
    image: String,
    #[serde(default)]
    expected_detections: Vec<RawExpected>,
    #[serde(default = "default_min_iou")]
    min_iou: f64,
}

#[derive(Deserialize)]
struct RawExpected {
    #[serde(default)]
    data: Option<String>,
    bbox: BBox,
}

impl RawRecord {
    fn validate(self, identifier: &str) -> Result<AnnotationRecord, AnnotationError> {
        let invalid = |index, field, detail: String| AnnotationError::Invalid {
            identifier: identifier.to_owned(),
            index,
            field,
            detail,
        };

        let mut expected = Vec::with_capacity(self.expected_detections.len());
        for (index, raw) in self.expected_detections.into_iter().enumerate() {
            let Some(data) = raw.data else {
                return Err(invalid(index, "data", "missing or null".to_owned()));
            };
            if raw.bbox.x_min >= raw.bbox.x_max {
                return Err(invalid(
                    index,
                    "bbox",
                    format!(
                        "x_min ({}) must be < x_max ({})",
                        raw.bbox.x_min, raw.bbox.x_max
                    ),
                ));
            }
            if raw.bbox.y_min >= raw.bbox.y_max {
                return Err(invalid(
                    index,
                    "bbox",
                    format!(
                        "y_min ({}) must be < y_max ({})",
                        raw.bbox.y_min, raw.bbox.y_max
                    ),
                ));
            }
            expected.push(ExpectedDetection {
                data,
                bbox: raw.bbox,
            });
        }

        Ok(AnnotationRecord {
            description: self.description,
            image: self.image,
            expected_detections: expected,
            min_iou: self.min_iou,
        })
    }
}

/// Directory-backed store of annotation records, one JSON file per image.
///
/// Reads of distinct records are independent; serializing concurrent writes
/// to the same identifier is the caller's responsibility.
#[derive(Clone, Debug)]
pub struct AnnotationStore {
    root: PathBuf,
}

impl AnnotationStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[inline]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of the record file for `identifier`.
    pub fn record_path(&self, identifier: &str) -> PathBuf {
        self.root.join(format!("{identifier}.json"))
    }

    /// Load and structurally validate the record for `identifier`.
    pub fn load(&self, identifier: &str) -> Result<AnnotationRecord, AnnotationError> {
        let path = self.record_path(identifier);
        let raw_text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(AnnotationError::NotFound {
                    identifier: identifier.to_owned(),
                })
            }
            Err(err) => return Err(err.into()),
        };
        let raw: RawRecord = serde_json::from_str(&raw_text)?;
        raw.validate(identifier)
    }

    /// Persist `record` as pretty JSON, overwriting any previous version.
    pub fn save(&self, record: &AnnotationRecord) -> Result<(), AnnotationError> {
        let path = self.record_path(&record.identifier());
        let json = serde_json::to_string_pretty(record)?;
        fs::write(&path, json)?;
        debug!("wrote annotation record to {}", path.display());
        Ok(())
    }

    /// Identifiers of every record file in the store directory, sorted.
    pub fn discover(&self) -> Result<Vec<String>, AnnotationError> {
        let mut identifiers = Vec::new();
        for entry in fs::read_dir(&self.root)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                identifiers.push(stem.to_owned());
            }
        }
        identifiers.sort();
        Ok(identifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(image: &str) -> AnnotationRecord {
        AnnotationRecord {
            description: "one code in the corner".to_owned(),
            image: image.to_owned(),
            expected_detections: vec![ExpectedDetection {
                data: "QR_00".to_owned(),
                bbox: BBox::new(100, 100, 300, 300),
            }],
            min_iou: 0.5,
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());

        let original = record("board.png");
        store.save(&original).unwrap();

        let loaded = store.load("board").unwrap();
        assert_eq!(loaded.description, original.description);
        assert_eq!(loaded.image, "board.png");
        assert_eq!(loaded.expected_detections, original.expected_detections);
        assert_eq!(loaded.min_iou, 0.5);
    }

    #[test]
    fn identifier_is_the_image_stem() {
        assert_eq!(record("shelf_3.jpeg").identifier(), "shelf_3");
    }

    #[test]
    fn missing_record_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        let err = store.load("nope").unwrap_err();
        assert!(matches!(err, AnnotationError::NotFound { identifier } if identifier == "nope"));
    }

    #[test]
    fn min_iou_defaults_when_omitted() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        fs::write(
            store.record_path("a"),
            r#"{"image": "a.png", "expected_detections": []}"#,
        )
        .unwrap();
        let rec = store.load("a").unwrap();
        assert_eq!(rec.min_iou, DEFAULT_MIN_IOU);
        assert_eq!(rec.description, "");
        assert!(rec.expected_detections.is_empty());
    }

    #[test]
    fn inverted_bbox_is_reported_with_its_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        fs::write(
            store.record_path("bad"),
            r#"{
                "image": "bad.png",
                "expected_detections": [
                    {"data": "ok", "bbox": {"x_min": 0, "y_min": 0, "x_max": 10, "y_max": 10}},
                    {"data": "bad", "bbox": {"x_min": 50, "y_min": 0, "x_max": 40, "y_max": 10}}
                ]
            }"#,
        )
        .unwrap();
        let err = store.load("bad").unwrap_err();
        match err {
            AnnotationError::Invalid {
                identifier,
                index,
                field,
                ..
            } => {
                assert_eq!(identifier, "bad");
                assert_eq!(index, 1);
                assert_eq!(field, "bbox");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn null_data_is_reported_with_its_index() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        fs::write(
            store.record_path("nulled"),
            r#"{
                "image": "nulled.png",
                "expected_detections": [
                    {"data": null, "bbox": {"x_min": 0, "y_min": 0, "x_max": 10, "y_max": 10}}
                ]
            }"#,
        )
        .unwrap();
        let err = store.load("nulled").unwrap_err();
        assert!(matches!(
            err,
            AnnotationError::Invalid {
                index: 0,
                field: "data",
                ..
            }
        ));
    }

    #[test]
    fn discover_lists_json_stems_sorted() {
        let dir = tempfile::tempdir().unwrap();
        let store = AnnotationStore::new(dir.path());
        for name in ["b.json", "a.json", "c.png", "notes.txt"] {
            fs::write(dir.path().join(name), "{}").unwrap();
        }
        assert_eq!(store.discover().unwrap(), vec!["a", "b"]);
    }
}
