//! Detection history records.
//!
//! A record is one detection session: the captured image, the detections
//! found in it and an optional location. Stores keep records newest first.
//! Durable persistence is up to the embedding application; this module
//! fixes the record shape and its JSON encoding, plus a plain JSON file
//! helper for the CLI.
//!
//! The encoding is this crate's own: ids are 32 hex chars, `recorded_at` is
//! RFC 3339 and `image_data` is a hex string. It is not readable as the
//! iOS app's `UserDefaults` history (base64 data, reference-date seconds).

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::catalog::DefectClass;
use crate::detect::Detection;

/// Where a session was recorded.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub latitude: f64,
    pub longitude: f64,
    pub address: Option<String>,
}

impl LocationData {
    pub fn new(latitude: f64, longitude: f64, address: Option<String>) -> Result<Self> {
        if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
            return Err(anyhow!(
                "coordinates out of range: ({}, {})",
                latitude,
                longitude
            ));
        }
        Ok(Self {
            latitude,
            longitude,
            address,
        })
    }
}

/// One stored detection session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DetectionRecord {
    pub id: String,
    pub recorded_at: DateTime<Utc>,
    #[serde(with = "hex::serde")]
    pub image_data: Vec<u8>,
    pub detections: Vec<Detection>,
    pub location: Option<LocationData>,
}

impl DetectionRecord {
    /// New record with a random id, stamped now.
    pub fn new(image_data: Vec<u8>, detections: Vec<Detection>, location: Option<LocationData>) -> Self {
        Self {
            id: new_record_id(),
            recorded_at: Utc::now(),
            image_data,
            detections,
            location,
        }
    }

    pub fn contains_class(&self, class: DefectClass) -> bool {
        self.detections.iter().any(|d| d.class_name == class)
    }

    /// Distinct classes in first-seen order.
    pub fn classes(&self) -> Vec<DefectClass> {
        let mut seen = Vec::new();
        for d in &self.detections {
            if !seen.contains(&d.class_name) {
                seen.push(d.class_name);
            }
        }
        seen
    }
}

fn new_record_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Ordered collection of detection sessions, newest first.
pub trait HistoryStore {
    /// Insert a record at the front.
    fn save(&mut self, record: DetectionRecord) -> Result<()>;

    /// Remove a record by id. Returns whether anything was removed.
    fn delete(&mut self, id: &str) -> Result<bool>;

    fn delete_all(&mut self) -> Result<()>;

    fn records(&self) -> Vec<DetectionRecord>;

    /// Records containing at least one detection of `class`, newest first.
    fn records_filtered_by(&self, class: DefectClass) -> Vec<DetectionRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.contains_class(class))
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct InMemoryHistoryStore {
    records: Vec<DetectionRecord>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wrap already-decoded records, kept in their given (newest first) order.
    pub fn from_records(records: Vec<DetectionRecord>) -> Self {
        Self { records }
    }

    /// Restore a store from previously encoded history.
    pub fn from_encoded(bytes: &[u8]) -> Self {
        Self {
            records: decode_history(bytes),
        }
    }

    pub fn encoded(&self) -> Result<Vec<u8>> {
        encode_history(&self.records)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl HistoryStore for InMemoryHistoryStore {
    fn save(&mut self, record: DetectionRecord) -> Result<()> {
        if self.records.iter().any(|r| r.id == record.id) {
            return Err(anyhow!("record '{}' already stored", record.id));
        }
        self.records.insert(0, record);
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<bool> {
        let before = self.records.len();
        self.records.retain(|r| r.id != id);
        Ok(self.records.len() != before)
    }

    fn delete_all(&mut self) -> Result<()> {
        self.records.clear();
        Ok(())
    }

    fn records(&self) -> Vec<DetectionRecord> {
        self.records.clone()
    }
}

/// Encode a record list as JSON.
pub fn encode_history(records: &[DetectionRecord]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(records)?)
}

/// Decode a record list, reporting corrupt data as an error.
///
/// Empty input is an empty history.
pub fn try_decode_history(bytes: &[u8]) -> Result<Vec<DetectionRecord>> {
    if bytes.is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_slice(bytes).context("unreadable detection history")
}

/// Decode a record list. Corrupt data yields an empty history.
pub fn decode_history(bytes: &[u8]) -> Vec<DetectionRecord> {
    match try_decode_history(bytes) {
        Ok(records) => records,
        Err(err) => {
            log::warn!("discarding {:#}", err);
            Vec::new()
        }
    }
}

/// Insert `record` at the front of the JSON history file at `path`.
///
/// A missing file starts a new history. An existing file that does not
/// decode is an error and is left as it is. Returns the new record count.
pub fn append_to_file(path: &Path, record: DetectionRecord) -> Result<usize> {
    let mut store = match std::fs::read(path) {
        Ok(bytes) => {
            let records = try_decode_history(&bytes).with_context(|| {
                format!("refusing to overwrite history {}", path.display())
            })?;
            InMemoryHistoryStore::from_records(records)
        }
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => InMemoryHistoryStore::new(),
        Err(err) => {
            return Err(anyhow!("failed to read history {}: {}", path.display(), err));
        }
    };
    store.save(record)?;
    std::fs::write(path, store.encoded()?)
        .with_context(|| format!("failed to write history {}", path.display()))?;
    Ok(store.len())
}
