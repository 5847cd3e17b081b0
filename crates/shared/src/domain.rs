use std::fmt;

use serde::{Deserialize, Serialize};

/// Number of leading characters stripped from a stored `file_name` before it
/// is used as the `/file/{name}` path segment.
pub const DEFAULT_AUDIO_PREFIX_LEN: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub i64);

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque locator of a record's audio as stored by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AudioRef(pub String);

impl AudioRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name served under `/file/`: the stored name minus its first
    /// `prefix_len` characters. Names shorter than the prefix map to "".
    pub fn relative_name(&self, prefix_len: usize) -> &str {
        match self.0.char_indices().nth(prefix_len) {
            Some((offset, _)) => &self.0[offset..],
            None => "",
        }
    }
}

/// One transcribed audio sample as owned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub id: RecordId,
    pub text: String,
    #[serde(rename = "file_name")]
    pub audio_ref: AudioRef,
    pub is_correct: bool,
}

impl Record {
    pub fn fields(&self) -> RecordFields {
        RecordFields {
            text: self.text.clone(),
            is_correct: self.is_correct,
        }
    }
}

/// The operator-editable part of a record.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RecordFields {
    pub text: String,
    pub is_correct: bool,
}

/// One fetched batch of records plus pagination metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub page_number: u32,
    pub page_size: u32,
    pub total_records: u64,
    pub total_pages: u32,
    pub records: Vec<Record>,
}

impl Page {
    pub fn empty(page_size: u32) -> Self {
        Self {
            page_number: 1,
            page_size,
            total_records: 0,
            total_pages: 1,
            records: Vec::new(),
        }
    }

    pub fn record(&self, id: RecordId) -> Option<&Record> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
