use serde::{Deserialize, Serialize};

use crate::domain::{Page, Record};

/// Query string of `GET /data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: u32,
    pub limit: u32,
}

/// Body of `GET /data`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    #[serde(rename = "totalPages")]
    pub total_pages: u32,
    pub data: Vec<Record>,
}

impl PageResponse {
    /// Converts the wire body into a [`Page`]. An empty table reports
    /// `totalPages = 0`, which is normalized to a single empty page.
    pub fn into_page(self) -> Page {
        Page {
            page_number: self.page.max(1),
            page_size: self.limit.max(1),
            total_records: self.total,
            total_pages: self.total_pages.max(1),
            records: self.data,
        }
    }
}

/// Body of `PATCH /data/{id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRecordRequest {
    pub text: String,
    pub is_correct: bool,
}
