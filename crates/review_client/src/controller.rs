//! Pagination and write synchronization for the record list.
//!
//! The controller does no I/O. Callers obtain a [`LoadTicket`] or
//! [`PendingWrite`], run the request however they like, and feed the result
//! back. Every load carries a generation; only the newest one is applied.

use std::collections::HashMap;

use shared::{
    domain::{Page, Record, RecordId},
    protocol::{PageQuery, PageResponse, UpdateRecordRequest},
};
use tracing::{debug, error, info};

use crate::{
    error::ClientError,
    widget::{DeleteRequest, SaveRequest},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub generation: u64,
    pub query: PageQuery,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    Applied,
    /// A newer load was issued after this one; the response was dropped.
    Stale,
    /// The request failed; the previous page stays displayed.
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingWrite {
    Save {
        id: RecordId,
        update: UpdateRecordRequest,
    },
    Delete {
        id: RecordId,
    },
}

impl PendingWrite {
    pub fn id(&self) -> RecordId {
        match self {
            Self::Save { id, .. } | Self::Delete { id } => *id,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Save { .. } => "save",
            Self::Delete { .. } => "delete",
        }
    }
}

impl From<SaveRequest> for PendingWrite {
    fn from(request: SaveRequest) -> Self {
        Self::Save {
            id: request.id,
            update: UpdateRecordRequest {
                text: request.text,
                is_correct: request.is_correct,
            },
        }
    }
}

impl From<DeleteRequest> for PendingWrite {
    fn from(request: DeleteRequest) -> Self {
        Self::Delete { id: request.id }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteStatus {
    InFlight(PendingWrite),
    Failed { write: PendingWrite, reason: String },
}

pub struct ListController {
    page_size: u32,
    current_page: u32,
    page: Page,
    loading: bool,
    next_generation: u64,
    latest_generation: Option<u64>,
    write_status: HashMap<RecordId, WriteStatus>,
}

impl ListController {
    pub fn new(page_size: u32) -> Self {
        let page_size = page_size.max(1);
        Self {
            page_size,
            current_page: 1,
            page: Page::empty(page_size),
            loading: false,
            next_generation: 0,
            latest_generation: None,
            write_status: HashMap::new(),
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    /// The page index the operator is on. It can point past the last page
    /// after deletions empty the tail; it is never decremented implicitly.
    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.page.total_pages
    }

    pub fn page(&self) -> &Page {
        &self.page
    }

    pub fn records(&self) -> &[Record] {
        &self.page.records
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn can_go_prev(&self) -> bool {
        self.current_page > 1
    }

    pub fn can_go_next(&self) -> bool {
        self.current_page < self.total_pages()
    }

    pub fn begin_load(&mut self, page: u32) -> LoadTicket {
        let page = page.max(1);
        let generation = self.next_generation;
        self.next_generation += 1;
        self.latest_generation = Some(generation);
        self.current_page = page;
        self.loading = true;
        debug!(page, generation, "page load issued");
        LoadTicket {
            generation,
            query: PageQuery {
                page,
                limit: self.page_size,
            },
        }
    }

    pub fn reload(&mut self) -> LoadTicket {
        self.begin_load(self.current_page)
    }

    pub fn next_page(&mut self) -> Option<LoadTicket> {
        if !self.can_go_next() {
            return None;
        }
        let target = self.clamp_to_pages(self.current_page.saturating_add(1));
        Some(self.begin_load(target))
    }

    pub fn prev_page(&mut self) -> Option<LoadTicket> {
        if !self.can_go_prev() {
            return None;
        }
        let target = self.clamp_to_pages(self.current_page - 1);
        Some(self.begin_load(target))
    }

    /// Jumps to `page`, clamped to the known page range.
    pub fn goto_page(&mut self, page: u32) -> LoadTicket {
        let target = self.clamp_to_pages(page);
        self.begin_load(target)
    }

    fn clamp_to_pages(&self, page: u32) -> u32 {
        page.clamp(1, self.total_pages().max(1))
    }

    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<PageResponse, ClientError>,
    ) -> LoadOutcome {
        if self.latest_generation != Some(ticket.generation) {
            debug!(
                generation = ticket.generation,
                latest = ?self.latest_generation,
                page = ticket.query.page,
                "dropping stale page response"
            );
            return LoadOutcome::Stale;
        }

        self.loading = false;
        match result {
            Ok(body) => {
                self.page = body.into_page();
                let page = &self.page;
                self.write_status.retain(|id, status| {
                    matches!(status, WriteStatus::InFlight(_)) || page.record(*id).is_some()
                });
                info!(
                    page = self.page.page_number,
                    total_pages = self.page.total_pages,
                    records = self.page.records.len(),
                    "page loaded"
                );
                LoadOutcome::Applied
            }
            Err(err) => {
                error!(page = ticket.query.page, "error fetching page: {err}");
                LoadOutcome::Failed
            }
        }
    }

    pub fn begin_write(&mut self, write: impl Into<PendingWrite>) -> PendingWrite {
        let write = write.into();
        debug!(record_id = write.id().0, op = write.label(), "write issued");
        self.write_status
            .insert(write.id(), WriteStatus::InFlight(write.clone()));
        write
    }

    /// Records the outcome of a write. Success clears the record's status
    /// and returns the reload of the current page; failure keeps the write
    /// for [`ListController::retry`].
    pub fn finish_write(
        &mut self,
        write: PendingWrite,
        result: &Result<(), ClientError>,
    ) -> Option<LoadTicket> {
        match result {
            Ok(()) => {
                self.write_status.remove(&write.id());
                Some(self.reload())
            }
            Err(err) => {
                error!(
                    record_id = write.id().0,
                    op = write.label(),
                    "error during {}: {err}",
                    write.label()
                );
                self.write_status.insert(
                    write.id(),
                    WriteStatus::Failed {
                        write,
                        reason: err.to_string(),
                    },
                );
                None
            }
        }
    }

    pub fn write_status(&self, id: RecordId) -> Option<&WriteStatus> {
        self.write_status.get(&id)
    }

    pub fn failed_writes(&self) -> impl Iterator<Item = (&PendingWrite, &str)> {
        self.write_status.values().filter_map(|status| match status {
            WriteStatus::Failed { write, reason } => Some((write, reason.as_str())),
            WriteStatus::InFlight(_) => None,
        })
    }

    /// Reissues a failed write.
    pub fn retry(&mut self, id: RecordId) -> Option<PendingWrite> {
        match self.write_status.get(&id) {
            Some(WriteStatus::Failed { write, .. }) => {
                let write = write.clone();
                Some(self.begin_write(write))
            }
            _ => None,
        }
    }

    pub fn dismiss(&mut self, id: RecordId) {
        if matches!(self.write_status.get(&id), Some(WriteStatus::Failed { .. })) {
            self.write_status.remove(&id);
        }
    }
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
