//! Async driver pairing a [`ListController`] with a [`RecordsApi`].
//!
//! Used where requests can simply be awaited in order (the CLI, tests).
//! The GUI drives the controller directly through its backend bridge.

use std::{path::Path, sync::Arc};

use shared::domain::RecordId;

use crate::{
    controller::{ListController, LoadOutcome, LoadTicket, PendingWrite},
    error::ClientError,
    widget::{DeleteRequest, SaveRequest},
    RecordsApi,
};

pub struct ReviewSession {
    api: Arc<dyn RecordsApi>,
    controller: ListController,
}

impl ReviewSession {
    pub fn new(api: Arc<dyn RecordsApi>, page_size: u32) -> Self {
        Self {
            api,
            controller: ListController::new(page_size),
        }
    }

    pub fn controller(&self) -> &ListController {
        &self.controller
    }

    pub fn api(&self) -> &Arc<dyn RecordsApi> {
        &self.api
    }

    pub async fn load_page(&mut self, page: u32) -> LoadOutcome {
        let ticket = self.controller.begin_load(page);
        self.run_load(ticket).await
    }

    pub async fn reload(&mut self) -> LoadOutcome {
        let ticket = self.controller.reload();
        self.run_load(ticket).await
    }

    pub async fn next_page(&mut self) -> Option<LoadOutcome> {
        let ticket = self.controller.next_page()?;
        Some(self.run_load(ticket).await)
    }

    pub async fn prev_page(&mut self) -> Option<LoadOutcome> {
        let ticket = self.controller.prev_page()?;
        Some(self.run_load(ticket).await)
    }

    /// Sends the update, then reloads the current page.
    pub async fn save(&mut self, request: SaveRequest) -> Result<LoadOutcome, ClientError> {
        let write = self.controller.begin_write(request);
        self.run_write(write).await
    }

    /// Sends the delete, then reloads the current page.
    pub async fn delete(&mut self, request: DeleteRequest) -> Result<LoadOutcome, ClientError> {
        let write = self.controller.begin_write(request);
        self.run_write(write).await
    }

    /// Reissues the last failed write for `id`, if any.
    pub async fn retry(&mut self, id: RecordId) -> Option<Result<LoadOutcome, ClientError>> {
        let write = self.controller.retry(id)?;
        Some(self.run_write(write).await)
    }

    pub async fn export_csv(&self, dest: &Path) -> Result<u64, ClientError> {
        self.api.export_csv(dest).await
    }

    async fn run_load(&mut self, ticket: LoadTicket) -> LoadOutcome {
        let result = self.api.fetch_page(ticket.query).await;
        self.controller.finish_load(ticket, result)
    }

    async fn run_write(&mut self, write: PendingWrite) -> Result<LoadOutcome, ClientError> {
        let result = perform_write(self.api.as_ref(), &write).await;
        let reload = self.controller.finish_write(write, &result);
        result?;
        match reload {
            Some(ticket) => Ok(self.run_load(ticket).await),
            None => Ok(LoadOutcome::Stale),
        }
    }
}

/// Executes one write against the API.
pub async fn perform_write(api: &dyn RecordsApi, write: &PendingWrite) -> Result<(), ClientError> {
    match write {
        PendingWrite::Save { id, update } => api.update_record(*id, update).await,
        PendingWrite::Delete { id } => api.delete_record(*id).await,
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
