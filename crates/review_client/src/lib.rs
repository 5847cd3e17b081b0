use std::path::Path;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, Response};
use shared::{
    domain::{AudioRef, RecordId},
    protocol::{PageQuery, PageResponse, UpdateRecordRequest},
};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info};

pub mod board;
pub mod config;
pub mod controller;
pub mod error;
pub mod playback;
pub mod session;
pub mod widget;

pub use board::WidgetBoard;
pub use config::ConsoleSettings;
pub use controller::{ListController, LoadOutcome, LoadTicket, PendingWrite, WriteStatus};
pub use error::ClientError;
pub use playback::{
    AudioBackend, AudioResource, PlaybackCommand, PlaybackMachine, PlaybackState, PlayerEvent,
};
pub use session::ReviewSession;
pub use widget::{DeleteRequest, EditMode, RecordWidget, SaveRequest, SyncOutcome};

/// The backend endpoints consumed by the console.
#[async_trait]
pub trait RecordsApi: Send + Sync {
    async fn fetch_page(&self, query: PageQuery) -> Result<PageResponse, ClientError>;
    async fn update_record(
        &self,
        id: RecordId,
        update: &UpdateRecordRequest,
    ) -> Result<(), ClientError>;
    async fn delete_record(&self, id: RecordId) -> Result<(), ClientError>;
    async fn fetch_audio(&self, audio: &AudioRef) -> Result<Vec<u8>, ClientError>;
    /// Streams the CSV export into `dest`, returning the bytes written.
    async fn export_csv(&self, dest: &Path) -> Result<u64, ClientError>;
    fn export_csv_url(&self) -> String;
    fn audio_url(&self, audio: &AudioRef) -> String;
}

pub struct HttpRecordsApi {
    http: Client,
    base_url: String,
    audio_prefix_len: usize,
}

impl HttpRecordsApi {
    /// `base_url` is expected to be normalized (no trailing slash).
    pub fn new(base_url: impl Into<String>, audio_prefix_len: usize) -> Self {
        Self::with_client(Client::new(), base_url, audio_prefix_len)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>, audio_prefix_len: usize) -> Self {
        Self {
            http,
            base_url: base_url.into(),
            audio_prefix_len,
        }
    }

    pub fn from_settings(settings: &ConsoleSettings) -> Self {
        Self::new(settings.backend_url.clone(), settings.audio_prefix_len)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn record_url(&self, id: RecordId) -> String {
        format!("{}/data/{}", self.base_url, id.0)
    }
}

fn check_status(url: &str, response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(ClientError::Status {
            url: url.to_string(),
            status,
        })
    }
}

#[async_trait]
impl RecordsApi for HttpRecordsApi {
    async fn fetch_page(&self, query: PageQuery) -> Result<PageResponse, ClientError> {
        let url = format!("{}/data", self.base_url);
        let response = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .map_err(|err| ClientError::transport(&url, err))?;
        let body: PageResponse = check_status(&url, response)?
            .json()
            .await
            .map_err(|err| ClientError::decode(&url, err))?;
        debug!(
            page = body.page,
            records = body.data.len(),
            total = body.total,
            "fetched page"
        );
        Ok(body)
    }

    async fn update_record(
        &self,
        id: RecordId,
        update: &UpdateRecordRequest,
    ) -> Result<(), ClientError> {
        let url = self.record_url(id);
        let response = self
            .http
            .patch(&url)
            .json(update)
            .send()
            .await
            .map_err(|err| ClientError::transport(&url, err))?;
        check_status(&url, response)?;
        Ok(())
    }

    async fn delete_record(&self, id: RecordId) -> Result<(), ClientError> {
        let url = self.record_url(id);
        let response = self
            .http
            .delete(&url)
            .send()
            .await
            .map_err(|err| ClientError::transport(&url, err))?;
        check_status(&url, response)?;
        Ok(())
    }

    async fn fetch_audio(&self, audio: &AudioRef) -> Result<Vec<u8>, ClientError> {
        let url = self.audio_url(audio);
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| ClientError::transport(&url, err))?;
        let bytes = check_status(&url, response)?
            .bytes()
            .await
            .map_err(|err| ClientError::decode(&url, err))?;
        Ok(bytes.to_vec())
    }

    async fn export_csv(&self, dest: &Path) -> Result<u64, ClientError> {
        let url = self.export_csv_url();
        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| ClientError::transport(&url, err))?;
        let response = check_status(&url, response)?;

        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|err| ClientError::io(dest, err))?;
        let mut written = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|err| ClientError::transport(&url, err))?;
            file.write_all(&chunk)
                .await
                .map_err(|err| ClientError::io(dest, err))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(|err| ClientError::io(dest, err))?;

        info!(bytes = written, dest = %dest.display(), "exported records csv");
        Ok(written)
    }

    fn export_csv_url(&self) -> String {
        format!("{}/export-csv", self.base_url)
    }

    fn audio_url(&self, audio: &AudioRef) -> String {
        format!(
            "{}/file/{}",
            self.base_url,
            audio.relative_name(self.audio_prefix_len)
        )
    }
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;

#[cfg(test)]
#[path = "tests/mock_backend.rs"]
pub(crate) mod mock_backend;
