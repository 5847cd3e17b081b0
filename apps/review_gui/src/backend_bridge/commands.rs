//! Backend commands queued from UI to backend worker.

use std::path::PathBuf;

use review_client::{LoadTicket, PendingWrite};

pub enum BackendCommand {
    LoadPage { ticket: LoadTicket },
    Write { write: PendingWrite },
    ExportCsv { dest: PathBuf },
}

impl BackendCommand {
    pub fn name(&self) -> &'static str {
        match self {
            Self::LoadPage { .. } => "load_page",
            Self::Write {
                write: PendingWrite::Save { .. },
            } => "save_record",
            Self::Write {
                write: PendingWrite::Delete { .. },
            } => "delete_record",
            Self::ExportCsv { .. } => "export_csv",
        }
    }
}
