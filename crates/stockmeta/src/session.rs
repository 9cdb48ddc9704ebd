//! Session state: the workflow owner sitting between a front end and the
//! batch pipeline.
//!
//! The session holds the credential, the queue and the last run's results,
//! and enforces the stage order `CredentialEntry -> ItemSelection -> Results`.
//! It never touches item status itself; that belongs to the orchestrator.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::export;
use crate::pipeline::{BatchOrchestrator, BatchSummary, ProgressReporter, QueueItem, ResultRecord};
use crate::sanitize;
use crate::secrets::{Credential, SecretError};

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid credential: {0}")]
    Credential(#[from] SecretError),

    #[error("Operation '{operation}' is not allowed in stage {stage}")]
    WrongStage {
        operation: &'static str,
        stage: WorkflowStage,
    },

    #[error("No credential has been submitted")]
    MissingCredential,

    #[error("Failed to read '{path}': {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SessionError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStage {
    CredentialEntry,
    ItemSelection,
    Results,
}

impl std::fmt::Display for WorkflowStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WorkflowStage::CredentialEntry => write!(f, "credential entry"),
            WorkflowStage::ItemSelection => write!(f, "item selection"),
            WorkflowStage::Results => write!(f, "results"),
        }
    }
}

/// A file offered for processing by a front end.
#[derive(Debug, Clone)]
pub struct SubmittedFile {
    pub name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl SubmittedFile {
    pub fn new(name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Reads a file from disk, guessing its MIME type from the extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let name = sanitize::redact_path(path);
        let bytes = std::fs::read(path).map_err(|e| SessionError::ReadFile {
            path: name.clone(),
            source: e,
        })?;
        let mime_type = mime_guess::from_path(path)
            .first()
            .map(|m| m.to_string())
            .unwrap_or_else(|| "application/octet-stream".to_string());

        Ok(Self::new(name, mime_type, bytes))
    }

    /// Raster image types only. SVG is an image MIME type but not a bitmap.
    pub fn is_raster_image(&self) -> bool {
        let mime = self.mime_type.trim().to_ascii_lowercase();
        mime.starts_with("image/") && !mime.starts_with("image/svg")
    }
}

pub struct Session {
    stage: WorkflowStage,
    credential: Option<Credential>,
    queue: Vec<QueueItem>,
    results: Vec<ResultRecord>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    pub fn new() -> Self {
        Self {
            stage: WorkflowStage::CredentialEntry,
            credential: None,
            queue: Vec::new(),
            results: Vec::new(),
        }
    }

    pub fn stage(&self) -> WorkflowStage {
        self.stage
    }

    pub fn has_credential(&self) -> bool {
        self.credential.is_some()
    }

    pub fn queue(&self) -> &[QueueItem] {
        &self.queue
    }

    pub fn results(&self) -> &[ResultRecord] {
        &self.results
    }

    fn require_stage(&self, operation: &'static str, stage: WorkflowStage) -> Result<()> {
        if self.stage != stage {
            return Err(SessionError::WrongStage {
                operation,
                stage: self.stage,
            });
        }
        Ok(())
    }

    /// Accepts a credential and moves to item selection.
    pub fn submit_credential(&mut self, raw: &str) -> Result<()> {
        self.require_stage("submit_credential", WorkflowStage::CredentialEntry)?;
        self.credential = Some(Credential::new(raw)?);
        self.stage = WorkflowStage::ItemSelection;
        debug!("Credential accepted");
        Ok(())
    }

    /// Like [`Session::submit_credential`] for an already validated credential.
    pub fn set_credential(&mut self, credential: Credential) -> Result<()> {
        self.require_stage("set_credential", WorkflowStage::CredentialEntry)?;
        self.credential = Some(credential);
        self.stage = WorkflowStage::ItemSelection;
        Ok(())
    }

    /// Returns to credential entry. The queue is kept.
    pub fn change_credential(&mut self) -> Result<()> {
        self.require_stage("change_credential", WorkflowStage::ItemSelection)?;
        self.credential = None;
        self.stage = WorkflowStage::CredentialEntry;
        Ok(())
    }

    /// Appends every raster image among `files` to the queue as a pending
    /// item. Other files are skipped. Returns the number accepted.
    pub fn add_files<I>(&mut self, files: I) -> Result<usize>
    where
        I: IntoIterator<Item = SubmittedFile>,
    {
        self.require_stage("add_files", WorkflowStage::ItemSelection)?;

        let mut accepted = 0;
        for file in files {
            if !file.is_raster_image() {
                warn!(
                    "Skipping {}: unsupported type {}",
                    file.name, file.mime_type
                );
                continue;
            }
            self.queue
                .push(QueueItem::new(file.name, file.mime_type, file.bytes));
            accepted += 1;
        }

        debug!("Queued {} files ({} total)", accepted, self.queue.len());
        Ok(accepted)
    }

    /// Removes a queued item. Returns whether it was present.
    pub fn remove_item(&mut self, id: Uuid) -> Result<bool> {
        self.require_stage("remove_item", WorkflowStage::ItemSelection)?;
        let before = self.queue.len();
        self.queue.retain(|item| item.id != id);
        Ok(self.queue.len() != before)
    }

    pub fn clear_items(&mut self) -> Result<()> {
        self.require_stage("clear_items", WorkflowStage::ItemSelection)?;
        self.queue.clear();
        Ok(())
    }

    /// Runs the queue through `orchestrator`.
    ///
    /// An empty queue is a no-op and returns `None`. Otherwise the previous
    /// results are replaced by the full ordered result set of this run and
    /// the session moves to the results stage.
    pub async fn start(
        &mut self,
        orchestrator: &BatchOrchestrator,
        progress: &dyn ProgressReporter,
    ) -> Result<Option<BatchSummary>> {
        self.require_stage("start", WorkflowStage::ItemSelection)?;
        let credential = self
            .credential
            .clone()
            .ok_or(SessionError::MissingCredential)?;

        if self.queue.is_empty() {
            debug!("Start requested with an empty queue");
            return Ok(None);
        }

        self.results.clear();
        let records = orchestrator
            .run(&mut self.queue, &credential, progress)
            .await;
        let summary = BatchSummary::from_records(&records);

        self.results = records;
        self.stage = WorkflowStage::Results;
        info!("Run complete: {}", summary);

        Ok(Some(summary))
    }

    /// Clears queue and results and returns to item selection. The
    /// credential is kept.
    pub fn reset(&mut self) -> Result<()> {
        if self.stage == WorkflowStage::CredentialEntry {
            return Err(SessionError::WrongStage {
                operation: "reset",
                stage: self.stage,
            });
        }
        self.queue.clear();
        self.results.clear();
        self.stage = WorkflowStage::ItemSelection;
        Ok(())
    }

    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_records(&self.results)
    }

    /// CSV report of the current results.
    pub fn export_csv(&self) -> String {
        export::to_csv(&self.results)
    }
}
