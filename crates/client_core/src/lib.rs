use std::sync::Arc;

use reqwest::Client;
use serde::de::DeserializeOwned;
use shared::{
    domain::{
        MergeHandle, TempName, MAX_FILE_SIZE_BYTES, MAX_MERGE_FILES, MIN_MERGE_FILES,
        PDF_MEDIA_TYPE,
    },
    error::ErrorResponse,
    protocol::{FileDescriptor, MergeRequest, MergeResponse, UploadResponse},
};
use thiserror::Error;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};
use url::Url;

/// Errors the workflow surfaces to its caller. Validation variants carry the
/// offending file name so the UI can show it verbatim; `Server` carries the
/// collaborator's `{error}` message unchanged.
#[derive(Debug, Error)]
pub enum WorkflowError {
    #[error("select at least {MIN_MERGE_FILES} PDF files to merge")]
    InsufficientFiles { count: usize },
    #[error("maximum {MAX_MERGE_FILES} files allowed")]
    TooManyFiles { count: usize },
    #[error("{file_name} is not a PDF file")]
    InvalidType { file_name: String },
    #[error("{file_name} exceeds the 20MB limit")]
    FileTooLarge { file_name: String, size_bytes: u64 },
    #[error("{file_name} is empty")]
    EmptyFile { file_name: String },
    #[error("{0}")]
    Server(String),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("invalid server url: {0}")]
    InvalidServerUrl(#[from] url::ParseError),
    #[error("internal error: {0}")]
    Internal(String),
}

/// A file the user picked or dropped, before any network round trip. The
/// declared media type comes from the host environment, not from sniffing
/// the bytes; the server re-validates structure on its side.
#[derive(Debug, Clone)]
pub struct CandidateFile {
    pub file_name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl CandidateFile {
    pub fn size_bytes(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// Pre-flight checks, in order: candidate count against both bounds, media
/// type of every file, then size of every file. The first violation aborts
/// the whole intake so a partial set is never submitted.
pub fn validate_candidates(candidates: &[CandidateFile]) -> Result<(), WorkflowError> {
    if candidates.len() < MIN_MERGE_FILES {
        return Err(WorkflowError::InsufficientFiles {
            count: candidates.len(),
        });
    }
    if candidates.len() > MAX_MERGE_FILES {
        return Err(WorkflowError::TooManyFiles {
            count: candidates.len(),
        });
    }
    for candidate in candidates {
        if candidate.media_type != PDF_MEDIA_TYPE {
            return Err(WorkflowError::InvalidType {
                file_name: candidate.file_name.clone(),
            });
        }
    }
    for candidate in candidates {
        if candidate.size_bytes() > MAX_FILE_SIZE_BYTES {
            return Err(WorkflowError::FileTooLarge {
                file_name: candidate.file_name.clone(),
                size_bytes: candidate.size_bytes(),
            });
        }
        if candidate.bytes.is_empty() {
            return Err(WorkflowError::EmptyFile {
                file_name: candidate.file_name.clone(),
            });
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStage {
    Empty,
    FilesReady,
    MergeReady,
}

/// Result of a completed merge, held only until the next merge or clear.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeOutcome {
    pub merged_file: MergeHandle,
    pub file_size: Option<u64>,
    pub page_count: Option<u32>,
    pub compressed: bool,
}

/// Immutable view of the workflow at one point in time. The stage is derived,
/// never stored, so it cannot drift from the data that defines it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkflowSnapshot {
    pub files: Vec<FileDescriptor>,
    pub merge: Option<MergeOutcome>,
}

impl WorkflowSnapshot {
    pub fn empty() -> Self {
        Self {
            files: Vec::new(),
            merge: None,
        }
    }

    pub fn stage(&self) -> WorkflowStage {
        if self.merge.is_some() {
            WorkflowStage::MergeReady
        } else if self.files.len() >= MIN_MERGE_FILES {
            WorkflowStage::FilesReady
        } else {
            WorkflowStage::Empty
        }
    }
}

#[derive(Debug, Clone)]
pub enum WorkflowEvent {
    StateChanged(WorkflowSnapshot),
}

#[derive(Debug, Default)]
struct WorkflowState {
    files: Vec<FileDescriptor>,
    merge: Option<MergeOutcome>,
}

impl WorkflowState {
    fn snapshot(&self) -> WorkflowSnapshot {
        WorkflowSnapshot {
            files: self.files.clone(),
            merge: self.merge.clone(),
        }
    }
}

/// The upload/merge workflow controller. Owns the ordered file list and the
/// merge outcome; every mutation happens inside its own methods and each one
/// broadcasts the resulting snapshot.
#[derive(Debug)]
pub struct MergeClient {
    http: Client,
    server_url: String,
    inner: Mutex<WorkflowState>,
    events: broadcast::Sender<WorkflowEvent>,
}

impl MergeClient {
    /// `server_url` is validated up front; a trailing slash is tolerated.
    pub fn new(server_url: impl AsRef<str>) -> Result<Arc<Self>, WorkflowError> {
        let parsed = Url::parse(server_url.as_ref())?;
        let server_url = parsed.as_str().trim_end_matches('/').to_string();
        let (events, _) = broadcast::channel(64);
        Ok(Arc::new(Self {
            http: Client::new(),
            server_url,
            inner: Mutex::new(WorkflowState::default()),
            events,
        }))
    }

    pub fn server_url(&self) -> &str {
        &self.server_url
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<WorkflowEvent> {
        self.events.subscribe()
    }

    pub async fn snapshot(&self) -> WorkflowSnapshot {
        self.inner.lock().await.snapshot()
    }

    fn emit(&self, snapshot: &WorkflowSnapshot) {
        let _ = self
            .events
            .send(WorkflowEvent::StateChanged(snapshot.clone()));
    }

    /// Validate the candidates and submit them as one multipart request.
    /// Success replaces the whole in-memory list with the server's
    /// descriptors and discards any previous merge outcome; failure leaves
    /// the prior list untouched.
    pub async fn upload(
        &self,
        candidates: Vec<CandidateFile>,
    ) -> Result<WorkflowSnapshot, WorkflowError> {
        validate_candidates(&candidates)?;

        let mut form = reqwest::multipart::Form::new();
        for candidate in candidates {
            let file_name = candidate.file_name.clone();
            let part = reqwest::multipart::Part::bytes(candidate.bytes)
                .file_name(file_name)
                .mime_str(PDF_MEDIA_TYPE)
                .map_err(|err| WorkflowError::Internal(format!("media type rejected: {err}")))?;
            form = form.part("files", part);
        }

        let response = self
            .http
            .post(format!("{}/upload", self.server_url))
            .multipart(form)
            .send()
            .await?;
        let body: UploadResponse = parse_server_response(response).await?;

        info!(files = body.files.len(), "upload acknowledged");
        let snapshot = {
            let mut state = self.inner.lock().await;
            state.files = body.files;
            state.merge = None;
            state.snapshot()
        };
        self.emit(&snapshot);
        Ok(snapshot)
    }

    /// Re-derive the canonical list from the visually observed row order.
    /// Each handle consumes at most one descriptor, so duplicate handles
    /// collapse onto a single row; handles not present in the current list
    /// are ignored. Changing the order invalidates any prior merge outcome.
    pub async fn reorder(&self, order: &[TempName]) -> WorkflowSnapshot {
        let snapshot = {
            let mut state = self.inner.lock().await;
            state.merge = None;
            let mut remaining = std::mem::take(&mut state.files);
            let mut reordered = Vec::with_capacity(remaining.len());
            for temp_name in order {
                if let Some(position) = remaining
                    .iter()
                    .position(|descriptor| &descriptor.temp_name == temp_name)
                {
                    reordered.push(remaining.remove(position));
                }
            }
            if !remaining.is_empty() {
                warn!(
                    dropped = remaining.len(),
                    "reorder received fewer rows than descriptors"
                );
            }
            state.files = reordered;
            state.snapshot()
        };
        self.emit(&snapshot);
        snapshot
    }

    /// Drop one descriptor; any prior merge outcome no longer matches the
    /// list and is discarded. Falling below the merge threshold resets the
    /// whole workflow to its empty state rather than leaving a list that
    /// cannot be merged.
    pub async fn remove(&self, temp_name: &TempName) -> WorkflowSnapshot {
        let snapshot = {
            let mut state = self.inner.lock().await;
            state.merge = None;
            state
                .files
                .retain(|descriptor| &descriptor.temp_name != temp_name);
            if state.files.len() < MIN_MERGE_FILES {
                state.files.clear();
            }
            state.snapshot()
        };
        self.emit(&snapshot);
        snapshot
    }

    /// Post the current display order plus the compression flag. Success
    /// records the outcome; failure preserves the file list so the user can
    /// retry.
    pub async fn merge(&self, compress: bool) -> Result<WorkflowSnapshot, WorkflowError> {
        let file_order: Vec<TempName> = {
            let state = self.inner.lock().await;
            if state.files.len() < MIN_MERGE_FILES {
                return Err(WorkflowError::InsufficientFiles {
                    count: state.files.len(),
                });
            }
            state
                .files
                .iter()
                .map(|descriptor| descriptor.temp_name.clone())
                .collect()
        };

        info!(files = file_order.len(), compress, "requesting merge");
        let response = self
            .http
            .post(format!("{}/merge", self.server_url))
            .json(&MergeRequest {
                file_order,
                compress,
            })
            .send()
            .await?;
        let body: MergeResponse = parse_server_response(response).await?;

        let snapshot = {
            let mut state = self.inner.lock().await;
            state.merge = Some(MergeOutcome {
                merged_file: body.merged_file,
                file_size: body.file_size,
                page_count: body.page_count,
                compressed: body.compressed,
            });
            state.snapshot()
        };
        self.emit(&snapshot);
        Ok(snapshot)
    }

    /// Deterministic download location for a merge handle; the server treats
    /// the handle as an opaque path segment.
    pub fn download_url(&self, merged_file: &MergeHandle) -> String {
        format!("{}/download/{}", self.server_url, merged_file)
    }

    /// Fetch the merged document's bytes. Only valid in the merge-ready
    /// state.
    pub async fn download_merged(&self) -> Result<Vec<u8>, WorkflowError> {
        let merged_file = {
            let state = self.inner.lock().await;
            state
                .merge
                .as_ref()
                .map(|outcome| outcome.merged_file.clone())
        }
        .ok_or_else(|| WorkflowError::Internal("no merged file available".to_string()))?;

        let response = self
            .http
            .get(self.download_url(&merged_file))
            .send()
            .await?
            .error_for_status()?;
        let bytes = response.bytes().await?;
        info!(merged_file = %merged_file, size = bytes.len(), "merged document downloaded");
        Ok(bytes.to_vec())
    }

    /// Reset everything. Usable both as the explicit clear action and as
    /// "start a new merge" after a download; invoking it repeatedly is a
    /// no-op after the first call.
    pub async fn clear(&self) -> WorkflowSnapshot {
        let snapshot = {
            let mut state = self.inner.lock().await;
            state.files.clear();
            state.merge = None;
            state.snapshot()
        };
        self.emit(&snapshot);
        snapshot
    }
}

/// Decode a server response: an `{error}` payload wins regardless of status
/// (mirroring how the collaborator reports application failures), then a
/// non-2xx status without one, then the expected body.
async fn parse_server_response<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, WorkflowError> {
    let status = response.status();
    let text = response.text().await?;
    if let Ok(payload) = serde_json::from_str::<ErrorResponse>(&text) {
        warn!(%status, error = %payload.error, "server reported an application error");
        return Err(WorkflowError::Server(payload.error));
    }
    if !status.is_success() {
        return Err(WorkflowError::Server(format!("server returned {status}")));
    }
    serde_json::from_str(&text)
        .map_err(|err| WorkflowError::Server(format!("unexpected server response: {err}")))
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
