//! Task protocol: one isolated worker per request.
//!
//! A caller submits a [`TaskRequest`]; [`spawn_task`] runs it on a freshly
//! spawned thread that owns no state beyond the request, and streams a
//! closed set of [`TaskEvent`]s back: any number of `Progress`, then exactly
//! one terminal `Completed` or `Failed`. Nothing follows a terminal event.
//! Workers share nothing, so tasks may run concurrently and killing one
//! cannot corrupt another.
//!
//! Dropping the [`TaskHandle`] (and with it the event receiver) cancels the
//! task at the next chunk boundary; any partial output is discarded.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use x25519_dalek::{PublicKey, StaticSecret};

use crate::crypto::KeyMaterial;
use crate::pipeline;
use crate::types::{FileMetadata, InputKind, Mode, SealError, SealOptions};

static NEXT_TASK_ID: AtomicU64 = AtomicU64::new(1);

/// Everything a worker needs to run one task. The password and any key
/// material move into the worker and die with it.
pub struct TaskRequest {
    pub mode: Mode,
    pub password: SecretString,
    /// Raw payload bytes on encrypt; container bytes on decrypt.
    pub payload: Vec<u8>,
    /// Name embedded in (encrypt) or expected from (decrypt) the container.
    pub filename: String,
    pub options: SealOptions,
    /// Recipient public key, asymmetric encrypt only.
    pub recipient: Option<PublicKey>,
    /// Secret key, asymmetric decrypt only.
    pub secret: Option<StaticSecret>,
}

/// Successful task output.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TaskOutput {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub original_extension: Option<String>,
}

/// Events a worker emits, in order: zero or more `Progress`, then one
/// terminal variant.
#[derive(Debug)]
pub enum TaskEvent {
    Progress { percent: u8, stage: String },
    Completed(TaskOutput),
    Failed(SealError),
}

/// Lifecycle of a caller-side task record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum TaskStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

/// Caller-owned record of one submitted task, suitable for a history list.
/// Mutated only through [`ProcessTask::apply`]; terminal states absorb any
/// further events. Removal is up to the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessTask {
    pub id: u64,
    pub mode: Mode,
    pub input_kind: InputKind,
    pub status: TaskStatus,
    pub progress: u8,
    pub stage: String,
    pub result: Option<TaskOutput>,
    pub error: Option<String>,
    pub metadata: Option<FileMetadata>,
}

impl ProcessTask {
    pub fn new(id: u64, mode: Mode, input_kind: InputKind) -> Self {
        Self {
            id,
            mode,
            input_kind,
            status: TaskStatus::Pending,
            progress: 0,
            stage: String::new(),
            result: None,
            error: None,
            metadata: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }

    /// Fold one worker event into the record.
    pub fn apply(&mut self, event: &TaskEvent) {
        if self.is_terminal() {
            return;
        }
        match event {
            TaskEvent::Progress { percent, stage } => {
                self.status = TaskStatus::Processing;
                self.progress = *percent;
                self.stage = stage.clone();
            }
            TaskEvent::Completed(output) => {
                self.status = TaskStatus::Completed;
                self.progress = 100;
                self.result = Some(output.clone());
            }
            TaskEvent::Failed(error) => {
                self.status = TaskStatus::Failed;
                self.error = Some(error.to_string());
            }
        }
    }
}

/// A running task: its id, event stream, and worker thread.
pub struct TaskHandle {
    id: u64,
    pub events: Receiver<TaskEvent>,
    worker: JoinHandle<()>,
}

impl TaskHandle {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Drain events until the terminal one and return the outcome. A worker
    /// that died without a terminal event reports as unavailable.
    pub fn wait(self) -> Result<TaskOutput, SealError> {
        let mut outcome = Err(SealError::WorkerUnavailable);
        for event in self.events.iter() {
            match event {
                TaskEvent::Progress { .. } => {}
                TaskEvent::Completed(output) => {
                    outcome = Ok(output);
                    break;
                }
                TaskEvent::Failed(error) => {
                    outcome = Err(error);
                    break;
                }
            }
        }
        let _ = self.worker.join();
        outcome
    }
}

/// Spawn one isolated worker for `request`.
///
/// Fails with [`SealError::WorkerUnavailable`] if the thread cannot be
/// created. The returned handle's receiver sees events in emission order.
pub fn spawn_task(request: TaskRequest) -> Result<TaskHandle, SealError> {
    let id = NEXT_TASK_ID.fetch_add(1, Ordering::Relaxed);
    let (tx, rx) = mpsc::channel();

    let worker = thread::Builder::new()
        .name(format!("sealpack-task-{id}"))
        .spawn(move || run_task(id, request, tx))
        .map_err(|_| SealError::WorkerUnavailable)?;

    Ok(TaskHandle {
        id,
        events: rx,
        worker,
    })
}

fn run_task(id: u64, request: TaskRequest, tx: Sender<TaskEvent>) {
    tracing::debug!(id, mode = ?request.mode, scheme = ?request.options.scheme, "task started");
    match execute(&request, &tx) {
        Ok(output) => {
            tracing::debug!(id, "task completed");
            let _ = tx.send(TaskEvent::Completed(output));
        }
        Err(error) => {
            tracing::warn!(id, %error, "task failed");
            let _ = tx.send(TaskEvent::Failed(error));
        }
    }
}

fn execute(request: &TaskRequest, tx: &Sender<TaskEvent>) -> Result<TaskOutput, SealError> {
    let mut on_progress = |percent: u8, stage: &str| {
        tx.send(TaskEvent::Progress {
            percent,
            stage: stage.to_owned(),
        })
        .is_ok()
    };

    match request.mode {
        Mode::Encrypt => {
            let material = KeyMaterial::for_encrypt(
                request.options.scheme,
                &request.password,
                request.options.kdf_params,
                request.recipient.as_ref(),
            )?;
            let bytes = pipeline::encrypt_stream(
                &request.payload,
                &request.filename,
                &request.password,
                &material,
                request.options.chunk_size,
                &mut on_progress,
            )?;
            Ok(TaskOutput {
                bytes,
                filename: format!("{}.enc", request.filename),
                original_extension: None,
            })
        }
        Mode::Decrypt => {
            let decrypted = pipeline::decrypt_stream(
                &request.payload,
                &request.password,
                request.options.scheme,
                request.options.kdf_params,
                request.secret.as_ref(),
                &mut on_progress,
            )?;
            let original_extension = extension_of(&decrypted.name);
            Ok(TaskOutput {
                bytes: decrypted.plaintext,
                filename: decrypted.name,
                original_extension,
            })
        }
    }
}

fn extension_of(name: &str) -> Option<String> {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_owned)
}
