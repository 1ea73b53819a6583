//! Tracker engine: collaborator HTTP client, poller and effect execution.
mod api;
mod engine;
mod filename;
mod persist;
mod poller;
mod types;

pub use api::{ApiSettings, JobApi, ReqwestJobApi};
pub use engine::{EngineError, EngineHandle};
pub use filename::safe_artifact_name;
pub use persist::{ensure_output_dir, AtomicFileWriter, PersistError};
pub use poller::{ChannelEventSink, EventSink, Poller};
pub use types::{ApiError, EngineEvent, FailureKind, MediaProbe};
