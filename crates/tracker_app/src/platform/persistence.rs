use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracker_engine::AtomicFileWriter;
use tracker_logging::{tracker_error, tracker_info, tracker_warn};

const STATE_FILENAME: &str = ".vtrack_state.ron";

/// Last task this client submitted, so `watch` can re-attach to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct LastTask {
    pub task_id: String,
    pub file_name: Option<String>,
    /// RFC 3339, UTC.
    pub submitted_utc: String,
}

pub(crate) fn load_last_task(state_dir: &Path) -> Option<LastTask> {
    let path = state_dir.join(STATE_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return None,
        Err(err) => {
            tracker_warn!("Failed to read last task from {:?}: {}", path, err);
            return None;
        }
    };

    match ron::from_str::<LastTask>(&content) {
        Ok(last) => {
            tracker_info!(
                "Loaded last task {} ({}) submitted {}",
                last.task_id,
                last.file_name.as_deref().unwrap_or("unknown file"),
                last.submitted_utc
            );
            Some(last)
        }
        Err(err) => {
            tracker_warn!("Failed to parse last task from {:?}: {}", path, err);
            None
        }
    }
}

pub(crate) fn save_last_task(state_dir: &Path, task_id: &str, file_name: Option<&str>) {
    let record = LastTask {
        task_id: task_id.to_owned(),
        file_name: file_name.map(str::to_owned),
        submitted_utc: Utc::now().to_rfc3339(),
    };

    let pretty = ron::ser::PrettyConfig::new();
    let content = match ron::ser::to_string_pretty(&record, pretty) {
        Ok(text) => text,
        Err(err) => {
            tracker_error!("Failed to serialize last task: {}", err);
            return;
        }
    };

    let writer = AtomicFileWriter::new(PathBuf::from(state_dir));
    if let Err(err) = writer.write(STATE_FILENAME, content.as_bytes()) {
        tracker_error!("Failed to write last task to {:?}: {}", state_dir, err);
    }
}
