use serde_json::Value;

use crate::highlight::{tokenize, JsonToken};
use crate::StatusPayload;

pub const PLAYBACK_WARNING: &str = "Playback Error: Unable to play this video here. \
Please download it and open it with an external player such as VLC.";
pub const STATS_UNAVAILABLE: &str = "Could not load statistics data.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Playback {
    Pending,
    Ready,
    Unplayable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoSection {
    pub url: String,
    pub download_name: String,
    pub playback: Playback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatsBody {
    Loading,
    Loaded(Vec<JsonToken>),
    Unavailable(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatsSection {
    pub url: String,
    pub download_name: String,
    pub body: StatsBody,
}

/// Results area. A section that is `None` is hidden.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ResultsView {
    pub video: Option<VideoSection>,
    pub stats: Option<StatsSection>,
}

impl ResultsView {
    pub(crate) fn from_payload(payload: &StatusPayload) -> Self {
        Self {
            video: payload.result_video.as_ref().map(|url| VideoSection {
                url: url.clone(),
                download_name: download_name(url),
                playback: Playback::Pending,
            }),
            stats: payload.result_stats.as_ref().map(|url| StatsSection {
                url: url.clone(),
                download_name: download_name(url),
                body: StatsBody::Loading,
            }),
        }
    }

    /// True while an artifact is still being checked or fetched.
    pub fn is_loading(&self) -> bool {
        let video_pending = self
            .video
            .as_ref()
            .is_some_and(|v| v.playback == Playback::Pending);
        let stats_loading = self
            .stats
            .as_ref()
            .is_some_and(|s| s.body == StatsBody::Loading);
        video_pending || stats_loading
    }

    pub(crate) fn apply_video_probe(&mut self, url: &str, ok: bool) -> bool {
        match self.video.as_mut() {
            Some(video) if video.url == url => {
                video.playback = if ok {
                    Playback::Ready
                } else {
                    Playback::Unplayable(PLAYBACK_WARNING.to_owned())
                };
                true
            }
            _ => false,
        }
    }

    pub(crate) fn apply_stats(&mut self, url: &str, result: Result<Value, String>) -> bool {
        match self.stats.as_mut() {
            Some(stats) if stats.url == url => {
                stats.body = match result {
                    Ok(value) => StatsBody::Loaded(tokenize(&value)),
                    Err(_) => StatsBody::Unavailable(STATS_UNAVAILABLE.to_owned()),
                };
                true
            }
            _ => false,
        }
    }
}

/// Final path segment of an artifact URL, without query or fragment.
pub fn download_name(url: &str) -> String {
    let path = url.split(|c| c == '?' || c == '#').next().unwrap_or(url);
    match path.rsplit('/').next() {
        Some(segment) if !segment.is_empty() => segment.to_owned(),
        _ => "download".to_owned(),
    }
}
