// crates/reelsync-engine/src/loader.rs
//
// C10 — Loader Dispatch: picks a native vs. segmented (HLS/DASH-style)
// loading strategy from the URL and runs it with a hard timeout, same
// pattern as the teacher's probe threads racing a bounded channel recv
// rather than blocking the caller indefinitely.

use std::sync::Arc;
use std::time::Duration;

use crossbeam_channel::bounded;
use tracing::{info, info_span};

use reelsync_core::error::{LoaderFailure, PlayerResult};

use crate::collaborator::{LoadedMedia, Loader};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoadStrategy {
    Native,
    Segmented,
}

pub fn select_strategy(url: &str) -> PlayerResult<LoadStrategy> {
    let recognized = url.starts_with("http://") || url.starts_with("https://") || url.starts_with("file://");
    if !recognized {
        return Err(LoaderFailure::UnrecognizedProtocol(url.to_string()).into());
    }
    let lower = url.to_ascii_lowercase();
    if lower.ends_with(".m3u8") || lower.ends_with(".mpd") {
        Ok(LoadStrategy::Segmented)
    } else {
        Ok(LoadStrategy::Native)
    }
}

pub struct LoaderDispatch {
    native: Arc<dyn Loader>,
    segmented: Arc<dyn Loader>,
    timeout: Duration,
}

impl LoaderDispatch {
    pub fn new(native: Arc<dyn Loader>, segmented: Arc<dyn Loader>, timeout: Duration) -> Self {
        Self { native, segmented, timeout }
    }

    pub fn load(&self, url: &str) -> PlayerResult<LoadedMedia> {
        let strategy = select_strategy(url)?;
        let loader = match strategy {
            LoadStrategy::Native => Arc::clone(&self.native),
            LoadStrategy::Segmented => Arc::clone(&self.segmented),
        };
        info!(url, strategy = ?strategy, "dispatching media load");

        let (tx, rx) = bounded(1);
        let owned_url = url.to_string();
        std::thread::spawn(move || {
            let span = info_span!("media_load");
            let _enter = span.enter();
            let _ = tx.send(loader.load(&owned_url));
        });

        match rx.recv_timeout(self.timeout) {
            Ok(result) => result,
            Err(_) => Err(LoaderFailure::MediaLoadTimeout.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unrecognized_protocol() {
        let err = select_strategy("ftp://host/a.mp4").unwrap_err();
        assert!(matches!(err, reelsync_core::error::PlayerError::LoaderFailure(
            reelsync_core::error::LoaderFailure::UnrecognizedProtocol(_)
        )));
    }

    #[test]
    fn selects_segmented_for_hls_and_dash() {
        assert_eq!(select_strategy("https://host/a.m3u8").unwrap(), LoadStrategy::Segmented);
        assert_eq!(select_strategy("https://host/a.mpd").unwrap(), LoadStrategy::Segmented);
    }

    #[test]
    fn selects_native_for_plain_file() {
        assert_eq!(select_strategy("https://host/a.mp4").unwrap(), LoadStrategy::Native);
        assert_eq!(select_strategy("file:///tmp/a.mov").unwrap(), LoadStrategy::Native);
    }
}
