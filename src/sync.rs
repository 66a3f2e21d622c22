use std::fs;
use std::path::Path;
use std::time::Instant;

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::snapshot::{self, SnapshotError};
use crate::toggl::{SnapshotSource, TogglError, decode_body, looks_gzipped};
use crate::user::User;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Transport(#[from] TogglError),
    #[error(transparent)]
    Snapshot(#[from] SnapshotError),
    #[error("could not read snapshot file: {0}")]
    Io(#[from] std::io::Error),
}

/// Fetches a full snapshot from `source` and loads it into `user`.
pub fn sync_user(user: &mut User, source: &impl SnapshotSource) -> Result<(), SyncError> {
    let started = Instant::now();
    let json = source.fetch_snapshot().inspect_err(|err| {
        warn!(error = %err, "snapshot fetch failed");
    })?;
    load_text(user, &json)?;
    info!(
        user = user.id,
        since = user.since,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "user with related data fetched and parsed"
    );
    Ok(())
}

/// Loads a snapshot saved on disk, gzipped or plain.
pub fn load_file(user: &mut User, path: &Path) -> Result<(), SyncError> {
    let bytes = fs::read(path)?;
    let json = decode_body(&bytes, looks_gzipped(&bytes))?;
    debug!(path = %path.display(), bytes = bytes.len(), "snapshot file read");
    load_text(user, &json)
}

fn load_text(user: &mut User, json: &str) -> Result<(), SyncError> {
    snapshot::load_document(user, json).inspect_err(|err| {
        warn!(error = %err, "snapshot load failed");
    })?;
    Ok(())
}
