//! Retention sweep over the staging and output directories

use std::path::Path;
use std::time::{Duration, SystemTime};

/// What a sweep removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub staged_removed: usize,
    pub artifacts_removed: usize,
    /// Entries that were due but could not be inspected or deleted
    pub failures: usize,
}

impl SweepReport {
    pub fn total_removed(&self) -> usize {
        self.staged_removed + self.artifacts_removed
    }
}

/// Outcome of sweeping one directory
#[derive(Debug, Default)]
pub(crate) struct DirSweep {
    pub removed: usize,
    pub failures: usize,
}

/// Delete regular files in `dir` whose modification time is older than
/// `max_age`. A missing directory counts as empty.
pub(crate) async fn sweep_dir(dir: &Path, max_age: Duration) -> DirSweep {
    let mut result = DirSweep::default();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return result,
        Err(err) => {
            log::warn!("cannot list {}: {}", dir.display(), err);
            result.failures += 1;
            return result;
        }
    };

    let now = SystemTime::now();
    loop {
        let entry = match entries.next_entry().await {
            Ok(Some(entry)) => entry,
            Ok(None) => break,
            Err(err) => {
                log::warn!("error while listing {}: {}", dir.display(), err);
                result.failures += 1;
                break;
            }
        };

        let path = entry.path();
        let modified = match entry.metadata().await {
            Ok(meta) if meta.is_file() => meta.modified(),
            Ok(_) => continue,
            Err(err) => Err(err),
        };
        let age = match modified {
            Ok(modified) => now.duration_since(modified).unwrap_or(Duration::ZERO),
            Err(err) => {
                log::warn!("cannot stat {}: {}", path.display(), err);
                result.failures += 1;
                continue;
            }
        };
        if age <= max_age {
            continue;
        }

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::debug!("swept {} (age {}s)", path.display(), age.as_secs());
                result.removed += 1;
            }
            // raced with a download or another sweep
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => {
                log::warn!("cannot remove {}: {}", path.display(), err);
                result.failures += 1;
            }
        }
    }

    result
}
