//! Built-in limits for font ingestion
//!
//! These are the defaults; `settings.json` and CLI flags can override the
//! size limit and the batch size.

use std::time::Duration;

/// 20 MiB. Anything larger is rejected before it is read.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 20 * 1024 * 1024;

/// Files parsed concurrently per wave
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Drops larger than this yield to the scheduler between batches
pub const DEFAULT_YIELD_THRESHOLD: usize = 50;

/// How long a notification stays up, per failed file
pub const NOTICE_DURATION: Duration = Duration::from_millis(5000);

/// Longest list of filenames shown in one notification, in characters
pub const NOTICE_NAMES_MAX_CHARS: usize = 300;

/// Oversized files named individually before the rest are counted
pub const OVERSIZED_NAMES_SHOWN: usize = 3;

/// Tunables for the ingestion pipeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngestSettings {
    pub max_file_size: u64,
    pub batch_size: usize,
    pub yield_threshold: usize,
    pub notice_duration: Duration,
    pub notice_names_max_chars: usize,
}

impl Default for IngestSettings {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            batch_size: DEFAULT_BATCH_SIZE,
            yield_threshold: DEFAULT_YIELD_THRESHOLD,
            notice_duration: NOTICE_DURATION,
            notice_names_max_chars: NOTICE_NAMES_MAX_CHARS,
        }
    }
}

impl IngestSettings {
    /// Set the size limit in MiB, clamping at `u64::MAX` bytes
    pub fn set_max_file_size_mib(&mut self, mib: u64) {
        self.max_file_size = mib.saturating_mul(1024 * 1024);
    }

    /// Size limit in whole MiB, for messages
    pub fn max_file_size_mib(&self) -> u64 {
        self.max_file_size / (1024 * 1024)
    }
}
