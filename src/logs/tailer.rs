//! # Polling file tailer.
//!
//! [`FileTailer`] watches a fixed set of files and feeds **newly appended**
//! bytes through the [`LogBuffer`](super::buffer::LogBuffer). On start it
//! records each file's current size and mtime — pre-existing content is
//! never replayed.
//!
//! ## Poll cycle (every 500 ms, per file)
//! - Absent file → skip; it may appear later.
//! - Current size < recorded size → truncation/rotation; reset offset to 0.
//! - Size and mtime unchanged → skip.
//! - Otherwise read `[recorded, current)`, update the record, split on `\n`,
//!   classify each non-empty line with the file's default category.
//!
//! I/O errors during a cycle are swallowed — the next poll retries.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use tokio::io::{AsyncReadExt, AsyncSeekExt, SeekFrom};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::buffer::LogBuffer;
use super::entry::{LogCategory, LogSource};

/// Poll cadence for the watched set.
pub const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Directory the target writes its auxiliary logs into.
const WATCH_DIR: &str = ".hekabrain";

/// One file in the watched set.
#[derive(Clone, Debug)]
pub struct WatchedFile {
    /// Absolute path of the file.
    pub path: PathBuf,
    /// Category applied to lines with no per-line override.
    pub category: LogCategory,
}

/// The standard watched set under `~/.hekabrain/`.
///
/// Returns an empty set when the home directory cannot be resolved.
pub fn default_watched_files() -> Vec<WatchedFile> {
    let Some(home) = dirs::home_dir() else {
        return Vec::new();
    };
    let dir = home.join(WATCH_DIR);
    vec![
        WatchedFile {
            path: dir.join("debug-summary.txt"),
            category: LogCategory::System,
        },
        WatchedFile {
            path: dir.join("debug-all.txt"),
            category: LogCategory::Console,
        },
        WatchedFile {
            path: dir.join("browser-errors.txt"),
            category: LogCategory::Renderer,
        },
    ]
}

/// Per-file read position.
struct TailState {
    path: PathBuf,
    category: LogCategory,
    offset: u64,
    mtime: Option<SystemTime>,
}

/// Polls the watched set and pushes newly appended lines into the ring.
pub struct FileTailer {
    files: Vec<TailState>,
    buffer: Arc<LogBuffer>,
}

impl FileTailer {
    /// Creates a tailer over the given set.
    pub fn new(files: Vec<WatchedFile>, buffer: Arc<LogBuffer>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|f| TailState {
                    path: f.path,
                    category: f.category,
                    offset: 0,
                    mtime: None,
                })
                .collect(),
            buffer,
        }
    }

    /// Primes the read positions and runs the poll loop until cancellation.
    pub fn spawn(mut self, token: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.prime().await;
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(POLL_INTERVAL) => {}
                    _ = token.cancelled() => break,
                }
                self.poll_once().await;
            }
        })
    }

    /// Records current size/mtime so pre-existing content is not replayed.
    async fn prime(&mut self) {
        for file in &mut self.files {
            match tokio::fs::metadata(&file.path).await {
                Ok(meta) => {
                    file.offset = meta.len();
                    file.mtime = meta.modified().ok();
                }
                Err(_) => {
                    file.offset = 0;
                    file.mtime = None;
                }
            }
        }
    }

    /// One poll cycle over the watched set.
    async fn poll_once(&mut self) {
        for file in &mut self.files {
            let meta = match tokio::fs::metadata(&file.path).await {
                Ok(meta) => meta,
                Err(_) => continue,
            };
            let size = meta.len();
            let mtime = meta.modified().ok();

            if size < file.offset {
                // Truncation or rotation: resume from the top.
                file.offset = 0;
            }
            if size == file.offset && mtime == file.mtime {
                continue;
            }

            if size > file.offset {
                match read_range(&file.path, file.offset, size).await {
                    Ok(chunk) => {
                        self.buffer
                            .push_chunk(&chunk, LogSource::File, file.category);
                    }
                    Err(e) => {
                        debug!(path = %file.path.display(), error = %e, "tailer read skipped");
                        continue;
                    }
                }
            }

            file.offset = size;
            file.mtime = mtime;
        }
    }
}

/// Reads the byte range `[from, to)` of a file as lossy UTF-8.
async fn read_range(path: &Path, from: u64, to: u64) -> std::io::Result<String> {
    let mut f = tokio::fs::File::open(path).await?;
    f.seek(SeekFrom::Start(from)).await?;
    let mut raw = vec![0u8; (to - from) as usize];
    f.read_exact(&mut raw).await?;
    Ok(String::from_utf8_lossy(&raw).into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Bus;

    fn tailer_over(path: PathBuf, buffer: Arc<LogBuffer>) -> FileTailer {
        FileTailer::new(
            vec![WatchedFile {
                path,
                category: LogCategory::Console,
            }],
            buffer,
        )
    }

    #[tokio::test]
    async fn pre_existing_content_is_not_replayed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug-all.txt");
        tokio::fs::write(&path, "old line\nanother old line\n")
            .await
            .unwrap();

        let buffer = Arc::new(LogBuffer::with_capacity(64, Bus::new(64)));
        let mut tailer = tailer_over(path, Arc::clone(&buffer));
        tailer.prime().await;
        tailer.poll_once().await;
        assert!(buffer.is_empty());
    }

    #[tokio::test]
    async fn only_appended_bytes_are_emitted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug-all.txt");
        tokio::fs::write(&path, "seed\n").await.unwrap();

        let buffer = Arc::new(LogBuffer::with_capacity(64, Bus::new(64)));
        let mut tailer = tailer_over(path.clone(), Arc::clone(&buffer));
        tailer.prime().await;

        let mut content = tokio::fs::read_to_string(&path).await.unwrap();
        content.push_str("one\ntwo\nthree\n");
        tokio::fs::write(&path, content).await.unwrap();

        tailer.poll_once().await;
        let entries = buffer.query(None, None);
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].message, "one");
        assert_eq!(entries[2].message, "three");
        assert!(entries.iter().all(|e| e.source == LogSource::File));
        assert!(entries.iter().all(|e| e.category == LogCategory::Console));
    }

    #[tokio::test]
    async fn truncation_resumes_from_offset_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug-all.txt");
        tokio::fs::write(&path, "a much longer seed line\n").await.unwrap();

        let buffer = Arc::new(LogBuffer::with_capacity(64, Bus::new(64)));
        let mut tailer = tailer_over(path.clone(), Arc::clone(&buffer));
        tailer.prime().await;

        // Rotate: the file shrinks, then gets fresh content.
        tokio::fs::write(&path, "fresh\n").await.unwrap();
        tailer.poll_once().await;

        let entries = buffer.query(None, None);
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].message, "fresh");
    }

    #[tokio::test]
    async fn absent_files_are_skipped_until_they_appear() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("debug-all.txt");

        let buffer = Arc::new(LogBuffer::with_capacity(64, Bus::new(64)));
        let mut tailer = tailer_over(path.clone(), Arc::clone(&buffer));
        tailer.prime().await;
        tailer.poll_once().await;
        assert!(buffer.is_empty());

        // Once the file appears, its full content is new bytes.
        tokio::fs::write(&path, "born\n").await.unwrap();
        tailer.poll_once().await;
        assert_eq!(buffer.query(None, None)[0].message, "born");
    }
}
