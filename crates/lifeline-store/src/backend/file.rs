use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, RwLock};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::backend::KvBackend;
use crate::error::{StoreError, StoreResult};

/// Name of the log file inside the store directory.
pub const LOG_FILE_NAME: &str = "ledger.log";

/// Scratch file a compaction writes before it replaces the log.
const COMPACT_FILE_NAME: &str = "ledger.log.compact";

/// Header size: 4 bytes length + 4 bytes CRC.
const HEADER_SIZE: usize = 8;

/// bincode length prefix of each byte vector in a [`LogEntry`].
const LEN_PREFIX: usize = 8;

/// Log size below which compaction never runs.
pub const DEFAULT_COMPACT_MIN_BYTES: u64 = 1 << 20;

/// Flush/sync strategy for the log.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// `fsync` after every put (safest, highest latency).
    EveryWrite,
    /// Flush to the OS and rely on its page cache.
    #[default]
    OsDefault,
}

/// A single put, as framed on disk.
#[derive(Deserialize)]
struct LogEntry {
    key: Vec<u8>,
    value: Vec<u8>,
}

/// Borrowed form of [`LogEntry`]; encodes to the same bytes.
#[derive(Serialize)]
struct LogEntryRef<'a> {
    key: &'a [u8],
    value: &'a [u8],
}

struct LogWriter {
    writer: Option<BufWriter<File>>,
    /// Bytes of complete frames in the log.
    offset: u64,
    /// Bytes of the frames that still hold a live value.
    live_bytes: u64,
    closed: bool,
}

impl LogWriter {
    fn active(&mut self) -> StoreResult<&mut BufWriter<File>> {
        match self.writer.as_mut() {
            Some(writer) => Ok(writer),
            None if self.closed => Err(StoreError::EngineClosed),
            None => Err(StoreError::StorageUnavailable(io::Error::other(
                "ledger log writer lost after a failed rollback; reopen the store",
            ))),
        }
    }

    fn append(&mut self, frame: &[u8], sync_mode: SyncMode) -> io::Result<()> {
        let Some(writer) = self.writer.as_mut() else {
            return Err(io::Error::other("ledger log writer unavailable"));
        };
        writer.write_all(frame)?;
        writer.flush()?;
        if sync_mode == SyncMode::EveryWrite {
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }

    /// Drop whatever a failed append left buffered or on disk past `offset`.
    fn rollback(&mut self, offset: u64) -> StoreResult<()> {
        let Some(stale) = self.writer.take() else {
            return Ok(());
        };
        // `into_parts` hands back the file without flushing the buffer.
        let (file, _discarded) = stale.into_parts();
        file.set_len(offset)?;
        file.sync_all()?;
        self.writer = Some(BufWriter::new(file));
        self.offset = offset;
        warn!(offset, "rolled back partial log append");
        Ok(())
    }
}

/// Durable backend: an append-only log of puts, replayed into an ordered map
/// on open.
///
/// On-disk format, repeated per put:
/// ```text
/// [4 bytes: payload length (little-endian u32)]
/// [4 bytes: CRC32 of payload (little-endian u32)]
/// [N bytes: payload (bincode-serialized key/value pair)]
/// ```
///
/// A later put for the same key shadows earlier ones during replay. Entries
/// whose CRC does not match are skipped. An unreadable frame with no valid
/// frame after it is a torn tail from a crash: it is copied to a
/// `ledger.log.<offset>.torn` file and cut off. An unreadable frame followed
/// by valid frames fails the open with [`StoreError::CorruptLog`].
///
/// Once shadowed frames outweigh live ones (and the log is past the
/// compaction floor) the live map is rewritten to a fresh log.
pub struct FileBackend {
    path: PathBuf,
    sync_mode: SyncMode,
    compact_min_bytes: u64,
    closed: AtomicBool,
    entries: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
    writer: Mutex<LogWriter>,
}

impl FileBackend {
    /// Open (or create) the log inside `dir` with the default compaction
    /// floor.
    pub fn open(dir: &Path, sync_mode: SyncMode) -> StoreResult<Self> {
        Self::open_with(dir, sync_mode, DEFAULT_COMPACT_MIN_BYTES)
    }

    pub fn open_with(dir: &Path, sync_mode: SyncMode, compact_min_bytes: u64) -> StoreResult<Self> {
        fs::create_dir_all(dir)?;
        let path = dir.join(LOG_FILE_NAME);

        let scratch = dir.join(COMPACT_FILE_NAME);
        if scratch.exists() {
            warn!(path = %scratch.display(), "removing unfinished compaction");
            fs::remove_file(&scratch)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(&path)?;

        let data = fs::read(&path)?;
        let replayed = replay(&data);
        let valid_len = replayed.valid_len as u64;
        match replayed.stop {
            ReplayStop::End => {}
            ReplayStop::TornTail => {
                let sidecar = dir.join(format!("{LOG_FILE_NAME}.{valid_len}.torn"));
                fs::write(&sidecar, &data[replayed.valid_len..])?;
                warn!(
                    path = %path.display(),
                    valid_len,
                    file_len = data.len(),
                    sidecar = %sidecar.display(),
                    "moved torn tail out of ledger log"
                );
                file.set_len(valid_len)?;
                file.sync_all()?;
            }
            ReplayStop::Corrupt => {
                return Err(StoreError::CorruptLog {
                    path,
                    offset: valid_len,
                });
            }
        }

        let live_bytes: u64 = replayed
            .entries
            .iter()
            .map(|(k, v)| frame_len(k, v))
            .sum();

        info!(path = %path.display(), keys = replayed.entries.len(), "opened file backend");
        let backend = Self {
            path,
            sync_mode,
            compact_min_bytes,
            closed: AtomicBool::new(false),
            entries: RwLock::new(replayed.entries),
            writer: Mutex::new(LogWriter {
                writer: Some(BufWriter::new(file)),
                offset: valid_len,
                live_bytes,
                closed: false,
            }),
        };

        {
            let mut w = backend.lock_writer()?;
            if backend.needs_compaction(&w) {
                backend.compact_locked(&mut w)?;
            }
        }
        Ok(backend)
    }

    /// Path to the log file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current size of the log in bytes.
    pub fn log_len(&self) -> u64 {
        self.writer.lock().map(|w| w.offset).unwrap_or(0)
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        self.entries.read().map(|map| map.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rewrite the log so it holds exactly one frame per live key.
    pub fn compact(&self) -> StoreResult<()> {
        let mut w = self.lock_writer()?;
        self.compact_locked(&mut w)
    }

    fn lock_writer(&self) -> StoreResult<std::sync::MutexGuard<'_, LogWriter>> {
        self.writer
            .lock()
            .map_err(|_| StoreError::lock_poisoned("file backend writer"))
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            return Err(StoreError::EngineClosed);
        }
        Ok(())
    }

    fn needs_compaction(&self, w: &LogWriter) -> bool {
        let dead = w.offset.saturating_sub(w.live_bytes);
        w.offset >= self.compact_min_bytes && dead > w.live_bytes
    }

    fn compact_locked(&self, w: &mut LogWriter) -> StoreResult<()> {
        w.active()?.flush()?;
        let scratch = self.path.with_file_name(COMPACT_FILE_NAME);

        let written = {
            let map = self
                .entries
                .read()
                .map_err(|_| StoreError::lock_poisoned("file backend index"))?;
            write_snapshot(&scratch, &map)
        };
        let compacted_len = match written {
            Ok(len) => len,
            Err(e) => {
                let _ = fs::remove_file(&scratch);
                return Err(e);
            }
        };

        fs::rename(&scratch, &self.path)?;
        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        if let Some(old) = w.writer.replace(BufWriter::new(file)) {
            drop(old.into_parts());
        }

        info!(
            path = %self.path.display(),
            before = w.offset,
            after = compacted_len,
            "compacted ledger log"
        );
        w.offset = compacted_len;
        w.live_bytes = compacted_len;
        Ok(())
    }
}

impl KvBackend for FileBackend {
    fn get(&self, key: &[u8]) -> StoreResult<Option<Vec<u8>>> {
        self.ensure_open()?;
        let map = self
            .entries
            .read()
            .map_err(|_| StoreError::lock_poisoned("file backend index"))?;
        Ok(map.get(key).cloned())
    }

    fn put(&self, key: &[u8], value: &[u8]) -> StoreResult<()> {
        self.ensure_open()?;
        let frame = encode_frame(key, value)?;

        let mut w = self.lock_writer()?;
        w.active()?;
        let entry_offset = w.offset;
        if let Err(e) = w.append(&frame, self.sync_mode) {
            w.rollback(entry_offset)?;
            return Err(e.into());
        }
        w.offset += frame.len() as u64;

        // Publish while still holding the writer so map and log agree on order.
        {
            let mut map = self
                .entries
                .write()
                .map_err(|_| StoreError::lock_poisoned("file backend index"))?;
            if let Some(old) = map.insert(key.to_vec(), value.to_vec()) {
                w.live_bytes = w.live_bytes.saturating_sub(frame_len(key, &old));
            }
            w.live_bytes += frame.len() as u64;
        }
        debug!(offset = entry_offset, len = frame.len(), "log append");

        if self.needs_compaction(&w) {
            self.compact_locked(&mut w)?;
        }
        Ok(())
    }

    fn delete_all(&self) -> StoreResult<()> {
        self.ensure_open()?;
        let mut w = self.lock_writer()?;
        w.active()?;

        let file = OpenOptions::new().read(true).append(true).open(&self.path)?;
        file.set_len(0)?;
        file.sync_all()?;
        if let Some(old) = w.writer.replace(BufWriter::new(file)) {
            drop(old.into_parts());
        }
        w.offset = 0;
        w.live_bytes = 0;

        let mut map = self
            .entries
            .write()
            .map_err(|_| StoreError::lock_poisoned("file backend index"))?;
        map.clear();

        warn!(path = %self.path.display(), "ledger log erased");
        Ok(())
    }

    /// Flush and sync the log, then release the file handle and the map.
    fn close(&self) -> StoreResult<()> {
        let mut w = self.lock_writer()?;
        let writer = w.active()?;
        writer.flush()?;
        writer.get_ref().sync_all()?;
        w.writer = None;
        w.closed = true;
        self.closed.store(true, Ordering::SeqCst);

        let mut map = self
            .entries
            .write()
            .map_err(|_| StoreError::lock_poisoned("file backend index"))?;
        *map = BTreeMap::new();

        info!(path = %self.path.display(), "closed file backend");
        Ok(())
    }
}

impl std::fmt::Debug for FileBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileBackend")
            .field("path", &self.path)
            .field("sync_mode", &self.sync_mode)
            .field("key_count", &self.len())
            .field("closed", &self.closed.load(Ordering::SeqCst))
            .finish()
    }
}

// ---------------------------------------------------------------------------
// Framing
// ---------------------------------------------------------------------------

fn encode_frame(key: &[u8], value: &[u8]) -> StoreResult<Vec<u8>> {
    let payload = bincode::serialize(&LogEntryRef { key, value })
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    let mut frame = Vec::with_capacity(HEADER_SIZE + payload.len());
    frame.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    frame.extend_from_slice(&crc32fast::hash(&payload).to_le_bytes());
    frame.extend_from_slice(&payload);
    Ok(frame)
}

/// On-disk size of the frame for `key`/`value`.
fn frame_len(key: &[u8], value: &[u8]) -> u64 {
    (HEADER_SIZE + 2 * LEN_PREFIX + key.len() + value.len()) as u64
}

fn write_snapshot(path: &Path, map: &BTreeMap<Vec<u8>, Vec<u8>>) -> StoreResult<u64> {
    let mut out = BufWriter::new(File::create(path)?);
    let mut len = 0u64;
    for (key, value) in map {
        let frame = encode_frame(key, value)?;
        out.write_all(&frame)?;
        len += frame.len() as u64;
    }
    out.flush()?;
    out.get_ref().sync_all()?;
    Ok(len)
}

struct Header {
    length: usize,
    crc: u32,
}

fn read_header(data: &[u8], offset: usize) -> Option<Header> {
    let bytes = data.get(offset..offset + HEADER_SIZE)?;
    Some(Header {
        length: u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize,
        crc: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
    })
}

/// Whether a complete, CRC-valid frame starts at `offset`.
fn is_valid_frame(data: &[u8], offset: usize) -> bool {
    let Some(header) = read_header(data, offset) else {
        return false;
    };
    let start = offset + HEADER_SIZE;
    header.length > 0
        && start + header.length <= data.len()
        && crc32fast::hash(&data[start..start + header.length]) == header.crc
}

// ---------------------------------------------------------------------------
// Replay
// ---------------------------------------------------------------------------

#[derive(Debug, PartialEq, Eq)]
enum ReplayStop {
    /// Every byte belonged to a frame.
    End,
    /// Unreadable bytes with nothing valid after them.
    TornTail,
    /// An unreadable frame with valid frames behind it.
    Corrupt,
}

struct Replay {
    entries: BTreeMap<Vec<u8>, Vec<u8>>,
    /// Length of the prefix made of complete frames.
    valid_len: usize,
    stop: ReplayStop,
}

/// Replay the log front to back.
fn replay(data: &[u8]) -> Replay {
    let mut entries = BTreeMap::new();
    let mut offset = 0usize;
    let mut stop = ReplayStop::End;

    while offset < data.len() {
        let end = read_header(data, offset)
            .filter(|h| h.length > 0)
            .map(|h| (offset + HEADER_SIZE + h.length, h.crc))
            .filter(|(end, _)| *end <= data.len());
        let Some((end, expected_crc)) = end else {
            let resync = (offset + 1..data.len()).find(|&at| is_valid_frame(data, at));
            stop = match resync {
                Some(next) => {
                    warn!(offset, next, "unreadable log frame before valid data");
                    ReplayStop::Corrupt
                }
                None => {
                    warn!(offset, "incomplete log entry; stopping replay");
                    ReplayStop::TornTail
                }
            };
            break;
        };

        let payload = &data[offset + HEADER_SIZE..end];
        let actual_crc = crc32fast::hash(payload);
        if actual_crc != expected_crc {
            warn!(
                offset,
                expected = expected_crc,
                actual = actual_crc,
                "CRC mismatch; skipping log entry"
            );
            offset = end;
            continue;
        }

        match bincode::deserialize::<LogEntry>(payload) {
            Ok(entry) => {
                entries.insert(entry.key, entry.value);
            }
            Err(e) => {
                warn!(offset, error = %e, "undecodable log entry; skipping");
            }
        }
        offset = end;
    }

    debug!(keys = entries.len(), bytes = offset, "log replay complete");
    Replay {
        entries,
        valid_len: offset,
        stop,
    }
}
