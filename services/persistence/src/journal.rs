//! Journal Writer: append-only segment log with CRC32C checksums
//!
//! # Binary Format (per entry)
//! ```text
//! [body_len: u32]
//! [sequence: u64]
//! [timestamp: i64]
//! [kind_len: u16][kind: bytes]
//! [payload_len: u32][payload: bytes]
//! [checksum: u32]  // CRC32C over sequence+timestamp+kind+payload
//! ```
//!
//! All integers are little-endian. Segments are named
//! `segment-NNNNNN.journal`; every writer session starts a fresh segment so
//! a torn tail left by a crash is never followed by new data in the same
//! file.

use crc32c::crc32c;
use serde::{Deserialize, Serialize};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;

const SEGMENT_PREFIX: &str = "segment-";
const SEGMENT_SUFFIX: &str = ".journal";

/// Fixed part of an encoded body: seq + ts + kind_len + payload_len + crc
const FIXED_BODY_LEN: usize = 8 + 8 + 2 + 4 + 4;

/// Bodies larger than this are treated as corruption when decoding
const MAX_BODY_LEN: usize = 16 * 1024 * 1024;

// ── Errors ──────────────────────────────────────────────────────────

#[derive(Error, Debug)]
pub enum JournalError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed entry: {0}")]
    Malformed(String),

    #[error("Entry kind too long: {0} bytes")]
    KindTooLong(usize),

    #[error("Payload too large: {0} bytes")]
    PayloadTooLarge(usize),

    #[error("Journal writer disabled after a failed append could not be undone")]
    Disabled,
}

// ── Journal Entry ───────────────────────────────────────────────────

/// A single persisted event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Gapless, monotonic sequence number starting at 1
    pub sequence: u64,
    /// Unix nanoseconds at append time
    pub timestamp: i64,
    /// Event kind tag, e.g. "PlayerJoined"
    pub kind: String,
    /// Opaque serialized event
    pub payload: Vec<u8>,
    pub checksum: u32,
}

impl JournalEntry {
    pub fn new(sequence: u64, timestamp: i64, kind: impl Into<String>, payload: Vec<u8>) -> Self {
        let kind = kind.into();
        let checksum = checksum_of(sequence, timestamp, &kind, &payload);
        Self {
            sequence,
            timestamp,
            kind,
            payload,
            checksum,
        }
    }

    pub fn verify_checksum(&self) -> bool {
        self.checksum == checksum_of(self.sequence, self.timestamp, &self.kind, &self.payload)
    }

    /// Encode into the on-disk frame
    pub fn encode(&self) -> Result<Vec<u8>, JournalError> {
        let kind = self.kind.as_bytes();
        let kind_len = u16::try_from(kind.len()).map_err(|_| JournalError::KindTooLong(kind.len()))?;
        let body_len = FIXED_BODY_LEN + kind.len() + self.payload.len();
        if body_len > MAX_BODY_LEN {
            return Err(JournalError::PayloadTooLarge(self.payload.len()));
        }
        // body_len <= MAX_BODY_LEN, so these casts cannot truncate
        let payload_len = self.payload.len() as u32;

        let mut buf = Vec::with_capacity(4 + body_len);
        buf.extend_from_slice(&(body_len as u32).to_le_bytes());
        buf.extend_from_slice(&self.sequence.to_le_bytes());
        buf.extend_from_slice(&self.timestamp.to_le_bytes());
        buf.extend_from_slice(&kind_len.to_le_bytes());
        buf.extend_from_slice(kind);
        buf.extend_from_slice(&payload_len.to_le_bytes());
        buf.extend_from_slice(&self.payload);
        buf.extend_from_slice(&self.checksum.to_le_bytes());
        Ok(buf)
    }

    /// Decode one frame from the front of `data`.
    ///
    /// Returns the entry and the number of bytes consumed. The checksum is
    /// not verified here; see [`JournalEntry::verify_checksum`].
    pub fn decode(data: &[u8]) -> Result<(Self, usize), JournalError> {
        let mut frame = Cursor::new(data);
        let body_len = frame.u32()? as usize;
        if !(FIXED_BODY_LEN..=MAX_BODY_LEN).contains(&body_len) {
            return Err(JournalError::Malformed(format!(
                "implausible body length {}",
                body_len
            )));
        }

        let mut body = Cursor::new(frame.take(body_len)?);
        let sequence = body.u64()?;
        let timestamp = body.i64()?;
        let kind_len = body.u16()? as usize;
        let kind = String::from_utf8(body.take(kind_len)?.to_vec())
            .map_err(|e| JournalError::Malformed(format!("kind is not UTF-8: {}", e)))?;
        let payload_len = body.u32()? as usize;
        let payload = body.take(payload_len)?.to_vec();
        let checksum = body.u32()?;
        if body.remaining() != 0 {
            return Err(JournalError::Malformed(format!(
                "{} trailing bytes in body",
                body.remaining()
            )));
        }

        let entry = Self {
            sequence,
            timestamp,
            kind,
            payload,
            checksum,
        };
        Ok((entry, 4 + body_len))
    }
}

fn checksum_of(sequence: u64, timestamp: i64, kind: &str, payload: &[u8]) -> u32 {
    let mut buf = Vec::with_capacity(16 + kind.len() + payload.len());
    buf.extend_from_slice(&sequence.to_le_bytes());
    buf.extend_from_slice(&timestamp.to_le_bytes());
    buf.extend_from_slice(kind.as_bytes());
    buf.extend_from_slice(payload);
    crc32c(&buf)
}

/// Bounds-checked little-endian reader over a byte slice
struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], JournalError> {
        if n > self.remaining() {
            return Err(JournalError::Malformed(format!(
                "need {} bytes at offset {}, have {}",
                n,
                self.pos,
                self.remaining()
            )));
        }
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], JournalError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u16(&mut self) -> Result<u16, JournalError> {
        self.array().map(u16::from_le_bytes)
    }

    fn u32(&mut self) -> Result<u32, JournalError> {
        self.array().map(u32::from_le_bytes)
    }

    fn u64(&mut self) -> Result<u64, JournalError> {
        self.array().map(u64::from_le_bytes)
    }

    fn i64(&mut self) -> Result<i64, JournalError> {
        self.array().map(i64::from_le_bytes)
    }
}

// ── Sync Policy ─────────────────────────────────────────────────────

/// When appended data is flushed and fsynced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncPolicy {
    /// Flush + fsync after every append.
    EveryWrite,
    /// Flush after every append, fsync every N appends.
    EveryN(usize),
    /// Flush after every append, leave fsync to the OS.
    OsManaged,
}

// ── Journal Writer Configuration ────────────────────────────────────

#[derive(Debug, Clone)]
pub struct JournalConfig {
    pub dir: PathBuf,
    /// Segment size that triggers rotation (default 64 MiB)
    pub max_segment_bytes: u64,
    pub sync_policy: SyncPolicy,
}

impl JournalConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            max_segment_bytes: 64 * 1024 * 1024,
            sync_policy: SyncPolicy::EveryWrite,
        }
    }
}

// ── Segment Files ───────────────────────────────────────────────────

/// Storage behind one journal segment.
pub trait SegmentFile: Sized {
    /// Open `path` for appending, creating it if needed.
    fn open(path: &Path) -> io::Result<Self>;
    fn write_all(&mut self, buf: &[u8]) -> io::Result<()>;
    fn sync_data(&mut self) -> io::Result<()>;
    fn set_len(&mut self, len: u64) -> io::Result<()>;
}

impl SegmentFile for File {
    fn open(path: &Path) -> io::Result<Self> {
        OpenOptions::new().create(true).append(true).open(path)
    }

    fn write_all(&mut self, buf: &[u8]) -> io::Result<()> {
        Write::write_all(self, buf)
    }

    fn sync_data(&mut self) -> io::Result<()> {
        File::sync_data(self)
    }

    fn set_len(&mut self, len: u64) -> io::Result<()> {
        File::set_len(self, len)
    }
}

// ── Journal Writer ──────────────────────────────────────────────────

/// Append-only journal writer.
///
/// The writer owns sequence assignment: callers hand it a kind and payload
/// and get back the persisted entry. A failed append consumes no sequence
/// number and cuts the segment back to its length before the attempt, so
/// an entry reported as failed never reaches the journal. When that cut
/// itself fails the writer refuses every later append.
pub struct JournalWriter<F = File> {
    config: JournalConfig,
    file: F,
    segment_index: u64,
    segment_path: PathBuf,
    segment_bytes: u64,
    next_sequence: u64,
    appends_since_sync: usize,
    disabled: bool,
}

impl JournalWriter {
    /// Open a writer that continues at `next_sequence` in a new segment.
    pub fn open(config: JournalConfig, next_sequence: u64) -> Result<Self, JournalError> {
        Self::open_with(config, next_sequence)
    }
}

impl<F: SegmentFile> JournalWriter<F> {
    /// Like [`JournalWriter::open`], over any segment storage.
    pub fn open_with(config: JournalConfig, next_sequence: u64) -> Result<Self, JournalError> {
        fs::create_dir_all(&config.dir)?;
        let segment_index = latest_segment_index(&config.dir)?.map_or(1, |i| i + 1);
        let segment_path = segment_path(&config.dir, segment_index);
        let file = F::open(&segment_path)?;

        tracing::debug!(
            segment = %segment_path.display(),
            next_sequence,
            "journal writer opened"
        );

        Ok(Self {
            config,
            file,
            segment_index,
            segment_path,
            segment_bytes: 0,
            next_sequence: next_sequence.max(1),
            appends_since_sync: 0,
            disabled: false,
        })
    }

    pub fn next_sequence(&self) -> u64 {
        self.next_sequence
    }

    pub fn segment_path(&self) -> &Path {
        &self.segment_path
    }

    /// Append an event, returning the persisted entry.
    pub fn append(
        &mut self,
        timestamp: i64,
        kind: &str,
        payload: Vec<u8>,
    ) -> Result<JournalEntry, JournalError> {
        if self.disabled {
            return Err(JournalError::Disabled);
        }
        if self.segment_bytes >= self.config.max_segment_bytes {
            self.rotate()?;
        }

        let entry = JournalEntry::new(self.next_sequence, timestamp, kind, payload);
        let frame = entry.encode()?;

        if let Err(e) = self.write_frame(&frame) {
            self.discard_failed_append();
            return Err(e);
        }

        self.segment_bytes += frame.len() as u64;
        self.next_sequence += 1;
        Ok(entry)
    }

    /// Fsync the current segment.
    pub fn sync(&mut self) -> Result<(), JournalError> {
        self.file.sync_data()?;
        self.appends_since_sync = 0;
        Ok(())
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<(), JournalError> {
        self.file.write_all(frame)?;
        self.appends_since_sync += 1;
        let fsync = match self.config.sync_policy {
            SyncPolicy::EveryWrite => true,
            SyncPolicy::EveryN(n) => self.appends_since_sync >= n.max(1),
            SyncPolicy::OsManaged => false,
        };
        if fsync {
            self.sync()?;
        }
        Ok(())
    }

    /// Remove whatever part of a failed frame reached the segment.
    fn discard_failed_append(&mut self) {
        let keep = self.segment_bytes;
        let cut = self
            .file
            .set_len(keep)
            .and_then(|()| self.file.sync_data());
        if let Err(e) = cut {
            tracing::error!(
                segment = %self.segment_path.display(),
                length = keep,
                error = %e,
                "could not cut failed append; journal writer disabled"
            );
            self.disabled = true;
        }
    }

    fn rotate(&mut self) -> Result<(), JournalError> {
        if let Err(e) = self.sync() {
            tracing::warn!(segment = %self.segment_path.display(), error = %e, "sync before rotation failed");
        }

        let next_index = self.segment_index + 1;
        let next_path = segment_path(&self.config.dir, next_index);
        self.file = F::open(&next_path)?;
        self.segment_index = next_index;
        self.segment_path = next_path;
        self.segment_bytes = 0;
        tracing::debug!(segment = %self.segment_path.display(), "journal rotated");
        Ok(())
    }
}

pub(crate) fn segment_path(dir: &Path, index: u64) -> PathBuf {
    dir.join(format!("{}{:06}{}", SEGMENT_PREFIX, index, SEGMENT_SUFFIX))
}

pub(crate) fn parse_segment_index(file_name: &str) -> Option<u64> {
    file_name
        .strip_prefix(SEGMENT_PREFIX)?
        .strip_suffix(SEGMENT_SUFFIX)?
        .parse()
        .ok()
}

/// All segment files in `dir`, ordered by index.
pub(crate) fn list_segments(dir: &Path) -> Result<Vec<(u64, PathBuf)>, io::Error> {
    if !dir.exists() {
        return Ok(Vec::new());
    }
    let mut segments = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        if let Some(index) = parse_segment_index(&entry.file_name().to_string_lossy()) {
            segments.push((index, entry.path()));
        }
    }
    segments.sort_by_key(|(index, _)| *index);
    Ok(segments)
}

fn latest_segment_index(dir: &Path) -> Result<Option<u64>, io::Error> {
    Ok(list_segments(dir)?.last().map(|(index, _)| *index))
}

// ── Tests ───────────────────────────────────────────────────────────
