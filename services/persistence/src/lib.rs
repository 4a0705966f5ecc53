//! Persistence for the match store
//!
//! Provides the append-only, CRC32C-checksummed journal that makes match
//! store mutations durable, and the reader used to replay it on startup.

pub mod journal;
pub mod reader;

pub use journal::{JournalConfig, JournalEntry, JournalError, JournalWriter, SegmentFile, SyncPolicy};
pub use reader::{CorruptionKind, CorruptionRecord, JournalReader, ReadOutcome, ReaderError};
