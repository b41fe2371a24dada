use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("read of {need} bits at byte {offset:#x} runs past the end of the buffer ({have} bits left)")]
    OutOfBits { offset: usize, need: u32, have: usize },

    #[error("{kind} record must be {expected} bytes, got {found}")]
    RecordSize {
        kind: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("{kind} record is internally inconsistent: {message}")]
    InconsistentRecord {
        kind: &'static str,
        message: &'static str,
    },

    #[error("table truncated at offset {offset:#x}: {trailing} bytes left over, record size {record_size}")]
    TruncatedTable {
        offset: usize,
        trailing: usize,
        record_size: usize,
    },

    #[error("room {room:#x} does not fit in 11 bits")]
    RoomOutOfRange { room: u16 },

    #[error("character {character:#x} in room {room:#x} does not fit in 11 bits")]
    CharacterOutOfRange { room: u16, character: u16 },

    #[error("room {room:#x} needs {runs} character runs, at most 31 fit")]
    TooManyRuns { room: u16, runs: usize },

    #[error("line {line}: {message}")]
    Asm { line: usize, message: String },

    #[error("malformed progress flags: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("quest {quest} is listed more than once")]
    DuplicateQuest { quest: u8 },

    #[error("quest {quest} has no progress flags")]
    EmptyQuest { quest: u8 },

    #[error("quest {quest} has {count} progress values, at most 256 fit")]
    TooManyProgressValues { quest: u8, count: usize },

    #[error("malformed labels: {0}")]
    Ini(#[from] serde_ini::de::Error),

    #[error("bad label key {key:?} in section [{section}]")]
    BadLabel { section: String, key: String },

    #[error("unexpected section [{0}] in labels")]
    UnexpectedSection(String),

    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
