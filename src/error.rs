use std::os::raw::c_int;
use std::result;

use mdbx_sys as ffi;

/// Custom result type for MDBX operations
pub type Result<T> = result::Result<T, Error>;

/// MDBX error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// Key/data pair already exists
    #[error("key/data pair already exists")]
    KeyExist,
    /// No matching key/data pair found
    #[error("no matching key/data pair found")]
    NotFound,
    /// Requested page not found
    #[error("requested page not found")]
    PageNotFound,
    /// Database file is corrupted
    #[error("database file is corrupted")]
    Corrupted,
    /// Environment had a fatal error, update of meta page failed
    #[error("environment had a fatal error")]
    Panic,
    /// Database version mismatch
    #[error("database version mismatch")]
    VersionMismatch,
    /// File is not a valid MDBX file
    #[error("file is not a valid MDBX file")]
    Invalid,
    /// Environment mapsize limit reached
    #[error("environment mapsize limit reached")]
    MapFull,
    /// Environment maxdbs limit reached
    #[error("environment maxdbs limit reached")]
    DbsFull,
    /// Environment maxreaders limit reached
    #[error("environment maxreaders limit reached")]
    ReadersFull,
    /// Transaction has too many dirty pages
    #[error("transaction has too many dirty pages")]
    TxnFull,
    /// Too many open cursors
    #[error("too many open cursors")]
    CursorFull,
    /// Page has not enough space
    #[error("page has not enough space")]
    PageFull,
    /// Database contents grew beyond the geometry's upper bound
    #[error("database size limit reached, cannot extend the map")]
    UnableExtendMapSize,
    /// Operation and database incompatible
    #[error("operation and database incompatible")]
    Incompatible,
    /// Invalid reuse of reader locktable slot
    #[error("invalid reuse of reader locktable slot")]
    BadRslot,
    /// Transaction is not valid for the requested operation
    #[error("transaction is not valid for the requested operation")]
    BadTxn,
    /// Unsupported size of key/DB name/data, or wrong DUPFIXED size
    #[error("unsupported size of key, database name or value")]
    BadValSize,
    /// The specified DBI handle is invalid or was changed unexpectedly
    #[error("the specified DBI handle is invalid")]
    BadDbi,
    /// Unexpected internal error
    #[error("unexpected internal problem")]
    Problem,
    /// Another write transaction is running, or the environment is busy
    #[error("environment or transaction is busy")]
    Busy,
    /// The key has multiple values and the operation is ambiguous
    #[error("the key has multiple ordered values")]
    Multival,
    /// Handle has a wrong signature, e.g. use of an already closed handle
    #[error("bad signature of a runtime object, likely a closed handle")]
    BadSignature,
    /// Database should be recovered, but cannot in read-only mode
    #[error("database needs recovery but was opened read-only")]
    WannaRecovery,
    /// The given key value does not match the cursor's ordering constraint
    #[error("the given key does not match the expected ordering")]
    KeyMismatch,
    /// Database is too large for the current system
    #[error("database is too large for this process")]
    TooLarge,
    /// Write transaction used from a thread other than its owner
    #[error("transaction used from a thread other than its owner")]
    ThreadMismatch,
    /// Overlapping read and write transactions in the same thread
    #[error("overlapping read and write transactions in the same thread")]
    TxnOverlapping,
    /// No data available, e.g. a cursor without a position
    #[error("no data available")]
    NoData,
    /// Access denied by the operating system
    #[error("access denied")]
    Access,
    /// Operation not permitted in the current environment mode
    #[error("operation not permitted")]
    Perm,
    /// Unknown error code or OS errno passthrough
    #[error("unexpected error code {0}")]
    Other(c_int),
}

impl From<c_int> for Error {
    fn from(err: c_int) -> Error {
        match err {
            ffi::MDBX_KEYEXIST => Error::KeyExist,
            ffi::MDBX_NOTFOUND => Error::NotFound,
            ffi::MDBX_PAGE_NOTFOUND => Error::PageNotFound,
            ffi::MDBX_CORRUPTED => Error::Corrupted,
            ffi::MDBX_PANIC => Error::Panic,
            ffi::MDBX_VERSION_MISMATCH => Error::VersionMismatch,
            ffi::MDBX_INVALID => Error::Invalid,
            ffi::MDBX_MAP_FULL => Error::MapFull,
            ffi::MDBX_DBS_FULL => Error::DbsFull,
            ffi::MDBX_READERS_FULL => Error::ReadersFull,
            ffi::MDBX_TXN_FULL => Error::TxnFull,
            ffi::MDBX_CURSOR_FULL => Error::CursorFull,
            ffi::MDBX_PAGE_FULL => Error::PageFull,
            ffi::MDBX_UNABLE_EXTEND_MAPSIZE => Error::UnableExtendMapSize,
            ffi::MDBX_INCOMPATIBLE => Error::Incompatible,
            ffi::MDBX_BAD_RSLOT => Error::BadRslot,
            ffi::MDBX_BAD_TXN => Error::BadTxn,
            ffi::MDBX_BAD_VALSIZE => Error::BadValSize,
            ffi::MDBX_BAD_DBI => Error::BadDbi,
            ffi::MDBX_PROBLEM => Error::Problem,
            ffi::MDBX_BUSY => Error::Busy,
            ffi::MDBX_EMULTIVAL => Error::Multival,
            ffi::MDBX_EBADSIGN => Error::BadSignature,
            ffi::MDBX_WANNA_RECOVERY => Error::WannaRecovery,
            ffi::MDBX_EKEYMISMATCH => Error::KeyMismatch,
            ffi::MDBX_TOO_LARGE => Error::TooLarge,
            ffi::MDBX_THREAD_MISMATCH => Error::ThreadMismatch,
            ffi::MDBX_TXN_OVERLAPPING => Error::TxnOverlapping,
            ffi::MDBX_ENODATA => Error::NoData,
            ffi::MDBX_EACCESS => Error::Access,
            ffi::MDBX_EPERM => Error::Perm,
            err => Error::Other(err),
        }
    }
}

/// Helper trait for converting native return codes to Results
pub(crate) trait IntoResult {
    fn into_result(self) -> Result<()>;
}

impl IntoResult for c_int {
    fn into_result(self) -> Result<()> {
        if self == ffi::MDBX_SUCCESS || self == ffi::MDBX_RESULT_TRUE {
            Ok(())
        } else {
            Err(Error::from(self))
        }
    }
}

/// Like [`IntoResult`], but keeps the engine's boolean answer.
pub(crate) fn mdbx_result(code: c_int) -> Result<bool> {
    match code {
        ffi::MDBX_SUCCESS => Ok(false),
        ffi::MDBX_RESULT_TRUE => Ok(true),
        code => Err(Error::from(code)),
    }
}
