// src/lib.rs
mod constants;
mod cursor;
mod database;
mod env;
mod error;
mod transaction;
mod types;
mod value;

pub use constants::{CopyFlags, DbFlags, EnvFlags, WriteFlags};
pub use cursor::{Cursor, Iter, IterDup};
pub use database::Database;
pub use env::{Environment, Geometry};
pub use error::{Error, Result};
pub use transaction::{
    InactiveTransaction, ParkedTransaction, Transaction, TransactionKind, RO, RW,
};
pub use types::{CommitLatency, EnvInfo, PageOps, ReaderInfo, Stat, TxnInfo};
