use std::ffi::CString;
use std::mem::MaybeUninit;
use std::os::raw::c_uint;
use std::ptr;
use std::slice;

use mdbx_sys as ffi;

use crate::constants::{DbFlags, WriteFlags};
use crate::cursor::Cursor;
use crate::error::{Error, IntoResult, Result};
use crate::transaction::{Transaction, TransactionKind, RW};
use crate::types::Stat;
use crate::value::{out_val, to_val, val_to_vec};

/// Database handle
///
/// A `Database` wraps the engine's DBI: a small integer naming one
/// sub-database of the environment. Handles are env-wide once the
/// transaction that opened them has committed, and are freely copyable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Database {
    /// Database identifier
    dbi: ffi::MDBX_dbi,
}

impl Database {
    /// Open a database in the transaction's environment
    ///
    /// `None` opens the unnamed root database. Named databases require
    /// the environment to be configured with `set_max_dbs`, and creating
    /// one (`DbFlags::CREATE`) requires a write transaction.
    pub fn open<K: TransactionKind>(
        txn: &Transaction<'_, K>,
        name: Option<&str>,
        flags: DbFlags,
    ) -> Result<Database> {
        let name_cstr = match name {
            Some(n) => Some(CString::new(n).map_err(|_| Error::Invalid)?),
            None => None,
        };
        let name_ptr = name_cstr.as_ref().map_or(ptr::null(), |n| n.as_ptr());

        let mut dbi: ffi::MDBX_dbi = 0;
        unsafe { ffi::mdbx_dbi_open(txn.txn_ptr(), name_ptr, flags.bits(), &mut dbi) }
            .into_result()?;
        Ok(Database { dbi })
    }

    /// Get the raw DBI value
    pub fn dbi(&self) -> u32 {
        self.dbi
    }

    /// Get a value by key
    ///
    /// A missing key is `Ok(None)`; all other failures are errors. The
    /// returned bytes are copied out of the snapshot, so they stay valid
    /// after the transaction ends.
    pub fn get<K: TransactionKind>(
        &self,
        txn: &Transaction<'_, K>,
        key: &[u8],
    ) -> Result<Option<Vec<u8>>> {
        let key_val = to_val(key);
        let mut data_val = out_val();

        let rc = unsafe { ffi::mdbx_get(txn.txn_ptr(), self.dbi, &key_val, &mut data_val) };
        match rc {
            ffi::MDBX_SUCCESS => Ok(Some(unsafe { val_to_vec(&data_val) })),
            ffi::MDBX_NOTFOUND => Ok(None),
            rc => Err(Error::from(rc)),
        }
    }

    /// Put a key/value pair
    pub fn put(
        &self,
        txn: &Transaction<'_, RW>,
        key: &[u8],
        data: &[u8],
        flags: WriteFlags,
    ) -> Result<()> {
        let key_val = to_val(key);
        let mut data_val = to_val(data);
        unsafe { ffi::mdbx_put(txn.txn_ptr(), self.dbi, &key_val, &mut data_val, flags.bits()) }
            .into_result()
    }

    /// Reserve space for a value and return the engine-owned buffer
    ///
    /// The caller fills the buffer before the transaction commits. The
    /// borrow ends with the transaction, so the buffer cannot dangle.
    pub fn reserve<'txn>(
        &self,
        txn: &'txn Transaction<'_, RW>,
        key: &[u8],
        len: usize,
        flags: WriteFlags,
    ) -> Result<&'txn mut [u8]> {
        let key_val = to_val(key);
        let mut data_val = ffi::MDBX_val {
            iov_base: ptr::null_mut(),
            iov_len: len,
        };
        unsafe {
            ffi::mdbx_put(
                txn.txn_ptr(),
                self.dbi,
                &key_val,
                &mut data_val,
                flags.bits() | ffi::MDBX_RESERVE,
            )
            .into_result()?;
            if data_val.iov_len == 0 {
                Ok(&mut [])
            } else {
                Ok(slice::from_raw_parts_mut(
                    data_val.iov_base as *mut u8,
                    data_val.iov_len,
                ))
            }
        }
    }

    /// Delete a key/value pair
    ///
    /// With `data` only the matching duplicate is deleted; without it the
    /// key is deleted with all of its values. Deleting a missing key
    /// reports `NotFound`.
    pub fn del(&self, txn: &Transaction<'_, RW>, key: &[u8], data: Option<&[u8]>) -> Result<()> {
        let key_val = to_val(key);
        let rc = match data {
            Some(d) => {
                let data_val = to_val(d);
                unsafe { ffi::mdbx_del(txn.txn_ptr(), self.dbi, &key_val, &data_val) }
            }
            None => unsafe { ffi::mdbx_del(txn.txn_ptr(), self.dbi, &key_val, ptr::null()) },
        };
        rc.into_result()
    }

    /// Get database statistics
    pub fn stat<K: TransactionKind>(&self, txn: &Transaction<'_, K>) -> Result<Stat> {
        let mut stat = MaybeUninit::<ffi::MDBX_stat>::uninit();
        unsafe {
            ffi::mdbx_dbi_stat(
                txn.txn_ptr(),
                self.dbi,
                stat.as_mut_ptr(),
                std::mem::size_of::<ffi::MDBX_stat>(),
            )
        }
        .into_result()?;
        Ok(Stat::from(unsafe { stat.assume_init() }))
    }

    /// Get database flags
    pub fn flags<K: TransactionKind>(&self, txn: &Transaction<'_, K>) -> Result<DbFlags> {
        let mut flags: c_uint = 0;
        let mut state: c_uint = 0;
        unsafe { ffi::mdbx_dbi_flags_ex(txn.txn_ptr(), self.dbi, &mut flags, &mut state) }
            .into_result()?;
        Ok(DbFlags::from_bits_truncate(flags))
    }

    /// Empty the database, or delete it together with its handle
    pub fn drop(&self, txn: &Transaction<'_, RW>, del: bool) -> Result<()> {
        unsafe { ffi::mdbx_drop(txn.txn_ptr(), self.dbi, del) }.into_result()
    }

    /// Read and advance the database's persistent sequence
    ///
    /// Returns the value before the increment. A non-zero increment
    /// requires a write transaction; with zero this is a plain read.
    pub fn sequence<K: TransactionKind>(
        &self,
        txn: &Transaction<'_, K>,
        increment: u64,
    ) -> Result<u64> {
        let mut value: u64 = 0;
        unsafe { ffi::mdbx_dbi_sequence(txn.txn_ptr(), self.dbi, &mut value, increment) }
            .into_result()?;
        Ok(value)
    }

    /// Create a cursor for this database
    pub fn cursor<'txn, K: TransactionKind>(
        &self,
        txn: &'txn Transaction<'_, K>,
    ) -> Result<Cursor<'txn, K>> {
        Cursor::new(txn, *self)
    }
}
