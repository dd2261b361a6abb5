use std::marker::PhantomData;
use std::mem;
use std::ptr::{self, NonNull};

use libc::c_void;
use mdbx_sys as ffi;
use mdbx_sys::MDBX_cursor_op::*;

use crate::constants::WriteFlags;
use crate::database::Database;
use crate::error::{Error, IntoResult, Result};
use crate::transaction::{Transaction, TransactionKind, RO, RW};
use crate::value::{out_val, to_val, val_to_vec};

/// Database cursor
///
/// A cursor tracks a position in the ordered key space of one database.
/// It borrows the transaction it was opened in and is closed on drop.
#[derive(Debug)]
pub struct Cursor<'txn, K: TransactionKind> {
    cursor: NonNull<ffi::MDBX_cursor>,
    dbi: ffi::MDBX_dbi,
    _marker: PhantomData<(&'txn (), K, *mut c_void)>,
}

impl<'txn, K: TransactionKind> Cursor<'txn, K> {
    pub(crate) fn new(txn: &'txn Transaction<'_, K>, db: Database) -> Result<Self> {
        let mut cursor: *mut ffi::MDBX_cursor = ptr::null_mut();
        unsafe { ffi::mdbx_cursor_open(txn.txn_ptr(), db.dbi(), &mut cursor) }.into_result()?;
        Ok(Cursor {
            cursor: NonNull::new(cursor).ok_or(Error::Invalid)?,
            dbi: db.dbi(),
            _marker: PhantomData,
        })
    }

    /// Get the handle of the database the cursor reads
    pub fn dbi(&self) -> u32 {
        self.dbi
    }

    // One mdbx_cursor_get round trip. Exhausted positions come back as
    // None, everything else as the translated native error.
    fn get_op(
        &self,
        key: Option<&[u8]>,
        data: Option<&[u8]>,
        op: ffi::MDBX_cursor_op,
    ) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        let mut key_val = key.map_or_else(out_val, to_val);
        let mut data_val = data.map_or_else(out_val, to_val);

        let rc =
            unsafe { ffi::mdbx_cursor_get(self.cursor.as_ptr(), &mut key_val, &mut data_val, op) };
        match rc {
            ffi::MDBX_SUCCESS => {
                Ok(Some(unsafe { (val_to_vec(&key_val), val_to_vec(&data_val)) }))
            }
            ffi::MDBX_NOTFOUND | ffi::MDBX_ENODATA => Ok(None),
            rc => Err(Error::from(rc)),
        }
    }

    // Like get_op, for the duplicate positioning operations that leave
    // the key untouched and only report the value.
    fn get_value_op(&self, op: ffi::MDBX_cursor_op) -> Result<Option<Vec<u8>>> {
        let mut key_val = out_val();
        let mut data_val = out_val();

        let rc =
            unsafe { ffi::mdbx_cursor_get(self.cursor.as_ptr(), &mut key_val, &mut data_val, op) };
        match rc {
            ffi::MDBX_SUCCESS => Ok(Some(unsafe { val_to_vec(&data_val) })),
            ffi::MDBX_NOTFOUND | ffi::MDBX_ENODATA => Ok(None),
            rc => Err(Error::from(rc)),
        }
    }

    /// Position at first key/data item
    pub fn first(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(None, None, MDBX_FIRST)
    }

    /// Position at last key/data item
    pub fn last(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(None, None, MDBX_LAST)
    }

    /// Position at next item
    pub fn next(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(None, None, MDBX_NEXT)
    }

    /// Position at previous item
    pub fn prev(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(None, None, MDBX_PREV)
    }

    /// Return the item at the current position
    pub fn get_current(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(None, None, MDBX_GET_CURRENT)
    }

    /// Position at the specified key
    pub fn set(&self, key: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(Some(key), None, MDBX_SET_KEY)
    }

    /// Position at the first key greater than or equal to the given key
    pub fn set_range(&self, key: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(Some(key), None, MDBX_SET_RANGE)
    }

    /// Position at the first duplicate value of the current key
    pub fn first_dup(&self) -> Result<Option<Vec<u8>>> {
        self.get_value_op(MDBX_FIRST_DUP)
    }

    /// Position at the last duplicate value of the current key
    pub fn last_dup(&self) -> Result<Option<Vec<u8>>> {
        self.get_value_op(MDBX_LAST_DUP)
    }

    /// Position at the next duplicate value of the current key
    pub fn next_dup(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(None, None, MDBX_NEXT_DUP)
    }

    /// Position at the previous duplicate value of the current key
    pub fn prev_dup(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(None, None, MDBX_PREV_DUP)
    }

    /// Position at the first value of the next key
    pub fn next_nodup(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(None, None, MDBX_NEXT_NODUP)
    }

    /// Position at the last value of the previous key
    pub fn prev_nodup(&self) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(None, None, MDBX_PREV_NODUP)
    }

    /// Position at the exact key/data pair
    pub fn get_both(&self, key: &[u8], data: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(Some(key), Some(data), MDBX_GET_BOTH)
    }

    /// Position at the key, with the nearest duplicate >= the given data
    pub fn get_both_range(&self, key: &[u8], data: &[u8]) -> Result<Option<(Vec<u8>, Vec<u8>)>> {
        self.get_op(Some(key), Some(data), MDBX_GET_BOTH_RANGE)
    }

    /// Count the duplicate values of the current key
    pub fn count(&self) -> Result<u64> {
        let mut count: usize = 0;
        unsafe { ffi::mdbx_cursor_count(self.cursor.as_ptr(), &mut count) }.into_result()?;
        Ok(count as u64)
    }

    /// Iterate the whole database from the first key
    pub fn iter(&self) -> Iter<'_, 'txn, K> {
        Iter {
            cursor: self,
            start: Some(StartPos::First),
        }
    }

    /// Iterate from the first key greater than or equal to `key`
    pub fn iter_from(&self, key: &[u8]) -> Iter<'_, 'txn, K> {
        Iter {
            cursor: self,
            start: Some(StartPos::Range(key.to_vec())),
        }
    }

    /// Iterate the duplicate values of `key` in engine order
    pub fn iter_dup_of(&self, key: &[u8]) -> IterDup<'_, 'txn, K> {
        IterDup {
            cursor: self,
            start: Some(key.to_vec()),
        }
    }
}

impl<'txn> Cursor<'txn, RO> {
    /// Rebind the cursor to a newer read-only transaction
    ///
    /// The position is lost; the database binding is kept.
    pub fn renew<'t2>(self, txn: &'t2 Transaction<'_, RO>) -> Result<Cursor<'t2, RO>> {
        let cursor = self.cursor;
        let dbi = self.dbi;
        mem::forget(self);
        match unsafe { ffi::mdbx_cursor_renew(txn.txn_ptr(), cursor.as_ptr()) }.into_result() {
            Ok(()) => Ok(Cursor {
                cursor,
                dbi,
                _marker: PhantomData,
            }),
            Err(e) => {
                unsafe {
                    ffi::mdbx_cursor_close(cursor.as_ptr());
                }
                Err(e)
            }
        }
    }
}

impl<'txn> Cursor<'txn, RW> {
    /// Store an item through the cursor
    pub fn put(&self, key: &[u8], data: &[u8], flags: WriteFlags) -> Result<()> {
        let key_val = to_val(key);
        let mut data_val = to_val(data);
        unsafe { ffi::mdbx_cursor_put(self.cursor.as_ptr(), &key_val, &mut data_val, flags.bits()) }
            .into_result()
    }

    /// Delete the item at the current position
    ///
    /// `WriteFlags::ALLDUPS` deletes every value of the current key.
    pub fn del(&self, flags: WriteFlags) -> Result<()> {
        unsafe { ffi::mdbx_cursor_del(self.cursor.as_ptr(), flags.bits()) }.into_result()
    }

    /// Store multiple fixed-size values for one key in a single call
    ///
    /// The database must be opened with `DUPSORT | DUPFIXED`; `data`
    /// holds the values back to back, each exactly `stride` bytes.
    /// Returns the number of values actually written.
    pub fn put_multiple(&self, key: &[u8], data: &[u8], stride: usize) -> Result<usize> {
        if stride == 0 || data.len() % stride != 0 {
            return Err(Error::BadValSize);
        }
        let key_val = to_val(key);
        let mut data_vals = [
            ffi::MDBX_val {
                iov_base: data.as_ptr() as *mut c_void,
                iov_len: stride,
            },
            ffi::MDBX_val {
                iov_base: ptr::null_mut(),
                iov_len: data.len() / stride,
            },
        ];
        unsafe {
            ffi::mdbx_cursor_put(
                self.cursor.as_ptr(),
                &key_val,
                data_vals.as_mut_ptr(),
                WriteFlags::MULTIPLE.bits(),
            )
        }
        .into_result()?;
        Ok(data_vals[1].iov_len)
    }
}

impl<K: TransactionKind> Drop for Cursor<'_, K> {
    fn drop(&mut self) {
        unsafe {
            ffi::mdbx_cursor_close(self.cursor.as_ptr());
        }
    }
}

enum StartPos {
    First,
    Range(Vec<u8>),
}

/// Iterator over key/value pairs in engine order
pub struct Iter<'cur, 'txn, K: TransactionKind> {
    cursor: &'cur Cursor<'txn, K>,
    start: Option<StartPos>,
}

impl<K: TransactionKind> Iterator for Iter<'_, '_, K> {
    type Item = Result<(Vec<u8>, Vec<u8>)>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = match self.start.take() {
            Some(StartPos::First) => self.cursor.first(),
            Some(StartPos::Range(key)) => self.cursor.set_range(&key),
            None => self.cursor.next(),
        };
        step.transpose()
    }
}

/// Iterator over the duplicate values of a single key
pub struct IterDup<'cur, 'txn, K: TransactionKind> {
    cursor: &'cur Cursor<'txn, K>,
    start: Option<Vec<u8>>,
}

impl<K: TransactionKind> Iterator for IterDup<'_, '_, K> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        let step = match self.start.take() {
            Some(key) => self.cursor.set(&key),
            None => self.cursor.next_dup(),
        };
        step.map(|opt| opt.map(|(_, data)| data)).transpose()
    }
}
