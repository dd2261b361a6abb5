use std::marker::PhantomData;
use std::mem::{self, MaybeUninit};
use std::os::raw::c_void;
use std::ptr::{self, NonNull};

use mdbx_sys as ffi;

use crate::env::Environment;
use crate::error::{Error, IntoResult, Result};
use crate::types::{CommitLatency, TxnInfo};

mod sealed {
    pub trait Sealed {}
    impl Sealed for super::RO {}
    impl Sealed for super::RW {}
}

/// Marker type for read-only transactions
#[derive(Debug, Clone, Copy)]
pub struct RO;

/// Marker type for read-write transactions
#[derive(Debug, Clone, Copy)]
pub struct RW;

/// The two transaction kinds the engine distinguishes
pub trait TransactionKind: sealed::Sealed + 'static {
    #[doc(hidden)]
    const FLAGS: ffi::MDBX_txn_flags_t;
}

impl TransactionKind for RO {
    const FLAGS: ffi::MDBX_txn_flags_t = ffi::MDBX_TXN_RDONLY;
}

impl TransactionKind for RW {
    const FLAGS: ffi::MDBX_txn_flags_t = ffi::MDBX_TXN_READWRITE;
}

/// Database transaction
///
/// Write transactions must stay on the thread that began them; the
/// handle is `!Send`, so the engine's thread rule cannot be violated
/// from safe code. Dropping an unconsumed transaction aborts it.
#[derive(Debug)]
pub struct Transaction<'env, K: TransactionKind> {
    txn: NonNull<ffi::MDBX_txn>,
    env: &'env Environment,
    /// Ties the handle to its opening thread
    _kind: PhantomData<(K, *mut c_void)>,
}

impl<'env, K: TransactionKind> Transaction<'env, K> {
    pub(crate) fn new(env: &'env Environment) -> Result<Self> {
        Self::begin(env, ptr::null_mut())
    }

    fn begin(env: &'env Environment, parent: *mut ffi::MDBX_txn) -> Result<Self> {
        let mut txn: *mut ffi::MDBX_txn = ptr::null_mut();
        unsafe {
            ffi::mdbx_txn_begin_ex(env.env_ptr(), parent, K::FLAGS, &mut txn, ptr::null_mut())
        }
        .into_result()?;
        Ok(Transaction {
            txn: NonNull::new(txn).ok_or(Error::BadSignature)?,
            env,
            _kind: PhantomData,
        })
    }

    pub(crate) fn txn_ptr(&self) -> *mut ffi::MDBX_txn {
        self.txn.as_ptr()
    }

    /// Get a reference to the owning environment
    pub fn env(&self) -> &Environment {
        self.env
    }

    /// Get the transaction (snapshot) identifier
    ///
    /// Read-only transactions share the identifier of the snapshot they
    /// view; it changes when the handle is renewed.
    pub fn id(&self) -> u64 {
        unsafe { ffi::mdbx_txn_id(self.txn.as_ptr()) }
    }

    /// Get information about the transaction
    ///
    /// With `scan_rlt` the engine additionally scans the reader lock
    /// table, which is slower but fills the lag-dependent fields.
    pub fn info(&self, scan_rlt: bool) -> Result<TxnInfo> {
        let mut info = MaybeUninit::<ffi::MDBX_txn_info>::uninit();
        unsafe { ffi::mdbx_txn_info(self.txn.as_ptr(), info.as_mut_ptr(), scan_rlt) }
            .into_result()?;
        Ok(TxnInfo::from(unsafe { info.assume_init() }))
    }

    /// Commit the transaction
    pub fn commit(self) -> Result<()> {
        self.commit_with_latency().map(|_| ())
    }

    /// Commit the transaction and report the engine's per-stage timings
    pub fn commit_with_latency(self) -> Result<CommitLatency> {
        let mut latency = MaybeUninit::<ffi::MDBX_commit_latency>::uninit();
        let rc = unsafe { ffi::mdbx_txn_commit_ex(self.txn.as_ptr(), latency.as_mut_ptr()) };
        mem::forget(self);
        rc.into_result()?;
        Ok(CommitLatency::from(unsafe { latency.assume_init() }))
    }

    /// Abort the transaction
    ///
    /// Equivalent to dropping the handle; provided for symmetry with the
    /// native API.
    pub fn abort(self) {
        drop(self);
    }
}

impl<'env> Transaction<'env, RO> {
    /// Release the snapshot but keep the handle and its reader slot
    ///
    /// The handle can be revived later with
    /// [`InactiveTransaction::renew`], which is cheaper than beginning a
    /// fresh transaction.
    pub fn reset(self) -> InactiveTransaction<'env> {
        let txn = self.txn;
        let env = self.env;
        mem::forget(self);
        unsafe {
            ffi::mdbx_txn_reset(txn.as_ptr());
        }
        InactiveTransaction { txn, env }
    }

    /// Park the transaction so it cannot hold back page reclamation
    ///
    /// A parked reader abandons its snapshot: the engine is free to
    /// recycle the pages the snapshot pinned, no matter how long the
    /// handle stays parked. Use [`ParkedTransaction::unpark`] to resume
    /// reading on a fresh snapshot.
    pub fn park(self) -> ParkedTransaction<'env> {
        let txn = self.txn;
        let env = self.env;
        mem::forget(self);
        unsafe {
            ffi::mdbx_txn_reset(txn.as_ptr());
        }
        ParkedTransaction { txn, env }
    }
}

impl<'env> Transaction<'env, RW> {
    /// Begin a nested sub-transaction
    ///
    /// The parent is inaccessible until the child commits or aborts.
    /// Committing the child merges its writes into the parent; dropping
    /// it rolls back only the child's writes.
    pub fn begin_nested(&mut self) -> Result<Transaction<'_, RW>> {
        Transaction::begin(self.env, self.txn.as_ptr())
    }
}

impl<K: TransactionKind> Drop for Transaction<'_, K> {
    fn drop(&mut self) {
        unsafe {
            ffi::mdbx_txn_abort(self.txn.as_ptr());
        }
    }
}

/// A read-only transaction whose snapshot was released by
/// [`Transaction::reset`]
#[derive(Debug)]
pub struct InactiveTransaction<'env> {
    txn: NonNull<ffi::MDBX_txn>,
    env: &'env Environment,
}

impl<'env> InactiveTransaction<'env> {
    /// Acquire a current snapshot, reusing the handle and reader slot
    pub fn renew(self) -> Result<Transaction<'env, RO>> {
        let txn = self.txn;
        let env = self.env;
        mem::forget(self);
        match unsafe { ffi::mdbx_txn_renew(txn.as_ptr()) }.into_result() {
            Ok(()) => Ok(Transaction {
                txn,
                env,
                _kind: PhantomData,
            }),
            Err(e) => {
                unsafe {
                    ffi::mdbx_txn_abort(txn.as_ptr());
                }
                Err(e)
            }
        }
    }
}

impl Drop for InactiveTransaction<'_> {
    fn drop(&mut self) {
        unsafe {
            ffi::mdbx_txn_abort(self.txn.as_ptr());
        }
    }
}

/// A read-only transaction parked by [`Transaction::park`]
#[derive(Debug)]
pub struct ParkedTransaction<'env> {
    txn: NonNull<ffi::MDBX_txn>,
    env: &'env Environment,
}

impl<'env> ParkedTransaction<'env> {
    /// Resume reading on a current snapshot
    ///
    /// When the handle's reader slot cannot be revived (for example, it
    /// was reclaimed while parked) and `restart_if_ousted` is set, a
    /// fresh transaction is begun instead of reporting the error.
    pub fn unpark(self, restart_if_ousted: bool) -> Result<Transaction<'env, RO>> {
        let txn = self.txn;
        let env = self.env;
        mem::forget(self);
        match unsafe { ffi::mdbx_txn_renew(txn.as_ptr()) }.into_result() {
            Ok(()) => Ok(Transaction {
                txn,
                env,
                _kind: PhantomData,
            }),
            Err(e) => {
                unsafe {
                    ffi::mdbx_txn_abort(txn.as_ptr());
                }
                if restart_if_ousted {
                    Transaction::new(env)
                } else {
                    Err(e)
                }
            }
        }
    }
}

impl Drop for ParkedTransaction<'_> {
    fn drop(&mut self) {
        unsafe {
            ffi::mdbx_txn_abort(self.txn.as_ptr());
        }
    }
}
