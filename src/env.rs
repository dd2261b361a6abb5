use std::ffi::CString;
use std::mem::MaybeUninit;
use std::os::raw::{c_int, c_uint, c_void};
use std::os::unix::ffi::OsStrExt;
use std::os::unix::io::RawFd;
use std::path::{Path, PathBuf};
use std::ptr::{self, NonNull};

use lazy_static::lazy_static;
use log::{debug, warn};
use mdbx_sys as ffi;
use once_cell::sync::Lazy;

use crate::constants::{CopyFlags, DbFlags, EnvFlags};
use crate::database::Database;
use crate::error::{mdbx_result, Error, IntoResult, Result};
use crate::transaction::{Transaction, RO, RW};
use crate::types::{EnvInfo, ReaderInfo, Stat};

lazy_static! {
    /// The flags the engine accepts after the environment is open.
    static ref CHANGEABLE: EnvFlags = EnvFlags::SAFE_NOSYNC
        | EnvFlags::NOMETASYNC
        | EnvFlags::UTTERLY_NOSYNC
        | EnvFlags::NOMEMINIT
        | EnvFlags::COALESCE
        | EnvFlags::PAGEPERTURB;
}

/// Requested environment geometry.
///
/// A value of `-1` keeps the engine's current (or default) setting for
/// that field, mirroring the native `mdbx_env_set_geometry` contract.
#[derive(Debug, Clone, Copy)]
pub struct Geometry {
    pub size_lower: isize,
    pub size_now: isize,
    pub size_upper: isize,
    pub growth_step: isize,
    pub shrink_threshold: isize,
    pub page_size: isize,
}

impl Default for Geometry {
    fn default() -> Self {
        Geometry {
            size_lower: -1,
            size_now: -1,
            size_upper: -1,
            growth_step: -1,
            shrink_threshold: -1,
            page_size: -1,
        }
    }
}

/// MDBX environment
///
/// The environment owns the native handle; dropping it closes the handle
/// and releases the memory map. All transactions and cursors borrow from
/// the environment, so they cannot outlive it.
#[derive(Debug)]
pub struct Environment {
    env: NonNull<ffi::MDBX_env>,
    /// Path given to open()
    path: PathBuf,
}

// The native environment handle is free-threaded; transaction handles
// are the thread-bound objects.
unsafe impl Send for Environment {}
unsafe impl Sync for Environment {}

impl Environment {
    /// Create a new environment handle
    ///
    /// Size and limit configuration must happen between new() and open().
    pub fn new() -> Result<Self> {
        let mut env: *mut ffi::MDBX_env = ptr::null_mut();
        unsafe { ffi::mdbx_env_create(&mut env) }.into_result()?;
        Ok(Environment {
            env: NonNull::new(env).ok_or(Error::Invalid)?,
            path: PathBuf::new(),
        })
    }

    /// Open the environment at `path` with the given flags and file mode
    pub fn open<P: AsRef<Path>>(&mut self, path: P, flags: EnvFlags, mode: u32) -> Result<()> {
        let path = path.as_ref();
        let cpath = CString::new(path.as_os_str().as_bytes()).map_err(|_| Error::Invalid)?;

        unsafe {
            ffi::mdbx_env_open(
                self.env.as_ptr(),
                cpath.as_ptr(),
                flags.bits(),
                mode as ffi::mdbx_mode_t,
            )
        }
        .into_result()?;

        self.path = path.to_path_buf();
        debug!("opened environment at {}", path.display());
        Ok(())
    }

    pub(crate) fn env_ptr(&self) -> *mut ffi::MDBX_env {
        self.env.as_ptr()
    }

    /// Set the environment geometry
    ///
    /// May be called before open() to configure the database size bounds,
    /// or on an open environment to grow them.
    pub fn set_geometry(&mut self, geo: Geometry) -> Result<()> {
        unsafe {
            ffi::mdbx_env_set_geometry(
                self.env.as_ptr(),
                geo.size_lower,
                geo.size_now,
                geo.size_upper,
                geo.growth_step,
                geo.shrink_threshold,
                geo.page_size,
            )
        }
        .into_result()
    }

    /// Set a fixed size for the memory map
    pub fn set_map_size(&mut self, size: usize) -> Result<()> {
        self.set_geometry(Geometry {
            size_now: size as isize,
            size_upper: size as isize,
            ..Default::default()
        })
    }

    /// Set the maximum number of named databases
    ///
    /// Must be called before open().
    pub fn set_max_dbs(&mut self, dbs: u32) -> Result<()> {
        unsafe { ffi::mdbx_env_set_option(self.env.as_ptr(), ffi::MDBX_opt_max_db, u64::from(dbs)) }
            .into_result()
    }

    /// Get the maximum number of named databases
    pub fn get_max_dbs(&self) -> Result<u32> {
        let mut value: u64 = 0;
        unsafe { ffi::mdbx_env_get_option(self.env.as_ptr(), ffi::MDBX_opt_max_db, &mut value) }
            .into_result()?;
        Ok(value as u32)
    }

    /// Set the maximum number of reader slots
    ///
    /// Must be called before open().
    pub fn set_max_readers(&mut self, readers: u32) -> Result<()> {
        unsafe {
            ffi::mdbx_env_set_option(
                self.env.as_ptr(),
                ffi::MDBX_opt_max_readers,
                u64::from(readers),
            )
        }
        .into_result()
    }

    /// Get the maximum number of reader slots
    pub fn get_max_readers(&self) -> Result<u32> {
        let mut value: u64 = 0;
        unsafe {
            ffi::mdbx_env_get_option(self.env.as_ptr(), ffi::MDBX_opt_max_readers, &mut value)
        }
        .into_result()?;
        Ok(value as u32)
    }

    /// Set environment flags.
    ///
    /// Only the runtime-changeable durability and allocation flags may be
    /// toggled after open(); everything else is fixed at open time.
    pub fn set_flags(&self, flags: EnvFlags, onoff: bool) -> Result<()> {
        if !CHANGEABLE.contains(flags) {
            return Err(Error::Perm);
        }
        unsafe { ffi::mdbx_env_set_flags(self.env.as_ptr(), flags.bits(), onoff) }.into_result()
    }

    /// Get environment flags.
    pub fn get_flags(&self) -> Result<EnvFlags> {
        let mut flags: c_uint = 0;
        unsafe { ffi::mdbx_env_get_flags(self.env.as_ptr(), &mut flags) }.into_result()?;
        Ok(EnvFlags::from_bits_truncate(flags))
    }

    /// Get the path that was used in open()
    pub fn get_path(&self) -> &Path {
        &self.path
    }

    /// Get the file descriptor of the main data file
    pub fn get_fd(&self) -> Result<RawFd> {
        let mut fd: ffi::mdbx_filehandle_t = -1;
        unsafe { ffi::mdbx_env_get_fd(self.env.as_ptr(), &mut fd) }.into_result()?;
        Ok(fd)
    }

    /// Get the maximum size of keys for a database with the given flags
    pub fn get_max_key_size(&self, flags: DbFlags) -> usize {
        let n = unsafe { ffi::mdbx_env_get_maxkeysize_ex(self.env.as_ptr(), flags.bits()) };
        if n < 0 {
            0
        } else {
            n as usize
        }
    }

    /// Get the maximum size of values for a database with the given flags
    pub fn get_max_value_size(&self, flags: DbFlags) -> usize {
        let n = unsafe { ffi::mdbx_env_get_maxvalsize_ex(self.env.as_ptr(), flags.bits()) };
        if n < 0 {
            0
        } else {
            n as usize
        }
    }

    /// Flush the data buffers to disk
    ///
    /// Data is durable once a transaction commits unless the environment
    /// runs with a relaxed durability flag; this forces the remaining
    /// buffered pages out. With `nonblock` the call reports `true` when a
    /// flush was not needed instead of waiting for one.
    pub fn sync(&self, force: bool, nonblock: bool) -> Result<bool> {
        mdbx_result(unsafe { ffi::mdbx_env_sync_ex(self.env.as_ptr(), force, nonblock) })
    }

    /// Copy the environment to the specified path
    ///
    /// This function may be used to make a backup of an existing
    /// environment. No lockfile is copied, since it gets recreated at
    /// need. `CopyFlags::COMPACT` omits freed pages and renumbers the
    /// rest.
    pub fn copy<P: AsRef<Path>>(&self, path: P, flags: CopyFlags) -> Result<()> {
        let path = path.as_ref();
        let cpath = CString::new(path.as_os_str().as_bytes()).map_err(|_| Error::Invalid)?;
        debug!("copying environment to {}", path.display());
        unsafe { ffi::mdbx_env_copy(self.env.as_ptr(), cpath.as_ptr(), flags.bits()) }
            .into_result()
    }

    /// Copy the environment to an already open file descriptor
    ///
    /// The file descriptor must be opened with write permission.
    pub fn copy_fd(&self, fd: RawFd, flags: CopyFlags) -> Result<()> {
        unsafe {
            ffi::mdbx_env_copy2fd(
                self.env.as_ptr(),
                fd as ffi::mdbx_filehandle_t,
                flags.bits(),
            )
        }
        .into_result()
    }

    /// Get environment statistics
    pub fn stat(&self) -> Result<Stat> {
        let mut stat = MaybeUninit::<ffi::MDBX_stat>::uninit();
        unsafe {
            ffi::mdbx_env_stat_ex(
                self.env.as_ptr(),
                ptr::null(),
                stat.as_mut_ptr(),
                std::mem::size_of::<ffi::MDBX_stat>(),
            )
        }
        .into_result()?;
        Ok(Stat::from(unsafe { stat.assume_init() }))
    }

    /// Get environment information, including the page operation counters
    pub fn info(&self) -> Result<EnvInfo> {
        let mut info = MaybeUninit::<ffi::MDBX_envinfo>::uninit();
        unsafe {
            ffi::mdbx_env_info_ex(
                self.env.as_ptr(),
                ptr::null(),
                info.as_mut_ptr(),
                std::mem::size_of::<ffi::MDBX_envinfo>(),
            )
        }
        .into_result()?;
        Ok(EnvInfo::from(unsafe { info.assume_init() }))
    }

    /// List the slots of the reader lock table
    pub fn reader_list(&self) -> Result<Vec<ReaderInfo>> {
        unsafe extern "C" fn reader_cb(
            ctx: *mut c_void,
            num: c_int,
            slot: c_int,
            pid: ffi::mdbx_pid_t,
            thread: ffi::mdbx_tid_t,
            txnid: u64,
            lag: u64,
            bytes_used: usize,
            bytes_retained: usize,
        ) -> c_int {
            let readers = &mut *(ctx as *mut Vec<ReaderInfo>);
            readers.push(ReaderInfo {
                num,
                slot,
                pid: pid as i32,
                thread: thread as u64,
                txn_id: txnid,
                lag,
                bytes_used: bytes_used as u64,
                bytes_retained: bytes_retained as u64,
            });
            0
        }

        let mut readers: Vec<ReaderInfo> = Vec::new();
        mdbx_result(unsafe {
            ffi::mdbx_reader_list(
                self.env.as_ptr(),
                Some(reader_cb),
                &mut readers as *mut Vec<ReaderInfo> as *mut c_void,
            )
        })?;
        Ok(readers)
    }

    /// Check for stale readers and release their lock table slots
    ///
    /// Returns the number of slots that were reclaimed.
    pub fn reader_check(&self) -> Result<usize> {
        let mut dead: c_int = 0;
        mdbx_result(unsafe { ffi::mdbx_reader_check(self.env.as_ptr(), &mut dead) })?;
        if dead > 0 {
            warn!("released locks for {} dead readers", dead);
        }
        Ok(dead as usize)
    }

    /// Begin a new write transaction
    pub fn begin_txn(&self) -> Result<Transaction<'_, RW>> {
        Transaction::new(self)
    }

    /// Begin a new read-only transaction
    pub fn begin_ro_txn(&self) -> Result<Transaction<'_, RO>> {
        Transaction::new(self)
    }

    /// Run `f` inside a read-only transaction
    ///
    /// The transaction is aborted when `f` returns; its lifetime is
    /// managed here, so `f` never has to (and never can) terminate the
    /// handle itself.
    pub fn view<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_, RO>) -> Result<T>,
    {
        let txn = self.begin_ro_txn()?;
        f(&txn)
    }

    /// Run `f` inside a write transaction
    ///
    /// The transaction commits when `f` returns `Ok` and aborts when it
    /// returns `Err`.
    pub fn update<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Transaction<'_, RW>) -> Result<T>,
    {
        let txn = self.begin_txn()?;
        let res = f(&txn)?;
        txn.commit()?;
        Ok(res)
    }

    /// Close a database handle opened in this environment
    ///
    /// Handles are env-wide; closing one invalidates every copy of it, so
    /// this is only safe housekeeping while no transaction is using the
    /// handle. Normally handles are simply kept until the environment is
    /// dropped.
    pub fn close_dbi(&self, db: Database) -> Result<()> {
        unsafe { ffi::mdbx_dbi_close(self.env.as_ptr(), db.dbi()) }.into_result()
    }

    /// Get the native library version
    pub fn version() -> (u32, u32, u32) {
        unsafe {
            (
                u32::from(ffi::mdbx_version.major),
                u32::from(ffi::mdbx_version.minor),
                u32::from(ffi::mdbx_version.release),
            )
        }
    }

    /// Get the native library version in String format
    pub fn version_string() -> &'static str {
        static VERSION: Lazy<String> = Lazy::new(|| {
            let (major, minor, release) = Environment::version();
            format!("{}.{}.{}", major, minor, release)
        });
        &VERSION
    }
}

impl Drop for Environment {
    fn drop(&mut self) {
        debug!("closing environment at {}", self.path.display());
        unsafe {
            ffi::mdbx_env_close_ex(self.env.as_ptr(), false);
        }
    }
}
