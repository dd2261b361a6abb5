use std::ptr;
use std::slice;

use libc::c_void;
use mdbx_sys as ffi;

/// Build an MDBX_val referencing `data`. The engine only reads through
/// values passed for keys and lookups.
pub(crate) fn to_val(data: &[u8]) -> ffi::MDBX_val {
    ffi::MDBX_val {
        iov_base: data.as_ptr() as *mut c_void,
        iov_len: data.len(),
    }
}

/// An empty MDBX_val for the engine to fill in.
pub(crate) fn out_val() -> ffi::MDBX_val {
    ffi::MDBX_val {
        iov_base: ptr::null_mut(),
        iov_len: 0,
    }
}

/// Borrow the bytes an engine-owned MDBX_val points at.
///
/// The returned slice is only valid while the transaction that produced
/// the value is live and unwritten; callers that outlive it must copy.
pub(crate) unsafe fn val_to_slice<'a>(val: &ffi::MDBX_val) -> &'a [u8] {
    if val.iov_len == 0 {
        &[]
    } else {
        slice::from_raw_parts(val.iov_base as *const u8, val.iov_len)
    }
}

/// Copy an engine-owned MDBX_val into caller-owned bytes.
pub(crate) unsafe fn val_to_vec(val: &ffi::MDBX_val) -> Vec<u8> {
    val_to_slice(val).to_vec()
}
