use bitflags::bitflags;
use mdbx_sys as ffi;

// Environment flags
bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct EnvFlags: u32 {
        const NOSUBDIR = ffi::MDBX_NOSUBDIR;
        const RDONLY = ffi::MDBX_RDONLY;
        const EXCLUSIVE = ffi::MDBX_EXCLUSIVE;
        const ACCEDE = ffi::MDBX_ACCEDE;
        const WRITEMAP = ffi::MDBX_WRITEMAP;
        const NOTLS = ffi::MDBX_NOTLS;
        const NORDAHEAD = ffi::MDBX_NORDAHEAD;
        const NOMEMINIT = ffi::MDBX_NOMEMINIT;
        const COALESCE = ffi::MDBX_COALESCE;
        const LIFORECLAIM = ffi::MDBX_LIFORECLAIM;
        const PAGEPERTURB = ffi::MDBX_PAGEPERTURB;
        const NOMETASYNC = ffi::MDBX_NOMETASYNC;
        const SAFE_NOSYNC = ffi::MDBX_SAFE_NOSYNC;
        const UTTERLY_NOSYNC = ffi::MDBX_UTTERLY_NOSYNC;
    }
}

// Database flags
bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct DbFlags: u32 {
        const REVERSEKEY = ffi::MDBX_REVERSEKEY;
        const DUPSORT = ffi::MDBX_DUPSORT;
        const INTEGERKEY = ffi::MDBX_INTEGERKEY;
        const DUPFIXED = ffi::MDBX_DUPFIXED;
        const INTEGERDUP = ffi::MDBX_INTEGERDUP;
        const REVERSEDUP = ffi::MDBX_REVERSEDUP;
        const CREATE = ffi::MDBX_CREATE;
        const ACCEDE = ffi::MDBX_DB_ACCEDE;
    }
}

// Write operation flags
bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct WriteFlags: u32 {
        const NOOVERWRITE = ffi::MDBX_NOOVERWRITE;
        const NODUPDATA = ffi::MDBX_NODUPDATA;
        const CURRENT = ffi::MDBX_CURRENT;
        const ALLDUPS = ffi::MDBX_ALLDUPS;
        const RESERVE = ffi::MDBX_RESERVE;
        const APPEND = ffi::MDBX_APPEND;
        const APPENDDUP = ffi::MDBX_APPENDDUP;
        const MULTIPLE = ffi::MDBX_MULTIPLE;
    }
}

// Copy operation flags
bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CopyFlags: u32 {
        const COMPACT = ffi::MDBX_CP_COMPACT;
        const FORCE_DYNAMIC_SIZE = ffi::MDBX_CP_FORCE_DYNAMIC_SIZE;
    }
}
