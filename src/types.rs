use std::time::Duration;

use mdbx_sys as ffi;

/// Statistics for the environment or for a single database
#[derive(Debug, Clone, Copy)]
pub struct Stat {
    pub psize: u32,
    pub depth: u32,
    pub branch_pages: u64,
    pub leaf_pages: u64,
    pub overflow_pages: u64,
    pub entries: u64,
}

impl From<ffi::MDBX_stat> for Stat {
    fn from(stat: ffi::MDBX_stat) -> Stat {
        Stat {
            psize: stat.ms_psize,
            depth: stat.ms_depth,
            branch_pages: stat.ms_branch_pages,
            leaf_pages: stat.ms_leaf_pages,
            overflow_pages: stat.ms_overflow_pages,
            entries: stat.ms_entries,
        }
    }
}

/// Page operation counters kept by the engine since the environment was
/// opened
#[derive(Debug, Clone, Copy)]
pub struct PageOps {
    /// Quantity of freshly allocated pages
    pub newly: u64,
    /// Quantity of pages copied for update
    pub cow: u64,
    /// Quantity of parent's dirty pages cloned for nested transactions
    pub clone: u64,
    /// Page split operations
    pub split: u64,
    /// Page merge operations
    pub merge: u64,
    /// Pages spilled to disk
    pub spill: u64,
    /// Spilled pages loaded back
    pub unspill: u64,
    /// Explicit write operations to disk
    pub wops: u64,
}

/// Environment information
#[derive(Debug, Clone, Copy)]
pub struct EnvInfo {
    pub mapsize: u64,
    pub geo_lower: u64,
    pub geo_upper: u64,
    pub geo_current: u64,
    pub last_pgno: u64,
    pub last_txnid: u64,
    pub max_readers: u32,
    pub num_readers: u32,
    pub dxb_pagesize: u32,
    pub sys_pagesize: u32,
    pub unsync_volume: u64,
    pub page_ops: PageOps,
}

impl From<ffi::MDBX_envinfo> for EnvInfo {
    fn from(info: ffi::MDBX_envinfo) -> EnvInfo {
        EnvInfo {
            mapsize: info.mi_mapsize,
            geo_lower: info.mi_geo.lower,
            geo_upper: info.mi_geo.upper,
            geo_current: info.mi_geo.current,
            last_pgno: info.mi_last_pgno,
            last_txnid: info.mi_recent_txnid,
            max_readers: info.mi_maxreaders,
            num_readers: info.mi_numreaders,
            dxb_pagesize: info.mi_dxb_pagesize,
            sys_pagesize: info.mi_sys_pagesize,
            unsync_volume: info.mi_unsync_volume,
            page_ops: PageOps {
                newly: info.mi_pgop_stat.newly,
                cow: info.mi_pgop_stat.cow,
                clone: info.mi_pgop_stat.clone,
                split: info.mi_pgop_stat.split,
                merge: info.mi_pgop_stat.merge,
                spill: info.mi_pgop_stat.spill,
                unspill: info.mi_pgop_stat.unspill,
                wops: info.mi_pgop_stat.wops,
            },
        }
    }
}

/// Information about a running transaction
#[derive(Debug, Clone, Copy)]
pub struct TxnInfo {
    /// Transaction (snapshot) identifier
    pub id: u64,
    /// For read transactions: snapshots the reader lags behind the head.
    /// For write transactions: readers lagging behind this one.
    pub reader_lag: u64,
    pub space_used: u64,
    pub space_limit_soft: u64,
    pub space_limit_hard: u64,
    /// Pages retired by this write transaction so far
    pub space_retired: u64,
    pub space_leftover: u64,
    pub space_dirty: u64,
}

impl From<ffi::MDBX_txn_info> for TxnInfo {
    fn from(info: ffi::MDBX_txn_info) -> TxnInfo {
        TxnInfo {
            id: info.txn_id,
            reader_lag: info.txn_reader_lag,
            space_used: info.txn_space_used,
            space_limit_soft: info.txn_space_limit_soft,
            space_limit_hard: info.txn_space_limit_hard,
            space_retired: info.txn_space_retired,
            space_leftover: info.txn_space_leftover,
            space_dirty: info.txn_space_dirty,
        }
    }
}

/// A slot in the environment's reader lock table
#[derive(Debug, Clone, Copy)]
pub struct ReaderInfo {
    pub num: i32,
    pub slot: i32,
    pub pid: i32,
    pub thread: u64,
    pub txn_id: u64,
    pub lag: u64,
    pub bytes_used: u64,
    pub bytes_retained: u64,
}

/// Per-stage timings reported by the engine for a commit
#[derive(Debug, Clone, Copy)]
pub struct CommitLatency {
    pub preparation: Duration,
    pub gc: Duration,
    pub audit: Duration,
    pub write: Duration,
    pub sync: Duration,
    pub ending: Duration,
    pub whole: Duration,
}

// The engine reports stage timings as seconds in 16.16 fixed point.
fn to_duration(seconds_16dot16: u32) -> Duration {
    Duration::from_nanos((u64::from(seconds_16dot16) * 1_000_000_000) >> 16)
}

impl From<ffi::MDBX_commit_latency> for CommitLatency {
    fn from(latency: ffi::MDBX_commit_latency) -> CommitLatency {
        CommitLatency {
            preparation: to_duration(latency.preparation),
            gc: to_duration(latency.gc),
            audit: to_duration(latency.audit),
            write: to_duration(latency.write),
            sync: to_duration(latency.sync),
            ending: to_duration(latency.ending),
            whole: to_duration(latency.whole),
        }
    }
}
