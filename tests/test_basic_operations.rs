use lumodbx::{CopyFlags, Database, DbFlags, Environment, EnvFlags, Error, WriteFlags};
use tempfile::TempDir;

// Common test setup
fn setup_test_env() -> (TempDir, Environment) {
    let temp_dir = TempDir::new().unwrap();
    let mut env = Environment::new().unwrap();
    env.set_max_dbs(8).unwrap();
    env.open(temp_dir.path(), EnvFlags::empty(), 0o644).unwrap();
    (temp_dir, env)
}

#[test]
fn test_database_open_close() {
    let (_dir, env) = setup_test_env();
    let txn = env.begin_txn().unwrap();

    // Opening the default database
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();
    assert!(db.flags(&txn).unwrap().is_empty());

    // Opening a named database
    let named = Database::open(&txn, Some("testdb"), DbFlags::CREATE).unwrap();
    assert_ne!(named.dbi(), db.dbi());
    txn.commit().unwrap();

    env.close_dbi(named).unwrap();
}

#[test]
fn test_basic_put_get() {
    let (_dir, env) = setup_test_env();
    let txn = env.begin_txn().unwrap();
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();

    let key = b"test_key";
    let value = b"test_value";

    db.put(&txn, key, value, WriteFlags::empty()).unwrap();
    let result = db.get(&txn, key).unwrap();

    assert_eq!(result.unwrap(), value);
}

#[test]
fn test_delete_operations() {
    let (_dir, env) = setup_test_env();
    let txn = env.begin_txn().unwrap();
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();

    // Insert and then delete data
    let key = b"delete_key";
    let value = b"delete_value";

    db.put(&txn, key, value, WriteFlags::empty()).unwrap();
    assert!(db.get(&txn, key).unwrap().is_some());

    db.del(&txn, key, None).unwrap();
    assert!(db.get(&txn, key).unwrap().is_none());

    // Deleting a missing key is reported, not swallowed
    assert_eq!(db.del(&txn, key, None), Err(Error::NotFound));
}

#[test]
fn test_reserve() {
    let (_dir, env) = setup_test_env();
    let txn = env.begin_txn().unwrap();
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();

    let buf = db.reserve(&txn, b"reserved", 5, WriteFlags::empty()).unwrap();
    assert_eq!(buf.len(), 5);
    buf.copy_from_slice(b"hello");
    txn.commit().unwrap();

    let txn = env.begin_ro_txn().unwrap();
    assert_eq!(db.get(&txn, b"reserved").unwrap().unwrap(), b"hello");
}

#[test]
fn test_database_stats() {
    let (_dir, env) = setup_test_env();
    let txn = env.begin_txn().unwrap();
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();

    // Get initial stats
    let stats = db.stat(&txn).unwrap();
    assert_eq!(stats.entries, 0);

    // Add some entries and check stats
    for i in 0..5 {
        let key = format!("key_{}", i);
        let value = format!("value_{}", i);
        db.put(&txn, key.as_bytes(), value.as_bytes(), WriteFlags::empty())
            .unwrap();
    }

    let stats = db.stat(&txn).unwrap();
    assert_eq!(stats.entries, 5);
    assert!(stats.psize > 0);
}

#[test]
fn test_database_drop() {
    let (_dir, env) = setup_test_env();
    let txn = env.begin_txn().unwrap();
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();

    db.put(&txn, b"a", b"1", WriteFlags::empty()).unwrap();
    db.put(&txn, b"b", b"2", WriteFlags::empty()).unwrap();

    // Emptying keeps the handle usable
    db.drop(&txn, false).unwrap();
    assert!(db.get(&txn, b"a").unwrap().is_none());
    assert_eq!(db.stat(&txn).unwrap().entries, 0);
}

#[test]
fn test_sequence() {
    let (_dir, env) = setup_test_env();
    let txn = env.begin_txn().unwrap();
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();

    assert_eq!(db.sequence(&txn, 5).unwrap(), 0);
    assert_eq!(db.sequence(&txn, 1).unwrap(), 5);
    // Zero increment is a plain read
    assert_eq!(db.sequence(&txn, 0).unwrap(), 6);
}

#[test]
fn test_error_handling() {
    let (_dir, env) = setup_test_env();
    let txn = env.begin_txn().unwrap();
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();

    // Key not found
    let result = db.get(&txn, b"nonexistent_key").unwrap();
    assert!(result.is_none());

    // Duplicate key with NOOVERWRITE flag
    let key = b"unique_key";
    db.put(&txn, key, b"value1", WriteFlags::empty()).unwrap();
    let result = db.put(&txn, key, b"value2", WriteFlags::NOOVERWRITE);
    assert_eq!(result, Err(Error::KeyExist));

    // The old value survived the rejected put
    assert_eq!(db.get(&txn, key).unwrap().unwrap(), b"value1");
}

#[test]
fn test_open_missing_named_database() {
    let (_dir, env) = setup_test_env();
    let txn = env.begin_ro_txn().unwrap();

    // No such database, and a read-only transaction cannot create one
    assert!(Database::open(&txn, Some("missing"), DbFlags::empty()).is_err());
    assert!(Database::open(&txn, Some("missing"), DbFlags::CREATE).is_err());
}

#[test]
fn test_transaction_isolation() {
    let (_dir, env) = setup_test_env();

    // Write transaction
    let write_txn = env.begin_txn().unwrap();
    let db = Database::open(&write_txn, None, DbFlags::empty()).unwrap();
    db.put(&write_txn, b"key", b"value", WriteFlags::empty())
        .unwrap();

    // Read transaction shouldn't see uncommitted changes
    let read_txn = env.begin_ro_txn().unwrap();
    let result = db.get(&read_txn, b"key").unwrap();
    assert!(result.is_none());
    drop(read_txn);

    // After commit, changes should be visible
    write_txn.commit().unwrap();
    let read_txn = env.begin_ro_txn().unwrap();
    let result = db.get(&read_txn, b"key").unwrap();
    assert_eq!(result.unwrap(), b"value");
}

#[test]
fn test_env_stat_and_info() {
    let (_dir, env) = setup_test_env();
    env.update(|txn| {
        let db = Database::open(txn, None, DbFlags::empty())?;
        db.put(txn, b"k", b"v", WriteFlags::empty())
    })
    .unwrap();

    let stat = env.stat().unwrap();
    assert!(stat.psize > 0);
    assert!(stat.entries >= 1);

    let info = env.info().unwrap();
    assert!(info.mapsize > 0);
    assert!(info.dxb_pagesize > 0);
    assert!(info.last_txnid > 0);
    assert!(info.geo_upper >= info.geo_current);
}

#[test]
fn test_env_sync() {
    let (_dir, env) = setup_test_env();
    env.update(|txn| {
        let db = Database::open(txn, None, DbFlags::empty())?;
        db.put(txn, b"k", b"v", WriteFlags::empty())
    })
    .unwrap();

    env.sync(true, false).unwrap();
}

#[test]
fn test_env_copy() {
    let (_dir, env) = setup_test_env();
    env.update(|txn| {
        let db = Database::open(txn, None, DbFlags::empty())?;
        db.put(txn, b"k", b"v", WriteFlags::empty())
    })
    .unwrap();

    let backup = TempDir::new().unwrap();
    env.copy(backup.path(), CopyFlags::empty()).unwrap();

    let mut copy_env = Environment::new().unwrap();
    copy_env
        .open(backup.path(), EnvFlags::empty(), 0o644)
        .unwrap();
    let value = copy_env
        .view(|txn| {
            let db = Database::open(txn, None, DbFlags::empty())?;
            db.get(txn, b"k")
        })
        .unwrap();
    assert_eq!(value.unwrap(), b"v");
}

#[test]
fn test_env_flags() {
    let (_dir, env) = setup_test_env();

    env.set_flags(EnvFlags::NOMETASYNC, true).unwrap();
    assert!(env.get_flags().unwrap().contains(EnvFlags::NOMETASYNC));
    env.set_flags(EnvFlags::NOMETASYNC, false).unwrap();

    // RDONLY is fixed at open time
    assert_eq!(env.set_flags(EnvFlags::RDONLY, true), Err(Error::Perm));
}

#[test]
fn test_env_limits() {
    let (_dir, env) = setup_test_env();

    assert_eq!(env.get_max_dbs().unwrap(), 8);
    assert!(env.get_max_readers().unwrap() > 0);
    assert!(env.get_max_key_size(DbFlags::empty()) > 0);
    assert!(env.get_max_value_size(DbFlags::empty()) > env.get_max_key_size(DbFlags::empty()));
    assert!(env.get_fd().unwrap() >= 0);
}

#[test]
fn test_reader_table() {
    let (_dir, env) = setup_test_env();

    // No stale readers in a fresh environment
    assert_eq!(env.reader_check().unwrap(), 0);

    let txn = env.begin_ro_txn().unwrap();
    let readers = env.reader_list().unwrap();
    assert_eq!(readers.len(), 1);
    assert_eq!(readers[0].pid, std::process::id() as i32);
    drop(txn);
}

#[test]
fn test_version() {
    let (major, minor, _release) = Environment::version();
    assert!(major > 0 || minor > 0);
    assert!(Environment::version_string().contains('.'));
}
