use lumodbx::{Database, DbFlags, Environment, EnvFlags, Error, WriteFlags};
use tempfile::TempDir;

// Common test setup
fn setup_test_env() -> (TempDir, Environment) {
    let temp_dir = TempDir::new().unwrap();
    let mut env = Environment::new().unwrap();
    env.set_max_dbs(8).unwrap();
    env.open(temp_dir.path(), EnvFlags::empty(), 0o644).unwrap();
    (temp_dir, env)
}

fn put_one(env: &Environment, key: &[u8], value: &[u8]) {
    env.update(|txn| {
        let db = Database::open(txn, None, DbFlags::empty())?;
        db.put(txn, key, value, WriteFlags::empty())
    })
    .unwrap();
}

#[test]
fn test_txn_id_and_info() {
    let (_dir, env) = setup_test_env();

    let txn = env.begin_txn().unwrap();
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();
    db.put(&txn, b"k", b"v", WriteFlags::empty()).unwrap();

    assert!(txn.id() > 0);
    let info = txn.info(false).unwrap();
    assert_eq!(info.id, txn.id());
    assert!(info.space_limit_hard > 0);
    txn.commit().unwrap();
}

#[test]
fn test_commit_latency() {
    let (_dir, env) = setup_test_env();

    let txn = env.begin_txn().unwrap();
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();
    db.put(&txn, b"k", b"v", WriteFlags::empty()).unwrap();

    let latency = txn.commit_with_latency().unwrap();
    assert!(latency.whole >= latency.write);
}

#[test]
fn test_snapshot_isolation() {
    let (_dir, env) = setup_test_env();
    put_one(&env, b"counter", b"1");

    let db = env
        .view(|txn| Database::open(txn, None, DbFlags::empty()))
        .unwrap();

    // The reader pins the snapshot taken at begin time
    let reader = env.begin_ro_txn().unwrap();
    assert_eq!(db.get(&reader, b"counter").unwrap().unwrap(), b"1");

    put_one(&env, b"counter", b"2");

    // Still the old snapshot, no matter what was committed since
    assert_eq!(db.get(&reader, b"counter").unwrap().unwrap(), b"1");

    // A renewed handle observes the newer snapshot
    let reader = reader.reset().renew().unwrap();
    assert_eq!(db.get(&reader, b"counter").unwrap().unwrap(), b"2");
}

#[test]
fn test_reset_renew_id_moves() {
    let (_dir, env) = setup_test_env();
    put_one(&env, b"k", b"v");

    let reader = env.begin_ro_txn().unwrap();
    let first_id = reader.id();

    put_one(&env, b"k", b"v2");

    let reader = reader.reset().renew().unwrap();
    assert!(reader.id() > first_id);
}

#[test]
fn test_park_unpark() {
    let (_dir, env) = setup_test_env();
    put_one(&env, b"k", b"old");

    let db = env
        .view(|txn| Database::open(txn, None, DbFlags::empty()))
        .unwrap();

    let reader = env.begin_ro_txn().unwrap();
    assert_eq!(db.get(&reader, b"k").unwrap().unwrap(), b"old");

    // While parked the reader holds no snapshot, so the writer's pages
    // can be reclaimed regardless of how long it stays parked.
    let parked = reader.park();
    put_one(&env, b"k", b"new");

    let reader = parked.unpark(true).unwrap();
    assert_eq!(db.get(&reader, b"k").unwrap().unwrap(), b"new");
}

#[test]
fn test_nested_transactions() {
    let (_dir, env) = setup_test_env();

    let mut txn = env.begin_txn().unwrap();
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();
    db.put(&txn, b"outer", b"1", WriteFlags::empty()).unwrap();

    // A dropped child rolls back only its own writes
    {
        let child = txn.begin_nested().unwrap();
        db.put(&child, b"inner", b"2", WriteFlags::empty()).unwrap();
    }
    assert!(db.get(&txn, b"inner").unwrap().is_none());
    assert!(db.get(&txn, b"outer").unwrap().is_some());

    // A committed child merges into the parent
    {
        let child = txn.begin_nested().unwrap();
        db.put(&child, b"inner", b"2", WriteFlags::empty()).unwrap();
        child.commit().unwrap();
    }
    assert_eq!(db.get(&txn, b"inner").unwrap().unwrap(), b"2");

    txn.commit().unwrap();
    let visible = env.view(|txn| db.get(txn, b"inner")).unwrap();
    assert_eq!(visible.unwrap(), b"2");
}

#[test]
fn test_abort_discards_writes() {
    let (_dir, env) = setup_test_env();

    let txn = env.begin_txn().unwrap();
    let db = Database::open(&txn, None, DbFlags::empty()).unwrap();
    db.put(&txn, b"k", b"v", WriteFlags::empty()).unwrap();
    txn.abort();

    let found = env
        .view(|txn| {
            let db = Database::open(txn, None, DbFlags::empty())?;
            db.get(txn, b"k")
        })
        .unwrap();
    assert!(found.is_none());
}

#[test]
fn test_update_aborts_on_error() {
    let (_dir, env) = setup_test_env();

    let res: lumodbx::Result<()> = env.update(|txn| {
        let db = Database::open(txn, None, DbFlags::empty())?;
        db.put(txn, b"k", b"v", WriteFlags::empty())?;
        Err(Error::Invalid)
    });
    assert_eq!(res, Err(Error::Invalid));

    // The failed closure's writes were rolled back
    let found = env
        .view(|txn| {
            let db = Database::open(txn, None, DbFlags::empty())?;
            db.get(txn, b"k")
        })
        .unwrap();
    assert!(found.is_none());
}

#[test]
fn test_readers_see_committed_update() {
    let (_dir, env) = setup_test_env();

    let written = env
        .update(|txn| {
            let db = Database::open(txn, None, DbFlags::empty())?;
            db.put(txn, b"managed", b"yes", WriteFlags::empty())?;
            db.get(txn, b"managed")
        })
        .unwrap();
    assert_eq!(written.unwrap(), b"yes");

    let read_back = env
        .view(|txn| {
            let db = Database::open(txn, None, DbFlags::empty())?;
            db.get(txn, b"managed")
        })
        .unwrap();
    assert_eq!(read_back.unwrap(), b"yes");
}
