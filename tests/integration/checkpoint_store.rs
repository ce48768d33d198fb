//! Checkpoint durability and single-instance locking

use siem_log_pump::resume::{CheckpointStore, PumpLock, ResumeError};
use tempfile::TempDir;

#[test]
fn test_checkpoint_survives_store_recreation() {
    let temp = TempDir::new().unwrap();
    {
        let store = CheckpointStore::new(temp.path());
        store.write("MTA", "eNqrVkrOzytJzSvRS85XslIqS8wpTgUAWrcIbw").unwrap();
    }

    let reopened = CheckpointStore::new(temp.path());
    assert_eq!(
        reopened.read("MTA").unwrap().as_deref(),
        Some("eNqrVkrOzytJzSvRS85XslIqS8wpTgUAWrcIbw")
    );
}

#[test]
fn test_checkpoint_file_holds_raw_token_only() {
    let temp = TempDir::new().unwrap();
    let store = CheckpointStore::new(temp.path());
    store.write("MTA", "tok-7").unwrap();

    let raw = std::fs::read(store.path_for("MTA")).unwrap();
    assert_eq!(raw, b"tok-7");
    assert_eq!(
        store.path_for("MTA"),
        temp.path().join("get_mta_siem_logs_checkpoint")
    );
}

#[test]
fn test_streams_do_not_share_checkpoints() {
    let temp = TempDir::new().unwrap();
    let store = CheckpointStore::new(temp.path());
    store.write("MTA", "mta-token").unwrap();

    assert_eq!(store.read("TTP").unwrap(), None);
    assert_eq!(store.read("MTA").unwrap().as_deref(), Some("mta-token"));
}

#[test]
fn test_second_pump_on_same_stream_is_refused() {
    let temp = TempDir::new().unwrap();
    let store = CheckpointStore::new(temp.path());
    let path = store.path_for("MTA");

    let _held = PumpLock::try_acquire(&path).unwrap();
    let second = PumpLock::try_acquire(&path);

    assert!(matches!(second, Err(ResumeError::LockError(_))));
}

#[test]
fn test_lock_does_not_block_other_streams() {
    let temp = TempDir::new().unwrap();
    let store = CheckpointStore::new(temp.path());

    let _mta = PumpLock::try_acquire(&store.path_for("MTA")).unwrap();
    let ttp = PumpLock::try_acquire(&store.path_for("TTP"));

    assert!(ttp.is_ok());
}
