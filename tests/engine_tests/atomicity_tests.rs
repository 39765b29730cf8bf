//! Crash-atomicity tests
//!
//! Power loss is injected at every filesystem operation a `set` performs.
//! Afterwards the record must hold either its complete old content or its
//! complete new content, never a mix.

use itstore::fs::MemoryFs;
use itstore::{Config, CreateFlags, Engine, ItsError};

// =============================================================================
// Helper Functions
// =============================================================================

fn setup_engine() -> Engine<MemoryFs> {
    Engine::with_filesystem(MemoryFs::new(), &Config::default())
}

/// Number of filesystem operations an uninterrupted `set` performs
fn count_set_operations(payload: &[u8]) -> usize {
    let engine = setup_engine();
    let before = engine.filesystem().operations();
    engine.set(1, payload, CreateFlags::NONE).unwrap();
    engine.filesystem().operations() - before
}

/// Reads a whole record, or None if it does not exist
fn read_record(engine: &Engine<MemoryFs>, uid: u64) -> Option<(Vec<u8>, CreateFlags)> {
    match engine.get_info(uid) {
        Ok(info) => Some((engine.get(uid, 0, info.size).unwrap(), info.flags)),
        Err(ItsError::NotFound) => None,
        Err(e) => panic!("record {} unreadable after crash: {}", uid, e),
    }
}

// =============================================================================
// Interrupted Write Tests
// =============================================================================

#[test]
fn test_crash_during_first_write_leaves_record_absent() {
    let new = b"brand new secret".to_vec();
    let total = count_set_operations(&new);

    for crash_at in 0..total {
        let engine = setup_engine();
        engine.filesystem().power_loss_after(crash_at);

        let result = engine.set(1, &new, CreateFlags::WRITE_ONCE);
        engine.filesystem().clear_faults();

        match result {
            Ok(()) => assert_eq!(
                read_record(&engine, 1),
                Some((new.clone(), CreateFlags::WRITE_ONCE)),
                "crash at op {}",
                crash_at
            ),
            Err(_) => assert_eq!(read_record(&engine, 1), None, "crash at op {}", crash_at),
        }
    }
}

#[test]
fn test_crash_during_overwrite_keeps_old_or_new() {
    let old = b"old certificate bytes".to_vec();
    let new = b"replacement".to_vec();
    let total = count_set_operations(&new);

    for crash_at in 0..total {
        let engine = setup_engine();
        engine.set(1, &old, CreateFlags::NONE).unwrap();
        engine.filesystem().power_loss_after(crash_at);

        let result = engine.set(1, &new, CreateFlags::NO_CONFIDENTIALITY);
        engine.filesystem().clear_faults();

        let record = read_record(&engine, 1);
        match result {
            Ok(()) => assert_eq!(
                record,
                Some((new.clone(), CreateFlags::NO_CONFIDENTIALITY)),
                "crash at op {}",
                crash_at
            ),
            Err(_) => assert_eq!(
                record,
                Some((old.clone(), CreateFlags::NONE)),
                "crash at op {}",
                crash_at
            ),
        }
    }
}

#[test]
fn test_crash_with_empty_payload() {
    let old = b"previous".to_vec();
    let total = count_set_operations(b"");

    for crash_at in 0..total {
        let engine = setup_engine();
        engine.set(1, &old, CreateFlags::NONE).unwrap();
        engine.filesystem().power_loss_after(crash_at);

        let result = engine.set(1, b"", CreateFlags::NONE);
        engine.filesystem().clear_faults();

        let expected = if result.is_ok() { Vec::new() } else { old.clone() };
        assert_eq!(
            read_record(&engine, 1),
            Some((expected, CreateFlags::NONE)),
            "crash at op {}",
            crash_at
        );
    }
}

#[test]
fn test_crash_does_not_touch_other_records() {
    let total = count_set_operations(b"value-b");

    for crash_at in 0..total {
        let engine = setup_engine();
        engine.set(0xA, b"value-a", CreateFlags::NONE).unwrap();
        engine.filesystem().power_loss_after(crash_at);

        let _ = engine.set(0xB, b"value-b", CreateFlags::NONE);
        engine.filesystem().clear_faults();

        assert_eq!(
            read_record(&engine, 0xA),
            Some((b"value-a".to_vec(), CreateFlags::NONE))
        );
    }
}

// =============================================================================
// Recovery Tests
// =============================================================================

#[test]
fn test_recovery_after_crash_mid_payload() {
    let engine = setup_engine();
    engine.set(1, b"old", CreateFlags::NONE).unwrap();

    // open, header write succeed; payload write loses power
    engine.filesystem().power_loss_after(2);
    assert!(engine.set(1, b"new content", CreateFlags::NONE).is_err());
    engine.filesystem().clear_faults();

    // The half-written temp file is still on the device
    let temp = engine.namer().temp_name();
    assert_eq!(
        engine.filesystem().contents(&temp).map(|data| data.len()),
        Some(16)
    );
    assert_eq!(engine.get(1, 0, 3).unwrap(), b"old");

    // A device reboot discards it
    let snapshot = engine.filesystem().snapshot();
    let rebooted_fs = MemoryFs::new();
    rebooted_fs.restore(snapshot);
    let rebooted = Engine::with_filesystem(rebooted_fs, &Config::default());

    assert!(!rebooted.filesystem().exists(&temp));
    assert_eq!(rebooted.get(1, 0, 3).unwrap(), b"old");

    rebooted.set(1, b"new content", CreateFlags::NONE).unwrap();
    assert_eq!(rebooted.get(1, 0, 11).unwrap(), b"new content");
}

#[test]
fn test_next_set_cleans_up_after_crash() {
    let engine = setup_engine();
    engine.filesystem().power_loss_after(3);
    assert!(engine.set(1, b"first", CreateFlags::NONE).is_err());
    engine.filesystem().clear_faults();

    engine.set(2, b"second", CreateFlags::NONE).unwrap();

    assert_eq!(
        engine.filesystem().file_names(),
        vec![engine.namer().record_name(2)]
    );
}
