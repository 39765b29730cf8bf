//! Property-based tests for Engine

use itstore::fs::MemoryFs;
use itstore::{Config, CreateFlags, Engine, ItsError};
use proptest::prelude::*;

fn setup_engine() -> Engine<MemoryFs> {
    Engine::with_filesystem(MemoryFs::new(), &Config::default())
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn prop_set_then_get_returns_payload(
        uid in 1u64..,
        payload in proptest::collection::vec(any::<u8>(), 0..512),
        flags in any::<u32>(),
    ) {
        let engine = setup_engine();
        let flags = CreateFlags::from_bits(flags);

        engine.set(uid, &payload, flags).unwrap();

        let info = engine.get_info(uid).unwrap();
        prop_assert_eq!(info.size as usize, payload.len());
        prop_assert_eq!(info.flags, flags);
        prop_assert_eq!(engine.get(uid, 0, payload.len() as u32).unwrap(), payload);
    }

    #[test]
    fn prop_get_range_matches_slice_or_is_rejected(
        payload in proptest::collection::vec(any::<u8>(), 0..128),
        offset in 0u32..160,
        length in 0u32..160,
    ) {
        let engine = setup_engine();
        engine.set(1, &payload, CreateFlags::NONE).unwrap();

        let result = engine.get(1, offset, length);
        let end = offset as usize + length as usize;
        if end <= payload.len() {
            prop_assert_eq!(result.unwrap(), payload[offset as usize..end].to_vec());
        } else {
            prop_assert!(matches!(result, Err(ItsError::InvalidArgument(_))));
        }
    }

    #[test]
    fn prop_overflowing_range_is_rejected(
        offset in 1u32..,
        extra in 0u32..16,
    ) {
        let engine = setup_engine();
        engine.set(1, b"payload", CreateFlags::NONE).unwrap();

        // offset + length wraps around u32
        let length = (u32::MAX - offset).saturating_add(1).saturating_add(extra);
        prop_assume!(offset.checked_add(length).is_none());

        let result = engine.get(1, offset, length);
        prop_assert!(matches!(result, Err(ItsError::InvalidArgument(_))));
    }

    #[test]
    fn prop_remove_makes_record_absent(uid in 1u64.., payload in proptest::collection::vec(any::<u8>(), 0..64)) {
        let engine = setup_engine();
        engine.set(uid, &payload, CreateFlags::NONE).unwrap();

        engine.remove(uid).unwrap();

        prop_assert!(matches!(engine.get_info(uid), Err(ItsError::NotFound)));
        prop_assert!(matches!(engine.remove(uid), Err(ItsError::NotFound)));
    }
}
