//! Property-based tests for the crypto layer.
//!
//! - Sealing is reversible with the correct key and label
//! - Any single-byte flip of a sealed blob is detected
//! - HMAC tags verify only for the exact message they were computed over
//! - Constant-time equality agrees with ordinary equality

use ascension_crypto::{
    constant_time_eq, generate_random_key, open, seal, MacKey, SealedBlob,
};
use proptest::prelude::*;

fn plaintext_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 0..4096)
}

mod sealing_properties {
    use super::*;

    proptest! {
        #[test]
        fn roundtrip_preserves_data(plaintext in plaintext_strategy()) {
            let key = generate_random_key();
            let sealed = seal(&key, &plaintext, b"license").unwrap();
            let flat = sealed.to_bytes();
            let parsed = SealedBlob::from_bytes(&flat).unwrap();
            prop_assert_eq!(open(&key, &parsed, b"license").unwrap(), plaintext);
        }

        #[test]
        fn any_flip_is_detected(plaintext in plaintext_strategy(), idx in any::<prop::sample::Index>()) {
            let key = generate_random_key();
            let mut flat = seal(&key, &plaintext, b"").unwrap().to_bytes();
            let i = idx.index(flat.len());
            flat[i] ^= 0x01;
            let parsed = SealedBlob::from_bytes(&flat).unwrap();
            prop_assert!(open(&key, &parsed, b"").is_err());
        }
    }
}

mod mac_properties {
    use super::*;

    proptest! {
        #[test]
        fn tag_verifies_own_message(key in prop::collection::vec(any::<u8>(), 1..64), msg in plaintext_strategy()) {
            let mac = MacKey::new(&key).unwrap();
            let tag = mac.compute(&msg);
            prop_assert!(mac.verify(&msg, &tag));
        }

        #[test]
        fn flipped_message_fails(key in prop::collection::vec(any::<u8>(), 1..64),
                                 msg in prop::collection::vec(any::<u8>(), 1..512),
                                 idx in any::<prop::sample::Index>()) {
            let mac = MacKey::new(&key).unwrap();
            let tag = mac.compute(&msg);
            let mut altered = msg.clone();
            let i = idx.index(altered.len());
            altered[i] ^= 0x80;
            prop_assert!(!mac.verify(&altered, &tag));
        }

        #[test]
        fn ct_eq_matches_eq(a in prop::collection::vec(any::<u8>(), 0..64), b in prop::collection::vec(any::<u8>(), 0..64)) {
            prop_assert_eq!(constant_time_eq(&a, &b), a == b);
            prop_assert!(constant_time_eq(&a, &a));
        }
    }
}
