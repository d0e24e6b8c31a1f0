//! Property-based tests for the token codec using proptest.
//!
//! These verify invariants that should hold for any subject and any
//! corruption of a token, not just the handful of cases the unit tests pick.

use chrono::Duration;
use proptest::prelude::*;

use clinic_records::domain::Role;
use clinic_records::{AuthError, TokenCodec};

const SECRET: &[u8] = b"property-test-signing-key-32byte";
const OTHER_SECRET: &[u8] = b"a-second-distinct-signing-key-32";

const BASE64_URL_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789-_";

fn codec() -> TokenCodec {
    TokenCodec::with_default_validity(SECRET).unwrap()
}

// ============================================================================
// Custom Strategies
// ============================================================================

/// Generate a plausible account email
fn arb_subject() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9]{0,11}@[a-z]{1,10}\\.[a-z]{2,3}"
}

/// Generate a role
fn arb_role() -> impl Strategy<Value = Role> {
    prop_oneof![Just(Role::Patient), Just(Role::Admin)]
}

/// Rewrite one non-separator character of a token.
///
/// The replacement differs from the original in the top bit of its sextet,
/// so the decoded bytes change no matter where in a segment the character
/// sits.
fn corrupt_at(token: &str, which: prop::sample::Index) -> String {
    let mut bytes = token.as_bytes().to_vec();
    let positions: Vec<usize> = (0..bytes.len()).filter(|&i| bytes[i] != b'.').collect();
    let pos = positions[which.index(positions.len())];
    let idx = BASE64_URL_ALPHABET
        .iter()
        .position(|&c| c == bytes[pos])
        .expect("base64url character") as u8;
    bytes[pos] = BASE64_URL_ALPHABET[(idx ^ 0b10_0000) as usize];
    String::from_utf8(bytes).expect("token is ascii")
}

// ============================================================================
// Round-Trip Properties
// ============================================================================

proptest! {
    /// Property: Issued tokens verify and preserve subject and role
    #[test]
    fn issued_tokens_always_verify(sub in arb_subject(), role in arb_role()) {
        let codec = codec();
        let token = codec.issue(&sub, role).unwrap();
        let claims = codec.verify(&token).unwrap();

        prop_assert_eq!(claims.sub, sub);
        prop_assert_eq!(claims.role, role);
        prop_assert_eq!(claims.exp, claims.iat + 24 * 3600);
    }

    /// Property: The validity window always spans exactly the configured hours
    #[test]
    fn validity_window_matches_configuration(
        sub in arb_subject(),
        hours in 1i64..24 * 30
    ) {
        let codec = TokenCodec::new(SECRET, Duration::hours(hours)).unwrap();
        let token = codec.issue(&sub, Role::Patient).unwrap();
        let claims = codec.verify(&token).unwrap();

        prop_assert_eq!(claims.exp - claims.iat, hours * 3600);
    }
}

// ============================================================================
// Rejection Properties
// ============================================================================

proptest! {
    /// Property: Corrupting any single character is rejected
    #[test]
    fn corrupted_tokens_never_verify(
        sub in arb_subject(),
        which in any::<prop::sample::Index>()
    ) {
        let codec = codec();
        let token = codec.issue(&sub, Role::Patient).unwrap();
        let corrupted = corrupt_at(&token, which);

        let err = codec.verify(&corrupted).unwrap_err();
        prop_assert!(
            matches!(err, AuthError::MalformedToken(_) | AuthError::InvalidSignature),
            "corruption produced unexpected error: {:?}",
            err
        );
    }

    /// Property: Truncated tokens are rejected
    #[test]
    fn truncated_tokens_never_verify(
        sub in arb_subject(),
        cut in any::<prop::sample::Index>()
    ) {
        let codec = codec();
        let token = codec.issue(&sub, Role::Patient).unwrap();
        let truncated = &token[..cut.index(token.len())];

        prop_assert!(codec.verify(truncated).is_err());
    }

    /// Property: Tokens never verify under a different key
    #[test]
    fn cross_key_tokens_never_verify(sub in arb_subject(), role in arb_role()) {
        let signer = codec();
        let verifier = TokenCodec::with_default_validity(OTHER_SECRET).unwrap();

        let token = signer.issue(&sub, role).unwrap();
        let err = verifier.verify(&token).unwrap_err();
        prop_assert!(matches!(err, AuthError::InvalidSignature));
    }

    /// Property: Tokens issued under a window already in the past always
    /// report expiry, never some other failure
    #[test]
    fn stale_tokens_always_report_expiry(
        sub in arb_subject(),
        hours_past in 1i64..24 * 30
    ) {
        let stale_issuer = TokenCodec::new(SECRET, Duration::hours(-hours_past)).unwrap();
        let token = stale_issuer.issue(&sub, Role::Patient).unwrap();

        let err = codec().verify(&token).unwrap_err();
        prop_assert!(matches!(err, AuthError::TokenExpired));
    }
}
