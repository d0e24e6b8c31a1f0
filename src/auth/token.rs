//! Token codec: HS256 signing and verification of claim sets
//!
//! Tokens are issued once at login and verified on every request, so the
//! codec keeps both key halves pre-built. Expiry is checked explicitly
//! against a caller-supplied clock rather than inside the decoder, which
//! keeps the check testable without waiting out a real validity window.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::auth::AuthError;
use crate::domain::Role;

/// Minimum accepted HMAC key length. HS256 keys shorter than the hash
/// output weaken the MAC, so anything under 32 bytes is refused outright.
pub const MIN_KEY_BYTES: usize = 32;

/// Default validity window in hours.
pub const DEFAULT_VALIDITY_HOURS: i64 = 24;

/// Claim set carried inside a signed token.
///
/// `sub` identifies the principal (the account email), `iat`/`exp` bound the
/// validity window in Unix seconds. Unknown claims survive a decode/encode
/// round trip via the flattened map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub role: Role,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Claims {
    /// Whether the claim set is expired at the given instant.
    ///
    /// The boundary is inclusive: a token whose `exp` equals the current
    /// second is already expired. No leeway is applied.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Signs and verifies bearer tokens with a single symmetric key.
///
/// The key is fixed at construction. Rotating it means building a new codec
/// and restarting, which invalidates all outstanding tokens at once.
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validity: Duration,
}

impl TokenCodec {
    /// Build a codec over the given secret with an explicit validity window.
    pub fn new(secret: &[u8], validity: Duration) -> Result<Self, AuthError> {
        if secret.len() < MIN_KEY_BYTES {
            return Err(AuthError::KeyTooShort(secret.len()));
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validity,
        })
    }

    /// Build a codec with the standard 24 hour window.
    pub fn with_default_validity(secret: &[u8]) -> Result<Self, AuthError> {
        Self::new(secret, Duration::hours(DEFAULT_VALIDITY_HOURS))
    }

    /// The configured validity window.
    pub fn validity(&self) -> Duration {
        self.validity
    }

    /// Issue a signed token for the given subject.
    ///
    /// `exp` is always `iat` plus the configured window, computed from the
    /// wall clock at call time.
    pub fn issue(&self, subject: &str, role: Role) -> Result<String, AuthError> {
        if subject.is_empty() {
            return Err(AuthError::Issue("empty subject".to_string()));
        }

        let now = Utc::now();
        let claims = Claims {
            sub: subject.to_string(),
            iat: now.timestamp(),
            exp: (now + self.validity).timestamp(),
            role,
            extra: BTreeMap::new(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Issue(e.to_string()))
    }

    /// Verify a token's signature and validity window, returning its claims.
    ///
    /// Signature and structure are checked first; only a token that decodes
    /// cleanly is then checked for expiry, so a tampered-but-expired token
    /// reports the tampering, not the expiry.
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let claims = self.decode(token)?;
        if claims.is_expired_at(Utc::now()) {
            return Err(AuthError::TokenExpired);
        }
        Ok(claims)
    }

    fn decode(&self, token: &str) -> Result<Claims, AuthError> {
        // Expiry is handled separately against an injectable clock; the
        // decoder only vouches for structure and signature.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::InvalidSignature => AuthError::InvalidSignature,
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::MalformedToken(e.to_string()),
            })
    }
}

// The keys are derived from the signing secret, so Debug shows only the
// validity window.
impl fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenCodec")
            .field("validity", &self.validity)
            .finish_non_exhaustive()
    }
}
