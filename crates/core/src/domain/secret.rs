// Shared secret used to authenticate job callbacks

use super::error::{DomainError, Result};
use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Versioned prefix of every secret value
pub const SECRET_PREFIX: &str = "hts_v1_";

/// Hex characters following the prefix (32 random bytes)
pub const SECRET_HEX_LEN: usize = 64;

const SECRET_BYTES: usize = SECRET_HEX_LEN / 2;

/// Fixed HMAC key used only to normalise both sides before comparison
const VERIFY_CONTEXT: &[u8] = b"hottub/secret-verify/v1";

/// A validated secret value. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct Secret(String);

impl Secret {
    /// Generate a fresh secret from the OS CSPRNG
    pub fn generate() -> Self {
        let mut bytes = [0u8; SECRET_BYTES];
        OsRng.fill_bytes(&mut bytes);
        Self(format!("{}{}", SECRET_PREFIX, hex::encode(bytes)))
    }

    /// Parse a stored value, enforcing prefix and hex-length format
    pub fn parse(raw: &str) -> Result<Self> {
        let value = raw.trim();
        let hex_part = value.strip_prefix(SECRET_PREFIX).ok_or_else(|| {
            DomainError::InvalidSecretFormat(format!("missing '{}' prefix", SECRET_PREFIX))
        })?;

        if hex_part.len() != SECRET_HEX_LEN {
            return Err(DomainError::InvalidSecretFormat(format!(
                "expected {} hex characters, found {}",
                SECRET_HEX_LEN,
                hex_part.len()
            )));
        }

        if !hex_part
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c))
        {
            return Err(DomainError::InvalidSecretFormat(
                "suffix is not lowercase hex".to_string(),
            ));
        }

        Ok(Self(value.to_string()))
    }

    /// Plaintext value. Only trigger transports and the secret file writer need this.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a candidate value.
    ///
    /// Both sides are digested with HMAC-SHA256 first so that neither the
    /// content nor the length of the stored value influences timing.
    pub fn matches(&self, candidate: &str) -> bool {
        let (Ok(mut expected), Ok(mut actual)) = (
            HmacSha256::new_from_slice(VERIFY_CONTEXT),
            HmacSha256::new_from_slice(VERIFY_CONTEXT),
        ) else {
            return false;
        };

        expected.update(self.0.as_bytes());
        let expected = expected.finalize().into_bytes();

        actual.update(candidate.as_bytes());
        actual.verify_slice(&expected).is_ok()
    }
}

impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret({}***)", SECRET_PREFIX)
    }
}

/// Indirection to the current secret, resolved by the trigger at fire time.
///
/// Job specs carry this instead of the plaintext so a rotation does not
/// require rebuilding already-issued jobs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretRef(String);

impl SecretRef {
    pub fn new(location: impl Into<String>) -> Self {
        Self(location.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SecretRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "secret-ref:{}", self.0)
    }
}
