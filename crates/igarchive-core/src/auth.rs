//! Signed access tokens.
//!
//! A token is `<user_id>.<expires_at>.<signature>` where the signature is the
//! hex HMAC-SHA256 of `<user_id>.<expires_at>` under the configured secret.

use chrono::{DateTime, Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::error::{Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Issues and verifies access tokens.
#[derive(Clone)]
pub struct TokenSigner {
    secret: Vec<u8>,
    ttl: Duration,
}

impl std::fmt::Debug for TokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSigner").field("ttl", &self.ttl).finish_non_exhaustive()
    }
}

impl TokenSigner {
    pub fn new(secret: &[u8], ttl_secs: u64) -> Result<Self> {
        if secret.is_empty() {
            return Err(Error::Config("token secret must not be empty".to_string()));
        }
        let ttl_secs = i64::try_from(ttl_secs)
            .map_err(|_| Error::Config(format!("token ttl {ttl_secs}s is out of range")))?;
        Ok(Self {
            secret: secret.to_vec(),
            ttl: Duration::seconds(ttl_secs),
        })
    }

    /// Build a signer from the resolved configuration.
    pub fn from_config(config: &crate::Config) -> Result<Self> {
        let secret = config.token_secret()?;
        Self::new(secret.as_bytes(), config.auth.token_ttl_secs)
    }

    pub fn issue(&self, user_id: i64) -> Result<String> {
        self.issue_at(user_id, Utc::now())
    }

    pub fn issue_at(&self, user_id: i64, now: DateTime<Utc>) -> Result<String> {
        let expires_at = (now + self.ttl).timestamp();
        let payload = format!("{user_id}.{expires_at}");
        let signature = hex::encode(self.mac(&payload)?.finalize().into_bytes());
        Ok(format!("{payload}.{signature}"))
    }

    /// Verify a token and return the user id it was issued for.
    pub fn verify(&self, token: &str) -> Result<i64> {
        self.verify_at(token, Utc::now())
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<i64> {
        let (payload, signature) = token
            .rsplit_once('.')
            .ok_or_else(|| Error::Unauthorized("malformed token".to_string()))?;
        let (user_id, expires_at) = payload
            .split_once('.')
            .ok_or_else(|| Error::Unauthorized("malformed token".to_string()))?;

        let signature = hex::decode(signature)
            .map_err(|_| Error::Unauthorized("malformed token signature".to_string()))?;
        self.mac(payload)?
            .verify_slice(&signature)
            .map_err(|_| Error::Unauthorized("invalid token signature".to_string()))?;

        let user_id: i64 = user_id
            .parse()
            .map_err(|_| Error::Unauthorized("invalid user id in token".to_string()))?;
        let expires_at: i64 = expires_at
            .parse()
            .map_err(|_| Error::Unauthorized("invalid expiry in token".to_string()))?;

        if now.timestamp() >= expires_at {
            return Err(Error::Unauthorized("token expired".to_string()));
        }
        Ok(user_id)
    }

    fn mac(&self, payload: &str) -> Result<HmacSha256> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.secret)
            .map_err(|err| Error::Config(format!("failed to initialize token key: {err}")))?;
        mac.update(payload.as_bytes());
        Ok(mac)
    }
}
