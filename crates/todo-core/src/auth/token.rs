use std::time::Duration;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tracing::debug;

use crate::error::CoreError;

/// Payload of an issued access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id.
    pub sub: String,
    pub email: String,
    /// Issued-at, seconds since the epoch.
    pub iat: i64,
    /// Expiry, seconds since the epoch.
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> &str {
        &self.sub
    }
}

/// HS256 signing and verification keys derived from one shared secret.
pub(crate) struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
}

impl TokenKeys {
    pub(crate) fn new(secret: &[u8], ttl: Duration) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_required_spec_claims(&["exp", "sub"]);
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
            ttl,
        }
    }

    pub(crate) fn issue(
        &self,
        user_id: &str,
        email: &str,
        now: OffsetDateTime,
    ) -> Result<String, CoreError> {
        let iat = now.unix_timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            email: email.to_string(),
            iat,
            exp: iat + self.ttl.as_secs() as i64,
        };
        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| CoreError::Auth(format!("failed to sign token: {e}")))
    }

    pub(crate) fn verify(&self, token: &str) -> Result<Claims, CoreError> {
        decode::<Claims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| {
                debug!(error = %e, "token rejected");
                CoreError::InvalidToken
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(24 * 60 * 60);

    #[test]
    fn issued_token_verifies() {
        let keys = TokenKeys::new(b"secret", DAY);
        let token = keys
            .issue("u-1", "a@b.io", OffsetDateTime::now_utc())
            .unwrap();

        let claims = keys.verify(&token).unwrap();
        assert_eq!(claims.user_id(), "u-1");
        assert_eq!(claims.email, "a@b.io");
        assert_eq!(claims.exp - claims.iat, DAY.as_secs() as i64);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = TokenKeys::new(b"secret", DAY)
            .issue("u-1", "a@b.io", OffsetDateTime::now_utc())
            .unwrap();
        let err = TokenKeys::new(b"other", DAY).verify(&token).unwrap_err();
        assert!(matches!(err, CoreError::InvalidToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let keys = TokenKeys::new(b"secret", DAY);
        let long_ago = OffsetDateTime::now_utc() - time::Duration::days(30);
        let token = keys.issue("u-1", "a@b.io", long_ago).unwrap();
        assert!(matches!(keys.verify(&token), Err(CoreError::InvalidToken)));
    }

    #[test]
    fn garbage_is_rejected() {
        let keys = TokenKeys::new(b"secret", DAY);
        assert!(matches!(keys.verify("not.a.jwt"), Err(CoreError::InvalidToken)));
    }
}
