use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, TokenData, Validation};
use serde::{Deserialize, Serialize};

/// Lifetime of a session cookie token.
pub const SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserClaims {
    /// User id.
    pub sub: String,
    pub exp: i64,
}

impl UserClaims {
    pub fn session(user_id: impl Into<String>) -> Self {
        Self {
            sub: user_id.into(),
            exp: (Utc::now() + Duration::hours(SESSION_TTL_HOURS)).timestamp(),
        }
    }
}

pub fn generate_token<K: AsRef<[u8]>>(
    claims: &UserClaims,
    key: K,
) -> jsonwebtoken::errors::Result<String> {
    let key = EncodingKey::from_secret(key.as_ref());
    jsonwebtoken::encode(&Header::default(), claims, &key)
}

pub fn process_token<K: AsRef<[u8]>>(
    token: &str,
    key: K,
) -> jsonwebtoken::errors::Result<TokenData<UserClaims>> {
    let key = DecodingKey::from_secret(key.as_ref());
    jsonwebtoken::decode::<UserClaims>(token, &key, &Validation::default())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn session_token_roundtrip() {
        let claims = UserClaims::session("user-1");
        let token = generate_token(&claims, "secret").unwrap();
        let decoded = process_token(&token, "secret").unwrap();
        assert_eq!(decoded.claims, claims);
    }

    #[test]
    fn wrong_key_or_expired_token_is_rejected() {
        let token = generate_token(&UserClaims::session("user-1"), "secret").unwrap();
        assert!(process_token(&token, "other").is_err());

        let expired = UserClaims {
            sub: "user-1".into(),
            exp: (Utc::now() - Duration::hours(2)).timestamp(),
        };
        let token = generate_token(&expired, "secret").unwrap();
        assert!(process_token(&token, "secret").is_err());
    }
}
