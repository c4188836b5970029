use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access token payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub exp: i64,
}

pub fn create_token(
    user_id: i64,
    email: &str,
    secret: &str,
    ttl_minutes: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let expiration = Utc::now() + Duration::minutes(ttl_minutes);
    let claims = Claims {
        sub: user_id,
        email: email.to_string(),
        exp: expiration.timestamp(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Option<Claims> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .ok()
    .map(|data| data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_and_verify() {
        let token = create_token(42, "learner@example.com", "secret", 15).unwrap();
        let claims = verify_token(&token, "secret").unwrap();
        assert_eq!(claims.sub, 42);
        assert_eq!(claims.email, "learner@example.com");
    }

    #[test]
    fn test_wrong_secret() {
        let token = create_token(42, "learner@example.com", "secret", 15).unwrap();
        assert!(verify_token(&token, "other").is_none());
    }

    #[test]
    fn test_expired() {
        // Well past the default validation leeway.
        let token = create_token(42, "learner@example.com", "secret", -10).unwrap();
        assert!(verify_token(&token, "secret").is_none());
    }
}
