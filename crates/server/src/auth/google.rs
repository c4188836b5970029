//! Google ID token verification through the tokeninfo endpoint.

use reqwest::Client;
use serde::Deserialize;

const GOOGLE_ISSUERS: [&str; 2] = ["accounts.google.com", "https://accounts.google.com"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedGoogleIdentity {
    pub google_sub: String,
    pub email: String,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
}

/// Subset of the tokeninfo response. Google returns numbers and booleans as strings.
#[derive(Debug, Deserialize)]
pub struct TokenInfo {
    pub aud: String,
    pub sub: String,
    pub iss: Option<String>,
    pub exp: Option<String>,
    pub email: Option<String>,
    pub email_verified: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum GoogleAuthError {
    #[error("tokeninfo request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("token rejected by Google (HTTP {0})")]
    Rejected(u16),

    #[error("invalid token: {0}")]
    Invalid(&'static str),
}

#[derive(Clone)]
pub struct GoogleVerifier {
    client: Client,
    client_id: String,
    tokeninfo_url: String,
}

impl GoogleVerifier {
    pub fn new(client_id: &str, tokeninfo_url: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent("ReChess/1.0")
            .timeout(std::time::Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            client_id: client_id.to_string(),
            tokeninfo_url: tokeninfo_url.to_string(),
        })
    }

    pub async fn verify_id_token(&self, id_token: &str) -> Result<VerifiedGoogleIdentity, GoogleAuthError> {
        let resp = self
            .client
            .get(&self.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .send()
            .await?;

        if !resp.status().is_success() {
            return Err(GoogleAuthError::Rejected(resp.status().as_u16()));
        }

        let info: TokenInfo = resp.json().await?;
        identity_from_token_info(info, &self.client_id, chrono::Utc::now().timestamp())
    }
}

/// Check audience, issuer, expiry and email of a tokeninfo payload.
pub fn identity_from_token_info(
    info: TokenInfo,
    client_id: &str,
    now: i64,
) -> Result<VerifiedGoogleIdentity, GoogleAuthError> {
    if info.aud != client_id {
        return Err(GoogleAuthError::Invalid("audience mismatch"));
    }
    if !info.iss.as_deref().is_some_and(|iss| GOOGLE_ISSUERS.contains(&iss)) {
        return Err(GoogleAuthError::Invalid("unexpected issuer"));
    }
    let exp: i64 = info
        .exp
        .as_deref()
        .and_then(|e| e.parse().ok())
        .ok_or(GoogleAuthError::Invalid("missing expiry"))?;
    if exp <= now {
        return Err(GoogleAuthError::Invalid("token expired"));
    }
    if info.sub.is_empty() {
        return Err(GoogleAuthError::Invalid("missing subject"));
    }
    let email = info
        .email
        .filter(|e| !e.is_empty())
        .ok_or(GoogleAuthError::Invalid("token missing email claim"))?;
    if info.email_verified.as_deref() == Some("false") {
        return Err(GoogleAuthError::Invalid("email not verified"));
    }

    Ok(VerifiedGoogleIdentity {
        google_sub: info.sub,
        email,
        display_name: info.name,
        photo_url: info.picture,
    })
}

/// `Authorization: Bearer <token>`, scheme matched case-insensitively.
pub fn extract_bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(char::is_whitespace)?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> TokenInfo {
        TokenInfo {
            aud: "client-123".into(),
            sub: "10769150350006150715113082367".into(),
            iss: Some("https://accounts.google.com".into()),
            exp: Some("2000000000".into()),
            email: Some("learner@example.com".into()),
            email_verified: Some("true".into()),
            name: Some("Learner".into()),
            picture: None,
        }
    }

    #[test]
    fn test_valid_identity() {
        let identity = identity_from_token_info(info(), "client-123", 1_700_000_000).unwrap();
        assert_eq!(identity.email, "learner@example.com");
        assert_eq!(identity.display_name.as_deref(), Some("Learner"));
        assert_eq!(identity.photo_url, None);
    }

    #[test]
    fn test_rejects_other_audience() {
        let err = identity_from_token_info(info(), "someone-else", 1_700_000_000).unwrap_err();
        assert!(matches!(err, GoogleAuthError::Invalid("audience mismatch")));
    }

    #[test]
    fn test_rejects_expired_and_unverified() {
        assert!(identity_from_token_info(info(), "client-123", 2_000_000_000).is_err());

        let mut unverified = info();
        unverified.email_verified = Some("false".into());
        assert!(identity_from_token_info(unverified, "client-123", 1_700_000_000).is_err());

        let mut no_email = info();
        no_email.email = None;
        assert!(identity_from_token_info(no_email, "client-123", 1_700_000_000).is_err());
    }

    #[test]
    fn test_rejects_foreign_issuer() {
        let mut foreign = info();
        foreign.iss = Some("https://evil.example.com".into());
        assert!(identity_from_token_info(foreign, "client-123", 1_700_000_000).is_err());

        let mut missing = info();
        missing.iss = None;
        let err = identity_from_token_info(missing, "client-123", 1_700_000_000).unwrap_err();
        assert!(matches!(err, GoogleAuthError::Invalid("unexpected issuer")));

        let mut bare = info();
        bare.iss = Some("accounts.google.com".into());
        assert!(identity_from_token_info(bare, "client-123", 1_700_000_000).is_ok());
    }

    #[test]
    fn test_extract_bearer_token() {
        assert_eq!(extract_bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(extract_bearer_token("bearer   abc"), Some("abc"));
        assert_eq!(extract_bearer_token("Basic abc"), None);
        assert_eq!(extract_bearer_token("Bearer "), None);
        assert_eq!(extract_bearer_token("abc"), None);
    }
}
