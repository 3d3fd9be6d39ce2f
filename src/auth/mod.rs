//! Bearer token verification
//!
//! Tokens are HS256 JWTs issued by the account service with a 7-day expiry.
//! This side only verifies; issuing stays with the account service. A token
//! that is absent, malformed, expired, or carries a bad signature all
//! collapse to "no identity" — restricted content then denies access.

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

/// Claims carried by an access token.
///
/// The account service signs `{ id, role }`; `email` appears on tokens
/// issued after profile completion and feeds the watermark label.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub id: String,
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    pub exp: i64,
}

/// A verified caller identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject: String,
    pub role: Option<String>,
    pub email: Option<String>,
}

impl Identity {
    /// Best label for the watermark overlay.
    pub fn display_label(&self) -> &str {
        self.email.as_deref().unwrap_or(&self.subject)
    }
}

/// Verifies bearer tokens against the shared secret.
#[derive(Clone)]
pub struct IdentityVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl IdentityVerifier {
    pub fn new(secret: &str) -> Self {
        // Default validation checks `exp` with a small leeway.
        let validation = Validation::new(Algorithm::HS256);
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    /// Verify a raw token. Any failure is indistinguishable from an absent
    /// token for access-control purposes, so this returns `Option`.
    pub fn verify(&self, token: &str) -> Option<Identity> {
        match decode::<Claims>(token, &self.key, &self.validation) {
            Ok(data) => Some(Identity {
                subject: data.claims.id,
                role: data.claims.role,
                email: data.claims.email,
            }),
            Err(e) => {
                tracing::debug!("token rejected: {}", e);
                None
            }
        }
    }
}

/// Pull a bearer token out of the request, header first.
///
/// The `?t=` query parameter exists for contexts that cannot set headers
/// (e.g. `<img src>`); it carries the same trust weight as the header.
pub fn extract_token<'a>(authorization: Option<&'a str>, query_token: Option<&'a str>) -> Option<&'a str> {
    if let Some(header) = authorization {
        if let Some(token) = header.strip_prefix("Bearer ") {
            if !token.is_empty() {
                return Some(token);
            }
        }
    }
    query_token.filter(|t| !t.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    fn issue(secret: &str, claims: &Claims) -> String {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn claims(exp_offset_secs: i64) -> Claims {
        Claims {
            id: "user-1".to_string(),
            role: Some("member".to_string()),
            email: Some("reader@example.com".to_string()),
            exp: chrono::Utc::now().timestamp() + exp_offset_secs,
        }
    }

    #[test]
    fn valid_token_verifies() {
        let verifier = IdentityVerifier::new("dev_secret");
        let token = issue("dev_secret", &claims(3600));
        let identity = verifier.verify(&token).unwrap();
        assert_eq!(identity.subject, "user-1");
        assert_eq!(identity.display_label(), "reader@example.com");
    }

    #[test]
    fn expired_token_is_rejected() {
        let verifier = IdentityVerifier::new("dev_secret");
        let token = issue("dev_secret", &claims(-3600));
        assert!(verifier.verify(&token).is_none());
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let verifier = IdentityVerifier::new("dev_secret");
        let token = issue("other_secret", &claims(3600));
        assert!(verifier.verify(&token).is_none());
    }

    #[test]
    fn garbage_token_is_rejected() {
        let verifier = IdentityVerifier::new("dev_secret");
        assert!(verifier.verify("not-a-jwt").is_none());
    }

    #[test]
    fn header_takes_precedence_over_query() {
        let token = extract_token(Some("Bearer abc"), Some("def"));
        assert_eq!(token, Some("abc"));
    }

    #[test]
    fn query_token_used_when_header_absent() {
        assert_eq!(extract_token(None, Some("def")), Some("def"));
        assert_eq!(extract_token(Some("Basic xyz"), Some("def")), Some("def"));
    }

    #[test]
    fn empty_tokens_are_ignored() {
        assert_eq!(extract_token(Some("Bearer "), Some("")), None);
        assert_eq!(extract_token(None, None), None);
    }

    #[test]
    fn label_falls_back_to_subject() {
        let identity = Identity {
            subject: "user-9".to_string(),
            role: None,
            email: None,
        };
        assert_eq!(identity.display_label(), "user-9");
    }
}
