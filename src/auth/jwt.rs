//! JWT Token Handler
//! Mission: Issue one-hour credentials and verify them against the shared secret

use crate::auth::models::{Claims, TokenRequest, RESERVED_CLAIMS};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use std::fmt;
use tracing::debug;

/// Lifetime of every issued credential
pub const TOKEN_TTL_SECS: i64 = 3600;

/// Why a credential could not be issued or accepted
#[derive(Debug)]
pub enum TokenError {
    MissingSecret,
    Signing(jsonwebtoken::errors::Error),
    Invalid(jsonwebtoken::errors::Error),
    Expired,
}

impl fmt::Display for TokenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenError::MissingSecret => write!(f, "Token secret is not configured"),
            TokenError::Signing(e) => write!(f, "Failed to sign token: {}", e),
            TokenError::Invalid(e) => write!(f, "Invalid token: {}", e),
            TokenError::Expired => write!(f, "Token expired"),
        }
    }
}

impl std::error::Error for TokenError {}

/// JWT Handler for token operations
pub struct JwtHandler {
    secret: Option<String>,
}

impl JwtHandler {
    /// Create a handler; an absent or empty secret makes every operation fail
    pub fn new(secret: Option<String>) -> Self {
        Self {
            secret: secret.filter(|s| !s.is_empty()),
        }
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    fn secret(&self) -> Result<&[u8], TokenError> {
        self.secret
            .as_deref()
            .map(str::as_bytes)
            .ok_or(TokenError::MissingSecret)
    }

    /// Sign the given identity payload, valid for one hour from now
    pub fn generate_token(&self, identity: TokenRequest) -> Result<String, TokenError> {
        self.generate_token_at(identity, Utc::now())
    }

    pub fn generate_token_at(
        &self,
        identity: TokenRequest,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let secret = self.secret()?;

        let TokenRequest { email, mut extra } = identity;
        for reserved in RESERVED_CLAIMS {
            extra.remove(reserved);
        }

        let iat = now.timestamp();
        let claims = Claims {
            email,
            extra,
            iat,
            exp: (now + Duration::seconds(TOKEN_TTL_SECS)).timestamp(),
        };

        debug!("Generating JWT for {}, expires at {}", claims.email, claims.exp);

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret),
        )
        .map_err(TokenError::Signing)
    }

    /// Validate a JWT token and extract claims
    pub fn validate_token(&self, token: &str) -> Result<Claims, TokenError> {
        self.validate_token_at(token, Utc::now())
    }

    /// Validate against an explicit clock. A token is good up to and
    /// including its `exp` second, with no leeway.
    pub fn validate_token_at(&self, token: &str, now: DateTime<Utc>) -> Result<Claims, TokenError> {
        let secret = self.secret()?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        // identity payloads are free-form and may carry their own `aud`
        validation.validate_aud = false;
        validation.set_required_spec_claims(&["exp"]);

        let decoded = decode::<Claims>(token, &DecodingKey::from_secret(secret), &validation)
            .map_err(TokenError::Invalid)?;

        if decoded.claims.exp < now.timestamp() {
            return Err(TokenError::Expired);
        }

        debug!("Validated JWT for {}", decoded.claims.email);

        Ok(decoded.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map, Value};

    fn handler() -> JwtHandler {
        JwtHandler::new(Some("test-secret-key-12345".to_string()))
    }

    fn identity(email: &str) -> TokenRequest {
        TokenRequest {
            email: email.to_string(),
            extra: Map::new(),
        }
    }

    #[test]
    fn test_jwt_generation_and_validation() {
        let handler = handler();
        let mut request = identity("agent@estate.test");
        request
            .extra
            .insert("name".to_string(), Value::String("Ana".to_string()));

        let token = handler.generate_token(request).unwrap();
        assert!(!token.is_empty());

        let claims = handler.validate_token(&token).unwrap();
        assert_eq!(claims.email, "agent@estate.test");
        assert_eq!(claims.extra.get("name"), Some(&json!("Ana")));
        assert_eq!(claims.extra.len(), 1);
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_SECS);
    }

    #[test]
    fn test_caller_cannot_choose_expiry() {
        let handler = handler();
        let mut request = identity("a@x.com");
        request.extra.insert("exp".to_string(), json!(9_999_999_999i64));
        request.extra.insert("iat".to_string(), json!(1));

        let now = Utc::now();
        let token = handler.generate_token_at(request, now).unwrap();
        let claims = handler.validate_token_at(&token, now).unwrap();
        assert_eq!(claims.iat, now.timestamp());
        assert_eq!(claims.exp, now.timestamp() + TOKEN_TTL_SECS);
        assert!(claims.extra.is_empty());
    }

    #[test]
    fn test_expiry_window() {
        let handler = handler();
        let issued = Utc::now();
        let token = handler.generate_token_at(identity("a@x.com"), issued).unwrap();

        assert!(handler
            .validate_token_at(&token, issued + Duration::minutes(59))
            .is_ok());
        assert!(matches!(
            handler.validate_token_at(&token, issued + Duration::minutes(61)),
            Err(TokenError::Expired)
        ));
    }

    #[test]
    fn test_invalid_token_rejected() {
        let result = handler().validate_token("invalid.token.here");
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_tampered_token_rejected() {
        let handler = handler();
        let token = handler.generate_token(identity("user@x.com")).unwrap();

        let segments: Vec<&str> = token.split('.').collect();
        assert_eq!(segments.len(), 3);

        // One character in the middle of the payload, then of the signature
        for segment in [1, 2] {
            let offset: usize = segments[..segment].iter().map(|s| s.len() + 1).sum();
            let position = offset + segments[segment].len() / 2;
            let mut bytes = token.clone().into_bytes();
            bytes[position] = if bytes[position] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            assert!(handler.validate_token(&tampered).is_err());
        }
    }

    #[test]
    fn test_different_secrets_reject() {
        let handler1 = JwtHandler::new(Some("secret1".to_string()));
        let handler2 = JwtHandler::new(Some("secret2".to_string()));

        let token = handler1.generate_token(identity("a@x.com")).unwrap();
        assert!(handler2.validate_token(&token).is_err());
    }

    #[test]
    fn test_missing_secret() {
        let handler = JwtHandler::new(Some(String::new()));
        assert!(!handler.has_secret());
        assert!(matches!(
            handler.generate_token(identity("a@x.com")),
            Err(TokenError::MissingSecret)
        ));
        assert!(matches!(
            handler.validate_token("a.b.c"),
            Err(TokenError::MissingSecret)
        ));
    }
}
