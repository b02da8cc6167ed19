//! Bearer token claims and verification
//!
//! Tokens are issued by the identity service and verified by every service
//! that accepts bearer authentication. RS256 is used when PEM keys are
//! configured; an HS256 shared secret is accepted for local development
//! and tests.

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};
use serde::{Deserialize, Serialize};
use std::env;
use uuid::Uuid;

use crate::error::TokenError;

/// JWT claims structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// User ID
    pub sub: Uuid,
    /// User email
    pub email: String,
    /// Role attribute at the time of issue, if any
    pub role: Option<String>,
    /// Unique token id
    pub jti: Uuid,
    /// Issued at time
    pub iat: u64,
    /// Expiration time
    pub exp: u64,
    /// Token type (access or refresh)
    pub token_type: TokenType,
}

/// Token type enum
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    /// Access token
    Access,
    /// Refresh token
    Refresh,
}

/// Resolve key material that is either inline PEM or a path to a PEM file.
pub fn read_key_material(value: &str) -> Result<String, TokenError> {
    if value.starts_with("-----BEGIN") {
        return Ok(value.to_string());
    }

    std::fs::read_to_string(value)
        .map(|content| content.trim().to_string())
        .map_err(|e| TokenError::Key(format!("Failed to read key file {}: {}", value, e)))
}

/// Verifies tokens issued by the identity service
#[derive(Clone)]
pub struct TokenVerifier {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl TokenVerifier {
    /// Build a verifier from an RSA public key in PEM format
    pub fn from_rsa_pem(public_key: &str) -> Result<Self, TokenError> {
        let decoding_key = DecodingKey::from_rsa_pem(public_key.as_bytes())
            .map_err(|e| TokenError::Key(e.to_string()))?;

        Ok(Self::with_key(decoding_key, Algorithm::RS256))
    }

    /// Build a verifier from an HS256 shared secret
    pub fn from_secret(secret: &[u8]) -> Self {
        Self::with_key(DecodingKey::from_secret(secret), Algorithm::HS256)
    }

    /// Create a verifier from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PUBLIC_KEY`: RSA public key (PEM or path to a PEM file)
    /// - `JWT_SECRET`: HS256 shared secret, used when no public key is set
    pub fn from_env() -> Result<Self, TokenError> {
        if let Ok(public_key) = env::var("JWT_PUBLIC_KEY") {
            let pem = read_key_material(&public_key)?;
            return Self::from_rsa_pem(&pem);
        }

        let secret = env::var("JWT_SECRET").map_err(|_| {
            TokenError::Key("neither JWT_PUBLIC_KEY nor JWT_SECRET is set".to_string())
        })?;
        Ok(Self::from_secret(secret.as_bytes()))
    }

    fn with_key(decoding_key: DecodingKey, algorithm: Algorithm) -> Self {
        let mut validation = Validation::new(algorithm);
        validation.validate_exp = true;
        validation.leeway = 0;

        Self {
            decoding_key,
            validation,
        }
    }

    /// Validate a token and return its claims
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(data.claims)
    }

    /// Validate a token and require it to be an access token
    pub fn verify_access(&self, token: &str) -> Result<Claims, TokenError> {
        let claims = self.verify(token)?;
        if claims.token_type != TokenType::Access {
            return Err(TokenError::WrongType);
        }
        Ok(claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{EncodingKey, Header, encode};
    use std::time::{SystemTime, UNIX_EPOCH};

    const SECRET: &[u8] = b"test-secret";

    fn now() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
    }

    fn sign(claims: &Claims) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap()
    }

    fn claims(token_type: TokenType, exp: u64) -> Claims {
        Claims {
            sub: Uuid::new_v4(),
            email: "client@example.com".to_string(),
            role: Some("client".to_string()),
            jti: Uuid::new_v4(),
            iat: now(),
            exp,
            token_type,
        }
    }

    #[test]
    fn test_verify_access_token() {
        let verifier = TokenVerifier::from_secret(SECRET);
        let issued = claims(TokenType::Access, now() + 60);

        let verified = verifier.verify_access(&sign(&issued)).unwrap();
        assert_eq!(verified.sub, issued.sub);
        assert_eq!(verified.role.as_deref(), Some("client"));
    }

    #[test]
    fn test_refresh_token_is_not_an_access_token() {
        let verifier = TokenVerifier::from_secret(SECRET);
        let token = sign(&claims(TokenType::Refresh, now() + 60));

        assert!(matches!(
            verifier.verify_access(&token),
            Err(TokenError::WrongType)
        ));
        assert!(verifier.verify(&token).is_ok());
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let verifier = TokenVerifier::from_secret(SECRET);
        let token = sign(&claims(TokenType::Access, now() - 10));

        assert!(matches!(
            verifier.verify(&token),
            Err(TokenError::Invalid(_))
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let verifier = TokenVerifier::from_secret(b"another-secret");
        let token = sign(&claims(TokenType::Access, now() + 60));

        assert!(verifier.verify(&token).is_err());
    }

    #[test]
    fn test_inline_pem_is_returned_as_is() {
        let pem = "-----BEGIN PUBLIC KEY-----\nabc\n-----END PUBLIC KEY-----";
        assert_eq!(read_key_material(pem).unwrap(), pem);
        assert!(matches!(
            read_key_material("/definitely/not/a/key.pem"),
            Err(TokenError::Key(_))
        ));
    }
}
