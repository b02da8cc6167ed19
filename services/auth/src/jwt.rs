//! JWT service for token generation, validation, and revocation
//!
//! Tokens are signed with RS256 when a PEM private key is configured and
//! with an HS256 shared secret otherwise. Revoked refresh tokens are kept
//! in a Redis blacklist for the rest of their lifetime.

use anyhow::Result;
use common::cache::RedisPool;
use common::token::{Claims, TokenType, TokenVerifier, read_key_material};
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use marketplace::models::Principal;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

/// Key material used to sign tokens
#[derive(Clone)]
pub enum SigningKey {
    /// RSA private/public key pair in PEM format
    Rsa { private_key: String, public_key: String },
    /// Shared secret for HS256
    Secret(String),
}

/// JWT configuration
#[derive(Clone)]
pub struct JwtConfig {
    pub signing_key: SigningKey,
    /// Access token expiration time in seconds (default: 15 minutes)
    pub access_token_expiry: u64,
    /// Refresh token expiration time in seconds (default: 7 days)
    pub refresh_token_expiry: u64,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_PRIVATE_KEY` / `JWT_PUBLIC_KEY`: RSA key pair (PEM or path to a PEM file)
    /// - `JWT_SECRET`: HS256 secret, used when no key pair is configured
    /// - `JWT_ACCESS_TOKEN_EXPIRY`: Access token expiry in seconds (default: 900)
    /// - `JWT_REFRESH_TOKEN_EXPIRY`: Refresh token expiry in seconds (default: 604800)
    pub fn from_env() -> Result<Self> {
        let signing_key = match (
            std::env::var("JWT_PRIVATE_KEY"),
            std::env::var("JWT_PUBLIC_KEY"),
        ) {
            (Ok(private_key), Ok(public_key)) => SigningKey::Rsa {
                private_key: read_key_material(&private_key)?,
                public_key: read_key_material(&public_key)?,
            },
            _ => SigningKey::Secret(std::env::var("JWT_SECRET").map_err(|_| {
                anyhow::anyhow!("Set JWT_PRIVATE_KEY and JWT_PUBLIC_KEY, or JWT_SECRET")
            })?),
        };

        let access_token_expiry = std::env::var("JWT_ACCESS_TOKEN_EXPIRY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(900);

        let refresh_token_expiry = std::env::var("JWT_REFRESH_TOKEN_EXPIRY")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(604800);

        Ok(JwtConfig {
            signing_key,
            access_token_expiry,
            refresh_token_expiry,
        })
    }
}

fn now() -> Result<u64> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("Failed to get current time: {}", e))?
        .as_secs())
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    algorithm: Algorithm,
    verifier: TokenVerifier,
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Result<Self> {
        let (encoding_key, algorithm, verifier) = match &config.signing_key {
            SigningKey::Rsa {
                private_key,
                public_key,
            } => (
                EncodingKey::from_rsa_pem(private_key.as_bytes())?,
                Algorithm::RS256,
                TokenVerifier::from_rsa_pem(public_key)?,
            ),
            SigningKey::Secret(secret) => (
                EncodingKey::from_secret(secret.as_bytes()),
                Algorithm::HS256,
                TokenVerifier::from_secret(secret.as_bytes()),
            ),
        };

        Ok(JwtService {
            encoding_key,
            algorithm,
            verifier,
            config,
        })
    }

    fn generate(&self, principal: &Principal, token_type: TokenType, ttl: u64) -> Result<String> {
        let now = now()?;
        let claims = Claims {
            sub: principal.user_id,
            email: principal.email.clone(),
            role: principal.role.map(|role| role.as_str().to_string()),
            jti: Uuid::new_v4(),
            iat: now,
            exp: now + ttl,
            token_type,
        };

        Ok(encode(
            &Header::new(self.algorithm),
            &claims,
            &self.encoding_key,
        )?)
    }

    /// Generate an access token carrying the principal's current role
    pub fn generate_access_token(&self, principal: &Principal) -> Result<String> {
        self.generate(principal, TokenType::Access, self.config.access_token_expiry)
    }

    pub fn generate_refresh_token(&self, principal: &Principal) -> Result<String> {
        self.generate(principal, TokenType::Refresh, self.config.refresh_token_expiry)
    }

    /// Validate a token and require it to be a refresh token
    pub fn validate_refresh_token(&self, token: &str) -> Result<Claims> {
        let claims = self.verifier.verify(token)?;
        if claims.token_type != TokenType::Refresh {
            return Err(anyhow::anyhow!("Token is not a refresh token"));
        }
        Ok(claims)
    }

    /// Check if a token is blacklisted in Redis
    pub async fn is_token_blacklisted(&self, redis_pool: &RedisPool, claims: &Claims) -> Result<bool> {
        let key = format!("blacklisted_token:{}", claims.jti);
        Ok(redis_pool.get(&key).await?.is_some())
    }

    /// Blacklist a token in Redis until it would have expired anyway
    pub async fn blacklist_token(&self, redis_pool: &RedisPool, claims: &Claims) -> Result<()> {
        let key = format!("blacklisted_token:{}", claims.jti);
        let expiry = claims.exp.saturating_sub(now()?).max(1);
        redis_pool.set(&key, "1", Some(expiry)).await
    }

    /// Verifier for the tokens this service signs
    pub fn verifier(&self) -> TokenVerifier {
        self.verifier.clone()
    }

    pub fn access_token_expiry(&self) -> u64 {
        self.config.access_token_expiry
    }

    pub fn refresh_token_expiry(&self) -> u64 {
        self.config.refresh_token_expiry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use marketplace::models::Role;

    fn service() -> JwtService {
        JwtService::new(JwtConfig {
            signing_key: SigningKey::Secret("test-secret".to_string()),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        })
        .unwrap()
    }

    fn principal(role: Option<Role>) -> Principal {
        Principal {
            user_id: Uuid::new_v4(),
            email: "rahim@example.com".to_string(),
            role,
        }
    }

    #[test]
    fn test_access_token_carries_role() {
        let jwt = service();
        let principal = principal(Some(Role::Provider));

        let token = jwt.generate_access_token(&principal).unwrap();
        let claims = TokenVerifier::from_secret(b"test-secret")
            .verify_access(&token)
            .unwrap();

        assert_eq!(claims.sub, principal.user_id);
        assert_eq!(claims.email, "rahim@example.com");
        assert_eq!(claims.role.as_deref(), Some("provider"));
        assert_eq!(claims.exp - claims.iat, 900);
    }

    #[test]
    fn test_refresh_token_validation() {
        let jwt = service();
        let principal = principal(None);

        let refresh = jwt.generate_refresh_token(&principal).unwrap();
        let claims = jwt.validate_refresh_token(&refresh).unwrap();
        assert_eq!(claims.sub, principal.user_id);
        assert_eq!(claims.role, None);

        let access = jwt.generate_access_token(&principal).unwrap();
        assert!(jwt.validate_refresh_token(&access).is_err());
    }

    #[test]
    fn test_tokens_are_unique() {
        let jwt = service();
        let principal = principal(Some(Role::Client));

        let first = jwt.generate_refresh_token(&principal).unwrap();
        let second = jwt.generate_refresh_token(&principal).unwrap();
        assert_ne!(first, second);
    }
}
