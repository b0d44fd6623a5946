// SPDX-License-Identifier: MIT OR Apache-2.0
//! Credential verification (§4.5): API keys (≥24 bytes, in-memory table)
//! and JWT (HS256, `sub`/`role`/`exp`/`iat` claims).

use chrono::{DateTime, TimeZone, Utc};
use dgw_core::config::{SecurityConfig, UserCredential};
use dgw_core::{CredentialKind, ErrorKind, GatewayError, GatewayResult, Principal, Role};
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::Deserialize;

/// Minimum accepted API key length, in bytes (§4.5).
pub const MIN_API_KEY_BYTES: usize = 24;

#[derive(Debug, Deserialize)]
struct Claims {
    sub: String,
    role: Role,
    exp: i64,
    #[allow(dead_code)]
    iat: i64,
}

/// Verifies inbound credentials against the statically-configured user
/// table and the process-wide JWT secret.
pub struct Authenticator {
    users: Vec<UserCredential>,
    jwt_secret: String,
}

impl Authenticator {
    /// Build an authenticator from [`SecurityConfig`]. Does not itself
    /// enforce `jwt_secret` length — that's [`dgw_core::config::GatewayConfig::validate`]'s job.
    #[must_use]
    pub fn new(config: &SecurityConfig) -> Self {
        Self {
            users: config.users.clone(),
            jwt_secret: config.jwt_secret.clone(),
        }
    }

    /// Authenticate a raw credential string, dispatching to JWT or API-key
    /// verification based on its shape (`a.b.c` → JWT; otherwise API key).
    pub fn authenticate(&self, raw_credential: &str) -> GatewayResult<Principal> {
        if raw_credential.splitn(3, '.').count() == 3 && raw_credential.contains('.') {
            self.authenticate_jwt(raw_credential)
        } else {
            self.authenticate_api_key(raw_credential)
        }
    }

    /// Verify a bare API key against the in-memory user table.
    pub fn authenticate_api_key(&self, key: &str) -> GatewayResult<Principal> {
        if key.as_bytes().len() < MIN_API_KEY_BYTES {
            return Err(GatewayError::unauthorized("api key too short"));
        }
        let user = self
            .users
            .iter()
            .find(|u| u.credential == key)
            .ok_or_else(|| GatewayError::unauthorized("unknown api key"))?;

        Ok(Principal {
            id: user.id.clone(),
            role: user.role,
            credential_kind: CredentialKind::ApiKey,
            expires_at: None,
            allowlist_ips: None,
        })
    }

    /// Verify and decode an HS256 JWT. Rejects expired tokens and any
    /// `role` claim outside the closed [`Role`] set (unrecognized variants
    /// fail to deserialize).
    pub fn authenticate_jwt(&self, token: &str) -> GatewayResult<Principal> {
        let key = DecodingKey::from_secret(self.jwt_secret.as_bytes());
        let validation = Validation::new(jsonwebtoken::Algorithm::HS256);

        let data = decode::<Claims>(token, &key, &validation).map_err(|e| {
            GatewayError::unauthorized(format!("invalid jwt: {e}"))
        })?;
        let claims = data.claims;

        let expires_at: DateTime<Utc> = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .ok_or_else(|| GatewayError::unauthorized("invalid exp claim"))?;

        // jsonwebtoken's default Validation already rejects an expired `exp`,
        // but the check is kept explicit since it also governs the returned
        // Principal's `expires_at`.
        if expires_at <= Utc::now() {
            return Err(GatewayError::new(ErrorKind::Unauthorized, "jwt expired"));
        }

        Ok(Principal {
            id: claims.sub,
            role: claims.role,
            credential_kind: CredentialKind::Jwt,
            expires_at: Some(expires_at),
            allowlist_ips: None,
        })
    }
}
