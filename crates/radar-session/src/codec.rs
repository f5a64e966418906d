use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use chrono::{DateTime, TimeDelta};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::authority::{AuthError, Credential};

/// Turns a credential into the opaque string the client carries, and back.
///
/// `decode` only reports whether the string is a well-formed credential.
/// Expiry is the authority's concern.
pub trait TokenCodec: Send + Sync {
    fn encode(&self, credential: &Credential) -> Result<String>;
    fn decode(&self, token: &str) -> Result<Credential, AuthError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionFormat {
    Signed,
    Legacy,
}

impl FromStr for SessionFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signed" | "jwt" => Ok(Self::Signed),
            "legacy" => Ok(Self::Legacy),
            other => Err(format!("unknown session format '{}'", other)),
        }
    }
}

impl fmt::Display for SessionFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Signed => f.write_str("signed"),
            Self::Legacy => f.write_str("legacy"),
        }
    }
}

// -- Signed (HS256 JWT) --

#[derive(Debug, Serialize, Deserialize)]
struct JwtClaims {
    sub: String,
    adm: bool,
    iat: i64,
    /// Issue time in milliseconds; `iat` alone would round the age up.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    iat_ms: Option<i64>,
    /// Informational for other consumers; the authority checks age itself.
    exp: i64,
}

pub struct SignedCodec {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: TimeDelta,
}

impl SignedCodec {
    pub fn new(secret: &str, ttl: TimeDelta) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        // Expiry is evaluated by the authority against its own clock
        validation.validate_exp = false;
        validation.required_spec_claims = HashSet::new();

        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            ttl,
        }
    }
}

impl TokenCodec for SignedCodec {
    fn encode(&self, credential: &Credential) -> Result<String> {
        let iat = credential.issued_at.timestamp();
        let claims = JwtClaims {
            sub: credential.subject.clone(),
            adm: credential.is_admin,
            iat,
            iat_ms: Some(credential.issued_at.timestamp_millis()),
            exp: iat + self.ttl.num_seconds(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        Ok(token)
    }

    fn decode(&self, token: &str) -> Result<Credential, AuthError> {
        let data = decode::<JwtClaims>(token, &self.decoding, &self.validation)
            .map_err(|_| AuthError::Malformed)?;

        let issued_at = match data.claims.iat_ms {
            Some(ms) => DateTime::from_timestamp_millis(ms),
            None => DateTime::from_timestamp(data.claims.iat, 0),
        }
        .ok_or(AuthError::Malformed)?;

        Ok(Credential {
            subject: data.claims.sub,
            is_admin: data.claims.adm,
            issued_at,
        })
    }
}

// -- Legacy (base64 JSON, unauthenticated) --

#[cfg(feature = "legacy-cookie")]
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyToken {
    username: String,
    #[serde(default)]
    is_admin: bool,
    /// Milliseconds since the Unix epoch.
    timestamp: i64,
}

/// Cookie format of earlier deployments. Anyone able to write a cookie can
/// forge one; only enable behind a trusted network boundary.
#[cfg(feature = "legacy-cookie")]
pub struct LegacyCodec;

#[cfg(feature = "legacy-cookie")]
impl TokenCodec for LegacyCodec {
    fn encode(&self, credential: &Credential) -> Result<String> {
        use base64::Engine;
        use base64::engine::general_purpose::STANDARD as B64;

        let token = LegacyToken {
            username: credential.subject.clone(),
            is_admin: credential.is_admin,
            timestamp: credential.issued_at.timestamp_millis(),
        };
        Ok(B64.encode(serde_json::to_vec(&token)?))
    }

    fn decode(&self, token: &str) -> Result<Credential, AuthError> {
        use base64::Engine;
        use base64::engine::general_purpose::STANDARD as B64;

        let bytes = B64.decode(token.trim()).map_err(|_| AuthError::Malformed)?;
        let parsed: LegacyToken = serde_json::from_slice(&bytes).map_err(|_| AuthError::Malformed)?;
        let issued_at = DateTime::from_timestamp_millis(parsed.timestamp).ok_or(AuthError::Malformed)?;

        Ok(Credential {
            subject: parsed.username,
            is_admin: parsed.is_admin,
            issued_at,
        })
    }
}
