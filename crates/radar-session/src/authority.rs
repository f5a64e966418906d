use anyhow::{Result, bail};
use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::codec::{SessionFormat, SignedCodec, TokenCodec};
use crate::credentials::AdminCredentials;

pub const DEFAULT_SESSION_TTL_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid login")]
    InvalidCredentials,

    #[error("no session credential presented")]
    Missing,

    #[error("session credential could not be decoded")]
    Malformed,

    #[error("session expired")]
    Expired,

    #[error("failed to encode session credential: {0}")]
    Encoding(String),
}

impl AuthError {
    /// Stable machine-readable reason for response bodies.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "invalid_credentials",
            Self::Missing => "missing",
            Self::Malformed => "malformed",
            Self::Expired => "expired",
            Self::Encoding(_) => "internal",
        }
    }
}

/// An issued admin credential. Immutable; validity depends only on its age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub subject: String,
    pub is_admin: bool,
    pub issued_at: DateTime<Utc>,
}

impl Credential {
    pub fn is_expired_at(&self, now: DateTime<Utc>, ttl: TimeDelta) -> bool {
        now - self.issued_at > ttl
    }
}

/// Claims handed back by a successful validation, exactly as carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionClaims {
    pub subject: String,
    pub is_admin: bool,
}

impl From<Credential> for SessionClaims {
    fn from(c: Credential) -> Self {
        Self {
            subject: c.subject,
            is_admin: c.is_admin,
        }
    }
}

/// A credential together with the string the client must store.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub credential: Credential,
    pub token: String,
}

#[derive(Clone)]
pub struct SessionConfig {
    pub admin: AdminCredentials,
    pub secret: String,
    pub ttl: TimeDelta,
    pub format: SessionFormat,
}

pub struct SessionAuthority {
    admin: AdminCredentials,
    ttl: TimeDelta,
    codec: Box<dyn TokenCodec>,
}

impl SessionAuthority {
    pub fn new(config: SessionConfig) -> Result<Self> {
        if config.ttl <= TimeDelta::zero() {
            bail!("Session TTL must be positive");
        }

        let codec: Box<dyn TokenCodec> = match config.format {
            SessionFormat::Signed => {
                if config.secret.is_empty() {
                    bail!("Signed sessions need a non-empty secret");
                }
                Box::new(SignedCodec::new(&config.secret, config.ttl))
            }
            #[cfg(feature = "legacy-cookie")]
            SessionFormat::Legacy => {
                warn!("Legacy session cookies are unauthenticated and can be forged by any client");
                Box::new(crate::codec::LegacyCodec)
            }
            #[cfg(not(feature = "legacy-cookie"))]
            SessionFormat::Legacy => bail!("Built without legacy-cookie support"),
        };

        Ok(Self {
            admin: config.admin,
            ttl: config.ttl,
            codec,
        })
    }

    pub fn ttl(&self) -> TimeDelta {
        self.ttl
    }

    pub fn issue(&self, subject: &str, secret: &str) -> Result<IssuedSession, AuthError> {
        self.issue_at(subject, secret, Utc::now())
    }

    pub fn issue_at(
        &self,
        subject: &str,
        secret: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, AuthError> {
        if !self.admin.verify(subject, secret) {
            warn!("Rejected admin login for '{}'", subject);
            return Err(AuthError::InvalidCredentials);
        }

        let credential = Credential {
            subject: subject.to_string(),
            is_admin: true,
            issued_at: now,
        };
        let token = self
            .codec
            .encode(&credential)
            .map_err(|e| AuthError::Encoding(e.to_string()))?;

        Ok(IssuedSession { credential, token })
    }

    pub fn validate(&self, token: Option<&str>) -> Result<SessionClaims, AuthError> {
        self.validate_at(token, Utc::now())
    }

    pub fn validate_at(
        &self,
        token: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<SessionClaims, AuthError> {
        let token = token.filter(|t| !t.is_empty()).ok_or(AuthError::Missing)?;
        let credential = self.codec.decode(token)?;

        if credential.is_expired_at(now, self.ttl) {
            debug!("Session for '{}' expired (issued {})", credential.subject, credential.issued_at);
            return Err(AuthError::Expired);
        }

        Ok(credential.into())
    }

    /// There is no server-side revocation list: the caller clears the client's
    /// copy, and a replayed token stays valid until it ages out.
    pub fn revoke(&self, token: Option<&str>) -> Option<SessionClaims> {
        let claims = token.and_then(|t| self.codec.decode(t).ok()).map(SessionClaims::from);
        if let Some(claims) = &claims {
            debug!("Session for '{}' discarded by client", claims.subject);
        }
        claims
    }
}
