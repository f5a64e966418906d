//! Radar Session Authority
//!
//! Issues and validates the admin session credential. The credential is
//! self-contained: every claim the server trusts travels inside the token and
//! nothing is looked up server-side. Expiry is evaluated when a token is read.
//!
//! Two encodings exist:
//! - `signed`: HS256 JWT, tamper-evident (default)
//! - `legacy`: base64 JSON as written by earlier deployments, NOT authenticated

pub mod authority;
pub mod codec;
pub mod credentials;

pub use authority::{AuthError, DEFAULT_SESSION_TTL_HOURS, Credential, IssuedSession, SessionAuthority, SessionClaims, SessionConfig};
pub use codec::SessionFormat;
pub use credentials::AdminCredentials;
