use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use chrono::TimeDelta;
use radar_session::{AdminCredentials, DEFAULT_SESSION_TTL_HOURS, SessionConfig, SessionFormat};
use tracing::warn;

const DEV_SECRET: &str = "dev-secret-change-me";
const DEV_ADMIN_PASSWORD: &str = "admin123";

pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub secure_cookies: bool,
    pub session: SessionConfig,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let host = var("RADAR_HOST", "0.0.0.0");
        let port: u16 = var("RADAR_PORT", "3000")
            .parse()
            .context("RADAR_PORT must be a port number")?;
        let db_path = PathBuf::from(var("RADAR_DB_PATH", "radar.db"));
        let secure_cookies = parse_bool(&var("RADAR_SECURE_COOKIES", "false"))
            .context("RADAR_SECURE_COOKIES must be true or false")?;

        let username = var("RADAR_ADMIN_USERNAME", "admin");
        let admin = match lookup("RADAR_ADMIN_PASSWORD_HASH") {
            Some(hash) => AdminCredentials::from_hash(username, hash)?,
            None => {
                let password = lookup("RADAR_ADMIN_PASSWORD").unwrap_or_else(|| {
                    warn!("RADAR_ADMIN_PASSWORD not set, using the development default");
                    DEV_ADMIN_PASSWORD.to_string()
                });
                AdminCredentials::from_password(username, &password)?
            }
        };

        let secret = lookup("RADAR_SESSION_SECRET").unwrap_or_else(|| {
            warn!("RADAR_SESSION_SECRET not set, using the development default");
            DEV_SECRET.to_string()
        });

        let ttl_hours: i64 = var("RADAR_SESSION_TTL_HOURS", &DEFAULT_SESSION_TTL_HOURS.to_string())
            .parse()
            .context("RADAR_SESSION_TTL_HOURS must be a whole number of hours")?;
        let ttl = TimeDelta::try_hours(ttl_hours).ok_or_else(|| anyhow!("RADAR_SESSION_TTL_HOURS out of range"))?;

        let format: SessionFormat = var("RADAR_SESSION_FORMAT", "signed")
            .parse()
            .map_err(|e: String| anyhow!(e))?;

        Ok(Self {
            host,
            port,
            db_path,
            secure_cookies,
            session: SessionConfig {
                admin,
                secret,
                ttl,
                format,
            },
        })
    }

    pub fn addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid listen address {}:{}", self.host, self.port))
    }
}

fn parse_bool(raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => Err(anyhow!("not a boolean: {}", other)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let map: HashMap<String, String> = vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        ServerConfig::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.addr().unwrap().port(), 3000);
        assert_eq!(cfg.db_path, PathBuf::from("radar.db"));
        assert!(!cfg.secure_cookies);
        assert_eq!(cfg.session.ttl, TimeDelta::hours(24));
        assert_eq!(cfg.session.format, SessionFormat::Signed);
        assert!(cfg.session.admin.verify("admin", "admin123"));
    }

    #[test]
    fn overrides() {
        let cfg = config(&[
            ("RADAR_PORT", "8080"),
            ("RADAR_ADMIN_USERNAME", "rathaus"),
            ("RADAR_ADMIN_PASSWORD", "geheim"),
            ("RADAR_SESSION_TTL_HOURS", "2"),
            ("RADAR_SESSION_FORMAT", "legacy"),
            ("RADAR_SECURE_COOKIES", "true"),
        ])
        .unwrap();
        assert_eq!(cfg.port, 8080);
        assert!(cfg.secure_cookies);
        assert_eq!(cfg.session.ttl, TimeDelta::hours(2));
        assert_eq!(cfg.session.format, SessionFormat::Legacy);
        assert!(cfg.session.admin.verify("rathaus", "geheim"));
        assert!(!cfg.session.admin.verify("admin", "admin123"));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(config(&[("RADAR_PORT", "eighty")]).is_err());
        assert!(config(&[("RADAR_SESSION_FORMAT", "plain")]).is_err());
        assert!(config(&[("RADAR_SECURE_COOKIES", "maybe")]).is_err());
        assert!(config(&[("RADAR_ADMIN_PASSWORD_HASH", "nope")]).is_err());
    }
}
