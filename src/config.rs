//! Process configuration, read from the environment (and `.env`, via dotenv).

use std::{net::SocketAddr, path::PathBuf};

use anyhow::{bail, Context, Result};

use crate::constants::{DEFAULT_ADDR, DEFAULT_UPLOAD_DIR, MIN_SESSION_SECRET_LEN};
use crate::images::CloudinaryCredentials;

/// `DATABASE_URL` value selecting the in-process store.
pub const MEMORY_DATABASE: &str = "memory";

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub database_url: String,
    /// Signs session cookies. At least 64 bytes.
    pub session_secret: String,
    /// Mark session cookies `Secure`; turn on behind HTTPS.
    pub secure_cookies: bool,
    /// Where uploads wait while they are sent to the image host.
    pub upload_dir: PathBuf,
    pub cloudinary: CloudinaryCredentials,
    pub admin: Option<AdminSeed>,
}

/// An admin account to create at startup if its email is not registered yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from any key/value source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> Result<String> {
            lookup(key)
                .filter(|value| !value.is_empty())
                .with_context(|| format!("{} is not set in env", key))
        };

        let addr = lookup("ADDR")
            .unwrap_or_else(|| DEFAULT_ADDR.to_owned())
            .parse()
            .context("ADDR is not a valid socket address")?;

        let session_secret = required("SESSION_SECRET")?;
        if session_secret.len() < MIN_SESSION_SECRET_LEN {
            bail!(
                "SESSION_SECRET must be at least {} bytes long",
                MIN_SESSION_SECRET_LEN
            );
        }

        let secure_cookies = match lookup("SECURE_COOKIES").as_deref() {
            None | Some("") | Some("0") | Some("false") => false,
            Some("1") | Some("true") => true,
            Some(other) => bail!("SECURE_COOKIES must be true or false, got {:?}", other),
        };

        let admin = match (lookup("ADMIN_EMAIL"), lookup("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Some(AdminSeed { email, password })
            }
            _ => None,
        };

        Ok(Config {
            addr,
            database_url: required("DATABASE_URL")?,
            session_secret,
            secure_cookies,
            upload_dir: lookup("UPLOAD_DIR")
                .filter(|dir| !dir.is_empty())
                .unwrap_or_else(|| DEFAULT_UPLOAD_DIR.to_owned())
                .into(),
            cloudinary: CloudinaryCredentials {
                cloud_name: required("CLOUDINARY_NAME")?,
                api_key: required("CLOUDINARY_KEY")?,
                api_secret: required("CLOUDINARY_SECRET")?,
            },
            admin,
        })
    }
}
