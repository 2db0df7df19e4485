// src/remote/auth.rs

//! Cached credentials for the remote platforms
//!
//! Credentials are cached per platform under the user config directory and
//! reused across runs; `logout` removes the caches. The cache is a plain
//! TOML file, matching what the judge host operators already manage by
//! hand.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::{debug, info};

/// A platform login/password pair
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credentials {
    pub login: String,
    pub password: String,
}

/// Remote platform identifiers used as cache file names
pub const PLATFORMS: [&str; 2] = ["polygon", "ejudge"];

fn auth_file(platform: &str) -> Result<PathBuf> {
    let base = dirs::config_dir()
        .ok_or_else(|| Error::remote("no user config directory available"))?;
    Ok(base.join("polyimport").join(format!("{platform}.toml")))
}

/// Load cached credentials for a platform, if present
pub fn load(platform: &str) -> Result<Option<Credentials>> {
    let path = auth_file(platform)?;
    if !path.exists() {
        return Ok(None);
    }
    let text = fs::read_to_string(&path)?;
    let credentials = toml::from_str(&text)
        .map_err(|e| Error::remote(format!("corrupt credential cache {}: {e}", path.display())))?;
    debug!(platform, "loaded cached credentials");
    Ok(Some(credentials))
}

/// Store credentials in the platform cache
pub fn store(platform: &str, credentials: &Credentials) -> Result<()> {
    let path = auth_file(platform)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let text = toml::to_string(credentials)
        .map_err(|e| Error::remote(format!("cannot serialize credentials: {e}")))?;
    fs::write(&path, text)?;
    info!(platform, path = %path.display(), "stored credentials");
    Ok(())
}

/// Load cached credentials or prompt for them on the terminal
pub fn load_or_prompt(platform: &str) -> Result<Credentials> {
    if let Some(credentials) = load(platform)? {
        return Ok(credentials);
    }
    let credentials = prompt(platform)?;
    store(platform, &credentials)?;
    Ok(credentials)
}

fn prompt(platform: &str) -> Result<Credentials> {
    let stdin = std::io::stdin();
    let mut line = String::new();

    eprint!("{platform} login: ");
    std::io::stderr().flush()?;
    stdin.lock().read_line(&mut line)?;
    let login = line.trim().to_string();

    line.clear();
    eprint!("{platform} password: ");
    std::io::stderr().flush()?;
    stdin.lock().read_line(&mut line)?;
    let password = line.trim().to_string();

    Ok(Credentials { login, password })
}

/// Remove the cached credentials of every platform
///
/// Missing caches are not an error; the command is idempotent.
pub fn clear_all() -> Result<()> {
    for platform in PLATFORMS {
        let path = auth_file(platform)?;
        match fs::remove_file(&path) {
            Ok(()) => info!(platform, "cleared cached credentials"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credentials_round_trip_through_toml() {
        let credentials = Credentials {
            login: "judge".into(),
            password: "secret".into(),
        };
        let text = toml::to_string(&credentials).unwrap();
        let back: Credentials = toml::from_str(&text).unwrap();
        assert_eq!(back.login, "judge");
        assert_eq!(back.password, "secret");
    }
}
