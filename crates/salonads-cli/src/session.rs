//! Session cookies persisted between invocations.
//!
//! The platform keeps its tokens in cookies, so a signed-in session is the
//! cookie jar's contents for the API origin. They live in
//! `~/.salonads/session.{profile}.json`.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use reqwest::cookie::{CookieStore, Jar};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StoredSession {
    pub server: String,
    /// `name=value` pairs for the server origin.
    pub cookies: Vec<String>,
}

impl StoredSession {
    /// Snapshot of the jar's cookies for `server`.
    pub fn capture(server: &str, jar: &Jar) -> Result<Self> {
        let url = Url::parse(server).with_context(|| format!("Invalid server URL: {server}"))?;
        let cookies = jar
            .cookies(&url)
            .and_then(|header| header.to_str().ok().map(str::to_owned))
            .map(|header| {
                header
                    .split("; ")
                    .filter(|c| !c.is_empty())
                    .map(str::to_owned)
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            server: server.to_string(),
            cookies,
        })
    }

    /// A jar holding these cookies for the stored server.
    pub fn restore(&self) -> Result<Arc<Jar>> {
        let url = Url::parse(&self.server)
            .with_context(|| format!("Invalid server URL in session: {}", self.server))?;
        let jar = Jar::default();
        for cookie in &self.cookies {
            jar.add_cookie_str(&format!("{cookie}; Path=/"), &url);
        }
        Ok(Arc::new(jar))
    }
}

/// Runs `persist` whatever the command's outcome. The command's error takes
/// precedence over a persistence error.
pub fn persist_after(outcome: Result<()>, persist: impl FnOnce() -> Result<()>) -> Result<()> {
    let persisted = persist();
    if let Err(err) = &persisted {
        tracing::warn!(error = %err, "Failed to save session");
    }
    outcome?;
    persisted
}

fn session_path(dir: &Path, profile: &str) -> PathBuf {
    dir.join(format!("session.{profile}.json"))
}

fn load_in(dir: &Path, profile: &str) -> Result<Option<StoredSession>> {
    let path = session_path(dir, profile);
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&path)?;
    let session = serde_json::from_str(&content)
        .with_context(|| format!("Corrupt session file {}", path.display()))?;
    Ok(Some(session))
}

fn save_in(dir: &Path, profile: &str, session: &StoredSession) -> Result<()> {
    fs::write(
        session_path(dir, profile),
        serde_json::to_string_pretty(session)?,
    )?;
    Ok(())
}

fn remove_in(dir: &Path, profile: &str) -> Result<bool> {
    let path = session_path(dir, profile);
    if path.exists() {
        fs::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}

pub fn load(profile: &str) -> Result<Option<StoredSession>> {
    load_in(&crate::config::state_dir()?, profile)
}

pub fn save(profile: &str, session: &StoredSession) -> Result<()> {
    save_in(&crate::config::state_dir()?, profile, session)
}

pub fn remove(profile: &str) -> Result<bool> {
    remove_in(&crate::config::state_dir()?, profile)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_jar_survives_capture_and_restore() {
        let session = StoredSession {
            server: "http://localhost:3100".to_string(),
            cookies: vec!["access_token=abc".to_string(), "refresh_token=xyz".to_string()],
        };
        let jar = session.restore().unwrap();
        let captured = StoredSession::capture("http://localhost:3100", &jar).unwrap();

        let mut cookies = captured.cookies.clone();
        cookies.sort();
        assert_eq!(cookies, session.cookies);
    }

    #[test]
    fn test_empty_jar_captures_nothing() {
        let captured = StoredSession::capture("http://localhost:3100", &Jar::default()).unwrap();
        assert!(captured.cookies.is_empty());
    }

    #[test]
    fn test_session_saved_when_command_fails() {
        let dir = tempfile::tempdir().unwrap();
        let rotated = StoredSession {
            server: "https://api.salonads.kr".to_string(),
            cookies: vec!["refresh_token=rotated".to_string()],
        };

        let err = persist_after(Err(anyhow::anyhow!("HTTP 422: Invalid schedule")), || {
            save_in(dir.path(), "default", &rotated)
        })
        .unwrap_err();

        assert_eq!(err.to_string(), "HTTP 422: Invalid schedule");
        assert_eq!(load_in(dir.path(), "default").unwrap(), Some(rotated));
    }

    #[test]
    fn test_save_error_surfaces_after_success() {
        let err = persist_after(Ok(()), || Err(anyhow::anyhow!("disk full"))).unwrap_err();
        assert_eq!(err.to_string(), "disk full");
    }

    #[test]
    fn test_files_per_profile() {
        let dir = tempfile::tempdir().unwrap();
        let session = StoredSession {
            server: "https://api.salonads.kr".to_string(),
            cookies: vec!["access_token=abc".to_string()],
        };
        save_in(dir.path(), "work", &session).unwrap();

        assert_eq!(load_in(dir.path(), "work").unwrap(), Some(session));
        assert_eq!(load_in(dir.path(), "default").unwrap(), None);
        assert!(remove_in(dir.path(), "work").unwrap());
        assert!(!remove_in(dir.path(), "work").unwrap());
    }
}
