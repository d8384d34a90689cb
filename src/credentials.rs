//! Named API tokens stored in a TOML file.
//!
//! Each profile is one table:
//!
//! ```toml
//! [default]
//! token = "y_NbAkKc66ryYTWUXYEu"
//! ```
//!
//! The file holds secrets, so on Unix it is created with mode `0600` and
//! restricted again on every write.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::debug;
use serde::{Deserialize, Serialize};

use crate::config::APP_NAME;
use crate::error::PagerDutyError;

/// File name of the credentials store under the XDG config directory.
pub const CREDENTIALS_FILE: &str = "credentials.toml";

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub token: String,
}

impl fmt::Debug for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Profile { token: <redacted> }")
    }
}

/// Tokens keyed by profile name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Credentials {
    profiles: BTreeMap<String, Profile>,
}

impl Credentials {
    /// Location of an existing credentials file in the XDG config
    /// directories.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        xdg::BaseDirectories::with_prefix(APP_NAME).find_config_file(CREDENTIALS_FILE)
    }

    /// Path a new credentials file should be written to, creating the
    /// parent directory.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Io`] if the directory cannot be created.
    pub fn place_default() -> Result<PathBuf, PagerDutyError> {
        Ok(xdg::BaseDirectories::with_prefix(APP_NAME).place_config_file(CREDENTIALS_FILE)?)
    }

    /// Read the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Io`] when the file cannot be read and
    /// [`PagerDutyError::Config`] when it is not valid TOML.
    pub fn load(path: &Path) -> Result<Self, PagerDutyError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("no credentials at {}", path.display());
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&text).map_err(|e| {
            PagerDutyError::Config(format!("reading {}: {e}", path.display()).into())
        })
    }

    /// Write the store to `path` with owner-only permissions.
    ///
    /// # Errors
    ///
    /// Returns [`PagerDutyError::Io`] if the file cannot be written.
    pub fn save(&self, path: &Path) -> Result<(), PagerDutyError> {
        let text = toml::to_string(self)
            .map_err(|e| PagerDutyError::Config(format!("encoding credentials: {e}").into()))?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut file = open_private(path)?;
        file.write_all(text.as_bytes())?;
        file.flush()?;
        restrict(path)?;
        Ok(())
    }

    /// Token stored for `profile`.
    #[must_use]
    pub fn token(&self, profile: &str) -> Option<&str> {
        self.profiles.get(profile).map(|p| p.token.as_str())
    }

    pub fn set_token(&mut self, profile: impl Into<String>, token: impl Into<String>) {
        self.profiles.insert(
            profile.into(),
            Profile {
                token: token.into(),
            },
        );
    }

    /// Remove `profile`, returning whether it existed.
    pub fn remove(&mut self, profile: &str) -> bool {
        self.profiles.remove(profile).is_some()
    }

    /// Profile names in sorted order.
    pub fn profiles(&self) -> impl Iterator<Item = &str> {
        self.profiles.keys().map(String::as_str)
    }
}

#[cfg(unix)]
fn open_private(path: &Path) -> io::Result<fs::File> {
    use std::os::unix::fs::OpenOptionsExt;
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o600)
        .open(path)
}

#[cfg(not(unix))]
fn open_private(path: &Path) -> io::Result<fs::File> {
    fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}

// `mode` only applies when the file is created.
#[cfg(unix)]
fn restrict(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
#[expect(
    clippy::unnecessary_wraps,
    reason = "matches the unix signature"
)]
fn restrict(_path: &Path) -> io::Result<()> {
    Ok(())
}
