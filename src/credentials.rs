//! Dataset provider credential lookup.
//!
//! The extracts come from Kaggle. Downloading is left to the Kaggle tooling;
//! this only reports whether credentials are configured and where they were
//! found.

use crate::constants::credentials::{CONFIG_DIR, CONFIG_FILE, KEY_ENV, USERNAME_ENV};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Where usable credentials were found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CredentialSource {
    Environment,
    File(PathBuf),
    Missing,
}

/// Default location of the credentials file
pub fn default_credentials_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_DIR).join(CONFIG_FILE))
}

/// Check the environment first, then the credentials file in the home directory
pub fn check_credentials() -> CredentialSource {
    let username = std::env::var(USERNAME_ENV).ok();
    let key = std::env::var(KEY_ENV).ok();
    resolve_credentials(username.as_deref(), key.as_deref(), default_credentials_path().as_deref())
}

/// Resolve credentials from explicit inputs
pub fn resolve_credentials(
    username: Option<&str>,
    key: Option<&str>,
    credentials_file: Option<&Path>,
) -> CredentialSource {
    let non_empty = |value: Option<&str>| value.is_some_and(|v| !v.trim().is_empty());
    if non_empty(username) && non_empty(key) {
        debug!("Using credentials from {} and {}", USERNAME_ENV, KEY_ENV);
        return CredentialSource::Environment;
    }

    match credentials_file {
        Some(path) if path.is_file() => {
            restrict_permissions(path);
            CredentialSource::File(path.to_path_buf())
        }
        _ => CredentialSource::Missing,
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) {
    use std::os::unix::fs::PermissionsExt;

    if let Err(error) = std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600)) {
        warn!("Could not restrict permissions on {}: {}", path.display(), error);
    }
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) {}
