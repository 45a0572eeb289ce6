//! Credential loading
//!
//! Credentials come from a dotenv-style file:
//!
//! ```text
//! # cloudflare.env
//! CLOUDFLARE_EMAIL=ops@example.com
//! CLOUDFLARE_API_KEY="..."
//! CLOUDFLARE_ZONE_ID=023e105f4ecef8ad9ca31a8372d0c353
//! ```
//!
//! A process environment variable of the same name wins over the file.

use cfddns_core::{CredentialField, Credentials, Error, Result};
use std::path::Path;

/// Credentials file read when none is named
pub const DEFAULT_CREDENTIALS_PATH: &str = "cloudflare.env";

/// Load credentials from `path` and the process environment
///
/// An explicitly named file must be readable; the default file is optional.
/// Missing values are left empty for [`Credentials::validate`] to report.
pub fn load(path: Option<&Path>) -> Result<Credentials> {
    load_with_env(path, |key| std::env::var(key).ok())
}

/// Load credentials, resolving overrides through `env`
pub fn load_with_env(
    path: Option<&Path>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Credentials> {
    match path {
        Some(path) => load_from(path, true, env),
        None => load_from(Path::new(DEFAULT_CREDENTIALS_PATH), false, env),
    }
}

fn load_from(
    file: &Path,
    explicit: bool,
    env: impl Fn(&str) -> Option<String>,
) -> Result<Credentials> {
    let mut credentials = Credentials::default();

    match dotenvy::from_path_iter(file) {
        Ok(entries) => {
            tracing::debug!("Reading credentials from {}", file.display());
            for entry in entries {
                let (key, value) = entry.map_err(|e| {
                    Error::config(format!(
                        "Malformed credentials file {}: {}",
                        file.display(),
                        e
                    ))
                })?;
                assign(&mut credentials, &key, value);
            }
        }
        Err(e) if !explicit && e.not_found() => {
            tracing::debug!("No credentials file at {}", file.display());
        }
        Err(e) => {
            return Err(Error::config(format!(
                "Cannot read credentials file {}: {}",
                file.display(),
                e
            )));
        }
    }

    for field in [
        CredentialField::Email,
        CredentialField::ApiKey,
        CredentialField::ZoneId,
    ] {
        if let Some(value) = env(field.var_name()).filter(|v| !v.trim().is_empty()) {
            assign(&mut credentials, field.var_name(), value);
        }
    }

    Ok(credentials)
}

fn assign(credentials: &mut Credentials, key: &str, value: String) {
    let value = value.trim().to_string();
    match key {
        "CLOUDFLARE_EMAIL" => credentials.email = value,
        "CLOUDFLARE_API_KEY" => credentials.api_key = value,
        "CLOUDFLARE_ZONE_ID" => credentials.zone_id = value,
        _ => {}
    }
}
