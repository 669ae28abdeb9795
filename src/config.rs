// ABOUTME: JSON configuration front end for the upload utility
// ABOUTME: Parses upload_config.json into a validated UploadJob and CredentialBundle

use crate::credentials::{CredentialBundle, DEFAULT_REGION};
use crate::upload::UploadJob;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

pub const DEFAULT_CONFIG_PATH: &str = "upload_config.json";

/// Which credential flow to use
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    #[default]
    Sso,
    AccessKeys,
}

impl FromStr for AuthMethod {
    type Err = anyhow::Error;

    /// Accepts the config spellings and the interactive menu numbers
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sso" | "1" => Ok(AuthMethod::Sso),
            "access_keys" | "2" => Ok(AuthMethod::AccessKeys),
            other => bail!(
                "Unknown auth_method '{}': expected \"sso\" or \"access_keys\"",
                other
            ),
        }
    }
}

/// On-disk shape of the upload configuration
///
/// ```json
/// {
///   "auth_method": "sso",
///   "local_files_path": "./export",
///   "is_directory": true,
///   "bucket_name": "my-bucket",
///   "s3_prefix": "backups",
///   "auth": {
///     "sso": {"default_region": "us-east-1", "sso_profile_name": "ops"},
///     "access_keys": {"access_key_id": "", "secret_access_key": "", "session_token": ""}
///   }
/// }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UploadConfig {
    #[serde(default)]
    pub auth_method: AuthMethod,
    #[serde(default)]
    pub local_files_path: String,
    #[serde(default)]
    pub is_directory: bool,
    #[serde(default)]
    pub bucket_name: String,
    #[serde(default)]
    pub s3_prefix: String,
    #[serde(default)]
    pub auth: AuthSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthSection {
    #[serde(default)]
    pub sso: Option<SsoSection>,
    #[serde(default)]
    pub access_keys: Option<AccessKeysSection>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SsoSection {
    #[serde(default)]
    pub default_region: Option<String>,
    #[serde(default)]
    pub sso_profile_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AccessKeysSection {
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
}

impl UploadConfig {
    pub fn parse(contents: &str) -> Result<Self> {
        serde_json::from_str(contents).context("Invalid upload configuration JSON")
    }

    /// Split into the job and the credentials, validating both
    ///
    /// # Errors
    ///
    /// Fails, naming the field, when `bucket_name` or `local_files_path` is
    /// empty, or when the selected auth method is missing a required value.
    pub fn into_parts(self) -> Result<(UploadJob, CredentialBundle)> {
        let job = UploadJob::new(
            self.local_files_path,
            self.bucket_name,
            self.s3_prefix,
            self.is_directory,
        );
        job.validate()?;

        let credentials = match self.auth_method {
            AuthMethod::Sso => {
                let sso = self
                    .auth
                    .sso
                    .context("auth_method is \"sso\" but the 'auth.sso' section is missing")?;
                CredentialBundle::Profile {
                    profile_name: sso.sso_profile_name,
                    region: non_empty(sso.default_region)
                        .unwrap_or_else(|| DEFAULT_REGION.to_string()),
                }
            }
            AuthMethod::AccessKeys => {
                let keys = self.auth.access_keys.context(
                    "auth_method is \"access_keys\" but the 'auth.access_keys' section is missing",
                )?;
                CredentialBundle::StaticKeys {
                    access_key_id: keys.access_key_id,
                    secret_access_key: keys.secret_access_key,
                    session_token: non_empty(keys.session_token),
                    region: None,
                }
            }
        };
        credentials.validate()?;

        Ok((job, credentials))
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Read and parse an upload configuration file
pub fn load_upload_config(path: impl AsRef<Path>) -> Result<UploadConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read upload configuration {}", path.display()))?;
    UploadConfig::parse(&contents)
        .with_context(|| format!("Failed to load upload configuration {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn config_json(local: &str, bucket: &str, method: &str, id: &str, secret: &str) -> String {
        serde_json::json!({
            "auth_method": method,
            "local_files_path": local,
            "is_directory": true,
            "bucket_name": bucket,
            "s3_prefix": "backups",
            "auth": {
                "sso": {"default_region": "", "sso_profile_name": "ops"},
                "access_keys": {
                    "access_key_id": id,
                    "secret_access_key": secret,
                    "session_token": ""
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_auth_method_from_str() {
        assert_eq!("sso".parse::<AuthMethod>().unwrap(), AuthMethod::Sso);
        assert_eq!("1".parse::<AuthMethod>().unwrap(), AuthMethod::Sso);
        assert_eq!(
            "ACCESS_KEYS".parse::<AuthMethod>().unwrap(),
            AuthMethod::AccessKeys
        );
        assert!("oauth".parse::<AuthMethod>().is_err());
    }

    #[test]
    fn test_sso_config_into_parts() {
        let dir = tempdir().unwrap();
        let local = dir.path().to_string_lossy().to_string();
        let config = UploadConfig::parse(&config_json(&local, "bucket", "sso", "", "")).unwrap();

        let (job, creds) = config.into_parts().unwrap();
        assert_eq!(job.bucket_name, "bucket");
        assert_eq!(job.prefix, "backups");
        assert!(job.is_directory);
        assert_eq!(
            creds,
            CredentialBundle::Profile {
                profile_name: "ops".to_string(),
                region: "us-east-1".to_string(),
            }
        );
    }

    #[test]
    fn test_access_keys_config_drops_empty_token() {
        let dir = tempdir().unwrap();
        let local = dir.path().to_string_lossy().to_string();
        let config =
            UploadConfig::parse(&config_json(&local, "bucket", "access_keys", "AKIA1", "s3cr3t"))
                .unwrap();

        let (_, creds) = config.into_parts().unwrap();
        match creds {
            CredentialBundle::StaticKeys { session_token, .. } => assert_eq!(session_token, None),
            other => panic!("unexpected credentials: {:?}", other),
        }
    }

    #[test]
    fn test_empty_bucket_fails() {
        let dir = tempdir().unwrap();
        let local = dir.path().to_string_lossy().to_string();
        let config = UploadConfig::parse(&config_json(&local, "", "sso", "", "")).unwrap();
        let err = config.into_parts().unwrap_err();
        assert!(err.to_string().contains("bucket_name"));
    }

    #[test]
    fn test_empty_local_path_fails() {
        let config = UploadConfig::parse(&config_json("", "bucket", "sso", "", "")).unwrap();
        let err = config.into_parts().unwrap_err();
        assert!(err.to_string().contains("local_files_path"));
    }

    #[test]
    fn test_access_keys_missing_secret_fails() {
        let dir = tempdir().unwrap();
        let local = dir.path().to_string_lossy().to_string();
        let config =
            UploadConfig::parse(&config_json(&local, "bucket", "access_keys", "AKIA1", ""))
                .unwrap();
        let err = config.into_parts().unwrap_err();
        assert!(err.to_string().contains("secret_access_key"));
    }

    #[test]
    fn test_unknown_auth_method_is_a_parse_error() {
        assert!(UploadConfig::parse(r#"{"auth_method": "kerberos"}"#).is_err());
    }

    #[test]
    fn test_load_upload_config_missing_file() {
        let dir = tempdir().unwrap();
        let err = load_upload_config(dir.path().join("missing.json")).unwrap_err();
        assert!(err.to_string().contains("missing.json"));
    }
}
