// ABOUTME: Credential bundles for the upload utility
// ABOUTME: Builds an S3 client from a named profile or from static access keys

use anyhow::{bail, Result};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client as S3Client;
use std::fmt;

pub const DEFAULT_REGION: &str = "us-east-1";

/// How the upload utility authenticates to S3
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialBundle {
    /// Named profile from `~/.aws/config`; SSO-backed profiles are resolved
    /// by the SDK using the cached SSO session
    Profile {
        profile_name: String,
        region: String,
    },
    /// Explicit long-lived or temporary keys
    StaticKeys {
        access_key_id: String,
        secret_access_key: String,
        session_token: Option<String>,
        region: Option<String>,
    },
}

impl CredentialBundle {
    /// Check required fields before any client is constructed
    ///
    /// # Errors
    ///
    /// Returns an error naming the missing field.
    pub fn validate(&self) -> Result<()> {
        match self {
            CredentialBundle::Profile { profile_name, .. } => {
                if profile_name.trim().is_empty() {
                    bail!(
                        "'sso_profile_name' is required: enter the AWS profile name \
                         found in ~/.aws/config"
                    );
                }
            }
            CredentialBundle::StaticKeys {
                access_key_id,
                secret_access_key,
                ..
            } => {
                if access_key_id.trim().is_empty() {
                    bail!("'access_key_id' is required and cannot be empty");
                }
                if secret_access_key.trim().is_empty() {
                    bail!("'secret_access_key' is required and cannot be empty");
                }
            }
        }
        Ok(())
    }

    pub fn method_name(&self) -> &'static str {
        match self {
            CredentialBundle::Profile { .. } => "sso",
            CredentialBundle::StaticKeys { .. } => "access_keys",
        }
    }
}

impl fmt::Debug for CredentialBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialBundle::Profile {
                profile_name,
                region,
            } => f
                .debug_struct("Profile")
                .field("profile_name", profile_name)
                .field("region", region)
                .finish(),
            CredentialBundle::StaticKeys {
                access_key_id,
                session_token,
                region,
                ..
            } => f
                .debug_struct("StaticKeys")
                .field("access_key_id", access_key_id)
                .field("secret_access_key", &"<redacted>")
                .field("session_token", &session_token.as_ref().map(|_| "<redacted>"))
                .field("region", region)
                .finish(),
        }
    }
}

/// Build an S3 client for the bundle
///
/// Validates the bundle first, so a missing key never reaches the SDK.
pub async fn build_s3_client(bundle: &CredentialBundle) -> Result<S3Client> {
    bundle.validate()?;

    match bundle {
        CredentialBundle::Profile {
            profile_name,
            region,
        } => {
            tracing::info!(
                "Using AWS profile '{}' in region {}",
                profile_name,
                region
            );
            let config = aws_config::defaults(BehaviorVersion::latest())
                .profile_name(profile_name)
                .region(Region::new(region.clone()))
                .load()
                .await;
            Ok(S3Client::new(&config))
        }
        CredentialBundle::StaticKeys {
            access_key_id,
            secret_access_key,
            session_token,
            region,
        } => {
            let region = match region {
                Some(r) if !r.trim().is_empty() => Region::new(r.clone()),
                _ => RegionProviderChain::default_provider()
                    .or_else(DEFAULT_REGION)
                    .region()
                    .await
                    .unwrap_or_else(|| Region::new(DEFAULT_REGION)),
            };
            tracing::info!("Using static access keys in region {}", region);

            let credentials = Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                session_token.clone(),
                None,
                "opsglue-static",
            );
            let config = aws_sdk_s3::Config::builder()
                .behavior_version(BehaviorVersion::latest())
                .region(region)
                .credentials_provider(credentials)
                .build();
            Ok(S3Client::from_conf(config))
        }
    }
}
