// ABOUTME: Interactive terminal prompts for the upload utility
// ABOUTME: Collects the upload job and credentials, masking secret-bearing fields

use crate::config::AuthMethod;
use crate::credentials::{CredentialBundle, DEFAULT_REGION};
use crate::upload::UploadJob;
use anyhow::{Context, Result};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password, Select};

/// Prompt for everything an upload needs
///
/// Asks, in order:
/// 1. Auth method (SSO profile or access keys; SSO is the default)
/// 2. Local file or directory path, whether it is a directory, bucket and key prefix
/// 3. For SSO: region and profile name; for access keys: key id, secret key
///    and optional session token (secrets are read without echo)
///
/// Returns the same validated pair as the JSON configuration front end.
///
/// # Errors
///
/// Returns an error if the terminal cannot be read or if any required value
/// is left empty.
pub fn prompt_upload_job() -> Result<(UploadJob, CredentialBundle)> {
    let theme = ColorfulTheme::default();

    let methods = ["SSO", "Access Keys"];
    let selection = Select::with_theme(&theme)
        .with_prompt("Select your Auth Method to AWS")
        .items(&methods)
        .default(0)
        .interact()
        .context("Failed to get auth method selection")?;
    let auth_method = if selection == 0 {
        AuthMethod::Sso
    } else {
        AuthMethod::AccessKeys
    };

    let local_path: String = Input::with_theme(&theme)
        .with_prompt("Local file or Directory path")
        .interact_text()
        .context("Failed to get local path")?;

    let is_directory = Confirm::with_theme(&theme)
        .with_prompt("Is your local path a directory?")
        .default(false)
        .interact()
        .context("Failed to get directory flag")?;

    let bucket_name: String = Input::with_theme(&theme)
        .with_prompt("S3 bucket name")
        .interact_text()
        .context("Failed to get bucket name")?;

    let prefix: String = Input::with_theme(&theme)
        .with_prompt("S3 key prefix")
        .allow_empty(true)
        .default(String::new())
        .show_default(false)
        .interact_text()
        .context("Failed to get key prefix")?;

    let job = UploadJob::new(local_path.trim(), bucket_name.trim(), prefix.trim(), is_directory);
    job.validate()?;

    let credentials = match auth_method {
        AuthMethod::Sso => {
            let region: String = Input::with_theme(&theme)
                .with_prompt("Enter your default AWS Region")
                .default(DEFAULT_REGION.to_string())
                .interact_text()
                .context("Failed to get region")?;

            println!("You can find your profile name inside `~/.aws/config`");
            let profile_name: String = Input::with_theme(&theme)
                .with_prompt("Enter your AWS Profile Name")
                .allow_empty(true)
                .interact_text()
                .context("Failed to get profile name")?;

            CredentialBundle::Profile {
                profile_name: profile_name.trim().to_string(),
                region: region.trim().to_string(),
            }
        }
        AuthMethod::AccessKeys => {
            let access_key_id: String = Input::with_theme(&theme)
                .with_prompt("Enter your AWS Access Key ID")
                .allow_empty(true)
                .interact_text()
                .context("Failed to get access key id")?;

            let secret_access_key = Password::with_theme(&theme)
                .with_prompt("Enter your AWS Secret Access Key")
                .allow_empty_password(true)
                .interact()
                .context("Failed to get secret access key")?;

            let session_token = Password::with_theme(&theme)
                .with_prompt("Enter your AWS Session Token (leave empty for none)")
                .allow_empty_password(true)
                .interact()
                .context("Failed to get session token")?;

            CredentialBundle::StaticKeys {
                access_key_id: access_key_id.trim().to_string(),
                secret_access_key,
                session_token: Some(session_token).filter(|t| !t.trim().is_empty()),
                region: None,
            }
        }
    };
    credentials.validate()?;

    Ok((job, credentials))
}
