use super::types::*;
use crate::error_handling::types::ConfigError;
use clap::Parser;
use log::error;
use std::path::PathBuf;

/// Runtime configuration for one backup rotation.
///
/// Every field comes from the command line; credentials and the auth endpoint
/// fall back to environment variables through clap's `env` support. There is
/// no configuration file.
///
/// # Examples
///
/// ```no_run
/// use cfrotate::configuration::config::Config;
///
/// let config = Config::from_args();
/// config.validate().expect("missing credentials");
/// println!("Backing up {} to {}", config.path.display(), config.container);
/// ```
///
/// # Fields Overview
///
/// - `username` / `apikey`: Cloud Files account credentials
/// - `snet`: route storage traffic over ServiceNet
/// - `auth_url`: authentication endpoint, US region by default
/// - `count`: number of backups to keep
/// - `container`: destination container
/// - `path`: file or directory to back up
#[derive(Parser, Debug, Clone)]
#[command(name = "cfrotate")]
#[command(version)]
#[command(about = "A backup rotator for use with Rackspace Cloud Files.")]
pub struct Config {
    /// Defaults to env[CLOUD_FILES_USERNAME]
    #[arg(
        short = 'u',
        long,
        env = "CLOUD_FILES_USERNAME",
        default_value = "",
        hide_default_value = true,
        help_heading = "Authentication Options"
    )]
    pub username: String,

    /// Defaults to env[CLOUD_FILES_APIKEY]
    #[arg(
        short = 'k',
        long,
        env = "CLOUD_FILES_APIKEY",
        default_value = "",
        hide_default_value = true,
        hide_env_values = true,
        help_heading = "Authentication Options"
    )]
    pub apikey: String,

    /// Use ServiceNet for connections
    #[arg(
        short = 's',
        long,
        action = clap::ArgAction::SetTrue,
        help_heading = "Authentication Options"
    )]
    pub snet: bool,

    /// Authentication endpoint, e.g. the UK region
    #[arg(
        long,
        env = "CLOUD_FILES_AUTH_URL",
        default_value = US_AUTH_URL,
        help_heading = "Authentication Options"
    )]
    pub auth_url: String,

    /// Number of backups to rotate
    #[arg(
        short = 'r',
        long = "rotate",
        default_value_t = DEFAULT_ROTATE_COUNT,
        allow_negative_numbers = true,
        help_heading = "Backup Options"
    )]
    pub count: i64,

    /// Cloud Files Container for the backup
    pub container: String,

    /// File or directory to backup
    pub path: PathBuf,
}

impl Config {
    /// Parses the process arguments, exiting with a usage message on malformed input.
    pub fn from_args() -> Self {
        Config::parse()
    }

    /// Checks that both credentials are present once defaults were applied.
    ///
    /// Fields are checked in order, so a missing username is reported before
    /// a missing API key.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (field, value) in [("username", &self.username), ("apikey", &self.apikey)] {
            if value.is_empty() {
                error!("No {} given on the command line or in the environment", field);
                return Err(ConfigError::MissingArgument(field.to_string()));
            }
        }
        reqwest::Url::parse(&self.auth_url)
            .map_err(|e| ConfigError::InvalidAuthUrl(format!("{}: {}", self.auth_url, e)))?;
        Ok(())
    }

    pub fn credentials(&self) -> Credentials {
        Credentials {
            username: self.username.clone(),
            api_key: self.apikey.clone(),
        }
    }

    pub fn connection_options(&self) -> ConnectionOptions {
        ConnectionOptions {
            auth_url: self.auth_url.clone(),
            servicenet: self.snet,
            timeout: REQUEST_TIMEOUT,
        }
    }
}
