use crate::configuration::config::Config;
use crate::error_handling::types::*;
use crate::rotation::{RotationReport, Rotator};
use crate::storage::cloud_files::CloudFilesConnection;
use log::{error, info};

/// Drives one backup run from a validated configuration.
pub struct Controller {
    pub config: Config,
}

impl Controller {
    /// Validates the configuration. Nothing touches the network before this succeeds.
    pub fn new(config: Config) -> Result<Self, ControllerError> {
        config.validate().map_err(|err| {
            error!("Invalid configuration: {}", err);
            ControllerError::Configuration(err)
        })?;
        Ok(Self { config })
    }

    /// Authenticates, resolves the container (creating it if missing) and rotates.
    pub async fn run(&self) -> Result<RotationReport, ControllerError> {
        let connection = CloudFilesConnection::authenticate(
            &self.config.credentials(),
            &self.config.connection_options(),
        )
        .await?;

        let container = connection
            .get_or_create_container(&self.config.container)
            .await?;
        info!("Using container {}", self.config.container);

        let rotator = Rotator::new(container);
        let report = rotator.rotate(&self.config.path, self.config.count).await?;
        Ok(report)
    }
}
