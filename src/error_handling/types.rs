use std::fmt;

#[derive(Debug)]
pub enum ConfigError {
    MissingArgument(String),
    InvalidAuthUrl(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingArgument(field) => write!(f, "Missing {} argument.", field),
            ConfigError::InvalidAuthUrl(e) => write!(f, "Invalid authentication URL: {}", e),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug)]
pub enum StorageError {
    AuthenticationFailed,
    ConnectionFailed(String),
    UnexpectedStatus { operation: String, status: u16 },
    InvalidResponse(String),
    IoError(std::io::Error),
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::AuthenticationFailed => write!(f, "Authentication failed"),
            StorageError::ConnectionFailed(e) => write!(f, "Storage connection failed: {}", e),
            StorageError::UnexpectedStatus { operation, status } => {
                write!(f, "{} returned unexpected status {}", operation, status)
            }
            StorageError::InvalidResponse(e) => write!(f, "Invalid storage response: {}", e),
            StorageError::IoError(e) => write!(f, "Storage IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {}

impl From<std::io::Error> for StorageError {
    fn from(err: std::io::Error) -> Self {
        StorageError::IoError(err)
    }
}

impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        StorageError::ConnectionFailed(err.to_string())
    }
}

#[derive(Debug)]
pub enum PackageError {
    IoError(std::io::Error),
    ArchiveFailed(String),
}

impl fmt::Display for PackageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PackageError::IoError(e) => write!(f, "Packaging IO error: {}", e),
            PackageError::ArchiveFailed(e) => write!(f, "Archive creation failed: {}", e),
        }
    }
}

impl std::error::Error for PackageError {}

impl From<std::io::Error> for PackageError {
    fn from(err: std::io::Error) -> Self {
        PackageError::IoError(err)
    }
}

impl From<zip::result::ZipError> for PackageError {
    fn from(err: zip::result::ZipError) -> Self {
        PackageError::ArchiveFailed(err.to_string())
    }
}

#[derive(Debug)]
pub enum RotateError {
    Package(PackageError),
    Storage(StorageError),
}

impl fmt::Display for RotateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RotateError::Package(e) => write!(f, "{}", e),
            RotateError::Storage(e) => write!(f, "storage operation failed: {}", e),
        }
    }
}

impl std::error::Error for RotateError {}

impl From<PackageError> for RotateError {
    fn from(err: PackageError) -> Self {
        RotateError::Package(err)
    }
}

impl From<StorageError> for RotateError {
    fn from(err: StorageError) -> Self {
        RotateError::Storage(err)
    }
}

#[derive(Debug)]
pub enum ControllerError {
    Configuration(ConfigError),
    Authentication,
    Storage(StorageError),
    Rotation(RotateError),
}

impl fmt::Display for ControllerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerError::Configuration(e) => write!(f, "{}", e),
            ControllerError::Authentication => {
                write!(f, "Error authenticating with Cloud Files API")
            }
            ControllerError::Storage(e) => write!(f, "storage operation failed: {}", e),
            ControllerError::Rotation(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ControllerError {}

impl From<ConfigError> for ControllerError {
    fn from(err: ConfigError) -> Self {
        ControllerError::Configuration(err)
    }
}

impl From<StorageError> for ControllerError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::AuthenticationFailed => ControllerError::Authentication,
            other => ControllerError::Storage(other),
        }
    }
}

impl From<RotateError> for ControllerError {
    fn from(err: RotateError) -> Self {
        ControllerError::Rotation(err)
    }
}
