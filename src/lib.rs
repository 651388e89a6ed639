pub mod configuration;
pub use configuration::Config;

pub mod controller;
pub use controller::Controller;

pub mod error_handling;

pub mod packaging;
pub use packaging::Packager;

pub mod rotation;
pub use rotation::{BackupSession, RotationReport, Rotator, UploadTarget};

pub mod storage;
pub use storage::{CloudFilesConnection, FileContainer, ObjectContainer};
