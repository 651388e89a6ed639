//! Packaging of the backup source into a single archive.

pub mod packager;

pub use packager::{Archive, Packager};
