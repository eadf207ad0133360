//! Release-engineering library for the MailForge desktop email client.
//!
//! Provides the pieces the `mailforge-release` binary composes:
//! - a task registry of sequential pipelines (`lint`, `build`, `ci`)
//! - staging of the packaged application directory with post-copy hooks
//! - platform installer builders (.deb, .rpm, macOS zip, Windows setup)
//! - a publisher uploading artifacts to S3 with a webhook notification
//!
//! It can be used both as a CLI tool and as a library dependency.

pub mod cli;
pub mod error;
pub mod installer;
pub mod manifest;
pub mod packager;
pub mod process;
pub mod publish;
pub mod session;
pub mod tasks;
pub mod template;

// Re-export commonly used types
pub use error::{ReleaseError, Result};
pub use manifest::AppManifest;
pub use session::{BuildSession, TargetArch, TargetPlatform};
pub use tasks::{Step, Task};
