pub mod config;
pub mod error;
pub mod package;
pub mod params;
pub mod popup;
pub mod registry;
pub mod setup;
pub mod shortcut;
pub mod supervisor;
pub mod utils;

pub use error::{LauncherError, Result};
