//! UI layer: app shell and the upload, ask and answer panels.

pub mod app;
pub mod panels;

pub use app::{RagDesktopApp, StartupConfig};
