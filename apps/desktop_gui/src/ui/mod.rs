//! UI layer for the desktop client: app shell, panels, and overlays.

pub mod app;

pub use app::MergeDeskApp;
