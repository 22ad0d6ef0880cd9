//! Demo application setup for native and WASM targets.

/// Builds the demo app: default plugins, the VAT plugin and a sample scene.
pub mod app_setup;

/// Keyboard controls for the demo scene.
pub mod demo_controls;

/// Platform-specific window configuration for native and WASM builds.
///
/// Configures canvas integration for web targets and vsync settings.
pub mod window_config;
