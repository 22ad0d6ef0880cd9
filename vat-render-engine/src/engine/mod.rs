/// Mesh assembly per mount: plain and instanced primitives, rebuild gating.
pub mod assembly;

/// Manifest schema, resolved bundles and path rules.
pub mod assets;

/// Per-instance frame compute pass.
pub mod compute;

/// Demo application setup.
pub mod core;

/// Asynchronous manifest and sub-resource loading.
pub mod loading;

/// VAT material extension, controls and factory.
pub mod material;

pub mod mesh;

/// Frame driver for the shared frame uniform.
pub mod playback;

/// `VatPlugin` wiring every system into the app and render app.
pub mod plugin;

/// Embedded VAT shaders.
pub mod shaders;
