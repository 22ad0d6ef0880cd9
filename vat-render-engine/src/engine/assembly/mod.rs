/// Image-based lighting shared by every mount.
pub mod environment;

/// Mount entities, rebuild gating and the primitives spawned under them.
pub mod mount;
