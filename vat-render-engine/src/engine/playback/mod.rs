/// Per-frame update of the shared frame uniform.
pub mod frame_driver;
