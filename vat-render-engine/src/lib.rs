pub mod engine;

pub use engine::plugin::{VatPlugin, VatPluginSettings, VatSystems};
