/// Rest-pose geometry pulled out of a loaded scene and prepared for VAT addressing.
pub mod geometry;
