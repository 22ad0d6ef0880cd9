/// Physically based parameters exposed on the control surface.
pub mod controls;

/// Builds surface materials and their depth pass from a resolved bundle.
pub mod factory;

/// The VAT material extension layered over `StandardMaterial`.
pub mod vat_material;
