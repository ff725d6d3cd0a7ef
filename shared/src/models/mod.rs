//! Catalog models

pub mod product;

pub use product::{ManufacturingType, Material, ProductSpec, UnknownMaterial};
