//! Resolver-side collaborators
//!
//! The scanner starts module imports through [`ModuleImporter`]; resolution and
//! loading themselves live outside this crate.

pub mod traits;

pub use traits::{ModuleImporter, NoopImporter};
