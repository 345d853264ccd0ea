//! Type model consumed by the reference generator.
//!
//! A provider reports every type a package declares or references; the
//! [`Universe`] validates that the reported names are consistent so later
//! stages can dereference and display types without re-checking.

pub mod directives;
mod error;
mod provider;
mod types;
mod universe;

pub use error::{ModelError, ProviderError};
pub use provider::{JsonModelProvider, ModelDocument, TypeModelProvider};
pub use types::{Kind, Member, Type, TypeName};
pub use universe::{KnownTypeSet, Package, Universe};
