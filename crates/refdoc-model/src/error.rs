use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::types::{Kind, TypeName};

/// Inconsistencies between the type model and what the generator can document.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ModelError {
    #[error("type {referenced} referenced from {referrer} is not part of the model")]
    UnresolvedType {
        referenced: TypeName,
        referrer: TypeName,
    },

    #[error("type {name} is not part of the model")]
    MissingType { name: TypeName },

    #[error("wrapper type {name} never reaches a concrete element type")]
    WrapperCycle { name: TypeName },

    #[error("type {name} has kind={kind} which cannot be rendered")]
    UnsupportedKind { name: TypeName, kind: Kind },

    #[error("type {name} embeds itself")]
    EmbeddingCycle { name: TypeName },
}

/// Failures raised while acquiring a package's type model.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("package {package:?} was not found (looked for {searched})")]
    PackageNotFound { package: String, searched: PathBuf },

    #[error("failed to read type model {path}: {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to parse type model {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("type model {path} describes package {found:?}, expected {expected:?}")]
    PackageMismatch {
        path: PathBuf,
        expected: String,
        found: String,
    },

    #[error("invalid type model for package {package:?}: {source}")]
    Model { package: String, source: ModelError },
}
