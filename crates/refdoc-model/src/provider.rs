use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ProviderError;
use crate::types::Type;
use crate::universe::{Package, Universe};

/// Source of type models, looked up by package identifier.
pub trait TypeModelProvider {
    fn load(&self, package: &str) -> Result<Package, ProviderError>;
}

/// On-disk representation of a package's type model.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ModelDocument {
    pub package: String,
    #[serde(default)]
    pub types: Vec<Type>,
}

impl ModelDocument {
    pub fn into_package(self) -> Result<Package, ProviderError> {
        let ModelDocument { package, types } = self;
        let universe = Universe::new(types).map_err(|source| ProviderError::Model {
            package: package.clone(),
            source,
        })?;
        Ok(Package::new(package, universe))
    }
}

/// Reads JSON model documents from disk.
///
/// A package identifier naming an existing file is read directly; any other
/// identifier is looked up as `<root>/<identifier>.json`.
#[derive(Clone, Debug)]
pub struct JsonModelProvider {
    root: PathBuf,
}

impl JsonModelProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        JsonModelProvider { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn locate(&self, package: &str) -> (PathBuf, bool) {
        let direct = PathBuf::from(package);
        if direct.is_file() {
            return (direct, true);
        }
        (self.root.join(format!("{package}.json")), false)
    }
}

impl TypeModelProvider for JsonModelProvider {
    fn load(&self, package: &str) -> Result<Package, ProviderError> {
        let (path, direct) = self.locate(package);
        if !path.is_file() {
            return Err(ProviderError::PackageNotFound {
                package: package.to_owned(),
                searched: path,
            });
        }

        debug!(path = %path.display(), "reading type model");
        let contents = fs::read_to_string(&path).map_err(|source| ProviderError::Io {
            path: path.clone(),
            source,
        })?;
        let document: ModelDocument =
            serde_json::from_str(&contents).map_err(|source| ProviderError::Parse {
                path: path.clone(),
                source,
            })?;

        if !direct && document.package != package {
            return Err(ProviderError::PackageMismatch {
                path,
                expected: package.to_owned(),
                found: document.package,
            });
        }

        document.into_package()
    }
}
