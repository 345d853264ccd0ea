use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use crate::error::ModelError;
use crate::types::{Type, TypeName};

/// Every type reported by the provider, keyed by its stable name.
///
/// Construction guarantees that all names referenced by members, aliases and
/// wrappers resolve, and that wrapper chains end at a concrete type.
#[derive(Clone, Debug, Default)]
pub struct Universe {
    types: BTreeMap<TypeName, Type>,
}

impl Universe {
    pub fn new<I>(types: I) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = Type>,
    {
        let mut map = BTreeMap::new();
        for ty in types {
            if let Some(previous) = map.insert(ty.name.clone(), ty) {
                debug!(name = %previous.name, "duplicate type in model, keeping the last definition");
            }
        }

        let universe = Universe { types: map };
        universe.check_references()?;
        universe.check_wrapper_chains()?;
        Ok(universe)
    }

    fn check_references(&self) -> Result<(), ModelError> {
        for ty in self.types.values() {
            for referenced in ty.referenced_names() {
                if !self.types.contains_key(referenced) {
                    return Err(ModelError::UnresolvedType {
                        referenced: referenced.clone(),
                        referrer: ty.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }

    fn check_wrapper_chains(&self) -> Result<(), ModelError> {
        for ty in self.types.values().filter(|ty| ty.kind.is_wrapper()) {
            self.dereference_type(ty)?;
        }
        Ok(())
    }

    pub fn get(&self, name: &TypeName) -> Option<&Type> {
        self.types.get(name)
    }

    pub fn resolve(&self, name: &TypeName) -> Result<&Type, ModelError> {
        self.types
            .get(name)
            .ok_or_else(|| ModelError::MissingType { name: name.clone() })
    }

    /// Strip pointer, slice and map wrappers until a concrete type is reached.
    /// Maps dereference to their value type.
    pub fn dereference(&self, name: &TypeName) -> Result<&Type, ModelError> {
        let ty = self.resolve(name)?;
        self.dereference_type(ty)
    }

    pub fn dereference_type<'a>(&'a self, ty: &'a Type) -> Result<&'a Type, ModelError> {
        let mut current = ty;
        let mut steps = 0usize;
        while current.kind.is_wrapper() {
            let Some(elem) = &current.elem else {
                break;
            };
            steps += 1;
            if steps > self.types.len() {
                return Err(ModelError::WrapperCycle {
                    name: ty.name.clone(),
                });
            }
            current = self.resolve(elem)?;
        }
        Ok(current)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Type> {
        self.types.values()
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

/// Types declared in the package being documented.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct KnownTypeSet {
    names: BTreeSet<TypeName>,
}

impl KnownTypeSet {
    pub fn contains(&self, name: &TypeName) -> bool {
        self.names.contains(name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeName> {
        self.names.iter()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl FromIterator<TypeName> for KnownTypeSet {
    fn from_iter<T: IntoIterator<Item = TypeName>>(iter: T) -> Self {
        KnownTypeSet {
            names: iter.into_iter().collect(),
        }
    }
}

/// A package's type model: its import path and every type it can see.
#[derive(Clone, Debug)]
pub struct Package {
    path: String,
    universe: Universe,
}

impl Package {
    pub fn new(path: impl Into<String>, universe: Universe) -> Self {
        Package {
            path: path.into(),
            universe,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Types declared by this package, in name order.
    pub fn declared_types(&self) -> impl Iterator<Item = &Type> {
        self.universe
            .iter()
            .filter(move |ty| ty.name.package == self.path)
    }

    pub fn known_types(&self) -> KnownTypeSet {
        self.declared_types().map(|ty| ty.name.clone()).collect()
    }
}
