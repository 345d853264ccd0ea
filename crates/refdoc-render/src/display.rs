use std::collections::BTreeMap;

use refdoc_graph::ReferenceGraph;
use refdoc_model::directives::{self, ALIAS_NAME};
use refdoc_model::{Kind, KnownTypeSet, ModelError, Package, Type, TypeName};

use crate::visibility::is_hidden;

pub const DEFAULT_DIRECTIVE_NAMESPACE: &str = "reference-gen";

/// Tables the display resolver consults, injected per run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayOptions {
    /// Qualified identifier to short display name, e.g. `time.Duration` to `duration`.
    pub aliases: BTreeMap<String, String>,
    /// Namespaced directives outside this namespace are ignored.
    pub directive_namespace: String,
}

impl Default for DisplayOptions {
    fn default() -> Self {
        DisplayOptions {
            aliases: BTreeMap::from([("time.Duration".to_owned(), "duration".to_owned())]),
            directive_namespace: DEFAULT_DIRECTIVE_NAMESPACE.to_owned(),
        }
    }
}

/// Answers naming and linking questions about the types of one package.
#[derive(Debug)]
pub struct Resolver {
    package: Package,
    known: KnownTypeSet,
    graph: ReferenceGraph,
    options: DisplayOptions,
}

impl Resolver {
    pub fn new(package: Package, graph: ReferenceGraph, options: DisplayOptions) -> Self {
        let known = package.known_types();
        Resolver {
            package,
            known,
            graph,
            options,
        }
    }

    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn graph(&self) -> &ReferenceGraph {
        &self.graph
    }

    pub fn options(&self) -> &DisplayOptions {
        &self.options
    }

    pub fn resolve(&self, name: &TypeName) -> Result<&Type, ModelError> {
        self.package.universe().resolve(name)
    }

    /// Concrete type behind any pointer, slice or map wrappers.
    pub fn dereference(&self, name: &TypeName) -> Result<&Type, ModelError> {
        let target = self.package.universe().dereference(name)?;
        ensure_renderable(target)?;
        Ok(target)
    }

    /// Human-readable name: wrappers spelled structurally around the base
    /// identifier, pointers dropped.
    pub fn display_name(&self, name: &TypeName) -> Result<String, ModelError> {
        let ty = self.resolve(name)?;
        ensure_renderable(ty)?;

        let Some(elem) = ty.elem.as_ref().filter(|_| ty.kind.is_wrapper()) else {
            return Ok(self.base_identifier(ty));
        };

        match ty.kind {
            Kind::Slice => Ok(format!("[]{}", self.display_name(elem)?)),
            Kind::Map => {
                let key = ty.key.as_ref().map(|key| key.name.as_str()).unwrap_or_default();
                Ok(format!("map[{key}]{}", self.display_name(elem)?))
            }
            _ => self.display_name(elem),
        }
    }

    fn base_identifier(&self, ty: &Type) -> String {
        let qualified = ty.name.qualified();
        if let Some(alias) = self.options.aliases.get(&qualified) {
            return alias.clone();
        }
        if self.known.contains(&ty.name) {
            ty.name.name.clone()
        } else {
            qualified
        }
    }

    pub fn is_linkable(&self, name: &TypeName) -> Result<bool, ModelError> {
        Ok(self.link(name)?.is_some())
    }

    /// In-page anchor for the dereferenced type, when it gets a section here.
    pub fn link(&self, name: &TypeName) -> Result<Option<String>, ModelError> {
        let target = self.dereference(name)?;
        if self.known.contains(&target.name) && !is_hidden(&target.name.name) {
            Ok(Some(anchor(&target.name)))
        } else {
            Ok(None)
        }
    }

    /// Name shown in a type's alias subheading.
    pub fn alias_display_name(&self, ty: &Type) -> Result<Option<String>, ModelError> {
        if let Some(name) = self.alias_override(ty) {
            return Ok(Some(name.to_owned()));
        }
        match (&ty.kind, &ty.underlying) {
            (Kind::Alias, Some(underlying)) => self.display_name(underlying).map(Some),
            _ => Ok(None),
        }
    }

    /// Link for the alias subheading. Overridden alias names are never linked.
    pub fn alias_link(&self, ty: &Type) -> Result<Option<String>, ModelError> {
        if self.alias_override(ty).is_some() {
            return Ok(None);
        }
        match (&ty.kind, &ty.underlying) {
            (Kind::Alias, Some(underlying)) => self.link(underlying),
            _ => Ok(None),
        }
    }

    fn alias_override<'a>(&'a self, ty: &'a Type) -> Option<&'a str> {
        directives::value(&ty.comment_lines, &self.options.directive_namespace, ALIAS_NAME)
            .filter(|value| !value.is_empty())
    }

    /// Visible types containing `name`, sorted by local name.
    pub fn references(&self, name: &TypeName) -> Vec<&TypeName> {
        let mut references: Vec<&TypeName> = self
            .graph
            .referencers(name)
            .into_iter()
            .flatten()
            .filter(|reference| !is_hidden(&reference.name))
            .collect();
        references.sort_by(|left, right| left.name.cmp(&right.name));
        references
    }

    pub fn is_known(&self, name: &TypeName) -> bool {
        self.known.contains(name)
    }
}

pub fn anchor(name: &TypeName) -> String {
    format!("#{}", name.name.to_lowercase())
}

fn ensure_renderable(ty: &Type) -> Result<(), ModelError> {
    if ty.kind.is_renderable() {
        Ok(())
    } else {
        Err(ModelError::UnsupportedKind {
            name: ty.name.clone(),
            kind: ty.kind.clone(),
        })
    }
}
