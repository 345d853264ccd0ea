use std::collections::{BTreeMap, BTreeSet, VecDeque};

use refdoc_model::{Kind, KnownTypeSet, ModelError, Package, Type, TypeName, Universe};
use tracing::{debug, warn};

use crate::requested::RequestedSet;

/// Reverse "is a field of" adjacency: each type maps to the types that
/// contain it as a member or alias target.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReferenceGraph {
    referencers: BTreeMap<TypeName, BTreeSet<TypeName>>,
}

impl ReferenceGraph {
    /// Scan `declared` once, recording one edge per distinct
    /// (dereferenced target, container) pair.
    pub fn build<'a, I>(declared: I, universe: &Universe) -> Result<Self, ModelError>
    where
        I: IntoIterator<Item = &'a Type>,
    {
        let mut referencers: BTreeMap<TypeName, BTreeSet<TypeName>> = BTreeMap::new();

        for ty in declared {
            referencers.entry(ty.name.clone()).or_default();

            for member in &ty.members {
                let target = universe.dereference(&member.ty)?;
                referencers
                    .entry(target.name.clone())
                    .or_default()
                    .insert(ty.name.clone());
            }

            if ty.kind == Kind::Alias {
                if let Some(underlying) = &ty.underlying {
                    let target = universe.dereference(underlying)?;
                    referencers
                        .entry(target.name.clone())
                        .or_default()
                        .insert(ty.name.clone());
                }
            }
        }

        Ok(ReferenceGraph { referencers })
    }

    /// Build the graph for `package` and project it onto the types that get
    /// their own documentation section.
    pub fn for_documentation(
        package: &Package,
        requested: &RequestedSet,
    ) -> Result<Self, ModelError> {
        let graph = Self::build(package.declared_types(), package.universe())?;
        debug!(types = graph.len(), "built reference graph");

        let graph = if requested.is_empty() {
            graph
        } else {
            let filtered = graph.filter_to_requested(requested);
            debug!(types = filtered.len(), "filtered to requested types");
            filtered
        };

        let documented = graph.filter_to_known(&package.known_types());
        debug!(types = documented.len(), "filtered to package types");
        Ok(documented)
    }

    /// Keep every requested type and everything reachable from one by
    /// following "is a field of" edges downwards.
    pub fn filter_to_requested(&self, requested: &RequestedSet) -> Self {
        if requested.is_empty() {
            return self.clone();
        }

        let contains = self.containment();
        let mut kept: BTreeSet<&TypeName> = BTreeSet::new();
        let mut queue: VecDeque<&TypeName> = VecDeque::new();

        for name in self.referencers.keys() {
            if requested.contains(&name.name) && kept.insert(name) {
                queue.push_back(name);
            }
        }

        for name in requested.iter() {
            if !self.referencers.keys().any(|key| key.name == name) {
                warn!(name, "requested type is not present in the package");
            }
        }

        while let Some(container) = queue.pop_front() {
            let Some(children) = contains.get(container) else {
                continue;
            };
            for child in children {
                if kept.insert(child) {
                    queue.push_back(child);
                }
            }
        }

        ReferenceGraph {
            referencers: self
                .referencers
                .iter()
                .filter(|(name, _)| kept.contains(name))
                .map(|(name, refs)| (name.clone(), refs.clone()))
                .collect(),
        }
    }

    /// Drop every entry not declared in the documented package.
    pub fn filter_to_known(&self, known: &KnownTypeSet) -> Self {
        ReferenceGraph {
            referencers: self
                .referencers
                .iter()
                .filter(|(name, _)| known.contains(name))
                .map(|(name, refs)| (name.clone(), refs.clone()))
                .collect(),
        }
    }

    /// Forward edges: container to the graph keys it contains.
    fn containment(&self) -> BTreeMap<&TypeName, Vec<&TypeName>> {
        let mut contains: BTreeMap<&TypeName, Vec<&TypeName>> = BTreeMap::new();
        for (child, parents) in &self.referencers {
            for parent in parents {
                contains.entry(parent).or_default().push(child);
            }
        }
        contains
    }

    pub fn referencers(&self, name: &TypeName) -> Option<&BTreeSet<TypeName>> {
        self.referencers.get(name)
    }

    pub fn contains(&self, name: &TypeName) -> bool {
        self.referencers.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &TypeName> {
        self.referencers.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&TypeName, &BTreeSet<TypeName>)> {
        self.referencers.iter()
    }

    pub fn len(&self) -> usize {
        self.referencers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.referencers.is_empty()
    }
}

impl FromIterator<(TypeName, BTreeSet<TypeName>)> for ReferenceGraph {
    fn from_iter<T: IntoIterator<Item = (TypeName, BTreeSet<TypeName>)>>(iter: T) -> Self {
        ReferenceGraph {
            referencers: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use refdoc_model::Member;

    const PKG: &str = "example.com/pkg";

    fn name(local: &str) -> TypeName {
        TypeName::new(PKG, local)
    }

    fn refs(names: &[&str]) -> BTreeSet<TypeName> {
        names.iter().map(|local| name(local)).collect()
    }

    fn universe() -> Universe {
        let string = Type::builtin("string");
        let leaf = Type::new(name("Leaf"), Kind::Struct)
            .with_member(Member::new("Value", string.name.clone()));
        let slice = Type::slice_of(&leaf.name);
        let pointer = Type::pointer_to(&leaf.name);
        let root = Type::new(name("Root"), Kind::Struct)
            .with_member(Member::new("Items", slice.name.clone()))
            .with_member(Member::new("First", pointer.name.clone()))
            .with_member(Member::new("Direct", leaf.name.clone()));
        let alias = Type::new(name("LeafAlias"), Kind::Alias).with_underlying(pointer.name.clone());
        let lonely = Type::new(name("Lonely"), Kind::Struct);
        Universe::new(vec![string, leaf, slice, pointer, root, alias, lonely]).unwrap()
    }

    fn declared(universe: &Universe) -> Vec<&Type> {
        universe.iter().filter(|ty| ty.name.package == PKG).collect()
    }

    #[test]
    fn members_are_recorded_once_per_container() {
        let universe = universe();
        let graph = ReferenceGraph::build(declared(&universe), &universe).unwrap();
        assert_eq!(graph.referencers(&name("Leaf")), Some(&refs(&["LeafAlias", "Root"])));
    }

    #[test]
    fn every_declared_type_has_an_entry() {
        let universe = universe();
        let graph = ReferenceGraph::build(declared(&universe), &universe).unwrap();
        assert_eq!(graph.referencers(&name("Lonely")), Some(&BTreeSet::new()));
        assert_eq!(graph.referencers(&name("Root")), Some(&BTreeSet::new()));
    }

    #[test]
    fn external_targets_are_keys_until_filtered() {
        let universe = universe();
        let graph = ReferenceGraph::build(declared(&universe), &universe).unwrap();
        let string = TypeName::local("string");
        assert!(graph.contains(&string));

        let known: KnownTypeSet = declared(&universe).iter().map(|ty| ty.name.clone()).collect();
        assert!(!graph.filter_to_known(&known).contains(&string));
    }

    #[test]
    fn empty_request_is_identity() {
        let universe = universe();
        let graph = ReferenceGraph::build(declared(&universe), &universe).unwrap();
        assert_eq!(graph.filter_to_requested(&RequestedSet::new()), graph);
    }

    #[test]
    fn closure_follows_fields_downwards_only() {
        let universe = universe();
        let graph = ReferenceGraph::build(declared(&universe), &universe).unwrap();

        let from_root = graph.filter_to_requested(&["Root"].into_iter().collect());
        let names: Vec<_> = from_root.names().map(|n| n.name.as_str()).collect();
        assert_eq!(names, vec!["string", "Leaf", "Root"]);

        let from_leaf = graph.filter_to_requested(&["Leaf"].into_iter().collect());
        assert!(!from_leaf.contains(&name("Root")));
        assert!(from_leaf.contains(&name("Leaf")));
    }

    #[test]
    fn cycles_terminate_and_keep_both_sides() {
        let graph: ReferenceGraph = [
            (name("A"), refs(&["B"])),
            (name("B"), refs(&["A"])),
            (name("C"), refs(&[])),
        ]
        .into_iter()
        .collect();

        let filtered = graph.filter_to_requested(&["A"].into_iter().collect());
        assert!(filtered.contains(&name("A")));
        assert!(filtered.contains(&name("B")));
        assert!(!filtered.contains(&name("C")));
    }
}
