use std::collections::BTreeSet;

/// Local type names the caller asked to document. Empty means everything.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RequestedSet {
    names: BTreeSet<String>,
}

impl RequestedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a comma separated list, ignoring blank entries.
    pub fn parse_list(list: &str) -> Self {
        list.split(',').collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }
}

impl<S: AsRef<str>> FromIterator<S> for RequestedSet {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        RequestedSet {
            names: iter
                .into_iter()
                .map(|name| name.as_ref().trim().to_owned())
                .filter(|name| !name.is_empty())
                .collect(),
        }
    }
}

impl<S: AsRef<str>> Extend<S> for RequestedSet {
    fn extend<T: IntoIterator<Item = S>>(&mut self, iter: T) {
        self.names.extend(
            iter.into_iter()
                .map(|name| name.as_ref().trim().to_owned())
                .filter(|name| !name.is_empty()),
        );
    }
}
