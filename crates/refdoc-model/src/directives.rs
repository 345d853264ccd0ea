//! Machine-readable `+` comment directives.
//!
//! A directive is any comment line starting with `+`. Its body may be
//! namespaced (`+reference-gen:alias-name=string`); only un-namespaced
//! directives and those in the caller's namespace are interpreted.

pub const OPTIONAL: &str = "optional";
pub const ALIAS_NAME: &str = "alias-name";

/// A parsed directive line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Directive<'a> {
    pub namespace: Option<&'a str>,
    pub key: &'a str,
    pub value: Option<&'a str>,
}

pub fn is_directive(line: &str) -> bool {
    line.trim_start().starts_with('+')
}

pub fn parse(line: &str) -> Option<Directive<'_>> {
    let body = line.trim().strip_prefix('+')?;
    let (head, value) = match body.split_once('=') {
        Some((head, value)) => (head, Some(value.trim())),
        None => (body, None),
    };
    let (namespace, key) = match head.split_once(':') {
        Some((namespace, key)) => (Some(namespace.trim()), key.trim()),
        None => (None, head.trim()),
    };
    if key.is_empty() {
        return None;
    }
    Some(Directive {
        namespace,
        key,
        value,
    })
}

/// Directives from `lines` addressed to `namespace` (or to nobody in particular).
pub fn directives<'a>(
    lines: &'a [String],
    namespace: &'a str,
) -> impl Iterator<Item = Directive<'a>> + 'a {
    lines
        .iter()
        .filter_map(|line| parse(line))
        .filter(move |directive| directive.namespace.map_or(true, |ns| ns == namespace))
}

pub fn has_flag(lines: &[String], namespace: &str, key: &str) -> bool {
    directives(lines, namespace).any(|directive| directive.key == key)
}

pub fn value<'a>(lines: &'a [String], namespace: &'a str, key: &str) -> Option<&'a str> {
    directives(lines, namespace)
        .filter(|directive| directive.key == key)
        .find_map(|directive| directive.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn parses_namespaced_key_value() {
        let directive = parse("+reference-gen:alias-name=string").unwrap();
        assert_eq!(directive.namespace, Some("reference-gen"));
        assert_eq!(directive.key, "alias-name");
        assert_eq!(directive.value, Some("string"));
    }

    #[test]
    fn plain_text_is_not_a_directive() {
        assert!(parse("Name is the name.").is_none());
        assert!(!is_directive("a + b"));
        assert!(is_directive("  +optional"));
    }

    #[test]
    fn foreign_namespaces_are_ignored() {
        let comments = lines(&["+kubebuilder:optional", "+other:alias-name=int"]);
        assert!(!has_flag(&comments, "reference-gen", OPTIONAL));
        assert_eq!(value(&comments, "reference-gen", ALIAS_NAME), None);
    }

    #[test]
    fn bare_and_matching_directives_apply() {
        let comments = lines(&["Docs.", "+optional", "+reference-gen:alias-name=string"]);
        assert!(has_flag(&comments, "reference-gen", OPTIONAL));
        assert_eq!(value(&comments, "reference-gen", ALIAS_NAME), Some("string"));
    }
}
