//! Which types and members get documented, and how their prose is cleaned.

use refdoc_model::directives::{self, OPTIONAL};
use refdoc_model::{Member, Type};

/// Identifiers starting with a lowercase letter are unexported.
pub fn is_hidden(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_lowercase)
}

/// Members that produce table rows. Embedded members stay regardless of
/// their name because their fields are flattened into the parent.
pub fn visible_members(members: &[Member]) -> Vec<&Member> {
    members
        .iter()
        .filter(|member| member.embedded || !is_hidden(&member.name))
        .collect()
}

pub fn visible_types<'a, I>(types: I) -> Vec<&'a Type>
where
    I: IntoIterator<Item = &'a Type>,
{
    types
        .into_iter()
        .filter(|ty| !is_hidden(&ty.name.name))
        .collect()
}

pub fn is_optional(member: &Member, namespace: &str) -> bool {
    directives::has_flag(&member.comment_lines, namespace, OPTIONAL)
}

/// Serialized field name: the `json` tag, then the `yaml` tag, then the
/// declared name.
pub fn resolved_field_name(member: &Member) -> String {
    ["json", "yaml"]
        .into_iter()
        .filter_map(|key| lookup_tag(&member.tags, key))
        .filter_map(|value| {
            let name = value.split(',').next().unwrap_or_default();
            (!name.is_empty() && name != "-").then(|| name.to_owned())
        })
        .next()
        .unwrap_or_else(|| member.name.clone())
}

/// Look up `key` in a conventional `key:"value" other:"value"` struct tag.
pub fn lookup_tag(tags: &str, key: &str) -> Option<String> {
    let mut rest = tags;
    loop {
        rest = rest.trim_start_matches(' ');
        if rest.is_empty() {
            return None;
        }

        let name_len = rest
            .find(|c: char| c <= ' ' || c == ':' || c == '"' || c == '\x7f')
            .unwrap_or(rest.len());
        if name_len == 0 {
            return None;
        }
        let name = &rest[..name_len];
        rest = rest[name_len..].strip_prefix(":\"")?;

        let (value, remainder) = quoted_value(rest)?;
        if name == key {
            return Some(value);
        }
        rest = remainder;
    }
}

/// Read a double-quoted value whose opening quote is already consumed.
fn quoted_value(input: &str) -> Option<(String, &str)> {
    let mut value = String::new();
    let mut chars = input.char_indices();
    while let Some((index, c)) = chars.next() {
        match c {
            '"' => return Some((value, &input[index + 1..])),
            '\\' => {
                let (_, escaped) = chars.next()?;
                match escaped {
                    'n' => value.push('\n'),
                    't' => value.push('\t'),
                    other => value.push(other),
                }
            }
            other => value.push(other),
        }
    }
    None
}

/// Comment lines without directives and without surrounding blank lines.
pub fn strip_directives(lines: &[String]) -> Vec<&str> {
    let kept: Vec<&str> = lines
        .iter()
        .map(String::as_str)
        .filter(|line| !directives::is_directive(line))
        .collect();

    let start = kept.iter().position(|line| !line.trim().is_empty());
    let end = kept.iter().rposition(|line| !line.trim().is_empty());
    match (start, end) {
        (Some(start), Some(end)) => kept[start..=end].to_vec(),
        _ => Vec::new(),
    }
}

/// Prose for a type's description block.
pub fn join_lf(lines: &[String]) -> String {
    strip_directives(lines).join("\n")
}

/// Prose for a single table cell.
pub fn join_br(lines: &[String]) -> String {
    strip_directives(lines)
        .into_iter()
        .map(|line| line.trim().replace('|', "\\|"))
        .collect::<Vec<_>>()
        .join("<br/>")
}

#[cfg(test)]
mod tests {
    use super::*;
    use refdoc_model::TypeName;

    fn member(name: &str, tags: &str) -> Member {
        Member::new(name, TypeName::local("string")).with_tags(tags)
    }

    fn lines(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|line| line.to_string()).collect()
    }

    #[test]
    fn lowercase_names_are_hidden() {
        assert!(is_hidden("privateField"));
        assert!(!is_hidden("Name"));
        assert!(!is_hidden(""));
        assert!(!is_hidden("_underscore"));
    }

    #[test]
    fn json_tag_wins_over_yaml_and_name() {
        let both = member("Name", r#"yaml:"yamlName" json:"jsonName,omitempty""#);
        assert_eq!(resolved_field_name(&both), "jsonName");
        assert_eq!(resolved_field_name(&member("Name", r#"yaml:"only""#)), "only");
        assert_eq!(resolved_field_name(&member("Name", "")), "Name");
    }

    #[test]
    fn skipped_and_empty_tag_names_fall_through() {
        assert_eq!(resolved_field_name(&member("Name", r#"json:"-""#)), "Name");
        assert_eq!(
            resolved_field_name(&member("Name", r#"json:",omitempty" yaml:"fromYaml""#)),
            "fromYaml"
        );
    }

    #[test]
    fn tag_lookup_handles_escapes_and_malformed_input() {
        assert_eq!(lookup_tag(r#"a:"x\"y" b:"z""#, "b").as_deref(), Some("z"));
        assert_eq!(lookup_tag(r#"a:"x\"y""#, "a").as_deref(), Some("x\"y"));
        assert_eq!(lookup_tag("json:unquoted", "json"), None);
        assert_eq!(lookup_tag(r#"json:"unterminated"#, "json"), None);
    }

    #[test]
    fn embedded_members_are_always_visible() {
        let members = vec![
            member("Visible", ""),
            member("hidden", ""),
            member("inlined", "").embedded(),
        ];
        let names: Vec<_> = visible_members(&members)
            .into_iter()
            .map(|member| member.name.as_str())
            .collect();
        assert_eq!(names, vec!["Visible", "inlined"]);
    }

    #[test]
    fn directives_never_reach_prose() {
        let comments = lines(&["", "+optional", "First line.", "  +reference-gen:x", "Second line.", ""]);
        assert_eq!(join_lf(&comments), "First line.\nSecond line.");
        assert_eq!(join_br(&comments), "First line.<br/>Second line.");
    }

    #[test]
    fn cell_prose_escapes_pipes() {
        let comments = lines(&["either a | b"]);
        assert_eq!(join_br(&comments), "either a \\| b");
    }

    #[test]
    fn optional_directive_is_namespace_aware() {
        let optional = member("Name", "").with_comments(["+optional"]);
        let foreign = member("Name", "").with_comments(["+other:optional"]);
        assert!(is_optional(&optional, "reference-gen"));
        assert!(!is_optional(&foreign, "reference-gen"));
    }
}
