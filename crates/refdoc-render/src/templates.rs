use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tera::Tera;
use tracing::debug;

use crate::error::RenderError;
use crate::functions::FILTER_NAMES;

pub const TEMPLATE_EXTENSION: &str = "tera";

/// Built-in templates by name. `package` is the entry point; the others
/// define a macro each and may be replaced individually.
pub const BUILTIN_TEMPLATES: [(&str, &str); 5] = [
    ("package", include_str!("templates/package.tera")),
    ("type", include_str!("templates/type.tera")),
    ("members", include_str!("templates/members.tera")),
    (
        "members_with_embed",
        include_str!("templates/members_with_embed.tera"),
    ),
    ("member", include_str!("templates/member.tera")),
];

/// Global functions Tera provides out of the box.
const BUILTIN_FUNCTIONS: &[&str] = &["range", "now", "throw", "get_random", "get_env", "super"];

const BUILTIN_FILTERS: &[&str] = &[
    "abs", "addslashes", "as_str", "capitalize", "concat", "date", "default", "escape",
    "escape_xml", "filesizeformat", "filter", "first", "float", "get", "group_by", "indent",
    "int", "join", "json_encode", "last", "length", "linebreaksbr", "lower", "map", "nth",
    "pluralize", "replace", "reverse", "round", "safe", "slice", "slugify", "sort", "spaceless",
    "split", "striptags", "title", "trim", "trim_end", "trim_end_matches", "trim_start",
    "trim_start_matches", "truncate", "unique", "upper", "urlencode", "urlencode_strict",
    "wordcount",
];

const KEYWORDS: &[&str] = &[
    "and", "as", "block", "elif", "else", "endblock", "endfilter", "endfor", "endif",
    "endmacro", "extends", "false", "filter", "for", "if", "ignore", "import", "in", "include",
    "is", "macro", "missing", "not", "or", "raw", "set", "set_global", "true", "with",
];

/// The five templates in effect for a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TemplateSet {
    sources: BTreeMap<String, String>,
    overridden: Vec<PathBuf>,
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TemplateSet {
    pub fn builtin() -> Self {
        TemplateSet {
            sources: BUILTIN_TEMPLATES
                .iter()
                .map(|(name, source)| ((*name).to_owned(), (*source).to_owned()))
                .collect(),
            overridden: Vec::new(),
        }
    }

    /// Built-in templates, with every `*.tera` file in `dir` replacing the
    /// template of the same stem.
    pub fn load(dir: Option<&Path>) -> Result<Self, RenderError> {
        let mut set = Self::builtin();
        if let Some(dir) = dir {
            set.apply_overrides(dir)?;
        }
        set.validate()?;
        Ok(set)
    }

    fn apply_overrides(&mut self, dir: &Path) -> Result<(), RenderError> {
        let entries = fs::read_dir(dir).map_err(|source| RenderError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut paths = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| RenderError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
            let path = entry.path();
            if path.is_file()
                && path.extension().and_then(|ext| ext.to_str()) == Some(TEMPLATE_EXTENSION)
            {
                paths.push(path);
            }
        }
        paths.sort();

        for path in paths {
            let stem = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .to_owned();
            if !self.sources.contains_key(&stem) {
                return Err(RenderError::UnknownTemplate {
                    path,
                    expected: self.names().collect::<Vec<_>>().join(", "),
                });
            }
            let source = fs::read_to_string(&path).map_err(|source| RenderError::Io {
                path: path.clone(),
                source,
            })?;
            debug!(template = %stem, path = %path.display(), "overriding built-in template");
            self.sources.insert(stem, source);
            self.overridden.push(path);
        }
        Ok(())
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn source(&self, name: &str) -> Option<&str> {
        self.sources.get(name).map(String::as_str)
    }

    /// Override files applied on top of the built-in set.
    pub fn overridden(&self) -> &[PathBuf] {
        &self.overridden
    }

    /// Parse every template and reject calls to functions that will not
    /// exist at render time.
    pub fn validate(&self) -> Result<(), RenderError> {
        self.compile()?;
        for (name, source) in &self.sources {
            if let Some(function) = undefined_calls(source).into_iter().next() {
                return Err(RenderError::UndefinedFunction {
                    template: name.clone(),
                    function,
                });
            }
        }
        Ok(())
    }

    /// A Tera instance holding every template, without filters registered.
    pub(crate) fn compile(&self) -> Result<Tera, RenderError> {
        let mut tera = Tera::default();
        tera.autoescape_on(Vec::new());
        tera.add_raw_templates(
            self.sources
                .iter()
                .map(|(name, source)| (name.as_str(), source.as_str())),
        )
        .map_err(|err| RenderError::syntax(&self.describe_failure(&err), err))?;
        Ok(tera)
    }

    fn describe_failure(&self, err: &tera::Error) -> String {
        let message = err.to_string();
        self.names()
            .find(|name| message.contains(&format!("'{name}'")))
            .unwrap_or("templates")
            .to_owned()
    }
}

/// Names used as filters or called as functions that are neither registered
/// by the renderer nor provided by Tera.
fn undefined_calls(source: &str) -> Vec<String> {
    let mut undefined = Vec::new();
    for body in tag_bodies(source) {
        for call in calls_in(body) {
            let known = match call {
                Call::Filter(name) => {
                    FILTER_NAMES.contains(&name) || BUILTIN_FILTERS.contains(&name)
                }
                Call::Function(name) => BUILTIN_FUNCTIONS.contains(&name),
            };
            if !known && !undefined.iter().any(|seen| seen == call.name()) {
                undefined.push(call.name().to_owned());
            }
        }
    }
    undefined
}

/// Contents of every `{{ }}` and `{% %}` tag, outside `raw` blocks.
fn tag_bodies(source: &str) -> Vec<&str> {
    let mut bodies = Vec::new();
    let mut rest = source;
    let mut in_raw = false;
    while let Some(start) = rest.find('{') {
        let after = &rest[start..];
        let close = if after.starts_with("{{") {
            "}}"
        } else if after.starts_with("{%") {
            "%}"
        } else if after.starts_with("{#") {
            "#}"
        } else {
            rest = &rest[start + 1..];
            continue;
        };
        let Some(end) = after[2..].find(close) else {
            break;
        };
        let body = &after[2..2 + end];
        rest = &after[2 + end + 2..];
        if close == "#}" {
            continue;
        }

        let keyword = body.trim_matches(|c: char| c == '-' || c.is_whitespace());
        if close == "%}" && keyword == "raw" {
            in_raw = true;
        } else if close == "%}" && keyword == "endraw" {
            in_raw = false;
        } else if !in_raw {
            bodies.push(body);
        }
    }
    bodies
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Call<'a> {
    Filter(&'a str),
    Function(&'a str),
}

impl<'a> Call<'a> {
    fn name(&self) -> &'a str {
        match self {
            Call::Filter(name) | Call::Function(name) => name,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Previous<'a> {
    Start,
    Pipe,
    Path,
    Word(&'a str),
    Other,
}

fn calls_in(body: &str) -> Vec<Call<'_>> {
    let bytes = body.as_bytes();
    let mut calls = Vec::new();
    let mut previous = Previous::Start;
    let mut before_previous = Previous::Start;
    let mut index = 0;

    while index < bytes.len() {
        let byte = bytes[index];
        match byte {
            b'"' | b'\'' | b'`' => {
                index += 1;
                while index < bytes.len() && bytes[index] != byte {
                    index += 1;
                }
                index += 1;
                before_previous = previous;
                previous = Previous::Other;
            }
            b if b.is_ascii_whitespace() => index += 1,
            b'|' => {
                index += 1;
                before_previous = previous;
                previous = Previous::Pipe;
            }
            b'.' => {
                index += 1;
                before_previous = previous;
                previous = Previous::Path;
            }
            b':' if bytes.get(index + 1) == Some(&b':') => {
                index += 2;
                before_previous = previous;
                previous = Previous::Path;
            }
            b if b.is_ascii_alphabetic() || b == b'_' => {
                let start = index;
                while index < bytes.len()
                    && (bytes[index].is_ascii_alphanumeric() || bytes[index] == b'_')
                {
                    index += 1;
                }
                let word = &body[start..index];
                let next = body[index..].trim_start().chars().next();

                let is_test = matches!(previous, Previous::Word("is"))
                    || (matches!(previous, Previous::Word("not"))
                        && matches!(before_previous, Previous::Word("is")));
                let after_keyword =
                    matches!(previous, Previous::Word("macro") | Previous::Word("block"));

                if previous == Previous::Pipe || matches!(previous, Previous::Word("filter")) {
                    calls.push(Call::Filter(word));
                } else if next == Some('(')
                    && previous != Previous::Path
                    && !is_test
                    && !after_keyword
                    && !KEYWORDS.contains(&word)
                {
                    calls.push(Call::Function(word));
                }

                before_previous = previous;
                previous = Previous::Word(word);
            }
            _ => {
                index += 1;
                before_previous = previous;
                previous = Previous::Other;
            }
        }
    }
    calls
}
