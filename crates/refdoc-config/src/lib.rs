//! Configuration primitives and loader for refdoc.
//!
//! Settings resolve through a precedence stack:
//! override file → working directory → git root → built-in defaults.
//! Later layers replace earlier values field by field; the display alias
//! table merges key by key. Relative paths resolve against the directory of
//! the file that set them.

use std::collections::BTreeMap;
use std::env;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = ".refdoc.toml";

const DEFAULT_DIRECTIVE_NAMESPACE: &str = "reference-gen";

/// Complete configuration resolved from defaults and on-disk overrides.
#[derive(Clone, Debug)]
pub struct Config {
    pub generator: GeneratorSettings,
    pub model: ModelSettings,
    pub display: DisplaySettings,
    pub sources: ConfigSources,
}

/// What to document and where the output goes.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GeneratorSettings {
    pub package: Option<String>,
    pub types: Vec<String>,
    pub header_file: Option<PathBuf>,
    pub template_dir: Option<PathBuf>,
    pub out_file: Option<PathBuf>,
}

/// Where type model documents are looked up.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSettings {
    pub root: PathBuf,
}

/// Naming rules handed to the display resolver.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplaySettings {
    pub directive_namespace: String,
    pub aliases: BTreeMap<String, String>,
}

/// Provenance information for resolved configuration.
#[derive(Clone, Debug)]
pub struct ConfigSources {
    pub working_directory: PathBuf,
    pub layers: Vec<ConfigSource>,
}

/// Specific layer of configuration (default/git/local/override).
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConfigSource {
    pub kind: ConfigSourceKind,
    pub path: Option<PathBuf>,
    pub base_dir: PathBuf,
}

impl ConfigSource {
    fn default(base_dir: PathBuf) -> Self {
        ConfigSource {
            kind: ConfigSourceKind::Default,
            path: None,
            base_dir,
        }
    }

    fn for_file(kind: ConfigSourceKind, path: PathBuf) -> Self {
        let base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        ConfigSource {
            kind,
            path: Some(path),
            base_dir,
        }
    }

    fn describe(&self) -> String {
        match (&self.kind, &self.path) {
            (ConfigSourceKind::Default, _) => "built-in defaults".to_owned(),
            (kind, Some(path)) => format!("{} at {}", kind, path.display()),
            (kind, None) => kind.to_string(),
        }
    }
}

/// Kinds of configuration sources, ordered from lowest to highest precedence.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigSourceKind {
    Default,
    GitRoot,
    Local,
    Override,
}

impl fmt::Display for ConfigSourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ConfigSourceKind::Default => "defaults",
            ConfigSourceKind::GitRoot => "git-root config",
            ConfigSourceKind::Local => "local config",
            ConfigSourceKind::Override => "override config",
        };
        f.write_str(label)
    }
}

/// Loader options, typically supplied by the CLI layer.
#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub override_path: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
}

impl LoadOptions {
    pub fn with_override_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.override_path = Some(path.into());
        self
    }

    pub fn with_working_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(path.into());
        self
    }
}

/// Errors surfaced while loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to resolve working directory {attempted}: {source}")]
    WorkingDirectory {
        attempted: PathBuf,
        source: io::Error,
    },
    #[error("override config {path} not found")]
    OverrideNotFound { path: PathBuf },
    #[error("failed to read config {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("configuration validation failed:\n{0}")]
    Validation(ConfigValidationErrors),
}

impl Config {
    /// Loads configuration using the precedence rules and returns typed settings.
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let working_dir = resolve_working_dir(options.working_dir)?;
        let override_path = options
            .override_path
            .map(|path| make_absolute(&path, &working_dir));

        if let Some(path) = &override_path {
            if !path.exists() {
                return Err(ConfigError::OverrideNotFound { path: path.clone() });
            }
        }

        let default_source = ConfigSource::default(working_dir.clone());
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(default_source.clone()));

        let mut source_layers = vec![default_source];

        let git_root = find_git_root(&working_dir);
        let git_config_path = git_root.as_ref().map(|root| root.join(CONFIG_FILE_NAME));
        let local_config_path = working_dir.join(CONFIG_FILE_NAME);

        if let Some(path) = git_config_path.as_ref() {
            if path.exists() && Some(path) != override_path.as_ref() && path != &local_config_path {
                let source = ConfigSource::for_file(ConfigSourceKind::GitRoot, path.clone());
                merged.merge(load_layer(path, source.clone())?);
                source_layers.push(source);
            }
        }

        if local_config_path.exists() && Some(&local_config_path) != override_path.as_ref() {
            let source = ConfigSource::for_file(ConfigSourceKind::Local, local_config_path.clone());
            merged.merge(load_layer(&local_config_path, source.clone())?);
            source_layers.push(source);
        }

        if let Some(path) = override_path {
            let source = ConfigSource::for_file(ConfigSourceKind::Override, path.clone());
            merged.merge(load_layer(&path, source.clone())?);
            source_layers.push(source);
        }

        let config = merged.finalize().map_err(ConfigError::Validation)?;
        Ok(Config {
            generator: config.generator,
            model: config.model,
            display: config.display,
            sources: ConfigSources {
                working_directory: working_dir,
                layers: source_layers,
            },
        })
    }
}

fn resolve_working_dir(override_dir: Option<PathBuf>) -> Result<PathBuf, ConfigError> {
    match override_dir {
        Some(path) => fs::canonicalize(&path).map_err(|source| ConfigError::WorkingDirectory {
            attempted: path,
            source,
        }),
        None => env::current_dir().map_err(|source| ConfigError::WorkingDirectory {
            attempted: PathBuf::from("."),
            source,
        }),
    }
}

fn make_absolute(path: &Path, base: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

fn load_layer(path: &Path, source: ConfigSource) -> Result<PartialConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.into(),
        source,
    })?;
    let raw: RawConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.into(),
        source,
    })?;
    Ok(raw.into_partial(source))
}

fn defaults_layer(source: ConfigSource) -> PartialConfig {
    let model = ModelPartial {
        root: Some(Located::new(PathBuf::from("."), source.clone())),
    };

    let display = DisplayPartial {
        directive_namespace: Some(Located::new(
            DEFAULT_DIRECTIVE_NAMESPACE.to_owned(),
            source.clone(),
        )),
        aliases: BTreeMap::from([(
            "time.Duration".to_owned(),
            Located::new("duration".to_owned(), source),
        )]),
    };

    PartialConfig {
        generator: None,
        model: Some(model),
        display: Some(display),
    }
}

fn find_git_root(start: &Path) -> Option<PathBuf> {
    let mut current = Some(start);
    while let Some(dir) = current {
        if dir.join(".git").exists() {
            return Some(dir.to_path_buf());
        }
        current = dir.parent();
    }
    None
}

#[derive(Clone, Debug, Default)]
struct PartialConfig {
    generator: Option<GeneratorPartial>,
    model: Option<ModelPartial>,
    display: Option<DisplayPartial>,
}

impl PartialConfig {
    fn merge(&mut self, mut other: PartialConfig) {
        if let Some(other_generator) = other.generator.take() {
            match &mut self.generator {
                Some(generator) => generator.merge(other_generator),
                None => self.generator = Some(other_generator),
            }
        }

        if let Some(other_model) = other.model.take() {
            match &mut self.model {
                Some(model) => model.merge(other_model),
                None => self.model = Some(other_model),
            }
        }

        if let Some(other_display) = other.display.take() {
            match &mut self.display {
                Some(display) => display.merge(other_display),
                None => self.display = Some(other_display),
            }
        }
    }

    fn finalize(self) -> Result<ResolvedConfig, ConfigValidationErrors> {
        let mut errors = Vec::new();

        let generator_partial = self.generator.unwrap_or_default();

        let package = generator_partial.package.and_then(|located| {
            let value = located.value.trim().to_owned();
            if value.is_empty() {
                errors.push(
                    ConfigValidationError::new(
                        Some(located.source),
                        "package must not be empty".to_owned(),
                    )
                    .with_context("generator.package"),
                );
                None
            } else {
                Some(value)
            }
        });

        let types = match generator_partial.types {
            Some(located) => {
                if located.value.iter().any(|name| name.trim().is_empty()) {
                    errors.push(
                        ConfigValidationError::new(
                            Some(located.source.clone()),
                            "type names must not be empty".to_owned(),
                        )
                        .with_context("generator.types"),
                    );
                }
                located
                    .value
                    .into_iter()
                    .map(|name| name.trim().to_owned())
                    .filter(|name| !name.is_empty())
                    .collect()
            }
            None => Vec::new(),
        };

        let generator = GeneratorSettings {
            package,
            types,
            header_file: generator_partial.header_file.as_ref().map(resolve_path),
            template_dir: generator_partial.template_dir.as_ref().map(resolve_path),
            out_file: generator_partial.out_file.as_ref().map(resolve_path),
        };

        let model_partial = self.model.unwrap_or_default();
        let model_root = model_partial.root.unwrap_or_else(|| {
            Located::new(
                PathBuf::from("."),
                ConfigSource::default(PathBuf::from(".")),
            )
        });
        let model = ModelSettings {
            root: resolve_path(&model_root),
        };

        let display_partial = self.display.unwrap_or_default();
        let namespace = display_partial.directive_namespace.unwrap_or_else(|| {
            Located::new(
                DEFAULT_DIRECTIVE_NAMESPACE.to_owned(),
                ConfigSource::default(PathBuf::from(".")),
            )
        });
        if !is_valid_namespace(&namespace.value) {
            errors.push(
                ConfigValidationError::new(
                    Some(namespace.source.clone()),
                    format!(
                        "invalid directive namespace '{}': expected a non-empty name without ':', '=' or whitespace",
                        namespace.value
                    ),
                )
                .with_context("display.directive_namespace"),
            );
        }

        let mut aliases = BTreeMap::new();
        for (qualified, located) in display_partial.aliases {
            if qualified.trim().is_empty() || located.value.trim().is_empty() {
                errors.push(
                    ConfigValidationError::new(
                        Some(located.source),
                        format!("alias '{qualified}' = '{}' must name both sides", located.value),
                    )
                    .with_context("display.aliases"),
                );
                continue;
            }
            aliases.insert(qualified, located.value);
        }

        let display = DisplaySettings {
            directive_namespace: namespace.value,
            aliases,
        };

        if errors.is_empty() {
            Ok(ResolvedConfig {
                generator,
                model,
                display,
            })
        } else {
            Err(ConfigValidationErrors(errors))
        }
    }
}

fn is_valid_namespace(value: &str) -> bool {
    !value.is_empty()
        && !value
            .chars()
            .any(|c| c == ':' || c == '=' || c.is_whitespace())
}

#[derive(Clone, Debug, Default)]
struct GeneratorPartial {
    package: Option<Located<String>>,
    types: Option<Located<Vec<String>>>,
    header_file: Option<Located<PathBuf>>,
    template_dir: Option<Located<PathBuf>>,
    out_file: Option<Located<PathBuf>>,
}

impl GeneratorPartial {
    fn merge(&mut self, other: GeneratorPartial) {
        if other.package.is_some() {
            self.package = other.package;
        }
        if other.types.is_some() {
            self.types = other.types;
        }
        if other.header_file.is_some() {
            self.header_file = other.header_file;
        }
        if other.template_dir.is_some() {
            self.template_dir = other.template_dir;
        }
        if other.out_file.is_some() {
            self.out_file = other.out_file;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct ModelPartial {
    root: Option<Located<PathBuf>>,
}

impl ModelPartial {
    fn merge(&mut self, other: ModelPartial) {
        if other.root.is_some() {
            self.root = other.root;
        }
    }
}

#[derive(Clone, Debug, Default)]
struct DisplayPartial {
    directive_namespace: Option<Located<String>>,
    aliases: BTreeMap<String, Located<String>>,
}

impl DisplayPartial {
    fn merge(&mut self, other: DisplayPartial) {
        if other.directive_namespace.is_some() {
            self.directive_namespace = other.directive_namespace;
        }
        self.aliases.extend(other.aliases);
    }
}

#[derive(Clone, Debug)]
struct Located<T> {
    value: T,
    source: ConfigSource,
}

impl<T> Located<T> {
    fn new(value: T, source: ConfigSource) -> Self {
        Located { value, source }
    }
}

fn resolve_path(located: &Located<PathBuf>) -> PathBuf {
    let path = &located.value;
    if path.is_absolute() {
        path.clone()
    } else {
        located.source.base_dir.join(path)
    }
}

#[derive(Clone, Debug)]
struct ResolvedConfig {
    generator: GeneratorSettings,
    model: ModelSettings,
    display: DisplaySettings,
}

/// Container for validation failures, formatted as a bullet list.
#[derive(Debug)]
pub struct ConfigValidationErrors(pub Vec<ConfigValidationError>);

impl fmt::Display for ConfigValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (idx, err) in self.0.iter().enumerate() {
            if idx > 0 {
                writeln!(f)?;
            }
            write!(f, "- {err}")?;
        }
        Ok(())
    }
}

impl ConfigValidationErrors {
    pub fn iter(&self) -> impl Iterator<Item = &ConfigValidationError> {
        self.0.iter()
    }
}

/// Validation failure with optional provenance.
#[derive(Clone, Debug)]
pub struct ConfigValidationError {
    pub source: Option<ConfigSource>,
    pub message: String,
    pub context: Option<String>,
}

impl ConfigValidationError {
    fn new(source: Option<ConfigSource>, message: String) -> Self {
        ConfigValidationError {
            source,
            message,
            context: None,
        }
    }

    fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }
}

impl fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(context) = &self.context {
            write!(f, "{}: {}", context, self.message)?;
        } else {
            write!(f, "{}", self.message)?;
        }
        if let Some(source) = &self.source {
            write!(f, " ({})", source.describe())?;
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    #[serde(default)]
    generator: Option<RawGenerator>,
    #[serde(default)]
    model: Option<RawModel>,
    #[serde(default)]
    display: Option<RawDisplay>,
}

impl RawConfig {
    fn into_partial(self, source: ConfigSource) -> PartialConfig {
        PartialConfig {
            generator: self
                .generator
                .map(|generator| generator.into_partial(source.clone())),
            model: self.model.map(|model| model.into_partial(source.clone())),
            display: self.display.map(|display| display.into_partial(source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawGenerator {
    #[serde(default)]
    package: Option<String>,
    #[serde(default)]
    types: Option<Vec<String>>,
    #[serde(default)]
    header_file: Option<PathBuf>,
    #[serde(default)]
    template_dir: Option<PathBuf>,
    #[serde(default)]
    out_file: Option<PathBuf>,
}

impl RawGenerator {
    fn into_partial(self, source: ConfigSource) -> GeneratorPartial {
        GeneratorPartial {
            package: self.package.map(|value| Located::new(value, source.clone())),
            types: self.types.map(|value| Located::new(value, source.clone())),
            header_file: self
                .header_file
                .map(|value| Located::new(value, source.clone())),
            template_dir: self
                .template_dir
                .map(|value| Located::new(value, source.clone())),
            out_file: self.out_file.map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawModel {
    #[serde(default)]
    root: Option<PathBuf>,
}

impl RawModel {
    fn into_partial(self, source: ConfigSource) -> ModelPartial {
        ModelPartial {
            root: self.root.map(|value| Located::new(value, source)),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawDisplay {
    #[serde(default)]
    directive_namespace: Option<String>,
    #[serde(default)]
    aliases: BTreeMap<String, String>,
}

impl RawDisplay {
    fn into_partial(self, source: ConfigSource) -> DisplayPartial {
        DisplayPartial {
            directive_namespace: self
                .directive_namespace
                .map(|value| Located::new(value, source.clone())),
            aliases: self
                .aliases
                .into_iter()
                .map(|(key, value)| (key, Located::new(value, source.clone())))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> ConfigSource {
        ConfigSource::for_file(ConfigSourceKind::Local, PathBuf::from("/work/.refdoc.toml"))
    }

    fn parse(contents: &str) -> PartialConfig {
        let raw: RawConfig = toml::from_str(contents).unwrap();
        raw.into_partial(source())
    }

    #[test]
    fn relative_paths_resolve_against_their_layer() {
        let mut merged = PartialConfig::default();
        merged.merge(defaults_layer(ConfigSource::default(PathBuf::from("/cwd"))));
        merged.merge(parse(
            r#"
            [generator]
            out_file = "docs/reference.md"
            [model]
            root = "models"
            "#,
        ));
        let resolved = merged.finalize().unwrap();
        assert_eq!(
            resolved.generator.out_file,
            Some(PathBuf::from("/work/docs/reference.md"))
        );
        assert_eq!(resolved.model.root, PathBuf::from("/work/models"));
    }

    #[test]
    fn namespaces_with_separators_are_rejected() {
        let mut merged = parse("[display]\ndirective_namespace = \"a:b\"\n");
        merged.merge(parse("[generator]\npackage = \"  \"\n"));
        let errors = merged.finalize().unwrap_err();
        let contexts: Vec<_> = errors
            .iter()
            .filter_map(|err| err.context.as_deref())
            .collect();
        assert_eq!(
            contexts,
            vec!["generator.package", "display.directive_namespace"]
        );
    }

    #[test]
    fn validation_errors_name_their_layer() {
        let errors = parse("[display.aliases]\n\"time.Duration\" = \"\"\n")
            .finalize()
            .unwrap_err();
        let rendered = errors.to_string();
        assert!(rendered.starts_with("- display.aliases:"));
        assert!(rendered.contains("local config at /work/.refdoc.toml"));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        assert!(toml::from_str::<RawConfig>("[generator]\npackages = \"x\"\n").is_err());
    }
}
