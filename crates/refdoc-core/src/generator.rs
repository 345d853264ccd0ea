use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use refdoc_config::Config;
use refdoc_graph::{ReferenceGraph, RequestedSet};
use refdoc_model::TypeModelProvider;
use refdoc_render::{DisplayOptions, Renderer, TemplateSet};
use refdoc_utils::{atomic_write, read_if_exists};
use tracing::{debug, info};

use crate::diff::build_unified_diff;
use crate::error::{GeneratorError, GeneratorResult};

/// Everything needed to produce one reference document.
#[derive(Clone, Debug, Default)]
pub struct GeneratorOptions {
    pub package: String,
    pub types: RequestedSet,
    pub header_file: Option<PathBuf>,
    pub template_dir: Option<PathBuf>,
    pub out_file: Option<PathBuf>,
    pub display: DisplayOptions,
}

impl GeneratorOptions {
    pub fn new(package: impl Into<String>) -> Self {
        GeneratorOptions {
            package: package.into(),
            ..GeneratorOptions::default()
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let settings = &config.generator;
        GeneratorOptions {
            package: settings.package.clone().unwrap_or_default(),
            types: settings.types.iter().collect(),
            header_file: settings.header_file.clone(),
            template_dir: settings.template_dir.clone(),
            out_file: settings.out_file.clone(),
            display: DisplayOptions {
                aliases: config.display.aliases.clone(),
                directive_namespace: config.display.directive_namespace.clone(),
            },
        }
    }

    pub fn with_types(mut self, types: RequestedSet) -> Self {
        self.types = types;
        self
    }

    pub fn with_header_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.header_file = Some(path.into());
        self
    }

    pub fn with_template_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.template_dir = Some(path.into());
        self
    }

    pub fn with_out_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.out_file = Some(path.into());
        self
    }
}

/// Result of comparing generated output with the file already on disk.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckOutcome {
    UpToDate,
    Stale { diff: String },
}

/// Loads a package model, filters it to the requested closure, and renders it
/// beneath the configured header.
#[derive(Debug)]
pub struct Generator<P> {
    options: GeneratorOptions,
    provider: P,
    header: Vec<u8>,
    renderer: Renderer,
}

impl<P: TypeModelProvider> Generator<P> {
    /// Validate the options and load templates. Nothing is read from the
    /// provider until [`Generator::generate`].
    pub fn new(options: GeneratorOptions, provider: P) -> GeneratorResult<Self> {
        if options.package.trim().is_empty() {
            return Err(GeneratorError::MissingPackage);
        }

        let header = match &options.header_file {
            Some(path) => fs::read(path).map_err(|source| GeneratorError::HeaderFile {
                path: path.clone(),
                source,
            })?,
            None => Vec::new(),
        };

        if let Some(dir) = &options.template_dir {
            check_template_dir(dir)?;
        }
        let templates = TemplateSet::load(options.template_dir.as_deref())?;
        let renderer = Renderer::new(&templates, options.display.clone())?;

        debug!(
            package = %options.package,
            requested = options.types.len(),
            header_bytes = header.len(),
            "generator configured"
        );

        Ok(Generator {
            options,
            provider,
            header,
            renderer,
        })
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Header bytes followed by the rendered sections.
    pub fn generate(&self) -> GeneratorResult<Vec<u8>> {
        info!(package = %self.options.package, "generating reference");
        let package = self.provider.load(&self.options.package)?;
        let graph = ReferenceGraph::for_documentation(&package, &self.options.types)?;
        let body = self.renderer.render(&package, &graph)?;

        let mut output = Vec::with_capacity(self.header.len() + body.len());
        output.extend_from_slice(&self.header);
        output.extend_from_slice(body.as_bytes());
        Ok(output)
    }

    /// Generate and write to the output file, or to stdout when none is set.
    pub fn run(&self) -> GeneratorResult<()> {
        let output = self.generate()?;
        match &self.options.out_file {
            Some(path) => {
                atomic_write(path, &output).map_err(|source| GeneratorError::Output {
                    path: path.clone(),
                    source,
                })?;
                info!(path = %path.display(), bytes = output.len(), "reference written");
            }
            None => {
                let stdout = io::stdout();
                let mut handle = stdout.lock();
                handle
                    .write_all(&output)
                    .and_then(|()| handle.flush())
                    .map_err(GeneratorError::Stdout)?;
            }
        }
        Ok(())
    }

    /// Compare fresh output with the output file without touching it. A
    /// missing file compares as empty.
    pub fn check(&self) -> GeneratorResult<CheckOutcome> {
        let path = self
            .options
            .out_file
            .as_deref()
            .ok_or(GeneratorError::CheckWithoutOutput)?;
        let output = self.generate()?;
        let existing = read_if_exists(path)
            .map_err(|source| GeneratorError::Output {
                path: path.to_path_buf(),
                source,
            })?
            .unwrap_or_default();

        let original = String::from_utf8_lossy(&existing);
        let modified = String::from_utf8_lossy(&output);
        let label = path.display().to_string();
        match build_unified_diff(&original, &modified, &label) {
            Some(diff) => {
                info!(path = %label, "reference is out of date");
                Ok(CheckOutcome::Stale { diff })
            }
            None => Ok(CheckOutcome::UpToDate),
        }
    }
}

fn check_template_dir(dir: &Path) -> GeneratorResult<()> {
    let invalid = |reason: String| GeneratorError::InvalidTemplateDir {
        path: dir.to_path_buf(),
        reason,
    };
    let metadata = fs::metadata(dir).map_err(|err| invalid(err.to_string()))?;
    if !metadata.is_dir() {
        return Err(invalid("not a directory".to_owned()));
    }
    Ok(())
}
