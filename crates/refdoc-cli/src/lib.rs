use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use refdoc_config::{Config, LoadOptions};
use refdoc_core::{CheckOutcome, ExitCode, Generator, GeneratorError, GeneratorOptions};
use refdoc_graph::RequestedSet;
use refdoc_model::JsonModelProvider;
use tracing::debug;
use tracing_subscriber::EnvFilter;

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut load = LoadOptions::default();
    if let Some(path) = &cli.config {
        load = load.with_override_path(path);
    }
    let config = match Config::load(load) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("refdoc error: {err}");
            return Ok(ExitCode::Config as i32);
        }
    };
    debug!(layers = config.sources.layers.len(), "configuration loaded");

    let model_root = cli
        .model_root
        .clone()
        .unwrap_or_else(|| config.model.root.clone());
    let options = cli.apply(GeneratorOptions::from_config(&config));
    let check = cli.check;

    match execute(options, JsonModelProvider::new(model_root), check) {
        Ok(code) => Ok(code as i32),
        Err(err) => {
            eprintln!("refdoc error: {err}");
            Ok(err.exit_code() as i32)
        }
    }
}

fn execute(
    options: GeneratorOptions,
    provider: JsonModelProvider,
    check: bool,
) -> Result<ExitCode, GeneratorError> {
    let generator = Generator::new(options, provider)?;
    if !check {
        generator.run()?;
        return Ok(ExitCode::Success);
    }

    match generator.check()? {
        CheckOutcome::UpToDate => Ok(ExitCode::Success),
        CheckOutcome::Stale { diff } => {
            print!("{diff}");
            if !diff.ends_with('\n') {
                println!();
            }
            Ok(ExitCode::CheckMismatch)
        }
    }
}

const LOG_TARGETS: &[&str] = &[
    "refdoc_cli",
    "refdoc_core",
    "refdoc_graph",
    "refdoc_model",
    "refdoc_render",
];

/// `RUST_LOG` wins; otherwise refdoc crates log at info, or debug with `-v`.
fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives: Vec<String> = LOG_TARGETS
            .iter()
            .map(|target| format!("{target}={level}"))
            .collect();
        EnvFilter::new(format!("warn,{}", directives.join(",")))
    });
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Generate markdown reference documentation from a package type model"
)]
struct Cli {
    /// Package whose declared types are documented
    #[arg(long, value_name = "PACKAGE")]
    package: Option<String>,

    /// Only document these types and the types that contain them
    #[arg(
        long = "types",
        value_name = "NAME",
        value_delimiter = ',',
        action = ArgAction::Append
    )]
    types: Vec<String>,

    /// File whose contents are emitted before the generated sections
    #[arg(long, value_name = "PATH")]
    header_file: Option<PathBuf>,

    /// Directory of .tera templates overriding the built-in ones
    #[arg(long, value_name = "DIR")]
    template_dir: Option<PathBuf>,

    /// Write output here instead of stdout
    #[arg(long, value_name = "PATH")]
    out_file: Option<PathBuf>,

    /// Directory holding type model documents
    #[arg(long, value_name = "DIR")]
    model_root: Option<PathBuf>,

    /// Configuration file applied over discovered .refdoc.toml files
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Compare generated output with --out-file and exit 1 on differences
    #[arg(long)]
    check: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    /// Flags win over configuration values.
    fn apply(&self, mut options: GeneratorOptions) -> GeneratorOptions {
        if let Some(package) = &self.package {
            options.package = package.clone();
        }
        if !self.types.is_empty() {
            options.types = self.types.iter().collect::<RequestedSet>();
        }
        if let Some(path) = &self.header_file {
            options.header_file = Some(path.clone());
        }
        if let Some(path) = &self.template_dir {
            options.template_dir = Some(path.clone());
        }
        if let Some(path) = &self.out_file {
            options.out_file = Some(path.clone());
        }
        options
    }
}
