use std::io;
use std::path::PathBuf;

use refdoc_model::{ModelError, ProviderError};
use refdoc_render::RenderError;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitCode {
    Success = 0,
    CheckMismatch = 1,
    Config = 2,
    Provider = 3,
    Model = 4,
    Render = 5,
    Io = 6,
}

impl ExitCode {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Success),
            1 => Some(Self::CheckMismatch),
            2 => Some(Self::Config),
            3 => Some(Self::Provider),
            4 => Some(Self::Model),
            5 => Some(Self::Render),
            6 => Some(Self::Io),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("a package to document is required")]
    MissingPackage,

    #[error("template directory {path} is unusable: {reason}")]
    InvalidTemplateDir { path: PathBuf, reason: String },

    #[error("failed to read header file {path}: {source}")]
    HeaderFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("--check requires an output file")]
    CheckWithoutOutput,

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("failed to write {path}: {source}")]
    Output {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write to stdout: {0}")]
    Stdout(#[source] io::Error),
}

impl GeneratorError {
    pub fn exit_code(&self) -> ExitCode {
        match self {
            Self::MissingPackage
            | Self::InvalidTemplateDir { .. }
            | Self::HeaderFile { .. }
            | Self::CheckWithoutOutput => ExitCode::Config,
            Self::Provider(ProviderError::Model { .. }) => ExitCode::Model,
            Self::Provider(_) => ExitCode::Provider,
            Self::Model(_) | Self::Render(RenderError::Model(_)) => ExitCode::Model,
            Self::Render(_) => ExitCode::Render,
            Self::Output { .. } | Self::Stdout(_) => ExitCode::Io,
        }
    }
}

pub type GeneratorResult<T> = Result<T, GeneratorError>;
