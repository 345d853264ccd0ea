use std::error::Error as _;
use std::io;
use std::path::PathBuf;

use refdoc_model::ModelError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to read template {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("template {path} does not replace a built-in template (expected one of: {expected})")]
    UnknownTemplate { path: PathBuf, expected: String },
    #[error("template {name} is invalid: {message}")]
    Syntax { name: String, message: String },
    #[error("template {template} calls undefined function {function}")]
    UndefinedFunction { template: String, function: String },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error("failed to render {template}: {message}")]
    Render { template: String, message: String },
}

impl RenderError {
    /// Convert a Tera rendering failure, surfacing a model error raised by a
    /// filter as itself.
    pub(crate) fn from_render(template: &str, err: tera::Error) -> Self {
        if let Some(model) = find_model_error(&err) {
            return RenderError::Model(model.clone());
        }
        RenderError::Render {
            template: template.to_owned(),
            message: describe(&err),
        }
    }

    pub(crate) fn syntax(name: &str, err: tera::Error) -> Self {
        RenderError::Syntax {
            name: name.to_owned(),
            message: describe(&err),
        }
    }
}

fn find_model_error(err: &tera::Error) -> Option<&ModelError> {
    let mut current: Option<&(dyn std::error::Error + 'static)> = err.source();
    while let Some(cause) = current {
        if let Some(model) = cause.downcast_ref::<ModelError>() {
            return Some(model);
        }
        current = cause.source();
    }
    None
}

/// Tera keeps the useful detail in the source chain; flatten it.
fn describe(err: &tera::Error) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}
