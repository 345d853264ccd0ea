//! Turns a filtered reference graph into markdown.
//!
//! Templates are Tera sources; the display and visibility rules reach them
//! only through the filters registered in [`functions`]. Default templates
//! ship with the crate and any of them may be replaced from a directory.

pub mod display;
mod error;
pub mod functions;
mod renderer;
mod templates;
pub mod visibility;

pub use display::{DisplayOptions, Resolver, DEFAULT_DIRECTIVE_NAMESPACE};
pub use error::RenderError;
pub use renderer::Renderer;
pub use templates::{TemplateSet, BUILTIN_TEMPLATES, TEMPLATE_EXTENSION};
