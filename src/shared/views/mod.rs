//! Server-side view rendering.
//!
//! Every page the service returns is a minijinja template under
//! `templates/views/`, named after the operation that renders it.

pub mod engine;

pub use engine::{render, TemplateError};
