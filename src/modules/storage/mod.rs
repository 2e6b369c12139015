//! Storage module for file management
//!
//! Provides local disk storage for uploaded product images, served back to
//! browsers through the static upload route.

mod local_storage;

pub use local_storage::LocalImageStorage;
