//! Modules layer - Infrastructure components for external integrations
//!
//! Contains clients and adapters for external resources like file storage.

pub mod storage;
