//! Storage module.
//!
//! Everything is persisted as flat PEM files.

pub mod pem_files;
