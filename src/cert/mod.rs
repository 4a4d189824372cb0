//! Certificate generation module.
//!
//! A self-signed RSA root CA, leaf certificates signed by it, and the
//! parsing and verification needed to check the result.

pub mod builder;
pub mod ca;
pub mod inspect;
pub mod leaf;
pub mod loader;
pub mod verify;
