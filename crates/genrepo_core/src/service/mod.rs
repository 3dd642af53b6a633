//! Use-case services.
//!
//! # Responsibility
//! - Bundle one unit of work with the CRUD surface callers consume.
//! - Keep transport layers free of transaction and SQL details.

pub mod crud_service;
