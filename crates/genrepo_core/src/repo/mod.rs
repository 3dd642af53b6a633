//! Generic repository contract and its SQLite implementation.
//!
//! # Responsibility
//! - Expose get_all/get/create/update/delete over any `Model`.
//! - Chain metadata resolution, predicate compilation, statement building
//!   and execution through the owning unit of work.
//!
//! # Invariants
//! - Repositories never commit; the unit of work owns transaction outcome.
//! - Update and delete always take a predicate.

pub mod crud_repo;
