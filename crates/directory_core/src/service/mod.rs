//! Core use-case services.
//!
//! # Responsibility
//! - Compose hierarchy resolution, geo filtering and store lookups into the
//!   directory's read queries.
//! - Keep the HTTP layer decoupled from storage details.

pub mod directory_service;
pub mod hierarchy;
