//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define the read-only entity store contract used by directory services.
//! - Isolate SQLite query details from hierarchy and geo orchestration.
//!
//! # Invariants
//! - Store reads never mutate data and never cache between calls.
//! - Organization results are deduplicated and ordered by id.

pub mod directory_repo;
