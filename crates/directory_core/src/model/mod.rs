//! Directory domain model.
//!
//! # Responsibility
//! - Define the buildings, activities and organizations served by the core.
//! - Keep relations as plain ids; the store owns every association.
//!
//! # Invariants
//! - Ids are assigned by storage and never reused.
//! - Activities form a forest linked only through `parent_id`.

pub mod activity;
pub mod building;
pub mod organization;
