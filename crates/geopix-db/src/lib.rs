//! Geopix Database Layer
//!
//! This crate provides the photo catalog: the [`PhotoCatalog`] seam the pipeline writes
//! through, its PostgreSQL repository, and an in-memory implementation.

pub mod catalog;
pub mod db;

pub use catalog::{InMemoryCatalog, PhotoCatalog};
pub use db::{connect, PhotoRepository, MIGRATOR};
