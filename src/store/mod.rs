//! Annotation persistence
//!
//! `AnnotationStore` is the repository the rest of the crate talks to. It sits
//! on a swappable key-value backend: in-memory for tests and scratch sessions,
//! a JSON file for real use.

pub mod backend;
pub mod repository;

pub use backend::{JsonFileStore, KeyValueStore, MemoryStore};
pub use repository::{AnnotationStore, BREAKDOWNS_KEY, SONGS_KEY};
