//! Bounding-box annotation engine.
//!
//! Pointer events come in through [`interaction::Interaction`], which turns
//! them into intents applied to the [`store::AnnotationStore`]. Predicted boxes
//! enter through [`merge`], and [`export`] projects the store into the
//! interchange record.

pub mod annotation;
pub mod config;
pub mod error;
pub mod export;
pub mod geometry;
pub mod interaction;
pub mod merge;
pub mod store;

pub use annotation::{Annotation, AnnotationId, Source, Tag};
pub use error::AnnotatorError;
pub use geometry::{BoundingBox, ImageSize, Point, Vector, MIN_SIZE};
pub use store::AnnotationStore;
