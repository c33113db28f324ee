#![forbid(unsafe_code)]

//! Course catalog services built on Streamlet streams.
//!
//! - [`CourseStore`]: the latest course list, shared by every screen.
//! - [`Catalog`]: one shared request feeding the beginner and advanced
//!   views.
//! - [`LessonSearch`]: a course and its lessons, searched as terms arrive.
//! - [`CourseEditor`]: saving dialog changes with a chosen flattening
//!   strategy.
//! - [`Emitter`]: a send/listen event channel.
//!
//! Event sources (keystrokes, clicks, form values) come in as
//! `Stream<_, Infallible>` values supplied by the caller.

pub mod catalog;
pub mod config;
pub mod editor;
pub mod emitter;
pub mod error;
pub mod lessons;
pub mod model;
pub mod store;

pub use catalog::{Catalog, CatalogOptions, Recovery};
pub use config::{SavePolicy, StoreConfig};
pub use editor::{CourseChanges, CourseEditor, SaveStrategy};
pub use emitter::Emitter;
pub use error::{Result, StoreError};
pub use lessons::LessonSearch;
pub use model::{Course, CoursesPayload, Lesson, LessonsPayload};
pub use store::CourseStore;
