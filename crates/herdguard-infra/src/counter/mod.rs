//! Retry counter stores

mod annotation;

pub use annotation::AnnotationCounterStore;
