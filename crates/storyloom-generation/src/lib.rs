//! Storyloom — Content Generator adapter.
//!
//! Wraps narrative-chapter and illustration generation behind the
//! [`generator::ContentGenerator`] trait. Failures come back as values: a
//! chapter call yields `Err(GenerationError)` and an image call yields an
//! empty list.

pub mod error;
pub mod gemini;
pub mod generator;
pub mod guidance;
