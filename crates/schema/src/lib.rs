// Rust guideline compliant 2026-10-15

//! Declarative request validation.
//!
//! [`field`] holds the Field Schema (typed validators bound to a
//! required/nullable contract); [`model`] holds the Request Model base
//! mechanism that validates a raw JSON mapping against a static [`Schema`].
//!
//! Entry points: [`Field::validate`], [`RequestModel::validate`], [`parse`].

pub mod field;
pub mod model;

pub use field::{DATE_FORMAT, Field, FieldKind, FieldValue, MAX_AGE_YEARS, ValidationError, is_nullable};
pub use model::{FieldErrors, Request, RequestModel, Schema, parse, parse_at};
