// Rust guideline compliant 2026-10-15

//! Request Model: declarative requests validated against a static schema.
//!
//! A request type declares its fields once, as a `static` [`Schema`]. A
//! [`RequestModel`] validates a raw JSON mapping against that schema and
//! keeps the cleaned values; [`parse`] turns a valid model into the typed
//! request via the [`Request`] trait.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use serde_json::{Map, Value};

use crate::field::{Field, FieldValue};

/// Field name -> error message, ordered by field name.
pub type FieldErrors = BTreeMap<String, String>;

/// Stand-in value for absent required fields.
static NULL: Value = Value::Null;

// ---------------------------------------------------------------------------
// Schema
// ---------------------------------------------------------------------------

/// Immutable, ordered list of `(name, field)` pairs shared by every instance
/// of a request type.
#[derive(Debug)]
pub struct Schema {
    name: &'static str,
    fields: &'static [(&'static str, Field)],
}

impl Schema {
    /// Declare a schema. Intended for `static` items.
    #[must_use]
    pub const fn new(name: &'static str, fields: &'static [(&'static str, Field)]) -> Self {
        Self { name, fields }
    }

    /// Request type name (e.g. `"OnlineScoreRequest"`).
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Declared fields in declaration order.
    #[must_use]
    pub fn fields(&self) -> &'static [(&'static str, Field)] {
        self.fields
    }

    /// Look up a declared field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&'static Field> {
        self.fields.iter().find(|(n, _)| *n == name).map(|(_, f)| f)
    }
}

// ---------------------------------------------------------------------------
// RequestModel
// ---------------------------------------------------------------------------

/// One request body under validation.
///
/// Owns the raw body, the error map and, after [`validate`](Self::validate),
/// one cleaned value per declared field that was present or required and
/// passed its rule.
#[derive(Debug)]
pub struct RequestModel {
    schema: &'static Schema,
    body: Map<String, Value>,
    errors: FieldErrors,
    cleaned: BTreeMap<&'static str, FieldValue>,
}

impl RequestModel {
    /// Wrap `body` for validation against `schema`. Nothing is checked yet.
    #[must_use]
    pub fn new(schema: &'static Schema, body: Map<String, Value>) -> Self {
        Self { schema, body, errors: FieldErrors::new(), cleaned: BTreeMap::new() }
    }

    /// The schema this model validates against.
    #[must_use]
    pub fn schema(&self) -> &'static Schema {
        self.schema
    }

    /// The raw body.
    #[must_use]
    pub fn body(&self) -> &Map<String, Value> {
        &self.body
    }

    /// Validate every declared field, using the local date as "today".
    pub fn validate(&mut self) {
        self.validate_at(chrono::Local::now().date_naive());
    }

    /// Validate every declared field with an explicit "today".
    ///
    /// Absent optional fields are skipped. Absent required fields are checked
    /// as `null`. One field's failure never stops the others.
    pub fn validate_at(&mut self, today: NaiveDate) {
        self.errors.clear();
        self.cleaned.clear();
        for &(name, field) in self.schema.fields {
            let value = match self.body.get(name) {
                Some(v) => v,
                None if !field.is_required() => continue,
                None => &NULL,
            };
            match field.validate_at(value, today) {
                Ok(cleaned) => {
                    self.cleaned.insert(name, cleaned);
                }
                Err(e) => {
                    tracing::debug!(schema = self.schema.name, field = name, error = %e, "schema.field.invalid");
                    self.errors.insert(name.to_owned(), e.to_string());
                }
            }
        }
    }

    /// Accumulated errors; empty means valid.
    #[must_use]
    pub fn errors(&self) -> &FieldErrors {
        &self.errors
    }

    /// `true` when no error has been recorded.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Cleaned value of `name`; `None` when absent, undeclared or invalid.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.cleaned.get(name)
    }

    /// Cleaned string of `name`, `None` when unset or empty.
    #[must_use]
    pub fn non_empty_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(FieldValue::as_str).filter(|s| !s.is_empty())
    }

    /// `true` when `name` is set to a value outside the nullable set.
    #[must_use]
    pub fn is_present(&self, name: &str) -> bool {
        self.get(name).is_some_and(|v| !v.is_empty())
    }

    /// Names of the declared fields that are present and non-empty, in
    /// declaration order.
    #[must_use]
    pub fn present_fields(&self) -> Vec<&'static str> {
        self.schema.fields.iter().map(|(n, _)| *n).filter(|n| self.is_present(n)).collect()
    }

    /// Consume the model, keeping only its errors.
    #[must_use]
    pub fn into_errors(self) -> FieldErrors {
        self.errors
    }
}

// ---------------------------------------------------------------------------
// Request trait
// ---------------------------------------------------------------------------

/// A typed request materialized from a validated [`RequestModel`].
pub trait Request: Sized {
    /// The schema declared for this request type.
    fn schema() -> &'static Schema;

    /// Build the typed request from `model`. Invalid or absent fields read as
    /// unset; the result is discarded when any error was recorded.
    fn from_model(model: &RequestModel) -> Self;

    /// Cross-field rules run after field validation; add errors to `errors`.
    fn check(&self, _errors: &mut FieldErrors) {}
}

/// Validate `body` as `R`, using the local date as "today".
///
/// # Errors
///
/// Returns every field and cross-field error when validation fails.
pub fn parse<R: Request>(body: Map<String, Value>) -> Result<R, FieldErrors> {
    parse_at(body, chrono::Local::now().date_naive())
}

/// Validate `body` as `R` with an explicit "today".
///
/// # Errors
///
/// Returns every field and cross-field error when validation fails.
pub fn parse_at<R: Request>(body: Map<String, Value>, today: NaiveDate) -> Result<R, FieldErrors> {
    let mut model = RequestModel::new(R::schema(), body);
    model.validate_at(today);
    let request = R::from_model(&model);
    let mut errors = model.into_errors();
    request.check(&mut errors);
    if errors.is_empty() { Ok(request) } else { Err(errors) }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
