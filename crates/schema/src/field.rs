// Rust guideline compliant 2026-10-14

//! Field Schema: typed validators bound to a required/nullable contract.
//!
//! Each kind refines another by calling it first and then adding one rule:
//! email and date refine the string kind, birthdate refines date. The
//! refinement chain is plain method composition on [`Field`].

use chrono::{NaiveDate, TimeDelta};
use domain::Gender;
use serde_json::Value;

/// Date layout accepted by the date kinds (`DD.MM.YYYY`).
pub const DATE_FORMAT: &str = "%d.%m.%Y";

/// Maximum age, in 365-day years, accepted by the birthdate kind.
pub const MAX_AGE_YEARS: i64 = 70;

/// Phone numbers are exactly this many digits long.
const PHONE_LENGTH: usize = 11;

// ---------------------------------------------------------------------------
// ValidationError
// ---------------------------------------------------------------------------

/// A single field rule violation.
///
/// The message names the field kind and the violated rule
/// (e.g. `"PhoneField length must be 11"`).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

// ---------------------------------------------------------------------------
// FieldKind / FieldValue
// ---------------------------------------------------------------------------

/// The type-specific rule a [`Field`] enforces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Any string.
    Char,
    /// A key-value mapping.
    Arguments,
    /// A string containing `@`.
    Email,
    /// 11 digits starting with `7`, as an integer or a string.
    Phone,
    /// A `DD.MM.YYYY` date string; empty means "no date".
    Date,
    /// A date no more than 70 years in the past.
    BirthDay,
    /// One of the gender codes `0`, `1`, `2`.
    Gender,
    /// A list of integers.
    ClientIds,
}

impl FieldKind {
    /// Name used in validation messages.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Char => "CharField",
            Self::Arguments => "ArgumentsField",
            Self::Email => "EmailField",
            Self::Phone => "PhoneField",
            Self::Date => "DateField",
            Self::BirthDay => "BirthDayField",
            Self::Gender => "GenderField",
            Self::ClientIds => "ClientIDsField",
        }
    }
}

/// A value that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// The raw value, unchanged.
    Json(Value),
    /// A parsed calendar date (date kinds with a non-empty value).
    Date(NaiveDate),
}

impl FieldValue {
    /// The raw JSON value, if this is not a parsed date.
    #[must_use]
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(v) => Some(v),
            Self::Date(_) => None,
        }
    }

    /// String content, if the raw value is a string.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        self.as_json().and_then(Value::as_str)
    }

    /// Integer content, if the raw value is a JSON integer (booleans excluded).
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        self.as_json().and_then(Value::as_i64)
    }

    /// The parsed date, if any.
    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Self::Date(d) => Some(*d),
            Self::Json(_) => None,
        }
    }

    /// `true` when the value belongs to the nullable set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Json(v) => is_nullable(v),
            Self::Date(_) => false,
        }
    }
}

/// `true` for the nullable set: `null`, `""`, `[]`, `{}`.
#[must_use]
pub fn is_nullable(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// `true` for JSON integers that fit `i64`. Booleans and floats are not integers.
fn is_integer(value: &Value) -> bool {
    value.as_i64().is_some()
}

// ---------------------------------------------------------------------------
// Field
// ---------------------------------------------------------------------------

/// A reusable validation rule bound to a required/nullable contract.
///
/// Fields are `const`-constructible so request schemas can be declared as
/// statics:
///
/// ```
/// use schema::Field;
///
/// const LOGIN: Field = Field::char().required();
/// assert!(LOGIN.is_required());
/// assert!(LOGIN.is_nullable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Field {
    kind: FieldKind,
    required: bool,
    nullable: bool,
}

impl Field {
    /// Optional, nullable field of `kind`.
    #[must_use]
    pub const fn new(kind: FieldKind) -> Self {
        Self { kind, required: false, nullable: true }
    }

    /// String field.
    #[must_use]
    pub const fn char() -> Self {
        Self::new(FieldKind::Char)
    }

    /// Structured-argument (mapping) field.
    #[must_use]
    pub const fn arguments() -> Self {
        Self::new(FieldKind::Arguments)
    }

    /// Email field.
    #[must_use]
    pub const fn email() -> Self {
        Self::new(FieldKind::Email)
    }

    /// Phone field.
    #[must_use]
    pub const fn phone() -> Self {
        Self::new(FieldKind::Phone)
    }

    /// Date field.
    #[must_use]
    pub const fn date() -> Self {
        Self::new(FieldKind::Date)
    }

    /// Birthdate field.
    #[must_use]
    pub const fn birthday() -> Self {
        Self::new(FieldKind::BirthDay)
    }

    /// Gender field.
    #[must_use]
    pub const fn gender() -> Self {
        Self::new(FieldKind::Gender)
    }

    /// Integer-list field.
    #[must_use]
    pub const fn client_ids() -> Self {
        Self::new(FieldKind::ClientIds)
    }

    /// Mark the field as required: absent or `null` values fail.
    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Forbid values from the nullable set.
    #[must_use]
    pub const fn non_nullable(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// The rule this field enforces.
    #[must_use]
    pub fn kind(&self) -> FieldKind {
        self.kind
    }

    /// Whether the field must be present and non-null.
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether values from the nullable set are accepted.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Validate `value` against this field, using the local date as "today".
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the field kind and the violated rule.
    pub fn validate(&self, value: &Value) -> Result<FieldValue, ValidationError> {
        self.validate_at(value, chrono::Local::now().date_naive())
    }

    /// Validate `value` with an explicit "today" for the birthdate rule.
    ///
    /// # Errors
    ///
    /// Returns a [`ValidationError`] naming the field kind and the violated rule.
    pub fn validate_at(&self, value: &Value, today: NaiveDate) -> Result<FieldValue, ValidationError> {
        let raw = || FieldValue::Json(value.clone());
        match self.kind {
            FieldKind::Char => self.string(value).map(|_| raw()),
            FieldKind::Arguments => self.mapping(value).map(|()| raw()),
            FieldKind::Email => self.email_rule(value).map(|()| raw()),
            FieldKind::Phone => self.phone_rule(value).map(|()| raw()),
            FieldKind::Date => Ok(self.date_rule(value)?.map_or_else(raw, FieldValue::Date)),
            FieldKind::BirthDay => {
                Ok(self.birthday_rule(value, today)?.map_or_else(raw, FieldValue::Date))
            }
            FieldKind::Gender => self.gender_rule(value).map(|_| raw()),
            FieldKind::ClientIds => self.client_ids_rule(value).map(|()| raw()),
        }
    }

    fn fail(&self, rule: &str) -> ValidationError {
        ValidationError { message: format!("{} {rule}", self.kind.name()) }
    }

    /// Required/nullable contract shared by every kind.
    fn base(&self, value: &Value) -> Result<(), ValidationError> {
        if self.required && value.is_null() {
            return Err(self.fail("is required"));
        }
        if !self.nullable && is_nullable(value) {
            return Err(self.fail("can't be nullable"));
        }
        Ok(())
    }

    fn string<'v>(&self, value: &'v Value) -> Result<&'v str, ValidationError> {
        self.base(value)?;
        value.as_str().ok_or_else(|| self.fail("value type must be str"))
    }

    fn mapping(&self, value: &Value) -> Result<(), ValidationError> {
        self.base(value)?;
        if value.is_object() { Ok(()) } else { Err(self.fail("value type must be dict")) }
    }

    fn email_rule(&self, value: &Value) -> Result<(), ValidationError> {
        let s = self.string(value)?;
        if s.contains('@') { Ok(()) } else { Err(self.fail("must contain '@' character")) }
    }

    fn phone_rule(&self, value: &Value) -> Result<(), ValidationError> {
        self.base(value)?;
        if is_nullable(value) {
            return Ok(());
        }
        let digits = match value {
            Value::String(s) => s.clone(),
            Value::Number(n) if is_integer(value) => n.to_string(),
            _ => return Err(self.fail("must be int or str")),
        };
        if digits.chars().count() != PHONE_LENGTH {
            return Err(self.fail("length must be 11"));
        }
        if !digits.starts_with('7') {
            return Err(self.fail("must start with 7"));
        }
        if !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(self.fail("must contain numbers only"));
        }
        Ok(())
    }

    fn date_rule(&self, value: &Value) -> Result<Option<NaiveDate>, ValidationError> {
        let s = self.string(value)?;
        if s.is_empty() {
            return Ok(None);
        }
        // chrono's `%Y` also takes short and signed years; the year must be
        // exactly four digits.
        let four_digit_year = s
            .rsplit_once('.')
            .is_some_and(|(_, year)| year.len() == 4 && year.bytes().all(|b| b.is_ascii_digit()));
        match NaiveDate::parse_from_str(s, DATE_FORMAT) {
            Ok(date) if four_digit_year => Ok(Some(date)),
            _ => Err(self.fail("must be in 'DD.MM.YYYY' format")),
        }
    }

    fn birthday_rule(&self, value: &Value, today: NaiveDate) -> Result<Option<NaiveDate>, ValidationError> {
        let parsed = self.date_rule(value)?;
        if let Some(date) = parsed
            && today - date > TimeDelta::days(365 * MAX_AGE_YEARS)
        {
            return Err(self.fail("must be within the last 70 years"));
        }
        Ok(parsed)
    }

    fn gender_rule(&self, value: &Value) -> Result<Gender, ValidationError> {
        self.base(value)?;
        let code = value.as_i64().ok_or_else(|| self.fail("must be of type int"))?;
        Gender::from_code(code).ok_or_else(|| self.fail("must be 0, 1 or 2"))
    }

    fn client_ids_rule(&self, value: &Value) -> Result<(), ValidationError> {
        self.base(value)?;
        let items = value.as_array().ok_or_else(|| self.fail("must be of type list"))?;
        if items.iter().all(is_integer) {
            Ok(())
        } else {
            Err(self.fail("must contain a list of int values only"))
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
