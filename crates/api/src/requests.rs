// Rust guideline compliant 2026-10-17

//! Request variants: the method envelope and the two method payloads.
//!
//! Each variant declares its fields once as a `static` [`Schema`] and is
//! materialized through [`schema::parse`].

use chrono::NaiveDate;
use domain::Gender;
use schema::{Field, FieldErrors, FieldValue, Request, RequestModel, Schema};
use serde_json::{Map, Value};

// ---------------------------------------------------------------------------
// MethodRequest
// ---------------------------------------------------------------------------

const METHOD_FIELDS: &[(&str, Field)] = &[
    ("account", Field::char()),
    ("login", Field::char().required()),
    ("token", Field::char().required()),
    ("arguments", Field::arguments().required()),
    ("method", Field::char().required().non_nullable()),
];

/// Schema of the method-call envelope.
pub static METHOD_REQUEST: Schema = Schema::new("MethodRequest", METHOD_FIELDS);

/// The outer method-call envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct MethodRequest {
    /// Caller account; empty when unset.
    pub account: String,
    /// Caller login.
    pub login: String,
    /// Hex SHA-512 credential.
    pub token: String,
    /// Method-specific payload.
    pub arguments: Map<String, Value>,
    /// Method name.
    pub method: String,
}

impl MethodRequest {
    /// `true` when the caller claims the admin identity `admin_login`.
    #[must_use]
    pub fn is_admin(&self, admin_login: &str) -> bool {
        self.login == admin_login
    }
}

fn owned_str(model: &RequestModel, name: &str) -> String {
    model.get(name).and_then(FieldValue::as_str).unwrap_or_default().to_owned()
}

impl Request for MethodRequest {
    fn schema() -> &'static Schema {
        &METHOD_REQUEST
    }

    fn from_model(model: &RequestModel) -> Self {
        Self {
            account: owned_str(model, "account"),
            login: owned_str(model, "login"),
            token: owned_str(model, "token"),
            arguments: model
                .get("arguments")
                .and_then(FieldValue::as_json)
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default(),
            method: owned_str(model, "method"),
        }
    }
}

// ---------------------------------------------------------------------------
// OnlineScoreRequest
// ---------------------------------------------------------------------------

const ONLINE_SCORE_FIELDS: &[(&str, Field)] = &[
    ("first_name", Field::char()),
    ("last_name", Field::char()),
    ("email", Field::email()),
    ("phone", Field::phone()),
    ("birthday", Field::birthday()),
    ("gender", Field::gender()),
];

/// Schema of the `online_score` payload.
pub static ONLINE_SCORE_REQUEST: Schema = Schema::new("OnlineScoreRequest", ONLINE_SCORE_FIELDS);

const PAIRS_MESSAGE: &str = "OnlineScoreRequest needs to have at least one pair with not-null values: \
                             email-phone, first_name-last_name, birthday-gender";

/// Payload of `online_score`. Unset, empty and invalid fields are `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OnlineScoreRequest {
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Phone digits, whether sent as a number or a string.
    pub phone: Option<String>,
    /// Date of birth.
    pub birthday: Option<NaiveDate>,
    /// Gender; code `0` counts as set.
    pub gender: Option<Gender>,
    /// Names of the non-empty fields, in declaration order.
    pub has: Vec<&'static str>,
}

impl OnlineScoreRequest {
    /// `true` when at least one of the pairs email-phone,
    /// first_name-last_name, birthday-gender is fully set.
    #[must_use]
    pub fn has_pair(&self) -> bool {
        (self.email.is_some() && self.phone.is_some())
            || (self.first_name.is_some() && self.last_name.is_some())
            || (self.birthday.is_some() && self.gender.is_some())
    }
}

impl Request for OnlineScoreRequest {
    fn schema() -> &'static Schema {
        &ONLINE_SCORE_REQUEST
    }

    fn from_model(model: &RequestModel) -> Self {
        let text = |name: &str| model.non_empty_str(name).map(str::to_owned);
        let phone = model
            .get("phone")
            .and_then(|v| v.as_str().map(str::to_owned).or_else(|| v.as_i64().map(|n| n.to_string())))
            .filter(|p| !p.is_empty());
        Self {
            first_name: text("first_name"),
            last_name: text("last_name"),
            email: text("email"),
            phone,
            birthday: model.get("birthday").and_then(FieldValue::as_date),
            gender: model.get("gender").and_then(FieldValue::as_i64).and_then(Gender::from_code),
            has: model.present_fields(),
        }
    }

    fn check(&self, errors: &mut FieldErrors) {
        if !self.has_pair() {
            errors.insert("arguments".to_owned(), PAIRS_MESSAGE.to_owned());
        }
    }
}

// ---------------------------------------------------------------------------
// ClientsInterestsRequest
// ---------------------------------------------------------------------------

const CLIENTS_INTERESTS_FIELDS: &[(&str, Field)] = &[
    ("client_ids", Field::client_ids().required().non_nullable()),
    ("date", Field::date()),
];

/// Schema of the `clients_interests` payload.
pub static CLIENTS_INTERESTS_REQUEST: Schema =
    Schema::new("ClientsInterestsRequest", CLIENTS_INTERESTS_FIELDS);

/// Payload of `clients_interests`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientsInterestsRequest {
    /// Client ids, in request order.
    pub client_ids: Vec<i64>,
    /// Optional reference date.
    pub date: Option<NaiveDate>,
}

impl Request for ClientsInterestsRequest {
    fn schema() -> &'static Schema {
        &CLIENTS_INTERESTS_REQUEST
    }

    fn from_model(model: &RequestModel) -> Self {
        Self {
            client_ids: model
                .get("client_ids")
                .and_then(FieldValue::as_json)
                .and_then(Value::as_array)
                .map(|ids| ids.iter().filter_map(Value::as_i64).collect())
                .unwrap_or_default(),
            date: model.get("date").and_then(FieldValue::as_date),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
