/// Validating extractors
///
/// [`ValidatedJson`] and [`ValidatedQuery`] deserialize the request body or
/// query string and then run the type's `validator::Validate` rules. A
/// handler that takes one of them never runs on invalid input: the request is
/// rejected with [`ApiError::InvalidPayload`], one entry per violated rule.
///
/// Input that cannot be deserialized at all (malformed JSON, wrong types, a
/// missing required field) yields a single entry.
///
/// # Example
///
/// ```no_run
/// use serde::Deserialize;
/// use taskmaster_api::extract::ValidatedJson;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct CreateThing {
///     #[validate(length(min = 1, message = "Name is required"))]
///     name: String,
/// }
///
/// async fn create(ValidatedJson(req): ValidatedJson<CreateThing>) -> String {
///     req.name
/// }
/// ```

use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Query, Request},
    http::request::Parts,
    Json,
};
use serde::{
    de::{DeserializeOwned, IntoDeserializer},
    Deserialize, Deserializer,
};
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::error::{ApiError, ValidationErrorDetail};

/// JSON body that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

/// Query string that passed validation
#[derive(Debug, Clone)]
pub struct ValidatedQuery<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| undecodable("body", &rejection.body_text()))?;

        value.validate().map_err(invalid)?;
        Ok(ValidatedJson(value))
    }
}

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| undecodable("query", &rejection.body_text()))?;

        value.validate().map_err(invalid)?;
        Ok(ValidatedQuery(value))
    }
}

/// A single UUID path parameter
///
/// A malformed ID is a validation failure with field `params`, answered in the
/// same envelope as body errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UuidPath(pub Uuid);

#[async_trait]
impl<S> FromRequestParts<S> for UuidPath
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(id) = Path::<Uuid>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| {
                ApiError::InvalidPayload(vec![ValidationErrorDetail::new(
                    "params",
                    rejection.body_text(),
                )])
            })?;
        Ok(UuidPath(id))
    }
}

/// One entry per violated rule, ordered by field name
pub fn validation_details(errors: &ValidationErrors) -> Vec<ValidationErrorDetail> {
    let mut details: Vec<ValidationErrorDetail> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| {
                ValidationErrorDetail::new(
                    field.to_string(),
                    error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("Invalid {}", field)),
                )
            })
        })
        .collect();

    details.sort_by(|a, b| a.field.cmp(&b.field));
    details
}

fn invalid(errors: ValidationErrors) -> ApiError {
    ApiError::InvalidPayload(validation_details(&errors))
}

fn undecodable(source: &str, message: &str) -> ApiError {
    let detail = match missing_field(message) {
        Some(field) => ValidationErrorDetail::new(field, format!("{} is required", field)),
        None => ValidationErrorDetail::new(source, message),
    };
    ApiError::InvalidPayload(vec![detail])
}

/// Pulls `name` out of serde's "missing field `name`" message
fn missing_field(message: &str) -> Option<&str> {
    let rest = message.split("missing field `").nth(1)?;
    rest.split('`').next().filter(|field| !field.is_empty())
}

/// Deserializes a field that distinguishes "absent" from "null"
///
/// Use with `#[serde(default, deserialize_with = "double_option")]` on an
/// `Option<Option<T>>`: absent is `None`, `null` is `Some(None)`, a value is
/// `Some(Some(v))`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Treats an empty query value (`?status=`) as absent
///
/// Use with `#[serde(default, deserialize_with = "empty_string_as_none")]`.
pub fn empty_string_as_none<'de, T, D>(deserializer: D) -> Result<Option<T>, D::Error>
where
    T: DeserializeOwned,
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => T::deserialize(IntoDeserializer::<D::Error>::into_deserializer(s)).map(Some),
    }
}

/// Trims surrounding whitespace before validation sees the value
///
/// Use with `#[serde(deserialize_with = "trimmed")]` on fields such as
/// emails, where `" a@b.com "` means the same as `"a@b.com"`.
pub fn trimmed<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    Ok(value.trim().to_string())
}
