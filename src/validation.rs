//! Request validation.
//!
//! Every JSON body accepted by the API implements [`Validate`]; handlers take
//! it through [`ValidatedJson`], so a malformed body and a rule violation both
//! surface as a 422 with per-field details. Query strings and path segments
//! go through [`ValidatedQuery`] and [`ValidatedPath`] for the same reason.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Path, Query, Request};
use axum::http::request::Parts;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::AppError;

pub const MAX_NAME_LEN: usize = 200;
pub const MAX_DESCRIPTION_LEN: usize = 5_000;
pub const MAX_NOTE_LEN: usize = 100_000;
pub const MAX_MINUTES: i64 = 240;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

pub trait Validate {
    fn validate(&self) -> Result<(), AppError>;
}

/// Collects rule violations for one request body.
#[derive(Debug, Default)]
pub struct Rules {
    errors: Vec<FieldError>,
}

impl Rules {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, field: &str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// Trimmed value must be non-empty and at most [`MAX_NAME_LEN`] chars.
    pub fn name(&mut self, field: &str, value: &str) -> &mut Self {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            self.push(field, "must not be empty");
        } else if trimmed.chars().count() > MAX_NAME_LEN {
            self.push(field, format!("must be at most {} characters", MAX_NAME_LEN));
        }
        self
    }

    pub fn optional_name(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            self.name(field, value);
        }
        self
    }

    pub fn max_len(&mut self, field: &str, value: Option<&str>, max: usize) -> &mut Self {
        if let Some(value) = value {
            if value.chars().count() > max {
                self.push(field, format!("must be at most {} characters", max));
            }
        }
        self
    }

    /// `#RRGGBB`
    pub fn color(&mut self, field: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = value {
            let valid = value.len() == 7
                && value.starts_with('#')
                && value[1..].chars().all(|c| c.is_ascii_hexdigit());
            if !valid {
                self.push(field, "must be a hex color like #1a2b3c");
            }
        }
        self
    }

    pub fn email(&mut self, field: &str, value: &str) -> &mut Self {
        let value = value.trim();
        match value.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {}
            _ => self.push(field, "must be a valid email address"),
        }
        self
    }

    pub fn range(&mut self, field: &str, value: Option<i64>, min: i64, max: i64) -> &mut Self {
        if let Some(value) = value {
            if value < min || value > max {
                self.push(field, format!("must be between {} and {}", min, max));
            }
        }
        self
    }

    pub fn one_of(&mut self, field: &str, value: &str, allowed: &[&str]) -> &mut Self {
        if !allowed.contains(&value) {
            self.push(field, format!("must be one of: {}", allowed.join(", ")));
        }
        self
    }

    pub fn finish(&mut self) -> Result<(), AppError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(std::mem::take(&mut self.errors)))
        }
    }
}

/// JSON body extractor that runs [`Validate`] before the handler sees it.
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| AppError::validation("body", rejection.body_text()))?;
        value.validate()?;
        Ok(ValidatedJson(value))
    }
}

/// `Query<T>` whose rejection is a 422 on the `query` field.
pub struct ValidatedQuery<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedQuery<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::validation("query", rejection.body_text()))?;
        Ok(ValidatedQuery(value))
    }
}

/// `Path<T>` whose rejection is a 422 on the `path` field.
pub struct ValidatedPath<T>(pub T);

impl<T, S> FromRequestParts<S> for ValidatedPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::validation("path", rejection.body_text()))?;
        Ok(ValidatedPath(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn errors(result: Result<(), AppError>) -> Vec<FieldError> {
        match result {
            Err(AppError::Validation(fields)) => fields,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_name_rules() {
        assert!(Rules::new().name("name", "Inbox").finish().is_ok());

        let fields = errors(Rules::new().name("name", "   ").finish());
        assert_eq!(fields, vec![FieldError::new("name", "must not be empty")]);

        let long = "x".repeat(MAX_NAME_LEN + 1);
        assert_eq!(errors(Rules::new().name("name", &long).finish()).len(), 1);
    }

    #[test]
    fn test_color_and_email() {
        assert!(Rules::new().color("color", Some("#a1B2c3")).finish().is_ok());
        assert!(Rules::new().color("color", None).finish().is_ok());
        let fields = errors(
            Rules::new()
                .color("color", Some("red"))
                .email("email", "nobody")
                .finish(),
        );
        let names: Vec<_> = fields.iter().map(|f| f.field.as_str()).collect();
        assert_eq!(names, vec!["color", "email"]);
    }

    #[test]
    fn test_range() {
        assert!(Rules::new().range("planned_minutes", Some(25), 1, MAX_MINUTES).finish().is_ok());
        assert!(Rules::new().range("planned_minutes", Some(0), 1, MAX_MINUTES).finish().is_err());
    }
}
