use crate::models::api::{CheckRequest, LoginRequest, RegisterRequest};
use std::ops::RangeInclusive;
use thiserror::Error;

const LOGIN_LENGTH: RangeInclusive<usize> = 3..=64;
const PASSWORD_HASH_LENGTH: RangeInclusive<usize> = 63..=65;
const X_RANGE: RangeInclusive<f64> = -3.0..=3.0;
const Y_RANGE: RangeInclusive<f64> = -3.0..=5.0;
const R_RANGE: RangeInclusive<i32> = 1..=3;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    Missing(&'static str),

    #[error("Field must not be blank: {0}")]
    Blank(&'static str),

    #[error("Invalid length for {field}: expected {min}..={max} characters, got {actual}")]
    Length {
        field: &'static str,
        min: usize,
        max: usize,
        actual: usize,
    },

    #[error("Field out of range: {field} must be within {range}")]
    OutOfRange { field: &'static str, range: String },
}

#[derive(Debug, PartialEq)]
pub struct Credentials {
    pub login: String,
    pub password_hash: String,
}

#[derive(Debug, PartialEq)]
pub struct ValidatedCheck {
    pub x: f64,
    pub y: f64,
    pub r: i32,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Credentials, ValidationError> {
        let login = required("login", self.login)?;
        let password_hash = required("passwordHash", self.password_hash)?;

        check_length("login", &login, LOGIN_LENGTH)?;
        check_length("passwordHash", &password_hash, PASSWORD_HASH_LENGTH)?;

        Ok(Credentials {
            login,
            password_hash,
        })
    }
}

impl LoginRequest {
    pub fn validate(self) -> Result<Credentials, ValidationError> {
        Ok(Credentials {
            login: required("login", self.login)?,
            password_hash: required("passwordHash", self.password_hash)?,
        })
    }
}

impl CheckRequest {
    pub fn validate(self) -> Result<ValidatedCheck, ValidationError> {
        let x = self.x.ok_or(ValidationError::Missing("x"))?;
        let y = self.y.ok_or(ValidationError::Missing("y"))?;
        let r = self.r.ok_or(ValidationError::Missing("r"))?;

        if !X_RANGE.contains(&x) {
            return Err(out_of_range("x", &X_RANGE));
        }

        if !Y_RANGE.contains(&y) {
            return Err(out_of_range("y", &Y_RANGE));
        }

        if !R_RANGE.contains(&r) {
            return Err(out_of_range("r", &R_RANGE));
        }

        Ok(ValidatedCheck { x, y, r })
    }
}

fn required(field: &'static str, value: Option<String>) -> Result<String, ValidationError> {
    let value = value.ok_or(ValidationError::Missing(field))?;

    if value.trim().is_empty() {
        return Err(ValidationError::Blank(field));
    }

    Ok(value)
}

fn check_length(
    field: &'static str,
    value: &str,
    bounds: RangeInclusive<usize>,
) -> Result<(), ValidationError> {
    let actual = value.chars().count();

    if !bounds.contains(&actual) {
        return Err(ValidationError::Length {
            field,
            min: *bounds.start(),
            max: *bounds.end(),
            actual,
        });
    }

    Ok(())
}

fn out_of_range<T: std::fmt::Display>(field: &'static str, range: &RangeInclusive<T>) -> ValidationError {
    ValidationError::OutOfRange {
        field,
        range: format!("[{}, {}]", range.start(), range.end()),
    }
}
