// =========================
// tests/unit/error_tests.rs
// =========================
//! Unit tests for the error module
use axum::http::StatusCode;
use axum::response::IntoResponse;
use backend_lib::error::AppError;
use backend_lib::validation::{ValidationError, ValidationErrors};

#[test]
fn test_app_error_display() {
    let auth_error = AppError::Authentication("Invalid token".to_string());
    assert_eq!(auth_error.to_string(), "Authentication error: Invalid token");

    let rate_limit_error = AppError::RateLimitExceeded;
    assert_eq!(rate_limit_error.to_string(), "Rate limit exceeded");
}

#[test]
fn test_app_error_status_codes() {
    let cases = [
        (AppError::BadRequest("x".to_string()), StatusCode::BAD_REQUEST),
        (AppError::invalid("title", "too long"), StatusCode::UNPROCESSABLE_ENTITY),
        (AppError::Authentication("x".to_string()), StatusCode::UNAUTHORIZED),
        (AppError::PermissionDenied("x".to_string()), StatusCode::FORBIDDEN),
        (AppError::NotFound("x".to_string()), StatusCode::NOT_FOUND),
        (AppError::Conflict("x".to_string()), StatusCode::CONFLICT),
        (AppError::RateLimitExceeded, StatusCode::TOO_MANY_REQUESTS),
        (AppError::AuthRateLimited, StatusCode::TOO_MANY_REQUESTS),
        (AppError::Internal("x".to_string()), StatusCode::INTERNAL_SERVER_ERROR),
    ];
    for (error, status) in cases {
        assert_eq!(error.status_code(), status, "{error}");
    }
}

#[test]
fn test_app_error_error_codes() {
    assert_eq!(
        AppError::Authentication("Invalid credentials".to_string()).error_code(),
        "AUTHENTICATION_FAILED"
    );
    assert_eq!(AppError::Internal("test".to_string()).error_code(), "INTERNAL_ERROR");
    assert_eq!(AppError::NotFound("test".to_string()).error_code(), "NOT_FOUND");
    assert_eq!(AppError::RateLimitExceeded.error_code(), "RATE_LIMITED");
    assert_eq!(AppError::AuthRateLimited.error_code(), "AUTH_RATE_LIMITED");
}

#[test]
fn test_app_error_sanitized_message() {
    let auth_error = AppError::Authentication("username: admin, password: secret123".to_string());
    assert_eq!(auth_error.sanitized_message(), "Authentication failed");

    let internal_error = AppError::Internal("Database connection failed with password: dbpass123".to_string());
    assert_eq!(internal_error.sanitized_message(), "An internal server error occurred");
}

#[test]
fn test_problem_body_lists_field_errors() {
    let errors = ValidationErrors::from(vec![
        ValidationError::Required { field: "title" },
        ValidationError::invalid("difficulty", "difficulty must be between 1 and 5"),
    ]);
    let body = AppError::from(errors).problem();

    assert_eq!(body["status"], 422);
    assert_eq!(body["title"], "Unprocessable Entity");
    assert_eq!(body["errors"]["title"], "title is required");
    assert_eq!(body["errors"]["difficulty"], "difficulty must be between 1 and 5");
}

#[test]
fn test_into_response_is_problem_json() {
    let response = AppError::NotFound("Song missing".to_string()).into_response();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/problem+json"
    );
}

#[test]
fn test_error_from_impls() {
    let app_err: AppError = "Str error".into();
    assert!(matches!(app_err, AppError::Internal(_)));

    let app_err: AppError = anyhow::anyhow!("boom").into();
    assert!(matches!(app_err, AppError::Internal(_)));
}
