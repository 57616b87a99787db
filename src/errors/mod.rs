use actix_web::{HttpResponse, ResponseError};
use serde::Serialize;
use std::fmt;
use log::error;

#[derive(Debug)]
pub enum AppError {
    NotFound(String),
    BadRequest(String),
    UnsupportedMediaType(String),
    ConfigError(String),
    InternalServerError(String),
    DatabaseError(String),
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

impl AppError {
    /// Maps a provider failure to a `DatabaseError` naming the step that failed.
    pub fn database(step: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
        move |err| {
            error!("Error - {}: {:?}", step, err);
            AppError::DatabaseError(format!("{}: {}", step, err))
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::UnsupportedMediaType(msg) => write!(f, "Unsupported Media Type: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config Error: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::NotFound(msg) => HttpResponse::NotFound().json(ErrorResponse { error: msg.clone() }),
            AppError::BadRequest(msg) => HttpResponse::BadRequest().json(ErrorResponse { error: msg.clone() }),
            AppError::UnsupportedMediaType(msg) => HttpResponse::UnsupportedMediaType().json(ErrorResponse { error: msg.clone() }),
            AppError::ConfigError(msg) => HttpResponse::InternalServerError().json(ErrorResponse { error: msg.clone() }),
            AppError::InternalServerError(msg) => HttpResponse::InternalServerError().json(ErrorResponse { error: msg.clone() }),
            AppError::DatabaseError(msg) => HttpResponse::InternalServerError().json(ErrorResponse { error: msg.clone() }),
        }
    }
}
