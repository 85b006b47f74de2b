//! Analysis request pipeline: validation, transport, and failure classification

mod client;
mod error;
mod request;

pub use client::{AnalysisBackend, HttpBackend};
pub use error::{
    server_detail, status_message, ApiError, CHECK_INPUT, ENDPOINT_NOT_FOUND,
    FILE_ANALYSIS_UNSUPPORTED, NOT_AUTHORIZED, SERVICE_UNAVAILABLE, SERVICE_UNREACHABLE,
    TOO_MANY_REQUESTS, UNREADABLE_RESPONSE,
};
pub use request::{validate, AnalysisRequest, ValidatedRequest, ValidationError};
