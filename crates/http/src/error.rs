// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The stable error envelope every non-2xx response uses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::Value;

use crate::control::ControlError;

/// Stable, machine-readable error codes per the push server's error contract.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    PlanNotFound,
    OrchestratorAlreadyRunning,
    OrchestratorNotRunning,
    StartFailed,
    StopFailed,
    InvalidArgument,
    InternalError,
    IpcTimeout,
}

impl ErrorCode {
    fn status(self) -> StatusCode {
        match self {
            ErrorCode::PlanNotFound => StatusCode::NOT_FOUND,
            ErrorCode::OrchestratorAlreadyRunning => StatusCode::CONFLICT,
            ErrorCode::OrchestratorNotRunning => StatusCode::NOT_FOUND,
            ErrorCode::StartFailed | ErrorCode::StopFailed => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::InvalidArgument => StatusCode::BAD_REQUEST,
            ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            ErrorCode::IpcTimeout => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

#[derive(Debug)]
pub struct ApiError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn plan_not_found(plan_id: &str) -> Self {
        Self::new(ErrorCode::PlanNotFound, format!("plan {plan_id} not found"))
    }
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    success: bool,
    error: &'a str,
    code: ErrorCode,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: &'a Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.code.status();
        let body = ErrorBody {
            success: false,
            error: &self.message,
            code: self.code,
            details: &self.details,
        };
        (status, Json(body)).into_response()
    }
}

impl From<ControlError> for ApiError {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::PlanNotFound(id) => ApiError::plan_not_found(&id),
            ControlError::AlreadyRunning => {
                ApiError::new(ErrorCode::OrchestratorAlreadyRunning, "orchestrator already running")
            }
            ControlError::NotRunning => {
                ApiError::new(ErrorCode::OrchestratorNotRunning, "orchestrator is not running")
            }
            ControlError::StartFailed(message) => ApiError::new(ErrorCode::StartFailed, message),
            ControlError::StopFailed(message) => ApiError::new(ErrorCode::StopFailed, message),
            ControlError::InvalidArgument(message) => {
                ApiError::new(ErrorCode::InvalidArgument, message)
            }
            ControlError::Internal(message) => ApiError::new(ErrorCode::InternalError, message),
        }
    }
}
