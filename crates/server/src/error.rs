use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use trajview_api::{StoreError, TrajectoryNotFound};

/// Unified API error type.
///
/// Produces `{"error": "<message>"}` JSON responses. Missing trajectories
/// additionally carry the requested id and the paths that were tried.
#[derive(Debug)]
pub struct ApiErr {
    status: StatusCode,
    message: String,
    not_found: Option<TrajectoryNotFound>,
}

impl ApiErr {
    fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
            not_found: None,
        }
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
    }

    pub fn trajectory_not_found(id: impl Into<String>, tried: Vec<String>) -> Self {
        let message = "trajectory not found".to_string();
        Self {
            status: StatusCode::NOT_FOUND,
            not_found: Some(TrajectoryNotFound {
                error: message.clone(),
                id: id.into(),
                tried,
            }),
            message,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<StoreError> for ApiErr {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { id, tried } => Self::trajectory_not_found(id, tried),
            StoreError::InvalidId(id) => Self::bad_request(format!("invalid trajectory id: {id:?}")),
            other => {
                tracing::error!("store error: {other}");
                Self::internal("failed to read trajectory store")
            }
        }
    }
}

impl IntoResponse for ApiErr {
    fn into_response(self) -> Response {
        match self.not_found {
            Some(body) => (self.status, Json(body)).into_response(),
            None => (
                self.status,
                Json(serde_json::json!({"error": self.message})),
            )
                .into_response(),
        }
    }
}
