use axum::{http::StatusCode, response::IntoResponse, Json};

#[derive(Debug)]
pub enum RequestError {
    /// Field-level failures, all collected in one response.
    Validation(Vec<FieldError>),
    BadRequest(&'static str),
    NotAuthorized(&'static str),
    Forbidden,
    NotFound(&'static str),
    ServerError,
    DatabaseError(sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> FieldError {
        FieldError {
            field,
            message: message.into(),
        }
    }
}

#[derive(serde::Serialize)]
pub struct ErrorsJson {
    errors: &'static str,
}

impl From<sqlx::Error> for RequestError {
    fn from(value: sqlx::Error) -> Self {
        Self::DatabaseError(value)
    }
}

impl RequestError {
    /// Whether the underlying database error is a UNIQUE constraint
    /// violation on the given column (`"table.column"`).
    pub fn is_unique_violation(&self, column: &str) -> bool {
        match self {
            RequestError::DatabaseError(sqlx::Error::Database(e)) => {
                let message = e.message();
                message.contains("UNIQUE constraint failed") && message.contains(column)
            }
            _ => false,
        }
    }

    pub fn validation(field: &'static str, message: impl Into<String>) -> RequestError {
        RequestError::Validation(vec![FieldError::new(field, message)])
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> axum::response::Response {
        let (status_code, body) = match self {
            RequestError::Validation(fields) => {
                let mut map = serde_json::Map::new();
                for error in fields {
                    let messages = map
                        .entry(error.field)
                        .or_insert_with(|| serde_json::Value::Array(Vec::new()));
                    if let Some(messages) = messages.as_array_mut() {
                        messages.push(error.message.into());
                    }
                }
                return (StatusCode::BAD_REQUEST, Json(serde_json::Value::Object(map)))
                    .into_response();
            }
            RequestError::BadRequest(message) => (StatusCode::BAD_REQUEST, ErrorsJson { errors: message }),
            RequestError::NotAuthorized(message) => {
                (StatusCode::UNAUTHORIZED, ErrorsJson { errors: message })
            }
            RequestError::Forbidden => (StatusCode::FORBIDDEN, ErrorsJson { errors: "forbidden" }),
            RequestError::NotFound(message) => (StatusCode::NOT_FOUND, ErrorsJson { errors: message }),
            RequestError::ServerError => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorsJson {
                    errors: "internal server error",
                },
            ),
            RequestError::DatabaseError(e) => {
                tracing::error!("database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorsJson {
                        errors: "internal server error",
                    },
                )
            }
        };
        (status_code, Json(body)).into_response()
    }
}
