#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
    Config(ConfigError),
    Cache(CacheError),
}

impl std::fmt::Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "server io error: {err}"),
            Self::Config(err) => write!(f, "server configuration error: {err}"),
            Self::Cache(err) => write!(f, "pending cache error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<ConfigError> for ServerError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<CacheError> for ServerError {
    fn from(value: CacheError) -> Self {
        Self::Cache(value)
    }
}

#[derive(Debug)]
struct HttpApiError {
    status: StatusCode,
    error: ApiError,
}

impl HttpApiError {
    fn invalid_request(message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            error: ApiError::new(ErrorCode::InvalidRequest, message, details),
        }
    }

    fn from_ledger(err: LedgerError) -> Self {
        match err {
            LedgerError::Connectivity(message) => Self {
                status: StatusCode::SERVICE_UNAVAILABLE,
                error: ApiError::new(ErrorCode::LedgerUnavailable, message, None),
            },
            LedgerError::Read { kind, message } => Self {
                status: StatusCode::BAD_GATEWAY,
                error: ApiError::new(
                    ErrorCode::LedgerReadFailed,
                    message,
                    Some(match kind {
                        ReadErrorKind::Reverted => "kind=reverted".to_string(),
                        ReadErrorKind::UnsupportedMethod => "kind=unsupported_method".to_string(),
                    }),
                ),
            },
            LedgerError::Submission(message) => Self {
                status: StatusCode::BAD_GATEWAY,
                error: ApiError::new(ErrorCode::SubmissionRejected, message, None),
            },
            LedgerError::Unauthorized {
                product_id,
                owner,
                caller,
            } => Self {
                status: StatusCode::FORBIDDEN,
                error: ApiError::new(
                    ErrorCode::NotOwner,
                    "caller is not the current product owner",
                    Some(format!(
                        "product_id={product_id} owner={owner} caller={caller}"
                    )),
                ),
            },
            LedgerError::ProductNotFound(product_id) => Self {
                status: StatusCode::NOT_FOUND,
                error: ApiError::new(
                    ErrorCode::ProductNotFound,
                    "product does not exist on the ledger",
                    Some(format!("product_id={product_id}")),
                ),
            },
            LedgerError::InvalidInput(message) => Self::invalid_request(message, None),
        }
    }

    fn from_store(err: StoreError) -> Self {
        match err {
            StoreError::EmptyField(field) => Self::invalid_request(
                "missing required fields",
                Some(format!("field={field}")),
            ),
            StoreError::Io(io_err) => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::new(
                    ErrorCode::StorageFailed,
                    "failed to write to the demand dataset",
                    Some(io_err.to_string()),
                ),
            },
        }
    }

    fn from_runner(err: RunnerError) -> Self {
        match err {
            RunnerError::TimedOut(timeout) => Self {
                status: StatusCode::GATEWAY_TIMEOUT,
                error: ApiError::new(
                    ErrorCode::RunnerTimedOut,
                    "model run did not finish in time",
                    Some(format!("timeout_secs={}", timeout.as_secs())),
                ),
            },
            other => Self {
                status: StatusCode::INTERNAL_SERVER_ERROR,
                error: ApiError::new(ErrorCode::RunnerFailed, other.to_string(), None),
            },
        }
    }
}

impl IntoResponse for HttpApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.error)).into_response()
    }
}
