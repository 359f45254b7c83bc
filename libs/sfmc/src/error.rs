use reqwest::StatusCode;
use thiserror::Error;

const MAX_BODY: usize = 512;

/// Failure of the client-credentials exchange.
#[derive(Debug, Error)]
pub enum TokenError {
    #[error("sfmc token transport error")]
    Transport(#[source] reqwest::Error),
    #[error("sfmc token request rejected (status {status}): {body}")]
    Rejected { status: StatusCode, body: String },
    #[error("sfmc token response decode error")]
    Decode(#[source] reqwest::Error),
}

/// Terminal outcome of a single forwarding attempt.
#[derive(Debug, Error)]
pub enum ForwardError {
    /// The token could not be obtained; the cache is left as it was.
    #[error("could not obtain sfmc access token")]
    Auth(#[from] TokenError),
    /// 401 on the row write; the cached token has been dropped.
    #[error("sfmc rejected the access token: {body}")]
    StaleToken { body: String },
    /// 404 on the row write, usually a wrong Data Extension external key.
    #[error("sfmc data extension not found: {body}")]
    NotFound { body: String },
    /// 400 on the row write, usually a column mismatch.
    #[error("sfmc rejected the row shape: {body}")]
    Schema { body: String },
    #[error("sfmc row upsert failed (status {status:?}): {message}")]
    Unclassified {
        status: Option<StatusCode>,
        message: String,
    },
}

impl ForwardError {
    /// Maps a non-success status of the row upsert to its error class.
    pub fn from_status(status: StatusCode, body: String) -> Self {
        let body = truncate(body);
        match status {
            StatusCode::UNAUTHORIZED => ForwardError::StaleToken { body },
            StatusCode::NOT_FOUND => ForwardError::NotFound { body },
            StatusCode::BAD_REQUEST => ForwardError::Schema { body },
            other => ForwardError::Unclassified {
                status: Some(other),
                message: body,
            },
        }
    }

    pub fn transport(err: reqwest::Error) -> Self {
        ForwardError::Unclassified {
            status: None,
            message: err.to_string(),
        }
    }

    /// Stable label used for metrics and structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ForwardError::Auth(_) => "auth",
            ForwardError::StaleToken { .. } => "stale_token",
            ForwardError::NotFound { .. } => "not_found",
            ForwardError::Schema { .. } => "schema",
            ForwardError::Unclassified { .. } => "unclassified",
        }
    }
}

pub(crate) fn truncate(mut body: String) -> String {
    if body.len() > MAX_BODY {
        let mut cut = MAX_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
    }
    body
}
