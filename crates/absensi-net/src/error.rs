use thiserror::Error;

/// Errors from the attendance API client.
#[derive(Error, Debug)]
pub enum ApiError {
    /// Connection, timeout, or body-decode failure.
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server answered with a non-2xx status.  `message` is the
    /// optional human-readable explanation from the response body.
    #[error("Server rejected the request (status {status})")]
    Server { status: u16, message: Option<String> },
}

impl ApiError {
    /// The string shown to the user: the server's message verbatim when
    /// present, otherwise a generic failure line.
    pub fn user_message(&self) -> String {
        match self {
            Self::Server {
                message: Some(msg), ..
            } => msg.clone(),
            _ => "Gagal menghubungi server. Coba lagi.".to_string(),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_message_is_forwarded_verbatim() {
        let err = ApiError::Server {
            status: 403,
            message: Some("Di luar radius lokasi".into()),
        };
        assert_eq!(err.user_message(), "Di luar radius lokasi");
    }

    #[test]
    fn missing_message_falls_back_to_generic() {
        let err = ApiError::Server {
            status: 500,
            message: None,
        };
        assert_eq!(err.user_message(), "Gagal menghubungi server. Coba lagi.");
    }
}
