//! View state for a single remote request.

use std::fmt;

use super::ClientError;

/// Coarse failure category a front end can branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Unauthorized,
    NotFound,
    Validation,
    Conflict,
    Server,
    Transport,
}

impl ErrorKind {
    #[must_use]
    pub const fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::Unauthorized,
            404 => Self::NotFound,
            400 | 422 => Self::Validation,
            409 => Self::Conflict,
            _ => Self::Server,
        }
    }
}

impl From<&ClientError> for ErrorKind {
    fn from(err: &ClientError) -> Self {
        match err {
            ClientError::Http { status, .. } => Self::from_status(*status),
            ClientError::Transport(_) | ClientError::InvalidUrl(_) => Self::Transport,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Unauthorized => "not authorized",
            Self::NotFound => "not found",
            Self::Validation => "invalid input",
            Self::Conflict => "conflicts with the current state",
            Self::Server => "server error",
            Self::Transport => "could not reach the server",
        };
        f.write_str(s)
    }
}

/// Exactly one of idle, in flight, loaded or failed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RequestState<T> {
    #[default]
    Idle,
    Loading,
    Loaded(T),
    Failed(ErrorKind),
}

impl<T> RequestState<T> {
    /// Settles a finished request.
    pub fn from_result(result: Result<T, ClientError>) -> Self {
        match result {
            Ok(value) => Self::Loaded(value),
            Err(err) => {
                tracing::debug!("Request failed: {err}");
                Self::Failed(ErrorKind::from(&err))
            }
        }
    }

    #[must_use]
    pub const fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    #[must_use]
    pub const fn loaded(&self) -> Option<&T> {
        match self {
            Self::Loaded(value) => Some(value),
            _ => None,
        }
    }

    #[must_use]
    pub const fn error(&self) -> Option<ErrorKind> {
        match self {
            Self::Failed(kind) => Some(*kind),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> RequestState<U> {
        match self {
            Self::Idle => RequestState::Idle,
            Self::Loading => RequestState::Loading,
            Self::Loaded(value) => RequestState::Loaded(f(value)),
            Self::Failed(kind) => RequestState::Failed(kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn http(status: u16) -> ClientError {
        ClientError::Http {
            status,
            message: "boom".to_string(),
        }
    }

    #[test]
    fn defaults_to_idle() {
        let state: RequestState<()> = RequestState::default();
        assert_eq!(state, RequestState::Idle);
        assert!(!state.is_loading());
        assert!(RequestState::<()>::Loading.is_loading());
    }

    #[test]
    fn success_becomes_loaded() {
        let state = RequestState::from_result(Ok(vec![1, 2]));
        assert_eq!(state.loaded(), Some(&vec![1, 2]));
        assert_eq!(state.error(), None);
        assert_eq!(state.map(|v| v.len()), RequestState::Loaded(2));
    }

    #[test]
    fn http_statuses_map_to_kinds() {
        let cases = [
            (401, ErrorKind::Unauthorized),
            (404, ErrorKind::NotFound),
            (400, ErrorKind::Validation),
            (409, ErrorKind::Conflict),
            (500, ErrorKind::Server),
            (503, ErrorKind::Server),
        ];
        for (status, kind) in cases {
            let state: RequestState<()> = RequestState::from_result(Err(http(status)));
            assert_eq!(state, RequestState::Failed(kind), "status {status}");
        }
    }

    #[test]
    fn bad_url_is_a_transport_failure() {
        let err = ClientError::from(url::Url::parse("::").unwrap_err());
        let state: RequestState<()> = RequestState::from_result(Err(err));
        assert_eq!(state.error(), Some(ErrorKind::Transport));
    }
}
