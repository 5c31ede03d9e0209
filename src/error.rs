use thiserror::Error;

/// Errors produced by the transport and facade layers.
#[derive(Error, Debug)]
pub enum BetfairError {
    /// No application key was configured; nothing is sent without one.
    #[error("application key is required (set BETFAIR_APP_KEY or betfair.api_key)")]
    MissingAppKey,

    /// Certificate material could not be read or parsed.
    #[error("TLS setup failed for {path}: {message}")]
    Setup { path: String, message: String },

    /// Invalid configuration file.
    #[error("configuration error: {0}")]
    Config(String),

    /// The login endpoint answered with a non-200 status.
    #[error("unable to authenticate: {reason} [{status}]")]
    Auth { status: u16, reason: String },

    /// The login endpoint answered 200 but refused the credentials.
    #[error("login rejected with status {login_status}")]
    LoginRejected { login_status: String },

    /// An RPC was attempted before any session token was stored.
    #[error("not logged in")]
    NotAuthenticated,

    /// Connection-level failure (DNS, TCP, TLS handshake) before a response arrived.
    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The call deadline elapsed; no further attempts are made.
    #[error("deadline exceeded after {attempts} attempt(s)")]
    DeadlineExceeded { attempts: u32 },

    /// An RPC response arrived with a non-200 status.
    #[error("API request failed with status {status}: {body}")]
    Status { status: u16, body: String },

    /// A structured error object inside an otherwise successful response.
    /// `exception_code` is the `APINGException` error code from `error.data`.
    #[error("error returned from API {code} [{message}]")]
    RemoteApi {
        code: i64,
        message: String,
        exception_code: Option<String>,
    },

    /// The response body could not be read after the status line arrived.
    #[error("failed to read response body: {0}")]
    Body(#[source] reqwest::Error),

    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),

    #[error("JSON decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl BetfairError {
    /// Whether the failure happened before any HTTP response was received.
    pub fn is_connection_failure(&self) -> bool {
        matches!(self, BetfairError::Transport(_))
    }

    /// Whether the remote service rejected the session token.
    pub fn is_session_error(&self) -> bool {
        match self {
            BetfairError::RemoteApi {
                message,
                exception_code,
                ..
            } => exception_code
                .as_deref()
                .into_iter()
                .chain(std::iter::once(message.as_str()))
                .any(|text| text.contains("INVALID_SESSION") || text.contains("NO_SESSION")),
            BetfairError::NotAuthenticated => true,
            _ => false,
        }
    }

    pub(crate) fn setup(path: impl Into<String>, message: impl ToString) -> Self {
        BetfairError::Setup {
            path: path.into(),
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, BetfairError>;
