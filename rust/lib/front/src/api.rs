//! Response envelope and the one place that reacts to API failures.
//!
//! Every call goes through [`StatusHandler`]: non-`OK` statuses, validation
//! errors and plain error lists are reported to the user there and turned
//! into an [`ApiError`] for the caller, who only sees the payload on success.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use pmp_query::{Navigator, PageQueryUrl, QueryValues, UrlObject};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{error, warn};

use crate::busy::BusyCounter;
use crate::session::SessionContext;
use crate::urls;

/// Request header carrying the session's access token.
pub const ACCESS_TOKEN_HEADER: &str = "X-User-Access-Token";

const NO_PERMISSION_MESSAGE: &str = "You do not have permission to use this feature.";
const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired.\nRestart now?";
const LOGIN_REQUIRED_MESSAGE: &str = "Redirecting to the sign-in page.";
const NOT_FOUND_MESSAGE: &str = "The page or data does not exist.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiStatus {
    Ok,
    NoPermission,
    InvalidAccessToken,
    LoginRequired,
    NotFound,
    #[serde(other)]
    Unknown,
}

impl fmt::Display for ApiStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ApiStatus::Ok => "OK",
            ApiStatus::NoPermission => "NO_PERMISSION",
            ApiStatus::InvalidAccessToken => "INVALID_ACCESS_TOKEN",
            ApiStatus::LoginRequired => "LOGIN_REQUIRED",
            ApiStatus::NotFound => "NOT_FOUND",
            ApiStatus::Unknown => "UNKNOWN",
        })
    }
}

/// One field-level validation failure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValidationError {
    /// Location of the offending field, outermost first.
    #[serde(default)]
    pub loc: Vec<Value>,
    #[serde(default)]
    pub msg: String,
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let loc: Vec<String> = self
            .loc
            .iter()
            .map(|part| match part {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();
        write!(f, "{} : {}", loc.join(","), self.msg)
    }
}

/// Envelope every endpoint answers with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub status: ApiStatus,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub errors: Vec<String>,
    #[serde(default)]
    pub validation_errors: Vec<ValidationError>,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ApiError {
    #[error("request failed with status {0}")]
    Status(ApiStatus),

    #[error("{}", join_lines(.0))]
    Validation(Vec<ValidationError>),

    #[error("{}", .0.join("\n"))]
    Rejected(Vec<String>),

    #[error("response carried no data")]
    MissingData,

    #[error("upload aborted")]
    Aborted,

    #[error("{0}")]
    Transport(String),
}

fn join_lines(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// User-facing prompts.
pub trait Notifier: Send + Sync {
    fn alert(&self, message: &str);

    /// Ask a yes/no question.
    fn confirm(&self, message: &str) -> bool;
}

/// Notifier for hosts without a UI: alerts become warnings and every
/// confirmation gets the same answer.
pub struct TracingNotifier {
    pub confirm_answer: bool,
}

impl Notifier for TracingNotifier {
    fn alert(&self, message: &str) {
        warn!(message, "alert");
    }

    fn confirm(&self, message: &str) -> bool {
        warn!(message, answer = self.confirm_answer, "confirm");
        self.confirm_answer
    }
}

/// What the handler does about a status.
#[derive(Debug, Clone, PartialEq)]
pub enum Reaction {
    Nothing,
    Alert(String),
    Redirect(UrlObject),
    AlertThenRedirect(String, UrlObject),
    /// Redirect only if the user agrees.
    ConfirmThenRedirect(String, UrlObject),
}

pub struct StatusHandler {
    session: Arc<SessionContext>,
    navigator: Arc<dyn Navigator>,
    notifier: Arc<dyn Notifier>,
    sign_in: PageQueryUrl,
}

impl StatusHandler {
    pub fn new(
        session: Arc<SessionContext>,
        navigator: Arc<dyn Navigator>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            session,
            navigator,
            notifier,
            sign_in: urls::sign_in(),
        }
    }

    /// Decide the reaction to `status` given the current session and location.
    pub fn reaction(&self, status: ApiStatus) -> Reaction {
        match status {
            ApiStatus::Ok => Reaction::Nothing,
            ApiStatus::NoPermission => Reaction::Alert(NO_PERMISSION_MESSAGE.to_string()),
            ApiStatus::InvalidAccessToken => {
                if self.session.access_token().is_none() {
                    let return_to = self.navigator.location().href();
                    Reaction::Redirect(
                        self.sign_in
                            .url(&QueryValues::new().set(urls::RETURN_TO, return_to)),
                    )
                } else {
                    Reaction::ConfirmThenRedirect(
                        SESSION_EXPIRED_MESSAGE.to_string(),
                        UrlObject::new(self.sign_in.pathname()),
                    )
                }
            }
            ApiStatus::LoginRequired => Reaction::AlertThenRedirect(
                LOGIN_REQUIRED_MESSAGE.to_string(),
                self.sign_in.url(&QueryValues::new()),
            ),
            ApiStatus::NotFound | ApiStatus::Unknown => {
                Reaction::Alert(NOT_FOUND_MESSAGE.to_string())
            }
        }
    }

    pub fn apply(&self, reaction: Reaction) {
        match reaction {
            Reaction::Nothing => {}
            Reaction::Alert(message) => self.notifier.alert(&message),
            Reaction::Redirect(url) => self.navigator.replace(url),
            Reaction::AlertThenRedirect(message, url) => {
                self.notifier.alert(&message);
                self.navigator.replace(url);
            }
            Reaction::ConfirmThenRedirect(message, url) => {
                if self.notifier.confirm(&message) {
                    self.navigator.replace(url);
                }
            }
        }
    }

    pub fn handle_status(&self, status: ApiStatus) {
        self.apply(self.reaction(status));
    }

    pub fn handle_validation_errors(&self, errors: &[ValidationError]) {
        error!(count = errors.len(), "validation errors");
        let message = join_lines(errors);
        if message.trim().is_empty() {
            let dump = serde_json::to_string_pretty(errors).unwrap_or_default();
            self.notifier.alert(&dump);
        } else {
            self.notifier.alert(&message);
        }
    }

    pub fn handle_errors(&self, errors: &[String]) {
        self.notifier.alert(&errors.join("\n"));
    }

    /// Report a failure that never produced a response.
    pub fn catch(&self, err: &ApiError) {
        error!(error = %err, "api call failed");
        self.notifier.alert(&err.to_string());
    }

    /// Unwrap `res`, reporting anything but a clean `OK` with data.
    pub fn handle_response<T>(&self, res: ApiResponse<T>) -> Result<T, ApiError> {
        if res.status != ApiStatus::Ok {
            self.handle_status(res.status);
            return Err(ApiError::Status(res.status));
        }
        if !res.validation_errors.is_empty() {
            self.handle_validation_errors(&res.validation_errors);
            return Err(ApiError::Validation(res.validation_errors));
        }
        if !res.errors.is_empty() {
            self.handle_errors(&res.errors);
            return Err(ApiError::Rejected(res.errors));
        }
        res.data.ok_or(ApiError::MissingData)
    }

    /// Headers every request carries.
    pub fn before_request(&self, headers: &mut HashMap<String, String>) {
        if let Some(token) = self.session.access_token() {
            headers.insert(ACCESS_TOKEN_HEADER.to_string(), token);
        }
    }

    /// Run one API call: UI locked for its duration, optional pacing delay,
    /// failures reported exactly once.
    pub async fn run<T, F>(&self, busy: &BusyCounter, delay: Duration, request: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<ApiResponse<T>, ApiError>>,
    {
        busy.with(async {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            match request.await {
                Ok(res) => self.handle_response(res),
                Err(e) => {
                    self.catch(&e);
                    Err(e)
                }
            }
        })
        .await
    }

    /// Run an upload. Failures after [`AbortHandle::abort`] are not reported.
    pub async fn run_upload<T, F>(&self, abort: &AbortHandle, request: F) -> Result<T, ApiError>
    where
        F: Future<Output = Result<ApiResponse<T>, ApiError>>,
    {
        match request.await {
            Ok(res) => self.handle_response(res),
            Err(_) if abort.is_aborted() => Err(ApiError::Aborted),
            Err(e) => {
                self.catch(&e);
                Err(e)
            }
        }
    }
}

/// Cancellation flag shared between an upload and whoever may cancel it.
#[derive(Debug, Clone, Default)]
pub struct AbortHandle {
    aborted: Arc<AtomicBool>,
}

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark aborted. Only the first call returns `true`.
    pub fn abort(&self) -> bool {
        !self.aborted.swap(true, Ordering::SeqCst)
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::SeqCst)
    }
}
