//! Front-end state shared by every page.
//!
//! - [`FrontStore`]: path-addressed state with `+` / `#` pattern subscriptions
//! - [`SessionContext`]: access token and account, backed by session storage
//! - [`BusyCounter`]: reentrant UI lock, mirrored at `block/locked`
//! - [`StatusHandler`]: the single place API failures are reported
//! - [`FrontConfig`]: settings from the public build environment

pub mod api;
pub mod busy;
pub mod config;
pub mod error;
pub mod session;
pub mod store;
pub mod topic;
pub mod urls;

pub use api::{
    ACCESS_TOKEN_HEADER, AbortHandle, ApiError, ApiResponse, ApiStatus, Notifier, Reaction,
    StatusHandler, TracingNotifier, ValidationError,
};
pub use busy::{BusyCounter, BusyGuard, LOCKED_PATH};
pub use config::FrontConfig;
pub use error::FrontError;
pub use session::{
    ACCESS_TOKEN_KEY, AccessTokenRes, MemoryStorage, PK_KEY, STATE_PATH, SessionApi,
    SessionContext, SessionState, SessionStorage, UserInfo, current_user,
};
pub use store::{ChangeHandler, FrontStore, SubscriptionId};
