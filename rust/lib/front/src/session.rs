//! Signed-in user session.
//!
//! [`SessionContext`] owns the access token and account key, mirrors them
//! into per-session storage under two keys that are always cleared together,
//! and publishes every change to the [`FrontStore`] at [`STATE_PATH`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use pmp_query::{Navigator, UrlObject, parse_int_safe};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::api::ApiError;
use crate::error::FrontError;
use crate::store::FrontStore;
use crate::urls;

pub const ACCESS_TOKEN_KEY: &str = "ai-pmp.front.AccessToken";
pub const PK_KEY: &str = "ai-pmp.front.pk";
pub const STATE_PATH: &str = "session/state";

/// Per-session key/value storage, scoped to one browsing session.
pub trait SessionStorage: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.items.read().unwrap().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.items
            .write()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.items.write().unwrap().remove(key);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub access_token: Option<String>,
    pub pk: Option<i64>,
    /// Set once the stored token has been checked against the server.
    pub initialized: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenRes {
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub pk: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub pk: i64,
}

/// The signed-in user, if any.
pub fn current_user(state: &SessionState) -> Option<UserInfo> {
    state.pk.filter(|pk| *pk != 0).map(|pk| UserInfo { pk })
}

/// Remote calls the session depends on.
#[async_trait]
pub trait SessionApi: Send + Sync {
    /// Validate the current credentials and return the account behind them.
    async fn access_token_get(&self) -> Result<AccessTokenRes, ApiError>;

    async fn sign_in(&self, pk: &str) -> Result<AccessTokenRes, ApiError>;

    async fn sign_out(&self) -> Result<(), ApiError>;
}

pub struct SessionContext {
    storage: Arc<dyn SessionStorage>,
    store: Arc<FrontStore>,
    state: RwLock<SessionState>,
}

impl SessionContext {
    /// Restore whatever the storage holds. Nothing is validated until
    /// [`initialize`](Self::initialize).
    pub fn new(storage: Arc<dyn SessionStorage>, store: Arc<FrontStore>) -> Self {
        let state = SessionState {
            access_token: storage.get(ACCESS_TOKEN_KEY).filter(|t| !t.is_empty()),
            pk: storage.get(PK_KEY).and_then(|pk| parse_int_safe(&pk)),
            initialized: false,
        };
        let ctx = Self {
            storage,
            store,
            state: RwLock::new(state),
        };
        ctx.publish();
        ctx
    }

    pub fn state(&self) -> SessionState {
        self.state.read().unwrap().clone()
    }

    pub fn access_token(&self) -> Option<String> {
        self.state.read().unwrap().access_token.clone()
    }

    pub fn is_initialized(&self) -> bool {
        self.state.read().unwrap().initialized
    }

    pub fn current_user(&self) -> Option<UserInfo> {
        current_user(&self.state.read().unwrap())
    }

    pub fn store(&self) -> &Arc<FrontStore> {
        &self.store
    }

    /// Revalidate the session against the server.
    ///
    /// The check runs even without a stored token since the server may still
    /// recognize the client. A failed check tears the session down. Either
    /// way the session ends up initialized.
    pub async fn initialize(&self, api: &dyn SessionApi) -> Option<UserInfo> {
        self.update(|s| s.initialized = false);
        match api.access_token_get().await {
            Ok(account) => self.set_account(account),
            Err(e) => {
                debug!(error = %e, "session revalidation failed");
                self.teardown();
            }
        }
        self.update(|s| s.initialized = true);
        let user = self.current_user();
        info!(pk = ?user.map(|u| u.pk), "session initialized");
        user
    }

    /// Sign in as `pk`, then load the account behind the new token.
    pub async fn sign_in(&self, api: &dyn SessionApi, pk: &str) -> Result<Option<UserInfo>, FrontError> {
        let res = api.sign_in(pk).await?;
        if let Some(token) = res.access_token.filter(|t| !t.is_empty()) {
            self.set_access_token(&token);
            let account = api.access_token_get().await?;
            self.set_account(account);
        }
        Ok(self.current_user())
    }

    /// Switch to another account. The current account stays in place until
    /// the new one has signed in.
    pub async fn switch_user(&self, api: &dyn SessionApi, pk: &str) -> Result<Option<UserInfo>, FrontError> {
        let previous = self.current_user();
        let user = self.sign_in(api, pk).await?;
        info!(from = ?previous.map(|u| u.pk), to = ?user.map(|u| u.pk), "switched user");
        Ok(user)
    }

    /// Sign out remotely, then clear local state and go to the sign-in page.
    /// Local state is kept when the remote call fails.
    pub async fn sign_out(&self, api: &dyn SessionApi, navigator: &dyn Navigator) -> Result<(), FrontError> {
        api.sign_out().await?;
        self.teardown();
        navigator.replace(UrlObject::new(urls::sign_in().pathname()));
        Ok(())
    }

    /// Forget the session in memory and in storage.
    pub fn teardown(&self) {
        self.storage.remove(ACCESS_TOKEN_KEY);
        self.storage.remove(PK_KEY);
        self.update(|s| *s = SessionState::default());
    }

    fn set_access_token(&self, token: &str) {
        self.storage.set(ACCESS_TOKEN_KEY, token);
        self.update(|s| s.access_token = Some(token.to_string()));
    }

    fn set_account(&self, account: AccessTokenRes) {
        if let Some(token) = account.access_token.as_deref().filter(|t| !t.is_empty()) {
            self.storage.set(ACCESS_TOKEN_KEY, token);
            self.update(|s| s.access_token = Some(token.to_string()));
        }
        if let Some(pk) = account.pk.filter(|pk| *pk != 0) {
            self.storage.set(PK_KEY, &pk.to_string());
        }
        self.update(|s| s.pk = account.pk);
    }

    fn update<F: FnOnce(&mut SessionState)>(&self, f: F) {
        f(&mut self.state.write().unwrap());
        self.publish();
    }

    fn publish(&self) {
        let state = self.state();
        if let Err(e) = self.store.set_serialized(STATE_PATH, &state) {
            warn!(error = %e, "failed to publish session state");
        }
    }
}
