//! Identity provider bridge
//!
//! Credential verification is delegated to an external identity provider
//! behind the `IdentityProvider` trait. Auth-state changes are published on
//! a watch channel; `IdentityBridge` subscribes once at startup and drives
//! the store's Guest/Authenticated transitions, triggering a full remote
//! hydration and a recipe-book load on sign-in.

use crate::error::{AppError, AuthError, Result};
use crate::store::app_store::AppStore;
use crate::store::models::ProfilePatch;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const MIN_PASSWORD_LENGTH: usize = 6;

/// The signed-in identity as reported by the provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub email: String,
    pub display_name: Option<String>,
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal>;

    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Principal>;

    async fn sign_out(&self) -> Result<()>;

    /// Current principal plus every subsequent transition. Fires with None
    /// on sign-out, whether explicit or from session expiry.
    fn subscribe(&self) -> watch::Receiver<Option<Principal>>;
}

/// Map a provider error code onto the coded taxonomy
fn map_auth_code(code: &str) -> AuthError {
    // Upstream prefixes codes with context, e.g. "INVALID_PASSWORD : ..."
    let code = code.split_whitespace().next().unwrap_or(code);
    match code {
        "INVALID_LOGIN_CREDENTIALS" | "INVALID_PASSWORD" | "EMAIL_NOT_FOUND"
        | "INVALID_EMAIL" => AuthError::InvalidCredential,
        "EMAIL_EXISTS" => AuthError::EmailAlreadyInUse,
        "WEAK_PASSWORD" => AuthError::WeakPassword,
        other => AuthError::Provider(other.to_string()),
    }
}

/// REST identity provider speaking the `accounts:*` endpoint family
pub struct RestIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    sender: watch::Sender<Option<Principal>>,
}

#[derive(Serialize)]
struct CredentialRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(rename = "returnSecureToken")]
    return_secure_token: bool,
}

#[derive(Deserialize)]
struct AccountResponse {
    email: String,
    #[serde(rename = "displayName")]
    display_name: Option<String>,
    #[serde(rename = "idToken")]
    id_token: Option<String>,
}

#[derive(Deserialize)]
struct UpstreamError {
    error: UpstreamErrorBody,
}

#[derive(Deserialize)]
struct UpstreamErrorBody {
    message: String,
}

impl RestIdentityProvider {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("nutritrack-auth")
            .build()?;
        let (sender, _) = watch::channel(None);
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
            sender,
        })
    }

    async fn call_accounts(
        &self,
        action: &str,
        body: &impl Serialize,
    ) -> Result<AccountResponse> {
        let url = format!("{}/accounts:{}", self.base_url, action);
        let response = self
            .http
            .post(&url)
            .query(&[("key", self.api_key.as_str())])
            .json(body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let code = response
                .json::<UpstreamError>()
                .await
                .map(|e| e.error.message)
                .unwrap_or_else(|_| status.to_string());
            return Err(map_auth_code(&code).into());
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl IdentityProvider for RestIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal> {
        let account = self
            .call_accounts(
                "signInWithPassword",
                &CredentialRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        let principal = Principal {
            email: account.email,
            display_name: account.display_name,
        };
        self.sender.send_replace(Some(principal.clone()));
        Ok(principal)
    }

    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Principal> {
        let account = self
            .call_accounts(
                "signUp",
                &CredentialRequest {
                    email,
                    password,
                    return_secure_token: true,
                },
            )
            .await?;

        // Attach the display name to the fresh account
        if let Some(token) = &account.id_token {
            let update = serde_json::json!({
                "idToken": token,
                "displayName": display_name,
                "returnSecureToken": false,
            });
            if let Err(e) = self.call_accounts("update", &update).await {
                tracing::warn!("Could not set display name after sign-up: {}", e);
            }
        }

        let principal = Principal {
            email: account.email,
            display_name: Some(display_name.to_string()),
        };
        self.sender.send_replace(Some(principal.clone()));
        Ok(principal)
    }

    async fn sign_out(&self) -> Result<()> {
        self.sender.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.sender.subscribe()
    }
}

/// Offline provider verifying against a fixed account table. Used by tests
/// and local development without a reachable provider.
pub struct StaticIdentityProvider {
    accounts: std::sync::Mutex<HashMap<String, (String, String)>>,
    sender: watch::Sender<Option<Principal>>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self {
            accounts: std::sync::Mutex::new(HashMap::new()),
            sender,
        }
    }

    pub fn with_account(self, email: &str, password: &str, name: &str) -> Self {
        self.accounts.lock().unwrap().insert(
            email.to_string(),
            (password.to_string(), name.to_string()),
        );
        self
    }
}

impl Default for StaticIdentityProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Principal> {
        let accounts = self.accounts.lock().unwrap();
        let (stored_password, name) = accounts
            .get(email)
            .ok_or(AuthError::InvalidCredential)?
            .clone();
        drop(accounts);

        if stored_password != password {
            return Err(AuthError::InvalidCredential.into());
        }
        let principal = Principal {
            email: email.to_string(),
            display_name: Some(name),
        };
        self.sender.send_replace(Some(principal.clone()));
        Ok(principal)
    }

    async fn sign_up(&self, email: &str, password: &str, display_name: &str) -> Result<Principal> {
        let mut accounts = self.accounts.lock().unwrap();
        if accounts.contains_key(email) {
            return Err(AuthError::EmailAlreadyInUse.into());
        }
        accounts.insert(
            email.to_string(),
            (password.to_string(), display_name.to_string()),
        );
        drop(accounts);

        let principal = Principal {
            email: email.to_string(),
            display_name: Some(display_name.to_string()),
        };
        self.sender.send_replace(Some(principal.clone()));
        Ok(principal)
    }

    async fn sign_out(&self) -> Result<()> {
        self.sender.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Principal>> {
        self.sender.subscribe()
    }
}

/// Drives the store through Guest/Authenticated transitions for the
/// lifetime of the process.
pub struct IdentityBridge {
    store: AppStore,
    provider: Arc<dyn IdentityProvider>,
}

impl IdentityBridge {
    pub fn new(store: AppStore, provider: Arc<dyn IdentityProvider>) -> Self {
        Self { store, provider }
    }

    /// Credential sign-in with pre-flight validation of required fields
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Principal> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::Validation(
                "Please enter both email and password".to_string(),
            ));
        }
        self.provider.sign_in(email.trim(), password).await
    }

    /// Account creation with pre-flight validation
    pub async fn sign_up(&self, email: &str, password: &str, name: &str) -> Result<Principal> {
        if email.trim().is_empty() || password.is_empty() || name.trim().is_empty() {
            return Err(AppError::Validation(
                "Please fill in name, email and password".to_string(),
            ));
        }
        if password.len() < MIN_PASSWORD_LENGTH {
            return Err(AuthError::WeakPassword.into());
        }
        self.provider.sign_up(email.trim(), password, name.trim()).await
    }

    /// Subscribe to auth-state changes and apply them until the task is
    /// aborted or the provider goes away.
    pub fn start(&self) -> JoinHandle<()> {
        let store = self.store.clone();
        let mut receiver = self.provider.subscribe();

        tokio::spawn(async move {
            tracing::info!("Identity bridge started");
            while receiver.changed().await.is_ok() {
                let principal = receiver.borrow_and_update().clone();
                match principal {
                    Some(principal) => {
                        tracing::info!("Signed in as {}", principal.email);
                        store
                            .set_user(ProfilePatch {
                                is_authenticated: Some(true),
                                email: Some(principal.email),
                                name: Some(
                                    principal.display_name.unwrap_or_else(|| "User".to_string()),
                                ),
                                ..ProfilePatch::default()
                            })
                            .await;
                        store.sync_with_remote().await;
                        store.load_recipe_book().await;
                    }
                    None => {
                        tracing::info!("Signed out, reverting to guest");
                        store
                            .set_user(ProfilePatch {
                                is_authenticated: Some(false),
                                email: Some(String::new()),
                                name: Some("Guest".to_string()),
                                ..ProfilePatch::default()
                            })
                            .await;
                    }
                }
            }
            tracing::debug!("Identity bridge stopped");
        })
    }
}
