//! Account service: login, registration, profile, and credit top-up.
//!
//! Successful login stores the session through the [`SessionStore`] (the
//! only writer) and reconciles the cart from the backend, so views observe
//! both changes through their usual signals instead of a full-page reload.

use thiserror::Error;
use tracing::{info, instrument};
use xeno_armory_core::Credits;

use crate::api::types::{
    Acknowledgement, LoginRequest, LoginResponse, Profile, RegisterRequest, TopupRequest,
    TopupResponse,
};
use crate::api::{ApiClient, ApiError};
use crate::cart::CartManager;
use crate::notify::{Notifier, Signal};
use crate::session::{Session, SessionError, SessionStore};

/// Errors from account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    /// Top-up amount must be positive; no request was issued.
    #[error("Top-up amount must be positive (got {0})")]
    InvalidAmount(Credits),

    /// Profile update with no fields set; no request was issued.
    #[error("No profile changes to send")]
    EmptyUpdate,

    /// The session could not be persisted.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The backend rejected the request or the request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Fields of a profile update; unset fields are left unchanged server-side.
#[derive(Debug, Default)]
pub struct ProfileUpdate {
    pub email: Option<String>,
    pub address: Option<String>,
    /// Avatar image to upload, as (file name, bytes).
    pub avatar: Option<(String, Vec<u8>)>,
}

impl ProfileUpdate {
    /// True when there is nothing to send.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.email.is_none() && self.address.is_none() && self.avatar.is_none()
    }
}

/// Login, registration, profile, and top-up operations.
#[derive(Clone)]
pub struct AccountService {
    api: ApiClient,
    session: SessionStore,
    cart: CartManager,
    notifier: Notifier,
}

impl AccountService {
    /// Create the account service.
    #[must_use]
    pub const fn new(
        api: ApiClient,
        session: SessionStore,
        cart: CartManager,
        notifier: Notifier,
    ) -> Self {
        Self {
            api,
            session,
            cart,
            notifier,
        }
    }

    /// Log in and store the session.
    ///
    /// The cart is reconciled from the backend afterwards so the carried
    /// cart of a returning user appears immediately.
    ///
    /// # Errors
    ///
    /// Returns an error on bad credentials or persistence failure.
    #[instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, AccountError> {
        let request = LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        };

        let response: LoginResponse = match self.api.post("/login", &request).await {
            Ok(response) => response,
            Err(e) => {
                let message = e
                    .server_message()
                    .map_or_else(|| e.to_string(), ToOwned::to_owned);
                self.notifier.error(message);
                return Err(e.into());
            }
        };

        let session = Session {
            token: response.token,
            display_name: username.to_string(),
            role: response.role,
        };
        self.session.store(session.clone())?;
        info!(user = %username, role = %session.role, "Logged in");

        // Best effort: a cart fetch failure should not fail the login.
        let _ = self.cart.fetch().await;

        self.notifier.success(format!("Signed in as {username}"));
        Ok(session)
    }

    /// Register a new account. The backend assigns the role; the user logs
    /// in separately afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if registration is rejected (e.g. duplicate name).
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<(), AccountError> {
        let request = RegisterRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        };

        match self.api.post::<_, Acknowledgement>("/register", &request).await {
            Ok(_) => {
                self.notifier
                    .success(format!("Account {username} registered, please log in"));
                Ok(())
            }
            Err(e) => {
                let message = e
                    .server_message()
                    .map_or_else(|| e.to_string(), ToOwned::to_owned);
                self.notifier.error(message);
                Err(e.into())
            }
        }
    }

    /// Explicit logout: clear the session and the session-dependent cart.
    pub fn logout(&self) {
        self.session.clear();
        self.cart.clear_local();
        self.notifier.info("Signed out");
    }

    /// Fetch the profile (credits, email, address, avatar).
    ///
    /// Listeners refetch this whenever [`Signal::ProfileUpdated`] fires.
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the request fails; a 401 drops
    /// the stored session.
    #[instrument(skip(self))]
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        match self.api.get("/profile").await {
            Ok(profile) => Ok(profile),
            Err(e) => {
                if e.is_unauthorized() {
                    self.session.invalidate();
                    self.cart.clear_local();
                }
                Err(e)
            }
        }
    }

    /// Update profile fields; multipart when an avatar is attached.
    ///
    /// # Errors
    ///
    /// Returns an error if the update is empty or rejected.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: ProfileUpdate) -> Result<(), AccountError> {
        if update.is_empty() {
            return Err(AccountError::EmptyUpdate);
        }

        let result: Result<Acknowledgement, ApiError> = if let Some((file_name, bytes)) =
            update.avatar
        {
            let mut form = reqwest::multipart::Form::new()
                .part("avatar", reqwest::multipart::Part::bytes(bytes).file_name(file_name));
            if let Some(email) = update.email {
                form = form.text("email", email);
            }
            if let Some(address) = update.address {
                form = form.text("address", address);
            }
            self.api.patch_form("/profile", form).await
        } else {
            #[derive(serde::Serialize)]
            struct JsonUpdate {
                #[serde(skip_serializing_if = "Option::is_none")]
                email: Option<String>,
                #[serde(skip_serializing_if = "Option::is_none")]
                address: Option<String>,
            }
            self.api
                .patch(
                    "/profile",
                    &JsonUpdate {
                        email: update.email,
                        address: update.address,
                    },
                )
                .await
        };

        match result {
            Ok(_) => {
                self.notifier.signal(Signal::ProfileUpdated);
                self.notifier.success("Profile updated");
                Ok(())
            }
            Err(e) => {
                let message = e
                    .server_message()
                    .map_or_else(|| e.to_string(), ToOwned::to_owned);
                self.notifier.error(message);
                Err(e.into())
            }
        }
    }

    /// Deposit credits ("top-up"), unrelated to the product catalog.
    ///
    /// # Errors
    ///
    /// Rejects non-positive amounts client-side without a request; backend
    /// failures are surfaced as notifications.
    #[instrument(skip(self))]
    pub async fn topup(&self, amount: Credits) -> Result<Credits, AccountError> {
        if !amount.is_positive() {
            let err = AccountError::InvalidAmount(amount);
            self.notifier.error(err.to_string());
            return Err(err);
        }

        match self
            .api
            .post::<_, TopupResponse>("/topup", &TopupRequest { amount })
            .await
        {
            Ok(response) => {
                self.notifier.signal(Signal::ProfileUpdated);
                self.notifier
                    .success(format!("Balance is now {}", response.new_balance));
                Ok(response.new_balance)
            }
            Err(e) => {
                let message = e
                    .server_message()
                    .map_or_else(|| e.to_string(), ToOwned::to_owned);
                self.notifier.error(message);
                Err(e.into())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;

    fn service() -> (AccountService, Notifier) {
        let notifier = Notifier::new();
        let path = std::env::temp_dir().join(format!("armory-account-test-{}", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let session = SessionStore::load(path, notifier.clone());
        let api = ApiClient::new(&ClientConfig::default(), session.clone()).expect("api client");
        let cart = CartManager::new(api.clone(), session.clone(), notifier.clone());
        (
            AccountService::new(api, session, cart, notifier.clone()),
            notifier,
        )
    }

    #[tokio::test]
    async fn test_topup_rejects_non_positive_amount() {
        let (account, notifier) = service();
        let mut rx = notifier.subscribe();

        // No request is issued, so this works without a running backend.
        let result = account.topup(Credits::ZERO).await;
        assert!(matches!(result, Err(AccountError::InvalidAmount(_))));

        let result = account.topup(Credits::new(-50)).await;
        assert!(matches!(result, Err(AccountError::InvalidAmount(_))));

        match rx.try_recv().expect("notification") {
            crate::notify::Event::Toast(toast) => {
                assert!(toast.message.contains("positive"));
            }
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_profile_update_emptiness() {
        assert!(ProfileUpdate::default().is_empty());
        let update = ProfileUpdate {
            address: Some("Orbital Ring 7".to_string()),
            ..Default::default()
        };
        assert!(!update.is_empty());
    }

    #[tokio::test]
    async fn test_empty_profile_update_is_rejected_without_a_request() {
        let (account, notifier) = service();
        let mut rx = notifier.subscribe();

        // No server is running; a network call here would fail with an
        // HTTP error instead of EmptyUpdate.
        let result = account.update_profile(ProfileUpdate::default()).await;
        assert!(matches!(result, Err(AccountError::EmptyUpdate)));

        // No ProfileUpdated signal, no toast.
        assert!(rx.try_recv().is_err());
    }
}
