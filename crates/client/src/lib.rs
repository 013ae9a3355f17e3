//! Xeno Armory client library.
//!
//! Typed client for the armory REST backend: product browsing and filtering,
//! a server-synchronized cart, checkout, credit top-up, order history, and
//! the admin inventory surface.
//!
//! # Architecture
//!
//! - The backend is the source of truth for the cart - every mutation is
//!   followed by a full refetch rather than an optimistic local update
//! - The session store is the single owner of the bearer credential; no
//!   component reads persisted session state directly
//! - Transient user-facing messages and cross-component refresh signals flow
//!   through one broadcast [`notify::Notifier`]
//!
//! # Example
//!
//! ```rust,ignore
//! use xeno_armory_client::{ArmoryClient, config::ClientConfig};
//!
//! let client = ArmoryClient::new(&ClientConfig::from_env()?)?;
//! client.account().login("commander", "hunter2").await?;
//!
//! let weapon = client.catalog().fetch_one(WeaponId::new(1)).await?;
//! client.cart().add(&weapon, 2).await?;
//! let confirmation = client.checkout().submit_order().await?;
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod account;
pub mod admin;
pub mod api;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod notify;
pub mod session;

use std::sync::Arc;

use crate::account::AccountService;
use crate::admin::AdminEditor;
use crate::api::ApiClient;
use crate::cart::CartManager;
use crate::catalog::Catalog;
use crate::checkout::CheckoutFlow;
use crate::config::{ClientConfig, ConfigError};
use crate::notify::Notifier;
use crate::session::SessionStore;

/// Top-level handle wiring the subsystems together.
///
/// Cheap to clone; all clones share the same session store, cart state, and
/// notification channel.
#[derive(Clone)]
pub struct ArmoryClient {
    inner: Arc<ArmoryClientInner>,
}

struct ArmoryClientInner {
    account: AccountService,
    admin: AdminEditor,
    cart: CartManager,
    catalog: Catalog,
    checkout: CheckoutFlow,
    notifier: Notifier,
    session: SessionStore,
}

impl ArmoryClient {
    /// Build a client from configuration.
    ///
    /// Loads any previously persisted session from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let notifier = Notifier::new();
        let session = SessionStore::load(config.session_file.clone(), notifier.clone());
        let api = ApiClient::new(config, session.clone())?;

        let cart = CartManager::new(api.clone(), session.clone(), notifier.clone());
        let catalog = Catalog::new(api.clone());
        let checkout = CheckoutFlow::new(api.clone(), cart.clone(), notifier.clone());
        let account = AccountService::new(api.clone(), session.clone(), cart.clone(), notifier.clone());
        let admin = AdminEditor::new(api, session.clone(), catalog.clone(), notifier.clone());

        Ok(Self {
            inner: Arc::new(ArmoryClientInner {
                account,
                admin,
                cart,
                catalog,
                checkout,
                notifier,
                session,
            }),
        })
    }

    /// Login, registration, profile, and top-up operations.
    #[must_use]
    pub fn account(&self) -> &AccountService {
        &self.inner.account
    }

    /// Admin inventory editor (role-gated client-side).
    #[must_use]
    pub fn admin(&self) -> &AdminEditor {
        &self.inner.admin
    }

    /// The server-synchronized cart.
    #[must_use]
    pub fn cart(&self) -> &CartManager {
        &self.inner.cart
    }

    /// Read-only product catalog.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }

    /// Order submission and history.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutFlow {
        &self.inner.checkout
    }

    /// The process-wide notification channel.
    #[must_use]
    pub fn notifier(&self) -> &Notifier {
        &self.inner.notifier
    }

    /// The session store.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }
}
