//! Cart state manager.
//!
//! Owns the single up-to-date view of the current user's cart. The backend
//! is the arbiter of cart contents: every mutation round-trips through it
//! and is followed by a full refetch, so no optimistic local update is ever
//! trusted. After any settled mutation (success or failure) the lines held
//! here equal the backend's cart for the current session - the one
//! exception is [`CartManager::clear_local`], used immediately after a
//! successful checkout when the server cart is already empty.
//!
//! Quantity updates submit the absolute target quantity for the line and
//! let the server reconcile. The historical client variants disagreed
//! between delta posts and delete-then-repost; the delta variant was buggy
//! (stale quantities producing wrong deltas), so neither is preserved.

use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{debug, instrument};
use xeno_armory_core::{Credits, WeaponId};

use crate::api::types::{CartMutation, CartRecord, Weapon};
use crate::api::{ApiClient, ApiError};
use crate::notify::{Notifier, Signal};
use crate::session::SessionStore;

/// Errors from cart operations.
#[derive(Debug, Error)]
pub enum CartError {
    /// No session credential present; no request was issued.
    #[error("Not logged in")]
    NotLoggedIn,

    /// Requested quantity exceeds the known stock; no request was issued.
    #[error("Only {stock} unit(s) of {name} in stock (requested {requested})")]
    ExceedsStock {
        name: String,
        stock: u32,
        requested: u32,
    },

    /// The weapon has no line in the current cart.
    #[error("Weapon {0} is not in the cart")]
    NotInCart(WeaponId),

    /// The backend rejected the mutation or the request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// One product+quantity pairing in the displayed cart, mirrored from a
/// server-side cart record.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub line_id: xeno_armory_core::CartLineId,
    pub weapon: Weapon,
    pub quantity: u32,
}

impl CartLine {
    /// Line subtotal: unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Credits {
        self.weapon.price.times(self.quantity)
    }
}

/// The authoritative client-side view of the cart.
///
/// Cheap to clone; all clones share the same line state.
#[derive(Debug, Clone)]
pub struct CartManager {
    inner: Arc<CartManagerInner>,
}

#[derive(Debug)]
struct CartManagerInner {
    api: ApiClient,
    session: SessionStore,
    notifier: Notifier,
    lines: RwLock<Vec<CartLine>>,
}

impl CartManager {
    /// Create an empty cart manager.
    #[must_use]
    pub fn new(api: ApiClient, session: SessionStore, notifier: Notifier) -> Self {
        Self {
            inner: Arc::new(CartManagerInner {
                api,
                session,
                notifier,
                lines: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Snapshot of the current lines.
    #[must_use]
    pub fn lines(&self) -> Vec<CartLine> {
        self.read_lines().clone()
    }

    /// Derived total over the current lines.
    #[must_use]
    pub fn total(&self) -> Credits {
        self.read_lines().iter().map(CartLine::subtotal).sum()
    }

    /// True when the displayed cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_lines().is_empty()
    }

    /// Refetch the authoritative cart from the backend.
    ///
    /// Without a session credential the cart is simply empty - no request
    /// is made. A 401 means the credential expired: the cart is cleared and
    /// the session invalidated, and the call still succeeds (logged-out is
    /// a valid state, not an error).
    ///
    /// # Errors
    ///
    /// Returns an error on network or server failures; the displayed cart
    /// keeps its last-known-good lines in that case.
    #[instrument(skip(self))]
    pub async fn fetch(&self) -> Result<(), CartError> {
        if !self.inner.session.is_logged_in() {
            self.set_lines(Vec::new());
            return Ok(());
        }

        match self.inner.api.get::<Vec<CartRecord>>("/cart").await {
            Ok(records) => {
                let mut lines: Vec<CartLine> = records
                    .into_iter()
                    .map(|record| CartLine {
                        line_id: record.id,
                        weapon: record.weapon,
                        quantity: record.quantity,
                    })
                    .collect();
                // Stable render order regardless of server ordering.
                lines.sort_by_key(|line| line.weapon.id);
                debug!(line_count = lines.len(), "Cart refetched");
                self.set_lines(lines);
                Ok(())
            }
            Err(e) if e.is_unauthorized() => {
                self.set_lines(Vec::new());
                self.inner.session.invalidate();
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Add a weapon to the cart (server-side increment), then refetch.
    ///
    /// # Errors
    ///
    /// Fails fast without a network call when no credential is present or
    /// the requested quantity exceeds the known stock. Backend rejections
    /// (e.g. insufficient stock) are surfaced through the notification
    /// channel and returned; the displayed cart is left untouched.
    #[instrument(skip(self, weapon), fields(weapon_id = %weapon.id, quantity))]
    pub async fn add(&self, weapon: &Weapon, quantity: u32) -> Result<(), CartError> {
        if !self.inner.session.is_logged_in() {
            self.inner
                .notifier
                .error("Please log in before adding to the cart");
            return Err(CartError::NotLoggedIn);
        }

        // Loose pre-check against the fetched snapshot; the server decides.
        if quantity > weapon.stock {
            return Err(self.reject_for_stock(weapon, quantity));
        }

        let mutation = CartMutation {
            weapon_id: weapon.id,
            quantity,
        };
        match self
            .inner
            .api
            .post::<_, serde_json::Value>("/cart", &mutation)
            .await
        {
            Ok(_) => {
                self.fetch().await.map_err(|e| self.surface_refetch_failure(e))?;
                self.inner.notifier.signal(Signal::CartUpdated);
                self.inner
                    .notifier
                    .success(format!("Added {} to the cart", weapon.name));
                Ok(())
            }
            Err(e) => Err(self.surface_failure(e)),
        }
    }

    /// Set a cart line to an absolute quantity, then refetch.
    ///
    /// A target below 1 delegates to [`Self::remove`]. The pre-check
    /// rejects targets above the line's known stock with a user message and
    /// no request.
    ///
    /// # Errors
    ///
    /// Returns an error when the weapon is not in the cart, the target
    /// exceeds known stock, or the backend rejects the mutation.
    #[instrument(skip(self))]
    pub async fn set_quantity(
        &self,
        weapon_id: WeaponId,
        new_quantity: u32,
    ) -> Result<(), CartError> {
        if new_quantity < 1 {
            return self.remove(weapon_id).await;
        }

        let line = self
            .read_lines()
            .iter()
            .find(|line| line.weapon.id == weapon_id)
            .cloned()
            .ok_or(CartError::NotInCart(weapon_id))?;

        if new_quantity > line.weapon.stock {
            return Err(self.reject_for_stock(&line.weapon, new_quantity));
        }

        let mutation = CartMutation {
            weapon_id,
            quantity: new_quantity,
        };
        let path = format!("/cart/{weapon_id}");
        match self
            .inner
            .api
            .put::<_, serde_json::Value>(&path, &mutation)
            .await
        {
            Ok(_) => {
                self.fetch().await.map_err(|e| self.surface_refetch_failure(e))?;
                self.inner.notifier.signal(Signal::CartUpdated);
                Ok(())
            }
            Err(e) => Err(self.surface_failure(e)),
        }
    }

    /// Remove a line, keyed by weapon id, then refetch.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the deletion.
    #[instrument(skip(self))]
    pub async fn remove(&self, weapon_id: WeaponId) -> Result<(), CartError> {
        let path = format!("/cart/{weapon_id}");
        match self.inner.api.delete::<serde_json::Value>(&path).await {
            Ok(_) => {
                self.fetch().await.map_err(|e| self.surface_refetch_failure(e))?;
                self.inner.notifier.signal(Signal::CartUpdated);
                Ok(())
            }
            Err(e) => Err(self.surface_failure(e)),
        }
    }

    /// Reset the displayed cart without calling the backend.
    ///
    /// Used after a successful checkout, when the server cart is already
    /// empty; any other divergence is reconciled by the next [`Self::fetch`].
    pub fn clear_local(&self) {
        self.set_lines(Vec::new());
        self.inner.notifier.signal(Signal::CartUpdated);
    }

    /// Client-side stock rejection: user message, no request, no change.
    fn reject_for_stock(&self, weapon: &Weapon, requested: u32) -> CartError {
        let err = CartError::ExceedsStock {
            name: weapon.name.clone(),
            stock: weapon.stock,
            requested,
        };
        self.inner.notifier.error(err.to_string());
        err
    }

    /// Surface a failed refetch that followed a successful mutation. The
    /// backend has already mutated, so the user must hear about it even
    /// though the mutation request itself went through.
    fn surface_refetch_failure(&self, err: CartError) -> CartError {
        match err {
            CartError::Api(api) => self.surface_failure(api),
            other => other,
        }
    }

    /// Turn a backend rejection into a notification, resetting
    /// session-dependent state on 401. The lines keep their last-known-good
    /// value either way.
    fn surface_failure(&self, err: ApiError) -> CartError {
        if err.is_unauthorized() {
            self.set_lines(Vec::new());
            self.inner.session.invalidate();
            self.inner.notifier.error("Session expired, please log in again");
        } else {
            let message = err
                .server_message()
                .map_or_else(|| err.to_string(), ToOwned::to_owned);
            self.inner.notifier.error(message);
        }
        err.into()
    }

    fn set_lines(&self, lines: Vec<CartLine>) {
        *self
            .inner
            .lines
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = lines;
    }

    fn read_lines(&self) -> std::sync::RwLockReadGuard<'_, Vec<CartLine>> {
        self.inner
            .lines
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}
