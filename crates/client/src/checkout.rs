//! Checkout flow: converting the cart snapshot into an order submission.
//!
//! The submission is built from the live cart snapshot at call time, never
//! from a cached copy, and is sent exactly once per user action - there is
//! no client-side retry, so double-submit protection is the server's
//! concern (it would need an idempotency key to be airtight; accepted gap).

use tracing::{info, instrument};

use crate::api::types::{CheckoutItem, CheckoutRequest, Order, OrderConfirmation};
use crate::api::{ApiClient, ApiError};
use crate::cart::{CartLine, CartManager};
use crate::notify::{Notifier, Signal};

/// Order submission and history.
#[derive(Clone)]
pub struct CheckoutFlow {
    api: ApiClient,
    cart: CartManager,
    notifier: Notifier,
}

impl CheckoutFlow {
    /// Create a checkout flow over the shared cart.
    #[must_use]
    pub const fn new(api: ApiClient, cart: CartManager, notifier: Notifier) -> Self {
        Self {
            api,
            cart,
            notifier,
        }
    }

    /// Submit the current cart as an order.
    ///
    /// With an empty cart this is a no-op: no network call, no signal,
    /// `Ok(None)`. On success the profile-refresh signal fires (so any
    /// displayed credit balance refetches), the local cart is cleared (the
    /// server already emptied its side inside the order transaction), and
    /// the confirmation is returned for the caller to navigate with.
    ///
    /// # Errors
    ///
    /// On failure the server's message (commonly insufficient credits or a
    /// stock conflict) is surfaced verbatim through the notification
    /// channel and the cart is left untouched so the user can adjust and
    /// retry.
    #[instrument(skip(self))]
    pub async fn submit_order(&self) -> Result<Option<OrderConfirmation>, ApiError> {
        let lines = self.cart.lines();
        if lines.is_empty() {
            return Ok(None);
        }

        let request = CheckoutRequest {
            total: lines.iter().map(CartLine::subtotal).sum(),
            items: lines
                .iter()
                .map(|line| CheckoutItem {
                    weapon_id: line.weapon.id,
                    quantity: line.quantity,
                })
                .collect(),
        };

        match self
            .api
            .post::<_, OrderConfirmation>("/orders", &request)
            .await
        {
            Ok(confirmation) => {
                info!(
                    order_id = %confirmation.order_id,
                    total = %confirmation.total,
                    "Order placed"
                );
                self.notifier.signal(Signal::ProfileUpdated);
                self.cart.clear_local();
                self.notifier.success(format!(
                    "Order #{} placed ({})",
                    confirmation.order_id, confirmation.total
                ));
                Ok(Some(confirmation))
            }
            Err(e) => {
                let message = e
                    .server_message()
                    .map_or_else(|| e.to_string(), ToOwned::to_owned);
                self.notifier.error(message);
                Err(e)
            }
        }
    }

    /// The signed-in user's order history, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self))]
    pub async fn order_history(&self) -> Result<Vec<Order>, ApiError> {
        self.api.get("/orders").await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::CartManager;
    use crate::config::ClientConfig;
    use crate::session::SessionStore;

    #[tokio::test]
    async fn test_empty_cart_checkout_is_noop() {
        let notifier = Notifier::new();
        let mut rx = notifier.subscribe();

        let path = std::env::temp_dir().join(format!("armory-checkout-test-{}", std::process::id()));
        let _ = std::fs::remove_file(&path);
        let session = SessionStore::load(path, notifier.clone());
        let api = ApiClient::new(&ClientConfig::default(), session.clone()).expect("api client");
        let cart = CartManager::new(api.clone(), session, notifier.clone());
        let checkout = CheckoutFlow::new(api, cart, notifier);

        // No server is running; a network call here would error out instead
        // of returning Ok(None).
        let result = checkout.submit_order().await.expect("no-op");
        assert!(result.is_none());

        // No signal, no toast.
        assert!(rx.try_recv().is_err());
    }
}
