//! Admin inventory editor: create/update/delete over the product catalog.
//!
//! Gated client-side by the session role as a UX convenience - the backend
//! enforces the real authorization on its `/admin/*` routes. Edits
//! accumulate in a per-row draft buffer and are only flushed to the backend
//! on an explicit save; unsaved drafts are discarded on navigation. Deletes
//! require an explicit confirmation token before the destructive request is
//! sent.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use thiserror::Error;
use tracing::{info, instrument};
use xeno_armory_core::{Credits, WeaponId};

use crate::api::types::{Acknowledgement, AdminOrder, Weapon};
use crate::api::{ApiClient, ApiError};
use crate::catalog::Catalog;
use crate::notify::Notifier;
use crate::session::SessionStore;

/// Errors from admin operations.
#[derive(Debug, Error)]
pub enum AdminError {
    /// The signed-in role does not pass the client-side admin gate.
    #[error("Admin access required")]
    NotAdmin,

    /// Saving a row with no staged edits; no request was issued.
    #[error("No staged edits for weapon {0}")]
    NothingStaged(WeaponId),

    /// Delete invoked without explicit confirmation; no request was issued.
    #[error("Deletion requires explicit confirmation")]
    NotConfirmed,

    /// The backend rejected the request or the request failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

/// Explicit confirmation token for destructive operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Confirmed,
    Cancelled,
}

/// An image file to upload with a weapon.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Fields for registering a new weapon.
#[derive(Debug, Clone)]
pub struct NewWeapon {
    pub name: String,
    pub category: String,
    pub price: Credits,
    pub stock: u32,
    pub description: String,
    pub image: Option<ImageUpload>,
}

/// Staged, unsaved edits for one catalog row. Unset fields are untouched.
#[derive(Debug, Clone, Default)]
pub struct WeaponDraft {
    pub name: Option<String>,
    pub category: Option<String>,
    pub price: Option<Credits>,
    pub stock: Option<u32>,
    pub description: Option<String>,
    pub image: Option<ImageUpload>,
}

impl WeaponDraft {
    /// True when no field has been staged.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.category.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.description.is_none()
            && self.image.is_none()
    }

    /// Overlay later edits on top of this draft, field by field.
    fn merge(&mut self, other: Self) {
        if other.name.is_some() {
            self.name = other.name;
        }
        if other.category.is_some() {
            self.category = other.category;
        }
        if other.price.is_some() {
            self.price = other.price;
        }
        if other.stock.is_some() {
            self.stock = other.stock;
        }
        if other.description.is_some() {
            self.description = other.description;
        }
        if other.image.is_some() {
            self.image = other.image;
        }
    }
}

/// Authenticated CRUD surface over the product catalog.
///
/// Cheap to clone; clones share the draft buffer.
#[derive(Clone)]
pub struct AdminEditor {
    inner: Arc<AdminEditorInner>,
}

struct AdminEditorInner {
    api: ApiClient,
    session: SessionStore,
    catalog: Catalog,
    notifier: Notifier,
    drafts: RwLock<HashMap<WeaponId, WeaponDraft>>,
}

impl AdminEditor {
    /// Create the editor.
    #[must_use]
    pub fn new(api: ApiClient, session: SessionStore, catalog: Catalog, notifier: Notifier) -> Self {
        Self {
            inner: Arc::new(AdminEditorInner {
                api,
                session,
                catalog,
                notifier,
                drafts: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// The inventory listing is the same weapon list everyone sees.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    pub async fn inventory(&self) -> Result<Vec<Weapon>, ApiError> {
        self.inner.catalog.fetch_all().await
    }

    /// Register a new weapon (multipart, with optional image).
    ///
    /// # Errors
    ///
    /// Returns an error if the role gate fails or the backend rejects the
    /// creation.
    #[instrument(skip(self, new), fields(name = %new.name))]
    pub async fn create(&self, new: NewWeapon) -> Result<(), AdminError> {
        self.require_admin()?;

        let mut form = reqwest::multipart::Form::new()
            .text("name", new.name.clone())
            .text("type", new.category)
            .text("price", new.price.amount().to_string())
            .text("stock", new.stock.to_string())
            .text("description", new.description);
        if let Some(image) = new.image {
            form = form.part(
                "image",
                reqwest::multipart::Part::bytes(image.bytes).file_name(image.file_name),
            );
        }

        match self
            .inner
            .api
            .post_form::<Acknowledgement>("/admin/weapons", form)
            .await
        {
            Ok(_) => {
                info!(name = %new.name, "Weapon registered");
                self.inner.catalog.invalidate().await;
                self.inner
                    .notifier
                    .success(format!("Registered {}", new.name));
                Ok(())
            }
            Err(e) => Err(self.surface_failure(e)),
        }
    }

    /// Stage edits for one row without sending anything.
    pub fn stage(&self, id: WeaponId, draft: WeaponDraft) {
        self.write_drafts().entry(id).or_default().merge(draft);
    }

    /// The currently staged draft for a row, if any.
    #[must_use]
    pub fn draft(&self, id: WeaponId) -> Option<WeaponDraft> {
        self.read_drafts().get(&id).cloned()
    }

    /// Flush the staged draft for one row to the backend.
    ///
    /// Only the staged fields are sent. On failure the draft is restored so
    /// the user can retry or adjust.
    ///
    /// # Errors
    ///
    /// Returns an error if nothing is staged (no request), the role gate
    /// fails, or the backend rejects the update.
    #[instrument(skip(self))]
    pub async fn save(&self, id: WeaponId) -> Result<(), AdminError> {
        self.require_admin()?;

        let draft = self
            .write_drafts()
            .remove(&id)
            .filter(|draft| !draft.is_empty())
            .ok_or(AdminError::NothingStaged(id))?;

        let mut form = reqwest::multipart::Form::new();
        if let Some(name) = draft.name.clone() {
            form = form.text("name", name);
        }
        if let Some(category) = draft.category.clone() {
            form = form.text("type", category);
        }
        if let Some(price) = draft.price {
            form = form.text("price", price.amount().to_string());
        }
        if let Some(stock) = draft.stock {
            form = form.text("stock", stock.to_string());
        }
        if let Some(description) = draft.description.clone() {
            form = form.text("description", description);
        }
        if let Some(image) = draft.image.clone() {
            form = form.part(
                "image",
                reqwest::multipart::Part::bytes(image.bytes).file_name(image.file_name),
            );
        }

        let path = format!("/admin/weapons/{id}");
        match self.inner.api.patch_form::<Acknowledgement>(&path, form).await {
            Ok(_) => {
                info!(weapon_id = %id, "Weapon updated");
                self.inner.catalog.invalidate().await;
                self.inner.notifier.success("Weapon updated");
                Ok(())
            }
            Err(e) => {
                // Keep the dirty buffer so the edit is not silently lost.
                self.write_drafts().insert(id, draft);
                Err(self.surface_failure(e))
            }
        }
    }

    /// Discard staged edits for one row (navigation away).
    pub fn discard(&self, id: WeaponId) {
        self.write_drafts().remove(&id);
    }

    /// Discard every staged edit.
    pub fn discard_all(&self) {
        self.write_drafts().clear();
    }

    /// Delete a weapon. Requires [`Confirmation::Confirmed`]; anything else
    /// drops the request before it is sent.
    ///
    /// # Errors
    ///
    /// Returns an error without a request when unconfirmed or when the role
    /// gate fails; backend rejections are surfaced as notifications.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: WeaponId, confirmation: Confirmation) -> Result<(), AdminError> {
        self.require_admin()?;

        if confirmation != Confirmation::Confirmed {
            return Err(AdminError::NotConfirmed);
        }

        let path = format!("/admin/weapons/{id}");
        match self.inner.api.delete::<Acknowledgement>(&path).await {
            Ok(_) => {
                info!(weapon_id = %id, "Weapon deleted");
                self.write_drafts().remove(&id);
                self.inner.catalog.invalidate().await;
                self.inner.notifier.success("Weapon deleted");
                Ok(())
            }
            Err(e) => Err(self.surface_failure(e)),
        }
    }

    /// Every order in the system, annotated with buyer details.
    ///
    /// # Errors
    ///
    /// Returns an error if the role gate fails or the request fails.
    #[instrument(skip(self))]
    pub async fn all_orders(&self) -> Result<Vec<AdminOrder>, AdminError> {
        self.require_admin()?;
        Ok(self.inner.api.get("/admin/orders").await?)
    }

    /// Client-side role gate. A UX convenience only - the backend still
    /// authorizes every `/admin/*` request itself.
    fn require_admin(&self) -> Result<(), AdminError> {
        if self.inner.session.is_admin() {
            Ok(())
        } else {
            Err(AdminError::NotAdmin)
        }
    }

    fn surface_failure(&self, err: ApiError) -> AdminError {
        let message = err
            .server_message()
            .map_or_else(|| err.to_string(), ToOwned::to_owned);
        self.inner.notifier.error(message);
        err.into()
    }

    fn read_drafts(&self) -> std::sync::RwLockReadGuard<'_, HashMap<WeaponId, WeaponDraft>> {
        self.inner
            .drafts
            .read()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn write_drafts(&self) -> std::sync::RwLockWriteGuard<'_, HashMap<WeaponId, WeaponDraft>> {
        self.inner
            .drafts
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::session::Session;
    use xeno_armory_core::Role;

    fn editor(role: Option<Role>) -> AdminEditor {
        let notifier = Notifier::new();
        let path = std::env::temp_dir().join(format!(
            "armory-admin-test-{}-{role:?}",
            std::process::id()
        ));
        let _ = std::fs::remove_file(&path);
        let session = SessionStore::load(path, notifier.clone());
        if let Some(role) = role {
            session
                .store(Session {
                    token: "jwt-test".to_string(),
                    display_name: "tester".to_string(),
                    role,
                })
                .expect("store session");
        }
        let api = ApiClient::new(&ClientConfig::default(), session.clone()).expect("api client");
        let catalog = Catalog::new(api.clone());
        AdminEditor::new(api, session, catalog, notifier)
    }

    #[tokio::test]
    async fn test_role_gate_blocks_non_admin() {
        let editor = editor(Some(Role::User));
        let result = editor.delete(WeaponId::new(1), Confirmation::Confirmed).await;
        assert!(matches!(result, Err(AdminError::NotAdmin)));

        let result = editor.all_orders().await;
        assert!(matches!(result, Err(AdminError::NotAdmin)));
    }

    #[tokio::test]
    async fn test_delete_requires_confirmation() {
        let editor = editor(Some(Role::Admin));
        // Cancelled confirmation never reaches the network, so this works
        // without a running backend.
        let result = editor.delete(WeaponId::new(1), Confirmation::Cancelled).await;
        assert!(matches!(result, Err(AdminError::NotConfirmed)));
    }

    #[tokio::test]
    async fn test_save_with_nothing_staged_is_an_error() {
        let editor = editor(Some(Role::Admin));
        let result = editor.save(WeaponId::new(1)).await;
        assert!(matches!(result, Err(AdminError::NothingStaged(_))));

        // An explicitly staged empty draft counts as nothing staged too.
        editor.stage(WeaponId::new(1), WeaponDraft::default());
        let result = editor.save(WeaponId::new(1)).await;
        assert!(matches!(result, Err(AdminError::NothingStaged(_))));
    }

    #[test]
    fn test_drafts_accumulate_per_row() {
        let editor = editor(Some(Role::Admin));
        let id = WeaponId::new(7);

        editor.stage(
            id,
            WeaponDraft {
                price: Some(Credits::new(900)),
                ..Default::default()
            },
        );
        editor.stage(
            id,
            WeaponDraft {
                stock: Some(12),
                ..Default::default()
            },
        );
        // A later edit to the same field wins.
        editor.stage(
            id,
            WeaponDraft {
                price: Some(Credits::new(950)),
                ..Default::default()
            },
        );

        let draft = editor.draft(id).expect("draft present");
        assert_eq!(draft.price, Some(Credits::new(950)));
        assert_eq!(draft.stock, Some(12));
        assert!(draft.name.is_none());

        // Rows are independent.
        assert!(editor.draft(WeaponId::new(8)).is_none());
    }

    #[test]
    fn test_discard_drops_unsaved_edits() {
        let editor = editor(Some(Role::Admin));
        let id = WeaponId::new(3);
        editor.stage(
            id,
            WeaponDraft {
                name: Some("Renamed".to_string()),
                ..Default::default()
            },
        );
        editor.discard(id);
        assert!(editor.draft(id).is_none());
    }
}
