//! Catalog view: product listing, detail lookup, and client-side filtering.
//!
//! Read-only relative to the cart. The list is fetched as a single snapshot
//! (no pagination) and cached briefly; filtering is a pure predicate over
//! the snapshot, recomputed synchronously whenever the category or search
//! text changes. Out-of-stock weapons are not hidden - views mark them and
//! disable their primary action via [`Weapon::orderable`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};
use xeno_armory_core::WeaponId;

use crate::api::types::Weapon;
use crate::api::{ApiClient, ApiError};

/// Category value that matches every weapon.
const CATEGORY_ALL: &str = "All";

#[derive(Clone)]
enum CacheValue {
    List(Vec<Weapon>),
    One(Box<Weapon>),
}

/// Client for the read-only product catalog.
///
/// Cheap to clone; clones share the cache.
#[derive(Clone)]
pub struct Catalog {
    inner: Arc<CatalogInner>,
}

struct CatalogInner {
    api: ApiClient,
    cache: Cache<String, CacheValue>,
}

impl Catalog {
    /// Create a catalog client with a short-lived snapshot cache.
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        let cache = Cache::builder()
            .max_capacity(256)
            .time_to_live(Duration::from_secs(60))
            .build();

        Self {
            inner: Arc::new(CatalogInner { api, cache }),
        }
    }

    /// Fetch the full weapon list (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn fetch_all(&self) -> Result<Vec<Weapon>, ApiError> {
        let cache_key = "weapons".to_string();

        if let Some(CacheValue::List(weapons)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for weapon list");
            return Ok(weapons);
        }

        let weapons: Vec<Weapon> = self.inner.api.get("/weapons").await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::List(weapons.clone()))
            .await;

        Ok(weapons)
    }

    /// Fetch a single weapon for the detail view (cached).
    ///
    /// # Errors
    ///
    /// Returns an error if the weapon does not exist or the request fails.
    #[instrument(skip(self), fields(weapon_id = %id))]
    pub async fn fetch_one(&self, id: WeaponId) -> Result<Weapon, ApiError> {
        let cache_key = format!("weapon:{id}");

        if let Some(CacheValue::One(weapon)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for weapon");
            return Ok(*weapon);
        }

        let weapon: Weapon = self.inner.api.get(&format!("/weapons/{id}")).await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::One(Box::new(weapon.clone())))
            .await;

        Ok(weapon)
    }

    /// Drop all cached catalog data (after an admin mutation).
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

/// Client-side catalog filter: category plus free-text name search.
#[derive(Debug, Clone, Default)]
pub struct CatalogFilter {
    /// Category to match exactly; `None` or `"All"` matches everything.
    pub category: Option<String>,
    /// Case-insensitive substring match on the weapon name.
    pub search: Option<String>,
}

impl CatalogFilter {
    /// True when the weapon passes both the category and search predicates.
    #[must_use]
    pub fn matches(&self, weapon: &Weapon) -> bool {
        let category_ok = match self.category.as_deref() {
            None => true,
            Some(category) if category.eq_ignore_ascii_case(CATEGORY_ALL) => true,
            Some(category) => weapon.category == category,
        };

        let search_ok = match self.search.as_deref() {
            None => true,
            Some(term) => weapon
                .name
                .to_lowercase()
                .contains(&term.to_lowercase()),
        };

        category_ok && search_ok
    }

    /// Apply the filter to a fetched snapshot.
    #[must_use]
    pub fn apply(&self, weapons: &[Weapon]) -> Vec<Weapon> {
        weapons
            .iter()
            .filter(|weapon| self.matches(weapon))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xeno_armory_core::Credits;

    fn weapon(id: i64, name: &str, category: &str, stock: u32) -> Weapon {
        Weapon {
            id: WeaponId::new(id),
            name: name.to_string(),
            category: category.to_string(),
            price: Credits::new(100),
            stock,
            description: String::new(),
            image_url: String::new(),
        }
    }

    fn sample_catalog() -> Vec<Weapon> {
        vec![
            weapon(1, "Vibro Blade", "Melee", 4),
            weapon(2, "Plasma Repeater", "Plasma", 0),
            weapon(3, "Gauss Rifle", "Ballistic", 7),
            weapon(4, "Plasma Cutter", "Plasma", 2),
        ]
    }

    #[test]
    fn test_category_all_returns_full_list() {
        let catalog = sample_catalog();
        let filter = CatalogFilter {
            category: Some("All".to_string()),
            search: None,
        };
        assert_eq!(filter.apply(&catalog).len(), catalog.len());

        // Case-insensitive "all" too.
        let filter = CatalogFilter {
            category: Some("all".to_string()),
            search: None,
        };
        assert_eq!(filter.apply(&catalog).len(), catalog.len());
    }

    #[test]
    fn test_category_matches_exactly() {
        let catalog = sample_catalog();
        let filter = CatalogFilter {
            category: Some("Plasma".to_string()),
            search: None,
        };
        let filtered = filter.apply(&catalog);
        assert_eq!(filtered.len(), 2);
        assert!(filtered.iter().all(|w| w.category == "Plasma"));

        // "plasma" is not an exact category match.
        let filter = CatalogFilter {
            category: Some("plasma".to_string()),
            search: None,
        };
        assert!(filter.apply(&catalog).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_substring() {
        let catalog = sample_catalog();
        let filter = CatalogFilter {
            category: None,
            search: Some("plasma".to_string()),
        };
        let filtered = filter.apply(&catalog);
        assert_eq!(filtered.len(), 2);

        let filter = CatalogFilter {
            category: None,
            search: Some("RIFLE".to_string()),
        };
        let filtered = filter.apply(&catalog);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.first().map(|w| w.name.as_str()), Some("Gauss Rifle"));
    }

    #[test]
    fn test_category_and_search_compose() {
        let catalog = sample_catalog();
        let filter = CatalogFilter {
            category: Some("Plasma".to_string()),
            search: Some("cutter".to_string()),
        };
        let filtered = filter.apply(&catalog);
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered.first().map(|w| w.name.as_str()), Some("Plasma Cutter"));
    }

    #[test]
    fn test_out_of_stock_stays_visible() {
        let catalog = sample_catalog();
        let filter = CatalogFilter::default();
        let filtered = filter.apply(&catalog);
        let out_of_stock = filtered
            .iter()
            .find(|w| w.name == "Plasma Repeater")
            .expect("still listed");
        assert!(!out_of_stock.orderable());
    }
}
