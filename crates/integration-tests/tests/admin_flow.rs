//! Admin inventory editing: drafts, saves, confirmed deletes, order overview.

use xeno_armory_client::ArmoryClient;
use xeno_armory_client::admin::{AdminError, Confirmation, NewWeapon, WeaponDraft};
use xeno_armory_core::{Credits, WeaponId};
use xeno_armory_integration_tests::StubArmory;

async fn admin_client(stub: &StubArmory) -> ArmoryClient {
    stub.seed_user("quartermaster", "topsecret", 0, true);
    let client = ArmoryClient::new(&stub.config()).expect("client");
    client
        .account()
        .login("quartermaster", "topsecret")
        .await
        .expect("login");
    client
}

#[tokio::test]
async fn test_non_admin_is_gated_before_the_wire() {
    let stub = StubArmory::spawn().await;
    stub.seed_user("commander", "hunter2", 0, false);
    let client = ArmoryClient::new(&stub.config()).expect("client");
    client
        .account()
        .login("commander", "hunter2")
        .await
        .expect("login");

    let before = stub.request_count();
    let result = client
        .admin()
        .delete(WeaponId::new(1), Confirmation::Confirmed)
        .await;
    assert!(matches!(result, Err(AdminError::NotAdmin)));

    let result = client.admin().all_orders().await;
    assert!(matches!(result, Err(AdminError::NotAdmin)));
    assert_eq!(stub.request_count(), before);
}

#[tokio::test]
async fn test_created_weapon_appears_in_the_catalog() {
    let stub = StubArmory::spawn().await;
    let client = admin_client(&stub).await;

    // Prime the catalog cache so the test proves it gets invalidated.
    assert!(client.catalog().fetch_all().await.expect("empty").is_empty());

    client
        .admin()
        .create(NewWeapon {
            name: "Gauss Rifle".to_string(),
            category: "Ballistic".to_string(),
            price: Credits::new(4_500),
            stock: 10,
            description: "Magnetic accelerator rifle".to_string(),
            image: None,
        })
        .await
        .expect("create");

    let inventory = client.admin().inventory().await.expect("inventory");
    assert_eq!(inventory.len(), 1);
    let rifle = inventory.first().expect("rifle");
    assert_eq!(rifle.name, "Gauss Rifle");
    assert_eq!(rifle.price, Credits::new(4_500));
    assert_eq!(rifle.stock, 10);
}

#[tokio::test]
async fn test_staged_edits_flush_only_on_save() {
    let stub = StubArmory::spawn().await;
    let blade = stub.seed_weapon("Vibro Blade", "Melee", 100, 5);
    let client = admin_client(&stub).await;
    let id = WeaponId::new(blade);

    let before = stub.request_count();
    client.stage_price(id, 120);
    client.stage_stock(id, 8);
    // Staging is purely local.
    assert_eq!(stub.request_count(), before);

    client.admin().save(id).await.expect("save");
    // The flushed draft is gone.
    assert!(client.admin().draft(id).is_none());

    assert_eq!(stub.weapon_stock(blade), Some(8));
    let weapon = client.catalog().fetch_one(id).await.expect("weapon");
    assert_eq!(weapon.price, Credits::new(120));
    // The unstaged field kept its value.
    assert_eq!(weapon.name, "Vibro Blade");
}

#[tokio::test]
async fn test_discarded_draft_never_reaches_the_backend() {
    let stub = StubArmory::spawn().await;
    let blade = stub.seed_weapon("Vibro Blade", "Melee", 100, 5);
    let client = admin_client(&stub).await;
    let id = WeaponId::new(blade);

    client.stage_price(id, 999);
    client.admin().discard(id);

    let result = client.admin().save(id).await;
    assert!(matches!(result, Err(AdminError::NothingStaged(_))));

    let weapon = client.catalog().fetch_one(id).await.expect("weapon");
    assert_eq!(weapon.price, Credits::new(100));
}

#[tokio::test]
async fn test_delete_requires_confirmation_and_then_sticks() {
    let stub = StubArmory::spawn().await;
    let blade = stub.seed_weapon("Vibro Blade", "Melee", 100, 5);
    let client = admin_client(&stub).await;
    let id = WeaponId::new(blade);

    let before = stub.request_count();
    let result = client.admin().delete(id, Confirmation::Cancelled).await;
    assert!(matches!(result, Err(AdminError::NotConfirmed)));
    assert_eq!(stub.request_count(), before);
    assert_eq!(stub.weapon_stock(blade), Some(5));

    client
        .admin()
        .delete(id, Confirmation::Confirmed)
        .await
        .expect("delete");
    assert_eq!(stub.weapon_stock(blade), None);
    assert!(client.admin().inventory().await.expect("inventory").is_empty());
}

#[tokio::test]
async fn test_order_overview_names_the_buyer() {
    let stub = StubArmory::spawn().await;
    stub.seed_user("commander", "hunter2", 1_000, false);
    let blade = stub.seed_weapon("Vibro Blade", "Melee", 100, 5);

    // A regular user places an order.
    let shopper = ArmoryClient::new(&stub.config()).expect("shopper");
    shopper
        .account()
        .login("commander", "hunter2")
        .await
        .expect("login");
    let weapon = shopper
        .catalog()
        .fetch_one(WeaponId::new(blade))
        .await
        .expect("weapon");
    shopper.cart().add(&weapon, 2).await.expect("add");
    shopper
        .checkout()
        .submit_order()
        .await
        .expect("checkout")
        .expect("confirmation");

    let admin = admin_client(&stub).await;
    let orders = admin.admin().all_orders().await.expect("orders");
    assert_eq!(orders.len(), 1);
    let order = orders.first().expect("order");
    assert_eq!(order.username, "commander");
    assert_eq!(order.total, Credits::new(200));
}

/// Small staging shorthands for the tests.
trait StageExt {
    fn stage_price(&self, id: WeaponId, price: i64);
    fn stage_stock(&self, id: WeaponId, stock: u32);
}

impl StageExt for ArmoryClient {
    fn stage_price(&self, id: WeaponId, price: i64) {
        self.admin().stage(
            id,
            WeaponDraft {
                price: Some(Credits::new(price)),
                ..Default::default()
            },
        );
    }

    fn stage_stock(&self, id: WeaponId, stock: u32) {
        self.admin().stage(
            id,
            WeaponDraft {
                stock: Some(stock),
                ..Default::default()
            },
        );
    }
}
