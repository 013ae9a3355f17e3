//! Checkout edge cases: empty carts and backend rejections.

use xeno_armory_client::ArmoryClient;
use xeno_armory_client::notify::Event;
use xeno_armory_core::WeaponId;
use xeno_armory_integration_tests::StubArmory;

#[tokio::test]
async fn test_empty_cart_checkout_sends_nothing() {
    let stub = StubArmory::spawn().await;
    stub.seed_user("commander", "hunter2", 1_000, false);

    let client = ArmoryClient::new(&stub.config()).expect("client");
    client
        .account()
        .login("commander", "hunter2")
        .await
        .expect("login");

    let before = stub.request_count();
    let confirmation = client.checkout().submit_order().await.expect("no-op");
    assert!(confirmation.is_none());
    assert_eq!(stub.request_count(), before);
    assert_eq!(stub.order_count(), 0);
}

#[tokio::test]
async fn test_insufficient_credits_leaves_cart_intact() {
    let stub = StubArmory::spawn().await;
    stub.seed_user("commander", "hunter2", 50, false);
    let blade = stub.seed_weapon("Vibro Blade", "Melee", 100, 5);

    let client = ArmoryClient::new(&stub.config()).expect("client");
    client
        .account()
        .login("commander", "hunter2")
        .await
        .expect("login");

    let weapon = client
        .catalog()
        .fetch_one(WeaponId::new(blade))
        .await
        .expect("weapon");
    client.cart().add(&weapon, 1).await.expect("add");

    let mut rx = client.notifier().subscribe();
    let result = client.checkout().submit_order().await;
    assert!(result.is_err());

    // The server's message is surfaced verbatim, so the user learns the
    // actual reason rather than a generic failure.
    match rx.try_recv().expect("toast") {
        Event::Toast(toast) => assert_eq!(toast.message, "insufficient credits"),
        other => panic!("unexpected event: {other:?}"),
    }

    // Nothing was charged or shipped; the cart is still there to adjust.
    assert_eq!(client.cart().lines().len(), 1);
    assert_eq!(stub.cart_of("commander"), vec![(blade, 1)]);
    assert_eq!(stub.credits_of("commander"), Some(50));
    assert_eq!(stub.weapon_stock(blade), Some(5));
    assert_eq!(stub.order_count(), 0);
}

#[tokio::test]
async fn test_submission_reflects_the_live_cart() {
    let stub = StubArmory::spawn().await;
    stub.seed_user("commander", "hunter2", 10_000, false);
    let blade = stub.seed_weapon("Vibro Blade", "Melee", 100, 5);
    let rifle = stub.seed_weapon("Gauss Rifle", "Ballistic", 450, 4);

    let client = ArmoryClient::new(&stub.config()).expect("client");
    client
        .account()
        .login("commander", "hunter2")
        .await
        .expect("login");

    let blade_snapshot = client
        .catalog()
        .fetch_one(WeaponId::new(blade))
        .await
        .expect("blade");
    let rifle_snapshot = client
        .catalog()
        .fetch_one(WeaponId::new(rifle))
        .await
        .expect("rifle");

    client.cart().add(&blade_snapshot, 1).await.expect("add blade");
    client.cart().add(&rifle_snapshot, 2).await.expect("add rifle");
    // Last-second adjustment; the submission must include it.
    client
        .cart()
        .remove(WeaponId::new(blade))
        .await
        .expect("remove blade");

    let confirmation = client
        .checkout()
        .submit_order()
        .await
        .expect("checkout")
        .expect("confirmation");
    assert_eq!(confirmation.total.amount(), 900);
    assert_eq!(stub.weapon_stock(blade), Some(5));
    assert_eq!(stub.weapon_stock(rifle), Some(2));
}
