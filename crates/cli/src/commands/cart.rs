//! Cart commands: show, add, set, remove.

use xeno_armory_client::ArmoryClient;
use xeno_armory_core::WeaponId;

use super::CommandResult;

pub async fn show(client: &ArmoryClient) -> CommandResult {
    client.cart().fetch().await?;
    let lines = client.cart().lines();

    if lines.is_empty() {
        println!("Cart is empty.");
        return Ok(());
    }

    println!("{:>4}  {:<28} {:>4} {:>12}", "ID", "NAME", "QTY", "SUBTOTAL");
    for line in &lines {
        println!(
            "{:>4}  {:<28} {:>4} {:>12}",
            line.weapon.id,
            line.weapon.name,
            line.quantity,
            line.subtotal().to_string()
        );
    }
    println!("{:>51}", format!("Total: {}", client.cart().total()));
    Ok(())
}

pub async fn add(client: &ArmoryClient, id: WeaponId, quantity: u32) -> CommandResult {
    // Stock validation needs the product snapshot, same as the detail view.
    let weapon = client.catalog().fetch_one(id).await?;
    client.cart().add(&weapon, quantity).await?;
    show(client).await
}

pub async fn set(client: &ArmoryClient, id: WeaponId, quantity: u32) -> CommandResult {
    client.cart().fetch().await?;
    client.cart().set_quantity(id, quantity).await?;
    show(client).await
}

pub async fn remove(client: &ArmoryClient, id: WeaponId) -> CommandResult {
    client.cart().fetch().await?;
    client.cart().remove(id).await?;
    show(client).await
}
