//! Checkout and order-history commands.

use xeno_armory_client::ArmoryClient;

use super::CommandResult;

pub async fn checkout(client: &ArmoryClient) -> CommandResult {
    client.cart().fetch().await?;

    match client.checkout().submit_order().await? {
        Some(confirmation) => {
            println!("Order #{} placed.", confirmation.order_id);
            println!("Total:             {}", confirmation.total);
            println!("Remaining credits: {}", confirmation.remaining_credits);
        }
        None => println!("Cart is empty, nothing to order."),
    }
    Ok(())
}

pub async fn history(client: &ArmoryClient) -> CommandResult {
    let orders = client.checkout().order_history().await?;

    if orders.is_empty() {
        println!("No orders yet.");
        return Ok(());
    }

    for order in &orders {
        println!(
            "#{}  {}  {}  {}",
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.status,
            order.total
        );
        for item in &order.items {
            let name = item
                .weapon
                .as_ref()
                .map_or_else(|| format!("weapon {}", item.weapon_id), |w| w.name.clone());
            println!("     {:>3}x {name}", item.quantity);
        }
    }
    Ok(())
}
