//! Catalog browsing commands.

use xeno_armory_client::ArmoryClient;
use xeno_armory_client::catalog::CatalogFilter;
use xeno_armory_core::WeaponId;

use super::CommandResult;

pub async fn list(
    client: &ArmoryClient,
    category: Option<String>,
    search: Option<String>,
) -> CommandResult {
    let weapons = client.catalog().fetch_all().await?;
    let filter = CatalogFilter { category, search };
    let filtered = filter.apply(&weapons);

    if filtered.is_empty() {
        println!("No weapons match.");
        return Ok(());
    }

    println!(
        "{:>4}  {:<28} {:<10} {:>12} {:>6}",
        "ID", "NAME", "TYPE", "PRICE", "STOCK"
    );
    for weapon in &filtered {
        let stock = if weapon.orderable() {
            weapon.stock.to_string()
        } else {
            "out".to_string()
        };
        println!(
            "{:>4}  {:<28} {:<10} {:>12} {:>6}",
            weapon.id,
            weapon.name,
            weapon.category,
            weapon.price.to_string(),
            stock
        );
    }
    Ok(())
}

pub async fn show(client: &ArmoryClient, id: WeaponId) -> CommandResult {
    let weapon = client.catalog().fetch_one(id).await?;
    println!("{} (#{})", weapon.name, weapon.id);
    println!("Type:  {}", weapon.category);
    println!("Price: {}", weapon.price);
    println!(
        "Stock: {}{}",
        weapon.stock,
        if weapon.orderable() {
            ""
        } else {
            " (out of stock)"
        }
    );
    if !weapon.description.is_empty() {
        println!("\n{}", weapon.description);
    }
    Ok(())
}
