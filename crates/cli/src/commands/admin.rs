//! Inventory management commands (admin role required).

use std::path::PathBuf;

use xeno_armory_client::ArmoryClient;
use xeno_armory_client::admin::{Confirmation, ImageUpload, NewWeapon, WeaponDraft};
use xeno_armory_core::{Credits, WeaponId};

use super::CommandResult;

fn read_image(path: Option<PathBuf>) -> Result<Option<ImageUpload>, std::io::Error> {
    match path {
        Some(path) => {
            let bytes = std::fs::read(&path)?;
            let file_name = path
                .file_name()
                .map_or_else(|| "image".to_string(), |n| n.to_string_lossy().into_owned());
            Ok(Some(ImageUpload { file_name, bytes }))
        }
        None => Ok(None),
    }
}

pub async fn add(
    client: &ArmoryClient,
    name: String,
    category: String,
    price: Credits,
    stock: u32,
    description: String,
    image: Option<PathBuf>,
) -> CommandResult {
    let image = read_image(image)?;
    client
        .admin()
        .create(NewWeapon {
            name,
            category,
            price,
            stock,
            description,
            image,
        })
        .await?;
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub async fn edit(
    client: &ArmoryClient,
    id: WeaponId,
    name: Option<String>,
    category: Option<String>,
    price: Option<Credits>,
    stock: Option<u32>,
    description: Option<String>,
    image: Option<PathBuf>,
) -> CommandResult {
    let image = read_image(image)?;
    client.admin().stage(
        id,
        WeaponDraft {
            name,
            category,
            price,
            stock,
            description,
            image,
        },
    );
    client.admin().save(id).await?;
    println!("Weapon #{id} updated.");
    Ok(())
}

pub async fn delete(client: &ArmoryClient, id: WeaponId, yes: bool) -> CommandResult {
    let confirmation = if yes {
        Confirmation::Confirmed
    } else {
        Confirmation::Cancelled
    };
    client.admin().delete(id, confirmation).await?;
    println!("Weapon #{id} deleted.");
    Ok(())
}

pub async fn orders(client: &ArmoryClient) -> CommandResult {
    let orders = client.admin().all_orders().await?;

    if orders.is_empty() {
        println!("No orders in the system.");
        return Ok(());
    }

    for order in &orders {
        println!(
            "#{}  {}  {}  {}  {} ({})",
            order.id,
            order.created_at.format("%Y-%m-%d %H:%M"),
            order.status,
            order.total,
            order.username,
            order.user_id
        );
        if !order.address.is_empty() {
            println!("     ship to: {}", order.address);
        }
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
