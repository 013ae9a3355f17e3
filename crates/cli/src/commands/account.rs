//! Session and account commands: login, register, profile, top-up.

use std::path::PathBuf;

use xeno_armory_client::ArmoryClient;
use xeno_armory_client::account::ProfileUpdate;
use xeno_armory_core::Credits;

use super::CommandResult;

pub async fn login(client: &ArmoryClient, username: &str, password: &str) -> CommandResult {
    let session = client.account().login(username, password).await?;
    println!("Signed in as {} ({})", session.display_name, session.role);
    Ok(())
}

pub async fn register(
    client: &ArmoryClient,
    username: &str,
    email: &str,
    password: &str,
) -> CommandResult {
    client.account().register(username, email, password).await?;
    println!("Account {username} registered. Run `armory login` to sign in.");
    Ok(())
}

pub async fn topup(client: &ArmoryClient, amount: Credits) -> CommandResult {
    let balance = client.account().topup(amount).await?;
    println!("New balance: {balance}");
    Ok(())
}

/// With no flags, print the profile; otherwise send the requested update.
pub async fn profile(
    client: &ArmoryClient,
    email: Option<String>,
    address: Option<String>,
    avatar: Option<PathBuf>,
) -> CommandResult {
    let avatar = match avatar {
        Some(path) => {
            let bytes = std::fs::read(&path)?;
            let file_name = path
                .file_name()
                .map_or_else(|| "avatar".to_string(), |n| n.to_string_lossy().into_owned());
            Some((file_name, bytes))
        }
        None => None,
    };

    let update = ProfileUpdate {
        email,
        address,
        avatar,
    };
    if update.is_empty() {
        let profile = client.account().profile().await?;
        println!("User:    {}", profile.username);
        println!("Email:   {}", profile.email);
        println!("Address: {}", profile.address);
        println!("Credits: {}", profile.credits);
        return Ok(());
    }

    client.account().update_profile(update).await?;
    Ok(())
}
