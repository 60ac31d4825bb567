//! Login/logout command implementations

use anyhow::{Context, Result};
use financeflow_core::models::UserProfile;
use financeflow_core::LocalStore;

pub fn cmd_login(
    store: &mut LocalStore,
    token: &str,
    user_id: &str,
    name: Option<&str>,
    email: Option<&str>,
) -> Result<()> {
    let token = token.trim();
    let user_id = user_id.trim();
    if token.is_empty() || user_id.is_empty() {
        anyhow::bail!("Both --token and --user-id are required");
    }

    let user = UserProfile {
        id: user_id.to_string(),
        name: name.map(str::to_string),
        email: email.map(str::to_string),
    };
    store.set_auth_token(token).context("Failed to save token")?;
    store
        .set_cached_user(&user)
        .context("Failed to save user")?;

    println!(
        "✅ Logged in as {}",
        user.name.as_deref().unwrap_or(&user.id)
    );
    println!("   Session saved to {}", store.path().display());
    Ok(())
}

pub fn cmd_logout(store: &mut LocalStore) -> Result<()> {
    let had_session = store.auth_token()?.is_some();
    store.clear_session().context("Failed to clear session")?;

    if had_session {
        println!("👋 Logged out.");
    } else {
        println!("Not logged in.");
    }
    Ok(())
}
