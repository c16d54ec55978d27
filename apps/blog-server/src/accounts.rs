//! Account management outside the HTTP surface.

use blog_core::DomainError;
use blog_core::domain::User;

use crate::state::AppState;

/// Create a login account.
pub async fn create_user(state: &AppState, username: &str, password: &str) -> anyhow::Result<User> {
    let username = username.trim();
    anyhow::ensure!(!username.is_empty(), "username must not be empty");
    anyhow::ensure!(!password.is_empty(), "password must not be empty");

    if state.users.find_by_username(username).await?.is_some() {
        return Err(DomainError::UsernameTaken(username.to_string()).into());
    }

    let hash = state.passwords.hash(password)?;
    let user = state
        .users
        .save(User::new(username.to_string(), hash))
        .await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User created");
    Ok(user)
}

/// Create the account unless the username is already taken.
pub async fn ensure_user(state: &AppState, username: &str, password: &str) -> anyhow::Result<()> {
    if state.users.find_by_username(username.trim()).await?.is_none() {
        create_user(state, username, password).await?;
    }
    Ok(())
}
