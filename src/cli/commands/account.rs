//! Account command handlers

use super::{connect, settle, token};
use crate::cli::Remote;
use crate::services::AuthenticatedUser;

fn print_token(user: &AuthenticatedUser) {
    println!("Signed in as {} <{}>", user.user.name, user.user.email);
    println!();
    println!("Token: {}", user.token);
    println!("Use it with: export HELPDESK_TOKEN={}", user.token);
}

pub async fn cmd_register(
    remote: &Remote,
    name: &str,
    email: &str,
    password: &str,
) -> anyhow::Result<()> {
    let client = connect(remote)?;
    let user = settle(client.register(name, email, password).await)?;
    print_token(&user);
    Ok(())
}

pub async fn cmd_login(remote: &Remote, email: &str, password: &str) -> anyhow::Result<()> {
    let client = connect(remote)?;
    let user = settle(client.login(email, password).await)?;
    print_token(&user);
    Ok(())
}

pub async fn cmd_whoami(remote: &Remote) -> anyhow::Result<()> {
    let client = connect(remote)?;
    let user = settle(client.me(token(remote)?).await)?;

    let role = if user.is_admin { "admin" } else { "user" };
    println!("{} <{}> [{}]", user.name, user.email, role);
    println!("  ID: {} | Member since: {}", user.id, user.created_at);
    Ok(())
}

pub async fn cmd_passwd(remote: &Remote, current: &str, new: &str) -> anyhow::Result<()> {
    let client = connect(remote)?;
    settle(client.change_password(current, new, token(remote)?).await)?;
    println!("Password updated");
    Ok(())
}

pub async fn cmd_rotate_key(remote: &Remote) -> anyhow::Result<()> {
    let client = connect(remote)?;
    let fresh = settle(client.regenerate_api_key(token(remote)?).await)?;
    println!("Token: {fresh}");
    println!("The previous token no longer works.");
    println!("Use it with: export HELPDESK_TOKEN={fresh}");
    Ok(())
}
