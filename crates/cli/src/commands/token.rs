// token - print an access token for a Keycloak client

use anyhow::{Context, Result};
use clap::Args;

use squonk2_sdk::{get_access_token, KeycloakCredentials};

#[derive(Args)]
pub struct TokenArgs {
    /// Keycloak hostname, i.e. "example.com"
    #[arg(short = 'k', long)]
    keycloak_hostname: String,

    /// Keycloak realm, i.e. "squonk2"
    #[arg(short = 'r', long)]
    keycloak_realm: String,

    /// Keycloak client ID, i.e. "data-manager-api"
    #[arg(short = 'i', long)]
    keycloak_client_id: String,

    #[arg(long, env = "DMAPI_USERNAME")]
    username: String,

    #[arg(long, env = "DMAPI_PASSWORD", hide_env_values = true)]
    password: String,
}

pub async fn run(args: TokenArgs) -> Result<()> {
    let credentials = KeycloakCredentials::new(
        format!("https://{}/auth", args.keycloak_hostname),
        args.keycloak_realm,
        args.keycloak_client_id,
        args.username,
        args.password,
    );

    let token = get_access_token(&credentials)
        .await
        .with_context(|| format!("Failed to get token from {}", credentials.url))?;

    println!("{}", token);
    Ok(())
}
