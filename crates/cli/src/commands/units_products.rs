// units-products - create a Unit and a storage Product, then delete both

use anyhow::{Context, Result};
use clap::Args;

use squonk2_sdk::config::{is_yes, AS_API_URL_ENV};
use squonk2_sdk::{AsClient, ClientConfig, NewProduct};

use super::ok;

const STORAGE_PRODUCT_TYPE: &str = "DATA_MANAGER_STORAGE_SUBSCRIPTION";

#[derive(Args)]
pub struct UnitsProductsArgs {
    #[arg(long, env = "KEYCLOAK_TOKEN_AS", hide_env_values = true)]
    token: String,

    /// Organisation the Unit is created in
    #[arg(long, env = "ORG_ID")]
    org_id: String,

    #[arg(long, env = AS_API_URL_ENV)]
    as_api_url: String,

    #[arg(long, env = "SQUONK2_ASAPI_VERIFY_SSL_CERT", default_value = "yes")]
    verify_ssl_cert: String,

    #[arg(long, default_value = "Example")]
    unit_name: String,

    /// Day of the month the Unit is billed (1 to 28)
    #[arg(long, default_value_t = 8)]
    billing_day: u8,
}

pub async fn run(args: UnitsProductsArgs) -> Result<()> {
    let config = ClientConfig::new(&args.as_api_url).with_verify_tls(is_yes(&args.verify_ssl_cert));
    let client = AsClient::new(config)
        .with_context(|| format!("Invalid Account Server URL '{}'", args.as_api_url))?;
    let token = args.token.as_str();

    let unit = client
        .create_unit(token, &args.org_id, &args.unit_name, args.billing_day)
        .await
        .context("Failed to create unit")?;
    ok(format!("Created Unit '{}'", unit.id));

    let product = NewProduct::new("Example storage", STORAGE_PRODUCT_TYPE)
        .with_allowance(10)
        .with_limit(10);
    let product = client
        .create_product(token, &unit.id, &product)
        .await
        .context("Failed to create product")?;
    ok(format!("Created Product '{}'", product.id));

    client
        .delete_product(token, &product.id)
        .await
        .context("Failed to delete product")?;
    ok("Product deleted");

    client
        .delete_unit(token, &unit.id)
        .await
        .context("Failed to delete unit")?;
    ok("Unit deleted");

    Ok(())
}
