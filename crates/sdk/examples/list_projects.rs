//! List Projects Example
//!
//! Prints the Data Manager version and every project (with its root
//! files) the token's user can see.
//!
//! # Usage
//!
//! ```bash
//! export SQUONK2_DMAPI_URL=https://example.com/data-manager-api
//! export KEYCLOAK_TOKEN=...
//! cargo run --example list_projects
//! ```

use squonk2_sdk::DmClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let token = std::env::var("KEYCLOAK_TOKEN").map_err(|_| "KEYCLOAK_TOKEN is not set")?;

    let dm = DmClient::from_env()?;
    let (url, _) = dm.api_url();
    println!("DM-API url={}", url.unwrap_or_else(|| "(not set)".to_string()));

    dm.ping(&token).await?;
    println!("DM-API version={}\n", dm.get_version(&token).await?.version);

    let projects = dm.get_available_projects(&token).await?;
    if projects.projects.is_empty() {
        println!("No projects");
    }

    for project in &projects.projects {
        println!("{} ({})", project.name, project.project_id);

        let files = dm
            .list_project_files(&token, &project.project_id, "/", false)
            .await?;
        for name in files.file_names() {
            println!("  + {}", name);
        }
        for path in &files.paths {
            println!("  + {}/", path);
        }
    }

    Ok(())
}
