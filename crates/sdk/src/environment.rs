// Environments File - named Squonk2 deployments
//
// ```yaml
// environments:
//   dls-test:
//     keycloak-hostname: example.com
//     keycloak-realm: squonk2
//     keycloak-as-client-id: account-server-api
//     keycloak-dm-client-id: data-manager-api
//     as-hostname: example.com
//     dm-hostname: example.com
//     admin-user: dlister
//     admin-password: secret
// default: dls-test
// ```

use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::auth::KeycloakCredentials;
use crate::error::EnvironmentError;

/// Environments file location override
pub const ENVIRONMENT_FILE_ENV: &str = "SQUONK2_ENVIRONMENT_FILE";
/// Default environments file
pub const DEFAULT_ENVIRONMENT_FILE: &str = "~/.squonk2/environments";

#[derive(Debug, Deserialize)]
struct EnvironmentsFile {
    #[serde(default)]
    environments: HashMap<String, Settings>,
    #[serde(default)]
    default: Option<String>,
}

#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct Settings {
    keycloak_hostname: Option<String>,
    keycloak_realm: Option<String>,
    keycloak_as_client_id: Option<String>,
    keycloak_dm_client_id: Option<String>,
    as_hostname: Option<String>,
    dm_hostname: Option<String>,
    admin_user: Option<String>,
    admin_password: Option<String>,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("keycloak_hostname", &self.keycloak_hostname)
            .field("as_hostname", &self.as_hostname)
            .field("dm_hostname", &self.dm_hostname)
            .finish_non_exhaustive()
    }
}

/// One named environment
#[derive(Debug, Clone)]
pub struct Environment {
    name: String,
    settings: Settings,
}

/// The environments file in use (`SQUONK2_ENVIRONMENT_FILE` or the default)
pub fn environments_file_path() -> PathBuf {
    let path = std::env::var(ENVIRONMENT_FILE_ENV)
        .ok()
        .filter(|p| !p.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_ENVIRONMENT_FILE.to_string());
    PathBuf::from(shellexpand::tilde(&path).into_owned())
}

impl Environment {
    /// Load an environment from the environments file.
    ///
    /// # Arguments
    /// * `name` - The environment, or `None` for the file's default
    pub fn load(name: Option<&str>) -> Result<Self, EnvironmentError> {
        Self::load_from(environments_file_path(), name)
    }

    /// Load an environment from a specific file
    pub fn load_from(
        path: impl AsRef<Path>,
        name: Option<&str>,
    ) -> Result<Self, EnvironmentError> {
        let path = path.as_ref();
        let load_error = |source| EnvironmentError::Load {
            path: path.display().to_string(),
            source,
        };

        let file: EnvironmentsFile = Config::builder()
            .add_source(File::new(&path.to_string_lossy(), FileFormat::Yaml))
            .build()
            .and_then(|config| config.try_deserialize::<EnvironmentsFile>())
            .map_err(load_error)?;

        let name = match name {
            Some(name) => name.to_string(),
            None => file.default.clone().ok_or(EnvironmentError::NoDefault)?,
        };

        let settings = file
            .environments
            .get(&name)
            .or_else(|| file.environments.get(&name.to_lowercase()))
            .cloned()
            .ok_or_else(|| EnvironmentError::UnknownEnvironment(name.clone()))?;

        debug!(environment = %name, file = %path.display(), "Loaded environment");
        Ok(Self { name, settings })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// i.e. `https://example.com/auth`
    pub fn keycloak_url(&self) -> Result<String, EnvironmentError> {
        Ok(format!(
            "https://{}/auth",
            self.require("keycloak-hostname", &self.settings.keycloak_hostname)?
        ))
    }

    /// i.e. `https://example.com/account-server-api`
    pub fn as_api_url(&self) -> Result<String, EnvironmentError> {
        Ok(format!(
            "https://{}/account-server-api",
            self.require("as-hostname", &self.settings.as_hostname)?
        ))
    }

    /// i.e. `https://example.com/data-manager-api`
    pub fn dm_api_url(&self) -> Result<String, EnvironmentError> {
        Ok(format!(
            "https://{}/data-manager-api",
            self.require("dm-hostname", &self.settings.dm_hostname)?
        ))
    }

    /// Admin user credentials for the Data Manager client
    pub fn dm_credentials(&self) -> Result<KeycloakCredentials, EnvironmentError> {
        self.credentials("keycloak-dm-client-id", &self.settings.keycloak_dm_client_id)
    }

    /// Admin user credentials for the Account Server client
    pub fn as_credentials(&self) -> Result<KeycloakCredentials, EnvironmentError> {
        self.credentials("keycloak-as-client-id", &self.settings.keycloak_as_client_id)
    }

    fn credentials(
        &self,
        client_id_setting: &'static str,
        client_id: &Option<String>,
    ) -> Result<KeycloakCredentials, EnvironmentError> {
        Ok(KeycloakCredentials::new(
            self.keycloak_url()?,
            self.require("keycloak-realm", &self.settings.keycloak_realm)?,
            self.require(client_id_setting, client_id)?,
            self.require("admin-user", &self.settings.admin_user)?,
            self.require("admin-password", &self.settings.admin_password)?,
        ))
    }

    fn require<'a>(
        &self,
        setting: &'static str,
        value: &'a Option<String>,
    ) -> Result<&'a str, EnvironmentError> {
        value
            .as_deref()
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| EnvironmentError::MissingSetting {
                environment: self.name.clone(),
                setting,
            })
    }
}
