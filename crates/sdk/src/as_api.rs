//! Account Server API client
//!
//! Organisations, Units, Products and Assets. Request bodies are JSON.
//! `ping` and `get_version` need no token.

use chrono::NaiveDate;
use reqwest::StatusCode;
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use squonk2_core::domain::AssetScope;

use crate::config::ClientConfig;
use crate::error::{require, ApiError, Result};
use crate::executor::{ApiRequest, RequestExecutor};
use crate::types::{Created, NewProduct, Version};

/// Unit billing days run from 1 to 28
pub const MAX_BILLING_DAY: u8 = 28;

/// Account Server API client
#[derive(Debug, Clone)]
pub struct AsClient {
    executor: Arc<RequestExecutor>,
}

impl AsClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        Ok(Self {
            executor: Arc::new(RequestExecutor::new(config)?),
        })
    }

    /// Client configured from `SQUONK2_ASAPI_URL` and
    /// `SQUONK2_ASAPI_VERIFY_SSL_CERT`
    pub fn from_env() -> Result<Self> {
        Self::new(ClientConfig::as_from_env())
    }

    /// Replace the API URL, typically `https://example.com/account-server-api`
    pub fn set_api_url(&self, url: &str, verify_tls: bool) -> Result<()> {
        self.executor.set_api_url(url, verify_tls)
    }

    pub fn api_url(&self) -> (Option<String>, bool) {
        self.executor.api_url()
    }

    async fn get_json(
        &self,
        token: &str,
        endpoint: String,
        label: &str,
    ) -> Result<serde_json::Value> {
        Ok(self
            .executor
            .execute(Some(token), ApiRequest::get(endpoint).label(label))
            .await?
            .payload)
    }

    async fn delete(&self, token: &str, endpoint: String, label: &str) -> Result<()> {
        self.executor
            .execute(
                Some(token),
                ApiRequest::delete(endpoint)
                    .label(label)
                    .expecting(&[StatusCode::NO_CONTENT]),
            )
            .await?;
        Ok(())
    }

    async fn create(
        &self,
        token: &str,
        endpoint: String,
        label: &str,
        body: serde_json::Value,
    ) -> Result<Created> {
        self.executor
            .execute(
                Some(token),
                ApiRequest::post(endpoint)
                    .label(label)
                    .expecting(&[StatusCode::CREATED])
                    .json(body),
            )
            .await?
            .into_typed()
    }

    // ========================================================================
    // Service
    // ========================================================================

    /// Check the Account Server is responding
    pub async fn ping(&self) -> Result<()> {
        self.get_version().await.map(|_| ())
    }

    pub async fn get_version(&self) -> Result<Version> {
        self.executor
            .execute(None, ApiRequest::get("/version").label("Failed getting version"))
            .await?
            .into_typed()
    }

    // ========================================================================
    // Listings
    // ========================================================================

    pub async fn get_available_products(&self, token: &str) -> Result<serde_json::Value> {
        self.get_json(token, "/product".into(), "Failed getting products").await
    }

    /// Units (and their Organisations) available to the token's user
    pub async fn get_available_units(&self, token: &str) -> Result<serde_json::Value> {
        self.get_json(token, "/unit".into(), "Failed getting units").await
    }

    pub async fn get_merchants(&self, token: &str) -> Result<serde_json::Value> {
        self.get_json(token, "/merchant".into(), "Failed getting merchants").await
    }

    /// Assets available to the token's user, optionally limited to a scope.
    ///
    /// # Arguments
    /// * `scope_id` - A product, unit or organisation UUID, or a username
    ///
    /// # Errors
    /// `Domain(UnsupportedScope)` for any other UUID (i.e. an asset UUID)
    pub async fn get_available_assets(
        &self,
        token: &str,
        scope_id: Option<&str>,
    ) -> Result<serde_json::Value> {
        let mut request = ApiRequest::get("/asset").label("Failed getting assets");
        if let Some(scope_id) = scope_id.filter(|s| !s.is_empty()) {
            let scope = AssetScope::classify(scope_id)?;
            request = request.query(scope.query_param(), scope.id());
        }

        Ok(self
            .executor
            .execute(Some(token), request)
            .await?
            .payload)
    }

    // ========================================================================
    // Products
    // ========================================================================

    pub async fn get_product(&self, token: &str, product_id: &str) -> Result<serde_json::Value> {
        require("product_id", product_id)?;
        self.get_json(token, format!("/product/{}", product_id), "Failed getting product")
            .await
    }

    pub async fn get_products_for_unit(
        &self,
        token: &str,
        unit_id: &str,
    ) -> Result<serde_json::Value> {
        require("unit_id", unit_id)?;
        self.get_json(
            token,
            format!("/product/unit/{}", unit_id),
            "Failed getting unit products",
        )
        .await
    }

    pub async fn get_products_for_organisation(
        &self,
        token: &str,
        org_id: &str,
    ) -> Result<serde_json::Value> {
        require("org_id", org_id)?;
        self.get_json(
            token,
            format!("/product/organisation/{}", org_id),
            "Failed getting organisation products",
        )
        .await
    }

    /// Charges for a product, optionally between two dates (inclusive)
    pub async fn get_product_charges(
        &self,
        token: &str,
        product_id: &str,
        from: Option<NaiveDate>,
        until: Option<NaiveDate>,
    ) -> Result<serde_json::Value> {
        require("product_id", product_id)?;

        let mut request = ApiRequest::get(format!("/product/{}/charges", product_id))
            .label("Failed getting product charges");
        if let Some(from) = from {
            request = request.query("from", from.format("%Y-%m-%d"));
        }
        if let Some(until) = until {
            request = request.query("until", until.format("%Y-%m-%d"));
        }

        Ok(self
            .executor
            .execute(Some(token), request)
            .await?
            .payload)
    }

    /// Create a product in a unit.
    ///
    /// Zero allowance or limit values are not sent.
    pub async fn create_product(
        &self,
        token: &str,
        unit_id: &str,
        product: &NewProduct,
    ) -> Result<Created> {
        require("unit_id", unit_id)?;
        require("product name", &product.name)?;
        require("product type", &product.product_type)?;

        let created = self
            .create(
                token,
                format!("/product/unit/{}", unit_id),
                "Failed creating product",
                product.to_body(),
            )
            .await?;
        info!(product_id = %created.id, unit_id = %unit_id, "Created product");
        Ok(created)
    }

    pub async fn delete_product(&self, token: &str, product_id: &str) -> Result<()> {
        require("product_id", product_id)?;
        self.delete(token, format!("/product/{}", product_id), "Failed deleting product")
            .await
    }

    // ========================================================================
    // Organisations
    // ========================================================================

    pub async fn create_organisation(
        &self,
        token: &str,
        name: &str,
        owner: &str,
    ) -> Result<Created> {
        require("organisation name", name)?;
        require("organisation owner", owner)?;

        self.create(
            token,
            "/organisation".into(),
            "Failed creating organisation",
            json!({"name": name, "owner": owner}),
        )
        .await
    }

    pub async fn get_organisation(&self, token: &str, org_id: &str) -> Result<serde_json::Value> {
        require("org_id", org_id)?;
        self.get_json(token, format!("/organisation/{}", org_id), "Failed getting organisation")
            .await
    }

    pub async fn get_organisations(&self, token: &str) -> Result<serde_json::Value> {
        self.get_json(token, "/organisation".into(), "Failed getting organisations")
            .await
    }

    pub async fn delete_organisation(&self, token: &str, org_id: &str) -> Result<()> {
        require("org_id", org_id)?;
        self.delete(
            token,
            format!("/organisation/{}", org_id),
            "Failed deleting organisation",
        )
        .await
    }

    // ========================================================================
    // Units
    // ========================================================================

    /// Create a unit in an organisation.
    ///
    /// # Arguments
    /// * `billing_day` - Day of the month (1 to 28) the unit is billed
    pub async fn create_unit(
        &self,
        token: &str,
        org_id: &str,
        name: &str,
        billing_day: u8,
    ) -> Result<Created> {
        require("org_id", org_id)?;
        require("unit name", name)?;
        if !(1..=MAX_BILLING_DAY).contains(&billing_day) {
            return Err(ApiError::invalid(format!(
                "billing_day must be from 1 to {} (got {})",
                MAX_BILLING_DAY, billing_day
            )));
        }

        let created = self
            .create(
                token,
                format!("/organisation/{}/unit", org_id),
                "Failed creating unit",
                json!({"billing_day": billing_day, "name": name}),
            )
            .await?;
        info!(unit_id = %created.id, org_id = %org_id, "Created unit");
        Ok(created)
    }

    pub async fn get_unit(&self, token: &str, unit_id: &str) -> Result<serde_json::Value> {
        require("unit_id", unit_id)?;
        self.get_json(token, format!("/unit/{}", unit_id), "Failed getting unit")
            .await
    }

    /// Units of an organisation
    pub async fn get_units(&self, token: &str, org_id: &str) -> Result<serde_json::Value> {
        require("org_id", org_id)?;
        self.get_json(token, format!("/organisation/{}/unit", org_id), "Failed getting units")
            .await
    }

    pub async fn delete_unit(&self, token: &str, unit_id: &str) -> Result<()> {
        require("unit_id", unit_id)?;
        self.delete(token, format!("/unit/{}", unit_id), "Failed deleting unit")
            .await
    }
}
