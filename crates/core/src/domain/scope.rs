// Account Server identities and Asset scope classification

use regex::Regex;
use std::sync::OnceLock;

use crate::domain::error::{DomainError, Result};

/// Organisation UUID prefix
pub const ORGANISATION_PREFIX: &str = "org-";
/// Unit UUID prefix
pub const UNIT_PREFIX: &str = "unit-";
/// Product UUID prefix
pub const PRODUCT_PREFIX: &str = "product-";
/// Asset UUID prefix
pub const ASSET_PREFIX: &str = "asset-";

// An AS UUID is a lower-case type prefix followed by a lower-case UUID,
// i.e. "unit-11111111-1111-1111-1111-111111111111"
const AS_UUID_PATTERN: &str =
    "^[a-z]{3,}-[a-f0-9]{8}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{4}-[a-f0-9]{12}$";

fn as_uuid_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(AS_UUID_PATTERN).expect("AS UUID pattern is valid"))
}

/// True if `value` looks like an Account Server UUID of any type.
pub fn is_as_uuid(value: &str) -> bool {
    as_uuid_regex().is_match(value)
}

/// True if `value` is an Account Server UUID with the given type prefix.
pub fn is_prefixed_uuid(value: &str, prefix: &str) -> bool {
    value.starts_with(prefix) && is_as_uuid(value)
}

/// The scope of an Asset query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetScope {
    Product(String),
    Unit(String),
    Organisation(String),
    User(String),
}

impl AssetScope {
    /// Classify a scope identity.
    ///
    /// Prefixed UUIDs select a Product, Unit or Organisation scope,
    /// anything that is not a UUID is taken to be a username.
    ///
    /// # Errors
    /// - `DomainError::UnsupportedScope` for a UUID of any other type
    ///   (an `asset-` UUID for example)
    pub fn classify(scope_id: &str) -> Result<Self> {
        if scope_id.is_empty() {
            return Err(DomainError::Validation("empty scope identity".to_string()));
        }
        if !is_as_uuid(scope_id) {
            return Ok(AssetScope::User(scope_id.to_string()));
        }

        let id = scope_id.to_string();
        if scope_id.starts_with(PRODUCT_PREFIX) {
            Ok(AssetScope::Product(id))
        } else if scope_id.starts_with(UNIT_PREFIX) {
            Ok(AssetScope::Unit(id))
        } else if scope_id.starts_with(ORGANISATION_PREFIX) {
            Ok(AssetScope::Organisation(id))
        } else {
            Err(DomainError::UnsupportedScope(id))
        }
    }

    /// The `/asset` query parameter name for this scope.
    pub fn query_param(&self) -> &'static str {
        match self {
            AssetScope::Product(_) => "product_id",
            AssetScope::Unit(_) => "unit_id",
            AssetScope::Organisation(_) => "org_id",
            AssetScope::User(_) => "user_id",
        }
    }

    pub fn id(&self) -> &str {
        match self {
            AssetScope::Product(id)
            | AssetScope::Unit(id)
            | AssetScope::Organisation(id)
            | AssetScope::User(id) => id,
        }
    }
}
