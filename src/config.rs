//! Service provider configuration.
//!
//! A [`ServiceProviderConfig`] describes the optional SCIM capabilities a
//! provider implements. Validators read it to decide which checks apply;
//! it is never mutated during validation.

use serde::{Deserialize, Serialize};

use crate::error::{ScimError, ScimResult};

/// An on/off capability, e.g. patch or sort support.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenericOption {
    pub supported: bool,
}

impl GenericOption {
    pub fn enabled() -> Self {
        Self { supported: true }
    }
}

/// Bulk operation capability with its mandatory limits.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BulkOption {
    pub supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_operations: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_payload_size: Option<usize>,
}

impl BulkOption {
    pub fn enabled(max_operations: usize, max_payload_size: usize) -> Self {
        Self {
            supported: true,
            max_operations: Some(max_operations),
            max_payload_size: Some(max_payload_size),
        }
    }
}

/// Filtering capability with its mandatory result limit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FilterOption {
    pub supported: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
}

impl FilterOption {
    pub fn enabled(max_results: usize) -> Self {
        Self {
            supported: true,
            max_results: Some(max_results),
        }
    }
}

/// One supported authentication scheme.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AuthenticationScheme {
    #[serde(rename = "type")]
    pub scheme_type: String,
    pub name: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub spec_uri: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_uri: Option<String>,
}

/// Immutable description of the provider's optional capabilities,
/// mirroring the `/ServiceProviderConfig` resource from RFC 7643.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServiceProviderConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_uri: Option<String>,
    pub patch: GenericOption,
    pub bulk: BulkOption,
    pub filter: FilterOption,
    pub change_password: GenericOption,
    pub sort: GenericOption,
    pub etag: GenericOption,
    pub authentication_schemes: Vec<AuthenticationScheme>,
}

impl ServiceProviderConfig {
    /// A configuration with every optional capability disabled.
    pub fn minimal() -> Self {
        Self::default()
    }

    /// Checks the configuration's own invariants: enabled bulk requires
    /// operation and payload limits, enabled filtering requires a result
    /// limit.
    pub fn ensure_valid(&self) -> ScimResult<()> {
        if self.bulk.supported
            && (self.bulk.max_operations.is_none() || self.bulk.max_payload_size.is_none())
        {
            return Err(ScimError::InvalidConfiguration(
                "'maxOperations' and 'maxPayloadSize' must be specified if bulk operations \
                 are supported"
                    .into(),
            ));
        }
        if self.filter.supported && self.filter.max_results.is_none() {
            return Err(ScimError::InvalidConfiguration(
                "'maxResults' must be specified if filtering is supported".into(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_config_is_valid() {
        assert!(ServiceProviderConfig::minimal().ensure_valid().is_ok());
    }

    #[test]
    fn bulk_without_limits_is_rejected() {
        let config = ServiceProviderConfig {
            bulk: BulkOption {
                supported: true,
                max_operations: None,
                max_payload_size: None,
            },
            ..Default::default()
        };
        assert!(config.ensure_valid().is_err());
    }

    #[test]
    fn serializes_with_camel_case_keys() {
        let config = ServiceProviderConfig {
            patch: GenericOption::enabled(),
            bulk: BulkOption::enabled(1000, 1048576),
            filter: FilterOption::enabled(100),
            ..Default::default()
        };
        let value = serde_json::to_value(&config).unwrap();
        assert_eq!(value["patch"]["supported"], true);
        assert_eq!(value["bulk"]["maxOperations"], 1000);
        assert_eq!(value["filter"]["maxResults"], 100);
        assert_eq!(value["changePassword"]["supported"], false);
    }
}
