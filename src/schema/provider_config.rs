//! The ServiceProviderConfig schema
//! (`urn:ietf:params:scim:schemas:core:2.0:ServiceProviderConfig`).

use serde_json::{json, Value};

use crate::attrs::{Attribute, AttributeIssuer, Mutability};
use crate::config::ServiceProviderConfig;

use super::ResourceSchema;

pub const SERVICE_PROVIDER_CONFIG_URI: &str =
    "urn:ietf:params:scim:schemas:core:2.0:ServiceProviderConfig";

fn supported_option(name: &str, description: &str) -> Attribute {
    Attribute::complex(
        name,
        vec![Attribute::boolean("supported")
            .required(true)
            .mutability(Mutability::ReadOnly)],
    )
    .required(true)
    .issuer(AttributeIssuer::ServiceProvider)
    .mutability(Mutability::ReadOnly)
    .description(description)
}

/// Schema of the `/ServiceProviderConfig` resource.
#[derive(Debug, Clone)]
pub struct ServiceProviderConfigSchema {
    schema: ResourceSchema,
}

impl Default for ServiceProviderConfigSchema {
    fn default() -> Self {
        Self::new()
    }
}

impl ServiceProviderConfigSchema {
    pub fn new() -> Self {
        let schema = ResourceSchema::builder(SERVICE_PROVIDER_CONFIG_URI, "ServiceProviderConfig")
            .plural_name("ServiceProviderConfigs")
            .endpoint("/ServiceProviderConfig")
            .description("Schema for representing the service provider's configuration")
            .attrs(vec![
                Attribute::uri_reference("documentationUri")
                    .description("An HTTP-addressable URL pointing to the service provider's documentation.")
                    .mutability(Mutability::ReadOnly),
                supported_option(
                    "patch",
                    "A complex type that specifies PATCH configuration options.",
                ),
                Attribute::complex(
                    "bulk",
                    vec![
                        Attribute::boolean("supported")
                            .required(true)
                            .mutability(Mutability::ReadOnly),
                        Attribute::integer("maxOperations")
                            .required(true)
                            .mutability(Mutability::ReadOnly),
                        Attribute::integer("maxPayloadSize")
                            .required(true)
                            .mutability(Mutability::ReadOnly),
                    ],
                )
                .required(true)
                .issuer(AttributeIssuer::ServiceProvider)
                .mutability(Mutability::ReadOnly)
                .description("A complex type that specifies bulk configuration options."),
                Attribute::complex(
                    "filter",
                    vec![
                        Attribute::boolean("supported")
                            .required(true)
                            .mutability(Mutability::ReadOnly),
                        Attribute::integer("maxResults")
                            .required(true)
                            .mutability(Mutability::ReadOnly),
                    ],
                )
                .required(true)
                .issuer(AttributeIssuer::ServiceProvider)
                .mutability(Mutability::ReadOnly)
                .description("A complex type that specifies FILTER options."),
                supported_option(
                    "changePassword",
                    "A complex type that specifies configuration options related to changing a password.",
                ),
                supported_option(
                    "sort",
                    "A complex type that specifies sort result options.",
                ),
                supported_option(
                    "etag",
                    "A complex type that specifies ETag configuration options.",
                ),
                Attribute::complex(
                    "authenticationSchemes",
                    vec![
                        Attribute::string("type")
                            .required(true)
                            .canonical_values(&[
                                "oauth",
                                "oauth2",
                                "oauthbearertoken",
                                "httpbasic",
                                "httpdigest",
                            ])
                            .mutability(Mutability::ReadOnly),
                        Attribute::string("name")
                            .required(true)
                            .mutability(Mutability::ReadOnly),
                        Attribute::string("description")
                            .required(true)
                            .mutability(Mutability::ReadOnly),
                        Attribute::uri_reference("specUri").mutability(Mutability::ReadOnly),
                        Attribute::uri_reference("documentationUri")
                            .mutability(Mutability::ReadOnly),
                        Attribute::boolean("primary").mutability(Mutability::ReadOnly),
                    ],
                )
                .required(true)
                .multi_valued(true)
                .issuer(AttributeIssuer::ServiceProvider)
                .mutability(Mutability::ReadOnly)
                .description("A multi-valued complex type that specifies supported authentication scheme properties."),
            ])
            .build()
            .expect("the built-in ServiceProviderConfig schema definition is valid");
        Self { schema }
    }

    pub fn schema(&self) -> &ResourceSchema {
        &self.schema
    }

    /// Renders a service provider configuration the way the
    /// `/ServiceProviderConfig` endpoint returns it.
    pub fn get_repr(&self, config: &ServiceProviderConfig) -> Value {
        let mut repr = serde_json::to_value(config).unwrap_or_else(|_| json!({}));
        if let Some(map) = repr.as_object_mut() {
            map.insert(
                "schemas".into(),
                json!([SERVICE_PROVIDER_CONFIG_URI]),
            );
            map.insert(
                "meta".into(),
                json!({
                    "resourceType": "ServiceProviderConfig",
                    "location": "/ServiceProviderConfig",
                }),
            );
        }
        repr
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BulkOption, FilterOption, GenericOption};
    use crate::schema::Schema;
    use crate::scim_data::ScimData;

    #[test]
    fn config_representation_is_valid() {
        let schema = ServiceProviderConfigSchema::new();
        let config = ServiceProviderConfig {
            patch: GenericOption::enabled(),
            bulk: BulkOption::enabled(1000, 1048576),
            filter: FilterOption::enabled(100),
            ..Default::default()
        };
        let repr = schema.get_repr(&config);
        let data = ScimData::from_json(&repr).unwrap();
        let issues = schema.schema().validate(&data, None);
        assert!(!issues.has_errors(), "{}", issues.to_json(true));
    }
}
