//! The core Group schema (RFC 7643 section 4.2).

use crate::attrs::{Attribute, Mutability};

use super::ResourceSchema;

pub const GROUP_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:Group";

/// Builds the core Group resource schema.
pub fn group_schema() -> ResourceSchema {
    ResourceSchema::builder(GROUP_URI, "Group")
        .plural_name("Groups")
        .endpoint("/Groups")
        .description("Group")
        .attrs(vec![
            Attribute::string("displayName")
                .description("A human-readable name for the Group.")
                .required(true),
            Attribute::complex(
                "members",
                vec![
                    Attribute::string("value")
                        .description("Identifier of the member of this Group.")
                        .mutability(Mutability::Immutable),
                    Attribute::scim_reference("$ref", &["User", "Group"])
                        .description(
                            "The URI corresponding to a SCIM resource that is a member of this Group.",
                        )
                        .mutability(Mutability::Immutable),
                    Attribute::string("type")
                        .description("A label indicating the type of resource, e.g. 'User' or 'Group'.")
                        .canonical_values(&["User", "Group"])
                        .restrict_canonical_values(true)
                        .mutability(Mutability::Immutable),
                    Attribute::string("display").mutability(Mutability::ReadOnly),
                ],
            )
            .multi_valued(true)
            .description("A list of members of the Group."),
        ])
        .build()
        .expect("the built-in Group schema definition is valid")
}
