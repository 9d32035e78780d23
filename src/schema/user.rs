//! The core User schema and its enterprise extension (RFC 7643
//! sections 4.1 and 4.3).

use crate::attrs::{Attribute, Mutability, Returned, Uniqueness};
use crate::issues::{ValidationError, ValidationIssues};
use crate::scim_data::ScimValue;

use super::{ResourceSchema, SchemaExtension};

pub const USER_URI: &str = "urn:ietf:params:scim:schemas:core:2.0:User";
pub const ENTERPRISE_USER_URI: &str =
    "urn:ietf:params:scim:schemas:extension:enterprise:2.0:User";

fn validate_preferred_language(value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let Some(text) = value.as_str() else {
        return issues;
    };
    // e.g. "en-US" or "en-US, en;q=0.9"
    let well_formed = text.split(',').all(|part| {
        let tag = part.trim().split(';').next().unwrap_or("");
        !tag.is_empty()
            && tag
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-')
    });
    if !well_formed {
        issues.add_error(ValidationError::bad_value_syntax(), true);
    }
    issues
}

fn validate_locale(value: &ScimValue) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let Some(text) = value.as_str() else {
        return issues;
    };
    let well_formed = !text.is_empty()
        && text
            .split('-')
            .all(|part| !part.is_empty() && part.chars().all(|c| c.is_ascii_alphanumeric()));
    if !well_formed {
        issues.add_error(ValidationError::bad_value_syntax(), true);
    }
    issues
}

fn multi_valued_group(name: &str, description: &str, canonical_types: &[&str]) -> Attribute {
    let mut sub_attrs = vec![
        Attribute::string("value"),
        Attribute::string("display"),
        Attribute::string("type"),
        Attribute::boolean("primary"),
        Attribute::uri_reference("$ref"),
    ];
    if !canonical_types.is_empty() {
        sub_attrs[2] = Attribute::string("type").canonical_values(canonical_types);
    }
    Attribute::complex(name, sub_attrs)
        .multi_valued(true)
        .description(description)
}

/// Builds the core User resource schema.
pub fn user_schema() -> ResourceSchema {
    ResourceSchema::builder(USER_URI, "User")
        .plural_name("Users")
        .endpoint("/Users")
        .description("User Account")
        .attrs(vec![
            Attribute::string("userName")
                .description(
                    "Unique identifier for the User, typically used by the user to directly \
                     authenticate to the service provider.",
                )
                .required(true)
                .uniqueness(Uniqueness::Server),
            Attribute::complex(
                "name",
                vec![
                    Attribute::string("formatted"),
                    Attribute::string("familyName"),
                    Attribute::string("givenName"),
                    Attribute::string("middleName"),
                    Attribute::string("honorificPrefix"),
                    Attribute::string("honorificSuffix"),
                ],
            )
            .description("The components of the user's real name."),
            Attribute::string("displayName")
                .description("The name of the User, suitable for display to end-users."),
            Attribute::string("nickName")
                .description("The casual way to address the user in real life."),
            Attribute::external_reference("profileUrl")
                .description("A fully qualified URL pointing to a page representing the User's online profile."),
            Attribute::string("title").description("The user's title, such as 'Vice President'."),
            Attribute::string("userType")
                .description("Used to identify the relationship between the organization and the user."),
            Attribute::string("preferredLanguage")
                .description("Indicates the User's preferred written or spoken language.")
                .validator(validate_preferred_language),
            Attribute::string("locale")
                .description("Used to indicate the User's default location for localization.")
                .validator(validate_locale),
            Attribute::string("timezone")
                .description("The User's time zone in the 'Olson' time zone database format."),
            Attribute::boolean("active")
                .description("A Boolean value indicating the User's administrative status."),
            Attribute::string("password")
                .description("The User's cleartext password, used to set or replace it.")
                .mutability(Mutability::WriteOnly)
                .returned(Returned::Never),
            multi_valued_group(
                "emails",
                "Email addresses for the user.",
                &["work", "home", "other"],
            ),
            multi_valued_group(
                "phoneNumbers",
                "Phone numbers for the User.",
                &["work", "home", "mobile", "fax", "pager", "other"],
            ),
            multi_valued_group("ims", "Instant messaging addresses for the User.", &[]),
            Attribute::complex(
                "photos",
                vec![
                    Attribute::external_reference("value"),
                    Attribute::string("display"),
                    Attribute::string("type").canonical_values(&["photo", "thumbnail"]),
                    Attribute::boolean("primary"),
                ],
            )
            .multi_valued(true)
            .description("URLs of photos of the User."),
            Attribute::complex(
                "addresses",
                vec![
                    Attribute::string("formatted"),
                    Attribute::string("streetAddress"),
                    Attribute::string("locality"),
                    Attribute::string("region"),
                    Attribute::string("postalCode"),
                    Attribute::string("country"),
                    Attribute::string("type").canonical_values(&["work", "home", "other"]),
                    Attribute::boolean("primary"),
                ],
            )
            .multi_valued(true)
            .description("Physical mailing addresses for this User."),
            Attribute::complex(
                "groups",
                vec![
                    Attribute::string("value").mutability(Mutability::ReadOnly),
                    Attribute::scim_reference("$ref", &["User", "Group"])
                        .mutability(Mutability::ReadOnly),
                    Attribute::string("display").mutability(Mutability::ReadOnly),
                    Attribute::string("type")
                        .canonical_values(&["direct", "indirect"])
                        .mutability(Mutability::ReadOnly),
                ],
            )
            .multi_valued(true)
            .mutability(Mutability::ReadOnly)
            .description("A list of groups to which the user belongs."),
            multi_valued_group("entitlements", "A list of entitlements for the User.", &[]),
            multi_valued_group("roles", "A list of roles for the User.", &[]),
            Attribute::complex(
                "x509Certificates",
                vec![
                    Attribute::binary("value"),
                    Attribute::string("display"),
                    Attribute::string("type"),
                    Attribute::boolean("primary"),
                ],
            )
            .multi_valued(true)
            .description("A list of certificates issued to the User."),
        ])
        .build()
        .expect("the built-in User schema definition is valid")
}

/// Builds the enterprise User schema extension.
pub fn enterprise_user_extension() -> SchemaExtension {
    SchemaExtension::new(
        ENTERPRISE_USER_URI,
        "EnterpriseUser",
        vec![
            Attribute::string("employeeNumber")
                .description("A string identifier, typically numeric or alphanumeric, assigned to a person."),
            Attribute::string("costCenter").description("Identifies the name of a cost center."),
            Attribute::string("organization").description("Identifies the name of an organization."),
            Attribute::string("division").description("Identifies the name of a division."),
            Attribute::string("department").description("Identifies the name of a department."),
            Attribute::complex(
                "manager",
                vec![
                    Attribute::string("value"),
                    Attribute::scim_reference("$ref", &["User"]),
                    Attribute::string("displayName").mutability(Mutability::ReadOnly),
                ],
            )
            .description("The user's manager."),
        ],
    )
    .expect("the built-in enterprise User extension definition is valid")
    .with_description("Enterprise User")
}
