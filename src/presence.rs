//! Attribute value presence rules.
//!
//! An [`AttrValuePresenceConfig`] describes which attributes must or must
//! not appear in a payload, depending on the data flow direction and an
//! optional include/exclude list (the `attributes` / `excludedAttributes`
//! request parameters). [`validate_presence`] turns those rules plus the
//! attribute's own metadata into issue codes 5, 6, and 7.

use crate::attrs::{AttributeIssuer, Attribute, Returned};
use crate::ident::AttrPath;
use crate::issues::{ValidationError, ValidationIssues};
use crate::scim_data::ScimValue;

/// Direction of the data flow under validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataDirection {
    Request,
    Response,
}

/// Whether a value is expected to be included or excluded at a location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataInclusivity {
    Include,
    Exclude,
}

/// Presence configuration for one validation call.
#[derive(Debug, Clone)]
pub struct AttrValuePresenceConfig {
    direction: DataDirection,
    attr_paths: Vec<AttrPath>,
    include: Option<bool>,
    ignore_issuer: Vec<AttrPath>,
}

impl AttrValuePresenceConfig {
    /// Request-direction configuration with no attribute selection.
    pub fn request() -> Self {
        Self {
            direction: DataDirection::Request,
            attr_paths: Vec::new(),
            include: None,
            ignore_issuer: Vec::new(),
        }
    }

    /// Response-direction configuration with no attribute selection.
    pub fn response() -> Self {
        Self {
            direction: DataDirection::Response,
            attr_paths: Vec::new(),
            include: None,
            ignore_issuer: Vec::new(),
        }
    }

    /// Configuration with an attribute selection: when `include` is true
    /// the listed attributes are requested, otherwise they are excluded.
    pub fn new(direction: DataDirection, attr_paths: Vec<AttrPath>, include: bool) -> Self {
        Self {
            direction,
            attr_paths,
            include: Some(include),
            ignore_issuer: Vec::new(),
        }
    }

    /// Marks attributes whose issuer should be ignored during presence
    /// checks, e.g. required server-issued attributes in PUT requests.
    pub fn with_ignore_issuer(mut self, attr_paths: Vec<AttrPath>) -> Self {
        self.ignore_issuer = attr_paths;
        self
    }

    pub fn direction(&self) -> DataDirection {
        self.direction
    }

    pub fn attr_paths(&self) -> &[AttrPath] {
        &self.attr_paths
    }

    pub fn include(&self) -> Option<bool> {
        self.include
    }

    pub(crate) fn ignores_issuer_of(&self, path: &AttrPath) -> bool {
        self.ignore_issuer
            .iter()
            .any(|ignored| ignored.designates_same(path))
    }

    /// Whether a value at the given path is allowed to exist under this
    /// configuration, considering only the include/exclude selection.
    pub fn allowed(&self, path: &AttrPath) -> bool {
        let Some(include) = self.include else {
            return true;
        };
        if self.is_contained(path) {
            return include;
        }
        let sibling = self.is_sibling_contained(path);
        let parent = self.is_parent_contained(path);
        if sibling && !parent && include {
            return false;
        }
        if parent {
            return include;
        }
        if self.is_child_contained(path) && include {
            return true;
        }
        !include
    }

    fn is_contained(&self, path: &AttrPath) -> bool {
        self.attr_paths.iter().any(|rep| rep.designates_same(path))
    }

    fn is_parent_contained(&self, path: &AttrPath) -> bool {
        path.is_sub_attr()
            && self
                .attr_paths
                .iter()
                .any(|rep| rep.designates_same(&path.parent()))
    }

    fn is_child_contained(&self, path: &AttrPath) -> bool {
        self.attr_paths
            .iter()
            .any(|rep| rep.is_sub_attr() && rep.parent().designates_same(&path.parent()) && !path.is_sub_attr())
    }

    fn is_sibling_contained(&self, path: &AttrPath) -> bool {
        if !path.is_sub_attr() {
            return false;
        }
        self.attr_paths.iter().any(|rep| {
            rep.is_sub_attr()
                && rep.parent().designates_same(&path.parent())
                && rep.sub_attr() != path.sub_attr()
        })
    }

    /// Resolves the inclusivity to enforce for one attribute during schema
    /// validation. `None` means no presence constraint beyond the
    /// attribute's own metadata.
    pub(crate) fn inclusivity_for(
        &self,
        attr: &Attribute,
        path: &AttrPath,
        is_complex: bool,
    ) -> Option<DataInclusivity> {
        let Some(include) = self.include else {
            // a required top-level attribute must be present even without
            // an explicit selection, e.g. "userName", but not "manager.value"
            if attr.is_required() && !path.is_sub_attr() {
                return Some(DataInclusivity::Include);
            }
            return None;
        };

        if self.is_contained(path) {
            return if include {
                Some(DataInclusivity::Include)
            } else {
                Some(DataInclusivity::Exclude)
            };
        }

        if is_complex {
            // presence checks for a complex attribute are delegated to any
            // of its sub-attributes named in the selection
            if self
                .attr_paths
                .iter()
                .any(|rep| rep.parent().designates_same(&path.parent()))
            {
                return None;
            }
            return if include {
                Some(DataInclusivity::Exclude)
            } else {
                Some(DataInclusivity::Include)
            };
        }

        if !path.is_sub_attr() {
            return None;
        }
        if self.is_parent_contained(path) {
            // errors for the whole attribute are reported on the parent
            return None;
        }
        if self.is_sibling_contained(path) {
            return if include {
                Some(DataInclusivity::Exclude)
            } else {
                Some(DataInclusivity::Include)
            };
        }
        None
    }
}

/// Validates the presence of a single attribute value against the
/// direction, the attribute metadata, and the resolved inclusivity.
pub(crate) fn validate_presence(
    attr: &Attribute,
    value: Option<&ScimValue>,
    direction: DataDirection,
    ignore_issuer: bool,
    inclusivity: Option<DataInclusivity>,
    required_by_schema: bool,
) -> ValidationIssues {
    let present = value.is_some_and(ScimValue::is_present);
    if present {
        validate_can_be_present(attr, direction, ignore_issuer, inclusivity)
    } else {
        validate_can_be_omitted(attr, direction, ignore_issuer, inclusivity, required_by_schema)
    }
}

fn validate_can_be_omitted(
    attr: &Attribute,
    direction: DataDirection,
    ignore_issuer: bool,
    inclusivity: Option<DataInclusivity>,
    required_by_schema: bool,
) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    let issued_by_provider = direction == DataDirection::Request
        && attr.get_issuer() == AttributeIssuer::ServiceProvider
        && !ignore_issuer;
    let expected = inclusivity == Some(DataInclusivity::Include)
        || (direction == DataDirection::Response && attr.get_returned() == Returned::Always);
    if attr.is_required() && !issued_by_provider && expected && required_by_schema {
        issues.add_error(ValidationError::missing(), false);
    }
    issues
}

fn validate_can_be_present(
    attr: &Attribute,
    direction: DataDirection,
    ignore_issuer: bool,
    inclusivity: Option<DataInclusivity>,
) -> ValidationIssues {
    let mut issues = ValidationIssues::new();
    if direction == DataDirection::Request {
        if attr.get_issuer() == AttributeIssuer::ServiceProvider && !ignore_issuer {
            issues.add_error(ValidationError::must_not_be_provided(), true);
        }
        return issues;
    }
    if attr.get_returned() == Returned::Never
        || (attr.get_returned() != Returned::Always
            && inclusivity == Some(DataInclusivity::Exclude))
        || (attr.get_returned() == Returned::Request && inclusivity != Some(DataInclusivity::Include))
    {
        issues.add_error(ValidationError::must_not_be_returned(), true);
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attrs::Attribute;

    fn path(s: &str) -> AttrPath {
        AttrPath::parse(s).unwrap()
    }

    #[test]
    fn include_list_permits_listed_and_their_sub_attrs() {
        let config = AttrValuePresenceConfig::new(
            DataDirection::Response,
            vec![path("name")],
            true,
        );
        assert!(config.allowed(&path("name")));
        assert!(config.allowed(&path("name.formatted")));
        assert!(!config.allowed(&path("userName")));
    }

    #[test]
    fn exclude_list_forbids_listed_only() {
        let config = AttrValuePresenceConfig::new(
            DataDirection::Response,
            vec![path("nickName")],
            false,
        );
        assert!(!config.allowed(&path("nickName")));
        assert!(config.allowed(&path("userName")));
    }

    #[test]
    fn sibling_selection_excludes_other_sub_attrs() {
        let config = AttrValuePresenceConfig::new(
            DataDirection::Response,
            vec![path("name.givenName")],
            true,
        );
        assert!(config.allowed(&path("name.givenName")));
        assert!(!config.allowed(&path("name.familyName")));
        // the parent stays visible so its selected child can be returned
        assert!(config.allowed(&path("name")));
    }

    #[test]
    fn returned_never_must_not_be_returned() {
        let attr = Attribute::string("password").returned(Returned::Never);
        let value = ScimValue::from("secret");
        let issues = validate_presence(
            &attr,
            Some(&value),
            DataDirection::Response,
            false,
            None,
            true,
        );
        assert_eq!(issues.error_codes_at(&crate::loc![]), vec![7]);
    }

    #[test]
    fn returned_request_needs_explicit_request() {
        let attr = Attribute::string("token").returned(Returned::Request);
        let value = ScimValue::from("abc");
        let issues = validate_presence(
            &attr,
            Some(&value),
            DataDirection::Response,
            false,
            None,
            true,
        );
        assert_eq!(issues.error_codes_at(&crate::loc![]), vec![7]);

        let issues = validate_presence(
            &attr,
            Some(&value),
            DataDirection::Response,
            false,
            Some(DataInclusivity::Include),
            true,
        );
        assert!(issues.is_empty());
    }

    #[test]
    fn required_attr_missing_in_request_with_selection() {
        let attr = Attribute::string("userName").required(true);
        let issues = validate_presence(
            &attr,
            None,
            DataDirection::Request,
            false,
            Some(DataInclusivity::Include),
            true,
        );
        assert_eq!(issues.error_codes_at(&crate::loc![]), vec![5]);
    }

    #[test]
    fn server_issued_attr_in_request_is_code_6() {
        let attr = Attribute::string("id").issuer(AttributeIssuer::ServiceProvider);
        let value = ScimValue::from("2819c223");
        let issues = validate_presence(
            &attr,
            Some(&value),
            DataDirection::Request,
            false,
            None,
            true,
        );
        assert_eq!(issues.error_codes_at(&crate::loc![]), vec![6]);
    }
}
