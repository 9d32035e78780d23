//! Stateless SCIM 2.0 validation library.
//!
//! Implements the data model of RFC 7643 and the protocol semantics of
//! RFC 7644 without any HTTP stack or storage backend: payloads enter as
//! already-decoded JSON, and validation results come back as a tree of
//! coded issues.
//!
//! # Core Components
//!
//! - [`schema`] - Resource and API message schemas driving validation,
//!   serialization, and deserialization
//! - [`Filter`] - The SCIM filter language: parse, serialize, evaluate
//! - [`PatchPath`] / [`PatchOperations`] - Patch paths and patch
//!   application
//! - [`validator`] - Request/response validators per SCIM endpoint
//! - [`ValidationIssues`] - Location-tagged, coded errors and warnings
//!
//! # Quick Start
//!
//! ```rust
//! use scim_validator::schema::{user_schema, Schema};
//! use scim_validator::ScimData;
//! use serde_json::json;
//!
//! let user = user_schema();
//! let body = ScimData::from_json(&json!({
//!     "schemas": ["urn:ietf:params:scim:schemas:core:2.0:User"],
//!     "userName": "bjensen",
//! })).unwrap();
//! let issues = user.validate(&body, None);
//! assert!(!issues.has_errors());
//! ```
//!
//! All schemas, filters, sorters, and validators are immutable once
//! constructed and safe to share across threads. Process-wide defaults
//! (registered resources, default value (de)serializers) are installed
//! during initialization and only read afterwards.

pub mod attrs;
pub mod config;
pub mod error;
pub mod filter;
pub mod ident;
pub mod issues;
pub mod patch;
pub mod presence;
pub mod registry;
pub mod schema;
pub mod scim_data;
pub mod sorter;
pub mod validator;

// Re-export commonly used types for convenience
pub use config::ServiceProviderConfig;
pub use error::{ScimError, ScimResult};
pub use filter::{CompValue, CompareOp, Filter, FilterExpr};
pub use ident::{AttrName, AttrPath, AttrRep, BoundedAttrRep, SchemaUri};
pub use issues::{
    Location, LocationKey, ScimErrorType, ValidationError, ValidationIssues, ValidationWarning,
};
pub use patch::{PatchOpKind, PatchOperation, PatchOperations, PatchPath};
pub use presence::{AttrValuePresenceConfig, DataDirection, DataInclusivity};
pub use schema::{ResourceSchema, Schema, SchemaExtension};
pub use scim_data::{ScimData, ScimValue};
pub use sorter::Sorter;
pub use validator::{RequestContext, ResponseContext, ScimValidator};
