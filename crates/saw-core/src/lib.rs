//! # saw-core: shared vocabulary for the SimAuto wrapper
//!
//! Types every other crate in the workspace speaks:
//!
//! - [`Variant`] - loosely-typed values exactly as they cross the automation boundary
//! - [`Value`], [`Row`], [`Table`], [`Frame`] - cleaned, strictly-typed tabular data
//! - [`ObjectType`] - case-folded object type names (`bus`, `gen`, `branch`, ...)
//! - [`FieldCatalog`], [`KeyFieldSet`] - per-type schema metadata and key-field derivation
//! - [`SawError`] - the error taxonomy for every layer above the transport
//! - [`Tolerance`] - numeric closeness used when checking that writes were applied
//! - [`CaseFileType`], [`SolveMethod`] - string tags the engine understands
//!
//! Nothing in this crate talks to the engine; see `saw-transport` for the
//! wire and `saw-session` for the command layer.

pub mod case;
pub mod error;
pub mod numeric;
pub mod object_type;
pub mod schema;
pub mod table;
pub mod value;
pub mod variant;

pub use case::{CaseFileType, SolveMethod};
pub use error::{SawError, SawResult};
pub use numeric::Tolerance;
pub use object_type::ObjectType;
pub use schema::{
    parse_key_marker, FieldCatalog, FieldDataType, FieldDescriptor, KeyField, KeyFieldSet,
    FIELD_LIST_COLUMNS,
};
pub use table::{Frame, Row, Table};
pub use value::Value;
pub use variant::Variant;
