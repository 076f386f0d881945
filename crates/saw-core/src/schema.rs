//! Field catalogs and key-field derivation.
//!
//! The engine describes every object type with a field catalog: one entry
//! per field giving its key-field marker, internal name, data type, and
//! labels. Catalogs are kept sorted by internal name so field validation and
//! type lookup are binary searches.
//!
//! ## Key-field markers
//!
//! Key fields carry a marker of the form `*<digits><LETTERS>*`, where the
//! digits are the 1-based key position and the optional upper-case letters
//! only decorate the last key. Required fields are marked `**` and composite
//! fields `*<letter>*`; neither is a key. The derived positions must form the
//! dense range `0..k`; anything else means the engine handed us a malformed
//! schema.

use crate::error::{SawError, SawResult};
use crate::object_type::ObjectType;
use crate::table::Table;
use crate::value::Value;
use crate::variant::Variant;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Column names used when a catalog is rendered as a table.
pub const FIELD_LIST_COLUMNS: [&str; 5] = [
    "key_field",
    "internal_field_name",
    "field_data_type",
    "description",
    "display_name",
];

/// Data type tag of a field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldDataType {
    Integer,
    Real,
    String,
    /// A tag this wrapper does not know; treated as text.
    Other(std::string::String),
}

impl FieldDataType {
    pub fn parse(tag: &str) -> Self {
        match tag.trim() {
            "Integer" => FieldDataType::Integer,
            "Real" => FieldDataType::Real,
            "String" => FieldDataType::String,
            other => FieldDataType::Other(other.to_string()),
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FieldDataType::Integer | FieldDataType::Real)
    }

    pub fn as_str(&self) -> &str {
        match self {
            FieldDataType::Integer => "Integer",
            FieldDataType::Real => "Real",
            FieldDataType::String => "String",
            FieldDataType::Other(tag) => tag,
        }
    }
}

impl fmt::Display for FieldDataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a field catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub key_field: String,
    pub internal_name: String,
    pub data_type: FieldDataType,
    pub description: String,
    pub display_name: String,
}

impl FieldDescriptor {
    /// 1-based key position if the marker designates a key field.
    pub fn key_position(&self) -> Option<u32> {
        parse_key_marker(&self.key_field)
    }

    fn from_entry(entry: &Variant) -> SawResult<Self> {
        let cells = entry.as_array().ok_or_else(|| {
            SawError::InputType(format!("field list entry is a {}, not an array", entry.kind()))
        })?;
        if cells.len() < FIELD_LIST_COLUMNS.len() {
            return Err(SawError::InputType(format!(
                "field list entry has {} column(s), expected {}",
                cells.len(),
                FIELD_LIST_COLUMNS.len()
            )));
        }
        let text = |idx: usize| cells[idx].to_string().trim().to_string();
        Ok(Self {
            key_field: text(0),
            internal_name: text(1),
            data_type: FieldDataType::parse(&text(2)),
            description: text(3),
            display_name: text(4),
        })
    }

    fn to_values(&self) -> Vec<Value> {
        vec![
            Value::from(self.key_field.as_str()),
            Value::from(self.internal_name.as_str()),
            Value::from(self.data_type.as_str()),
            Value::from(self.description.as_str()),
            Value::from(self.display_name.as_str()),
        ]
    }
}

/// Parse a key-field marker (`*1*`, `*2B*`, ...) into its 1-based position.
///
/// Only the leading `*<digits><LETTERS>*` is inspected; anything after the
/// closing asterisk is ignored.
pub fn parse_key_marker(marker: &str) -> Option<u32> {
    let rest = marker.strip_prefix('*')?;
    let digits_end = rest
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(rest.len());
    if digits_end == 0 {
        return None;
    }
    let (digits, rest) = rest.split_at(digits_end);
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_uppercase());
    if !rest.starts_with('*') {
        return None;
    }
    digits.parse().ok()
}

/// Every field of one object type, sorted by internal name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldCatalog {
    object_type: ObjectType,
    fields: Vec<FieldDescriptor>,
}

impl FieldCatalog {
    pub fn new(object_type: ObjectType, mut fields: Vec<FieldDescriptor>) -> Self {
        fields.sort_by(|a, b| a.internal_name.cmp(&b.internal_name));
        Self {
            object_type,
            fields,
        }
    }

    /// Build a catalog from the payload of a field-list query: an array of
    /// entries, each an array of at least five cells.
    pub fn from_payload(object_type: ObjectType, payload: &Variant) -> SawResult<Self> {
        let entries = payload.as_array().ok_or_else(|| {
            SawError::InputType(format!("field list payload is a {}", payload.kind()))
        })?;
        let fields = entries
            .iter()
            .map(FieldDescriptor::from_entry)
            .collect::<SawResult<Vec<_>>>()?;
        Ok(Self::new(object_type, fields))
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Binary search for one internal field name.
    pub fn find(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields
            .binary_search_by(|f| f.internal_name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.fields[idx])
    }

    /// Look up every name, failing with [`SawError::UnknownField`] listing
    /// all names that are not in the catalog.
    pub fn lookup<S: AsRef<str>>(&self, names: &[S]) -> SawResult<Vec<&FieldDescriptor>> {
        let mut found = Vec::with_capacity(names.len());
        let mut unknown = Vec::new();
        for name in names {
            match self.find(name.as_ref()) {
                Some(field) => found.push(field),
                None => unknown.push(name.as_ref().to_string()),
            }
        }
        if !unknown.is_empty() {
            return Err(SawError::UnknownField {
                object_type: self.object_type.to_string(),
                fields: unknown,
            });
        }
        Ok(found)
    }

    /// Numeric mask for the given names (`true` for Integer and Real fields).
    pub fn identify_numeric<S: AsRef<str>>(&self, names: &[S]) -> SawResult<Vec<bool>> {
        Ok(self
            .lookup(names)?
            .into_iter()
            .map(|f| f.data_type.is_numeric())
            .collect())
    }

    pub fn to_table(&self) -> Table {
        let rows = self.fields.iter().map(FieldDescriptor::to_values).collect();
        // Every row has exactly FIELD_LIST_COLUMNS.len() values.
        Table::from_rows(FIELD_LIST_COLUMNS.to_vec(), rows).unwrap_or_default()
    }
}

/// A key field together with its zero-based position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyField {
    pub index: usize,
    pub field: FieldDescriptor,
}

/// The identifying fields of one object type, ordered by position.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeyFieldSet {
    object_type: ObjectType,
    keys: Vec<KeyField>,
}

impl KeyFieldSet {
    /// Derive the key-field set from a catalog.
    ///
    /// Fails with [`SawError::InvariantFailure`] when positions repeat or
    /// leave a gap.
    pub fn derive(catalog: &FieldCatalog) -> SawResult<Self> {
        let mut keys = Vec::new();
        for field in catalog.fields() {
            if let Some(position) = field.key_position() {
                let index = position.checked_sub(1).ok_or_else(|| {
                    SawError::InvariantFailure(format!(
                        "key marker '{}' on {}.{} is not 1-based",
                        field.key_field,
                        catalog.object_type(),
                        field.internal_name
                    ))
                })?;
                keys.push(KeyField {
                    index: index as usize,
                    field: field.clone(),
                });
            }
        }
        keys.sort_by_key(|k| k.index);

        for (expected, key) in keys.iter().enumerate() {
            if key.index != expected {
                return Err(SawError::InvariantFailure(format!(
                    "key positions for '{}' are not dense: expected {}, found {} ({})",
                    catalog.object_type(),
                    expected,
                    key.index,
                    key.field.internal_name
                )));
            }
        }

        Ok(Self {
            object_type: catalog.object_type().clone(),
            keys,
        })
    }

    pub fn object_type(&self) -> &ObjectType {
        &self.object_type
    }

    pub fn keys(&self) -> &[KeyField] {
        &self.keys
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Internal field names in key position order.
    pub fn names(&self) -> Vec<&str> {
        self.keys
            .iter()
            .map(|k| k.field.internal_name.as_str())
            .collect()
    }

    pub fn to_table(&self) -> Table {
        let rows = self
            .keys
            .iter()
            .map(|k| {
                let mut values = vec![Value::Int(k.index as i64)];
                values.extend(k.field.to_values().into_iter().skip(1));
                values
            })
            .collect();
        let mut columns = vec!["key_field_index"];
        columns.extend_from_slice(&FIELD_LIST_COLUMNS[1..]);
        Table::from_rows(columns, rows).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn field(marker: &str, name: &str, dtype: &str) -> FieldDescriptor {
        FieldDescriptor {
            key_field: marker.to_string(),
            internal_name: name.to_string(),
            data_type: FieldDataType::parse(dtype),
            description: String::new(),
            display_name: name.to_string(),
        }
    }

    fn branch_catalog() -> FieldCatalog {
        FieldCatalog::new(
            ObjectType::new("branch"),
            vec![
                field("*3B*", "LineCircuit", "String"),
                field("*1*", "BusNum", "Integer"),
                field("*2*", "BusNum:1", "Integer"),
                field("**", "LineR", "Real"),
                field("*A*", "BusName_NomVolt", "String"),
                field("", "LineMW", "Real"),
            ],
        )
    }

    #[test]
    fn key_markers_parse() {
        assert_eq!(parse_key_marker("*1*"), Some(1));
        assert_eq!(parse_key_marker("*12*"), Some(12));
        assert_eq!(parse_key_marker("*3B*"), Some(3));
        assert_eq!(parse_key_marker("*2AB*extra"), Some(2));
        assert_eq!(parse_key_marker("**"), None);
        assert_eq!(parse_key_marker("*A*"), None);
        assert_eq!(parse_key_marker("*1b*"), None);
        assert_eq!(parse_key_marker("1*"), None);
        assert_eq!(parse_key_marker(""), None);
    }

    #[test]
    fn catalog_is_sorted_and_searchable() {
        let catalog = branch_catalog();
        let names: Vec<_> = catalog
            .fields()
            .iter()
            .map(|f| f.internal_name.as_str())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert_eq!(catalog.find("LineMW").unwrap().data_type, FieldDataType::Real);
        assert!(catalog.find("LineMX").is_none());
    }

    #[test]
    fn identify_numeric_reports_unknown_fields() {
        let catalog = branch_catalog();
        assert_eq!(
            catalog
                .identify_numeric(&["BusNum", "BusNum:1", "LineCircuit", "LineMW"])
                .unwrap(),
            vec![true, true, false, true]
        );
        match catalog.identify_numeric(&["BusNum", "Nope", "Zilch"]) {
            Err(SawError::UnknownField { object_type, fields }) => {
                assert_eq!(object_type, "branch");
                assert_eq!(fields, vec!["Nope".to_string(), "Zilch".to_string()]);
            }
            other => panic!("expected UnknownField, got {other:?}"),
        }
    }

    #[test]
    fn key_fields_for_branch() {
        let keys = KeyFieldSet::derive(&branch_catalog()).unwrap();
        assert_eq!(keys.names(), vec!["BusNum", "BusNum:1", "LineCircuit"]);
        let table = keys.to_table();
        assert_eq!(table.columns()[0], "key_field_index");
        assert_eq!(table.value(2, "internal_field_name"), Some(&Value::from("LineCircuit")));
    }

    #[test]
    fn gap_in_key_positions_is_an_invariant_failure() {
        let catalog = FieldCatalog::new(
            ObjectType::new("gen"),
            vec![field("*1*", "BusNum", "Integer"), field("*3*", "GenID", "String")],
        );
        assert!(matches!(
            KeyFieldSet::derive(&catalog),
            Err(SawError::InvariantFailure(_))
        ));
    }

    #[test]
    fn duplicate_key_positions_are_an_invariant_failure() {
        let catalog = FieldCatalog::new(
            ObjectType::new("gen"),
            vec![field("*1*", "BusNum", "Integer"), field("*1*", "GenID", "String")],
        );
        assert!(matches!(
            KeyFieldSet::derive(&catalog),
            Err(SawError::InvariantFailure(_))
        ));
    }

    #[test]
    fn catalog_from_payload() {
        let payload = Variant::Array(vec![
            Variant::strings(["*1*", "BusNum", "Integer", "Number", "Number"]),
            Variant::strings(["", "BusName", "String", "Name", "Name", "extra"]),
        ]);
        let catalog = FieldCatalog::from_payload(ObjectType::new("bus"), &payload).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.fields()[0].internal_name, "BusName");

        let short = Variant::Array(vec![Variant::strings(["*1*", "BusNum"])]);
        assert!(matches!(
            FieldCatalog::from_payload(ObjectType::new("bus"), &short),
            Err(SawError::InputType(_))
        ));
    }

    proptest! {
        #[test]
        fn derived_key_positions_are_dense(
            n_keys in 1usize..6,
            n_plain in 0usize..8,
            suffix in "[A-Z]{0,2}",
        ) {
            let mut fields = Vec::new();
            for k in 0..n_keys {
                let marker = if k + 1 == n_keys {
                    format!("*{}{}*", k + 1, suffix)
                } else {
                    format!("*{}*", k + 1)
                };
                fields.push(field(&marker, &format!("Key{k}"), "Integer"));
            }
            for p in 0..n_plain {
                let marker = if p % 2 == 0 { "**" } else { "" };
                fields.push(field(marker, &format!("Plain{p}"), "Real"));
            }
            let catalog = FieldCatalog::new(ObjectType::new("synthetic"), fields);
            let keys = KeyFieldSet::derive(&catalog).unwrap();
            let indices: Vec<usize> = keys.keys().iter().map(|k| k.index).collect();
            prop_assert_eq!(indices, (0..n_keys).collect::<Vec<_>>());
        }

        #[test]
        fn identify_numeric_agrees_with_catalog(pick in 0usize..6) {
            let catalog = branch_catalog();
            let field = &catalog.fields()[pick];
            let mask = catalog.identify_numeric(&[field.internal_name.as_str()]).unwrap();
            prop_assert_eq!(mask[0], field.data_type.is_numeric());
        }
    }
}
