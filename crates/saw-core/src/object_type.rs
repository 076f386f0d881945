use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of a category of simulated element (`bus`, `gen`, `branch`, ...).
///
/// The engine defines the universe of object types, so this is an open set:
/// any name is accepted until the engine rejects it. Names are compared
/// case-insensitively; the constructor folds to lower case so every cache
/// lookup and remote call sees the canonical spelling.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ObjectType(String);

impl ObjectType {
    pub fn new(name: impl AsRef<str>) -> Self {
        ObjectType(name.as_ref().trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ObjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ObjectType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ObjectType {
    fn from(s: &str) -> Self {
        ObjectType::new(s)
    }
}

impl From<String> for ObjectType {
    fn from(s: String) -> Self {
        ObjectType::new(s)
    }
}

impl From<&String> for ObjectType {
    fn from(s: &String) -> Self {
        ObjectType::new(s)
    }
}

impl From<&ObjectType> for ObjectType {
    fn from(t: &ObjectType) -> Self {
        t.clone()
    }
}

impl From<ObjectType> for String {
    fn from(t: ObjectType) -> Self {
        t.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_canonicalized() {
        assert_eq!(ObjectType::new("Gen").as_str(), "gen");
        assert_eq!(ObjectType::from(" BRANCH "), ObjectType::new("branch"));
    }

    #[test]
    fn serde_goes_through_canonicalization() {
        let t: ObjectType = serde_json::from_str("\"Shunt\"").unwrap();
        assert_eq!(t.as_str(), "shunt");
        assert_eq!(serde_json::to_string(&t).unwrap(), "\"shunt\"");
    }
}
