use crate::error::TransportResult;
use crate::function::{Property, SimAutoFunction};
use saw_core::Variant;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single channel to one engine instance.
///
/// Implementations forward calls verbatim and hand back whatever the engine
/// produced; they never interpret the payload. Calls block until the engine
/// replies and there is no timeout: a hung engine hangs the caller.
pub trait Transport: Send {
    /// Call a remote function with positional arguments.
    fn invoke(&mut self, function: SimAutoFunction, args: &[Variant]) -> TransportResult<Variant>;

    /// Assign a server property.
    fn set_property(&mut self, property: Property, value: Variant) -> TransportResult<()>;

    /// Read a server property.
    fn get_property(&mut self, property: Property) -> TransportResult<Variant>;

    /// Release the handle. Further calls fail with `TransportError::Closed`.
    fn release(&mut self) -> TransportResult<()> {
        Ok(())
    }

    /// Short description for log lines.
    fn describe(&self) -> String;
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn invoke(&mut self, function: SimAutoFunction, args: &[Variant]) -> TransportResult<Variant> {
        (**self).invoke(function, args)
    }

    fn set_property(&mut self, property: Property, value: Variant) -> TransportResult<()> {
        (**self).set_property(property, value)
    }

    fn get_property(&mut self, property: Property) -> TransportResult<Variant> {
        (**self).get_property(property)
    }

    fn release(&mut self) -> TransportResult<()> {
        (**self).release()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}

/// How remote function names are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Binding {
    /// Resolve the dispatch table once at connect time and reject unknown
    /// functions locally.
    #[default]
    Early,
    /// Resolve every call on the remote side.
    Late,
}

impl Binding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Binding::Early => "early",
            Binding::Late => "late",
        }
    }
}

impl fmt::Display for Binding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Binding {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "early" => Ok(Binding::Early),
            "late" => Ok(Binding::Late),
            other => Err(format!(
                "unknown binding '{other}'; supported values: early, late"
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn binding_parsing() {
        assert_eq!("EARLY".parse::<Binding>().unwrap(), Binding::Early);
        assert_eq!("late".parse::<Binding>().unwrap(), Binding::Late);
        assert!("lazy".parse::<Binding>().is_err());
    }
}
