//! Error classification of raw engine results.
//!
//! The engine uses the first slot of every result tuple for both the error
//! message and the "nothing went wrong" marker. This module is the only place
//! that tells the two apart; everything above it sees a [`Payload`] or an
//! error.

use saw_core::{SawError, SawResult, Variant};
use saw_transport::{SimAutoFunction, Transport};
use tracing::{debug, error, warn};

/// Marker the engine puts in the first slot when a query matched nothing.
pub const NO_DATA_MARKER: &str = "No data";

/// A successful, classified result.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Success with no data, or a "no data" answer.
    None,
    /// Exactly one payload element.
    Value(Variant),
    /// Several payload elements, in order.
    Many(Vec<Variant>),
    /// The integer answer of the one bare-integer function.
    Count(i64),
}

impl Payload {
    pub fn is_none(&self) -> bool {
        matches!(self, Payload::None)
    }

    /// The payload as a single variant, `None` when absent.
    pub fn into_variant(self) -> Option<Variant> {
        match self {
            Payload::None => None,
            Payload::Value(v) => Some(v),
            Payload::Many(items) => Some(Variant::Array(items)),
            Payload::Count(n) => Some(Variant::Int(n)),
        }
    }
}

/// Invoke `function` over `transport` and classify the result.
///
/// This is the only path by which the session talks to the engine.
pub fn call(
    transport: &mut dyn Transport,
    function: SimAutoFunction,
    args: &[Variant],
) -> SawResult<Payload> {
    debug!(%function, args = args.len(), "calling engine");
    let raw = transport.invoke(function, args).map_err(|err| {
        error!(%function, error = %err, "engine call failed");
        err.into_saw(function.name())
    })?;
    classify(function, raw)
}

/// Classify the raw result of `function`.
pub fn classify(function: SimAutoFunction, raw: Variant) -> SawResult<Payload> {
    let items = match raw {
        Variant::Empty => return Ok(Payload::None),
        Variant::Int(n) if function.returns_bare_integer() => {
            if n == -1 {
                return Err(SawError::RemoteOperation(format!(
                    "{function}: engine returned -1"
                )));
            }
            return Ok(Payload::Count(n));
        }
        Variant::Array(items) => items,
        other => {
            return Err(SawError::RemoteOperation(format!(
                "{function}: unexpected result shape ({})",
                other.kind()
            )))
        }
    };

    let mut items = items.into_iter();
    let Some(head) = items.next() else {
        return Ok(Payload::None);
    };

    if let Variant::Str(message) = &head {
        if message.contains(NO_DATA_MARKER) {
            warn!(%function, message = %message, "engine returned no data");
            return Ok(Payload::None);
        }
        if !message.is_empty() {
            return Err(SawError::RemoteOperation(message.clone()));
        }
    }

    let rest: Vec<Variant> = items.collect();
    debug!(%function, elements = rest.len(), "classified result");
    Ok(match rest.len() {
        0 => Payload::None,
        1 => rest
            .into_iter()
            .next()
            .map(Payload::Value)
            .unwrap_or(Payload::None),
        _ => Payload::Many(rest),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tuple(items: Vec<Variant>) -> Variant {
        Variant::Array(items)
    }

    #[test]
    fn empty_string_tuple_is_success_without_payload() {
        let payload = classify(SimAutoFunction::OpenCase, tuple(vec!["".into()])).unwrap();
        assert_eq!(payload, Payload::None);
    }

    #[test]
    fn error_message_is_surfaced_verbatim() {
        let err = classify(
            SimAutoFunction::OpenCase,
            tuple(vec!["OpenCase: Error opening file".into()]),
        )
        .unwrap_err();
        assert!(matches!(err, SawError::RemoteOperation(msg) if msg == "OpenCase: Error opening file"));
    }

    #[test]
    fn no_data_is_absent_not_an_error() {
        let payload = classify(
            SimAutoFunction::GetParametersMultipleElement,
            tuple(vec!["GetParametersMultipleElement: No data returned".into()]),
        )
        .unwrap();
        assert!(payload.is_none());
    }

    #[test]
    fn length_two_returns_the_element() {
        let payload = classify(
            SimAutoFunction::GetFieldList,
            tuple(vec!["".into(), Variant::strings(["a", "b"])]),
        )
        .unwrap();
        assert_eq!(payload, Payload::Value(Variant::strings(["a", "b"])));
    }

    #[test]
    fn longer_results_return_every_tail_element() {
        let payload = classify(
            SimAutoFunction::GetParametersMultipleElement,
            tuple(vec!["".into(), 1.into(), 2.into()]),
        )
        .unwrap();
        assert_eq!(payload, Payload::Many(vec![1.into(), 2.into()]));
    }

    #[test]
    fn transport_failures_keep_their_kind() {
        let mut engine = saw_transport::MemoryEngine::new();
        engine.inject_fault(SimAutoFunction::CloseCase, "RPC server unavailable");
        engine.disable(SimAutoFunction::SendToExcel);

        let err = call(&mut engine, SimAutoFunction::CloseCase, &[]).unwrap_err();
        assert!(matches!(err, SawError::TransportFault { ref function, .. } if function == "CloseCase"));
        let err = call(&mut engine, SimAutoFunction::SendToExcel, &[]).unwrap_err();
        assert!(matches!(err, SawError::UnknownOperation(_)));
    }

    #[test]
    fn bare_integer_sentinel() {
        assert_eq!(
            classify(SimAutoFunction::GetSpecificFieldMaxNum, Variant::Int(4)).unwrap(),
            Payload::Count(4)
        );
        assert!(classify(SimAutoFunction::GetSpecificFieldMaxNum, Variant::Int(-1)).is_err());
        // Only one function is allowed to answer with a bare integer.
        assert!(classify(SimAutoFunction::OpenCase, Variant::Int(4)).is_err());
    }
}
