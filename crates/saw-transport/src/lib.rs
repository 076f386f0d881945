//! # saw-transport: talking to the automation server
//!
//! A [`Transport`] is one channel to one engine instance. It forwards a
//! [`SimAutoFunction`] call with positional [`Variant`](saw_core::Variant)
//! arguments and returns the raw result untouched. Two implementations ship
//! here:
//!
//! - [`BridgeProcess`] - a helper subprocess that owns the real automation
//!   handle, driven over newline-delimited JSON on stdin/stdout
//! - [`MemoryEngine`] - an in-process engine over JSON case snapshots, used by
//!   the test suites and by `saw --engine memory`
//!
//! Transport errors mean the call could not complete. Failures the engine
//! reports in its result payload come back as ordinary results.

pub mod bridge;
pub mod error;
pub mod function;
pub mod memory;
pub mod transport;

pub use bridge::{BridgeProcess, BINARY_NAME};
pub use error::{TransportError, TransportResult};
pub use function::{Property, PropertyKind, SimAutoFunction};
pub use memory::{FieldSpec, MemoryCase, MemoryEngine, ObjectData};
pub use transport::{Binding, Transport};
