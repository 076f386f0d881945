//! # saw-session: the command layer over a SimAuto engine
//!
//! A [`Session`] owns one [`Transport`](saw_transport::Transport), opens a
//! case on start-up and exposes the engine's operations with typed,
//! validated arguments:
//!
//! - schema lookups cached per object type ([`SchemaCache`])
//! - reads that come back as cleaned [`Table`](saw_core::Table)s, or `None`
//!   when a type has no instances
//! - bulk writes, optionally re-read and compared ([`Session::write_many_verified`])
//! - case lifecycle, scripting and auxiliary-file operations
//!
//! ```no_run
//! use saw_session::{Session, SessionOptions};
//!
//! let mut session = Session::connect(SessionOptions::new(r"C:\cases\ieee14.pwb"))?;
//! let buses = session.get_power_flow_results("bus")?;
//! session.close()?;
//! # Ok::<(), saw_core::SawError>(())
//! ```

pub mod classify;
pub mod commands;
pub mod config;
pub mod normalize;
pub mod paths;
pub mod power_flow;
pub mod schema;
pub mod session;
pub mod shared;
pub mod verify;

pub use classify::{classify, Payload, NO_DATA_MARKER};
pub use commands::{FlatOutput, SPECIFIC_FIELD_LIST_COLUMNS};
pub use config::{BridgeConfig, SawConfig, SessionConfig, VerifyConfig, DEFAULT_PREWARM};
pub use paths::{to_posix, to_windows};
pub use power_flow::{power_flow_fields, POWER_FLOW_FIELDS};
pub use schema::SchemaCache;
pub use session::{Session, SessionOptions};
pub use shared::SharedSession;
pub use verify::{WriteReport, WriteState};
