//! A session shared between threads.
//!
//! The engine handles one call at a time, so every operation takes the lock
//! for its whole duration.

use crate::session::Session;
use crate::verify::WriteReport;
use parking_lot::{Mutex, MutexGuard};
use saw_core::{ObjectType, SawResult, Table};
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct SharedSession {
    inner: Arc<Mutex<Session>>,
}

impl SharedSession {
    pub fn new(session: Session) -> Self {
        Self {
            inner: Arc::new(Mutex::new(session)),
        }
    }

    /// Run `f` with exclusive access to the session.
    pub fn with<R>(&self, f: impl FnOnce(&mut Session) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    pub fn lock(&self) -> MutexGuard<'_, Session> {
        self.inner.lock()
    }

    pub fn read_many<S: AsRef<str>>(
        &self,
        object_type: impl Into<ObjectType>,
        fields: &[S],
        filter: &str,
    ) -> SawResult<Option<Table>> {
        self.with(|s| s.read_many(object_type, fields, filter))
    }

    pub fn write_many(&self, object_type: impl Into<ObjectType>, table: &Table) -> SawResult<()> {
        self.with(|s| s.write_many(object_type, table))
    }

    pub fn write_many_verified(
        &self,
        object_type: impl Into<ObjectType>,
        table: &Table,
    ) -> SawResult<WriteReport> {
        self.with(|s| s.write_many_verified(object_type, table))
    }

    pub fn run_script<S: AsRef<str>>(&self, statements: &[S]) -> SawResult<()> {
        self.with(|s| s.run_script(statements))
    }

    pub fn close(&self) -> SawResult<()> {
        self.with(Session::close)
    }
}
