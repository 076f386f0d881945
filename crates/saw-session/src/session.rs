//! The session: one channel to one engine instance.
//!
//! A [`Session`] owns its transport handle, the schema cache, and the path
//! of the case it has open. Every public operation runs to completion on the
//! calling thread; nothing is retried and nothing times out. Two sessions
//! never share anything, so several engines can be driven side by side.

use crate::classify::{call, Payload};
use crate::config::SawConfig;
use crate::paths::to_posix;
use crate::schema::SchemaCache;
use saw_core::{ObjectType, SawError, SawResult, Tolerance, Variant};
use saw_transport::{BridgeProcess, Binding, Property, PropertyKind, SimAutoFunction, Transport};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// How to start a session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOptions {
    /// Case opened at start-up.
    pub case_path: PathBuf,
    /// Bridge executable; looked up when unset.
    pub bridge_binary: Option<PathBuf>,
    pub binding: Binding,
    pub ui_visible: bool,
    pub create_if_not_found: bool,
    /// Object types whose schema is cached at start-up.
    pub prewarm: Vec<ObjectType>,
    /// Closeness used by verified writes.
    pub tolerance: Tolerance,
}

impl SessionOptions {
    /// Options with every default and nothing to pre-warm.
    pub fn new(case_path: impl Into<PathBuf>) -> Self {
        Self {
            case_path: case_path.into(),
            bridge_binary: None,
            binding: Binding::default(),
            ui_visible: false,
            create_if_not_found: false,
            prewarm: Vec::new(),
            tolerance: Tolerance::default(),
        }
    }

    pub fn from_config(config: &SawConfig, case_path: impl Into<PathBuf>) -> Self {
        Self {
            case_path: case_path.into(),
            bridge_binary: config.bridge.binary.clone(),
            binding: config.bridge.binding,
            ui_visible: config.session.ui_visible,
            create_if_not_found: config.session.create_if_not_found,
            prewarm: config.session.prewarm.iter().map(ObjectType::new).collect(),
            tolerance: config.verify.tolerance(),
        }
    }

    pub fn prewarm<I, S>(mut self, object_types: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.prewarm = object_types.into_iter().map(ObjectType::new).collect();
        self
    }

    pub fn ui_visible(mut self, visible: bool) -> Self {
        self.ui_visible = visible;
        self
    }

    pub fn create_if_not_found(mut self, create: bool) -> Self {
        self.create_if_not_found = create;
        self
    }

    pub fn binding(mut self, binding: Binding) -> Self {
        self.binding = binding;
        self
    }

    pub fn tolerance(mut self, tolerance: Tolerance) -> Self {
        self.tolerance = tolerance;
        self
    }
}

pub struct Session {
    pub(crate) transport: Box<dyn Transport>,
    pub(crate) schema: SchemaCache,
    pub(crate) case_path: Option<String>,
    pub(crate) tolerance: Tolerance,
    released: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("transport", &self.transport.describe())
            .field("case_path", &self.case_path)
            .field("cached_types", &self.schema.cached_types())
            .field("released", &self.released)
            .finish()
    }
}

impl Session {
    /// Start the bridge and open the case.
    pub fn connect(options: SessionOptions) -> SawResult<Self> {
        let bridge = BridgeProcess::connect(options.bridge_binary.as_deref(), options.binding)
            .map_err(|e| {
                warn!(error = %e, "unable to launch SimAuto bridge");
                e.into_saw("connect")
            })?;
        Self::with_transport(Box::new(bridge), options)
    }

    /// Open a session over an existing transport.
    ///
    /// Sets the creation and visibility properties, opens the case, and
    /// caches schema for every pre-warm type, in that order.
    pub fn with_transport(transport: Box<dyn Transport>, options: SessionOptions) -> SawResult<Self> {
        let mut session = Self {
            transport,
            schema: SchemaCache::new(),
            case_path: None,
            tolerance: options.tolerance,
            released: false,
        };
        info!(transport = %session.transport.describe(), "starting SimAuto session");

        session.set_create_if_not_found(options.create_if_not_found)?;
        // Older engines have no UIVisible property; carry on without it.
        if let Err(err) = session.set_ui_visible(options.ui_visible) {
            warn!(error = %err, "unable to set UIVisible");
        }

        session.open_case(Some(&options.case_path))?;

        for object_type in &options.prewarm {
            session
                .schema
                .prewarm(session.transport.as_mut(), object_type)?;
        }
        Ok(session)
    }

    /// Path of the open case, as sent to the engine.
    pub fn case_path(&self) -> Option<&str> {
        self.case_path.as_deref()
    }

    pub fn tolerance(&self) -> Tolerance {
        self.tolerance
    }

    pub fn set_tolerance(&mut self, tolerance: Tolerance) {
        self.tolerance = tolerance;
    }

    pub fn schema(&self) -> &SchemaCache {
        &self.schema
    }

    pub fn describe(&self) -> String {
        self.transport.describe()
    }

    pub(crate) fn call(&mut self, function: SimAutoFunction, args: &[Variant]) -> SawResult<Payload> {
        call(self.transport.as_mut(), function, args)
    }

    /// Open a case, or re-open the tracked one when `path` is `None`.
    pub fn open_case(&mut self, path: Option<&Path>) -> SawResult<()> {
        let path = match path {
            Some(path) => to_posix(path),
            None => self.case_path.clone().ok_or(SawError::NoCaseOpen)?,
        };
        self.call(SimAutoFunction::OpenCase, &[Variant::from(path.as_str())])?;
        info!(case = %path, "opened case");
        self.case_path = Some(path);
        Ok(())
    }

    /// Close the case without saving.
    pub fn close_case(&mut self) -> SawResult<()> {
        self.call(SimAutoFunction::CloseCase, &[])?;
        info!("closed case");
        Ok(())
    }

    /// Close the case and release the transport. Later calls fail with a
    /// transport fault. Safe to call more than once.
    pub fn close(&mut self) -> SawResult<()> {
        if self.released {
            return Ok(());
        }
        let closed = self.close_case();
        self.released = true;
        let released = self
            .transport
            .release()
            .map_err(|e| e.into_saw("release"));
        debug!("released transport");
        closed.and(released)
    }

    pub fn is_closed(&self) -> bool {
        self.released
    }

    /// Set a writable server property, validating the value first.
    pub fn set_simauto_property(&mut self, property: Property, value: Variant) -> SawResult<()> {
        let invalid = |message: String| SawError::InvalidProperty {
            property: property.name().to_string(),
            message,
        };
        if !property.is_settable() {
            return Err(invalid("property is read-only".into()));
        }
        match (property.kind(), &value) {
            (PropertyKind::Bool, Variant::Bool(_)) => {}
            (PropertyKind::Path, Variant::Str(dir)) => {
                if !Path::new(dir).is_dir() {
                    return Err(invalid(format!("{dir} is not a valid path")));
                }
            }
            (kind, other) => {
                return Err(invalid(format!(
                    "expected a {kind:?} value, got {}",
                    other.kind()
                )))
            }
        }
        debug!(%property, %value, "setting property");
        self.transport
            .set_property(property, value)
            .map_err(|e| e.into_saw(property.name()))
    }

    pub fn set_create_if_not_found(&mut self, create: bool) -> SawResult<()> {
        self.set_simauto_property(Property::CreateIfNotFound, Variant::Bool(create))
    }

    pub fn set_ui_visible(&mut self, visible: bool) -> SawResult<()> {
        self.set_simauto_property(Property::UiVisible, Variant::Bool(visible))
    }

    pub fn set_current_dir(&mut self, dir: impl AsRef<Path>) -> SawResult<()> {
        let dir = dir.as_ref().to_string_lossy().into_owned();
        self.set_simauto_property(Property::CurrentDir, Variant::Str(dir))
    }

    fn property(&mut self, property: Property) -> SawResult<Variant> {
        self.transport
            .get_property(property)
            .map_err(|e| e.into_saw(property.name()))
    }

    pub fn current_dir(&mut self) -> SawResult<PathBuf> {
        Ok(PathBuf::from(self.property(Property::CurrentDir)?.to_string()))
    }

    pub fn process_id(&mut self) -> SawResult<i64> {
        let value = self.property(Property::ProcessId)?;
        value.as_i64().ok_or_else(|| SawError::InvalidProperty {
            property: Property::ProcessId.name().to_string(),
            message: format!("engine returned a {}", value.kind()),
        })
    }

    pub fn request_build_date(&mut self) -> SawResult<String> {
        Ok(self.property(Property::RequestBuildDate)?.to_string())
    }

    pub fn ui_visible(&mut self) -> SawResult<bool> {
        let value = self.property(Property::UiVisible)?;
        value.as_bool().ok_or_else(|| SawError::InvalidProperty {
            property: Property::UiVisible.name().to_string(),
            message: format!("engine returned a {}", value.kind()),
        })
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if !self.released {
            if let Err(err) = self.transport.release() {
                warn!(error = %err, "failed to release transport");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use saw_transport::{FieldSpec, MemoryCase, MemoryEngine, ObjectData};

    fn engine() -> MemoryEngine {
        let engine = MemoryEngine::new();
        engine.register_case(
            "C:/cases/tiny.pwb",
            MemoryCase::new().with_object(
                "bus",
                ObjectData::new(vec![FieldSpec::new("BusNum", "Integer").key("*1*")])
                    .with_record([("BusNum", 1)]),
            ),
        );
        engine
    }

    #[test]
    fn start_up_sets_properties_opens_and_prewarms() {
        let engine = engine();
        let options = SessionOptions::new(r"C:\cases\tiny.pwb")
            .create_if_not_found(true)
            .prewarm(["BUS"]);
        let session = Session::with_transport(Box::new(engine.clone()), options).unwrap();

        assert_eq!(session.case_path(), Some("C:/cases/tiny.pwb"));
        assert!(session.schema().is_cached(&ObjectType::new("bus")));
        assert_eq!(engine.calls_to(SimAutoFunction::OpenCase), 1);
        assert_eq!(engine.case_path().as_deref(), Some("C:/cases/tiny.pwb"));
    }

    #[test]
    fn reopen_without_path_uses_tracked_case() {
        let engine = engine();
        let mut session =
            Session::with_transport(Box::new(engine.clone()), SessionOptions::new("C:/cases/tiny.pwb"))
                .unwrap();
        session.open_case(None).unwrap();
        assert_eq!(engine.calls_to(SimAutoFunction::OpenCase), 2);
    }

    #[test]
    fn missing_case_fails_construction() {
        let engine = engine();
        let err = Session::with_transport(Box::new(engine), SessionOptions::new("C:/nope.pwb"))
            .unwrap_err();
        assert!(matches!(err, SawError::RemoteOperation(_)));
    }

    #[test]
    fn property_validation() {
        let mut session =
            Session::with_transport(Box::new(engine()), SessionOptions::new("C:/cases/tiny.pwb"))
                .unwrap();
        assert!(matches!(
            session.set_simauto_property(Property::ProcessId, Variant::Int(3)),
            Err(SawError::InvalidProperty { .. })
        ));
        assert!(matches!(
            session.set_simauto_property(Property::UiVisible, Variant::from("yes")),
            Err(SawError::InvalidProperty { .. })
        ));
        assert!(matches!(
            session.set_current_dir("/definitely/not/a/dir"),
            Err(SawError::InvalidProperty { .. })
        ));

        let dir = tempfile::tempdir().unwrap();
        session.set_current_dir(dir.path()).unwrap();
        assert_eq!(session.current_dir().unwrap(), dir.path());
        session.set_ui_visible(true).unwrap();
        assert!(session.ui_visible().unwrap());
        assert_eq!(session.process_id().unwrap(), i64::from(std::process::id()));
    }

    #[test]
    fn close_releases_and_is_idempotent() {
        let engine = engine();
        let mut session =
            Session::with_transport(Box::new(engine.clone()), SessionOptions::new("C:/cases/tiny.pwb"))
                .unwrap();
        session.close().unwrap();
        session.close().unwrap();
        assert!(engine.is_released());
        assert!(engine.case().is_none());
        assert!(matches!(
            session.close_case(),
            Err(SawError::TransportFault { .. })
        ));
    }

    #[test]
    fn drop_releases_the_transport() {
        let engine = engine();
        {
            let _session = Session::with_transport(
                Box::new(engine.clone()),
                SessionOptions::new("C:/cases/tiny.pwb"),
            )
            .unwrap();
        }
        assert!(engine.is_released());
    }
}
