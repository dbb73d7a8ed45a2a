//! Lazily opened accelerator session.

use super::coeff::YUV2RGB_COEFF;
use super::traits::{AcceleratorEngine, ColorConvertOp};
use super::{CoefficientTable, EngineRegistry};
use crate::error::{AcceleratorInitError, Error, Result};
use std::sync::Arc;

/// Handles that exist only while the session is open.
struct OpenHandles {
    engine: Box<dyn AcceleratorEngine>,
    operation: Box<dyn ColorConvertOp>,
    coeff: CoefficientTable,
}

/// Engine, operation handle and coefficient table for one element.
///
/// Nothing is acquired until [`ensure_open`](Self::ensure_open) is first
/// called; the three handles are then either all present or all absent.
/// [`close`](Self::close) releases them in reverse order of acquisition and
/// may be called any number of times.
pub struct AcceleratorSession {
    registry: Arc<EngineRegistry>,
    handles: Option<OpenHandles>,
}

impl AcceleratorSession {
    /// Create a closed session that opens engines from `registry`.
    pub fn new(registry: Arc<EngineRegistry>) -> Self {
        Self {
            registry,
            handles: None,
        }
    }

    /// Whether the engine, operation and coefficient table are held.
    #[inline]
    pub fn is_open(&self) -> bool {
        self.handles.is_some()
    }

    /// Name of the open engine.
    pub fn engine_name(&self) -> Option<&str> {
        self.handles.as_ref().map(|h| h.engine.name())
    }

    /// The coefficient table of the open session.
    pub fn coefficients(&self) -> Option<&CoefficientTable> {
        self.handles.as_ref().map(|h| &h.coeff)
    }

    /// Open `engine_name` unless the session is already open.
    ///
    /// On failure every handle acquired so far is released again and the
    /// session stays closed.
    pub fn ensure_open(&mut self, engine_name: &str) -> Result<()> {
        if self.is_open() {
            return Ok(());
        }

        tracing::debug!(engine = engine_name, "creating accelerator session");

        let mut engine = self.registry.open(engine_name)?;

        let mut operation = match engine.create_operation() {
            Ok(operation) => operation,
            Err(e) => {
                close_engine(engine.as_mut());
                return Err(AcceleratorInitError::OperationCreate {
                    engine: engine_name.to_string(),
                    reason: e.to_string(),
                }
                .into());
            }
        };

        let coeff = match engine.allocate_table(&YUV2RGB_COEFF) {
            Ok(coeff) => coeff,
            Err(e) => {
                close_operation(operation.as_mut());
                close_engine(engine.as_mut());
                return Err(AcceleratorInitError::CoefficientAlloc(e.to_string()).into());
            }
        };

        tracing::info!(engine = engine_name, "accelerator session open");

        self.handles = Some(OpenHandles {
            engine,
            operation,
            coeff,
        });
        Ok(())
    }

    /// Run one conversion on the open session.
    ///
    /// # Errors
    ///
    /// `Error::InvalidState` if the session is closed, and
    /// `Error::ConversionFailed` with the accelerator's status code if the
    /// call fails.
    pub fn convert(
        &mut self,
        height: u32,
        width: u32,
        y: &[u8],
        cb: &[u8],
        cr: &[u8],
        rgb: &mut [u8],
    ) -> Result<()> {
        let handles = self
            .handles
            .as_mut()
            .ok_or_else(|| Error::InvalidState("accelerator session is not open".into()))?;

        handles
            .operation
            .yuv420pl_to_rgb565(&handles.coeff, height, width, y, cb, cr, rgb)
            .map_err(Error::ConversionFailed)
    }

    /// Release the coefficient table, the operation and the engine.
    ///
    /// Errors from the backend are logged, never returned.
    pub fn close(&mut self) {
        let Some(handles) = self.handles.take() else {
            return;
        };
        let OpenHandles {
            mut engine,
            mut operation,
            coeff,
        } = handles;

        tracing::debug!(engine = engine.name(), "freeing coefficient table");
        drop(coeff);
        close_operation(operation.as_mut());
        drop(operation);
        close_engine(engine.as_mut());

        tracing::info!("accelerator session closed");
    }
}

fn close_operation(operation: &mut dyn ColorConvertOp) {
    if let Err(e) = operation.close() {
        tracing::warn!(error = %e, "failed to close accelerator operation");
    }
}

fn close_engine(engine: &mut dyn AcceleratorEngine) {
    if let Err(e) = engine.close() {
        tracing::warn!(engine = engine.name(), error = %e, "failed to close engine");
    }
}

impl Drop for AcceleratorSession {
    fn drop(&mut self) {
        self.close();
    }
}

impl std::fmt::Debug for AcceleratorSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcceleratorSession")
            .field("open", &self.is_open())
            .field("engine", &self.engine_name())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::accel::DEFAULT_ENGINE_NAME;

    fn session() -> AcceleratorSession {
        AcceleratorSession::new(Arc::new(EngineRegistry::new()))
    }

    #[test]
    fn test_lazy_open() {
        let mut session = session();
        assert!(!session.is_open());
        assert!(session.coefficients().is_none());

        session.ensure_open(DEFAULT_ENGINE_NAME).unwrap();
        assert!(session.is_open());
        assert_eq!(session.engine_name(), Some(DEFAULT_ENGINE_NAME));
        assert_eq!(session.coefficients().unwrap().as_slice(), &YUV2RGB_COEFF);
    }

    #[test]
    fn test_ensure_open_is_idempotent() {
        let mut session = session();
        session.ensure_open(DEFAULT_ENGINE_NAME).unwrap();
        let table = session.coefficients().unwrap().segment().id();

        session.ensure_open(DEFAULT_ENGINE_NAME).unwrap();
        assert_eq!(session.coefficients().unwrap().segment().id(), table);
    }

    #[test]
    fn test_unknown_engine_leaves_session_closed() {
        let mut session = session();
        let err = session.ensure_open("bogus").unwrap_err();
        assert!(matches!(
            err,
            Error::AcceleratorInit(AcceleratorInitError::EngineOpen { .. })
        ));
        assert!(!session.is_open());
    }

    #[test]
    fn test_convert_requires_open_session() {
        let mut session = session();
        let mut rgb = [0u8; 8];
        let err = session
            .convert(2, 2, &[16; 4], &[128], &[128], &mut rgb)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
    }

    #[test]
    fn test_convert_reports_status() {
        let mut session = session();
        session.ensure_open(DEFAULT_ENGINE_NAME).unwrap();

        let mut rgb = [0u8; 8];
        session
            .convert(2, 2, &[16; 4], &[128], &[128], &mut rgb)
            .unwrap();

        let err = session
            .convert(2, 2, &[16; 2], &[128], &[128], &mut rgb)
            .unwrap_err();
        assert!(matches!(err, Error::ConversionFailed(code) if code < 0));
    }

    #[test]
    fn test_close_is_idempotent() {
        let mut session = session();
        session.close();

        session.ensure_open(DEFAULT_ENGINE_NAME).unwrap();
        session.close();
        assert!(!session.is_open());
        session.close();
        assert!(!session.is_open());
    }
}
