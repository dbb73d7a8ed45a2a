//! Integration tests for accelerator session handling.
//!
//! A scripted engine records every call so these tests can verify:
//! - The session opens once, on the first frame
//! - Partial setup failures release what was already acquired
//! - Teardown releases the operation before the engine, exactly once
//! - Conversion failures are reported per frame without closing the session

use dsp_colorspace::accel::{
    AccelStatus, AcceleratorEngine, AcceleratorSession, CoefficientTable, ColorConvertOp,
    EngineRegistry, SoftwareConvert, YUV2RGB_COEFF,
};
use dsp_colorspace::config::ColorspaceConfig;
use dsp_colorspace::element::{BaseTransform, DspColorspace, ElementState};
use dsp_colorspace::error::{AcceleratorInitError, Error, Result};
use dsp_colorspace::format::{PixelFormat, VideoCaps};
use dsp_colorspace::memory::InputFrame;
use dsp_colorspace::negotiation::FormatNegotiator;
use std::sync::atomic::{AtomicI32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Which step of the scripted engine should fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    None,
    Operation,
    Table,
}

/// Shared record of everything the scripted engine was asked to do.
#[derive(Default)]
struct Journal {
    opens: AtomicUsize,
    conversions: AtomicUsize,
    /// Status returned by conversions; zero means succeed.
    convert_status: AtomicI32,
    events: Mutex<Vec<&'static str>>,
}

impl Journal {
    fn push(&self, event: &'static str) {
        self.events.lock().unwrap().push(event);
    }

    fn events(&self) -> Vec<&'static str> {
        self.events.lock().unwrap().clone()
    }
}

struct ScriptedEngine {
    journal: Arc<Journal>,
    fault: Fault,
}

impl AcceleratorEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn create_operation(&mut self) -> Result<Box<dyn ColorConvertOp>> {
        if self.fault == Fault::Operation {
            return Err(Error::Config("operation refused".into()));
        }
        self.journal.push("operation.create");
        Ok(Box::new(ScriptedOp {
            journal: self.journal.clone(),
            inner: SoftwareConvert::default(),
        }))
    }

    fn allocate_table(&mut self, values: &[i16]) -> Result<CoefficientTable> {
        if self.fault == Fault::Table {
            return Err(Error::AllocationFailed("heap full".into()));
        }
        self.journal.push("table.alloc");
        CoefficientTable::new(values)
    }

    fn close(&mut self) -> Result<()> {
        self.journal.push("engine.close");
        Ok(())
    }
}

struct ScriptedOp {
    journal: Arc<Journal>,
    inner: SoftwareConvert,
}

impl ColorConvertOp for ScriptedOp {
    fn yuv420pl_to_rgb565(
        &mut self,
        coeff: &CoefficientTable,
        height: u32,
        width: u32,
        y: &[u8],
        cb: &[u8],
        cr: &[u8],
        rgb: &mut [u8],
    ) -> std::result::Result<(), AccelStatus> {
        self.journal.conversions.fetch_add(1, Ordering::SeqCst);
        let status = self.journal.convert_status.load(Ordering::SeqCst);
        if status != 0 {
            return Err(status);
        }
        self.inner
            .yuv420pl_to_rgb565(coeff, height, width, y, cb, cr, rgb)
    }

    fn close(&mut self) -> Result<()> {
        self.journal.push("operation.close");
        Ok(())
    }
}

fn scripted_registry(fault: Fault) -> (Arc<EngineRegistry>, Arc<Journal>) {
    let journal = Arc::new(Journal::default());
    let mut registry = EngineRegistry::empty();
    let shared = journal.clone();
    registry.register(
        "scripted",
        move |_: &str| -> Result<Box<dyn AcceleratorEngine>> {
            shared.opens.fetch_add(1, Ordering::SeqCst);
            shared.push("engine.open");
            Ok(Box::new(ScriptedEngine {
                journal: shared.clone(),
                fault,
            }))
        },
    );
    (Arc::new(registry), journal)
}

fn scripted_element(fault: Fault) -> (DspColorspace, Arc<Journal>) {
    let (registry, journal) = scripted_registry(fault);
    let config = ColorspaceConfig::default().with_engine_name("scripted");
    let mut element = DspColorspace::with_registry(config, registry);

    let input: VideoCaps = VideoCaps::with_format(PixelFormat::I420).with_size(16, 16);
    element
        .set_caps(&input, &FormatNegotiator::src_template())
        .unwrap();
    (element, journal)
}

fn grey_frame() -> Vec<u8> {
    vec![128u8; 16 * 16 * 3 / 2]
}

#[test]
fn test_session_opens_once() {
    let (mut element, journal) = scripted_element(Fault::None);
    assert_eq!(journal.opens.load(Ordering::SeqCst), 0);

    let input = grey_frame();
    for _ in 0..10 {
        element.process(InputFrame::from(&input)).unwrap();
    }

    assert_eq!(journal.opens.load(Ordering::SeqCst), 1);
    assert_eq!(journal.conversions.load(Ordering::SeqCst), 10);
    assert_eq!(
        journal.events(),
        vec!["engine.open", "operation.create", "table.alloc"]
    );
    assert_eq!(element.session().engine_name(), Some("scripted"));
}

#[test]
fn test_teardown_order_and_idempotence() {
    let (mut element, journal) = scripted_element(Fault::None);
    element.process(InputFrame::from(&grey_frame())).unwrap();

    element.stop();
    element.stop();
    drop(element);

    assert_eq!(
        journal.events(),
        vec![
            "engine.open",
            "operation.create",
            "table.alloc",
            "operation.close",
            "engine.close",
        ]
    );
}

#[test]
fn test_stop_without_frames_opens_nothing() {
    let (mut element, journal) = scripted_element(Fault::None);
    element.stop();
    assert_eq!(element.state(), ElementState::Closed);
    assert!(journal.events().is_empty());
}

#[test]
fn test_operation_failure_rolls_back() {
    let (mut element, journal) = scripted_element(Fault::Operation);

    let err = element.process(InputFrame::from(&grey_frame())).unwrap_err();
    assert!(matches!(
        err,
        Error::AcceleratorInit(AcceleratorInitError::OperationCreate { .. })
    ));
    assert!(!element.session().is_open());
    assert_eq!(journal.events(), vec!["engine.open", "engine.close"]);

    // The next frame retries from scratch
    let _ = element.process(InputFrame::from(&grey_frame()));
    assert_eq!(journal.opens.load(Ordering::SeqCst), 2);
}

#[test]
fn test_table_failure_rolls_back() {
    let (mut element, journal) = scripted_element(Fault::Table);

    let err = element.process(InputFrame::from(&grey_frame())).unwrap_err();
    assert!(matches!(
        err,
        Error::AcceleratorInit(AcceleratorInitError::CoefficientAlloc(_))
    ));
    assert!(!element.session().is_open());
    assert_eq!(
        journal.events(),
        vec![
            "engine.open",
            "operation.create",
            "operation.close",
            "engine.close"
        ]
    );
    assert_eq!(journal.conversions.load(Ordering::SeqCst), 0);
}

#[test]
fn test_conversion_failure_keeps_session() {
    let (mut element, journal) = scripted_element(Fault::None);
    let input = grey_frame();
    element.process(InputFrame::from(&input)).unwrap();

    journal.convert_status.store(-7, Ordering::SeqCst);
    let err = element.process(InputFrame::from(&input)).unwrap_err();
    assert!(matches!(err, Error::ConversionFailed(-7)));
    assert!(element.session().is_open());

    // The failed frame went back to the pool
    let pool = element.pool().unwrap();
    assert_eq!(pool.available(), pool.capacity());

    journal.convert_status.store(0, Ordering::SeqCst);
    element.process(InputFrame::from(&input)).unwrap();

    let stats = element.stats();
    assert_eq!(stats.frames_converted, 2);
    assert_eq!(stats.conversion_failures, 1);
    assert_eq!(journal.opens.load(Ordering::SeqCst), 1);
}

#[test]
fn test_session_without_element() {
    let (registry, journal) = scripted_registry(Fault::None);
    let mut session = AcceleratorSession::new(registry);

    assert!(matches!(
        session.convert(2, 2, &[16; 4], &[128], &[128], &mut [0; 8]),
        Err(Error::InvalidState(_))
    ));

    session.ensure_open("scripted").unwrap();
    session.ensure_open("scripted").unwrap();
    assert_eq!(journal.opens.load(Ordering::SeqCst), 1);
    assert_eq!(session.coefficients().unwrap().as_slice(), &YUV2RGB_COEFF);

    let mut rgb = [0xFFu8; 8];
    session
        .convert(2, 2, &[16; 4], &[128], &[128], &mut rgb)
        .unwrap();
    assert_eq!(rgb, [0u8; 8]);

    session.close();
    session.close();
    assert!(!session.is_open());
    assert_eq!(
        journal
            .events()
            .iter()
            .filter(|e| **e == "engine.close")
            .count(),
        1
    );
}
