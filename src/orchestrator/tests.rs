use super::*;
use crate::capture::{CaptureError, CaptureResult, CaptureStorage};
use crate::config::{CameraConfiguration, ChangedFields, ConfigField};
use crate::hardware::{
    BarcodeType, CameraFacing, CaptureBehavior, CaptureEvent, Dimensions, FlashMode, FrameRect,
    HardwareCall, HardwareError, MockCameraSession, Orientation, TorchMode, ZoomMode,
};
use crate::permission::{DeferredPermission, PermissionProvider, StaticPermission};
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct Harness {
    session: Arc<MockCameraSession>,
    events: Arc<RecordingEventSink>,
    presentation: Arc<RecordingPresentation>,
    clock: ManualClock,
    dir: tempfile::TempDir,
    orchestrator: CameraOrchestrator,
}

impl Harness {
    fn new(permission: Arc<dyn PermissionProvider>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        Self::with_storage(permission, CaptureStorage::new(dir.path().join("captures")), dir)
    }

    fn with_storage(
        permission: Arc<dyn PermissionProvider>,
        storage: CaptureStorage,
        dir: tempfile::TempDir,
    ) -> Self {
        let session = Arc::new(MockCameraSession::new());
        let events = Arc::new(RecordingEventSink::new());
        let presentation = Arc::new(RecordingPresentation::default());
        let clock = ManualClock::new();
        let orchestrator = CameraOrchestrator::builder(session.clone(), permission, events.clone())
            .presentation(presentation.clone())
            .clock(Arc::new(clock.clone()))
            .storage(storage)
            .build()
            .unwrap();
        Self {
            session,
            events,
            presentation,
            clock,
            dir,
            orchestrator,
        }
    }

    /// Granted permission plus a full first delivery; call log cleared.
    fn ready(config: CameraConfiguration) -> Self {
        let harness = Self::new(Arc::new(StaticPermission::granted()));
        harness.orchestrator.apply_update(&ChangedFields::all(), config);
        assert!(harness.orchestrator.is_session_initialized());
        harness.session.clear_calls();
        harness
    }

    fn capture(&self) -> Arc<Mutex<Vec<Result<CaptureResult, CaptureError>>>> {
        let outcomes = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&outcomes);
        self.orchestrator
            .capture_with(move |outcome| sink.lock().unwrap().push(outcome));
        outcomes
    }
}

fn scanning_config() -> CameraConfiguration {
    CameraConfiguration {
        scan_barcode: true,
        on_read_code: true,
        ..Default::default()
    }
}

#[test]
fn test_permission_then_configuration_initializes_once() {
    let harness = Harness::new(Arc::new(StaticPermission::granted()));
    assert_eq!(harness.session.setup_count(), 0);
    assert_eq!(harness.orchestrator.session_state(), SessionState::Uninitialized);

    harness
        .orchestrator
        .apply_update(&ChangedFields::all(), CameraConfiguration::default());
    assert_eq!(harness.session.setup_count(), 1);
    assert_eq!(harness.orchestrator.session_state(), SessionState::Initialized);
}

#[test]
fn test_configuration_then_permission_initializes_once() {
    let permission = Arc::new(DeferredPermission::new());
    let harness = Harness::new(permission.clone());

    harness
        .orchestrator
        .apply_update(&ChangedFields::new(), CameraConfiguration::default());
    assert_eq!(harness.session.setup_count(), 0);

    assert!(permission.respond(true));
    assert_eq!(harness.session.setup_count(), 1);
    assert_eq!(permission.prompt_count(), 1);
}

#[test]
fn test_denied_permission_leaves_component_inert() {
    let harness = Harness::new(Arc::new(StaticPermission::denied()));
    harness
        .orchestrator
        .apply_update(&ChangedFields::all(), CameraConfiguration::default());
    assert_eq!(harness.session.setup_count(), 0);

    let outcomes = harness.capture();
    let outcomes = outcomes.lock().unwrap();
    assert!(matches!(
        outcomes.as_slice(),
        [Err(CaptureError::HardwareUnavailable(_))]
    ));
}

#[test]
fn test_prompt_declined_never_initializes() {
    let permission = Arc::new(DeferredPermission::new());
    let harness = Harness::new(permission.clone());
    harness
        .orchestrator
        .apply_update(&ChangedFields::all(), CameraConfiguration::default());
    permission.respond(false);
    assert_eq!(harness.session.setup_count(), 0);
    assert!(!harness.orchestrator.is_session_initialized());
}

#[test]
fn test_repeated_deliveries_do_not_rebuild_session() {
    let harness = Harness::new(Arc::new(StaticPermission::granted()));
    for _ in 0..5 {
        harness
            .orchestrator
            .apply_update(&ChangedFields::all(), CameraConfiguration::default());
    }
    assert_eq!(harness.session.setup_count(), 1);
    assert_eq!(harness.orchestrator.applied_diffs().len(), 5);
}

#[test]
fn test_concurrent_preconditions_initialize_once() {
    for _ in 0..25 {
        let permission = Arc::new(DeferredPermission::new());
        let harness = Harness::new(permission.clone());

        let granter = {
            let permission = Arc::clone(&permission);
            std::thread::spawn(move || permission.respond(true))
        };
        harness
            .orchestrator
            .apply_update(&ChangedFields::new(), CameraConfiguration::default());
        assert!(granter.join().unwrap());

        assert_eq!(harness.session.setup_count(), 1);
    }
}

#[test]
fn test_setup_uses_facing_and_barcode_types() {
    let harness = Harness::new(Arc::new(StaticPermission::granted()));
    let config = CameraConfiguration {
        camera_type: CameraFacing::Front,
        ..scanning_config()
    };
    harness.orchestrator.apply_update(&ChangedFields::all(), config);

    assert_eq!(
        harness.session.calls()[0],
        HardwareCall::Setup {
            facing: CameraFacing::Front,
            barcode_types: BarcodeType::SUPPORTED.to_vec(),
        }
    );
}

#[test]
fn test_setup_without_read_listener_skips_barcode_types() {
    let harness = Harness::new(Arc::new(StaticPermission::granted()));
    let config = CameraConfiguration {
        scan_barcode: true,
        on_read_code: false,
        ..Default::default()
    };
    harness.orchestrator.apply_update(&ChangedFields::all(), config);
    assert_eq!(
        harness.session.calls()[0],
        HardwareCall::Setup {
            facing: CameraFacing::Back,
            barcode_types: vec![],
        }
    );
}

#[test]
fn test_setup_failure_is_not_retried() {
    let harness = Harness::new(Arc::new(StaticPermission::granted()));
    harness.session.fail_setup("camera in use");
    harness
        .orchestrator
        .apply_update(&ChangedFields::all(), CameraConfiguration::default());
    harness
        .orchestrator
        .apply_update(&ChangedFields::all(), CameraConfiguration::default());

    assert_eq!(harness.session.setup_count(), 1);
    assert_eq!(harness.orchestrator.session_state(), SessionState::Failed);
}

#[test]
fn test_zoom_only_diff_touches_only_zoom() {
    let harness = Harness::ready(CameraConfiguration::default());
    let config = CameraConfiguration {
        zoom: Some(2.5),
        flash_mode: FlashMode::On,
        ..Default::default()
    };
    harness
        .orchestrator
        .apply_update(&ChangedFields::from([ConfigField::Zoom]), config);

    assert_eq!(harness.session.calls(), vec![HardwareCall::Zoom(Some(2.5))]);
}

#[test]
fn test_facing_change_reapplies_torch() {
    let harness = Harness::ready(CameraConfiguration::default());
    let config = CameraConfiguration {
        camera_type: CameraFacing::Front,
        torch_mode: TorchMode::On,
        ..Default::default()
    };
    harness
        .orchestrator
        .apply_update(&ChangedFields::from([ConfigField::CameraType]), config);

    assert_eq!(
        harness.session.calls(),
        vec![
            HardwareCall::Facing(CameraFacing::Front),
            HardwareCall::Torch(TorchMode::On),
        ]
    );
}

#[test]
fn test_first_delivery_reconfigures_everything_in_order() {
    let harness = Harness::new(Arc::new(StaticPermission::granted()));
    let config = CameraConfiguration {
        show_frame: true,
        max_zoom: Some(8.0),
        ..scanning_config()
    };
    harness.orchestrator.apply_update(&ChangedFields::all(), config);

    let calls = harness.session.calls();
    let index = |wanted: fn(&HardwareCall) -> bool| calls.iter().position(|c| wanted(c)).unwrap();
    let setup = index(|c| matches!(c, HardwareCall::Setup { .. }));
    let facing = index(|c| matches!(c, HardwareCall::Facing(_)));
    let torch = index(|c| matches!(c, HardwareCall::Torch(_)));
    let scanning = index(|c| matches!(c, HardwareCall::BarcodeScanning { enabled: true, .. }));
    let frame = index(|c| matches!(c, HardwareCall::ScannerFrame(Some(_))));
    let max_zoom = index(|c| matches!(c, HardwareCall::MaxZoom(Some(_))));

    assert_eq!(setup, 0);
    assert!(facing < torch);
    assert!(scanning < frame);
    assert_eq!(max_zoom, calls.len() - 1);
}

#[test]
fn test_scanner_frame_follows_show_frame() {
    let harness = Harness::ready(scanning_config());
    let config = CameraConfiguration {
        show_frame: true,
        ..scanning_config()
    };
    harness
        .orchestrator
        .apply_update(&ChangedFields::from([ConfigField::ShowFrame]), config.clone());

    let rect = FrameRect::new(40.0, 200.0, 300.0, 200.0);
    assert_eq!(harness.session.calls(), vec![HardwareCall::ScannerFrame(Some(rect))]);
    assert!(harness
        .presentation
        .calls()
        .contains(&PresentationCall::ScannerFrameVisible(true)));

    harness.session.clear_calls();
    harness.orchestrator.relayout();
    assert_eq!(harness.session.calls(), vec![HardwareCall::ScannerFrame(Some(rect))]);

    harness.session.clear_calls();
    let hidden = CameraConfiguration {
        show_frame: false,
        ..config
    };
    harness
        .orchestrator
        .apply_update(&ChangedFields::from([ConfigField::ShowFrame]), hidden);
    assert_eq!(harness.session.calls(), vec![HardwareCall::ScannerFrame(None)]);
}

#[test]
fn test_overlay_and_focus_fields_reach_presentation() {
    let harness = Harness::ready(CameraConfiguration::default());
    let config = CameraConfiguration {
        ratio_overlay: Some("16:9".into()),
        reset_focus_timeout: 1500,
        ..Default::default()
    };
    harness.orchestrator.apply_update(
        &ChangedFields::from([ConfigField::RatioOverlay, ConfigField::ResetFocusTimeout]),
        config,
    );

    let calls = harness.presentation.calls();
    assert!(calls.contains(&PresentationCall::RatioOverlay(Some("16:9".into()))));
    assert!(calls.contains(&PresentationCall::FocusResetTimeout(Some(Duration::from_millis(
        1500
    )))));
    assert!(harness.session.calls().is_empty());
}

#[test]
fn test_successful_capture_persists_image() {
    let harness = Harness::ready(CameraConfiguration::default());
    let image = vec![0xAB; 1234];
    harness.session.set_capture_behavior(CaptureBehavior::Succeed {
        image: image.clone(),
        thumbnail: Some(vec![1, 2, 3]),
        dimensions: Dimensions {
            width: 640,
            height: 480,
        },
    });

    let outcomes = harness.capture();
    let outcomes = outcomes.lock().unwrap();
    let result = match outcomes.as_slice() {
        [Ok(result)] => result.clone(),
        other => panic!("unexpected outcomes: {other:?}"),
    };

    assert_eq!(result.size, 1234);
    assert!(result.name.ends_with(".jpg"));
    assert!(result.uri.starts_with("file://"));
    assert!(result.uri.ends_with(&result.name));
    assert_eq!(result.thumb, "");

    let path = harness.orchestrator.storage().directory().join(&result.name);
    assert_eq!(std::fs::read(path).unwrap(), image);

    let calls = harness.presentation.calls();
    let shutter = calls
        .iter()
        .position(|c| *c == PresentationCall::Shutter(Duration::from_millis(350)))
        .unwrap();
    let reset = calls
        .iter()
        .position(|c| *c == PresentationCall::ResetFocus)
        .unwrap();
    assert!(shutter < reset);
    assert_eq!(harness.orchestrator.captures_in_flight(), 0);
}

#[test]
fn test_hardware_capture_error_reaches_callback() {
    let harness = Harness::ready(CameraConfiguration::default());
    harness
        .session
        .set_capture_behavior(CaptureBehavior::Fail("Could not capture still image".into()));

    let outcomes = harness.capture();
    let outcomes = outcomes.lock().unwrap();
    match outcomes.as_slice() {
        [Err(CaptureError::CaptureFailed(message))] => {
            assert_eq!(message, "Could not capture still image")
        }
        other => panic!("unexpected outcomes: {other:?}"),
    }
    assert!(!harness.orchestrator.storage().directory().exists());
}

#[test]
fn test_rejected_capture_reaches_callback() {
    let harness = Harness::ready(CameraConfiguration::default());
    harness
        .session
        .set_capture_behavior(CaptureBehavior::Reject("no photo output".into()));

    let outcomes = harness.capture();
    assert!(matches!(
        outcomes.lock().unwrap().as_slice(),
        [Err(CaptureError::CaptureFailed(_))]
    ));
}

#[test]
fn test_file_write_failure_reported_not_panicked() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"file in the way").unwrap();
    let harness = Harness::with_storage(
        Arc::new(StaticPermission::granted()),
        CaptureStorage::new(blocker.join("captures")),
        dir,
    );
    harness
        .orchestrator
        .apply_update(&ChangedFields::all(), CameraConfiguration::default());

    let outcomes = harness.capture();
    let outcomes = outcomes.lock().unwrap();
    match outcomes.as_slice() {
        [Err(err @ CaptureError::FileWriteFailed(_))] => {
            assert!(err
                .message()
                .starts_with("Error occurred while writing image data to a temporary file"));
        }
        other => panic!("unexpected outcomes: {other:?}"),
    }
    assert!(!blocker.join("captures").exists());
    assert_eq!(harness.orchestrator.snapshot().captures_failed, 1);
}

#[test]
fn test_held_capture_orders_will_capture_before_result() {
    let harness = Harness::ready(CameraConfiguration::default());
    harness.session.set_capture_behavior(CaptureBehavior::Hold);

    let outcomes = harness.capture();
    let ids = harness.session.held_requests();
    assert_eq!(ids.len(), 1);
    assert_eq!(harness.orchestrator.captures_in_flight(), 1);
    assert!(outcomes.lock().unwrap().is_empty());

    harness.session.emit_capture(ids[0], CaptureEvent::WillCapture);
    assert!(harness
        .presentation
        .calls()
        .contains(&PresentationCall::Shutter(Duration::from_millis(350))));
    assert!(outcomes.lock().unwrap().is_empty());

    harness.session.emit_capture(
        ids[0],
        CaptureEvent::Succeeded {
            image: vec![7; 16],
            thumbnail: None,
            dimensions: Dimensions::default(),
        },
    );
    assert_eq!(outcomes.lock().unwrap().len(), 1);
    assert!(outcomes.lock().unwrap()[0].is_ok());
}

#[test]
fn test_capture_completing_after_teardown_is_a_no_op() {
    let harness = Harness::ready(CameraConfiguration::default());
    harness.session.set_capture_behavior(CaptureBehavior::Hold);
    let outcomes = harness.capture();
    let id = harness.session.held_requests()[0];

    let Harness {
        session,
        orchestrator,
        dir,
        ..
    } = harness;
    let captures = orchestrator.storage().directory().to_path_buf();
    drop(orchestrator);

    assert!(session.emit_capture(id, CaptureEvent::WillCapture));
    assert!(session.emit_capture(
        id,
        CaptureEvent::Succeeded {
            image: vec![1; 4],
            thumbnail: None,
            dimensions: Dimensions::default(),
        }
    ));
    assert!(outcomes.lock().unwrap().is_empty());
    assert!(!captures.exists());
    drop(dir);
}

#[test]
fn test_barcode_reads_are_throttled() {
    let harness = Harness::ready(scanning_config());

    for step in [0u64, 500, 1600, 100] {
        harness.clock.advance(Duration::from_millis(step));
        assert!(harness.session.emit_barcode(&format!("code-{step}")));
    }

    // Reads at t=0, 500, 2100, 2200 with the default 2000ms throttle
    assert_eq!(harness.events.read_codes(), vec!["code-0", "code-1600"]);
    let snapshot = harness.orchestrator.snapshot();
    assert_eq!(snapshot.barcodes_accepted, 2);
    assert_eq!(snapshot.barcodes_throttled, 2);
}

#[test]
fn test_throttle_interval_read_from_current_configuration() {
    let harness = Harness::ready(scanning_config());
    harness.orchestrator.on_barcode_read("first");

    let faster = CameraConfiguration {
        scan_throttle_delay: 100,
        ..scanning_config()
    };
    harness
        .orchestrator
        .apply_update(&ChangedFields::from([ConfigField::ScanThrottleDelay]), faster);
    assert!(harness.session.calls().is_empty());

    harness.clock.advance(Duration::from_millis(150));
    harness.orchestrator.on_barcode_read("second");
    assert_eq!(harness.events.read_codes(), vec!["first", "second"]);
}

#[test]
fn test_reads_without_listener_are_dropped() {
    let config = CameraConfiguration {
        scan_barcode: true,
        on_read_code: false,
        ..Default::default()
    };
    let harness = Harness::ready(config);
    harness.orchestrator.on_barcode_read("ignored");
    assert!(harness.events.read_codes().is_empty());
}

#[test]
fn test_disabling_scanning_stops_reads() {
    let harness = Harness::ready(scanning_config());
    let disabled = CameraConfiguration {
        scan_barcode: false,
        ..scanning_config()
    };
    harness
        .orchestrator
        .apply_update(&ChangedFields::from([ConfigField::ScanBarcode]), disabled);

    assert_eq!(
        harness.session.calls()[0],
        HardwareCall::BarcodeScanning {
            enabled: false,
            listener: true
        }
    );
    assert!(!harness.session.emit_barcode("late"));
}

#[test]
fn test_pinch_gesture_follows_zoom_mode() {
    let harness = Harness::ready(CameraConfiguration::default());

    harness.orchestrator.pinch(PinchPhase::Began);
    harness.orchestrator.pinch(PinchPhase::Changed(1.5));
    harness.orchestrator.pinch(PinchPhase::Changed(1.8));

    let off = CameraConfiguration {
        zoom_mode: ZoomMode::Off,
        ..Default::default()
    };
    harness
        .orchestrator
        .apply_update(&ChangedFields::from([ConfigField::ZoomMode]), off);
    harness.orchestrator.pinch(PinchPhase::Changed(2.0));

    assert_eq!(
        harness.session.calls(),
        vec![
            HardwareCall::PinchStart,
            HardwareCall::PinchChange(1.5),
            HardwareCall::PinchChange(1.8),
        ]
    );
    assert!(harness
        .presentation
        .calls()
        .contains(&PresentationCall::ZoomGestureAttached(false)));
}

#[test]
fn test_orientation_and_zoom_events_forwarded_when_registered() {
    let config = CameraConfiguration {
        on_orientation_change: true,
        on_zoom: true,
        ..Default::default()
    };
    let harness = Harness::ready(config);

    assert!(harness.session.emit_orientation(Orientation::LandscapeLeft));
    assert!(harness.session.emit_zoom(3.0));
    assert_eq!(
        harness.events.events(),
        vec![
            HostEvent::OrientationChange(Orientation::LandscapeLeft),
            HostEvent::Zoom(3.0),
        ]
    );

    let unregistered = CameraConfiguration::default();
    harness
        .orchestrator
        .apply_update(&ChangedFields::from([ConfigField::OnZoom]), unregistered);
    assert!(!harness.session.emit_zoom(1.0));
}

#[test]
fn test_teardown_happens_once() {
    let harness = Harness::ready(CameraConfiguration::default());
    harness.orchestrator.teardown();
    harness.orchestrator.teardown();
    let session = Arc::clone(&harness.session);
    drop(harness);

    let teardowns = session
        .calls()
        .iter()
        .filter(|c| **c == HardwareCall::Teardown)
        .count();
    assert_eq!(teardowns, 1);
}

#[test]
fn test_drop_tears_down_initialized_session() {
    let harness = Harness::ready(CameraConfiguration::default());
    let session = Arc::clone(&harness.session);
    drop(harness);
    assert_eq!(session.calls(), vec![HardwareCall::Teardown]);
}

#[test]
fn test_snapshot_counts_activity() {
    let harness = Harness::ready(CameraConfiguration::default());
    harness.capture();
    harness
        .orchestrator
        .apply_update(&ChangedFields::from([ConfigField::FlashMode]), CameraConfiguration::default());

    let snapshot = harness.orchestrator.snapshot();
    assert!(snapshot.session_initialized);
    assert_eq!(snapshot.configuration_updates, 2);
    assert_eq!(snapshot.captures_started, 1);
    assert_eq!(snapshot.captures_succeeded, 1);
    assert_eq!(snapshot.captured_bytes, 8);
    assert_eq!(snapshot.captures_in_flight, 0);
}

#[test]
fn test_deliveries_after_teardown_leave_hardware_alone() {
    let harness = Harness::ready(CameraConfiguration::default());
    harness.orchestrator.teardown();
    harness.session.clear_calls();

    let config = CameraConfiguration {
        flash_mode: FlashMode::On,
        ..Default::default()
    };
    harness
        .orchestrator
        .apply_update(&ChangedFields::from([ConfigField::FlashMode]), config);

    assert!(harness.session.calls().is_empty());
    assert_eq!(harness.orchestrator.configuration().flash_mode, FlashMode::On);
}

#[test]
fn test_capture_after_teardown_reports_unavailable() {
    let harness = Harness::ready(CameraConfiguration::default());
    harness.orchestrator.teardown();
    harness.session.clear_calls();

    let outcomes = harness.capture();
    assert!(matches!(
        outcomes.lock().unwrap().as_slice(),
        [Err(CaptureError::HardwareUnavailable(HardwareError::Unavailable))]
    ));
    assert!(harness.session.calls().is_empty());
    assert_eq!(harness.orchestrator.snapshot().captures_started, 0);
}

#[test]
fn test_reads_and_gestures_after_teardown_ignored() {
    let harness = Harness::ready(scanning_config());
    harness.orchestrator.teardown();
    harness.session.clear_calls();

    harness.orchestrator.on_barcode_read("after");
    harness.orchestrator.pinch(PinchPhase::Began);
    harness.orchestrator.pinch(PinchPhase::Changed(2.0));

    assert!(harness.events.read_codes().is_empty());
    assert!(harness.session.calls().is_empty());
    assert_eq!(harness.orchestrator.snapshot().barcodes_accepted, 0);
}

#[test]
fn test_permission_after_teardown_never_builds_session() {
    let permission = Arc::new(DeferredPermission::new());
    let harness = Harness::new(permission.clone());
    harness
        .orchestrator
        .apply_update(&ChangedFields::all(), CameraConfiguration::default());
    harness.orchestrator.teardown();

    permission.respond(true);
    assert_eq!(harness.session.setup_count(), 0);
}

#[test]
fn test_teardown_during_setup_releases_session() {
    let session = Arc::new(MockCameraSession::new());
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = Arc::new(
        CameraOrchestrator::builder(
            session.clone(),
            Arc::new(StaticPermission::granted()),
            Arc::new(RecordingEventSink::new()),
        )
        .storage(CaptureStorage::new(dir.path().join("captures")))
        .build()
        .unwrap(),
    );

    let weak = Arc::downgrade(&orchestrator);
    session.on_next_setup(move || {
        if let Some(orchestrator) = weak.upgrade() {
            orchestrator.teardown();
        }
    });
    orchestrator.apply_update(&ChangedFields::all(), CameraConfiguration::default());
    drop(orchestrator);

    assert_eq!(
        session.calls(),
        vec![
            HardwareCall::Setup {
                facing: CameraFacing::Back,
                barcode_types: vec![],
            },
            HardwareCall::Teardown,
        ]
    );
}
