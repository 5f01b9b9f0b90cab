// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>

#![allow(missing_docs)]
use atrium_core::{DriverState, FrameError, FrameToken, ResourceError, TickOutcome};
use atrium_dry_tests::{default_driver, pump, BackendCall};

#[test]
fn start_requests_one_frame_and_ticks_chain() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(sched.request_count(), 0);

    driver.start().unwrap();
    driver.start().unwrap();
    assert_eq!(driver.state(), DriverState::Running);
    assert_eq!(sched.queued().len(), 1);

    for _ in 0..3 {
        assert_eq!(pump(&mut driver, &sched).unwrap().unwrap(), TickOutcome::Rendered);
    }
    assert_eq!(driver.frames_rendered(), 3);
    assert_eq!(sched.queued().len(), 1);
    assert_eq!(backend.surface_renders().len(), 3);
}

#[test]
fn stop_is_idempotent_and_cancels_pending() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.start().unwrap();
    let pending = driver.pending_frame().unwrap();
    driver.stop();
    driver.stop();
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(sched.cancelled(), vec![pending]);
    assert!(sched.queued().is_empty());

    // A late delivery of the cancelled token renders nothing.
    assert_eq!(driver.on_frame(pending).unwrap(), TickOutcome::Ignored);
    assert_eq!(backend.render_count(), 0);

    driver.start().unwrap();
    assert_eq!(pump(&mut driver, &sched).unwrap().unwrap(), TickOutcome::Rendered);
}

#[test]
fn nothing_renders_after_dispose() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.start().unwrap();
    pump(&mut driver, &sched).unwrap().unwrap();
    let stale = driver.pending_frame().unwrap();
    let renders = backend.render_count();

    driver.dispose();
    driver.dispose();
    assert_eq!(driver.state(), DriverState::Disposed);
    assert!(backend.live_textures().is_empty());
    assert_eq!(
        backend
            .calls()
            .iter()
            .filter(|c| matches!(c, BackendCall::Release(_)))
            .count(),
        1
    );

    assert_eq!(driver.on_frame(stale).unwrap(), TickOutcome::Ignored);
    assert!(matches!(driver.start(), Err(FrameError::Disposed)));
    assert_eq!(backend.render_count(), renders);
}

#[test]
fn dispose_while_stopped_is_safe() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.dispose();
    assert_eq!(sched.request_count(), 0);
    assert_eq!(backend.render_count(), 0);
}

#[test]
fn unknown_token_is_ignored() {
    let (mut driver, backend, _sched) = default_driver().unwrap();
    driver.start().unwrap();
    let bogus = FrameToken::new(9_999);
    assert_eq!(driver.on_frame(bogus).unwrap(), TickOutcome::Ignored);
    assert_eq!(backend.render_count(), 0);
    assert_eq!(driver.state(), DriverState::Running);
}

#[test]
fn backend_failure_mid_tick_stops_and_cancels_successor() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.start().unwrap();
    pump(&mut driver, &sched).unwrap().unwrap();

    // Fail on the third cube face of the next tick.
    backend.fail_render_after(2, ResourceError::SurfaceLost);
    let err = pump(&mut driver, &sched).unwrap().unwrap_err();
    assert_eq!(err, FrameError::Resource(ResourceError::SurfaceLost));
    assert_eq!(driver.state(), DriverState::Stopped);
    assert_eq!(driver.pending_frame(), None);
    assert!(sched.queued().is_empty());
    assert_eq!(sched.cancelled().len(), 1);

    // Failed capture does not count as a generation.
    assert_eq!(driver.capture().generation(), 1);
    assert_eq!(driver.frames_rendered(), 1);

    let renders = backend.render_count();
    assert!(pump(&mut driver, &sched).is_none());
    assert_eq!(backend.render_count(), renders);
}

#[test]
fn surface_failure_is_reported_after_capture() {
    let (mut driver, backend, sched) = default_driver().unwrap();
    driver.start().unwrap();
    backend.fail_render_after(6, ResourceError::OutOfMemory);
    let err = pump(&mut driver, &sched).unwrap().unwrap_err();
    assert_eq!(err, FrameError::Resource(ResourceError::OutOfMemory));
    assert_eq!(driver.capture().generation(), 1);
    assert_eq!(driver.state(), DriverState::Stopped);
}

#[test]
fn construction_failure_surfaces_resource_error() {
    use atrium_core::{FrameDriver, ManualClock, SceneConfig};
    use atrium_dry_tests::{ManualScheduler, RecordingBackend};

    let backend = RecordingBackend::new();
    backend.fail_next_create(ResourceError::OutOfMemory);
    let result = FrameDriver::new(
        &SceneConfig::default(),
        backend.clone(),
        ManualScheduler::new(),
        ManualClock::default(),
    );
    assert!(matches!(
        result,
        Err(FrameError::Resource(ResourceError::OutOfMemory))
    ));
    assert!(backend.live_textures().is_empty());
}
