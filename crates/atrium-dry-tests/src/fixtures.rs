// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Driver construction helpers.

use crate::backend::RecordingBackend;
use crate::scheduler::ManualScheduler;
use atrium_core::{FrameDriver, FrameError, ManualClock, SceneConfig, TickOutcome};

/// Driver wired to the recording fakes.
pub type TestDriver = FrameDriver<RecordingBackend, ManualScheduler, ManualClock>;

/// Builds a driver from `config` and returns it with inspection handles for
/// its backend and scheduler. The clock starts at `t = 0`.
pub fn driver_with(
    config: &SceneConfig,
) -> Result<(TestDriver, RecordingBackend, ManualScheduler), FrameError> {
    let backend = RecordingBackend::new();
    let scheduler = ManualScheduler::new();
    let driver = FrameDriver::new(
        config,
        backend.clone(),
        scheduler.clone(),
        ManualClock::default(),
    )?;
    Ok((driver, backend, scheduler))
}

/// [`driver_with`] on the default config.
pub fn default_driver() -> Result<(TestDriver, RecordingBackend, ManualScheduler), FrameError> {
    driver_with(&SceneConfig::default())
}

/// Delivers the next queued token to `driver`. `None` when the queue is
/// empty.
pub fn pump(
    driver: &mut TestDriver,
    scheduler: &ManualScheduler,
) -> Option<Result<TickOutcome, FrameError>> {
    scheduler.next_frame().map(|token| driver.on_frame(token))
}
