// SPDX-License-Identifier: GPL-3.0-only

//! Device-mode state machine
//!
//! Three modes drive the appliance: Preview shows the live sensor feed,
//! Capture takes one still and hands it to the persist pipeline, Gallery
//! browses stored images through the thumbnail cache. One tick handles one
//! iteration of the control loop; at most one mode transition is applied
//! per tick, and a shutter edge beats a simultaneous gallery edge.

use crate::battery::BatteryMonitor;
use crate::config::Config;
use crate::constants::{EVICT_KEEP_DISTANCE, PRELOAD_RADIUS, TICK_INTERVAL};
use crate::devices::{Button, CaptureDevice, DisplaySink, InputSource, Overlay, PowerGauge};
use crate::input::ButtonPad;
use crate::pipeline::CapturePipeline;
use crate::thumbnails::SharedCache;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, warn};

/// Whether the control loop keeps running after a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopAction {
    Continue,
    Stop,
}

/// Current mode, carrying exactly the data valid in it
///
/// Gallery owns its position in the image index; it is None until the
/// gallery is first entered with a non-empty index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Preview,
    Capture,
    Gallery { current: Option<usize> },
}

pub struct StateMachine {
    camera: Box<dyn CaptureDevice>,
    display: Box<dyn DisplaySink>,
    pad: ButtonPad,
    battery: BatteryMonitor,
    cache: SharedCache,
    pipeline: CapturePipeline,
    mode: Mode,
}

impl StateMachine {
    pub fn new(
        camera: Box<dyn CaptureDevice>,
        display: Box<dyn DisplaySink>,
        input: Box<dyn InputSource>,
        gauge: Option<Box<dyn PowerGauge>>,
        cache: SharedCache,
        pipeline: CapturePipeline,
        config: &Config,
    ) -> Self {
        Self {
            camera,
            display,
            pad: ButtonPad::new(input, config.debounce_interval()),
            battery: BatteryMonitor::new(gauge, config),
            cache,
            pipeline,
            mode: Mode::Preview,
        }
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// One iteration of the control loop
    ///
    /// Buttons are sampled once per tick; every per-tick failure is logged
    /// and degrades (skipped render, absent overlay value), never escapes.
    pub fn tick(&mut self, now: Instant) -> LoopAction {
        self.pad.refresh(now);
        self.mode = match self.mode {
            Mode::Preview => self.tick_preview(now),
            Mode::Capture => self.tick_capture(),
            Mode::Gallery { current } => self.tick_gallery(current, now),
        };
        if self.pad.poll_edge(Button::Power) {
            info!("Power button pressed");
            return LoopAction::Stop;
        }
        LoopAction::Continue
    }

    /// Run ticks until stopped by the power button or the interrupt flag
    pub fn run(&mut self, interrupted: &AtomicBool) {
        info!("Entering control loop");
        loop {
            if interrupted.load(Ordering::SeqCst) {
                info!("Interrupt received");
                break;
            }
            let started = Instant::now();
            if self.tick(started) == LoopAction::Stop {
                break;
            }
            if let Some(remaining) = TICK_INTERVAL.checked_sub(started.elapsed()) {
                std::thread::sleep(remaining);
            }
        }
    }

    /// Orderly teardown: sensor, display, then drain the persist queue
    pub fn shutdown(self) {
        let StateMachine {
            mut camera,
            mut display,
            pipeline,
            ..
        } = self;
        camera.shutdown();
        if let Err(e) = display.shutdown() {
            warn!(error = %e, "Failed to restore display");
        }
        pipeline.shutdown();
    }

    fn tick_preview(&mut self, now: Instant) -> Mode {
        let frame = match self.camera.capture_preview_frame() {
            Ok(frame) => frame,
            Err(e) => {
                // Skip the whole tick; the screen keeps its last content
                warn!(error = %e, "Failed to read preview frame");
                return Mode::Preview;
            }
        };

        let local = chrono::Local::now();
        let overlay = Overlay {
            mode_label: "Preview".to_string(),
            date: Some(local.format("%Y/%m/%d").to_string()),
            time: Some(local.format("%H:%M:%S").to_string()),
            battery_percent: self.battery.percentage(now),
            index_info: None,
        };
        if let Err(e) = self.display.render(Some(&frame), &overlay) {
            warn!(error = %e, "Render failed");
        }

        // Sample both transition edges, then honor only the winner
        let shutter = self.pad.poll_edge(Button::Shutter);
        let gallery = self.pad.poll_edge(Button::Gallery);
        if shutter {
            debug!("Shutter pressed");
            Mode::Capture
        } else if gallery {
            let current = self.cache.lock().len().checked_sub(1);
            debug!(current, "Entering gallery");
            Mode::Gallery { current }
        } else {
            Mode::Preview
        }
    }

    fn tick_capture(&mut self) -> Mode {
        info!("Taking photo");
        // Blank the screen while the sensor is in still mode
        let overlay = Overlay {
            mode_label: "Capture".to_string(),
            ..Overlay::default()
        };
        if let Err(e) = self.display.render(None, &overlay) {
            warn!(error = %e, "Render failed");
        }

        match self.camera.capture_high_res() {
            Ok(frame) => {
                // Fire and forget; the worker logs the outcome
                let _ = self.pipeline.submit(frame);
                debug!("Capture handed to persist pipeline");
            }
            Err(e) => {
                warn!(error = %e, "Capture failed");
            }
        }
        // Back to Preview whether or not the capture succeeded
        Mode::Preview
    }

    fn tick_gallery(&mut self, current: Option<usize>, now: Instant) -> Mode {
        let mut cache = self.cache.lock();
        let total = cache.len();

        if total == 0 {
            drop(cache);
            let overlay = Overlay {
                mode_label: "Gallery".to_string(),
                battery_percent: self.battery.percentage(now),
                index_info: Some("No images".to_string()),
                ..Overlay::default()
            };
            if let Err(e) = self.display.render(None, &overlay) {
                warn!(error = %e, "Render failed");
            }
            if self.pad.poll_edge(Button::Back) {
                return Mode::Preview;
            }
            return Mode::Gallery { current: None };
        }

        // Set on first entry; clamp in case a rescan shrank the index
        let current = current.unwrap_or(total - 1).min(total - 1);

        cache.preload_around(current, PRELOAD_RADIUS);
        cache.evict_far(current, EVICT_KEEP_DISTANCE);

        let frame = cache.get_or_generate(current);
        let (date, time) = match cache.record(current) {
            Some(record) => (record.date_text(), record.time_text()),
            None => (None, None),
        };
        drop(cache);

        if let Some(frame) = &frame {
            let overlay = Overlay {
                mode_label: "Gallery".to_string(),
                date,
                time,
                battery_percent: self.battery.percentage(now),
                index_info: Some(format!("{}/{}", current + 1, total)),
            };
            if let Err(e) = self.display.render(Some(frame), &overlay) {
                warn!(error = %e, "Render failed");
            }
        }
        // A failed lookup skips only the render; navigation stays live

        if self.pad.poll_edge(Button::Back) {
            debug!("Leaving gallery");
            return Mode::Preview;
        }
        let current = if self.pad.poll_edge(Button::Left) {
            current.saturating_sub(1)
        } else if self.pad.poll_edge(Button::Right) {
            (current + 1).min(total - 1)
        } else {
            current
        };
        Mode::Gallery {
            current: Some(current),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::devices::ButtonLevels;
    use crate::errors::CaptureError;
    use crate::frame::{Frame, PixelFormat};
    use crate::thumbnails::ThumbnailCache;
    use image::RgbImage;
    use std::collections::VecDeque;
    use std::path::Path;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    struct FakeCamera {
        fail_high_res: bool,
    }

    impl FakeCamera {
        fn new() -> Self {
            Self {
                fail_high_res: false,
            }
        }

        fn frame(width: u32, height: u32) -> Frame {
            let data = vec![200u8; width as usize * height as usize * 3];
            Frame::new(width, height, PixelFormat::Rgb8, data).unwrap()
        }
    }

    impl CaptureDevice for FakeCamera {
        fn capture_preview_frame(&mut self) -> Result<Frame, CaptureError> {
            Ok(Self::frame(32, 24))
        }

        fn capture_high_res(&mut self) -> Result<Frame, CaptureError> {
            if self.fail_high_res {
                Err(CaptureError::CaptureFailed("sensor timeout".into()))
            } else {
                Ok(Self::frame(64, 48))
            }
        }
    }

    #[derive(Debug, Clone)]
    struct RenderCall {
        had_frame: bool,
        overlay: Overlay,
    }

    #[derive(Clone, Default)]
    struct FakeDisplay {
        calls: Arc<Mutex<Vec<RenderCall>>>,
    }

    impl FakeDisplay {
        fn last(&self) -> Option<RenderCall> {
            self.calls.lock().unwrap().last().cloned()
        }
    }

    impl DisplaySink for FakeDisplay {
        fn render(&mut self, frame: Option<&Frame>, overlay: &Overlay) -> std::io::Result<()> {
            self.calls.lock().unwrap().push(RenderCall {
                had_frame: frame.is_some(),
                overlay: overlay.clone(),
            });
            Ok(())
        }
    }

    #[derive(Clone, Default)]
    struct ScriptedInput {
        presses: Arc<Mutex<VecDeque<ButtonLevels>>>,
    }

    impl ScriptedInput {
        fn push(&self, buttons: &[Button]) {
            let mut levels = ButtonLevels::default();
            for button in buttons {
                levels.set(*button, true);
            }
            self.presses.lock().unwrap().push_back(levels);
        }
    }

    impl InputSource for ScriptedInput {
        fn sample(&mut self) -> ButtonLevels {
            self.presses.lock().unwrap().pop_front().unwrap_or_default()
        }
    }

    struct Harness {
        machine: StateMachine,
        display: FakeDisplay,
        input: ScriptedInput,
        runtime: tokio::runtime::Runtime,
        now: Instant,
    }

    impl Harness {
        fn new(dir: &Path) -> Self {
            Self::with_camera(dir, FakeCamera::new())
        }

        fn with_camera(dir: &Path, camera: FakeCamera) -> Self {
            let runtime = tokio::runtime::Runtime::new().unwrap();
            let cache = SharedCache::new(ThumbnailCache::open(dir.to_path_buf()).unwrap());
            let pipeline =
                CapturePipeline::spawn(runtime.handle(), cache.clone(), dir.to_path_buf());
            let display = FakeDisplay::default();
            let input = ScriptedInput::default();
            let machine = StateMachine::new(
                Box::new(camera),
                Box::new(display.clone()),
                Box::new(input.clone()),
                None,
                cache,
                pipeline,
                &Config::default(),
            );
            Self {
                machine,
                display,
                input,
                runtime,
                now: Instant::now(),
            }
        }

        /// Advance one tick, spaced past the debounce interval
        fn tick(&mut self) -> LoopAction {
            self.now += Duration::from_millis(200);
            self.machine.tick(self.now)
        }

        fn press_and_tick(&mut self, buttons: &[Button]) -> LoopAction {
            self.input.push(buttons);
            self.tick()
        }

        fn finish(self) {
            self.machine.shutdown();
            drop(self.runtime);
        }
    }

    fn write_test_image(dir: &Path, name: &str) {
        let image = RgbImage::from_fn(64, 48, |x, y| image::Rgb([x as u8, y as u8, 7]));
        image.save(dir.join(name)).unwrap();
    }

    #[test]
    fn preview_renders_live_frame_and_stays() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = Harness::new(dir.path());
        h.tick();
        assert_eq!(h.machine.mode(), Mode::Preview);
        let call = h.display.last().unwrap();
        assert!(call.had_frame);
        assert_eq!(call.overlay.mode_label, "Preview");
        assert!(call.overlay.date.is_some());
        assert!(call.overlay.time.is_some());
        h.finish();
    }

    #[test]
    fn shutter_captures_and_returns_to_preview() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = Harness::new(dir.path());

        h.press_and_tick(&[Button::Shutter]);
        assert_eq!(h.machine.mode(), Mode::Capture);

        // The capture tick blanks the screen and goes back to Preview
        h.tick();
        assert_eq!(h.machine.mode(), Mode::Preview);
        assert!(!h.display.last().unwrap().had_frame);

        // Shutdown drains the persist queue; the photo must be on disk
        h.finish();
        let saved = crate::index::scan_records(dir.path());
        assert_eq!(saved.len(), 1);
        assert!(saved[0].taken.is_some());
    }

    #[test]
    fn shutter_beats_simultaneous_gallery_edge() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = Harness::new(dir.path());
        h.press_and_tick(&[Button::Gallery, Button::Shutter]);
        assert_eq!(h.machine.mode(), Mode::Capture);
        h.finish();
    }

    #[test]
    fn one_transition_per_tick() {
        let dir = tempfile::tempdir().unwrap();
        write_test_image(dir.path(), "20240101_120000.jpg");
        let mut h = Harness::new(dir.path());
        // Gallery wins this tick; the machine must not also capture
        h.press_and_tick(&[Button::Gallery]);
        assert_eq!(h.machine.mode(), Mode::Gallery { current: Some(0) });
        h.finish();
    }

    #[test]
    fn capture_failure_logs_and_returns_to_preview() {
        let dir = tempfile::tempdir().unwrap();
        let mut camera = FakeCamera::new();
        camera.fail_high_res = true;
        let mut h = Harness::with_camera(dir.path(), camera);

        h.press_and_tick(&[Button::Shutter]);
        h.tick();
        assert_eq!(h.machine.mode(), Mode::Preview);
        h.finish();
        assert!(crate::index::scan_records(dir.path()).is_empty());
    }

    #[test]
    fn gallery_opens_on_last_image() {
        let dir = tempfile::tempdir().unwrap();
        write_test_image(dir.path(), "20240101_120000.jpg");
        write_test_image(dir.path(), "20240101_120001.jpg");
        write_test_image(dir.path(), "20240101_120002.jpg");
        let mut h = Harness::new(dir.path());

        h.press_and_tick(&[Button::Gallery]);
        assert_eq!(h.machine.mode(), Mode::Gallery { current: Some(2) });

        h.tick();
        let call = h.display.last().unwrap();
        assert!(call.had_frame);
        assert_eq!(call.overlay.index_info.as_deref(), Some("3/3"));
        assert_eq!(call.overlay.date.as_deref(), Some("2024/01/01"));
        assert_eq!(call.overlay.time.as_deref(), Some("12:00:02"));
        h.finish();
    }

    #[test]
    fn gallery_navigation_clamps_at_both_ends() {
        let dir = tempfile::tempdir().unwrap();
        write_test_image(dir.path(), "20240101_120000.jpg");
        write_test_image(dir.path(), "20240101_120001.jpg");
        let mut h = Harness::new(dir.path());

        h.press_and_tick(&[Button::Gallery]);
        assert_eq!(h.machine.mode(), Mode::Gallery { current: Some(1) });

        h.press_and_tick(&[Button::Left]);
        assert_eq!(h.machine.mode(), Mode::Gallery { current: Some(0) });
        for _ in 0..3 {
            h.press_and_tick(&[Button::Left]);
            assert_eq!(h.machine.mode(), Mode::Gallery { current: Some(0) });
        }

        h.press_and_tick(&[Button::Right]);
        assert_eq!(h.machine.mode(), Mode::Gallery { current: Some(1) });
        for _ in 0..3 {
            h.press_and_tick(&[Button::Right]);
            assert_eq!(h.machine.mode(), Mode::Gallery { current: Some(1) });
        }
        h.finish();
    }

    #[test]
    fn empty_gallery_shows_no_images_and_keeps_index_unset() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = Harness::new(dir.path());

        h.press_and_tick(&[Button::Gallery]);
        assert_eq!(h.machine.mode(), Mode::Gallery { current: None });

        h.tick();
        assert_eq!(h.machine.mode(), Mode::Gallery { current: None });
        let call = h.display.last().unwrap();
        assert!(!call.had_frame);
        assert_eq!(call.overlay.index_info.as_deref(), Some("No images"));

        // Navigation on an empty gallery is inert
        h.press_and_tick(&[Button::Left, Button::Right]);
        assert_eq!(h.machine.mode(), Mode::Gallery { current: None });

        h.press_and_tick(&[Button::Back]);
        assert_eq!(h.machine.mode(), Mode::Preview);
        h.finish();
    }

    #[test]
    fn back_leaves_gallery() {
        let dir = tempfile::tempdir().unwrap();
        write_test_image(dir.path(), "20240101_120000.jpg");
        let mut h = Harness::new(dir.path());

        h.press_and_tick(&[Button::Gallery]);
        h.press_and_tick(&[Button::Back]);
        assert_eq!(h.machine.mode(), Mode::Preview);
        h.finish();
    }

    #[test]
    fn power_button_stops_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut h = Harness::new(dir.path());
        assert_eq!(h.tick(), LoopAction::Continue);
        assert_eq!(h.press_and_tick(&[Button::Power]), LoopAction::Stop);
        h.finish();
    }
}
