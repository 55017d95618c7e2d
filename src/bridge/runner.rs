//! Per-frame control loop: reads the cursor feed, maps the point into the
//! surface viewport and advances the dwell machine, once per rendered frame.
//!
//! Every frame does a bounded amount of synchronous work and yields back to
//! the scheduler; all dwell-state mutation happens inside one `tick`, so no
//! two frames ever overlap. Failures never abort the loop — they surface as
//! status and the next frame retries naturally.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::algorithm::dwell::{DwellController, FrameOutcome};
use crate::algorithm::mapper;
use crate::models::config::BridgeConfig;
use crate::models::geometry::ViewportSize;
use crate::models::status::{BridgeStatus, FeedStatus, StatusCell};
use crate::surface::InteractionSurface;
use crate::tracker::feed::{CursorFeed, FeedClock};

const WATCHDOG_INTERVAL: Duration = Duration::from_millis(250);

pub struct Bridge<S: InteractionSurface> {
    surface: S,
    controller: DwellController<S>,
    feed: CursorFeed,
    clock: FeedClock,
    config: BridgeConfig,
    status: StatusCell,
    stop_flag: Arc<AtomicBool>,
}

impl<S: InteractionSurface> Bridge<S> {
    pub fn new(surface: S, feed: CursorFeed, clock: FeedClock, config: BridgeConfig) -> Self {
        Self {
            controller: DwellController::new(config.dwell),
            surface,
            feed,
            clock,
            status: StatusCell::new(),
            stop_flag: Arc::new(AtomicBool::new(false)),
            config,
        }
    }

    #[must_use]
    pub fn status(&self) -> StatusCell {
        self.status.clone()
    }

    /// Shared stop signal consumed by the frame loop.
    #[must_use]
    pub fn stop_flag(&self) -> Arc<AtomicBool> {
        self.stop_flag.clone()
    }

    /// One synchronous frame.
    pub fn tick(&mut self) -> FrameOutcome {
        self.tick_at(self.clock.now_ms())
    }

    fn tick_at(&mut self, now_ms: u64) -> FrameOutcome {
        if !self.surface.is_ready() {
            self.status.set_bridge(BridgeStatus::WaitingForSurface);
            self.controller.disengage(&mut self.surface);
            return FrameOutcome::SurfaceUnavailable;
        }

        let Some(sample) = self.feed.latest() else {
            self.status.set_feed(FeedStatus::NotReady);
            self.status.set_mapped_point(None);
            self.controller.disengage(&mut self.surface);
            return FrameOutcome::Idle;
        };

        let age = now_ms.saturating_sub(sample.ts);
        if age > self.config.dwell.signal_stale_ms {
            self.status.set_feed(FeedStatus::Stale { age_ms: age });
            self.controller.disengage(&mut self.surface);
            return FrameOutcome::Idle;
        }

        // A feed that never reported its viewport maps unscaled, per the
        // mapper's degenerate-dimension fallback.
        let source = self
            .feed
            .viewport()
            .unwrap_or_else(|| ViewportSize::new(0.0, 0.0));
        let mapped = mapper::map_point_with_offset(
            sample.point(),
            source,
            self.surface.viewport(),
            self.config.dwell.x_offset,
            self.config.dwell.y_offset,
        );

        self.status.set_feed(FeedStatus::Live);
        self.status.set_mapped_point(Some(mapped));

        let outcome = self.controller.on_frame(&mut self.surface, mapped, now_ms);
        self.status.set_bridge(match outcome {
            FrameOutcome::SurfaceUnavailable => BridgeStatus::SurfaceError,
            _ => BridgeStatus::Ready,
        });
        outcome
    }

    /// Cooperative frame loop; returns once the stop flag is raised.
    pub async fn run(&mut self) {
        let frame_hz = self.config.frame_rate_hz.clamp(10.0, 240.0);
        let mut interval = tokio::time::interval(Duration::from_secs_f64(1.0 / frame_hz));
        interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        log::info!("bridge: frame loop started at {frame_hz} Hz");
        while !self.stop_flag.load(Ordering::Relaxed) {
            interval.tick().await;
            self.tick();
        }

        self.controller.disengage(&mut self.surface);
        log::info!("bridge: frame loop stopped");
    }
}

/// Spawns the low-frequency staleness monitor. Diagnostic only: it rewrites
/// the feed status when the signal goes quiet and never touches the dwell
/// machine.
pub fn spawn_watchdog(
    feed: CursorFeed,
    clock: FeedClock,
    status: StatusCell,
    stale_after_ms: u64,
    stop_flag: Arc<AtomicBool>,
) {
    std::thread::Builder::new()
        .name("hnav-feed-watchdog".to_string())
        .spawn(move || {
            while !stop_flag.load(Ordering::Relaxed) {
                if let Some(age) = feed.age_ms(clock.now_ms()) {
                    if age > stale_after_ms {
                        status.set_feed(FeedStatus::Stale { age_ms: age });
                    }
                }
                std::thread::sleep(WATCHDOG_INTERVAL);
            }
        })
        .expect("Failed to spawn watchdog thread");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geometry::{Point, Rect};
    use crate::surface::{ActivationOutcome, SurfaceError, TargetKind};

    struct StubSurface {
        ready: bool,
        viewport: ViewportSize,
        button: Rect,
        activations: usize,
    }

    impl StubSurface {
        fn new() -> Self {
            Self {
                ready: true,
                viewport: ViewportSize::new(1_920.0, 1_080.0),
                button: Rect::new(900.0, 500.0, 120.0, 80.0),
                activations: 0,
            }
        }
    }

    impl InteractionSurface for StubSurface {
        type Node = u32;

        fn is_ready(&self) -> bool {
            self.ready
        }

        fn viewport(&self) -> ViewportSize {
            self.viewport
        }

        fn topmost_at(&self, point: Point) -> Result<Option<u32>, SurfaceError> {
            Ok(self.button.contains(point).then_some(1))
        }

        fn parent(&self, _node: &u32) -> Option<u32> {
            None
        }

        fn interactive_kind(&self, _node: &u32) -> Option<TargetKind> {
            Some(TargetKind::Button)
        }

        fn node_rect(&self, _node: &u32) -> Option<Rect> {
            Some(self.button)
        }

        fn activate(
            &mut self,
            _node: &u32,
            _kind: TargetKind,
            _point: Point,
        ) -> Result<ActivationOutcome, SurfaceError> {
            self.activations += 1;
            Ok(ActivationOutcome::Dispatched)
        }

        fn commit_option(&mut self, _node: &u32, _index: usize) -> Result<(), SurfaceError> {
            Ok(())
        }
    }

    fn bridge_with(surface: StubSurface) -> Bridge<StubSurface> {
        let feed = CursorFeed::new();
        let clock = FeedClock::start();
        Bridge::new(surface, feed, clock, BridgeConfig::default())
    }

    #[test]
    fn missing_feed_keeps_loop_idle_without_activations() {
        let mut bridge = bridge_with(StubSurface::new());

        for frame in 0..30u64 {
            let outcome = bridge.tick_at(frame * 16);
            assert_eq!(outcome, FrameOutcome::Idle);
        }

        assert_eq!(bridge.surface.activations, 0);
        assert_eq!(bridge.status.snapshot().feed, FeedStatus::NotReady);
    }

    #[test]
    fn stale_feed_suspends_and_disengages() {
        let mut bridge = bridge_with(StubSurface::new());
        bridge.feed.set_viewport(ViewportSize::new(1_920.0, 1_080.0));
        bridge.feed.publish(950.0, 540.0, 0);

        bridge.tick_at(0);
        bridge.tick_at(200);
        assert!(bridge.controller.is_locked());

        let outcome = bridge.tick_at(2_000);
        assert_eq!(outcome, FrameOutcome::Idle);
        assert!(!bridge.controller.is_locked());
        assert!(matches!(
            bridge.status.snapshot().feed,
            FeedStatus::Stale { age_ms: 2_000 }
        ));
    }

    #[test]
    fn frames_map_through_the_tracker_viewport() {
        let mut bridge = bridge_with(StubSurface::new());
        bridge.feed.set_viewport(ViewportSize::new(1_280.0, 720.0));
        bridge.feed.publish(640.0, 360.0, 0);

        bridge.tick_at(16);

        let snapshot = bridge.status.snapshot();
        let mapped = snapshot.mapped_point.expect("mapped point");
        assert_eq!((mapped.x, mapped.y), (960.0, 540.0));
        assert_eq!(snapshot.feed, FeedStatus::Live);
    }

    #[test]
    fn unready_surface_parks_the_bridge() {
        let mut surface = StubSurface::new();
        surface.ready = false;
        let mut bridge = bridge_with(surface);
        bridge.feed.publish(10.0, 10.0, 0);

        let outcome = bridge.tick_at(16);
        assert_eq!(outcome, FrameOutcome::SurfaceUnavailable);
        assert_eq!(
            bridge.status.snapshot().bridge,
            BridgeStatus::WaitingForSurface
        );
    }
}
