use crate::algorithm::option_picker::OptionPicker;
use crate::models::config::DwellConfig;
use crate::models::geometry::{Point, Rect};
use crate::surface::{ActivationOutcome, InteractionSurface, SurfaceError, TargetKind};

/// Bound on the ancestor walk during target discovery.
const TARGET_SEARCH_DEPTH: usize = 10;

/// What the controller did with one frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// No interactive candidate under the cursor.
    Idle,
    /// A candidate is accumulating stabilization time.
    Stabilizing,
    /// A lock was acquired this frame.
    LockAcquired,
    /// The lock is held; dwell, cooldown or re-arm not yet satisfied.
    LockHeld,
    /// The lock was released (drift past the unlock radius or a dead target).
    Released,
    /// An activation was dispatched and committed.
    Activated,
    /// The mirrored option picker was opened over a selection control.
    PickerOpened,
    /// Activation dispatch failed; no side effects were committed.
    DispatchFailed,
    /// Hit-testing failed; the frame was treated as a no-op.
    SurfaceUnavailable,
}

/// A lockable thing: a surface node, or a row of the open option picker.
#[derive(Debug, Clone, PartialEq)]
enum LockTarget<N> {
    Node { node: N, kind: TargetKind },
    PickerRow(usize),
}

#[derive(Debug, Clone)]
struct Lock<N> {
    target: LockTarget<N>,
    /// Start of the current dwell interval; reset on (re)acquire and on
    /// every committed activation.
    locked_at: u64,
    /// Anchor the unlock radius is measured from; updated together with
    /// `locked_at`, never in between.
    anchor: Point,
}

#[derive(Debug, Clone)]
struct Pending<N> {
    candidate: LockTarget<N>,
    since: u64,
}

struct ActivePicker<N> {
    node: N,
    picker: OptionPicker,
}

/// Dwell/lock state machine: Idle → Pending → Locked.
///
/// Consumes one mapped point per frame and decides when a hit-test candidate
/// becomes locked, when dwell time has accumulated into an activation, and
/// when drift or a vanished target releases the lock. All time is injected as
/// `now_ms`; the controller never reads a clock.
pub struct DwellController<S: InteractionSurface> {
    config: DwellConfig,
    lock: Option<Lock<S::Node>>,
    pending: Option<Pending<S::Node>>,
    last_activation_at: Option<u64>,
    last_activated: Option<LockTarget<S::Node>>,
    picker: Option<ActivePicker<S::Node>>,
    last_move_forwarded_at: Option<u64>,
    surface_revision: u64,
}

impl<S: InteractionSurface> DwellController<S> {
    pub fn new(config: DwellConfig) -> Self {
        Self {
            config,
            lock: None,
            pending: None,
            last_activation_at: None,
            last_activated: None,
            picker: None,
            last_move_forwarded_at: None,
            surface_revision: 0,
        }
    }

    pub fn config(&self) -> &DwellConfig {
        &self.config
    }

    pub fn is_locked(&self) -> bool {
        self.lock.is_some()
    }

    /// The open mirrored option list, if a selection control was activated.
    pub fn picker(&self) -> Option<&OptionPicker> {
        self.picker.as_ref().map(|active| &active.picker)
    }

    /// Cancels all interaction state: lock, highlight, pending candidate and
    /// the option picker. Called on signal loss or when the host declares the
    /// surface inactive.
    pub fn disengage(&mut self, surface: &mut S) {
        self.release_lock(surface);
        self.picker = None;
        self.pending = None;
    }

    /// Advances the machine by one frame with the mapped cursor point.
    pub fn on_frame(&mut self, surface: &mut S, point: Point, now_ms: u64) -> FrameOutcome {
        self.forward_pointer_move(surface, point, now_ms);
        self.drop_vanished_targets(surface);

        if self.lock.is_some() {
            return self.advance_lock(surface, point, now_ms);
        }

        let candidate = match self.find_candidate(surface, point) {
            Ok(candidate) => candidate,
            Err(err) => {
                log::debug!("dwell: hit-test failed: {err}");
                self.pending = None;
                return FrameOutcome::SurfaceUnavailable;
            }
        };

        let Some(candidate) = candidate else {
            self.pending = None;
            if let Some(active) = &mut self.picker {
                active.picker.set_highlighted(None);
            }
            return FrameOutcome::Idle;
        };

        let pending_since = match &self.pending {
            Some(pending) if pending.candidate == candidate => pending.since,
            _ => {
                self.pending = Some(Pending {
                    candidate: candidate.clone(),
                    since: now_ms,
                });
                now_ms
            }
        };

        if now_ms.saturating_sub(pending_since) >= self.config.stabilization_ms {
            self.acquire_lock(surface, candidate, point, now_ms);
            return FrameOutcome::LockAcquired;
        }

        FrameOutcome::Stabilizing
    }

    fn advance_lock(&mut self, surface: &mut S, point: Point, now_ms: u64) -> FrameOutcome {
        let Some(lock) = self.lock.clone() else {
            return FrameOutcome::Idle;
        };

        // Drift check comes before any activation check; a released lock
        // hit-tests fresh on the next frame.
        if point.distance_to(lock.anchor) > self.config.unlock_radius_px {
            self.release_lock(surface);
            return FrameOutcome::Released;
        }

        let dwell = now_ms.saturating_sub(lock.locked_at);
        let cooled = match self.last_activation_at {
            None => true,
            Some(at) => now_ms.saturating_sub(at) >= self.config.cooldown_ms,
        };

        if dwell < self.config.dwell_time_ms || !cooled {
            return FrameOutcome::LockHeld;
        }

        if self.config.require_move_to_reactivate
            && self.last_activated.as_ref() == Some(&lock.target)
        {
            return FrameOutcome::LockHeld;
        }

        self.fire_activation(surface, &lock, point, now_ms)
    }

    fn fire_activation(
        &mut self,
        surface: &mut S,
        lock: &Lock<S::Node>,
        point: Point,
        now_ms: u64,
    ) -> FrameOutcome {
        match &lock.target {
            LockTarget::PickerRow(index) => {
                let Some(active) = &self.picker else {
                    self.release_lock(surface);
                    return FrameOutcome::Released;
                };

                match surface.commit_option(&active.node, *index) {
                    Ok(()) => {
                        log::info!("dwell: committed picker option {index}");
                        self.picker = None;
                        self.release_lock(surface);
                        self.last_activation_at = Some(now_ms);
                        self.last_activated = None;
                        FrameOutcome::Activated
                    }
                    Err(err) => {
                        log::warn!("dwell: option commit failed: {err}");
                        FrameOutcome::DispatchFailed
                    }
                }
            }
            LockTarget::Node { node, kind } => match surface.activate(node, *kind, point) {
                Ok(ActivationOutcome::Dispatched) => {
                    log::info!("dwell: activated {kind:?} target");
                    self.last_activation_at = Some(now_ms);
                    self.last_activated = Some(lock.target.clone());
                    if let Some(held) = &mut self.lock {
                        held.locked_at = now_ms;
                        held.anchor = point;
                    }
                    FrameOutcome::Activated
                }
                Ok(ActivationOutcome::NeedsOptionPicker(options)) => {
                    let anchor = surface
                        .node_rect(node)
                        .unwrap_or_else(|| Rect::new(point.x - 90.0, point.y, 180.0, 0.0));
                    let picker = OptionPicker::layout(anchor, options, surface.viewport());
                    let node = node.clone();
                    let target = lock.target.clone();

                    self.release_lock(surface);
                    self.last_activation_at = Some(now_ms);
                    self.last_activated = Some(target);

                    if picker.is_empty() {
                        log::warn!("dwell: selection control exposed no options to mirror");
                        return FrameOutcome::Activated;
                    }

                    log::info!("dwell: opened option picker with {} rows", picker.len());
                    self.picker = Some(ActivePicker { node, picker });
                    FrameOutcome::PickerOpened
                }
                Err(err) => {
                    // No cooldown, no re-anchor: the attempt is retried on the
                    // next qualifying frame instead of being consumed.
                    log::warn!("dwell: activation dispatch failed: {err}");
                    FrameOutcome::DispatchFailed
                }
            },
        }
    }

    fn acquire_lock(
        &mut self,
        surface: &mut S,
        target: LockTarget<S::Node>,
        point: Point,
        now_ms: u64,
    ) {
        match &target {
            LockTarget::Node { node, kind } => {
                log::debug!("dwell: locked {kind:?} target");
                surface.set_highlight(node, true);
            }
            LockTarget::PickerRow(index) => {
                if let Some(active) = &mut self.picker {
                    active.picker.set_highlighted(Some(*index));
                }
            }
        }

        self.lock = Some(Lock {
            target,
            locked_at: now_ms,
            anchor: point,
        });
        self.pending = None;
    }

    fn release_lock(&mut self, surface: &mut S) {
        if let Some(lock) = self.lock.take() {
            match &lock.target {
                LockTarget::Node { node, .. } => surface.set_highlight(node, false),
                LockTarget::PickerRow(_) => {
                    if let Some(active) = &mut self.picker {
                        active.picker.set_highlighted(None);
                    }
                }
            }

            // Leaving the target re-arms it.
            if self.last_activated.as_ref() == Some(&lock.target) {
                self.last_activated = None;
            }
        }
        self.pending = None;
    }

    fn find_candidate(
        &self,
        surface: &S,
        point: Point,
    ) -> Result<Option<LockTarget<S::Node>>, SurfaceError> {
        // While the mirrored picker is open its rows are the only targets.
        if let Some(active) = &self.picker {
            return Ok(active.picker.row_at(point).map(LockTarget::PickerRow));
        }

        let Some(raw) = surface.topmost_at(point)? else {
            return Ok(None);
        };
        Ok(find_interactive_target(surface, raw))
    }

    /// Re-validates held references after the surface reports a change to its
    /// element set; stale locks are released so no highlight outlives its node.
    fn drop_vanished_targets(&mut self, surface: &mut S) {
        let revision = surface.revision();
        if revision == self.surface_revision {
            return;
        }
        self.surface_revision = revision;

        let picker_dead = self
            .picker
            .as_ref()
            .is_some_and(|active| !surface.node_alive(&active.node));
        if picker_dead {
            self.picker = None;
            if matches!(
                self.lock.as_ref().map(|lock| &lock.target),
                Some(LockTarget::PickerRow(_))
            ) {
                self.lock = None;
            }
            self.pending = None;
        }

        let lock_dead = match self.lock.as_ref().map(|lock| &lock.target) {
            Some(LockTarget::Node { node, .. }) => !surface.node_alive(node),
            _ => false,
        };
        if lock_dead {
            self.release_lock(surface);
        }

        let pending_dead = match self.pending.as_ref().map(|pending| &pending.candidate) {
            Some(LockTarget::Node { node, .. }) => !surface.node_alive(node),
            _ => false,
        };
        if pending_dead {
            self.pending = None;
        }
    }

    fn forward_pointer_move(&mut self, surface: &mut S, point: Point, now_ms: u64) {
        if self.config.move_event_hz <= 0.0 {
            return;
        }

        let interval_ms = (1_000.0 / self.config.move_event_hz) as u64;
        let due = match self.last_move_forwarded_at {
            None => true,
            Some(at) => now_ms.saturating_sub(at) >= interval_ms,
        };
        if due {
            self.last_move_forwarded_at = Some(now_ms);
            surface.pointer_moved(point);
        }
    }
}

/// Bounded two-pass ancestor walk from the raw hit-test result: text-entry
/// and selection kinds win over plain clickables along the same chain.
fn find_interactive_target<S: InteractionSurface>(
    surface: &S,
    origin: S::Node,
) -> Option<LockTarget<S::Node>> {
    if let Some(found) = walk_for(surface, &origin, |kind| kind.is_input_like()) {
        return Some(found);
    }
    walk_for(surface, &origin, |kind| !kind.is_input_like())
}

fn walk_for<S: InteractionSurface>(
    surface: &S,
    origin: &S::Node,
    accept: impl Fn(TargetKind) -> bool,
) -> Option<LockTarget<S::Node>> {
    let mut current = Some(origin.clone());
    for _ in 0..TARGET_SEARCH_DEPTH {
        let node = current?;
        if let Some(kind) = surface.interactive_kind(&node) {
            if accept(kind) {
                return Some(LockTarget::Node { node, kind });
            }
        }
        current = surface.parent(&node);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::geometry::{Rect, ViewportSize};
    use std::collections::{HashMap, HashSet};

    #[derive(Debug, Clone)]
    struct NodeSpec {
        kind: Option<TargetKind>,
        parent: Option<u32>,
        rect: Option<Rect>,
    }

    #[derive(Default)]
    struct FakeSurface {
        nodes: HashMap<u32, NodeSpec>,
        /// First matching region wins, like a topmost hit-test.
        hit_regions: Vec<(Rect, u32)>,
        select_options: HashMap<u32, Vec<String>>,
        dead: HashSet<u32>,
        revision: u64,
        fail_dispatch: bool,
        activations: Vec<(u32, TargetKind)>,
        commits: Vec<(u32, usize)>,
        highlights: Vec<(u32, bool)>,
        pointer_moves: Vec<Point>,
    }

    impl FakeSurface {
        fn add_node(&mut self, id: u32, kind: Option<TargetKind>, parent: Option<u32>) {
            self.nodes.insert(
                id,
                NodeSpec {
                    kind,
                    parent,
                    rect: None,
                },
            );
        }

        fn add_region(&mut self, id: u32, kind: TargetKind, rect: Rect) {
            self.nodes.insert(
                id,
                NodeSpec {
                    kind: Some(kind),
                    parent: None,
                    rect: Some(rect),
                },
            );
            self.hit_regions.push((rect, id));
        }
    }

    impl InteractionSurface for FakeSurface {
        type Node = u32;

        fn is_ready(&self) -> bool {
            true
        }

        fn viewport(&self) -> ViewportSize {
            ViewportSize::new(1_920.0, 1_080.0)
        }

        fn topmost_at(&self, point: Point) -> Result<Option<u32>, SurfaceError> {
            Ok(self
                .hit_regions
                .iter()
                .find(|(rect, id)| rect.contains(point) && !self.dead.contains(id))
                .map(|(_, id)| *id))
        }

        fn parent(&self, node: &u32) -> Option<u32> {
            self.nodes.get(node).and_then(|spec| spec.parent)
        }

        fn interactive_kind(&self, node: &u32) -> Option<TargetKind> {
            self.nodes.get(node).and_then(|spec| spec.kind)
        }

        fn node_rect(&self, node: &u32) -> Option<Rect> {
            self.nodes.get(node).and_then(|spec| spec.rect)
        }

        fn node_alive(&self, node: &u32) -> bool {
            !self.dead.contains(node)
        }

        fn revision(&self) -> u64 {
            self.revision
        }

        fn pointer_moved(&mut self, point: Point) {
            self.pointer_moves.push(point);
        }

        fn set_highlight(&mut self, node: &u32, on: bool) {
            self.highlights.push((*node, on));
        }

        fn activate(
            &mut self,
            node: &u32,
            kind: TargetKind,
            _point: Point,
        ) -> Result<ActivationOutcome, SurfaceError> {
            if self.fail_dispatch {
                return Err(SurfaceError::Dispatch("injected failure".to_string()));
            }
            if kind == TargetKind::SelectList {
                let options = self.select_options.get(node).cloned().unwrap_or_default();
                return Ok(ActivationOutcome::NeedsOptionPicker(options));
            }
            self.activations.push((*node, kind));
            Ok(ActivationOutcome::Dispatched)
        }

        fn commit_option(&mut self, node: &u32, index: usize) -> Result<(), SurfaceError> {
            if self.fail_dispatch {
                return Err(SurfaceError::Dispatch("injected failure".to_string()));
            }
            self.commits.push((*node, index));
            Ok(())
        }
    }

    const BUTTON_RECT: Rect = Rect {
        x: 100.0,
        y: 100.0,
        width: 120.0,
        height: 40.0,
    };

    fn button_surface() -> FakeSurface {
        let mut surface = FakeSurface::default();
        surface.add_region(1, TargetKind::Button, BUTTON_RECT);
        surface
    }

    fn short_dwell_config() -> DwellConfig {
        DwellConfig {
            dwell_time_ms: 700,
            cooldown_ms: 600,
            stabilization_ms: 0,
            move_event_hz: 0.0,
            ..DwellConfig::default()
        }
    }

    fn on_button() -> Point {
        Point::new(150.0, 120.0)
    }

    #[test]
    fn no_target_frames_stay_idle() {
        let mut surface = FakeSurface::default();
        let mut controller = DwellController::new(short_dwell_config());

        for frame in 0..20u64 {
            let outcome = controller.on_frame(&mut surface, Point::new(5.0, 5.0), frame * 100);
            assert_eq!(outcome, FrameOutcome::Idle);
        }

        assert!(!controller.is_locked());
        assert!(surface.activations.is_empty());
    }

    #[test]
    fn single_dwell_fires_exactly_one_activation() {
        let mut surface = button_surface();
        let mut controller = DwellController::new(short_dwell_config());

        let mut activations = 0;
        for frame in 0..=7u64 {
            let outcome = controller.on_frame(&mut surface, on_button(), frame * 100);
            if outcome == FrameOutcome::Activated {
                activations += 1;
                assert_eq!(frame * 100, 700);
            }
        }
        assert_eq!(activations, 1);
        assert_eq!(surface.activations.len(), 1);

        // Held further without movement: cooldown not yet elapsed at 750 ms,
        // and the re-arm rule keeps blocking afterwards.
        let outcome = controller.on_frame(&mut surface, on_button(), 750);
        assert_eq!(outcome, FrameOutcome::LockHeld);
        assert_eq!(surface.activations.len(), 1);
    }

    #[test]
    fn held_target_requires_movement_to_reactivate() {
        let mut surface = button_surface();
        let mut controller = DwellController::new(short_dwell_config());

        let mut now = 0;
        while now <= 5_000 {
            controller.on_frame(&mut surface, on_button(), now);
            now += 100;
        }
        assert_eq!(surface.activations.len(), 1);

        // Leave the radius, come back, stabilize and dwell again.
        let outcome = controller.on_frame(&mut surface, Point::new(150.0, 170.0), now);
        assert_eq!(outcome, FrameOutcome::Released);
        now += 100;

        let start = now;
        while now <= start + 800 {
            controller.on_frame(&mut surface, on_button(), now);
            now += 100;
        }
        assert_eq!(surface.activations.len(), 2);
    }

    #[test]
    fn cooldown_gates_reactivation_without_move_requirement() {
        let mut surface = button_surface();
        let config = DwellConfig {
            dwell_time_ms: 100,
            require_move_to_reactivate: false,
            ..short_dwell_config()
        };
        let mut controller = DwellController::new(config);

        let mut fired_at = Vec::new();
        for frame in 0..=10u64 {
            let now = frame * 100;
            if controller.on_frame(&mut surface, on_button(), now) == FrameOutcome::Activated {
                fired_at.push(now);
            }
        }

        // First at dwell expiry; the second must additionally wait out the
        // 600 ms cooldown after re-anchoring.
        assert_eq!(fired_at, vec![100, 700]);
    }

    #[test]
    fn drift_past_unlock_radius_releases_before_activation() {
        let mut surface = button_surface();
        let mut controller = DwellController::new(short_dwell_config());

        for frame in 0..=6u64 {
            controller.on_frame(&mut surface, on_button(), frame * 100);
        }
        assert!(controller.is_locked());

        // 30 px of drift at the frame where dwell would have fired.
        let outcome = controller.on_frame(&mut surface, Point::new(150.0, 150.0), 700);
        assert_eq!(outcome, FrameOutcome::Released);
        assert!(surface.activations.is_empty());
        assert_eq!(surface.highlights.last(), Some(&(1, false)));
    }

    #[test]
    fn alternating_candidates_never_lock() {
        let mut surface = FakeSurface::default();
        surface.add_region(1, TargetKind::Button, Rect::new(0.0, 0.0, 100.0, 100.0));
        surface.add_region(2, TargetKind::Button, Rect::new(100.0, 0.0, 100.0, 100.0));

        let config = DwellConfig {
            stabilization_ms: 140,
            move_event_hz: 0.0,
            ..DwellConfig::default()
        };
        let mut controller = DwellController::new(config);

        for frame in 0..40u64 {
            let point = if frame % 2 == 0 {
                Point::new(50.0, 50.0)
            } else {
                Point::new(150.0, 50.0)
            };
            let outcome = controller.on_frame(&mut surface, point, frame * 60);
            assert_ne!(outcome, FrameOutcome::LockAcquired);
        }

        assert!(!controller.is_locked());
        assert!(surface.activations.is_empty());
    }

    #[test]
    fn dispatch_failure_commits_no_side_effects() {
        let mut surface = button_surface();
        surface.fail_dispatch = true;
        let mut controller = DwellController::new(short_dwell_config());

        for frame in 0..=6u64 {
            controller.on_frame(&mut surface, on_button(), frame * 100);
        }
        let outcome = controller.on_frame(&mut surface, on_button(), 700);
        assert_eq!(outcome, FrameOutcome::DispatchFailed);
        assert!(controller.last_activation_at.is_none());

        // The attempt is retried on the next qualifying frame once dispatch
        // works again.
        surface.fail_dispatch = false;
        let outcome = controller.on_frame(&mut surface, on_button(), 800);
        assert_eq!(outcome, FrameOutcome::Activated);
        assert_eq!(controller.last_activation_at, Some(800));
    }

    #[test]
    fn select_target_opens_mirrored_picker_and_commits() {
        let mut surface = FakeSurface::default();
        surface.add_region(7, TargetKind::SelectList, Rect::new(100.0, 100.0, 200.0, 30.0));
        surface.select_options.insert(
            7,
            vec!["txt".to_string(), "docx".to_string(), "pdf".to_string()],
        );

        let mut controller = DwellController::new(short_dwell_config());
        let over_select = Point::new(150.0, 110.0);

        let mut outcome = FrameOutcome::Idle;
        for frame in 0..=7u64 {
            outcome = controller.on_frame(&mut surface, over_select, frame * 100);
        }
        assert_eq!(outcome, FrameOutcome::PickerOpened);
        let picker = controller.picker().expect("picker should be open");
        assert_eq!(picker.len(), 3);

        // Dwell on the second row; rows sit directly below the anchor.
        let row = picker.row_rect(1).expect("second row");
        let over_row = row.center();
        let mut now = 800;
        loop {
            let outcome = controller.on_frame(&mut surface, over_row, now);
            if outcome == FrameOutcome::Activated {
                break;
            }
            assert!(now < 4_000, "picker row never activated");
            now += 100;
        }

        assert_eq!(surface.commits, vec![(7, 1)]);
        assert!(controller.picker().is_none());
        assert!(!controller.is_locked());
    }

    #[test]
    fn text_entry_preferred_over_wrapping_clickable() {
        let mut surface = FakeSurface::default();
        // span (passive) -> button -> content-editable editor.
        surface.add_region(1, TargetKind::GenericClickable, Rect::new(0.0, 0.0, 50.0, 50.0));
        surface.add_node(10, None, Some(11));
        surface.add_node(11, Some(TargetKind::Button), Some(12));
        surface.add_node(12, Some(TargetKind::ContentEditable), None);
        surface.hit_regions.clear();
        surface
            .hit_regions
            .push((Rect::new(0.0, 0.0, 400.0, 400.0), 10));

        let config = DwellConfig {
            stabilization_ms: 0,
            dwell_time_ms: 100,
            move_event_hz: 0.0,
            ..DwellConfig::default()
        };
        let mut controller = DwellController::new(config);

        controller.on_frame(&mut surface, Point::new(20.0, 20.0), 0);
        controller.on_frame(&mut surface, Point::new(20.0, 20.0), 100);

        assert_eq!(surface.activations, vec![(12, TargetKind::ContentEditable)]);
    }

    #[test]
    fn ancestor_walk_is_bounded() {
        let mut surface = FakeSurface::default();
        // Interactive ancestor sits just past the walk depth.
        for id in 0..TARGET_SEARCH_DEPTH as u32 {
            surface.add_node(id, None, Some(id + 1));
        }
        surface.add_node(TARGET_SEARCH_DEPTH as u32, Some(TargetKind::Button), None);
        surface
            .hit_regions
            .push((Rect::new(0.0, 0.0, 400.0, 400.0), 0));

        let mut controller = DwellController::new(short_dwell_config());
        let outcome = controller.on_frame(&mut surface, Point::new(20.0, 20.0), 0);

        assert_eq!(outcome, FrameOutcome::Idle);
    }

    #[test]
    fn revision_bump_drops_dead_locked_target() {
        let mut surface = button_surface();
        let mut controller = DwellController::new(short_dwell_config());

        controller.on_frame(&mut surface, on_button(), 0);
        assert!(controller.is_locked());

        surface.dead.insert(1);
        surface.revision += 1;
        let outcome = controller.on_frame(&mut surface, on_button(), 100);

        assert_ne!(outcome, FrameOutcome::Activated);
        assert!(!controller.is_locked());
        assert_eq!(surface.highlights.last(), Some(&(1, false)));
    }

    #[test]
    fn disengage_clears_lock_pending_and_highlight() {
        let mut surface = button_surface();
        let mut controller = DwellController::new(short_dwell_config());

        controller.on_frame(&mut surface, on_button(), 0);
        assert!(controller.is_locked());

        controller.disengage(&mut surface);
        assert!(!controller.is_locked());
        assert!(controller.picker().is_none());
        assert_eq!(surface.highlights.last(), Some(&(1, false)));

        // Disengaging also re-arms: coming back activates again.
        for frame in 1..=9u64 {
            controller.on_frame(&mut surface, on_button(), frame * 100);
        }
        assert_eq!(surface.activations.len(), 1);
    }

    #[test]
    fn pointer_moves_are_rate_limited() {
        let mut surface = button_surface();
        let config = DwellConfig {
            move_event_hz: 30.0,
            ..short_dwell_config()
        };
        let mut controller = DwellController::new(config);

        for frame in 0..10u64 {
            controller.on_frame(&mut surface, Point::new(5.0, 5.0), frame * 10);
        }

        // 30 Hz over 100 ms: forwarded at 0, 40 and 80 ms only.
        assert_eq!(surface.pointer_moves.len(), 3);
    }
}
