use glam::UVec2;

use crate::clock::{SimulationClock, SimulationState};
use crate::controls::{ControlHandle, UpdateQueue};
use crate::dispatch::{DispatchPlanner, DispatchShape, KernelCapability};
use crate::params::{ParameterSet, ParameterStore};
use crate::snapshot::{self, UniformSnapshot};
use crate::{FrameBackend, SkipReason};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FrameOutcome {
    Presented(UniformSnapshot),
    Dropped(SkipReason),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub presented: u64,
    pub dropped: u64,
    pub replans: u64,
}

/// Runs one frame per presentation tick and owns the host-side state the
/// kernel is fed from.
pub struct FrameDriver {
    store: ParameterStore,
    clock: SimulationClock,
    planner: DispatchPlanner,
    updates: UpdateQueue,
    drawable: UVec2,
    shape: Option<DispatchShape>,
    stats: FrameStats,
}

impl FrameDriver {
    pub fn new(store: ParameterStore, capability: KernelCapability, drawable: UVec2) -> Self {
        Self {
            store,
            clock: SimulationClock::new(),
            planner: DispatchPlanner::new(capability),
            updates: UpdateQueue::new(),
            drawable,
            shape: None,
            stats: FrameStats::default(),
        }
    }

    /// Sending side for control surfaces.
    pub fn control_handle(&self) -> ControlHandle {
        self.updates.handle()
    }

    /// Resize hook. The grid is re-planned on the next frame.
    pub fn resize(&mut self, drawable: UVec2) {
        self.drawable = drawable;
    }

    pub fn parameters(&self) -> &ParameterSet {
        self.store.current()
    }

    pub fn simulation(&self) -> SimulationState {
        self.clock.state()
    }

    pub fn planner(&self) -> &DispatchPlanner {
        &self.planner
    }

    pub fn shape(&self) -> Option<DispatchShape> {
        self.shape
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Produce one frame against `backend`.
    ///
    /// The clock advances and the snapshot is built even when the frame ends
    /// up dropped, so motion stays tied to presentation ticks.
    pub fn frame<B: FrameBackend>(&mut self, backend: &mut B) -> FrameOutcome {
        let applied = self.updates.drain_into(&mut self.store);
        if applied > 0 {
            log::trace!("applied {applied} parameter update(s)");
        }

        self.clock.advance();
        let snapshot = snapshot::build(self.store.current(), &self.clock.state());
        let shape = self.current_shape();

        match self.submit(backend, &snapshot, &shape) {
            Ok(()) => {
                self.stats.presented += 1;
                FrameOutcome::Presented(snapshot)
            }
            Err(reason) => {
                log::trace!("frame {} dropped: {reason:?}", self.clock.state().frame);
                self.stats.dropped += 1;
                FrameOutcome::Dropped(reason)
            }
        }
    }

    fn current_shape(&mut self) -> DispatchShape {
        match self.shape {
            Some(shape) if shape.drawable == self.drawable => shape,
            _ => {
                let shape = self.planner.plan(self.drawable);
                log::debug!(
                    "dispatch planned: {}x{} tiles of {}x{} for {}x{}",
                    shape.groups.x,
                    shape.groups.y,
                    shape.tile.x,
                    shape.tile.y,
                    shape.drawable.x,
                    shape.drawable.y
                );
                self.shape = Some(shape);
                self.stats.replans += 1;
                shape
            }
        }
    }

    fn submit<B: FrameBackend>(
        &mut self,
        backend: &mut B,
        snapshot: &UniformSnapshot,
        shape: &DispatchShape,
    ) -> Result<(), SkipReason> {
        if shape.is_empty() {
            return Err(SkipReason::EmptyDrawable);
        }
        let drawable = backend.acquire_drawable()?;
        let mut submission = backend.begin_submission()?;
        backend.encode(&mut submission, &drawable, snapshot, shape)?;
        backend.submit(submission);
        backend.present(drawable);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::{Control, ParamUpdate};

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Acquire,
        Begin,
        Encode {
            frame: u32,
            elapsed: f32,
            groups: UVec2,
        },
        Submit(u32),
        Present(u32),
    }

    /// Records every backend call; failures can be scripted per frame.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
        next: u32,
        fail_acquire: Vec<u32>,
        fail_begin: Vec<u32>,
        fail_encode: Vec<u32>,
        snapshots: Vec<UniformSnapshot>,
    }

    impl FrameBackend for Recorder {
        type Drawable = u32;
        type Submission = u32;

        fn acquire_drawable(&mut self) -> Result<u32, SkipReason> {
            self.calls.push(Call::Acquire);
            let id = self.next;
            self.next += 1;
            if self.fail_acquire.contains(&id) {
                return Err(SkipReason::Drawable);
            }
            Ok(id)
        }

        fn begin_submission(&mut self) -> Result<u32, SkipReason> {
            self.calls.push(Call::Begin);
            if self.fail_begin.contains(&(self.next - 1)) {
                return Err(SkipReason::Submission);
            }
            Ok(self.next - 1)
        }

        fn encode(
            &mut self,
            submission: &mut u32,
            drawable: &u32,
            snapshot: &UniformSnapshot,
            shape: &DispatchShape,
        ) -> Result<(), SkipReason> {
            assert_eq!(submission, drawable);
            self.calls.push(Call::Encode {
                frame: *drawable,
                elapsed: snapshot.elapsed_time,
                groups: shape.groups,
            });
            if self.fail_encode.contains(drawable) {
                return Err(SkipReason::Encoder);
            }
            self.snapshots.push(*snapshot);
            Ok(())
        }

        fn submit(&mut self, submission: u32) {
            self.calls.push(Call::Submit(submission));
        }

        fn present(&mut self, drawable: u32) {
            self.calls.push(Call::Present(drawable));
        }
    }

    fn driver(size: (u32, u32)) -> FrameDriver {
        FrameDriver::new(
            ParameterStore::new(),
            KernelCapability {
                preferred_width: 32,
                max_items_per_group: 1024,
            },
            UVec2::new(size.0, size.1),
        )
    }

    // --- Ordering -----------------------------------------------------------------

    #[test]
    fn frame_calls_backend_in_fixed_order() {
        let mut d = driver((1920, 1080));
        let mut b = Recorder::default();
        let outcome = d.frame(&mut b);

        assert!(matches!(outcome, FrameOutcome::Presented(_)));
        let encode = Call::Encode {
            frame: 0,
            elapsed: 1.0 / 60.0,
            groups: UVec2::new(60, 34),
        };
        assert_eq!(
            b.calls,
            vec![
                Call::Acquire,
                Call::Begin,
                encode,
                Call::Submit(0),
                Call::Present(0),
            ]
        );
    }

    #[test]
    fn snapshots_are_ordered_per_submission() {
        let mut d = driver((640, 480));
        let mut b = Recorder::default();
        for _ in 0..5 {
            d.frame(&mut b);
        }
        let times: Vec<f32> = b.snapshots.iter().map(|s| s.elapsed_time).collect();
        assert!(times.windows(2).all(|w| w[0] < w[1]), "got {times:?}");
        assert_eq!(d.stats().presented, 5);
    }

    // --- Dropped frames -----------------------------------------------------------

    #[test]
    fn missing_drawable_drops_frame_without_retry() {
        let mut d = driver((800, 600));
        let mut b = Recorder {
            fail_acquire: vec![0],
            ..Recorder::default()
        };

        assert_eq!(d.frame(&mut b), FrameOutcome::Dropped(SkipReason::Drawable));
        assert_eq!(b.calls, vec![Call::Acquire]);

        // Next tick carries on with the next clock step, nothing replayed.
        assert!(matches!(d.frame(&mut b), FrameOutcome::Presented(_)));
        assert_eq!(d.simulation().frame, 2);
        assert_eq!(b.snapshots.len(), 1);
        assert_eq!(b.snapshots[0].elapsed_time, 2.0 / 60.0);
        let expected = FrameStats {
            presented: 1,
            dropped: 1,
            replans: 1,
        };
        assert_eq!(d.stats(), expected);
    }

    #[test]
    fn missing_submission_or_encoder_drops_frame() {
        let mut d = driver((800, 600));
        let mut b = Recorder {
            fail_begin: vec![0],
            fail_encode: vec![1],
            ..Recorder::default()
        };
        assert_eq!(
            d.frame(&mut b),
            FrameOutcome::Dropped(SkipReason::Submission)
        );
        assert_eq!(d.frame(&mut b), FrameOutcome::Dropped(SkipReason::Encoder));
        let reached_submit = |c: &Call| matches!(c, Call::Submit(_) | Call::Present(_));
        assert!(!b.calls.iter().any(reached_submit));
        assert_eq!(d.stats().dropped, 2);
    }

    #[test]
    fn zero_sized_drawable_is_skipped_before_acquire() {
        let mut d = driver((0, 0));
        let mut b = Recorder::default();
        assert_eq!(
            d.frame(&mut b),
            FrameOutcome::Dropped(SkipReason::EmptyDrawable)
        );
        assert!(b.calls.is_empty());
        assert_eq!(d.simulation().frame, 1);
    }

    // --- Resize -------------------------------------------------------------------

    #[test]
    fn resize_replans_once() {
        let mut d = driver((800, 600));
        let mut b = Recorder::default();
        d.frame(&mut b);
        d.frame(&mut b);
        assert_eq!(d.stats().replans, 1);

        d.resize(UVec2::new(1920, 1080));
        d.frame(&mut b);
        d.frame(&mut b);
        assert_eq!(d.stats().replans, 2);
        assert_eq!(d.shape().map(|s| s.groups), Some(UVec2::new(60, 34)));
    }

    #[test]
    fn resize_to_same_size_keeps_plan() {
        let mut d = driver((800, 600));
        let mut b = Recorder::default();
        d.frame(&mut b);
        d.resize(UVec2::new(800, 600));
        d.frame(&mut b);
        assert_eq!(d.stats().replans, 1);
    }

    // --- Parameter updates ----------------------------------------------------------

    #[test]
    fn queued_updates_show_up_in_next_snapshot() {
        let mut d = driver((320, 240));
        let handle = d.control_handle();
        let mut b = Recorder::default();

        handle.set(Control::ManualRotation, 1.5);
        let FrameOutcome::Presented(s) = d.frame(&mut b) else {
            panic!("frame dropped");
        };
        assert_eq!(s.resolved_rotation, 1.5);
        assert_eq!(s.auto_rotation_flag, 0.0);

        handle.send(ParamUpdate::AutoRotation(true));
        let FrameOutcome::Presented(s) = d.frame(&mut b) else {
            panic!("frame dropped");
        };
        assert_eq!(s.resolved_rotation, d.simulation().auto_angle);
        assert_eq!(s.auto_rotation_flag, 1.0);
        assert_eq!(d.parameters().manual_rotation_angle(), 1.5);
    }

    #[test]
    fn defaults_first_frame_matches_reference_values() {
        let mut d = driver((1920, 1080));
        let mut b = Recorder::default();
        let FrameOutcome::Presented(s) = d.frame(&mut b) else {
            panic!("frame dropped");
        };
        assert_eq!(s.as_array()[0], 1.0 / 60.0);
        assert_eq!(s.as_array()[1], 0.002);
        assert_eq!(s.auto_rotation_flag, 1.0);
    }
}
