//! CPU-side bookkeeping of the per-frame handshake.
//!
//! Recording a frame moves the back buffer from `Present` to `RenderTarget`,
//! finishing it moves the buffer back. The tracker refuses to begin a frame
//! twice, to finish a frame that never began, or to issue a barrier whose
//! before-state does not match what the buffer is actually in, which is what
//! the debug layer would report as a validation error.

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceState {
    Present,
    RenderTarget,
    DepthWrite,
    GenericRead,
    CopyDest,
    PixelShaderResource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FramePhase {
    Idle,
    Recording,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub before: ResourceState,
    pub after: ResourceState,
}

#[derive(Debug, Clone, Copy)]
pub struct StateTracker {
    state: ResourceState,
}

impl StateTracker {
    pub fn new(initial: ResourceState) -> Self {
        Self { state: initial }
    }

    pub fn state(&self) -> ResourceState {
        self.state
    }

    /// Records a transition to `after`. Same-state barriers are rejected.
    pub fn transition(&mut self, after: ResourceState) -> Result<Transition> {
        let before = self.state;
        if before == after {
            return Err(Error::IllegalTransition { before, after });
        }
        self.state = after;
        Ok(Transition { before, after })
    }

    /// Like [`StateTracker::transition`], but the resource must currently be in `expected`.
    pub fn transition_from(
        &mut self,
        expected: ResourceState,
        after: ResourceState,
    ) -> Result<Transition> {
        if self.state != expected {
            return Err(Error::IllegalTransition {
                before: self.state,
                after,
            });
        }
        self.transition(after)
    }
}

pub struct FrameTracker<const N: usize> {
    phase: FramePhase,
    back_buffer_index: usize,
    back_buffers: [StateTracker; N],
}

impl<const N: usize> FrameTracker<N> {
    pub fn new() -> Self {
        Self {
            phase: FramePhase::Idle,
            back_buffer_index: 0,
            back_buffers: [StateTracker::new(ResourceState::Present); N],
        }
    }

    pub fn phase(&self) -> FramePhase {
        self.phase
    }

    pub fn back_buffer_index(&self) -> usize {
        self.back_buffer_index
    }

    pub fn back_buffer_state(&self, index: usize) -> ResourceState {
        self.back_buffers[index].state()
    }

    pub fn begin(&mut self, back_buffer_index: usize) -> Result<Transition> {
        self.expect_phase(FramePhase::Idle)?;
        assert!(back_buffer_index < N, "back buffer index {back_buffer_index} out of range");

        let transition = self.back_buffers[back_buffer_index]
            .transition_from(ResourceState::Present, ResourceState::RenderTarget)?;

        self.back_buffer_index = back_buffer_index;
        self.phase = FramePhase::Recording;
        Ok(transition)
    }

    pub fn end(&mut self) -> Result<Transition> {
        self.expect_phase(FramePhase::Recording)?;

        let transition = self.back_buffers[self.back_buffer_index]
            .transition_from(ResourceState::RenderTarget, ResourceState::Present)?;

        self.phase = FramePhase::Idle;
        Ok(transition)
    }

    fn expect_phase(&self, expected: FramePhase) -> Result<()> {
        if self.phase != expected {
            return Err(Error::FramePhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }
}

impl<const N: usize> Default for FrameTracker<N> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_round_trip_restores_present() {
        let mut tracker = FrameTracker::<2>::new();

        let t = tracker.begin(1).unwrap();
        assert_eq!(t.before, ResourceState::Present);
        assert_eq!(t.after, ResourceState::RenderTarget);
        assert_eq!(tracker.phase(), FramePhase::Recording);
        assert_eq!(tracker.back_buffer_state(1), ResourceState::RenderTarget);
        assert_eq!(tracker.back_buffer_state(0), ResourceState::Present);

        let t = tracker.end().unwrap();
        assert_eq!(t.before, ResourceState::RenderTarget);
        assert_eq!(t.after, ResourceState::Present);
        assert_eq!(tracker.phase(), FramePhase::Idle);
        assert_eq!(tracker.back_buffer_state(1), ResourceState::Present);
    }

    #[test]
    fn begin_twice_is_rejected() {
        let mut tracker = FrameTracker::<2>::new();
        tracker.begin(0).unwrap();

        let err = tracker.begin(1).unwrap_err();
        assert!(matches!(
            err,
            Error::FramePhase {
                expected: FramePhase::Idle,
                actual: FramePhase::Recording
            }
        ));
        // the failed call must not move the tracker to the other buffer
        assert_eq!(tracker.back_buffer_index(), 0);
        assert_eq!(tracker.back_buffer_state(1), ResourceState::Present);
    }

    #[test]
    fn end_without_begin_is_rejected() {
        let mut tracker = FrameTracker::<2>::new();
        assert!(matches!(
            tracker.end(),
            Err(Error::FramePhase {
                expected: FramePhase::Recording,
                ..
            })
        ));
    }

    #[test]
    fn alternating_buffers() {
        let mut tracker = FrameTracker::<2>::new();
        for i in 0..6 {
            tracker.begin(i % 2).unwrap();
            tracker.end().unwrap();
        }
        assert_eq!(tracker.back_buffer_state(0), ResourceState::Present);
        assert_eq!(tracker.back_buffer_state(1), ResourceState::Present);
    }

    #[test]
    fn same_state_transition_is_illegal() {
        let mut state = StateTracker::new(ResourceState::GenericRead);
        assert!(matches!(
            state.transition(ResourceState::GenericRead),
            Err(Error::IllegalTransition { .. })
        ));
        assert_eq!(state.state(), ResourceState::GenericRead);
    }

    #[test]
    fn unexpected_before_state_is_illegal() {
        let mut state = StateTracker::new(ResourceState::CopyDest);
        let err = state
            .transition_from(ResourceState::Present, ResourceState::RenderTarget)
            .unwrap_err();
        assert!(matches!(
            err,
            Error::IllegalTransition {
                before: ResourceState::CopyDest,
                after: ResourceState::RenderTarget
            }
        ));

        let t = state
            .transition_from(ResourceState::CopyDest, ResourceState::PixelShaderResource)
            .unwrap();
        assert_eq!(t.before, ResourceState::CopyDest);
        assert_eq!(state.state(), ResourceState::PixelShaderResource);
    }
}
