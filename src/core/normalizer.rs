//! Input Normalizer: device coordinates → unit-square samples
//!
//! Also hosts the frame sampler that paces raw moves to one per logical
//! frame. Pacing changes sample density only; the reducer accepts whatever
//! it is given.

use std::collections::VecDeque;
use crate::types::{Bounds, PointerKind, RawPointer, Sample};

/// Map a device point into the unit square, clamped
pub fn normalize_point(bounds: &Bounds, client_x: f64, client_y: f64) -> (f64, f64) {
    let x = if bounds.width > 0.0 {
        (client_x - bounds.left) / bounds.width
    } else {
        0.0
    };
    let y = if bounds.height > 0.0 {
        (client_y - bounds.top) / bounds.height
    } else {
        0.0
    };
    (crate::clamp01(x), crate::clamp01(y))
}

/// Normalizes raw pointer events and stamps them with sequence numbers
#[derive(Debug, Clone)]
pub struct InputNormalizer {
    bounds: Bounds,
    target_id: String,
    next_seq: u64,
}

impl InputNormalizer {
    /// Create a normalizer for one surface; sequence starts at 1
    pub fn new(bounds: Bounds, target_id: impl Into<String>) -> Self {
        Self {
            bounds,
            target_id: target_id.into(),
            next_seq: 1,
        }
    }

    /// Surface was resized or moved
    pub fn set_bounds(&mut self, bounds: Bounds) {
        self.bounds = bounds;
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Normalize one raw event into the next sample
    pub fn sample(&mut self, raw: &RawPointer) -> Sample {
        let (x, y) = normalize_point(&self.bounds, raw.client_x, raw.client_y);
        let seq = self.next_seq;
        self.next_seq += 1;
        Sample::new(raw.kind, seq, x, y, raw.pointer_id, self.target_id.clone())
            .with_button(raw.button)
    }

    /// Sequence number the next sample will get
    pub fn next_seq(&self) -> u64 {
        self.next_seq
    }
}

/// Coalesces pointer moves to one per logical frame tick
///
/// Down/up/cancel are never dropped; they flush any pending move first so
/// arrival order is preserved.
#[derive(Debug, Default)]
pub struct FrameSampler {
    ready: VecDeque<RawPointer>,
    pending_move: Option<RawPointer>,
    last_frame: Option<u64>,
    coalesced: u64,
}

impl FrameSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer a raw event from the input boundary
    pub fn offer(&mut self, raw: RawPointer) {
        match raw.kind {
            PointerKind::Move => {
                if self.pending_move.replace(raw).is_some() {
                    self.coalesced += 1;
                }
            }
            _ => {
                if let Some(pending) = self.pending_move.take() {
                    self.ready.push_back(pending);
                }
                self.ready.push_back(raw);
            }
        }
    }

    /// Advance the logical clock; returns the events due this frame
    ///
    /// Frames must increase; a repeated or older frame yields nothing.
    pub fn tick(&mut self, frame: u64) -> Vec<RawPointer> {
        if let Some(last) = self.last_frame {
            if frame <= last {
                return Vec::new();
            }
        }
        self.last_frame = Some(frame);

        let mut due: Vec<RawPointer> = self.ready.drain(..).collect();
        if let Some(pending) = self.pending_move.take() {
            due.push(pending);
        }
        due
    }

    /// Moves dropped by coalescing so far
    pub fn coalesced(&self) -> u64 {
        self.coalesced
    }

    pub fn is_idle(&self) -> bool {
        self.ready.is_empty() && self.pending_move.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(kind: PointerKind, x: f64, y: f64) -> RawPointer {
        RawPointer {
            kind,
            client_x: x,
            client_y: y,
            pointer_id: 1,
            button: 0,
        }
    }

    #[test]
    fn test_normalize_maps_into_unit_square() {
        let bounds = Bounds::new(100.0, 50.0, 400.0, 200.0);
        assert_eq!(normalize_point(&bounds, 300.0, 150.0), (0.5, 0.5));
        assert_eq!(normalize_point(&bounds, 0.0, 400.0), (0.0, 1.0));
    }

    #[test]
    fn test_zero_sized_bounds() {
        let bounds = Bounds::new(0.0, 0.0, 0.0, 0.0);
        assert_eq!(normalize_point(&bounds, 10.0, 10.0), (0.0, 0.0));
    }

    #[test]
    fn test_sequence_is_monotonic() {
        let mut normalizer = InputNormalizer::new(Bounds::new(0.0, 0.0, 100.0, 100.0), "stage");
        let a = normalizer.sample(&raw(PointerKind::Down, 10.0, 10.0));
        let b = normalizer.sample(&raw(PointerKind::Move, 20.0, 30.0));
        assert_eq!(a.seq(), 1);
        assert_eq!(b.seq(), 2);
        assert_eq!((b.x(), b.y()), (0.2, 0.3));
        assert_eq!(b.target_id(), "stage");
    }

    #[test]
    fn test_sampler_coalesces_moves() {
        let mut sampler = FrameSampler::new();
        sampler.offer(raw(PointerKind::Move, 1.0, 1.0));
        sampler.offer(raw(PointerKind::Move, 2.0, 2.0));
        sampler.offer(raw(PointerKind::Move, 3.0, 3.0));

        let due = sampler.tick(1);
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].client_x, 3.0);
        assert_eq!(sampler.coalesced(), 2);
        assert!(sampler.is_idle());
    }

    #[test]
    fn test_sampler_preserves_order_around_up() {
        let mut sampler = FrameSampler::new();
        sampler.offer(raw(PointerKind::Down, 0.0, 0.0));
        sampler.offer(raw(PointerKind::Move, 5.0, 5.0));
        sampler.offer(raw(PointerKind::Up, 6.0, 6.0));

        let kinds: Vec<_> = sampler.tick(1).iter().map(|r| r.kind).collect();
        assert_eq!(kinds, vec![PointerKind::Down, PointerKind::Move, PointerKind::Up]);
    }

    #[test]
    fn test_sampler_ignores_stale_frames() {
        let mut sampler = FrameSampler::new();
        sampler.offer(raw(PointerKind::Move, 1.0, 1.0));
        assert_eq!(sampler.tick(5).len(), 1);
        sampler.offer(raw(PointerKind::Move, 2.0, 2.0));
        assert!(sampler.tick(5).is_empty());
        assert_eq!(sampler.tick(6).len(), 1);
    }
}
