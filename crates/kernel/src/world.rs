use glam::Vec3;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::boxes::{BoxSlots, ReleaseOutcome};
use crate::config::{MAX_BOX_SLOTS, Tuning};
use crate::helicopter::{FlightIntent, Helicopter, VerticalIntent};

/// A record of a discrete change to the world.
///
/// Continuous per-frame motion is not logged; only releases, expiries and
/// capacity changes are.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WorldEvent {
    /// A box entered `slot` at `origin`.
    BoxReleased { slot: usize, origin: Vec3 },
    /// A release was requested but policy refused it.
    ReleaseRejected { outcome: ReleaseOutcome },
    /// The box in `slot` reached its expiry time and was removed.
    BoxExpired { slot: usize },
    /// The box slot capacity changed.
    CapacityChanged { from: usize, to: usize },
}

/// The authoritative simulation state.
///
/// Input handlers set intents and request releases; the frame driver calls
/// [`World::step`] once per simulation step. Cameras and scene traversal only
/// read from it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    tuning: Tuning,
    helicopter: Helicopter,
    intent: FlightIntent,
    boxes: BoxSlots,
    frame: u64,
    /// Simulation clock, the sum of every frame delta so far.
    clock: Duration,
    #[serde(skip)]
    event_log: Vec<WorldEvent>,
}

impl Default for World {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

impl World {
    /// A landed helicopter, no boxes, clock at zero.
    pub fn new(tuning: Tuning) -> Self {
        let capacity = tuning.max_boxes.min(MAX_BOX_SLOTS);
        Self {
            helicopter: Helicopter::landed(&tuning),
            intent: FlightIntent::default(),
            boxes: BoxSlots::new(capacity),
            frame: 0,
            clock: Duration::ZERO,
            event_log: Vec::new(),
            tuning,
        }
    }

    pub fn tuning(&self) -> &Tuning {
        &self.tuning
    }

    pub fn helicopter(&self) -> &Helicopter {
        &self.helicopter
    }

    pub fn intent(&self) -> FlightIntent {
        self.intent
    }

    pub fn boxes(&self) -> &BoxSlots {
        &self.boxes
    }

    /// Number of completed steps.
    pub fn frame(&self) -> u64 {
        self.frame
    }

    pub fn clock(&self) -> Duration {
        self.clock
    }

    pub fn set_vertical_intent(&mut self, vertical: VerticalIntent) {
        self.intent.vertical = vertical;
    }

    pub fn set_moving(&mut self, moving: bool) {
        self.intent.moving = moving;
    }

    /// Try to drop a box. Rejections leave the world unchanged apart from the
    /// event log.
    pub fn release_box(&mut self) -> ReleaseOutcome {
        let outcome = self
            .boxes
            .release(&self.helicopter, self.clock, &self.tuning);
        match outcome {
            ReleaseOutcome::Released { slot } => {
                if let Some(released) = self.boxes.get(slot) {
                    let origin = released.origin;
                    tracing::info!(slot, height = self.helicopter.height, "box released");
                    self.event_log.push(WorldEvent::BoxReleased { slot, origin });
                }
            }
            rejected => {
                tracing::debug!(?rejected, height = self.helicopter.height, "release ignored");
                self.event_log
                    .push(WorldEvent::ReleaseRejected { outcome: rejected });
            }
        }
        outcome
    }

    /// Change how many slots releases may use, clamped to [`MAX_BOX_SLOTS`].
    /// Boxes already in flight are never evicted.
    pub fn set_max_boxes(&mut self, max_boxes: usize) {
        let to = max_boxes.min(MAX_BOX_SLOTS);
        let from = self.boxes.capacity();
        if from == to {
            return;
        }
        self.boxes.set_capacity(to);
        self.tuning.max_boxes = to;
        tracing::debug!(from, to, "box capacity changed");
        self.event_log.push(WorldEvent::CapacityChanged { from, to });
    }

    /// Advance the simulation by one frame of length `dt`.
    pub fn step(&mut self, dt: Duration) {
        let _span = tracing::info_span!("world_step", frame = self.frame).entered();
        self.frame += 1;
        self.clock += dt;

        self.helicopter.step(self.intent, &self.tuning);
        for slot in self.boxes.step(self.clock, &self.tuning) {
            tracing::debug!(slot, "box expired");
            self.event_log.push(WorldEvent::BoxExpired { slot });
        }
    }

    /// Drain and return the event log.
    pub fn drain_events(&mut self) -> Vec<WorldEvent> {
        std::mem::take(&mut self.event_log)
    }

    pub fn events(&self) -> &[WorldEvent] {
        &self.event_log
    }

    /// Deterministic FNV-1a hash over the helicopter and every active box.
    pub fn state_hash(&self) -> u64 {
        let mut h: u64 = 0xcbf2_9ce4_8422_2325;
        let mut mix = |bytes: &[u8]| {
            for &b in bytes {
                h ^= b as u64;
                h = h.wrapping_mul(0x0100_0000_01b3);
            }
        };
        let heli = &self.helicopter;
        mix(&self.frame.to_le_bytes());
        mix(&(self.clock.as_nanos() as u64).to_le_bytes());
        for v in [
            heli.height,
            heli.speed,
            heli.heading_deg,
            heli.tilt_deg,
            heli.propeller_deg,
            heli.propeller_speed,
        ] {
            mix(&v.to_le_bytes());
        }
        for (slot, b) in self.boxes.iter() {
            mix(&(slot as u64).to_le_bytes());
            for v in [b.height, b.vertical_speed, b.drift_speed, b.drift_distance] {
                mix(&v.to_le_bytes());
            }
        }
        h
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FRAME: Duration = Duration::from_millis(20);

    fn climb_to(world: &mut World, height: f32) {
        world.set_vertical_intent(VerticalIntent::Ascend);
        while world.helicopter().height < height {
            world.step(FRAME);
        }
        world.set_vertical_intent(VerticalIntent::Hold);
    }

    #[test]
    fn world_starts_landed() {
        let w = World::default();
        assert_eq!(w.frame(), 0);
        assert_eq!(w.clock(), Duration::ZERO);
        assert!(w.helicopter().is_grounded(w.tuning()));
        assert_eq!(w.boxes().capacity(), 10);
        assert_eq!(w.boxes().active_count(), 0);
    }

    #[test]
    fn step_advances_clock_and_frame() {
        let mut w = World::default();
        w.step(FRAME);
        w.step(FRAME);
        assert_eq!(w.frame(), 2);
        assert_eq!(w.clock(), Duration::from_millis(40));
    }

    #[test]
    fn release_on_ground_is_rejected_and_logged() {
        let mut w = World::default();
        assert_eq!(w.release_box(), ReleaseOutcome::TooLow);
        assert_eq!(w.boxes().active_count(), 0);
        assert_eq!(
            w.events(),
            &[WorldEvent::ReleaseRejected {
                outcome: ReleaseOutcome::TooLow
            }]
        );
    }

    #[test]
    fn released_box_expires_after_lifetime() {
        let mut w = World::default();
        climb_to(&mut w, 10.0);
        w.drain_events();

        assert_eq!(w.release_box(), ReleaseOutcome::Released { slot: 0 });
        for _ in 0..249 {
            w.step(FRAME);
        }
        assert_eq!(w.boxes().active_count(), 1);
        w.step(FRAME);
        assert_eq!(w.boxes().active_count(), 0);
        let events = w.drain_events();
        assert!(matches!(events[0], WorldEvent::BoxReleased { slot: 0, .. }));
        assert_eq!(events.last(), Some(&WorldEvent::BoxExpired { slot: 0 }));
    }

    #[test]
    fn release_event_carries_the_box_origin() {
        let mut w = World::default();
        climb_to(&mut w, 10.0);
        w.drain_events();
        assert_eq!(w.release_box(), ReleaseOutcome::Released { slot: 0 });
        let origin = w.boxes().get(0).unwrap().origin;
        assert_eq!(w.events(), &[WorldEvent::BoxReleased { slot: 0, origin }]);
        let heli = w.helicopter().position;
        assert_eq!(origin.y, heli.y - w.tuning().release_drop);
    }

    #[test]
    fn single_slot_rejects_second_release() {
        let mut w = World::new(Tuning {
            max_boxes: 1,
            ..Tuning::default()
        });
        climb_to(&mut w, 10.0);
        assert_eq!(w.release_box(), ReleaseOutcome::Released { slot: 0 });
        assert_eq!(w.release_box(), ReleaseOutcome::NoFreeSlot);
        assert_eq!(w.boxes().active_count(), 1);
    }

    #[test]
    fn capacity_change_is_clamped_and_logged() {
        let mut w = World::default();
        w.set_max_boxes(10_000);
        assert_eq!(w.boxes().capacity(), MAX_BOX_SLOTS);
        assert_eq!(w.tuning().max_boxes, MAX_BOX_SLOTS);
        assert_eq!(
            w.events(),
            &[WorldEvent::CapacityChanged {
                from: 10,
                to: MAX_BOX_SLOTS
            }]
        );
        w.set_max_boxes(MAX_BOX_SLOTS);
        assert_eq!(w.events().len(), 1);
    }

    #[test]
    fn intents_drive_the_helicopter() {
        let mut w = World::default();
        w.set_vertical_intent(VerticalIntent::Ascend);
        w.set_moving(true);
        w.step(FRAME);
        assert!(w.helicopter().height > w.tuning().min_height);
        assert!(w.helicopter().speed > 0.0);
        assert_eq!(
            w.intent(),
            FlightIntent {
                vertical: VerticalIntent::Ascend,
                moving: true
            }
        );
    }

    #[test]
    fn state_hash_is_deterministic() {
        let mut a = World::default();
        let mut b = World::default();
        for w in [&mut a, &mut b] {
            climb_to(w, 8.0);
            w.set_moving(true);
            w.release_box();
            for _ in 0..30 {
                w.step(FRAME);
            }
        }
        assert_eq!(a.state_hash(), b.state_hash());
        a.step(FRAME);
        assert_ne!(a.state_hash(), b.state_hash());
    }

    #[test]
    fn serde_round_trip_keeps_state_but_not_events() {
        let mut w = World::default();
        climb_to(&mut w, 6.0);
        w.release_box();
        let json = serde_json::to_string(&w).unwrap();
        let back: World = serde_json::from_str(&json).unwrap();
        assert_eq!(back.state_hash(), w.state_hash());
        assert!(back.events().is_empty());
    }
}
