use glam::{Mat4, Vec3};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::Tuning;
use crate::helicopter::Helicopter;

/// A box dropped from the helicopter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FallingBox {
    /// Helicopter position at release, lowered by the release drop.
    pub origin: Vec3,
    pub heading_at_release: f32,
    pub vertical_speed: f32,
    pub drift_speed: f32,
    /// Degrees travelled along the flight path since release.
    pub drift_distance: f32,
    pub height: f32,
    pub expires_at: Duration,
}

impl FallingBox {
    pub fn is_resting(&self, tuning: &Tuning) -> bool {
        self.height <= tuning.min_box_height
    }

    /// Current world position: the release point carried along the orbit by
    /// the accumulated drift, at the current height.
    pub fn position(&self) -> Vec3 {
        Mat4::from_rotation_y(self.drift_distance.to_radians())
            .transform_point3(Vec3::new(self.origin.x, self.height, self.origin.z))
    }

    fn step(&mut self, tuning: &Tuning) {
        if self.is_resting(tuning) {
            return;
        }
        self.vertical_speed *= tuning.gravitational_acceleration;
        self.drift_speed *= tuning.air_friction;
        self.drift_distance += self.drift_speed;
        self.height = (self.height - self.vertical_speed).max(tuning.min_box_height);
    }
}

/// Result of a release attempt. Rejections are silent policy no-ops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReleaseOutcome {
    Released { slot: usize },
    TooLow,
    NoFreeSlot,
}

/// Fixed-capacity slots for boxes in flight.
///
/// Releases only look at slots below `capacity`. Shrinking the capacity never
/// evicts a box: boxes living at or beyond the new bound keep simulating until
/// they expire, and their slots are dropped once empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BoxSlots {
    slots: Vec<Option<FallingBox>>,
    capacity: usize,
}

impl BoxSlots {
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: vec![None; capacity],
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    pub fn get(&self, slot: usize) -> Option<&FallingBox> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    /// Active boxes in ascending slot order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &FallingBox)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|b| (i, b)))
    }

    /// Lowest free slot below the capacity.
    pub fn free_slot(&self) -> Option<usize> {
        (0..self.capacity).find(|&i| self.slots.get(i).is_none_or(Option::is_none))
    }

    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity;
        if self.slots.len() < capacity {
            self.slots.resize(capacity, None);
        }
        self.trim();
    }

    /// Drop a box below the helicopter if it is high enough and a slot is free.
    pub fn release(&mut self, heli: &Helicopter, now: Duration, tuning: &Tuning) -> ReleaseOutcome {
        if heli.height < tuning.release_min_height {
            return ReleaseOutcome::TooLow;
        }
        let Some(slot) = self.free_slot() else {
            return ReleaseOutcome::NoFreeSlot;
        };
        let origin = heli.position - Vec3::new(0.0, tuning.release_drop, 0.0);
        self.slots[slot] = Some(FallingBox {
            origin,
            heading_at_release: heli.heading_deg,
            vertical_speed: tuning.initial_box_speed,
            drift_speed: heli.speed,
            drift_distance: 0.0,
            height: origin.y,
            expires_at: now + Duration::from_millis(tuning.box_lifetime_ms),
        });
        ReleaseOutcome::Released { slot }
    }

    /// Remove expired boxes, then advance the rest. Returns the expired slots.
    pub fn step(&mut self, now: Duration, tuning: &Tuning) -> Vec<usize> {
        let mut expired = Vec::new();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.is_some_and(|b| now >= b.expires_at) {
                *slot = None;
                expired.push(i);
            }
            if let Some(b) = slot.as_mut() {
                b.step(tuning);
            }
        }
        self.trim();
        expired
    }

    fn trim(&mut self) {
        while self.slots.len() > self.capacity && matches!(self.slots.last(), Some(None)) {
            self.slots.pop();
        }
    }
}
