use helicity_common::FillMode;
use helicity_kernel::World;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::frame::ViewState;
use crate::registry::DrawList;

/// Plain-data summary of one rendered frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameSnapshot {
    pub frame: u64,
    pub clock_ms: u128,
    pub camera: &'static str,
    pub fill: FillMode,
    pub paused: bool,
    pub time_scale: f32,
    pub helicopter: HelicopterSnapshot,
    pub box_capacity: usize,
    pub boxes: Vec<BoxSnapshot>,
    /// Draw calls per primitive name.
    pub draws: BTreeMap<&'static str, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HelicopterSnapshot {
    pub height: f32,
    pub speed: f32,
    pub heading_deg: f32,
    pub tilt_deg: f32,
    pub propeller_speed: f32,
    pub position: [f32; 3],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoxSnapshot {
    pub slot: usize,
    pub position: [f32; 3],
    pub resting: bool,
}

impl FrameSnapshot {
    pub fn capture(world: &World, view: &ViewState, draws: &DrawList) -> Self {
        let heli = world.helicopter();
        let tuning = world.tuning();
        Self {
            frame: world.frame(),
            clock_ms: world.clock().as_millis(),
            camera: view.camera.mode().label(),
            fill: view.fill,
            paused: view.paused,
            time_scale: view.time_scale,
            helicopter: HelicopterSnapshot {
                height: heli.height,
                speed: heli.speed,
                heading_deg: heli.heading_deg,
                tilt_deg: heli.tilt_deg,
                propeller_speed: heli.propeller_speed,
                position: heli.position.to_array(),
            },
            box_capacity: world.boxes().capacity(),
            boxes: world
                .boxes()
                .iter()
                .map(|(slot, b)| BoxSnapshot {
                    slot,
                    position: b.position().to_array(),
                    resting: b.is_resting(tuning),
                })
                .collect(),
            draws: draws
                .counts_by_kind()
                .into_iter()
                .map(|(kind, n)| (kind.name(), n))
                .collect(),
        }
    }

    pub fn total_draws(&self) -> usize {
        self.draws.values().sum()
    }
}

/// Renderer-agnostic interface over a captured frame.
///
/// A renderer reads a snapshot and produces output. It never sees the world.
pub trait Renderer {
    /// The output type produced by this renderer.
    type Output;

    fn render(&self, frame: &FrameSnapshot) -> Self::Output;
}

/// Human-readable frame report for the CLI and logs.
#[derive(Debug, Default)]
pub struct DebugTextRenderer;

impl DebugTextRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl Renderer for DebugTextRenderer {
    type Output = String;

    fn render(&self, frame: &FrameSnapshot) -> String {
        let mut out = String::new();
        let h = &frame.helicopter;
        let pace = if frame.paused {
            "paused".to_string()
        } else {
            format!("x{:.2}", frame.time_scale)
        };
        out.push_str(&format!(
            "=== Frame {} (t={} ms, camera={}, fill={:?}, {pace}) ===\n",
            frame.frame, frame.clock_ms, frame.camera, frame.fill
        ));
        out.push_str(&format!(
            "Helicopter: height={:.2} speed={:.2} heading={:.1} tilt={:.1} rotor={:.0} pos=({:.2}, {:.2}, {:.2})\n",
            h.height,
            h.speed,
            h.heading_deg,
            h.tilt_deg,
            h.propeller_speed,
            h.position[0],
            h.position[1],
            h.position[2]
        ));
        out.push_str(&format!("Boxes: {}/{}\n", frame.boxes.len(), frame.box_capacity));
        for b in &frame.boxes {
            out.push_str(&format!(
                "  [{}] pos=({:.2}, {:.2}, {:.2}){}\n",
                b.slot,
                b.position[0],
                b.position[1],
                b.position[2],
                if b.resting { " resting" } else { "" }
            ));
        }
        out.push_str(&format!("Draws: {}", frame.total_draws()));
        for (name, n) in &frame.draws {
            out.push_str(&format!(" {name}={n}"));
        }
        out.push('\n');
        out
    }
}
