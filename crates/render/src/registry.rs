use glam::Mat4;
use helicity_common::{Color, FillMode, ShapeKind};
use std::collections::{BTreeMap, BTreeSet};

/// The seam between scene traversal and whatever actually draws.
///
/// `draw` uses the model matrix and color most recently uploaded. Callers set
/// the color before every draw; implementations do not reset it.
pub trait PrimitiveRegistry {
    /// Make `kind` drawable. Idempotent.
    fn init_primitive(&mut self, kind: ShapeKind);

    fn set_color(&mut self, color: Color);

    fn upload_model(&mut self, model: &Mat4);

    /// Draw `kind` with the current model matrix and color. A kind that was
    /// never initialised is skipped.
    fn draw(&mut self, kind: ShapeKind, fill: FillMode);

    /// Start a new frame, discarding last frame's draws.
    fn begin_frame(&mut self) {}
}

/// One recorded draw.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawCommand {
    pub kind: ShapeKind,
    pub fill: FillMode,
    pub model: Mat4,
    pub color: Color,
}

/// A [`PrimitiveRegistry`] that records draws instead of issuing them.
///
/// Headless runs and tests inspect it directly; the GPU backend consumes it
/// once per frame.
#[derive(Debug, Clone)]
pub struct DrawList {
    initialized: BTreeSet<ShapeKind>,
    model: Mat4,
    color: Color,
    commands: Vec<DrawCommand>,
    skipped: usize,
}

impl Default for DrawList {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawList {
    pub fn new() -> Self {
        Self {
            initialized: BTreeSet::new(),
            model: Mat4::IDENTITY,
            color: Color::WHITE,
            commands: Vec::new(),
            skipped: 0,
        }
    }

    /// A list with every primitive kind already initialised.
    pub fn with_all_primitives() -> Self {
        let mut list = Self::new();
        for kind in ShapeKind::ALL {
            list.init_primitive(kind);
        }
        list
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Draws dropped this frame because their kind was not initialised.
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn is_initialized(&self, kind: ShapeKind) -> bool {
        self.initialized.contains(&kind)
    }

    /// Number of recorded draws per primitive kind.
    pub fn counts_by_kind(&self) -> BTreeMap<ShapeKind, usize> {
        let mut counts = BTreeMap::new();
        for cmd in &self.commands {
            *counts.entry(cmd.kind).or_insert(0) += 1;
        }
        counts
    }
}

impl PrimitiveRegistry for DrawList {
    fn init_primitive(&mut self, kind: ShapeKind) {
        if self.initialized.insert(kind) {
            tracing::debug!(kind = kind.name(), "primitive initialised");
        }
    }

    fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    fn upload_model(&mut self, model: &Mat4) {
        self.model = *model;
    }

    fn draw(&mut self, kind: ShapeKind, fill: FillMode) {
        if !self.initialized.contains(&kind) {
            tracing::warn!(kind = kind.name(), "draw of uninitialised primitive skipped");
            self.skipped += 1;
            return;
        }
        self.commands.push(DrawCommand {
            kind,
            fill,
            model: self.model,
            color: self.color,
        });
    }

    fn begin_frame(&mut self) {
        self.commands.clear();
        self.skipped = 0;
    }
}
