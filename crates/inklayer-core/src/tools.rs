//! Tool selection and per-tool paint presets.

use crate::eraser::EraserMode;
use crate::stroke::{BlendMode, PaintStyle, SerializableColor, StrokePaint};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ToolKind {
    #[default]
    Pen,
    Marker,
    Eraser,
}

/// Default eraser diameter in page units.
pub const DEFAULT_ERASER_WIDTH: f64 = 20.0;

/// Current tool plus the paint presets each drawing tool commits with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSettings {
    pub active: ToolKind,
    /// Paint applied by the pen tool.
    pub pen: StrokePaint,
    /// Paint applied by the marker tool.
    pub marker: StrokePaint,
    /// Eraser diameter in page units.
    pub eraser_width: f64,
    pub eraser_mode: EraserMode,
}

impl Default for ToolSettings {
    fn default() -> Self {
        Self {
            active: ToolKind::Pen,
            pen: StrokePaint::default(),
            marker: StrokePaint {
                color: SerializableColor::new(255, 220, 0, 255),
                width: 12.0,
                opacity: 0.5,
                blend: BlendMode::Multiply,
                style: PaintStyle::Solid,
            },
            eraser_width: DEFAULT_ERASER_WIDTH,
            eraser_mode: EraserMode::default(),
        }
    }
}

impl ToolSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_tool(&mut self, tool: ToolKind) {
        self.active = tool;
    }

    /// The paint the active tool draws with; the eraser draws nothing.
    pub fn active_paint(&self) -> Option<&StrokePaint> {
        match self.active {
            ToolKind::Pen => Some(&self.pen),
            ToolKind::Marker => Some(&self.marker),
            ToolKind::Eraser => None,
        }
    }
}
