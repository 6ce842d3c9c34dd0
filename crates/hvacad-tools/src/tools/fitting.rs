//! 管件工具 - 单击放置

use crate::tool::{
    MouseButton, PointerEvent, Preview, PreviewContext, PreviewShape, Tool, ToolContext,
    ToolKind, ToolOutcome,
};
use hvacad_core::entity::{Entity, FittingProps, FittingType};
use hvacad_core::math::Point2;
use tracing::debug;

const MARKER_SIZE: f64 = 30.0;

pub struct FittingTool {
    fitting_type: FittingType,
    hover: Option<Point2>,
}

impl FittingTool {
    pub fn new() -> Self {
        Self {
            fitting_type: FittingType::Elbow90,
            hover: None,
        }
    }

    pub fn with_type(mut self, fitting_type: FittingType) -> Self {
        self.fitting_type = fitting_type;
        self
    }

    pub fn fitting_type(&self) -> FittingType {
        self.fitting_type
    }

    pub fn set_fitting_type(&mut self, fitting_type: FittingType) {
        self.fitting_type = fitting_type;
    }
}

impl Default for FittingTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for FittingTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Fitting
    }

    fn reset(&mut self) {
        self.hover = None;
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        if event.button != MouseButton::Left {
            return ToolOutcome::Continue;
        }
        let point = ctx.snap(event.position);
        let entity = Entity::fitting(point.x, point.y, FittingProps::new(self.fitting_type));
        match ctx.document.create_entity(entity) {
            Ok(id) => {
                ctx.selection.set([id]);
                ToolOutcome::Committed(vec![id])
            }
            Err(err) => {
                debug!("Fitting rejected: {}", err);
                ToolOutcome::Rejected
            }
        }
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        self.hover = Some(ctx.snap(event.position));
        ToolOutcome::Continue
    }

    fn on_pointer_up(&mut self, _ctx: &mut ToolContext, _event: &PointerEvent) -> ToolOutcome {
        ToolOutcome::Continue
    }

    fn prompt(&self) -> &str {
        "Click to place a fitting"
    }

    fn render_preview(&self, _ctx: &PreviewContext) -> Vec<Preview> {
        self.hover
            .map(|position| {
                Preview::reference(PreviewShape::Marker {
                    position,
                    size: MARKER_SIZE,
                })
            })
            .into_iter()
            .collect()
    }
}
