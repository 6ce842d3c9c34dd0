//! 注释工具

use crate::tool::{
    MouseButton, PointerEvent, Preview, PreviewContext, PreviewShape, Tool, ToolContext,
    ToolKind, ToolOutcome,
};
use hvacad_core::entity::{Entity, NoteProps};
use hvacad_core::math::Point2;
use tracing::debug;

const DEFAULT_CONTENT: &str = "Note";

pub struct NoteTool {
    hover: Option<Point2>,
}

impl NoteTool {
    pub fn new() -> Self {
        Self { hover: None }
    }
}

impl Default for NoteTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for NoteTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Note
    }

    fn reset(&mut self) {
        self.hover = None;
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        if event.button != MouseButton::Left {
            return ToolOutcome::Continue;
        }
        let point = ctx.snap(event.position);
        let props = NoteProps {
            content: DEFAULT_CONTENT.to_string(),
            ..Default::default()
        };
        match ctx.document.create_entity(Entity::note(point.x, point.y, props)) {
            Ok(id) => {
                ctx.selection.set([id]);
                ToolOutcome::Committed(vec![id])
            }
            Err(err) => {
                debug!("Note rejected: {}", err);
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
        "Click to place a note"
    }

    fn render_preview(&self, _ctx: &PreviewContext) -> Vec<Preview> {
        self.hover
            .map(|position| {
                Preview::reference(PreviewShape::Label {
                    position,
                    text: DEFAULT_CONTENT.to_string(),
                })
            })
            .into_iter()
            .collect()
    }
}
