//! 风管工具
//!
//! 按下确定起点，松开确定终点。长度不足时只在预览中标红，不创建实体。
//! 创建成功后通知连接检测协作方。

use crate::tool::{
    MouseButton, PointerEvent, Preview, PreviewContext, PreviewShape, Tool, ToolContext,
    ToolKind, ToolOutcome,
};
use hvacad_core::entity::{DuctProps, DuctShape, Entity, EntityType};
use hvacad_core::math::Point2;
use tracing::debug;

/// 风管最小绘制长度（英寸）
pub const MIN_DUCT_LENGTH: f64 = 12.0;

const DEFAULT_SIZE: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Idle,
    Drawing { start: Point2, current: Point2 },
}

pub struct DuctTool {
    status: Status,
    shape: DuctShape,
}

impl DuctTool {
    pub fn new() -> Self {
        Self {
            status: Status::Idle,
            shape: DuctShape::Round,
        }
    }

    pub fn with_shape(mut self, shape: DuctShape) -> Self {
        self.shape = shape;
        self
    }

    pub fn shape(&self) -> DuctShape {
        self.shape
    }

    pub fn set_shape(&mut self, shape: DuctShape) {
        self.shape = shape;
    }

    pub fn is_drawing(&self) -> bool {
        matches!(self.status, Status::Drawing { .. })
    }

    fn props(&self) -> DuctProps {
        match self.shape {
            DuctShape::Round => DuctProps::round(DEFAULT_SIZE),
            DuctShape::Rectangular => DuctProps::rectangular(DEFAULT_SIZE, DEFAULT_SIZE),
        }
    }
}

impl Default for DuctTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for DuctTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Duct
    }

    fn reset(&mut self) {
        self.status = Status::Idle;
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        match event.button {
            MouseButton::Left => {
                let point = ctx.snap(event.position);
                self.status = Status::Drawing {
                    start: point,
                    current: point,
                };
                ToolOutcome::Continue
            }
            MouseButton::Right if self.is_drawing() => {
                self.reset();
                ToolOutcome::Cancelled
            }
            _ => ToolOutcome::Continue,
        }
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        let point = ctx.snap(event.position);
        if let Status::Drawing { current, .. } = &mut self.status {
            *current = point;
        }
        ToolOutcome::Continue
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        let Status::Drawing { start, .. } = self.status else {
            return ToolOutcome::Continue;
        };
        if event.button != MouseButton::Left {
            return ToolOutcome::Continue;
        }
        self.status = Status::Idle;

        let end = ctx.snap(event.position);
        let delta = end - start;
        let length = delta.norm();
        if length < MIN_DUCT_LENGTH {
            debug!("Duct too short ({:.1} in), nothing created", length);
            return ToolOutcome::Rejected;
        }

        let rotation = delta.y.atan2(delta.x).to_degrees();
        let props = DuctProps {
            name: ctx.document.peek_name(EntityType::Duct),
            length: length / 12.0,
            ..self.props()
        };
        match ctx.document.create_entity(Entity::duct(start.x, start.y, rotation, props)) {
            Ok(id) => {
                ctx.document.next_name(EntityType::Duct);
                ctx.document.notify_duct_committed(id);
                ctx.selection.set([id]);
                ToolOutcome::Committed(vec![id])
            }
            Err(err) => {
                debug!("Duct rejected: {}", err);
                ToolOutcome::Rejected
            }
        }
    }

    fn prompt(&self) -> &str {
        match self.status {
            Status::Idle => "Press to start a duct",
            Status::Drawing { .. } => "Release at the duct end point",
        }
    }

    fn render_preview(&self, _ctx: &PreviewContext) -> Vec<Preview> {
        let Status::Drawing { start, current } = self.status else {
            return vec![];
        };
        let length = (current - start).norm();
        vec![
            Preview::new(PreviewShape::Line {
                start,
                end: current,
            })
            .with_valid(length >= MIN_DUCT_LENGTH),
            Preview::reference(PreviewShape::Label {
                position: current,
                text: format!("{:.1} ft", length / 12.0),
            }),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use hvacad_core::document::Document;

    #[test]
    fn test_draw_duct_sets_length_and_rotation() {
        let mut doc = Document::default();
        let mut selection = Selection::new();
        let mut ctx = ToolContext::new(&mut doc, &mut selection);
        let mut tool = DuctTool::new();

        tool.on_pointer_down(&mut ctx, &PointerEvent::left(0.0, 0.0));
        tool.on_pointer_move(&mut ctx, &PointerEvent::left(0.0, 50.0));
        let outcome = tool.on_pointer_up(&mut ctx, &PointerEvent::left(1.0, 119.0));
        let id = outcome.committed_ids()[0];

        let entity = doc.get(id).unwrap();
        let duct = entity.as_duct().unwrap();
        assert_eq!(duct.props.length, 10.0);
        assert_eq!(duct.props.name, "Duct 1");
        assert_eq!(duct.props.diameter, Some(12.0));
        assert!((entity.transform.rotation - 90.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_duct_is_rejected() {
        let mut doc = Document::default();
        let mut selection = Selection::new();
        let mut ctx = ToolContext::new(&mut doc, &mut selection);
        let mut tool = DuctTool::new().with_shape(DuctShape::Rectangular);

        tool.on_pointer_down(&mut ctx, &PointerEvent::left(0.0, 0.0));
        tool.on_pointer_move(&mut ctx, &PointerEvent::left(4.0, 0.0));
        let previews = tool.render_preview(&PreviewContext {
            document: &*ctx.document,
            selection: &*ctx.selection,
        });
        assert!(!previews[0].valid);

        assert_eq!(
            tool.on_pointer_up(&mut ctx, &PointerEvent::left(5.0, 0.0)),
            ToolOutcome::Rejected
        );
        assert!(!tool.is_drawing());
        assert!(doc.store().is_empty());
        assert!(!doc.can_undo());
    }

    #[test]
    fn test_rejected_duct_keeps_name_sequence() {
        let mut doc = Document::default();
        let mut selection = Selection::new();
        let mut ctx = ToolContext::new(&mut doc, &mut selection);
        let mut tool = DuctTool::new();

        // 超过 1000 ft
        tool.on_pointer_down(&mut ctx, &PointerEvent::left(0.0, 0.0));
        assert_eq!(
            tool.on_pointer_up(&mut ctx, &PointerEvent::left(12024.0, 0.0)),
            ToolOutcome::Rejected
        );
        assert!(!tool.is_drawing());

        tool.on_pointer_down(&mut ctx, &PointerEvent::left(0.0, 0.0));
        let outcome = tool.on_pointer_up(&mut ctx, &PointerEvent::left(240.0, 0.0));
        let id = outcome.committed_ids()[0];
        assert_eq!(doc.get(id).unwrap().as_duct().unwrap().props.name, "Duct 1");
        assert_eq!(doc.peek_name(EntityType::Duct), "Duct 2");
    }
}
