//! 房间工具
//!
//! 拖动绘制矩形房间；拖动太小时转为两点模式，等待第二次点击确认对角点。

use crate::tool::{
    MouseButton, PointerEvent, Preview, PreviewContext, PreviewShape, Tool, ToolContext,
    ToolKind, ToolOutcome,
};
use hvacad_core::entity::{Entity, EntityType, RoomProps};
use hvacad_core::math::{BoundingBox2, Point2};
use tracing::debug;

/// 房间最小尺寸（英寸）
pub const MIN_ROOM_SIZE: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
enum Status {
    Idle,
    /// 按住拖动中
    Dragging { start: Point2, current: Point2 },
    /// 两点模式，等待第二角点
    Placing { start: Point2, current: Point2 },
}

pub struct RoomTool {
    status: Status,
}

impl RoomTool {
    pub fn new() -> Self {
        Self {
            status: Status::Idle,
        }
    }

    pub fn is_placing(&self) -> bool {
        matches!(self.status, Status::Placing { .. })
    }

    fn is_large_enough(rect: &BoundingBox2) -> bool {
        rect.width() >= MIN_ROOM_SIZE && rect.height() >= MIN_ROOM_SIZE
    }

    fn commit(&mut self, ctx: &mut ToolContext, rect: BoundingBox2) -> ToolOutcome {
        let props = RoomProps {
            name: ctx.document.peek_name(EntityType::Room),
            width: rect.width(),
            length: rect.height(),
            ..Default::default()
        };
        let created = ctx.document.create_entity(Entity::room(rect.min.x, rect.min.y, props));
        self.status = Status::Idle;
        match created {
            Ok(id) => {
                ctx.document.next_name(EntityType::Room);
                ctx.selection.set([id]);
                ToolOutcome::Committed(vec![id])
            }
            Err(err) => {
                debug!("Room rejected: {}", err);
                ToolOutcome::Rejected
            }
        }
    }
}

impl Default for RoomTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for RoomTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Room
    }

    fn reset(&mut self) {
        self.status = Status::Idle;
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        if event.button == MouseButton::Right {
            let active = self.status != Status::Idle;
            self.reset();
            return if active {
                ToolOutcome::Cancelled
            } else {
                ToolOutcome::Continue
            };
        }
        if event.button != MouseButton::Left {
            return ToolOutcome::Continue;
        }

        let point = ctx.snap(event.position);
        match self.status {
            Status::Idle => {
                self.status = Status::Dragging {
                    start: point,
                    current: point,
                };
                ToolOutcome::Continue
            }
            Status::Placing { start, .. } => {
                let rect = BoundingBox2::from_corners(start, point);
                if !Self::is_large_enough(&rect) {
                    debug!(
                        "Room too small ({}x{}), waiting for another corner",
                        rect.width(),
                        rect.height()
                    );
                    self.status = Status::Placing {
                        start,
                        current: point,
                    };
                    return ToolOutcome::Rejected;
                }
                self.commit(ctx, rect)
            }
            Status::Dragging { .. } => ToolOutcome::Continue,
        }
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        let point = ctx.snap(event.position);
        match &mut self.status {
            Status::Dragging { current, .. } | Status::Placing { current, .. } => {
                *current = point;
            }
            Status::Idle => {}
        }
        ToolOutcome::Continue
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        let Status::Dragging { start, .. } = self.status else {
            return ToolOutcome::Continue;
        };
        if event.button != MouseButton::Left {
            return ToolOutcome::Continue;
        }
        let point = ctx.snap(event.position);
        let rect = BoundingBox2::from_corners(start, point);
        if Self::is_large_enough(&rect) {
            return self.commit(ctx, rect);
        }
        self.status = Status::Placing {
            start,
            current: point,
        };
        ToolOutcome::Continue
    }

    fn prompt(&self) -> &str {
        match self.status {
            Status::Idle => "Drag to draw a room, or click the first corner",
            Status::Dragging { .. } => "Release to place the room",
            Status::Placing { .. } => "Click the opposite corner [Esc to cancel]",
        }
    }

    fn render_preview(&self, _ctx: &PreviewContext) -> Vec<Preview> {
        match self.status {
            Status::Idle => vec![],
            Status::Dragging { start, current } | Status::Placing { start, current } => {
                let rect = BoundingBox2::from_corners(start, current);
                let label = Preview::reference(PreviewShape::Label {
                    position: rect.center(),
                    text: format!("{:.0}\" x {:.0}\"", rect.width(), rect.height()),
                });
                vec![
                    Preview::new(PreviewShape::Rectangle(rect)).with_valid(Self::is_large_enough(&rect)),
                    label,
                ]
            }
        }
    }
}
