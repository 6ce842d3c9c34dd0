//! 选择工具
//!
//! 点选、Shift 加选、框选，以及拖动移动。拖动过程中直接写入存储以保证响应，
//! 松开时把整体位移折叠为一条移动命令；Escape 原样恢复拖动前的实体。
//!
//! 框选方向：从左向右为窗口选择（完全包含），从右向左为交叉选择（相交即选）。

use crate::tool::{
    Key, KeyEvent, MouseButton, PointerEvent, Preview, PreviewContext, PreviewShape, Tool,
    ToolContext, ToolKind, ToolOutcome,
};
use chrono::Utc;
use hvacad_core::command::{Command, EntityChange};
use hvacad_core::entity::{Entity, EntityId};
use hvacad_core::math::{BoundingBox2, Point2, Vector2};
use tracing::debug;

/// Ctrl+D 复制的偏移量（英寸）
pub const DUPLICATE_OFFSET: f64 = 24.0;

/// 点击与框选的区分阈值
const CLICK_TOLERANCE: f64 = 2.0;

const NUDGE_STEP: f64 = 1.0;
const NUDGE_STEP_LARGE: f64 = 12.0;

#[derive(Debug, Clone, PartialEq)]
enum Status {
    Idle,
    /// 拖动移动；`initial` 为手势开始前的实体快照
    Dragging {
        anchor: Point2,
        initial: Vec<Entity>,
        delta: Vector2,
    },
    /// 框选
    Marquee {
        start: Point2,
        current: Point2,
        additive: bool,
    },
}

pub struct SelectTool {
    status: Status,
}

impl SelectTool {
    pub fn new() -> Self {
        Self {
            status: Status::Idle,
        }
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.status, Status::Dragging { .. })
    }

    pub fn is_marquee_selecting(&self) -> bool {
        matches!(self.status, Status::Marquee { .. })
    }

    /// 当前框选范围
    pub fn marquee(&self) -> Option<BoundingBox2> {
        match self.status {
            Status::Marquee { start, current, .. } => Some(BoundingBox2::from_corners(start, current)),
            _ => None,
        }
    }

    /// 撤销未完成的拖动，存储恢复到手势开始前
    fn revert_drag(&mut self, ctx: &mut ToolContext) -> bool {
        match std::mem::replace(&mut self.status, Status::Idle) {
            Status::Dragging { initial, .. } => {
                ctx.document.restore_entities(initial);
                true
            }
            _ => false,
        }
    }

    fn finish_drag(ctx: &mut ToolContext, initial: Vec<Entity>, delta: Vector2) -> ToolOutcome {
        if delta.x == 0.0 && delta.y == 0.0 {
            ctx.document.restore_entities(initial);
            return ToolOutcome::Continue;
        }
        let changes: Vec<EntityChange> = initial
            .into_iter()
            .filter_map(|previous| {
                let next = ctx.document.get(previous.id)?.clone();
                Some(EntityChange { previous, next })
            })
            .collect();
        let ids: Vec<EntityId> = changes.iter().map(EntityChange::id).collect();
        let label = if ids.len() == 1 {
            "Move entity".to_string()
        } else {
            format!("Move {} entities", ids.len())
        };
        ctx.document.record_applied(Command::move_entities(label, changes));
        ToolOutcome::Committed(ids)
    }

    fn finish_marquee(ctx: &mut ToolContext, start: Point2, end: Point2, additive: bool) -> ToolOutcome {
        let area = BoundingBox2::from_corners(start, end);
        if area.width() < CLICK_TOLERANCE && area.height() < CLICK_TOLERANCE {
            // 空白处单击
            if !additive {
                ctx.selection.clear();
            }
            return ToolOutcome::Continue;
        }
        let store = ctx.document.store();
        let ids = if end.x >= start.x {
            store.query_contained(&area)
        } else {
            store.query_intersecting(&area)
        };
        debug!("Marquee selected {} entities", ids.len());
        if additive {
            ctx.selection.union(ids);
        } else {
            ctx.selection.set(ids);
        }
        ToolOutcome::Continue
    }

    fn delete_selection(ctx: &mut ToolContext) -> ToolOutcome {
        let ids = ctx.selection.ids().to_vec();
        if ids.is_empty() {
            return ToolOutcome::Continue;
        }
        let label = if ids.len() == 1 {
            "Delete entity".to_string()
        } else {
            format!("Delete {} entities", ids.len())
        };
        let removed = ctx.document.delete_entities(label, &ids);
        ctx.selection.clear();
        if removed == 0 {
            return ToolOutcome::Continue;
        }
        ToolOutcome::Committed(ids)
    }

    fn nudge_selection(ctx: &mut ToolContext, dx: f64, dy: f64) -> ToolOutcome {
        let ids = ctx.selection.ids().to_vec();
        if ctx.document.move_entities("Nudge", &ids, dx, dy) == 0 {
            return ToolOutcome::Continue;
        }
        ToolOutcome::Committed(ids)
    }

    fn duplicate_selection(ctx: &mut ToolContext) -> ToolOutcome {
        let now = Utc::now();
        let copies: Vec<Entity> = ctx
            .selection
            .ids()
            .iter()
            .filter_map(|id| ctx.document.get(*id))
            .map(|entity| {
                let mut copy = entity.clone().with_id(EntityId::new());
                copy.transform = entity.transform.translated(DUPLICATE_OFFSET, DUPLICATE_OFFSET);
                copy.created_at = now;
                copy.modified_at = now;
                copy
            })
            .collect();
        if copies.is_empty() {
            return ToolOutcome::Continue;
        }
        match ctx.document.create_entities("Duplicate", copies) {
            Ok(ids) => {
                ctx.selection.set(ids.iter().copied());
                ToolOutcome::Committed(ids)
            }
            Err(err) => {
                debug!("Duplicate rejected: {}", err);
                ToolOutcome::Rejected
            }
        }
    }
}

impl Default for SelectTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for SelectTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Select
    }

    fn deactivate(&mut self, ctx: &mut ToolContext) {
        self.revert_drag(ctx);
        self.reset();
    }

    fn reset(&mut self) {
        self.status = Status::Idle;
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        if event.button != MouseButton::Left || self.status != Status::Idle {
            return ToolOutcome::Continue;
        }
        let shift = event.modifiers.shift;

        match ctx.document.store().hit_test(&event.position) {
            Some(id) if shift => {
                ctx.selection.toggle(id);
            }
            Some(id) => {
                if !ctx.selection.contains(id) {
                    ctx.selection.set([id]);
                }
                let initial: Vec<Entity> = ctx
                    .selection
                    .ids()
                    .iter()
                    .filter_map(|id| ctx.document.get(*id).cloned())
                    .collect();
                self.status = Status::Dragging {
                    anchor: event.position,
                    initial,
                    delta: Vector2::zeros(),
                };
            }
            None => {
                self.status = Status::Marquee {
                    start: event.position,
                    current: event.position,
                    additive: shift,
                };
            }
        }
        ToolOutcome::Continue
    }

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        match &mut self.status {
            Status::Dragging {
                anchor,
                initial,
                delta,
            } => {
                let raw = event.position - *anchor;
                let snapped = ctx.snap(Point2::new(raw.x, raw.y));
                let next = Vector2::new(snapped.x, snapped.y);
                if next == *delta {
                    return ToolOutcome::Continue;
                }
                *delta = next;
                for entity in initial.iter() {
                    ctx.document
                        .preview_transform(entity.id, entity.transform.translated(next.x, next.y));
                }
            }
            Status::Marquee { current, .. } => {
                *current = event.position;
            }
            Status::Idle => {}
        }
        ToolOutcome::Continue
    }

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        if event.button != MouseButton::Left {
            return ToolOutcome::Continue;
        }
        match std::mem::replace(&mut self.status, Status::Idle) {
            Status::Dragging { initial, delta, .. } => Self::finish_drag(ctx, initial, delta),
            Status::Marquee {
                start, additive, ..
            } => Self::finish_marquee(ctx, start, event.position, additive),
            Status::Idle => ToolOutcome::Continue,
        }
    }

    fn on_key_down(&mut self, ctx: &mut ToolContext, event: &KeyEvent) -> ToolOutcome {
        if event.key == Key::Escape {
            let reverted = self.revert_drag(ctx);
            self.reset();
            ctx.selection.clear();
            debug!("Selection cancelled (drag reverted: {})", reverted);
            return ToolOutcome::Cancelled;
        }
        if self.status != Status::Idle {
            return ToolOutcome::Continue;
        }

        let step = if event.modifiers.shift {
            NUDGE_STEP_LARGE
        } else {
            NUDGE_STEP
        };
        match event.key {
            Key::Delete | Key::Backspace => Self::delete_selection(ctx),
            Key::ArrowLeft => Self::nudge_selection(ctx, -step, 0.0),
            Key::ArrowRight => Self::nudge_selection(ctx, step, 0.0),
            Key::ArrowUp => Self::nudge_selection(ctx, 0.0, -step),
            Key::ArrowDown => Self::nudge_selection(ctx, 0.0, step),
            Key::Char('d') | Key::Char('D') if event.modifiers.ctrl => Self::duplicate_selection(ctx),
            Key::Char('a') | Key::Char('A') if event.modifiers.ctrl => {
                let all = ctx.document.store().all_ids().to_vec();
                ctx.selection.set(all);
                ToolOutcome::Continue
            }
            _ => ToolOutcome::Continue,
        }
    }

    fn prompt(&self) -> &str {
        match self.status {
            Status::Idle => "Click to select, drag to move or box select",
            Status::Dragging { .. } => "Release to move [Esc to cancel]",
            Status::Marquee { .. } => "Release to select",
        }
    }

    fn render_preview(&self, ctx: &PreviewContext) -> Vec<Preview> {
        let mut previews: Vec<Preview> = ctx
            .selection
            .ids()
            .iter()
            .filter_map(|id| ctx.document.get(*id))
            .map(|entity| Preview::reference(PreviewShape::Rectangle(entity.bounds())))
            .collect();
        if let Some(area) = self.marquee() {
            previews.push(Preview::new(PreviewShape::Rectangle(area)));
        }
        previews
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::Selection;
    use hvacad_core::document::Document;
    use hvacad_core::entity::RoomProps;

    fn room(doc: &mut Document, x: f64, y: f64) -> EntityId {
        let props = RoomProps {
            width: 48.0,
            length: 48.0,
            ..Default::default()
        };
        doc.create_entity(Entity::room(x, y, props)).unwrap()
    }

    #[test]
    fn test_marquee_direction() {
        let mut doc = Document::default();
        let inside = room(&mut doc, 0.0, 0.0);
        let straddling = room(&mut doc, 80.0, 0.0);
        let mut selection = Selection::new();
        let mut ctx = ToolContext::new(&mut doc, &mut selection);
        let mut tool = SelectTool::new();

        // 左到右：只选完全包含的
        tool.on_pointer_down(&mut ctx, &PointerEvent::left(-10.0, -10.0));
        assert!(tool.is_marquee_selecting());
        tool.on_pointer_up(&mut ctx, &PointerEvent::left(100.0, 60.0));
        assert_eq!(ctx.selection.ids(), &[inside]);

        // 右到左：相交即选
        tool.on_pointer_down(&mut ctx, &PointerEvent::left(100.0, 60.0));
        tool.on_pointer_up(&mut ctx, &PointerEvent::left(-10.0, -10.0));
        assert_eq!(ctx.selection.ids(), &[inside, straddling]);

        // 空白处单击清空
        tool.on_pointer_down(&mut ctx, &PointerEvent::left(500.0, 500.0));
        tool.on_pointer_up(&mut ctx, &PointerEvent::left(500.0, 500.0));
        assert!(ctx.selection.is_empty());
    }

    #[test]
    fn test_escape_mid_drag_restores_exactly() {
        let mut doc = Document::default();
        let id = room(&mut doc, 0.0, 0.0);
        let before = doc.store().snapshot();
        let mut selection = Selection::new();
        let mut ctx = ToolContext::new(&mut doc, &mut selection);
        let mut tool = SelectTool::new();

        tool.on_pointer_down(&mut ctx, &PointerEvent::left(10.0, 10.0));
        assert!(tool.is_dragging());
        tool.on_pointer_move(&mut ctx, &PointerEvent::left(70.0, 35.0));
        assert_eq!(ctx.document.get(id).unwrap().transform.x, 60.0);

        assert_eq!(
            tool.on_key_down(&mut ctx, &KeyEvent::new(Key::Escape)),
            ToolOutcome::Cancelled
        );
        assert!(ctx.selection.is_empty());
        assert_eq!(doc.store().snapshot(), before);
        assert_eq!(doc.history().past_len(), 1);
    }
}
