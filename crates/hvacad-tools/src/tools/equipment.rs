//! 设备工具 - 单击放置，设备中心对齐到捕捉点

use crate::tool::{
    MouseButton, PointerEvent, Preview, PreviewContext, PreviewShape, Tool, ToolContext,
    ToolKind, ToolOutcome,
};
use hvacad_core::entity::{Entity, EntityType, EquipmentProps, EquipmentType};
use hvacad_core::math::{BoundingBox2, Point2};
use tracing::debug;

pub struct EquipmentTool {
    equipment_type: EquipmentType,
    hover: Option<Point2>,
}

impl EquipmentTool {
    pub fn new() -> Self {
        Self {
            equipment_type: EquipmentType::Fan,
            hover: None,
        }
    }

    pub fn with_type(mut self, equipment_type: EquipmentType) -> Self {
        self.equipment_type = equipment_type;
        self
    }

    pub fn equipment_type(&self) -> EquipmentType {
        self.equipment_type
    }

    pub fn set_equipment_type(&mut self, equipment_type: EquipmentType) {
        self.equipment_type = equipment_type;
    }

    /// 以中心点计算占位矩形
    fn footprint(&self, center: Point2) -> BoundingBox2 {
        let props = EquipmentProps::for_type(self.equipment_type);
        BoundingBox2::from_origin_size(
            center.x - props.width / 2.0,
            center.y - props.depth / 2.0,
            props.width,
            props.depth,
        )
    }
}

impl Default for EquipmentTool {
    fn default() -> Self {
        Self::new()
    }
}

impl Tool for EquipmentTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Equipment
    }

    fn reset(&mut self) {
        self.hover = None;
    }

    fn on_pointer_down(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome {
        if event.button != MouseButton::Left {
            return ToolOutcome::Continue;
        }
        let center = ctx.snap(event.position);
        let origin = self.footprint(center).min;
        let props = EquipmentProps {
            name: ctx.document.peek_name(EntityType::Equipment),
            ..EquipmentProps::for_type(self.equipment_type)
        };
        match ctx.document.create_entity(Entity::equipment(origin.x, origin.y, props)) {
            Ok(id) => {
                ctx.document.next_name(EntityType::Equipment);
                ctx.selection.set([id]);
                ToolOutcome::Committed(vec![id])
            }
            Err(err) => {
                debug!("Equipment rejected: {}", err);
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
        "Click to place equipment"
    }

    fn render_preview(&self, _ctx: &PreviewContext) -> Vec<Preview> {
        match self.hover {
            Some(center) => vec![Preview::reference(PreviewShape::Rectangle(
                self.footprint(center),
            ))],
            None => vec![],
        }
    }
}
