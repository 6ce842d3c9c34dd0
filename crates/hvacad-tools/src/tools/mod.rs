//! 具体的工具实现
//!
//! 每种交互模式对应一个 Tool 实现

mod duct;
mod equipment;
mod fitting;
mod note;
mod room;
mod select;

pub use duct::{DuctTool, MIN_DUCT_LENGTH};
pub use equipment::EquipmentTool;
pub use fitting::FittingTool;
pub use note::NoteTool;
pub use room::{RoomTool, MIN_ROOM_SIZE};
pub use select::{SelectTool, DUPLICATE_OFFSET};

use crate::tool::{Tool, ToolKind};

/// 创建指定类型的工具
pub fn create_tool(kind: ToolKind) -> Box<dyn Tool> {
    match kind {
        ToolKind::Select => Box::new(SelectTool::new()),
        ToolKind::Room => Box::new(RoomTool::new()),
        ToolKind::Duct => Box::new(DuctTool::new()),
        ToolKind::Equipment => Box::new(EquipmentTool::new()),
        ToolKind::Fitting => Box::new(FittingTool::new()),
        ToolKind::Note => Box::new(NoteTool::new()),
    }
}
