//! HVACAD 交互工具
//!
//! 每种编辑模式一个状态机（选择、房间、风管、设备、管件、注释），
//! 通过 [`hvacad_core::document::Document`] 的命令接口修改文档。
//!
//! ```
//! use hvacad_tools::{Editor, PointerEvent, ToolKind};
//!
//! let mut editor = Editor::default();
//! editor.set_tool(ToolKind::Room);
//! editor.pointer_down(PointerEvent::left(0.0, 0.0));
//! let outcome = editor.pointer_up(PointerEvent::left(120.0, 96.0));
//! assert!(outcome.is_committed());
//! assert!(editor.undo());
//! assert!(editor.document().store().is_empty());
//! ```

pub mod editor;
pub mod selection;
pub mod tool;
pub mod tools;

pub use editor::Editor;
pub use selection::Selection;
pub use tool::{
    Key, KeyEvent, Modifiers, MouseButton, PointerEvent, Preview, PreviewContext, PreviewShape,
    Tool, ToolContext, ToolKind, ToolOutcome,
};
pub use tools::create_tool;
