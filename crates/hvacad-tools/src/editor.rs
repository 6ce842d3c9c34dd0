//! 编辑器 - 持有文档、选择集和当前工具，分发输入事件

use crate::selection::Selection;
use crate::tool::{
    Key, KeyEvent, PointerEvent, Preview, PreviewContext, Tool, ToolContext, ToolKind,
    ToolOutcome,
};
use crate::tools::create_tool;
use hvacad_core::config::EditorConfig;
use hvacad_core::document::Document;
use tracing::{debug, info};

pub struct Editor {
    document: Document,
    selection: Selection,
    tool: Box<dyn Tool>,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Editor {
    pub fn new(config: EditorConfig) -> Self {
        Self::with_document(Document::new(config))
    }

    pub fn with_document(document: Document) -> Self {
        Self {
            document,
            selection: Selection::new(),
            tool: create_tool(ToolKind::Select),
        }
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn document_mut(&mut self) -> &mut Document {
        &mut self.document
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn active_tool(&self) -> ToolKind {
        self.tool.kind()
    }

    pub fn prompt(&self) -> &str {
        self.tool.prompt()
    }

    /// 切换工具；旧工具的交互状态被丢弃
    pub fn set_tool(&mut self, kind: ToolKind) {
        if self.tool.kind() == kind {
            return;
        }
        let mut ctx = ToolContext::new(&mut self.document, &mut self.selection);
        self.tool.deactivate(&mut ctx);
        self.tool = create_tool(kind);
        self.tool.activate(&mut ctx);
        info!("Tool: {}", kind.name());
    }

    /// 替换为自定义配置的工具实例
    pub fn set_tool_instance(&mut self, tool: Box<dyn Tool>) {
        let mut ctx = ToolContext::new(&mut self.document, &mut self.selection);
        self.tool.deactivate(&mut ctx);
        self.tool = tool;
        self.tool.activate(&mut ctx);
    }

    // ========== 事件分发 ==========

    pub fn pointer_down(&mut self, event: PointerEvent) -> ToolOutcome {
        let mut ctx = ToolContext::new(&mut self.document, &mut self.selection);
        self.tool.on_pointer_down(&mut ctx, &event)
    }

    pub fn pointer_move(&mut self, event: PointerEvent) -> ToolOutcome {
        let mut ctx = ToolContext::new(&mut self.document, &mut self.selection);
        self.tool.on_pointer_move(&mut ctx, &event)
    }

    pub fn pointer_up(&mut self, event: PointerEvent) -> ToolOutcome {
        let mut ctx = ToolContext::new(&mut self.document, &mut self.selection);
        self.tool.on_pointer_up(&mut ctx, &event)
    }

    /// 全局快捷键（Ctrl+Z/Ctrl+Y，工具字母）优先，其余交给当前工具
    pub fn key_down(&mut self, event: KeyEvent) -> ToolOutcome {
        if let Key::Char(c) = event.key {
            let c = c.to_ascii_uppercase();
            if event.modifiers.ctrl {
                match c {
                    'Z' if event.modifiers.shift => return self.redo_outcome(),
                    'Z' => return self.undo_outcome(),
                    'Y' => return self.redo_outcome(),
                    _ => {}
                }
            } else if let Some(kind) = ToolKind::all().into_iter().find(|k| k.shortcut() == c) {
                self.set_tool(kind);
                return ToolOutcome::Continue;
            }
        }
        let mut ctx = ToolContext::new(&mut self.document, &mut self.selection);
        self.tool.on_key_down(&mut ctx, &event)
    }

    pub fn key_up(&mut self, event: KeyEvent) -> ToolOutcome {
        let mut ctx = ToolContext::new(&mut self.document, &mut self.selection);
        self.tool.on_key_up(&mut ctx, &event)
    }

    pub fn render_preview(&self) -> Vec<Preview> {
        self.tool.render_preview(&PreviewContext {
            document: &self.document,
            selection: &self.selection,
        })
    }

    // ========== 撤销/重做 ==========

    /// 撤销；进行中的手势先被取消
    pub fn undo(&mut self) -> bool {
        self.cancel_gesture();
        let undone = self.document.undo();
        self.selection.retain_existing(self.document.store());
        undone
    }

    pub fn redo(&mut self) -> bool {
        self.cancel_gesture();
        let redone = self.document.redo();
        self.selection.retain_existing(self.document.store());
        redone
    }

    fn undo_outcome(&mut self) -> ToolOutcome {
        if self.undo() {
            ToolOutcome::Continue
        } else {
            debug!("Nothing to undo");
            ToolOutcome::Rejected
        }
    }

    fn redo_outcome(&mut self) -> ToolOutcome {
        if self.redo() {
            ToolOutcome::Continue
        } else {
            debug!("Nothing to redo");
            ToolOutcome::Rejected
        }
    }

    fn cancel_gesture(&mut self) {
        let mut ctx = ToolContext::new(&mut self.document, &mut self.selection);
        self.tool.deactivate(&mut ctx);
    }

    /// 新建项目
    pub fn reset(&mut self) {
        self.cancel_gesture();
        self.selection.clear();
        self.document.reset();
    }
}
