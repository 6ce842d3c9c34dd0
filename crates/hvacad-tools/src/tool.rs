//! Tool 系统 - 每种交互模式一个状态机
//!
//! 工具消费指针/键盘事件，通过 `Document` 的命令接口修改实体存储，
//! 并提供预览图形。工具内部的交互状态（拖动锚点等）不持久化，
//! 在 `deactivate` 或 Escape 时丢弃。

use crate::selection::Selection;
use hvacad_core::document::Document;
use hvacad_core::entity::EntityId;
use hvacad_core::math::{BoundingBox2, Point2};

/// 工具类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ToolKind {
    Select,
    Room,
    Duct,
    Equipment,
    Fitting,
    Note,
}

impl ToolKind {
    pub fn name(&self) -> &'static str {
        match self {
            ToolKind::Select => "Select",
            ToolKind::Room => "Room",
            ToolKind::Duct => "Duct",
            ToolKind::Equipment => "Equipment",
            ToolKind::Fitting => "Fitting",
            ToolKind::Note => "Note",
        }
    }

    pub fn shortcut(&self) -> char {
        match self {
            ToolKind::Select => 'V',
            ToolKind::Room => 'R',
            ToolKind::Duct => 'D',
            ToolKind::Equipment => 'E',
            ToolKind::Fitting => 'F',
            ToolKind::Note => 'N',
        }
    }

    pub fn all() -> [ToolKind; 6] {
        [
            ToolKind::Select,
            ToolKind::Room,
            ToolKind::Duct,
            ToolKind::Equipment,
            ToolKind::Fitting,
            ToolKind::Note,
        ]
    }
}

/// 鼠标按钮
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// 修饰键
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
}

impl Modifiers {
    pub const NONE: Modifiers = Modifiers {
        shift: false,
        ctrl: false,
        alt: false,
    };

    pub const SHIFT: Modifiers = Modifiers {
        shift: true,
        ctrl: false,
        alt: false,
    };

    pub const CTRL: Modifiers = Modifiers {
        shift: false,
        ctrl: true,
        alt: false,
    };
}

/// 指针事件（世界坐标）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub position: Point2,
    pub button: MouseButton,
    pub modifiers: Modifiers,
}

impl PointerEvent {
    pub fn new(position: Point2, button: MouseButton, modifiers: Modifiers) -> Self {
        Self {
            position,
            button,
            modifiers,
        }
    }

    pub fn left(x: f64, y: f64) -> Self {
        Self::new(Point2::new(x, y), MouseButton::Left, Modifiers::NONE)
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Escape,
    Enter,
    Delete,
    Backspace,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    pub key: Key,
    pub modifiers: Modifiers,
}

impl KeyEvent {
    pub fn new(key: Key) -> Self {
        Self {
            key,
            modifiers: Modifiers::NONE,
        }
    }

    pub fn with_modifiers(mut self, modifiers: Modifiers) -> Self {
        self.modifiers = modifiers;
        self
    }
}

/// 事件处理结果
///
/// 工具从不向外抛出错误：不合法的输入统一吸收为 `Rejected`。
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutcome {
    /// 继续当前交互
    Continue,
    /// 已提交一条命令，涉及这些实体
    Committed(Vec<EntityId>),
    /// 交互被取消（Escape / 右键）
    Cancelled,
    /// 几何或属性不合法，未创建任何内容
    Rejected,
}

impl ToolOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, ToolOutcome::Committed(_))
    }

    pub fn committed_ids(&self) -> &[EntityId] {
        match self {
            ToolOutcome::Committed(ids) => ids,
            _ => &[],
        }
    }
}

/// 工具上下文 - 传递给工具的可变运行时状态
pub struct ToolContext<'a> {
    pub document: &'a mut Document,
    pub selection: &'a mut Selection,
}

impl<'a> ToolContext<'a> {
    pub fn new(document: &'a mut Document, selection: &'a mut Selection) -> Self {
        Self {
            document,
            selection,
        }
    }

    /// 按文档网格设置捕捉
    pub fn snap(&self, point: Point2) -> Point2 {
        self.document.config().grid.snap(point)
    }
}

/// 预览上下文（只读）
pub struct PreviewContext<'a> {
    pub document: &'a Document,
    pub selection: &'a Selection,
}

/// 预览图形
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewShape {
    Rectangle(BoundingBox2),
    Line { start: Point2, end: Point2 },
    Marker { position: Point2, size: f64 },
    Label { position: Point2, text: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Preview {
    pub shape: PreviewShape,
    /// 不合法的几何以警示样式显示，松开时不会创建
    pub valid: bool,
    /// 参考图形（虚线显示）
    pub is_reference: bool,
}

impl Preview {
    pub fn new(shape: PreviewShape) -> Self {
        Self {
            shape,
            valid: true,
            is_reference: false,
        }
    }

    pub fn reference(shape: PreviewShape) -> Self {
        Self {
            shape,
            valid: true,
            is_reference: true,
        }
    }

    pub fn with_valid(mut self, valid: bool) -> Self {
        self.valid = valid;
        self
    }
}

/// Tool trait - 所有交互工具的核心接口
pub trait Tool: Send {
    fn kind(&self) -> ToolKind;

    fn name(&self) -> &str {
        self.kind().name()
    }

    /// 切换到该工具时调用
    fn activate(&mut self, _ctx: &mut ToolContext) {}

    /// 切换离开时调用，丢弃所有交互状态
    fn deactivate(&mut self, _ctx: &mut ToolContext) {
        self.reset();
    }

    /// 重置交互状态
    fn reset(&mut self);

    // ========== 事件处理 ==========

    fn on_pointer_down(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome;

    fn on_pointer_move(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome;

    fn on_pointer_up(&mut self, ctx: &mut ToolContext, event: &PointerEvent) -> ToolOutcome;

    /// 默认只处理 Escape
    fn on_key_down(&mut self, _ctx: &mut ToolContext, event: &KeyEvent) -> ToolOutcome {
        if event.key == Key::Escape {
            self.reset();
            return ToolOutcome::Cancelled;
        }
        ToolOutcome::Continue
    }

    fn on_key_up(&mut self, _ctx: &mut ToolContext, _event: &KeyEvent) -> ToolOutcome {
        ToolOutcome::Continue
    }

    // ========== UI 提示 ==========

    fn prompt(&self) -> &str;

    // ========== 预览 ==========

    fn render_preview(&self, ctx: &PreviewContext) -> Vec<Preview>;
}
