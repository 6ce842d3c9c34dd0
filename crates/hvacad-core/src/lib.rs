//! HVACAD 文档状态引擎
//!
//! 暖通平面设计编辑器的核心：规范化的实体存储、可逆命令与撤销/重做、
//! 工程计算与约束校验，以及带防抖的参数化更新服务。
//!
//! # 架构设计
//!
//! - `EntityStore`: 按ID保存全部设计对象，派生值始终与属性一致
//! - `Command` / `History`: 所有提交的修改都是可逆命令
//! - `calc` / `validator`: 纯函数计算与约束校验
//! - `ParametricUpdateService`: 风管属性变化的异步重算
//! - `Document`: 组合以上部分的编辑会话
//!
//! # 示例
//!
//! ```rust
//! use hvacad_core::prelude::*;
//!
//! let mut doc = Document::default();
//! let id = doc.create_entity(Entity::room(0.0, 0.0, RoomProps::default())).unwrap();
//! assert_eq!(doc.get(id).unwrap().as_room().unwrap().calculated.area, 100.0);
//!
//! doc.undo();
//! assert!(doc.store().is_empty());
//! ```

pub mod calc;
pub mod command;
pub mod config;
pub mod document;
pub mod entity;
pub mod error;
pub mod history;
pub mod limits;
pub mod math;
pub mod parametric;
pub mod snap;
pub mod store;
pub mod validator;

pub mod prelude {
    //! 常用类型的便捷导入
    pub use crate::command::{Command, CommandId, CommandKind, EntityChange};
    pub use crate::config::EditorConfig;
    pub use crate::document::{ConnectionHook, Document};
    pub use crate::entity::{
        DuctMaterial, DuctProps, DuctShape, Entity, EntityId, EntityKind, EntityType,
        EquipmentProps, EquipmentType, FittingProps, FittingType, NoteProps, OccupancyType,
        RoomProps, SystemType, Transform,
    };
    pub use crate::error::{DocumentError, ValidationError};
    pub use crate::history::{History, HistorySnapshot};
    pub use crate::limits::{EngineeringLimits, SystemBucket};
    pub use crate::math::{BoundingBox2, Point2, Vector2};
    pub use crate::parametric::{
        DuctContext, DuctPropsPatch, ParametricUpdateResult, ParametricUpdateService,
        UpdateSource,
    };
    pub use crate::snap::GridSettings;
    pub use crate::store::{EntityPatch, EntityStore, StoreEvent, StoreSnapshot};
    pub use crate::validator::{
        ConstraintStatus, ConstraintValidator, Severity, SuggestedFix, Violation, ViolationKind,
    };
}
