//! 可逆命令
//!
//! 命令保存实体的完整前后状态（值拷贝，不与存储中的实体共享引用），
//! 撤销时原样写回，保证逐位恢复。

use crate::entity::{Entity, EntityId};
use crate::store::EntityStore;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 命令ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommandId(Uuid);

impl CommandId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for CommandId {
    fn default() -> Self {
        Self::new()
    }
}

/// 单个实体的前后状态
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityChange {
    pub previous: Entity,
    pub next: Entity,
}

impl EntityChange {
    pub fn id(&self) -> EntityId {
        self.next.id
    }

    pub fn is_noop(&self) -> bool {
        self.previous == self.next
    }
}

/// 已删除实体及其原插入位置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedEntity {
    pub index: usize,
    pub entity: Entity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum CommandKind {
    Create { entities: Vec<Entity> },
    /// 按删除顺序记录，撤销时逆序插回
    Delete { entities: Vec<RemovedEntity> },
    Update { changes: Vec<EntityChange> },
    /// 批量移动（一次拖动手势）
    Move { changes: Vec<EntityChange> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Command {
    pub id: CommandId,
    pub timestamp: DateTime<Utc>,
    pub label: String,
    pub kind: CommandKind,
}

impl Command {
    pub fn new(label: impl Into<String>, kind: CommandKind) -> Self {
        Self {
            id: CommandId::new(),
            timestamp: Utc::now(),
            label: label.into(),
            kind,
        }
    }

    pub fn create(label: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self::new(label, CommandKind::Create { entities })
    }

    pub fn delete(label: impl Into<String>, entities: Vec<RemovedEntity>) -> Self {
        Self::new(label, CommandKind::Delete { entities })
    }

    pub fn update(label: impl Into<String>, changes: Vec<EntityChange>) -> Self {
        Self::new(label, CommandKind::Update { changes })
    }

    pub fn move_entities(label: impl Into<String>, changes: Vec<EntityChange>) -> Self {
        Self::new(label, CommandKind::Move { changes })
    }

    /// 涉及的实体
    pub fn entity_ids(&self) -> Vec<EntityId> {
        match &self.kind {
            CommandKind::Create { entities } => entities.iter().map(|e| e.id).collect(),
            CommandKind::Delete { entities } => entities.iter().map(|r| r.entity.id).collect(),
            CommandKind::Update { changes } | CommandKind::Move { changes } => {
                changes.iter().map(EntityChange::id).collect()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.kind {
            CommandKind::Create { entities } => entities.is_empty(),
            CommandKind::Delete { entities } => entities.is_empty(),
            CommandKind::Update { changes } | CommandKind::Move { changes } => changes.is_empty(),
        }
    }

    /// 正向执行
    pub fn apply(&self, store: &mut EntityStore) {
        match &self.kind {
            CommandKind::Create { entities } => {
                for entity in entities {
                    store.restore(None, entity.clone());
                }
            }
            CommandKind::Delete { entities } => {
                for removed in entities {
                    store.remove(removed.entity.id);
                }
            }
            CommandKind::Update { changes } | CommandKind::Move { changes } => {
                for change in changes {
                    if store.contains(change.id()) {
                        store.restore(None, change.next.clone());
                    }
                }
            }
        }
    }

    /// 逆向执行
    pub fn revert(&self, store: &mut EntityStore) {
        match &self.kind {
            CommandKind::Create { entities } => {
                for entity in entities.iter().rev() {
                    store.remove(entity.id);
                }
            }
            CommandKind::Delete { entities } => {
                for removed in entities.iter().rev() {
                    store.restore(Some(removed.index), removed.entity.clone());
                }
            }
            CommandKind::Update { changes } | CommandKind::Move { changes } => {
                for change in changes.iter().rev() {
                    if store.contains(change.id()) {
                        store.restore(None, change.previous.clone());
                    }
                }
            }
        }
    }
}
