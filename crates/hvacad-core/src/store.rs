//! 实体存储
//!
//! 规范化的实体表：`by_id` 保存实体，`all_ids` 保存插入顺序（不是层级顺序）。
//! 存储本身不记录历史，提交的编辑都经由 [`crate::command::Command`]。

use crate::entity::{Entity, EntityId, EntityKind, EntityType, Transform};
use crate::error::DocumentError;
use crate::math::{BoundingBox2, Point2};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// 存储变更事件
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Created(EntityId),
    Modified(EntityId),
    Removed(EntityId),
    Cleared,
}

/// 订阅句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreEvent) + Send>;

/// 实体部分更新
///
/// `kind` 整体替换类型数据（属性与派生值），派生值随后重新计算。
#[derive(Debug, Clone, Default)]
pub struct EntityPatch {
    pub transform: Option<Transform>,
    pub z_index: Option<i32>,
    pub kind: Option<EntityKind>,
}

impl EntityPatch {
    pub fn transform(transform: Transform) -> Self {
        Self {
            transform: Some(transform),
            ..Default::default()
        }
    }

    pub fn kind(kind: EntityKind) -> Self {
        Self {
            kind: Some(kind),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.transform.is_none() && self.z_index.is_none() && self.kind.is_none()
    }

    /// 合并到实体（不刷新时间戳）
    pub fn merge_into(&self, entity: &mut Entity) {
        if let Some(transform) = self.transform {
            entity.transform = transform;
        }
        if let Some(z_index) = self.z_index {
            entity.z_index = z_index;
        }
        if let Some(kind) = &self.kind {
            entity.kind = kind.clone();
        }
        entity.recalculate();
    }
}

/// 默认名称序列（"Room 1"、"Duct 2" ...），随会话重置
#[derive(Debug, Clone, Default)]
pub struct NameSequence {
    counters: HashMap<EntityType, u32>,
}

impl NameSequence {
    pub fn next(&mut self, entity_type: EntityType) -> String {
        let counter = self.counters.entry(entity_type).or_insert(0);
        *counter += 1;
        format!("{} {}", entity_type.label(), counter)
    }

    /// 下一个名称，不推进序列
    pub fn peek(&self, entity_type: EntityType) -> String {
        let counter = self.counters.get(&entity_type).copied().unwrap_or(0);
        format!("{} {}", entity_type.label(), counter + 1)
    }

    pub fn reset(&mut self) {
        self.counters.clear();
    }
}

/// 存储快照（持久化协作方使用的数据形状）
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub by_id: HashMap<EntityId, Entity>,
    pub all_ids: Vec<EntityId>,
}

impl StoreSnapshot {
    /// 按插入顺序遍历
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.all_ids.iter().filter_map(|id| self.by_id.get(id))
    }
}

#[derive(Default)]
pub struct EntityStore {
    by_id: HashMap<EntityId, Entity>,
    all_ids: Vec<EntityId>,
    names: NameSequence,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl fmt::Debug for EntityStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EntityStore")
            .field("entities", &self.all_ids.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl EntityStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========== 查询 ==========

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.by_id.get(&id)
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.by_id.contains_key(&id)
    }

    /// 插入顺序
    pub fn all_ids(&self) -> &[EntityId] {
        &self.all_ids
    }

    pub fn len(&self) -> usize {
        self.all_ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.all_ids.is_empty()
    }

    pub fn index_of(&self, id: EntityId) -> Option<usize> {
        self.all_ids.iter().position(|candidate| *candidate == id)
    }

    /// 按插入顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.all_ids.iter().filter_map(|id| self.by_id.get(id))
    }

    pub fn iter_type(&self, entity_type: EntityType) -> impl Iterator<Item = &Entity> {
        self.iter().filter(move |e| e.entity_type() == entity_type)
    }

    /// 按层级排序（同层级保持插入顺序），供渲染使用
    pub fn sorted_by_z(&self) -> Vec<&Entity> {
        let mut entities: Vec<&Entity> = self.iter().collect();
        entities.sort_by_key(|e| e.z_index);
        entities
    }

    /// 命中测试：返回层级最高的实体（同层级取后插入的）
    pub fn hit_test(&self, point: &Point2) -> Option<EntityId> {
        self.sorted_by_z()
            .into_iter()
            .rev()
            .find(|e| e.bounds().contains_point(point))
            .map(|e| e.id)
    }

    /// 完全包含在框内的实体
    pub fn query_contained(&self, area: &BoundingBox2) -> Vec<EntityId> {
        self.iter()
            .filter(|e| area.contains(&e.bounds()))
            .map(|e| e.id)
            .collect()
    }

    /// 与框相交的实体
    pub fn query_intersecting(&self, area: &BoundingBox2) -> Vec<EntityId> {
        self.iter()
            .filter(|e| area.intersects(&e.bounds()))
            .map(|e| e.id)
            .collect()
    }

    // ========== 修改 ==========

    /// 添加实体，标识重复时报错
    pub fn add(&mut self, entity: Entity) -> Result<EntityId, DocumentError> {
        let index = self.all_ids.len();
        self.insert_at(index, entity)
    }

    /// 在指定插入位置添加实体（越界时追加）
    pub fn insert_at(&mut self, index: usize, mut entity: Entity) -> Result<EntityId, DocumentError> {
        let id = entity.id;
        if self.by_id.contains_key(&id) {
            warn!("Rejected entity with duplicate id {}", id);
            return Err(DocumentError::DuplicateId(id));
        }
        entity.recalculate();
        self.all_ids.insert(index.min(self.all_ids.len()), id);
        self.by_id.insert(id, entity);
        debug!("Entity {} added", id);
        self.notify(StoreEvent::Created(id));
        Ok(id)
    }

    /// 删除实体，返回原插入位置；不存在时无操作
    pub fn remove(&mut self, id: EntityId) -> Option<(usize, Entity)> {
        let entity = self.by_id.remove(&id)?;
        let index = self.index_of(id).unwrap_or(self.all_ids.len());
        if index < self.all_ids.len() {
            self.all_ids.remove(index);
        }
        debug!("Entity {} removed", id);
        self.notify(StoreEvent::Removed(id));
        Some((index, entity))
    }

    /// 合并部分更新并刷新修改时间；不存在时返回 false
    pub fn update(&mut self, id: EntityId, patch: &EntityPatch) -> bool {
        let Some(entity) = self.by_id.get_mut(&id) else {
            return false;
        };
        patch.merge_into(entity);
        entity.modified_at = Utc::now();
        self.notify(StoreEvent::Modified(id));
        true
    }

    /// 原样写回实体（撤销/重做与取消拖动使用，不改动时间戳）
    ///
    /// 实体已存在时覆盖；不存在时插入到 `index`（未给出时追加）。
    pub fn restore(&mut self, index: Option<usize>, entity: Entity) {
        let id = entity.id;
        if let Some(existing) = self.by_id.get_mut(&id) {
            *existing = entity;
            self.notify(StoreEvent::Modified(id));
        } else {
            let index = index.unwrap_or(self.all_ids.len()).min(self.all_ids.len());
            self.all_ids.insert(index, id);
            self.by_id.insert(id, entity);
            self.notify(StoreEvent::Created(id));
        }
    }

    pub fn clear(&mut self) {
        self.by_id.clear();
        self.all_ids.clear();
        self.notify(StoreEvent::Cleared);
    }

    // ========== 名称序列 ==========

    pub fn next_name(&mut self, entity_type: EntityType) -> String {
        self.names.next(entity_type)
    }

    pub fn peek_name(&self, entity_type: EntityType) -> String {
        self.names.peek(entity_type)
    }

    pub fn reset_names(&mut self) {
        self.names.reset();
    }

    // ========== 快照 ==========

    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            by_id: self.by_id.clone(),
            all_ids: self.all_ids.clone(),
        }
    }

    /// 从快照加载，替换当前全部内容
    pub fn hydrate(&mut self, snapshot: StoreSnapshot) -> Result<(), DocumentError> {
        let mut seen = HashSet::new();
        for id in &snapshot.all_ids {
            if !seen.insert(*id) {
                return Err(DocumentError::DuplicateId(*id));
            }
            if !snapshot.by_id.contains_key(id) {
                return Err(DocumentError::EntityNotFound(*id));
            }
        }
        if let Some(orphan) = snapshot.by_id.keys().find(|id| !seen.contains(*id)) {
            return Err(DocumentError::Config(format!(
                "entity {} missing from ordering",
                orphan
            )));
        }

        let StoreSnapshot { mut by_id, all_ids } = snapshot;
        for entity in by_id.values_mut() {
            entity.recalculate();
        }
        self.by_id = by_id;
        self.all_ids = all_ids;
        self.notify(StoreEvent::Cleared);
        for id in self.all_ids.clone() {
            self.notify(StoreEvent::Created(id));
        }
        Ok(())
    }

    // ========== 订阅 ==========

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + Send + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.listeners.push((id, Box::new(listener)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(candidate, _)| *candidate != id);
        self.listeners.len() != before
    }

    fn notify(&mut self, event: StoreEvent) {
        for (_, listener) in &mut self.listeners {
            listener(&event);
        }
    }
}
