//! 选择集

use hvacad_core::entity::EntityId;
use hvacad_core::store::EntityStore;

/// 有序且不重复的选中实体集合
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    ids: Vec<EntityId>,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.ids.contains(&id)
    }

    pub fn add(&mut self, id: EntityId) {
        if !self.contains(id) {
            self.ids.push(id);
        }
    }

    pub fn remove(&mut self, id: EntityId) -> bool {
        let before = self.ids.len();
        self.ids.retain(|existing| *existing != id);
        self.ids.len() != before
    }

    pub fn toggle(&mut self, id: EntityId) {
        if !self.remove(id) {
            self.ids.push(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// 替换为给定集合（去重，保持顺序）
    pub fn set(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        self.ids.clear();
        self.union(ids);
    }

    pub fn union(&mut self, ids: impl IntoIterator<Item = EntityId>) {
        for id in ids {
            self.add(id);
        }
    }

    /// 移除已不在存储中的实体（撤销/删除之后）
    pub fn retain_existing(&mut self, store: &EntityStore) {
        self.ids.retain(|id| store.contains(*id));
    }
}
