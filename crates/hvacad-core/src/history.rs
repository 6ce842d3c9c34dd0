//! 撤销/重做历史
//!
//! `past` 超出容量时静默丢弃最旧的命令；记录新命令会清空 `future`（不做分支）。

use crate::command::Command;
use crate::store::EntityStore;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use tracing::{debug, info};

/// 默认历史容量
pub const DEFAULT_MAX_SIZE: usize = 100;

/// 历史快照（持久化协作方使用的数据形状）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistorySnapshot {
    pub past: Vec<Command>,
    pub future: Vec<Command>,
    pub max_size: usize,
}

#[derive(Debug, Clone)]
pub struct History {
    past: VecDeque<Command>,
    future: Vec<Command>,
    max_size: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_SIZE)
    }
}

impl History {
    pub fn new(max_size: usize) -> Self {
        Self {
            past: VecDeque::with_capacity(max_size.min(DEFAULT_MAX_SIZE)),
            future: Vec::new(),
            max_size,
        }
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// 调整容量，超出部分从最旧端丢弃
    pub fn set_max_size(&mut self, max_size: usize) {
        self.max_size = max_size;
        self.evict();
    }

    /// 记录已执行的命令
    pub fn record(&mut self, command: Command) {
        debug!("Recorded command '{}'", command.label);
        self.past.push_back(command);
        self.evict();
        self.future.clear();
    }

    fn evict(&mut self) {
        while self.past.len() > self.max_size {
            if let Some(evicted) = self.past.pop_front() {
                debug!("Evicted command '{}'", evicted.label);
            }
        }
    }

    /// 撤销最近一条命令；栈为空时无操作
    pub fn undo(&mut self, store: &mut EntityStore) -> Option<&Command> {
        let command = self.past.pop_back()?;
        command.revert(store);
        info!("Undo '{}'", command.label);
        self.future.push(command);
        self.future.last()
    }

    /// 重做最近撤销的命令；栈为空时无操作
    pub fn redo(&mut self, store: &mut EntityStore) -> Option<&Command> {
        let command = self.future.pop()?;
        command.apply(store);
        info!("Redo '{}'", command.label);
        self.past.push_back(command);
        self.past.back()
    }

    /// 清空历史，不影响实体存储
    pub fn clear(&mut self) {
        self.past.clear();
        self.future.clear();
        info!("History cleared");
    }

    pub fn can_undo(&self) -> bool {
        !self.past.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    pub fn undo_label(&self) -> Option<&str> {
        self.past.back().map(|c| c.label.as_str())
    }

    pub fn redo_label(&self) -> Option<&str> {
        self.future.last().map(|c| c.label.as_str())
    }

    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            past: self.past.iter().cloned().collect(),
            future: self.future.clone(),
            max_size: self.max_size,
        }
    }

    pub fn restore(&mut self, snapshot: HistorySnapshot) {
        self.past = snapshot.past.into();
        self.future = snapshot.future;
        self.max_size = snapshot.max_size;
        self.evict();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{Entity, RoomProps};

    fn create_room(store: &mut EntityStore, history: &mut History, label: &str) -> Command {
        let command = Command::create(label, vec![Entity::room(0.0, 0.0, RoomProps::default())]);
        command.apply(store);
        history.record(command.clone());
        command
    }

    #[test]
    fn test_undo_redo_empty_is_noop() {
        let mut store = EntityStore::new();
        let mut history = History::default();
        assert!(history.undo(&mut store).is_none());
        assert!(history.redo(&mut store).is_none());
        assert!(!history.can_undo());
        assert!(!history.can_redo());
    }

    #[test]
    fn test_history_bound() {
        let mut store = EntityStore::new();
        let mut history = History::new(5);
        let commands: Vec<_> = (0..8)
            .map(|i| create_room(&mut store, &mut history, &format!("Room {}", i)))
            .collect();

        assert_eq!(history.past_len(), 5);
        while history.undo(&mut store).is_some() {}
        // 最旧的 3 条不可恢复
        assert_eq!(store.len(), 3);
        for command in &commands[..3] {
            assert!(store.contains(command.entity_ids()[0]));
        }
    }

    #[test]
    fn test_record_clears_future() {
        let mut store = EntityStore::new();
        let mut history = History::default();
        create_room(&mut store, &mut history, "A");
        create_room(&mut store, &mut history, "B");
        history.undo(&mut store);
        assert!(history.can_redo());

        create_room(&mut store, &mut history, "C");
        assert!(!history.can_redo());
        assert_eq!(history.undo_label(), Some("C"));
    }

    #[test]
    fn test_clear_keeps_store() {
        let mut store = EntityStore::new();
        let mut history = History::default();
        create_room(&mut store, &mut history, "A");
        history.clear();
        assert!(!history.can_undo());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_snapshot_restore() {
        let mut store = EntityStore::new();
        let mut history = History::new(10);
        create_room(&mut store, &mut history, "A");
        create_room(&mut store, &mut history, "B");
        history.undo(&mut store);

        let json = serde_json::to_string(&history.snapshot()).unwrap();
        let snapshot: HistorySnapshot = serde_json::from_str(&json).unwrap();
        let mut restored = History::default();
        restored.restore(snapshot);

        assert_eq!(restored.past_len(), 1);
        assert_eq!(restored.future_len(), 1);
        assert_eq!(restored.max_size(), 10);
        assert_eq!(restored.redo_label(), Some("B"));
    }
}
