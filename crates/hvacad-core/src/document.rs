//! 编辑会话
//!
//! `Document` 把实体存储、撤销历史、参数化服务和外部协作方挂钩组合在一起。
//! 所有提交的编辑都经过这里生成命令并记录到历史中。

use crate::command::{Command, CommandId, EntityChange, RemovedEntity};
use crate::config::EditorConfig;
use crate::entity::{Entity, EntityId, EntityType, Transform};
use crate::error::DocumentError;
use crate::history::{History, HistorySnapshot};
use crate::parametric::{
    handle_duct_property_change, DuctContext, DuctPropsPatch, ParametricUpdateResult,
    ParametricUpdateService, UpdateSource,
};
use crate::store::{EntityPatch, EntityStore, StoreEvent, StoreSnapshot, SubscriptionId};
use crate::validator::SuggestedFix;
use chrono::Utc;
use std::collections::HashSet;
use std::fmt;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info, warn};

/// 风管连接检测 / 管件自动生成协作方
///
/// 在风管创建或参数化提交后以风管ID调用。
pub trait ConnectionHook: Send {
    fn duct_committed(&mut self, duct_id: EntityId, store: &EntityStore);
}

impl<F> ConnectionHook for F
where
    F: FnMut(EntityId, &EntityStore) + Send,
{
    fn duct_committed(&mut self, duct_id: EntityId, store: &EntityStore) {
        self(duct_id, store)
    }
}

pub struct Document {
    store: EntityStore,
    history: History,
    parametric: ParametricUpdateService,
    config: EditorConfig,
    connection_hook: Option<Box<dyn ConnectionHook>>,
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Document")
            .field("store", &self.store)
            .field("undo", &self.history.past_len())
            .field("redo", &self.history.future_len())
            .field("connection_hook", &self.connection_hook.is_some())
            .finish()
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new(EditorConfig::default())
    }
}

impl Document {
    pub fn new(config: EditorConfig) -> Self {
        Self {
            store: EntityStore::new(),
            history: History::new(config.history_max_size),
            parametric: ParametricUpdateService::new(),
            config,
            connection_hook: None,
        }
    }

    pub fn store(&self) -> &EntityStore {
        &self.store
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn parametric(&self) -> &ParametricUpdateService {
        &self.parametric
    }

    pub fn set_config(&mut self, config: EditorConfig) -> Result<(), DocumentError> {
        config.validate()?;
        self.history.set_max_size(config.history_max_size);
        self.config = config;
        Ok(())
    }

    pub fn set_connection_hook(&mut self, hook: impl ConnectionHook + 'static) {
        self.connection_hook = Some(Box::new(hook));
    }

    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.store.get(id)
    }

    pub fn next_name(&mut self, entity_type: EntityType) -> String {
        self.store.next_name(entity_type)
    }

    /// 预览下一个默认名称；创建成功后再用 [`Document::next_name`] 推进
    pub fn peek_name(&self, entity_type: EntityType) -> String {
        self.store.peek_name(entity_type)
    }

    pub fn subscribe(&mut self, listener: impl FnMut(&StoreEvent) + Send + 'static) -> SubscriptionId {
        self.store.subscribe(listener)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.store.unsubscribe(id)
    }

    // ========== 命令 ==========

    /// 执行并记录命令
    pub fn execute(&mut self, command: Command) -> CommandId {
        command.apply(&mut self.store);
        self.record_applied(command)
    }

    /// 记录已经作用于存储的命令（拖动手势结束时使用）
    pub fn record_applied(&mut self, command: Command) -> CommandId {
        let id = command.id;
        if command.is_empty() {
            return id;
        }
        info!(
            "Committed '{}' ({} entities)",
            command.label,
            command.entity_ids().len()
        );
        self.history.record(command);
        id
    }

    /// 创建实体（一条命令）；属性不合法或ID重复时不做任何修改
    pub fn create_entities(
        &mut self,
        label: impl Into<String>,
        mut entities: Vec<Entity>,
    ) -> Result<Vec<EntityId>, DocumentError> {
        if entities.is_empty() {
            return Ok(Vec::new());
        }
        let mut seen = HashSet::new();
        for entity in &mut entities {
            if let Err(err) = entity.validate() {
                warn!("Rejected {} creation: {}", entity.entity_type().label(), err);
                return Err(err.into());
            }
            if self.store.contains(entity.id) || !seen.insert(entity.id) {
                warn!("Rejected creation with duplicate id {}", entity.id);
                return Err(DocumentError::DuplicateId(entity.id));
            }
            entity.recalculate();
        }
        let command = Command::create(label, entities);
        let ids = command.entity_ids();
        self.execute(command);
        Ok(ids)
    }

    pub fn create_entity(&mut self, entity: Entity) -> Result<EntityId, DocumentError> {
        let label = format!("Create {}", entity.entity_type().label().to_lowercase());
        let ids = self.create_entities(label, vec![entity])?;
        ids.into_iter()
            .next()
            .ok_or_else(|| DocumentError::Config("empty creation".to_string()))
    }

    /// 删除实体（一条命令），返回实际删除的数量；不存在的ID被忽略
    pub fn delete_entities(&mut self, label: impl Into<String>, ids: &[EntityId]) -> usize {
        let removed: Vec<RemovedEntity> = ids
            .iter()
            .filter_map(|id| self.store.remove(*id))
            .map(|(index, entity)| RemovedEntity { index, entity })
            .collect();
        let count = removed.len();
        for entry in &removed {
            self.parametric.cancel_pending(entry.entity.id);
        }
        self.record_applied(Command::delete(label, removed));
        count
    }

    /// 属性/变换更新（一条命令）
    ///
    /// 实体不存在或没有实际变化时返回 `Ok(false)`；校验失败时存储保持不变。
    pub fn update_entity(&mut self, id: EntityId, patch: &EntityPatch) -> Result<bool, DocumentError> {
        let Some(current) = self.store.get(id) else {
            return Ok(false);
        };
        let mut next = current.clone();
        patch.merge_into(&mut next);
        if let Err(err) = next.validate() {
            warn!("Rejected update of {}: {}", id, err);
            return Err(err.into());
        }
        if next == *current {
            return Ok(false);
        }
        next.modified_at = Utc::now();
        let label = format!("Edit {}", next.entity_type().label().to_lowercase());
        let command = Command::update(
            label,
            vec![EntityChange {
                previous: current.clone(),
                next,
            }],
        );
        self.execute(command);
        Ok(true)
    }

    /// 平移多个实体（一条命令），返回移动的数量
    pub fn move_entities(&mut self, label: impl Into<String>, ids: &[EntityId], dx: f64, dy: f64) -> usize {
        if dx == 0.0 && dy == 0.0 {
            return 0;
        }
        let now = Utc::now();
        let changes: Vec<EntityChange> = ids
            .iter()
            .filter_map(|id| self.store.get(*id))
            .map(|entity| {
                let mut next = entity.clone();
                next.transform = entity.transform.translated(dx, dy);
                next.modified_at = now;
                EntityChange {
                    previous: entity.clone(),
                    next,
                }
            })
            .collect();
        let count = changes.len();
        self.execute(Command::move_entities(label, changes));
        count
    }

    // ========== 临时预览（不记录历史） ==========

    /// 拖动过程中直接写入变换
    pub fn preview_transform(&mut self, id: EntityId, transform: Transform) -> bool {
        self.store.update(id, &EntityPatch::transform(transform))
    }

    /// 原样写回手势开始前的实体
    pub fn restore_entities(&mut self, entities: impl IntoIterator<Item = Entity>) {
        for entity in entities {
            if self.store.contains(entity.id) {
                self.store.restore(None, entity);
            }
        }
    }

    // ========== 撤销/重做 ==========

    pub fn undo(&mut self) -> bool {
        let ids = match self.history.undo(&mut self.store) {
            Some(command) => command.entity_ids(),
            None => return false,
        };
        self.cancel_vanished(&ids);
        true
    }

    pub fn redo(&mut self) -> bool {
        let ids = match self.history.redo(&mut self.store) {
            Some(command) => command.entity_ids(),
            None => return false,
        };
        self.cancel_vanished(&ids);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    fn cancel_vanished(&self, ids: &[EntityId]) {
        for id in ids {
            if !self.store.contains(*id) {
                self.parametric.cancel_pending(*id);
            }
        }
    }

    // ========== 参数化更新 ==========

    /// 以当前存储内容构建重算上下文
    pub fn duct_context(&self, duct_id: EntityId) -> Result<DuctContext, DocumentError> {
        match self.store.get(duct_id) {
            Some(entity) if entity.entity_type() == EntityType::Duct => {
                Ok(DuctContext::from_store(&self.store))
            }
            _ => Err(DocumentError::EntityNotFound(duct_id)),
        }
    }

    /// 按配置的防抖时间调度风管属性修改
    pub fn schedule_duct_change(
        &self,
        duct_id: EntityId,
        patch: DuctPropsPatch,
    ) -> Result<impl Future<Output = ParametricUpdateResult> + Send + 'static, DocumentError> {
        self.schedule_with(duct_id, patch, UpdateSource::User, self.config.debounce())
    }

    /// 立即调度一键修正
    pub fn schedule_fix(
        &self,
        duct_id: EntityId,
        fix: SuggestedFix,
    ) -> Result<impl Future<Output = ParametricUpdateResult> + Send + 'static, DocumentError> {
        self.schedule_with(duct_id, fix.into(), UpdateSource::Fix, Duration::ZERO)
    }

    pub fn schedule_with(
        &self,
        duct_id: EntityId,
        patch: DuctPropsPatch,
        source: UpdateSource,
        debounce: Duration,
    ) -> Result<impl Future<Output = ParametricUpdateResult> + Send + 'static, DocumentError> {
        let context = self.duct_context(duct_id)?;
        Ok(self.parametric.schedule_duct_property_change(
            duct_id,
            patch,
            context,
            self.config.limits.clone(),
            source,
            debounce,
        ))
    }

    /// 把参数化结果作为一条命令提交
    ///
    /// 已被取代的结果与已经不存在的实体会被跳过；没有可提交的内容时返回 `Ok(None)`。
    /// 调度后涉及的实体又被修改过时，以当前存储内容重新计算同一修改再提交。
    pub fn commit_parametric(
        &mut self,
        result: ParametricUpdateResult,
    ) -> Result<Option<CommandId>, DocumentError> {
        if result.superseded || result.is_empty() {
            return Ok(None);
        }
        let result = match result.duct_id.filter(|_| self.is_stale(&result)) {
            Some(duct_id) => {
                debug!("Duct {} edited since scheduling, recomputing", duct_id);
                handle_duct_property_change(
                    duct_id,
                    &result.patch,
                    &DuctContext::from_store(&self.store),
                    &self.config.limits,
                    result.source,
                )
            }
            None => result,
        };
        let now = Utc::now();
        let mut changes = Vec::with_capacity(result.entity_updates.len());
        for update in &result.entity_updates {
            let Some(live) = self.store.get(update.id) else {
                debug!("Skipping update for removed entity {}", update.id);
                continue;
            };
            let mut next = live.clone();
            next.kind = update.next.kind.clone();
            next.recalculate();
            if let Err(err) = next.validate() {
                warn!("Rejected recomputed update of {}: {}", update.id, err);
                return Err(err.into());
            }
            next.modified_at = now;
            changes.push(EntityChange {
                previous: live.clone(),
                next,
            });
        }
        if changes.is_empty() {
            return Ok(None);
        }

        let ducts: Vec<EntityId> = changes
            .iter()
            .filter(|c| c.next.entity_type() == EntityType::Duct)
            .map(EntityChange::id)
            .collect();
        let id = self.execute(Command::update(result.source.label(), changes));
        for duct_id in ducts {
            self.notify_duct_committed(duct_id);
        }
        Ok(Some(id))
    }

    /// 计算结果所依据的快照与当前存储不一致
    fn is_stale(&self, result: &ParametricUpdateResult) -> bool {
        result.entity_updates.iter().any(|update| {
            self.store
                .get(update.id)
                .is_some_and(|live| *live != update.previous)
        })
    }

    /// 通知连接检测协作方
    pub fn notify_duct_committed(&mut self, duct_id: EntityId) {
        if !self.config.auto_fitting {
            return;
        }
        if let Some(hook) = self.connection_hook.as_mut() {
            debug!("Connection hook invoked for duct {}", duct_id);
            hook.duct_committed(duct_id, &self.store);
        }
    }

    // ========== 会话 ==========

    /// 清空文档（新建项目）
    pub fn reset(&mut self) {
        self.parametric.cancel_all();
        self.store.clear();
        self.store.reset_names();
        self.history.clear();
    }

    pub fn snapshot(&self) -> (StoreSnapshot, HistorySnapshot) {
        (self.store.snapshot(), self.history.snapshot())
    }

    /// 加载快照（打开项目）；未提供历史时清空历史
    pub fn load(
        &mut self,
        store: StoreSnapshot,
        history: Option<HistorySnapshot>,
    ) -> Result<(), DocumentError> {
        self.parametric.cancel_all();
        self.store.hydrate(store)?;
        self.store.reset_names();
        match history {
            Some(snapshot) => self.history.restore(snapshot),
            None => self.history.clear(),
        }
        Ok(())
    }
}
