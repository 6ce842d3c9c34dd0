//! 参数化更新服务
//!
//! 风管属性变化后重新计算工程数据、校验约束，并把结果传递给相连的管件。
//!
//! 核心组件：
//! - `DuctPropsPatch`: 风管属性的部分修改
//! - `DuctContext`: 计算所需的风管/管件快照
//! - `ParametricUpdateService`: 按实体防抖、可取消的重算调度
//!
//! 服务只返回更新结果，不直接写入存储；提交由调用方经命令完成。

use crate::calc;
use crate::entity::{
    DuctDimensions, DuctMaterial, DuctProps, DuctShape, Entity, EntityId, EntityKind, EntityType,
    SystemType,
};
use crate::limits::EngineeringLimits;
use crate::math::round_to;
use crate::store::EntityStore;
use crate::validator::{ConstraintValidator, DuctEngineeringData, SuggestedFix, Violation};
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, info};

/// 风管属性的部分修改
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DuctPropsPatch {
    pub name: Option<String>,
    pub shape: Option<DuctShape>,
    pub diameter: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub length: Option<f64>,
    pub material: Option<DuctMaterial>,
    pub airflow: Option<f64>,
    pub static_pressure: Option<f64>,
    pub system_type: Option<SystemType>,
}

impl DuctPropsPatch {
    pub fn airflow(airflow: f64) -> Self {
        Self {
            airflow: Some(airflow),
            ..Default::default()
        }
    }

    pub fn diameter(diameter: f64) -> Self {
        Self {
            diameter: Some(diameter),
            ..Default::default()
        }
    }

    pub fn dimensions(width: f64, height: f64) -> Self {
        Self {
            width: Some(width),
            height: Some(height),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    pub fn apply(&self, props: &mut DuctProps) {
        if let Some(name) = &self.name {
            props.name = name.clone();
        }
        if let Some(shape) = self.shape {
            props.shape = shape;
        }
        if let Some(diameter) = self.diameter {
            props.diameter = Some(diameter);
        }
        if let Some(width) = self.width {
            props.width = Some(width);
        }
        if let Some(height) = self.height {
            props.height = Some(height);
        }
        if let Some(length) = self.length {
            props.length = length;
        }
        if let Some(material) = self.material {
            props.material = material;
        }
        if let Some(airflow) = self.airflow {
            props.airflow = airflow;
        }
        if let Some(static_pressure) = self.static_pressure {
            props.static_pressure = static_pressure;
        }
        if let Some(system_type) = self.system_type {
            props.system_type = Some(system_type);
        }
    }
}

impl From<SuggestedFix> for DuctPropsPatch {
    fn from(fix: SuggestedFix) -> Self {
        match fix {
            SuggestedFix::Diameter(diameter) => Self::diameter(diameter),
            SuggestedFix::Dimensions { width, height } => Self::dimensions(width, height),
            SuggestedFix::Airflow(airflow) => Self::airflow(airflow),
        }
    }
}

impl From<DuctDimensions> for DuctPropsPatch {
    fn from(dims: DuctDimensions) -> Self {
        Self {
            diameter: dims.diameter,
            width: dims.width,
            height: dims.height,
            ..Default::default()
        }
    }
}

/// 触发重算的来源
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum UpdateSource {
    /// 属性面板编辑
    #[default]
    User,
    /// 一键修正
    Fix,
    /// 上游风量传递
    Propagation,
}

impl UpdateSource {
    pub fn label(&self) -> &'static str {
        match self {
            UpdateSource::User => "Edit duct",
            UpdateSource::Fix => "Apply fix",
            UpdateSource::Propagation => "Propagate airflow",
        }
    }
}

/// 重算所需的风管与管件快照
#[derive(Debug, Clone, Default)]
pub struct DuctContext {
    pub ducts: BTreeMap<EntityId, Entity>,
    pub fittings: BTreeMap<EntityId, Entity>,
}

impl DuctContext {
    pub fn from_store(store: &EntityStore) -> Self {
        let collect = |entity_type: EntityType| {
            store
                .iter_type(entity_type)
                .map(|e| (e.id, e.clone()))
                .collect::<BTreeMap<_, _>>()
        };
        Self {
            ducts: collect(EntityType::Duct),
            fittings: collect(EntityType::Fitting),
        }
    }

    pub fn with_entity(mut self, entity: Entity) -> Self {
        match entity.entity_type() {
            EntityType::Duct => {
                self.ducts.insert(entity.id, entity);
            }
            EntityType::Fitting => {
                self.fittings.insert(entity.id, entity);
            }
            _ => {}
        }
        self
    }

    pub fn duct_props(&self, id: EntityId) -> Option<&DuctProps> {
        self.ducts.get(&id).and_then(Entity::as_duct).map(|d| &d.props)
    }

    /// 直接下游的风管
    fn downstream_of(&self, duct_id: EntityId) -> Vec<EntityId> {
        let mut next = Vec::new();
        if let Some(target) = self.duct_props(duct_id).and_then(|p| p.connected_to) {
            if self.ducts.contains_key(&target) {
                next.push(target);
            }
        }
        for fitting in self.fittings.values().filter_map(Entity::as_fitting) {
            if fitting.props.inlet_duct_id == Some(duct_id) {
                if let Some(outlet) = fitting.props.outlet_duct_id {
                    if outlet != duct_id && !next.contains(&outlet) {
                        next.push(outlet);
                    }
                }
            }
        }
        next
    }
}

/// 单个实体的计算结果
#[derive(Debug, Clone, PartialEq)]
pub struct EntityUpdate {
    pub id: EntityId,
    /// 调度时快照中的状态
    pub previous: Entity,
    pub next: Entity,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EntityViolation {
    pub entity_id: EntityId,
    pub violation: Violation,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParametricUpdateResult {
    pub entity_updates: Vec<EntityUpdate>,
    pub violations: Vec<EntityViolation>,
    pub requires_user_action: bool,
    pub engineering_data: Option<DuctEngineeringData>,
    pub source: UpdateSource,
    /// 被更新的请求取代或被取消
    pub superseded: bool,
    /// 计算所针对的风管与修改；提交时实体已变化则据此重算
    pub duct_id: Option<EntityId>,
    pub patch: DuctPropsPatch,
}

impl ParametricUpdateResult {
    fn superseded() -> Self {
        Self {
            superseded: true,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entity_updates.is_empty()
    }
}

/// 计算一次风管属性变化的全部影响（同步）
pub fn handle_duct_property_change(
    entity_id: EntityId,
    patch: &DuctPropsPatch,
    context: &DuctContext,
    limits: &EngineeringLimits,
    source: UpdateSource,
) -> ParametricUpdateResult {
    let empty = || ParametricUpdateResult {
        source,
        duct_id: Some(entity_id),
        patch: patch.clone(),
        ..Default::default()
    };
    let Some(entity) = context.ducts.get(&entity_id) else {
        debug!("Duct {} no longer exists, dropping recomputation", entity_id);
        return empty();
    };
    let Some(duct) = entity.as_duct() else {
        return empty();
    };

    let validator = ConstraintValidator::new(limits.clone());
    let mut props = duct.props.clone();
    patch.apply(&mut props);
    let (data, status) = validator.check(&props);
    let fitting_diameter = round_to(calc::effective_diameter(&props), 2);
    let violations = status
        .violations
        .iter()
        .cloned()
        .map(|violation| EntityViolation {
            entity_id,
            violation,
        })
        .collect();
    let requires_user_action = !status.is_valid;
    props.engineering_data = Some(data);
    props.constraint_status = Some(status);

    let mut next = entity.clone();
    next.kind = EntityKind::duct(props);
    next.recalculate();
    let mut entity_updates = vec![EntityUpdate {
        id: entity_id,
        previous: entity.clone(),
        next,
    }];

    if fitting_diameter > 0.0 {
        for fitting_entity in context.fittings.values() {
            let Some(fitting) = fitting_entity.as_fitting() else {
                continue;
            };
            if !fitting.props.is_connected_to(entity_id) {
                continue;
            }
            let mut fitting_props = fitting.props.clone();
            fitting_props.diameter = fitting_diameter;
            fitting_props.friction_rate = data.pressure_drop;
            if fitting_props == fitting.props {
                continue;
            }
            let mut next = fitting_entity.clone();
            next.kind = EntityKind::fitting(fitting_props);
            next.recalculate();
            entity_updates.push(EntityUpdate {
                id: fitting_entity.id,
                previous: fitting_entity.clone(),
                next,
            });
        }
    }

    debug!(
        "Recomputed duct {} ({:?}): {} updates, valid: {}",
        entity_id,
        source,
        entity_updates.len(),
        !requires_user_action
    );

    ParametricUpdateResult {
        entity_updates,
        violations,
        requires_user_action,
        engineering_data: Some(data),
        source,
        superseded: false,
        duct_id: Some(entity_id),
        patch: patch.clone(),
    }
}

/// 按目标风速自动选型
pub fn auto_size_duct(props: &DuctProps, target_velocity: f64) -> DuctPropsPatch {
    calc::auto_size(props, target_velocity).into()
}

/// 沿下游方向传递风量，返回需要修改的风管
pub fn propagate_airflow(
    context: &DuctContext,
    start: EntityId,
    airflow: f64,
) -> Vec<(EntityId, DuctPropsPatch)> {
    let mut visited = HashSet::from([start]);
    let mut queue: VecDeque<EntityId> = context.downstream_of(start).into();
    let mut updates = Vec::new();
    while let Some(id) = queue.pop_front() {
        if !visited.insert(id) {
            continue;
        }
        let Some(props) = context.duct_props(id) else {
            continue;
        };
        if props.airflow != airflow {
            updates.push((id, DuctPropsPatch::airflow(airflow)));
        }
        queue.extend(context.downstream_of(id));
    }
    updates
}

/// 路径上风管沿程损失与管件局部损失之和
pub fn system_pressure_drop(context: &DuctContext, path: &[EntityId]) -> f64 {
    let total: f64 = path
        .iter()
        .map(|id| {
            if let Some(duct) = context.ducts.get(id).and_then(Entity::as_duct) {
                duct.calculated.friction_loss
            } else if let Some(fitting) = context.fittings.get(id).and_then(Entity::as_fitting) {
                fitting.calculated.pressure_loss
            } else {
                0.0
            }
        })
        .sum();
    round_to(total, 2)
}

#[derive(Debug)]
struct PendingRequest {
    generation: u64,
    /// 提前唤醒（立即执行）；丢弃即取消
    wake: Option<oneshot::Sender<()>>,
}

/// 随调度返回的 future 一起移动；future 未执行就被丢弃时释放占位
struct PendingGuard {
    pending: Arc<Mutex<HashMap<EntityId, PendingRequest>>>,
    entity_id: EntityId,
    generation: u64,
}

impl PendingGuard {
    /// 仍是该实体的最新请求时移除占位并返回 `true`
    fn release(&self) -> bool {
        let mut pending = lock(&self.pending);
        match pending.get(&self.entity_id) {
            Some(request) if request.generation == self.generation => {
                pending.remove(&self.entity_id);
                true
            }
            _ => false,
        }
    }
}

impl Drop for PendingGuard {
    fn drop(&mut self) {
        if self.release() {
            debug!(
                "Request {} for {} dropped before running",
                self.generation, self.entity_id
            );
        }
    }
}

/// 参数化重算调度
///
/// 同一实体在防抖窗口内的多次请求只有最后一次会被计算，
/// 其余请求以 `superseded` 的空结果返回。不同实体互不阻塞。
#[derive(Debug, Clone, Default)]
pub struct ParametricUpdateService {
    pending: Arc<Mutex<HashMap<EntityId, PendingRequest>>>,
    next_generation: Arc<AtomicU64>,
}

impl ParametricUpdateService {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock_pending(&self) -> MutexGuard<'_, HashMap<EntityId, PendingRequest>> {
        lock(&self.pending)
    }

    /// 调度一次风管属性变化
    ///
    /// 调用时立即取代同一实体上尚未完成的请求；`debounce` 为零时不等待。
    pub fn schedule_duct_property_change(
        &self,
        entity_id: EntityId,
        patch: DuctPropsPatch,
        context: DuctContext,
        limits: EngineeringLimits,
        source: UpdateSource,
        debounce: Duration,
    ) -> impl Future<Output = ParametricUpdateResult> + Send + 'static {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed) + 1;
        let (wake, woken) = oneshot::channel();
        let replaced = self.lock_pending().insert(
            entity_id,
            PendingRequest {
                generation,
                wake: Some(wake),
            },
        );
        if let Some(replaced) = replaced {
            debug!(
                "Request {} for {} superseded by {}",
                replaced.generation, entity_id, generation
            );
        }

        let guard = PendingGuard {
            pending: Arc::clone(&self.pending),
            entity_id,
            generation,
        };
        async move {
            if !debounce.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(debounce) => {}
                    _ = woken => {}
                }
            }

            if !guard.release() {
                return ParametricUpdateResult::superseded();
            }

            handle_duct_property_change(entity_id, &patch, &context, &limits, source)
        }
    }

    /// 让等待中的请求立即执行
    pub fn flush_pending(&self, entity_id: EntityId) -> bool {
        let mut pending = self.lock_pending();
        match pending.get_mut(&entity_id).and_then(|r| r.wake.take()) {
            Some(wake) => wake.send(()).is_ok(),
            None => false,
        }
    }

    /// 取消等待中的请求，其结果为空
    pub fn cancel_pending(&self, entity_id: EntityId) -> bool {
        let cancelled = self.lock_pending().remove(&entity_id).is_some();
        if cancelled {
            info!("Cancelled pending recomputation for {}", entity_id);
        }
        cancelled
    }

    pub fn cancel_all(&self) {
        self.lock_pending().clear();
    }

    pub fn is_pending(&self, entity_id: EntityId) -> bool {
        self.lock_pending().contains_key(&entity_id)
    }

    pub fn pending_count(&self) -> usize {
        self.lock_pending().len()
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{FittingProps, FittingType};
    use tokio::time::Instant;

    fn duct(diameter: f64, airflow: f64) -> Entity {
        Entity::duct(
            0.0,
            0.0,
            0.0,
            DuctProps {
                airflow,
                ..DuctProps::round(diameter)
            },
        )
    }

    fn schedule(
        service: &ParametricUpdateService,
        id: EntityId,
        patch: DuctPropsPatch,
        context: &DuctContext,
        debounce_ms: u64,
    ) -> impl Future<Output = ParametricUpdateResult> + Send + 'static {
        service.schedule_duct_property_change(
            id,
            patch,
            context.clone(),
            EngineeringLimits::default(),
            UpdateSource::User,
            Duration::from_millis(debounce_ms),
        )
    }

    fn updated_airflow(result: &ParametricUpdateResult) -> f64 {
        result.entity_updates[0]
            .next
            .as_duct()
            .unwrap()
            .props
            .airflow
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounce_keeps_only_last_request() {
        let service = ParametricUpdateService::new();
        let target = duct(12.0, 500.0);
        let context = DuctContext::default().with_entity(target.clone());

        let first = tokio::spawn(schedule(&service, target.id, DuctPropsPatch::airflow(600.0), &context, 500));
        tokio::time::sleep(Duration::from_millis(100)).await;
        let second = tokio::spawn(schedule(&service, target.id, DuctPropsPatch::airflow(700.0), &context, 500));

        let first = first.await.unwrap();
        let second = second.await.unwrap();
        assert!(first.superseded);
        assert!(first.is_empty());
        assert!(!second.superseded);
        assert_eq!(updated_airflow(&second), 700.0);
        assert_eq!(service.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_many_rapid_requests_resolve_once() {
        let service = ParametricUpdateService::new();
        let target = duct(12.0, 500.0);
        let context = DuctContext::default().with_entity(target.clone());

        let handles: Vec<_> = (1..=5)
            .map(|i| {
                tokio::spawn(schedule(
                    &service,
                    target.id,
                    DuctPropsPatch::airflow(500.0 + i as f64 * 10.0),
                    &context,
                    500,
                ))
            })
            .collect();

        let mut completed = Vec::new();
        for handle in handles {
            let result = handle.await.unwrap();
            if !result.superseded {
                completed.push(result);
            }
        }
        assert_eq!(completed.len(), 1);
        assert_eq!(updated_airflow(&completed[0]), 550.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_debounce_is_immediate() {
        let service = ParametricUpdateService::new();
        let target = duct(6.0, 1000.0);
        let context = DuctContext::default().with_entity(target.clone());

        let start = Instant::now();
        let result = schedule(&service, target.id, DuctPropsPatch::diameter(9.0), &context, 0).await;
        assert_eq!(start.elapsed(), Duration::ZERO);
        assert!(!result.superseded);
        assert_eq!(result.entity_updates.len(), 1);
        let data = result.engineering_data.unwrap();
        assert_eq!(data.velocity, 2260.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_different_entities_are_independent() {
        let service = ParametricUpdateService::new();
        let a = duct(12.0, 500.0);
        let b = duct(12.0, 500.0);
        let context = DuctContext::default()
            .with_entity(a.clone())
            .with_entity(b.clone());

        let first = tokio::spawn(schedule(&service, a.id, DuctPropsPatch::airflow(800.0), &context, 500));
        let second = tokio::spawn(schedule(&service, b.id, DuctPropsPatch::airflow(900.0), &context, 500));
        assert!(!first.await.unwrap().superseded);
        assert!(!second.await.unwrap().superseded);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_and_cancel() {
        let service = ParametricUpdateService::new();
        let target = duct(12.0, 500.0);
        let context = DuctContext::default().with_entity(target.clone());

        let start = Instant::now();
        let pending = tokio::spawn(schedule(&service, target.id, DuctPropsPatch::airflow(800.0), &context, 10_000));
        assert!(service.flush_pending(target.id));
        let result = pending.await.unwrap();
        assert!(!result.superseded);
        assert!(start.elapsed() < Duration::from_secs(10));

        let pending = tokio::spawn(schedule(&service, target.id, DuctPropsPatch::airflow(900.0), &context, 10_000));
        assert!(service.cancel_pending(target.id));
        let result = pending.await.unwrap();
        assert!(result.superseded);
        assert!(result.is_empty());
        assert!(!service.cancel_pending(target.id));
    }

    #[test]
    fn test_dropped_request_releases_its_slot() {
        let service = ParametricUpdateService::new();
        let target = duct(12.0, 500.0);
        let context = DuctContext::default().with_entity(target.clone());

        let unpolled = schedule(&service, target.id, DuctPropsPatch::airflow(600.0), &context, 500);
        assert!(service.is_pending(target.id));
        drop(unpolled);
        assert!(!service.is_pending(target.id));
        assert_eq!(service.pending_count(), 0);

        // 被取代的旧请求丢弃时不影响新请求
        let older = schedule(&service, target.id, DuctPropsPatch::airflow(600.0), &context, 500);
        let newer = schedule(&service, target.id, DuctPropsPatch::airflow(700.0), &context, 500);
        drop(older);
        assert!(service.is_pending(target.id));
        drop(newer);
        assert_eq!(service.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_entity_resolves_empty() {
        let service = ParametricUpdateService::new();
        let result = schedule(
            &service,
            EntityId::new(),
            DuctPropsPatch::airflow(800.0),
            &DuctContext::default(),
            50,
        )
        .await;
        assert!(result.is_empty());
        assert!(result.violations.is_empty());
        assert!(!result.requires_user_action);
    }

    #[test]
    fn test_connected_fittings_follow_duct() {
        let target = duct(12.0, 1000.0);
        let mut elbow = FittingProps::new(FittingType::Elbow90);
        elbow.inlet_duct_id = Some(target.id);
        let elbow = Entity::fitting(0.0, 0.0, elbow);
        let loose = Entity::fitting(0.0, 0.0, FittingProps::new(FittingType::Tee));
        let context = DuctContext::default()
            .with_entity(target.clone())
            .with_entity(elbow.clone())
            .with_entity(loose);

        let result = handle_duct_property_change(
            target.id,
            &DuctPropsPatch::diameter(16.0),
            &context,
            &EngineeringLimits::default(),
            UpdateSource::User,
        );
        assert_eq!(result.entity_updates.len(), 2);

        let fitting_update = &result.entity_updates[1];
        assert_eq!(fitting_update.id, elbow.id);
        let fitting = fitting_update.next.as_fitting().unwrap();
        assert_eq!(fitting.props.diameter, 16.0);
        assert_eq!(
            fitting.props.friction_rate,
            result.engineering_data.unwrap().pressure_drop
        );
        assert!(fitting_update.next.is_consistent());

        let duct_next = result.entity_updates[0].next.as_duct().unwrap();
        assert!(duct_next.props.engineering_data.is_some());
        assert!(duct_next.props.constraint_status.is_some());
    }

    #[test]
    fn test_undersized_duct_requires_user_action() {
        let target = duct(12.0, 500.0);
        let context = DuctContext::default().with_entity(target.clone());
        let result = handle_duct_property_change(
            target.id,
            &DuctPropsPatch::diameter(6.0),
            &context,
            &EngineeringLimits::default(),
            UpdateSource::User,
        );
        assert!(result.requires_user_action);
        assert!(result
            .violations
            .iter()
            .all(|v| v.entity_id == target.id));
    }

    #[test]
    fn test_auto_size_duct() {
        let props = DuctProps {
            airflow: 1000.0,
            ..DuctProps::round(6.0)
        };
        let patch = auto_size_duct(&props, 1000.0);
        assert_eq!(patch, DuctPropsPatch::diameter(14.0));
    }

    #[test]
    fn test_propagate_airflow_follows_chain() {
        let mut a = duct(12.0, 800.0);
        let mut b = duct(12.0, 500.0);
        let c = duct(12.0, 500.0);
        let mut elbow = FittingProps::new(FittingType::Elbow90);
        elbow.inlet_duct_id = Some(b.id);
        elbow.outlet_duct_id = Some(c.id);

        a.as_duct_mut().unwrap().props.connected_to = Some(b.id);
        b.as_duct_mut().unwrap().props.connected_to = Some(a.id);
        let context = DuctContext::default()
            .with_entity(a.clone())
            .with_entity(b.clone())
            .with_entity(c.clone())
            .with_entity(Entity::fitting(0.0, 0.0, elbow));

        let updates = propagate_airflow(&context, a.id, 800.0);
        let ids: Vec<_> = updates.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![b.id, c.id]);
        assert!(updates
            .iter()
            .all(|(_, patch)| *patch == DuctPropsPatch::airflow(800.0)));
    }

    #[test]
    fn test_system_pressure_drop() {
        let a = duct(12.0, 1000.0);
        let mut elbow = FittingProps::new(FittingType::Elbow90);
        elbow.friction_rate = 0.1;
        let elbow = Entity::fitting(0.0, 0.0, elbow);
        let context = DuctContext::default()
            .with_entity(a.clone())
            .with_entity(elbow.clone());

        let duct_loss = a.as_duct().unwrap().calculated.friction_loss;
        let total = system_pressure_drop(&context, &[a.id, elbow.id, EntityId::new()]);
        assert_eq!(total, round_to(duct_loss + 0.03, 2));
    }
}
