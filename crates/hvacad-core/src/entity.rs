//! 实体定义
//!
//! 每个设计对象都是一个 `Entity`：公共字段（标识、变换、层级、时间戳）
//! 加上按类型区分的 `EntityKind`。派生值（`calculated`）始终由属性计算得出，
//! 任何修改后都要调用 [`Entity::recalculate`]。

use crate::calc;
use crate::error::ValidationError;
use crate::math::{BoundingBox2, Point2};
use crate::validator::{ConstraintStatus, DuctEngineeringData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// 实体唯一标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// 默认层级（不同工具创建的实体使用固定基准值）
pub mod z_index {
    pub const ROOM: i32 = 0;
    pub const DUCT: i32 = 5;
    pub const EQUIPMENT: i32 = 5;
    pub const FITTING: i32 = 10;
    pub const NOTE: i32 = 100;
    pub const GROUP: i32 = 0;
}

/// 实体变换（英寸，角度）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub x: f64,
    pub y: f64,
    /// 旋转角度（度）
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

impl Transform {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn with_rotation(mut self, rotation: f64) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn position(&self) -> Point2 {
        Point2::new(self.x, self.y)
    }

    pub fn translated(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }
}

/// 实体类型标签
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Room,
    Duct,
    Equipment,
    Fitting,
    Note,
    Group,
}

impl EntityType {
    pub fn label(&self) -> &'static str {
        match self {
            EntityType::Room => "Room",
            EntityType::Duct => "Duct",
            EntityType::Equipment => "Equipment",
            EntityType::Fitting => "Fitting",
            EntityType::Note => "Note",
            EntityType::Group => "Group",
        }
    }

    pub fn base_z_index(&self) -> i32 {
        match self {
            EntityType::Room => z_index::ROOM,
            EntityType::Duct => z_index::DUCT,
            EntityType::Equipment => z_index::EQUIPMENT,
            EntityType::Fitting => z_index::FITTING,
            EntityType::Note => z_index::NOTE,
            EntityType::Group => z_index::GROUP,
        }
    }
}

// ========== 枚举属性 ==========

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OccupancyType {
    Office,
    Retail,
    Restaurant,
    KitchenCommercial,
    Warehouse,
    Classroom,
    Conference,
    Lobby,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuctShape {
    Round,
    Rectangular,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuctMaterial {
    Galvanized,
    Stainless,
    Aluminum,
    Flex,
}

impl DuctMaterial {
    /// 绝对粗糙度（英尺）
    pub fn roughness(&self) -> f64 {
        match self {
            DuctMaterial::Galvanized => 0.0005,
            DuctMaterial::Stainless | DuctMaterial::Aluminum => 0.0002,
            DuctMaterial::Flex => 0.003,
        }
    }
}

/// 风管所属系统
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemType {
    Supply,
    Return,
    Exhaust,
    OutsideAir,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentType {
    Hood,
    Fan,
    Diffuser,
    Damper,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FittingType {
    #[serde(rename = "elbow_90")]
    Elbow90,
    #[serde(rename = "elbow_45")]
    Elbow45,
    #[serde(rename = "tee")]
    Tee,
    #[serde(rename = "reducer")]
    Reducer,
    #[serde(rename = "cap")]
    Cap,
}

// ========== 房间 ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomProps {
    pub name: String,
    /// 宽度（英寸）
    pub width: f64,
    /// 长度（英寸）
    pub length: f64,
    /// 层高（英寸）
    pub ceiling_height: f64,
    pub occupancy_type: OccupancyType,
    pub air_changes_per_hour: f64,
    pub notes: Option<String>,
}

impl Default for RoomProps {
    fn default() -> Self {
        Self {
            name: "Room".to_string(),
            width: 120.0,
            length: 120.0,
            ceiling_height: 96.0,
            occupancy_type: OccupancyType::Office,
            air_changes_per_hour: 4.0,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RoomCalculated {
    /// 面积（平方英尺）
    pub area: f64,
    /// 体积（立方英尺）
    pub volume: f64,
    pub required_cfm: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Room {
    pub props: RoomProps,
    pub calculated: RoomCalculated,
}

// ========== 风管 ==========

/// 风管截面尺寸（英寸）
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DuctDimensions {
    pub diameter: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DuctProps {
    pub name: String,
    pub shape: DuctShape,
    pub diameter: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
    /// 长度（英尺）
    pub length: f64,
    pub material: DuctMaterial,
    /// 风量（CFM）
    pub airflow: f64,
    /// 静压（in.w.g.）
    pub static_pressure: f64,
    pub system_type: Option<SystemType>,
    pub connected_from: Option<EntityId>,
    pub connected_to: Option<EntityId>,
    pub engineering_data: Option<DuctEngineeringData>,
    pub constraint_status: Option<ConstraintStatus>,
}

impl Default for DuctProps {
    fn default() -> Self {
        Self::round(12.0)
    }
}

impl DuctProps {
    pub fn round(diameter: f64) -> Self {
        Self {
            name: "Duct".to_string(),
            shape: DuctShape::Round,
            diameter: Some(diameter),
            width: None,
            height: None,
            length: 10.0,
            material: DuctMaterial::Galvanized,
            airflow: 500.0,
            static_pressure: 0.1,
            system_type: None,
            connected_from: None,
            connected_to: None,
            engineering_data: None,
            constraint_status: None,
        }
    }

    pub fn rectangular(width: f64, height: f64) -> Self {
        Self {
            shape: DuctShape::Rectangular,
            diameter: None,
            width: Some(width),
            height: Some(height),
            ..Self::round(12.0)
        }
    }

    pub fn dimensions(&self) -> DuctDimensions {
        DuctDimensions {
            diameter: self.diameter,
            width: self.width,
            height: self.height,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DuctCalculated {
    /// 截面积（平方英寸）
    pub area: f64,
    /// 风速（FPM）
    pub velocity: f64,
    /// 沿程损失（in.w.g.）
    pub friction_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Duct {
    pub props: DuctProps,
    pub calculated: DuctCalculated,
}

// ========== 设备 ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EquipmentProps {
    pub name: String,
    pub equipment_type: EquipmentType,
    pub manufacturer: Option<String>,
    pub model_number: Option<String>,
    /// 处理能力（CFM）
    pub capacity: f64,
    pub static_pressure: f64,
    pub width: f64,
    pub depth: f64,
    pub height: f64,
}

impl EquipmentProps {
    /// 按设备类型给出默认参数
    pub fn for_type(equipment_type: EquipmentType) -> Self {
        let (capacity, static_pressure, width, depth, height) = match equipment_type {
            EquipmentType::Hood => (1000.0, 0.5, 48.0, 36.0, 24.0),
            EquipmentType::Fan => (2000.0, 1.0, 24.0, 24.0, 24.0),
            EquipmentType::Diffuser => (200.0, 0.1, 24.0, 24.0, 8.0),
            EquipmentType::Damper => (500.0, 0.05, 12.0, 12.0, 6.0),
        };
        Self {
            name: "Equipment".to_string(),
            equipment_type,
            manufacturer: None,
            model_number: None,
            capacity,
            static_pressure,
            width,
            depth,
            height,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Equipment {
    pub props: EquipmentProps,
}

// ========== 管件 ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FittingProps {
    pub fitting_type: FittingType,
    pub inlet_duct_id: Option<EntityId>,
    pub outlet_duct_id: Option<EntityId>,
    /// 连接管径（英寸）
    pub diameter: f64,
    /// 每百英尺摩擦损失（in.w.g.）
    pub friction_rate: f64,
}

impl FittingProps {
    pub fn new(fitting_type: FittingType) -> Self {
        Self {
            fitting_type,
            inlet_duct_id: None,
            outlet_duct_id: None,
            diameter: 12.0,
            friction_rate: 0.1,
        }
    }

    /// 是否连接到指定风管
    pub fn is_connected_to(&self, duct_id: EntityId) -> bool {
        self.inlet_duct_id == Some(duct_id) || self.outlet_duct_id == Some(duct_id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FittingCalculated {
    /// 当量长度（英尺）
    pub equivalent_length: f64,
    pub pressure_loss: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fitting {
    pub props: FittingProps,
    pub calculated: FittingCalculated,
}

// ========== 注释与分组 ==========

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteProps {
    pub content: String,
    pub font_size: f64,
}

impl Default for NoteProps {
    fn default() -> Self {
        Self {
            content: String::new(),
            font_size: 14.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub props: NoteProps,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GroupProps {
    pub name: String,
    pub child_ids: Vec<EntityId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    pub props: GroupProps,
}

/// 按类型区分的实体数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EntityKind {
    Room(Room),
    Duct(Duct),
    Equipment(Equipment),
    Fitting(Fitting),
    Note(Note),
    Group(Group),
}

impl EntityKind {
    pub fn room(props: RoomProps) -> Self {
        EntityKind::Room(Room {
            props,
            calculated: RoomCalculated::default(),
        })
    }

    pub fn duct(props: DuctProps) -> Self {
        EntityKind::Duct(Duct {
            props,
            calculated: DuctCalculated::default(),
        })
    }

    pub fn fitting(props: FittingProps) -> Self {
        EntityKind::Fitting(Fitting {
            props,
            calculated: FittingCalculated::default(),
        })
    }

    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityKind::Room(_) => EntityType::Room,
            EntityKind::Duct(_) => EntityType::Duct,
            EntityKind::Equipment(_) => EntityType::Equipment,
            EntityKind::Fitting(_) => EntityType::Fitting,
            EntityKind::Note(_) => EntityType::Note,
            EntityKind::Group(_) => EntityType::Group,
        }
    }

    /// 由属性重新计算派生值
    pub fn recalculate(&mut self) {
        match self {
            EntityKind::Room(room) => room.calculated = calc::room_calculated_values(&room.props),
            EntityKind::Duct(duct) => duct.calculated = calc::duct_calculated(&duct.props),
            EntityKind::Fitting(fitting) => {
                fitting.calculated = calc::fitting_calculated(&fitting.props)
            }
            EntityKind::Equipment(_) | EntityKind::Note(_) | EntityKind::Group(_) => {}
        }
    }

    /// 属性范围校验
    pub fn validate(&self) -> Result<(), ValidationError> {
        match self {
            EntityKind::Room(room) => validate_room(&room.props),
            EntityKind::Duct(duct) => validate_duct(&duct.props),
            EntityKind::Equipment(equipment) => validate_equipment(&equipment.props),
            EntityKind::Fitting(fitting) => validate_fitting(&fitting.props),
            EntityKind::Note(note) => validate_note(&note.props),
            EntityKind::Group(group) => validate_name("name", &group.props.name),
        }
    }
}

/// 设计对象
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub transform: Transform,
    pub z_index: i32,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    #[serde(flatten)]
    pub kind: EntityKind,
}

impl Entity {
    /// 创建实体，层级取类型基准值，派生值立即计算
    pub fn new(kind: EntityKind, transform: Transform) -> Self {
        let now = Utc::now();
        let mut entity = Self {
            id: EntityId::new(),
            transform,
            z_index: kind.entity_type().base_z_index(),
            created_at: now,
            modified_at: now,
            kind,
        };
        entity.recalculate();
        entity
    }

    pub fn room(x: f64, y: f64, props: RoomProps) -> Self {
        Self::new(EntityKind::room(props), Transform::at(x, y))
    }

    pub fn duct(x: f64, y: f64, rotation: f64, props: DuctProps) -> Self {
        Self::new(
            EntityKind::duct(props),
            Transform::at(x, y).with_rotation(rotation),
        )
    }

    pub fn equipment(x: f64, y: f64, props: EquipmentProps) -> Self {
        Self::new(EntityKind::Equipment(Equipment { props }), Transform::at(x, y))
    }

    pub fn fitting(x: f64, y: f64, props: FittingProps) -> Self {
        Self::new(EntityKind::fitting(props), Transform::at(x, y))
    }

    pub fn note(x: f64, y: f64, props: NoteProps) -> Self {
        Self::new(EntityKind::Note(Note { props }), Transform::at(x, y))
    }

    pub fn group(x: f64, y: f64, props: GroupProps) -> Self {
        Self::new(EntityKind::Group(Group { props }), Transform::at(x, y))
    }

    pub fn with_id(mut self, id: EntityId) -> Self {
        self.id = id;
        self
    }

    pub fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    pub fn recalculate(&mut self) {
        self.kind.recalculate();
    }

    /// 派生值是否与属性一致
    pub fn is_consistent(&self) -> bool {
        let mut expected = self.kind.clone();
        expected.recalculate();
        expected == self.kind
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        self.kind.validate()
    }

    pub fn name(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Room(room) => Some(&room.props.name),
            EntityKind::Duct(duct) => Some(&duct.props.name),
            EntityKind::Equipment(equipment) => Some(&equipment.props.name),
            EntityKind::Group(group) => Some(&group.props.name),
            EntityKind::Fitting(_) | EntityKind::Note(_) => None,
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        match &mut self.kind {
            EntityKind::Room(room) => room.props.name = name,
            EntityKind::Duct(duct) => duct.props.name = name,
            EntityKind::Equipment(equipment) => equipment.props.name = name,
            EntityKind::Group(group) => group.props.name = name,
            EntityKind::Fitting(_) | EntityKind::Note(_) => {}
        }
    }

    pub fn as_duct(&self) -> Option<&Duct> {
        match &self.kind {
            EntityKind::Duct(duct) => Some(duct),
            _ => None,
        }
    }

    pub fn as_duct_mut(&mut self) -> Option<&mut Duct> {
        match &mut self.kind {
            EntityKind::Duct(duct) => Some(duct),
            _ => None,
        }
    }

    pub fn as_fitting(&self) -> Option<&Fitting> {
        match &self.kind {
            EntityKind::Fitting(fitting) => Some(fitting),
            _ => None,
        }
    }

    pub fn as_room(&self) -> Option<&Room> {
        match &self.kind {
            EntityKind::Room(room) => Some(room),
            _ => None,
        }
    }

    /// 用于命中测试与框选的包围盒
    pub fn bounds(&self) -> BoundingBox2 {
        let Transform { x, y, .. } = self.transform;
        match &self.kind {
            EntityKind::Room(room) => {
                BoundingBox2::from_origin_size(x, y, room.props.width, room.props.length)
            }
            EntityKind::Equipment(equipment) => {
                BoundingBox2::from_origin_size(x, y, equipment.props.width, equipment.props.depth)
            }
            EntityKind::Duct(duct) => {
                let props = &duct.props;
                let thickness = props
                    .width
                    .or(props.height)
                    .or(props.diameter)
                    .unwrap_or(10.0);
                BoundingBox2::from_origin_size(x, y, props.length * 12.0, thickness)
            }
            EntityKind::Fitting(_) => BoundingBox2::from_origin_size(x - 15.0, y - 15.0, 30.0, 30.0),
            EntityKind::Note(_) => BoundingBox2::from_origin_size(x, y, 100.0, 50.0),
            EntityKind::Group(_) => BoundingBox2::from_origin_size(x, y, 100.0, 100.0),
        }
    }
}

// ========== 属性校验 ==========

fn check_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValidationError::new(
            field,
            format!("must be between {} and {}, got {}", min, max, value),
        ));
    }
    Ok(())
}

fn check_positive(field: &'static str, value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValidationError::new(field, format!("must be positive, got {}", value)));
    }
    Ok(())
}

fn validate_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    let len = name.trim().chars().count();
    if len == 0 {
        return Err(ValidationError::new(field, "must not be empty"));
    }
    if name.chars().count() > 100 {
        return Err(ValidationError::new(field, "must be at most 100 characters"));
    }
    Ok(())
}

fn validate_room(props: &RoomProps) -> Result<(), ValidationError> {
    validate_name("name", &props.name)?;
    check_range("width", props.width, 1.0, 10_000.0)?;
    check_range("length", props.length, 1.0, 10_000.0)?;
    check_range("ceiling_height", props.ceiling_height, 1.0, 500.0)?;
    check_range("air_changes_per_hour", props.air_changes_per_hour, 1.0, 100.0)
}

fn validate_duct(props: &DuctProps) -> Result<(), ValidationError> {
    validate_name("name", &props.name)?;
    match props.shape {
        DuctShape::Round => {
            let diameter = props
                .diameter
                .ok_or_else(|| ValidationError::new("diameter", "required for round ducts"))?;
            check_range("diameter", diameter, 4.0, 60.0)?;
        }
        DuctShape::Rectangular => {
            let (width, height) = props.width.zip(props.height).ok_or_else(|| {
                ValidationError::new("width", "width and height required for rectangular ducts")
            })?;
            check_range("width", width, 4.0, 96.0)?;
            check_range("height", height, 4.0, 96.0)?;
        }
    }
    check_range("length", props.length, 0.1, 1000.0)?;
    check_range("airflow", props.airflow, 1.0, 100_000.0)?;
    check_range("static_pressure", props.static_pressure, 0.0, 20.0)
}

fn validate_equipment(props: &EquipmentProps) -> Result<(), ValidationError> {
    validate_name("name", &props.name)?;
    check_range("capacity", props.capacity, 1.0, 100_000.0)?;
    check_range("static_pressure", props.static_pressure, 0.0, 20.0)?;
    check_positive("width", props.width)?;
    check_positive("depth", props.depth)?;
    check_positive("height", props.height)
}

fn validate_fitting(props: &FittingProps) -> Result<(), ValidationError> {
    check_positive("diameter", props.diameter)?;
    if !props.friction_rate.is_finite() || props.friction_rate < 0.0 {
        return Err(ValidationError::new("friction_rate", "must not be negative"));
    }
    Ok(())
}

fn validate_note(props: &NoteProps) -> Result<(), ValidationError> {
    check_positive("font_size", props.font_size)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_is_calculated() {
        let room = Entity::room(0.0, 0.0, RoomProps::default());
        assert_eq!(room.z_index, z_index::ROOM);
        assert!(room.is_consistent());
        let calculated = room.as_room().unwrap().calculated;
        assert_eq!(calculated.area, 100.0);
        assert_eq!(calculated.volume, 800.0);

        let duct = Entity::duct(0.0, 0.0, 0.0, DuctProps::round(6.0));
        assert_eq!(duct.z_index, z_index::DUCT);
        assert_eq!(duct.as_duct().unwrap().calculated.area, 28.27);
    }

    #[test]
    fn test_stale_calculated_detected() {
        let mut duct = Entity::duct(0.0, 0.0, 0.0, DuctProps::round(10.0));
        duct.as_duct_mut().unwrap().props.diameter = Some(14.0);
        assert!(!duct.is_consistent());
        duct.recalculate();
        assert!(duct.is_consistent());
    }

    #[test]
    fn test_bounds_per_variant() {
        let duct = Entity::duct(10.0, 20.0, 0.0, DuctProps::round(8.0));
        let bounds = duct.bounds();
        assert_eq!(bounds.width(), 120.0);
        assert_eq!(bounds.height(), 8.0);

        let fitting = Entity::fitting(50.0, 50.0, FittingProps::new(FittingType::Tee));
        assert_eq!(fitting.bounds().min, Point2::new(35.0, 35.0));

        let fan = Entity::equipment(0.0, 0.0, EquipmentProps::for_type(EquipmentType::Hood));
        assert_eq!(fan.bounds().width(), 48.0);
        assert_eq!(fan.bounds().height(), 36.0);
    }

    #[test]
    fn test_validation_ranges() {
        let mut props = DuctProps::round(3.0);
        assert_eq!(validate_duct(&props).unwrap_err().field, "diameter");
        props.diameter = Some(12.0);
        assert!(validate_duct(&props).is_ok());

        let mut rect = DuctProps::rectangular(12.0, 8.0);
        rect.height = None;
        assert!(validate_duct(&rect).is_err());

        let room = RoomProps {
            name: "   ".to_string(),
            ..Default::default()
        };
        assert_eq!(validate_room(&room).unwrap_err().field, "name");

        let room = RoomProps {
            ceiling_height: 600.0,
            ..Default::default()
        };
        assert_eq!(validate_room(&room).unwrap_err().field, "ceiling_height");
    }

    #[test]
    fn test_serde_tagged_round_trip() {
        let entity = Entity::fitting(0.0, 0.0, FittingProps::new(FittingType::Elbow90));
        let json = serde_json::to_string(&entity).unwrap();
        assert!(json.contains("\"type\":\"fitting\""));
        assert!(json.contains("elbow_90"));
        let back: Entity = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entity);
    }
}
