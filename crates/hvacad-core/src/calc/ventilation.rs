//! 房间面积、体积与通风量计算

use crate::entity::{OccupancyType, RoomCalculated, RoomProps};
use crate::math::{round_to, round_to_nearest};

/// 按使用类型的通风标准
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OccupancyStandards {
    /// 每人新风量（CFM/人）
    pub rp: f64,
    /// 单位面积新风量（CFM/ft²）
    pub ra: f64,
    /// 默认人员密度（人/1000 ft²）
    pub default_occupant_density: f64,
    /// 默认换气次数
    pub default_ach: f64,
}

impl OccupancyType {
    pub fn standards(&self) -> OccupancyStandards {
        let (rp, ra, default_occupant_density, default_ach) = match self {
            OccupancyType::Office => (5.0, 0.06, 5.0, 4.0),
            OccupancyType::Retail => (7.5, 0.06, 15.0, 6.0),
            OccupancyType::Restaurant => (7.5, 0.18, 70.0, 20.0),
            OccupancyType::KitchenCommercial => (0.0, 0.7, 10.0, 25.0),
            OccupancyType::Warehouse => (10.0, 0.06, 2.0, 3.0),
            OccupancyType::Classroom => (10.0, 0.12, 35.0, 6.0),
            OccupancyType::Conference => (5.0, 0.06, 50.0, 6.0),
            OccupancyType::Lobby => (5.0, 0.06, 30.0, 6.0),
        };
        OccupancyStandards {
            rp,
            ra,
            default_occupant_density,
            default_ach,
        }
    }
}

/// 面积（平方英尺，两位小数）
pub fn room_area(width_in: f64, length_in: f64) -> f64 {
    round_to((width_in / 12.0) * (length_in / 12.0), 2)
}

/// 体积（立方英尺，两位小数）
pub fn room_volume(width_in: f64, length_in: f64, height_in: f64) -> f64 {
    round_to(room_area(width_in, length_in) * height_in / 12.0, 2)
}

/// 换气次数换算风量（取整到 5 CFM）
pub fn ach_to_cfm(ach: f64, volume_cuft: f64) -> f64 {
    round_to_nearest(volume_cuft * ach / 60.0, 5.0)
}

/// 新风量 `Rp×人数 + Ra×面积`（取整到 5 CFM）
pub fn ventilation_cfm(occupancy: OccupancyType, area_sqft: f64, occupants: Option<f64>) -> f64 {
    let standards = occupancy.standards();
    let occupants =
        occupants.unwrap_or(area_sqft / 1000.0 * standards.default_occupant_density);
    round_to_nearest(standards.rp * occupants + standards.ra * area_sqft, 5.0)
}

pub fn room_calculated_values(props: &RoomProps) -> RoomCalculated {
    let area = room_area(props.width, props.length);
    let volume = room_volume(props.width, props.length, props.ceiling_height);
    let by_ach = ach_to_cfm(props.air_changes_per_hour, volume);
    let by_ventilation = ventilation_cfm(props.occupancy_type, area, None);
    RoomCalculated {
        area,
        volume,
        required_cfm: by_ach.max(by_ventilation),
    }
}
