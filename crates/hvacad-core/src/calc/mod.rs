//! 暖通计算引擎
//!
//! 纯函数，无副作用，不访问实体存储。所有舍入规则都是精确约定：
//! 面积保留两位小数，风速取整到 10 FPM，风量取整到 5 CFM。

pub mod duct;
pub mod pressure;
pub mod ventilation;

pub use duct::{
    auto_size, duct_area, duct_calculated, effective_diameter, equivalent_diameter,
    rectangular_for_area, reynolds_number, round_diameter, velocity,
};
pub use pressure::{
    fitting_calculated, fitting_equivalent_length, fitting_loss, friction_loss, velocity_pressure,
};
pub use ventilation::{
    ach_to_cfm, room_area, room_calculated_values, room_volume, ventilation_cfm,
    OccupancyStandards,
};
