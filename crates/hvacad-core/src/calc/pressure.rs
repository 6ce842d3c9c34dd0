//! 压力损失计算

use crate::entity::{FittingCalculated, FittingProps, FittingType};
use crate::math::round_to;

/// 镀锌钢板基准粗糙度（英尺）
const REFERENCE_ROUGHNESS: f64 = 0.0005;

/// 标准空气下的风速压换算常数
const VELOCITY_PRESSURE_CONSTANT: f64 = 4005.0;

/// 沿程摩擦损失（in.w.g.，两位小数）
///
/// 摩擦图近似公式，粗糙度修正下限为 0.5。任一输入非正时返回 0。
pub fn friction_loss(velocity_fpm: f64, diameter_in: f64, length_ft: f64, roughness_ft: f64) -> f64 {
    if velocity_fpm <= 0.0 || diameter_in <= 0.0 || length_ft <= 0.0 || roughness_ft <= 0.0 {
        return 0.0;
    }
    let roughness_factor = (roughness_ft / REFERENCE_ROUGHNESS).max(0.5);
    let per_100ft = 0.109136
        * (velocity_fpm / 1000.0).powf(1.9)
        * (12.0 / diameter_in).powf(1.22)
        * roughness_factor;
    round_to(per_100ft / 100.0 * length_ft, 2)
}

/// 管件局部损失（in.w.g.）
pub fn fitting_loss(friction_per_100ft: f64, equivalent_length_ft: f64) -> f64 {
    if friction_per_100ft <= 0.0 || equivalent_length_ft <= 0.0 {
        return 0.0;
    }
    round_to(friction_per_100ft / 100.0 * equivalent_length_ft, 2)
}

/// 动压（in.w.g.）
pub fn velocity_pressure(velocity_fpm: f64) -> f64 {
    round_to((velocity_fpm / VELOCITY_PRESSURE_CONSTANT).powi(2), 2)
}

impl FittingType {
    /// 当量长度系数（L/D）
    pub fn length_factor(&self) -> f64 {
        match self {
            FittingType::Elbow90 => 30.0,
            FittingType::Elbow45 => 16.0,
            FittingType::Tee => 60.0,
            FittingType::Reducer => 12.0,
            FittingType::Cap => 0.0,
        }
    }
}

/// 管件当量长度（英尺）
pub fn fitting_equivalent_length(fitting_type: FittingType, diameter_in: f64) -> f64 {
    round_to(fitting_type.length_factor() * diameter_in / 12.0, 2)
}

pub fn fitting_calculated(props: &FittingProps) -> FittingCalculated {
    let equivalent_length = fitting_equivalent_length(props.fitting_type, props.diameter);
    FittingCalculated {
        equivalent_length,
        pressure_loss: fitting_loss(props.friction_rate, equivalent_length),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_friction_loss_non_positive_inputs() {
        assert_eq!(friction_loss(0.0, 12.0, 100.0, 0.0005), 0.0);
        assert_eq!(friction_loss(1000.0, -1.0, 100.0, 0.0005), 0.0);
        assert_eq!(friction_loss(1000.0, 12.0, 0.0, 0.0005), 0.0);
        assert_eq!(friction_loss(1000.0, 12.0, 100.0, 0.0), 0.0);
    }

    #[test]
    fn test_friction_loss_reference_point() {
        // 1000 FPM, 12 in, galvanized: 0.109 per 100 ft
        assert_eq!(friction_loss(1000.0, 12.0, 100.0, 0.0005), 0.11);
        // 粗糙度修正下限 0.5
        assert_eq!(
            friction_loss(2000.0, 12.0, 100.0, 0.0001),
            friction_loss(2000.0, 12.0, 100.0, 0.00025)
        );
        assert!(friction_loss(2000.0, 12.0, 100.0, 0.003) > friction_loss(2000.0, 12.0, 100.0, 0.0005));
    }

    #[test]
    fn test_fitting_loss() {
        assert_eq!(fitting_loss(0.1, 30.0), 0.03);
        assert_eq!(fitting_loss(0.0, 30.0), 0.0);
        assert_eq!(fitting_loss(0.1, -5.0), 0.0);
    }

    #[test]
    fn test_velocity_pressure() {
        assert_eq!(velocity_pressure(4005.0), 1.0);
        assert_eq!(velocity_pressure(2000.0), 0.25);
        assert_eq!(velocity_pressure(0.0), 0.0);
    }

    #[test]
    fn test_fitting_calculated() {
        let mut props = FittingProps::new(FittingType::Elbow90);
        props.diameter = 12.0;
        props.friction_rate = 0.1;
        let calc = fitting_calculated(&props);
        assert_eq!(calc.equivalent_length, 30.0);
        assert_eq!(calc.pressure_loss, 0.03);

        props.fitting_type = FittingType::Cap;
        let calc = fitting_calculated(&props);
        assert_eq!(calc.equivalent_length, 0.0);
        assert_eq!(calc.pressure_loss, 0.0);
    }
}
