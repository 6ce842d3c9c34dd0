//! 风管尺寸与风速计算

use crate::entity::{DuctCalculated, DuctDimensions, DuctProps, DuctShape};
use crate::math::{round_to, round_to_nearest};
use std::f64::consts::PI;

/// 矩形风管自动选型的宽高比
pub const AUTO_SIZE_ASPECT_RATIO: f64 = 1.5;

/// 最小风管边长（英寸）
pub const MIN_DUCT_DIMENSION: f64 = 4.0;

/// 空气运动粘度（ft²/s）
const KINEMATIC_VISCOSITY: f64 = 0.0001568;

/// 截面积（平方英寸，两位小数）；尺寸缺失时为 0
pub fn duct_area(shape: DuctShape, dims: &DuctDimensions) -> f64 {
    match shape {
        DuctShape::Round => match dims.diameter {
            Some(diameter) => {
                let radius = diameter / 2.0;
                round_to(PI * radius * radius, 2)
            }
            None => 0.0,
        },
        DuctShape::Rectangular => match (dims.width, dims.height) {
            (Some(width), Some(height)) => round_to(width * height, 2),
            _ => 0.0,
        },
    }
}

/// 风速（FPM，取整到 10）
pub fn velocity(cfm: f64, area_sq_in: f64) -> f64 {
    if area_sq_in <= 0.0 {
        return 0.0;
    }
    round_to_nearest(cfm / (area_sq_in / 144.0), 10.0)
}

/// 达到目标风速所需的圆管直径（英寸，两位小数）
pub fn round_diameter(cfm: f64, target_fpm: f64) -> f64 {
    if target_fpm <= 0.0 {
        return 0.0;
    }
    let area_sq_in = cfm / target_fpm * 144.0;
    round_to((4.0 * area_sq_in / PI).sqrt(), 2)
}

/// 矩形风管当量直径（ASHRAE，两位小数）
pub fn equivalent_diameter(width: f64, height: f64) -> f64 {
    if width <= 0.0 || height <= 0.0 {
        return 0.0;
    }
    round_to(1.30 * (width * height).powf(0.625) / (width + height).powf(0.25), 2)
}

/// 用于摩擦计算的有效直径：圆管取直径，矩形取当量直径
pub fn effective_diameter(props: &DuctProps) -> f64 {
    match props.shape {
        DuctShape::Round => props.diameter.unwrap_or(0.0),
        DuctShape::Rectangular => match (props.width, props.height) {
            (Some(width), Some(height)) => equivalent_diameter(width, height),
            _ => 0.0,
        },
    }
}

/// 给定面积与宽高比的矩形尺寸（整数英寸，不小于最小边长）
pub fn rectangular_for_area(area_sq_in: f64, aspect_ratio: f64) -> (f64, f64) {
    let height = (area_sq_in / aspect_ratio).sqrt();
    let width = height * aspect_ratio;
    (
        width.round().max(MIN_DUCT_DIMENSION),
        height.round().max(MIN_DUCT_DIMENSION),
    )
}

/// 按目标风速自动选型，返回新的截面尺寸
pub fn auto_size(props: &DuctProps, target_velocity: f64) -> DuctDimensions {
    match props.shape {
        DuctShape::Round => DuctDimensions {
            diameter: Some(
                round_diameter(props.airflow, target_velocity)
                    .round()
                    .max(MIN_DUCT_DIMENSION),
            ),
            ..Default::default()
        },
        DuctShape::Rectangular => {
            let area = if target_velocity > 0.0 {
                props.airflow / target_velocity * 144.0
            } else {
                0.0
            };
            let (width, height) = rectangular_for_area(area, AUTO_SIZE_ASPECT_RATIO);
            DuctDimensions {
                diameter: None,
                width: Some(width),
                height: Some(height),
            }
        }
    }
}

/// 雷诺数
pub fn reynolds_number(velocity_fpm: f64, diameter_in: f64) -> f64 {
    (velocity_fpm / 60.0) * (diameter_in / 12.0) / KINEMATIC_VISCOSITY
}

/// 风管派生值
pub fn duct_calculated(props: &DuctProps) -> DuctCalculated {
    let area = duct_area(props.shape, &props.dimensions());
    let velocity = velocity(props.airflow, area);
    let diameter = match effective_diameter(props) {
        d if d > 0.0 => d,
        _ => 1.0,
    };
    let friction_loss = super::friction_loss(
        velocity,
        diameter,
        props.length,
        props.material.roughness(),
    );
    DuctCalculated {
        area,
        velocity,
        friction_loss,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_area() {
        let dims = DuctDimensions {
            diameter: Some(6.0),
            ..Default::default()
        };
        assert_eq!(duct_area(DuctShape::Round, &dims), 28.27);
        assert_eq!(duct_area(DuctShape::Rectangular, &dims), 0.0);
    }

    #[test]
    fn test_rectangular_area() {
        let dims = DuctDimensions {
            diameter: None,
            width: Some(12.0),
            height: Some(8.0),
        };
        assert_eq!(duct_area(DuctShape::Rectangular, &dims), 96.0);
    }

    #[test]
    fn test_velocity_rounds_to_ten() {
        assert_eq!(velocity(500.0, 28.27), 2550.0);
        assert_eq!(velocity(500.0, 0.0), 0.0);
        assert_eq!(velocity(500.0, 144.0), 500.0);
        assert_eq!(velocity(1000.0, 113.1) % 10.0, 0.0);
    }

    #[test]
    fn test_round_diameter() {
        // 1000 CFM @ 1000 FPM -> 1 ft² -> 13.54 in
        assert_eq!(round_diameter(1000.0, 1000.0), 13.54);
        assert_eq!(round_diameter(1000.0, 0.0), 0.0);
    }

    #[test]
    fn test_equivalent_diameter() {
        assert_eq!(equivalent_diameter(12.0, 12.0), 13.12);
        assert_eq!(equivalent_diameter(24.0, 12.0), 18.28);
        assert_eq!(equivalent_diameter(20.0, 8.0), 13.48);
        assert_eq!(equivalent_diameter(0.0, 12.0), 0.0);
    }

    #[test]
    fn test_auto_size() {
        let props = DuctProps {
            airflow: 1000.0,
            ..DuctProps::round(6.0)
        };
        assert_eq!(auto_size(&props, 1000.0).diameter, Some(14.0));

        let rect = DuctProps {
            airflow: 1000.0,
            ..DuctProps::rectangular(12.0, 8.0)
        };
        // 144 in² @ 1.5:1 -> 14.7 x 9.8
        let dims = auto_size(&rect, 1000.0);
        assert_eq!(dims.width, Some(15.0));
        assert_eq!(dims.height, Some(10.0));

        let tiny = DuctProps {
            airflow: 10.0,
            ..DuctProps::rectangular(12.0, 8.0)
        };
        let dims = auto_size(&tiny, 2000.0);
        assert_eq!(dims.width, Some(4.0));
        assert_eq!(dims.height, Some(4.0));
    }

    #[test]
    fn test_duct_calculated() {
        let calc = duct_calculated(&DuctProps::round(6.0));
        assert_eq!(calc.area, 28.27);
        assert_eq!(calc.velocity, 2550.0);
        assert!(calc.friction_loss > 0.0);

        let missing = DuctProps {
            diameter: None,
            ..DuctProps::round(6.0)
        };
        let calc = duct_calculated(&missing);
        assert_eq!(calc.area, 0.0);
        assert_eq!(calc.velocity, 0.0);
        assert_eq!(calc.friction_loss, 0.0);
    }
}
