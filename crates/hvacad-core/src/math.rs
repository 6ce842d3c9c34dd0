//! 数学基础类型
//!
//! 世界坐标单位为英寸，角度单位为度。

use serde::{Deserialize, Serialize};

pub type Point2 = nalgebra::Point2<f64>;
pub type Vector2 = nalgebra::Vector2<f64>;

/// 浮点比较容差
pub const EPSILON: f64 = 1e-9;

/// 四舍五入到指定小数位
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    round_half_up(value * factor) / factor
}

/// 四舍五入到最接近的步长倍数（步长非正时原样返回）
pub fn round_to_nearest(value: f64, step: f64) -> f64 {
    if step <= 0.0 {
        return value;
    }
    round_half_up(value / step) * step
}

/// 0.5 向正无穷方向舍入
fn round_half_up(value: f64) -> f64 {
    (value + 0.5).floor()
}

/// 轴对齐包围盒
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox2 {
    pub min: Point2,
    pub max: Point2,
}

impl BoundingBox2 {
    pub fn new(min: Point2, max: Point2) -> Self {
        Self { min, max }
    }

    /// 由两个任意角点构造
    pub fn from_corners(a: Point2, b: Point2) -> Self {
        Self {
            min: Point2::new(a.x.min(b.x), a.y.min(b.y)),
            max: Point2::new(a.x.max(b.x), a.y.max(b.y)),
        }
    }

    /// 由左上角与宽高构造
    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::from_corners(Point2::new(x, y), Point2::new(x + width, y + height))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> Point2 {
        nalgebra::center(&self.min, &self.max)
    }

    pub fn contains_point(&self, point: &Point2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// 是否完全包含另一个包围盒
    pub fn contains(&self, other: &BoundingBox2) -> bool {
        self.contains_point(&other.min) && self.contains_point(&other.max)
    }

    pub fn intersects(&self, other: &BoundingBox2) -> bool {
        !(self.max.x < other.min.x
            || other.max.x < self.min.x
            || self.max.y < other.min.y
            || other.max.y < self.min.y)
    }
}
