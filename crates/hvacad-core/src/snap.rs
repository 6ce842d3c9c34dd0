//! 网格捕捉
//!
//! 所有工具共用：启用捕捉时坐标取整到网格 `round(c / size) * size`。

use crate::math::{round_to_nearest, Point2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GridSettings {
    /// 网格间距（英寸）
    pub size: f64,
    pub snap_enabled: bool,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            size: 12.0,
            snap_enabled: true,
        }
    }
}

impl GridSettings {
    /// 捕捉一个点（未启用时原样返回）
    pub fn snap(&self, point: Point2) -> Point2 {
        if self.snap_enabled {
            snap_to_grid(point, self.size)
        } else {
            point
        }
    }
}

pub fn snap_value(value: f64, size: f64) -> f64 {
    round_to_nearest(value, size)
}

pub fn snap_to_grid(point: Point2, size: f64) -> Point2 {
    Point2::new(snap_value(point.x, size), snap_value(point.y, size))
}
