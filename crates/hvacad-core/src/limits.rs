//! 工程限值配置
//!
//! 按风管系统分组的最大/最小风速与最大压降，以及材料摩擦系数。

use crate::entity::{DuctMaterial, SystemType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// 限值分组（送风 / 回风 / 排风）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SystemBucket {
    Supply,
    Return,
    Exhaust,
}

impl SystemBucket {
    /// 回风与排风各自成组，其余（含未指定）按送风处理
    pub fn for_system(system_type: Option<SystemType>) -> Self {
        match system_type {
            Some(SystemType::Return) => SystemBucket::Return,
            Some(SystemType::Exhaust) => SystemBucket::Exhaust,
            Some(SystemType::Supply) | Some(SystemType::OutsideAir) | None => SystemBucket::Supply,
        }
    }
}

impl fmt::Display for SystemBucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SystemBucket::Supply => "supply",
            SystemBucket::Return => "return",
            SystemBucket::Exhaust => "exhaust",
        };
        f.write_str(name)
    }
}

/// 按系统分组的数值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PerSystem {
    pub supply: f64,
    #[serde(rename = "return")]
    pub return_: f64,
    pub exhaust: f64,
}

impl PerSystem {
    pub const fn new(supply: f64, return_: f64, exhaust: f64) -> Self {
        Self {
            supply,
            return_,
            exhaust,
        }
    }

    pub fn get(&self, bucket: SystemBucket) -> f64 {
        match bucket {
            SystemBucket::Supply => self.supply,
            SystemBucket::Return => self.return_,
            SystemBucket::Exhaust => self.exhaust,
        }
    }
}

/// 材料摩擦系数（英尺）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FrictionFactors {
    pub galvanized: f64,
    pub stainless: f64,
    pub flexible: f64,
    pub fiberglass: f64,
}

impl Default for FrictionFactors {
    fn default() -> Self {
        Self {
            galvanized: 0.0005,
            stainless: 0.00015,
            flexible: 0.003,
            fiberglass: 0.0003,
        }
    }
}

impl FrictionFactors {
    /// 铝管按镀锌钢板处理
    pub fn for_material(&self, material: DuctMaterial) -> f64 {
        match material {
            DuctMaterial::Galvanized | DuctMaterial::Aluminum => self.galvanized,
            DuctMaterial::Stainless => self.stainless,
            DuctMaterial::Flex => self.flexible,
        }
    }
}

/// 单个系统的限值
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub max_velocity: f64,
    pub min_velocity: f64,
    pub max_pressure_drop: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineeringLimits {
    /// 最大风速（FPM）
    pub max_velocity: PerSystem,
    /// 最小风速（FPM）
    pub min_velocity: PerSystem,
    /// 最大压降（in.w.g./100 ft）
    pub max_pressure_drop: PerSystem,
    #[serde(default)]
    pub friction_factors: FrictionFactors,
}

impl Default for EngineeringLimits {
    fn default() -> Self {
        Self::commercial_standard()
    }
}

impl EngineeringLimits {
    pub fn commercial_standard() -> Self {
        Self {
            max_velocity: PerSystem::new(2500.0, 2000.0, 2000.0),
            min_velocity: PerSystem::new(600.0, 500.0, 500.0),
            max_pressure_drop: PerSystem::new(0.10, 0.08, 0.08),
            friction_factors: FrictionFactors::default(),
        }
    }

    pub fn residential_budget() -> Self {
        Self {
            max_velocity: PerSystem::new(2000.0, 1800.0, 1800.0),
            min_velocity: PerSystem::new(500.0, 400.0, 400.0),
            max_pressure_drop: PerSystem::new(0.08, 0.06, 0.06),
            friction_factors: FrictionFactors::default(),
        }
    }

    pub fn industrial_heavy() -> Self {
        Self {
            max_velocity: PerSystem::new(3000.0, 2500.0, 2500.0),
            min_velocity: PerSystem::new(800.0, 600.0, 600.0),
            max_pressure_drop: PerSystem::new(0.12, 0.10, 0.10),
            friction_factors: FrictionFactors::default(),
        }
    }

    /// 按名称取预设
    pub fn preset(name: &str) -> Option<Self> {
        match name {
            "commercial" | "commercial_standard" => Some(Self::commercial_standard()),
            "residential" | "residential_budget" => Some(Self::residential_budget()),
            "industrial" | "industrial_heavy" => Some(Self::industrial_heavy()),
            _ => None,
        }
    }

    pub fn thresholds(&self, bucket: SystemBucket) -> Thresholds {
        Thresholds {
            max_velocity: self.max_velocity.get(bucket),
            min_velocity: self.min_velocity.get(bucket),
            max_pressure_drop: self.max_pressure_drop.get(bucket),
        }
    }

    /// 每组最小风速不得超过最大风速
    pub fn is_consistent(&self) -> bool {
        [SystemBucket::Supply, SystemBucket::Return, SystemBucket::Exhaust]
            .into_iter()
            .all(|bucket| {
                let t = self.thresholds(bucket);
                t.min_velocity >= 0.0 && t.min_velocity < t.max_velocity && t.max_pressure_drop > 0.0
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bucket_mapping() {
        assert_eq!(SystemBucket::for_system(None), SystemBucket::Supply);
        assert_eq!(
            SystemBucket::for_system(Some(SystemType::OutsideAir)),
            SystemBucket::Supply
        );
        assert_eq!(
            SystemBucket::for_system(Some(SystemType::Return)),
            SystemBucket::Return
        );
    }

    #[test]
    fn test_presets() {
        let limits = EngineeringLimits::default();
        assert_eq!(limits.thresholds(SystemBucket::Supply).max_velocity, 2500.0);
        assert_eq!(limits.thresholds(SystemBucket::Exhaust).max_pressure_drop, 0.08);

        let residential = EngineeringLimits::preset("residential").unwrap();
        assert_eq!(residential.min_velocity.return_, 400.0);
        assert!(EngineeringLimits::preset("offshore").is_none());
        assert!(EngineeringLimits::industrial_heavy().is_consistent());
    }

    #[test]
    fn test_material_factor() {
        let factors = FrictionFactors::default();
        assert_eq!(factors.for_material(DuctMaterial::Aluminum), 0.0005);
        assert_eq!(factors.for_material(DuctMaterial::Flex), 0.003);
    }

    #[test]
    fn test_limits_json_uses_return_key() {
        let json = serde_json::to_string(&EngineeringLimits::default()).unwrap();
        assert!(json.contains("\"return\":2000.0"));
    }
}
