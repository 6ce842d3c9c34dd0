//! 编辑器配置

use crate::error::DocumentError;
use crate::history::DEFAULT_MAX_SIZE;
use crate::limits::EngineeringLimits;
use crate::snap::GridSettings;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// 撤销历史容量
    pub history_max_size: usize,
    /// 参数化重算的防抖时间（毫秒）
    pub debounce_ms: u64,
    pub grid: GridSettings,
    /// 创建风管后是否通知连接检测
    pub auto_fitting: bool,
    pub limits: EngineeringLimits,
    /// 日志级别（trace/debug/info/warn/error）
    pub log_level: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            history_max_size: DEFAULT_MAX_SIZE,
            debounce_ms: 500,
            grid: GridSettings::default(),
            auto_fitting: true,
            limits: EngineeringLimits::default(),
            log_level: "info".to_string(),
        }
    }
}

impl EditorConfig {
    /// 从 JSON 加载，缺失字段取默认值
    pub fn from_json_str(json: &str) -> Result<Self, DocumentError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), DocumentError> {
        if self.history_max_size == 0 {
            return Err(DocumentError::Config(
                "history_max_size must be at least 1".to_string(),
            ));
        }
        if self.grid.size.is_nan() || self.grid.size <= 0.0 {
            return Err(DocumentError::Config("grid.size must be positive".to_string()));
        }
        if !self.limits.is_consistent() {
            return Err(DocumentError::Config(
                "limits: min velocity must be below max velocity".to_string(),
            ));
        }
        Ok(())
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
