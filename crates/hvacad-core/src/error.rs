//! 文档错误定义

use crate::entity::EntityId;
use thiserror::Error;

/// 属性校验错误（编辑在记录命令前被拒绝）
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

#[derive(Error, Debug)]
pub enum DocumentError {
    #[error("Duplicate entity id: {0}")]
    DuplicateId(EntityId),

    #[error("Entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Serialization(#[from] serde_json::Error),
}
