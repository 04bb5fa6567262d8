//! 自动化规则引擎错误类型
//!
//! 规则评估本身没有错误路径（未知字段、未知操作符都按不匹配处理），
//! 这里的错误只来自规则存储、线索存储和邮件记录存储。

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AutomationError {
    #[error("规则不存在: {0}")]
    RuleNotFound(String),

    #[error("邮件记录不存在: {0}")]
    EmailNotFound(String),

    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("存储错误: {0}")]
    Storage(String),

    #[error("JSON 序列化错误: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, AutomationError>;

impl AutomationError {
    /// 检查是否为可重试的错误
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// 获取错误码
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::RuleNotFound(_) => "RULE_NOT_FOUND",
            Self::EmailNotFound(_) => "EMAIL_NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::Storage(_) => "STORAGE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}
