//! 条件操作符与规则动作定义

use serde::{Deserialize, Serialize};
use std::fmt;

/// 条件操作符
///
/// 无法识别的操作符反序列化为 `Unknown`，评估结果恒为 false，
/// 因此一条写错操作符的规则永远不会匹配，也不会导致规则加载失败。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperatorKind {
    // 相等比较
    Equals,
    NotEquals,

    // 包含检查（大小写不敏感的子串匹配）
    Contains,
    NotContains,

    // 列表成员检查
    In,
    NotIn,

    // 数值比较
    GreaterThan,
    LessThan,
    GreaterThanOrEqual,
    LessThanOrEqual,

    #[serde(other)]
    Unknown,
}

impl fmt::Display for OperatorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::In => "in",
            Self::NotIn => "not_in",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::GreaterThanOrEqual => "greater_than_or_equal",
            Self::LessThanOrEqual => "less_than_or_equal",
            Self::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// 规则匹配后的处理动作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    /// 自动发送
    AutoSend,
    /// 人工审核
    ManualReview,
    /// 跳过
    Skip,
}

impl ActionKind {
    /// 只有 auto_send 允许自动放行，skip 与 manual_review 都需要人工处理
    pub fn is_auto_send(&self) -> bool {
        matches!(self, Self::AutoSend)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AutoSend => "auto_send",
            Self::ManualReview => "manual_review",
            Self::Skip => "skip",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_deserialization() {
        let op: OperatorKind = serde_json::from_str(r#""greater_than_or_equal""#).unwrap();
        assert_eq!(op, OperatorKind::GreaterThanOrEqual);

        let op: OperatorKind = serde_json::from_str(r#""not_in""#).unwrap();
        assert_eq!(op, OperatorKind::NotIn);
    }

    #[test]
    fn test_unknown_operator_does_not_fail() {
        let op: OperatorKind = serde_json::from_str(r#""starts_with""#).unwrap();
        assert_eq!(op, OperatorKind::Unknown);
    }

    #[test]
    fn test_display_matches_wire_name() {
        for op in [
            OperatorKind::Equals,
            OperatorKind::NotContains,
            OperatorKind::LessThanOrEqual,
        ] {
            let json = serde_json::to_string(&op).unwrap();
            assert_eq!(json, format!("\"{}\"", op));
        }
    }

    #[test]
    fn test_action_kind() {
        let action: ActionKind = serde_json::from_str(r#""manual_review""#).unwrap();
        assert_eq!(action, ActionKind::ManualReview);
        assert!(ActionKind::AutoSend.is_auto_send());
        assert!(!ActionKind::Skip.is_auto_send());
        assert!(!ActionKind::ManualReview.is_auto_send());
    }
}
