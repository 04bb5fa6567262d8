//! 条件评估器
//!
//! 按操作符对单个线索属性值与规则值做比较。评估永不失败：
//! 类型不符时按各操作符约定的兜底值返回。
//!
//! 数值比较前两侧都转换为 f64：数字保持原值，字符串去掉首尾空白后解析，
//! 空字符串、null、布尔值、列表和对象都转换为 NaN。任何涉及 NaN 的比较都为 false，
//! 因此缺失 fitScore 的线索不会满足任何数值条件。
//!
//! 字符串只接受有限的十进制数：`"inf"`、`"Infinity"`、`"NaN"` 以及
//! `"0x10"` 这类进制前缀写法都转换为 NaN。

use crate::models::{Condition, ConditionValue, Lead};
use crate::operators::OperatorKind;

/// 条件评估器
pub struct ConditionEvaluator;

impl ConditionEvaluator {
    /// 对线索评估单个条件
    pub fn matches(lead: &Lead, condition: &Condition) -> bool {
        let lead_value = lead.resolve(&condition.field);
        Self::evaluate(&lead_value, condition.operator, &condition.value)
    }

    /// 评估条件
    ///
    /// # Arguments
    /// * `lead_value` - 从线索中解析出的属性值（未知字段为 Null）
    /// * `operator` - 操作符
    /// * `rule_value` - 规则中定义的期望值
    pub fn evaluate(
        lead_value: &ConditionValue,
        operator: OperatorKind,
        rule_value: &ConditionValue,
    ) -> bool {
        match operator {
            OperatorKind::Equals => lead_value.strict_eq(rule_value),
            OperatorKind::NotEquals => !lead_value.strict_eq(rule_value),
            OperatorKind::Contains => Self::contains(lead_value, rule_value).unwrap_or(false),
            // 线索值既不是字符串也不是列表时，"不包含" 视为成立
            OperatorKind::NotContains => Self::contains(lead_value, rule_value)
                .map(|found| !found)
                .unwrap_or(true),
            OperatorKind::In => Self::in_list(lead_value, rule_value).unwrap_or(false),
            // 规则值不是列表时，"不在列表中" 视为成立
            OperatorKind::NotIn => Self::in_list(lead_value, rule_value)
                .map(|found| !found)
                .unwrap_or(true),
            OperatorKind::GreaterThan => Self::compare(lead_value, rule_value, |a, b| a > b),
            OperatorKind::LessThan => Self::compare(lead_value, rule_value, |a, b| a < b),
            OperatorKind::GreaterThanOrEqual => {
                Self::compare(lead_value, rule_value, |a, b| a >= b)
            }
            OperatorKind::LessThanOrEqual => Self::compare(lead_value, rule_value, |a, b| a <= b),
            OperatorKind::Unknown => false,
        }
    }

    /// 大小写不敏感的包含检查
    ///
    /// 线索值为字符串时做子串匹配；为列表时任一字符串元素包含即成立。
    /// 其他类型返回 None，由调用方决定兜底值。
    fn contains(field: &ConditionValue, expected: &ConditionValue) -> Option<bool> {
        match field {
            ConditionValue::String(s) => Some(Self::contains_ignore_case(s, expected)),
            ConditionValue::List(items) => Some(items.iter().any(|item| {
                item.as_str()
                    .is_some_and(|s| Self::contains_ignore_case(s, expected))
            })),
            _ => None,
        }
    }

    /// 规则值不是字符串时找不到子串
    fn contains_ignore_case(haystack: &str, needle: &ConditionValue) -> bool {
        match needle.as_str() {
            Some(needle) => haystack.to_lowercase().contains(&needle.to_lowercase()),
            None => false,
        }
    }

    /// 列表成员检查，规则值不是列表时返回 None
    fn in_list(field: &ConditionValue, expected: &ConditionValue) -> Option<bool> {
        expected
            .as_list()
            .map(|items| items.iter().any(|item| field.strict_eq(item)))
    }

    /// 数值比较
    fn compare<F>(field: &ConditionValue, expected: &ConditionValue, cmp: F) -> bool
    where
        F: Fn(f64, f64) -> bool,
    {
        cmp(Self::to_number(field), Self::to_number(expected))
    }

    /// 转换为 f64，无法转换或结果非有限数时为 NaN
    fn to_number(value: &ConditionValue) -> f64 {
        match value {
            ConditionValue::Number(n) => *n,
            ConditionValue::String(s) => s
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .unwrap_or(f64::NAN),
            _ => f64::NAN,
        }
    }
}
