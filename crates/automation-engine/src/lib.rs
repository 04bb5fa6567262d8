//! 邮件自动化规则引擎
//!
//! 为每封生成的外联邮件判断能否自动发送，或必须等待人工审核：
//! - 条件评估（十种操作符，大小写不敏感的包含检查，NaN 安全的数值比较）
//! - 按优先级降序的首条命中规则解析
//! - 规则、线索、邮件记录存储的 trait 接口与内存实现
//! - 把评估结论写回邮件记录的编排服务

pub mod error;
pub mod evaluator;
pub mod matcher;
pub mod models;
pub mod operators;
pub mod repository;
pub mod service;

pub use error::{AutomationError, Result};
pub use evaluator::ConditionEvaluator;
pub use matcher::{EvaluationReport, RuleMatcher};
pub use models::{
    Condition, ConditionValue, Decision, EmailRecord, EmailStatus, Lead, LeadField,
    REASON_NO_MATCH, REASON_NO_RULES, Rule,
};
pub use operators::{ActionKind, OperatorKind};
pub use repository::{
    EmailRepository, LeadRepository, MemoryEmailStore, MemoryLeadStore, MemoryRuleStore,
    RuleRepository,
};
pub use service::{AutomationService, REASON_EVALUATION_FAILED};

/// 纯评估入口，等价于 `RuleMatcher::new().evaluate(lead, rules)`
pub fn evaluate_lead(lead: &Lead, rules: &[Rule]) -> Decision {
    RuleMatcher::new().evaluate(lead, rules)
}
