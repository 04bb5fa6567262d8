//! 规则匹配器
//!
//! 按优先级从高到低查找第一条所有条件都满足的规则，返回其规定的处理结论。
//! 匹配过程是纯计算：不修改规则和线索，也不访问存储。

use crate::evaluator::ConditionEvaluator;
use crate::models::{Decision, Lead, Rule};
use serde::Serialize;
use std::cmp::Reverse;
use std::time::Instant;

/// 带诊断信息的评估报告
#[derive(Debug, Clone, Serialize)]
pub struct EvaluationReport {
    pub decision: Decision,
    /// 过滤掉停用规则后参与排序的规则数
    pub rules_considered: usize,
    /// 实际评估过条件的规则数（命中后立即停止）
    pub rules_evaluated: usize,
    pub trace: Vec<String>,
    pub evaluation_time_us: i64,
}

/// 规则匹配器
#[derive(Debug, Clone, Default)]
pub struct RuleMatcher {
    /// 是否记录详细评估追踪
    trace_enabled: bool,
}

impl RuleMatcher {
    pub fn new() -> Self {
        Self {
            trace_enabled: false,
        }
    }

    /// 启用评估追踪
    pub fn with_trace(mut self) -> Self {
        self.trace_enabled = true;
        self
    }

    pub fn trace_enabled(&self) -> bool {
        self.trace_enabled
    }

    /// 评估线索，返回第一条命中规则的结论
    pub fn evaluate(&self, lead: &Lead, rules: &[Rule]) -> Decision {
        self.explain(lead, rules).decision
    }

    /// 评估线索并返回诊断信息
    pub fn explain(&self, lead: &Lead, rules: &[Rule]) -> EvaluationReport {
        let start = Instant::now();
        let mut trace = Vec::new();

        let ordered = Self::order_active(rules);
        let rules_considered = ordered.len();

        if ordered.is_empty() {
            return EvaluationReport {
                decision: Decision::no_rules(),
                rules_considered,
                rules_evaluated: 0,
                trace,
                evaluation_time_us: start.elapsed().as_micros() as i64,
            };
        }

        let mut rules_evaluated = 0;
        let mut decision = Decision::no_match();

        for rule in ordered {
            rules_evaluated += 1;

            if self.rule_matches(lead, rule, &mut trace) {
                if self.trace_enabled {
                    trace.push(format!(
                        "rule '{}' (priority {}) MATCHED => {}",
                        rule.name, rule.priority, rule.action
                    ));
                }
                decision = Decision::matched(rule.clone());
                break;
            }

            if self.trace_enabled {
                trace.push(format!(
                    "rule '{}' (priority {}) NOT_MATCHED",
                    rule.name, rule.priority
                ));
            }
        }

        EvaluationReport {
            decision,
            rules_considered,
            rules_evaluated,
            trace,
            evaluation_time_us: start.elapsed().as_micros() as i64,
        }
    }

    /// 过滤停用规则并按优先级降序排列
    ///
    /// 稳定排序，同优先级保持传入顺序（通常即创建顺序）。
    fn order_active(rules: &[Rule]) -> Vec<&Rule> {
        let mut active: Vec<&Rule> = rules.iter().filter(|r| r.is_active).collect();
        active.sort_by_key(|r| Reverse(r.priority));
        active
    }

    /// AND 语义评估规则的全部条件，遇到不满足的条件立即返回
    ///
    /// 空条件列表恒为真。
    fn rule_matches(&self, lead: &Lead, rule: &Rule, trace: &mut Vec<String>) -> bool {
        for (i, cond) in rule.conditions.iter().enumerate() {
            let matched = ConditionEvaluator::matches(lead, cond);

            if self.trace_enabled {
                trace.push(format!(
                    "rule '{}'.conditions[{}]: {} {} {:?} => {}",
                    rule.name,
                    i,
                    cond.field,
                    cond.operator,
                    cond.value,
                    if matched { "MATCHED" } else { "NOT_MATCHED" }
                ));
            }

            if !matched {
                return false;
            }
        }

        true
    }
}
