//! 邮件自动化决策服务
//!
//! 邮件草稿生成后调用，按用户的自动化规则判断该邮件能否自动发送。
//!
//! ## 流程
//!
//! 1. 读取线索（不存在时不做任何修改）
//! 2. 读取用户的启用规则（按优先级降序）
//! 3. 纯计算评估，得到结论
//! 4. 命中规则时累加其触发次数
//! 5. 写回邮件状态（approved / pending_review）与审核备注
//!
//! 自动化评估只是优化手段：任何失败都不能让邮件进入 approved 状态。

use std::sync::Arc;

use outreach_shared::config::AutomationConfig;
use tracing::{debug, error, info, instrument, warn};

use crate::error::Result;
use crate::matcher::RuleMatcher;
use crate::models::{Decision, EmailStatus, Lead, REASON_NO_RULES, Rule};
use crate::repository::{EmailRepository, LeadRepository, RuleRepository};

pub const REASON_EVALUATION_FAILED: &str = "Automation evaluation failed, manual review required";

/// 邮件自动化决策服务
pub struct AutomationService {
    config: AutomationConfig,
    matcher: RuleMatcher,
    rule_repo: Arc<dyn RuleRepository>,
    lead_repo: Arc<dyn LeadRepository>,
    email_repo: Arc<dyn EmailRepository>,
}

impl AutomationService {
    pub fn new(
        config: AutomationConfig,
        rule_repo: Arc<dyn RuleRepository>,
        lead_repo: Arc<dyn LeadRepository>,
        email_repo: Arc<dyn EmailRepository>,
    ) -> Self {
        let matcher = if config.trace_enabled {
            RuleMatcher::new().with_trace()
        } else {
            RuleMatcher::new()
        };

        Self {
            config,
            matcher,
            rule_repo,
            lead_repo,
            email_repo,
        }
    }

    /// 获取配置引用
    pub fn config(&self) -> &AutomationConfig {
        &self.config
    }

    /// 纯评估，不访问存储
    pub fn evaluate_lead(&self, lead: &Lead, rules: &[Rule]) -> Decision {
        self.matcher.evaluate(lead, rules)
    }

    /// 评估线索并把结论写回邮件记录
    ///
    /// 线索不存在或功能关闭时返回 `Ok(None)`，邮件保持原样。
    /// 触发次数累加失败只记录告警；其他存储错误向上返回。
    #[instrument(skip(self))]
    pub async fn apply_decision_to_email(
        &self,
        email_id: &str,
        user_id: &str,
        lead_id: &str,
    ) -> Result<Option<Decision>> {
        if !self.config.enabled {
            info!("自动化规则评估已禁用");
            return Ok(None);
        }

        let Some(lead) = self.lead_repo.fetch_lead(lead_id).await? else {
            warn!("线索不存在，跳过自动化评估");
            metrics::counter!("automation_evaluations_total", "outcome" => "lead_not_found")
                .increment(1);
            return Ok(None);
        };

        let rules = self.rule_repo.fetch_active_rules(user_id).await?;

        let report = self.matcher.explain(&lead, &rules);
        for line in &report.trace {
            debug!(trace = %line, "规则评估追踪");
        }
        let decision = report.decision;

        if let Some(rule_id) = decision.matched_rule_id() {
            match self.rule_repo.increment_times_triggered(rule_id).await {
                Ok(()) => {
                    metrics::counter!("automation_rule_triggers_total").increment(1);
                }
                Err(e) => {
                    warn!(rule_id, error = %e, "规则触发次数累加失败");
                }
            }
        }

        let status = EmailStatus::from_decision(&decision);
        self.email_repo
            .update_email_status(email_id, status, Some(decision.reason.clone()))
            .await?;

        metrics::counter!("automation_evaluations_total", "outcome" => outcome_label(&decision))
            .increment(1);

        info!(
            rules_considered = report.rules_considered,
            rules_evaluated = report.rules_evaluated,
            matched_rule = decision.matched_rule_id().unwrap_or("-"),
            auto_approve = decision.should_auto_approve,
            "自动化评估完成: {}",
            decision.reason
        );

        Ok(Some(decision))
    }

    /// 邮件生成流程使用的入口，永不返回错误
    ///
    /// 评估失败时尽力把邮件置为 pending_review，保证不会误放行。
    pub async fn apply_decision_best_effort(
        &self,
        email_id: &str,
        user_id: &str,
        lead_id: &str,
    ) -> Option<Decision> {
        match self.apply_decision_to_email(email_id, user_id, lead_id).await {
            Ok(decision) => decision,
            Err(e) => {
                error!(
                    email_id,
                    user_id,
                    lead_id,
                    code = e.error_code(),
                    retryable = e.is_retryable(),
                    error = %e,
                    "自动化评估失败，转人工审核"
                );
                metrics::counter!("automation_evaluations_total", "outcome" => "error")
                    .increment(1);

                if let Err(e) = self
                    .email_repo
                    .update_email_status(
                        email_id,
                        EmailStatus::PendingReview,
                        Some(REASON_EVALUATION_FAILED.to_string()),
                    )
                    .await
                {
                    warn!(email_id, error = %e, "回退为待审核状态失败");
                }

                None
            }
        }
    }
}

fn outcome_label(decision: &Decision) -> &'static str {
    match decision.action() {
        Some(action) => action.as_str(),
        None if decision.reason == REASON_NO_RULES => "no_rules",
        None => "no_match",
    }
}
