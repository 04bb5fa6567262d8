//! 内存存储
//!
//! 使用 DashMap 提供线程安全的规则、线索和邮件记录存储，适用于测试和开发环境。

use std::cmp::Reverse;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use tracing::{debug, info, instrument, warn};

use super::traits::{EmailRepository, LeadRepository, RuleRepository};
use crate::error::{AutomationError, Result};
use crate::models::{EmailRecord, EmailStatus, Lead, Rule};

/// 带创建序号的规则，序号用于同优先级时保持创建顺序
#[derive(Debug, Clone)]
struct StoredRule {
    seq: u64,
    rule: Rule,
}

/// 规则存储
#[derive(Clone, Default)]
pub struct MemoryRuleStore {
    rules: Arc<DashMap<String, StoredRule>>,
    next_seq: Arc<AtomicU64>,
}

impl MemoryRuleStore {
    /// 创建新的规则存储
    pub fn new() -> Self {
        Self::default()
    }

    /// 获取当前存储的规则数量
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// 检查存储是否为空
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// 从 JSON 规则数组批量导入
    ///
    /// 整个文档解析失败时不导入任何规则；逐条创建时遇到校验失败或 ID 冲突立即返回，
    /// 此前已导入的规则保留。返回导入的规则数量。
    #[instrument(skip(self, json))]
    pub async fn import_json(&self, json: &str) -> Result<usize> {
        let rules: Vec<Rule> = serde_json::from_str(json)?;
        let count = rules.len();

        for rule in rules {
            self.create_rule(rule).await?;
        }

        info!("已导入 {} 条规则", count);
        Ok(count)
    }

    /// 按优先级降序、创建顺序升序列出满足条件的规则
    fn list_by<F>(&self, predicate: F) -> Vec<Rule>
    where
        F: Fn(&Rule) -> bool,
    {
        let mut stored: Vec<StoredRule> = self
            .rules
            .iter()
            .filter(|entry| predicate(&entry.value().rule))
            .map(|entry| entry.value().clone())
            .collect();

        stored.sort_by_key(|s| (Reverse(s.rule.priority), s.seq));
        stored.into_iter().map(|s| s.rule).collect()
    }
}

#[async_trait]
impl RuleRepository for MemoryRuleStore {
    #[instrument(skip(self, rule), fields(rule_id = %rule.id, user_id = %rule.user_id))]
    async fn create_rule(&self, rule: Rule) -> Result<Rule> {
        rule.validate()?;

        // 检查与插入在同一分片锁内完成
        match self.rules.entry(rule.id.clone()) {
            Entry::Occupied(_) => {
                warn!("规则 ID 已存在: {}", rule.id);
                return Err(AutomationError::Validation(format!(
                    "规则已存在: {}",
                    rule.id
                )));
            }
            Entry::Vacant(slot) => {
                let seq = self.next_seq.fetch_add(1, Ordering::SeqCst);
                slot.insert(StoredRule {
                    seq,
                    rule: rule.clone(),
                });
            }
        }

        info!("规则已创建: {}", rule.id);
        Ok(rule)
    }

    /// 更新规则定义，触发次数与创建时间以存储中的为准
    #[instrument(skip(self, rule), fields(rule_id = %rule.id, user_id = %rule.user_id))]
    async fn update_rule(&self, mut rule: Rule) -> Result<Rule> {
        rule.validate()?;

        let mut entry = match self.rules.get_mut(&rule.id) {
            Some(entry) if entry.rule.user_id == rule.user_id => entry,
            _ => {
                warn!("更新不存在的规则: {}", rule.id);
                return Err(AutomationError::RuleNotFound(rule.id));
            }
        };

        rule.times_triggered = entry.rule.times_triggered;
        rule.created_at = entry.rule.created_at;
        rule.updated_at = Utc::now();
        entry.rule = rule.clone();

        info!("规则已更新: {}", rule.id);
        Ok(rule)
    }

    #[instrument(skip(self))]
    async fn delete_rule(&self, user_id: &str, rule_id: &str) -> Result<()> {
        if self
            .rules
            .remove_if(rule_id, |_, stored| stored.rule.user_id == user_id)
            .is_some()
        {
            info!("规则已删除: {}", rule_id);
            Ok(())
        } else {
            warn!("删除不存在的规则: {}", rule_id);
            Err(AutomationError::RuleNotFound(rule_id.to_string()))
        }
    }

    async fn get_rule(&self, rule_id: &str) -> Result<Option<Rule>> {
        Ok(self.rules.get(rule_id).map(|s| s.rule.clone()))
    }

    async fn list_rules(&self, user_id: &str) -> Result<Vec<Rule>> {
        Ok(self.list_by(|r| r.user_id == user_id))
    }

    async fn fetch_active_rules(&self, user_id: &str) -> Result<Vec<Rule>> {
        Ok(self.list_by(|r| r.user_id == user_id && r.is_active))
    }

    #[instrument(skip(self))]
    async fn increment_times_triggered(&self, rule_id: &str) -> Result<()> {
        match self.rules.get_mut(rule_id) {
            Some(mut entry) => {
                entry.rule.times_triggered += 1;
                debug!(times_triggered = entry.rule.times_triggered, "触发次数已累加");
                Ok(())
            }
            None => Err(AutomationError::RuleNotFound(rule_id.to_string())),
        }
    }
}

/// 线索存储
#[derive(Clone, Default)]
pub struct MemoryLeadStore {
    leads: Arc<DashMap<String, Lead>>,
}

impl MemoryLeadStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖线索
    pub fn insert(&self, lead: Lead) {
        self.leads.insert(lead.id.clone(), lead);
    }

    pub fn remove(&self, lead_id: &str) -> Option<Lead> {
        self.leads.remove(lead_id).map(|(_, v)| v)
    }
}

#[async_trait]
impl LeadRepository for MemoryLeadStore {
    async fn fetch_lead(&self, lead_id: &str) -> Result<Option<Lead>> {
        Ok(self.leads.get(lead_id).map(|l| l.clone()))
    }
}

/// 邮件记录存储
#[derive(Clone, Default)]
pub struct MemoryEmailStore {
    emails: Arc<DashMap<String, EmailRecord>>,
}

impl MemoryEmailStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或覆盖邮件记录
    pub fn insert(&self, email: EmailRecord) {
        self.emails.insert(email.id.clone(), email);
    }
}

#[async_trait]
impl EmailRepository for MemoryEmailStore {
    async fn get_email(&self, email_id: &str) -> Result<Option<EmailRecord>> {
        Ok(self.emails.get(email_id).map(|e| e.clone()))
    }

    #[instrument(skip(self, review_notes))]
    async fn update_email_status(
        &self,
        email_id: &str,
        status: EmailStatus,
        review_notes: Option<String>,
    ) -> Result<()> {
        let mut entry = self
            .emails
            .get_mut(email_id)
            .ok_or_else(|| AutomationError::EmailNotFound(email_id.to_string()))?;

        entry.status = status;
        entry.review_notes = review_notes;
        entry.updated_at = Utc::now();
        Ok(())
    }
}
