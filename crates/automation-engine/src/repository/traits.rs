//! 仓储 Trait 定义
//!
//! 定义仓储接口，便于服务层依赖抽象而非具体实现，支持 mock 测试

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{EmailRecord, EmailStatus, Lead, Rule};

/// 自动化规则仓储接口
///
/// 规则归属于唯一用户，更新和删除都按所属用户限定范围。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RuleRepository: Send + Sync {
    async fn create_rule(&self, rule: Rule) -> Result<Rule>;
    async fn update_rule(&self, rule: Rule) -> Result<Rule>;
    async fn delete_rule(&self, user_id: &str, rule_id: &str) -> Result<()>;
    async fn get_rule(&self, rule_id: &str) -> Result<Option<Rule>>;

    /// 用户的全部规则（含停用），按优先级降序
    async fn list_rules(&self, user_id: &str) -> Result<Vec<Rule>>;

    /// 用户的启用规则，按优先级降序，同优先级按创建顺序
    async fn fetch_active_rules(&self, user_id: &str) -> Result<Vec<Rule>>;

    async fn increment_times_triggered(&self, rule_id: &str) -> Result<()>;
}

/// 线索仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn fetch_lead(&self, lead_id: &str) -> Result<Option<Lead>>;
}

/// 邮件记录仓储接口
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailRepository: Send + Sync {
    async fn get_email(&self, email_id: &str) -> Result<Option<EmailRecord>>;
    async fn update_email_status(
        &self,
        email_id: &str,
        status: EmailStatus,
        review_notes: Option<String>,
    ) -> Result<()>;
}
