//! 外部协作方接口
//!
//! 规则存储、线索存储与邮件记录存储只以 trait 形式出现，引擎通过依赖注入使用它们。
//! `memory` 提供基于 DashMap 的参考实现，供测试和嵌入式场景使用。

pub mod memory;
pub mod traits;

pub use memory::{MemoryEmailStore, MemoryLeadStore, MemoryRuleStore};
pub use traits::{EmailRepository, LeadRepository, RuleRepository};

#[cfg(test)]
pub use traits::{MockEmailRepository, MockLeadRepository, MockRuleRepository};
