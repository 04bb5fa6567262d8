//! 可观测性初始化集成测试
//!
//! 全局订阅者在进程内只能安装一次，因此放在独立的测试二进制中。

use outreach_shared::observability::{self, ObservabilityConfig};

#[test]
fn test_init_installs_subscriber_once() {
    let config = ObservabilityConfig {
        service_name: "automation-engine".to_string(),
        log_level: "debug".to_string(),
        json_logs: true,
    };

    observability::init(&config).unwrap();
    tracing::info!(rule_id = "rule-001", "subscriber installed");

    // 第二次安装应返回错误而不是 panic
    assert!(observability::init(&config).is_err());
}
