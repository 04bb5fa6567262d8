//! 自动化规则引擎领域模型

use crate::error::{AutomationError, Result};
use crate::operators::{ActionKind, OperatorKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub const REASON_NO_RULES: &str = "No automation rules defined";
pub const REASON_NO_MATCH: &str = "No matching automation rules";

/// 条件值
///
/// 规则中的 `value` 与线索属性值共用这一类型。反序列化不带标签，
/// 因此 `"owner"`、`70`、`["c_suite", "owner"]`、`null` 都能直接加载。
/// JSON 对象同样可以加载，但不等于任何值，也不参与包含或数值比较。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    #[default]
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    List(Vec<ConditionValue>),
    Object(serde_json::Map<String, serde_json::Value>),
}

impl ConditionValue {
    /// 严格相等
    ///
    /// 不同类型之间永不相等；列表和对象按引用语义比较，与任何值都不相等；
    /// NaN 与自身也不相等。
    pub fn strict_eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Number(a), Self::Number(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => false,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ConditionValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

impl From<&str> for ConditionValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<bool> for ConditionValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i32> for ConditionValue {
    fn from(value: i32) -> Self {
        Self::Number(f64::from(value))
    }
}

impl From<i64> for ConditionValue {
    fn from(value: i64) -> Self {
        Self::Number(value as f64)
    }
}

impl From<f64> for ConditionValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl<T: Into<ConditionValue>> From<Option<T>> for ConditionValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<ConditionValue>> From<Vec<T>> for ConditionValue {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

/// 规则条件可引用的线索字段（封闭集合）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LeadField {
    Seniority,
    Title,
    CompanySize,
    CompanyIndustry,
    Departments,
    FitScore,
}

impl LeadField {
    pub const ALL: [LeadField; 6] = [
        Self::Seniority,
        Self::Title,
        Self::CompanySize,
        Self::CompanyIndustry,
        Self::Departments,
        Self::FitScore,
    ];

    /// 按规则中的字段名解析，未知字段返回 None
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "seniority" => Some(Self::Seniority),
            "title" => Some(Self::Title),
            "companySize" => Some(Self::CompanySize),
            "companyIndustry" => Some(Self::CompanyIndustry),
            "departments" => Some(Self::Departments),
            "fitScore" => Some(Self::FitScore),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Seniority => "seniority",
            Self::Title => "title",
            Self::CompanySize => "companySize",
            Self::CompanyIndustry => "companyIndustry",
            Self::Departments => "departments",
            Self::FitScore => "fitScore",
        }
    }
}

/// 线索（潜在客户）
///
/// 引擎只读。底层记录上的其他属性在反序列化时被忽略，规则无法引用它们。
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: String,
    #[serde(default)]
    pub seniority: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub company_size: Option<String>,
    #[serde(default)]
    pub company_industry: Option<String>,
    #[serde(default)]
    pub departments: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub fit_score: Option<i64>,
}

impl Lead {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// 读取条件字段对应的属性值，未知字段或缺失值都返回 Null
    pub fn resolve(&self, field: &str) -> ConditionValue {
        match LeadField::parse(field) {
            Some(field) => self.get(field),
            None => ConditionValue::Null,
        }
    }

    pub fn get(&self, field: LeadField) -> ConditionValue {
        match field {
            LeadField::Seniority => self.seniority.clone().into(),
            LeadField::Title => self.title.clone().into(),
            LeadField::CompanySize => self.company_size.clone().into(),
            LeadField::CompanyIndustry => self.company_industry.clone().into(),
            LeadField::Departments => self.departments.clone().into(),
            LeadField::FitScore => self.fit_score.into(),
        }
    }
}

/// 规则条件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub field: String,
    pub operator: OperatorKind,
    #[serde(default)]
    pub value: ConditionValue,
}

impl Condition {
    pub fn new(
        field: impl Into<String>,
        operator: OperatorKind,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

fn default_active() -> bool {
    true
}

/// 自动化规则
///
/// `conditions` 之间是 AND 关系，空条件列表匹配所有线索。
/// `priority` 越大越先评估。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub action: ActionKind,
    #[serde(default)]
    pub conditions: Vec<Condition>,
    #[serde(default)]
    pub priority: i32,
    #[serde(default = "default_active")]
    pub is_active: bool,
    #[serde(default)]
    pub times_triggered: i64,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl Rule {
    pub fn new(user_id: impl Into<String>, name: impl Into<String>, action: ActionKind) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            user_id: user_id.into(),
            name: name.into(),
            action,
            conditions: Vec::new(),
            priority: 0,
            is_active: true,
            times_triggered: 0,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn inactive(mut self) -> Self {
        self.is_active = false;
        self
    }

    /// 校验规则定义（存储层在创建和更新时调用）
    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            return Err(AutomationError::Validation("规则 ID 不能为空".to_string()));
        }

        if self.user_id.trim().is_empty() {
            return Err(AutomationError::Validation("规则所属用户不能为空".to_string()));
        }

        if self.name.trim().is_empty() {
            return Err(AutomationError::Validation("规则名称不能为空".to_string()));
        }

        for (i, cond) in self.conditions.iter().enumerate() {
            if cond.field.trim().is_empty() {
                return Err(AutomationError::Validation(format!(
                    "条件 conditions[{}] 的字段不能为空",
                    i
                )));
            }
        }

        Ok(())
    }
}

/// 评估结论
///
/// `should_auto_approve` 无法区分 skip 与 manual_review，
/// 需要区分时读取 `matched_rule.action`（见 [`Decision::action`]）。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    pub should_auto_approve: bool,
    pub matched_rule: Option<Rule>,
    pub reason: String,
}

impl Decision {
    pub fn no_rules() -> Self {
        Self {
            should_auto_approve: false,
            matched_rule: None,
            reason: REASON_NO_RULES.to_string(),
        }
    }

    pub fn no_match() -> Self {
        Self {
            should_auto_approve: false,
            matched_rule: None,
            reason: REASON_NO_MATCH.to_string(),
        }
    }

    pub fn matched(rule: Rule) -> Self {
        let should_auto_approve = rule.action.is_auto_send();
        let reason = if should_auto_approve {
            format!("Matched rule: {}", rule.name)
        } else {
            format!("Rule requires manual review: {}", rule.name)
        };

        Self {
            should_auto_approve,
            matched_rule: Some(rule),
            reason,
        }
    }

    /// 命中规则的动作
    pub fn action(&self) -> Option<ActionKind> {
        self.matched_rule.as_ref().map(|r| r.action)
    }

    pub fn matched_rule_id(&self) -> Option<&str> {
        self.matched_rule.as_ref().map(|r| r.id.as_str())
    }
}

/// 邮件记录状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmailStatus {
    #[default]
    Draft,
    PendingReview,
    Approved,
    Rejected,
    Sent,
}

impl EmailStatus {
    /// 只有明确允许自动放行时才进入 approved，其余情况一律待审核
    pub fn from_decision(decision: &Decision) -> Self {
        if decision.should_auto_approve {
            Self::Approved
        } else {
            Self::PendingReview
        }
    }
}

/// 邮件记录（引擎只关心状态与审核备注）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRecord {
    pub id: String,
    pub user_id: String,
    pub lead_id: String,
    #[serde(default)]
    pub subject: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub status: EmailStatus,
    #[serde(default)]
    pub review_notes: Option<String>,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
    #[serde(default = "Utc::now")]
    pub updated_at: DateTime<Utc>,
}

impl EmailRecord {
    pub fn new(
        id: impl Into<String>,
        user_id: impl Into<String>,
        lead_id: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: id.into(),
            user_id: user_id.into(),
            lead_id: lead_id.into(),
            subject: String::new(),
            body: String::new(),
            status: EmailStatus::Draft,
            review_notes: None,
            created_at: now,
            updated_at: now,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_rule_deserialization() {
        let json = r#"
        {
            "id": "rule-001",
            "userId": "user-1",
            "name": "Executives",
            "action": "auto_send",
            "priority": 10,
            "conditions": [
                {"field": "seniority", "operator": "in", "value": ["c_suite", "owner"]},
                {"field": "fitScore", "operator": "greater_than_or_equal", "value": 70}
            ]
        }
        "#;

        let rule: Rule = serde_json::from_str(json).unwrap();
        assert_eq!(rule.id, "rule-001");
        assert_eq!(rule.action, ActionKind::AutoSend);
        assert_eq!(rule.priority, 10);
        assert!(rule.is_active);
        assert_eq!(rule.times_triggered, 0);
        assert_eq!(
            rule.conditions[0].value,
            ConditionValue::List(vec!["c_suite".into(), "owner".into()])
        );
        assert_eq!(rule.conditions[1].value, ConditionValue::Number(70.0));
    }

    #[test]
    fn test_rule_defaults() {
        let rule: Rule = serde_json::from_value(json!({
            "id": "rule-002",
            "userId": "user-1",
            "name": "catch all",
            "action": "skip"
        }))
        .unwrap();

        assert!(rule.conditions.is_empty());
        assert_eq!(rule.priority, 0);
        assert!(rule.is_active);
    }

    #[test]
    fn test_condition_without_value() {
        let cond: Condition =
            serde_json::from_value(json!({"field": "title", "operator": "equals"})).unwrap();
        assert!(cond.value.is_null());
    }

    #[test]
    fn test_lead_resolve() {
        let lead: Lead = serde_json::from_value(json!({
            "id": "lead-1",
            "seniority": "owner",
            "title": "CEO",
            "departments": ["executive", null],
            "fitScore": 88,
            "linkedinUrl": "https://example.com/in/someone"
        }))
        .unwrap();

        assert_eq!(lead.resolve("seniority"), ConditionValue::from("owner"));
        assert_eq!(lead.resolve("fitScore"), ConditionValue::Number(88.0));
        assert_eq!(
            lead.resolve("departments"),
            ConditionValue::List(vec!["executive".into(), ConditionValue::Null])
        );
        assert!(lead.resolve("companySize").is_null());
        // 未在字段表中的属性一律解析为 Null
        assert!(lead.resolve("linkedinUrl").is_null());
        assert!(lead.resolve("fit_score").is_null());
    }

    #[test]
    fn test_lead_field_names_round_trip() {
        for field in LeadField::ALL {
            assert_eq!(LeadField::parse(field.as_str()), Some(field));
        }
    }

    #[test]
    fn test_strict_eq() {
        assert!(ConditionValue::from("a").strict_eq(&"a".into()));
        assert!(ConditionValue::Null.strict_eq(&ConditionValue::Null));
        assert!(!ConditionValue::from("70").strict_eq(&70.into()));
        assert!(!ConditionValue::Number(f64::NAN).strict_eq(&ConditionValue::Number(f64::NAN)));

        let list = ConditionValue::from(vec!["a"]);
        assert!(!list.strict_eq(&list.clone()));
    }

    #[test]
    fn test_object_value_loads_alongside_valid_rules() {
        let rules: Vec<Rule> = serde_json::from_value(json!([
            {
                "id": "rule-ok",
                "userId": "user-1",
                "name": "Owners",
                "action": "auto_send",
                "conditions": [{"field": "seniority", "operator": "equals", "value": "owner"}]
            },
            {
                "id": "rule-odd",
                "userId": "user-1",
                "name": "Object value",
                "action": "skip",
                "conditions": [{"field": "title", "operator": "equals", "value": {"x": 1}}]
            }
        ]))
        .unwrap();

        assert_eq!(rules.len(), 2);
        let odd = &rules[1].conditions[0].value;
        assert!(matches!(odd, ConditionValue::Object(_)));
        assert!(!odd.strict_eq(&odd.clone()));
        assert!(odd.as_str().is_none());
        assert!(odd.as_list().is_none());
    }

    #[test]
    fn test_rule_validate() {
        assert!(Rule::new("user-1", "ok", ActionKind::Skip).validate().is_ok());
        assert!(Rule::new("user-1", "  ", ActionKind::Skip).validate().is_err());
        assert!(Rule::new("", "name", ActionKind::Skip).validate().is_err());

        let rule = Rule::new("user-1", "bad condition", ActionKind::AutoSend).with_condition(
            Condition::new("", OperatorKind::Equals, "x"),
        );
        assert!(matches!(rule.validate(), Err(AutomationError::Validation(_))));
    }

    #[test]
    fn test_decision_reasons() {
        let rule = Rule::new("user-1", "VIP", ActionKind::AutoSend);
        let decision = Decision::matched(rule);
        assert!(decision.should_auto_approve);
        assert_eq!(decision.reason, "Matched rule: VIP");

        let rule = Rule::new("user-1", "Sales", ActionKind::Skip);
        let decision = Decision::matched(rule);
        assert!(!decision.should_auto_approve);
        assert_eq!(decision.reason, "Rule requires manual review: Sales");
        assert_eq!(decision.action(), Some(ActionKind::Skip));
    }

    #[test]
    fn test_email_status_from_decision() {
        assert_eq!(
            EmailStatus::from_decision(&Decision::no_rules()),
            EmailStatus::PendingReview
        );
        let approved = Decision::matched(Rule::new("user-1", "r", ActionKind::AutoSend));
        assert_eq!(EmailStatus::from_decision(&approved), EmailStatus::Approved);
    }
}
