// ==========================================
// 仓库货位台账 - 变更台账领域模型
// ==========================================
// 对齐: Items_BinLocations_History 表
// 红线: 台账只追加，写入后永不修改
// ==========================================

use crate::domain::bin_location::{RecordSnapshot, RecordTransition};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// 历史查询默认返回条数
pub const DEFAULT_HISTORY_LIMIT: u32 = 500;

// ==========================================
// OperationKind - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OperationKind {
    Create,
    Update,
    Adjust,
    Delete,
}

impl OperationKind {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Create => "CREATE",
            OperationKind::Update => "UPDATE",
            OperationKind::Adjust => "ADJUST",
            OperationKind::Delete => "DELETE",
        }
    }

    /// 从字符串解析
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "CREATE" => Some(OperationKind::Create),
            "UPDATE" => Some(OperationKind::Update),
            "ADJUST" => Some(OperationKind::Adjust),
            "DELETE" => Some(OperationKind::Delete),
            _ => None,
        }
    }
}

impl std::fmt::Display for OperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ==========================================
// NewHistoryEntry - 待写入的台账条目
// ==========================================
// 时间戳由写入方在写入时生成，不在此携带
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewHistoryEntry {
    pub record_id: i64,
    pub operation: OperationKind,
    pub username: String,
    pub previous_state: Option<RecordSnapshot>,
    pub new_state: Option<RecordSnapshot>,
    pub adjustment_amount: Option<i64>,
    pub notes: Option<String>,
    pub record_created_at: Option<NaiveDateTime>, // 取自变更前状态
    pub record_last_update: Option<NaiveDateTime>, // 取自变更前状态
}

impl NewHistoryEntry {
    /// 从一次写操作的前后状态构造台账条目
    pub fn from_transition(
        operation: OperationKind,
        username: &str,
        transition: &RecordTransition,
        adjustment_amount: Option<i64>,
        notes: Option<String>,
    ) -> Self {
        let previous = transition.previous.as_ref();
        Self {
            record_id: transition.record_id,
            operation,
            username: username.to_string(),
            previous_state: previous.map(|s| s.snapshot()),
            new_state: transition.current.as_ref().map(|s| s.snapshot()),
            adjustment_amount,
            notes,
            record_created_at: previous.map(|s| s.record.created_at),
            record_last_update: previous.map(|s| s.record.last_update),
        }
    }

    /// 台账条目结构校验
    ///
    /// - 至少一个快照非空
    /// - CREATE 无变更前快照，DELETE 无变更后快照，UPDATE/ADJUST 两者都有
    /// - 只有 ADJUST 携带调整量，且必须携带
    pub fn validate(&self) -> RepositoryResult<()> {
        if self.username.trim().is_empty() {
            return Err(RepositoryError::missing_field("username"));
        }

        let shape_ok = match self.operation {
            OperationKind::Create => self.previous_state.is_none() && self.new_state.is_some(),
            OperationKind::Delete => self.previous_state.is_some() && self.new_state.is_none(),
            OperationKind::Update | OperationKind::Adjust => {
                self.previous_state.is_some() && self.new_state.is_some()
            }
        };
        if !shape_ok {
            return Err(RepositoryError::ValidationError(format!(
                "{} 台账条目的快照组合不合法: previous={}, new={}",
                self.operation,
                self.previous_state.is_some(),
                self.new_state.is_some()
            )));
        }

        match (self.operation, self.adjustment_amount) {
            (OperationKind::Adjust, None) => Err(RepositoryError::ValidationError(
                "ADJUST 台账条目必须携带调整量".to_string(),
            )),
            (OperationKind::Adjust, Some(_)) | (_, None) => Ok(()),
            (kind, Some(_)) => Err(RepositoryError::ValidationError(format!(
                "{} 台账条目不能携带调整量",
                kind
            ))),
        }
    }
}

// ==========================================
// HistoryEntry - 已落库的台账条目
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub history_id: i64,
    pub record_id: i64,
    pub operation: OperationKind,
    pub timestamp: NaiveDateTime,
    pub username: String,

    // ===== 变更前 =====
    pub previous_state: Option<RecordSnapshot>,
    pub previous_bin_location: Option<String>, // 按货位目录当前名称展示

    // ===== 变更后 =====
    pub new_state: Option<RecordSnapshot>,
    pub new_bin_location: Option<String>,

    pub adjustment_amount: Option<i64>,
    pub notes: Option<String>,
    pub record_created_at: Option<NaiveDateTime>,
    pub record_last_update: Option<NaiveDateTime>,
}

// ==========================================
// HistoryFilter - 台账查询条件
// ==========================================
// 所有条件可选，按 AND 组合；limit 为 None 或 0 表示不限条数
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryFilter {
    pub record_id: Option<i64>,
    pub operation: Option<OperationKind>,
    pub username: Option<String>,
    pub start_time: Option<NaiveDateTime>,
    pub end_time: Option<NaiveDateTime>,
    pub limit: Option<u32>,
}

impl Default for HistoryFilter {
    fn default() -> Self {
        Self {
            record_id: None,
            operation: None,
            username: None,
            start_time: None,
            end_time: None,
            limit: Some(DEFAULT_HISTORY_LIMIT),
        }
    }
}

impl HistoryFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(mut self, record_id: i64) -> Self {
        self.record_id = Some(record_id);
        self
    }

    pub fn operation(mut self, operation: OperationKind) -> Self {
        self.operation = Some(operation);
        self
    }

    pub fn username(mut self, username: &str) -> Self {
        self.username = Some(username.to_string());
        self
    }

    pub fn between(mut self, start: Option<NaiveDateTime>, end: Option<NaiveDateTime>) -> Self {
        self.start_time = start;
        self.end_time = end;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// 取消条数上限
    pub fn unlimited(mut self) -> Self {
        self.limit = None;
        self
    }

    /// 实际生效的条数上限（0 视同不限）
    pub fn effective_limit(&self) -> Option<u32> {
        self.limit.filter(|n| *n > 0)
    }
}

// ==========================================
// HistoryStats - 台账汇总统计
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryStats {
    pub total_operations: i64,
    pub creates: i64,
    pub updates: i64,
    pub adjustments: i64,
    pub deletes: i64,
    pub unique_users: i64,
    pub earliest_operation: Option<NaiveDateTime>,
    pub latest_operation: Option<NaiveDateTime>,
}

impl HistoryStats {
    /// 四类操作计数之和
    pub fn kind_total(&self) -> i64 {
        self.creates + self.updates + self.adjustments + self.deletes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(qty: i64) -> RecordSnapshot {
        RecordSnapshot {
            product_upc: "000111".to_string(),
            product_description: Some("Widget".to_string()),
            qty_cases: Some(qty),
            bin_location_id: 1,
            units_per_case: 12,
        }
    }

    fn entry(
        operation: OperationKind,
        previous: Option<i64>,
        new: Option<i64>,
        amount: Option<i64>,
    ) -> NewHistoryEntry {
        NewHistoryEntry {
            record_id: 1,
            operation,
            username: "alice".to_string(),
            previous_state: previous.map(snapshot),
            new_state: new.map(snapshot),
            adjustment_amount: amount,
            notes: None,
            record_created_at: None,
            record_last_update: None,
        }
    }

    #[test]
    fn test_operation_kind_round_trip() {
        for kind in [
            OperationKind::Create,
            OperationKind::Update,
            OperationKind::Adjust,
            OperationKind::Delete,
        ] {
            assert_eq!(OperationKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(OperationKind::parse("ALL"), None);
    }

    #[test]
    fn test_validate_snapshot_shapes() {
        assert!(entry(OperationKind::Create, None, Some(1), None).validate().is_ok());
        assert!(entry(OperationKind::Delete, Some(1), None, None).validate().is_ok());
        assert!(entry(OperationKind::Update, Some(1), Some(2), None).validate().is_ok());

        assert!(entry(OperationKind::Create, Some(1), Some(1), None).validate().is_err());
        assert!(entry(OperationKind::Delete, None, None, None).validate().is_err());
        assert!(entry(OperationKind::Update, None, Some(2), None).validate().is_err());
    }

    #[test]
    fn test_validate_adjustment_amount() {
        assert!(entry(OperationKind::Adjust, Some(1), Some(3), Some(2)).validate().is_ok());
        assert!(entry(OperationKind::Adjust, Some(1), Some(3), None).validate().is_err());
        assert!(entry(OperationKind::Update, Some(1), Some(3), Some(2)).validate().is_err());
    }

    #[test]
    fn test_validate_requires_username() {
        let mut e = entry(OperationKind::Create, None, Some(1), None);
        e.username = " ".to_string();
        assert!(e.validate().is_err());
    }

    #[test]
    fn test_filter_limit_semantics() {
        assert_eq!(HistoryFilter::new().effective_limit(), Some(DEFAULT_HISTORY_LIMIT));
        assert_eq!(HistoryFilter::new().limit(0).effective_limit(), None);
        assert_eq!(HistoryFilter::new().unlimited().effective_limit(), None);
        assert_eq!(HistoryFilter::new().limit(2).effective_limit(), Some(2));
    }
}
