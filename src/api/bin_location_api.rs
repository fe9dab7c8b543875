// ==========================================
// 仓库货位台账 - 货位记录 API
// ==========================================
// 职责: 货位记录读写 + 变更台账
// 流程: 写主库（事务内读取变更前状态）→ 提交 → 追加台账
// 台账写入失败不回滚已提交的业务变更，以 AuditStatus::NotRecorded 告知调用方
// ==========================================

use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::bin_location::{
    BinInfo, BinLocationInput, BinLocationView, ProductInfo, ProductSearchField, RecordState,
    RecordTransition,
};
use crate::domain::history::{
    HistoryEntry, HistoryFilter, HistoryStats, NewHistoryEntry, OperationKind,
};
use crate::repository::bin_location_repo::BinLocationRepository;
use crate::repository::connection::ConnectionProvider;
use crate::repository::history_repo::HistoryRepository;

// ==========================================
// 写操作结果
// ==========================================

/// 台账写入状态
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AuditStatus {
    Recorded { history_id: i64 },
    /// 业务变更已提交，但台账未写入
    NotRecorded { reason: String },
}

/// 写操作结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriteOutcome {
    pub record_id: i64,
    pub operation: OperationKind,
    pub audit: AuditStatus,
}

impl WriteOutcome {
    pub fn is_audited(&self) -> bool {
        matches!(self.audit, AuditStatus::Recorded { .. })
    }
}

// ==========================================
// BinLocationApi
// ==========================================

/// 货位记录API
///
/// 职责：
/// 1. 货位记录查询（含总件数计算）
/// 2. 新建/修改/调整/删除，并记录台账
/// 3. 商品、货位参考数据查询
/// 4. 台账查询与统计
pub struct BinLocationApi {
    bin_location_repo: Arc<BinLocationRepository>,
    history_repo: Arc<HistoryRepository>,
}

impl BinLocationApi {
    pub fn new(
        bin_location_repo: Arc<BinLocationRepository>,
        history_repo: Arc<HistoryRepository>,
    ) -> Self {
        Self {
            bin_location_repo,
            history_repo,
        }
    }

    /// 基于同一个连接提供者组装
    pub fn from_provider(provider: ConnectionProvider) -> Self {
        Self::new(
            Arc::new(BinLocationRepository::new(provider.clone())),
            Arc::new(HistoryRepository::new(provider)),
        )
    }

    // ==========================================
    // 查询接口
    // ==========================================

    pub fn list_bin_locations(&self) -> ApiResult<Vec<BinLocationView>> {
        Ok(self.bin_location_repo.list()?)
    }

    /// 单条记录当前状态
    pub fn get_bin_location(&self, record_id: i64) -> ApiResult<RecordState> {
        self.bin_location_repo
            .fetch_before_state(record_id)?
            .ok_or_else(|| ApiError::NotFound(format!("货位记录(id={})不存在", record_id)))
    }

    /// 商品搜索；field 取值 description / upc / sku
    pub fn search_products(&self, query: &str, field: &str) -> ApiResult<Vec<ProductInfo>> {
        let field = ProductSearchField::parse(field).ok_or_else(|| {
            ApiError::ValidationFailure(format!("不支持的搜索字段: {}", field))
        })?;
        Ok(self.bin_location_repo.search_products(query, field)?)
    }

    pub fn search_bins(&self, query: &str) -> ApiResult<Vec<BinInfo>> {
        Ok(self.bin_location_repo.search_bins(query)?)
    }

    pub fn list_bins(&self) -> ApiResult<Vec<BinInfo>> {
        Ok(self.bin_location_repo.list_bins()?)
    }

    pub fn list_unused_bins(&self) -> ApiResult<Vec<BinInfo>> {
        Ok(self.bin_location_repo.list_unused_bins()?)
    }

    // ==========================================
    // 写入接口
    // ==========================================

    pub fn create_bin_location(
        &self,
        input: &BinLocationInput,
        acting_user: &str,
    ) -> ApiResult<WriteOutcome> {
        let acting_user = require_user(acting_user)?;
        let transition = self.bin_location_repo.create(input)?;
        Ok(self.finish(OperationKind::Create, acting_user, &transition, None, None))
    }

    pub fn update_bin_location(
        &self,
        record_id: i64,
        input: &BinLocationInput,
        acting_user: &str,
    ) -> ApiResult<WriteOutcome> {
        let acting_user = require_user(acting_user)?;
        let transition = self.bin_location_repo.update(record_id, input)?;
        Ok(self.finish(OperationKind::Update, acting_user, &transition, None, None))
    }

    /// 调整箱数（正数入库、负数出库）
    pub fn adjust_quantity(
        &self,
        record_id: i64,
        delta: i64,
        notes: Option<&str>,
        acting_user: &str,
    ) -> ApiResult<WriteOutcome> {
        let acting_user = require_user(acting_user)?;
        let notes = notes
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string);

        let transition = self.bin_location_repo.adjust_quantity(record_id, delta)?;
        Ok(self.finish(
            OperationKind::Adjust,
            acting_user,
            &transition,
            Some(delta),
            notes,
        ))
    }

    pub fn delete_bin_location(
        &self,
        record_id: i64,
        acting_user: &str,
    ) -> ApiResult<WriteOutcome> {
        let acting_user = require_user(acting_user)?;
        let transition = self.bin_location_repo.delete(record_id)?;
        Ok(self.finish(OperationKind::Delete, acting_user, &transition, None, None))
    }

    // ==========================================
    // 台账接口
    // ==========================================

    pub fn history(&self, filter: &HistoryFilter) -> ApiResult<Vec<HistoryEntry>> {
        Ok(self.history_repo.query(filter)?)
    }

    /// 以原始查询参数查询台账
    ///
    /// operation 为空或 `ALL` 表示不过滤；limit 为 None 时取默认上限，0 表示不限
    pub fn history_by_params(
        &self,
        record_id: Option<i64>,
        operation: Option<&str>,
        username: Option<&str>,
        start_time: Option<NaiveDateTime>,
        end_time: Option<NaiveDateTime>,
        limit: Option<u32>,
    ) -> ApiResult<Vec<HistoryEntry>> {
        let mut filter = HistoryFilter::new().between(start_time, end_time);
        filter.record_id = record_id;
        filter.operation = parse_operation_filter(operation)?;
        filter.username = username.map(str::to_string);
        if let Some(n) = limit {
            filter.limit = Some(n);
        }
        self.history(&filter)
    }

    pub fn history_stats(&self) -> ApiResult<HistoryStats> {
        Ok(self.history_repo.stats()?)
    }

    // ==========================================
    // 辅助方法
    // ==========================================

    /// 业务变更已提交后追加台账
    fn finish(
        &self,
        operation: OperationKind,
        acting_user: &str,
        transition: &RecordTransition,
        adjustment_amount: Option<i64>,
        notes: Option<String>,
    ) -> WriteOutcome {
        let entry = NewHistoryEntry::from_transition(
            operation,
            acting_user,
            transition,
            adjustment_amount,
            notes,
        );

        let audit = match self.history_repo.record(&entry) {
            Ok(history_id) => AuditStatus::Recorded { history_id },
            Err(e) => {
                warn!(
                    error = %e,
                    record_id = transition.record_id,
                    operation = %operation,
                    "记录台账失败，业务变更已提交"
                );
                AuditStatus::NotRecorded {
                    reason: e.to_string(),
                }
            }
        };

        info!(
            record_id = transition.record_id,
            operation = %operation,
            acting_user,
            "货位记录变更完成"
        );
        WriteOutcome {
            record_id: transition.record_id,
            operation,
            audit,
        }
    }
}

/// 操作人不能为空
fn require_user(acting_user: &str) -> ApiResult<&str> {
    let user = acting_user.trim();
    if user.is_empty() {
        return Err(ApiError::ValidationFailure("操作人不能为空".to_string()));
    }
    Ok(user)
}

/// 解析台账操作类型过滤条件
pub fn parse_operation_filter(raw: Option<&str>) -> ApiResult<Option<OperationKind>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) if s.eq_ignore_ascii_case("ALL") => Ok(None),
        Some(s) => OperationKind::parse(&s.to_ascii_uppercase())
            .map(Some)
            .ok_or_else(|| ApiError::ValidationFailure(format!("未知操作类型: {}", s))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_operation_filter() {
        assert_eq!(parse_operation_filter(None).unwrap(), None);
        assert_eq!(parse_operation_filter(Some("ALL")).unwrap(), None);
        assert_eq!(parse_operation_filter(Some(" ")).unwrap(), None);
        assert_eq!(
            parse_operation_filter(Some("adjust")).unwrap(),
            Some(OperationKind::Adjust)
        );
        assert!(matches!(
            parse_operation_filter(Some("MOVE")),
            Err(ApiError::ValidationFailure(_))
        ));
    }

    #[test]
    fn test_require_user() {
        assert_eq!(require_user(" alice ").unwrap(), "alice");
        assert!(require_user("").is_err());
    }

    #[test]
    fn test_audit_status_serialization() {
        let json = serde_json::to_value(AuditStatus::Recorded { history_id: 3 }).unwrap();
        assert_eq!(json["status"], "recorded");
        assert_eq!(json["history_id"], 3);
    }
}
