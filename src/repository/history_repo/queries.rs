use super::core::HistoryRepository;
use crate::db::{format_ts, ts_column};
use crate::domain::bin_location::RecordSnapshot;
use crate::domain::history::{HistoryEntry, HistoryFilter, HistoryStats, OperationKind};
use crate::repository::error::RepositoryResult;
use crate::repository::sql_builder::SqlQueryBuilder;
use rusqlite::types::Type;
use rusqlite::{params_from_iter, Result as SqliteResult, Row};
use tracing::debug;

/// Timestamp 统一为 `YYYY-MM-DD HH:MM:SS.SSS` 再比较/排序
///
/// 历史数据中存在无小数秒的时间戳，直接按文本比较会落在同一秒的 `.000` 边界之下
const TS_NORMALIZED: &str = "strftime('%Y-%m-%d %H:%M:%f', h.Timestamp)";

/// 货位名称按货位目录的当前状态关联，而非写入时刻的名称
const HISTORY_SELECT: &str = r#"
    SELECT h.HistoryID, h.RecordID, h.OperationType, h.Timestamp, h.Username,
           h.PreviousProductUPC, h.PreviousProductDescription, h.PreviousQty_Cases,
           h.PreviousBinLocationID, prev_bl.BinLocation, h.PreviousUnitQty2,
           h.NewProductUPC, h.NewProductDescription, h.NewQty_Cases,
           h.NewBinLocationID, new_bl.BinLocation, h.NewUnitQty2,
           h.AdjustmentAmount, h.Notes, h.RecordCreatedAt, h.RecordLastUpdate
    FROM Items_BinLocations_History h
    LEFT JOIN BinLocations_tbl prev_bl ON h.PreviousBinLocationID = prev_bl.BinLocationID
    LEFT JOIN BinLocations_tbl new_bl ON h.NewBinLocationID = new_bl.BinLocationID
"#;

impl HistoryRepository {
    // ==========================================
    // 查询操作
    // ==========================================

    /// 按条件查询台账，最新的在前
    ///
    /// 所有条件可选，按 AND 组合；limit 为 None 或 0 时不限条数
    pub fn query(&self, filter: &HistoryFilter) -> RepositoryResult<Vec<HistoryEntry>> {
        let username = filter
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string);

        let builder = SqlQueryBuilder::new(HISTORY_SELECT)
            .and_if(filter.record_id, "h.RecordID = ?")
            .and_if(
                filter.operation.map(|k| k.as_str().to_string()),
                "h.OperationType = ?",
            )
            .and_if(username, "h.Username = ?")
            .and_if(
                filter.start_time.as_ref().map(format_ts),
                &format!("{} >= ?", TS_NORMALIZED),
            )
            .and_if(
                filter.end_time.as_ref().map(format_ts),
                &format!("{} <= ?", TS_NORMALIZED),
            )
            .order_by(&format!("{} DESC, h.HistoryID DESC", TS_NORMALIZED))
            .limit(filter.effective_limit());

        let conn = self.open()?;
        let mut stmt = conn.prepare(&builder.sql())?;
        let entries = stmt
            .query_map(params_from_iter(builder.params()), map_entry)?
            .collect::<SqliteResult<Vec<_>>>()?;

        debug!(count = entries.len(), ?filter, "查询台账");
        Ok(entries)
    }

    /// 全量台账统计（不受过滤条件影响）
    pub fn stats(&self) -> RepositoryResult<HistoryStats> {
        let conn = self.open()?;

        let stats = conn.query_row(
            r#"
            SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN OperationType = 'CREATE' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN OperationType = 'UPDATE' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN OperationType = 'ADJUST' THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN OperationType = 'DELETE' THEN 1 ELSE 0 END), 0),
                COUNT(DISTINCT Username),
                MIN(strftime('%Y-%m-%d %H:%M:%f', h.Timestamp)),
                MAX(strftime('%Y-%m-%d %H:%M:%f', h.Timestamp))
            FROM Items_BinLocations_History h
            "#,
            [],
            |row| {
                let earliest: Option<String> = row.get(6)?;
                let latest: Option<String> = row.get(7)?;
                Ok(HistoryStats {
                    total_operations: row.get(0)?,
                    creates: row.get(1)?,
                    updates: row.get(2)?,
                    adjustments: row.get(3)?,
                    deletes: row.get(4)?,
                    unique_users: row.get(5)?,
                    earliest_operation: earliest.map(|s| ts_column(6, &s)).transpose()?,
                    latest_operation: latest.map(|s| ts_column(7, &s)).transpose()?,
                })
            },
        )?;

        Ok(stats)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 将数据库行映射为 HistoryEntry
fn map_entry(row: &Row) -> SqliteResult<HistoryEntry> {
    let operation_raw: String = row.get(2)?;
    let operation = OperationKind::parse(&operation_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("未知操作类型: {}", operation_raw).into(),
        )
    })?;

    let timestamp: String = row.get(3)?;
    let created_at: Option<String> = row.get(19)?;
    let last_update: Option<String> = row.get(20)?;

    Ok(HistoryEntry {
        history_id: row.get(0)?,
        record_id: row.get(1)?,
        operation,
        timestamp: ts_column(3, &timestamp)?,
        username: row.get(4)?,
        previous_state: map_snapshot(row, 5)?,
        previous_bin_location: row.get(9)?,
        new_state: map_snapshot(row, 11)?,
        new_bin_location: row.get(15)?,
        adjustment_amount: row.get(17)?,
        notes: row.get(18)?,
        record_created_at: created_at.map(|s| ts_column(19, &s)).transpose()?,
        record_last_update: last_update.map(|s| ts_column(20, &s)).transpose()?,
    })
}

/// 从 base 开始依次为 UPC、描述、箱数、货位ID、（货位名称）、每箱件数
///
/// UPC 或货位ID 为空时视为无快照
fn map_snapshot(row: &Row, base: usize) -> SqliteResult<Option<RecordSnapshot>> {
    let product_upc: Option<String> = row.get(base)?;
    let bin_location_id: Option<i64> = row.get(base + 3)?;

    match (product_upc, bin_location_id) {
        (Some(product_upc), Some(bin_location_id)) => Ok(Some(RecordSnapshot {
            product_upc,
            product_description: row.get(base + 1)?,
            qty_cases: row.get(base + 2)?,
            bin_location_id,
            units_per_case: row.get::<_, Option<i64>>(base + 5)?.unwrap_or(0),
        })),
        _ => Ok(None),
    }
}
