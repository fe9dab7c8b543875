use crate::db::{format_ts, now_local};
use crate::domain::bin_location::RecordSnapshot;
use crate::domain::history::NewHistoryEntry;
use crate::repository::connection::ConnectionProvider;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, TransactionBehavior};
use tracing::debug;

// ==========================================
// HistoryRepository - 变更台账仓储
// ==========================================
pub struct HistoryRepository {
    provider: ConnectionProvider,
}

impl HistoryRepository {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    pub(super) fn open(&self) -> RepositoryResult<Connection> {
        self.provider.open()
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 追加一条台账
    ///
    /// 时间戳在写入时生成，反映台账落库时刻，可能晚于记录自身的 LastUpdate。
    /// 以 IMMEDIATE 事务写入：并发写入时按 busy_timeout 等待写锁，而不是立即返回 BUSY。
    ///
    /// # 返回
    /// - `Ok(history_id)`: 新台账ID
    /// - `Err(ValidationError)`: 快照组合或调整量不合法，未写入
    pub fn record(&self, entry: &NewHistoryEntry) -> RepositoryResult<i64> {
        entry.validate()?;

        let mut conn = self.open()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
        let prev = SnapshotColumns::from(entry.previous_state.as_ref());
        let new = SnapshotColumns::from(entry.new_state.as_ref());

        tx.execute(
            r#"
            INSERT INTO Items_BinLocations_History (
                RecordID, OperationType, Timestamp, Username,
                PreviousProductUPC, PreviousProductDescription, PreviousQty_Cases,
                PreviousBinLocationID, PreviousUnitQty2,
                NewProductUPC, NewProductDescription, NewQty_Cases,
                NewBinLocationID, NewUnitQty2,
                AdjustmentAmount, Notes,
                RecordCreatedAt, RecordLastUpdate
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6, ?7, ?8, ?9,
                ?10, ?11, ?12, ?13, ?14,
                ?15, ?16, ?17, ?18
            )
            "#,
            params![
                entry.record_id,
                entry.operation.as_str(),
                format_ts(&now_local()),
                entry.username.trim(),
                prev.product_upc,
                prev.product_description,
                prev.qty_cases,
                prev.bin_location_id,
                prev.units_per_case,
                new.product_upc,
                new.product_description,
                new.qty_cases,
                new.bin_location_id,
                new.units_per_case,
                entry.adjustment_amount,
                entry.notes,
                entry.record_created_at.as_ref().map(format_ts),
                entry.record_last_update.as_ref().map(format_ts),
            ],
        )?;
        let history_id = tx.last_insert_rowid();
        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        debug!(
            history_id,
            record_id = entry.record_id,
            operation = %entry.operation,
            "台账已写入"
        );
        Ok(history_id)
    }
}

/// 快照展开为可空列（快照缺失时全部为 NULL）
struct SnapshotColumns<'a> {
    product_upc: Option<&'a str>,
    product_description: Option<&'a str>,
    qty_cases: Option<i64>,
    bin_location_id: Option<i64>,
    units_per_case: Option<i64>,
}

impl<'a> From<Option<&'a RecordSnapshot>> for SnapshotColumns<'a> {
    fn from(snapshot: Option<&'a RecordSnapshot>) -> Self {
        Self {
            product_upc: snapshot.map(|s| s.product_upc.as_str()),
            product_description: snapshot.and_then(|s| s.product_description.as_deref()),
            qty_cases: snapshot.and_then(|s| s.qty_cases),
            bin_location_id: snapshot.map(|s| s.bin_location_id),
            units_per_case: snapshot.map(|s| s.units_per_case),
        }
    }
}
