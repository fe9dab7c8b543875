use crate::db::{format_ts, now_local, ts_column};
use crate::domain::bin_location::{
    BinLocationInput, BinLocationRecord, RecordState, RecordTransition,
};
use crate::repository::connection::ConnectionProvider;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Row, Transaction, TransactionBehavior};
use tracing::{debug, info};

const ENTITY: &str = "BinLocationRecord";

/// 记录 + 每箱件数（关联商品目录）
///
/// 商品目录中同一 UPC 可能有多行，取 ProductID 最小的一行
pub(super) const STATE_SELECT: &str = r#"
    SELECT ibl.id, ibl.ProductUPC, ibl.ProductDescription, ibl.Qty_Cases,
           ibl.BinLocationID, ibl.CreatedAt, ibl.LastUpdate,
           COALESCE((SELECT it.UnitQty2 FROM Items_tbl it
                     WHERE it.ProductUPC = ibl.ProductUPC
                     ORDER BY it.ProductID LIMIT 1), 0) AS UnitQty2
    FROM Items_BinLocations ibl
"#;

// ==========================================
// BinLocationRepository - 货位分配记录仓储
// ==========================================
// 每个方法自行打开并关闭一个主库连接
pub struct BinLocationRepository {
    provider: ConnectionProvider,
}

impl BinLocationRepository {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    pub(super) fn open(&self) -> RepositoryResult<Connection> {
        self.provider.open()
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 新建记录
    ///
    /// 商品目录的每箱件数更新、记录插入、回读在同一事务内完成；
    /// 任一步失败整体回滚。CreatedAt 与 LastUpdate 使用同一时间戳。
    pub fn create(&self, input: &BinLocationInput) -> RepositoryResult<RecordTransition> {
        let bin_location_id = input.validate()?;
        let now = format_ts(&now_local());

        let mut conn = self.open()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        apply_units_per_case(&tx, input)?;
        tx.execute(
            r#"
            INSERT INTO Items_BinLocations
                (ProductUPC, ProductDescription, Qty_Cases, BinLocationID, CreatedAt, LastUpdate)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            "#,
            params![
                input.product_upc.trim(),
                input.product_description,
                input.qty_cases.unwrap_or(0),
                bin_location_id,
                now,
            ],
        )?;
        let record_id = tx.last_insert_rowid();

        let current = require_state(&tx, record_id)?;
        commit(tx)?;

        info!(record_id, upc = %current.record.product_upc, "货位记录已创建");
        Ok(RecordTransition {
            record_id,
            previous: None,
            current: Some(current),
        })
    }

    /// 修改记录的全部可变字段
    ///
    /// 读取变更前状态与写入在同一 IMMEDIATE 事务内，期间持有写锁
    pub fn update(
        &self,
        record_id: i64,
        input: &BinLocationInput,
    ) -> RepositoryResult<RecordTransition> {
        let bin_location_id = input.validate()?;
        let now = format_ts(&now_local());

        let mut conn = self.open()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = require_state(&tx, record_id)?;
        apply_units_per_case(&tx, input)?;
        tx.execute(
            r#"
            UPDATE Items_BinLocations
            SET ProductUPC = ?1,
                ProductDescription = ?2,
                Qty_Cases = ?3,
                BinLocationID = ?4,
                LastUpdate = ?5
            WHERE id = ?6
            "#,
            params![
                input.product_upc.trim(),
                input.product_description,
                input.qty_cases.unwrap_or(0),
                bin_location_id,
                now,
                record_id,
            ],
        )?;

        let current = require_state(&tx, record_id)?;
        commit(tx)?;

        info!(record_id, "货位记录已修改");
        Ok(RecordTransition {
            record_id,
            previous: Some(previous),
            current: Some(current),
        })
    }

    /// 按增量调整箱数（null 视为 0）
    ///
    /// 不做下限检查，结果可以为负数；超出 i64 范围时拒绝
    pub fn adjust_quantity(
        &self,
        record_id: i64,
        delta: i64,
    ) -> RepositoryResult<RecordTransition> {
        let now = format_ts(&now_local());

        let mut conn = self.open()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = require_state(&tx, record_id)?;
        // SQLite 整数溢出会静默转为 REAL，这里先行校验
        let current_qty = previous.record.qty_cases.unwrap_or(0);
        if current_qty.checked_add(delta).is_none() {
            return Err(RepositoryError::FieldValueError {
                field: "qty_cases".to_string(),
                message: format!("箱数调整溢出: {} + {}", current_qty, delta),
            });
        }
        tx.execute(
            r#"
            UPDATE Items_BinLocations
            SET Qty_Cases = COALESCE(Qty_Cases, 0) + ?1,
                LastUpdate = ?2
            WHERE id = ?3
            "#,
            params![delta, now, record_id],
        )?;

        let current = require_state(&tx, record_id)?;
        commit(tx)?;

        info!(
            record_id,
            delta,
            qty_cases = current.record.qty_cases.unwrap_or(0),
            "货位记录箱数已调整"
        );
        Ok(RecordTransition {
            record_id,
            previous: Some(previous),
            current: Some(current),
        })
    }

    /// 物理删除记录（台账不受影响）
    pub fn delete(&self, record_id: i64) -> RepositoryResult<RecordTransition> {
        let mut conn = self.open()?;
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous = require_state(&tx, record_id)?;
        tx.execute(
            "DELETE FROM Items_BinLocations WHERE id = ?1",
            params![record_id],
        )?;
        commit(tx)?;

        info!(record_id, "货位记录已删除");
        Ok(RecordTransition {
            record_id,
            previous: Some(previous),
            current: None,
        })
    }

    /// 读取记录当前完整状态；不存在时返回 None
    pub fn fetch_before_state(&self, record_id: i64) -> RepositoryResult<Option<RecordState>> {
        let conn = self.open()?;
        Ok(select_state(&conn, record_id)?)
    }
}

// ==========================================
// 辅助函数
// ==========================================

/// 提供每箱件数时，同步写入商品目录
fn apply_units_per_case(tx: &Transaction<'_>, input: &BinLocationInput) -> RepositoryResult<()> {
    if let Some(units) = input.units_per_case {
        let rows = tx.execute(
            "UPDATE Items_tbl SET UnitQty2 = ?1 WHERE ProductUPC = ?2",
            params![units, input.product_upc.trim()],
        )?;
        if rows == 0 {
            debug!(upc = %input.product_upc, "商品目录中无此 UPC，跳过每箱件数更新");
        }
    }
    Ok(())
}

fn commit(tx: Transaction<'_>) -> RepositoryResult<()> {
    tx.commit()
        .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))
}

pub(super) fn select_state(
    conn: &Connection,
    record_id: i64,
) -> rusqlite::Result<Option<RecordState>> {
    conn.query_row(
        &format!("{} WHERE ibl.id = ?1", STATE_SELECT),
        params![record_id],
        map_state,
    )
    .optional()
}

fn require_state(conn: &Connection, record_id: i64) -> RepositoryResult<RecordState> {
    select_state(conn, record_id)?.ok_or_else(|| RepositoryError::not_found(ENTITY, record_id))
}

/// 将 STATE_SELECT 的行映射为 RecordState（列 0..=7）
pub(super) fn map_state(row: &Row) -> rusqlite::Result<RecordState> {
    let created_at: String = row.get(5)?;
    let last_update: String = row.get(6)?;

    Ok(RecordState {
        record: BinLocationRecord {
            id: row.get(0)?,
            product_upc: row.get(1)?,
            product_description: row.get(2)?,
            qty_cases: row.get(3)?,
            bin_location_id: row.get(4)?,
            created_at: ts_column(5, &created_at)?,
            last_update: ts_column(6, &last_update)?,
        },
        units_per_case: row.get(7)?,
    })
}
