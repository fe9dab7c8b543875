// ==========================================
// 仓库货位台账 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有连接的 PRAGMA 行为（外键、busy_timeout）
// - 统一时间戳的文本格式，保证字典序即时间序
// - 提供主库建表脚本（测试与 init-schema 命令使用）
// 时区: 时间戳取进程所在主机的本地时间（无时区信息落库）；
//       与既有台账（美国中部时间）混用时，进程须以 TZ=America/Chicago 运行
// ==========================================

use chrono::NaiveDateTime;
use rusqlite::Connection;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 时间戳存储格式（毫秒精度）
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(
    conn: &Connection,
    busy_timeout_ms: u64,
) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(())
}

/// 当前本地时间（无时区，与主库的 naive datetime 列对齐）
///
/// 时区由进程环境（TZ）决定
pub fn now_local() -> NaiveDateTime {
    chrono::Local::now().naive_local()
}

/// 时间戳 -> 存储文本
pub fn format_ts(ts: &NaiveDateTime) -> String {
    ts.format(DATETIME_FORMAT).to_string()
}

/// 存储文本 -> 时间戳（兼容无小数秒的历史数据）
pub fn parse_ts(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
}

/// 在 row 映射中解析时间戳列
pub(crate) fn ts_column(idx: usize, raw: &str) -> rusqlite::Result<NaiveDateTime> {
    parse_ts(raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

/// 初始化主库 schema（幂等）
///
/// 生产环境的主库通常已存在这些表；这里的定义覆盖引擎引用到的全部列。
pub fn init_primary_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS BinLocations_tbl (
            BinLocationID INTEGER PRIMARY KEY AUTOINCREMENT,
            BinLocation TEXT
        );

        CREATE TABLE IF NOT EXISTS Items_tbl (
            ProductID INTEGER PRIMARY KEY AUTOINCREMENT,
            ProductUPC TEXT,
            ProductSKU TEXT,
            ProductDescription TEXT,
            UnitQty2 INTEGER
        );

        CREATE TABLE IF NOT EXISTS Items_BinLocations (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            ProductUPC TEXT NOT NULL,
            ProductDescription TEXT,
            Qty_Cases INTEGER,
            BinLocationID INTEGER NOT NULL,
            CreatedAt TEXT NOT NULL,
            LastUpdate TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS Items_BinLocations_History (
            HistoryID INTEGER PRIMARY KEY AUTOINCREMENT,
            RecordID INTEGER NOT NULL,
            OperationType TEXT NOT NULL
                CHECK (OperationType IN ('CREATE', 'UPDATE', 'ADJUST', 'DELETE')),
            Timestamp TEXT NOT NULL,
            Username TEXT NOT NULL,
            PreviousProductUPC TEXT,
            PreviousProductDescription TEXT,
            PreviousQty_Cases INTEGER,
            PreviousBinLocationID INTEGER,
            PreviousUnitQty2 INTEGER,
            NewProductUPC TEXT,
            NewProductDescription TEXT,
            NewQty_Cases INTEGER,
            NewBinLocationID INTEGER,
            NewUnitQty2 INTEGER,
            AdjustmentAmount INTEGER,
            Notes TEXT,
            RecordCreatedAt TEXT,
            RecordLastUpdate TEXT
        );

        CREATE INDEX IF NOT EXISTS idx_history_record
            ON Items_BinLocations_History (RecordID, Timestamp);

        CREATE TABLE IF NOT EXISTS Trustees_tbl (
            AutoID INTEGER PRIMARY KEY AUTOINCREMENT,
            EmployeeID TEXT,
            Login_name TEXT NOT NULL,
            Password TEXT NOT NULL,
            acDsbld INTEGER
        );
        "#,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ts_round_trip_keeps_millis() {
        let ts = NaiveDateTime::parse_from_str("2025-03-01 08:15:30.250", "%Y-%m-%d %H:%M:%S%.f")
            .unwrap();
        assert_eq!(format_ts(&ts), "2025-03-01 08:15:30.250");
        assert_eq!(parse_ts(&format_ts(&ts)).unwrap(), ts);
    }

    #[test]
    fn test_now_local_is_host_wall_clock() {
        let before = chrono::Local::now().naive_local();
        let now = now_local();
        let after = chrono::Local::now().naive_local();
        assert!(before <= now && now <= after);
    }

    #[test]
    fn test_parse_ts_without_fraction() {
        let ts = parse_ts("2025-03-01 08:15:30").unwrap();
        assert_eq!(format_ts(&ts), "2025-03-01 08:15:30.000");
    }

    #[test]
    fn test_init_primary_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn, DEFAULT_BUSY_TIMEOUT_MS).unwrap();
        init_primary_schema(&conn).unwrap();
        init_primary_schema(&conn).unwrap();

        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name IN \
                 ('Items_BinLocations', 'BinLocations_tbl', 'Items_tbl', \
                  'Items_BinLocations_History', 'Trustees_tbl')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 5);
    }

    #[test]
    fn test_history_rejects_unknown_operation_type() {
        let conn = Connection::open_in_memory().unwrap();
        init_primary_schema(&conn).unwrap();

        let result = conn.execute(
            "INSERT INTO Items_BinLocations_History (RecordID, OperationType, Timestamp, Username) \
             VALUES (1, 'MOVE', '2025-01-01 00:00:00.000', 'u')",
            [],
        );
        assert!(result.is_err());
    }
}
