// ==========================================
// 仓库货位台账 - 主库连接配置存储
// ==========================================
// 存储: 本地 SQLite 配置库，config 表只保存一行 (id = 1)
// 并发: 所有读写经由同一把互斥锁串行化
// ==========================================

use crate::db::{configure_sqlite_connection, DEFAULT_BUSY_TIMEOUT_MS};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::info;

// ==========================================
// ConnectionParams - 主库连接参数
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionParams {
    /// 主库文件路径
    pub database_path: String,
    /// 锁等待超时（毫秒），超时后以连接错误返回
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,
}

fn default_busy_timeout() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

impl ConnectionParams {
    pub fn new(database_path: impl Into<String>) -> Self {
        Self {
            database_path: database_path.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
        }
    }

    pub fn validate(&self) -> RepositoryResult<()> {
        if self.database_path.trim().is_empty() {
            return Err(RepositoryError::missing_field("database_path"));
        }
        Ok(())
    }
}

// ==========================================
// ConnectionConfigReader - 连接参数读取接口
// ==========================================
// 实现者: ConnectionConfigStore
pub trait ConnectionConfigReader: Send + Sync {
    /// 读取当前连接参数；未配置时返回 None
    fn connection_params(&self) -> RepositoryResult<Option<ConnectionParams>>;
}

// ==========================================
// ConnectionConfigStore - 单行配置存储
// ==========================================
pub struct ConnectionConfigStore {
    conn: Mutex<Connection>,
}

impl ConnectionConfigStore {
    /// 打开（必要时创建）配置库
    pub fn open(path: impl AsRef<Path>) -> RepositoryResult<Self> {
        let conn = Connection::open(path.as_ref())
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// 内存配置库（测试用）
    pub fn open_in_memory() -> RepositoryResult<Self> {
        let conn = Connection::open_in_memory()?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> RepositoryResult<Self> {
        configure_sqlite_connection(&conn, DEFAULT_BUSY_TIMEOUT_MS)?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS config (
                id INTEGER PRIMARY KEY,
                database_path TEXT NOT NULL,
                busy_timeout_ms INTEGER NOT NULL DEFAULT 5000
            )
            "#,
        )?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn get_conn(&self) -> RepositoryResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 保存连接参数（整行替换）
    pub fn save(&self, params: &ConnectionParams) -> RepositoryResult<()> {
        params.validate()?;

        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;
        tx.execute("DELETE FROM config", [])?;
        tx.execute(
            "INSERT INTO config (id, database_path, busy_timeout_ms) VALUES (1, ?1, ?2)",
            params![params.database_path, params.busy_timeout_ms as i64],
        )?;
        tx.commit()?;

        info!(database_path = %params.database_path, "主库连接配置已保存");
        Ok(())
    }

    /// 读取连接参数
    pub fn load(&self) -> RepositoryResult<Option<ConnectionParams>> {
        let conn = self.get_conn()?;
        let params = conn
            .query_row(
                "SELECT database_path, busy_timeout_ms FROM config WHERE id = 1",
                [],
                |row| {
                    Ok(ConnectionParams {
                        database_path: row.get(0)?,
                        busy_timeout_ms: row.get::<_, i64>(1)?.max(0) as u64,
                    })
                },
            )
            .optional()?;
        Ok(params)
    }

    /// 清除连接参数
    pub fn clear(&self) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM config", [])?;
        Ok(())
    }
}

impl ConnectionConfigReader for ConnectionConfigStore {
    fn connection_params(&self) -> RepositoryResult<Option<ConnectionParams>> {
        self.load()
    }
}

// 固定参数（来自命令行或环境变量时使用）
impl ConnectionConfigReader for ConnectionParams {
    fn connection_params(&self) -> RepositoryResult<Option<ConnectionParams>> {
        Ok(Some(self.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_empty_store_returns_none() {
        let store = ConnectionConfigStore::open_in_memory().unwrap();
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_save_replaces_single_row() {
        let store = ConnectionConfigStore::open_in_memory().unwrap();
        store.save(&ConnectionParams::new("/data/a.db")).unwrap();
        store
            .save(&ConnectionParams {
                database_path: "/data/b.db".to_string(),
                busy_timeout_ms: 250,
            })
            .unwrap();

        let loaded = store.load().unwrap().unwrap();
        assert_eq!(loaded.database_path, "/data/b.db");
        assert_eq!(loaded.busy_timeout_ms, 250);

        let rows: i64 = store
            .get_conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM config", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
    }

    #[test]
    fn test_save_rejects_empty_path() {
        let store = ConnectionConfigStore::open_in_memory().unwrap();
        let err = store.save(&ConnectionParams::new("  ")).unwrap_err();
        assert!(matches!(err, RepositoryError::FieldValueError { .. }));
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn test_clear() {
        let store = ConnectionConfigStore::open_in_memory().unwrap();
        store.save(&ConnectionParams::new("/data/a.db")).unwrap();
        store.clear().unwrap();
        assert_eq!(store.connection_params().unwrap(), None);
    }

    #[test]
    fn test_params_deserialize_default_timeout() {
        let params: ConnectionParams =
            serde_json::from_str(r#"{"database_path":"/data/a.db"}"#).unwrap();
        assert_eq!(params.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
    }

    #[test]
    fn test_concurrent_saves_leave_one_row() {
        use std::sync::Arc;

        let store = Arc::new(ConnectionConfigStore::open_in_memory().unwrap());
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    store
                        .save(&ConnectionParams::new(format!("/data/{}.db", i)))
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let rows: i64 = store
            .get_conn()
            .unwrap()
            .query_row("SELECT COUNT(*) FROM config", [], |row| row.get(0))
            .unwrap();
        assert_eq!(rows, 1);
        assert!(store.load().unwrap().is_some());
    }
}
