// ==========================================
// 仓库货位台账 - 主库连接提供者
// ==========================================
// 约束:
// - 每次逻辑操作打开一个新连接，作用域结束即关闭（Drop）
// - 不做连接池，不做缓存
// - 无连接参数时快速失败 (ConfigMissing)
// ==========================================

use crate::config::{ConnectionConfigReader, ConnectionParams};
use crate::db::configure_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{Connection, OpenFlags};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};

/// 连接测试结果（供设置页展示，不以错误返回）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionTestResult {
    pub success: bool,
    pub message: String,
}

// ==========================================
// ConnectionProvider
// ==========================================
#[derive(Clone)]
pub struct ConnectionProvider {
    config: Arc<dyn ConnectionConfigReader>,
}

impl ConnectionProvider {
    pub fn new(config: Arc<dyn ConnectionConfigReader>) -> Self {
        Self { config }
    }

    /// 读取当前连接参数；未配置或路径为空时返回 ConfigMissing
    fn params(&self) -> RepositoryResult<ConnectionParams> {
        match self.config.connection_params()? {
            Some(params) if !params.database_path.trim().is_empty() => Ok(params),
            _ => Err(RepositoryError::ConfigMissing),
        }
    }

    /// 打开一个主库连接
    ///
    /// 主库文件必须已存在（不会隐式创建空库）
    pub fn open(&self) -> RepositoryResult<Connection> {
        let params = self.params()?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;
        let conn = Connection::open_with_flags(&params.database_path, flags).map_err(|e| {
            error!(database_path = %params.database_path, error = %e, "主库连接失败");
            RepositoryError::DatabaseConnectionError(e.to_string())
        })?;

        configure_sqlite_connection(&conn, params.busy_timeout_ms)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;

        debug!(database_path = %params.database_path, "主库连接已打开");
        Ok(conn)
    }

    /// 测试连接是否可用
    pub fn test_connection(&self) -> ConnectionTestResult {
        let outcome = self.open().and_then(|conn| {
            conn.query_row("SELECT COUNT(*) FROM sqlite_master", [], |row| {
                row.get::<_, i64>(0)
            })
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))
        });

        match outcome {
            Ok(_) => ConnectionTestResult {
                success: true,
                message: "连接成功".to_string(),
            },
            Err(e) => ConnectionTestResult {
                success: false,
                message: e.to_string(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionConfigStore;
    use tempfile::NamedTempFile;

    #[test]
    fn test_open_without_config_is_config_missing() {
        let store = Arc::new(ConnectionConfigStore::open_in_memory().unwrap());
        let provider = ConnectionProvider::new(store);

        assert!(matches!(provider.open(), Err(RepositoryError::ConfigMissing)));
        assert!(!provider.test_connection().success);
    }

    #[test]
    fn test_open_missing_file_is_connection_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.db");
        let provider = ConnectionProvider::new(Arc::new(ConnectionParams::new(
            path.to_str().unwrap(),
        )));

        assert!(matches!(
            provider.open(),
            Err(RepositoryError::DatabaseConnectionError(_))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_open_existing_database() {
        let file = NamedTempFile::new().unwrap();
        let provider = ConnectionProvider::new(Arc::new(ConnectionParams::new(
            file.path().to_str().unwrap(),
        )));

        let conn = provider.open().unwrap();
        let fk: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);

        let result = provider.test_connection();
        assert!(result.success, "{}", result.message);
    }

    #[test]
    fn test_provider_follows_config_changes() {
        let file = NamedTempFile::new().unwrap();
        let store = Arc::new(ConnectionConfigStore::open_in_memory().unwrap());
        let provider = ConnectionProvider::new(store.clone());

        assert!(matches!(provider.open(), Err(RepositoryError::ConfigMissing)));

        store
            .save(&ConnectionParams::new(file.path().to_str().unwrap()))
            .unwrap();
        assert!(provider.open().is_ok());
    }
}
