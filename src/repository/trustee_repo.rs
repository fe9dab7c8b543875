// ==========================================
// 仓库货位台账 - 登录人员仓储
// ==========================================
// 对齐: Trustees_tbl 表（只读）
// 说明: 密码按表中现有格式直接比对，表结构由外部系统维护
// ==========================================

use crate::domain::trustee::AuthenticatedUser;
use crate::repository::connection::ConnectionProvider;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, OptionalExtension};

pub struct TrusteeRepository {
    provider: ConnectionProvider,
}

impl TrusteeRepository {
    pub fn new(provider: ConnectionProvider) -> Self {
        Self { provider }
    }

    /// 校验登录名与密码
    ///
    /// # 返回
    /// - `Ok(Some(user))`: 校验通过且账号未停用
    /// - `Ok(None)`: 登录名/密码不匹配或账号已停用
    pub fn verify_credentials(
        &self,
        login_name: &str,
        password: &str,
    ) -> RepositoryResult<Option<AuthenticatedUser>> {
        if login_name.trim().is_empty() {
            return Err(RepositoryError::missing_field("login_name"));
        }
        if password.is_empty() {
            return Err(RepositoryError::missing_field("password"));
        }

        let conn = self.provider.open()?;
        let user = conn
            .query_row(
                r#"
                SELECT AutoID, EmployeeID, Login_name
                FROM Trustees_tbl
                WHERE Login_name = ?1
                  AND Password = ?2
                  AND COALESCE(acDsbld, 0) = 0
                "#,
                params![login_name.trim(), password],
                |row| {
                    Ok(AuthenticatedUser {
                        auto_id: row.get(0)?,
                        employee_id: row.get(1)?,
                        login_name: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConnectionParams;
    use crate::db::init_primary_schema;
    use rusqlite::Connection;
    use std::sync::Arc;
    use tempfile::NamedTempFile;

    fn setup_test_repo() -> (NamedTempFile, TrusteeRepository) {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_str().unwrap().to_string();

        let conn = Connection::open(&path).unwrap();
        init_primary_schema(&conn).unwrap();
        conn.execute_batch(
            r#"
            INSERT INTO Trustees_tbl (EmployeeID, Login_name, Password, acDsbld) VALUES
                ('E100', 'alice', 'secret', 0),
                ('E200', 'bob', 'hunter2', NULL),
                ('E300', 'carol', 'pw', 1);
            "#,
        )
        .unwrap();
        drop(conn);

        let provider = ConnectionProvider::new(Arc::new(ConnectionParams::new(path)));
        (file, TrusteeRepository::new(provider))
    }

    #[test]
    fn test_valid_credentials() {
        let (_file, repo) = setup_test_repo();

        let user = repo.verify_credentials("alice", "secret").unwrap().unwrap();
        assert_eq!(user.login_name, "alice");
        assert_eq!(user.employee_id.as_deref(), Some("E100"));

        // acDsbld 为 NULL 视为启用
        assert!(repo.verify_credentials("bob", "hunter2").unwrap().is_some());
    }

    #[test]
    fn test_wrong_password_or_disabled() {
        let (_file, repo) = setup_test_repo();

        assert!(repo.verify_credentials("alice", "wrong").unwrap().is_none());
        assert!(repo.verify_credentials("carol", "pw").unwrap().is_none());
        assert!(repo.verify_credentials("nobody", "pw").unwrap().is_none());
    }

    #[test]
    fn test_empty_credentials_rejected() {
        let (_file, repo) = setup_test_repo();
        assert!(matches!(
            repo.verify_credentials(" ", "pw"),
            Err(RepositoryError::FieldValueError { .. })
        ));
        assert!(repo.verify_credentials("alice", "").is_err());
    }
}
