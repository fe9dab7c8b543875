// ==========================================
// 仓库货位台账 - 登录 API
// ==========================================
// 职责: 校验登录人员，返回作为台账操作人的身份
// ==========================================

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::trustee::AuthenticatedUser;
use crate::repository::trustee_repo::TrusteeRepository;

pub struct AuthApi {
    trustee_repo: Arc<TrusteeRepository>,
}

impl AuthApi {
    pub fn new(trustee_repo: Arc<TrusteeRepository>) -> Self {
        Self { trustee_repo }
    }

    /// 登录
    ///
    /// # 返回
    /// - Ok(user): user.login_name 即后续写操作的操作人
    /// - Err(ApiError::InvalidCredentials): 用户名/密码错误或账号已停用
    /// - Err(ApiError::ConfigMissing): 尚未配置主库连接
    pub fn login(&self, login_name: &str, password: &str) -> ApiResult<AuthenticatedUser> {
        match self.trustee_repo.verify_credentials(login_name, password)? {
            Some(user) => {
                info!(login_name = %user.login_name, "登录成功");
                Ok(user)
            }
            None => {
                warn!(login_name = %login_name.trim(), "登录失败");
                Err(ApiError::InvalidCredentials)
            }
        }
    }
}
