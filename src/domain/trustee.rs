// ==========================================
// 仓库货位台账 - 登录人员模型
// ==========================================
// 对齐: Trustees_tbl 表（只读）
// ==========================================

use serde::{Deserialize, Serialize};

/// 通过校验的登录人员，login_name 作为台账中的操作人
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub auto_id: i64,
    pub employee_id: Option<String>,
    pub login_name: String,
}
