// ==========================================
// 仓库货位台账 - API 层
// ==========================================
// 职责: 供外部 HTTP 层以普通函数调用的业务接口
// ==========================================

pub mod auth_api;
pub mod bin_location_api;
pub mod error;

// 重导出核心类型
pub use auth_api::AuthApi;
pub use bin_location_api::{parse_operation_filter, AuditStatus, BinLocationApi, WriteOutcome};
pub use error::{ApiError, ApiResult};
