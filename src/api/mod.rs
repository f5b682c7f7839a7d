// ==========================================
// StaffAlloc - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI / 上层服务调用
// ==========================================

pub mod dto;
pub mod error;
pub mod insights_api;
pub mod report_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use insights_api::InsightsApi;
pub use report_api::ReportApi;
