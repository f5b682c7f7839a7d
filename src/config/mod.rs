// ==========================================
// StaffAlloc - 配置层
// ==========================================
// 职责: 系统配置管理（标准工时规则、分析阈值、叙述服务）
// 存储: config_kv 表
// ==========================================

pub mod analytics_policy;
pub mod config_manager;

// 重导出核心配置管理器
pub use analytics_policy::AnalyticsPolicy;
pub use config_manager::{config_keys, ConfigManager};
