// ==========================================
// StaffAlloc - 核心库
// ==========================================
// 技术栈: Rust + SQLite (+ 可选 Gemini 叙述)
// 系统定位: 人员分配的产能分析（决策支持，不自动改写分配）
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 分析规则
pub mod engine;

// 叙述层 - 外部文本生成
pub mod narration;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{ForecastRisk, RebalanceAction, SystemRole};

// 领域实体
pub use domain::{
    AllocationTally, ConflictRecord, Employee, ForecastPoint, MonthlyUserTotal, Project,
    RebalanceSuggestion, StaffingCandidate, YearMonth,
};

// 引擎
pub use engine::{
    CapacityCalendar, CapacityRule, ConflictScanner, ForecastProjector, ReportBuilder,
    StaffingDataSource, StaffingRecommender, WorkloadRebalancer,
};

// 叙述
pub use narration::{DisabledNarrator, NarrationError, Narrator};

// API
pub use api::{ApiError, ApiResult, InsightsApi, ReportApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "StaffAlloc";
