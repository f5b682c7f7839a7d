// ==========================================
// StaffAlloc - 引擎层
// ==========================================
// 职责: 产能分析规则（冲突扫描、产能预测、工作量调配、人员推荐、报表）
// 红线: Engine 不拼 SQL；数值结果先于叙述计算，且不依赖叙述
// ==========================================

pub mod calendar;
pub mod conflict;
pub mod forecast;
pub mod rebalance;
pub mod reporting;
pub mod repositories;
pub mod staffing;

// 重导出核心引擎
pub use calendar::{month_label, CapacityCalendar, CapacityRule};
pub use conflict::ConflictScanner;
pub use forecast::ForecastProjector;
pub use rebalance::{RebalancePolicy, RebalanceScope, WorkloadRebalancer};
pub use reporting::{ReportBuilder, TimelineWindow};
pub use repositories::{StaffingDataSource, StaffingRepositories};
pub use staffing::{CandidatePool, StaffingRecommender, StaffingRequest};
