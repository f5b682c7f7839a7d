// ==========================================
// StaffAlloc - 领域模型层
// ==========================================
// 职责: 定义领域实体、值对象、分析结果类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod analytics;
pub mod period;
pub mod staffing;
pub mod types;

// 重导出核心类型
pub use analytics::{
    round_to, AnalysisOutcome, ConflictRecord, EmployeeUtilization, ForecastPoint,
    PortfolioUtilization, ProjectBreakdown, ProjectDashboard, RebalanceSuggestion,
    StaffingCandidate, TimelineEntry,
};
pub use period::YearMonth;
pub use staffing::{
    Allocation, AllocationTally, Employee, Lcat, MonthlyUserTotal, NewEmployee, Project,
    ProjectAssignment, ProjectHours, Role,
};
pub use types::{ForecastRisk, RebalanceAction, SystemRole};
