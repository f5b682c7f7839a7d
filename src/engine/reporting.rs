// ==========================================
// StaffAlloc - 报表引擎
// ==========================================
// 职责: 员工时间线、项目看板、组合月度利用率
// 说明: 纯计算，数据由调用方从数据源读取后传入
// ==========================================

use crate::domain::analytics::{
    round_to, EmployeeUtilization, PortfolioUtilization, ProjectDashboard, TimelineEntry,
};
use crate::domain::period::YearMonth;
use crate::domain::staffing::{Employee, Project, ProjectHours};
use crate::engine::calendar::CapacityCalendar;
use std::collections::HashMap;
use tracing::instrument;

/// FTE 低于该值视为闲置（bench）
pub const DEFAULT_BENCH_FTE_THRESHOLD: f64 = 0.25;

/// 时间线筛选窗口（两端均为闭区间，可单独缺省）
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TimelineWindow {
    pub start: Option<YearMonth>,
    pub end: Option<YearMonth>,
}

impl TimelineWindow {
    pub fn contains(&self, period: YearMonth) -> bool {
        self.start.map_or(true, |start| period >= start) && self.end.map_or(true, |end| period <= end)
    }
}

// ==========================================
// ReportBuilder - 报表引擎
// ==========================================
pub struct ReportBuilder {
    calendar: CapacityCalendar,
    bench_fte_threshold: f64,
}

impl ReportBuilder {
    pub fn new(calendar: CapacityCalendar) -> Self {
        Self {
            calendar,
            bench_fte_threshold: DEFAULT_BENCH_FTE_THRESHOLD,
        }
    }

    pub fn with_bench_threshold(mut self, threshold: f64) -> Self {
        self.bench_fte_threshold = threshold;
        self
    }

    /// 员工时间线（保持输入的时间顺序）
    pub fn employee_timeline(
        &self,
        summary: Vec<TimelineEntry>,
        window: TimelineWindow,
    ) -> Vec<TimelineEntry> {
        summary
            .into_iter()
            .filter(|entry| match YearMonth::new(entry.year, entry.month) {
                Some(period) => window.contains(period),
                None => false,
            })
            .collect()
    }

    pub fn project_dashboard(&self, project: &Project, hours: ProjectHours) -> ProjectDashboard {
        let utilization = if hours.funded_hours > 0 {
            hours.allocated_hours as f64 / hours.funded_hours as f64 * 100.0
        } else {
            0.0
        };
        ProjectDashboard {
            project_id: project.id,
            project_name: project.name.clone(),
            total_funded_hours: hours.funded_hours,
            total_allocated_hours: hours.allocated_hours,
            utilization_pct: round_to(utilization, 2),
        }
    }

    /// 组合月度利用率
    ///
    /// # 参数
    /// - `employees`: 纳入统计的员工（名单顺序即输出顺序）
    /// - `monthly_hours`: 当月 user_id -> 合计工时
    #[instrument(skip(self, employees, monthly_hours), fields(period = %period, employees = employees.len()))]
    pub fn portfolio_utilization(
        &self,
        period: YearMonth,
        total_projects: usize,
        employees: &[Employee],
        monthly_hours: &HashMap<i64, i64>,
    ) -> PortfolioUtilization {
        let standard = self.calendar.divisor_for(period);

        let mut total_allocated = 0i64;
        let mut over_allocated = Vec::new();
        let mut bench = Vec::new();
        for employee in employees {
            let hours = monthly_hours.get(&employee.id).copied().unwrap_or(0);
            total_allocated += hours;
            let fte = hours as f64 / standard as f64;
            let row = EmployeeUtilization {
                user_id: employee.id,
                full_name: employee.full_name.clone(),
                allocated_hours: hours,
                fte: round_to(fte, 3),
            };
            if fte > 1.0 {
                over_allocated.push(row);
            } else if fte < self.bench_fte_threshold {
                bench.push(row);
            }
        }

        let capacity = employees.len() as i64 * standard;
        let overall = if capacity > 0 {
            total_allocated as f64 / capacity as f64 * 100.0
        } else {
            0.0
        };

        tracing::info!(
            over = over_allocated.len(),
            bench = bench.len(),
            "组合利用率计算完成"
        );

        PortfolioUtilization {
            year: period.year,
            month: period.month,
            standard_hours: standard,
            total_projects,
            total_employees: employees.len(),
            overall_utilization_pct: round_to(overall, 2),
            over_allocated_employees: over_allocated,
            bench_employees: bench,
        }
    }
}
