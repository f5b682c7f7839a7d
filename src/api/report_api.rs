// ==========================================
// StaffAlloc - 报表 API
// ==========================================
// 职责: 员工时间线 / 项目看板 / 组合月度利用率
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;

use crate::api::dto::{
    EmployeeTimelineRequest, EmployeeTimelineResponse, PortfolioDashboardResponse,
    ProjectDashboardResponse,
};
use crate::api::error::{ApiError, ApiResult};
use crate::api::insights_api::{hours_for_period, today};
use crate::config::AnalyticsPolicy;
use crate::domain::period::YearMonth;
use crate::engine::{ReportBuilder, StaffingDataSource, TimelineWindow};

pub struct ReportApi {
    data: Arc<dyn StaffingDataSource>,
    policy: AnalyticsPolicy,
}

impl ReportApi {
    pub fn new(data: Arc<dyn StaffingDataSource>, policy: AnalyticsPolicy) -> Self {
        Self { data, policy }
    }

    fn builder(&self) -> ReportBuilder {
        ReportBuilder::new(self.policy.calendar()).with_bench_threshold(self.policy.bench_fte_threshold)
    }

    /// 员工时间线
    ///
    /// 起止月份只有年、月同时给出时才生效
    pub fn employee_timeline(
        &self,
        request: &EmployeeTimelineRequest,
    ) -> ApiResult<EmployeeTimelineResponse> {
        let employee = self
            .data
            .find_employee(request.employee_id)?
            .ok_or_else(|| {
                ApiError::NotFound(format!("Employee(id={})不存在", request.employee_id))
            })?;

        let window = TimelineWindow {
            start: bound(request.start_year, request.start_month, "start_month")?,
            end: bound(request.end_year, request.end_month, "end_month")?,
        };

        let summary = self.data.user_allocation_summary(employee.id)?;
        let timeline = self.builder().employee_timeline(summary, window);
        tracing::info!(employee_id = employee.id, months = timeline.len(), "生成员工时间线");

        Ok(EmployeeTimelineResponse {
            employee_id: employee.id,
            employee_name: employee.full_name,
            timeline,
        })
    }

    /// 项目看板
    pub fn project_dashboard(&self, project_id: i64) -> ApiResult<ProjectDashboardResponse> {
        let project = self
            .data
            .find_project(project_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Project(id={})不存在", project_id)))?;

        let hours = self.data.project_hours(project.id)?;
        let dashboard = self.builder().project_dashboard(&project, hours);
        tracing::info!(project_id, utilization = dashboard.utilization_pct, "生成项目看板");

        Ok(ProjectDashboardResponse {
            project_id: dashboard.project_id,
            project_name: dashboard.project_name,
            total_funded_hours: dashboard.total_funded_hours,
            total_allocated_hours: dashboard.total_allocated_hours,
            utilization_pct: dashboard.utilization_pct,
        })
    }

    /// 当月组合看板
    pub fn portfolio_dashboard(&self) -> ApiResult<PortfolioDashboardResponse> {
        self.portfolio_dashboard_for(YearMonth::from_date(today()))
    }

    /// 指定日期所在月份的组合看板
    pub fn portfolio_dashboard_on(&self, date: NaiveDate) -> ApiResult<PortfolioDashboardResponse> {
        self.portfolio_dashboard_for(YearMonth::from_date(date))
    }

    pub fn portfolio_dashboard_for(&self, period: YearMonth) -> ApiResult<PortfolioDashboardResponse> {
        let total_projects = self.data.count_projects()?;
        let employees = self.data.active_employees()?;
        let totals = self.data.monthly_user_allocation_totals()?;
        let monthly_hours = hours_for_period(&totals, period);

        let report =
            self.builder()
                .portfolio_utilization(period, total_projects, &employees, &monthly_hours);

        Ok(PortfolioDashboardResponse {
            year: report.year,
            month: report.month,
            month_label: period.label(),
            standard_hours: report.standard_hours,
            total_projects: report.total_projects,
            total_employees: report.total_employees,
            overall_utilization_pct: report.overall_utilization_pct,
            over_allocated_employees: report.over_allocated_employees,
            bench_employees: report.bench_employees,
        })
    }
}

fn bound(year: Option<i32>, month: Option<u32>, field: &str) -> ApiResult<Option<YearMonth>> {
    match (year, month) {
        (Some(y), Some(m)) => YearMonth::new(y, m)
            .map(Some)
            .ok_or_else(|| ApiError::InvalidInput(format!("{} 越界: {}", field, m))),
        _ => Ok(None),
    }
}
