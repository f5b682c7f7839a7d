// ==========================================
// StaffAlloc - 引擎层数据源
// ==========================================
// 职责: 定义分析所需的只读数据接口，并由仓储集合实现
// 说明: API 层只依赖 StaffingDataSource，测试可替换为内存实现
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::domain::analytics::TimelineEntry;
use crate::domain::staffing::{
    AllocationTally, Employee, Lcat, MonthlyUserTotal, Project, ProjectAssignment, ProjectHours,
    Role,
};
use crate::repository::{
    AllocationRepository, AssignmentRepository, CatalogRepository, ProjectRepository,
    RepositoryResult, UserRepository,
};

/// 分析数据源（只读）
pub trait StaffingDataSource: Send + Sync {
    /// 用户 x 月份 工时合计
    fn monthly_user_allocation_totals(&self) -> RepositoryResult<Vec<MonthlyUserTotal>>;

    /// 用户 x 月份 x 项目 工时合计
    fn monthly_user_project_allocations(&self) -> RepositoryResult<Vec<AllocationTally>>;

    /// 在职的普通员工（名单顺序即分析顺序）
    fn active_employees(&self) -> RepositoryResult<Vec<Employee>>;

    fn assignments_for_project(&self, project_id: i64) -> RepositoryResult<Vec<ProjectAssignment>>;

    fn assignments_for_user(&self, user_id: i64) -> RepositoryResult<Vec<ProjectAssignment>>;

    fn find_project(&self, project_id: i64) -> RepositoryResult<Option<Project>>;

    fn find_role(&self, role_id: i64) -> RepositoryResult<Option<Role>>;

    fn find_lcat(&self, lcat_id: i64) -> RepositoryResult<Option<Lcat>>;

    fn find_employee(&self, user_id: i64) -> RepositoryResult<Option<Employee>>;

    /// 单个用户按月汇总
    fn user_allocation_summary(&self, user_id: i64) -> RepositoryResult<Vec<TimelineEntry>>;

    fn project_hours(&self, project_id: i64) -> RepositoryResult<ProjectHours>;

    fn count_projects(&self) -> RepositoryResult<usize>;
}

/// 分析仓储集合
///
/// 聚合分析所需的所有 Repository，简化依赖注入。
#[derive(Clone)]
pub struct StaffingRepositories {
    pub user_repo: Arc<UserRepository>,
    pub project_repo: Arc<ProjectRepository>,
    pub catalog_repo: Arc<CatalogRepository>,
    pub assignment_repo: Arc<AssignmentRepository>,
    pub allocation_repo: Arc<AllocationRepository>,
}

impl StaffingRepositories {
    pub fn new(
        user_repo: Arc<UserRepository>,
        project_repo: Arc<ProjectRepository>,
        catalog_repo: Arc<CatalogRepository>,
        assignment_repo: Arc<AssignmentRepository>,
        allocation_repo: Arc<AllocationRepository>,
    ) -> Self {
        Self {
            user_repo,
            project_repo,
            catalog_repo,
            assignment_repo,
            allocation_repo,
        }
    }

    /// 全部仓储共享同一连接
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self::new(
            Arc::new(UserRepository::from_connection(conn.clone())),
            Arc::new(ProjectRepository::from_connection(conn.clone())),
            Arc::new(CatalogRepository::from_connection(conn.clone())),
            Arc::new(AssignmentRepository::from_connection(conn.clone())),
            Arc::new(AllocationRepository::from_connection(conn)),
        )
    }
}

impl StaffingDataSource for StaffingRepositories {
    fn monthly_user_allocation_totals(&self) -> RepositoryResult<Vec<MonthlyUserTotal>> {
        self.allocation_repo.monthly_user_totals()
    }

    fn monthly_user_project_allocations(&self) -> RepositoryResult<Vec<AllocationTally>> {
        self.allocation_repo.monthly_user_project_allocations()
    }

    fn active_employees(&self) -> RepositoryResult<Vec<Employee>> {
        self.user_repo.list_active_employees()
    }

    fn assignments_for_project(&self, project_id: i64) -> RepositoryResult<Vec<ProjectAssignment>> {
        self.assignment_repo.find_by_project(project_id)
    }

    fn assignments_for_user(&self, user_id: i64) -> RepositoryResult<Vec<ProjectAssignment>> {
        self.assignment_repo.find_by_user(user_id)
    }

    fn find_project(&self, project_id: i64) -> RepositoryResult<Option<Project>> {
        self.project_repo.find_by_id(project_id)
    }

    fn find_role(&self, role_id: i64) -> RepositoryResult<Option<Role>> {
        self.catalog_repo.find_role(role_id)
    }

    fn find_lcat(&self, lcat_id: i64) -> RepositoryResult<Option<Lcat>> {
        self.catalog_repo.find_lcat(lcat_id)
    }

    fn find_employee(&self, user_id: i64) -> RepositoryResult<Option<Employee>> {
        self.user_repo.find_by_id(user_id)
    }

    fn user_allocation_summary(&self, user_id: i64) -> RepositoryResult<Vec<TimelineEntry>> {
        self.allocation_repo.user_allocation_summary(user_id)
    }

    fn project_hours(&self, project_id: i64) -> RepositoryResult<ProjectHours> {
        self.assignment_repo.project_hours(project_id)
    }

    fn count_projects(&self) -> RepositoryResult<usize> {
        self.project_repo.count()
    }
}
