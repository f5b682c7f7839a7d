// ==========================================
// StaffAlloc - 人员/项目/分配领域模型
// ==========================================
// 职责: 员工、项目、角色、LCAT、项目分派、月度工时分配
// 红线: 不含数据访问逻辑
// ==========================================

use crate::domain::period::YearMonth;
use crate::domain::types::SystemRole;
use serde::{Deserialize, Serialize};

// ==========================================
// Employee - 员工
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub system_role: SystemRole,
    pub is_active: bool,
    pub manager_id: Option<i64>,
}

/// 新建员工参数
#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub full_name: String,
    pub email: String,
    pub system_role: SystemRole,
    pub manager_id: Option<i64>,
}

// ==========================================
// Project - 项目
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub status: String, // Active / Planning / Closed
}

// ==========================================
// Role / Lcat - 角色与劳动类别
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lcat {
    pub id: i64,
    pub name: String,
}

// ==========================================
// ProjectAssignment - 项目分派
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectAssignment {
    pub id: i64,
    pub project_id: i64,
    pub user_id: i64,
    pub role_id: i64,
    pub lcat_id: i64,
    pub funded_hours: i64,
}

// ==========================================
// Allocation - 月度工时分配
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Allocation {
    pub id: i64,
    pub project_assignment_id: i64,
    pub year: i32,
    pub month: u32,
    pub allocated_hours: i64,
}

// ==========================================
// 聚合视图（由数据源提供，只读快照）
// ==========================================

/// 用户-月份-项目 工时汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationTally {
    pub user_id: i64,
    pub year: i32,
    pub month: u32,
    pub project_id: i64,
    pub project_name: String,
    pub allocated_hours: i64,
}

impl AllocationTally {
    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

/// 用户-月份 工时合计
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyUserTotal {
    pub user_id: i64,
    pub year: i32,
    pub month: u32,
    pub total_hours: i64,
}

impl MonthlyUserTotal {
    pub fn year_month(&self) -> YearMonth {
        YearMonth {
            year: self.year,
            month: self.month,
        }
    }
}

/// 项目工时汇总（资助工时 vs 已分配工时）
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectHours {
    pub funded_hours: i64,
    pub allocated_hours: i64,
}
