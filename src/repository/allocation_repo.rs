// ==========================================
// StaffAlloc - 月度工时分配数据仓储
// ==========================================
// 职责: 管理 allocations 表 + 分析用聚合查询
// 红线: Repository 不含业务逻辑（聚合只做 SUM/GROUP BY，不做判定）
// 约束: 所有聚合结果按 (year, month, user_id, project_id) 排序，保证结果确定
// ==========================================

use crate::domain::analytics::TimelineEntry;
use crate::domain::staffing::{Allocation, AllocationTally, MonthlyUserTotal};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct AllocationRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AllocationRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 写入某分派某月的工时（已存在则覆盖），返回记录 id
    pub fn upsert(
        &self,
        project_assignment_id: i64,
        year: i32,
        month: u32,
        allocated_hours: i64,
    ) -> RepositoryResult<i64> {
        if !(1..=12).contains(&month) {
            return Err(RepositoryError::FieldValueError {
                field: "month".to_string(),
                message: format!("月份越界: {}", month),
            });
        }
        if allocated_hours < 0 {
            return Err(RepositoryError::FieldValueError {
                field: "allocated_hours".to_string(),
                message: format!("不能为负数: {}", allocated_hours),
            });
        }

        let conn = self.get_conn()?;
        let id: i64 = conn.query_row(
            r#"
            INSERT INTO allocations (project_assignment_id, year, month, allocated_hours)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(project_assignment_id, year, month)
            DO UPDATE SET allocated_hours = excluded.allocated_hours
            RETURNING id
            "#,
            params![project_assignment_id, year, month, allocated_hours],
            |row| row.get(0),
        )?;
        Ok(id)
    }

    /// 某分派的全部月度记录，按时间升序
    pub fn find_by_assignment(&self, project_assignment_id: i64) -> RepositoryResult<Vec<Allocation>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT id, project_assignment_id, year, month, allocated_hours
            FROM allocations
            WHERE project_assignment_id = ?1
            ORDER BY year, month
            "#,
        )?;
        let rows = stmt
            .query_map(params![project_assignment_id], |row| {
                Ok(Allocation {
                    id: row.get(0)?,
                    project_assignment_id: row.get(1)?,
                    year: row.get(2)?,
                    month: row.get(3)?,
                    allocated_hours: row.get(4)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    // ===== 聚合查询 =====

    /// 用户 x 月份 x 项目 工时合计
    pub fn monthly_user_project_allocations(&self) -> RepositoryResult<Vec<AllocationTally>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT pa.user_id, a.year, a.month, pa.project_id, p.name,
                   SUM(a.allocated_hours) AS allocated_hours
            FROM allocations a
            JOIN project_assignments pa ON pa.id = a.project_assignment_id
            JOIN projects p ON p.id = pa.project_id
            GROUP BY pa.user_id, a.year, a.month, pa.project_id, p.name
            ORDER BY a.year, a.month, pa.user_id, pa.project_id
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(AllocationTally {
                    user_id: row.get(0)?,
                    year: row.get(1)?,
                    month: row.get(2)?,
                    project_id: row.get(3)?,
                    project_name: row.get(4)?,
                    allocated_hours: row.get(5)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 用户 x 月份 工时合计
    pub fn monthly_user_totals(&self) -> RepositoryResult<Vec<MonthlyUserTotal>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT pa.user_id, a.year, a.month, SUM(a.allocated_hours) AS total_hours
            FROM allocations a
            JOIN project_assignments pa ON pa.id = a.project_assignment_id
            GROUP BY pa.user_id, a.year, a.month
            ORDER BY a.year, a.month, pa.user_id
            "#,
        )?;
        let rows = stmt
            .query_map([], |row| {
                Ok(MonthlyUserTotal {
                    user_id: row.get(0)?,
                    year: row.get(1)?,
                    month: row.get(2)?,
                    total_hours: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 单个用户按月汇总（跨项目），按时间升序
    pub fn user_allocation_summary(&self, user_id: i64) -> RepositoryResult<Vec<TimelineEntry>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT a.year, a.month, SUM(a.allocated_hours) AS total_hours
            FROM allocations a
            JOIN project_assignments pa ON pa.id = a.project_assignment_id
            WHERE pa.user_id = ?1
            GROUP BY a.year, a.month
            ORDER BY a.year, a.month
            "#,
        )?;
        let rows = stmt
            .query_map(params![user_id], |row| {
                Ok(TimelineEntry {
                    year: row.get(0)?,
                    month: row.get(1)?,
                    total_hours: row.get(2)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}
