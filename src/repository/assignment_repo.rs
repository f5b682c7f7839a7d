// ==========================================
// StaffAlloc - 项目分派数据仓储
// ==========================================
// 职责: 管理 project_assignments 表（员工 x 项目 x 角色 x LCAT）
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::staffing::{ProjectAssignment, ProjectHours};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const ASSIGNMENT_COLUMNS: &str = "id, project_id, user_id, role_id, lcat_id, funded_hours";

pub struct AssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AssignmentRepository {
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

    /// 新增分派，返回自增 id
    ///
    /// 同一员工在同一项目中只能有一条分派（UNIQUE 约束）。
    pub fn insert(
        &self,
        project_id: i64,
        user_id: i64,
        role_id: i64,
        lcat_id: i64,
        funded_hours: i64,
    ) -> RepositoryResult<i64> {
        if funded_hours < 0 {
            return Err(RepositoryError::FieldValueError {
                field: "funded_hours".to_string(),
                message: format!("不能为负数: {}", funded_hours),
            });
        }
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO project_assignments (project_id, user_id, role_id, lcat_id, funded_hours)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
            params![project_id, user_id, role_id, lcat_id, funded_hours],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 项目下的全部分派，按 id 升序
    pub fn find_by_project(&self, project_id: i64) -> RepositoryResult<Vec<ProjectAssignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM project_assignments WHERE project_id = ?1 ORDER BY id",
            ASSIGNMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![project_id], map_assignment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 员工的全部分派，按 id 升序
    pub fn find_by_user(&self, user_id: i64) -> RepositoryResult<Vec<ProjectAssignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM project_assignments WHERE user_id = ?1 ORDER BY id",
            ASSIGNMENT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![user_id], map_assignment_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    /// 项目的资助工时与已分配工时合计
    pub fn project_hours(&self, project_id: i64) -> RepositoryResult<ProjectHours> {
        let conn = self.get_conn()?;
        let funded_hours: i64 = conn.query_row(
            "SELECT COALESCE(SUM(funded_hours), 0) FROM project_assignments WHERE project_id = ?1",
            params![project_id],
            |row| row.get(0),
        )?;
        let allocated_hours: i64 = conn.query_row(
            r#"
            SELECT COALESCE(SUM(a.allocated_hours), 0)
            FROM allocations a
            JOIN project_assignments pa ON pa.id = a.project_assignment_id
            WHERE pa.project_id = ?1
            "#,
            params![project_id],
            |row| row.get(0),
        )?;
        Ok(ProjectHours {
            funded_hours,
            allocated_hours,
        })
    }
}

fn map_assignment_row(row: &Row<'_>) -> SqliteResult<ProjectAssignment> {
    Ok(ProjectAssignment {
        id: row.get(0)?,
        project_id: row.get(1)?,
        user_id: row.get(2)?,
        role_id: row.get(3)?,
        lcat_id: row.get(4)?,
        funded_hours: row.get(5)?,
    })
}
