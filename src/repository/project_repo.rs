// ==========================================
// StaffAlloc - 项目数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::staffing::Project;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

// ==========================================
// ProjectRepository - 项目仓储
// ==========================================
pub struct ProjectRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ProjectRepository {
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

    /// 新增项目，返回自增 id
    pub fn insert(&self, name: &str, code: &str, status: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO projects (name, code, status) VALUES (?1, ?2, ?3)",
            params![name, code, status],
        )?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_by_id(&self, project_id: i64) -> RepositoryResult<Option<Project>> {
        let conn = self.get_conn()?;
        let project = conn
            .query_row(
                "SELECT id, name, code, status FROM projects WHERE id = ?1",
                params![project_id],
                map_project_row,
            )
            .optional()?;
        Ok(project)
    }

    pub fn list_all(&self) -> RepositoryResult<Vec<Project>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name, code, status FROM projects ORDER BY id")?;
        let projects = stmt
            .query_map([], map_project_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(projects)
    }

    pub fn count(&self) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM projects", [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }
}

fn map_project_row(row: &Row<'_>) -> SqliteResult<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        code: row.get(2)?,
        status: row.get(3)?,
    })
}
