// ==========================================
// StaffAlloc - 角色 / LCAT 字典仓储
// ==========================================
// 职责: 管理 roles、lcats 两张字典表
// ==========================================

use crate::domain::staffing::{Lcat, Role};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct CatalogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = crate::db::open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ===== 角色 =====

    pub fn insert_role(&self, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute("INSERT INTO roles (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_role(&self, role_id: i64) -> RepositoryResult<Option<Role>> {
        let conn = self.get_conn()?;
        let role = conn
            .query_row(
                "SELECT id, name FROM roles WHERE id = ?1",
                params![role_id],
                |row| {
                    Ok(Role {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(role)
    }

    // ===== LCAT =====

    pub fn insert_lcat(&self, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute("INSERT INTO lcats (name) VALUES (?1)", params![name])?;
        Ok(conn.last_insert_rowid())
    }

    pub fn find_lcat(&self, lcat_id: i64) -> RepositoryResult<Option<Lcat>> {
        let conn = self.get_conn()?;
        let lcat = conn
            .query_row(
                "SELECT id, name FROM lcats WHERE id = ?1",
                params![lcat_id],
                |row| {
                    Ok(Lcat {
                        id: row.get(0)?,
                        name: row.get(1)?,
                    })
                },
            )
            .optional()?;
        Ok(lcat)
    }
}
