// ==========================================
// StaffAlloc - 员工数据仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::domain::staffing::{Employee, NewEmployee};
use crate::domain::types::SystemRole;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const USER_COLUMNS: &str = "id, full_name, email, system_role, is_active, manager_id";

// ==========================================
// UserRepository - 员工仓储
// ==========================================
/// 员工仓储
/// 职责: 管理 users 表的读写
pub struct UserRepository {
    conn: Arc<Mutex<Connection>>,
}

impl UserRepository {
    /// 创建新的 UserRepository 实例
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

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 新增员工，返回自增 id
    pub fn insert(&self, employee: &NewEmployee) -> RepositoryResult<i64> {
        if employee.full_name.trim().is_empty() {
            return Err(RepositoryError::FieldValueError {
                field: "full_name".to_string(),
                message: "姓名不能为空".to_string(),
            });
        }
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO users (full_name, email, system_role, is_active, manager_id)
            VALUES (?1, ?2, ?3, 1, ?4)
            "#,
            params![
                employee.full_name,
                employee.email,
                employee.system_role.as_str(),
                employee.manager_id,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 停用 / 启用员工
    pub fn set_active(&self, user_id: i64, is_active: bool) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            "UPDATE users SET is_active = ?2 WHERE id = ?1",
            params![user_id, is_active],
        )?;
        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "User".to_string(),
                id: user_id.to_string(),
            });
        }
        Ok(())
    }

    /// 按主键查询
    pub fn find_by_id(&self, user_id: i64) -> RepositoryResult<Option<Employee>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS);
        let employee = conn
            .query_row(&sql, params![user_id], map_employee_row)
            .optional()?;
        Ok(employee)
    }

    /// 在职的普通员工（system_role = EMPLOYEE），按 id 升序
    pub fn list_active_employees(&self) -> RepositoryResult<Vec<Employee>> {
        let conn = self.get_conn()?;
        let sql = format!(
            "SELECT {} FROM users WHERE is_active = 1 AND system_role = ?1 ORDER BY id",
            USER_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let employees = stmt
            .query_map(params![SystemRole::Employee.as_str()], map_employee_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(employees)
    }

    /// 全部用户，按 id 升序
    pub fn list_all(&self) -> RepositoryResult<Vec<Employee>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let users = stmt
            .query_map([], map_employee_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(users)
    }
}

fn map_employee_row(row: &Row<'_>) -> SqliteResult<Employee> {
    let role_raw: String = row.get(3)?;
    let system_role = role_raw
        .parse::<SystemRole>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Text, e.into()))?;
    Ok(Employee {
        id: row.get(0)?,
        full_name: row.get(1)?,
        email: row.get(2)?,
        system_role,
        is_active: row.get(4)?,
        manager_id: row.get(5)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> UserRepository {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::init_schema(&conn).unwrap();
        UserRepository::from_connection(Arc::new(Mutex::new(conn)))
    }

    fn new_user(name: &str, role: SystemRole) -> NewEmployee {
        NewEmployee {
            full_name: name.to_string(),
            email: format!("{}@example.com", name.to_lowercase()),
            system_role: role,
            manager_id: None,
        }
    }

    #[test]
    fn test_active_employees_exclude_managers_and_inactive() {
        let repo = repo();
        let alice = repo.insert(&new_user("Alice", SystemRole::Employee)).unwrap();
        repo.insert(&new_user("Pat", SystemRole::Pm)).unwrap();
        let bob = repo.insert(&new_user("Bob", SystemRole::Employee)).unwrap();
        repo.set_active(bob, false).unwrap();

        let active = repo.list_active_employees().unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, alice);
        assert_eq!(repo.list_all().unwrap().len(), 3);
    }

    #[test]
    fn test_find_and_missing() {
        let repo = repo();
        let id = repo.insert(&new_user("Carol", SystemRole::Director)).unwrap();
        let found = repo.find_by_id(id).unwrap().unwrap();
        assert_eq!(found.system_role, SystemRole::Director);
        assert!(found.is_active);
        assert!(repo.find_by_id(id + 100).unwrap().is_none());
        assert!(matches!(
            repo.set_active(id + 100, false),
            Err(RepositoryError::NotFound { .. })
        ));
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let repo = repo();
        repo.insert(&new_user("Dana", SystemRole::Employee)).unwrap();
        let err = repo.insert(&new_user("Dana", SystemRole::Employee)).unwrap_err();
        assert!(matches!(err, RepositoryError::UniqueConstraintViolation(_)));
    }
}
