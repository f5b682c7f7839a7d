// ==========================================
// StaffAlloc - 仓储层错误
// ==========================================
// 覆盖: 连接锁 / SQL 执行 / 约束冲突 / 字段校验
// ==========================================

use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("{entity}(id={id}) 不存在")]
    NotFound { entity: String, id: String },

    /// 共享连接的 Mutex 已中毒
    #[error("连接锁不可用: {0}")]
    LockError(String),

    #[error("SQL 执行失败: {0}")]
    DatabaseQueryError(String),

    /// 重复的邮箱 / 项目代码 / 分派 / 目录名称
    #[error("重复记录: {0}")]
    UniqueConstraintViolation(String),

    /// 引用了不存在的用户 / 项目 / 分派
    #[error("引用记录不存在: {0}")]
    ForeignKeyViolation(String),

    /// 写入前的字段检查（月份、工时、姓名）
    #[error("{field} 取值非法: {message}")]
    FieldValueError { field: String, message: String },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<rusqlite::Error> for RepositoryError {
    fn from(err: rusqlite::Error) -> Self {
        match err {
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("UNIQUE") => {
                RepositoryError::UniqueConstraintViolation(msg)
            }
            rusqlite::Error::SqliteFailure(_, Some(msg)) if msg.contains("FOREIGN KEY") => {
                RepositoryError::ForeignKeyViolation(msg)
            }
            rusqlite::Error::QueryReturnedNoRows => RepositoryError::NotFound {
                entity: "Record".to_string(),
                id: "?".to_string(),
            },
            other => RepositoryError::DatabaseQueryError(other.to_string()),
        }
    }
}

pub type RepositoryResult<T> = Result<T, RepositoryError>;
