// ==========================================
// StaffAlloc - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// ==========================================
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod allocation_repo;
pub mod assignment_repo;
pub mod catalog_repo;
pub mod error;
pub mod project_repo;
pub mod user_repo;

// 重导出核心仓储
pub use allocation_repo::AllocationRepository;
pub use assignment_repo::AssignmentRepository;
pub use catalog_repo::CatalogRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use project_repo::ProjectRepository;
pub use user_repo::UserRepository;
