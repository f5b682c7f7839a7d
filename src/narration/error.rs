// ==========================================
// StaffAlloc - 叙述服务错误类型
// ==========================================
// 工具: thiserror 派生宏
// ==========================================

use thiserror::Error;

/// 叙述服务错误
///
/// - Configuration: 服务不可用（缺少凭据 / 客户端无法初始化 / 功能关闭）
/// - Invocation: 调用失败或未返回文本
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NarrationError {
    #[error("叙述服务未配置: {0}")]
    Configuration(String),

    #[error("叙述服务调用失败: {0}")]
    Invocation(String),
}

impl NarrationError {
    pub fn is_configuration(&self) -> bool {
        matches!(self, NarrationError::Configuration(_))
    }
}

/// Result 类型别名
pub type NarrationResult<T> = Result<T, NarrationError>;
