// ==========================================
// StaffAlloc - 叙述适配层
// ==========================================
// 职责: 把已计算好的结构化结果交给外部文本生成服务做自然语言说明
// 红线: 叙述只是附加说明，任何数值结果都不依赖叙述
// 说明: 分析引擎只依赖 Narrator trait；默认实现为 DisabledNarrator
// ==========================================

pub mod error;
pub mod gemini;

pub use error::{NarrationError, NarrationResult};
pub use gemini::{GeminiBackend, GeminiNarrator};

use async_trait::async_trait;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, RuntimeFlavor};

/// 默认模型
pub const DEFAULT_MODEL: &str = "gemini-2.5-pro";

/// 默认最大输出 token 数
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 1024;

/// 默认请求超时（秒）
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// API Key 环境变量
pub const API_KEY_ENV: &str = "GOOGLE_API_KEY";

// ==========================================
// NarrationRequest - 叙述请求
// ==========================================

#[derive(Debug, Clone, PartialEq)]
pub struct NarrationRequest {
    pub prompt: String,
    /// 0.0..=1.0
    pub temperature: f32,
    pub max_output_tokens: u32,
}

impl NarrationRequest {
    pub fn new(prompt: impl Into<String>, temperature: f32) -> Self {
        Self {
            prompt: prompt.into(),
            temperature: temperature.clamp(0.0, 1.0),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }

    pub fn with_max_output_tokens(mut self, max_output_tokens: u32) -> Self {
        self.max_output_tokens = max_output_tokens.max(1);
        self
    }
}

// ==========================================
// NarrationSettings - 叙述服务配置
// ==========================================

#[derive(Debug, Clone, PartialEq)]
pub struct NarrationSettings {
    pub enabled: bool,
    pub model: String,
    pub max_output_tokens: u32,
    pub timeout: Duration,
    pub api_key: Option<String>,
}

impl NarrationSettings {
    /// 从环境变量读取 API Key（空字符串视为未配置）
    pub fn with_api_key_from_env(mut self) -> Self {
        self.api_key = std::env::var(API_KEY_ENV)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        self
    }
}

impl Default for NarrationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            model: DEFAULT_MODEL.to_string(),
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            api_key: None,
        }
    }
}

// ==========================================
// Narrator Trait
// ==========================================

/// 叙述器（同步接口，供分析引擎调用）
pub trait Narrator: Send + Sync {
    /// 生成说明文本（已 trim，非空）
    fn narrate(&self, request: &NarrationRequest) -> NarrationResult<String>;
}

/// 关闭状态的叙述器
///
/// 总是返回 Configuration 错误，分析组件据此走固定说明文本。
#[derive(Debug, Clone, Default)]
pub struct DisabledNarrator;

impl Narrator for DisabledNarrator {
    fn narrate(&self, _request: &NarrationRequest) -> NarrationResult<String> {
        Err(NarrationError::Configuration(
            "叙述功能已关闭".to_string(),
        ))
    }
}

/// 按配置构建叙述器
pub fn build_narrator(settings: &NarrationSettings) -> Arc<dyn Narrator> {
    if !settings.enabled {
        tracing::info!("叙述功能已关闭，分析结果使用固定说明文本");
        return Arc::new(DisabledNarrator);
    }
    tracing::info!(model = %settings.model, "启用叙述服务");
    Arc::new(GeminiNarrator::new(GeminiBackend::new(settings.clone())))
}

/// 调用叙述器，失败时返回固定说明
///
/// Configuration / Invocation 两类错误都在此吞掉，只记录告警。
pub fn narrate_or_fallback(
    narrator: &dyn Narrator,
    request: &NarrationRequest,
    fallback: &str,
    operation: &str,
) -> String {
    match narrator.narrate(request) {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => {
            tracing::warn!(operation, "叙述服务返回空文本，使用固定说明");
            fallback.to_string()
        }
        Err(e) => {
            tracing::warn!(operation, error = %e, "叙述服务不可用，使用固定说明");
            fallback.to_string()
        }
    }
}

// ==========================================
// 异步后端 + 同步桥接
// ==========================================

/// 文本生成后端（异步）
#[async_trait]
pub trait TextGenerationBackend: Send + Sync {
    async fn generate(&self, request: &NarrationRequest) -> NarrationResult<String>;
}

/// 把异步后端包装为同步 Narrator
pub struct BackendNarrator<B> {
    backend: B,
}

impl<B> BackendNarrator<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }
}

impl<B: TextGenerationBackend> Narrator for BackendNarrator<B> {
    fn narrate(&self, request: &NarrationRequest) -> NarrationResult<String> {
        block_on_narration(self.backend.generate(request))
    }
}

/// 在同步上下文中执行叙述 future
///
/// - 多线程运行时中: block_in_place + block_on
/// - 单线程运行时中: 不能 block_in_place，转到独立线程上的临时运行时
/// - 不在运行时中: 创建临时运行时
fn block_on_narration<F>(future: F) -> NarrationResult<String>
where
    F: Future<Output = NarrationResult<String>> + Send,
{
    match Handle::try_current() {
        Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
            tokio::task::block_in_place(|| handle.block_on(future))
        }
        Ok(_) => std::thread::scope(|scope| {
            scope
                .spawn(|| temporary_runtime()?.block_on(future))
                .join()
                .unwrap_or_else(|_| {
                    Err(NarrationError::Invocation("叙述线程异常退出".to_string()))
                })
        }),
        Err(_) => temporary_runtime()?.block_on(future),
    }
}

fn temporary_runtime() -> NarrationResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| NarrationError::Invocation(format!("无法创建运行时: {}", e)))
}

// ==========================================
// 单元测试
// ==========================================
