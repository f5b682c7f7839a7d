// ==========================================
// StaffAlloc - Gemini 文本生成后端
// ==========================================
// 职责: generateContent 请求/响应封装
// 说明: HTTP 客户端首次使用时惰性初始化，随叙述器存活到进程结束
// ==========================================

use crate::narration::{
    BackendNarrator, NarrationError, NarrationRequest, NarrationResult, NarrationSettings,
    TextGenerationBackend,
};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};

const GEMINI_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

/// 基于 Gemini 的同步叙述器
pub type GeminiNarrator = BackendNarrator<GeminiBackend>;

// ==========================================
// 线上报文
// ==========================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<RequestContent<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct RequestContent<'a> {
    role: &'static str,
    parts: Vec<RequestPart<'a>>,
}

#[derive(Debug, Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    response_modalities: Vec<&'static str>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// 拼接所有候选的文本片段
pub(crate) fn extract_text(response: &GenerateContentResponse) -> NarrationResult<String> {
    let fragments: Vec<&str> = response
        .candidates
        .iter()
        .filter_map(|c| c.content.as_ref())
        .flat_map(|content| content.parts.iter())
        .filter_map(|part| part.text.as_deref())
        .filter(|text| !text.is_empty())
        .collect();

    let joined = fragments.join("\n");
    let trimmed = joined.trim();
    if trimmed.is_empty() {
        return Err(NarrationError::Invocation(
            "Gemini 未返回任何文本".to_string(),
        ));
    }
    Ok(trimmed.to_string())
}

// ==========================================
// GeminiBackend
// ==========================================

pub struct GeminiBackend {
    settings: NarrationSettings,
    client: OnceCell<reqwest::Client>,
}

impl GeminiBackend {
    pub fn new(settings: NarrationSettings) -> Self {
        Self {
            settings,
            client: OnceCell::new(),
        }
    }

    pub fn settings(&self) -> &NarrationSettings {
        &self.settings
    }

    fn api_key(&self) -> NarrationResult<&str> {
        self.settings.api_key.as_deref().ok_or_else(|| {
            NarrationError::Configuration(format!(
                "{} 未配置，AI 叙述不可用",
                crate::narration::API_KEY_ENV
            ))
        })
    }

    /// 惰性初始化 HTTP 客户端
    ///
    /// 每次调用可能运行在不同的临时运行时上，因此不保留空闲连接。
    fn client(&self) -> NarrationResult<&reqwest::Client> {
        self.client.get_or_try_init(|| {
            reqwest::Client::builder()
                .timeout(self.settings.timeout)
                .pool_max_idle_per_host(0)
                .build()
                .map_err(|e| NarrationError::Configuration(format!("HTTP 客户端初始化失败: {}", e)))
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/{}:generateContent", GEMINI_ENDPOINT, self.settings.model)
    }
}

#[async_trait]
impl TextGenerationBackend for GeminiBackend {
    async fn generate(&self, request: &NarrationRequest) -> NarrationResult<String> {
        let api_key = self.api_key()?;
        let client = self.client()?;

        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: &request.prompt,
                }],
            }],
            generation_config: GenerationConfig {
                temperature: request.temperature,
                max_output_tokens: request.max_output_tokens.min(self.settings.max_output_tokens),
                response_modalities: vec!["TEXT"],
            },
        };

        tracing::debug!(
            model = %self.settings.model,
            prompt_len = request.prompt.len(),
            temperature = request.temperature,
            "发送叙述请求"
        );

        let response = client
            .post(self.endpoint())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| NarrationError::Invocation(format!("Gemini 请求失败: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            let detail: String = detail.chars().take(200).collect();
            return Err(NarrationError::Invocation(format!(
                "Gemini 返回 HTTP {}: {}",
                status, detail
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| NarrationError::Invocation(format!("Gemini 响应解析失败: {}", e)))?;

        extract_text(&parsed)
    }
}
