//! 排序服务客户端
//!
//! 通过兼容 chat-completions 协议的HTTP接口调用外部排序服务，
//! 并对其输出做严格的形状校验。客户端内部不做任何重试。

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use dispatch_core::{DispatchError, DispatchResult};
use dispatch_domain::entities::{CandidateRecord, RankedCandidate};
use dispatch_domain::ports::RankingOracle;

/// 基于HTTP的排序服务客户端
pub struct HttpRankingOracle {
    base_url: String,
    api_key: String,
    model: String,
    http_client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl HttpRankingOracle {
    pub fn new(
        base_url: String,
        api_key: String,
        model: String,
        timeout_seconds: u64,
    ) -> DispatchResult<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_seconds))
            .build()
            .map_err(|e| DispatchError::Configuration(format!("构建HTTP客户端失败: {e}")))?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            http_client,
        })
    }

    fn build_prompt(context: &serde_json::Value, pool: &[CandidateRecord]) -> String {
        let requester = serde_json::to_string_pretty(context).unwrap_or_else(|_| "{}".to_string());
        let volunteers = serde_json::to_string_pretty(pool).unwrap_or_else(|_| "[]".to_string());

        format!(
            r#"You are an emergency-response volunteer matching system.

You MUST return ONLY valid JSON.
Do NOT include markdown.
Do NOT include explanations outside JSON.
Do NOT include extra text.

Your task:
Rank volunteers from BEST to WORST for this specific help request.

Ranking priorities (in order of importance):
1) Medical / emergency relevance to the requester
2) Practical skills and real-world experience
3) Distance in kilometers (closer is better, but NEVER override skill or safety)
4) Reliability indicators if present (notes, experience, consistency)

Requester:
{requester}

Volunteers:
{volunteers}

You MUST return EXACTLY this JSON format:
[
  {{
    "volunteerId": "string",
    "score": 0.0,
    "distanceKm": 0.0,
    "reason": "short explanation of why this volunteer is ranked here"
  }}
]
"#
        )
    }
}

#[async_trait]
impl RankingOracle for HttpRankingOracle {
    async fn rank(
        &self,
        context: &serde_json::Value,
        pool: &[CandidateRecord],
    ) -> DispatchResult<Vec<RankedCandidate>> {
        let prompt = Self::build_prompt(context, pool);
        let url = format!("{}/chat/completions", self.base_url);

        let body = json!({
            "model": self.model,
            "temperature": 0,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                error!("排序服务连接失败: {e}");
                DispatchError::OracleUnavailable(format!("connection error: {e}"))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            error!("排序服务返回错误: HTTP {status} - {text}");
            return Err(DispatchError::OracleUnavailable(format!(
                "HTTP {status} - {text}"
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            DispatchError::OracleUnavailable(format!("invalid completion envelope: {e}"))
        })?;

        let content = completion
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .unwrap_or_default();

        let ranked = parse_ranked_output(content)?;
        debug!("排序服务返回 {} 个候选人", ranked.len());
        Ok(ranked)
    }
}

/// 解析排序服务的原始输出
///
/// 去掉可选的markdown代码围栏后必须是合法JSON，且恰好反序列化为非空的
/// `RankedCandidate` 数组。不对格式错误的条目做任何纠正或丢弃。
pub fn parse_ranked_output(content: &str) -> DispatchResult<Vec<RankedCandidate>> {
    let mut raw = content.trim();

    if raw.is_empty() {
        return Err(DispatchError::RankingFormat(
            "排序服务返回了空响应".to_string(),
        ));
    }

    let stripped;
    if raw.starts_with("```") {
        stripped = raw.replace("```json", "").replace("```", "");
        raw = stripped.trim();
    }

    let ranked: Vec<RankedCandidate> = serde_json::from_str(raw).map_err(|e| {
        error!("排序服务原始输出解析失败:\n{raw}");
        DispatchError::RankingFormat(format!("JSON解析失败: {e}"))
    })?;

    if ranked.is_empty() {
        return Err(DispatchError::RankingFormat(
            "排序结果不能为空数组".to_string(),
        ));
    }

    Ok(ranked)
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_BODY: &str = r#"[
        {"volunteerId": "v1", "score": 0.92, "distanceKm": 1.4, "reason": "EMT certified"},
        {"volunteerId": "v2", "score": 0.55, "distanceKm": 12.0, "reason": "first aid training"}
    ]"#;

    #[test]
    fn test_parse_plain_json_array() {
        let ranked = parse_ranked_output(VALID_BODY).unwrap();
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].volunteer_id, "v1");
        assert_eq!(ranked[1].score, 0.55);
    }

    #[test]
    fn test_parse_strips_code_fence() {
        let fenced = format!("```json\n{VALID_BODY}\n```");
        let ranked = parse_ranked_output(&fenced).unwrap();
        assert_eq!(ranked.len(), 2);

        let bare_fence = format!("```\n{VALID_BODY}\n```");
        let ranked = parse_ranked_output(&bare_fence).unwrap();
        assert_eq!(ranked.len(), 2);
    }

    #[test]
    fn test_empty_response_is_format_error() {
        let err = parse_ranked_output("").unwrap_err();
        assert!(matches!(err, DispatchError::RankingFormat(_)));

        let err = parse_ranked_output("   \n  ").unwrap_err();
        assert!(matches!(err, DispatchError::RankingFormat(_)));
    }

    #[test]
    fn test_non_json_response_is_format_error() {
        let err = parse_ranked_output("I ranked the volunteers as follows: v1, v2").unwrap_err();
        assert!(matches!(err, DispatchError::RankingFormat(_)));
    }

    #[test]
    fn test_missing_field_is_format_error() {
        // distanceKm缺失，禁止静默纠正
        let body = r#"[{"volunteerId": "v1", "score": 0.9, "reason": "ok"}]"#;
        let err = parse_ranked_output(body).unwrap_err();
        assert!(matches!(err, DispatchError::RankingFormat(_)));
    }

    #[test]
    fn test_wrong_type_is_format_error() {
        let body = r#"[{"volunteerId": "v1", "score": "high", "distanceKm": 1.0, "reason": "ok"}]"#;
        let err = parse_ranked_output(body).unwrap_err();
        assert!(matches!(err, DispatchError::RankingFormat(_)));
    }

    #[test]
    fn test_empty_array_is_format_error() {
        let err = parse_ranked_output("[]").unwrap_err();
        assert!(matches!(err, DispatchError::RankingFormat(_)));
    }

    #[test]
    fn test_object_instead_of_array_is_format_error() {
        let body = r#"{"volunteerId": "v1", "score": 0.9, "distanceKm": 1.0, "reason": "ok"}"#;
        let err = parse_ranked_output(body).unwrap_err();
        assert!(matches!(err, DispatchError::RankingFormat(_)));
    }
}
