//! sw_fetch tool implementation.
//!
//! Delivers one fetch event to the worker and reports what it decided.
//! Bodies are returned as text when they are valid UTF-8, base64 otherwise.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use shellcache_core::{Action, Classification, Network, Outcome, Request, RequestMode, ResponseSource, Worker};

use super::{BodyEncoding, encode_body, json_result};

/// Input parameters for sw_fetch tool.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute or root-relative URL of the intercepted request.
    pub url: String,

    /// HTTP method (default: GET). Other methods pass through.
    #[serde(default = "default_method")]
    pub method: String,

    /// Request mode: "navigate", "same-origin", "no-cors" (default) or "cors".
    #[serde(default)]
    pub mode: RequestMode,
}

fn default_method() -> String {
    "GET".into()
}

/// Output structure for sw_fetch tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwFetchOutput {
    /// The resolved request URL.
    pub url: String,
    pub classification: Classification,
    /// Last action taken by the policy.
    pub action: Action,
    /// "respond", "pass_through" or "no_fallback".
    pub outcome: String,
    /// Origin of the delivered response.
    pub source: Option<ResponseSource>,
    pub status: Option<u16>,
    pub status_text: Option<String>,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub body_encoding: Option<BodyEncoding>,
    /// Why nothing could be delivered.
    pub reason: Option<String>,
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl<N: Network>(worker: &Worker<N>, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let url = worker.resolve(&params.url)?;
    let request = Request { method: params.method, url, mode: params.mode };
    let url = request.url.to_string();

    let intercepted = worker.handle_fetch(request).await;
    // the write keeps running after the answer is returned
    drop(intercepted.persist);

    let mut output = SwFetchOutput {
        url,
        classification: intercepted.classification,
        action: intercepted.action,
        outcome: String::new(),
        source: None,
        status: None,
        status_text: None,
        headers: Vec::new(),
        body: None,
        body_encoding: None,
        reason: None,
    };

    match intercepted.outcome {
        Outcome::PassThrough => output.outcome = "pass_through".into(),
        Outcome::NoFallback { reason } => {
            output.outcome = "no_fallback".into();
            output.reason = Some(reason);
        }
        Outcome::Respond { response, source } => {
            output.outcome = "respond".into();
            output.source = Some(source);
            output.status = Some(response.status);
            output.status_text = Some(response.status_text);
            let (body, encoding) = encode_body(&response.body);
            output.body = Some(body);
            output.body_encoding = Some(encoding);
            output.headers = response.headers;
        }
    }

    json_result(&output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::lifecycle::install_impl;
    use crate::tools::testing::{JPEG_BYTES, output, worker};
    use base64::{Engine, engine::general_purpose::STANDARD};

    fn params(url: &str, mode: RequestMode) -> SwFetchParams {
        SwFetchParams { url: url.into(), method: default_method(), mode }
    }

    #[test]
    fn test_params_defaults() {
        let params: SwFetchParams = serde_json::from_str(r#"{"url": "/"}"#).unwrap();
        assert_eq!(params.method, "GET");
        assert_eq!(params.mode, RequestMode::NoCors);

        let nav: SwFetchParams = serde_json::from_str(r#"{"url": "/", "mode": "navigate"}"#).unwrap();
        assert_eq!(nav.mode, RequestMode::Navigate);
    }

    #[tokio::test]
    async fn test_fetch_online() {
        let (worker, _network) = worker("v2").await;

        let out = output(&fetch_impl(&worker, params("/about.html", RequestMode::NoCors)).await.unwrap());
        assert_eq!(out["outcome"], "respond");
        assert_eq!(out["source"], "network");
        assert_eq!(out["classification"], "application_content");
        assert_eq!(out["body"], "body of /about.html");
        assert_eq!(out["body_encoding"], "utf8");
    }

    #[tokio::test]
    async fn test_fetch_binary_body_round_trips() {
        let (worker, _network) = worker("v2").await;

        let out = output(&fetch_impl(&worker, params("/img/img1.jpg", RequestMode::NoCors)).await.unwrap());
        assert_eq!(out["outcome"], "respond");
        assert_eq!(out["body_encoding"], "base64");
        let body = STANDARD.decode(out["body"].as_str().unwrap()).unwrap();
        assert_eq!(body, JPEG_BYTES);
    }

    #[tokio::test]
    async fn test_fetch_offline_navigation_gets_shell() {
        let (worker, network) = worker("v2").await;
        install_impl(&worker).await.unwrap();
        network.go_offline();

        let out = output(&fetch_impl(&worker, params("/blog/post", RequestMode::Navigate)).await.unwrap());
        assert_eq!(out["outcome"], "respond");
        assert_eq!(out["source"], "shell");
        assert_eq!(out["action"], "serve_shell_fallback");
        assert_eq!(out["body"], "body of /index.html");
    }

    #[tokio::test]
    async fn test_fetch_post_passes_through() {
        let (worker, _network) = worker("v2").await;
        let params = SwFetchParams { url: "/contact".into(), method: "POST".into(), mode: RequestMode::Cors };

        let out = output(&fetch_impl(&worker, params).await.unwrap());
        assert_eq!(out["outcome"], "pass_through");
    }

    #[tokio::test]
    async fn test_fetch_offline_without_cache() {
        let (worker, network) = worker("v2").await;
        network.go_offline();

        let out = output(&fetch_impl(&worker, params("/img/a.png", RequestMode::NoCors)).await.unwrap());
        assert_eq!(out["outcome"], "no_fallback");
        assert!(out["reason"].as_str().unwrap().contains("offline"));
    }

    #[tokio::test]
    async fn test_fetch_invalid_url() {
        let (worker, _network) = worker("v2").await;
        let result = fetch_impl(&worker, params("   ", RequestMode::NoCors)).await;
        assert!(result.is_err());
    }
}
