//! watsonx.ai text generation gateway.

use super::{
    check_base_url, ensure_success, DecodingMethod, GatewayError, GenerationGateway,
    GenerationParams, IamAuthenticator,
};
use crate::config::GenerationConfig;
use crate::services::metrics;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use service_core::observability::TracedClientExt;
use std::time::{Duration, Instant};

const GATEWAY: &str = "watsonx";
const API_VERSION: &str = "2023-05-29";

pub struct WatsonxClient {
    config: GenerationConfig,
    client: Client,
    auth: IamAuthenticator,
}

impl WatsonxClient {
    pub fn new(
        config: GenerationConfig,
        iam_url: &str,
        timeout: Duration,
    ) -> Result<Self, GatewayError> {
        check_base_url(&config.url)?;
        check_base_url(iam_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::NotConfigured(format!("HTTP client: {}", e)))?;
        let auth = IamAuthenticator::new(config.api_key.clone(), iam_url, client.clone());

        Ok(Self {
            config,
            client,
            auth,
        })
    }

    fn build_request<'a>(
        &'a self,
        prompt: &'a str,
        params: &GenerationParams,
    ) -> GenerationRequest<'a> {
        GenerationRequest {
            input: prompt,
            parameters: RequestParameters {
                decoding_method: params.decoding_method,
                max_new_tokens: params.max_new_tokens,
            },
            model_id: &self.config.model_id,
            project_id: &self.config.project_id,
        }
    }

    async fn run_generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Vec<String>, GatewayError> {
        let token = self.auth.access_token().await?;
        let url = format!("{}/ml/v1/text/generation", self.config.url);

        tracing::debug!(
            model = %self.config.model_id,
            prompt_len = prompt.len(),
            "Sending generation request to watsonx.ai"
        );

        let response = self
            .client
            .traced_post(&url)
            .query(&[("version", API_VERSION)])
            .header("Accept", "application/json")
            .bearer_auth(token)
            .json(&self.build_request(prompt, params))
            .send()
            .await?;

        let body: GenerationResponse = ensure_success(response).await?.json().await?;

        Ok(body
            .results
            .into_iter()
            .map(|r| r.generated_text)
            .collect())
    }
}

#[async_trait]
impl GenerationGateway for WatsonxClient {
    async fn generate(
        &self,
        prompt: &str,
        params: &GenerationParams,
    ) -> Result<Vec<String>, GatewayError> {
        let start = Instant::now();
        let result = self.run_generate(prompt, params).await;
        metrics::record_gateway_call(GATEWAY, "generate", start.elapsed(), result.as_ref().err());
        result
    }
}

// ============================================================================
// watsonx.ai API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    input: &'a str,
    parameters: RequestParameters,
    model_id: &'a str,
    project_id: &'a str,
}

#[derive(Debug, Serialize)]
struct RequestParameters {
    decoding_method: DecodingMethod,
    max_new_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct GenerationResponse {
    #[serde(default)]
    results: Vec<GenerationResult>,
}

#[derive(Debug, Deserialize)]
struct GenerationResult {
    generated_text: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> WatsonxClient {
        WatsonxClient::new(
            GenerationConfig {
                api_key: "key".to_string(),
                url: "https://us-south.ml.cloud.ibm.com".to_string(),
                project_id: "proj-1".to_string(),
                model_id: "ibm/granite-3-8b-instruct".to_string(),
            },
            "http://127.0.0.1:1",
            Duration::from_secs(1),
        )
        .unwrap()
    }

    #[test]
    fn request_body_matches_generation_api() {
        let client = client();
        let body = serde_json::to_value(
            client.build_request("hello", &GenerationParams::default()),
        )
        .unwrap();

        assert_eq!(
            body,
            json!({
                "input": "hello",
                "parameters": {"decoding_method": "greedy", "max_new_tokens": 1000},
                "model_id": "ibm/granite-3-8b-instruct",
                "project_id": "proj-1"
            })
        );
    }

    #[test]
    fn response_results_are_parsed_in_order() {
        let body: GenerationResponse = serde_json::from_value(json!({
            "model_id": "ibm/granite-3-8b-instruct",
            "results": [
                {"generated_text": "first", "generated_token_count": 1, "stop_reason": "eos_token"},
                {"generated_text": "second"}
            ]
        }))
        .unwrap();

        let texts: Vec<String> = body.results.into_iter().map(|r| r.generated_text).collect();
        assert_eq!(texts, vec!["first", "second"]);
    }

    #[test]
    fn malformed_endpoint_is_not_configured() {
        let result = WatsonxClient::new(
            GenerationConfig {
                api_key: "key".to_string(),
                url: "us-south.ml.cloud.ibm.com".to_string(),
                project_id: "proj-1".to_string(),
                model_id: "ibm/granite-3-8b-instruct".to_string(),
            },
            "http://127.0.0.1:1",
            Duration::from_secs(1),
        );
        assert!(matches!(result, Err(GatewayError::NotConfigured(_))));
    }

    #[tokio::test]
    async fn unreachable_service_fails_with_authentication_error() {
        let err = client()
            .generate("prompt", &GenerationParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, GatewayError::Authentication(_)));
    }
}
