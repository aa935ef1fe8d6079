//! Weather lookup tool backed by a wttr.in-style service

use async_trait::async_trait;
use reqwest::StatusCode;
use std::sync::OnceLock;
use std::time::Duration;
use tracing::{debug, instrument, warn};

use crate::tools::{Tool, ToolContext, ToolResult};

/// Shared HTTP client for connection pooling
static SHARED_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

fn get_shared_client() -> &'static reqwest::Client {
    SHARED_CLIENT.get_or_init(|| {
        reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent("curl/8.0 (step-agent)")
            .build()
            .unwrap_or_else(|_| reqwest::Client::new())
    })
}

/// Tool for current weather conditions
pub struct WeatherTool;

#[async_trait]
impl Tool for WeatherTool {
    fn name(&self) -> &str {
        "get_weather"
    }

    fn description(&self) -> &str {
        "Get the current weather condition and temperature for a city."
    }

    fn input_hint(&self) -> &str {
        "city name string"
    }

    #[instrument(skip(self, ctx))]
    async fn execute(&self, input: &str, ctx: &ToolContext) -> ToolResult {
        let city = input.trim();
        if city.is_empty() {
            return ToolResult::error("Weather lookup needs a city name");
        }

        // wttr.in one-line format: condition and temperature
        let url = format!(
            "{}/{}?format=%C+%t",
            ctx.weather_url.trim_end_matches('/'),
            urlencoding::encode(&city.to_lowercase())
        );
        debug!(%url, "Fetching weather");

        let response = get_shared_client()
            .get(&url)
            .timeout(Duration::from_secs(ctx.http_timeout_secs))
            .send()
            .await;

        match response {
            Ok(resp) if resp.status() == StatusCode::OK => match resp.text().await {
                Ok(body) => ToolResult::success(format!("The weather in {} is {}", city, body.trim())),
                Err(e) => {
                    warn!(error = %e, "Failed to read weather response");
                    ToolResult::error("Weather API error")
                }
            },
            Ok(resp) => {
                warn!(status = resp.status().as_u16(), "Weather service returned an error");
                ToolResult::error("Weather service unavailable")
            }
            Err(e) => {
                warn!(error = %e, "Weather request failed");
                ToolResult::error("Weather API error")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_weather_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/paris"))
            .respond_with(ResponseTemplate::new(200).set_body_string("Sunny +21°C\n"))
            .expect(1)
            .mount(&server)
            .await;

        let ctx = ToolContext::default().with_weather_url(server.uri());
        let result = WeatherTool.execute("Paris", &ctx).await;
        assert!(result.success);
        assert_eq!(result.output, "The weather in Paris is Sunny +21°C");
    }

    #[tokio::test]
    async fn test_weather_service_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let ctx = ToolContext::default().with_weather_url(server.uri());
        let result = WeatherTool.execute("Paris", &ctx).await;
        assert!(!result.success);
        assert_eq!(result.observation_text(), "Weather service unavailable");
    }

    #[tokio::test]
    async fn test_weather_transport_error() {
        // Nothing listens on port 1
        let ctx = ToolContext::default().with_weather_url("http://127.0.0.1:1");
        let result = WeatherTool.execute("Paris", &ctx).await;
        assert!(!result.success);
        assert_eq!(result.observation_text(), "Weather API error");
    }

    #[tokio::test]
    async fn test_weather_empty_city() {
        let result = WeatherTool.execute("  ", &ToolContext::default()).await;
        assert!(!result.success);
    }
}
