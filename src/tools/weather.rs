//! Current weather by city name (OpenWeatherMap).

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Number, Value};

use super::{http_client, LookupTool, ToolKind};
use crate::error::{Error, Result};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(8);

pub struct WeatherTool {
    client: Client,
    base_url: String,
    api_key: String,
}

#[derive(Deserialize, Debug)]
struct WeatherResponse {
    cod: Value,
    name: Option<String>,
    sys: Option<Sys>,
    main: Option<Main>,
    #[serde(default)]
    weather: Vec<Condition>,
}

#[derive(Deserialize, Debug)]
struct Sys {
    country: Option<String>,
}

#[derive(Deserialize, Debug)]
struct Main {
    temp: Number,
    humidity: Number,
}

#[derive(Deserialize, Debug)]
struct Condition {
    description: String,
}

/// `cod` arrives as `200` on success and as a string like `"404"` on errors.
fn is_success_code(cod: &Value) -> bool {
    match cod {
        Value::Number(n) => n.as_u64() == Some(200),
        Value::String(s) => s.trim() == "200",
        _ => false,
    }
}

fn not_found_message(city: &str) -> String {
    format!("❌ Ciudad no encontrada: '{}'. Revisa el nombre e inténtalo de nuevo.", city)
}

impl WeatherTool {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            client: http_client(REQUEST_TIMEOUT),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    async fn lookup(&self, city: &str) -> Result<String> {
        let response = self
            .client
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[
                ("q", city),
                ("appid", self.api_key.as_str()),
                ("units", "metric"),
                ("lang", "es"),
            ])
            .send()
            .await?;

        // OpenWeatherMap mirrors `cod` in the HTTP status; 404 bodies still parse.
        let body: WeatherResponse = response.json().await?;
        if !is_success_code(&body.cod) {
            tracing::info!("Weather lookup for {:?} returned cod={}", city, body.cod);
            return Ok(not_found_message(city));
        }

        format_report(city, body)
    }
}

fn format_report(query: &str, body: WeatherResponse) -> Result<String> {
    let main = body
        .main
        .ok_or_else(|| Error::upstream("weather response has no 'main' block"))?;
    let description = body
        .weather
        .into_iter()
        .next()
        .map(|c| c.description)
        .ok_or_else(|| Error::upstream("weather response has no conditions"))?;
    let city = body.name.unwrap_or_else(|| query.to_string());
    let country = body.sys.and_then(|s| s.country).unwrap_or_default();

    Ok(format!(
        "🌤️ Clima en {}, {}\n🌡️ Temperatura: {}°C\n💧 Humedad: {}%\n☁️ Condición: {}",
        city, country, main.temp, main.humidity, description
    ))
}

#[async_trait]
impl LookupTool for WeatherTool {
    fn kind(&self) -> ToolKind {
        ToolKind::Weather
    }

    async fn run(&self, query: &str) -> String {
        let city = query.trim();
        match self.lookup(city).await {
            Ok(text) => text,
            Err(e) => {
                tracing::error!("Weather lookup for {:?} failed: {}", city, e);
                "⚠️ No pude obtener el clima en este momento. Intenta más tarde.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    #[tokio::test]
    async fn test_formats_report_without_rounding() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/data/2.5/weather")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "San Salvador".into()),
                Matcher::UrlEncoded("appid".into(), "key".into()),
                Matcher::UrlEncoded("units".into(), "metric".into()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(
                r#"{"cod":200,"name":"San Salvador","sys":{"country":"SV"},
                    "main":{"temp":27.83,"humidity":74},
                    "weather":[{"description":"nubes dispersas"}]}"#,
            )
            .expect(1)
            .create_async()
            .await;

        let tool = WeatherTool::new(server.url(), "key");
        let text = tool.run("San Salvador").await;

        assert_eq!(
            text,
            "🌤️ Clima en San Salvador, SV\n🌡️ Temperatura: 27.83°C\n💧 Humedad: 74%\n☁️ Condición: nubes dispersas"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_city_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/data/2.5/weather")
            .match_query(Matcher::Any)
            .with_status(404)
            .with_header("content-type", "application/json")
            .with_body(r#"{"cod":"404","message":"city not found"}"#)
            .create_async()
            .await;

        let tool = WeatherTool::new(server.url(), "key");
        let text = tool.run("Atlantis").await;
        assert!(text.contains("no encontrada"));
        assert!(text.contains("Atlantis"));
    }

    #[tokio::test]
    async fn test_malformed_body_becomes_apology() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("GET", "/data/2.5/weather")
            .match_query(Matcher::Any)
            .with_status(500)
            .with_body("<html>oops</html>")
            .create_async()
            .await;

        let tool = WeatherTool::new(server.url(), "key");
        assert!(tool.run("Paris").await.starts_with("⚠️"));
    }

    #[tokio::test]
    async fn test_unreachable_upstream_becomes_apology() {
        let tool = WeatherTool::new("http://127.0.0.1:9", "key");
        assert!(tool.run("Paris").await.starts_with("⚠️"));
    }

    #[test]
    fn test_success_code_variants() {
        assert!(is_success_code(&serde_json::json!(200)));
        assert!(is_success_code(&serde_json::json!("200")));
        assert!(!is_success_code(&serde_json::json!("404")));
        assert!(!is_success_code(&serde_json::json!(null)));
    }
}
