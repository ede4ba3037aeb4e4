use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::icons::icon_for;
use crate::error::ApiError;
use crate::retry::{RetryPolicy, with_retry};

const SERVICE: &str = "weather";

/// Current weather at a location
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct WeatherResult {
    /// Free-text condition, e.g. "clear sky"
    pub description: String,
    /// City name as reported by the provider
    pub location: String,
    pub country_code: String,
    /// Display glyph for the condition, empty when the code is unknown
    pub icon: String,
    /// Provider units (Kelvin for OpenWeather)
    pub temperature: f64,
}

#[derive(Deserialize)]
struct OwmResponse {
    weather: Vec<OwmCondition>,
    name: String,
    sys: OwmSys,
    main: OwmMain,
}

#[derive(Deserialize)]
struct OwmCondition {
    description: String,
    icon: String,
}

#[derive(Deserialize)]
struct OwmSys {
    country: String,
}

#[derive(Deserialize)]
struct OwmMain {
    temp: f64,
}

/// OpenWeather "current weather" client bound to one API key
pub struct WeatherClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

impl WeatherClient {
    pub fn new(base_url: &str, api_key: String, retry: RetryPolicy) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            retry,
        }
    }

    /// Weather for `city`, `city,country` or `city,state,country`
    pub async fn current(&self, location: &str) -> Result<WeatherResult, ApiError> {
        debug!("Fetching weather for '{}'", location);
        with_retry(&self.retry, ApiError::is_transient, || self.fetch(location)).await
    }

    async fn fetch(&self, location: &str) -> Result<WeatherResult, ApiError> {
        let response = self
            .client
            .get(format!("{}/data/2.5/weather", self.base_url))
            .query(&[("q", location), ("appid", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| ApiError::transport(SERVICE, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::Status {
                service: SERVICE,
                status,
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| ApiError::transport(SERVICE, e))?;
        parse_weather(&body)
    }
}

fn parse_weather(body: &str) -> Result<WeatherResult, ApiError> {
    if body.trim().is_empty() {
        return Err(ApiError::domain(SERVICE, "empty response"));
    }

    let value: Value = serde_json::from_str(body).map_err(|e| ApiError::decode(SERVICE, e))?;
    let cod = value.get("cod").and_then(Value::as_i64);
    if cod != Some(200) {
        let cod = value.get("cod").map(Value::to_string).unwrap_or_else(|| "missing".into());
        return Err(ApiError::domain(SERVICE, format!("no weather data (cod {})", cod)));
    }

    let owm: OwmResponse = serde_json::from_value(value).map_err(|e| ApiError::decode(SERVICE, e))?;
    let condition = owm
        .weather
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::decode(SERVICE, "empty weather list"))?;

    Ok(WeatherResult {
        description: condition.description,
        location: owm.name,
        country_code: owm.sys.country,
        icon: icon_for(&condition.icon).to_string(),
        temperature: owm.main.temp,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    pub(crate) fn owm_body(name: &str, country: &str, description: &str, icon: &str, temp: f64) -> Value {
        json!({
            "cod": 200,
            "name": name,
            "sys": {"country": country},
            "main": {"temp": temp, "humidity": 40},
            "weather": [{"id": 800, "main": "Clear", "description": description, "icon": icon}]
        })
    }

    fn no_retry() -> RetryPolicy {
        RetryPolicy {
            max_retries: 1,
            ..Default::default()
        }
    }

    #[test]
    fn test_parse_boise() {
        let body = owm_body("Boise", "US", "clear sky", "01d", 295.1).to_string();
        let weather = parse_weather(&body).unwrap();
        assert_eq!(
            weather,
            WeatherResult {
                description: "clear sky".into(),
                location: "Boise".into(),
                country_code: "US".into(),
                icon: "☀".into(),
                temperature: 295.1,
            }
        );
    }

    #[test]
    fn test_parse_unknown_icon_is_empty() {
        let body = owm_body("Oslo", "NO", "odd", "77q", 270.0).to_string();
        assert_eq!(parse_weather(&body).unwrap().icon, "");
    }

    #[test]
    fn test_parse_rejects_non_200_cod() {
        let err = parse_weather(r#"{"cod": "404", "message": "city not found"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Domain { .. }));
        assert!(!err.is_transient());
    }

    #[test]
    fn test_parse_rejects_empty_body() {
        assert!(matches!(parse_weather("  "), Err(ApiError::Domain { .. })));
    }

    #[test]
    fn test_parse_rejects_missing_fields() {
        let err = parse_weather(r#"{"cod": 200, "name": "Boise"}"#).unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_current_sends_location_and_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data/2.5/weather"))
            .and(query_param("q", "Boise,ID,US"))
            .and(query_param("appid", "owm-key"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(owm_body("Boise", "US", "clear sky", "01d", 295.1)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = WeatherClient::new(&server.uri(), "owm-key".into(), no_retry());
        let weather = client.current("Boise,ID,US").await.unwrap();
        assert_eq!(weather.location, "Boise");
    }

    #[tokio::test]
    async fn test_http_error_does_not_leak_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let client = WeatherClient::new(&server.uri(), "owm-secret".into(), no_retry());
        let err = client.current("Boise").await.unwrap_err();
        assert!(matches!(err, ApiError::Status { .. }));
        assert!(!err.to_string().contains("owm-secret"));
    }

    #[tokio::test]
    async fn test_city_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"cod": "404", "message": "city not found"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = WeatherClient::new(&server.uri(), "k".into(), RetryPolicy::default());
        assert!(client.current("Nowhere").await.is_err());
    }
}
