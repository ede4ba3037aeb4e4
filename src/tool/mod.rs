//! Tools the model may call, and their dispatch.

pub mod args;

use schemars::JsonSchema;
use serde_json::{Value, json};
use tracing::{debug, trace};

use crate::agent::types::{Tool, ToolFunction};
use crate::config::Config;
use crate::error::{ApiError, ToolError};
use crate::service::{ImageClient, ImageResult, WeatherClient, WeatherResult};
use args::{CityArgs, CityCountryArgs, CityStateCountryArgs, ImageArgs};

/// Every operation the registry can dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolKind {
    WeatherByCity,
    WeatherByCityAndCountry,
    WeatherByCityStateCountry,
    ImageSearch,
}

impl ToolKind {
    pub const ALL: [ToolKind; 4] = [
        ToolKind::WeatherByCity,
        ToolKind::WeatherByCityAndCountry,
        ToolKind::WeatherByCityStateCountry,
        ToolKind::ImageSearch,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::WeatherByCity => "get_weather_from_city_name",
            Self::WeatherByCityAndCountry => "get_weather_from_city_name_and_country",
            Self::WeatherByCityStateCountry => "get_weather_from_city_name_and_state_code_and_country_code",
            Self::ImageSearch => "get_weather_image",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub fn is_weather(self) -> bool {
        !matches!(self, Self::ImageSearch)
    }

    fn description(self) -> &'static str {
        match self {
            Self::WeatherByCity => "Get the current weather in a given city",
            Self::WeatherByCityAndCountry => "Get the current weather in a given city and country",
            Self::WeatherByCityStateCountry => {
                "Get the current weather in a given city, state code, and country code"
            }
            Self::ImageSearch => "Get the image related to a given weather condition and location",
        }
    }

    fn parameters(self) -> Value {
        match self {
            Self::WeatherByCity => parameters_of::<CityArgs>(),
            Self::WeatherByCityAndCountry => parameters_of::<CityCountryArgs>(),
            Self::WeatherByCityStateCountry => parameters_of::<CityStateCountryArgs>(),
            Self::ImageSearch => parameters_of::<ImageArgs>(),
        }
    }

    pub fn spec(self) -> Tool {
        Tool {
            tool_type: "function".into(),
            function: ToolFunction {
                name: self.name().into(),
                description: self.description().into(),
                parameters: self.parameters(),
            },
        }
    }
}

fn parameters_of<T: JsonSchema>() -> Value {
    let mut schema = Value::from(schemars::schema_for!(T));
    if let Some(obj) = schema.as_object_mut() {
        obj.remove("$schema");
        obj.remove("title");
    }
    schema
}

/// Successful result of a dispatched tool call
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    Weather(WeatherResult),
    Images(ImageResult),
}

impl ToolOutput {
    /// JSON text stored as the tool message content
    pub fn payload(&self) -> String {
        let encoded = match self {
            Self::Weather(weather) => serde_json::to_string(weather),
            Self::Images(result) => serde_json::to_string(result),
        };
        encoded.unwrap_or_else(|e| json!({ "error": e.to_string() }).to_string())
    }
}

/// Tool name to client mapping. Clients carry their own API keys so the
/// model never supplies credentials.
pub struct ToolRegistry {
    weather: WeatherClient,
    images: ImageClient,
}

impl ToolRegistry {
    pub fn new(weather: WeatherClient, images: ImageClient) -> Self {
        Self { weather, images }
    }

    /// Build both clients, failing fast when either key is missing
    pub fn from_config(
        config: &Config,
        weather_api_key: Option<String>,
        image_api_key: Option<String>,
    ) -> anyhow::Result<Self> {
        let Some(weather_api_key) = weather_api_key.filter(|k| !k.is_empty()) else {
            anyhow::bail!("Weather API key is required. Use --weather-api-key or set OPEN_WEATHER_API_KEY");
        };
        let Some(image_api_key) = image_api_key.filter(|k| !k.is_empty()) else {
            anyhow::bail!("Bing API key is required. Use --bing-api-key or set BING_API_KEY");
        };
        Ok(Self::new(
            WeatherClient::new(&config.weather.base_url, weather_api_key, config.retry.clone()),
            ImageClient::new(&config.image.base_url, image_api_key, config.retry.clone()),
        ))
    }

    /// Full catalogue of dispatchable tools
    pub fn specs() -> Vec<Tool> {
        ToolKind::ALL.into_iter().map(ToolKind::spec).collect()
    }

    /// Tools offered to the model. Images are attached by the conversation
    /// handler, so only weather lookups are advertised.
    pub fn advertised_specs() -> Vec<Tool> {
        ToolKind::ALL
            .into_iter()
            .filter(|kind| kind.is_weather())
            .map(ToolKind::spec)
            .collect()
    }

    /// Parse `args_json` for tool `name` and run it
    pub async fn dispatch(&self, name: &str, args_json: &str) -> Result<ToolOutput, ToolError> {
        let kind = ToolKind::from_name(name).ok_or_else(|| ToolError::NotFound(name.to_string()))?;
        debug!("Dispatching tool {}", kind.name());
        trace!("Tool arguments: {}", args_json);

        let output = match kind {
            ToolKind::WeatherByCity => {
                let args: CityArgs = parse_args(kind, args_json)?;
                self.weather.current(&args.city_name).await.map(ToolOutput::Weather)
            }
            ToolKind::WeatherByCityAndCountry => {
                let args: CityCountryArgs = parse_args(kind, args_json)?;
                let location = format!("{},{}", args.city_name, args.country);
                self.weather.current(&location).await.map(ToolOutput::Weather)
            }
            ToolKind::WeatherByCityStateCountry => {
                let args: CityStateCountryArgs = parse_args(kind, args_json)?;
                let location = format!("{},{},{}", args.city_name, args.state_code, args.country_code);
                self.weather.current(&location).await.map(ToolOutput::Weather)
            }
            ToolKind::ImageSearch => {
                let args: ImageArgs = parse_args(kind, args_json)?;
                self.images.search(&args.query).await.map(ToolOutput::Images)
            }
        };

        output.map_err(|source| ToolError::Execution {
            tool: kind.name().to_string(),
            source,
        })
    }

    pub async fn search_images(&self, query: &str) -> Result<ImageResult, ApiError> {
        self.images.search(query).await
    }
}

fn parse_args<T: serde::de::DeserializeOwned>(kind: ToolKind, args_json: &str) -> Result<T, ToolError> {
    serde_json::from_str(args_json).map_err(|e| ToolError::InvalidArguments {
        tool: kind.name().to_string(),
        reason: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::retry::RetryPolicy;
    use crate::service::weather::tests::owm_body;
    use crate::service::ImageEntry;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry(server: &MockServer) -> ToolRegistry {
        let retry = RetryPolicy {
            max_retries: 1,
            ..Default::default()
        };
        ToolRegistry::new(
            WeatherClient::new(&server.uri(), "owm-key".into(), retry.clone()),
            ImageClient::new(&server.uri(), "bing-key".into(), retry),
        )
    }

    #[test]
    fn test_from_config_requires_both_keys() {
        let config = Config::default();
        let err = ToolRegistry::from_config(&config, None, Some("b".into())).err().unwrap();
        assert!(err.to_string().contains("OPEN_WEATHER_API_KEY"));
        let err = ToolRegistry::from_config(&config, Some("w".into()), Some(String::new())).err().unwrap();
        assert!(err.to_string().contains("BING_API_KEY"));
        assert!(ToolRegistry::from_config(&config, Some("w".into()), Some("b".into())).is_ok());
    }

    #[test]
    fn test_names_round_trip() {
        for kind in ToolKind::ALL {
            assert_eq!(ToolKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(ToolKind::from_name("get_stock_price"), None);
    }

    #[test]
    fn test_advertised_specs_are_weather_only() {
        let names: Vec<_> = ToolRegistry::advertised_specs()
            .into_iter()
            .map(|t| t.function.name)
            .collect();
        assert_eq!(
            names,
            vec![
                "get_weather_from_city_name",
                "get_weather_from_city_name_and_country",
                "get_weather_from_city_name_and_state_code_and_country_code",
            ]
        );
        assert_eq!(ToolRegistry::specs().len(), 4);
    }

    #[test]
    fn test_spec_parameters_schema() {
        let spec = ToolKind::WeatherByCityStateCountry.spec();
        let params = &spec.function.parameters;
        assert_eq!(params["type"], "object");
        assert!(params.get("$schema").is_none());
        assert_eq!(
            params["properties"]["state_code"]["description"],
            "The state code as ISO 3166 state code e.g. ID"
        );
        let required: Vec<_> = params["required"].as_array().unwrap().iter().collect();
        assert_eq!(required.len(), 3);
    }

    #[test]
    fn test_image_spec_has_no_credentials() {
        let spec = ToolKind::ImageSearch.spec();
        let props = spec.function.parameters["properties"].as_object().unwrap();
        assert!(props.contains_key("query"));
        assert!(!props.contains_key("api_key"));
    }

    #[test]
    fn test_weather_payload_round_trip() {
        let weather = WeatherResult {
            description: "clear sky".into(),
            location: "Boise".into(),
            country_code: "US".into(),
            icon: "☀".into(),
            temperature: 295.1,
        };
        let payload = ToolOutput::Weather(weather.clone()).payload();
        let back: WeatherResult = serde_json::from_str(&payload).unwrap();
        assert_eq!(back, weather);
    }

    #[tokio::test]
    async fn test_dispatch_composes_location() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("q", "Paris,FR"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(owm_body("Paris", "FR", "light rain", "10d", 285.0)),
            )
            .expect(1)
            .mount(&server)
            .await;

        let output = registry(&server)
            .dispatch(
                "get_weather_from_city_name_and_country",
                r#"{"city_name": "Paris", "country": "FR"}"#,
            )
            .await
            .unwrap();
        match output {
            ToolOutput::Weather(w) => assert_eq!(w.location, "Paris"),
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[test]
    fn test_images_payload() {
        let output = ToolOutput::Images(ImageResult {
            images: vec![ImageEntry {
                image_url: None,
                thumbnail_url: Some("https://img/t.jpg".into()),
            }],
        });
        let back: ImageResult = serde_json::from_str(&output.payload()).unwrap();
        assert_eq!(back.images[0].url(), "https://img/t.jpg");
    }

    #[tokio::test]
    async fn test_dispatch_image_search() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/images/search"))
            .and(query_param("q", "fog in London, GB"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": [{"contentUrl": "https://img/london.jpg"}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let output = registry(&server)
            .dispatch("get_weather_image", r#"{"query": "fog in London, GB"}"#)
            .await
            .unwrap();
        match output {
            ToolOutput::Images(result) => assert_eq!(result.images[0].url(), "https://img/london.jpg"),
            other => panic!("unexpected output: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_dispatch_unknown_tool() {
        let server = MockServer::start().await;
        let err = registry(&server).dispatch("get_stock_price", "{}").await.unwrap_err();
        assert!(matches!(err, ToolError::NotFound(name) if name == "get_stock_price"));
    }

    #[tokio::test]
    async fn test_dispatch_invalid_arguments() {
        let server = MockServer::start().await;
        let err = registry(&server)
            .dispatch("get_weather_from_city_name", "{not json")
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }

    #[tokio::test]
    async fn test_dispatch_wraps_api_failure_without_key() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = registry(&server)
            .dispatch("get_weather_from_city_name", r#"{"city_name": "Atlantis"}"#)
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::Execution { .. }));
        assert!(!err.to_string().contains("owm-key"));
    }
}
