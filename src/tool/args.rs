use schemars::JsonSchema;
use serde::Deserialize;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CityArgs {
    /// The city e.g. Boise
    pub city_name: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CityCountryArgs {
    /// The city e.g. Boise
    pub city_name: String,
    /// The country as ISO 3166 country code e.g. US
    pub country: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CityStateCountryArgs {
    /// The city e.g. Boise
    pub city_name: String,
    /// The state code as ISO 3166 state code e.g. ID
    pub state_code: String,
    /// The country code as ISO 3166 country code e.g. US
    pub country_code: String,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ImageArgs {
    /// The weather condition and location e.g. 'sunny in Boise, US'
    pub query: String,
}
