use std::time::Duration;

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use crate::AppState;
use crate::models::{Units, WeatherProvider};

const WEATHER_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeatherQuery {
    pub provider: Option<WeatherProvider>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zipcode: Option<String>,
    pub country: Option<String>,
    pub api_key: Option<String>,
    pub units: Option<Units>,
}

/// Normalized shape both providers are mapped onto.
#[derive(Debug, Serialize)]
pub struct WeatherReport {
    pub temp: f64,
    pub description: String,
    pub icon: String,
    pub city: String,
}

/// Proxy a weather lookup so the browser never talks to the provider
/// (CORS) and the response shape is uniform across providers.
pub async fn get_weather(
    State(state): State<AppState>,
    Query(query): Query<WeatherQuery>,
) -> Result<Json<WeatherReport>, (StatusCode, Json<Value>)> {
    let location = [&query.city, &query.state, &query.zipcode, &query.country]
        .iter()
        .filter_map(|part| part.as_deref())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(",");
    let api_key = query.api_key.unwrap_or_default();
    if location.is_empty() || api_key.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "missing location details or API key" })),
        ));
    }

    let units = query.units.unwrap_or(Units::Metric);
    let result = match query.provider.unwrap_or(WeatherProvider::OpenWeatherMap) {
        WeatherProvider::OpenWeatherMap => {
            fetch_openweathermap(&state.http, &location, &api_key, units).await
        }
        WeatherProvider::WeatherApi => {
            fetch_weatherapi(&state.http, &location, &api_key, units).await
        }
    };

    result.map(Json).map_err(|e| {
        tracing::warn!("weather lookup failed: {e}");
        (StatusCode::BAD_GATEWAY, Json(json!({ "error": e.to_string() })))
    })
}

async fn fetch_openweathermap(
    client: &reqwest::Client,
    location: &str,
    api_key: &str,
    units: Units,
) -> anyhow::Result<WeatherReport> {
    let response = client
        .get("https://api.openweathermap.org/data/2.5/weather")
        .query(&[("q", location), ("appid", api_key), ("units", units.as_str())])
        .timeout(WEATHER_TIMEOUT)
        .send()
        .await?;
    let status = response.status();
    let data: Value = response.json().await?;
    if !status.is_success() {
        anyhow::bail!(
            "{}",
            data["message"].as_str().unwrap_or("error from OpenWeatherMap API")
        );
    }

    Ok(WeatherReport {
        temp: data["main"]["temp"].as_f64().unwrap_or_default(),
        description: data["weather"][0]["description"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        icon: data["weather"][0]["icon"].as_str().unwrap_or_default().to_string(),
        city: data["name"].as_str().unwrap_or_default().to_string(),
    })
}

async fn fetch_weatherapi(
    client: &reqwest::Client,
    location: &str,
    api_key: &str,
    units: Units,
) -> anyhow::Result<WeatherReport> {
    let response = client
        .get("https://api.weatherapi.com/v1/current.json")
        .query(&[("key", api_key), ("q", location)])
        .timeout(WEATHER_TIMEOUT)
        .send()
        .await?;
    let status = response.status();
    let data: Value = response.json().await?;
    if !status.is_success() {
        anyhow::bail!(
            "{}",
            data["error"]["message"].as_str().unwrap_or("error from WeatherAPI.com")
        );
    }

    let code = data["current"]["condition"]["icon"]
        .as_str()
        .and_then(|icon| icon.rsplit('/').next())
        .map(|name| name.trim_end_matches(".png"))
        .unwrap_or("116");
    let is_day = data["current"]["is_day"].as_i64().unwrap_or(1) == 1;
    let temp = if units == Units::Imperial {
        data["current"]["temp_f"].as_f64().unwrap_or_default()
    } else {
        data["current"]["temp_c"].as_f64().unwrap_or_default()
    };

    Ok(WeatherReport {
        temp,
        description: data["current"]["condition"]["text"]
            .as_str()
            .unwrap_or_default()
            .to_string(),
        icon: map_weatherapi_icon(code, is_day),
        city: data["location"]["name"].as_str().unwrap_or_default().to_string(),
    })
}

/// WeatherAPI condition codes mapped onto the OpenWeatherMap icon set so
/// the frontend only knows one set of glyphs.
fn map_weatherapi_icon(code: &str, is_day: bool) -> String {
    let base = match code {
        "113" => "01",
        "116" => "02",
        "119" => "03",
        "122" => "04",
        "176" | "302" => "10",
        "296" | "308" => "09",
        "329" | "338" => "13",
        "200" => "11",
        _ => "02",
    };
    let suffix = if is_day { 'd' } else { 'n' };
    format!("{base}{suffix}")
}
