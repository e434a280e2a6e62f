use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use crate::error::QueryError;

/// Body of a current-weather response.
///
/// The service wraps results in a list even though a query names one
/// location; [`WeatherQueryResult::into_single`] enforces that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherQueryResult {
    pub results: Vec<NowResult>,
}

impl WeatherQueryResult {
    pub fn new(results: Vec<NowResult>) -> Self {
        Self { results }
    }

    /// Unwrap the one result a single-location query must produce.
    pub fn into_single(self) -> Result<NowResult, QueryError> {
        let count = self.results.len();
        if count > 1 {
            return Err(QueryError::ContractViolation { count });
        }
        self.results.into_iter().next().ok_or(QueryError::EmptyResult)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NowResult {
    pub location: Location,
    pub now: Now,
    #[serde(default)]
    pub last_update: Option<DateTime<FixedOffset>>,
}

impl NowResult {
    /// Display rows in fixed order: location, weather, temperature.
    pub fn to_rows(&self) -> Vec<TextRow> {
        vec![
            TextRow::new("Location", self.location.path.clone()),
            TextRow::new("Weather", self.now.text.clone()),
            TextRow::new("Temperature", format!("{}º", self.now.temperature)),
        ]
    }
}

/// Conditions at observation time. The service reports temperature as a
/// string already expressed in the requested unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Now {
    pub text: String,
    #[serde(default)]
    pub code: String,
    pub temperature: String,
}

/// A place known to the weather service. Saved by name the first time a
/// query resolves to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    #[serde(default)]
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub country: String,
    pub path: String,
    #[serde(default)]
    pub timezone: String,
    #[serde(default)]
    pub timezone_offset: String,
}

/// One label/value line of rendered weather.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextRow {
    pub label: String,
    pub value: String,
}

impl TextRow {
    pub fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BODY: &str = r#"{
        "results": [{
            "location": {
                "id": "WX4FBXXFKE4F",
                "name": "Beijing",
                "country": "CN",
                "path": "Beijing,Beijing,China",
                "timezone": "Asia/Shanghai",
                "timezone_offset": "+08:00"
            },
            "now": { "text": "Sunny", "code": "0", "temperature": "30" },
            "last_update": "2017-07-21T15:20:00+08:00"
        }]
    }"#;

    fn result(path: &str, text: &str, temperature: &str) -> NowResult {
        NowResult {
            location: Location {
                id: String::new(),
                name: "x".into(),
                country: String::new(),
                path: path.into(),
                timezone: String::new(),
                timezone_offset: String::new(),
            },
            now: Now {
                text: text.into(),
                code: String::new(),
                temperature: temperature.into(),
            },
            last_update: None,
        }
    }

    #[test]
    fn parses_service_body() {
        let parsed: WeatherQueryResult = serde_json::from_str(BODY).expect("valid body");
        let single = parsed.into_single().expect("one result");

        assert_eq!(single.location.name, "Beijing");
        assert_eq!(single.location.timezone_offset, "+08:00");
        assert_eq!(single.now.temperature, "30");
        assert!(single.last_update.is_some());
    }

    #[test]
    fn rows_are_location_weather_temperature() {
        let rows = result("P", "Sunny", "21").to_rows();

        assert_eq!(
            rows,
            vec![
                TextRow::new("Location", "P"),
                TextRow::new("Weather", "Sunny"),
                TextRow::new("Temperature", "21º"),
            ]
        );
    }

    #[test]
    fn more_than_one_result_is_a_contract_violation() {
        let wrapped = WeatherQueryResult::new(vec![result("a", "b", "1"), result("c", "d", "2")]);
        let err = wrapped.into_single().unwrap_err();

        assert!(matches!(err, QueryError::ContractViolation { count: 2 }));
    }

    #[test]
    fn empty_results_are_rejected() {
        let err = WeatherQueryResult::new(vec![]).into_single().unwrap_err();
        assert!(matches!(err, QueryError::EmptyResult));
    }
}
