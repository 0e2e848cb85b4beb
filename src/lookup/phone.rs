// Phone validation: one NumVerify call, heuristic report on any failure.

use reqwest::Client;
use serde_json::Value;

use super::{FieldMap, LookupError, LookupResult, geo::get_json, yes_no};
use crate::scoring::phone::{
    CountryData, UNKNOWN_COUNTRY_MESSAGE, country_for, digits_only, heuristic_report,
};

pub const API_SOURCE: &str = "numverify";
pub const HEURISTIC_SOURCE: &str = "heuristic";

#[derive(Clone)]
pub struct PhoneValidator {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl PhoneValidator {
    pub fn new(client: Client, base_url: &str, api_key: Option<String>) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }

    /// Validate a phone number. Only an unresolvable calling code is an
    /// error; provider trouble degrades to the heuristic report.
    pub async fn validate(&self, number: &str) -> Result<LookupResult, LookupError> {
        let number = number.trim();
        if number.is_empty() {
            return Err(LookupError::Validation(
                "Please enter a phone number".to_string(),
            ));
        }
        let country = country_for(number)
            .ok_or_else(|| LookupError::Validation(UNKNOWN_COUNTRY_MESSAGE.to_string()))?;

        let fetched = self.query_api(&digits_only(number)).await;
        Ok(finish(number, &country, fetched))
    }

    async fn query_api(&self, digits: &str) -> Result<FieldMap, LookupError> {
        let Some(api_key) = self.api_key.as_deref() else {
            return Err(LookupError::Unavailable(
                "NumVerify API key not configured".to_string(),
            ));
        };
        let url = format!(
            "{}/api/validate?access_key={}&number={}&country_code=&format=1",
            self.base_url, api_key, digits
        );
        let body = get_json(&self.client, &url).await?;
        parse_numverify_response(&body)
    }
}

fn finish(number: &str, country: &CountryData, fetched: Result<FieldMap, LookupError>) -> LookupResult {
    match fetched {
        Ok(data) => LookupResult {
            data,
            coordinates: None,
            source: API_SOURCE.to_string(),
        },
        Err(e) => {
            tracing::info!(reason = %e, "Phone API unavailable, using heuristic report");
            let mut rng = rand::thread_rng();
            LookupResult {
                data: heuristic_report(number, country, &mut rng),
                coordinates: None,
                source: HEURISTIC_SOURCE.to_string(),
            }
        }
    }
}

/// Normalize a NumVerify `validate` response.
#[doc(hidden)]
pub fn parse_numverify_response(body: &Value) -> Result<FieldMap, LookupError> {
    if body.get("success").and_then(Value::as_bool) == Some(false) {
        let info = body
            .pointer("/error/info")
            .and_then(Value::as_str)
            .unwrap_or("API access failed");
        return Err(LookupError::Provider(info.to_string()));
    }
    if !body.is_object() {
        return Err(LookupError::Parse("expected a JSON object".to_string()));
    }

    let field = |key: &str| body.get(key).cloned().unwrap_or(Value::Null);
    let valid = body.get("valid").and_then(Value::as_bool).unwrap_or(false);

    let mut data = FieldMap::new();
    data.insert("Phone Number", field("international_format"));
    data.insert("Country", field("country_name"));
    data.insert("Country Code", field("country_code"));
    data.insert("Country Prefix", field("country_prefix"));
    data.insert("Carrier", field("carrier"));
    data.insert("Line Type", field("line_type"));
    data.insert("Valid", yes_no(valid));
    data.insert("Local Format", field("local_format"));
    data.insert("International Format", field("international_format"));
    data.insert("Location", field("location"));
    Ok(data)
}
