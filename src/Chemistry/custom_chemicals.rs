//! # Custom Chemicals Module
//!
//! ## Purpose
//! Users may invent a chemical that is not in the catalog. Attributes they leave
//! blank are filled from an AI suggestion when an advisor is available, and from
//! fixed defaults otherwise (`#cccccc`, liquid, pH 7).
//!
//! ## Main Data Structures and Logic
//! - `CustomChemicalRequest`: what the user typed (only the name is required)
//! - `ChemicalAdvisor`: trait for the free-text AI collaborator (dependency injection,
//!   tests plug in canned answers)
//! - `Suggestion`: attributes recovered from the advisor's answer
//! - `GenerativeAdvisor`: blocking HTTP client for a `generateContent` style API
//!
//! ## Parsing Policy
//! The advisor answer is untrusted text. `parse_suggestion` first looks for a JSON
//! object anywhere in the text, then falls back to `key: value` lines. Each field is
//! validated on its own: a bad colour does not discard a good formula. When nothing
//! usable is found the request still succeeds with defaults.
//!
//! ## Usage
//! ```rust, ignore
//! let advisor = GenerativeAdvisor::new(api_key, "gemini-1.5-flash")?;
//! let chemical = synthesize(&CustomChemicalRequest::named("Glowing Goo"), Some(&advisor));
//! ```

use super::chemicals::{Chemical, PhysicalState};
use super::color::Rgb;
use super::formula::looks_like_formula;
use log::{info, warn};
use regex::Regex;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::OnceLock;
use thiserror::Error;
use url::Url;

pub const DEFAULT_CUSTOM_COLOR: Rgb = Rgb::new(0xcc, 0xcc, 0xcc);
pub const DEFAULT_CUSTOM_STATE: PhysicalState = PhysicalState::Liquid;
pub const DEFAULT_CUSTOM_PH: f64 = 7.0;

const GENERATIVE_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models/";

#[derive(Debug, Error)]
pub enum AdvisorError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),
    #[error("Advisor returned no text")]
    EmptyResponse,
    #[error("Advisor answer could not be parsed: {0}")]
    Unparseable(String),
}

/// Source of free-text suggestions for a chemical name
pub trait ChemicalAdvisor {
    fn suggest(&self, name: &str) -> Result<String, AdvisorError>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomChemicalRequest {
    pub name: String,
    pub formula: Option<String>,
    pub color: Option<String>,
    pub state: Option<PhysicalState>,
    pub ph: Option<f64>,
}

impl CustomChemicalRequest {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn needs_advice(&self) -> bool {
        self.formula.is_none() || self.color.is_none() || self.state.is_none() || self.ph.is_none()
    }
}

/// Attributes recovered from an advisor answer; every field is optional
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Suggestion {
    pub formula: Option<String>,
    pub color: Option<Rgb>,
    pub state: Option<PhysicalState>,
    pub ph: Option<f64>,
}

impl Suggestion {
    pub fn is_empty(&self) -> bool {
        self.formula.is_none() && self.color.is_none() && self.state.is_none() && self.ph.is_none()
    }
}

fn json_object_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)\{.*\}").expect("static regex"))
}

fn key_value_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?im)^\W*(formula|colou?r|state|ph)\W*\s*[:=]\s*["']?([^"'\n,]+)"#)
            .expect("static regex")
    })
}

fn valid_ph(ph: f64) -> Option<f64> {
    (0.0..=14.0).contains(&ph).then_some(ph)
}

fn valid_formula(formula: &str) -> Option<String> {
    let formula = formula.trim();
    looks_like_formula(formula).then(|| formula.to_string())
}

fn suggestion_from_json(value: &Value) -> Suggestion {
    let text = |key: &str| value.get(key).and_then(Value::as_str).map(str::trim);
    let ph = match value.get("pH").or_else(|| value.get("ph")) {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Suggestion {
        formula: text("formula").and_then(valid_formula),
        color: text("color")
            .or_else(|| text("colour"))
            .and_then(|c| Rgb::from_hex(c).ok()),
        state: text("state").and_then(PhysicalState::parse),
        ph: ph.and_then(valid_ph),
    }
}

fn suggestion_from_lines(text: &str) -> Suggestion {
    let mut suggestion = Suggestion::default();
    for caps in key_value_regex().captures_iter(text) {
        let value = caps[2].trim();
        match caps[1].to_lowercase().as_str() {
            "formula" => suggestion.formula = suggestion.formula.or_else(|| valid_formula(value)),
            "color" | "colour" => {
                suggestion.color = suggestion.color.or_else(|| Rgb::from_hex(value).ok())
            }
            "state" => suggestion.state = suggestion.state.or_else(|| PhysicalState::parse(value)),
            "ph" => {
                suggestion.ph = suggestion
                    .ph
                    .or_else(|| value.parse::<f64>().ok().and_then(valid_ph))
            }
            _ => {}
        }
    }
    suggestion
}

/// Extracts chemical attributes from an advisor's free-text answer.
pub fn parse_suggestion(text: &str) -> Result<Suggestion, AdvisorError> {
    if let Some(found) = json_object_regex().find(text) {
        if let Ok(value) = serde_json::from_str::<Value>(found.as_str()) {
            let suggestion = suggestion_from_json(&value);
            if !suggestion.is_empty() {
                return Ok(suggestion);
            }
        }
    }
    let suggestion = suggestion_from_lines(text);
    if suggestion.is_empty() {
        return Err(AdvisorError::Unparseable(text.chars().take(80).collect()));
    }
    Ok(suggestion)
}

/// Builds a custom chemical: user value, then advisor value, then default.
/// Advisor failures never fail the request.
pub fn synthesize(
    request: &CustomChemicalRequest,
    advisor: Option<&dyn ChemicalAdvisor>,
) -> Chemical {
    let suggestion = match advisor {
        Some(advisor) if request.needs_advice() => advisor
            .suggest(&request.name)
            .and_then(|answer| parse_suggestion(&answer))
            .unwrap_or_else(|e| {
                warn!("No usable suggestion for '{}': {}", request.name, e);
                Suggestion::default()
            }),
        _ => Suggestion::default(),
    };

    let user_color = request.color.as_deref().and_then(|c| match Rgb::from_hex(c) {
        Ok(rgb) => Some(rgb),
        Err(e) => {
            warn!("Ignoring user colour for '{}': {}", request.name, e);
            None
        }
    });
    let name = request.name.trim();

    let chemical = Chemical {
        id: format!("custom-{}", uuid::Uuid::new_v4()),
        name: name.to_string(),
        formula: request
            .formula
            .clone()
            .or(suggestion.formula)
            .unwrap_or_else(|| name.to_string()),
        color: user_color.or(suggestion.color).unwrap_or(DEFAULT_CUSTOM_COLOR),
        state: request.state.or(suggestion.state).unwrap_or(DEFAULT_CUSTOM_STATE),
        ph: Some(
            request
                .ph
                .and_then(valid_ph)
                .or(suggestion.ph)
                .unwrap_or(DEFAULT_CUSTOM_PH),
        ),
        flammability: None,
        custom: true,
    };
    info!(
        "Synthesized custom chemical '{}' ({}, {}, {})",
        chemical.name,
        chemical.formula,
        chemical.color,
        chemical.state.as_str()
    );
    chemical
}

/// Advisor backed by a generative language API (`models/{model}:generateContent`).
pub struct GenerativeAdvisor {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl GenerativeAdvisor {
    pub fn new(api_key: &str, model: &str) -> Result<Self, AdvisorError> {
        let endpoint = Url::parse(GENERATIVE_API_BASE)?.join(&format!("./{}:generateContent", model))?;
        Ok(Self::with_endpoint(Client::new(), endpoint, api_key))
    }

    pub fn with_endpoint(client: Client, endpoint: Url, api_key: &str) -> Self {
        Self {
            client,
            endpoint,
            api_key: api_key.to_string(),
        }
    }

    fn prompt(name: &str) -> String {
        format!(
            "Suggest properties for a chemical called \"{}\" for a virtual school lab. \
             Answer with a single JSON object with keys \"formula\" (plain text, digits not subscripted), \
             \"color\" (#rrggbb), \"state\" (solid, liquid or gas) and \"pH\" (number 0-14).",
            name
        )
    }
}

impl ChemicalAdvisor for GenerativeAdvisor {
    fn suggest(&self, name: &str) -> Result<String, AdvisorError> {
        let body = json!({
            "contents": [{ "parts": [{ "text": Self::prompt(name) }] }]
        });
        let response: Value = self
            .client
            .post(self.endpoint.clone())
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()?
            .error_for_status()?
            .json()?;
        response
            .pointer("/candidates/0/content/parts/0/text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .ok_or(AdvisorError::EmptyResponse)
    }
}
