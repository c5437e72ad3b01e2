use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use super::enums::{ComplexityDomain, FactorCode, TimeHorizon};

/// An atomic observation extracted from user input.
///
/// Factors are append-only: once pushed into a factor list they are never
/// edited. Fields are private so the domain always matches the code.
///
/// Serialize-only: persisted lists are read back through [`decode_factors`]
/// or [`deserialize_factors`] so unknown codes are dropped, never fatal.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(into = "RawFactor")]
pub struct Factor {
    code: FactorCode,
    domain: ComplexityDomain,
    confidence: f32,
    time_horizon: Option<TimeHorizon>,
}

impl Factor {
    /// Build a factor; domain and time horizon come from the code.
    pub fn new(code: FactorCode, confidence: f32) -> Self {
        Self {
            code,
            domain: code.domain(),
            confidence: clamp_confidence(confidence),
            time_horizon: code.time_horizon(),
        }
    }

    /// Override the time horizon (e.g. an extractor that read "for months").
    pub fn with_time_horizon(mut self, horizon: TimeHorizon) -> Self {
        self.time_horizon = Some(horizon);
        self
    }

    pub fn code(&self) -> FactorCode {
        self.code
    }

    pub fn domain(&self) -> ComplexityDomain {
        self.domain
    }

    pub fn confidence(&self) -> f32 {
        self.confidence
    }

    pub fn time_horizon(&self) -> Option<TimeHorizon> {
        self.time_horizon
    }
}

/// What selecting a follow-up choice records, applied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FactorWrite {
    pub code: FactorCode,
    pub confidence: f32,
    pub time_horizon: Option<TimeHorizon>,
}

impl FactorWrite {
    pub fn new(code: FactorCode, confidence: f32) -> Self {
        Self {
            code,
            confidence,
            time_horizon: code.time_horizon(),
        }
    }

    pub fn to_factor(&self) -> Factor {
        let factor = Factor::new(self.code, self.confidence);
        match self.time_horizon {
            Some(h) => factor.with_time_horizon(h),
            None => factor,
        }
    }
}

/// Persisted shape of a factor. Codes stay as strings so that a list
/// written by a newer vocabulary can still be read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFactor {
    pub code: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    pub confidence: f32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_horizon: Option<String>,
}

impl From<Factor> for RawFactor {
    fn from(f: Factor) -> Self {
        Self {
            code: f.code.as_str().to_string(),
            domain: Some(f.domain.as_str().to_string()),
            confidence: f.confidence,
            time_horizon: f.time_horizon.map(|h| h.as_str().to_string()),
        }
    }
}

impl TryFrom<RawFactor> for Factor {
    type Error = super::enums::VocabularyError;

    fn try_from(raw: RawFactor) -> Result<Self, Self::Error> {
        let code = FactorCode::parse_code(&raw.code)?;
        let factor = Factor::new(code, raw.confidence);
        // Stored domain is ignored: it is derived from the code.
        Ok(match raw.time_horizon.as_deref().map(str::parse::<TimeHorizon>) {
            Some(Ok(h)) => factor.with_time_horizon(h),
            _ => factor,
        })
    }
}

/// Decode persisted factors, dropping codes this vocabulary does not know.
pub fn decode_factors(raw: Vec<RawFactor>) -> Vec<Factor> {
    raw.into_iter()
        .filter_map(|r| {
            let code = r.code.clone();
            match Factor::try_from(r) {
                Ok(f) => Some(f),
                Err(_) => {
                    tracing::debug!(code = %code, "Ignoring unknown factor code");
                    None
                }
            }
        })
        .collect()
}

/// Parse a JSON array of persisted factors, tolerating unknown codes.
pub fn factors_from_json(json: &str) -> Result<Vec<Factor>, serde_json::Error> {
    let raw: Vec<RawFactor> = serde_json::from_str(json)?;
    Ok(decode_factors(raw))
}

// ---------------------------------------------------------------------------
// Lenient serde helpers for persisted fields
// ---------------------------------------------------------------------------

/// `deserialize_with` for a persisted factor list. Unknown codes are dropped.
pub fn deserialize_factors<'de, D>(deserializer: D) -> Result<Vec<Factor>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<RawFactor>::deserialize(deserializer).map(decode_factors)
}

/// `deserialize_with` for a list of factor codes. Unknown codes are dropped.
pub fn deserialize_codes<'de, D>(deserializer: D) -> Result<Vec<FactorCode>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<String>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .filter_map(|code| match FactorCode::parse_code(&code) {
            Ok(c) => Some(c),
            Err(_) => {
                tracing::debug!(code = %code, "Ignoring unknown factor code");
                None
            }
        })
        .collect())
}

/// `deserialize_with` for an optional closed-vocabulary value.
/// A value this build does not know reads as `None`.
pub fn deserialize_lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.and_then(|value| match value.parse::<T>() {
        Ok(v) => Some(v),
        Err(_) => {
            tracing::debug!(value = %value, "Ignoring unknown vocabulary value");
            None
        }
    }))
}

fn clamp_confidence(value: f32) -> f32 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
