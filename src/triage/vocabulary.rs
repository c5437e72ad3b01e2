//! Grouping predicates over the closed factor vocabulary.
//!
//! Membership checks are set containment: order and repetition of factors
//! never matter.

use crate::models::{ComplexityDomain, Factor, FactorCode};

/// True when any factor's code is in `codes`.
pub fn has_any_factor(factors: &[Factor], codes: &[FactorCode]) -> bool {
    factors.iter().any(|f| codes.contains(&f.code()))
}

/// True when any factor belongs to `domain`.
pub fn has_domain(factors: &[Factor], domain: ComplexityDomain) -> bool {
    factors.iter().any(|f| f.domain() == domain)
}

/// Distinct codes present in `factors` that are also in `codes`, in the
/// order they were first recorded.
pub fn present_codes(factors: &[Factor], codes: &[FactorCode]) -> Vec<FactorCode> {
    let mut out = Vec::new();
    for f in factors {
        let code = f.code();
        if codes.contains(&code) && !out.contains(&code) {
            out.push(code);
        }
    }
    out
}

/// Distinct codes in `factors` belonging to `domain`, first recorded first.
pub fn codes_in_domain(factors: &[Factor], domain: ComplexityDomain) -> Vec<FactorCode> {
    let mut out = Vec::new();
    for f in factors.iter().filter(|f| f.domain() == domain) {
        if !out.contains(&f.code()) {
            out.push(f.code());
        }
    }
    out
}

/// Normalise an extractor-supplied symptom key ("Sore Throat" → "sore_throat").
pub fn normalize_symptom_key(key: &str) -> Option<String> {
    let normalized: String = key
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '-' { '_' } else { c })
        .collect();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

/// Explicit key wins; otherwise the first specific symptom factor's key.
pub fn effective_symptom_key(factors: &[Factor], explicit: Option<&str>) -> Option<String> {
    explicit.and_then(normalize_symptom_key).or_else(|| {
        factors
            .iter()
            .find_map(|f| f.code().symptom_key())
            .map(str::to_string)
    })
}

// ---------------------------------------------------------------------------
// Required categories
// ---------------------------------------------------------------------------

/// What must be known before guidance is well-founded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Duration,
    Severity,
    Progression,
    SymptomIdentity,
    Context,
}

impl Category {
    pub const REQUIRED: [Category; 5] = [
        Category::Duration,
        Category::Severity,
        Category::Progression,
        Category::SymptomIdentity,
        Category::Context,
    ];

    pub fn is_covered(&self, factors: &[Factor], symptom_key: Option<&str>) -> bool {
        match self {
            Self::Duration => has_domain(factors, ComplexityDomain::Duration),
            Self::Severity => has_domain(factors, ComplexityDomain::Severity),
            Self::Progression => has_domain(factors, ComplexityDomain::Trend),
            Self::SymptomIdentity => effective_symptom_key(factors, symptom_key).is_some(),
            Self::Context => has_domain(factors, ComplexityDomain::Context),
        }
    }

    /// Codes in `factors` that fill this category.
    pub fn filling_codes(&self, factors: &[Factor]) -> Vec<FactorCode> {
        match self {
            Self::Duration => codes_in_domain(factors, ComplexityDomain::Duration),
            Self::Severity => codes_in_domain(factors, ComplexityDomain::Severity),
            Self::Progression => codes_in_domain(factors, ComplexityDomain::Trend),
            Self::SymptomIdentity => {
                let mut out = Vec::new();
                for code in factors.iter().map(Factor::code) {
                    if code.symptom_key().is_some() && !out.contains(&code) {
                        out.push(code);
                    }
                }
                out
            }
            Self::Context => codes_in_domain(factors, ComplexityDomain::Context),
        }
    }
}

/// Required categories still unfilled, in probe order.
pub fn missing_categories(factors: &[Factor], symptom_key: Option<&str>) -> Vec<Category> {
    Category::REQUIRED
        .iter()
        .copied()
        .filter(|c| !c.is_covered(factors, symptom_key))
        .collect()
}
