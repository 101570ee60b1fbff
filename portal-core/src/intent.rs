use crate::id::ServiceId;
use crate::model::Service;
use crate::result::{IntentSourceError, RepoResult};
use error_stack::ResultExt;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

pub const MATCH_CONFIDENCE: f64 = 0.9;
pub const NO_MATCH_CONFIDENCE: f64 = 0.0;
pub const MAX_SUGGESTIONS: usize = 3;

/// One rule of the intent mapping file, e.g.
/// `{"match": "welfare|relief", "serviceId": "welfare_relief_2025", "lang": "en"}`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IntentPattern {
    #[serde(rename = "match")]
    pub pattern: String,
    pub service_id: ServiceId,
    #[serde(default)]
    pub lang: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct IntentPatternFile {
    pub patterns: Vec<IntentPattern>,
}

/// The ordered rule table. Rules are compiled as matching reaches them, so a
/// broken rule only fails the lookups that get past every rule before it.
#[derive(Debug)]
pub struct IntentMatcher {
    patterns: Vec<IntentPattern>,
}

impl IntentMatcher {
    pub fn new(patterns: Vec<IntentPattern>) -> Self {
        Self { patterns }
    }

    /// The first rule matching `transcript`, ignoring case.
    pub fn first_match(
        &self,
        transcript: &str,
    ) -> RepoResult<Option<&IntentPattern>, IntentSourceError> {
        let transcript = transcript.to_lowercase();

        for pattern in &self.patterns {
            let regex = compile(&pattern.pattern)?;
            if regex.is_match(&transcript) {
                return Ok(Some(pattern));
            }
        }

        Ok(None)
    }
}

fn compile(pattern: &str) -> RepoResult<Regex, IntentSourceError> {
    RegexBuilder::new(pattern)
        .case_insensitive(true)
        .build()
        .change_context(IntentSourceError::Pattern)
        .attach_with(|| format!("pattern: {pattern}"))
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct IntentMatch {
    pub service_id: ServiceId,
    /// `None` when the rule points at a service missing from the catalog.
    pub service: Option<Service>,
    pub confidence: f64,
    pub language: Option<String>,
    pub matched_pattern: String,
}

impl IntentMatch {
    pub fn new(pattern: IntentPattern, service: Option<Service>) -> Self {
        Self {
            service_id: pattern.service_id,
            service,
            confidence: MATCH_CONFIDENCE,
            language: pattern.lang,
            matched_pattern: pattern.pattern,
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct NoIntentMatch {
    pub confidence: f64,
    /// Catalog order, not ranked.
    pub suggestions: Vec<ServiceId>,
}

impl NoIntentMatch {
    pub fn new(suggestions: Vec<ServiceId>) -> Self {
        Self {
            confidence: NO_MATCH_CONFIDENCE,
            suggestions,
        }
    }
}
