use super::{PortalService, non_empty};
use crate::ServiceResult;
use crate::error::PortalServiceError;
use error_stack::{Report, ResultExt};
use portal_core::intent::{IntentMatch, IntentMatcher, MAX_SUGGESTIONS, NoIntentMatch};
use portal_core::result::IntentSourceError;
use portal_core::{CatalogRepository, IntentPatternSource, PortalEngine};
use tracing::{debug, error, instrument};

#[derive(Debug)]
pub enum IntentOutcome {
    Matched(IntentMatch),
    NoMatch(NoIntentMatch),
    MissingTranscript,
    /// The rule table could not be read, parsed or compiled.
    PatternsUnavailable(String),
}

impl<T: PortalEngine> PortalService<T> {
    /// `language` is only a hint from the caller and does not affect matching.
    #[instrument(skip(self, transcript), name = "service#match_intent")]
    pub async fn match_intent(
        &self,
        transcript: Option<String>,
        language: Option<String>,
    ) -> ServiceResult<IntentOutcome> {
        let Some(transcript) = non_empty(transcript) else {
            return Ok(IntentOutcome::MissingTranscript);
        };

        let patterns = match self.engine.patterns().load().await {
            Ok(patterns) => patterns,
            Err(report) => return Ok(patterns_unavailable(report)),
        };
        debug!("matching against {} intent patterns", patterns.len());

        let found = match IntentMatcher::new(patterns).first_match(&transcript) {
            Ok(found) => found.cloned(),
            Err(report) => return Ok(patterns_unavailable(report)),
        };

        let catalog = self.engine.catalog();
        match found {
            Some(pattern) => {
                let service = catalog
                    .get(pattern.service_id.clone())
                    .await
                    .change_context(PortalServiceError)?;
                Ok(IntentOutcome::Matched(IntentMatch::new(pattern, service)))
            }
            None => {
                let suggestions = catalog
                    .first_ids(MAX_SUGGESTIONS)
                    .await
                    .change_context(PortalServiceError)?;
                Ok(IntentOutcome::NoMatch(NoIntentMatch::new(suggestions)))
            }
        }
    }
}

fn patterns_unavailable(report: Report<IntentSourceError>) -> IntentOutcome {
    error!("could not use intent patterns: {report:?}");
    IntentOutcome::PatternsUnavailable(report.current_context().to_string())
}
