/// Citation and analyze form controllers.
use aicif_common::api::FetchError;
use aicif_common::model::{AnalyzeRequest, NewCitation, SubmitResponse};
use tracing::{error, info, warn};

use crate::document::{Document, Field, Slot};
use crate::page::{log_stale, Page};
use crate::view::AlertKind;
use crate::widget::{Widget, WidgetState};

pub const CITATION_LOGGED: &str = "Citation logged successfully!";
pub const CITATION_FAILED: &str = "Error logging citation. Please try again.";

pub const METHOD_GROUP: &str = "method";
pub const DEFAULT_METHOD: &str = "shap";

/// Outcome of a form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Submission {
    /// The backend accepted the request and the page was updated.
    Accepted,
    /// The backend answered with a non-success status.
    Rejected,
    /// Transport or decoding failure.
    Failed,
    /// A newer submission of the same form finished first.
    Superseded,
}

/// Parse a form score the way a number input is read: trimmed, finite, else `None`.
pub fn parse_score(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

pub fn read_citation_form<D: Document + ?Sized>(doc: &D) -> NewCitation {
    let value = |field: Field| doc.field_value(field).unwrap_or_default();
    NewCitation {
        doi: value(Field::Doi),
        source_title: value(Field::SourceTitle),
        source_type: value(Field::SourceType),
        authors: value(Field::Authors),
        ai_model: value(Field::AiModel),
        context: value(Field::Context),
        contribution_score: parse_score(&value(Field::ContributionScore)),
    }
}

pub fn read_analyze_form<D: Document + ?Sized>(doc: &D) -> AnalyzeRequest {
    AnalyzeRequest {
        dataset_id: doc.field_value(Field::Dataset).unwrap_or_default(),
        model_id: doc.field_value(Field::Model).unwrap_or_default(),
        method: doc
            .checked_value(METHOD_GROUP)
            .unwrap_or_else(|| DEFAULT_METHOD.to_string()),
    }
}

impl<D: Document> Page<D> {
    /// Log the citation currently entered in the citation form.
    ///
    /// On success the form is reset and the recent-citations list reloaded. On any
    /// failure the form keeps its values.
    pub async fn submit_citation_form(&self) -> Submission {
        let citation = read_citation_form(self.doc.as_ref());
        if citation.contribution_score.is_none() {
            warn!(doi = %citation.doi, "contribution score is not a number, sending null");
        }

        let token = self.tracker.begin(Widget::CitationSubmit);
        let reply = self
            .api
            .log_citation(&citation)
            .await
            .or_else(rejection_from_status);
        let outcome = match reply {
            Ok(reply) if reply.is_success() => {
                let applied = self.tracker.settle(token, WidgetState::Populated, || {
                    self.renderer.render_alert(AlertKind::Success, CITATION_LOGGED);
                    self.doc.reset_form(Slot::CitationForm);
                });
                if applied {
                    info!(citation_id = ?reply.citation_id, "citation logged");
                }
                (applied, Submission::Accepted)
            }
            Ok(reply) => {
                let message = reply
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| CITATION_FAILED.to_string());
                error!(status = %reply.status, message = %message, "citation rejected");
                let applied = self.tracker.settle(token, WidgetState::Error, || {
                    self.renderer.render_alert(AlertKind::Danger, &message)
                });
                (applied, Submission::Rejected)
            }
            Err(e) => {
                error!(error = %e, "error logging citation");
                let applied = self.tracker.settle(token, WidgetState::Error, || {
                    self.renderer.render_alert(AlertKind::Danger, CITATION_FAILED)
                });
                (applied, Submission::Failed)
            }
        };

        match outcome {
            (false, _) => {
                log_stale(token, false);
                Submission::Superseded
            }
            (true, Submission::Accepted) => {
                self.load_recent_citations().await;
                Submission::Accepted
            }
            (true, other) => other,
        }
    }

    /// Request feature contributions for the analyze form and chart them.
    pub async fn submit_analyze_form(&self) -> Submission {
        let request = read_analyze_form(self.doc.as_ref());
        let token = self.tracker.begin(Widget::Contributions);

        self.doc.set_hidden(Slot::LoadingIndicator, false);
        self.doc.set_hidden(Slot::ResultsContainer, true);
        self.doc.set_hidden(Slot::ErrorMessage, true);

        let (applied, outcome) = match self.api.feature_contributions(&request).await {
            Ok(list) => {
                let applied = self.tracker.settle(token, WidgetState::Populated, || {
                    self.doc.set_hidden(Slot::LoadingIndicator, true);
                    self.doc.set_hidden(Slot::ResultsContainer, false);
                    self.renderer.render_contribution_chart(&list.contributions);
                });
                (applied, Submission::Accepted)
            }
            Err(e) => {
                error!(
                    error = %e,
                    dataset = %request.dataset_id,
                    model = %request.model_id,
                    "error fetching feature contributions"
                );
                let applied = self.tracker.settle(token, WidgetState::Error, || {
                    self.doc.set_hidden(Slot::LoadingIndicator, true);
                    self.doc.set_hidden(Slot::ErrorMessage, false);
                });
                (applied, Submission::Failed)
            }
        };

        if applied {
            outcome
        } else {
            log_stale(token, false);
            Submission::Superseded
        }
    }
}

/// An error status whose body is itself a non-success reply carrying a message.
fn rejection_from_status(e: FetchError) -> Result<SubmitResponse, FetchError> {
    let parsed = match &e {
        FetchError::Status { body, .. } => serde_json::from_str::<SubmitResponse>(body).ok(),
        _ => None,
    };
    match parsed {
        Some(reply)
            if !reply.is_success() && reply.message.as_deref().is_some_and(|m| !m.is_empty()) =>
        {
            Ok(reply)
        }
        _ => Err(e),
    }
}
