use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Payload for `POST /api/citations`, built from the citation form.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewCitation {
    pub doi: String,
    pub source_title: String,
    pub source_type: String,
    pub authors: String,
    pub ai_model: String,
    pub context: String,
    /// `None` when the form value is not a number; serialized as `null`.
    pub contribution_score: Option<f64>,
}

/// Reply to a citation submission. Only `status == "success"` counts as logged.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitResponse {
    pub status: String,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub citation_id: Option<String>,
}

impl SubmitResponse {
    pub fn is_success(&self) -> bool {
        self.status == "success"
    }
}

/// A logged citation event as returned by `GET /api/citations`.
///
/// Text fields are optional because the backend stores whatever the caller sent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub source_title: Option<String>,
    #[serde(default)]
    pub source_type: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default)]
    pub ai_model: Option<String>,
    #[serde(default)]
    pub context: Option<String>,
    #[serde(default)]
    pub contribution_score: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CitationList {
    #[serde(default)]
    pub citations: Vec<Citation>,
}

/// Dashboard counters from `GET /api/stats`.
///
/// Counters are kept as raw JSON and displayed as sent, so a float or string counter
/// still renders. Absent or null counters read as 0.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsSummary {
    #[serde(default)]
    pub total_citations: Option<Value>,
    #[serde(default)]
    pub unique_sources: Option<Value>,
    #[serde(default)]
    pub unique_models: Option<Value>,
    #[serde(default)]
    pub unique_researchers: Option<Value>,
}

/// Display text for one counter: strings as-is, other values in JSON notation, 0 for null.
pub fn counter_text(counter: Option<&Value>) -> String {
    match counter {
        None | Some(Value::Null) => "0".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

/// Text fields are optional: the registry echoes whatever was logged, `null` included.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopCitedWork {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Option<String>,
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub doi: Option<String>,
    #[serde(default)]
    pub citation_count: u64,
    #[serde(default)]
    pub aicif_score: f64,
}

/// `GET /api/stats/top-cited` body. The registry names the list `top_cited`,
/// older deployments `citations`; both are accepted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TopCitedList {
    #[serde(default, alias = "top_cited")]
    pub citations: Vec<TopCitedWork>,
}

/// Payload for `POST /demo/feature-contributions`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalyzeRequest {
    pub dataset_id: String,
    pub model_id: String,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureContribution {
    pub feature: String,
    pub value: f64,
    #[serde(default)]
    pub doi: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContributionList {
    #[serde(default)]
    pub contributions: Vec<FeatureContribution>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_citation_serializes_score_as_number() {
        let citation = NewCitation {
            doi: "10.1038/s41586-023-05782-3".to_string(),
            source_title: "Climate".to_string(),
            source_type: "journal_article".to_string(),
            authors: "Smith et al.".to_string(),
            ai_model: "GPT-4".to_string(),
            context: "query".to_string(),
            contribution_score: Some(0.95),
        };
        let json = serde_json::to_value(&citation).unwrap();
        assert_eq!(json["contribution_score"], serde_json::json!(0.95));
        assert!(json["contribution_score"].is_f64());
    }

    #[test]
    fn unparseable_score_serializes_as_null() {
        let citation = NewCitation {
            doi: String::new(),
            source_title: String::new(),
            source_type: String::new(),
            authors: String::new(),
            ai_model: String::new(),
            context: String::new(),
            contribution_score: None,
        };
        let json = serde_json::to_value(&citation).unwrap();
        assert!(json["contribution_score"].is_null());
    }

    #[test]
    fn stats_tolerate_missing_and_null_counters() {
        let stats: StatsSummary =
            serde_json::from_str(r#"{"total_citations": 42, "unique_sources": null}"#).unwrap();
        assert_eq!(counter_text(stats.total_citations.as_ref()), "42");
        assert_eq!(counter_text(stats.unique_sources.as_ref()), "0");
        assert_eq!(counter_text(stats.unique_models.as_ref()), "0");
    }

    #[test]
    fn stats_keep_non_integer_counters_verbatim() {
        let stats: StatsSummary = serde_json::from_str(
            r#"{"total_citations": 42.0, "unique_sources": -1, "unique_models": "3"}"#,
        )
        .unwrap();
        assert_eq!(counter_text(stats.total_citations.as_ref()), "42.0");
        assert_eq!(counter_text(stats.unique_sources.as_ref()), "-1");
        assert_eq!(counter_text(stats.unique_models.as_ref()), "3");
    }

    #[test]
    fn top_cited_tolerates_null_text_fields() {
        let body = r#"{"top_cited": [
            {"title": "T", "authors": null, "type": null, "doi": null,
             "citation_count": 2, "aicif_score": 0.4}
        ]}"#;
        let list: TopCitedList = serde_json::from_str(body).unwrap();
        let work = &list.citations[0];
        assert_eq!(work.title.as_deref(), Some("T"));
        assert!(work.authors.is_none());
        assert!(work.kind.is_none());
        assert_eq!(work.citation_count, 2);
    }

    #[test]
    fn top_cited_accepts_registry_key() {
        let body = r#"{"status": "success", "top_cited": [
            {"title": "Ocean acidification", "authors": "Johnson", "type": "journal_article",
             "doi": "10.1126/science.abd4896", "citation_count": 3, "aicif_score": 0.72}
        ]}"#;
        let list: TopCitedList = serde_json::from_str(body).unwrap();
        assert_eq!(list.citations.len(), 1);
        assert_eq!(list.citations[0].kind.as_deref(), Some("journal_article"));
        assert_eq!(list.citations[0].citation_count, 3);
    }

    #[test]
    fn citation_ignores_backend_bookkeeping_fields() {
        let body = r#"{"citation_id": "abc", "timestamp": "2024-01-01T00:00:00",
                       "doi": "10.1/x", "contribution_score": 0.81}"#;
        let citation: Citation = serde_json::from_str(body).unwrap();
        assert_eq!(citation.doi.as_deref(), Some("10.1/x"));
        assert!(citation.authors.is_none());
    }

    #[test]
    fn submit_status_must_be_exactly_success() {
        let ok: SubmitResponse = serde_json::from_str(r#"{"status": "success"}"#).unwrap();
        let err: SubmitResponse =
            serde_json::from_str(r#"{"status": "error", "message": "Missing required field: doi"}"#)
                .unwrap();
        assert!(ok.is_success());
        assert!(!err.is_success());
        assert_eq!(err.message.as_deref(), Some("Missing required field: doi"));
    }
}
