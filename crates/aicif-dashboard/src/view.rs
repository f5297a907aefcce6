/// Typed view-models between the wire model and the HTML fragments.
use aicif_common::model::{
    counter_text, Citation, FeatureContribution, StatsSummary, TopCitedWork,
};

use crate::document::Slot;
use crate::markup::{html, Markup};

/// Three-tier bucket shared by list items, static bars and chart bars.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContributionTier {
    Low,
    Medium,
    High,
}

impl ContributionTier {
    /// `>= 0.8` high, `>= 0.5` medium, anything else (NaN included) low.
    pub fn from_score(score: f64) -> Self {
        if score >= 0.8 {
            ContributionTier::High
        } else if score >= 0.5 {
            ContributionTier::Medium
        } else {
            ContributionTier::Low
        }
    }

    pub fn css_class(self) -> &'static str {
        match self {
            ContributionTier::Low => "low-contribution",
            ContributionTier::Medium => "medium-contribution",
            ContributionTier::High => "high-contribution",
        }
    }

    pub fn solid_color(self) -> &'static str {
        match self {
            ContributionTier::Low => "#dc3545",
            ContributionTier::Medium => "#ffc107",
            ContributionTier::High => "#28a745",
        }
    }

    pub fn rgba(self, alpha: f32) -> String {
        let (r, g, b) = match self {
            ContributionTier::Low => (220, 53, 69),
            ContributionTier::Medium => (255, 193, 7),
            ContributionTier::High => (40, 167, 69),
        };
        format!("rgba({r}, {g}, {b}, {alpha})")
    }
}

/// `value * 100` with one decimal, e.g. `0.452 -> "45.2%"`.
pub fn percent_label(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

/// CSS width for a score bar, clamped to 0–100%.
pub fn bar_width(score: f64) -> String {
    let score = if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    };
    percent_label(score)
}

fn non_empty<'a>(value: Option<&'a str>, fallback: &'a str) -> &'a str {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => fallback,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CitationView {
    pub title: String,
    pub authors: String,
    pub source_type: String,
    pub doi: String,
    pub ai_model: String,
    pub score: f64,
    pub tier: ContributionTier,
}

impl From<&Citation> for CitationView {
    fn from(c: &Citation) -> Self {
        let score = c.contribution_score.unwrap_or(0.0);
        Self {
            title: non_empty(c.source_title.as_deref(), "Unknown title").to_string(),
            authors: non_empty(c.authors.as_deref(), "Unknown author").to_string(),
            source_type: non_empty(c.source_type.as_deref(), "journal").to_string(),
            doi: c.doi.clone().unwrap_or_default(),
            ai_model: c.ai_model.clone().unwrap_or_default(),
            score,
            tier: ContributionTier::from_score(score),
        }
    }
}

impl CitationView {
    pub fn to_markup(&self) -> Markup {
        let score = format!("{:.2}", self.score);
        html!(
            r#"<div class="citation-item fade-in"><h5>{}</h5><p class="mb-1">{} - <span class="text-muted">{}</span></p><p class="mb-2 text-muted small">DOI: {}</p><div class="d-flex justify-content-between align-items-center"><span class="text-muted small">Cited by {}</span><span class="contribution-score {}">Score: {}</span></div></div>"#,
            self.title,
            self.authors,
            self.source_type,
            self.doi,
            self.ai_model,
            self.tier.css_class(),
            score,
        )
    }
}

/// Counter texts exactly as the backend sent them.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StatsView {
    pub total_citations: String,
    pub unique_sources: String,
    pub unique_models: String,
    pub unique_researchers: String,
}

impl From<&StatsSummary> for StatsView {
    fn from(s: &StatsSummary) -> Self {
        Self {
            total_citations: counter_text(s.total_citations.as_ref()),
            unique_sources: counter_text(s.unique_sources.as_ref()),
            unique_models: counter_text(s.unique_models.as_ref()),
            unique_researchers: counter_text(s.unique_researchers.as_ref()),
        }
    }
}

impl StatsView {
    pub fn counters(self) -> [(Slot, String); 4] {
        [
            (Slot::TotalCitations, self.total_citations),
            (Slot::UniqueSources, self.unique_sources),
            (Slot::UniqueModels, self.unique_models),
            (Slot::UniqueResearchers, self.unique_researchers),
        ]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TopCitedView {
    pub title: String,
    pub authors: String,
    pub kind: String,
    pub doi: String,
    pub citation_count: u64,
    pub aicif_score: f64,
}

impl From<&TopCitedWork> for TopCitedView {
    fn from(w: &TopCitedWork) -> Self {
        Self {
            title: non_empty(w.title.as_deref(), "Unknown title").to_string(),
            authors: non_empty(w.authors.as_deref(), "Unknown author").to_string(),
            kind: non_empty(w.kind.as_deref(), "journal").to_string(),
            doi: w.doi.clone().unwrap_or_default(),
            citation_count: w.citation_count,
            aicif_score: w.aicif_score,
        }
    }
}

impl TopCitedView {
    pub fn to_markup(&self) -> Markup {
        let count = self.citation_count.to_string();
        let score = format!("{:.2}", self.aicif_score);
        let width = bar_width(self.aicif_score);
        html!(
            r#"<div class="citation-item fade-in"><h5>{}</h5><p class="mb-1">{} - <span class="text-muted">{}</span></p><div class="d-flex justify-content-between align-items-center"><span class="text-muted small">DOI: {}</span><span class="badge bg-primary">{} citations</span></div><div class="mt-2"><small class="text-muted">AIC-IF Score: {}</small><div class="contribution-bar"><div class="contribution-fill" style="width: {}"></div></div></div></div>"#,
            self.title,
            self.authors,
            self.kind,
            self.doi,
            count,
            score,
            width,
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContributionRow {
    pub feature: String,
    pub percent: String,
    pub doi: String,
}

impl From<&FeatureContribution> for ContributionRow {
    fn from(c: &FeatureContribution) -> Self {
        Self {
            feature: c.feature.clone(),
            percent: percent_label(c.value),
            doi: c.doi.clone(),
        }
    }
}

impl ContributionRow {
    pub fn to_markup(&self) -> Markup {
        html!(
            "<tr><td>{}</td><td>{}</td><td>{}</td></tr>",
            self.feature,
            self.percent,
            self.doi,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlertKind {
    Success,
    Danger,
}

impl AlertKind {
    fn css_class(self) -> &'static str {
        match self {
            AlertKind::Success => "alert-success",
            AlertKind::Danger => "alert-danger",
        }
    }
}

pub fn alert(kind: AlertKind, message: &str) -> Markup {
    html!(
        r#"<div class="alert {} alert-dismissible fade show" role="alert">{}<button type="button" class="btn-close" data-bs-dismiss="alert" aria-label="Close"></button></div>"#,
        kind.css_class(),
        message,
    )
}

pub fn placeholder(message: &str) -> Markup {
    html!(r#"<p class="text-center text-muted">{}</p>"#, message)
}

pub fn load_error(message: &str) -> Markup {
    html!(r#"<p class="text-center text-danger">{}</p>"#, message)
}
