/// View renderer: turns API payloads into fragments and writes them into document slots.
///
/// Every operation replaces the slot content wholesale, so rendering the same input twice
/// leaves the same document.
use std::sync::{Arc, Mutex, PoisonError};

use aicif_common::model::{Citation, FeatureContribution, StatsSummary, TopCitedWork};
use tracing::debug;

use crate::chart::{ChartHandle, ChartSpec, ChartSurface};
use crate::document::{Document, Slot};
use crate::markup::Markup;
use crate::view::{
    alert, load_error, placeholder, AlertKind, CitationView, ContributionRow, StatsView,
    TopCitedView,
};

pub const NO_CITATIONS: &str = "No citation events yet";
pub const NO_TOP_CITED: &str = "No citation data available";

pub struct Renderer<D> {
    doc: Arc<D>,
    chart: Mutex<ChartHandle>,
}

impl<D: Document> Renderer<D> {
    pub fn new(doc: Arc<D>, surface: Arc<dyn ChartSurface>) -> Self {
        Self {
            doc,
            chart: Mutex::new(ChartHandle::new(surface)),
        }
    }

    pub fn render_recent_citations(&self, citations: &[Citation]) {
        let html = if citations.is_empty() {
            placeholder(NO_CITATIONS)
        } else {
            citations
                .iter()
                .map(|c| CitationView::from(c).to_markup())
                .collect::<Markup>()
        };
        self.doc.replace_html(Slot::RecentCitations, &html);
    }

    pub fn render_stats(&self, summary: &StatsSummary) {
        for (slot, value) in StatsView::from(summary).counters() {
            self.doc.set_text(slot, &value);
        }
    }

    pub fn render_top_cited(&self, works: &[TopCitedWork]) {
        let html = if works.is_empty() {
            placeholder(NO_TOP_CITED)
        } else {
            works
                .iter()
                .map(|w| TopCitedView::from(w).to_markup())
                .collect::<Markup>()
        };
        self.doc.replace_html(Slot::TopCited, &html);
    }

    /// Redraw the chart and rewrite the results table. No-op for an empty list or a page
    /// without a chart slot.
    pub fn render_contribution_chart(&self, contributions: &[FeatureContribution]) {
        if contributions.is_empty() || !self.doc.has_slot(Slot::ContributionChart) {
            debug!(
                count = contributions.len(),
                "skipping contribution chart render"
            );
            return;
        }

        let spec = ChartSpec::contributions(contributions);
        self.chart
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .redraw(&spec);

        if self.doc.has_slot(Slot::ContributionTableBody) {
            let rows: Markup = contributions
                .iter()
                .map(|c| ContributionRow::from(c).to_markup())
                .collect();
            self.doc.replace_html(Slot::ContributionTableBody, &rows);
        }
    }

    pub fn render_load_error(&self, slot: Slot, message: &str) {
        self.doc.replace_html(slot, &load_error(message));
    }

    pub fn render_alert(&self, kind: AlertKind, message: &str) {
        self.doc.replace_html(Slot::AlertContainer, &alert(kind, message));
    }

    pub fn chart_attached(&self) -> bool {
        self.chart
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_attached()
    }
}
