/// Initial pass over the static markup, followed by the first data loads.
use std::fmt::Write;

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone, Utc};
use futures::future::join3;
use tracing::{debug, info, warn};

use crate::document::{Document, NodeId, ScrollBehavior, Selector, Slot, WidgetKind};
use crate::error::AppError;
use crate::forms::parse_score;
use crate::page::Page;
use crate::view::{bar_width, ContributionTier};

const NAIVE_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Reformat a timestamp for display in local time.
///
/// RFC 3339 values keep their offset before conversion. Values without an offset are
/// local wall-clock times, except bare dates, which are midnight UTC.
pub fn format_date(raw: &str, pattern: &str) -> Result<String, AppError> {
    let raw = raw.trim();
    let local = parse_local(raw).ok_or_else(|| AppError::InvalidDate(raw.to_string()))?;

    let mut out = String::new();
    write!(out, "{}", local.format(pattern))
        .map_err(|_| AppError::Config(format!("cannot format date with {pattern:?}")))?;
    Ok(out)
}

fn parse_local(raw: &str) -> Option<DateTime<Local>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Local));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, format) {
            return Local.from_local_datetime(&naive).earliest();
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()?;
    let midnight = date.and_hms_opt(0, 0, 0)?;
    Some(Utc.from_utc_datetime(&midnight).with_timezone(&Local))
}

impl<D: Document> Page<D> {
    /// Wire handlers, decorate static markup and run the read-only loads concurrently.
    pub async fn bootstrap(&self) {
        self.wire_smooth_scroll();
        self.init_widgets();
        self.paint_contribution_bars();
        self.format_dates();
        self.wire_forms();

        join3(
            self.load_recent_citations(),
            self.load_stats(),
            self.load_top_cited(),
        )
        .await;
        info!("dashboard bootstrapped");
    }

    fn wire_smooth_scroll(&self) {
        let links = self.doc.select(&Selector::class("smooth-scroll"));
        debug!(count = links.len(), "wiring smooth-scroll links");
        self.wiring().scroll_links.extend(links);
    }

    fn init_widgets(&self) {
        for (toggle, kind) in [
            ("tooltip", WidgetKind::Tooltip),
            ("popover", WidgetKind::Popover),
        ] {
            for node in self.doc.select(&Selector::attr("data-bs-toggle", toggle)) {
                self.doc.attach_widget(node, kind);
            }
        }
    }

    fn paint_contribution_bars(&self) {
        for bar in self.doc.select(&Selector::class("contribution-bar")) {
            let Some(raw) = self.doc.attribute(bar, "data-score") else {
                continue;
            };
            let Some(score) = parse_score(&raw) else {
                warn!(node = bar, score = %raw, "skipping contribution bar with invalid score");
                continue;
            };
            let Some(fill) = self
                .doc
                .first_descendant(bar, &Selector::class("contribution-fill"))
            else {
                continue;
            };
            self.doc.set_style(fill, "width", &bar_width(score));
            self.doc.set_style(
                fill,
                "background-color",
                ContributionTier::from_score(score).solid_color(),
            );
        }
    }

    fn format_dates(&self) {
        for node in self.doc.select(&Selector::class("format-date")) {
            let raw = self.doc.text_content(node);
            match format_date(&raw, &self.settings.date_format) {
                Ok(text) => self.doc.set_text_content(node, &text),
                Err(e) => warn!(node, error = %e, "leaving date unformatted"),
            }
        }
    }

    fn wire_forms(&self) {
        let mut wiring = self.wiring();
        for form in [Slot::CitationForm, Slot::AnalyzeForm] {
            if self.doc.has_slot(form) {
                wiring.forms.insert(form);
            }
        }
    }

    pub(crate) fn scroll_to_target(&self, link: NodeId) {
        let Some(href) = self.doc.attribute(link, "href") else {
            return;
        };
        let Some(id) = href.strip_prefix('#').filter(|id| !id.is_empty()) else {
            warn!(href = %href, "smooth-scroll link does not point at an anchor");
            return;
        };
        let Some(top) = self
            .doc
            .select(&Selector::id(id))
            .first()
            .and_then(|&target| self.doc.offset_top(target))
        else {
            warn!(href = %href, "smooth-scroll target not found");
            return;
        };
        self.doc
            .scroll_to(top - self.settings.header_offset, ScrollBehavior::Smooth);
    }
}
