/// Contribution bar chart and the handle that owns its single live instance.
use std::sync::Arc;

use aicif_common::model::FeatureContribution;

use crate::document::{Document, Slot};
use crate::markup::{html, Markup};
use crate::view::{percent_label, ContributionTier};

#[derive(Debug, Clone, PartialEq)]
pub struct ChartSpec {
    pub title: String,
    pub dataset_label: String,
    pub x_title: String,
    pub y_title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub fill_colors: Vec<String>,
    pub border_colors: Vec<String>,
    pub tooltips: Vec<String>,
}

impl ChartSpec {
    pub fn contributions(contributions: &[FeatureContribution]) -> Self {
        let tiers: Vec<ContributionTier> = contributions
            .iter()
            .map(|c| ContributionTier::from_score(c.value))
            .collect();
        Self {
            title: "Feature Contribution Analysis".to_string(),
            dataset_label: "Feature Contribution".to_string(),
            x_title: "Feature".to_string(),
            y_title: "Contribution Value".to_string(),
            labels: contributions.iter().map(|c| c.feature.clone()).collect(),
            values: contributions.iter().map(|c| c.value).collect(),
            fill_colors: tiers.iter().map(|t| t.rgba(0.7)).collect(),
            border_colors: tiers.iter().map(|t| t.rgba(1.0)).collect(),
            tooltips: contributions
                .iter()
                .map(|c| format!("Contribution: {}", percent_label(c.value)))
                .collect(),
        }
    }
}

/// Something that can draw a [`ChartSpec`], e.g. a canvas binding.
pub trait ChartSurface: Send + Sync {
    fn draw(&self, spec: &ChartSpec) -> Box<dyn ChartInstance>;
}

/// A drawn chart. `destroy` removes it from the surface.
pub trait ChartInstance: Send {
    fn destroy(&mut self);
}

/// Owns the single live chart instance.
pub struct ChartHandle {
    surface: Arc<dyn ChartSurface>,
    current: Option<Box<dyn ChartInstance>>,
}

impl ChartHandle {
    pub fn new(surface: Arc<dyn ChartSurface>) -> Self {
        Self {
            surface,
            current: None,
        }
    }

    /// Destroy the previous instance (if any) and draw `spec` in its place.
    pub fn redraw(&mut self, spec: &ChartSpec) {
        if let Some(mut previous) = self.current.take() {
            previous.destroy();
        }
        self.current = Some(self.surface.draw(spec));
    }

    pub fn is_attached(&self) -> bool {
        self.current.is_some()
    }
}

impl Drop for ChartHandle {
    fn drop(&mut self) {
        if let Some(mut chart) = self.current.take() {
            chart.destroy();
        }
    }
}

const SVG_WIDTH: f64 = 640.0;
const SVG_HEIGHT: f64 = 320.0;
const SVG_MARGIN: f64 = 40.0;

/// Renders the chart as inline SVG into the `contribution-chart` slot.
pub struct SvgChartSurface<D> {
    doc: Arc<D>,
}

impl<D: Document> SvgChartSurface<D> {
    pub fn new(doc: Arc<D>) -> Self {
        Self { doc }
    }
}

impl<D: Document + 'static> ChartSurface for SvgChartSurface<D> {
    fn draw(&self, spec: &ChartSpec) -> Box<dyn ChartInstance> {
        self.doc.replace_html(Slot::ContributionChart, &svg(spec));
        Box::new(SvgChart {
            doc: Arc::clone(&self.doc),
        })
    }
}

struct SvgChart<D> {
    doc: Arc<D>,
}

impl<D: Document> ChartInstance for SvgChart<D> {
    fn destroy(&mut self) {
        self.doc.replace_html(Slot::ContributionChart, &Markup::empty());
    }
}

fn svg(spec: &ChartSpec) -> Markup {
    let plot_w = SVG_WIDTH - 2.0 * SVG_MARGIN;
    let plot_h = SVG_HEIGHT - 2.0 * SVG_MARGIN;
    let max = spec
        .values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let scale = if max > 0.0 { plot_h / max } else { 0.0 };
    let slot_w = plot_w / spec.values.len().max(1) as f64;

    let bars: Markup = spec
        .values
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let h = if value.is_finite() { (value * scale).max(0.0) } else { 0.0 };
            let x = SVG_MARGIN + i as f64 * slot_w + slot_w * 0.1;
            let y = SVG_MARGIN + plot_h - h;
            let label = spec.labels.get(i).map(String::as_str).unwrap_or_default();
            let fill = spec.fill_colors.get(i).map(String::as_str).unwrap_or_default();
            let stroke = spec.border_colors.get(i).map(String::as_str).unwrap_or_default();
            let tooltip = spec.tooltips.get(i).map(String::as_str).unwrap_or_default();
            html!(
                r#"<g><title>{}: {}</title><rect x="{}" y="{}" width="{}" height="{}" fill="{}" stroke="{}" stroke-width="1"/><text x="{}" y="{}" text-anchor="middle" font-size="10">{}</text></g>"#,
                label,
                tooltip,
                format!("{x:.1}"),
                format!("{y:.1}"),
                format!("{:.1}", slot_w * 0.8),
                format!("{h:.1}"),
                fill,
                stroke,
                format!("{:.1}", x + slot_w * 0.4),
                format!("{:.1}", SVG_HEIGHT - SVG_MARGIN / 2.0),
                label,
            )
        })
        .collect();

    html!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="0 0 {} {}" role="img" aria-label="{}"><text x="{}" y="20" text-anchor="middle" font-weight="bold">{}</text><text x="12" y="{}" transform="rotate(-90 12 {})" text-anchor="middle" font-size="11">{}</text><text x="{}" y="{}" text-anchor="middle" font-size="11">{}</text>{}</svg>"#,
        SVG_WIDTH.to_string(),
        SVG_HEIGHT.to_string(),
        spec.dataset_label,
        format!("{}", SVG_WIDTH / 2.0),
        spec.title,
        format!("{}", SVG_HEIGHT / 2.0),
        format!("{}", SVG_HEIGHT / 2.0),
        spec.y_title,
        format!("{}", SVG_WIDTH / 2.0),
        format!("{}", SVG_HEIGHT - 4.0),
        spec.x_title,
        bars,
    )
}
