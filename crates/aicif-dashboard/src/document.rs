/// Port between the rendering core and whatever hosts the page markup.
///
/// The renderer and controllers never look elements up by raw string id. They address
/// named [`Slot`]s and form [`Field`]s, plus the few generic queries the bootstrap pass
/// needs (class/attribute selection, styles, scrolling). Any DOM binding, or the
/// in-memory document in `memory.rs`, implements [`Document`].
use crate::markup::Markup;

/// Containers the renderer and the form controllers write into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Slot {
    CitationForm,
    AlertContainer,
    RecentCitations,
    DashboardStats,
    TotalCitations,
    UniqueSources,
    UniqueModels,
    UniqueResearchers,
    TopCited,
    AnalyzeForm,
    LoadingIndicator,
    ResultsContainer,
    ErrorMessage,
    ContributionChart,
    ContributionTableBody,
}

impl Slot {
    pub const ALL: [Slot; 15] = [
        Slot::CitationForm,
        Slot::AlertContainer,
        Slot::RecentCitations,
        Slot::DashboardStats,
        Slot::TotalCitations,
        Slot::UniqueSources,
        Slot::UniqueModels,
        Slot::UniqueResearchers,
        Slot::TopCited,
        Slot::AnalyzeForm,
        Slot::LoadingIndicator,
        Slot::ResultsContainer,
        Slot::ErrorMessage,
        Slot::ContributionChart,
        Slot::ContributionTableBody,
    ];

    /// Element id used by the markup layer.
    pub fn id(self) -> &'static str {
        match self {
            Slot::CitationForm => "citation-form",
            Slot::AlertContainer => "alert-container",
            Slot::RecentCitations => "recent-citations",
            Slot::DashboardStats => "dashboard-stats",
            Slot::TotalCitations => "total-citations",
            Slot::UniqueSources => "unique-sources",
            Slot::UniqueModels => "unique-models",
            Slot::UniqueResearchers => "unique-researchers",
            Slot::TopCited => "top-cited",
            Slot::AnalyzeForm => "analyze-form",
            Slot::LoadingIndicator => "loading-indicator",
            Slot::ResultsContainer => "results-container",
            Slot::ErrorMessage => "error-message",
            Slot::ContributionChart => "contribution-chart",
            Slot::ContributionTableBody => "contribution-table-body",
        }
    }
}

/// Form inputs read by the controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Doi,
    SourceTitle,
    SourceType,
    Authors,
    AiModel,
    Context,
    ContributionScore,
    Dataset,
    Model,
}

impl Field {
    pub const CITATION_FORM: [Field; 7] = [
        Field::Doi,
        Field::SourceTitle,
        Field::SourceType,
        Field::Authors,
        Field::AiModel,
        Field::Context,
        Field::ContributionScore,
    ];

    pub const ANALYZE_FORM: [Field; 2] = [Field::Dataset, Field::Model];

    pub fn id(self) -> &'static str {
        match self {
            Field::Doi => "doi",
            Field::SourceTitle => "source_title",
            Field::SourceType => "source_type",
            Field::Authors => "authors",
            Field::AiModel => "ai_model",
            Field::Context => "context",
            Field::ContributionScore => "contribution_score",
            Field::Dataset => "dataset",
            Field::Model => "model",
        }
    }

    /// Fields cleared when `form` is reset.
    pub fn of_form(form: Slot) -> &'static [Field] {
        match form {
            Slot::CitationForm => &Self::CITATION_FORM,
            Slot::AnalyzeForm => &Self::ANALYZE_FORM,
            _ => &[],
        }
    }
}

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selector {
    Id(String),
    Class(String),
    Attr { name: String, value: String },
}

impl Selector {
    pub fn id(id: impl Into<String>) -> Self {
        Selector::Id(id.into())
    }

    pub fn class(class: impl Into<String>) -> Self {
        Selector::Class(class.into())
    }

    pub fn attr(name: impl Into<String>, value: impl Into<String>) -> Self {
        Selector::Attr {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollBehavior {
    Smooth,
    Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetKind {
    Tooltip,
    Popover,
}

pub trait Document: Send + Sync {
    fn has_slot(&self, slot: Slot) -> bool;

    /// Replace the slot's children with `html`. Missing slots are ignored.
    fn replace_html(&self, slot: Slot, html: &Markup);

    /// Replace the slot's text content. Missing slots are ignored.
    fn set_text(&self, slot: Slot, text: &str);

    fn set_hidden(&self, slot: Slot, hidden: bool);

    fn reset_form(&self, form: Slot);

    fn field_value(&self, field: Field) -> Option<String>;

    /// Value of the checked radio button in `group`, if any.
    fn checked_value(&self, group: &str) -> Option<String>;

    fn select(&self, selector: &Selector) -> Vec<NodeId>;

    fn first_descendant(&self, parent: NodeId, selector: &Selector) -> Option<NodeId>;

    fn attribute(&self, node: NodeId, name: &str) -> Option<String>;

    fn text_content(&self, node: NodeId) -> String;

    fn set_text_content(&self, node: NodeId, text: &str);

    fn set_style(&self, node: NodeId, property: &str, value: &str);

    fn offset_top(&self, node: NodeId) -> Option<f64>;

    fn scroll_to(&self, top: f64, behavior: ScrollBehavior);

    fn attach_widget(&self, node: NodeId, kind: WidgetKind);
}
