/// The dashboard page ties the document to the API client and the renderer.
///
/// Loaders and controllers take `&self`, so a host may run several of them concurrently.
/// Each widget's response is applied only if it belongs to the latest request for that
/// widget.
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use aicif_common::api::ApiClient;
use tracing::{debug, error};

use crate::chart::ChartSurface;
use crate::config::PageSettings;
use crate::document::{Document, NodeId, Slot};
use crate::render::Renderer;
use crate::widget::{RequestToken, Widget, WidgetState, WidgetTracker};

pub const RECENT_LOAD_ERROR: &str = "Error loading citations";
pub const TOP_CITED_LOAD_ERROR: &str = "Error loading top cited works";

/// Events a host forwards from the markup layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageEvent {
    Click(NodeId),
    Submit(Slot),
}

/// Handlers registered by the bootstrap pass.
#[derive(Debug, Default)]
pub(crate) struct Wiring {
    pub(crate) scroll_links: HashSet<NodeId>,
    pub(crate) forms: HashSet<Slot>,
}

pub struct Page<D> {
    pub(crate) doc: Arc<D>,
    pub(crate) api: ApiClient,
    pub(crate) renderer: Renderer<D>,
    pub(crate) tracker: WidgetTracker,
    pub(crate) settings: PageSettings,
    wiring: Mutex<Wiring>,
}

impl<D: Document> Page<D> {
    pub fn new(
        doc: Arc<D>,
        api: ApiClient,
        chart_surface: Arc<dyn ChartSurface>,
        settings: PageSettings,
    ) -> Self {
        let renderer = Renderer::new(Arc::clone(&doc), chart_surface);
        Self {
            doc,
            api,
            renderer,
            tracker: WidgetTracker::new(),
            settings,
            wiring: Mutex::new(Wiring::default()),
        }
    }

    pub fn document(&self) -> &D {
        &self.doc
    }

    pub fn widget_state(&self, widget: Widget) -> WidgetState {
        self.tracker.state(widget)
    }

    /// Route a host event. Returns `true` when the default browser action is cancelled.
    pub async fn dispatch(&self, event: PageEvent) -> bool {
        match event {
            PageEvent::Click(node) => {
                if !self.wiring().scroll_links.contains(&node) {
                    return false;
                }
                self.scroll_to_target(node);
                true
            }
            PageEvent::Submit(form) => {
                if !self.wiring().forms.contains(&form) {
                    return false;
                }
                match form {
                    Slot::CitationForm => {
                        self.submit_citation_form().await;
                    }
                    Slot::AnalyzeForm => {
                        self.submit_analyze_form().await;
                    }
                    _ => return false,
                }
                true
            }
        }
    }

    pub async fn load_recent_citations(&self) {
        if !self.doc.has_slot(Slot::RecentCitations) {
            return;
        }
        let token = self.tracker.begin(Widget::RecentCitations);
        let applied = match self.api.recent_citations(self.settings.recent_limit).await {
            Ok(list) => self.tracker.settle(token, WidgetState::Populated, || {
                self.renderer.render_recent_citations(&list.citations)
            }),
            Err(e) => {
                error!(error = %e, "error fetching recent citations");
                self.tracker.settle(token, WidgetState::Error, || {
                    self.renderer
                        .render_load_error(Slot::RecentCitations, RECENT_LOAD_ERROR)
                })
            }
        };
        log_stale(token, applied);
    }

    pub async fn load_stats(&self) {
        if !self.doc.has_slot(Slot::DashboardStats) {
            return;
        }
        let token = self.tracker.begin(Widget::Stats);
        let applied = match self.api.stats().await {
            Ok(summary) => self.tracker.settle(token, WidgetState::Populated, || {
                self.renderer.render_stats(&summary)
            }),
            Err(e) => {
                error!(error = %e, "error fetching dashboard stats");
                self.tracker.settle(token, WidgetState::Error, || {})
            }
        };
        log_stale(token, applied);
    }

    pub async fn load_top_cited(&self) {
        if !self.doc.has_slot(Slot::TopCited) {
            return;
        }
        let token = self.tracker.begin(Widget::TopCited);
        let applied = match self.api.top_cited().await {
            Ok(list) => self.tracker.settle(token, WidgetState::Populated, || {
                self.renderer.render_top_cited(&list.citations)
            }),
            Err(e) => {
                error!(error = %e, "error fetching top cited works");
                self.tracker.settle(token, WidgetState::Error, || {
                    self.renderer
                        .render_load_error(Slot::TopCited, TOP_CITED_LOAD_ERROR)
                })
            }
        };
        log_stale(token, applied);
    }

    pub(crate) fn wiring(&self) -> MutexGuard<'_, Wiring> {
        self.wiring.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub(crate) fn log_stale(token: RequestToken, applied: bool) {
    if !applied {
        debug!(
            widget = ?token.widget(),
            seq = token.seq(),
            "dropping superseded response"
        );
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use aicif_common::api::ApiClientConfig;
    use axum::extract::State;
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::{Json, Router};
    use serde_json::json;

    use crate::chart::tests::CountingSurface;
    use crate::memory::MemoryDocument;

    pub(crate) async fn serve(app: Router) -> ApiClient {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        ApiClient::new(ApiClientConfig::with_base_url(format!("http://{addr}"))).unwrap()
    }

    pub(crate) fn page(doc: MemoryDocument, api: ApiClient) -> Page<MemoryDocument> {
        Page::new(
            Arc::new(doc),
            api,
            Arc::new(CountingSurface::default()),
            PageSettings::default(),
        )
    }

    #[tokio::test]
    async fn stats_with_missing_counters_render_zero() {
        let app = Router::new().route(
            "/api/stats",
            get(|| async { Json(json!({"total_citations": 42, "unique_sources": 7})) }),
        );
        let page = page(MemoryDocument::dashboard(), serve(app).await);
        page.load_stats().await;

        let doc = page.document();
        let counters: Vec<String> = [
            Slot::TotalCitations,
            Slot::UniqueSources,
            Slot::UniqueModels,
            Slot::UniqueResearchers,
        ]
        .into_iter()
        .map(|s| doc.content(s).unwrap())
        .collect();
        assert_eq!(counters, vec!["42", "7", "0", "0"]);
        assert_eq!(page.widget_state(Widget::Stats), WidgetState::Populated);
    }

    #[tokio::test]
    async fn stats_render_float_counters_verbatim() {
        let app = Router::new().route(
            "/api/stats",
            get(|| async { Json(json!({"total_citations": 42.0, "unique_models": "12"})) }),
        );
        let page = page(MemoryDocument::dashboard(), serve(app).await);
        page.load_stats().await;

        let doc = page.document();
        assert_eq!(doc.content(Slot::TotalCitations).unwrap(), "42.0");
        assert_eq!(doc.content(Slot::UniqueModels).unwrap(), "12");
        assert_eq!(page.widget_state(Widget::Stats), WidgetState::Populated);
    }

    #[tokio::test]
    async fn recent_citation_without_authors_renders_fallback() {
        let app = Router::new().route(
            "/api/citations",
            get(|| async {
                Json(json!({"status": "success", "count": 1, "citations": [
                    {"doi": "10.1126/science.abd4896", "source_title": "Ocean acidification",
                     "ai_model": "GPT-4", "contribution_score": 0.81}
                ]}))
            }),
        );
        let page = page(MemoryDocument::dashboard(), serve(app).await);
        page.load_recent_citations().await;

        let html = page.document().content(Slot::RecentCitations).unwrap();
        assert!(html.contains("Unknown author"));
        assert!(html.contains("high-contribution"));
        assert!(html.contains("Score: 0.81"));
    }

    #[tokio::test]
    async fn failed_list_loads_render_error_placeholders() {
        let app = Router::new()
            .route("/api/citations", get(|| async { StatusCode::INTERNAL_SERVER_ERROR }))
            .route("/api/stats/top-cited", get(|| async { "not json" }));
        let page = page(MemoryDocument::dashboard(), serve(app).await);
        page.load_recent_citations().await;
        page.load_top_cited().await;

        let doc = page.document();
        assert!(doc.content(Slot::RecentCitations).unwrap().contains(RECENT_LOAD_ERROR));
        assert!(doc.content(Slot::TopCited).unwrap().contains(TOP_CITED_LOAD_ERROR));
        assert_eq!(page.widget_state(Widget::RecentCitations), WidgetState::Error);
        assert_eq!(page.widget_state(Widget::TopCited), WidgetState::Error);
    }

    #[tokio::test]
    async fn failed_stats_load_leaves_counters_untouched() {
        let app = Router::new().route("/api/stats", get(|| async { StatusCode::BAD_GATEWAY }));
        let page = page(MemoryDocument::dashboard(), serve(app).await);
        page.load_stats().await;
        assert_eq!(page.document().content(Slot::TotalCitations).unwrap(), "");
        assert_eq!(page.widget_state(Widget::Stats), WidgetState::Error);
    }

    #[tokio::test]
    async fn top_cited_reads_registry_shape() {
        let app = Router::new().route(
            "/api/stats/top-cited",
            get(|| async {
                Json(json!({"status": "success", "top_cited": [
                    {"title": "Sea level rise prediction models", "authors": "Garcia et al.",
                     "type": "journal_article", "doi": "10.1029/2021GL094771",
                     "citation_count": 5, "aicif_score": 0.5}
                ]}))
            }),
        );
        let page = page(MemoryDocument::dashboard(), serve(app).await);
        page.load_top_cited().await;
        let html = page.document().content(Slot::TopCited).unwrap();
        assert!(html.contains("Sea level rise prediction models"));
        assert!(html.contains("5 citations"));
        assert!(html.contains("width: 50.0%"));
    }

    #[tokio::test]
    async fn top_cited_with_null_authors_still_renders() {
        let app = Router::new().route(
            "/api/stats/top-cited",
            get(|| async {
                Json(json!({"top_cited": [
                    {"title": "Glacier mass balance", "authors": null, "type": null,
                     "doi": null, "citation_count": 3, "aicif_score": 0.9}
                ]}))
            }),
        );
        let page = page(MemoryDocument::dashboard(), serve(app).await);
        page.load_top_cited().await;

        let html = page.document().content(Slot::TopCited).unwrap();
        assert!(html.contains("Glacier mass balance"));
        assert!(html.contains("Unknown author"));
        assert_eq!(page.widget_state(Widget::TopCited), WidgetState::Populated);
    }

    #[tokio::test]
    async fn superseded_response_does_not_overwrite_newer_one() {
        // The first request is answered slowly with "old", the second immediately with "new".
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/api/citations",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    let title = if hits.fetch_add(1, Ordering::SeqCst) == 0 {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                        "old"
                    } else {
                        "new"
                    };
                    Json(json!({"citations": [
                        {"source_title": title, "contribution_score": 0.9}
                    ]}))
                }),
            )
            .with_state(Arc::clone(&hits));
        let page = page(MemoryDocument::dashboard(), serve(app).await);

        let first = page.load_recent_citations();
        let second = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            page.load_recent_citations().await;
        };
        tokio::join!(first, second);

        let html = page.document().content(Slot::RecentCitations).unwrap();
        assert!(html.contains("<h5>new</h5>"));
        assert!(!html.contains("<h5>old</h5>"));
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn loads_skip_absent_containers() {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route(
                "/api/stats",
                get(|State(hits): State<Arc<AtomicUsize>>| async move {
                    hits.fetch_add(1, Ordering::SeqCst);
                    Json(json!({}))
                }),
            )
            .with_state(Arc::clone(&hits));
        let page = page(MemoryDocument::with_slots([Slot::TopCited]), serve(app).await);
        page.load_stats().await;
        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert_eq!(page.widget_state(Widget::Stats), WidgetState::Idle);
    }
}
