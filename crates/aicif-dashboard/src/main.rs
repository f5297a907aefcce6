use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use aicif_common::api::ApiClient;
use aicif_dashboard::chart::SvgChartSurface;
use aicif_dashboard::config::Config;
use aicif_dashboard::document::{Field, Slot};
use aicif_dashboard::forms::{Submission, METHOD_GROUP};
use aicif_dashboard::memory::MemoryDocument;
use aicif_dashboard::page::{Page, PageEvent};
use aicif_dashboard::widget::Widget;

/// Headless AIC-IF dashboard: renders the page against a live backend and prints the
/// resulting document slots as JSON.
#[derive(Debug, Parser)]
#[command(name = "aicif-dashboard", version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bootstrap the page and print every slot.
    Snapshot,
    /// Fill in and submit the citation form.
    LogCitation {
        #[arg(long)]
        doi: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "journal_article")]
        source_type: String,
        #[arg(long, default_value = "")]
        authors: String,
        #[arg(long)]
        model: String,
        #[arg(long, default_value = "")]
        context: String,
        /// Contribution score in [0, 1]; anything unparseable is sent as null.
        #[arg(long)]
        score: String,
    },
    /// Submit the analyze form and render the contribution chart.
    Analyze {
        #[arg(long, default_value = "climate_data")]
        dataset: String,
        #[arg(long, default_value = "regression_model")]
        model: String,
        #[arg(long, default_value = "shap")]
        method: String,
    },
}

#[derive(Debug, Serialize)]
struct SlotSnapshot {
    id: &'static str,
    hidden: bool,
    content: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let config = Config::from_env()?;
    info!(
        base_url = %config.api.base_url,
        recent_limit = config.page.recent_limit,
        "dashboard configured"
    );

    let api = ApiClient::new(config.api)?;
    let doc = Arc::new(MemoryDocument::dashboard());
    let surface = Arc::new(SvgChartSurface::new(Arc::clone(&doc)));
    let page = Page::new(Arc::clone(&doc), api, surface, config.page);

    page.bootstrap().await;

    match args.command {
        Command::Snapshot => {}
        Command::LogCitation {
            doi,
            title,
            source_type,
            authors,
            model,
            context,
            score,
        } => {
            for (field, value) in [
                (Field::Doi, doi),
                (Field::SourceTitle, title),
                (Field::SourceType, source_type),
                (Field::Authors, authors),
                (Field::AiModel, model),
                (Field::Context, context),
                (Field::ContributionScore, score),
            ] {
                doc.set_field(field, &value);
            }
            page.dispatch(PageEvent::Submit(Slot::CitationForm)).await;
            info!(state = ?page.widget_state(Widget::CitationSubmit), "citation form submitted");
        }
        Command::Analyze {
            dataset,
            model,
            method,
        } => {
            doc.set_field(Field::Dataset, &dataset);
            doc.set_field(Field::Model, &model);
            doc.set_radio(METHOD_GROUP, &method);
            let outcome = page.submit_analyze_form().await;
            if outcome != Submission::Accepted {
                info!(?outcome, "analysis did not complete");
            }
        }
    }

    let snapshot: Vec<SlotSnapshot> = Slot::ALL
        .into_iter()
        .filter_map(|slot| {
            Some(SlotSnapshot {
                id: slot.id(),
                hidden: doc.is_hidden(slot)?,
                content: doc.content(slot)?,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
