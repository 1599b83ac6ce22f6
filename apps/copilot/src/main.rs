use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use relay::Relay;
use shared::domain::GraphName;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;
mod controller;
mod terminal;
mod ui;

use controller::{
    events::{Button, Field, UiEvent},
    presenter::Presenter,
};

/// Terminal popup for searching and querying Logseq graphs through the
/// local Logseq HTTP server.
#[derive(Parser, Debug)]
#[command(name = "copilot", version)]
struct Args {
    /// Base URL of the Logseq HTTP server.
    #[arg(long)]
    server_url: Option<String>,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check whether the server is reachable.
    Health,
    /// List graphs known to the Logseq CLI.
    List,
    /// Show info about one graph.
    Show { graph: String },
    /// Search pages, optionally within one graph.
    Search {
        text: String,
        #[arg(long)]
        graph: Option<String>,
    },
    /// Run a datalog query against a graph.
    Query {
        #[arg(long)]
        graph: String,
        query: String,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let mut settings = config::load_settings()?;
    if let Some(server_url) = args.server_url {
        settings.server_url = server_url;
    }
    let relay = Relay::new(settings.server_url);
    info!(server_url = %relay.base_url(), "using relay endpoint");

    let mut presenter = Presenter::new(relay);

    let Some(command) = args.command else {
        terminal::run_interactive(&mut presenter).await?;
        return Ok(ExitCode::SUCCESS);
    };

    let failed = match command {
        Command::Health => !presenter.check_health().await,
        Command::List => {
            presenter.list_graphs().await;
            presenter.view().results.is_error()
        }
        Command::Show { graph } => {
            select_graph(&mut presenter, &graph);
            presenter.handle(UiEvent::Clicked(Button::ShowGraph)).await;
            presenter.view().results.is_error()
        }
        Command::Search { text, graph } => {
            if let Some(graph) = graph {
                select_graph(&mut presenter, &graph);
            }
            type_into(&mut presenter, Field::Search, text).await;
            presenter.handle(UiEvent::Clicked(Button::Search)).await;
            presenter.view().results.is_error()
        }
        Command::Query { graph, query } => {
            select_graph(&mut presenter, &graph);
            type_into(&mut presenter, Field::Query, query).await;
            presenter.handle(UiEvent::Clicked(Button::Query)).await;
            presenter.view().results.is_error()
        }
    };

    terminal::print_view(presenter.view());
    Ok(if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    })
}

/// One-shot commands name their graph directly; list it as the only option
/// and pick it.
fn select_graph(presenter: &mut Presenter<Relay>, graph: &str) {
    let select = &mut presenter.view_mut().graph_select;
    select.populate(vec![GraphName::from(graph)]);
    select.choose(graph);
}

async fn type_into(presenter: &mut Presenter<Relay>, field: Field, text: String) {
    presenter.handle(UiEvent::InputChanged { field, text }).await;
}
