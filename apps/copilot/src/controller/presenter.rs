//! Binds popup controls to relay actions and renders the outcomes.

use relay::RelayHandle;
use shared::{
    domain::extract_graph_names,
    protocol::{ActionRequest, ActionResponse},
};
use tracing::{debug, warn};

use crate::{
    controller::events::{classify_failure, Button, Field, Key, UiErrorKind, UiEvent},
    ui::{Payload, PopupView, Tone},
};

pub struct Presenter<R> {
    relay: R,
    view: PopupView,
}

impl<R: RelayHandle> Presenter<R> {
    pub fn new(relay: R) -> Self {
        Self {
            relay,
            view: PopupView::default(),
        }
    }

    pub fn view(&self) -> &PopupView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut PopupView {
        &mut self.view
    }

    /// Startup sequence: check server health and list graphs once connected.
    pub async fn initialize(&mut self) -> bool {
        let connected = self.check_health().await;
        if connected {
            self.list_graphs().await;
        }
        connected
    }

    pub async fn handle(&mut self, event: UiEvent) {
        debug!(?event, "ui event");
        match event {
            UiEvent::Clicked(Button::ListGraphs | Button::RefreshGraphs) => self.list_graphs().await,
            UiEvent::Clicked(Button::ShowGraph) => self.show_graph().await,
            UiEvent::Clicked(Button::Search) => self.search().await,
            UiEvent::Clicked(Button::Query) => self.execute_query().await,
            UiEvent::KeyPressed {
                field: Field::Search,
                key: Key::Enter,
                ..
            } => self.search().await,
            UiEvent::KeyPressed {
                field: Field::Query,
                key: Key::Enter,
                modifiers,
            } if modifiers.is_submit_chord() => self.execute_query().await,
            UiEvent::KeyPressed { .. } => {}
            UiEvent::InputChanged { field, text } => match field {
                Field::Search => self.view.search_input = text,
                Field::Query => self.view.query_input = text,
            },
            UiEvent::GraphSelected(value) => {
                if !self.view.graph_select.choose(&value) {
                    warn!(graph = %value, "ignoring selection of unlisted graph");
                }
            }
            UiEvent::CheckHealth => {
                self.check_health().await;
            }
            UiEvent::HideResults => self.view.hide_results(),
        }
    }

    pub async fn check_health(&mut self) -> bool {
        let connected = match self.relay.send(ActionRequest::health()).await {
            Ok(response) => response.is_healthy(),
            Err(error) => {
                warn!(%error, "health check failed");
                false
            }
        };
        self.view.set_connected(connected);
        connected
    }

    pub async fn list_graphs(&mut self) {
        self.view.display("Loading graphs...", Tone::Success);

        match self.relay.send(ActionRequest::list_graphs()).await {
            Ok(response) if response.success => {
                let output = response.stdout.unwrap_or_default();
                self.view
                    .graph_select
                    .populate(extract_graph_names(&output));
                self.view.display(output, Tone::Success);
            }
            Ok(response) => self.display_failure(&response),
            Err(error) => self.view.display_error(
                UiErrorKind::Transport,
                format!("Failed to list graphs: {error}"),
            ),
        }
    }

    pub async fn show_graph(&mut self) {
        let Some(graph) = self.selected_graph() else {
            self.view
                .display_error(UiErrorKind::Validation, "Please select a graph");
            return;
        };

        self.view.display("Loading graph info...", Tone::Success);

        match self.relay.send(ActionRequest::show_graph(graph)).await {
            Ok(response) if response.success => {
                let text = response.present_stdout().unwrap_or("No graph info");
                self.view.display(text, Tone::Success);
            }
            Ok(response) => self.display_failure(&response),
            Err(error) => self.view.display_error(
                UiErrorKind::Transport,
                format!("Failed to show graph: {error}"),
            ),
        }
    }

    pub async fn search(&mut self) {
        let query = self.view.search_input.trim().to_string();
        if query.is_empty() {
            self.view
                .display_error(UiErrorKind::Validation, "Please enter a search query");
            return;
        }
        let graph = self.selected_graph();

        self.view.display("Searching...", Tone::Success);

        match self.relay.send(ActionRequest::search(query, graph)).await {
            Ok(response) if response.success => {
                let text = response.present_stdout().unwrap_or("No results found");
                self.view.display(text, Tone::Success);
            }
            Ok(response) => self.display_failure(&response),
            Err(error) => self
                .view
                .display_error(UiErrorKind::Transport, format!("Search failed: {error}")),
        }
    }

    pub async fn execute_query(&mut self) {
        let query = self.view.query_input.trim().to_string();
        if query.is_empty() {
            self.view
                .display_error(UiErrorKind::Validation, "Please enter a query");
            return;
        }
        let Some(graph) = self.selected_graph() else {
            self.view
                .display_error(UiErrorKind::Validation, "Please select a graph");
            return;
        };

        self.view.display("Executing query...", Tone::Success);

        match self.relay.send(ActionRequest::query(graph, query)).await {
            Ok(response) if response.success => {
                let payload = match (response.present_data(), response.present_stdout()) {
                    (Some(data), _) => Payload::Json(data.clone()),
                    (None, Some(stdout)) => Payload::from(stdout),
                    (None, None) => Payload::from("Query executed successfully"),
                };
                self.view.display(payload, Tone::Success);
            }
            Ok(response) => self.display_failure(&response),
            Err(error) => self
                .view
                .display_error(UiErrorKind::Transport, format!("Query failed: {error}")),
        }
    }

    fn selected_graph(&self) -> Option<String> {
        self.view
            .graph_select
            .selected()
            .map(|name| name.as_str().to_string())
    }

    fn display_failure(&mut self, response: &ActionResponse) {
        let message = response.failure_message();
        self.view
            .display_error(classify_failure(message), format!("Error: {message}"));
    }
}

#[cfg(test)]
#[path = "tests/presenter_tests.rs"]
mod tests;
