//! Line-oriented front-end: each stdin line becomes one or more UI events.

use std::io::Write as _;

use relay::RelayHandle;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::{
    controller::{
        events::{Button, Field, Key, Modifiers, UiEvent},
        presenter::Presenter,
    },
    ui::{view::PLACEHOLDER_LABEL, PopupView},
};

pub const COMMANDS: &[(&str, &str)] = &[
    ("<text>", "Search for text (Enter in the search field)"),
    ("/search <text>", "Same as typing text"),
    ("/query <datalog>", "Run a datalog query against the selected graph"),
    ("/list", "List graphs"),
    ("/refresh", "Refresh the graph list"),
    ("/select <name|number>", "Select a graph (0 clears the selection)"),
    ("/show", "Show info about the selected graph"),
    ("/health", "Re-check the server connection"),
    ("/hide", "Hide the result area"),
    ("/help", "Show this help"),
    ("/quit", "Exit"),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    Empty,
    Events(Vec<UiEvent>),
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_line(line: &str, view: &PopupView) -> Input {
    let line = line.trim_end_matches(['\r', '\n']);
    if line.trim().is_empty() {
        return Input::Empty;
    }
    if !line.starts_with('/') {
        return Input::Events(submit_search(line));
    }

    let (command, rest) = match line.split_once(char::is_whitespace) {
        Some((command, rest)) => (command, rest.trim()),
        None => (line, ""),
    };
    match command {
        "/quit" | "/exit" => Input::Quit,
        "/help" => Input::Help,
        "/list" => Input::Events(vec![UiEvent::Clicked(Button::ListGraphs)]),
        "/refresh" => Input::Events(vec![UiEvent::Clicked(Button::RefreshGraphs)]),
        "/show" => Input::Events(vec![UiEvent::Clicked(Button::ShowGraph)]),
        "/health" => Input::Events(vec![UiEvent::CheckHealth]),
        "/hide" => Input::Events(vec![UiEvent::HideResults]),
        "/search" => Input::Events(submit_search(rest)),
        "/query" => Input::Events(vec![
            UiEvent::InputChanged {
                field: Field::Query,
                text: rest.to_string(),
            },
            UiEvent::KeyPressed {
                field: Field::Query,
                key: Key::Enter,
                modifiers: Modifiers::submit(),
            },
        ]),
        "/select" => Input::Events(vec![UiEvent::GraphSelected(resolve_selection(rest, view))]),
        other => Input::Unknown(other.to_string()),
    }
}

fn submit_search(text: &str) -> Vec<UiEvent> {
    vec![
        UiEvent::InputChanged {
            field: Field::Search,
            text: text.to_string(),
        },
        UiEvent::KeyPressed {
            field: Field::Search,
            key: Key::Enter,
            modifiers: Modifiers::NONE,
        },
    ]
}

/// Numbers index the selection control as rendered: 0 is the placeholder,
/// 1.. are the listed graphs. Anything else is taken as a graph name.
fn resolve_selection(arg: &str, view: &PopupView) -> String {
    match arg.parse::<usize>() {
        Ok(0) => String::new(),
        Ok(index) => view
            .graph_select
            .options()
            .get(index - 1)
            .map(|name| name.as_str().to_string())
            .unwrap_or_else(|| arg.to_string()),
        Err(_) => arg.to_string(),
    }
}

pub fn help_text() -> String {
    let width = COMMANDS.iter().map(|(cmd, _)| cmd.len()).max().unwrap_or(0);
    COMMANDS
        .iter()
        .map(|(cmd, desc)| format!("  {cmd:<width$}  {desc}\n"))
        .collect()
}

fn render_options(view: &PopupView) -> String {
    let mut out = format!("  0. {PLACEHOLDER_LABEL}\n");
    for (index, name) in view.graph_select.options().iter().enumerate() {
        out.push_str(&format!("  {}. {name}\n", index + 1));
    }
    out
}

pub async fn run_interactive<R: RelayHandle>(presenter: &mut Presenter<R>) -> anyhow::Result<()> {
    presenter.initialize().await;
    print_view(presenter.view());
    println!("Type /help for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match parse_line(&line, presenter.view()) {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => print!("{}", help_text()),
            Input::Unknown(command) => println!("Unknown command {command}; type /help"),
            Input::Events(events) => {
                let lists_graphs = events.iter().any(|event| {
                    matches!(
                        event,
                        UiEvent::Clicked(Button::ListGraphs | Button::RefreshGraphs)
                    )
                });
                for event in events {
                    presenter.handle(event).await;
                }
                print_view(presenter.view());
                if lists_graphs && !presenter.view().results.is_error() {
                    print!("{}", render_options(presenter.view()));
                }
            }
        }
    }
    Ok(())
}

pub fn print_view(view: &PopupView) {
    print!("{view}");
}

#[cfg(test)]
#[path = "tests/terminal_tests.rs"]
mod tests;
