use std::{io, path::PathBuf, process::Stdio, sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared::protocol::{ActionResponse, HEALTHY_STATUS};
use thiserror::Error;
use tokio::process::Command;
use tracing::{error, info};

pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub returncode: i32,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("Command execution timed out after {0} seconds")]
    TimedOut(u64),
    #[error("logseq CLI not found. Install with: npm install -g @logseq/cli")]
    NotFound,
    #[error("{0}")]
    Io(#[from] io::Error),
}

/// Runs one `logseq <command> <args..>` invocation.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &str, args: &[String]) -> Result<CommandOutput, RunnerError>;
}

/// Shells out to the Logseq CLI; `query` output is piped through `jet` to
/// turn EDN into JSON.
#[derive(Debug, Clone)]
pub struct LogseqCli {
    pub logseq_bin: PathBuf,
    pub jet_bin: PathBuf,
    pub timeout: Duration,
}

impl LogseqCli {
    async fn run_plain(&self, command: &str, args: &[String]) -> Result<CommandOutput, RunnerError> {
        let output = Command::new(&self.logseq_bin)
            .arg(command)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(spawn_error)?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            returncode: output.status.code().unwrap_or(-1),
        })
    }

    async fn run_through_jet(
        &self,
        command: &str,
        args: &[String],
    ) -> Result<CommandOutput, RunnerError> {
        let mut logseq = Command::new(&self.logseq_bin)
            .arg(command)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let piped: Stdio = logseq
            .stdout
            .take()
            .ok_or_else(|| io::Error::other("logseq stdout was not captured"))?
            .try_into()?;

        let jet = Command::new(&self.jet_bin)
            .args(["--to", "json"])
            .stdin(piped)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let (jet_output, logseq_output) =
            tokio::try_join!(jet.wait_with_output(), logseq.wait_with_output())?;

        let mut stderr = String::from_utf8_lossy(&jet_output.stderr).into_owned();
        stderr.push_str(&String::from_utf8_lossy(&logseq_output.stderr));

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&jet_output.stdout).into_owned(),
            stderr,
            returncode: jet_output.status.code().unwrap_or(-1),
        })
    }
}

#[async_trait]
impl CommandRunner for LogseqCli {
    async fn run(&self, command: &str, args: &[String]) -> Result<CommandOutput, RunnerError> {
        let run = async {
            if command == "query" {
                self.run_through_jet(command, args).await
            } else {
                self.run_plain(command, args).await
            }
        };
        tokio::time::timeout(self.timeout, run)
            .await
            .map_err(|_| RunnerError::TimedOut(self.timeout.as_secs()))?
    }
}

fn spawn_error(err: io::Error) -> RunnerError {
    if err.kind() == io::ErrorKind::NotFound {
        RunnerError::NotFound
    } else {
        RunnerError::Io(err)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RequestError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Invalid JSON in request body")]
    InvalidJson,
    #[error("Unknown endpoint: {0}")]
    UnknownEndpoint(String),
}

#[derive(Clone)]
pub struct ApiContext {
    pub runner: Arc<dyn CommandRunner>,
}

/// Lenient form of the `/query` body; absent and empty fields are rejected
/// with a field-specific message.
#[derive(Debug, Default, Deserialize)]
pub struct QueryRequest {
    #[serde(default)]
    pub graph: Option<String>,
    #[serde(default)]
    pub query: Option<String>,
}

/// `/health` body; carries no `success` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionResponse {
    pub version: String,
}

pub fn health() -> HealthResponse {
    HealthResponse {
        status: HEALTHY_STATUS.to_string(),
        message: "Logseq HTTP Server is running".to_string(),
    }
}

pub fn version() -> VersionResponse {
    VersionResponse {
        version: SERVER_VERSION.to_string(),
    }
}

pub async fn list_graphs(ctx: &ApiContext) -> ActionResponse {
    execute(ctx, "list", Vec::new()).await
}

pub async fn show_graph(
    ctx: &ApiContext,
    graph: Option<&str>,
) -> Result<ActionResponse, RequestError> {
    let graph = required(graph).ok_or(RequestError::MissingParameter("graph"))?;
    Ok(execute(ctx, "show", vec![graph.to_string()]).await)
}

pub async fn search(
    ctx: &ApiContext,
    term: Option<&str>,
    graph: Option<&str>,
) -> Result<ActionResponse, RequestError> {
    let term = required(term).ok_or(RequestError::MissingParameter("q"))?;
    let graph = required(graph).ok_or(RequestError::MissingField("graph"))?;
    let datalog = page_search_datalog(term);
    Ok(execute(ctx, "query", vec![graph.to_string(), datalog]).await)
}

pub async fn query(ctx: &ApiContext, body: &[u8]) -> Result<ActionResponse, RequestError> {
    let request: QueryRequest = if body.is_empty() {
        QueryRequest::default()
    } else {
        serde_json::from_slice(body).map_err(|_| RequestError::InvalidJson)?
    };
    let graph = required(request.graph.as_deref()).ok_or(RequestError::MissingField("graph"))?;
    let query = required(request.query.as_deref()).ok_or(RequestError::MissingField("query"))?;
    Ok(execute(ctx, "query", vec![graph.to_string(), query.to_string()]).await)
}

/// Datalog that finds pages whose lowercased name or mixed-case title contains
/// `term`. Double quotes in the term are backslash-escaped.
pub fn page_search_datalog(term: &str) -> String {
    let escaped = term.replace('"', "\\\"");
    let escaped_lower = escaped.to_lowercase();
    format!(
        "[:find (pull ?p [:db/id :block/uuid :block/name :block/title :block/journal-day]) \
         :where [?p :block/name ?name] [?p :block/title ?title] \
         (or [(clojure.string/includes? ?name \"{escaped_lower}\")] \
         [(clojure.string/includes? ?title \"{escaped}\")])]"
    )
}

async fn execute(ctx: &ApiContext, command: &str, args: Vec<String>) -> ActionResponse {
    info!(command, ?args, "executing logseq command");
    match ctx.runner.run(command, &args).await {
        Ok(output) => command_response(output),
        Err(err) => {
            error!(command, error = %err, "logseq command failed");
            ActionResponse::failure(err.to_string())
        }
    }
}

fn command_response(output: CommandOutput) -> ActionResponse {
    let trimmed = output.stdout.trim();
    let data = if trimmed.starts_with('{') || trimmed.starts_with('[') {
        serde_json::from_str(trimmed).ok()
    } else {
        None
    };

    ActionResponse {
        success: output.returncode == 0,
        data,
        stdout: Some(output.stdout),
        stderr: Some(output.stderr),
        returncode: Some(output.returncode),
        ..ActionResponse::default()
    }
}

fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

#[cfg(test)]
#[path = "tests/mod_tests.rs"]
mod tests;
