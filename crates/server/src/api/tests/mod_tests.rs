use super::*;
use serde_json::json;
use tokio::sync::Mutex;

type Script = Box<dyn Fn(&str, &[String]) -> Result<CommandOutput, RunnerError> + Send + Sync>;

struct ScriptedRunner {
    calls: Mutex<Vec<(String, Vec<String>)>>,
    script: Script,
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, command: &str, args: &[String]) -> Result<CommandOutput, RunnerError> {
        self.calls
            .lock()
            .await
            .push((command.to_string(), args.to_vec()));
        (self.script)(command, args)
    }
}

fn output(stdout: &str, returncode: i32) -> CommandOutput {
    CommandOutput {
        stdout: stdout.to_string(),
        stderr: String::new(),
        returncode,
    }
}

fn setup(
    script: impl Fn(&str, &[String]) -> Result<CommandOutput, RunnerError> + Send + Sync + 'static,
) -> (ApiContext, Arc<ScriptedRunner>) {
    let runner = Arc::new(ScriptedRunner {
        calls: Mutex::new(Vec::new()),
        script: Box::new(script),
    });
    (
        ApiContext {
            runner: runner.clone(),
        },
        runner,
    )
}

#[test]
fn health_reports_healthy_status() {
    let response = health();
    assert_eq!(response.status, shared::protocol::HEALTHY_STATUS);
    assert_eq!(response.message, "Logseq HTTP Server is running");
    assert_eq!(version().version, SERVER_VERSION);
}

#[test]
fn server_version_is_pinned() {
    assert_eq!(SERVER_VERSION, "0.0.2");
}

#[tokio::test]
async fn list_runs_plain_list_command() {
    let (ctx, runner) = setup(|_, _| Ok(output("DB Graphs\nnotes\n", 0)));

    let response = list_graphs(&ctx).await;
    assert!(response.success);
    assert_eq!(response.stdout.as_deref(), Some("DB Graphs\nnotes\n"));
    assert_eq!(response.returncode, Some(0));
    assert!(response.data.is_none());
    assert_eq!(
        runner.calls.lock().await.as_slice(),
        &[("list".to_string(), Vec::new())]
    );
}

#[tokio::test]
async fn show_requires_graph_parameter() {
    let (ctx, runner) = setup(|_, _| Ok(output("", 0)));

    assert_eq!(
        show_graph(&ctx, None).await.expect_err("missing"),
        RequestError::MissingParameter("graph")
    );
    assert_eq!(
        show_graph(&ctx, Some("")).await.expect_err("empty"),
        RequestError::MissingParameter("graph")
    );
    assert!(runner.calls.lock().await.is_empty());

    show_graph(&ctx, Some("notes")).await.expect("show");
    assert_eq!(
        runner.calls.lock().await.as_slice(),
        &[("show".to_string(), vec!["notes".to_string()])]
    );
}

#[tokio::test]
async fn search_requires_term_then_graph() {
    let (ctx, runner) = setup(|_, _| Ok(output("[]", 0)));

    let err = search(&ctx, None, Some("notes")).await.expect_err("no term");
    assert_eq!(err.to_string(), "Missing required parameter: q");
    let err = search(&ctx, Some("todo"), None).await.expect_err("no graph");
    assert_eq!(err.to_string(), "Missing required field: graph");
    assert!(runner.calls.lock().await.is_empty());
}

#[tokio::test]
async fn search_runs_page_datalog_against_graph() {
    let (ctx, runner) = setup(|_, _| Ok(output("[[{\"block/name\":\"todo\"}]]", 0)));

    let response = search(&ctx, Some("ToDo"), Some("notes"))
        .await
        .expect("search");
    assert_eq!(response.data, Some(json!([[{ "block/name": "todo" }]])));

    let calls = runner.calls.lock().await;
    let (command, args) = &calls[0];
    assert_eq!(command, "query");
    assert_eq!(args[0], "notes");
    assert_eq!(args[1], page_search_datalog("ToDo"));
}

#[test]
fn page_search_datalog_escapes_quotes_and_lowercases_name_match() {
    let datalog = page_search_datalog("Say \"Hi\"");
    assert!(datalog.starts_with("[:find (pull ?p [:db/id :block/uuid :block/name"));
    assert!(datalog.contains("(clojure.string/includes? ?name \"say \\\"hi\\\"\")"));
    assert!(datalog.contains("(clojure.string/includes? ?title \"Say \\\"Hi\\\"\")"));
    assert!(datalog.ends_with(")])]"));
}

#[tokio::test]
async fn query_validates_body() {
    let (ctx, runner) = setup(|_, _| Ok(output("", 0)));

    assert_eq!(
        query(&ctx, b"{not json").await.expect_err("json"),
        RequestError::InvalidJson
    );
    assert_eq!(
        query(&ctx, b"").await.expect_err("empty"),
        RequestError::MissingField("graph")
    );
    assert_eq!(
        query(&ctx, br#"{"graph":"notes","query":""}"#)
            .await
            .expect_err("no query"),
        RequestError::MissingField("query")
    );
    assert!(runner.calls.lock().await.is_empty());
}

#[tokio::test]
async fn query_parses_json_stdout_into_data() {
    let (ctx, runner) = setup(|_, _| Ok(output("  {\"count\": 3}\n", 0)));

    let response = query(&ctx, br#"{"graph":"notes","query":"[:find ?e]"}"#)
        .await
        .expect("query");
    assert!(response.success);
    assert_eq!(response.data, Some(json!({ "count": 3 })));
    assert_eq!(
        runner.calls.lock().await.as_slice(),
        &[(
            "query".to_string(),
            vec!["notes".to_string(), "[:find ?e]".to_string()]
        )]
    );
}

#[tokio::test]
async fn malformed_json_stdout_is_left_as_text() {
    let (ctx, _runner) = setup(|_, _| Ok(output("{:block/name \"edn\"}", 0)));

    let response = query(&ctx, br#"{"graph":"notes","query":"q"}"#)
        .await
        .expect("query");
    assert!(response.success);
    assert!(response.data.is_none());
    assert_eq!(response.stdout.as_deref(), Some("{:block/name \"edn\"}"));
}

#[tokio::test]
async fn nonzero_exit_is_unsuccessful_but_keeps_output() {
    let (ctx, _runner) = setup(|_, _| {
        Ok(CommandOutput {
            stdout: String::new(),
            stderr: "graph not found".to_string(),
            returncode: 1,
        })
    });

    let response = show_graph(&ctx, Some("missing")).await.expect("show");
    assert!(!response.success);
    assert_eq!(response.returncode, Some(1));
    assert_eq!(response.failure_message(), "graph not found");
}

#[tokio::test]
async fn runner_failures_become_error_responses() {
    let (ctx, _runner) = setup(|command, _| match command {
        "list" => Err(RunnerError::NotFound),
        _ => Err(RunnerError::TimedOut(30)),
    });

    let response = list_graphs(&ctx).await;
    assert!(!response.success);
    assert_eq!(
        response.error.as_deref(),
        Some("logseq CLI not found. Install with: npm install -g @logseq/cli")
    );

    let response = show_graph(&ctx, Some("notes")).await.expect("show");
    assert_eq!(
        response.error.as_deref(),
        Some("Command execution timed out after 30 seconds")
    );
}

#[tokio::test]
async fn missing_binary_maps_to_not_found() {
    let cli = LogseqCli {
        logseq_bin: PathBuf::from("/nonexistent/logseq-cli-for-tests"),
        jet_bin: PathBuf::from("/nonexistent/jet"),
        timeout: Duration::from_secs(5),
    };
    let err = cli.run("list", &[]).await.expect_err("should fail");
    assert!(matches!(err, RunnerError::NotFound));
}

#[cfg(unix)]
#[tokio::test]
async fn plain_commands_capture_stdout_and_exit_code() {
    let cli = LogseqCli {
        logseq_bin: PathBuf::from("echo"),
        jet_bin: PathBuf::from("jet"),
        timeout: Duration::from_secs(5),
    };
    let output = cli
        .run("show", &["notes".to_string()])
        .await
        .expect("echo");
    assert_eq!(output.stdout, "show notes\n");
    assert_eq!(output.returncode, 0);
}

#[cfg(unix)]
#[tokio::test]
async fn slow_commands_time_out() {
    let cli = LogseqCli {
        logseq_bin: PathBuf::from("sleep"),
        jet_bin: PathBuf::from("jet"),
        timeout: Duration::from_millis(100),
    };
    let err = cli.run("5", &[]).await.expect_err("should time out");
    assert!(matches!(err, RunnerError::TimedOut(0)));
}
