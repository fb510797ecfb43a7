use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::{self, StreamExt};
use htree_engine::{EngineError, PacingConfig, RESTART_SEPARATOR};
use htree_model::AgentRequest;
use htree_stream::{AgentClient, ByteStream, Query, RunOutcome, StreamController, StreamError, StreamResult};
use htree_test_utils::{
    chunked, ndjson_body, record, sample_run, sse_body, tree_message, ScriptStep, ScriptedClient,
};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

fn generate() -> Query {
    Query::Generate(AgentRequest::new("Why are margins falling?"))
}

fn hanging_after(messages: &[htree_model::StreamMessage]) -> ScriptedClient {
    ScriptedClient::from_chunks(vec![ndjson_body(messages)]).then(ScriptStep::Hang)
}

#[tokio::test(start_paused = true)]
async fn ndjson_run_completes_with_every_node() {
    let body = ndjson_body(&sample_run());
    let client = ScriptedClient::from_chunks(chunked(&body, 7));
    let mut controller = StreamController::new(Arc::new(client));

    let mut handle = controller.start(generate()).await.unwrap();
    let summary = controller.finish().await.unwrap().unwrap();

    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.messages, 7);
    assert_eq!(summary.malformed, 0);
    assert_eq!(summary.nodes, 3);
    assert_eq!(summary.edges, 2);

    let state = handle.finished().await;
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert!(state.snapshot.node("1.1").unwrap().node.is_leaf);
    assert!(state.snapshot.working_node().is_none());
    assert_eq!(state.pending, 0);

    let session = controller.session().unwrap();
    assert!(session.store().has_edge("1", "1.2"));
}

#[tokio::test(start_paused = true)]
async fn sse_stops_at_done_sentinel() {
    let mut body = sse_body(&[tree_message(vec![record("1", "0", "Root")])]).to_vec();
    body.extend_from_slice(b"data: {\"hypothesis_tree\":[{\"id\":\"9\",\"parent_id\":\"0\"}]}\n");
    let client = ScriptedClient::from_chunks(chunked(&Bytes::from(body), 5));
    let mut controller = StreamController::new(Arc::new(client));

    controller.start(generate()).await.unwrap();
    let summary = controller.finish().await.unwrap().unwrap();

    assert_eq!(summary.outcome, RunOutcome::Completed);
    let store = controller.session().unwrap().store();
    assert!(store.contains("1"));
    assert!(!store.contains("9"));
}

#[tokio::test(start_paused = true)]
async fn malformed_lines_are_skipped() {
    let mut body = b"not json at all\n{\"hypothesis_tree\": [\n".to_vec();
    body.extend_from_slice(&ndjson_body(&[tree_message(vec![record("1", "0", "Root")])]));
    let client = ScriptedClient::from_chunks(vec![Bytes::from(body)]);
    let mut controller = StreamController::new(Arc::new(client));

    controller.start(generate()).await.unwrap();
    let summary = controller.finish().await.unwrap().unwrap();

    assert_eq!(summary.malformed, 2);
    assert_eq!(summary.nodes, 1);
}

#[tokio::test(start_paused = true)]
async fn trailing_line_without_newline_is_applied_at_end() {
    let body = Bytes::from_static(br#"{"hypothesis_tree":[{"id":"1","parent_id":"0","text":"Root"}]}"#);
    let mut controller = StreamController::new(Arc::new(ScriptedClient::from_chunks(vec![body])));

    controller.start(generate()).await.unwrap();
    assert_eq!(controller.finish().await.unwrap().unwrap().nodes, 1);
}

#[tokio::test(start_paused = true)]
async fn abort_drains_queued_nodes_without_error() {
    let client = hanging_after(&[tree_message(vec![
        record("1", "0", "Root"),
        record("1.1", "1", "a"),
        record("1.2", "1", "b"),
    ])]);
    let pacing = PacingConfig::new().with_arrival_interval(Duration::from_secs(60));
    let mut controller = StreamController::new(Arc::new(client)).with_pacing(pacing);

    let handle = controller.start(generate()).await.unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(controller.is_running());

    handle.abort();
    handle.abort();
    let summary = controller.finish().await.unwrap().unwrap();

    assert_eq!(summary.outcome, RunOutcome::Aborted);
    assert_eq!(summary.nodes, 3);
    let state = handle.state();
    assert!(!state.loading);
    assert!(state.error.is_none());
    assert_eq!(state.snapshot.nodes.len(), 3);

    handle.abort();
    controller.abort();
}

#[tokio::test(start_paused = true)]
async fn arrivals_are_paced_one_per_tick() {
    let client = hanging_after(&[tree_message(vec![
        record("1", "0", "Root"),
        record("1.1", "1", "a"),
        record("1.2", "1", "b"),
    ])]);
    let mut controller = StreamController::new(Arc::new(client));
    let handle = controller.start(generate()).await.unwrap();

    tokio::time::sleep(Duration::from_millis(300)).await;
    let state = handle.state();
    assert_eq!(state.snapshot.nodes.len(), 1);
    assert_eq!(state.pending, 2);

    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(handle.state().snapshot.nodes.len(), 3);

    handle.abort();
    controller.finish().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn open_failure_is_surfaced() {
    let mut controller = StreamController::new(Arc::new(ScriptedClient::failing_open(503)));
    let handle = controller.start(generate()).await.unwrap();

    let err = controller.finish().await.unwrap_err();
    assert!(matches!(err, StreamError::Status { status: 503, .. }));
    assert!(err.is_transport());

    let state = handle.state();
    assert!(!state.loading);
    assert!(state.error.unwrap().contains("503"));
    assert!(controller.session().is_some());
}

#[tokio::test(start_paused = true)]
async fn mid_stream_failure_keeps_received_nodes() {
    let client = ScriptedClient::from_chunks(vec![ndjson_body(&[tree_message(vec![record("1", "0", "Root")])])])
        .then(ScriptStep::Fail("connection reset".into()));
    let mut controller = StreamController::new(Arc::new(client));

    controller.start(generate()).await.unwrap();
    assert!(matches!(controller.finish().await, Err(StreamError::Io(_))));
    assert!(controller.session().unwrap().store().contains("1"));
}

#[tokio::test(start_paused = true)]
async fn second_start_cancels_first_run() {
    let client = Arc::new(hanging_after(&[tree_message(vec![record("1", "0", "Root")])]));
    let mut controller = StreamController::new(client.clone());

    let first = controller.start(generate()).await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    let second = controller.start(generate()).await.unwrap();

    assert!(first.is_aborted());
    assert!(!first.state().loading);
    assert!(!second.is_aborted());

    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(client.requests().len(), 2);

    second.abort();
    let summary = controller.finish().await.unwrap().unwrap();
    assert_eq!(summary.outcome, RunOutcome::Aborted);
    assert_eq!(summary.nodes, 1);
}

#[tokio::test(start_paused = true)]
async fn restart_sends_existing_tree_and_keeps_ancestors() {
    let client = Arc::new(ScriptedClient::from_chunks(vec![ndjson_body(&sample_run())]));
    let mut controller = StreamController::new(client.clone());
    controller.start(generate()).await.unwrap();
    controller.finish().await.unwrap();

    let base = AgentRequest::new("Why are margins falling?").with_scratchpad("sp-1");
    controller
        .start(Query::Restart {
            base,
            node_id: "1".into(),
            text: "Margins eroded in Q3".into(),
            reasoning: "narrowed".into(),
        })
        .await
        .unwrap();
    controller.finish().await.unwrap();

    let requests = client.requests();
    let restart = &requests[1];
    assert_eq!(restart.restart_node_id.as_deref(), Some("1"));
    assert_eq!(restart.scratchpad_id.as_deref(), Some("sp-1"));
    let existing = restart.existing_tree.as_ref().unwrap();
    assert_eq!(existing.len(), 1);
    assert_eq!(existing[0].text, "Margins eroded in Q3");

    let session = controller.session().unwrap();
    assert!(session.transcript().iter().any(|e| e.line == RESTART_SEPARATOR));
}

#[tokio::test(start_paused = true)]
async fn restart_from_unknown_node_is_rejected() {
    let mut controller = StreamController::new(Arc::new(ScriptedClient::from_chunks(vec![ndjson_body(&sample_run())])));
    controller.start(generate()).await.unwrap();
    controller.finish().await.unwrap();

    let err = controller
        .start(Query::Restart {
            base: AgentRequest::new("p"),
            node_id: "4.4".into(),
            text: "t".into(),
            reasoning: String::new(),
        })
        .await
        .unwrap_err();

    assert!(matches!(err, StreamError::Engine(EngineError::NodeNotFound(_))));
    assert_eq!(controller.session().unwrap().store().len(), 3);
}

/// Body whose chunks are always ready but take wall-clock time to produce
#[derive(Debug)]
struct BusyClient {
    chunks: Vec<Bytes>,
    cost: Duration,
}

#[async_trait]
impl AgentClient for BusyClient {
    async fn open(&self, _request: &AgentRequest) -> StreamResult<ByteStream> {
        let cost = self.cost;
        Ok(stream::iter(self.chunks.clone())
            .map(move |chunk| {
                std::thread::sleep(cost);
                Ok(chunk)
            })
            .boxed())
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn always_ready_body_still_paces_arrivals() {
    let chunks: Vec<Bytes> = (0..400)
        .map(|i| ndjson_body(&[tree_message(vec![record(&(i + 1).to_string(), "0", "n")])]))
        .collect();
    let client = BusyClient {
        chunks,
        cost: Duration::from_micros(250),
    };
    let pacing = PacingConfig::new()
        .with_arrival_interval(Duration::from_millis(1))
        .with_frame_interval(Duration::from_millis(1));
    let mut controller = StreamController::new(Arc::new(client)).with_pacing(pacing);

    let handle = controller.start(generate()).await.unwrap();
    let mut view = handle.subscribe();
    let loading = view
        .wait_for(|s| !s.loading || !s.snapshot.nodes.is_empty())
        .await
        .unwrap()
        .loading;
    assert!(loading, "no arrival was published before the body ended");

    let summary = controller.finish().await.unwrap().unwrap();
    assert_eq!(summary.outcome, RunOutcome::Completed);
    assert_eq!(summary.nodes, 400);
}
