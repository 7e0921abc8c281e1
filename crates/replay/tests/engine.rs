use serde_json::json;

use trajview_api::StoreError;
use trajview_core::{testing, Catalog, Role, ToolStatus};
use trajview_replay::*;
use trajview_runtime_config::PlaybackSettings;

type TestEngine = Engine<ManualTimer, Vec<RenderEvent>, MemoryLocation>;

fn engine_at(path: &str) -> TestEngine {
    Engine::new(
        ManualTimer::new(),
        Vec::new(),
        MemoryLocation::new(path),
        &PlaybackSettings::default(),
    )
}

fn catalog() -> Catalog {
    Catalog::from_filenames([
        "claude_fix-ci.json",
        "gpt-5_merge-hf-datasets.json",
        "gpt-5_fix_flaky_test.json",
    ])
}

fn fetch_ticket(effect: Option<Effect>) -> LoadTicket {
    match effect {
        Some(Effect::FetchTrajectory(ticket)) => ticket,
        other => panic!("expected a trajectory fetch, got {other:?}"),
    }
}

fn load(engine: &mut TestEngine, path_model: &str, task: &str, body: serde_json::Value) {
    let ticket = fetch_ticket(engine.handle(Command::Select {
        model: path_model.into(),
        task: task.into(),
    }));
    engine.on_trajectory_loaded(ticket, Ok(serde_json::to_vec(&body).expect("serialize")));
}

fn statuses(engine: &TestEngine) -> Vec<&str> {
    engine
        .projector()
        .iter()
        .filter_map(|event| match event {
            RenderEvent::Status { text } => Some(text.as_str()),
            _ => None,
        })
        .collect()
}

fn shown(engine: &TestEngine) -> Vec<String> {
    visible_messages(engine.projector())
        .into_iter()
        .map(|m| m.message.content.clone())
        .collect()
}

fn tick(engine: &mut TestEngine) -> bool {
    match engine.timer_mut().fire() {
        Some(ticket) => engine.on_tick(ticket),
        None => false,
    }
}

#[test]
fn array_record_replays_in_order() {
    let mut engine = engine_at("/");
    engine.on_catalog_loaded(Ok(catalog()));
    load(
        &mut engine,
        "gpt-5",
        "merge-hf-datasets",
        json!([
            {"role": "user", "content": "hi"},
            {"role": "assistant", "content": "hello"}
        ]),
    );

    let session = engine.session().expect("session");
    assert_eq!(session.len(), 2);
    assert_eq!(session.cursor(), 0);
    assert_eq!(engine.state(), PlaybackState::Ready);

    engine.handle(Command::Step(Direction::Forward));
    assert_eq!(shown(&engine), vec!["hi"]);
    let first = visible_messages(engine.projector())[0];
    assert_eq!(first.message.role, Role::User);
}

#[test]
fn nested_data_messages_are_found() {
    let mut engine = engine_at("/");
    engine.on_catalog_loaded(Ok(catalog()));
    load(
        &mut engine,
        "claude",
        "fix-ci",
        json!({"data": {"messages": [
            {"type": "human", "text": "a"},
            {"type": "ai", "text": "b"}
        ]}}),
    );

    let session = engine.session().expect("session");
    let roles: Vec<Role> = session.messages().iter().map(|m| m.role).collect();
    assert_eq!(roles, vec![Role::User, Role::Assistant]);
    assert_eq!(testing::contents(session.messages()), vec!["a", "b"]);
}

#[test]
fn tool_error_is_correlated_and_tool_entry_hidden() {
    let mut engine = engine_at("/");
    engine.on_catalog_loaded(Ok(catalog()));
    load(
        &mut engine,
        "gpt-5",
        "merge-hf-datasets",
        json!([
            {"role": "assistant", "content": "", "tool_calls": [
                {"id": "t1", "function": {"name": "bash", "arguments": "{\"cmd\":\"ls\"}"}}
            ]},
            {"role": "tool", "tool_call_id": "t1", "content": "Error running tool bash: permission denied"}
        ]),
    );

    assert_eq!(engine.session().map(Session::len), Some(1));
    engine.handle(Command::ShowAll);
    let shown = visible_messages(engine.projector());
    assert_eq!(shown.len(), 1);
    let tool = shown[0].tools().next().expect("tool call");
    assert_eq!(tool.call.name, "bash");
    assert_eq!(tool.status, ToolStatus::Error);
    assert!(tool.result.is_some());
}

#[test]
fn route_selects_model_and_task_then_rewrites_location() {
    let mut engine = engine_at("/gpt-5_merge-hf-datasets");
    let ticket = fetch_ticket(engine.on_catalog_loaded(Ok(catalog())));
    assert_eq!(ticket.filename(), "gpt-5_merge-hf-datasets.json");
    assert_eq!(engine.selected_model(), Some("gpt-5"));
    assert_eq!(engine.selected_task(), Some("merge-hf-datasets"));
    assert!(engine.projector().contains(&RenderEvent::Tasks {
        model: "gpt-5".into(),
        tasks: vec!["merge-hf-datasets".into(), "fix_flaky_test".into()],
        selected: Some("merge-hf-datasets".into()),
    }));

    engine.on_trajectory_loaded(ticket, Ok(br#"[{"role":"user","content":"go"}]"#.to_vec()));
    assert_eq!(engine.location().current(), "/gpt-5_merge-hf-datasets");
    assert!(statuses(&engine).contains(&"Loaded: gpt-5_merge-hf-datasets.json (1 msgs)"));
}

#[test]
fn play_then_pause_at_cursor_one() {
    let mut engine = engine_at("/");
    engine.on_catalog_loaded(Ok(catalog()));
    load(&mut engine, "claude", "fix-ci", testing::conversation(4));

    engine.handle(Command::Play);
    assert_eq!(engine.state(), PlaybackState::Playing);
    assert!(tick(&mut engine));
    assert_eq!(engine.session().map(Session::cursor), Some(1));

    engine.handle(Command::Pause);
    assert_eq!(engine.state(), PlaybackState::Paused);
    assert_eq!(engine.player().pending_ticket(), None);
    assert!(!tick(&mut engine));
    assert_eq!(shown(&engine), vec!["user turn 0"]);

    match engine.projector().last() {
        Some(RenderEvent::Controls(controls)) => {
            assert!(controls.play && !controls.pause);
            assert_eq!((controls.cursor, controls.total), (1, 4));
        }
        other => panic!("expected controls, got {other:?}"),
    }
}

#[test]
fn unknown_model_reports_status_and_loads_first_entry() {
    let mut engine = engine_at("/o9_task");
    let ticket = fetch_ticket(engine.on_catalog_loaded(Ok(catalog())));
    assert_eq!(ticket.filename(), "claude_fix-ci.json");
    assert!(statuses(&engine).contains(&"Model not found: o9"));
    assert!(matches!(
        engine.last_error(),
        Some(ReplayError::UnresolvedSelection(Unresolved::Model(_)))
    ));
}

#[test]
fn unknown_bare_model_preselects_first_model_without_loading() {
    let mut engine = engine_at("/o9");
    assert_eq!(engine.on_catalog_loaded(Ok(catalog())), None);
    assert!(statuses(&engine).contains(&"Model not found: o9"));
    assert_eq!(engine.selected_model(), Some("claude"));
    assert_eq!(engine.pending_load(), None);
    assert_eq!(engine.state(), PlaybackState::Idle);
}

#[test]
fn unknown_task_populates_tasks_without_loading() {
    let mut engine = engine_at("/gpt-5_missing");
    assert_eq!(engine.on_catalog_loaded(Ok(catalog())), None);
    assert!(statuses(&engine).contains(&"Task not found: missing"));
    assert_eq!(engine.selected_model(), Some("gpt-5"));
    assert_eq!(engine.state(), PlaybackState::Idle);
}

#[test]
fn bare_model_route_preselects_only() {
    let mut engine = engine_at("/claude");
    assert_eq!(engine.on_catalog_loaded(Ok(catalog())), None);
    assert_eq!(engine.selected_model(), Some("claude"));
    assert_eq!(engine.pending_load(), None);
}

#[test]
fn selecting_a_model_rewrites_location() {
    let mut engine = engine_at("/");
    engine.on_catalog_loaded(Ok(catalog()));
    assert_eq!(engine.handle(Command::SelectModel("gpt-5".into())), None);
    assert_eq!(engine.location().current(), "/gpt-5");
    assert_eq!(engine.selected_task(), None);
    assert_eq!(engine.pending_load(), None);
}

#[test]
fn selecting_a_model_keeps_current_session_playing() {
    let mut engine = engine_at("/");
    engine.on_catalog_loaded(Ok(catalog()));
    load(
        &mut engine,
        "claude",
        "fix-ci",
        json!([{"role": "user", "content": "a"}, {"role": "assistant", "content": "b"}]),
    );
    engine.handle(Command::Play);
    assert_eq!(engine.state(), PlaybackState::Playing);

    engine.handle(Command::SelectModel("gpt-5".into()));
    assert_eq!(engine.state(), PlaybackState::Playing);
    assert_eq!(engine.location().current(), "/gpt-5");
    assert_eq!(
        engine.session().map(|s| s.filename()),
        Some("claude_fix-ci.json")
    );
}

#[test]
fn stale_trajectory_response_is_dropped() {
    let mut engine = engine_at("/");
    let first = fetch_ticket(engine.on_catalog_loaded(Ok(catalog())));
    let second = fetch_ticket(engine.handle(Command::Select {
        model: "gpt-5".into(),
        task: "fix_flaky_test".into(),
    }));

    engine.on_trajectory_loaded(first, Ok(br#"[{"role":"user","content":"old"}]"#.to_vec()));
    assert!(engine.session().is_none());

    engine.on_trajectory_loaded(second, Ok(br#"[{"role":"user","content":"new"}]"#.to_vec()));
    let session = engine.session().expect("session");
    assert_eq!(session.filename(), "gpt-5_fix_flaky_test.json");
    assert_eq!(engine.location().current(), "/gpt-5_fix_flaky_test");
}

#[test]
fn loading_cancels_autoplay_of_previous_session() {
    let mut engine = engine_at("/");
    engine.on_catalog_loaded(Ok(catalog()));
    load(&mut engine, "claude", "fix-ci", testing::conversation(3));
    engine.handle(Command::Play);
    assert!(engine.player().pending_ticket().is_some());

    engine.handle(Command::Select {
        model: "gpt-5".into(),
        task: "merge-hf-datasets".into(),
    });
    assert_eq!(engine.player().pending_ticket(), None);
    assert_eq!(engine.state(), PlaybackState::Idle);
    assert!(!tick(&mut engine));
}

#[test]
fn catalog_failure_goes_idle_with_status() {
    let mut engine = engine_at("/");
    let effect = engine.on_catalog_loaded(Err(StoreError::Transport("connection refused".into())));
    assert_eq!(effect, None);
    assert_eq!(engine.state(), PlaybackState::Idle);
    assert!(statuses(&engine).contains(&"Load models failed"));
    assert!(matches!(
        engine.last_error(),
        Some(ReplayError::NetworkFailure { .. })
    ));
}

#[test]
fn trajectory_failure_shows_empty_state() {
    let mut engine = engine_at("/");
    let ticket = fetch_ticket(engine.on_catalog_loaded(Ok(catalog())));
    engine.on_trajectory_loaded(
        ticket,
        Err(StoreError::NotFound {
            id: "claude_fix-ci.json".into(),
            tried: vec!["trajs/claude_fix-ci.json".into()],
        }),
    );
    assert_eq!(engine.state(), PlaybackState::Idle);
    assert!(statuses(&engine).contains(&"Trajectory load failed"));
    assert!(engine
        .projector()
        .iter()
        .any(|e| matches!(e, RenderEvent::EmptyState(state) if state.filename.as_deref() == Some("claude_fix-ci.json"))));
}

#[test]
fn malformed_body_yields_empty_ready_session() {
    let mut engine = engine_at("/");
    let ticket = fetch_ticket(engine.on_catalog_loaded(Ok(catalog())));
    engine.on_trajectory_loaded(ticket, Ok(b"{not json".to_vec()));

    assert_eq!(engine.state(), PlaybackState::Ready);
    assert_eq!(engine.session().map(Session::len), Some(0));
    assert!(matches!(
        engine.last_error(),
        Some(ReplayError::MalformedPayload { .. })
    ));
    engine.handle(Command::Play);
    assert_eq!(engine.state(), PlaybackState::Ready);
}

#[test]
fn unrecognized_record_lists_top_level_fields() {
    let mut engine = engine_at("/");
    let ticket = fetch_ticket(engine.on_catalog_loaded(Ok(catalog())));
    engine.on_trajectory_loaded(ticket, Ok(br#"{"meta": {}, "score": 1}"#.to_vec()));

    let empty = engine
        .projector()
        .iter()
        .find_map(|e| match e {
            RenderEvent::EmptyState(state) => Some(state.clone()),
            _ => None,
        })
        .expect("empty state");
    assert_eq!(empty.top_level_fields, vec!["meta", "score"]);
    assert!(statuses(&engine).contains(&"Loaded: claude_fix-ci.json (0 msgs)"));
}

#[test]
fn autoplay_starts_after_load() {
    let settings = PlaybackSettings {
        autoplay: true,
        ..PlaybackSettings::default()
    };
    let mut engine = Engine::new(ManualTimer::new(), Vec::new(), MemoryLocation::new("/"), &settings);
    let ticket = fetch_ticket(engine.on_catalog_loaded(Ok(catalog())));
    engine.on_trajectory_loaded(ticket, Ok(serde_json::to_vec(&testing::conversation(2)).expect("json")));
    assert_eq!(engine.state(), PlaybackState::Playing);
    assert_eq!(engine.player().timer().pending_delay(), Some(settings.message_delay()));
}

#[test]
fn failure_reason_is_shown_after_last_assistant() {
    let mut engine = engine_at("/");
    engine.on_catalog_loaded(Ok(catalog()));
    load(
        &mut engine,
        "claude",
        "fix-ci",
        json!({
            "success": false,
            "failure_reason": "timeout",
            "messages": [
                {"role": "user", "content": "do it"},
                {"role": "assistant", "content": "trying"}
            ]
        }),
    );
    engine.handle(Command::ShowAll);
    let shown = visible_messages(engine.projector());
    let last = shown.last().expect("messages");
    assert!(last.message.is_synthetic);
    assert_eq!(last.message.content, "Failure reason: timeout");
    assert_eq!(last.message.index, 2);
}

#[test]
fn select_task_uses_the_selected_model() {
    let mut engine = engine_at("/gpt-5");
    engine.on_catalog_loaded(Ok(catalog()));
    let ticket = fetch_ticket(engine.handle(Command::SelectTask("fix_flaky_test".into())));
    assert_eq!(ticket.filename(), "gpt-5_fix_flaky_test.json");

    let mut fresh = engine_at("/");
    assert_eq!(fresh.handle(Command::SelectTask("fix-ci".into())), None);
    assert!(statuses(&fresh).contains(&"Select a model first"));
}
