use std::fs;
use std::path::Path;
use std::process::{Command, Output, Stdio};

use serde_json::Value;
use trajview_core::testing;

fn write_trajectory(dir: &Path, filename: &str, body: &Value) {
    fs::create_dir_all(dir).expect("create dir");
    fs::write(dir.join(filename), serde_json::to_vec(body).expect("json")).expect("write");
}

fn run(home: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_trajview"))
        .args(args)
        .env("HOME", home)
        .env("USERPROFILE", home)
        .env_remove("RUST_LOG")
        .stdin(Stdio::null())
        .output()
        .expect("run trajview")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

#[test]
fn show_prints_every_message() {
    let home = tempfile::tempdir().expect("home");
    let trajs = home.path().join("trajs");
    write_trajectory(&trajs, "gpt-5_demo.json", &testing::conversation(2));

    let output = run(
        home.path(),
        &["show", "gpt-5_demo", "--dir", trajs.to_str().expect("utf8 path")],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("Loaded: gpt-5_demo.json (2 msgs)"), "{text}");
    assert!(text.contains("[1] user"), "{text}");
    assert!(text.contains("assistant turn 1"), "{text}");
    assert!(text.contains("[finished] 2/2 (100%)"), "{text}");
}

#[test]
fn show_json_emits_tagged_events() {
    let home = tempfile::tempdir().expect("home");
    let trajs = home.path().join("trajs");
    write_trajectory(
        &trajs,
        "claude_tools.json",
        &serde_json::json!([
            testing::assistant_calling("", "c1", "grep", "{}"),
            testing::tool_result("c1", "Tool grep not found"),
        ]),
    );

    let output = run(
        home.path(),
        &["show", "/claude_tools", "--json", "--dir", trajs.to_str().expect("utf8 path")],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let events: Vec<Value> = stdout(&output)
        .lines()
        .map(|line| serde_json::from_str(line).expect("json line"))
        .collect();
    let appended: Vec<&Value> = events.iter().filter(|e| e["event"] == "append").collect();
    assert_eq!(appended.len(), 1);
    assert_eq!(
        appended[0]["tool_groups"][0]["tools"][0]["status"],
        "name_not_found"
    );
}

#[test]
fn show_unknown_task_fails() {
    let home = tempfile::tempdir().expect("home");
    let trajs = home.path().join("trajs");
    write_trajectory(&trajs, "gpt-5_demo.json", &testing::conversation(1));

    let output = run(
        home.path(),
        &["show", "gpt-5_other", "--dir", trajs.to_str().expect("utf8 path")],
    );
    assert!(!output.status.success());
    assert!(stderr(&output).contains("Task not found: other"));
}

#[test]
fn list_groups_tasks_by_model() {
    let home = tempfile::tempdir().expect("home");
    let trajs = home.path().join("trajs");
    write_trajectory(&trajs, "gpt-5_b.json", &testing::conversation(1));
    write_trajectory(&trajs, "gpt-5_a_with_underscores.json", &testing::conversation(1));
    write_trajectory(&trajs, "claude_x.json", &testing::conversation(1));

    let output = run(home.path(), &["list", "--dir", trajs.to_str().expect("utf8 path")]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    let claude = text.find("claude\n").expect("claude listed");
    let gpt = text.find("gpt-5\n").expect("gpt-5 listed");
    assert!(claude < gpt);
    assert!(text.contains("a_with_underscores"));
}

#[test]
fn replay_autoplays_to_the_end_and_exits() {
    let home = tempfile::tempdir().expect("home");
    let trajs = home.path().join("trajs");
    write_trajectory(&trajs, "gpt-5_demo.json", &testing::conversation(3));

    let output = run(
        home.path(),
        &[
            "replay",
            "/gpt-5_demo",
            "--dir",
            trajs.to_str().expect("utf8 path"),
            "--autoplay",
            "--exit-on-finish",
            "--delay-ms",
            "5",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("[playing]"), "{text}");
    assert!(text.contains("[finished] 3/3 (100%)"), "{text}");
}

#[test]
fn config_prints_file_values_over_defaults() {
    let home = tempfile::tempdir().expect("home");
    let config_dir = home.path().join(".config").join("trajview");
    fs::create_dir_all(&config_dir).expect("config dir");
    fs::write(
        config_dir.join("trajview.toml"),
        "[playback]\nmessage_delay_ms = 250\n",
    )
    .expect("write config");

    let output = run(home.path(), &["config"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let text = stdout(&output);
    assert!(text.contains("message_delay_ms = 250"), "{text}");
    assert!(text.contains("tool_presentation = \"joint\""), "{text}");
    assert!(text.contains("traj_dir = \"trajs\""), "{text}");
}
