mod support;

use predicates::str::contains;

use support::TestHome;

fn logged_in() -> TestHome {
    let home = TestHome::new();
    home.signup();
    home
}

#[test]
fn task_commands_require_a_session() {
    let home = TestHome::new();
    for args in [
        vec!["task", "ls"],
        vec!["task", "add", "Nope"],
        vec!["focus"],
        vec!["stats"],
    ] {
        let value = home.json_failure(&args, 3);
        assert_eq!(value["error"]["kind"], "unauthenticated");
    }
    assert!(!home.path().join("tasks.json").exists());
}

#[test]
fn add_applies_defaults_and_flags() -> Result<(), Box<dyn std::error::Error>> {
    let home = logged_in();

    let plain = home.json(&["task", "add", "Plain"]);
    let task = &plain["data"];
    assert_eq!(task["title"], "Plain");
    assert_eq!(task["status"], "todo");
    assert_eq!(task["priority"], "medium");
    assert_eq!(task["projectId"], "default");
    assert_eq!(task["createdBy"], "current-user");
    assert_eq!(task["createdAt"], task["updatedAt"]);

    let full = home.json(&[
        "task", "add", "Ship it",
        "--description", "release notes",
        "--status", "in-progress",
        "--priority", "urgent",
        "--due", "2030-01-15",
        "--tag", "release", "--tag", "#release", "--tag", "docs",
        "--project", "work",
        "--subtask", "write", "--subtask", "publish",
    ]);
    let task = &full["data"];
    assert_eq!(task["status"], "in-progress");
    assert_eq!(task["priority"], "urgent");
    assert_eq!(task["dueDate"], "2030-01-15T00:00:00Z");
    assert_eq!(task["tags"], serde_json::json!(["release", "docs"]));
    assert_eq!(task["subtasks"].as_array().map(Vec::len), Some(2));
    assert_eq!(task["subtasks"][0]["completed"], false);
    assert_eq!(full["warnings"][0], "project 'work' does not exist yet");

    let stored = home.read_json("tasks.json");
    assert_eq!(stored.as_array().map(Vec::len), Some(2));
    Ok(())
}

#[test]
fn add_rejects_bad_input() {
    let home = logged_in();
    home.cmd()
        .args(["task", "add", "X", "--priority", "critical"])
        .assert()
        .code(2)
        .stderr(contains("invalid priority"));
    home.cmd()
        .args(["task", "add", "X", "--due", "someday"])
        .assert()
        .code(2);
    home.cmd()
        .args(["task", "add", "   "])
        .assert()
        .code(2)
        .stderr(contains("title cannot be empty"));
}

#[test]
fn edit_move_and_remove_touch_only_the_target() {
    let home = logged_in();
    let keep = home.add_task(&["Keep"]);
    let target = home.add_task(&["Target", "--due", "3d"]);
    let keep_before = home.json(&["task", "show", &keep])["data"].clone();

    let edited = home.json(&["task", "edit", &target[..8], "--title", "Renamed", "--clear-due"]);
    assert_eq!(edited["data"]["title"], "Renamed");
    assert!(edited["data"].get("dueDate").is_none());

    let moved = home.json(&["task", "move", &target, "review"]);
    assert_eq!(moved["data"]["status"], "review");
    assert_eq!(moved["data"]["title"], "Renamed");

    let removed = home.json(&["task", "rm", &target]);
    assert_eq!(removed["data"]["id"], target.as_str());

    let listed = home.json(&["task", "ls"]);
    assert_eq!(listed["data"]["total"], 1);
    assert_eq!(listed["data"]["tasks"][0], keep_before);
}

#[test]
fn edit_without_fields_is_rejected() {
    let home = logged_in();
    let id = home.add_task(&["Idle"]);
    home.cmd()
        .args(["task", "edit", &id])
        .assert()
        .code(2)
        .stderr(contains("nothing to change"));
}

#[test]
fn unknown_and_ambiguous_ids() {
    let home = logged_in();
    home.add_task(&["One"]);

    let missing = home.json_failure(&["task", "show", "ffffffff-ffff-4fff-bfff-ffffffffffff"], 2);
    assert_eq!(missing["error"]["kind"], "not_found");
    assert_eq!(
        missing["error"]["details"]["id"],
        "ffffffff-ffff-4fff-bfff-ffffffffffff"
    );

    home.cmd()
        .args(["task", "move", "zzz", "review"])
        .assert()
        .code(2)
        .stderr(contains("Task not found"));

    home.cmd()
        .args(["task", "move", "", "review"])
        .assert()
        .code(2);
}

#[test]
fn list_filters_and_sorts() {
    let home = logged_in();
    home.add_task(&["Write report", "--priority", "high", "--tag", "finance"]);
    home.add_task(&["Buy milk", "--priority", "low", "--status", "completed"]);
    home.add_task(&["Plan trip", "--priority", "urgent", "--description", "Report back"]);

    let search = home.json(&["task", "ls", "--search", "REPORT"]);
    assert_eq!(search["data"]["total"], 2);

    let open = home.json(&["task", "ls", "--open", "--sort", "priority", "--desc"]);
    let titles: Vec<&str> = open["data"]["tasks"]
        .as_array()
        .expect("tasks")
        .iter()
        .filter_map(|task| task["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Plan trip", "Write report"]);

    let tagged = home.json(&["task", "ls", "--tag", "#Finance"]);
    assert_eq!(tagged["data"]["total"], 1);

    home.cmd()
        .args(["task", "ls", "--status", "completed"])
        .assert()
        .success()
        .stdout(contains("[completed][low] Buy milk"));

    home.cmd()
        .args(["task", "ls", "--sort", "size"])
        .assert()
        .code(2)
        .stderr(contains("invalid sort key"));
}

#[test]
fn check_toggles_subtasks() {
    let home = logged_in();
    let id = home.add_task(&["Steps", "--subtask", "first", "--subtask", "second"]);

    let checked = home.json(&["task", "check", &id, "2"]);
    assert_eq!(checked["data"]["subtasks"][0]["completed"], false);
    assert_eq!(checked["data"]["subtasks"][1]["completed"], true);

    let unchecked = home.json(&["task", "check", &id, "2", "--uncheck"]);
    assert_eq!(unchecked["data"]["subtasks"][1]["completed"], false);

    home.cmd()
        .args(["task", "check", &id, "9"])
        .assert()
        .code(2)
        .stderr(contains("no subtask"));

    home.cmd()
        .args(["task", "show", &id])
        .assert()
        .success()
        .stdout(contains("1. [ ] first"));
}

#[test]
fn data_dir_flag_overrides_env() {
    let home = logged_in();
    let other = TestHome::new();

    other
        .cmd()
        .args(["--data-dir"])
        .arg(home.path())
        .args(["task", "add", "Via flag"])
        .assert()
        .success();

    let listed = home.json(&["task", "ls"]);
    assert_eq!(listed["data"]["total"], 1);
    assert!(!other.path().join("tasks.json").exists());
}

#[test]
fn empty_store_is_seeded_once() {
    let home = TestHome::with_seed(true);
    home.signup();

    let first = home.json(&["task", "ls"]);
    let total = first["data"]["total"].as_u64().expect("total");
    assert!(total > 0);

    let stats = home.json(&["stats"]);
    assert_eq!(stats["data"]["total"].as_u64(), Some(total));
    assert!(stats["data"]["projects"].as_u64().unwrap_or(0) > 0);

    let second = home.json(&["task", "ls"]);
    assert_eq!(first["data"]["tasks"], second["data"]["tasks"]);
}
