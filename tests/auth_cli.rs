mod support;

use predicates::str::contains;
use serde_json::Value;

use support::{TestHome, EMAIL, PASSWORD};

#[test]
fn signup_logs_in_and_keeps_no_plaintext() {
    let home = TestHome::new();
    let value = home.signup();
    assert_eq!(value["schema_version"], "tasksphere.v1");
    assert_eq!(value["command"], "signup");
    assert_eq!(value["data"]["email"], EMAIL);

    let user = home.read_json("user.json");
    assert_eq!(user["name"], "Ada");
    assert_eq!(user["points"], 0);
    assert_eq!(user["streak"], 0);
    let credential = user["hashedPassword"].as_str().expect("credential");
    assert!(!credential.contains(PASSWORD));

    let session = home.read_json("sessionToken.json");
    assert!(session["token"].is_string());
    assert!(session["expires"].is_string());

    let whoami = home.json(&["whoami"]);
    assert_eq!(whoami["data"]["authenticated"], true);
    assert_eq!(whoami["data"]["user"]["email"], EMAIL);
}

#[test]
fn duplicate_signup_is_a_conflict() {
    let home = TestHome::new();
    home.signup();
    let before = home.read_json("user.json");

    let value = home.json_failure(
        &["signup", "--name", "Other", "--email", EMAIL, "--password", "different"],
        3,
    );
    assert_eq!(value["status"], "error");
    assert_eq!(value["error"]["kind"], "conflict");
    assert_eq!(value["error"]["message"], "Authentication failed: Email already registered");
    assert_eq!(home.read_json("user.json"), before);
}

#[test]
fn login_failures_are_typed() {
    let home = TestHome::new();

    let unknown = home.json_failure(&["login", "--email", EMAIL, "--password", PASSWORD], 3);
    assert_eq!(unknown["error"]["kind"], "not_found");
    assert_eq!(unknown["error"]["details"]["reason"], "not_found");

    home.signup();
    home.json(&["logout"]);

    let wrong = home.json_failure(&["login", "--email", EMAIL, "--password", "nope"], 3);
    assert_eq!(wrong["error"]["kind"], "invalid_credential");
}

#[test]
fn logout_keeps_account_for_next_login() {
    let home = TestHome::new();
    home.signup();

    let out = home.json(&["logout"]);
    assert_eq!(out["data"]["was_authenticated"], true);
    assert_eq!(home.read_json("sessionToken.json"), Value::Null);
    assert_eq!(home.read_json("user.json")["email"], EMAIL);

    let whoami = home.json(&["whoami"]);
    assert_eq!(whoami["data"]["authenticated"], false);

    let login = home.json(&["login", "--email", EMAIL, "--password", PASSWORD]);
    assert_eq!(login["data"]["email"], EMAIL);
}

#[test]
fn password_can_come_from_env() {
    let home = TestHome::new();
    home.cmd()
        .env("TASKSPHERE_PASSWORD", PASSWORD)
        .args(["signup", "--name", "Ada", "--email", EMAIL])
        .assert()
        .success()
        .stdout(contains("Signed up"));

    home.cmd()
        .env("TASKSPHERE_PASSWORD", PASSWORD)
        .args(["login", "--email", EMAIL])
        .assert()
        .success()
        .stdout(contains("Logged in"));
}

#[test]
fn empty_fields_are_rejected_before_auth() {
    let home = TestHome::new();
    home.cmd()
        .args(["signup", "--name", "Ada", "--email", " ", "--password", PASSWORD])
        .assert()
        .code(2)
        .stderr(contains("email cannot be empty"));
    assert!(!home.path().join("user.json").exists());
}

#[test]
fn reset_password_always_succeeds_without_change() {
    let home = TestHome::new();
    home.signup();
    let before = home.read_json("user.json");

    let value = home.json(&["reset-password", "--email", "someone@else.com"]);
    assert_eq!(value["data"]["requested"], true);
    assert_eq!(home.read_json("user.json"), before);

    home.json(&["logout"]);
    home.json(&["login", "--email", EMAIL, "--password", PASSWORD]);
}

#[test]
fn expired_session_is_cleared_on_next_start() {
    let home = TestHome::new();
    home.signup();

    let mut session = home.read_json("sessionToken.json");
    session["expires"] = Value::String("2000-01-01T00:00:00Z".to_string());
    std::fs::write(
        home.path().join("sessionToken.json"),
        serde_json::to_string(&session).expect("serialize"),
    )
    .expect("write session");

    let value = home.json_failure(&["task", "ls"], 3);
    assert_eq!(value["error"]["kind"], "unauthenticated");
    assert_eq!(home.read_json("sessionToken.json"), Value::Null);
}

#[test]
fn human_errors_go_to_stderr_with_hint() {
    let home = TestHome::new();
    home.cmd()
        .args(["focus"])
        .assert()
        .code(3)
        .stderr(contains("error: Not logged in"))
        .stderr(contains("hint: tasksphere login"));
}
