use assert_cmd::Command;
use predicates::prelude::*;
use std::sync::{Arc, Mutex};
use tempfile::tempdir;
use tracing::field::{Field, Visit};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

const ENV_KEYS: [&str; 13] = [
    "VIDEO_ID",
    "R2_ACCESS_KEY",
    "R2_SECRET_KEY",
    "R2_ENDPOINT",
    "R2_BUCKET",
    "R2_PUBLIC_URL",
    "R2_REGION",
    "DATABASE_URL",
    "DB_HOST",
    "DB_PORT",
    "DB_NAME",
    "DB_USER",
    "DB_PASSWORD",
];

fn uploader_in(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("shorts-uploader").expect("Binary exists");
    cmd.current_dir(dir).env_remove("RUST_LOG");
    for key in ENV_KEYS {
        cmd.env_remove(key);
    }
    cmd
}

#[test]
fn upload_fails_listing_every_missing_variable() {
    let workdir = tempdir().unwrap();
    let mut cmd = uploader_in(workdir.path());
    cmd.arg("upload").env("R2_BUCKET", "shorts");

    cmd.assert().failure().code(1).stderr(
        predicate::str::contains("VIDEO_ID")
            .and(predicate::str::contains("R2_ACCESS_KEY"))
            .and(predicate::str::contains("R2_SECRET_KEY"))
            .and(predicate::str::contains("R2_ENDPOINT"))
            .and(predicate::str::contains("DATABASE_URL"))
            .and(predicate::str::contains("R2_BUCKET").not()),
    );
}

#[test]
fn upload_fails_when_shorts_directory_is_missing() {
    let workdir = tempdir().unwrap();
    let mut cmd = uploader_in(workdir.path());
    cmd.arg("upload")
        .arg("--shorts-dir")
        .arg(workdir.path().join("does-not-exist"))
        .env("VIDEO_ID", "abc")
        .env("R2_ACCESS_KEY", "key")
        .env("R2_SECRET_KEY", "secret")
        .env("R2_ENDPOINT", "http://127.0.0.1:1")
        .env("R2_BUCKET", "shorts")
        // Never reached: enumeration fails first.
        .env("DATABASE_URL", "postgres://nobody@127.0.0.1:1/none");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("clip directory not found"));
}

#[test]
fn upload_fails_when_there_is_nothing_to_upload() {
    let workdir = tempdir().unwrap();
    let shorts = workdir.path().join("shorts");
    std::fs::create_dir(&shorts).unwrap();
    std::fs::write(shorts.join("notes.txt"), b"not a clip").unwrap();

    let mut cmd = uploader_in(workdir.path());
    cmd.arg("upload")
        .env("VIDEO_ID", "abc")
        .env("R2_ACCESS_KEY", "key")
        .env("R2_SECRET_KEY", "secret")
        .env("R2_ENDPOINT", "http://127.0.0.1:1")
        .env("R2_BUCKET", "shorts")
        .env("DATABASE_URL", "postgres://nobody@127.0.0.1:1/none");

    cmd.assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("nothing to upload"));
}

/// Records the `message` field of every event, in order.
#[derive(Clone, Default)]
struct MessageLog(Arc<Mutex<Vec<String>>>);

struct MessageField<'a>(&'a mut Option<String>);

impl Visit for MessageField<'_> {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            *self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S: tracing::Subscriber> Layer<S> for MessageLog {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        let mut message = None;
        event.record(&mut MessageField(&mut message));
        if let Some(message) = message {
            self.0.lock().unwrap().push(message);
        }
    }
}

#[tokio::test]
async fn emits_trace_initialised_event_first() {
    let log = MessageLog::default();
    let _guard = tracing::subscriber::set_default(Registry::default().with(log.clone()));

    use shorts_uploader::cli::{run, Cli, Commands};

    // Fails during configuration whatever the environment holds: either a
    // variable is missing or the config file does not exist.
    let cli = Cli {
        command: Commands::Upload {
            config: Some(std::path::PathBuf::from("does-not-exist.yaml")),
            shorts_dir: None,
            sidecar: None,
            only_target_video: false,
            no_verify: false,
        },
    };

    assert!(run(cli).await.is_err());

    let messages = log.0.lock().unwrap();
    assert_eq!(
        messages.first().map(String::as_str),
        Some("trace_initialised"),
        "events: {messages:?}"
    );
}
