//! End-to-end tests against a fake `restic` shell script.
//!
//! The script keeps its repository state in a temp directory and appends
//! every subcommand it receives to a log file, so the tests can check which
//! commands the wrapper actually spawned.

#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use pretty_assertions::assert_eq;
use restic_config::ResticConfig;
use restic_core::ErrorKind;
use restic_exec::{Invocation, Platform, ProcessExecutor, Restic};
use tempfile::TempDir;

const FAKE_RESTIC: &str = r#"#!/bin/sh
echo "$1" >> "$FAKE_STATE/calls.log"

if [ "$RESTIC_PASSWORD" != "$FAKE_EXPECTED_PASSWORD" ]; then
    echo '{"message_type":"exit_error","code":12,"message":"wrong password"}' >&2
    exit 12
fi

case "$1" in
    cat)
        if [ -f "$FAKE_STATE/initialized" ]; then
            echo '{"version":2,"id":"abc"}'
            exit 0
        fi
        echo '{"message_type":"exit_error","code":10,"message":"Fatal: repository does not exist"}' >&2
        exit 10
        ;;
    init)
        if [ -n "$FAKE_INIT_FAILS" ]; then
            echo 'Fatal: create repository failed: permission denied' >&2
            exit 1
        fi
        touch "$FAKE_STATE/initialized"
        echo '{"message_type":"initialized","id":"abc","repository":"'"$RESTIC_REPOSITORY"'"}'
        exit 0
        ;;
    echo-args)
        echo "$@"
        exit 0
        ;;
    print-env)
        env | sort
        exit 0
        ;;
    warn)
        echo 'warning: something odd' >&2
        echo '{"ok":true}'
        exit 0
        ;;
    fail)
        echo "$FAKE_STDERR" >&2
        exit "$FAKE_EXIT"
        ;;
    sleep)
        echo $$ > "$FAKE_STATE/pid"
        exec sleep 30
        ;;
    background)
        sleep 5 &
        exit 0
        ;;
    quick)
        sleep 0.05
        echo '{"ok":true}'
        exit 0
        ;;
    show-tmpdir)
        echo "TMPDIR=${TMPDIR-unset}"
        exit 0
        ;;
esac

echo "unknown command $1" >&2
exit 1
"#;

/// A temp directory holding the fake executable and its state.
struct Fixture {
    dir: TempDir,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let script = dir.path().join("restic");
        fs::write(&script, FAKE_RESTIC).unwrap();
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755)).unwrap();
        Self { dir }
    }

    fn initialized() -> Self {
        let fixture = Self::new();
        fs::write(fixture.dir.path().join("initialized"), "").unwrap();
        fixture
    }

    fn executable(&self) -> PathBuf {
        self.dir.path().join("restic")
    }

    fn config(&self, password: &str) -> ResticConfig {
        ResticConfig::new("/srv/backup", password)
            .with_path(self.executable().to_string_lossy())
            .with_env("FAKE_STATE", self.dir.path().to_string_lossy())
            .with_env("FAKE_EXPECTED_PASSWORD", "correct")
    }

    fn calls(&self) -> Vec<String> {
        fs::read_to_string(self.dir.path().join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(str::to_string)
            .collect()
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }
}

fn wait_for_file(path: &Path) -> String {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if let Ok(content) = fs::read_to_string(path) {
            if !content.trim().is_empty() {
                return content.trim().to_string();
            }
        }
        std::thread::sleep(Duration::from_millis(10));
    }
    panic!("{} never appeared", path.display());
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[test]
fn initialized_repository_only_probes() {
    let fx = Fixture::initialized();
    Restic::new(fx.config("correct"), false).unwrap();
    assert_eq!(fx.calls(), vec!["cat"]);
}

#[test]
fn scenario_a_auto_init_creates_repository() {
    let fx = Fixture::new();
    let restic = Restic::new(fx.config("correct"), true).unwrap();
    assert_eq!(fx.calls(), vec!["cat", "init"]);
    assert!(fx.path("initialized").exists());
    assert_eq!(
        restic.executable().canonicalize().unwrap(),
        fx.executable().canonicalize().unwrap()
    );

    // A second wrapper sees the repository as ready.
    Restic::new(fx.config("correct"), true).unwrap();
    assert_eq!(fx.calls(), vec!["cat", "init", "cat"]);
}

#[test]
fn scenario_b_missing_repository_without_auto_init() {
    let fx = Fixture::new();
    let err = Restic::new(fx.config("correct"), false).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Repository);
    assert_eq!(err.exit_code(), Some(10));
    assert_eq!(err.detail(), Some("Fatal: repository does not exist"));
    assert_eq!(fx.calls(), vec!["cat"]);
    assert!(!fx.path("initialized").exists());
}

#[test]
fn scenario_c_wrong_password_never_initializes() {
    let fx = Fixture::initialized();
    let err = Restic::new(fx.config("wrong"), true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Password);
    assert!(err.is_repository_error());
    assert!(err.to_string().contains("wrong password"));
    assert_eq!(fx.calls(), vec!["cat"]);
}

#[test]
fn failed_auto_init_surfaces_init_error() {
    let fx = Fixture::new();
    let config = fx.config("correct").with_env("FAKE_INIT_FAILS", "1");
    let err = Restic::new(config, true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Command);
    assert!(err.to_string().contains("execution of init failed: command failed"));
    assert!(err.to_string().contains("permission denied"));
    assert_eq!(fx.calls(), vec!["cat", "init"]);
}

#[test]
fn invalid_config_spawns_nothing() {
    let fx = Fixture::initialized();
    let err = Restic::new(fx.config(""), true).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Config);
    assert!(fx.calls().is_empty());
}

// ---------------------------------------------------------------------------
// Execution
// ---------------------------------------------------------------------------

#[test]
fn arguments_end_with_json_flag() {
    let fx = Fixture::initialized();
    let restic = Restic::new(fx.config("correct"), false).unwrap();
    let out = restic.run("echo-args", ["--host", "web 1"]).unwrap();
    assert_eq!(out, "echo-args --host web 1 --json\n");
}

#[test]
fn child_environment_is_built_not_inherited() {
    let fx = Fixture::initialized();
    let restic = Restic::new(fx.config("correct"), false).unwrap();
    let out = restic
        .exec(&Invocation::new("print-env").env("TMPDIR", "/override/tmp"))
        .unwrap();

    let vars: Vec<&str> = out.lines().collect();
    assert!(vars.contains(&"RESTIC_REPOSITORY=/srv/backup"));
    assert!(vars.contains(&"RESTIC_PASSWORD=correct"));
    assert!(vars.contains(&"TMPDIR=/override/tmp"));
    assert!(vars.iter().any(|v| v.starts_with("PATH=")));
    assert!(!vars.iter().any(|v| v.starts_with("HOME=")));
    assert!(!vars.iter().any(|v| v.starts_with("CARGO_PKG_NAME=")));
}

#[test]
fn stderr_is_ignored_on_success() {
    let fx = Fixture::initialized();
    let restic = Restic::new(fx.config("correct"), false).unwrap();
    assert_eq!(restic.run("warn", Vec::<String>::new()).unwrap(), "{\"ok\":true}\n");
}

#[test]
fn exit_codes_map_to_kinds() {
    let fx = Fixture::initialized();
    let restic = Restic::new(fx.config("correct"), false).unwrap();

    let cases = [
        (1, ErrorKind::Command),
        (2, ErrorKind::Runtime),
        (3, ErrorKind::Command),
        (10, ErrorKind::Repository),
        (11, ErrorKind::Repository),
        (12, ErrorKind::Password),
        (130, ErrorKind::Command),
        (42, ErrorKind::Command),
    ];
    for (code, kind) in cases {
        let inv = Invocation::new("fail")
            .env("FAKE_EXIT", code.to_string())
            .env("FAKE_STDERR", "");
        let err = restic.exec(&inv).unwrap_err();
        assert_eq!(err.kind(), kind, "exit code {code}");
        assert_eq!(err.exit_code(), Some(code));
    }
}

#[test]
fn malformed_stderr_is_kept_verbatim() {
    let fx = Fixture::initialized();
    let restic = Restic::new(fx.config("correct"), false).unwrap();
    let inv = Invocation::new("fail")
        .env("FAKE_EXIT", "10")
        .env("FAKE_STDERR", "not json");
    let err = restic.exec(&inv).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Repository);
    assert!(err.to_string().contains("not json"));
}

#[test]
fn scenario_d_timeout_kills_the_process() {
    let fx = Fixture::initialized();
    let restic = Restic::new(fx.config("correct"), false).unwrap();

    let started = Instant::now();
    let err = restic
        .exec(&Invocation::new("sleep").timeout(Duration::from_millis(300)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Command);
    assert!(err.to_string().contains("timed out"));
    assert!(started.elapsed() < Duration::from_secs(10));

    let pid = wait_for_file(&fx.path("pid"));
    #[cfg(target_os = "linux")]
    assert!(
        !Path::new(&format!("/proc/{pid}")).exists(),
        "process {pid} is still running"
    );
    let _ = pid;
}

#[test]
fn config_timeout_applies_when_invocation_has_none() {
    let fx = Fixture::initialized();
    let config = fx.config("correct").with_timeout(Duration::from_secs(1));
    let restic = Restic::new(config, false).unwrap();
    let err = restic.run("sleep", Vec::<String>::new()).unwrap_err();
    assert!(err.to_string().contains("execution of sleep timed out"));
}

#[test]
fn timeout_covers_helpers_holding_the_output_pipes() {
    let fx = Fixture::initialized();
    let restic = Restic::new(fx.config("correct"), false).unwrap();

    let started = Instant::now();
    let err = restic
        .exec(&Invocation::new("background").timeout(Duration::from_millis(300)))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Command);
    assert_eq!(err.to_string(), "execution of background timed out");
    assert!(
        started.elapsed() < Duration::from_secs(3),
        "returned after {:?}",
        started.elapsed()
    );
}

#[test]
fn sub_second_config_timeout_is_kept() {
    let fx = Fixture::initialized();
    let config = fx.config("correct").with_timeout(Duration::from_millis(900));
    let restic = Restic::new(config, false).unwrap();
    assert_eq!(restic.config().default_timeout(), Some(Duration::from_millis(900)));
    assert_eq!(restic.run("quick", Vec::<String>::new()).unwrap(), "{\"ok\":true}\n");
}

#[test]
fn injected_executor_decides_the_platform() {
    let fx = Fixture::initialized();
    let config = fx.config("correct");
    let executor = ProcessExecutor::new(fx.executable(), config.clone(), Platform::Unknown);
    let restic = Restic::with_executor(config, false, executor).unwrap();

    assert_eq!(restic.platform(), Platform::Unknown);
    // Unknown platforms get no temp-directory variable.
    assert_eq!(restic.run("show-tmpdir", Vec::<String>::new()).unwrap(), "TMPDIR=unset\n");
}

#[test]
fn vanished_executable_is_command_error() {
    let fx = Fixture::initialized();
    let restic = Restic::new(fx.config("correct"), false).unwrap();
    fs::remove_file(fx.executable()).unwrap();

    let err = restic.run("snapshots", Vec::<String>::new()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Command);
    assert!(err.to_string().starts_with("execution of snapshots failed"));
    assert_eq!(err.exit_code(), None);
}
