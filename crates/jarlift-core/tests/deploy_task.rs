//! Integration tests for the deploy task against a local installation root.

mod support;

use std::fs;

use jarlift_core::prelude::{DeployTask, LocalRemote, PointerError, VersionOrder};
use support::{RecordingRemote, Sandbox};

#[test]
fn clean_keeps_five_newest_and_current() {
    let sandbox = Sandbox::new();
    for version in 1..=7 {
        sandbox.install_file(&version.to_string());
    }
    sandbox.point_current_at(&sandbox.root.join("bouncer-7.jar"));

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());
    let report = task.clean_installed().unwrap();

    assert_eq!(report.deleted, vec!["bouncer-1.jar"]);
    assert_eq!(report.kept.len(), 5);
    assert_eq!(
        sandbox.root_entries(),
        vec![
            "bouncer-2.jar",
            "bouncer-3.jar",
            "bouncer-4.jar",
            "bouncer-5.jar",
            "bouncer-6.jar",
            "bouncer-7.jar",
            "current.jar",
        ]
    );
}

#[test]
fn clean_never_removes_current_even_when_oldest() {
    let sandbox = Sandbox::new();
    for version in 1..=4 {
        sandbox.install_file(&version.to_string());
    }
    sandbox.point_current_at(&sandbox.root.join("bouncer-1.jar"));

    let config = sandbox.config().with_keep(1);
    let task = DeployTask::new(config, LocalRemote::new());
    let report = task.clean_installed().unwrap();

    assert_eq!(report.deleted, vec!["bouncer-2.jar", "bouncer-3.jar"]);
    assert_eq!(report.kept, vec!["bouncer-4.jar"]);
    assert!(sandbox.root.join("bouncer-1.jar").exists());
}

#[test]
fn clean_with_nothing_to_remove_is_a_no_op() {
    let sandbox = Sandbox::new();
    sandbox.install_file("1");
    sandbox.install_file("2");
    sandbox.point_current_at(&sandbox.root.join("bouncer-2.jar"));

    let remote = RecordingRemote::new();
    let task = DeployTask::new(sandbox.config(), remote);
    let report = task.clean_installed().unwrap();

    assert!(report.deleted.is_empty());
    assert_eq!(report.kept, vec!["bouncer-1.jar"]);
    assert!(!task.remote().ops().contains(&"remove".to_string()));
}

#[test]
fn clean_lists_and_removes_as_root() {
    let sandbox = Sandbox::new();
    for version in 1..=7 {
        sandbox.install_file(&version.to_string());
    }
    sandbox.point_current_at(&sandbox.root.join("bouncer-7.jar"));

    let task = DeployTask::new(sandbox.config(), RecordingRemote::new());
    task.clean_installed().unwrap();

    let calls = task.remote().calls();
    assert!(calls.contains(&"glob root".to_string()));
    assert!(calls.contains(&"remove root".to_string()));
}

#[test]
fn semantic_order_treats_ten_as_newer_than_nine() {
    let sandbox = Sandbox::new();
    for version in ["8", "9", "10", "11"] {
        sandbox.install_file(version);
    }
    sandbox.point_current_at(&sandbox.root.join("bouncer-11.jar"));

    let config = sandbox.config().with_keep(1);
    let task = DeployTask::new(config, LocalRemote::new());
    let report = task.clean_installed().unwrap();

    assert_eq!(report.deleted, vec!["bouncer-8.jar", "bouncer-9.jar"]);
    assert_eq!(report.kept, vec!["bouncer-10.jar"]);
}

#[test]
fn semantic_order_keeps_newest_snapshot() {
    let sandbox = Sandbox::new();
    for version in ["0.9", "1.0", "1.1", "1.2-SNAPSHOT"] {
        sandbox.install_file(version);
    }
    sandbox.point_current_at(&sandbox.root.join("bouncer-1.1.jar"));

    let config = sandbox.config().with_keep(1);
    let task = DeployTask::new(config, LocalRemote::new());
    let report = task.clean_installed().unwrap();

    assert_eq!(report.deleted, vec!["bouncer-0.9.jar", "bouncer-1.0.jar"]);
    assert_eq!(report.kept, vec!["bouncer-1.2-SNAPSHOT.jar"]);
    assert!(sandbox.root.join("bouncer-1.2-SNAPSHOT.jar").exists());
}

#[test]
fn snapshot_sorts_below_its_release() {
    let sandbox = Sandbox::new();
    for version in ["1.1", "1.2-SNAPSHOT", "1.2"] {
        sandbox.install_file(version);
    }
    sandbox.point_current_at(&sandbox.root.join("bouncer-1.2.jar"));

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());
    let versions: Vec<_> = task
        .installed_versions()
        .unwrap()
        .into_iter()
        .map(|a| a.version)
        .collect();

    assert_eq!(versions, vec!["1.1", "1.2-SNAPSHOT", "1.2"]);
}

#[test]
fn lexicographic_order_reproduces_filename_sort() {
    let sandbox = Sandbox::new();
    for version in ["8", "9", "10", "11"] {
        sandbox.install_file(version);
    }
    sandbox.point_current_at(&sandbox.root.join("bouncer-11.jar"));

    let config = sandbox
        .config()
        .with_keep(1)
        .with_version_order(VersionOrder::Lexicographic);
    let task = DeployTask::new(config, LocalRemote::new());
    let report = task.clean_installed().unwrap();

    assert_eq!(report.deleted, vec!["bouncer-10.jar", "bouncer-8.jar"]);
    assert_eq!(report.kept, vec!["bouncer-9.jar"]);
}

#[test]
fn stage_copies_into_root_and_discards_upload() {
    let sandbox = Sandbox::new();
    let artifact = sandbox.build_artifact("2.3.1");

    let task = DeployTask::new(sandbox.config(), RecordingRemote::new());
    let staged = task.stage(&artifact).unwrap();

    assert_eq!(staged, sandbox.root.join("bouncer-2.3.1.jar"));
    assert_eq!(fs::read_to_string(&staged).unwrap(), "jar 2.3.1");
    assert_eq!(fs::read_dir(&sandbox.uploads).unwrap().count(), 0);
    assert!(!sandbox.root.join("current.jar").exists());
    assert!(task.remote().calls().contains(&"copy user:bouncer".to_string()));
}

#[test]
fn stage_rejects_foreign_or_missing_artifacts() {
    let sandbox = Sandbox::new();
    let foreign = sandbox.build.join("gateway-1.jar");
    fs::write(&foreign, "jar").unwrap();

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());

    let err = task.stage(&foreign).unwrap_err().to_string();
    assert!(err.contains("bouncer-*.jar"), "unexpected error: {err}");

    let err = task
        .stage(&sandbox.build.join("bouncer-9.jar"))
        .unwrap_err()
        .to_string();
    assert!(err.contains("Artifact not found"), "unexpected error: {err}");
}

#[test]
fn install_points_current_at_deployed_artifact() {
    let sandbox = Sandbox::new();
    let old = sandbox.install_file("1");
    sandbox.point_current_at(&old);
    let artifact = sandbox.build_artifact("2");

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());
    let staged = task.stage(&artifact).unwrap();
    let installed = task.install(&artifact).unwrap();

    assert_eq!(installed, staged);
    assert_eq!(task.current_filename().unwrap(), staged);
    assert_eq!(
        fs::read_to_string(sandbox.root.join("current.jar")).unwrap(),
        "jar 2"
    );
}

#[test]
fn install_refuses_unstaged_artifact() {
    let sandbox = Sandbox::new();
    let old = sandbox.install_file("1");
    sandbox.point_current_at(&old);
    let artifact = sandbox.build_artifact("2");

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());
    let err = task.install(&artifact).unwrap_err().to_string();

    assert!(err.contains("has not been staged"), "unexpected error: {err}");
    assert_eq!(task.current_filename().unwrap(), old);
}

#[test]
fn run_stages_installs_then_restarts() {
    let sandbox = Sandbox::new();
    let artifact = sandbox.build_artifact("3");

    let task = DeployTask::new(sandbox.config(), RecordingRemote::new());
    let report = task.run(&artifact).unwrap();

    assert_eq!(report.staged, sandbox.root.join("bouncer-3.jar"));
    assert_eq!(report.installed, report.staged);
    assert!(sandbox.restart_marker().exists());

    let ops = task.remote().ops();
    let position = |op: &str| ops.iter().position(|o| o == op).unwrap();
    assert!(position("upload") < position("copy"));
    assert!(position("copy") < position("symlink"));
    assert!(position("symlink") < position("run"));
    assert_eq!(ops.last().map(String::as_str), Some("run"));
    assert!(task.remote().calls().contains(&"run root".to_string()));
}

#[test]
fn run_stops_before_restart_when_stage_fails() {
    let sandbox = Sandbox::new();

    let task = DeployTask::new(sandbox.config(), RecordingRemote::new());
    assert!(task.run(&sandbox.build.join("bouncer-4.jar")).is_err());

    assert!(!sandbox.restart_marker().exists());
    assert!(!task.remote().ops().contains(&"run".to_string()));
}

#[test]
fn missing_pointer_is_reported() {
    let sandbox = Sandbox::new();
    sandbox.install_file("1");

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());
    let err = task.clean_installed().unwrap_err();

    match err.downcast_ref::<PointerError>() {
        Some(PointerError::Missing { link }) => {
            assert_eq!(link, &sandbox.root.join("current.jar"));
        }
        other => panic!("expected missing pointer, got {other:?}"),
    }
    assert!(sandbox.root.join("bouncer-1.jar").exists());
}

#[test]
fn regular_file_pointer_counts_as_missing() {
    let sandbox = Sandbox::new();
    fs::write(sandbox.root.join("current.jar"), "not a link").unwrap();

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());
    let err = task.current_filename().unwrap_err();

    assert!(matches!(
        err.downcast_ref::<PointerError>(),
        Some(PointerError::Missing { .. })
    ));
}

#[test]
fn dangling_pointer_is_reported() {
    let sandbox = Sandbox::new();
    sandbox.install_file("1");
    sandbox.point_current_at(&sandbox.root.join("bouncer-9.jar"));

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());
    let err = task.installed_versions().unwrap_err();

    match err.downcast_ref::<PointerError>() {
        Some(PointerError::Dangling { target, .. }) => {
            assert_eq!(target, &sandbox.root.join("bouncer-9.jar"));
        }
        other => panic!("expected dangling pointer, got {other:?}"),
    }
}

#[test]
fn pointer_outside_root_does_not_shield_same_named_file() {
    let sandbox = Sandbox::new();
    sandbox.install_file("1");
    sandbox.install_file("2");
    let elsewhere = sandbox.temp.path().join("srv");
    fs::create_dir_all(&elsewhere).unwrap();
    let outside = elsewhere.join("bouncer-2.jar");
    fs::write(&outside, "jar 2").unwrap();
    sandbox.point_current_at(&outside);

    let config = sandbox.config().with_keep(0);
    let task = DeployTask::new(config, LocalRemote::new());
    assert!(task.installed_versions().unwrap().iter().all(|a| !a.current));

    let report = task.clean_installed().unwrap();
    assert_eq!(report.deleted, vec!["bouncer-1.jar", "bouncer-2.jar"]);
    assert!(outside.exists());
    assert_eq!(sandbox.root_entries(), vec!["current.jar"]);
}

#[test]
fn relative_pointer_resolves_against_root() {
    let sandbox = Sandbox::new();
    sandbox.install_file("5");
    sandbox.point_current_at(std::path::Path::new("bouncer-5.jar"));

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());
    assert_eq!(
        task.current_filename().unwrap(),
        sandbox.root.join("bouncer-5.jar")
    );
}

#[test]
fn activate_switches_to_installed_version() {
    let sandbox = Sandbox::new();
    sandbox.install_file("1");
    let newest = sandbox.install_file("2");
    sandbox.point_current_at(&newest);

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());
    let target = task.activate("1").unwrap();

    assert_eq!(target, sandbox.root.join("bouncer-1.jar"));
    assert_eq!(task.current_filename().unwrap(), target);

    let err = task.activate("9").unwrap_err().to_string();
    assert!(err.contains("not installed"), "unexpected error: {err}");
    assert_eq!(task.current_filename().unwrap(), target);
}

#[test]
fn installed_versions_flags_current() {
    let sandbox = Sandbox::new();
    for version in ["1.9.0", "1.10.0", "2.0.0"] {
        sandbox.install_file(version);
    }
    sandbox.point_current_at(&sandbox.root.join("bouncer-1.10.0.jar"));

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());
    let installed = task.installed_versions().unwrap();

    let versions: Vec<_> = installed.iter().map(|a| a.version.as_str()).collect();
    assert_eq!(versions, vec!["1.9.0", "1.10.0", "2.0.0"]);
    let current: Vec<_> = installed.iter().filter(|a| a.current).collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].file_name, "bouncer-1.10.0.jar");
}

#[test]
fn print_installed_versions_marks_current() {
    console::set_colors_enabled(false);

    let sandbox = Sandbox::new();
    for version in 1..=3 {
        sandbox.install_file(&version.to_string());
    }
    sandbox.point_current_at(&sandbox.root.join("bouncer-2.jar"));

    let task = DeployTask::new(sandbox.config(), LocalRemote::new());
    let mut output = Vec::new();
    task.print_installed_versions(&mut output).unwrap();

    assert_eq!(
        String::from_utf8(output).unwrap(),
        "Installed versions:\n     1\n   * 2\n     3\n"
    );
}

#[test]
fn convert_to_version_uses_configured_app() {
    let sandbox = Sandbox::new();
    let task = DeployTask::new(sandbox.config(), LocalRemote::new());

    assert_eq!(
        task.convert_to_version("bouncer-2.3.1.jar").as_deref(),
        Some("2.3.1")
    );
    assert_eq!(task.convert_to_version("gateway-2.3.1.jar"), None);
}
