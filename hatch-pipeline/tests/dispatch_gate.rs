//! Validation gate behaviour through the dispatcher, with fake collaborators.

mod common;

use common::{add_event, add_payload, scenario_payload, validate_event, Behaviour, Call, World};
use hatch_core::types::{EventKind, RunStatus};
use hatch_core::EventError;
use hatch_pipeline::{DispatchOutcome, GateState, PipelineError};
use rstest::rstest;
use serde_json::json;

#[rstest]
#[case::repository("repository")]
#[case::artifact_name("artifact_name")]
#[case::run_id("run_id")]
#[case::pr_number("pr_number")]
#[case::package_name("package_name")]
fn invalid_payload_runs_nothing(#[case] field: &str) {
    let world = World::new();
    let fake = world.fake(Behaviour::default());
    let mut payload = scenario_payload();
    payload.as_object_mut().unwrap().remove(field);

    let err = world.dispatcher(&fake).receive(validate_event(payload)).unwrap_err();

    assert!(
        matches!(err, PipelineError::Event(EventError::InvalidPayload { .. })),
        "got: {err}"
    );
    assert!(err.to_string().contains(field));
    assert!(fake.calls().is_empty(), "collaborators were invoked: {:?}", fake.calls());
}

#[rstest]
#[case::version(&["version"], "version")]
#[case::author_email(&["author", "email"], "author.email")]
#[case::author_github_id(&["author", "GitHubID"], "author.GitHubID")]
fn invalid_add_package_payload_runs_nothing(#[case] path: &[&str], #[case] field: &str) {
    let world = World::new();
    let fake = world.fake(Behaviour::default());
    let registry_before = std::fs::read(world.registry_path()).unwrap();
    let mut payload = add_payload("CrackingShells/Hatching-Dev");
    match path {
        [key] => {
            payload.as_object_mut().unwrap().remove(*key);
        }
        [outer, key] => {
            payload[*outer].as_object_mut().unwrap().remove(*key);
        }
        _ => unreachable!(),
    }

    let err = world.dispatcher(&fake).receive(add_event(payload)).unwrap_err();

    assert!(
        matches!(err, PipelineError::Event(EventError::InvalidPayload { .. })),
        "got: {err}"
    );
    assert!(err.to_string().contains(field), "got: {err}");
    assert!(fake.calls().is_empty(), "collaborators were invoked: {:?}", fake.calls());
    assert_eq!(std::fs::read(world.registry_path()).unwrap(), registry_before);
}

#[test]
fn passing_validation_labels_comments_and_forwards_once() {
    let world = World::new();
    let fake = world.fake(Behaviour::default());

    let outcome = world
        .dispatcher(&fake)
        .receive(validate_event(scenario_payload()))
        .expect("dispatch");

    assert_eq!(outcome.status(), RunStatus::Succeeded);
    assert_eq!(fake.labels(), ["validation-passed", "ready-for-review"]);
    assert_eq!(fake.comments().len(), 1);
    assert!(fake.comments()[0].contains("validation passed"));

    let forwards = fake.forwards();
    assert_eq!(forwards.len(), 1);
    let event = &forwards[0];
    assert_eq!(event.event_type, EventKind::ReleasePackage);
    assert_eq!(event.client_payload["pr_number"], json!(42));
    assert_eq!(event.client_payload["package_name"], json!("foo"));
    assert_eq!(event.client_payload["artifact_name"], json!("foo-package"));
    assert_eq!(event.client_payload["workflow_id"], json!("package-validation.yml"));
    assert_eq!(event.client_payload["run_id"], json!(123456789));
    assert_eq!(event.client_payload.len(), 5);
}

#[test]
fn calls_happen_in_protocol_order() {
    let world = World::new();
    let fake = world.fake(Behaviour::default());
    world
        .dispatcher(&fake)
        .receive(validate_event(scenario_payload()))
        .expect("dispatch");

    let kinds: Vec<&str> = fake
        .calls()
        .iter()
        .map(|c| match c {
            Call::Download { .. } => "download",
            Call::Validate { .. } => "validate",
            Call::Labels { .. } => "labels",
            Call::Comment { .. } => "comment",
            Call::Forward { .. } => "forward",
            _ => "other",
        })
        .collect();
    assert_eq!(kinds, ["download", "validate", "labels", "comment", "forward"]);
    assert!(fake.calls().contains(&Call::Validate {
        repository: "Hatching-Dev".into()
    }));
}

#[test]
fn failing_validation_reports_log_and_stops() {
    let world = World::new();
    let fake = world.fake(Behaviour {
        validator_exit: 1,
        validator_log: "schema error".into(),
        ..Behaviour::default()
    });

    let outcome = world
        .dispatcher(&fake)
        .receive(validate_event(scenario_payload()))
        .expect("a validator failure is still a completed run");

    assert_eq!(outcome.status(), RunStatus::Failed);
    let DispatchOutcome::Validated(report) = outcome else {
        panic!("expected a gate report");
    };
    assert_eq!(report.state, GateState::Failed);
    assert_eq!(fake.labels(), ["validation-failed"]);
    let comments = fake.comments();
    assert_eq!(comments.len(), 1);
    assert!(comments[0].contains("schema error"));
    assert!(comments[0].contains("<details>"));
    assert!(fake.forwards().is_empty());
}

#[test]
fn download_failure_posts_nothing() {
    let world = World::new();
    let fake = world.fake(Behaviour {
        download_fails: true,
        ..Behaviour::default()
    });

    let err = world
        .dispatcher(&fake)
        .receive(validate_event(scenario_payload()))
        .unwrap_err();

    assert!(matches!(err, PipelineError::ArtifactDownload { .. }), "got: {err}");
    assert_eq!(fake.calls().len(), 1, "only the download may be attempted");
    assert!(fake.comments().is_empty());
    assert!(fake.labels().is_empty());
}

#[test]
fn custom_labels_come_from_config() {
    let mut world = World::new();
    world.config.labels.success = vec!["ok-to-merge".into()];
    let fake = world.fake(Behaviour::default());

    world
        .dispatcher(&fake)
        .receive(validate_event(scenario_payload()))
        .expect("dispatch");

    assert_eq!(fake.labels(), ["ok-to-merge"]);
}

#[test]
fn work_directory_is_cleaned_up() {
    let world = World::new();
    let fake = world.fake(Behaviour::default());
    world
        .dispatcher(&fake)
        .receive(validate_event(scenario_payload()))
        .expect("dispatch");

    let work = world.state_dir().join("work");
    let leftovers = std::fs::read_dir(&work).map(|d| d.count()).unwrap_or(0);
    assert_eq!(leftovers, 0);
}

#[test]
fn release_package_cannot_be_received() {
    let world = World::new();
    let fake = world.fake(Behaviour::default());
    let event = serde_json::from_value(json!({
        "action": "release-package",
        "client_payload": scenario_payload(),
    }))
    .unwrap();

    let err = world.dispatcher(&fake).receive(event).unwrap_err();
    assert!(matches!(err, PipelineError::Event(EventError::OutboundOnly(_))));
    assert!(fake.calls().is_empty());
}
