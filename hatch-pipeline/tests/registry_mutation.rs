//! `add-package` handling: repository bootstrap, locking, and rollback.

mod common;

use common::{add_event, add_payload, Behaviour, Call, World, REGISTRY};
use hatch_core::registry;
use hatch_core::types::RunStatus;
use hatch_pipeline::mutation::RegistryLock;
use hatch_pipeline::{DispatchOutcome, PipelineError};

#[test]
fn known_repository_only_adds_package() {
    let world = World::new();
    let fake = world.fake(Behaviour::default());

    let outcome = world
        .dispatcher(&fake)
        .receive(add_event(add_payload("CrackingShells/Hatching-Dev")))
        .expect("dispatch");

    assert_eq!(outcome.status(), RunStatus::Succeeded);
    let DispatchOutcome::Added(report) = outcome else {
        panic!("expected a mutation report");
    };
    assert!(!report.repository_added);
    assert_ne!(report.digest_before.as_deref(), Some(report.digest_after.as_str()));
    assert!(!fake
        .calls()
        .iter()
        .any(|c| matches!(c, Call::AddRepository { .. })));
    assert!(fake.calls().contains(&Call::AddPackage {
        repository: "Hatching-Dev".into(),
        author: "octocat".into(),
    }));
}

#[test]
fn unknown_repository_is_added_first() {
    let world = World::new();
    let fake = world.fake(Behaviour::default());

    let outcome = world
        .dispatcher(&fake)
        .receive(add_event(add_payload("CrackingShells/Hatch-Validator")))
        .expect("dispatch");

    let DispatchOutcome::Added(report) = outcome else {
        panic!("expected a mutation report");
    };
    assert!(report.repository_added);
    let calls = fake.calls();
    let add_repo = calls
        .iter()
        .position(|c| {
            *c == Call::AddRepository {
                name: "Hatch-Validator".into(),
                url: "https://github.com/CrackingShells/Hatch-Validator".into(),
            }
        })
        .expect("add-repository call");
    let add_pkg = calls
        .iter()
        .position(|c| matches!(c, Call::AddPackage { .. }))
        .expect("add-package call");
    assert!(add_repo < add_pkg);
    assert!(registry::load_at(world.registry_path())
        .unwrap()
        .has_repository("Hatch-Validator")
        .unwrap());
}

#[test]
fn failed_add_package_restores_registry_bytes() {
    let world = World::new();
    let fake = world.fake(Behaviour {
        add_package_exit: 1,
        ..Behaviour::default()
    });

    let err = world
        .dispatcher(&fake)
        .receive(add_event(add_payload("CrackingShells/Hatching-Dev")))
        .unwrap_err();

    match &err {
        PipelineError::RegistryMutation { repository, log } => {
            assert_eq!(repository, "Hatching-Dev");
            assert!(log.contains("not newer than"), "log: {log}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(std::fs::read_to_string(world.registry_path()).unwrap(), REGISTRY);
}

#[test]
fn failed_add_repository_skips_add_package_and_restores() {
    let world = World::new();
    let fake = world.fake(Behaviour {
        add_repository_exit: 2,
        ..Behaviour::default()
    });

    let err = world
        .dispatcher(&fake)
        .receive(add_event(add_payload("CrackingShells/Elsewhere")))
        .unwrap_err();

    assert!(matches!(err, PipelineError::RegistryMutation { .. }));
    assert!(!fake.calls().iter().any(|c| matches!(c, Call::AddPackage { .. })));
    assert_eq!(std::fs::read_to_string(world.registry_path()).unwrap(), REGISTRY);
}

#[test]
fn download_failure_leaves_registry_untouched() {
    let world = World::new();
    let fake = world.fake(Behaviour {
        download_fails: true,
        ..Behaviour::default()
    });

    let err = world
        .dispatcher(&fake)
        .receive(add_event(add_payload("CrackingShells/Hatching-Dev")))
        .unwrap_err();

    assert!(matches!(err, PipelineError::ArtifactDownload { .. }));
    assert_eq!(fake.calls().len(), 1);
    assert_eq!(std::fs::read_to_string(world.registry_path()).unwrap(), REGISTRY);
}

#[test]
fn lock_is_free_after_mutation() {
    let world = World::new();
    let fake = world.fake(Behaviour::default());
    world
        .dispatcher(&fake)
        .receive(add_event(add_payload("CrackingShells/Hatching-Dev")))
        .expect("dispatch");

    RegistryLock::acquire(world.registry_path(), std::time::Duration::from_millis(100))
        .expect("lock must be released");
}

#[test]
fn first_package_creates_a_missing_registry() {
    let world = World::new();
    std::fs::remove_file(world.registry_path()).unwrap();
    let fake = world.fake(Behaviour::default());

    let outcome = world
        .dispatcher(&fake)
        .receive(add_event(add_payload("CrackingShells/Hatching-Dev")))
        .expect("dispatch");

    let DispatchOutcome::Added(report) = outcome else {
        panic!("expected a mutation report");
    };
    assert!(report.repository_added);
    assert!(report.digest_before.is_none());
    let calls = fake.calls();
    assert!(matches!(calls[0], Call::Download { .. }));
    assert!(matches!(calls[1], Call::AddRepository { .. }));
    assert!(matches!(calls[2], Call::AddPackage { .. }));

    let created = registry::load_at(world.registry_path()).expect("registry created");
    assert!(created.has_repository("Hatching-Dev").unwrap());
    assert_eq!(created.digest, report.digest_after);
}

#[test]
fn failed_first_package_removes_the_new_registry() {
    let world = World::new();
    std::fs::remove_file(world.registry_path()).unwrap();
    let fake = world.fake(Behaviour {
        add_package_exit: 1,
        ..Behaviour::default()
    });

    let err = world
        .dispatcher(&fake)
        .receive(add_event(add_payload("CrackingShells/Hatching-Dev")))
        .unwrap_err();

    assert!(matches!(err, PipelineError::RegistryMutation { .. }), "got: {err}");
    assert!(!world.registry_path().exists());
}
