//! Membership and lifecycle invariants exercised directly against the
//! domain services over an in-memory database.

use std::sync::Arc;

use notey::config::{DefaultsConfig, SecurityConfig};
use notey::db::Store;
use notey::models::Permission;
use notey::services::{
    AuthService, AuthServiceImpl, NoteError, NoteService, NoteServiceImpl, ProjectError,
    ProjectService, ProjectServiceImpl, UploadService, UploadedFile,
};

struct TestEnv {
    store: Store,
    auth: AuthServiceImpl,
    projects: ProjectServiceImpl,
    notes: NoteServiceImpl,
}

async fn setup() -> TestEnv {
    let store = Store::with_pool_options("sqlite::memory:", 1, 1)
        .await
        .expect("in-memory store");

    let upload_dir = std::env::temp_dir().join(format!("notey-test-{}", uuid::Uuid::new_v4()));
    let uploads = Arc::new(UploadService::new(&upload_dir.to_string_lossy()));

    // Cheap Argon2 params keep the hashing-heavy tests fast.
    let security = SecurityConfig {
        argon2_memory_cost_kib: 1024,
        argon2_time_cost: 1,
        argon2_parallelism: 1,
        minimum_password_length: 8,
    };
    let defaults = DefaultsConfig::default();

    TestEnv {
        store: store.clone(),
        auth: AuthServiceImpl::new(store.clone(), security, defaults.clone()),
        projects: ProjectServiceImpl::new(store.clone(), uploads.clone(), defaults),
        notes: NoteServiceImpl::new(store, uploads),
    }
}

async fn register(env: &TestEnv, username: &str) -> i32 {
    env.auth
        .register(
            username,
            &format!("{username}@example.com"),
            "a long password",
        )
        .await
        .expect("registration should succeed")
        .id
}

#[tokio::test]
async fn creator_gets_a_delete_level_membership() {
    let env = setup().await;
    let alice = register(&env, "alice").await;

    env.projects
        .create(alice, "Garden", None)
        .await
        .expect("create should succeed");

    let active = env.projects.list_active(alice).await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].name, "Garden");

    let permission = env
        .store
        .permission_of(alice, active[0].id)
        .await
        .unwrap()
        .expect("creator must be a member");
    assert_eq!(permission, Permission::Delete);
}

#[tokio::test]
async fn project_names_are_globally_unique() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    let bob = register(&env, "bob").await;

    env.projects.create(alice, "Garden", None).await.unwrap();

    let err = env
        .projects
        .create(bob, "Garden", None)
        .await
        .expect_err("second Garden must be rejected regardless of creator");
    assert!(matches!(err, ProjectError::DuplicateName));
}

#[tokio::test]
async fn rename_collisions_are_rejected_but_own_name_is_fine() {
    let env = setup().await;
    let alice = register(&env, "alice").await;

    let garden = env.projects.create(alice, "Garden", None).await.unwrap();
    env.projects.create(alice, "Kitchen", None).await.unwrap();

    let err = env
        .projects
        .update(alice, garden.id, "Kitchen", None)
        .await
        .expect_err("rename onto a taken name must fail");
    assert!(matches!(err, ProjectError::DuplicateName));

    // Saving the settings form without renaming is not a collision.
    env.projects
        .update(alice, garden.id, "Garden", None)
        .await
        .expect("keeping the current name should succeed");
}

#[tokio::test]
async fn at_most_one_membership_per_user_and_project() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    register(&env, "bob").await;

    let garden = env.projects.create(alice, "Garden", None).await.unwrap();

    env.projects
        .add_member(alice, garden.id, "bob", Permission::Read)
        .await
        .expect("first add should succeed");

    let err = env
        .projects
        .add_member(alice, garden.id, "bob", Permission::Write)
        .await
        .expect_err("second membership for bob must fail");
    assert!(matches!(err, ProjectError::DuplicateMembership));
}

#[tokio::test]
async fn toggling_completion_twice_restores_the_original_state() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    let garden = env.projects.create(alice, "Garden", None).await.unwrap();

    let note = env
        .notes
        .create(alice, garden.id, "Water plants", vec![])
        .await
        .unwrap();
    assert!(!note.is_completed);

    let completed = env.notes.toggle_complete(alice, note.id).await.unwrap();
    assert!(completed);

    let completed = env.notes.toggle_complete(alice, note.id).await.unwrap();
    assert!(!completed);
}

#[tokio::test]
async fn archiving_moves_the_project_between_lists() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    let garden = env.projects.create(alice, "Garden", None).await.unwrap();

    let note = env
        .notes
        .create(alice, garden.id, "Water plants", vec![])
        .await
        .unwrap();
    env.notes.toggle_complete(alice, note.id).await.unwrap();

    env.projects.archive(alice, garden.id).await.unwrap();

    let active = env.projects.list_active(alice).await.unwrap();
    assert!(active.is_empty());

    let archived = env.projects.list_archived(alice).await.unwrap();
    assert_eq!(archived.len(), 1);
    assert_eq!(archived[0].name, "Garden");
    assert!(archived[0].is_archived);
}

#[tokio::test]
async fn archiving_requires_notes_and_all_of_them_completed() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    let garden = env.projects.create(alice, "Garden", None).await.unwrap();

    // No notes at all.
    let err = env
        .projects
        .archive(alice, garden.id)
        .await
        .expect_err("empty project must not be archiveable");
    assert!(matches!(err, ProjectError::Validation(_)));

    // One open note.
    env.notes
        .create(alice, garden.id, "Water plants", vec![])
        .await
        .unwrap();
    let err = env
        .projects
        .archive(alice, garden.id)
        .await
        .expect_err("open notes must block archiving");
    assert!(matches!(err, ProjectError::Validation(_)));
}

#[tokio::test]
async fn deleting_a_project_cascades_to_notes_attachments_and_memberships() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    register(&env, "bob").await;

    let garden = env.projects.create(alice, "Garden", None).await.unwrap();
    let bob_member = env
        .projects
        .add_member(alice, garden.id, "bob", Permission::Read)
        .await
        .unwrap();

    let note = env
        .notes
        .create(
            alice,
            garden.id,
            "Water plants",
            vec![UploadedFile {
                filename: "schedule.txt".to_string(),
                bytes: b"mon wed fri".to_vec(),
            }],
        )
        .await
        .unwrap();
    assert_eq!(note.attachments.len(), 1);

    env.projects.delete(alice, garden.id).await.unwrap();

    assert!(env.store.get_project(garden.id).await.unwrap().is_none());
    assert!(env.store.get_note(note.id).await.unwrap().is_none());
    assert!(env.store.note_attachments(note.id).await.unwrap().is_empty());
    assert!(
        env.store
            .get_membership(bob_member.user_id, garden.id)
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn deleting_a_note_leaves_its_siblings_and_project_intact() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    let garden = env.projects.create(alice, "Garden", None).await.unwrap();

    let first = env
        .notes
        .create(
            alice,
            garden.id,
            "Water plants",
            vec![UploadedFile {
                filename: "schedule.txt".to_string(),
                bytes: b"mon wed fri".to_vec(),
            }],
        )
        .await
        .unwrap();
    let second = env
        .notes
        .create(alice, garden.id, "Weed beds", vec![])
        .await
        .unwrap();

    env.notes.delete(alice, first.id).await.unwrap();

    assert!(env.store.get_note(first.id).await.unwrap().is_none());
    assert!(env.store.note_attachments(first.id).await.unwrap().is_empty());
    assert!(env.store.get_note(second.id).await.unwrap().is_some());
    assert!(env.store.get_project(garden.id).await.unwrap().is_some());
}

#[tokio::test]
async fn read_members_cannot_write_and_write_members_cannot_complete() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    let bob = register(&env, "bob").await;
    let carol = register(&env, "carol").await;

    let garden = env.projects.create(alice, "Garden", None).await.unwrap();
    env.projects
        .add_member(alice, garden.id, "bob", Permission::Read)
        .await
        .unwrap();
    env.projects
        .add_member(alice, garden.id, "carol", Permission::Write)
        .await
        .unwrap();

    let err = env
        .notes
        .create(bob, garden.id, "Bob's note", vec![])
        .await
        .expect_err("read member must not create notes");
    assert!(matches!(err, NoteError::PermissionDenied(_)));

    let note = env
        .notes
        .create(carol, garden.id, "Carol's note", vec![])
        .await
        .expect("write member may create notes");

    let err = env
        .notes
        .toggle_complete(carol, note.id)
        .await
        .expect_err("write member must not complete notes");
    assert!(matches!(err, NoteError::PermissionDenied(_)));

    let err = env
        .projects
        .add_member(carol, garden.id, "bob", Permission::Read)
        .await
        .expect_err("write member must not manage members");
    assert!(matches!(err, ProjectError::PermissionDenied(_)));
}

#[tokio::test]
async fn complete_members_cannot_delete() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    let bob = register(&env, "bob").await;

    let garden = env.projects.create(alice, "Garden", None).await.unwrap();
    env.projects
        .add_member(alice, garden.id, "bob", Permission::Complete)
        .await
        .unwrap();

    let note = env
        .notes
        .create(bob, garden.id, "Water plants", vec![])
        .await
        .unwrap();
    env.notes.toggle_complete(bob, note.id).await.unwrap();

    let err = env
        .notes
        .delete(bob, note.id)
        .await
        .expect_err("complete member must not delete notes");
    assert!(matches!(err, NoteError::PermissionDenied(_)));

    let err = env
        .projects
        .delete(bob, garden.id)
        .await
        .expect_err("complete member must not delete the project");
    assert!(matches!(err, ProjectError::PermissionDenied(_)));
}

#[tokio::test]
async fn any_member_may_leave_and_non_members_are_denied() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    let bob = register(&env, "bob").await;
    let mallory = register(&env, "mallory").await;

    let garden = env.projects.create(alice, "Garden", None).await.unwrap();
    env.projects
        .add_member(alice, garden.id, "bob", Permission::Read)
        .await
        .unwrap();

    // Outsiders cannot even see the project.
    let err = env
        .projects
        .detail(mallory, garden.id)
        .await
        .expect_err("non-member must not read the project");
    assert!(matches!(err, ProjectError::PermissionDenied(_)));

    env.projects
        .leave(bob, garden.id)
        .await
        .expect("read member may leave");
    assert!(env.projects.list_active(bob).await.unwrap().is_empty());

    let err = env
        .projects
        .leave(bob, garden.id)
        .await
        .expect_err("leaving twice has nothing to remove");
    assert!(matches!(err, ProjectError::NotFound(_)));
}

#[tokio::test]
async fn removing_a_member_requires_one_to_exist() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    let bob = register(&env, "bob").await;

    let garden = env.projects.create(alice, "Garden", None).await.unwrap();

    let err = env
        .projects
        .remove_member(alice, garden.id, bob)
        .await
        .expect_err("bob was never a member");
    assert!(matches!(err, ProjectError::NotFound(_)));
}

#[tokio::test]
async fn attachments_report_their_display_name() {
    let env = setup().await;
    let alice = register(&env, "alice").await;
    let garden = env.projects.create(alice, "Garden", None).await.unwrap();

    let note = env
        .notes
        .create(
            alice,
            garden.id,
            "Water plants",
            vec![UploadedFile {
                filename: "watering schedule.pdf".to_string(),
                bytes: vec![1, 2, 3],
            }],
        )
        .await
        .unwrap();

    assert_eq!(note.attachments.len(), 1);
    assert_eq!(note.attachments[0].display_name, "watering schedule.pdf");
    assert!(note.attachments[0].file_path.starts_with("attachments/"));
}

#[tokio::test]
async fn registration_enforces_unique_username_and_email() {
    let env = setup().await;
    register(&env, "alice").await;

    let err = env
        .auth
        .register("alice", "other@example.com", "a long password")
        .await
        .expect_err("duplicate username");
    assert!(matches!(
        err,
        notey::services::AuthError::Validation { field: "username", .. }
    ));

    let err = env
        .auth
        .register("alice2", "alice@example.com", "a long password")
        .await
        .expect_err("duplicate email");
    assert!(matches!(
        err,
        notey::services::AuthError::Validation { field: "email", .. }
    ));
}

#[tokio::test]
async fn every_registered_user_has_a_profile() {
    let env = setup().await;
    let alice = register(&env, "alice").await;

    let profile = env
        .store
        .get_profile(alice)
        .await
        .unwrap()
        .expect("profile must exist from registration");
    assert_eq!(profile.color, "#ffffff");
}
