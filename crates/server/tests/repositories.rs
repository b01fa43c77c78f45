//! Repository-level tests for the explicit deletion routines and membership
//! queries.

mod common;

use chrono::NaiveDate;
use sqlx::SqlitePool;
use taskmanager_server::db::{
    models::{NewProject, NewTask},
    is_unique_violation, JournalRepo, ProjectRepo, TaskRepo, UserRepo,
};

fn new_task(name: &str, assigned_id: &str, status_id: &str) -> NewTask {
    NewTask {
        name: name.to_string(),
        description: String::new(),
        assigned_id: assigned_id.to_string(),
        start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        end_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
        priority: None,
        status_id: status_id.to_string(),
    }
}

async fn seed(pool: &SqlitePool) -> (String, String, String) {
    let alice = UserRepo::create(pool, "alice", "hash").await.unwrap();
    let status = common::status_id(pool, "Open").await;
    let project = ProjectRepo::create(
        pool,
        &NewProject {
            name: "Website Redesign".to_string(),
            member_ids: vec![alice.id.clone()],
        },
    )
    .await
    .unwrap();
    (alice.id, status, project.id)
}

#[sqlx::test(migrations = "./migrations")]
async fn test_project_cascade_only_touches_its_own_rows(pool: SqlitePool) {
    let (alice, status, project) = seed(&pool).await;
    let other = ProjectRepo::create(
        &pool,
        &NewProject {
            name: "Other".to_string(),
            member_ids: vec![alice.clone()],
        },
    )
    .await
    .unwrap();

    let doomed = TaskRepo::create(&pool, &project, &new_task("a", &alice, &status))
        .await
        .unwrap();
    let survivor = TaskRepo::create(&pool, &other.id, &new_task("b", &alice, &status))
        .await
        .unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    JournalRepo::create(&pool, &doomed.id, &alice, date, "gone")
        .await
        .unwrap();
    JournalRepo::create(&pool, &survivor.id, &alice, date, "kept")
        .await
        .unwrap();

    assert!(ProjectRepo::delete_cascade(&pool, &project).await.unwrap());

    assert!(ProjectRepo::find_by_id(&pool, &project).await.unwrap().is_none());
    assert!(TaskRepo::find_by_id(&pool, &doomed.id).await.unwrap().is_none());
    assert!(TaskRepo::find_by_id(&pool, &survivor.id).await.unwrap().is_some());
    let kept = JournalRepo::list_for_task(&pool, &survivor.id).await.unwrap();
    assert_eq!(kept.len(), 1);
    assert_eq!(kept[0].entry, "kept");
    assert_eq!(ProjectRepo::members(&pool, &other.id).await.unwrap().len(), 1);

    // Second delete finds nothing.
    assert!(!ProjectRepo::delete_cascade(&pool, &project).await.unwrap());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_schema_refuses_implicit_project_delete(pool: SqlitePool) {
    let (alice, status, project) = seed(&pool).await;
    TaskRepo::create(&pool, &project, &new_task("a", &alice, &status))
        .await
        .unwrap();

    let result = sqlx::query("DELETE FROM projects WHERE id = ?")
        .bind(&project)
        .execute(&pool)
        .await;
    assert!(result.is_err());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_task_update_never_moves_project(pool: SqlitePool) {
    let (alice, status, project) = seed(&pool).await;
    let task = TaskRepo::create(&pool, &project, &new_task("a", &alice, &status))
        .await
        .unwrap();

    let updated = TaskRepo::update(
        &pool,
        &task.id,
        &NewTask {
            priority: Some(2),
            ..new_task("renamed", &alice, &status)
        },
    )
    .await
    .unwrap()
    .unwrap();
    assert_eq!(updated.name, "renamed");
    assert_eq!(updated.priority, Some(2));
    assert_eq!(updated.project_id, project);

    assert!(TaskRepo::update(&pool, "missing", &new_task("x", &alice, &status))
        .await
        .unwrap()
        .is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_task_cascade_removes_journals(pool: SqlitePool) {
    let (alice, status, project) = seed(&pool).await;
    let task = TaskRepo::create(&pool, &project, &new_task("a", &alice, &status))
        .await
        .unwrap();
    let date = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap();
    JournalRepo::create(&pool, &task.id, &alice, date, "note")
        .await
        .unwrap();

    assert!(TaskRepo::delete_cascade(&pool, &task.id).await.unwrap());
    assert!(JournalRepo::list_for_task(&pool, &task.id)
        .await
        .unwrap()
        .is_empty());
    assert!(ProjectRepo::find_by_id(&pool, &project).await.unwrap().is_some());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_projects_listed_for_members_only(pool: SqlitePool) {
    let (alice, _, project) = seed(&pool).await;
    let bob = UserRepo::create(&pool, "bob", "hash").await.unwrap();

    let for_alice = ProjectRepo::list_for_member(&pool, &alice).await.unwrap();
    assert_eq!(for_alice.len(), 1);
    assert_eq!(for_alice[0].id, project);
    assert!(ProjectRepo::list_for_member(&pool, &bob.id)
        .await
        .unwrap()
        .is_empty());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_duplicate_username_is_a_unique_violation(pool: SqlitePool) {
    UserRepo::create(&pool, "alice", "hash").await.unwrap();

    let err = UserRepo::create(&pool, "alice", "other-hash")
        .await
        .unwrap_err();
    assert!(is_unique_violation(&err));
    assert!(!is_unique_violation(&sqlx::Error::RowNotFound));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}
