mod common;
use std::time::Duration;

use lernboard::{
    build_server_with_db,
    model::{MockDatabase, entity::{CourseDraft, CourseStatus, ModuleKind, ContentType}},
    store::{
        Connectivity, CourseContentStore, CourseRepository, Direction, LocalCache, LocalStorage,
        RemoteRepository,
    },
};
use tokio::net::TcpListener;

use crate::common::seed_tables;

/// Serves the API on an ephemeral port and returns its base url.
async fn spawn_api() -> String {
    let db = MockDatabase::in_memory(seed_tables());
    let (_, app) = build_server_with_db(db).await.unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}/api/v1")
}

fn cache(dir: &tempfile::TempDir) -> LocalCache {
    LocalCache::new(LocalStorage::new(dir.path().join("local_storage.json")))
}

#[tokio::test]
async fn store_persists_through_api() {
    let base_url = spawn_api().await;
    let dir = tempfile::tempdir().unwrap();
    let remote = RemoteRepository::new(&base_url, Duration::from_secs(5)).unwrap();

    let mut store = CourseContentStore::load(Box::new(remote.clone()), cache(&dir))
        .await
        .unwrap();
    assert_eq!(store.connectivity(), Connectivity::Online);
    assert_eq!(store.courses().len(), 2);

    let course = store
        .create_course(CourseDraft::titled("Networking"))
        .await
        .unwrap();
    let module = store
        .add_module(course.id(), ModuleKind::Theory, "Sockets")
        .await
        .unwrap();
    let first = store
        .add_content_item(course.id(), &module.id, ContentType::Text)
        .await
        .unwrap();
    let second = store
        .add_content_item(course.id(), &module.id, ContentType::Video)
        .await
        .unwrap();
    store
        .move_content_item(course.id(), &module.id, &second.id, Direction::Up)
        .await
        .unwrap();
    store
        .set_course_status(course.id(), CourseStatus::Published)
        .await
        .unwrap();
    assert_eq!(store.connectivity(), Connectivity::Online);

    let on_server = remote
        .list_courses()
        .await
        .unwrap()
        .into_iter()
        .find(|c| c.id() == course.id())
        .expect("course was not created remotely");
    assert_eq!(on_server.status(), CourseStatus::Published);
    let ids: Vec<_> = on_server.modules()[0]
        .content
        .iter()
        .map(|c| c.id.as_str())
        .collect();
    assert_eq!(ids, vec![second.id.as_str(), first.id.as_str()]);

    // nothing went to the local cache while online
    assert!(store.cache().load_courses().await.unwrap().is_none());
}

#[tokio::test]
async fn login_through_api() {
    let base_url = spawn_api().await;
    let remote = RemoteRepository::new(&base_url, Duration::from_secs(5)).unwrap();

    let user = remote
        .login("teacher@lernboard.test", "teacher")
        .await
        .unwrap();
    assert_eq!(user.name(), "Tom Teacher");
    assert!(remote.login("teacher@lernboard.test", "nope").await.is_err());
    assert_eq!(remote.list_users().await.unwrap().len(), 3);
}

#[tokio::test]
async fn unreachable_api_uses_local_cache() {
    let dir = tempfile::tempdir().unwrap();
    // nothing listens on the discard port
    let remote = RemoteRepository::new("http://127.0.0.1:9/api/v1", Duration::from_secs(1)).unwrap();

    let mut store = CourseContentStore::load(Box::new(remote), cache(&dir))
        .await
        .unwrap();
    assert!(store.is_offline());
    assert!(store.courses().is_empty());

    let course = store
        .create_course(CourseDraft::titled("Offline first"))
        .await
        .unwrap();

    let cached = store.cache().load_courses().await.unwrap().unwrap();
    assert_eq!(cached.len(), 1);
    assert_eq!(cached[0].id(), course.id());
    assert!(store.reconnect().await.is_err());
}
