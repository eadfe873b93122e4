
use std::sync::Arc;

use async_trait::async_trait;
use mockall::{mock, predicate::*, Sequence};
use posts_backend::{
    entities::{
        image::ImageUpload,
        pagination::PageRequest,
        post::{NewPostRequest, Post, PostInsert},
    },
    errors::{AppError, StorageError},
    repositories::post::{PostPage, PostRepository},
    storage::ObjectStorage,
    use_cases::posts::{PostHandler, MISSING_FIELDS_MESSAGE, NO_FILES_MESSAGE, POST_CREATED_MESSAGE},
};
use test_utils::{post_from_insert, seeded_insert};

// === Mocks ===
mock! {
    pub PostRepo {}

    #[async_trait]
    impl PostRepository for PostRepo {
        async fn list_posts(&self, page: &PageRequest) -> Result<PostPage, AppError>;
        async fn create_post(&self, post: &PostInsert) -> Result<Post, AppError>;
        async fn check_connection(&self) -> Result<(), AppError>;
    }
}

mock! {
    pub Storage {}

    #[async_trait]
    impl ObjectStorage for Storage {
        async fn put_object(&self, key: &str, body: Vec<u8>, content_type: &str) -> Result<String, StorageError>;
        async fn delete_object(&self, key: &str) -> Result<(), StorageError>;
        async fn check_connection(&self) -> Result<(), StorageError>;
    }
}

// === Helpers ===
fn handler(repo: MockPostRepo, storage: MockStorage) -> PostHandler {
    PostHandler::new(Arc::new(repo), Arc::new(storage))
}

fn request(files: &[(&str, usize)]) -> NewPostRequest {
    NewPostRequest {
        content: Some("desc".into()),
        nombre: Some("juan".into()),
        titulo: Some("Hola".into()),
        files: files
            .iter()
            .map(|(name, size)| ImageUpload::new(Some(name.to_string()), vec![7; *size]))
            .collect(),
    }
}

fn public_url(key: &str) -> Result<String, StorageError> {
    Ok(format!("https://cdn.test.local/{}", key))
}

// === Create ===

#[actix_rt::test]
async fn create_uploads_files_in_order_then_inserts_once() {
    let mut storage = MockStorage::new();
    let mut repo = MockPostRepo::new();
    let mut seq = Sequence::new();

    storage
        .expect_put_object()
        .withf(|key, body, content_type| {
            key.ends_with(".png") && body.len() == 5000 && content_type == "image/png"
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|key, _, _| public_url(key));

    storage
        .expect_put_object()
        .withf(|key, body, content_type| {
            key.ends_with(".jpg") && body.len() == 3000 && content_type == "image/jpeg"
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|key, _, _| public_url(key));

    repo.expect_create_post()
        .withf(|insert| {
            insert.name == "juan"
                && insert.title == "Hola"
                && insert.description == "desc"
                && insert.images.len() == 2
                && insert.images[0].mimetype == "image/png"
                && insert.images[1].mimetype == "image/jpeg"
                && insert.images.iter().all(|i| i.content.is_none() && i.url.ends_with(&i.filename))
        })
        .times(1)
        .in_sequence(&mut seq)
        .returning(|insert| Ok(post_from_insert(insert)));

    storage.expect_delete_object().never();

    let response = handler(repo, storage)
        .create_post(request(&[("a.png", 5000), ("b.jpg", 3000)]))
        .await
        .expect("create succeeds");

    assert_eq!(response.message, POST_CREATED_MESSAGE);
    assert_eq!(response.post.images.len(), 2);
    assert_eq!(response.post.images[0].size, 5000);
    assert_eq!(response.post.images[1].size, 3000);
}

#[actix_rt::test]
async fn missing_fields_never_reach_storage_or_database() {
    let mut storage = MockStorage::new();
    let mut repo = MockPostRepo::new();
    storage.expect_put_object().never();
    repo.expect_create_post().never();

    let mut req = request(&[("a.png", 10)]);
    req.content = None;
    req.titulo = Some("  ".into());

    let result = handler(repo, storage).create_post(req).await;

    match result {
        Err(AppError::ValidationError { message, details }) => {
            assert_eq!(message, MISSING_FIELDS_MESSAGE);
            let fields: Vec<&str> = details.iter().map(|e| e.field.as_str()).collect();
            assert_eq!(fields, vec!["content", "titulo"]);
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[actix_rt::test]
async fn empty_file_list_is_invalid_input() {
    let mut storage = MockStorage::new();
    let mut repo = MockPostRepo::new();
    storage.expect_put_object().never();
    repo.expect_create_post().never();

    let result = handler(repo, storage).create_post(request(&[])).await;

    assert!(matches!(result, Err(AppError::InvalidInput(msg)) if msg == NO_FILES_MESSAGE));
}

#[actix_rt::test]
async fn storage_failure_discards_earlier_objects_and_skips_insert() {
    let mut storage = MockStorage::new();
    let mut repo = MockPostRepo::new();
    let mut seq = Sequence::new();

    storage
        .expect_put_object()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|key, _, _| public_url(key));

    storage
        .expect_put_object()
        .times(1)
        .in_sequence(&mut seq)
        .returning(|key, _, _| {
            Err(StorageError::Upload { key: key.to_string(), reason: "timeout".into() })
        });

    storage
        .expect_delete_object()
        .withf(|key| key.ends_with(".png"))
        .times(1)
        .in_sequence(&mut seq)
        .returning(|_| Ok(()));

    repo.expect_create_post().never();

    let result = handler(repo, storage)
        .create_post(request(&[("a.png", 10), ("b.jpg", 10), ("c.jpg", 10)]))
        .await;

    assert!(matches!(result, Err(AppError::StorageError(_))));
}

#[actix_rt::test]
async fn persistence_failure_discards_all_objects() {
    let mut storage = MockStorage::new();
    let mut repo = MockPostRepo::new();

    storage
        .expect_put_object()
        .times(2)
        .returning(|key, _, _| public_url(key));

    storage
        .expect_delete_object()
        .times(2)
        .returning(|_| Ok(()));

    repo.expect_create_post()
        .times(1)
        .returning(|_| Err(AppError::PersistenceError("deadlock detected".into())));

    let result = handler(repo, storage)
        .create_post(request(&[("a.png", 10), ("b.png", 10)]))
        .await;

    assert!(matches!(result, Err(AppError::PersistenceError(_))));
}

#[actix_rt::test]
async fn failed_cleanup_does_not_mask_the_original_error() {
    let mut storage = MockStorage::new();
    let mut repo = MockPostRepo::new();

    storage
        .expect_put_object()
        .returning(|key, _, _| public_url(key));

    storage
        .expect_delete_object()
        .times(1)
        .returning(|key| Err(StorageError::Delete { key: key.to_string(), reason: "forbidden".into() }));

    repo.expect_create_post()
        .returning(|_| Err(AppError::PersistenceError("disk full".into())));

    let result = handler(repo, storage)
        .create_post(request(&[("a.png", 10)]))
        .await;

    let err = result.expect_err("create must fail");
    assert!(matches!(err, AppError::PersistenceError(_)));
    assert!(err.is_server_error());
}

// === List ===

#[actix_rt::test]
async fn list_builds_pagination_from_total() {
    let mut repo = MockPostRepo::new();
    let storage = MockStorage::new();
    let page = PageRequest { page: 2, limit: 5 };

    repo.expect_list_posts()
        .with(eq(page))
        .times(1)
        .returning(|_| {
            let posts = ["a", "b"]
                .iter()
                .map(|name| post_from_insert(&seeded_insert(name)))
                .collect();
            Ok(PostPage { posts, total: 12 })
        });

    let response = handler(repo, storage).list_posts(page).await.unwrap();

    assert_eq!(response.posts.len(), 2);
    assert_eq!(response.pagination.page, 2);
    assert_eq!(response.pagination.limit, 5);
    assert_eq!(response.pagination.total, 12);
    assert_eq!(response.pagination.total_pages, 3);
}

#[actix_rt::test]
async fn list_propagates_persistence_errors() {
    let mut repo = MockPostRepo::new();
    repo.expect_list_posts()
        .returning(|_| Err(AppError::PersistenceError("pool timed out".into())));

    let result = handler(repo, MockStorage::new())
        .list_posts(PageRequest { page: 1, limit: 10 })
        .await;

    assert!(matches!(result, Err(AppError::PersistenceError(_))));
}
