use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::{self, PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::{
    entities::{
        image::Image,
        pagination::PageRequest,
        post::{Post, PostInsert, PostRow},
    },
    errors::AppError,
    repositories::sqlx_repo::SqlxPostRepo,
};

/// One page of posts plus the unpaginated total.
#[derive(Debug, Clone, PartialEq)]
pub struct PostPage {
    pub posts: Vec<Post>,
    pub total: i64,
}

#[async_trait]
pub trait PostRepository: Send + Sync {
    /// Newest posts first, each with all of its images.
    async fn list_posts(&self, page: &PageRequest) -> Result<PostPage, AppError>;

    /// Inserts the post and its images in a single transaction.
    async fn create_post(&self, post: &PostInsert) -> Result<Post, AppError>;

    async fn check_connection(&self) -> Result<(), AppError>;
}

impl SqlxPostRepo {
    pub fn new(pool: PgPool) -> Self {
        SqlxPostRepo { pool }
    }
}

#[async_trait]
impl PostRepository for SqlxPostRepo {
    async fn list_posts(&self, page: &PageRequest) -> Result<PostPage, AppError> {
        // Returned to the pool when dropped, on every path
        let mut conn = self.pool.acquire().await?;

        let rows: Vec<PostRow> = sqlx::query_as::<_, PostRow>(
            r#"
            SELECT id, name, title, description, created_at, updated_at
            FROM posts
            ORDER BY created_at DESC, id DESC
            LIMIT $1 OFFSET $2
            "#
        )
        .bind(page.limit as i64)
        .bind(page.offset())
        .fetch_all(&mut *conn)
        .await?;

        let mut images_by_post: HashMap<Uuid, Vec<Image>> = HashMap::new();

        if !rows.is_empty() {
            let ids: Vec<Uuid> = rows.iter().map(|row| row.id).collect();

            let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(
                "SELECT id, post_id, position, url, filename, mimetype, size, content, created_at, updated_at FROM images WHERE post_id = ANY("
            );
            builder.push_bind(ids);
            builder.push(") ORDER BY post_id, position");

            let images: Vec<Image> = builder
                .build_query_as::<Image>()
                .fetch_all(&mut *conn)
                .await?;

            for image in images {
                images_by_post.entry(image.post_id).or_default().push(image);
            }
        }

        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM posts")
            .fetch_one(&mut *conn)
            .await?;

        let posts = rows
            .into_iter()
            .map(|row| {
                let images = images_by_post.remove(&row.id).unwrap_or_default();
                Post::from_parts(row, images)
            })
            .collect();

        Ok(PostPage { posts, total })
    }

    async fn create_post(&self, post: &PostInsert) -> Result<Post, AppError> {
        let mut tx = self.pool.begin().await?;

        let row: PostRow = sqlx::query_as::<_, PostRow>(
            r#"
            INSERT INTO posts (name, title, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, title, description, created_at, updated_at
            "#
        )
        .bind(&post.name)
        .bind(&post.title)
        .bind(&post.description)
        .bind(post.created_at)
        .bind(post.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        let mut images = Vec::with_capacity(post.images.len());

        for (position, image) in post.images.iter().enumerate() {
            let inserted: Image = sqlx::query_as::<_, Image>(
                r#"
                INSERT INTO images (
                    post_id, position, url, filename, mimetype, size, content, created_at, updated_at
                )
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
                RETURNING id, post_id, position, url, filename, mimetype, size, content, created_at, updated_at
                "#
            )
            .bind(row.id)
            .bind(position as i32)
            .bind(&image.url)
            .bind(&image.filename)
            .bind(&image.mimetype)
            .bind(image.size)
            .bind(&image.content)
            .bind(post.created_at)
            .bind(post.updated_at)
            .fetch_one(&mut *tx)
            .await?;

            images.push(inserted);
        }

        // Dropping an uncommitted transaction rolls it back
        tx.commit().await?;

        Ok(Post::from_parts(row, images))
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
