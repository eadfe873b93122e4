use std::sync::Arc;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod graceful_shutdown;

pub use domain::{entities, use_cases};
pub use interfaces::{handlers, repositories, routes};
pub use infrastructure::{db, storage};

use repositories::{post::PostRepository, sqlx_repo::SqlxPostRepo};
use storage::ObjectStorage;
use use_cases::posts::PostHandler;

/// Page-size defaults applied to list requests.
#[derive(Debug, Clone, Copy)]
pub struct PaginationSettings {
    pub default_page_size: u32,
    pub max_page_size: u32,
}

impl From<&settings::AppConfig> for PaginationSettings {
    fn from(config: &settings::AppConfig) -> Self {
        PaginationSettings {
            default_page_size: config.default_page_size,
            max_page_size: config.max_page_size,
        }
    }
}

pub struct AppState {
    pub post_handler: PostHandler,
    pub pagination: PaginationSettings,
}

impl AppState {
    pub fn new(
        config: &settings::AppConfig,
        pool: sqlx::PgPool,
        storage: Arc<dyn ObjectStorage>,
    ) -> Self {
        let post_repo: Arc<dyn PostRepository> = Arc::new(SqlxPostRepo::new(pool));

        AppState::with_dependencies(post_repo, storage, PaginationSettings::from(config))
    }

    pub fn with_dependencies(
        post_repo: Arc<dyn PostRepository>,
        storage: Arc<dyn ObjectStorage>,
        pagination: PaginationSettings,
    ) -> Self {
        AppState {
            post_handler: PostHandler::new(post_repo, storage),
            pagination,
        }
    }
}
