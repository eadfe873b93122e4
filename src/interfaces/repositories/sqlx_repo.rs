use sqlx::PgPool;

#[derive(Clone)]
pub struct SqlxPostRepo {
    pub pool: PgPool,
}
