use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use kost_domain::error::DomainError;
use kost_domain::repository::UserRepository;
use kost_domain::user::{Role, User};

pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
pub(crate) struct UserRow {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserRow {
    pub(crate) fn into_user(self) -> Result<User, DomainError> {
        Ok(User {
            id: self.id,
            username: self.username,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role.parse().map_err(DomainError::storage)?,
            points: self.points,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const SELECT_USER: &str = "SELECT id, username, email, password_hash, role, points, created_at, \
                           updated_at FROM users";

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create(&self, user: &User) -> Result<User, DomainError> {
        sqlx::query(
            "INSERT INTO users (id, username, email, password_hash, role, points, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.to_string())
        .bind(user.points)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DomainError::Validation("username or email already taken".into())
            }
            _ => DomainError::storage(e),
        })?;

        Ok(user.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, DomainError> {
        let row = sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn find_by_login(
        &self,
        username: &str,
        role: Role,
    ) -> Result<Option<User>, DomainError> {
        let row =
            sqlx::query_as::<_, UserRow>(&format!("{SELECT_USER} WHERE username = $1 AND role = $2"))
                .bind(username)
                .bind(role.to_string())
                .fetch_optional(&self.pool)
                .await
                .map_err(DomainError::storage)?;

        row.map(UserRow::into_user).transpose()
    }

    async fn update_profile(
        &self,
        id: Uuid,
        username: &str,
        email: &str,
    ) -> Result<User, DomainError> {
        let row = sqlx::query_as::<_, UserRow>(
            "UPDATE users SET username = $1, email = $2, updated_at = NOW() WHERE id = $3 \
             RETURNING id, username, email, password_hash, role, points, created_at, updated_at",
        )
        .bind(username)
        .bind(email)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                DomainError::Validation("username or email already taken".into())
            }
            _ => DomainError::storage(e),
        })?
        .ok_or_else(|| DomainError::NotFound(format!("user {id}")))?;

        row.into_user()
    }
}
