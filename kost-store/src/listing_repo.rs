use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{PgPool, Postgres, QueryBuilder, Row};
use uuid::Uuid;

use kost_domain::error::DomainError;
use kost_domain::listing::{Kost, SearchFilters, Suggestions};
use kost_domain::repository::KostRepository;

pub struct PgKostRepository {
    pool: PgPool,
}

impl PgKostRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct KostRow {
    id: Uuid,
    name: String,
    room_size: String,
    total_rooms: i32,
    available_rooms: i32,
    price_per_month: i64,
    price_per_three_months: i64,
    price_per_six_months: i64,
    price_per_year: i64,
    address: String,
    city: String,
    province: String,
    room_facilities: Json<Vec<String>>,
    shared_facilities: Json<Vec<String>>,
    rules: Json<Vec<String>>,
    category: String,
    photo_main: Option<String>,
    photo_outside: Option<String>,
    photo_inside: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<KostRow> for Kost {
    fn from(row: KostRow) -> Self {
        Kost {
            id: row.id,
            name: row.name,
            room_size: row.room_size,
            total_rooms: row.total_rooms,
            available_rooms: row.available_rooms,
            price_per_month: row.price_per_month,
            price_per_three_months: row.price_per_three_months,
            price_per_six_months: row.price_per_six_months,
            price_per_year: row.price_per_year,
            address: row.address,
            city: row.city,
            province: row.province,
            room_facilities: row.room_facilities.0,
            shared_facilities: row.shared_facilities.0,
            rules: row.rules.0,
            category: row.category,
            photo_main: row.photo_main,
            photo_outside: row.photo_outside,
            photo_inside: row.photo_inside,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_KOST: &str = "SELECT id, name, room_size, total_rooms, available_rooms, \
                           price_per_month, price_per_three_months, price_per_six_months, \
                           price_per_year, address, city, province, room_facilities, \
                           shared_facilities, rules, category, photo_main, photo_outside, \
                           photo_inside, created_at, updated_at FROM kosts";

#[async_trait]
impl KostRepository for PgKostRepository {
    async fn create(&self, kost: &Kost) -> Result<Kost, DomainError> {
        sqlx::query(
            "INSERT INTO kosts (id, name, room_size, total_rooms, available_rooms, \
             price_per_month, price_per_three_months, price_per_six_months, price_per_year, \
             address, city, province, room_facilities, shared_facilities, rules, category, \
             photo_main, photo_outside, photo_inside, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, \
             $17, $18, $19, $20, $21)",
        )
        .bind(kost.id)
        .bind(&kost.name)
        .bind(&kost.room_size)
        .bind(kost.total_rooms)
        .bind(kost.available_rooms)
        .bind(kost.price_per_month)
        .bind(kost.price_per_three_months)
        .bind(kost.price_per_six_months)
        .bind(kost.price_per_year)
        .bind(&kost.address)
        .bind(&kost.city)
        .bind(&kost.province)
        .bind(Json(&kost.room_facilities))
        .bind(Json(&kost.shared_facilities))
        .bind(Json(&kost.rules))
        .bind(&kost.category)
        .bind(&kost.photo_main)
        .bind(&kost.photo_outside)
        .bind(&kost.photo_inside)
        .bind(kost.created_at)
        .bind(kost.updated_at)
        .execute(&self.pool)
        .await
        .map_err(DomainError::storage)?;

        Ok(kost.clone())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Kost>, DomainError> {
        let row = sqlx::query_as::<_, KostRow>(&format!("{SELECT_KOST} WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        Ok(row.map(Kost::from))
    }

    async fn list(&self) -> Result<Vec<Kost>, DomainError> {
        let rows = sqlx::query_as::<_, KostRow>(&format!("{SELECT_KOST} ORDER BY created_at"))
            .fetch_all(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        Ok(rows.into_iter().map(Kost::from).collect())
    }

    async fn update(&self, id: Uuid, kost: &Kost) -> Result<Kost, DomainError> {
        let row = sqlx::query_as::<_, KostRow>(
            "UPDATE kosts SET name = $1, room_size = $2, total_rooms = $3, available_rooms = $4, \
             price_per_month = $5, price_per_three_months = $6, price_per_six_months = $7, \
             price_per_year = $8, address = $9, city = $10, province = $11, \
             room_facilities = $12, shared_facilities = $13, rules = $14, category = $15, \
             updated_at = NOW() WHERE id = $16 \
             RETURNING id, name, room_size, total_rooms, available_rooms, price_per_month, \
             price_per_three_months, price_per_six_months, price_per_year, address, city, \
             province, room_facilities, shared_facilities, rules, category, photo_main, \
             photo_outside, photo_inside, created_at, updated_at",
        )
        .bind(&kost.name)
        .bind(&kost.room_size)
        .bind(kost.total_rooms)
        .bind(kost.available_rooms)
        .bind(kost.price_per_month)
        .bind(kost.price_per_three_months)
        .bind(kost.price_per_six_months)
        .bind(kost.price_per_year)
        .bind(&kost.address)
        .bind(&kost.city)
        .bind(&kost.province)
        .bind(Json(&kost.room_facilities))
        .bind(Json(&kost.shared_facilities))
        .bind(Json(&kost.rules))
        .bind(&kost.category)
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(DomainError::storage)?
        .ok_or_else(|| DomainError::NotFound(format!("kost {id}")))?;

        Ok(row.into())
    }

    async fn delete(&self, id: Uuid) -> Result<(), DomainError> {
        let result = sqlx::query("DELETE FROM kosts WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        if result.rows_affected() == 0 {
            return Err(DomainError::NotFound(format!("kost {id}")));
        }
        Ok(())
    }

    async fn search(&self, filters: &SearchFilters) -> Result<Vec<Kost>, DomainError> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(SELECT_KOST);
        builder.push(" WHERE TRUE");

        if let Some(city) = &filters.city {
            builder.push(" AND city ILIKE ");
            builder.push_bind(format!("%{city}%"));
        }
        if let Some(category) = &filters.category {
            builder.push(" AND category ILIKE ");
            builder.push_bind(format!("%{category}%"));
        }
        if let Some(min) = filters.price_min {
            builder.push(" AND price_per_month >= ");
            builder.push_bind(min);
        }
        if let Some(max) = filters.price_max {
            builder.push(" AND price_per_month <= ");
            builder.push_bind(max);
        }
        builder.push(" ORDER BY created_at");

        let rows = builder
            .build_query_as::<KostRow>()
            .fetch_all(&self.pool)
            .await
            .map_err(DomainError::storage)?;

        Ok(rows.into_iter().map(Kost::from).collect())
    }

    async fn suggestions(&self) -> Result<Suggestions, DomainError> {
        let cities = sqlx::query("SELECT DISTINCT city FROM kosts ORDER BY city")
            .fetch_all(&self.pool)
            .await
            .map_err(DomainError::storage)?
            .into_iter()
            .map(|row| row.get("city"))
            .collect();

        let categories = sqlx::query("SELECT DISTINCT category FROM kosts ORDER BY category")
            .fetch_all(&self.pool)
            .await
            .map_err(DomainError::storage)?
            .into_iter()
            .map(|row| row.get("category"))
            .collect();

        let monthly_prices = sqlx::query(
            "SELECT DISTINCT price_per_month FROM kosts ORDER BY price_per_month",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DomainError::storage)?
        .into_iter()
        .map(|row| row.get("price_per_month"))
        .collect();

        Ok(Suggestions {
            cities,
            categories,
            monthly_prices,
        })
    }
}
