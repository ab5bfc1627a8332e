use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A kost (boarding-house) listing, the rentable unit of the marketplace.
///
/// Prices are integer amounts in the currency's minor-unit-free form,
/// one per supported booking term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Kost {
    pub id: Uuid,
    pub name: String,
    pub room_size: String,
    pub total_rooms: i32,
    pub available_rooms: i32,
    pub price_per_month: i64,
    pub price_per_three_months: i64,
    pub price_per_six_months: i64,
    pub price_per_year: i64,
    pub address: String,
    pub city: String,
    pub province: String,
    pub room_facilities: Vec<String>,
    pub shared_facilities: Vec<String>,
    pub rules: Vec<String>,
    pub category: String,
    pub photo_main: Option<String>,
    pub photo_outside: Option<String>,
    pub photo_inside: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Optional filters for listing search. Empty filters match everything.
///
/// `city` and `category` are substring matches; the price bounds apply
/// to the monthly price.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchFilters {
    pub city: Option<String>,
    pub category: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
}

impl SearchFilters {
    /// Whether a listing passes every set filter. The Postgres repository
    /// pushes the same predicates into the query; this is the in-memory
    /// equivalent.
    pub fn matches(&self, kost: &Kost) -> bool {
        if let Some(city) = &self.city {
            if !kost.city.to_lowercase().contains(&city.to_lowercase()) {
                return false;
            }
        }
        if let Some(category) = &self.category {
            if !kost
                .category
                .to_lowercase()
                .contains(&category.to_lowercase())
            {
                return false;
            }
        }
        if let Some(min) = self.price_min {
            if kost.price_per_month < min {
                return false;
            }
        }
        if let Some(max) = self.price_max {
            if kost.price_per_month > max {
                return false;
            }
        }
        true
    }
}

/// Distinct filter values offered to the search UI.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Suggestions {
    pub cities: Vec<String>,
    pub categories: Vec<String>,
    pub monthly_prices: Vec<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_kost(city: &str, category: &str, price: i64) -> Kost {
        let now = Utc::now();
        Kost {
            id: Uuid::new_v4(),
            name: "Kost Mawar".into(),
            room_size: "3x4".into(),
            total_rooms: 10,
            available_rooms: 4,
            price_per_month: price,
            price_per_three_months: price * 3,
            price_per_six_months: price * 6,
            price_per_year: price * 12,
            address: "Jl. Mawar 1".into(),
            city: city.into(),
            province: "Jawa Barat".into(),
            room_facilities: vec!["AC".into()],
            shared_facilities: vec!["Dapur".into()],
            rules: vec!["No smoking".into()],
            category: category.into(),
            photo_main: None,
            photo_outside: None,
            photo_inside: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_empty_filters_match_everything() {
        let filters = SearchFilters::default();
        assert!(filters.matches(&sample_kost("Bandung", "Putri", 750_000)));
    }

    #[test]
    fn test_city_filter_is_substring_and_case_insensitive() {
        let filters = SearchFilters {
            city: Some("band".into()),
            ..Default::default()
        };
        assert!(filters.matches(&sample_kost("Bandung", "Putra", 500_000)));
        assert!(!filters.matches(&sample_kost("Jakarta", "Putra", 500_000)));
    }

    #[test]
    fn test_price_bounds_apply_to_monthly_price() {
        let filters = SearchFilters {
            price_min: Some(400_000),
            price_max: Some(600_000),
            ..Default::default()
        };
        assert!(filters.matches(&sample_kost("Bandung", "Putra", 500_000)));
        assert!(!filters.matches(&sample_kost("Bandung", "Putra", 700_000)));
        assert!(!filters.matches(&sample_kost("Bandung", "Putra", 300_000)));
    }
}
