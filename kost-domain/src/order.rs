use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Share of the total price credited back as points on confirmation.
pub const POINTS_AWARD_RATE: f64 = 0.10;

/// Booking terms a kost can be rented for. One price column per term on
/// the listing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BookingTerm {
    OneMonth,
    ThreeMonths,
    SixMonths,
    TwelveMonths,
}

impl std::fmt::Display for BookingTerm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BookingTerm::OneMonth => "one_month",
            BookingTerm::ThreeMonths => "three_months",
            BookingTerm::SixMonths => "six_months",
            BookingTerm::TwelveMonths => "twelve_months",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for BookingTerm {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one_month" => Ok(BookingTerm::OneMonth),
            "three_months" => Ok(BookingTerm::ThreeMonths),
            "six_months" => Ok(BookingTerm::SixMonths),
            "twelve_months" => Ok(BookingTerm::TwelveMonths),
            other => Err(format!("unknown booking term: {other}")),
        }
    }
}

/// Order status in the booking lifecycle.
///
/// `Pending` is the initial state. The transition into `Confirmed` is the
/// only one with a side effect (the points credit); `Rejected` and
/// `Cancelled` are administratively assigned terminal states with no
/// special behavior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Rejected,
    Cancelled,
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Rejected => "rejected",
            OrderStatus::Cancelled => "cancelled",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "rejected" => Ok(OrderStatus::Rejected),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

/// One booking request tying a user to a kost for a term and price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub user_id: Uuid,
    pub kost_id: Uuid,
    pub duration: BookingTerm,
    pub total_price: i64,
    pub status: OrderStatus,
    pub payment_proof: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn new(user_id: Uuid, kost_id: Uuid, duration: BookingTerm, total_price: i64) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            kost_id,
            duration,
            total_price,
            status: OrderStatus::Pending,
            payment_proof: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Points credited to the owner when an order is confirmed:
/// `floor(total_price * 0.10)`.
pub fn confirmation_award(total_price: i64) -> i64 {
    (total_price as f64 * POINTS_AWARD_RATE).floor() as i64
}

/// An order enriched with the owner's username and the kost's name, the
/// shape returned by the booking list.
#[derive(Debug, Clone, Serialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub username: String,
    pub kost_name: String,
}

/// Result of an administrative status change. `points_awarded` is set
/// only when the change entered `Confirmed` from a different status.
#[derive(Debug, Clone, Serialize)]
pub struct StatusChange {
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub points_awarded: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_order_starts_pending() {
        let order = Order::new(Uuid::new_v4(), Uuid::new_v4(), BookingTerm::OneMonth, 750_000);
        assert_eq!(order.status, OrderStatus::Pending);
        assert!(order.payment_proof.is_none());
    }

    #[test]
    fn test_confirmation_award_is_ten_percent_floored() {
        assert_eq!(confirmation_award(1_000_000), 100_000);
        assert_eq!(confirmation_award(999), 99);
        assert_eq!(confirmation_award(9), 0);
        assert_eq!(confirmation_award(0), 0);
    }

    #[test]
    fn test_status_round_trip() {
        for status in [
            OrderStatus::Pending,
            OrderStatus::Confirmed,
            OrderStatus::Rejected,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(status.to_string().parse::<OrderStatus>().unwrap(), status);
        }
        assert!("shipped".parse::<OrderStatus>().is_err());
    }

    #[test]
    fn test_booking_term_round_trip() {
        for term in [
            BookingTerm::OneMonth,
            BookingTerm::ThreeMonths,
            BookingTerm::SixMonths,
            BookingTerm::TwelveMonths,
        ] {
            assert_eq!(term.to_string().parse::<BookingTerm>().unwrap(), term);
        }
    }
}
