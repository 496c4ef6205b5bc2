use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ActiveStatus;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DiscountType {
    Percentage,
    Flat,
}

impl DiscountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountType::Percentage => "percentage",
            DiscountType::Flat => "flat",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "percentage" => Some(DiscountType::Percentage),
            "flat" => Some(DiscountType::Flat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Coupon {
    pub id: Uuid,
    pub code: String,
    pub discount_type: DiscountType,
    pub discount: Decimal,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    pub status: ActiveStatus,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Coupon {
    pub fn new(
        code: impl Into<String>,
        discount_type: DiscountType,
        discount: Decimal,
    ) -> anyhow::Result<Self> {
        let code = code.into();
        if code.trim().is_empty() {
            anyhow::bail!("coupon code empty");
        }
        if discount < Decimal::ZERO {
            anyhow::bail!("coupon discount negative");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            code,
            discount_type,
            discount,
            from_date: None,
            to_date: None,
            status: ActiveStatus::Active,
            created_at: Utc::now(),
            deleted_at: None,
        })
    }

    pub fn with_window(
        mut self,
        from_date: Option<DateTime<Utc>>,
        to_date: Option<DateTime<Utc>>,
    ) -> Self {
        self.from_date = from_date;
        self.to_date = to_date;
        self
    }

    /// Active, not soft-deleted, and inside the validity window when one is
    /// set.
    pub fn is_applicable(&self, now: DateTime<Utc>) -> bool {
        if self.status != ActiveStatus::Active || self.deleted_at.is_some() {
            return false;
        }
        if let Some(from) = self.from_date {
            if now < from {
                return false;
            }
        }
        if let Some(to) = self.to_date {
            if now > to {
                return false;
            }
        }
        true
    }

    /// Discount amount against a subtotal: percentage coupons scale it,
    /// flat coupons are taken as-is. Rounded to cents.
    pub fn discount_on(&self, subtotal: Decimal) -> Decimal {
        match self.discount_type {
            DiscountType::Percentage => {
                (subtotal * self.discount / Decimal::from(100)).round_dp(2)
            }
            DiscountType::Flat => self.discount,
        }
    }
}
