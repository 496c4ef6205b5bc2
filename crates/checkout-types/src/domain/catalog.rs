use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ActiveStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub sku: Option<String>,
    pub price: Decimal,
    pub status: ActiveStatus,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Product {
    pub fn new(name: impl Into<String>, price: Decimal) -> anyhow::Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            anyhow::bail!("product name empty");
        }
        if price < Decimal::ZERO {
            anyhow::bail!("product price negative");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            sku: None,
            price,
            status: ActiveStatus::Active,
            created_at: Utc::now(),
            deleted_at: None,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> anyhow::Result<Self> {
        let name = name.into();
        let email = email.into();
        if name.trim().is_empty() {
            anyhow::bail!("user name empty");
        }
        if !email.contains('@') {
            anyhow::bail!("user email malformed");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            email,
            created_at: Utc::now(),
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub name: String,
    pub phone: Option<String>,
    pub address: String,
    pub landmark: Option<String>,
    pub house_number: Option<String>,
    pub city: String,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub country: String,
    pub created_at: DateTime<Utc>,
}

impl ShippingAddress {
    pub fn new(
        user_id: Option<Uuid>,
        name: impl Into<String>,
        address: impl Into<String>,
        city: impl Into<String>,
        country: impl Into<String>,
    ) -> anyhow::Result<Self> {
        let name = name.into();
        let address = address.into();
        if name.trim().is_empty() {
            anyhow::bail!("address recipient name empty");
        }
        if address.trim().is_empty() {
            anyhow::bail!("address line empty");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            phone: None,
            address,
            landmark: None,
            house_number: None,
            city: city.into(),
            state: None,
            zip: None,
            country: country.into(),
            created_at: Utc::now(),
        })
    }

    /// Single-line rendering used on invoices: house number, landmark,
    /// street, city, state, country, zip. Absent parts are skipped.
    pub fn one_line(&self) -> String {
        let mut parts: Vec<&str> = Vec::new();
        if let Some(house) = self.house_number.as_deref() {
            parts.push(house);
        }
        if let Some(landmark) = self.landmark.as_deref() {
            parts.push(landmark);
        }
        parts.push(&self.address);
        parts.push(&self.city);
        if let Some(state) = self.state.as_deref() {
            parts.push(state);
        }
        parts.push(&self.country);
        if let Some(zip) = self.zip.as_deref() {
            parts.push(zip);
        }
        parts.join(" ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn address_renders_one_line() {
        let mut addr = ShippingAddress::new(None, "Asha Rao", "12 Hill Rd", "Pune", "IN").unwrap();
        addr.house_number = Some("B-4".into());
        addr.zip = Some("411001".into());
        assert_eq!(addr.one_line(), "B-4 12 Hill Rd Pune IN 411001");
    }

    #[test]
    fn constructor_validation() {
        assert!(Product::new("", dec!(1)).is_err());
        assert!(Product::new("Mug", dec!(-1)).is_err());
        assert!(User::new("Asha", "not-an-email").is_err());
        assert!(ShippingAddress::new(None, "", "12 Hill Rd", "Pune", "IN").is_err());
    }
}
