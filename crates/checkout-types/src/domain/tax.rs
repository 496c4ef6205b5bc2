use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::ActiveStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tax {
    pub id: Uuid,
    pub name: String,
    /// Percentage points, e.g. `5` for a 5% levy.
    pub rate: Decimal,
    pub status: ActiveStatus,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Tax {
    pub fn new(name: impl Into<String>, rate: Decimal) -> anyhow::Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            anyhow::bail!("tax name empty");
        }
        if rate < Decimal::ZERO {
            anyhow::bail!("tax rate negative");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            rate,
            status: ActiveStatus::Active,
            created_at: Utc::now(),
            deleted_at: None,
        })
    }

    pub fn is_active(&self) -> bool {
        self.status == ActiveStatus::Active && self.deleted_at.is_none()
    }
}

/// Combined rate over every active levy. Missing rows mean a 0% regime.
pub fn combined_rate(taxes: &[Tax]) -> Decimal {
    taxes
        .iter()
        .filter(|t| t.is_active())
        .map(|t| t.rate)
        .sum()
}
