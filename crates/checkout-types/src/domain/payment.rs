use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::PaymentMethod;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Processing,
    Completed,
    Failed,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Processing => "processing",
            PaymentStatus::Completed => "completed",
            PaymentStatus::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "processing" => Some(PaymentStatus::Processing),
            "completed" => Some(PaymentStatus::Completed),
            "failed" => Some(PaymentStatus::Failed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub created_by: Option<Uuid>,
    pub amount: Decimal,
    pub method: PaymentMethod,
    pub status: PaymentStatus,
    pub external_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Payment {
    pub fn new(
        order_id: Uuid,
        created_by: Option<Uuid>,
        amount: Decimal,
        method: PaymentMethod,
        status: PaymentStatus,
        external_id: Option<String>,
    ) -> anyhow::Result<Self> {
        if amount < Decimal::ZERO {
            anyhow::bail!("payment amount negative");
        }
        Ok(Self {
            id: Uuid::new_v4(),
            order_id,
            created_by,
            amount,
            method,
            status,
            external_id,
            created_at: Utc::now(),
        })
    }
}
