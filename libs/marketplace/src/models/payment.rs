//! Payments recorded against bookings

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Payment method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Card,
    MobileBanking,
    DigitalWallet,
}

impl PaymentMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Card => "card",
            PaymentMethod::MobileBanking => "mobile_banking",
            PaymentMethod::DigitalWallet => "digital_wallet",
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(PaymentMethod::Cash),
            "card" => Ok(PaymentMethod::Card),
            "mobile_banking" => Ok(PaymentMethod::MobileBanking),
            "digital_wallet" => Ok(PaymentMethod::DigitalWallet),
            other => Err(format!("Unknown payment method: {}", other)),
        }
    }
}

/// Payment entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: Uuid,
    pub booking_id: Uuid,
    pub amount: f64,
    pub payment_date: DateTime<Utc>,
    pub payment_method: PaymentMethod,
    pub transaction_id: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
