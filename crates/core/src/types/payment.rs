//! Payment method kinds accepted at checkout.

use serde::{Deserialize, Serialize};

/// Error returned when a payment kind string is not recognised.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid payment method: {0}")]
pub struct PaymentKindError(pub String);

/// The three payment methods the storefront supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentKind {
    /// Cash on delivery. Needs no further details.
    Cod,
    /// UPI transfer. Needs a UPI identifier.
    Upi,
    /// Debit/credit card, either saved or entered at checkout.
    #[serde(alias = "debit")]
    Card,
}

impl PaymentKind {
    /// Wire name of the payment kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Cod => "cod",
            Self::Upi => "upi",
            Self::Card => "card",
        }
    }
}

impl std::fmt::Display for PaymentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PaymentKind {
    type Err = PaymentKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cod" => Ok(Self::Cod),
            "upi" => Ok(Self::Upi),
            "card" | "debit" => Ok(Self::Card),
            other => Err(PaymentKindError(other.to_string())),
        }
    }
}
