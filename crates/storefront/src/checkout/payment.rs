//! Payment input collected at checkout and the descriptor sent with an order.

use eazika_core::{PaymentKind, SavedCardId};
use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ValidationError;

/// A card the customer saved earlier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedInstrument {
    pub id: SavedCardId,
    pub brand: String,
    pub last4: String,
    pub holder_name: String,
}

/// Payment fields as entered on the checkout form.
///
/// Only the fields relevant to `method` are read. For cards, a
/// `saved_card_id` selects a saved instrument; otherwise every new-card field
/// must be filled in.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDetails {
    pub method: Option<PaymentKind>,
    #[serde(default)]
    pub upi_id: Option<String>,
    #[serde(default)]
    pub saved_card_id: Option<SavedCardId>,
    #[serde(default)]
    pub card_name: Option<String>,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub card_number: Option<SecretString>,
    #[serde(default)]
    pub card_expiry: Option<String>,
    #[serde(default, deserialize_with = "deserialize_secret")]
    pub card_cvv: Option<SecretString>,
    #[serde(default)]
    pub card_country: Option<String>,
    #[serde(default)]
    pub save_card: bool,
}

impl std::fmt::Debug for PaymentDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PaymentDetails")
            .field("method", &self.method)
            .field("upi_id", &self.upi_id)
            .field("saved_card_id", &self.saved_card_id)
            .field("card_name", &self.card_name)
            .field("card_number", &self.card_number.as_ref().map(|_| "[REDACTED]"))
            .field("card_expiry", &self.card_expiry)
            .field("card_cvv", &self.card_cvv.as_ref().map(|_| "[REDACTED]"))
            .field("card_country", &self.card_country)
            .field("save_card", &self.save_card)
            .finish()
    }
}

impl PaymentDetails {
    /// Cash on delivery.
    #[must_use]
    pub fn cod() -> Self {
        Self {
            method: Some(PaymentKind::Cod),
            ..Self::default()
        }
    }

    /// UPI transfer to `upi_id`.
    #[must_use]
    pub fn upi(upi_id: impl Into<String>) -> Self {
        Self {
            method: Some(PaymentKind::Upi),
            upi_id: Some(upi_id.into()),
            ..Self::default()
        }
    }

    /// A previously saved card.
    #[must_use]
    pub fn saved_card(id: SavedCardId, holder_name: impl Into<String>) -> Self {
        Self {
            method: Some(PaymentKind::Card),
            saved_card_id: Some(id),
            card_name: Some(holder_name.into()),
            ..Self::default()
        }
    }

    /// Resolve the form into the descriptor sent to the backend.
    ///
    /// # Errors
    ///
    /// Returns the first missing or invalid field for the chosen method.
    pub fn resolve(&self, saved: &[SavedInstrument]) -> Result<PaymentDescriptor, ValidationError> {
        match self.method.ok_or(ValidationError::MissingPaymentMethod)? {
            PaymentKind::Cod => Ok(PaymentDescriptor::Cod),
            PaymentKind::Upi => {
                let upi_id = filled(self.upi_id.as_deref()).ok_or(ValidationError::MissingUpiId)?;
                Ok(PaymentDescriptor::Upi {
                    upi_id: upi_id.to_string(),
                })
            }
            PaymentKind::Card => self.resolve_card(saved).map(PaymentDescriptor::Card),
        }
    }

    fn resolve_card(&self, saved: &[SavedInstrument]) -> Result<CardPayment, ValidationError> {
        let holder_name = filled(self.card_name.as_deref())
            .ok_or(ValidationError::MissingCardHolder)?
            .to_string();

        if let Some(card_id) = self.saved_card_id {
            if saved.iter().any(|card| card.id == card_id) {
                return Ok(CardPayment::Saved {
                    card_id,
                    holder_name,
                });
            }
            // An unknown saved card still goes through when the new-card fields are complete.
            return self
                .new_card(holder_name)
                .inspect(|_| tracing::warn!(%card_id, "Saved card not found; using entered card details"))
                .map_err(|_| ValidationError::UnknownSavedCard(card_id));
        }

        self.new_card(holder_name)
    }

    fn new_card(&self, holder_name: String) -> Result<CardPayment, ValidationError> {
        let number = self
            .card_number
            .clone()
            .filter(|n| !n.expose_secret().trim().is_empty())
            .ok_or(ValidationError::IncompleteNewCard("card number"))?;
        let expiry = filled(self.card_expiry.as_deref())
            .ok_or(ValidationError::IncompleteNewCard("expiry"))?
            .to_string();
        let cvv = self
            .card_cvv
            .clone()
            .filter(|c| !c.expose_secret().trim().is_empty())
            .ok_or(ValidationError::IncompleteNewCard("cvv"))?;
        let country = filled(self.card_country.as_deref())
            .ok_or(ValidationError::IncompleteNewCard("country"))?
            .to_string();

        Ok(CardPayment::New(NewCard {
            holder_name,
            number,
            expiry,
            cvv,
            country,
            save_card: self.save_card,
        }))
    }
}

fn filled(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

/// Payment method as sent with an order, tagged by `type`.
///
/// The backend knows card payments as `debit`.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PaymentDescriptor {
    Cod,
    Upi {
        #[serde(rename = "upiId")]
        upi_id: String,
    },
    #[serde(rename = "debit")]
    Card(CardPayment),
}

impl PaymentDescriptor {
    #[must_use]
    pub const fn kind(&self) -> PaymentKind {
        match self {
            Self::Cod => PaymentKind::Cod,
            Self::Upi { .. } => PaymentKind::Upi,
            Self::Card(_) => PaymentKind::Card,
        }
    }
}

/// Validated card payment.
#[derive(Debug, Clone)]
pub enum CardPayment {
    Saved {
        card_id: SavedCardId,
        holder_name: String,
    },
    New(NewCard),
}

/// Card details entered at checkout. `Debug` redacts number and CVV.
#[derive(Clone)]
pub struct NewCard {
    pub holder_name: String,
    pub number: SecretString,
    pub expiry: String,
    pub cvv: SecretString,
    pub country: String,
    pub save_card: bool,
}

impl std::fmt::Debug for NewCard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NewCard")
            .field("holder_name", &self.holder_name)
            .field("number", &"[REDACTED]")
            .field("expiry", &self.expiry)
            .field("cvv", &"[REDACTED]")
            .field("country", &self.country)
            .field("save_card", &self.save_card)
            .finish()
    }
}

impl Serialize for CardPayment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Saved {
                card_id,
                holder_name,
            } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("savedCardId", card_id)?;
                map.serialize_entry("cardName", holder_name)?;
                map.end()
            }
            Self::New(card) => {
                let mut map = serializer.serialize_map(Some(6))?;
                map.serialize_entry("cardName", &card.holder_name)?;
                map.serialize_entry("cardNumber", card.number.expose_secret())?;
                map.serialize_entry("cardExpiry", &card.expiry)?;
                map.serialize_entry("cardCvv", card.cvv.expose_secret())?;
                map.serialize_entry("cardCountry", &card.country)?;
                map.serialize_entry("saveCard", &card.save_card)?;
                map.end()
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn saved() -> Vec<SavedInstrument> {
        vec![SavedInstrument {
            id: SavedCardId::new(1),
            brand: "Mastercard".to_string(),
            last4: "3156".to_string(),
            holder_name: "Asha Rao".to_string(),
        }]
    }

    fn new_card() -> PaymentDetails {
        PaymentDetails {
            method: Some(PaymentKind::Card),
            card_name: Some("Asha Rao".to_string()),
            card_number: Some(SecretString::from("4111111111111111")),
            card_expiry: Some("08/29".to_string()),
            card_cvv: Some(SecretString::from("123")),
            card_country: Some("India".to_string()),
            save_card: true,
            ..PaymentDetails::default()
        }
    }

    #[test]
    fn test_cod_needs_nothing() {
        let descriptor = PaymentDetails::cod().resolve(&[]).unwrap();
        assert_eq!(serde_json::to_value(&descriptor).unwrap(), json!({"type": "cod"}));
    }

    #[test]
    fn test_upi_requires_identifier() {
        assert_eq!(
            PaymentDetails::upi("  ").resolve(&[]).unwrap_err(),
            ValidationError::MissingUpiId
        );
        let descriptor = PaymentDetails::upi("buyer@okbank").resolve(&[]).unwrap();
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({"type": "upi", "upiId": "buyer@okbank"})
        );
    }

    #[test]
    fn test_missing_method_is_rejected() {
        assert_eq!(
            PaymentDetails::default().resolve(&[]).unwrap_err(),
            ValidationError::MissingPaymentMethod
        );
    }

    #[test]
    fn test_saved_card_requires_holder_and_known_id() {
        let descriptor = PaymentDetails::saved_card(SavedCardId::new(1), "Asha Rao")
            .resolve(&saved())
            .unwrap();
        assert_eq!(
            serde_json::to_value(&descriptor).unwrap(),
            json!({"type": "debit", "savedCardId": 1, "cardName": "Asha Rao"})
        );

        assert_eq!(
            PaymentDetails::saved_card(SavedCardId::new(1), "")
                .resolve(&saved())
                .unwrap_err(),
            ValidationError::MissingCardHolder
        );
        assert_eq!(
            PaymentDetails::saved_card(SavedCardId::new(9), "Asha Rao")
                .resolve(&saved())
                .unwrap_err(),
            ValidationError::UnknownSavedCard(SavedCardId::new(9))
        );
    }

    #[test]
    fn test_stale_saved_card_falls_back_to_entered_card() {
        let mut details = new_card();
        details.saved_card_id = Some(SavedCardId::new(9));

        let descriptor = details.resolve(&[]).unwrap();
        assert!(matches!(
            descriptor,
            PaymentDescriptor::Card(CardPayment::New(ref card)) if card.country == "India"
        ));

        details.card_expiry = None;
        assert_eq!(
            details.resolve(&[]).unwrap_err(),
            ValidationError::UnknownSavedCard(SavedCardId::new(9))
        );
    }

    #[test]
    fn test_new_card_requires_every_field() {
        let descriptor = new_card().resolve(&saved()).unwrap();
        let value = serde_json::to_value(&descriptor).unwrap();
        assert_eq!(value["type"], "debit");
        assert_eq!(value["cardNumber"], "4111111111111111");
        assert_eq!(value["saveCard"], true);

        let mut details = new_card();
        details.card_cvv = None;
        assert_eq!(
            details.resolve(&saved()).unwrap_err(),
            ValidationError::IncompleteNewCard("cvv")
        );

        let mut details = new_card();
        details.card_country = Some(String::new());
        assert_eq!(
            details.resolve(&saved()).unwrap_err(),
            ValidationError::IncompleteNewCard("country")
        );
    }

    #[test]
    fn test_debug_redacts_card_secrets() {
        let details = new_card();
        let debug = format!("{details:?}");
        assert!(!debug.contains("4111111111111111"));
        assert!(debug.contains("[REDACTED]"));

        let descriptor = details.resolve(&saved()).unwrap();
        let debug = format!("{descriptor:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("4111111111111111"));
    }

    #[test]
    fn test_deserializes_form_with_debit_alias() {
        let details: PaymentDetails = serde_yaml::from_str(
            "method: debit\nsavedCardId: 1\ncardName: Asha Rao\n",
        )
        .unwrap();
        assert_eq!(details.method, Some(PaymentKind::Card));
        assert!(matches!(
            details.resolve(&saved()).unwrap(),
            PaymentDescriptor::Card(CardPayment::Saved { .. })
        ));
    }
}
