//! Shipping address entered at checkout.

use eazika_core::{AddressId, Email, PhoneNumber};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Address form fields plus the backend id of the stored address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub id: AddressId,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub country: String,
}

/// A complete address. Contact fields are `None` when they are present but
/// not in a recognised format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAddress {
    pub id: AddressId,
    pub email: Option<Email>,
    pub phone: Option<PhoneNumber>,
}

impl ShippingAddress {
    /// Check that every field is present.
    ///
    /// Email and phone formats are not enforced; an unrecognised format is
    /// logged and the address is still accepted.
    ///
    /// # Errors
    ///
    /// Returns the first blank field in form order.
    pub fn validate(&self) -> Result<ValidatedAddress, ValidationError> {
        let fields = [
            ("full name", &self.full_name),
            ("email", &self.email),
            ("phone", &self.phone),
            ("address", &self.address),
            ("zip code", &self.zip_code),
            ("city", &self.city),
            ("country", &self.country),
        ];
        if let Some((name, _)) = fields.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(ValidationError::MissingAddressField(*name));
        }

        let email = Email::parse(&self.email)
            .inspect_err(|e| tracing::warn!(address_id = %self.id, "Unrecognised email format: {e}"))
            .ok();
        let phone = PhoneNumber::parse(&self.phone)
            .inspect_err(|e| tracing::warn!(address_id = %self.id, "Unrecognised phone format: {e}"))
            .ok();

        Ok(ValidatedAddress {
            id: self.id,
            email,
            phone,
        })
    }
}
