//! Address step of checkout

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::domain::validation::{not_blank, FieldErrors};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    #[validate(custom = "not_blank")]
    pub full_name: String,
    #[validate(custom = "not_blank")]
    pub phone: String,
    #[validate(custom = "not_blank")]
    pub email: String,
    #[validate(custom = "not_blank")]
    pub address: String,
    #[validate(custom = "not_blank")]
    pub city: String,
    #[validate(custom = "not_blank")]
    pub state: String,
    #[validate(custom = "not_blank")]
    pub pincode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub landmark: Option<String>,
}

/// Address form as the customer fills it in.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressForm {
    pub shipping_address: Address,
    #[serde(default)]
    pub billing_address: Address,
    #[serde(default = "default_same_as_shipping")]
    pub same_as_shipping: bool,
}

fn default_same_as_shipping() -> bool { true }

impl AddressForm {
    pub fn new(shipping_address: Address) -> Self {
        Self { shipping_address, billing_address: Address::default(), same_as_shipping: true }
    }

    /// Billing address in effect: the shipping address itself while `same_as_shipping` holds.
    pub fn billing(&self) -> &Address {
        if self.same_as_shipping { &self.shipping_address } else { &self.billing_address }
    }

    pub fn validate(&self) -> Result<CheckoutSnapshot, FieldErrors> {
        let mut errors = FieldErrors::new();
        if let Err(e) = self.shipping_address.validate() {
            errors.extend_from(Some("shippingAddress"), &e);
        }
        if !self.same_as_shipping {
            if let Err(e) = self.billing_address.validate() {
                errors.extend_from(Some("billingAddress"), &e);
            }
        }
        errors.into_result(CheckoutSnapshot {
            shipping_address: self.shipping_address.clone(),
            billing_address: self.billing().clone(),
            same_as_shipping: self.same_as_shipping,
        })
    }
}

/// Persisted bridge between the address and payment steps.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSnapshot {
    pub shipping_address: Address,
    pub billing_address: Address,
    pub same_as_shipping: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address() -> Address {
        Address {
            full_name: "Meera Iyer".into(),
            phone: "9876543210".into(),
            email: "meera@example.com".into(),
            address: "12 Lake View Road".into(),
            city: "Bengaluru".into(),
            state: "Karnataka".into(),
            pincode: "560001".into(),
            landmark: None,
        }
    }

    #[test]
    fn test_billing_mirrors_shipping() {
        let mut form = AddressForm::new(address());
        form.shipping_address.city = "Mysuru".into();
        assert_eq!(form.billing().city, "Mysuru");
        let snapshot = form.validate().unwrap();
        assert_eq!(snapshot.billing_address, snapshot.shipping_address);
    }

    #[test]
    fn test_blank_city_rejected() {
        let mut form = AddressForm::new(address());
        form.shipping_address.city = "  ".into();
        let errors = form.validate().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors.get("shippingAddress.city"), Some("is required"));
    }

    #[test]
    fn test_separate_billing_validated() {
        let mut form = AddressForm::new(address());
        form.same_as_shipping = false;
        let errors = form.validate().unwrap_err();
        assert!(errors.contains("billingAddress.fullName"));
        assert!(errors.contains("billingAddress.pincode"));
        assert!(!errors.contains("billingAddress.landmark"));

        form.billing_address = Address { city: "Chennai".into(), ..address() };
        let snapshot = form.validate().unwrap();
        assert_eq!(snapshot.billing_address.city, "Chennai");
        assert!(!snapshot.same_as_shipping);
    }
}
