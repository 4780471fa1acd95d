//! Shipping address collected during checkout.

use serde::{Deserialize, Serialize};

/// Delivery information entered on the checkout form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub street: String,
    pub city: String,
    /// State/province. The only optional field.
    #[serde(default)]
    pub state: String,
    pub zipcode: String,
    pub country: String,
    pub phone: String,
}

impl ShippingAddress {
    /// Get full name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name.trim(), self.last_name.trim())
    }

    /// Format as single line.
    pub fn one_line(&self) -> String {
        let mut parts = vec![self.street.trim(), self.city.trim()];
        if !self.state.trim().is_empty() {
            parts.push(self.state.trim());
        }
        parts.push(self.zipcode.trim());
        parts.push(self.country.trim());
        parts.join(", ")
    }

    /// Names of required fields that are still blank.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("email", &self.email),
            ("street", &self.street),
            ("city", &self.city),
            ("zipcode", &self.zipcode),
            ("country", &self.country),
            ("phone", &self.phone),
        ]
        .into_iter()
        .filter(|(_, value)| value.trim().is_empty())
        .map(|(name, _)| name)
        .collect()
    }

    /// Check that every required field is filled in.
    pub fn is_form_valid(&self) -> bool {
        self.missing_fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> ShippingAddress {
        ShippingAddress {
            first_name: "Lan".into(),
            last_name: "Nguyen".into(),
            email: "lan@example.com".into(),
            street: "12 Le Loi".into(),
            city: "Hue".into(),
            state: String::new(),
            zipcode: "530000".into(),
            country: "Vietnam".into(),
            phone: "0901234567".into(),
        }
    }

    #[test]
    fn test_state_is_optional() {
        let addr = complete();
        assert!(addr.is_form_valid());
        assert_eq!(addr.one_line(), "12 Le Loi, Hue, 530000, Vietnam");
    }

    #[test]
    fn test_blank_fields_are_reported() {
        let mut addr = complete();
        addr.phone = "   ".into();
        addr.email.clear();

        assert!(!addr.is_form_valid());
        assert_eq!(addr.missing_fields(), vec!["email", "phone"]);
    }

    #[test]
    fn test_wire_form_is_camel_case() {
        let json = serde_json::to_value(complete()).unwrap();
        assert_eq!(json["firstName"], "Lan");
        assert_eq!(json["zipcode"], "530000");
    }
}
