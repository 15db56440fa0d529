//! Masking of personal data before snapshots are persisted.

use serde_json::Value;

/// JSON keys whose string values are masked in audit snapshots.
const SENSITIVE_FIELDS: &[&str] = &[
    "document_number",
    "date_of_birth",
    "phone_number",
    "business_registration_number",
    "address_line1",
    "address_line2",
    "postal_code",
    "ocr_text",
];

/// Masks sensitive values in place, recursing into nested objects and
/// arrays. Non-string values under a sensitive key are replaced wholesale.
pub fn mask_sensitive_fields(value: &mut Value) {
    match value {
        Value::Object(map) => {
            for (key, val) in map.iter_mut() {
                if SENSITIVE_FIELDS.contains(&key.as_str()) {
                    *val = match val {
                        Value::String(s) => Value::String(mask(s)),
                        Value::Null => Value::Null,
                        _ => Value::String("****".to_string()),
                    };
                } else {
                    mask_sensitive_fields(val);
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                mask_sensitive_fields(item);
            }
        }
        _ => {}
    }
}

/// True when the value contains any sensitive key at any depth.
pub(crate) fn contains_sensitive_fields(value: &Value) -> bool {
    match value {
        Value::Object(map) => map.iter().any(|(key, val)| {
            SENSITIVE_FIELDS.contains(&key.as_str()) || contains_sensitive_fields(val)
        }),
        Value::Array(items) => items.iter().any(contains_sensitive_fields),
        _ => false,
    }
}

/// Keeps the first and last two characters; anything four characters or
/// shorter is fully starred.
fn mask(value: &str) -> String {
    let chars: Vec<char> = value.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let mut out = String::with_capacity(chars.len());
    out.extend(&chars[..2]);
    out.extend(std::iter::repeat('*').take(chars.len() - 4));
    out.extend(&chars[chars.len() - 2..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn masks_all_but_edges() {
        assert_eq!(mask("AB1234567"), "AB*****67");
        assert_eq!(mask("12345"), "12*45");
    }

    #[test]
    fn short_values_are_fully_starred() {
        assert_eq!(mask("1234"), "****");
        assert_eq!(mask("ab"), "**");
        assert_eq!(mask(""), "");
    }

    #[test]
    fn masks_nested_objects_and_leaves_other_fields() {
        let mut value = json!({
            "first_name": "Amira",
            "document_number": "AB1234567",
            "extracted": {
                "phone_number": "+33612345678",
                "city": "Lyon",
            },
            "documents": [{"document_number": "X999888Y"}],
        });
        mask_sensitive_fields(&mut value);
        assert_eq!(value["first_name"], "Amira");
        assert_eq!(value["document_number"], "AB*****67");
        assert_eq!(value["extracted"]["phone_number"], "+3********78");
        assert_eq!(value["extracted"]["city"], "Lyon");
        assert_eq!(value["documents"][0]["document_number"], "X9****8Y");
    }

    #[test]
    fn non_string_sensitive_values_are_replaced() {
        let mut value = json!({"date_of_birth": 19900504, "postal_code": null});
        mask_sensitive_fields(&mut value);
        assert_eq!(value["date_of_birth"], "****");
        assert_eq!(value["postal_code"], serde_json::Value::Null);
    }
}
