//! # Canonical Serialization: JCS Byte Production
//!
//! Token headers and claim sets are encoded through [`CanonicalBytes`], so
//! the same logical claims always become the same bytes. With a pinned clock
//! that makes token and credential hash a pure function of the payload and
//! the issuer key.
//!
//! Output is RFC 8785 via `serde_jcs`: sorted keys, no insignificant
//! whitespace. Claims carry only strings and integer epoch seconds, so any
//! float in the tree is refused before encoding.

use serde::Serialize;
use serde_json::Value;

use crate::error::CanonicalizationError;

/// JSON bytes in canonical form. Only [`CanonicalBytes::new`] builds one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalBytes(Vec<u8>);

impl CanonicalBytes {
    /// Canonicalize `claims`.
    ///
    /// # Errors
    ///
    /// - `FloatRejected` naming the first float found (depth-first).
    /// - `SerializationFailed` if `claims` cannot be represented as JSON.
    pub fn new(claims: &impl Serialize) -> Result<Self, CanonicalizationError> {
        let tree = serde_json::to_value(claims)?;
        if let Some(f) = first_float(&tree) {
            return Err(CanonicalizationError::FloatRejected(f));
        }
        Ok(Self(serde_jcs::to_vec(&tree)?))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.0
    }
}

fn first_float(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) if !(n.is_i64() || n.is_u64()) => n.as_f64(),
        Value::Array(items) => items.iter().find_map(first_float),
        Value::Object(map) => map.values().find_map(first_float),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn text(v: &Value) -> String {
        String::from_utf8(CanonicalBytes::new(v).unwrap().into_vec()).unwrap()
    }

    #[test]
    fn claim_keys_sorted_without_whitespace() {
        let claims = json!({"sub": "urn:vca:student:STU001", "iss": "did:vca:ab", "nbf": 1717200000});
        assert_eq!(
            text(&claims),
            r#"{"iss":"did:vca:ab","nbf":1717200000,"sub":"urn:vca:student:STU001"}"#
        );
    }

    #[test]
    fn nested_credential_body_sorted() {
        let claims = json!({
            "vc": {"type": ["VerifiableCredential", "master"], "@context": ["ctx"]},
            "exp": 1
        });
        assert_eq!(
            text(&claims),
            r#"{"exp":1,"vc":{"@context":["ctx"],"type":["VerifiableCredential","master"]}}"#
        );
    }

    #[test]
    fn field_order_does_not_change_bytes() {
        #[derive(Serialize)]
        struct A {
            title: &'static str,
            date: &'static str,
        }
        #[derive(Serialize)]
        struct B {
            date: &'static str,
            title: &'static str,
        }
        let a = CanonicalBytes::new(&A { title: "MSc", date: "2024-06-01" }).unwrap();
        let b = CanonicalBytes::new(&B { date: "2024-06-01", title: "MSc" }).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn grade_as_float_refused() {
        match CanonicalBytes::new(&json!({"credentialSubject": {"grades": [4, 3.5]}})) {
            Err(CanonicalizationError::FloatRejected(f)) => assert_eq!(f, 3.5),
            other => panic!("expected FloatRejected, got {other:?}"),
        }
    }

    #[test]
    fn large_integers_accepted() {
        assert_eq!(text(&json!({"exp": u64::MAX})), format!("{{\"exp\":{}}}", u64::MAX));
        assert_eq!(text(&json!({"nbf": -1})), r#"{"nbf":-1}"#);
    }

    #[test]
    fn non_ascii_institution_kept_verbatim() {
        let s = text(&json!({"institution": "Universit\u{00e9} de Lyon"}));
        assert!(s.contains("Universit\u{00e9}"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn claims() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            "[a-zA-Z0-9:._ -]{0,32}".prop_map(Value::String),
            any::<i64>().prop_map(Value::from),
            any::<bool>().prop_map(Value::Bool),
        ];
        leaf.prop_recursive(3, 48, 6, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
                prop::collection::hash_map("[a-z@]{1,12}", inner, 0..6)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    proptest! {
        #[test]
        fn reencoding_parsed_output_is_stable(v in claims()) {
            let first = CanonicalBytes::new(&v).unwrap();
            let reparsed: Value = serde_json::from_slice(first.as_bytes()).unwrap();
            let second = CanonicalBytes::new(&reparsed).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
