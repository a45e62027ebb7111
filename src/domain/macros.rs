//! Compile-time domain objects.
//!
//! `domain_object!` declares a struct with one `Option` per field, a typed
//! `get_<field>` getter per field, and conversions keyed by the declared
//! payload names.
//!
//! ```
//! carpe::domain_object! {
//!     pub struct Post {
//!         title: String => "t";
//!         content: String => "c";
//!     }
//! }
//!
//! let post = Post::from_model(&serde_json::json!({"title": "A"})).unwrap();
//! assert_eq!(post.get_title().map(String::as_str), Some("A"));
//! assert_eq!(post.get_content(), None);
//! assert_eq!(post.to_payload().unwrap(), serde_json::json!({"t": "A"}));
//! ```

use crate::utils::error::{CarpeError, Result};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

#[doc(hidden)]
pub fn __object<'a>(what: &str, value: &'a Value) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| CarpeError::invalid_argument(format!("{what} argument is not an object")))
}

/// Reads `key`; absent and `null` both come back as `None`.
#[doc(hidden)]
pub fn __read<T: DeserializeOwned>(object: &Map<String, Value>, key: &str) -> Result<Option<T>> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => Ok(Some(serde_json::from_value(value.clone())?)),
    }
}

#[macro_export]
macro_rules! domain_object {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $( $field:ident : $ty:ty => $payload:literal; )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        $vis struct $name {
            $( pub $field: ::core::option::Option<$ty>, )*
        }

        impl $name {
            /// `(field key, payload key)` pairs in declaration order.
            pub const FIELDS: &'static [(&'static str, &'static str)] =
                &[ $( (stringify!($field), $payload), )* ];

            $crate::__private::paste::paste! {
                $(
                    pub fn [<get_ $field>](&self) -> ::core::option::Option<&$ty> {
                        self.$field.as_ref()
                    }
                )*
            }

            pub fn mapping() -> $crate::domain::DomainMapping {
                Self::FIELDS.iter().copied().collect()
            }

            pub fn from_payload(
                payload: &$crate::__private::serde_json::Value,
            ) -> $crate::Result<Self> {
                let object = $crate::domain::macros::__object("payload", payload)?;
                Ok(Self {
                    $( $field: $crate::domain::macros::__read(object, $payload)?, )*
                })
            }

            pub fn from_model(
                model: &$crate::__private::serde_json::Value,
            ) -> $crate::Result<Self> {
                let object = $crate::domain::macros::__object("model", model)?;
                Ok(Self {
                    $( $field: $crate::domain::macros::__read(object, stringify!($field))?, )*
                })
            }

            pub fn to_payload(&self) -> $crate::Result<$crate::__private::serde_json::Value> {
                Ok($crate::__private::serde_json::to_value(self)?)
            }
        }

        impl $crate::__private::serde::Serialize for $name {
            fn serialize<S>(&self, serializer: S) -> ::core::result::Result<S::Ok, S::Error>
            where
                S: $crate::__private::serde::Serializer,
            {
                use $crate::__private::serde::ser::SerializeMap;

                let mut map = serializer.serialize_map(None)?;
                $(
                    if let ::core::option::Option::Some(value) = &self.$field {
                        map.serialize_entry($payload, value)?;
                    }
                )*
                map.end()
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    crate::domain_object! {
        /// Account record as sent by the accounts endpoint.
        pub struct UserAccount {
            user_name: String => "n";
            balance: i64 => "b";
            tags: Vec<String> => "tg";
        }
    }

    #[test]
    fn test_serializes_payload_keys_only_for_present_fields() {
        let account = UserAccount {
            user_name: Some("bob".to_string()),
            balance: None,
            tags: Some(vec!["admin".to_string()]),
        };
        assert_eq!(
            serde_json::to_string(&account).unwrap(),
            r#"{"n":"bob","tg":["admin"]}"#
        );
    }

    #[test]
    fn test_payload_round_trip() {
        let payload = json!({"n": "bob", "b": 100});
        let account = UserAccount::from_payload(&payload).unwrap();
        assert_eq!(account.get_balance(), Some(&100));
        assert_eq!(account.get_tags(), None);
        assert_eq!(account.to_payload().unwrap(), payload);
    }

    #[test]
    fn test_from_model_uses_field_names() {
        let account = UserAccount::from_model(&json!({"user_name": "bob", "n": "ignored"})).unwrap();
        assert_eq!(account.get_user_name().map(String::as_str), Some("bob"));
        assert_eq!(account.get_balance().copied().unwrap_or(5), 5);
    }

    #[test]
    fn test_wrong_value_type_is_an_error() {
        assert!(UserAccount::from_payload(&json!({"b": "lots"})).is_err());
        assert!(UserAccount::from_payload(&json!("bob")).is_err());
    }

    #[test]
    fn test_mapping_matches_declaration() {
        let mapping = UserAccount::mapping();
        assert_eq!(mapping.parameters.get("user_name").map(String::as_str), Some("n"));
        assert_eq!(mapping.parameters.len(), 3);
    }
}
