use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use utoipa::ToSchema;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Serialize, Deserialize, ToSchema, PartialEq, Eq, Hash, Clone, PartialOrd, Ord)]
        #[repr(transparent)]
        #[serde(transparent)]
        #[schema(value_type = String)]
        pub struct $name(String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

string_id!(
    /// Key of a service in the catalog, e.g. `welfare_relief_2025`.
    ServiceId
);

string_id!(
    /// Key of a user in the directory.
    Uid
);

string_id!(
    /// Identifier of a submitted application. Generated ids are UUIDs, but batch
    /// submissions may carry an id assigned by an offline client.
    AppId
);

impl AppId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_app_ids_are_unique() {
        let first = AppId::generate();
        let second = AppId::generate();

        assert_ne!(first, second);
    }

    #[test]
    fn ids_serialize_as_plain_strings() {
        let id = ServiceId::from("welfare_relief_2025");

        assert_eq!(
            "\"welfare_relief_2025\"",
            serde_json::to_string(&id).unwrap()
        );
    }
}
