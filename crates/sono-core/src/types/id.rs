//! Type-tagged entity identifiers.
//!
//! Every identifier is rendered as `<TYPE>.<UUID>` where `TYPE` is one of
//! `USER`, `STORAGE` or `RESOURCE` and the UUID is hyphenated and uppercase,
//! e.g. `STORAGE.0B6F5C1E-3C4A-4D3B-9A51-2F0E8D7C6B5A`. The tag makes an id
//! self-describing, which is what lets a resource's parent be either a
//! storage or another resource.
//!
//! When the `sqlx` feature is enabled, each id type (and [`ParentRef`])
//! is stored in PostgreSQL as `TEXT` in its tagged form.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// The entity an identifier belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EntityType {
    /// A user (owned by an external identity system).
    User,
    /// A per-user storage root.
    Storage,
    /// A file or directory inside a storage.
    Resource,
}

impl EntityType {
    /// The prefix used in rendered identifiers.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::User => "USER",
            Self::Storage => "STORAGE",
            Self::Resource => "RESOURCE",
        }
    }

    /// Parse an identifier prefix.
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "USER" => Some(Self::User),
            "STORAGE" => Some(Self::Storage),
            "RESOURCE" => Some(Self::Resource),
            _ => None,
        }
    }

    /// Inspect the tag of a rendered identifier without validating the rest.
    pub fn from_entity_id(id: &str) -> Option<Self> {
        id.split_once('.').and_then(|(tag, _)| Self::from_tag(tag))
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Failure to parse a tagged identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The input was empty.
    #[error("identifier is empty")]
    Empty,
    /// The input is not `<TYPE>.<UUID>`.
    #[error("identifier '{0}' is malformed")]
    Malformed(String),
    /// The input is well-formed but tagged with a type the caller does not accept.
    #[error("identifier '{value}' has unexpected type {found}")]
    WrongType {
        /// The rejected input.
        value: String,
        /// The type it is tagged with.
        found: EntityType,
    },
}

/// Split a rendered identifier into its type and UUID.
fn parse_tagged(value: &str) -> Result<(EntityType, Uuid), IdError> {
    if value.is_empty() {
        return Err(IdError::Empty);
    }
    let malformed = || IdError::Malformed(value.to_string());
    let (tag, raw) = value.split_once('.').ok_or_else(malformed)?;
    let entity_type = EntityType::from_tag(tag).ok_or_else(malformed)?;
    // Only the hyphenated form is accepted.
    if raw.len() != 36 {
        return Err(malformed());
    }
    let uuid = Uuid::try_parse(raw).map_err(|_| malformed())?;
    Ok((entity_type, uuid))
}

fn write_tagged(f: &mut fmt::Formatter<'_>, entity_type: EntityType, uuid: &Uuid) -> fmt::Result {
    let mut buf = Uuid::encode_buffer();
    let encoded = uuid.hyphenated().encode_upper(&mut buf);
    write!(f, "{}.{}", entity_type.tag(), encoded)
}

/// Implements PostgreSQL `TEXT` storage for a type with `Display`/`FromStr`.
macro_rules! impl_text_sqlx {
    ($name:ty) => {
        #[cfg(feature = "sqlx")]
        impl sqlx::Type<sqlx::Postgres> for $name {
            fn type_info() -> sqlx::postgres::PgTypeInfo {
                <String as sqlx::Type<sqlx::Postgres>>::type_info()
            }

            fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
                <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'q> sqlx::Encode<'q, sqlx::Postgres> for $name {
            fn encode_by_ref(
                &self,
                buf: &mut <sqlx::Postgres as sqlx::Database>::ArgumentBuffer<'q>,
            ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
                <String as sqlx::Encode<'q, sqlx::Postgres>>::encode_by_ref(&self.to_string(), buf)
            }
        }

        #[cfg(feature = "sqlx")]
        impl<'r> sqlx::Decode<'r, sqlx::Postgres> for $name {
            fn decode(
                value: <sqlx::Postgres as sqlx::Database>::ValueRef<'r>,
            ) -> Result<Self, sqlx::error::BoxDynError> {
                let raw = <&str as sqlx::Decode<'r, sqlx::Postgres>>::decode(value)?;
                Ok(raw.parse::<$name>()?)
            }
        }
    };
}

/// Macro to define a type-tagged newtype ID wrapper around `Uuid`.
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        $name:ident => $entity_type:expr
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(Uuid);

        impl $name {
            /// The entity type this identifier is tagged with.
            pub const ENTITY_TYPE: EntityType = $entity_type;

            /// Create a new random identifier.
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Create an identifier from an existing UUID.
            pub fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Return a reference to the inner UUID.
            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write_tagged(f, Self::ENTITY_TYPE, &self.0)
            }
        }

        impl FromStr for $name {
            type Err = IdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let (found, uuid) = parse_tagged(s)?;
                if found != Self::ENTITY_TYPE {
                    return Err(IdError::WrongType {
                        value: s.to_string(),
                        found,
                    });
                }
                Ok(Self(uuid))
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> String {
                id.to_string()
            }
        }

        impl_text_sqlx!($name);
    };
}

define_id!(
    /// Identifier of a user. Users live outside this system; the id is only
    /// ever referenced.
    UserId => EntityType::User
);

define_id!(
    /// Identifier of a per-user storage.
    StorageId => EntityType::Storage
);

define_id!(
    /// Identifier of a file or directory resource.
    ResourceId => EntityType::Resource
);

/// The parent of a resource: either the storage root or a directory resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParentRef {
    /// The resource sits directly under the storage root.
    Storage(StorageId),
    /// The resource sits inside a directory resource.
    Resource(ResourceId),
}

impl ParentRef {
    /// The entity type of the referenced parent.
    pub fn entity_type(&self) -> EntityType {
        match self {
            Self::Storage(_) => EntityType::Storage,
            Self::Resource(_) => EntityType::Resource,
        }
    }

    /// The parent resource id, if the parent is a resource.
    pub fn resource_id(&self) -> Option<ResourceId> {
        match self {
            Self::Resource(id) => Some(*id),
            Self::Storage(_) => None,
        }
    }
}

impl fmt::Display for ParentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Storage(id) => fmt::Display::fmt(id, f),
            Self::Resource(id) => fmt::Display::fmt(id, f),
        }
    }
}

impl FromStr for ParentRef {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match parse_tagged(s)? {
            (EntityType::Storage, uuid) => Ok(Self::Storage(StorageId::from_uuid(uuid))),
            (EntityType::Resource, uuid) => Ok(Self::Resource(ResourceId::from_uuid(uuid))),
            (found, _) => Err(IdError::WrongType {
                value: s.to_string(),
                found,
            }),
        }
    }
}

impl TryFrom<String> for ParentRef {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ParentRef> for String {
    fn from(parent: ParentRef) -> String {
        parent.to_string()
    }
}

impl From<StorageId> for ParentRef {
    fn from(id: StorageId) -> Self {
        Self::Storage(id)
    }
}

impl From<ResourceId> for ParentRef {
    fn from(id: ResourceId) -> Self {
        Self::Resource(id)
    }
}

impl_text_sqlx!(ParentRef);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(ResourceId::new(), ResourceId::new());
    }

    #[test]
    fn test_display_is_tagged_and_uppercase() {
        let uuid = Uuid::parse_str("0b6f5c1e-3c4a-4d3b-9a51-2f0e8d7c6b5a").expect("uuid");
        let id = StorageId::from_uuid(uuid);
        assert_eq!(id.to_string(), "STORAGE.0B6F5C1E-3C4A-4D3B-9A51-2F0E8D7C6B5A");
    }

    #[test]
    fn test_from_str_accepts_own_tag() {
        let id = UserId::new();
        let parsed: UserId = id.to_string().parse().expect("should parse");
        assert_eq!(parsed, id);
    }

    #[test]
    fn test_from_str_rejects_other_tag() {
        let storage = StorageId::new().to_string();
        let err = storage.parse::<ResourceId>().unwrap_err();
        assert!(matches!(
            err,
            IdError::WrongType {
                found: EntityType::Storage,
                ..
            }
        ));
    }

    #[test]
    fn test_from_str_rejects_malformed() {
        assert_eq!("".parse::<UserId>().unwrap_err(), IdError::Empty);
        assert!(matches!(
            "USER".parse::<UserId>(),
            Err(IdError::Malformed(_))
        ));
        assert!(matches!(
            "USER.not-a-uuid".parse::<UserId>(),
            Err(IdError::Malformed(_))
        ));
        assert!(matches!(
            "GROUP.0B6F5C1E-3C4A-4D3B-9A51-2F0E8D7C6B5A".parse::<UserId>(),
            Err(IdError::Malformed(_))
        ));
        assert!(matches!(
            "USER.0b6f5c1e3c4a4d3b9a512f0e8d7c6b5a".parse::<UserId>(),
            Err(IdError::Malformed(_))
        ));
    }

    #[test]
    fn test_entity_type_from_entity_id() {
        let id = ResourceId::new().to_string();
        assert_eq!(EntityType::from_entity_id(&id), Some(EntityType::Resource));
        assert_eq!(EntityType::from_entity_id("nothing"), None);
    }

    #[test]
    fn test_parent_ref_parses_storage_and_resource() {
        let storage = StorageId::new();
        let resource = ResourceId::new();
        assert_eq!(
            storage.to_string().parse::<ParentRef>().expect("storage"),
            ParentRef::Storage(storage)
        );
        assert_eq!(
            resource.to_string().parse::<ParentRef>().expect("resource"),
            ParentRef::Resource(resource)
        );
    }

    #[test]
    fn test_parent_ref_rejects_user() {
        let user = UserId::new().to_string();
        assert!(matches!(
            user.parse::<ParentRef>(),
            Err(IdError::WrongType {
                found: EntityType::User,
                ..
            })
        ));
    }

    #[test]
    fn test_serde_uses_tagged_string() {
        let id = ResourceId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{id}\""));
        let parsed: ResourceId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, id);

        let parent = ParentRef::from(StorageId::new());
        let json = serde_json::to_string(&parent).expect("serialize");
        let parsed: ParentRef = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, parent);
    }
}
