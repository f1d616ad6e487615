//! Enumerations shared between the configuration and the compiled artifacts.
//!
//! The GraphQL-facing enums (`CachePolicy`, `PaginateMode`, `DedupeMatchMode`) use the exact
//! spelling of the enum values declared in the internal schema, so a directive argument such as
//! `@cache(policy: NetworkOnly)` can be parsed with `FromStr`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantNames};

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    JsonSchema,
    Display,
    EnumString,
    AsRefStr,
    VariantNames,
)]
pub enum CachePolicy {
    CacheAndNetwork,
    CacheOnly,
    #[default]
    CacheOrNetwork,
    NetworkOnly,
    NoCache,
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    JsonSchema,
    Display,
    EnumString,
    AsRefStr,
    VariantNames,
)]
pub enum PaginateMode {
    /// Every page is merged into a single cache entry.
    #[default]
    Infinite,
    /// Every page is cached on its own.
    SinglePage,
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    JsonSchema,
    Display,
    EnumString,
    AsRefStr,
    VariantNames,
)]
pub enum DedupeMatchMode {
    Variables,
    #[default]
    Operation,
    None,
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    JsonSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListPosition {
    First,
    #[default]
    Last,
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    JsonSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ListTarget {
    /// Only the list the operation was issued against.
    #[default]
    Local,
    /// Every list with the same name, regardless of its filters.
    All,
}

#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    JsonSchema,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FragmentMasking {
    #[default]
    Enable,
    Disable,
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn graphql_enum_values_round_trip_through_from_str() {
        assert_eq!(
            CachePolicy::from_str("NetworkOnly").unwrap(),
            CachePolicy::NetworkOnly
        );
        assert_eq!(
            PaginateMode::from_str("SinglePage").unwrap(),
            PaginateMode::SinglePage
        );
        assert!(PaginateMode::from_str("singlepage").is_err());
        assert_eq!(ListPosition::First.as_ref(), "first");
        assert_eq!(ListTarget::All.to_string(), "all");
    }
}
