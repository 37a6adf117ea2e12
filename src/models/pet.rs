use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::ParseEnumError;

/// Stored labels are free text (`"Dog"`, `"cão"`), every read goes through
/// [`FromStr`]. Writes always use the lowercase english name.
#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Species {
    #[display("dog")]
    Dog,
    #[display("cat")]
    Cat,
    #[default]
    #[display("other")]
    Other,
}

impl Species {
    /// Plural label used in user facing messages.
    pub fn plural_label(&self) -> &'static str {
        match self {
            Species::Dog => "Dogs",
            Species::Cat => "Cats",
            Species::Other => "Other pets",
        }
    }
}

impl FromStr for Species {
    type Err = ParseEnumError;

    /// Anything that is not clearly a dog or a cat is [`Species::Other`].
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(match value.trim().to_lowercase().as_str() {
            "dog" | "dogs" | "cão" | "cao" | "cachorro" | "canine" => Species::Dog,
            "cat" | "cats" | "gato" | "feline" => Species::Cat,
            _ => Species::Other,
        })
    }
}

#[derive(Debug, Display, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum SizeClass {
    #[display("small")]
    Small,
    #[display("medium")]
    Medium,
    #[display("large")]
    Large,
    #[display("giant")]
    Giant,
}

impl FromStr for SizeClass {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "small" | "pequeno" => Ok(SizeClass::Small),
            "medium" | "medio" | "médio" => Ok(SizeClass::Medium),
            "large" | "grande" => Ok(SizeClass::Large),
            "giant" | "gigante" => Ok(SizeClass::Giant),
            _ => Err(ParseEnumError::new("size", value)),
        }
    }
}

impl TryFrom<String> for Species {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl TryFrom<String> for SizeClass {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
pub struct GroomingPreferences {
    pub allow_perfume: bool,
    pub allow_accessories: bool,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Pet {
    pub id: i64,
    pub customer_id: i64,
    pub pet_name: String,
    pub species: Species,
    pub size: Option<SizeClass>,
    /// Kilograms
    pub weight: Option<Decimal>,
    pub preferences: GroomingPreferences,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
