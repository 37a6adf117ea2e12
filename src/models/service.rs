use chrono::{DateTime, Utc};
use derive_more::Display;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::{
    ParseEnumError,
    pet::{SizeClass, Species},
};

#[derive(Debug, Display, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum TargetSpecies {
    #[display("dog")]
    Dog,
    #[display("cat")]
    Cat,
    #[default]
    #[display("both")]
    Both,
}

impl TargetSpecies {
    /// Pets outside the dog/cat split are never turned away by the target.
    pub fn accepts(&self, species: Species) -> bool {
        match (self, species) {
            (TargetSpecies::Both, _) | (_, Species::Other) => true,
            (TargetSpecies::Dog, Species::Dog) | (TargetSpecies::Cat, Species::Cat) => true,
            _ => false,
        }
    }
}

impl FromStr for TargetSpecies {
    type Err = ParseEnumError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "dog" | "dogs" | "cão" | "cao" | "cachorro" => Ok(TargetSpecies::Dog),
            "cat" | "cats" | "gato" => Ok(TargetSpecies::Cat),
            "both" | "ambos" | "" => Ok(TargetSpecies::Both),
            _ => Err(ParseEnumError::new("target_species", value)),
        }
    }
}

impl TryFrom<String> for TargetSpecies {
    type Error = ParseEnumError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Species allowed to book a service on one day of the week (0 = Sunday).
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct SchedulingRule {
    pub day: u8,
    pub species: Vec<Species>,
}

impl SchedulingRule {
    pub fn allows(&self, species: Species) -> bool {
        self.species.contains(&species)
    }
}

/// At most one rule per day. Writing a rule for a day that already has one
/// replaces it, there is no merging of species sets.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(from = "Vec<SchedulingRule>", into = "Vec<SchedulingRule>")]
pub struct SchedulingRules(Vec<SchedulingRule>);

impl SchedulingRules {
    pub fn upsert(&mut self, rule: SchedulingRule) {
        match self.0.iter_mut().find(|r| r.day == rule.day) {
            Some(existing) => *existing = rule,
            None => self.0.push(rule),
        }
    }

    pub fn rule_for_day(&self, day: u8) -> Option<&SchedulingRule> {
        self.0.iter().find(|r| r.day == day)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SchedulingRule> {
        self.0.iter()
    }
}

impl FromIterator<SchedulingRule> for SchedulingRules {
    fn from_iter<I: IntoIterator<Item = SchedulingRule>>(iter: I) -> Self {
        let mut rules = SchedulingRules::default();
        for rule in iter {
            rules.upsert(rule);
        }
        rules
    }
}

impl From<Vec<SchedulingRule>> for SchedulingRules {
    fn from(rules: Vec<SchedulingRule>) -> Self {
        rules.into_iter().collect()
    }
}

impl From<SchedulingRules> for Vec<SchedulingRule> {
    fn from(rules: SchedulingRules) -> Self {
        rules.0
    }
}

/// One entry of the pricing matrix. Absent constraints always hold.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct PricingRule {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_min: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight_max: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<SizeClass>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_of_week: Option<u8>,
    pub fixed_price: Decimal,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub base_price: Decimal,
    pub duration_minutes: i64,
    pub target_species: TargetSpecies,
    pub scheduling_rules: SchedulingRules,
    pub pricing_matrix: Vec<PricingRule>,
    pub checklist_template: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
