//! Sheet summary.
//!
//! Collects every value the character sheet displays into one serializable
//! struct, computed from a single snapshot.

use crate::character::{Character, Coins};
use crate::rules::{self, AttributeEntry, RulesError, SkillEntry};
use serde::Serialize;

/// An attribute row with its modifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeRow {
    #[serde(flatten)]
    pub entry: AttributeEntry,
    pub modifier: i32,
}

/// A saving throw row with its total bonus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SavingThrowRow {
    pub name: &'static str,
    pub is_proficient: bool,
    pub bonus: i32,
}

/// Everything shown on the sheet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetSummary {
    pub name: String,
    /// e.g. "Goblin Artificer 2"
    pub subtitle: String,
    pub hp_current: i32,
    pub hp_total: i32,
    pub hp_temp: i32,
    pub inspired: bool,
    pub proficiency_bonus: i32,
    pub walking_speed: u32,
    pub dark_vision: u32,
    pub initiative: i32,
    pub armor_class: i32,
    pub attributes: Vec<AttributeRow>,
    pub saving_throws: Vec<SavingThrowRow>,
    pub skills: Vec<SkillEntry>,
    pub weight_carried: f64,
    pub carrying_capacity: f64,
    pub coins: Coins,
}

impl SheetSummary {
    /// Derive the summary. Fails only where the rules do (level 5 and up).
    pub fn from_character(character: &Character) -> Result<Self, RulesError> {
        let proficiency_bonus = rules::proficiency_bonus(character.clazz.level)?;
        let attributes = &character.attributes;

        let saving_throws = rules::saving_throws(attributes, &character.saving_throw_proficiency)
            .into_iter()
            .map(|save| SavingThrowRow {
                name: save.name(),
                is_proficient: save.is_proficient,
                bonus: save.bonus(proficiency_bonus),
            })
            .collect();

        Ok(Self {
            name: character.name.clone(),
            subtitle: capitalize_all(&[
                character.race.name.as_str(),
                character.clazz.name.as_str(),
                character.clazz.level.to_string().as_str(),
            ]),
            hp_current: character.hp.current,
            hp_total: character.hp.total,
            hp_temp: character.hp.temp,
            inspired: character.inspired,
            proficiency_bonus,
            walking_speed: character.race.walking_speed,
            dark_vision: character.race.dark_vision,
            initiative: rules::initiative(attributes),
            armor_class: rules::armor_class(attributes.dexterity),
            attributes: rules::attribute_list(attributes)
                .into_iter()
                .map(|entry| AttributeRow {
                    entry,
                    modifier: rules::modifier(entry.value),
                })
                .collect(),
            saving_throws,
            skills: rules::skills(attributes, &character.skill_proficiencies),
            weight_carried: rules::total_weight(&character.inventory),
            carrying_capacity: rules::carrying_capacity(attributes),
            coins: character.inventory.coins,
        })
    }

    /// True when carried weight exceeds capacity.
    pub fn is_overloaded(&self) -> bool {
        self.weight_carried > self.carrying_capacity
    }
}

/// First letter upper-cased, the rest lower-cased.
pub fn capitalized(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Capitalize each word and join with spaces.
pub fn capitalize_all(words: &[&str]) -> String {
    words
        .iter()
        .map(|w| capitalized(w))
        .collect::<Vec<_>>()
        .join(" ")
}
