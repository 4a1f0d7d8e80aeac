//! Derived statistics.
//!
//! Pure functions from a character's attributes and proficiency flags to the
//! values shown on the sheet. Nothing here touches the cache or the store,
//! so every function is safe to call repeatedly on the same snapshot.

use crate::character::{
    Ability, Attributes, Inventory, SavingThrowProficiency, Skill, SkillProficiencies,
};
use serde::Serialize;
use thiserror::Error;

/// Highest level the proficiency formula covers.
pub const MAX_SUPPORTED_LEVEL: u8 = 4;

/// Pounds of carrying capacity per point of strength.
const CARRY_PER_STRENGTH: f64 = 15.0;

/// Errors from derived-stat lookups.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesError {
    #[error("proficiency bonus is not defined for level {level}")]
    UnsupportedRule { level: u8 },

    #[error("unknown skill {0:?}")]
    UnknownSkill(String),
}

/// An attribute and its score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AttributeEntry {
    pub ability: Ability,
    pub value: i32,
}

impl AttributeEntry {
    pub fn name(&self) -> &'static str {
        self.ability.key()
    }
}

/// A saving throw row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SavingThrowEntry {
    pub ability: Ability,
    pub value: i32,
    pub is_proficient: bool,
}

impl SavingThrowEntry {
    pub fn name(&self) -> &'static str {
        self.ability.key()
    }

    /// Bonus for this save given the character's proficiency bonus.
    pub fn bonus(&self, proficiency_bonus: i32) -> i32 {
        saving_throw_bonus(SavingThrowInput {
            value: self.value,
            is_proficient: self.is_proficient,
            proficiency_bonus,
        })
    }
}

/// A skill row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SkillEntry {
    pub skill: Skill,
    pub is_proficient: bool,
    pub points: i32,
}

impl SkillEntry {
    pub fn name(&self) -> &'static str {
        self.skill.key()
    }
}

/// Inputs to [`saving_throw_bonus`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavingThrowInput {
    pub value: i32,
    pub is_proficient: bool,
    pub proficiency_bonus: i32,
}

/// Attribute modifier: `floor((score - 10) / 2)`.
///
/// Scores below 10 round toward negative infinity, so 9 gives -1.
pub fn modifier(score: i32) -> i32 {
    (score - 10).div_euclid(2)
}

/// Proficiency bonus for a class level.
///
/// Only levels 1 through 4 are covered; higher levels are reported as
/// unsupported rather than guessed.
pub fn proficiency_bonus(level: u8) -> Result<i32, RulesError> {
    if level <= MAX_SUPPORTED_LEVEL {
        Ok(2)
    } else {
        Err(RulesError::UnsupportedRule { level })
    }
}

/// Armor class from dexterity alone. Worn armor and shields are not counted.
pub fn armor_class(dexterity: i32) -> i32 {
    modifier(dexterity) + 10
}

pub fn initiative(attributes: &Attributes) -> i32 {
    modifier(attributes.dexterity)
}

/// Pounds the character can carry.
pub fn carrying_capacity(attributes: &Attributes) -> f64 {
    f64::from(attributes.strength) * CARRY_PER_STRENGTH
}

/// Attributes in display order.
pub fn attribute_list(attributes: &Attributes) -> Vec<AttributeEntry> {
    Ability::all()
        .into_iter()
        .map(|ability| AttributeEntry {
            ability,
            value: attributes.get(ability),
        })
        .collect()
}

/// One saving throw per attribute, in display order.
pub fn saving_throws(
    attributes: &Attributes,
    proficiency: &SavingThrowProficiency,
) -> Vec<SavingThrowEntry> {
    attribute_list(attributes)
        .into_iter()
        .map(|entry| SavingThrowEntry {
            ability: entry.ability,
            value: entry.value,
            is_proficient: proficiency.get(entry.ability),
        })
        .collect()
}

pub fn saving_throw_bonus(input: SavingThrowInput) -> i32 {
    let proficiency = if input.is_proficient {
        input.proficiency_bonus
    } else {
        0
    };
    modifier(input.value) + proficiency
}

/// Governing attribute for a skill key such as `"stealth"` or `"sleightOfHand"`.
pub fn skill_attribute(skill_name: &str) -> Result<Ability, RulesError> {
    skill_name
        .parse::<Skill>()
        .map(|skill| skill.ability())
        .map_err(|_| RulesError::UnknownSkill(skill_name.to_string()))
}

/// All eighteen skills in display order.
///
/// `points` is the governing attribute's modifier only; the proficiency
/// bonus is not added for proficient skills.
pub fn skills(attributes: &Attributes, proficiencies: &SkillProficiencies) -> Vec<SkillEntry> {
    Skill::all()
        .into_iter()
        .map(|skill| SkillEntry {
            skill,
            is_proficient: proficiencies.get(skill),
            points: modifier(attributes.get(skill.ability())),
        })
        .collect()
}

/// Total carried weight: `weight * quantity` summed over all equipment.
pub fn total_weight(inventory: &Inventory) -> f64 {
    inventory
        .equipment
        .iter()
        .map(|item| item.weight * f64::from(item.quantity))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::character::{default_character, Item, ItemType};

    #[test]
    fn test_modifier() {
        assert_eq!(modifier(10), 0);
        assert_eq!(modifier(11), 0);
        assert_eq!(modifier(14), 2);
        assert_eq!(modifier(9), -1);
        assert_eq!(modifier(8), -1);
        assert_eq!(modifier(1), -5);
        assert_eq!(modifier(30), 10);
        assert_eq!(modifier(-1), -6);
    }

    #[test]
    fn test_proficiency_bonus() {
        assert_eq!(proficiency_bonus(1), Ok(2));
        assert_eq!(proficiency_bonus(4), Ok(2));
        assert_eq!(
            proficiency_bonus(5),
            Err(RulesError::UnsupportedRule { level: 5 })
        );
        assert!(proficiency_bonus(20).is_err());
    }

    #[test]
    fn test_armor_class() {
        assert_eq!(armor_class(14), 12);
        assert_eq!(armor_class(10), 10);
        assert_eq!(armor_class(7), 8);
    }

    #[test]
    fn test_armor_class_ignores_worn_armor() {
        let character = default_character().toggle_worn("Scale mail").unwrap();
        assert_eq!(armor_class(character.attributes.dexterity), 12);
    }

    #[test]
    fn test_attribute_list_order() {
        let attributes = Attributes::new(1, 2, 3, 4, 5, 6);
        let names: Vec<_> = attribute_list(&attributes).iter().map(|a| a.name()).collect();
        assert_eq!(
            names,
            vec!["strength", "dexterity", "constitution", "intelligence", "wisdom", "charisma"]
        );
        let values: Vec<_> = attribute_list(&attributes).iter().map(|a| a.value).collect();
        assert_eq!(values, vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_saving_throws() {
        let character = default_character();
        let saves = saving_throws(&character.attributes, &character.saving_throw_proficiency);

        assert_eq!(saves.len(), 6);
        assert_eq!(saves[2].ability, Ability::Constitution);
        assert!(saves[2].is_proficient);
        assert!(saves[3].is_proficient);
        assert!(!saves[0].is_proficient);

        // INT 17 (+3) with proficiency
        assert_eq!(saves[3].bonus(2), 5);
        // STR 11 (+0) without
        assert_eq!(saves[0].bonus(2), 0);
    }

    #[test]
    fn test_saving_throw_bonus() {
        let proficient = SavingThrowInput {
            value: 14,
            is_proficient: true,
            proficiency_bonus: 2,
        };
        assert_eq!(saving_throw_bonus(proficient), 4);
        assert_eq!(saving_throw_bonus(proficient), 4);

        let untrained = SavingThrowInput {
            is_proficient: false,
            ..proficient
        };
        assert_eq!(saving_throw_bonus(untrained), 2);
    }

    #[test]
    fn test_skill_attribute() {
        assert_eq!(skill_attribute("stealth"), Ok(Ability::Dexterity));
        assert_eq!(skill_attribute("arcana"), Ok(Ability::Intelligence));
        assert_eq!(skill_attribute("animalHandling"), Ok(Ability::Wisdom));
        assert_eq!(
            skill_attribute("cooking"),
            Err(RulesError::UnknownSkill("cooking".to_string()))
        );
    }

    #[test]
    fn test_skills_use_base_modifier_only() {
        let character = default_character();
        let rows = skills(&character.attributes, &character.skill_proficiencies);

        assert_eq!(rows.len(), 18);
        assert_eq!(rows[0].skill, Skill::Athletics);
        assert_eq!(rows[17].skill, Skill::Persuasion);

        let arcana = rows.iter().find(|r| r.skill == Skill::Arcana).unwrap();
        assert!(arcana.is_proficient);
        // INT 17 gives +3; proficiency is not added to skill points
        assert_eq!(arcana.points, 3);

        let stealth = rows.iter().find(|r| r.skill == Skill::Stealth).unwrap();
        assert!(!stealth.is_proficient);
        assert_eq!(stealth.points, 2);
    }

    #[test]
    fn test_total_weight_sums_equipment() {
        let character = default_character();
        // clothes 3 + dagger 1 + scale mail 45
        assert_eq!(total_weight(&character.inventory), 49.0);

        let mut inventory = Inventory::default();
        assert_eq!(total_weight(&inventory), 0.0);

        inventory.equipment.push(Item {
            name: "Caltrops".to_string(),
            weight: 0.1,
            quantity: 20,
            description: String::new(),
            cost: 0.05,
            worn: None,
            item_type: ItemType::Gear,
            subtype: None,
        });
        assert!((total_weight(&inventory) - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_initiative_and_capacity() {
        let character = default_character();
        assert_eq!(initiative(&character.attributes), 2);
        assert_eq!(carrying_capacity(&character.attributes), 165.0);
    }
}
