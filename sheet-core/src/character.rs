//! Character sheet data model.
//!
//! Plain value types for a character's attributes, proficiencies and
//! inventory. The serialized form uses the field names of the stored sheet
//! record (`str`, `clazz.lvl`, `savingThrowsProficiency`, ...), so records
//! written by earlier clients load unchanged.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// ============================================================================
// Errors
// ============================================================================

/// A stored record that does not describe a valid character.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("malformed character record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("inventory contains more than one item named {0:?}")]
    DuplicateItem(String),

    #[error("equippable item {0:?} has no worn flag")]
    MissingWorn(String),

    #[error("item {0:?} cannot be worn but carries a worn flag")]
    UnexpectedWorn(String),
}

/// A requested change that the current character cannot accept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidMutation {
    #[error("no item named {0:?} in inventory")]
    UnknownItem(String),

    #[error("item {0:?} cannot be worn")]
    NotEquippable(String),
}

// ============================================================================
// Attributes
// ============================================================================

/// The six attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ability {
    Strength,
    Dexterity,
    Constitution,
    Intelligence,
    Wisdom,
    Charisma,
}

impl Ability {
    pub fn abbreviation(&self) -> &'static str {
        match self {
            Ability::Strength => "STR",
            Ability::Dexterity => "DEX",
            Ability::Constitution => "CON",
            Ability::Intelligence => "INT",
            Ability::Wisdom => "WIS",
            Ability::Charisma => "CHA",
        }
    }

    /// Lowercase key, as used by saving-throw flags and display lists.
    pub fn key(&self) -> &'static str {
        match self {
            Ability::Strength => "strength",
            Ability::Dexterity => "dexterity",
            Ability::Constitution => "constitution",
            Ability::Intelligence => "intelligence",
            Ability::Wisdom => "wisdom",
            Ability::Charisma => "charisma",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Ability::Strength => "Strength",
            Ability::Dexterity => "Dexterity",
            Ability::Constitution => "Constitution",
            Ability::Intelligence => "Intelligence",
            Ability::Wisdom => "Wisdom",
            Ability::Charisma => "Charisma",
        }
    }

    /// All attributes in display order.
    pub fn all() -> [Ability; 6] {
        [
            Ability::Strength,
            Ability::Dexterity,
            Ability::Constitution,
            Ability::Intelligence,
            Ability::Wisdom,
            Ability::Charisma,
        ]
    }
}

impl fmt::Display for Ability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.abbreviation())
    }
}

/// Attribute scores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    #[serde(rename = "str")]
    pub strength: i32,
    #[serde(rename = "dex")]
    pub dexterity: i32,
    #[serde(rename = "con")]
    pub constitution: i32,
    #[serde(rename = "int")]
    pub intelligence: i32,
    #[serde(rename = "wis")]
    pub wisdom: i32,
    #[serde(rename = "cha")]
    pub charisma: i32,
}

impl Attributes {
    pub fn new(str: i32, dex: i32, con: i32, int: i32, wis: i32, cha: i32) -> Self {
        Self {
            strength: str,
            dexterity: dex,
            constitution: con,
            intelligence: int,
            wisdom: wis,
            charisma: cha,
        }
    }

    pub fn get(&self, ability: Ability) -> i32 {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }
}

// ============================================================================
// Skills
// ============================================================================

/// The eighteen skills, in display order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Skill {
    Athletics,
    Acrobatics,
    SleightOfHand,
    Stealth,
    Arcana,
    History,
    Investigation,
    Nature,
    Religion,
    AnimalHandling,
    Insight,
    Medicine,
    Perception,
    Survival,
    Deception,
    Intimidation,
    Performance,
    Persuasion,
}

impl Skill {
    pub fn all() -> [Skill; 18] {
        [
            Skill::Athletics,
            Skill::Acrobatics,
            Skill::SleightOfHand,
            Skill::Stealth,
            Skill::Arcana,
            Skill::History,
            Skill::Investigation,
            Skill::Nature,
            Skill::Religion,
            Skill::AnimalHandling,
            Skill::Insight,
            Skill::Medicine,
            Skill::Perception,
            Skill::Survival,
            Skill::Deception,
            Skill::Intimidation,
            Skill::Performance,
            Skill::Persuasion,
        ]
    }

    /// The attribute that governs this skill.
    pub fn ability(&self) -> Ability {
        match self {
            Skill::Athletics => Ability::Strength,
            Skill::Acrobatics | Skill::SleightOfHand | Skill::Stealth => Ability::Dexterity,
            Skill::Arcana
            | Skill::History
            | Skill::Investigation
            | Skill::Nature
            | Skill::Religion => Ability::Intelligence,
            Skill::AnimalHandling
            | Skill::Insight
            | Skill::Medicine
            | Skill::Perception
            | Skill::Survival => Ability::Wisdom,
            Skill::Deception | Skill::Intimidation | Skill::Performance | Skill::Persuasion => {
                Ability::Charisma
            }
        }
    }

    /// Record key of this skill (`sleightOfHand`, `animalHandling`, ...).
    pub fn key(&self) -> &'static str {
        match self {
            Skill::Athletics => "athletics",
            Skill::Acrobatics => "acrobatics",
            Skill::SleightOfHand => "sleightOfHand",
            Skill::Stealth => "stealth",
            Skill::Arcana => "arcana",
            Skill::History => "history",
            Skill::Investigation => "investigation",
            Skill::Nature => "nature",
            Skill::Religion => "religion",
            Skill::AnimalHandling => "animalHandling",
            Skill::Insight => "insight",
            Skill::Medicine => "medicine",
            Skill::Perception => "perception",
            Skill::Survival => "survival",
            Skill::Deception => "deception",
            Skill::Intimidation => "intimidation",
            Skill::Performance => "performance",
            Skill::Persuasion => "persuasion",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Athletics => "Athletics",
            Skill::Acrobatics => "Acrobatics",
            Skill::SleightOfHand => "Sleight of Hand",
            Skill::Stealth => "Stealth",
            Skill::Arcana => "Arcana",
            Skill::History => "History",
            Skill::Investigation => "Investigation",
            Skill::Nature => "Nature",
            Skill::Religion => "Religion",
            Skill::AnimalHandling => "Animal Handling",
            Skill::Insight => "Insight",
            Skill::Medicine => "Medicine",
            Skill::Perception => "Perception",
            Skill::Survival => "Survival",
            Skill::Deception => "Deception",
            Skill::Intimidation => "Intimidation",
            Skill::Performance => "Performance",
            Skill::Persuasion => "Persuasion",
        }
    }
}

impl fmt::Display for Skill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Error returned when parsing a skill key that is not one of the eighteen.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown skill {0:?}")]
pub struct UnknownSkillKey(pub String);

impl FromStr for Skill {
    type Err = UnknownSkillKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Skill::all()
            .into_iter()
            .find(|skill| skill.key() == s)
            .ok_or_else(|| UnknownSkillKey(s.to_string()))
    }
}

/// Skill proficiency flags, one per skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SkillProficiencies {
    pub acrobatics: bool,
    pub animal_handling: bool,
    pub arcana: bool,
    pub athletics: bool,
    pub deception: bool,
    pub history: bool,
    pub insight: bool,
    pub intimidation: bool,
    pub investigation: bool,
    pub medicine: bool,
    pub nature: bool,
    pub perception: bool,
    pub performance: bool,
    pub persuasion: bool,
    pub religion: bool,
    pub sleight_of_hand: bool,
    pub stealth: bool,
    pub survival: bool,
}

impl SkillProficiencies {
    pub fn get(&self, skill: Skill) -> bool {
        match skill {
            Skill::Athletics => self.athletics,
            Skill::Acrobatics => self.acrobatics,
            Skill::SleightOfHand => self.sleight_of_hand,
            Skill::Stealth => self.stealth,
            Skill::Arcana => self.arcana,
            Skill::History => self.history,
            Skill::Investigation => self.investigation,
            Skill::Nature => self.nature,
            Skill::Religion => self.religion,
            Skill::AnimalHandling => self.animal_handling,
            Skill::Insight => self.insight,
            Skill::Medicine => self.medicine,
            Skill::Perception => self.perception,
            Skill::Survival => self.survival,
            Skill::Deception => self.deception,
            Skill::Intimidation => self.intimidation,
            Skill::Performance => self.performance,
            Skill::Persuasion => self.persuasion,
        }
    }
}

/// Saving throw proficiency flags, one per attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SavingThrowProficiency {
    pub strength: bool,
    pub dexterity: bool,
    pub constitution: bool,
    pub intelligence: bool,
    pub wisdom: bool,
    pub charisma: bool,
}

impl SavingThrowProficiency {
    pub fn get(&self, ability: Ability) -> bool {
        match ability {
            Ability::Strength => self.strength,
            Ability::Dexterity => self.dexterity,
            Ability::Constitution => self.constitution,
            Ability::Intelligence => self.intelligence,
            Ability::Wisdom => self.wisdom,
            Ability::Charisma => self.charisma,
        }
    }
}

// ============================================================================
// Equipment
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArmorType {
    Light,
    Medium,
    Heavy,
    Shield,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeaponType {
    Simple,
    Firearms,
    Martial,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemType {
    Gear,
    Weapon,
    Armor,
    Tool,
    Consumable,
    Loot,
}

impl ItemType {
    /// Armor and weapons can be worn; nothing else can.
    pub fn is_equippable(&self) -> bool {
        matches!(self, ItemType::Weapon | ItemType::Armor)
    }
}

/// Finer classification of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemSubtype {
    #[serde(rename = "ammunition")]
    Ammunition,
    #[serde(rename = "finesse")]
    Finesse,
    #[serde(rename = "thrown")]
    Thrown,
    #[serde(rename = "two-handed")]
    TwoHanded,
    #[serde(rename = "versatile")]
    Versatile,
    #[serde(rename = "improvised")]
    Improvised,
    #[serde(rename = "natural")]
    Natural,
    #[serde(rename = "siege")]
    Siege,
    #[serde(rename = "special")]
    Special,
    #[serde(rename = "adventuring gear")]
    AdventuringGear,
    #[serde(untagged)]
    Armor(ArmorType),
    #[serde(untagged)]
    Weapon(WeaponType),
}

/// Inventory item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub name: String,
    pub weight: f64,
    pub quantity: u32,
    pub description: String,
    pub cost: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub worn: Option<bool>,
    #[serde(rename = "type")]
    pub item_type: ItemType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<ItemSubtype>,
}

impl Item {
    /// Only items carrying a worn flag can be toggled.
    pub fn is_toggleable(&self) -> bool {
        self.worn.is_some()
    }

    pub fn is_worn(&self) -> bool {
        self.worn.unwrap_or(false)
    }
}

/// Coin purse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Coins {
    pub cp: u32,
    pub sp: u32,
    pub ep: u32,
    pub gp: u32,
    pub pp: u32,
}

/// Character inventory.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub equipment: Vec<Item>,
    pub coins: Coins,
}

impl Inventory {
    /// Find an item by exact name.
    pub fn find_item(&self, name: &str) -> Option<&Item> {
        self.equipment.iter().find(|i| i.name == name)
    }

    /// Items currently worn.
    pub fn worn_items(&self) -> impl Iterator<Item = &Item> {
        self.equipment.iter().filter(|i| i.is_worn())
    }
}

// ============================================================================
// Race, Class, Hit Points
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Race {
    pub name: String,
    pub walking_speed: u32,
    pub dark_vision: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub name: String,
    #[serde(rename = "lvl")]
    pub level: u8,
    pub hit_dice: u8,
}

/// Hit point tracking. `current` is not clamped against `total + temp`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitPoints {
    pub total: i32,
    pub current: i32,
    pub temp: i32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct GeneralProficiencies {
    pub armor: Vec<ArmorType>,
    pub weapons: Vec<WeaponType>,
    pub tools: Vec<String>,
    pub languages: Vec<String>,
}

// ============================================================================
// Character
// ============================================================================

/// A complete character sheet.
///
/// Treated as an immutable snapshot: changes produce a new value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Character {
    pub name: String,
    pub race: Race,
    pub clazz: Class,
    pub hp: HitPoints,
    pub attributes: Attributes,
    pub skill_proficiencies: SkillProficiencies,
    #[serde(rename = "savingThrowsProficiency")]
    pub saving_throw_proficiency: SavingThrowProficiency,
    pub general_proficiencies: GeneralProficiencies,
    pub inspired: bool,
    pub inventory: Inventory,
}

impl Character {
    /// Decode and validate a stored record.
    pub fn from_json(json: &str) -> Result<Self, SchemaError> {
        let character: Character = serde_json::from_str(json)?;
        character.validate()?;
        Ok(character)
    }

    /// Check the invariants serde cannot express.
    pub fn validate(&self) -> Result<(), SchemaError> {
        let mut names = HashSet::new();
        for item in &self.inventory.equipment {
            if !names.insert(item.name.as_str()) {
                return Err(SchemaError::DuplicateItem(item.name.clone()));
            }
            match (item.item_type.is_equippable(), item.worn) {
                (true, None) => return Err(SchemaError::MissingWorn(item.name.clone())),
                (false, Some(_)) => return Err(SchemaError::UnexpectedWorn(item.name.clone())),
                _ => {}
            }
        }
        Ok(())
    }

    /// A copy of this character with the named item's worn flag inverted.
    pub fn toggle_worn(&self, item_name: &str) -> Result<Character, InvalidMutation> {
        let item = self
            .inventory
            .find_item(item_name)
            .ok_or_else(|| InvalidMutation::UnknownItem(item_name.to_string()))?;
        if !item.is_toggleable() {
            return Err(InvalidMutation::NotEquippable(item_name.to_string()));
        }

        let equipment = self
            .inventory
            .equipment
            .iter()
            .map(|item| match item.worn {
                Some(worn) if item.name == item_name => Item {
                    worn: Some(!worn),
                    ..item.clone()
                },
                _ => item.clone(),
            })
            .collect();

        Ok(Character {
            inventory: Inventory {
                equipment,
                coins: self.inventory.coins,
            },
            ..self.clone()
        })
    }
}

/// The character handed out when no record has been stored yet.
pub fn default_character() -> Character {
    Character {
        name: "Barthoz".to_string(),
        race: Race {
            name: "goblin".to_string(),
            walking_speed: 30,
            dark_vision: 60,
        },
        clazz: Class {
            name: "artificer".to_string(),
            level: 2,
            hit_dice: 8,
        },
        hp: HitPoints {
            total: 19,
            current: 14,
            temp: 0,
        },
        attributes: Attributes::new(11, 14, 14, 17, 11, 12),
        skill_proficiencies: SkillProficiencies {
            arcana: true,
            investigation: true,
            ..Default::default()
        },
        saving_throw_proficiency: SavingThrowProficiency {
            constitution: true,
            intelligence: true,
            ..Default::default()
        },
        general_proficiencies: GeneralProficiencies {
            armor: vec![ArmorType::Light, ArmorType::Medium, ArmorType::Shield],
            weapons: vec![WeaponType::Simple, WeaponType::Firearms],
            tools: vec![
                "Alchemist's supplies".to_string(),
                "Disguise Kit".to_string(),
                "Smith's Tools".to_string(),
                "Thieves Tools".to_string(),
                "Tinker's Tools".to_string(),
            ],
            languages: vec!["Common".to_string(), "Goblin".to_string()],
        },
        inspired: false,
        inventory: Inventory {
            equipment: vec![
                Item {
                    name: "Clothes, common".to_string(),
                    weight: 3.0,
                    quantity: 1,
                    description: "A set of common clothes, including a belt, a cap, a cloak, \
                                  a shirt, a pair of trousers or a skirt, and a pair of shoes."
                        .to_string(),
                    cost: 0.5,
                    worn: None,
                    item_type: ItemType::Gear,
                    subtype: Some(ItemSubtype::AdventuringGear),
                },
                Item {
                    name: "Dagger".to_string(),
                    weight: 1.0,
                    quantity: 1,
                    description: "A dagger is a simple weapon in the melee weapon group. It is a small, \
                                  light, one-handed weapon that deals piercing damage. A dagger is \
                                  a martial weapon when thrown."
                        .to_string(),
                    cost: 2.0,
                    worn: Some(false),
                    item_type: ItemType::Weapon,
                    subtype: Some(ItemSubtype::Weapon(WeaponType::Simple)),
                },
                Item {
                    name: "Scale mail".to_string(),
                    weight: 45.0,
                    quantity: 1,
                    description: "Scale mail is a type of medium armor. It is a set of interlocking \
                                  metal rings sewn onto leather backing, which is worn over padding. \
                                  Scale mail is superior to chain mail, but inferior to plate mail. \
                                  Scale mail is a martial armor, and it requires proficiency with \
                                  medium armor to wear it without disadvantage."
                        .to_string(),
                    cost: 50.0,
                    worn: Some(false),
                    item_type: ItemType::Armor,
                    subtype: Some(ItemSubtype::Armor(ArmorType::Medium)),
                },
            ],
            coins: Coins::default(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_character_is_valid() {
        let character = default_character();
        assert!(character.validate().is_ok());
        assert_eq!(character.clazz.level, 2);
        assert_eq!(character.inventory.equipment.len(), 3);
    }

    #[test]
    fn test_default_item_descriptions() {
        let character = default_character();
        let description = |name: &str| {
            character
                .inventory
                .find_item(name)
                .map(|item| item.description.clone())
                .unwrap()
        };

        assert_eq!(
            description("Dagger"),
            "A dagger is a simple weapon in the melee weapon group. It is a small, light, \
             one-handed weapon that deals piercing damage. A dagger is a martial weapon when \
             thrown."
        );
        assert!(description("Scale mail").starts_with(
            "Scale mail is a type of medium armor. It is a set of interlocking metal rings \
             sewn onto leather backing, which is worn over padding."
        ));
        assert!(description("Scale mail")
            .ends_with("requires proficiency with medium armor to wear it without disadvantage."));
        assert!(!description("Clothes, common").contains("  "));
    }

    #[test]
    fn test_skill_abilities() {
        assert_eq!(Skill::Stealth.ability(), Ability::Dexterity);
        assert_eq!(Skill::Arcana.ability(), Ability::Intelligence);
        assert_eq!(Skill::AnimalHandling.ability(), Ability::Wisdom);
        assert_eq!(Skill::Athletics.ability(), Ability::Strength);
        assert_eq!(Skill::Persuasion.ability(), Ability::Charisma);
    }

    #[test]
    fn test_skill_from_key() {
        assert_eq!("sleightOfHand".parse::<Skill>(), Ok(Skill::SleightOfHand));
        assert!("sleight of hand".parse::<Skill>().is_err());
        for skill in Skill::all() {
            assert_eq!(skill.key().parse::<Skill>(), Ok(skill));
        }
    }

    #[test]
    fn test_record_field_names() {
        let value = serde_json::to_value(default_character()).unwrap();

        assert_eq!(value["attributes"]["str"], 11);
        assert_eq!(value["attributes"]["int"], 17);
        assert_eq!(value["clazz"]["lvl"], 2);
        assert_eq!(value["clazz"]["hitDice"], 8);
        assert_eq!(value["race"]["darkVision"], 60);
        assert_eq!(value["race"]["walkingSpeed"], 30);
        assert_eq!(value["skillProficiencies"]["sleightOfHand"], false);
        assert_eq!(value["savingThrowsProficiency"]["constitution"], true);
        assert_eq!(value["generalProficiencies"]["armor"], json!(["light", "medium", "shield"]));
        assert_eq!(value["inventory"]["coins"]["gp"], 0);
    }

    #[test]
    fn test_item_serialization() {
        let value = serde_json::to_value(default_character()).unwrap();
        let equipment = &value["inventory"]["equipment"];

        // Gear carries no worn flag at all
        assert!(equipment[0].get("worn").is_none());
        assert_eq!(equipment[0]["type"], "gear");
        assert_eq!(equipment[0]["subtype"], "adventuring gear");

        assert_eq!(equipment[1]["worn"], false);
        assert_eq!(equipment[1]["subtype"], "simple");
        assert_eq!(equipment[2]["subtype"], "medium");
    }

    #[test]
    fn test_json_round_trip() {
        let character = default_character();
        let json = serde_json::to_string(&character).unwrap();
        let decoded = Character::from_json(&json).unwrap();
        assert_eq!(decoded, character);
    }

    #[test]
    fn test_missing_key_is_schema_error() {
        let mut value = serde_json::to_value(default_character()).unwrap();
        value["attributes"].as_object_mut().unwrap().remove("dex");

        let err = Character::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, SchemaError::Json(_)));
    }

    #[test]
    fn test_wrong_type_is_schema_error() {
        let mut value = serde_json::to_value(default_character()).unwrap();
        value["inspired"] = json!("yes");

        let err = Character::from_json(&value.to_string()).unwrap_err();
        assert!(matches!(err, SchemaError::Json(_)));
    }

    #[test]
    fn test_negative_coins_rejected() {
        let mut value = serde_json::to_value(default_character()).unwrap();
        value["inventory"]["coins"]["gp"] = json!(-3);

        assert!(Character::from_json(&value.to_string()).is_err());
    }

    #[test]
    fn test_worn_flag_must_match_item_type() {
        let mut character = default_character();
        character.inventory.equipment[0].worn = Some(true);
        assert!(matches!(
            character.validate(),
            Err(SchemaError::UnexpectedWorn(name)) if name == "Clothes, common"
        ));

        let mut character = default_character();
        character.inventory.equipment[1].worn = None;
        assert!(matches!(
            character.validate(),
            Err(SchemaError::MissingWorn(name)) if name == "Dagger"
        ));
    }

    #[test]
    fn test_duplicate_item_names_rejected() {
        let mut character = default_character();
        let dagger = character.inventory.equipment[1].clone();
        character.inventory.equipment.push(dagger);

        assert!(matches!(
            character.validate(),
            Err(SchemaError::DuplicateItem(name)) if name == "Dagger"
        ));
    }

    #[test]
    fn test_toggle_worn_produces_new_value() {
        let character = default_character();
        let toggled = character.toggle_worn("Scale mail").unwrap();

        assert_eq!(toggled.inventory.find_item("Scale mail").unwrap().worn, Some(true));
        // Source snapshot is untouched
        assert_eq!(character.inventory.find_item("Scale mail").unwrap().worn, Some(false));
        // Other items are carried over unchanged
        assert_eq!(toggled.inventory.find_item("Dagger"), character.inventory.find_item("Dagger"));

        let back = toggled.toggle_worn("Scale mail").unwrap();
        assert_eq!(back, character);
    }

    #[test]
    fn test_toggle_worn_rejects_gear_and_unknown_items() {
        let character = default_character();

        assert_eq!(
            character.toggle_worn("Clothes, common"),
            Err(InvalidMutation::NotEquippable("Clothes, common".to_string()))
        );
        assert_eq!(
            character.toggle_worn("Longsword"),
            Err(InvalidMutation::UnknownItem("Longsword".to_string()))
        );
    }

    #[test]
    fn test_worn_items() {
        let character = default_character().toggle_worn("Dagger").unwrap();
        let worn: Vec<_> = character.inventory.worn_items().map(|i| i.name.as_str()).collect();
        assert_eq!(worn, vec!["Dagger"]);
    }
}
