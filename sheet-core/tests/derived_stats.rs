//! Property tests for the derived-stat rules.
//!
//! Run with: `cargo test -p sheet-core --test derived_stats`

use proptest::prelude::*;
use sheet_core::character::{Ability, Attributes, SavingThrowProficiency, Skill, SkillProficiencies};
use sheet_core::rules::{self, RulesError, SavingThrowInput};
use sheet_core::{default_character, SheetSummary};

fn attributes() -> impl Strategy<Value = Attributes> {
    prop::array::uniform6(1..=30i32)
        .prop_map(|[str, dex, con, int, wis, cha]| Attributes::new(str, dex, con, int, wis, cha))
}

fn save_flags() -> impl Strategy<Value = SavingThrowProficiency> {
    prop::array::uniform6(any::<bool>()).prop_map(
        |[strength, dexterity, constitution, intelligence, wisdom, charisma]| {
            SavingThrowProficiency {
                strength,
                dexterity,
                constitution,
                intelligence,
                wisdom,
                charisma,
            }
        },
    )
}

proptest! {
    #[test]
    fn modifier_is_floored_half_distance_from_ten(score in -100..=100i32) {
        let expected = ((f64::from(score) - 10.0) / 2.0).floor() as i32;
        prop_assert_eq!(rules::modifier(score), expected);
    }

    #[test]
    fn modifier_never_decreases(score in -100..100i32) {
        prop_assert!(rules::modifier(score) <= rules::modifier(score + 1));
    }

    #[test]
    fn armor_class_is_ten_plus_dexterity_modifier(dex in 1..=30i32) {
        prop_assert_eq!(rules::armor_class(dex), rules::modifier(dex) + 10);
    }

    #[test]
    fn proficiency_bonus_is_two_through_level_four(level in 0..=4u8) {
        prop_assert_eq!(rules::proficiency_bonus(level), Ok(2));
    }

    #[test]
    fn proficiency_bonus_unsupported_from_level_five(level in 5..=u8::MAX) {
        prop_assert_eq!(
            rules::proficiency_bonus(level),
            Err(RulesError::UnsupportedRule { level })
        );
    }

    #[test]
    fn attribute_list_keeps_display_order(attributes in attributes()) {
        let list = rules::attribute_list(&attributes);
        prop_assert_eq!(list.len(), 6);
        for (entry, ability) in list.iter().zip(Ability::all()) {
            prop_assert_eq!(entry.ability, ability);
            prop_assert_eq!(entry.value, attributes.get(ability));
        }
    }

    #[test]
    fn saving_throws_follow_flags(attributes in attributes(), flags in save_flags(), pb in 0..=6i32) {
        let saves = rules::saving_throws(&attributes, &flags);
        prop_assert_eq!(saves.len(), 6);
        for (save, ability) in saves.iter().zip(Ability::all()) {
            prop_assert_eq!(save.ability, ability);
            prop_assert_eq!(save.is_proficient, flags.get(ability));

            let base = rules::modifier(attributes.get(ability));
            let expected = if flags.get(ability) { base + pb } else { base };
            prop_assert_eq!(save.bonus(pb), expected);
        }
    }

    #[test]
    fn saving_throw_bonus_adds_proficiency_once(value in 1..=30i32, pb in 0..=6i32) {
        let trained = SavingThrowInput { value, is_proficient: true, proficiency_bonus: pb };
        let untrained = SavingThrowInput { is_proficient: false, ..trained };
        prop_assert_eq!(rules::saving_throw_bonus(untrained), rules::modifier(value));
        prop_assert_eq!(rules::saving_throw_bonus(trained) - rules::saving_throw_bonus(untrained), pb);
    }

    #[test]
    fn skills_use_governing_modifier(attributes in attributes(), athletics in any::<bool>(), stealth in any::<bool>()) {
        let flags = SkillProficiencies { athletics, stealth, ..Default::default() };
        let rows = rules::skills(&attributes, &flags);

        prop_assert_eq!(rows.len(), 18);
        for (row, skill) in rows.iter().zip(Skill::all()) {
            prop_assert_eq!(row.skill, skill);
            prop_assert_eq!(row.is_proficient, flags.get(skill));
            prop_assert_eq!(row.points, rules::modifier(attributes.get(skill.ability())));
        }
    }
}

#[test]
fn every_skill_key_resolves() {
    for skill in Skill::all() {
        assert_eq!(rules::skill_attribute(skill.key()), Ok(skill.ability()));
    }
    assert!(matches!(
        rules::skill_attribute("Stealth"),
        Err(RulesError::UnknownSkill(_))
    ));
}

#[test]
fn summary_tracks_toggled_armor_weight_unchanged() {
    let before = SheetSummary::from_character(&default_character()).unwrap();
    let worn = default_character().toggle_worn("Scale mail").unwrap();
    let after = SheetSummary::from_character(&worn).unwrap();

    // Worn or carried, the mail weighs the same and does not change AC
    assert_eq!(before.weight_carried, after.weight_carried);
    assert_eq!(before.armor_class, after.armor_class);
}
