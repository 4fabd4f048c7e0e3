//! Combat scenarios with forced dice.
//!
//! Every roll comes from a `ScriptedRandom`, so each scenario is exact.
//! Skill rolls are drawn only for non-zero class modifiers; see the combat
//! module docs for the draw order.

use neurons_core::character::{Character, CharacterClass, Origin, Race};
use neurons_core::combat::{CombatAction, CombatConfig, CombatEvent, CombatStatus, Encounter};
use neurons_core::directive::CombatSetup;
use neurons_core::enemy::{Enemy, SpecialAttack};
use neurons_core::items::{Potion, Weapon, WeaponType};
use neurons_core::testing::{MemoryStore, ScriptedConsole, ScriptedGenerator, ScriptedRandom};
use neurons_core::world::{initial_state, SceneType};
use neurons_core::{GameSession, Persistence, SessionConfig};

fn barbarian() -> Character {
    let mut hero = Character::new("Grunk", CharacterClass::Barbarian, Race::Orc, Origin::Outlander);
    hero.add_item(Weapon::new("Great Axe", 10, WeaponType::Axe).into());
    hero
}

fn rogue() -> Character {
    Character::new("Wren", CharacterClass::Rogue, Race::Halfling, Origin::StreetUrchin)
}

// =============================================================================
// Victory
// =============================================================================

#[tokio::test]
async fn test_single_attack_wins_and_is_recorded() {
    // d20 = 1, attack skill 8, axe 10: 19 damage against 19 HP
    let setup = CombatSetup::new("An ogre charges!", Enemy::new("Ogre", 19, 8, 12));
    let generator = ScriptedGenerator::new().with_combat(setup);
    let store = MemoryStore::new();

    let mut state = initial_state(barbarian());
    state.set_scene(SceneType::Combat);

    let mut session = GameSession::with_state(
        SessionConfig::new("unused"),
        state,
        generator,
        store,
        ScriptedConsole::new([1]),
    )
    .with_rng(ScriptedRandom::new([1, 8]));

    let outcome = session.step().await.unwrap().unwrap();
    let result = outcome.combat.unwrap();

    assert_eq!(result.status, CombatStatus::PlayerVictory);
    assert_eq!(result.rounds, 1);
    assert_eq!(result.experience, 100);

    let state = session.state();
    assert_eq!(state.player.level.level(), 2);
    assert_eq!(state.player.hp(), 100);
    assert_eq!(state.history.last(), Some("Player defeated Ogre"));
    assert_eq!(state.scene(), Some(SceneType::Narration));

    // Checkpoint written after the encounter
    let saved = session.persistence().load(None).await.unwrap().unwrap();
    assert_eq!(saved.history.last(), Some("Player defeated Ogre"));
    assert!(session
        .console()
        .transcript()
        .iter()
        .any(|l| l == "Level up! You reached level 2!"));
}

// =============================================================================
// Defeat
// =============================================================================

#[tokio::test]
async fn test_defeat_loses_best_weapon_and_returns_to_narration() {
    let mut hero = rogue();
    hero.set_hp(5);
    hero.add_item(Weapon::new("Sling", 2, WeaponType::Bow).into());
    hero.add_item(Weapon::new("Rapier", 6, WeaponType::Sword).into());

    let setup = CombatSetup::new("A troll!", Enemy::new("Troll", 60, 10, 15));
    let generator = ScriptedGenerator::new().with_combat(setup);
    let mut state = initial_state(hero);
    state.set_scene(SceneType::Combat);

    // d20 = 1; troll: crit roll 100 (no crit), 1d10 = 10
    let mut session = GameSession::with_state(
        SessionConfig::default(),
        state,
        generator,
        MemoryStore::new(),
        ScriptedConsole::new([1]),
    )
    .with_rng(ScriptedRandom::new([1, 100, 10]));

    let result = session.step().await.unwrap().unwrap().combat.unwrap();
    assert_eq!(result.status, CombatStatus::PlayerDefeat);
    assert_eq!(result.lost_weapon.unwrap().base.name, "Rapier");

    let state = session.state();
    assert_eq!(state.player.hp(), 0);
    let weapons: Vec<_> = state.player.inventory.weapons.iter().map(|w| w.base.name.as_str()).collect();
    assert_eq!(weapons, vec!["Sling", "Knife"]);
    assert_eq!(state.history.last(), Some("Player was defeated by Troll"));
    assert_eq!(state.scene(), Some(SceneType::Narration));
}

// =============================================================================
// Running away
// =============================================================================

#[test]
fn test_failed_run_still_takes_a_hit() {
    let mut hero = rogue();
    let mut encounter = Encounter::new(Enemy::new("Wolf", 20, 6, 15), vec![], CombatConfig::default());

    // d20 = 9, escape skill 5: 14 < 15; wolf: crit 100, 1d6 = 6
    let mut rng = ScriptedRandom::new([9, 5, 100, 6]);
    let report = encounter.play_round(&mut hero, CombatAction::Run, &mut rng);

    assert!(report.consumed);
    assert_eq!(encounter.status(), CombatStatus::Ongoing);
    assert_eq!(hero.hp(), 94);
}

#[test]
fn test_run_at_difficulty_escapes_untouched() {
    let mut hero = rogue();
    let mut encounter = Encounter::new(Enemy::new("Wolf", 20, 6, 15), vec![], CombatConfig::default());

    // d20 = 10, escape skill 5: exactly 15
    let mut rng = ScriptedRandom::new([10, 5]);
    let report = encounter.play_round(&mut hero, CombatAction::Run, &mut rng);

    assert_eq!(encounter.status(), CombatStatus::PlayerFled);
    assert_eq!(report.events, vec![CombatEvent::Fled]);
    assert_eq!(hero.hp(), 100);
}

#[tokio::test]
async fn test_fleeing_is_recorded() {
    let setup = CombatSetup::new("Wolves circle you.", Enemy::new("Wolf Pack", 30, 6, 2));
    let mut state = initial_state(rogue());
    state.set_scene(SceneType::Combat);

    // Third action is "run"; d20 = 20
    let mut session = GameSession::with_state(
        SessionConfig::default(),
        state,
        ScriptedGenerator::new().with_combat(setup),
        MemoryStore::new(),
        ScriptedConsole::new([3]),
    )
    .with_rng(ScriptedRandom::new([20, 0]));

    let result = session.step().await.unwrap().unwrap().combat.unwrap();
    assert_eq!(result.status, CombatStatus::PlayerFled);
    assert_eq!(session.state().history.last(), Some("Player fled from combat"));
}

// =============================================================================
// Potions
// =============================================================================

#[test]
fn test_potion_round_policy() {
    let mut hero = rogue();
    hero.set_hp(30);
    hero.add_item(Potion::healing("Healing Potion", 25).into());
    let mut encounter = Encounter::new(Enemy::new("Wolf", 20, 6, 15), vec![], CombatConfig::default());

    // Drinking heals, then the wolf answers: crit 100, 1d6 = 4
    let mut rng = ScriptedRandom::new([100, 4]);
    let report = encounter.play_round(&mut hero, CombatAction::UsePotion, &mut rng);
    assert!(report.consumed);
    assert_eq!(hero.hp(), 51);

    // Nothing left: the turn does not count and the wolf waits
    let report = encounter.play_round(&mut hero, CombatAction::UsePotion, &mut rng);
    assert!(!report.consumed);
    assert_eq!(report.events, vec![CombatEvent::NoPotions]);
    assert_eq!(hero.hp(), 51);
    assert_eq!(encounter.rounds(), 1);
}

// =============================================================================
// Special attacks
// =============================================================================

#[test]
fn test_special_attack_cooldown_across_rounds() {
    let mut hero = rogue();
    let wyvern = Enemy::new("Wyvern", 500, 4, 20)
        .with_special_attack(SpecialAttack::new("Venom Sting", 100).with_cooldown(3));
    let mut encounter = Encounter::new(wyvern, vec![], CombatConfig::default());

    // An empty script always draws the low end: every trigger roll succeeds,
    // no crits, every die shows 1
    let mut rng = ScriptedRandom::new([]);
    let mut special_rounds = Vec::new();
    for round in 1..=8 {
        let report = encounter.play_round(&mut hero, CombatAction::Attack, &mut rng);
        if report
            .events
            .iter()
            .any(|e| matches!(e, CombatEvent::EnemySpecial { .. }))
        {
            special_rounds.push(round);
        }
    }

    // Winds up for three turns, then skips two turns after each use
    assert_eq!(special_rounds, vec![4, 7]);
    assert_eq!(encounter.status(), CombatStatus::Ongoing);
    // 8 normal hits of 1, 2 specials of round(1.5) = 2
    assert_eq!(hero.hp(), 100 - 8 - 4);
}

#[test]
fn test_seeded_fights_replay_identically() {
    use neurons_core::dice::GameRng;

    let fight = |seed| {
        let mut hero = barbarian();
        let enemy = Enemy::new("Dragon", 80, 12, 18)
            .with_attacks_per_turn(2)
            .with_critical_hit_chance(15)
            .with_special_attack(SpecialAttack::new("Fire Breath", 40).with_multiplier(2.0));
        let mut encounter = Encounter::new(enemy, vec![], CombatConfig::default());
        let mut rng = GameRng::seeded(seed);
        let mut log = Vec::new();
        while !encounter.status().is_over() {
            let report = encounter.play_round(&mut hero, CombatAction::Attack, &mut rng);
            log.extend(report.events.iter().map(|e| e.to_string()));
        }
        (encounter.status(), hero.hp(), log)
    };

    assert_eq!(fight(1234), fight(1234));
}
