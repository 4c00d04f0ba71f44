//! End-to-end encounter scenarios, driven through scripted dice so every
//! roll is known in advance.

use skirmish::testing::{sample_hero, scripted_dice, HudEvent, RecordingHud};
use skirmish::{AttributeBuff, CombatError, CombatPhase, Encounter, LogKind};

fn encounter_with(rolls: impl IntoIterator<Item = u32>) -> Encounter {
    Encounter::with_dice(scripted_dice(rolls))
}

#[test]
fn start_combat_builds_roster_and_logs_initiative() {
    // Initiative: hero rolls 20 (+2 DEX), goblin rolls 1 (+2 DEX).
    let mut encounter = encounter_with([20, 1]);
    encounter.start_combat(&sample_hero(), &["goblin"]).unwrap();

    let state = encounter.state();
    assert_eq!(state.combatants.len(), 2);
    assert_eq!(state.turn_order.len(), 2);
    assert_eq!(state.phase, CombatPhase::Combat);
    assert_eq!(state.round, 1);
    assert!(state.is_active);

    assert_eq!(state.log.len(), 1);
    assert_eq!(state.log[0].kind, LogKind::System);
    assert!(state.log[0].result.contains("Test Hero: 22"));
    assert!(state.log[0].result.contains("Goblin: 3"));

    assert!(encounter.is_player_turn());
}

#[test]
fn unknown_template_rejects_the_whole_start() {
    let mut encounter = encounter_with(vec![]);
    let result = encounter.start_combat(&sample_hero(), &["goblin", "dragon"]);

    assert!(matches!(result, Err(CombatError::UnknownTemplate(ref id)) if id == "dragon"));
    let state = encounter.state();
    assert_eq!(state.phase, CombatPhase::Initiative);
    assert!(state.combatants.is_empty());
    assert!(!state.is_active);
}

#[test]
fn starting_twice_is_an_error() {
    let mut encounter = encounter_with([20, 1]);
    encounter.start_combat(&sample_hero(), &["goblin"]).unwrap();
    let result = encounter.start_combat(&sample_hero(), &["goblin"]);
    assert!(matches!(result, Err(CombatError::AlreadyActive)));
}

#[test]
fn defeating_the_last_enemy_wins_and_awards_xp() {
    let hud = RecordingHud::new();
    // Initiative 20/1, then a natural 20 attack with damage dice 8 and 7.
    let mut encounter = encounter_with([20, 1, 20, 8, 7]).with_hud(Box::new(hud.clone()));
    encounter.start_combat(&sample_hero(), &["goblin"]).unwrap();

    let attack = encounter.state().player().unwrap().attacks[0].clone();
    let goblin = encounter
        .state()
        .combatants
        .iter()
        .find(|c| c.is_enemy())
        .unwrap()
        .id;

    let outcome = encounter.player_attack(goblin, &attack).unwrap().unwrap();
    assert!(outcome.critical);
    // 8 + 7 dice plus the +3 damage bonus, far past the goblin's 7 HP.
    assert_eq!(outcome.total_damage, 18);
    let goblin_state = encounter.state().combatant(goblin).unwrap();
    assert_eq!(goblin_state.hp, 0);
    assert!(!goblin_state.is_active);

    encounter.next_turn();
    assert_eq!(encounter.state().phase, CombatPhase::Victory);
    assert!(encounter.current_combatant().is_none());

    let result = encounter.end_combat();
    assert!(result.victory);
    assert_eq!(result.xp_awarded, 35);
    assert_eq!(encounter.state().phase, CombatPhase::Initiative);
    assert!(encounter.state().combatants.is_empty());

    assert!(hud.events().contains(&HudEvent::CombatEnded {
        victory: true,
        xp_awarded: 35,
    }));
}

#[test]
fn attacking_a_downed_target_is_a_noop() {
    let mut encounter = encounter_with([20, 1, 20, 8, 7]);
    encounter.start_combat(&sample_hero(), &["goblin"]).unwrap();

    let attack = encounter.state().player().unwrap().attacks[0].clone();
    let goblin = encounter
        .state()
        .combatants
        .iter()
        .find(|c| c.is_enemy())
        .unwrap()
        .id;
    encounter.player_attack(goblin, &attack).unwrap();
    let log_len = encounter.log().len();

    // The goblin is at 0 HP now; a second swing does nothing at all.
    let outcome = encounter.player_attack(goblin, &attack).unwrap();
    assert!(outcome.is_none());
    assert_eq!(encounter.log().len(), log_len);
}

#[test]
fn defend_is_narrative_only_and_ac_is_unchanged() {
    let mut encounter = encounter_with([20, 1]);
    encounter.start_combat(&sample_hero(), &["goblin"]).unwrap();
    let ac_before = encounter.state().player().unwrap().armor_class;

    encounter.player_defend();

    let entry = encounter.log().last().unwrap();
    assert_eq!(entry.kind, LogKind::Ability);
    assert!(entry.result.contains("+2 AC"));
    // The announced +2 is not applied anywhere; this pins the known gap.
    assert_eq!(encounter.state().player().unwrap().armor_class, ac_before);
}

#[test]
fn buff_decays_once_per_player_action() {
    let mut encounter = encounter_with([20, 1, 10, 3, 10, 3]);
    encounter.start_combat(&sample_hero(), &["goblin"]).unwrap();
    encounter.apply_buff(AttributeBuff::new(4, 0, 0, 3));

    let attack = encounter.state().player().unwrap().attacks[0].clone();
    let goblin = encounter
        .state()
        .combatants
        .iter()
        .find(|c| c.is_enemy())
        .unwrap()
        .id;

    encounter.player_attack(goblin, &attack).unwrap();
    assert_eq!(encounter.buff().turns_remaining, 2);

    encounter.player_defend();
    assert!(encounter.buff().is_active(), "two actions must not expire a 3-turn buff");

    encounter.player_attack(goblin, &attack).unwrap();
    assert!(!encounter.buff().is_active());
    assert_eq!(*encounter.buff(), AttributeBuff::default());
}

#[test]
fn buff_adds_half_strength_to_the_attack_bonus() {
    // Attack roll of 6: 6 + 5 (attack bonus) + 2 (half of +4 STR) = 13,
    // exactly the goblin's AC. Without the buff it would miss.
    let mut encounter = encounter_with([20, 1, 6, 2]);
    encounter.start_combat(&sample_hero(), &["goblin"]).unwrap();
    encounter.apply_buff(AttributeBuff::new(4, 0, 0, 1));

    let attack = encounter.state().player().unwrap().attacks[0].clone();
    let goblin = encounter
        .state()
        .combatants
        .iter()
        .find(|c| c.is_enemy())
        .unwrap()
        .id;

    let outcome = encounter.player_attack(goblin, &attack).unwrap().unwrap();
    assert!(outcome.hit);
    assert_eq!(outcome.attack_roll.total, 13);
}

#[test]
fn turn_order_is_never_reordered_mid_combat() {
    // Initiative: hero 22, goblin 12, orc 6.
    let mut encounter = encounter_with([20, 10, 5, 18, 8]);
    encounter
        .start_combat(&sample_hero(), &["goblin", "orc"])
        .unwrap();
    let order_at_start = encounter.state().turn_order.clone();

    let attack = encounter.state().player().unwrap().attacks[0].clone();
    let goblin = encounter
        .state()
        .combatants
        .iter()
        .find(|c| c.name == "Goblin")
        .unwrap()
        .id;
    encounter.player_attack(goblin, &attack).unwrap();

    // The downed goblin stays in the order but loses its turn.
    encounter.next_turn();
    assert_eq!(encounter.current_combatant().unwrap().name, "Orc");
    assert_eq!(encounter.state().round, 1);

    encounter.next_turn();
    assert_eq!(encounter.current_combatant().unwrap().name, "Test Hero");
    assert_eq!(encounter.state().round, 2);

    assert_eq!(encounter.state().turn_order, order_at_start);
}

#[tokio::test]
async fn shared_encounter_serializes_mutations() {
    let encounter: skirmish::SharedEncounter = std::sync::Arc::new(tokio::sync::Mutex::new(
        Encounter::with_dice(scripted_dice([20, 1])),
    ));

    let mut guard = encounter.lock().await;
    guard.start_combat(&sample_hero(), &["goblin"]).unwrap();
    assert_eq!(guard.state().phase, CombatPhase::Combat);
}
