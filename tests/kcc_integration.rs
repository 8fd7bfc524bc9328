//! Character controller integration tests: landing, jumps, dashes, walls,
//! ceilings, collision handlers and solver convergence, run through the full
//! simulation schedule.

#![allow(dead_code)]

use bevy_ecs::prelude::*;

use platformer_sim::components::collider::PhysicsCollider2D;
use platformer_sim::components::kcc::{KCC2D, KCCQueryResult, KCCState};
use platformer_sim::components::transform::Transform2D;
use platformer_sim::events::sim::SimEvent;
use platformer_sim::kcc::KCC2DConfig;
use platformer_sim::math::{Fp, FpVec2, fp, fp_ratio};
use platformer_sim::physics::layers;
use platformer_sim::physics::query::{ColliderRef, OverlapHit};
use platformer_sim::physics::shape::Shape2D;
use platformer_sim::resources::assets::{AssetRef, AssetStore, CharacterPrototype, StatusData};
use platformer_sim::resources::input::{InputFrame, PlayerRef};
use platformer_sim::resources::simconfig::SimConfig;
use platformer_sim::resources::staticgeometry::StaticCollider;
use platformer_sim::simulation::Simulation;

const PLAYER: PlayerRef = PlayerRef(0);

fn approx_eq(a: Fp, b: Fp, epsilon: Fp) -> bool {
    (a - b).abs() < epsilon
}

fn make_sim(config: KCC2DConfig) -> (Simulation, Entity) {
    make_sim_at(config, FpVec2::from_ints(0, 1))
}

fn make_sim_at(config: KCC2DConfig, spawn: FpVec2) -> (Simulation, Entity) {
    let mut store = AssetStore::new();
    let kcc = store.insert_kcc_config(1, config);
    let status = store.insert_status(1, StatusData::default());
    store.insert_character(
        1,
        CharacterPrototype {
            kcc,
            status,
            weapons: Vec::new(),
            skill_inventory: None,
        },
    );

    let mut sim = Simulation::new(SimConfig::new(), store);
    // Floor with its top surface at y = 0.
    sim.add_static_collider(StaticCollider::solid(
        Shape2D::aabb(FpVec2::new(fp(50), fp_ratio(1, 2))),
        FpVec2::new(Fp::ZERO, -fp_ratio(1, 2)),
    ));
    sim.add_spawn_point(spawn);
    sim.step();
    let character = sim
        .add_player(PLAYER, AssetRef::new(1))
        .expect("character spawned");
    (sim, character)
}

fn tick(sim: &mut Simulation, frames: u32) -> Vec<SimEvent> {
    let mut events = Vec::new();
    for _ in 0..frames {
        sim.step();
        events.extend(sim.drain_events());
    }
    events
}

fn press(sim: &mut Simulation, frame: InputFrame) -> Vec<SimEvent> {
    sim.set_input(PLAYER, frame);
    tick(sim, 1)
}

fn kcc(sim: &Simulation, character: Entity) -> KCC2D {
    *sim.world().get::<KCC2D>(character).expect("kcc")
}

fn position(sim: &Simulation, character: Entity) -> FpVec2 {
    sim.world().get::<Transform2D>(character).expect("transform").position
}

fn landings(events: &[SimEvent], state: KCCState) -> usize {
    events
        .iter()
        .filter(|ev| matches!(ev, SimEvent::Landed { state: landed, .. } if *landed == state))
        .count()
}

fn jumps(events: &[SimEvent]) -> Vec<(KCCState, KCCState)> {
    events
        .iter()
        .filter_map(|ev| match ev {
            SimEvent::Jumped { next, previous, .. } => Some((*previous, *next)),
            _ => None,
        })
        .collect()
}

// ==================== LANDING ====================

#[test]
fn test_falling_character_lands_once() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    let events = tick(&mut sim, 60);

    let state = kcc(&sim, character);
    assert_eq!(state.state, KCCState::Grounded);
    assert_eq!(state.vertical_speed(), Fp::ZERO);

    let landed = events
        .iter()
        .filter(|ev| matches!(ev, SimEvent::Landed { entity, state: KCCState::Grounded, .. } if *entity == character))
        .count();
    assert_eq!(landed, 1);

    // Resting on the floor within the allowed penetration.
    let y = sim.world().get::<Transform2D>(character).unwrap().position.y;
    assert!(y <= fp_ratio(1, 2));
    assert!(y > fp_ratio(48, 100));
}

#[test]
fn test_long_rest_stays_grounded() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    let mut events = tick(&mut sim, 60);
    for frame in 0..540 {
        events.extend(tick(&mut sim, 1));
        assert_eq!(kcc(&sim, character).state, KCCState::Grounded, "left ground at {frame}");
    }
    assert_eq!(landings(&events, KCCState::Grounded), 1);
    assert_eq!(events.iter().filter(|ev| matches!(ev, SimEvent::Landed { .. })).count(), 1);
}

// ==================== JUMPS ====================

#[test]
fn test_double_jump_then_buffer() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    tick(&mut sim, 60);

    let jump = InputFrame {
        jump: true,
        ..InputFrame::default()
    };
    let idle = InputFrame::default();

    let first = press(&mut sim, jump);
    assert_eq!(jumps(&first), vec![(KCCState::Grounded, KCCState::Jumped)]);
    assert_eq!(kcc(&sim, character).state, KCCState::Jumped);
    press(&mut sim, idle);

    let second = press(&mut sim, jump);
    assert_eq!(jumps(&second), vec![(KCCState::Jumped, KCCState::DoubleJumped)]);
    assert_eq!(kcc(&sim, character).state, KCCState::DoubleJumped);
    press(&mut sim, idle);

    let third = press(&mut sim, jump);
    assert!(jumps(&third).is_empty());
    let state = kcc(&sim, character);
    assert_eq!(state.state, KCCState::DoubleJumped);
    assert!(state.grounded_jump_timer.is_valid());
}

#[test]
fn test_no_double_jump_when_disabled() {
    let config = KCC2DConfig {
        double_jump_enabled: false,
        ..KCC2DConfig::default()
    };
    let (mut sim, character) = make_sim(config);
    tick(&mut sim, 60);

    let jump = InputFrame {
        jump: true,
        ..InputFrame::default()
    };
    press(&mut sim, jump);
    press(&mut sim, InputFrame::default());
    let second = press(&mut sim, jump);
    assert!(jumps(&second).is_empty());
    assert_eq!(kcc(&sim, character).state, KCCState::Jumped);
}

#[test]
fn test_jump_lands_back_on_floor() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    tick(&mut sim, 60);
    press(
        &mut sim,
        InputFrame {
            jump: true,
            ..InputFrame::default()
        },
    );
    sim.set_input(PLAYER, InputFrame::default());
    let events = tick(&mut sim, 120);

    assert_eq!(kcc(&sim, character).state, KCCState::Grounded);
    assert!(events.iter().any(|ev| matches!(ev, SimEvent::Landed { .. })));
}

// ==================== HORIZONTAL MOVEMENT ====================

#[test]
fn test_ground_deceleration_stops_within_half_a_second() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    tick(&mut sim, 60);

    sim.set_input(
        PLAYER,
        InputFrame {
            right: true,
            ..InputFrame::default()
        },
    );
    tick(&mut sim, 60);
    let moving = kcc(&sim, character);
    assert_eq!(moving.state, KCCState::Grounded);
    assert!(approx_eq(moving.horizontal_speed(), fp(4), fp_ratio(1, 100)));

    sim.set_input(PLAYER, InputFrame::default());
    tick(&mut sim, 1);
    let first = kcc(&sim, character).horizontal_speed();
    // v *= clamp01(1 - 10 * dt)
    let expected = moving.horizontal_speed() * (Fp::ONE - fp(10) / fp(60));
    assert!(approx_eq(first, expected, fp_ratio(1, 1000)));

    tick(&mut sim, 34);
    assert!(kcc(&sim, character).horizontal_speed().abs() < fp_ratio(1, 100));
}

#[test]
fn test_impulse_decays_while_grounded() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    tick(&mut sim, 60);

    sim.world_mut()
        .get_mut::<KCC2D>(character)
        .unwrap()
        .add_impulse(FpVec2::from_ints(4, 0));
    let start_x = sim.world().get::<Transform2D>(character).unwrap().position.x;
    tick(&mut sim, 60);

    let state = kcc(&sim, character);
    assert!(state.dynamic_velocity.x.abs() < fp_ratio(1, 100));
    assert!(sim.world().get::<Transform2D>(character).unwrap().position.x > start_x);
}

#[test]
fn test_facing_follows_aim() {
    use platformer_sim::components::player::MovementData;

    let (mut sim, character) = make_sim(KCC2DConfig::default());
    press(&mut sim, InputFrame::default().with_aim(FpVec2::RIGHT));
    assert!(sim.world().get::<MovementData>(character).unwrap().is_facing_right);
    press(&mut sim, InputFrame::default().with_aim(FpVec2::LEFT));
    assert!(!sim.world().get::<MovementData>(character).unwrap().is_facing_right);
}

// ==================== DASH ====================

#[test]
fn test_dash_holds_speed_then_expires() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    tick(&mut sim, 60);

    let right = InputFrame {
        right: true,
        ..InputFrame::default()
    };
    press(
        &mut sim,
        InputFrame {
            dash: true,
            ..right
        },
    );
    let dashing = kcc(&sim, character);
    assert_eq!(dashing.state, KCCState::Dashing);
    assert_eq!(dashing.horizontal_speed(), fp(10));
    assert_eq!(dashing.vertical_speed(), Fp::ZERO);

    // 0.25 s at 60 Hz is 15 frames, the press frame included.
    sim.set_input(PLAYER, right);
    for frame in 0..14 {
        tick(&mut sim, 1);
        let state = kcc(&sim, character);
        assert_eq!(state.state, KCCState::Dashing, "dash ended early at {frame}");
        assert_eq!(state.horizontal_speed(), fp(10));
    }

    let events = tick(&mut sim, 1);
    assert_eq!(kcc(&sim, character).state, KCCState::Grounded);
    assert_eq!(landings(&events, KCCState::Grounded), 1);
}

#[test]
fn test_dash_direction_follows_last_input() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    tick(&mut sim, 60);
    press(
        &mut sim,
        InputFrame {
            left: true,
            ..InputFrame::default()
        },
    );
    press(
        &mut sim,
        InputFrame {
            dash: true,
            ..InputFrame::default()
        },
    );
    let state = kcc(&sim, character);
    assert_eq!(state.state, KCCState::Dashing);
    assert_eq!(state.horizontal_speed(), fp(-10));
}

// ==================== WALLS ====================

/// Jump right into a wall whose face is at x = 1.25 and stop once walled.
fn reach_wall(sim: &mut Simulation, character: Entity) -> Vec<SimEvent> {
    sim.add_static_collider(StaticCollider::solid(
        Shape2D::aabb(FpVec2::new(fp_ratio(1, 2), fp(5))),
        FpVec2::new(fp_ratio(7, 4), fp(5)),
    ));
    tick(sim, 60);

    let right = InputFrame {
        right: true,
        ..InputFrame::default()
    };
    let mut events = press(
        sim,
        InputFrame {
            jump: true,
            ..right
        },
    );
    sim.set_input(PLAYER, right);
    for _ in 0..60 {
        events.extend(tick(sim, 1));
        if kcc(sim, character).state == KCCState::Walled {
            break;
        }
    }
    events
}

#[test]
fn test_wall_contact_enters_walled_once() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    let events = reach_wall(&mut sim, character);

    let state = kcc(&sim, character);
    assert_eq!(state.state, KCCState::Walled);
    assert_eq!(state.horizontal_speed(), Fp::ZERO);
    assert_eq!(landings(&events, KCCState::Walled), 1);
    let speed = events.iter().find_map(|ev| match ev {
        SimEvent::Landed {
            speed,
            state: KCCState::Walled,
            ..
        } => Some(*speed),
        _ => None,
    });
    assert!(speed.is_some_and(|speed| speed > Fp::ZERO));

    // Holding into the wall keeps the state without landing again.
    let held = tick(&mut sim, 5);
    let state = kcc(&sim, character);
    assert_eq!(state.state, KCCState::Walled);
    assert_eq!(state.horizontal_speed(), Fp::ZERO);
    assert_eq!(landings(&held, KCCState::Walled), 0);
}

#[test]
fn test_wall_jump_pushes_away_from_wall() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    reach_wall(&mut sim, character);
    assert_eq!(kcc(&sim, character).state, KCCState::Walled);

    let events = press(
        &mut sim,
        InputFrame {
            jump: true,
            ..InputFrame::default()
        },
    );
    assert_eq!(jumps(&events), vec![(KCCState::Walled, KCCState::Jumped)]);
    assert!(events.iter().any(|ev| matches!(
        ev,
        SimEvent::Jumped { impulse, .. } if *impulse == FpVec2::from_ints(-1, 6)
    )));
    let state = kcc(&sim, character);
    assert_eq!(state.state, KCCState::Jumped);
    assert_eq!(state.combined_velocity(), FpVec2::from_ints(-1, 6));
}

// ==================== CEILING ====================

#[test]
fn test_ceiling_stops_ascent() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    // Ceiling with its bottom surface at y = 1.75.
    sim.add_static_collider(StaticCollider::solid(
        Shape2D::aabb(FpVec2::new(fp(50), fp_ratio(1, 2))),
        FpVec2::new(Fp::ZERO, fp_ratio(9, 4)),
    ));
    tick(&mut sim, 60);
    assert_eq!(kcc(&sim, character).state, KCCState::Grounded);

    let jump = InputFrame {
        jump: true,
        ..InputFrame::default()
    };
    let mut events = press(&mut sim, jump);
    for _ in 0..30 {
        events.extend(tick(&mut sim, 1));
        if kcc(&sim, character).state == KCCState::DoubleJumped {
            break;
        }
    }

    let state = kcc(&sim, character);
    assert_eq!(state.state, KCCState::DoubleJumped);
    assert_eq!(state.vertical_speed(), Fp::ZERO);
    // Only the ground jump was a jump.
    assert_eq!(jumps(&events), vec![(KCCState::Grounded, KCCState::Jumped)]);
    // Pressed against the ceiling bottom at 1.75, within the allowed overlap.
    assert!(position(&sim, character).y < fp_ratio(13, 10));
}

// ==================== COLLISION HANDLERS ====================

#[derive(Resource, Default)]
struct SeenContacts(Vec<ColliderRef>);

fn record_contact(world: &mut World, _: Entity, _: &mut KCC2D, contact: &mut KCCQueryResult) {
    if let Some(collider) = contact.collider {
        world.get_resource_or_init::<SeenContacts>().0.push(collider);
    }
}

fn ignore_all_contacts(_: &mut World, _: Entity, _: &mut KCC2D, contact: &mut KCCQueryResult) {
    contact.ignore = true;
}

#[derive(Resource, Default)]
struct Vetoes(u32);

fn veto_step(world: &mut World, _: Entity, kcc: &mut KCC2D, _: &mut KCCQueryResult, _: u32) {
    kcc.ignore_step = true;
    world.get_resource_or_init::<Vetoes>().0 += 1;
}

#[derive(Resource, Default)]
struct TriggerHits(Vec<ColliderRef>);

fn record_trigger(world: &mut World, _: Entity, _: &mut KCC2D, hit: &OverlapHit) {
    world.get_resource_or_init::<TriggerHits>().0.push(hit.collider);
}

#[test]
fn test_contact_buffer_keeps_first_sixteen() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    // Nineteen more copies of the floor, twenty overlapping colliders in all.
    for _ in 0..19 {
        sim.add_static_collider(StaticCollider::solid(
            Shape2D::aabb(FpVec2::new(fp(50), fp_ratio(1, 2))),
            FpVec2::new(Fp::ZERO, -fp_ratio(1, 2)),
        ));
    }
    sim.signals_mut().on_kcc_pre_collision(record_contact);
    let events = tick(&mut sim, 60);

    let mut seen = sim.world().resource::<SeenContacts>().0.clone();
    seen.sort_by_key(|collider| match collider {
        ColliderRef::Static(index) => *index,
        ColliderRef::Entity(_) => usize::MAX,
    });
    seen.dedup();
    let expected: Vec<ColliderRef> = (0..16).map(ColliderRef::Static).collect();
    assert_eq!(seen, expected);

    assert_eq!(kcc(&sim, character).state, KCCState::Grounded);
    assert_eq!(landings(&events, KCCState::Grounded), 1);
    let y = position(&sim, character).y;
    assert!(y <= fp_ratio(1, 2) && y > fp_ratio(48, 100));
}

#[test]
fn test_ignored_contacts_fall_through_floor() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    sim.signals_mut().on_kcc_pre_collision(ignore_all_contacts);
    let events = tick(&mut sim, 60);

    assert_eq!(kcc(&sim, character).state, KCCState::FreeFalling);
    assert!(!events.iter().any(|ev| matches!(ev, SimEvent::Landed { .. })));
    assert!(position(&sim, character).y < fp(-2));
}

#[test]
fn test_solver_veto_skips_next_move() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    sim.signals_mut().on_kcc_solver_collision(veto_step);

    let mut events = Vec::new();
    for _ in 0..60 {
        events.extend(tick(&mut sim, 1));
        if sim.world().get_resource::<Vetoes>().is_some() {
            break;
        }
    }
    assert_eq!(sim.world().resource::<Vetoes>().0, 1);
    assert!(kcc(&sim, character).ignore_step);

    // The flagged move is consumed without moving.
    let before = position(&sim, character);
    events.extend(tick(&mut sim, 1));
    assert_eq!(position(&sim, character), before);
    assert!(!kcc(&sim, character).ignore_step);

    // Never corrected, the character sinks through the floor.
    events.extend(tick(&mut sim, 180));
    assert!(!events.iter().any(|ev| matches!(ev, SimEvent::Landed { .. })));
    assert_ne!(kcc(&sim, character).state, KCCState::Grounded);
    assert!(position(&sim, character).y < fp(-2));
}

#[test]
fn test_trigger_is_reported_not_solved() {
    let (mut sim, character) = make_sim(KCC2DConfig::default());
    let zone = sim.add_entity_collider(
        FpVec2::new(Fp::ZERO, fp_ratio(1, 2)),
        PhysicsCollider2D::new(Shape2D::circle(fp(1)))
            .with_layer(layers::STATIC)
            .with_trigger(true),
    );
    sim.signals_mut().on_kcc_trigger(record_trigger);
    tick(&mut sim, 60);

    let hits = &sim.world().resource::<TriggerHits>().0;
    assert!(!hits.is_empty());
    assert!(hits.iter().all(|collider| *collider == ColliderRef::Entity(zone)));

    // Resting on the floor as if the zone were not there.
    let y = position(&sim, character).y;
    assert_eq!(kcc(&sim, character).state, KCCState::Grounded);
    assert!(y <= fp_ratio(1, 2) && y > fp_ratio(48, 100));
}

// ==================== SOLVER ====================

#[test]
fn test_entity_platform_supports_character() {
    let (mut sim, character) = make_sim_at(KCC2DConfig::default(), FpVec2::from_ints(5, 4));
    // Top surface at y = 2.25.
    let platform = sim.add_entity_collider(
        FpVec2::new(fp(5), fp(2)),
        PhysicsCollider2D::new(Shape2D::aabb(FpVec2::new(fp(1), fp_ratio(1, 4))))
            .with_layer(layers::STATIC),
    );
    // Character-layer colliders are outside the controller's mask.
    sim.add_entity_collider(
        FpVec2::new(fp(5), fp(3)),
        PhysicsCollider2D::new(Shape2D::aabb(FpVec2::new(fp(1), fp_ratio(1, 4)))),
    );
    tick(&mut sim, 90);

    let state = kcc(&sim, character);
    assert_eq!(state.state, KCCState::Grounded);
    assert_eq!(state.closest.collider, Some(ColliderRef::Entity(platform)));
    let y = position(&sim, character).y;
    assert!(y <= fp_ratio(11, 4) && y > fp_ratio(273, 100));
}

#[test]
fn test_deep_overlap_converges_by_partial_correction() {
    let config = KCC2DConfig {
        solver_iterations: 1,
        ccd: false,
        ..KCC2DConfig::default()
    };
    // Spawned 0.2 deep into the floor.
    let (mut sim, character) = make_sim_at(config, FpVec2::new(Fp::ZERO, fp_ratio(3, 10)));
    let penetration = |sim: &Simulation| fp_ratio(1, 2) - position(sim, character).y;

    // One iteration per tick halves the overlap instead of snapping out.
    tick(&mut sim, 1);
    let first = penetration(&sim);
    assert!(first > fp_ratio(95, 1000) && first < fp_ratio(105, 1000), "{first}");
    assert_eq!(kcc(&sim, character).state, KCCState::Grounded);

    tick(&mut sim, 1);
    let second = penetration(&sim);
    assert!(approx_eq(second, first / 2, fp_ratio(1, 1000)), "{second}");

    tick(&mut sim, 10);
    let settled = penetration(&sim);
    assert!(settled > Fp::ZERO && settled <= fp_ratio(1, 100), "{settled}");
    assert_eq!(kcc(&sim, character).state, KCCState::Grounded);
}
