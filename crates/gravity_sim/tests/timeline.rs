use gravity_core::{BodyId, BodySpec, DiscConfig, GravityError, RECORD_BYTES, SimConfig, Vec2};
use gravity_physics::procgen::generate_disc;
use gravity_sim::{Playback, Simulation};
use gravity_storage::RecordStatus;
use proptest::prelude::*;

fn config(physics_steps: u32) -> SimConfig {
    SimConfig {
        g: 1.0,
        physics_steps,
        real_bodies_min: 1,
        real_mass_threshold: 50.0,
        ..SimConfig::default()
    }
}

fn single_body(config: SimConfig) -> (Simulation, BodyId) {
    let mut sim = Simulation::new(config).unwrap();
    let id = sim.create_body(BodySpec::at_rest(10.0, Vec2::new(1.0, 0.0))).unwrap();
    (sim, id)
}

#[test]
fn light_body_falls_toward_heavy_body() {
    let mut sim = Simulation::new(config(1)).unwrap();
    let ids = sim
        .create_bodies(&[
            BodySpec::at_rest(100.0, Vec2::ZERO),
            BodySpec::at_rest(1.0, Vec2::new(10.0, 0.0)),
        ])
        .unwrap();
    let (heavy, light) = (ids[0], ids[1]);

    sim.select_tick(1).unwrap();

    let light = sim.body(light).unwrap();
    assert_eq!(light.velocity, Vec2::new(-1.0, 0.0));
    assert_eq!(light.position, Vec2::new(9.0, 0.0));
    assert_eq!(light.link, Some(heavy));

    let heavy = sim.body(heavy).unwrap();
    assert_eq!(heavy.position, Vec2::ZERO);
    assert_eq!(heavy.velocity, Vec2::ZERO);
}

#[test]
fn rewinding_and_deleting_truncates_the_future() {
    let (mut sim, id) = single_body(config(2));
    for _ in 0..5 {
        sim.advance().unwrap();
    }
    assert_eq!(sim.max_tick(), 6);

    sim.select_tick(2).unwrap();
    sim.body_mut(id).unwrap().mass = 0.0;
    sim.apply_edits_at(2).unwrap();

    assert_eq!(sim.max_tick(), 3);
    let history = sim.history();
    assert_eq!(history.status(id, 4), RecordStatus::Unavailable);
    assert_eq!(history.status(id, 5), RecordStatus::Unavailable);
    assert!(history.read(4).is_empty());

    sim.select_tick(3).unwrap();
    assert_eq!(sim.num_bodies(), 0);
    assert!(sim.body(id).is_none());
    assert_eq!(history.status(id, 3), RecordStatus::Destroyed);
    assert!(matches!(history.status(id, 1), RecordStatus::Present(_)));
}

#[test]
fn edits_at_an_old_tick_replace_the_future() {
    let (mut sim, id) = single_body(config(1));
    for _ in 0..4 {
        sim.advance().unwrap();
    }

    sim.select_tick(1).unwrap();
    sim.body_mut(id).unwrap().velocity = Vec2::new(0.0, 2.0);
    sim.apply_edits().unwrap();

    assert_eq!(sim.tick(), 1);
    assert_eq!(sim.max_tick(), 2);
    sim.select_tick(2).unwrap();
    let body = sim.body(id).unwrap();
    assert_eq!(body.position, Vec2::new(1.0, 2.0));
}

#[test]
fn creating_in_the_past_forgets_later_bodies() {
    let (mut sim, first) = single_body(config(1));
    sim.advance().unwrap();
    sim.advance().unwrap();
    let late = sim.create_body(BodySpec::at_rest(3.0, Vec2::new(50.0, 0.0))).unwrap();
    assert_eq!(sim.tick(), 3);

    let early = sim
        .create_bodies_at(&[BodySpec::at_rest(4.0, Vec2::new(-50.0, 0.0))], 1)
        .unwrap()[0];

    assert!(early > late);
    assert_eq!(sim.max_tick(), 2);
    assert_eq!(sim.tick(), 2);
    assert!(sim.body(late).is_none());
    assert!(sim.body(first).is_some());
    assert!(sim.body(early).is_some());
    sim.history().with(|store| assert!(!store.contains(late)));
}

#[test]
fn non_finite_edit_removes_only_that_body() {
    let mut sim = Simulation::new(SimConfig {
        real_bodies_min: 3,
        ..config(2)
    })
    .unwrap();
    let ids = sim
        .create_bodies(&[
            BodySpec::at_rest(100.0, Vec2::ZERO),
            BodySpec::at_rest(100.0, Vec2::new(10.0, 0.0)),
            BodySpec::at_rest(100.0, Vec2::new(0.0, 10.0)),
        ])
        .unwrap();

    sim.body_mut(ids[1]).unwrap().position = Vec2::new(f64::NAN, 0.0);
    sim.apply_edits().unwrap();
    sim.select_tick(1).unwrap();

    let alive: Vec<BodyId> = sim.bodies().map(|b| b.id).collect();
    assert_eq!(alive, vec![ids[0], ids[2]]);
    assert!(sim.bodies().all(|b| b.position.is_finite() && b.velocity.is_finite()));
    assert_eq!(sim.history().status(ids[1], 1), RecordStatus::Destroyed);
}

#[test]
fn massless_creation_is_never_visible() {
    let mut sim = Simulation::new(config(1)).unwrap();
    let ghost = sim.create_body(BodySpec::at_rest(0.0, Vec2::ZERO)).unwrap();
    let negative = sim.create_body(BodySpec::at_rest(-5.0, Vec2::ZERO)).unwrap();

    assert_eq!(sim.num_bodies(), 0);
    assert!(sim.body(ghost).is_none());
    assert!(sim.body(negative).is_none());
    assert_eq!(sim.history().status(ghost, 0), RecordStatus::Destroyed);
}

#[test]
fn invalid_ticks_are_rejected_without_mutation() {
    let (mut sim, id) = single_body(config(1));
    sim.advance().unwrap();
    let before = sim.history().read(2);

    let err = sim.apply_edits_at(9).unwrap_err();
    assert_eq!(err, GravityError::InvalidTick { tick: 9, min: 0, max: 2 });
    let err = sim.create_bodies_at(&[BodySpec::at_rest(1.0, Vec2::ZERO)], 3).unwrap_err();
    assert!(matches!(err, GravityError::InvalidTick { tick: 3, .. }));

    assert_eq!(sim.max_tick(), 2);
    assert_eq!(sim.tick(), 2);
    assert_eq!(sim.history().read(2), before);
    assert_eq!(sim.bodies().map(|b| b.id).collect::<Vec<_>>(), vec![id]);
}

#[test]
fn small_budget_evicts_oldest_ticks() {
    let (mut sim, id) = single_body(SimConfig {
        max_cache_memory: RECORD_BYTES * 3,
        ..config(1)
    });
    for _ in 0..4 {
        sim.advance().unwrap();
    }

    assert_eq!(sim.max_tick(), 5);
    assert_eq!(sim.min_tick(), 3);
    assert!(sim.history().bytes_used() <= RECORD_BYTES * 3);
    assert_eq!(sim.history().status(id, 1), RecordStatus::Unavailable);
    assert!(sim.history().read(5).contains_key(&id));

    let err = sim.select_tick(1).unwrap_err();
    assert_eq!(err, GravityError::InvalidTick { tick: 1, min: 3, max: 5 });
}

#[test]
fn budget_below_one_tick_fails() {
    let mut sim = Simulation::new(SimConfig {
        max_cache_memory: RECORD_BYTES,
        ..config(1)
    })
    .unwrap();
    let err = sim
        .create_bodies(&[
            BodySpec::at_rest(1.0, Vec2::ZERO),
            BodySpec::at_rest(1.0, Vec2::new(5.0, 0.0)),
        ])
        .unwrap_err();
    assert!(matches!(err, GravityError::OutOfBudget { .. }));
    assert_eq!(sim.num_bodies(), 0);
}

#[test]
fn failed_edit_keeps_truncation_and_drops_edits() {
    let (mut sim, id) = single_body(SimConfig {
        max_cache_memory: RECORD_BYTES * 3,
        ..config(1)
    });
    sim.advance().unwrap();
    sim.advance().unwrap();
    assert_eq!((sim.min_tick(), sim.max_tick()), (1, 3));

    sim.select_tick(1).unwrap();
    sim.body_mut(id).unwrap().velocity = Vec2::new(3.0, 0.0);
    let err = sim
        .create_bodies(&[
            BodySpec::at_rest(1.0, Vec2::new(20.0, 0.0)),
            BodySpec::at_rest(1.0, Vec2::new(40.0, 0.0)),
            BodySpec::at_rest(1.0, Vec2::new(60.0, 0.0)),
        ])
        .unwrap_err();

    assert!(matches!(err, GravityError::OutOfBudget { .. }));
    assert_eq!(sim.max_tick(), 1);
    assert_eq!(sim.tick(), 1);
    assert_eq!(sim.num_bodies(), 1);
    assert_eq!(sim.body(id).unwrap().velocity, Vec2::ZERO);
}

#[test]
fn disc_runs_are_deterministic() {
    let disc = DiscConfig {
        body_count: 40,
        ..DiscConfig::default()
    };
    let run = || {
        let config = SimConfig {
            real_bodies_min: 8,
            ..SimConfig::default()
        };
        let mut sim = Simulation::new(config.clone()).unwrap();
        sim.create_bodies(&generate_disc(&disc, config.g)).unwrap();
        for _ in 0..10 {
            sim.advance().unwrap();
        }
        sim.history().read(sim.max_tick())
    };

    let first = run();
    assert_eq!(first.len(), 41);
    assert_eq!(first, run());
}

#[test]
fn playback_rewinds_over_recorded_ticks() {
    let (mut sim, id) = single_body(config(1));
    let mut playback = Playback::new(8);
    playback.set_speed(5);
    playback.update(&mut sim).unwrap();
    let recorded = sim.history().status(id, 2);

    playback.set_speed(-3);
    assert_eq!(playback.update(&mut sim).unwrap(), 2);
    assert_eq!(sim.max_tick(), 5);
    assert_eq!(sim.history().status(id, 2), recorded);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn prop_rewind_leaves_one_tick_of_future(ticks in 1u64..12, back in 0u64..12) {
        let (mut sim, _) = single_body(config(1));
        for _ in 0..ticks {
            sim.advance().unwrap();
        }
        let target = back.min(sim.max_tick());
        sim.select_tick(target).unwrap();
        sim.apply_edits().unwrap();

        prop_assert_eq!(sim.max_tick(), target + 1);
        prop_assert_eq!(sim.tick(), target);
        prop_assert_eq!(sim.history().read(target + 1).len(), 1);
    }
}
