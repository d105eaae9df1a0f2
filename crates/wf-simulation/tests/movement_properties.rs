//! Behavioural properties of the movement subsystem on a grid world.

use proptest::prelude::*;
use wf_core::{EntityHandle, GridWorld, MovementRecord, Point3, World};
use wf_simulation::{
    BroadcastCause, BroadcastClock, MovementConfig, MovementOutcome, Pathfinder, SimConfig,
    SimError, Simulation, TimeSource,
};

fn spawn_sim(world: GridWorld, start: Point3, speed: f64) -> (Simulation<GridWorld>, EntityHandle) {
    let mut world = world;
    let entity = world.spawn(MovementRecord::new(start, speed).unwrap());
    (Simulation::new(world, SimConfig::default()).unwrap(), entity)
}

fn simulated_clock() -> SimConfig {
    SimConfig::default()
        .with_movement(MovementConfig::default().with_broadcast_clock(BroadcastClock::Simulated))
}

fn record(sim: &Simulation<GridWorld>, entity: EntityHandle) -> MovementRecord {
    *sim.world().resolve_entity(entity).unwrap()
}

/// A one-cell-thick wall along x = 5 from z = -20 to z = 20, minus `gaps`.
fn wall_at_x5(gaps: &[i64]) -> GridWorld {
    let mut world = GridWorld::new();
    for z in -20..=20 {
        if !gaps.contains(&z) {
            world.block_cell(5, z);
        }
    }
    world
}

fn thick_wall() -> GridWorld {
    let mut world = GridWorld::new();
    world.block_rect((4, -3), (6, 3));
    world
}

#[test]
fn velocity_is_normalised_on_start() {
    let (mut sim, entity) = spawn_sim(GridWorld::new(), Point3::ZERO, 2.0);
    let target = Point3::new(3.0, 0.0, 4.0);
    sim.start_movement(entity, target, None).unwrap();

    let r = record(&sim, entity);
    assert!(r.is_moving);
    assert!((r.velocity.x - 1.2).abs() < 1e-9);
    assert!((r.velocity.z - 1.6).abs() < 1e-9);
    assert!((r.velocity.length() - 2.0).abs() < 1e-9);

    let entry = sim.movement().active_entry(entity).unwrap();
    assert_eq!(entry.path().iter().copied().collect::<Vec<_>>(), vec![target]);

    let first = sim.events().events().first().unwrap();
    assert_eq!(first.cause, BroadcastCause::Started);
    assert_eq!(first.velocity, r.velocity);
}

#[test]
fn arrival_is_exact_and_idle() {
    let (mut sim, entity) = spawn_sim(GridWorld::new(), Point3::ZERO, 2.0);
    let target = Point3::new(3.0, 0.0, 4.0);
    sim.start_movement(entity, target, None).unwrap();
    sim.run_until_idle(1000, 0.5);

    let r = record(&sim, entity);
    assert!(r.position.distance_2d(target) < 1e-2);
    assert_eq!(r.velocity, Point3::ZERO);
    assert!(!r.is_moving);
    assert!(!sim.movement().is_active(entity));

    let last = sim.events().last_for_entity(entity).unwrap();
    assert_eq!(last.cause, BroadcastCause::Arrived);
    assert_eq!(last.velocity, Point3::ZERO);
}

#[test]
fn doubling_speed_halves_travel_time() {
    let target = Point3::new(10.0, 0.0, 0.0);
    let dt = 0.05;
    let mut ticks = Vec::new();
    for speed in [2.0, 4.0] {
        let (mut sim, entity) = spawn_sim(GridWorld::new(), Point3::ZERO, speed);
        sim.start_movement(entity, target, None).unwrap();
        let n = sim.run_until_idle(10_000, dt);
        assert!(!sim.movement().is_active(entity));
        assert!((n as f64 * dt - 10.0 / speed).abs() < 0.15);
        ticks.push(n as f64);
    }
    assert!((ticks[0] / ticks[1] - 2.0).abs() < 0.1);
}

#[test]
fn stop_freezes_the_entity() {
    let (mut sim, entity) = spawn_sim(GridWorld::new(), Point3::ZERO, 2.0);
    sim.start_movement(entity, Point3::new(10.0, 0.0, 0.0), None)
        .unwrap();
    sim.run(5, 0.1);

    assert!(sim.stop_movement(entity));
    let stopped = record(&sim, entity);
    assert_eq!(stopped.velocity, Point3::ZERO);
    assert!(!stopped.is_moving);
    assert!((stopped.position.x - 1.0).abs() < 1e-9);

    sim.run(5, 0.1);
    assert_eq!(record(&sim, entity).position, stopped.position);
    let last = sim.events().last_for_entity(entity).unwrap();
    assert_eq!(last.cause, BroadcastCause::Stopped);
}

#[test]
fn stop_is_idempotent() {
    let (mut sim, entity) = spawn_sim(GridWorld::new(), Point3::ZERO, 2.0);
    assert!(!sim.stop_movement(entity));
    assert!(sim.events().is_empty());

    sim.start_movement(entity, Point3::new(10.0, 0.0, 0.0), None)
        .unwrap();
    assert!(sim.stop_movement(entity));
    let events = sim.events().len();
    assert!(!sim.stop_movement(entity));
    assert_eq!(sim.events().len(), events);
    assert!(!sim.stop_movement(EntityHandle::new()));
}

#[test]
fn retarget_turns_at_once_and_keeps_the_completion() {
    let (mut sim, entity) = spawn_sim(GridWorld::new(), Point3::ZERO, 2.0);
    let mut done = sim.move_to(entity, Point3::new(10.0, 0.0, 0.0)).unwrap();
    sim.run(3, 0.1);

    let new_target = Point3::new(0.0, 0.0, 10.0);
    sim.start_movement(entity, new_target, None).unwrap();
    let r = record(&sim, entity);
    let expected = (new_target - r.position).normalize() * 2.0;
    assert!((r.velocity - expected).length() < 1e-9);
    assert!(r.velocity.z > 1.9);
    assert_eq!(done.try_outcome(), None);

    sim.run_until_idle(10_000, 0.1);
    assert_eq!(done.try_outcome(), Some(MovementOutcome::Arrived));
    assert!(record(&sim, entity).position.distance_2d(new_target) < 1e-2);
}

#[test]
fn wall_contains_a_direct_walker() {
    let (mut sim, entity) = spawn_sim(wall_at_x5(&[]), Point3::ZERO, 2.0);
    let target = Point3::new(10.0, 0.0, 0.0);
    sim.start_movement(entity, target, Some(vec![target]))
        .unwrap();
    let ticks = sim.run_until_idle(5000, 0.1);

    assert!(ticks < 5000);
    let r = record(&sim, entity);
    assert!(r.position.x < 5.0);
    assert!(!r.is_moving);
    assert_eq!(r.velocity, Point3::ZERO);
    let last = sim.events().last_for_entity(entity).unwrap();
    assert_eq!(last.cause, BroadcastCause::Blocked);
}

#[test]
fn slides_through_a_gap() {
    let (mut sim, entity) = spawn_sim(wall_at_x5(&[5]), Point3::ZERO, 2.0);
    let target = Point3::new(10.0, 0.0, 6.0);
    sim.start_movement(entity, target, Some(vec![target]))
        .unwrap();

    let mut slide_ticks = 0;
    for _ in 0..5000 {
        if !sim.movement().is_active(entity) {
            break;
        }
        sim.tick(0.1);
        if (record(&sim, entity).velocity.length() - 1.4).abs() < 1e-9 {
            slide_ticks += 1;
        }
    }

    assert!(slide_ticks > 0);
    let r = record(&sim, entity);
    assert!(!r.is_moving);
    assert!((r.position.z - 6.0).abs() < 1e-2);
    assert!(r.position.distance_2d(target) < 1e-2);
    assert_eq!(
        sim.events().last_for_entity(entity).unwrap().cause,
        BroadcastCause::Arrived
    );
}

#[test]
fn enclosed_target_is_unreachable() {
    let mut world = GridWorld::new();
    for x in 8..=12 {
        for z in 8..=12 {
            if x == 8 || x == 12 || z == 8 || z == 12 {
                world.block_cell(x, z);
            }
        }
    }
    let (mut sim, entity) = spawn_sim(world, Point3::ZERO, 2.0);
    let target = Point3::new(10.0, 0.0, 10.0);

    assert!(sim.find_path(Point3::ZERO, target).is_none());
    let err = sim.move_to(entity, target).unwrap_err();
    assert!(matches!(err, SimError::PathNotFound { to, .. } if to == target));
    insta::assert_snapshot!(err.to_string(), @"no path found from (0.00, 0.00, 0.00) to (10.00, 0.00, 10.00)");
    assert!(!sim.movement().is_active(entity));
    assert!(sim.events().is_empty());
}

#[test]
fn path_detours_around_a_wall() {
    let (sim, _) = spawn_sim(thick_wall(), Point3::ZERO, 2.0);
    let end = Point3::new(10.0, 0.0, 0.0);
    let path = sim.find_path(Point3::ZERO, end).unwrap();

    assert!(path.len() > 2);
    assert_eq!(path.last(), Some(&end));
    assert!(path[1].z.abs() > 3.0);
}

#[test]
fn move_to_walks_the_detour() {
    let (mut sim, entity) = spawn_sim(thick_wall(), Point3::ZERO, 2.0);
    let target = Point3::new(10.0, 0.0, 0.0);
    let mut done = sim.move_to(entity, target).unwrap();
    assert_eq!(sim.movement().active_entry(entity).unwrap().path().len(), 3);

    let ticks = sim.run_until_idle(5000, 0.1);
    assert!(ticks < 5000);
    assert_eq!(done.try_outcome(), Some(MovementOutcome::Arrived));
    assert!(record(&sim, entity).position.distance_2d(target) < 1e-2);
}

#[test]
fn broadcast_rate_is_bounded() {
    let (mut sim, entity) = spawn_sim(GridWorld::new(), Point3::ZERO, 5.0);
    let mut done = sim.move_to(entity, Point3::new(9.9, 0.0, 0.0)).unwrap();
    let ticks = 20;
    sim.run(ticks, 0.1);

    assert_eq!(done.try_outcome(), Some(MovementOutcome::Arrived));
    let events = sim.events().events_for_entity(entity);
    assert!(!events.is_empty());
    assert!((events.len() as u64) < ticks);
    assert!(events.last().unwrap().velocity.is_zero());
}

/// Reports `step` seconds per tick, whatever the tick length.
#[derive(Debug)]
struct Stepped {
    now: f64,
    step: f64,
}

impl TimeSource for Stepped {
    fn now(&mut self, _delta_time: f64) -> f64 {
        self.now += self.step;
        self.now
    }
}

#[test]
fn throttle_follows_the_injected_clock() {
    let mut world = GridWorld::new();
    let entity = world.spawn(MovementRecord::new(Point3::ZERO, 5.0).unwrap());
    let mut sim = Simulation::new(world, SimConfig::default())
        .unwrap()
        .with_time_source(Stepped { now: 0.0, step: 0.03 });
    sim.move_to(entity, Point3::new(9.9, 0.0, 0.0)).unwrap();
    sim.run(20, 0.1);

    // 30ms of injected time per tick: every second tick while moving (1..=19)
    assert_eq!(sim.events().count(BroadcastCause::Periodic), 9);
    assert_eq!(sim.events().count(BroadcastCause::Started), 1);
    assert_eq!(sim.events().count(BroadcastCause::Arrived), 1);
}

#[test]
fn simulated_clock_reports_every_long_tick() {
    let mut world = GridWorld::new();
    let entity = world.spawn(MovementRecord::new(Point3::ZERO, 5.0).unwrap());
    let mut sim = Simulation::new(world, simulated_clock()).unwrap();
    sim.move_to(entity, Point3::new(9.9, 0.0, 0.0)).unwrap();
    sim.run(20, 0.1);

    // ticks of 100ms exceed the 50ms interval, so only tick length bounds the rate
    assert_eq!(sim.events().count(BroadcastCause::Periodic), 19);
}

#[test]
fn short_ticks_are_throttled() {
    let mut world = GridWorld::new();
    let entity = world.spawn(MovementRecord::new(Point3::ZERO, 1.0).unwrap());
    let mut sim = Simulation::new(world, simulated_clock()).unwrap();
    sim.start_movement(entity, Point3::new(50.0, 0.0, 0.0), None)
        .unwrap();
    sim.run(100, 0.01);

    let periodic = sim.events().count(BroadcastCause::Periodic);
    // 1s of 10ms ticks, at most one update per 50ms
    assert!(periodic <= 20);
    assert!(periodic >= 15);
}

#[test]
fn wall_raised_mid_route_blocks_the_walker() {
    let (mut sim, entity) = spawn_sim(GridWorld::new(), Point3::ZERO, 2.0);
    let mut done = sim.move_to(entity, Point3::new(10.0, 0.0, 0.0)).unwrap();
    sim.run(5, 0.1);
    assert!(record(&sim, entity).position.x > 0.9);

    for z in -20..=20 {
        sim.world_mut().block_cell(5, z);
    }
    sim.run_until_idle(5000, 0.1);

    assert_eq!(done.try_outcome(), Some(MovementOutcome::Blocked));
    assert!(record(&sim, entity).position.x < 5.0);
}

#[test]
fn stationary_entity_resolves_blocked() {
    let (mut sim, entity) = spawn_sim(GridWorld::new(), Point3::ZERO, 0.0);
    let mut done = sim.move_to(entity, Point3::new(3.0, 0.0, 0.0)).unwrap();
    sim.tick(0.1);

    assert_eq!(done.try_outcome(), Some(MovementOutcome::Blocked));
    assert!(!sim.movement().is_active(entity));
    let r = record(&sim, entity);
    assert!(r.position.is_zero());
    assert!(r.velocity.is_zero());
    assert_eq!(sim.events().count(BroadcastCause::Blocked), 1);
}

#[test]
fn entities_move_independently() {
    let mut world = GridWorld::new();
    let a = world.spawn(MovementRecord::new(Point3::ZERO, 1.0).unwrap());
    let b = world.spawn(MovementRecord::new(Point3::new(0.0, 0.0, 5.0), 3.0).unwrap());
    let mut sim = Simulation::new(world, SimConfig::default()).unwrap();

    let mut done_a = sim.move_to(a, Point3::new(3.0, 0.0, 0.0)).unwrap();
    let mut done_b = sim.move_to(b, Point3::new(9.0, 0.0, 5.0)).unwrap();
    assert_eq!(sim.movement().active_count(), 2);

    sim.run_until_idle(1000, 0.1);
    assert_eq!(done_a.try_outcome(), Some(MovementOutcome::Arrived));
    assert_eq!(done_b.try_outcome(), Some(MovementOutcome::Arrived));
    assert_eq!(sim.movement().active_count(), 0);
}

#[test]
fn collision_radius_widens_obstacles() {
    let mut world = GridWorld::new();
    world.block_cell(5, 2);
    let config = MovementConfig::default().with_collision_radius(Some(1.0));
    let start = Point3::ZERO;
    let end = Point3::new(10.0, 0.0, 2.0);

    assert!(Pathfinder::default().find_path(&world, start, end).is_some());
    let wide = Pathfinder::new(&config).find_path(&world, start, end).unwrap();
    assert!(!wide.iter().any(|p| world.check_collision(*p, Some(1.0))));
}

#[tokio::test]
async fn completion_can_be_awaited() {
    let (mut sim, entity) = spawn_sim(GridWorld::new(), Point3::ZERO, 4.0);
    let done = sim.move_to(entity, Point3::new(2.0, 0.0, 2.0)).unwrap();
    sim.run_until_idle(1000, 0.05);
    assert_eq!(done.await, MovementOutcome::Arrived);

    let done = sim.move_to(entity, Point3::new(8.0, 0.0, 2.0)).unwrap();
    sim.tick(0.05);
    sim.stop_movement(entity);
    assert_eq!(done.await, MovementOutcome::Stopped);
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn open_field_arrival_is_exact(
        tx in -20.0..20.0_f64,
        tz in -20.0..20.0_f64,
        speed in 0.5..5.0_f64,
        dt in 0.02..0.2_f64,
    ) {
        let (mut sim, entity) = spawn_sim(GridWorld::new(), Point3::ZERO, speed);
        let target = Point3::new(tx, 0.0, tz);
        let mut done = sim.move_to(entity, target).unwrap();
        sim.run_until_idle(100_000, dt);

        let r = record(&sim, entity);
        prop_assert!(r.position.distance_2d(target) < 1e-2);
        prop_assert_eq!(r.velocity, Point3::ZERO);
        prop_assert!(!r.is_moving);
        prop_assert_eq!(done.try_outcome(), Some(MovementOutcome::Arrived));
    }

    #[test]
    fn found_paths_end_at_the_destination(
        blocked in proptest::collection::vec((-6_i64..=6, -6_i64..=6), 0..30),
        ex in -8_i64..=8,
        ez in -8_i64..=8,
    ) {
        let mut world = GridWorld::new();
        for (x, z) in blocked {
            if (x, z) != (0, 0) {
                world.block_cell(x, z);
            }
        }
        let end = Point3::new(ex as f64, 0.0, ez as f64);
        if let Some(path) = Pathfinder::default().find_path(&world, Point3::ZERO, end) {
            prop_assert!(!path.is_empty());
            prop_assert_eq!(path.last(), Some(&end));
            prop_assert!(path.iter().all(|p| !world.check_collision(*p, None)));
        }
    }
}
