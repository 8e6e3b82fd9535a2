use std::fs;
use std::path::Path;
use std::time::Duration;
use waypoint_nav::core::{FixQuality, RawFix};
use waypoint_nav::hardware::{MockPositioningSource, ScriptedEvent};
use waypoint_nav::navigation::{LinkProbe, NavigationMode, NavigationSession, TickOutcome, TourProgress};
use waypoint_nav::processing::{PositioningAdapter, SolverError, TourPlanner};
use waypoint_nav::utils::{InstructionLog, ManualClock};
use waypoint_nav::{distance, Clock, Coordinate, NavigationError};

fn fix(latitude: f64, longitude: f64, timestamp: f64) -> ScriptedEvent {
    ScriptedEvent::Fix(RawFix::new(FixQuality::Fix3D, latitude, longitude, timestamp))
}

/// Visits the points in file order
fn identity_solver(problem: &Path, solution: &Path) -> Result<(), SolverError> {
    let text = fs::read_to_string(problem).unwrap();
    let n: usize = text
        .lines()
        .find_map(|line| line.strip_prefix("DIMENSION: "))
        .unwrap()
        .parse()
        .unwrap();
    let order: Vec<String> = (0..n).map(|i| i.to_string()).collect();
    fs::write(solution, format!("{}\n{}\n", n, order.join("\n"))).unwrap();
    Ok(())
}

#[test]
fn confirm_link_then_navigate_live_tour() {
    // Receiver warms up during the probe, then the platform drives the tour
    let mut events = vec![ScriptedEvent::Timeout, ScriptedEvent::Timeout];
    events.extend((1..=4).map(|t| fix(0.0, 0.0, t as f64)));
    events.extend([
        fix(0.0, 0.0, 10.0),
        ScriptedEvent::Timeout,
        fix(0.0, 0.5, 11.0),
        fix(0.0, 1.0, 12.0),
        fix(0.5, 1.0, 13.0),
        fix(1.0, 1.0, 14.0),
    ]);
    let mut adapter = PositioningAdapter::new(MockPositioningSource::with_script(events));

    let confirmed = LinkProbe::new(6, Duration::from_millis(5))
        .probe(&mut adapter)
        .unwrap();
    assert_eq!(confirmed.successes(), 4);
    assert_eq!(confirmed.attempts(), 6);
    assert_eq!(confirmed.final_fix().timestamp, 4.0);

    let dir = tempfile::tempdir().unwrap();
    let csv = dir.path().join("square.csv");
    fs::write(&csv, "latitude,longitude\n0,0\n0,1\n1,1\n").unwrap();
    let planner = TourPlanner::new(dir.path(), dir.path(), identity_solver);
    let planned = planner.plan(&csv).unwrap();

    let clock = ManualClock::new(Duration::from_secs(1_700_000_000));
    let mut session = NavigationSession::new(adapter, planned.tour, clock.clone(), Duration::from_millis(5));
    assert_eq!(session.next_instruction(), Err(NavigationError::LinkNotConfirmed));
    session.attach_link(confirmed);
    session.set_proximity_radius(1000.0);
    session.set_simulation_velocity(0.0).unwrap();

    let mut log = InstructionLog::create(&dir.path().join("log"), clock.now()).unwrap();
    let mut destinations = Vec::new();
    let mut no_fix = 0;
    for _ in 0..20 {
        clock.advance(Duration::from_secs(1));
        match session.next_instruction().unwrap() {
            TickOutcome::Instruction(instruction) => {
                assert_eq!(instruction.mode, NavigationMode::Live);
                assert!((0.0..360.0).contains(&instruction.bearing_deg));
                log.append(&instruction).unwrap();
                destinations.push(instruction.destination_index);
            }
            TickOutcome::NoFix => no_fix += 1,
            TickOutcome::Completed => break,
        }
    }

    assert_eq!(session.progress(), TourProgress::Completed);
    assert_eq!(destinations, vec![1, 1, 2, 2]);
    assert_eq!(no_fix, 1);
    assert_eq!(log.records(), 4);
    assert_eq!(fs::read_to_string(log.path()).unwrap().lines().count(), 4);
}

#[test]
fn simulated_tour_reaches_every_waypoint() {
    let waypoints = vec![
        Coordinate::new(0.0, 0.001),
        Coordinate::new(0.001, 0.001),
        Coordinate::new(0.001, 0.0),
    ];
    let mut adapter = PositioningAdapter::new(MockPositioningSource::with_script(vec![fix(0.0, 0.0, 1.0)]));
    let confirmed = LinkProbe::new(1, Duration::from_millis(5)).probe(&mut adapter).unwrap();

    let clock = ManualClock::new(Duration::from_secs(1_700_000_000));
    let tour = waypoint_nav::Tour::new(waypoints.clone()).unwrap();
    let mut session = NavigationSession::new(adapter, tour, clock.clone(), Duration::from_millis(5))
        .with_simulation_start(Coordinate::new(0.0, 0.0));
    session.attach_link(confirmed);
    session.set_proximity_radius(2.0);
    assert_eq!(session.set_simulation_velocity(5.0), Ok(5.0));

    let mut ticks = 0;
    let mut last_index = 0;
    loop {
        ticks += 1;
        assert!(ticks < 200, "simulation never finished");
        match session.next_instruction().unwrap() {
            TickOutcome::Instruction(instruction) => {
                assert!(instruction.destination_index >= last_index);
                last_index = instruction.destination_index;
                assert_eq!(instruction.velocity_mps, Some(5.0));
                assert!(instruction.simulated_position.is_some());
            }
            TickOutcome::NoFix => panic!("simulation is seeded from its start"),
            TickOutcome::Completed => break,
        }
        clock.advance(Duration::from_secs(2));
    }

    // Three legs of roughly 111 m at 10 m per tick
    assert!(ticks > 30);
    let end = session.position().unwrap();
    assert!(distance(&end, &waypoints[2]) <= 2.0);
    assert_eq!(session.next_instruction(), Ok(TickOutcome::Completed));
}
