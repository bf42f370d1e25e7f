//! Scheduler Integration Tests
//!
//! Drive the scheduler actor through its handle on a real tokio runtime:
//! cadence ticks, command serialization, snapshot publication and shutdown.

use std::time::Duration;

use hydronauts::config::{AnomalyConfig, NetworkConfig};
use hydronauts::{
    AnomalyKind, RunState, Simulation, SimulationError, SimulationHandle, SimulationScheduler,
    ZoneId, ZoneStatus,
};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout};
use tokio_test::{assert_err, assert_ok};
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

fn frozen_config() -> NetworkConfig {
    NetworkConfig {
        anomaly: AnomalyConfig::frozen(),
        ..NetworkConfig::default()
    }
}

fn start(
    config: &NetworkConfig,
    interval: Duration,
) -> (SimulationHandle, CancellationToken, JoinHandle<Simulation>) {
    let simulation = Simulation::seeded(config, 1234).expect("simulation");
    let cancel = CancellationToken::new();
    let (scheduler, handle) = SimulationScheduler::new(simulation, interval, 16, cancel.clone());
    (handle, cancel, scheduler.spawn())
}

async fn wait_for_tick(handle: &SimulationHandle, target: u64) {
    let mut published = handle.subscribe();
    timeout(WAIT, async {
        while *published.borrow_and_update() < target {
            published.changed().await.expect("scheduler alive");
        }
    })
    .await
    .expect("tick reached in time");
}

// ============================================================================
// Cadence
// ============================================================================

#[tokio::test]
async fn cadence_ticks_publish_snapshots() {
    let (handle, cancel, task) = start(&NetworkConfig::default(), Duration::from_millis(5));

    wait_for_tick(&handle, 12).await;
    let snap = handle.snapshot();
    assert!(snap.tick >= 12);
    assert_eq!(snap.metrics.tick, snap.tick);
    assert!(snap.metrics.last_update_tick >= 10);
    for history in &snap.history {
        assert_eq!(history.pressure.len(), 120);
        assert_eq!(history.flow.len(), 120);
    }

    cancel.cancel();
    let simulation = task.await.expect("join");
    assert!(simulation.tick() >= 12);
}

#[tokio::test]
async fn first_tick_waits_one_interval() {
    let (handle, cancel, task) = start(&NetworkConfig::default(), Duration::from_secs(3600));

    sleep(Duration::from_millis(50)).await;
    assert_eq!(handle.snapshot().tick, 0);

    cancel.cancel();
    task.await.expect("join");
}

#[tokio::test]
async fn paused_scheduler_does_not_advance() {
    let (handle, cancel, task) = start(&frozen_config(), Duration::from_millis(5));
    wait_for_tick(&handle, 3).await;

    assert!(assert_ok!(handle.pause().await));
    let frozen = handle.snapshot();
    assert_eq!(frozen.run_state, RunState::Paused);

    sleep(Duration::from_millis(100)).await;
    let later = handle.snapshot();
    assert_eq!(later.tick, frozen.tick);
    assert_eq!(later.history, frozen.history);
    assert_eq!(later.metrics, frozen.metrics);

    assert!(assert_ok!(handle.resume().await));
    wait_for_tick(&handle, frozen.tick + 3).await;

    cancel.cancel();
    let simulation = task.await.expect("join");
    assert!(simulation.skipped_ticks() > 0);
}

// ============================================================================
// Commands
// ============================================================================

#[tokio::test]
async fn commands_are_visible_in_next_snapshot() {
    let (handle, cancel, task) = start(&frozen_config(), Duration::from_secs(3600));
    let zone_b = ZoneId::new(1);

    let seq = assert_ok!(handle.inject_anomaly(zone_b, AnomalyKind::Leak).await);
    assert_eq!(seq, 1);
    let snap = handle.snapshot();
    assert_eq!(snap.zones[1].status, ZoneStatus::Leak);
    assert_eq!(snap.alerts.len(), 1);
    assert_eq!(snap.alerts[0].message, "Possible leak detected in Zone B (North)");

    let open = assert_ok!(handle.toggle_valve(2).await);
    assert!(open, "zone C starts closed");
    assert!(handle.snapshot().zones[2].valve_open);

    assert_eq!(assert_ok!(handle.clear_alerts().await), 1);
    let snap = handle.snapshot();
    assert!(snap.alerts.is_empty());
    assert_eq!(snap.metrics.total_alerts, 0);
    assert_eq!(snap.zones[1].anomaly, Some(AnomalyKind::Leak));

    assert_eq!(
        assert_ok!(handle.resolve_anomaly(zone_b).await),
        Some(AnomalyKind::Leak)
    );
    assert_eq!(assert_ok!(handle.resolve_anomaly(zone_b).await), None);
    assert_eq!(handle.snapshot().zones[1].status, ZoneStatus::Ok);

    cancel.cancel();
    task.await.expect("join");
}

#[tokio::test]
async fn step_command_runs_one_tick() {
    let (handle, cancel, task) = start(&frozen_config(), Duration::from_secs(3600));

    for expected in 1..=10 {
        let outcome = assert_ok!(handle.step().await);
        assert_eq!(outcome.tick(), expected);
    }
    let snap = handle.snapshot();
    assert_eq!(snap.tick, 10);
    assert_eq!(snap.metrics.last_update_tick, 10);
    assert_eq!(*handle.subscribe().borrow(), 10);

    cancel.cancel();
    task.await.expect("join");
}

#[tokio::test]
async fn invalid_commands_return_errors() {
    let (handle, cancel, task) = start(&frozen_config(), Duration::from_secs(3600));
    let before = handle.snapshot();

    assert_eq!(
        handle.toggle_valve(4).await,
        Err(SimulationError::UnknownZone { index: 4, count: 4 })
    );
    assert_err!(handle.resolve_anomaly(ZoneId::new(8)).await);

    assert_ok!(handle.inject_anomaly(ZoneId::new(0), AnomalyKind::Burst).await);
    assert_eq!(
        handle
            .inject_anomaly(ZoneId::new(0), AnomalyKind::Leak)
            .await,
        Err(SimulationError::AnomalyAlreadyActive {
            zone: ZoneId::new(0),
            kind: AnomalyKind::Burst
        })
    );

    let after = handle.snapshot();
    assert_eq!(after.tick, before.tick);
    assert_eq!(after.metrics.total_alerts, 1);

    cancel.cancel();
    task.await.expect("join");
}

#[tokio::test]
async fn concurrent_handles_share_one_simulation() {
    let (handle, cancel, task) = start(&frozen_config(), Duration::from_secs(3600));

    let mut joins = Vec::new();
    for zone in 0..4 {
        let h = handle.clone();
        joins.push(tokio::spawn(async move {
            h.inject_anomaly(ZoneId::new(zone), AnomalyKind::LowPressure)
                .await
        }));
    }
    let mut seqs = Vec::new();
    for join in joins {
        seqs.push(assert_ok!(join.await.expect("join")));
    }
    seqs.sort_unstable();
    assert_eq!(seqs, vec![1, 2, 3, 4]);
    assert_eq!(handle.snapshot().metrics.active_anomalies, 4);

    cancel.cancel();
    task.await.expect("join");
}

// ============================================================================
// Shutdown
// ============================================================================

#[tokio::test]
async fn cancelled_scheduler_rejects_commands() {
    let (handle, cancel, task) = start(&frozen_config(), Duration::from_millis(5));
    wait_for_tick(&handle, 2).await;

    cancel.cancel();
    let simulation = task.await.expect("join");
    let final_tick = simulation.tick();

    assert!(handle.is_stopped());
    assert_eq!(handle.pause().await, Err(SimulationError::SchedulerStopped));
    assert_eq!(handle.step().await, Err(SimulationError::SchedulerStopped));
    // last published snapshot stays readable
    assert_eq!(handle.snapshot().tick, final_tick);
}

#[tokio::test]
async fn tick_limit_stops_exactly_at_limit() {
    let simulation = Simulation::seeded(&NetworkConfig::default(), 1234).expect("simulation");
    let cancel = CancellationToken::new();
    let (scheduler, handle) =
        SimulationScheduler::new(simulation, Duration::from_millis(2), 16, cancel);
    let task = scheduler.with_tick_limit(Some(5)).spawn();

    let simulation = timeout(WAIT, task)
        .await
        .expect("scheduler exits at limit")
        .expect("join");
    assert_eq!(simulation.tick(), 5);
    assert_eq!(simulation.snapshot().tick, 5);
    assert_eq!(handle.snapshot().tick, 5);
    assert_eq!(*handle.subscribe().borrow(), 5);
    assert!(handle.is_stopped());
}

#[tokio::test]
async fn dropping_all_handles_stops_scheduler() {
    let (handle, _cancel, task) = start(&frozen_config(), Duration::from_secs(3600));
    let extra = handle.clone();
    drop(handle);
    drop(extra);

    let simulation = timeout(WAIT, task)
        .await
        .expect("scheduler exits")
        .expect("join");
    assert_eq!(simulation.tick(), 0);
}
