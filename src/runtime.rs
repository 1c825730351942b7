//! Network task and control task, joined by channels. Only the control task
//! touches the controller state.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tokio::{
    sync::{
        broadcast,
        mpsc::{self, error::TryRecvError, error::TrySendError},
    },
    time::{interval, sleep, MissedTickBehavior},
};
use tracing::{info, warn};

use crate::{
    axis::{logical_axis, MotorAxis, AXES_PER_BOARD},
    controller::{config::ControllerConfig, Controller},
    transport::{spawn_network_task, CommandLink},
};

const FEEDBACK_POLL: Duration = Duration::from_millis(10);

/// Run one controller instance until `shutdown` fires or the link closes.
pub async fn run<L>(
    config: ControllerConfig,
    hw: [Box<dyn MotorAxis>; AXES_PER_BOARD],
    link: L,
    shutdown: broadcast::Sender<()>,
) -> Result<()>
where
    L: CommandLink + 'static,
{
    config.validate()?;
    let board_id = config.board_id;
    let loop_period = config.loop_period();
    let capacity = config.transport.channel_capacity;

    let mut controller = Controller::new(config, hw);
    controller.initialize(Instant::now());
    wait_for_feedback(&mut controller).await;

    let (inbound_tx, mut inbound_rx) = mpsc::channel::<String>(capacity);
    let (outbound_tx, outbound_rx) = mpsc::channel(capacity);
    let network = spawn_network_task(link, inbound_tx, outbound_rx, shutdown.subscribe());

    let mut shutdown_rx = shutdown.subscribe();
    let mut tick = interval(loop_period);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    info!(
        "Board {} control loop started: {} ms period",
        board_id,
        loop_period.as_millis()
    );

    'control: loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = shutdown_rx.recv() => {
                info!("Control loop shutting down");
                break;
            }
        }

        // 1. Drain all pending commands
        if drain_commands(&mut controller, &mut inbound_rx).is_err() {
            warn!("Network task stopped, leaving control loop");
            break;
        }

        // 2. Refresh, sequence, move, heartbeat
        controller.iterate(Instant::now());

        // 3. Hand telemetry to the network task
        for telemetry in controller.drain_outbox() {
            match outbound_tx.try_send(telemetry) {
                Ok(()) => {}
                Err(TrySendError::Full(dropped)) => {
                    warn!("Telemetry queue full, dropping {}", dropped.kind());
                }
                Err(TrySendError::Closed(_)) => {
                    warn!("Network task stopped, leaving control loop");
                    break 'control;
                }
            }
        }
    }

    let _ = shutdown.send(());
    network.await.context("Network task panicked")?;
    info!("Board {} stopped", board_id);
    Ok(())
}

/// Apply every command already queued, without waiting for more. Fails once
/// the network side has hung up.
fn drain_commands(
    controller: &mut Controller,
    inbound_rx: &mut mpsc::Receiver<String>,
) -> Result<usize, TryRecvError> {
    let mut applied = 0;
    loop {
        match inbound_rx.try_recv() {
            Ok(command) => {
                controller.handle(&command);
                applied += 1;
            }
            Err(TryRecvError::Empty) => return Ok(applied),
            Err(e) => return Err(e),
        }
    }
}

/// Wait, bounded by the configured feedback wait, for HLFB on every enabled
/// axis. Axes still without feedback are reported and startup continues.
async fn wait_for_feedback(controller: &mut Controller) {
    let board_id = controller.config().board_id;
    let deadline = Instant::now() + controller.config().feedback_wait();
    loop {
        let pending = controller.pending_feedback();
        if pending.is_empty() {
            return;
        }
        if Instant::now() >= deadline {
            for servo in pending {
                warn!(
                    "Servo{} HLFB not asserted after {} ms, continuing",
                    logical_axis(board_id, servo),
                    controller.config().feedback_wait_ms
                );
            }
            return;
        }
        sleep(FEEDBACK_POLL).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        axis::testing::FakeAxis, protocol::telemetry::Telemetry, transport::testing::channel_link,
    };
    use tokio::time::timeout;

    fn fake_hw() -> (Vec<FakeAxis>, [Box<dyn MotorAxis>; AXES_PER_BOARD]) {
        let fakes: Vec<FakeAxis> = (0..AXES_PER_BOARD).map(|_| FakeAxis::new()).collect();
        let hw = std::array::from_fn(|i| Box::new(fakes[i].clone()) as Box<dyn MotorAxis>);
        (fakes, hw)
    }

    #[tokio::test]
    async fn test_commands_round_trip_through_control_loop() {
        let (_fakes, hw) = fake_hw();
        let (link, mut console) = channel_link();
        let (shutdown_tx, _) = broadcast::channel(1);
        let handle = tokio::spawn(run(
            ControllerConfig::default(),
            hw,
            link,
            shutdown_tx.clone(),
        ));

        console
            .commands
            .send("CMD:S3_Parameters:100,300,-50".into())
            .await
            .unwrap();
        console
            .commands
            .send("CMD:REQUEST_SETPOINTS".into())
            .await
            .unwrap();

        let setpoints = timeout(Duration::from_secs(2), async {
            loop {
                if let Some(Telemetry::Setpoints(fields)) = console.telemetry.recv().await {
                    return fields;
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(&setpoints[6..9], &[100, 300, -50]);

        shutdown_tx.send(()).unwrap();
        timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_one_iteration_applies_every_queued_command() {
        let (_fakes, hw) = fake_hw();
        let mut controller = Controller::new(ControllerConfig::default(), hw);
        let (tx, mut rx) = mpsc::channel(8);
        for command in [
            "CMD:Mode AUTO",
            "CMD:Repeat ENABLE",
            "CMD:Start ENABLE",
            "CMD:S2B1 DISABLE",
        ] {
            tx.send(command.to_string()).await.unwrap();
        }

        assert_eq!(drain_commands(&mut controller, &mut rx), Ok(4));
        controller.iterate(Instant::now());

        let state = controller.state();
        assert_eq!(state.mode, crate::controller::state::Mode::Automatic);
        assert!(state.repeat);
        assert!(!state.operators[1].enabled);
        assert_eq!(controller.current_step(), 1);
        assert_eq!(drain_commands(&mut controller, &mut rx), Ok(0));

        drop(tx);
        assert_eq!(
            drain_commands(&mut controller, &mut rx),
            Err(TryRecvError::Disconnected)
        );
    }

    #[tokio::test]
    async fn test_startup_continues_without_feedback() {
        let (fakes, hw) = fake_hw();
        fakes[0].with(|s| s.hlfb_asserted = false);
        let config = ControllerConfig {
            feedback_wait_ms: 30,
            ..ControllerConfig::default()
        };
        let (link, mut console) = channel_link();
        let (shutdown_tx, _) = broadcast::channel(1);
        let handle = tokio::spawn(run(config, hw, link, shutdown_tx.clone()));

        // The first heartbeat only goes out once the control loop is running.
        let first = timeout(Duration::from_secs(2), console.telemetry.recv())
            .await
            .unwrap();
        assert_eq!(first, Some(Telemetry::StateEngine(0)));

        shutdown_tx.send(()).unwrap();
        timeout(Duration::from_secs(2), handle)
            .await
            .unwrap()
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_rejects_invalid_config() {
        let (_fakes, hw) = fake_hw();
        let (link, _console) = channel_link();
        let (shutdown_tx, _) = broadcast::channel(1);
        let config = ControllerConfig::for_board(0);
        assert!(run(config, hw, link, shutdown_tx).await.is_err());
    }
}
