use anyhow::Result;
use servoctl::{
    axis::{simulated::SimulatedAxis, MotorAxis},
    controller::config::ControllerConfig,
    runtime,
    transport::UdpLink,
};
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    // Optional path to a JSON config file; defaults describe board 1.
    let config = match std::env::args().nth(1) {
        Some(path) => ControllerConfig::from_json_file(&path)?,
        None => ControllerConfig::default(),
    };
    config.validate()?;

    info!(
        "Starting servoctl for board {} with simulated axes",
        config.board_id
    );

    let hw: [Box<dyn MotorAxis>; 4] = std::array::from_fn(|i| {
        Box::new(SimulatedAxis::new(format!("Servo{}", i + 1))) as Box<dyn MotorAxis>
    });
    let link = UdpLink::bind(&config.transport, config.board_id).await?;

    let (shutdown_tx, _) = broadcast::channel(1);
    let signal_tx = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, shutting down");
            let _ = signal_tx.send(());
        }
    });

    runtime::run(config, hw, link, shutdown_tx).await
}
