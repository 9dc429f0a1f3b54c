mod blackboard; // shared state snapshot, read by the async tasks
mod bus; // broadcast topics between the control thread and tokio
mod clock;
mod control;
mod messages;
mod settings;
mod sim;
mod telemetry;

use std::sync::Arc;
use std::time::Duration;

use diffbot_control::Telemetry;
use tokio::sync::mpsc;
use tracing::info;
use tracing_subscriber::EnvFilter;

use blackboard::{Blackboard, snapshot};
use bus::Topic;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    let settings = settings::load_settings()?;
    info!(
        listen = %settings.network.listen_addr,
        telemetry = %settings.network.telemetry_addr,
        "Diffbot host runtime starting."
    );

    let bb: Blackboard = Arc::default();
    let telemetry_topic: Topic<Telemetry> = Topic::new(settings.network.telemetry_queue);
    let (update_tx, update_rx) = mpsc::channel(settings.network.update_queue.max(1));

    // Subscribe before the control thread starts publishing.
    let frames = telemetry_topic.subscribe();
    let network = settings.network.clone();
    let _control = control::spawn(settings, update_rx, telemetry_topic, bb.clone())?;

    tokio::try_join!(
        messages::receive_updates(network.listen_addr, update_tx, bb.clone()),
        telemetry::publish_telemetry(frames, network.telemetry_addr),
        status(bb),
    )?;
    info!("Diffbot host runtime finished.");
    Ok(())
}

/// Logs a one-line summary of the robot every few seconds.
async fn status(bb: Blackboard) -> anyhow::Result<()> {
    let mut tick = tokio::time::interval(Duration::from_secs(5));
    loop {
        tick.tick().await;
        let state = snapshot(&bb);
        info!(
            phase = %state.phase,
            pose = %state.pose,
            goal = %state.goal,
            accepted_poses = state.accepted_poses,
            accepted_goals = state.accepted_goals,
            dropped = state.dropped_messages,
            since_update = ?state.last_update_ts.map(|ts| ts.elapsed()),
            faults = ?state.faults,
            "status"
        );
    }
}
