//! Teleplot output: one `name:timestamp_ms:value|g` line per channel.

use std::fmt::Write;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;

use diffbot_control::Telemetry;
use tokio::net::UdpSocket;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{debug, info, warn};

pub fn teleplot_lines(frame: &Telemetry) -> String {
    let stamp = frame.stamp.as_millis();
    let mut out = String::with_capacity(256);
    for (name, value) in frame.channels() {
        // Writing into a String cannot fail.
        let _ = writeln!(out, "{name}:{stamp}:{value}|g");
    }
    out
}

/// Forwards every frame published on the telemetry topic to `target`.
pub async fn publish_telemetry(
    mut frames: broadcast::Receiver<Arc<Telemetry>>,
    target: SocketAddr,
) -> anyhow::Result<()> {
    let bind = if target.is_ipv4() {
        SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0))
    } else {
        SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0))
    };
    let socket = UdpSocket::bind(bind).await?;
    info!(%target, "Telemetry sender started.");

    loop {
        match frames.recv().await {
            Ok(frame) => {
                let lines = teleplot_lines(&frame);
                if let Err(e) = socket.send_to(lines.as_bytes(), target).await {
                    debug!(error = %e, "telemetry datagram not sent");
                }
            }
            Err(RecvError::Lagged(skipped)) => warn!(skipped, "telemetry sender fell behind"),
            Err(RecvError::Closed) => {
                info!("Telemetry topic closed, sender stopping.");
                return Ok(());
            }
        }
    }
}
