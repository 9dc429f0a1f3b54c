//! Inbound pose/goal datagrams.
//!
//! Each datagram is one JSON object with optional `robot` and `target` keys,
//! each a full `{"x", "y", "theta"}` pose:
//!
//! ```text
//! {"robot": {"x": 0.1, "y": 0.0, "theta": 0.0}, "target": {"x": 0.5, "y": 0.2, "theta": 1.57}}
//! ```

use std::net::SocketAddr;
use std::str;

use diffbot_control::ExternalUpdate;
use thiserror::Error;
use tokio::net::UdpSocket;
use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, info, warn};

use crate::blackboard::{Blackboard, count_dropped};

/// Larger than any well-formed update.
const MAX_DATAGRAM: usize = 2048;

#[derive(Error, Debug)]
pub enum MessageError {
    #[error("datagram is not UTF-8: {0}")]
    Utf8(#[from] str::Utf8Error),

    #[error("malformed update: {0}")]
    Json(#[from] serde_json::Error),

    #[error("update carries neither a robot pose nor a target")]
    Empty,
}

pub fn parse_update(datagram: &[u8]) -> Result<ExternalUpdate, MessageError> {
    let text = str::from_utf8(datagram)?;
    let update: ExternalUpdate = serde_json::from_str(text.trim())?;
    if update.is_empty() {
        return Err(MessageError::Empty);
    }
    Ok(update)
}

/// Parses datagrams arriving on `listen` and queues them for the control
/// thread. Anything that does not parse, or does not fit in the queue, is
/// dropped and counted.
pub async fn receive_updates(
    listen: SocketAddr,
    updates: mpsc::Sender<ExternalUpdate>,
    bb: Blackboard,
) -> anyhow::Result<()> {
    let socket = UdpSocket::bind(listen).await?;
    info!(%listen, "Update receiver started.");

    let mut buf = [0u8; MAX_DATAGRAM];
    loop {
        let (len, peer) = socket.recv_from(&mut buf).await?;
        let update = match parse_update(&buf[..len]) {
            Ok(update) => update,
            Err(e) => {
                warn!(%peer, error = %e, "dropping datagram");
                count_dropped(&bb);
                continue;
            }
        };
        match updates.try_send(update) {
            Ok(()) => debug!(%peer, ?update, "update queued"),
            Err(TrySendError::Full(_)) => {
                warn!(%peer, "update queue full, dropping datagram");
                count_dropped(&bb);
            }
            Err(TrySendError::Closed(_)) => {
                info!("Control thread gone, update receiver stopping.");
                return Ok(());
            }
        }
    }
}
