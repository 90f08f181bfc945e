//! Mock warehouse management system on raw TCP.

use std::io;

use adapters::wms::ack_frame;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Accepts connections forever, answering every chunk with `ACK:<chunk>`.
pub async fn serve(listener: TcpListener) -> io::Result<()> {
    loop {
        let (socket, peer) = listener.accept().await?;
        tracing::debug!(%peer, "WMS client connected");

        tokio::spawn(async move {
            if let Err(e) = handle(socket).await {
                tracing::warn!(%peer, error = %e, "WMS connection failed");
            }
            tracing::debug!(%peer, "WMS client disconnected");
        });
    }
}

async fn handle(mut socket: TcpStream) -> io::Result<()> {
    let mut buf = [0u8; 1024];
    loop {
        let n = socket.read(&mut buf).await?;
        if n == 0 {
            return Ok(());
        }
        let message = String::from_utf8_lossy(&buf[..n]);
        tracing::info!(%message, "WMS frame received");
        socket.write_all(ack_frame(&message).as_bytes()).await?;
    }
}
