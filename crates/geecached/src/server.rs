//! TCP accept loop and per-connection frame processing

use std::sync::Arc;

use anyhow::Result;
use bytes::BytesMut;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, warn};

use crate::frame::Frame;
use crate::handler::CommandHandler;

/// Serve connections from `listener` until the task is dropped
pub async fn serve(listener: TcpListener, handler: Arc<CommandHandler>) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                debug!("New connection from {}", addr);
                let handler = Arc::clone(&handler);

                tokio::spawn(async move {
                    if let Err(e) = handle_client(stream, handler).await {
                        error!("Error handling client {}: {}", addr, e);
                    }
                    debug!("Connection closed: {}", addr);
                });
            }
            Err(e) => {
                error!("Error accepting connection: {}", e);
            }
        }
    }
}

async fn handle_client(mut stream: TcpStream, handler: Arc<CommandHandler>) -> Result<()> {
    let mut buffer = BytesMut::with_capacity(4096);
    let mut out = BytesMut::with_capacity(4096);

    loop {
        let n = stream.read_buf(&mut buffer).await?;
        if n == 0 {
            return Ok(());
        }

        loop {
            match Frame::decode(&mut buffer) {
                Ok(Some(cmd)) => {
                    // Group lookups block on peers and data sources.
                    let handler = Arc::clone(&handler);
                    let reply = tokio::task::spawn_blocking(move || handler.handle(cmd)).await?;
                    reply.encode(&mut out);
                    stream.write_all(&out).await?;
                    out.clear();
                }
                Ok(None) => break,
                Err(e) => {
                    warn!("Parse error: {}", e);
                    Frame::Error(format!("ERR {}", e)).encode(&mut out);
                    stream.write_all(&out).await?;
                    out.clear();
                    buffer.clear();
                    break;
                }
            }
        }
    }
}
