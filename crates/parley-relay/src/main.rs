//! parley-relay: WebSocket signaling relay for two-party calls.
//!
//! Accepts WebSocket connections, matches two clients into a session via a
//! short shareable room code, and forwards their negotiation and chat
//! traffic until a direct peer connection takes over. Offer/answer/candidate
//! payloads are opaque — the relay never inspects them.

mod connection;
mod directory;
mod gateway;
mod protocol;

use clap::Parser;
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

use crate::connection::handle_connection;
use crate::directory::SessionDirectory;

#[derive(Parser)]
#[command(name = "parley-relay", about = "Signaling relay for two-party calls")]
struct Args {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 3000)]
    port: u16,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "parley_relay=info".into()),
        )
        .init();

    let args = Args::parse();
    let directory = SessionDirectory::new();

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = TcpListener::bind(&addr)
        .await
        .expect("Failed to bind TCP listener");

    tracing::info!("parley-relay listening on {}", addr);

    // Accept loop: one task per connection.
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let directory = directory.clone();
                tokio::spawn(async move {
                    match accept_async(stream).await {
                        Ok(ws) => handle_connection(ws, addr, directory).await,
                        Err(e) => {
                            tracing::warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                tracing::warn!(error = %e, "TCP accept error");
            }
        }
    }
}
