//! WebRTC signaling relay server.
//!
//! Run with:
//! ```not_rust
//! cargo run --bin tsunagi-server
//! cargo run --bin tsunagi-server -- --host 0.0.0.0 --port 3000 --unrouted ignore
//! ```

use std::{num::NonZeroUsize, sync::Arc};

use clap::Parser;
use tsunagi_server::{
    infrastructure::repository::InMemoryRoomRegistry,
    ui::Server,
    usecase::{
        GetRoomDetailUseCase, GetRoomsUseCase, JoinRoomUseCase, LeaveRoomUseCase,
        RelayMessageUseCase, UnroutedPolicy,
    },
};
use tsunagi_shared::logger::setup_logger;

#[derive(Parser, Debug)]
#[command(name = "tsunagi-server")]
#[command(about = "WebSocket signaling relay for WebRTC peers", long_about = None)]
struct Args {
    /// Host address to bind the server to
    #[arg(short = 'H', long, default_value = "127.0.0.1")]
    host: String,

    /// Port number to bind the server to
    #[arg(short = 'p', long, default_value = "3000")]
    port: u16,

    /// Outbound queue size per client; messages beyond it are dropped
    #[arg(long, default_value = "256")]
    queue_capacity: NonZeroUsize,

    /// What to do with messages that are not a targeted offer/answer/candidate or leave
    #[arg(long, value_enum, default_value_t = UnroutedPolicy::Broadcast)]
    unrouted: UnroutedPolicy,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    setup_logger(env!("CARGO_BIN_NAME"), "info");

    let args = Args::parse();
    tracing::debug!("Starting with {:?}", args);

    // Initialize dependencies in order:
    // 1. Registry
    // 2. UseCases
    // 3. Server

    // 1. Create Registry (in-memory room map)
    let registry = Arc::new(InMemoryRoomRegistry::new());

    // 2. Create UseCases
    let join_room_usecase = Arc::new(JoinRoomUseCase::new(registry.clone()));
    let relay_message_usecase = Arc::new(RelayMessageUseCase::new(args.unrouted));
    let leave_room_usecase = Arc::new(LeaveRoomUseCase::new());
    let get_rooms_usecase = Arc::new(GetRoomsUseCase::new(registry.clone()));
    let get_room_detail_usecase = Arc::new(GetRoomDetailUseCase::new(registry));

    // 3. Create and run the server
    let server = Server::new(
        join_room_usecase,
        relay_message_usecase,
        leave_room_usecase,
        get_rooms_usecase,
        get_room_detail_usecase,
        args.queue_capacity,
    );
    if let Err(e) = server.run(args.host, args.port).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
