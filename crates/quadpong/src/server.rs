//! Server builder and accept loop.
//!
//! Ties the layers together: WebSocket listener → per-connection
//! handler → room manager → game rooms.

use std::time::Duration;

use quadpong_actor::{ActorSystem, Addr, ask};
use quadpong_game::{GameConfig, ManagerMsg, RoomInfo, RoomManager};
use quadpong_transport::{WsConnection, WsListener};

use crate::QuadpongError;
use crate::handler::handle_connection;

/// How long a shutdown waits for actors before aborting survivors.
const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Builder for configuring and starting a quadpong server.
///
/// ```rust,no_run
/// # async fn run() -> Result<(), quadpong::QuadpongError> {
/// let server = quadpong::ServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run_until_shutdown().await
/// # }
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    config: GameConfig,
    shutdown_timeout: Duration,
}

impl ServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            config: GameConfig::default(),
            shutdown_timeout: DEFAULT_SHUTDOWN_TIMEOUT,
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the game configuration shared by all rooms.
    pub fn game_config(mut self, config: GameConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the shutdown grace period.
    pub fn shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = timeout;
        self
    }

    /// Binds the listener and spawns the actor system with its room
    /// manager.
    pub async fn build(self) -> Result<Server, QuadpongError> {
        let listener = WsListener::bind(&self.bind_addr).await?;
        let system = ActorSystem::new();
        let manager = system.spawn(RoomManager::<WsConnection>::new(self.config));
        Ok(Server {
            listener,
            system,
            manager,
            shutdown_timeout: self.shutdown_timeout,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running quadpong server.
pub struct Server {
    listener: WsListener,
    system: ActorSystem,
    manager: Addr<ManagerMsg<WsConnection>>,
    shutdown_timeout: Duration,
}

impl Server {
    /// Creates a new builder.
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.listener.local_addr()
    }

    /// Snapshot of all rooms and their occupancy, for admin queries.
    pub async fn list_rooms(&self) -> Result<Vec<RoomInfo>, QuadpongError> {
        Ok(ask(
            &self.manager,
            |tx| ManagerMsg::ListRooms { reply: tx },
            Duration::from_secs(1),
        )
        .await?)
    }

    /// Runs the accept loop: one handler task per connection. Accept
    /// errors on individual connections are logged and survived.
    pub async fn run(&self) -> Result<(), QuadpongError> {
        tracing::info!("quadpong server running");
        loop {
            match self.listener.accept().await {
                Ok(conn) => {
                    let manager = self.manager.clone();
                    tokio::spawn(handle_connection(conn, manager));
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }

    /// Runs until an external shutdown signal (ctrl-c), then performs a
    /// supervised actor-system shutdown.
    pub async fn run_until_shutdown(self) -> Result<(), QuadpongError> {
        tokio::select! {
            result = self.run() => result,
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("shutdown signal received");
                self.system.shutdown(self.shutdown_timeout).await;
                Ok(())
            }
        }
    }

    /// The underlying actor system (exposed for embedding and tests).
    pub fn system(&self) -> &ActorSystem {
        &self.system
    }
}
