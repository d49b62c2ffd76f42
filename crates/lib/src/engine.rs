//! Interfaces to the external protocol engine.
//!
//! The engine (sync, encryption, key backup, the network stack) lives
//! outside this crate. Everything the registry needs from it is expressed by
//! the traits here; callers plug in a concrete engine through
//! [`SessionEngine`].

use std::{fmt::Debug, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;

use crate::{
    backup::BackupStateListener, connection::SharedConfig, identity::Identity,
    settings::OpenOptions, trust::UnrecognizedCertificate,
};

/// Server error code reported when an access token is no longer valid.
pub const UNKNOWN_TOKEN: &str = "M_UNKNOWN_TOKEN";

/// Event type of a room message.
pub const EVENT_TYPE_MESSAGE: &str = "m.room.message";

/// Event type of a read receipt.
pub const EVENT_TYPE_RECEIPT: &str = "m.receipt";

/// Failure reported by an engine operation.
#[derive(Debug, Clone, Error)]
pub enum EngineError {
    /// The request did not reach the server.
    #[error("Network error: {0}")]
    Network(String),

    /// The server answered with an error.
    #[error("Server error {code}: {message}")]
    Server { code: String, message: String },

    /// The server presented a certificate nobody has trusted yet.
    #[error(transparent)]
    UntrustedCertificate(#[from] UnrecognizedCertificate),

    /// The engine could not build the session.
    #[error("Engine failure: {0}")]
    Internal(String),
}

/// Factory for engine-side sessions.
pub trait SessionEngine: Send + Sync {
    /// Build the data handler and store for `config`.
    fn open_session(
        &self,
        config: &SharedConfig,
        options: &OpenOptions,
    ) -> Result<Arc<dyn EngineSession>, EngineError>;

    /// Build the handler answering other devices' room-key requests for an
    /// account whose crypto engine has finished its initial sync.
    fn key_request_handler(
        &self,
        identity: &Identity,
        crypto: &Arc<dyn CryptoEngine>,
    ) -> Arc<dyn RoomKeyRequestListener>;
}

/// One account's session inside the engine.
#[async_trait]
pub trait EngineSession: Send + Sync {
    /// The data handler; `None` once the engine has released it.
    fn data_handler(&self) -> Option<Arc<dyn DataHandler>>;

    /// The crypto engine, present once encryption has started.
    fn crypto(&self) -> Option<Arc<dyn CryptoEngine>>;

    /// The event store backing this session.
    fn store(&self) -> Arc<dyn EventStore>;

    /// Network connectivity monitor for this session.
    fn connectivity(&self) -> Arc<dyn NetworkConnectivity>;

    /// Start end-to-end encryption together with the session.
    fn enable_crypto_when_starting(&self);

    fn set_data_save_mode(&self, enabled: bool);

    /// Deactivate the account on the server.
    async fn deactivate_account(&self, password: &str, erase_user_data: bool)
    -> Result<(), EngineError>;

    /// Log out on the server and release local data.
    async fn logout(&self) -> Result<(), EngineError>;

    /// Release local data only.
    async fn clear_local(&self) -> Result<(), EngineError>;
}

/// Receives sync events for one session.
pub trait DataHandler: Send + Sync {
    fn add_listener(&self, listener: Arc<dyn SessionListener>);
    fn remove_listener(&self, listener: &Arc<dyn SessionListener>);
    fn set_network_error_listener(&self, listener: Arc<dyn NetworkErrorListener>);
    fn refresh_push_rules(&self);
}

/// Callbacks fired by the sync engine. All methods default to no-ops.
pub trait SessionListener: Send + Sync {
    fn on_live_event(&self, _event_type: &str) {}
    fn on_live_events_chunk_processed(&self) {}
    fn on_ignored_users_update(&self) {}
    fn on_crypto_sync_complete(&self) {}
    fn on_initial_sync_complete(&self) {}
}

/// Request-level failures surfaced by the data handler.
pub trait NetworkErrorListener: Send + Sync {
    fn on_certificate_error(&self, certificate: UnrecognizedCertificate);
    fn on_configuration_error(&self, code: &str);
}

/// End-to-end encryption engine of one session.
pub trait CryptoEngine: Send + Sync {
    fn backup(&self) -> Arc<dyn BackupEngine>;
    fn add_room_key_request_listener(&self, listener: Arc<dyn RoomKeyRequestListener>);
}

/// Server-side key backup of one session.
pub trait BackupEngine: Send + Sync {
    fn add_listener(&self, listener: Arc<dyn BackupStateListener>);
    fn remove_listener(&self, listener: &Arc<dyn BackupStateListener>);
}

/// Handles key-sharing requests from the account's other devices.
pub trait RoomKeyRequestListener: Send + Sync {
    fn on_room_key_request(&self, request_id: &str);
    fn on_room_key_request_cancellation(&self, request_id: &str);
}

/// Network reachability as seen by one session.
pub trait NetworkConnectivity: Send + Sync {
    fn is_connected(&self) -> bool;
    fn add_event_listener(&self, listener: Arc<dyn NetworkEventListener>);
    fn remove_event_listener(&self, listener: &Arc<dyn NetworkEventListener>);
}

pub trait NetworkEventListener: Send + Sync {
    fn on_network_connection_update(&self, connected: bool);
}

/// Opaque handle to an engine event store.
pub trait EventStore: Send + Sync + Debug {
    /// Whether the store has finished loading.
    fn is_ready(&self) -> bool;
}
