//! Builder for a LAN session controller.

use lanparty_session::NetworkBackend;

use crate::{
    AutoJoinConfig, DiscoveryConfig, LanBackend, LanPartyConfig, SessionConfig, SessionController,
    SessionHandle,
};

/// Entry point: `LanParty::builder()`.
pub struct LanParty;

impl LanParty {
    pub fn builder() -> LanPartyBuilder {
        LanPartyBuilder::new()
    }
}

/// Builder for configuring and spawning a [`SessionController`].
///
/// # Example
///
/// ```rust,no_run
/// use lanparty::prelude::*;
///
/// # async fn example() -> Result<(), LanPartyError> {
/// let session = LanParty::builder().label("Den").build();
/// let mut events = session.subscribe();
/// session.auto_join().await?;
/// while let Ok(event) = events.recv().await {
///     println!("{event:?}");
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct LanPartyBuilder {
    config: LanPartyConfig,
}

impl LanPartyBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration, e.g. one loaded from a file.
    pub fn config(mut self, config: LanPartyConfig) -> Self {
        self.config = config;
        self
    }

    /// Name shown in game lists and rosters.
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.config.session.label = label.into();
        self
    }

    pub fn discovery(mut self, discovery: DiscoveryConfig) -> Self {
        self.config.discovery = discovery;
        self
    }

    pub fn session(mut self, session: SessionConfig) -> Self {
        self.config.session = session;
        self
    }

    pub fn auto_join(mut self, auto_join: AutoJoinConfig) -> Self {
        self.config.auto_join = auto_join;
        self
    }

    /// Spawns a controller over the WebSocket [`LanBackend`].
    ///
    /// Must be called from within a Tokio runtime.
    pub fn build(self) -> SessionHandle {
        let backend = LanBackend::new(self.config.session.clone());
        self.build_with(backend)
    }

    /// Spawns a controller over a custom backend.
    pub fn build_with<B: NetworkBackend>(self, backend: B) -> SessionHandle {
        SessionController::spawn(self.config, backend)
    }
}
