//! HTTP services talking to the tournament server.

/// Pair-code resolution.
pub mod code_service;
/// Movement fetching and hand-score entry.
pub mod movement_service;
/// Tournament list, detail and lifecycle operations.
pub mod tournament_service;
/// HTTP plumbing shared by the services.
pub(crate) mod transport;

use std::sync::Arc;

use crate::config::{ClientConfig, ConfigError};
use crate::store::{MovementStore, TournamentStore};

pub use self::code_service::{CodeResolution, CodeService};
pub use self::movement_service::MovementService;
pub use self::tournament_service::TournamentService;

use self::transport::Transport;

/// Front door of the crate: one connection pool and one cache family.
///
/// All services built by one client share the same stores, so a tournament
/// name learned by any of them shows up on every handle already handed out.
pub struct TichuClient {
    tournaments: Arc<TournamentStore>,
    movements: Arc<MovementStore>,
    tournament_service: TournamentService,
    movement_service: MovementService,
    code_service: CodeService,
}

impl TichuClient {
    /// Build a client from the given configuration.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        let transport = Transport::new(config)?;
        let tournaments = Arc::new(TournamentStore::new());
        let movements = Arc::new(MovementStore::new(Arc::clone(&tournaments)));
        Ok(Self {
            tournament_service: TournamentService::new(
                transport.clone(),
                Arc::clone(&tournaments),
            ),
            movement_service: MovementService::new(transport.clone(), Arc::clone(&movements)),
            code_service: CodeService::new(transport),
            tournaments,
            movements,
        })
    }

    /// Movement and hand-score operations.
    pub fn movements(&self) -> &MovementService {
        &self.movement_service
    }

    /// Tournament list, detail and lifecycle operations.
    pub fn tournaments(&self) -> &TournamentService {
        &self.tournament_service
    }

    /// Pair-code resolution.
    pub fn codes(&self) -> &CodeService {
        &self.code_service
    }

    /// Canonical tournament objects, for direct cache inspection.
    pub fn tournament_store(&self) -> &Arc<TournamentStore> {
        &self.tournaments
    }

    /// Canonical movements and hands.
    pub fn movement_store(&self) -> &Arc<MovementStore> {
        &self.movements
    }
}
