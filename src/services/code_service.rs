//! Resolving a pair code to the tournament it belongs to.

use tracing::debug;

use crate::dto::tournament::TournamentInfosDto;
use crate::error::{ClientResult, ForbiddenHandling, Rejection};
use crate::model::{PairNo, TournamentId};

use super::transport::Transport;

/// Detail shown when a pair-code lookup payload fails validation.
const MALFORMED_LOOKUP: &str = "The server sent confusing data about the pair code.";

/// Tournament seat a pair code resolved to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodeResolution {
    /// Tournament the code belongs to.
    pub tournament_id: TournamentId,
    /// Pair the code was issued for.
    pub pair_no: PairNo,
}

/// Client of the pair-code lookup endpoint.
pub struct CodeService {
    transport: Transport,
}

impl CodeService {
    pub(crate) fn new(transport: Transport) -> Self {
        Self { transport }
    }

    /// Find the tournament a score-entry code belongs to.
    ///
    /// Rejects without a login redirect when the code matches no tournament
    /// or more than one; the code in the URL is the only credential this
    /// endpoint needs.
    pub async fn movement_for_code(&self, code: &str) -> ClientResult<CodeResolution> {
        let segments = ["api", "tournaments", "pairno", code];
        debug!(code = %code, "resolving pair code");

        let dto: TournamentInfosDto = self
            .transport
            .get(&segments, None)
            .await
            .map_err(|err| Rejection::from_api(err, ForbiddenHandling::Surface, MALFORMED_LOOKUP))?;

        match dto.tournament_infos.as_slice() {
            [info] => Ok(CodeResolution {
                tournament_id: info.tournament_id(),
                pair_no: info.pair_no,
            }),
            [] => Err(Rejection::plain(
                "No tournament found!",
                "Check the pair code the tournament director gave you and try again.",
            )),
            _ => Err(Rejection::plain(
                "Bad luck!",
                "What are the odds?! There are multiple tournaments that your pair code could be for...",
            )),
        }
    }
}
