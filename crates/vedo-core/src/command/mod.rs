// ── Command API ──
//
// Every mutating panel operation flows through a `Command`. The facade
// queues commands on one channel; a single processor task executes them
// in order.

use tokio::sync::oneshot;
use vedo_api::{ActionOutcome, PanelAction};

use crate::error::CoreError;
use crate::model::AreaScope;

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: oneshot::Sender<Result<ActionOutcome, CoreError>>,
}

/// All write operations against a panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    // ── Area operations ──────────────────────────────────────────────
    Arm(AreaScope),
    Disarm(AreaScope),

    // ── Zone operations ──────────────────────────────────────────────
    ExcludeZone(u32),
    IncludeZone(u32),
    IsolateZone(u32),
    UnisolateZone(u32),
}

impl Command {
    /// Wire action carrying out this command.
    pub fn action(self) -> PanelAction {
        match self {
            Self::Arm(scope) => PanelAction::Arm(scope.target()),
            Self::Disarm(scope) => PanelAction::Disarm(scope.target()),
            Self::ExcludeZone(id) => PanelAction::ExcludeZone(id),
            Self::IncludeZone(id) => PanelAction::IncludeZone(id),
            Self::IsolateZone(id) => PanelAction::IsolateZone(id),
            Self::UnisolateZone(id) => PanelAction::UnisolateZone(id),
        }
    }
}
