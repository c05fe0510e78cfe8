//! Messages exchanged between the worker and foreground windows

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{error::WorkerError, state::PartialTimerState};

pub const TIMER_STATE_UPDATE: &str = "TIMER_STATE_UPDATE";
pub const SW_ADD_SERIES: &str = "SW_ADD_SERIES";
pub const SW_RESET_SERIES: &str = "SW_RESET_SERIES";
pub const SW_OPEN_TIMER: &str = "SW_OPEN_TIMER";

/// Raw `{ "type": ..., "payload": ... }` object as it travels on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEnvelope {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
}

/// A decoded message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "MessageEnvelope", into = "MessageEnvelope")]
pub enum ActionMessage {
    /// Foreground to worker: merge into the mirror and republish
    TimerStateUpdate(PartialTimerState),
    /// Worker to foreground: increment the series counter
    AddSeries,
    /// Worker to foreground: reset the series counter
    ResetSeries,
    /// Worker to foreground: show the timer view
    OpenTimer,
}

impl ActionMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::TimerStateUpdate(_) => TIMER_STATE_UPDATE,
            Self::AddSeries => SW_ADD_SERIES,
            Self::ResetSeries => SW_RESET_SERIES,
            Self::OpenTimer => SW_OPEN_TIMER,
        }
    }
}

impl TryFrom<MessageEnvelope> for ActionMessage {
    type Error = WorkerError;

    fn try_from(envelope: MessageEnvelope) -> Result<Self, Self::Error> {
        match envelope.kind.as_str() {
            TIMER_STATE_UPDATE => Ok(Self::TimerStateUpdate(PartialTimerState::from_payload(
                envelope.payload.as_ref(),
            ))),
            SW_ADD_SERIES => Ok(Self::AddSeries),
            SW_RESET_SERIES => Ok(Self::ResetSeries),
            SW_OPEN_TIMER => Ok(Self::OpenTimer),
            other => Err(WorkerError::UnknownMessage(other.to_string())),
        }
    }
}

impl From<ActionMessage> for MessageEnvelope {
    fn from(message: ActionMessage) -> Self {
        let kind = message.kind().to_string();
        let payload = match message {
            ActionMessage::TimerStateUpdate(update) => serde_json::to_value(update).ok(),
            _ => None,
        };
        Self { kind, payload }
    }
}
