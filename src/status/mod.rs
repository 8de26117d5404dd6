//! Closed sets of upstream connector and destination states.
//!
//! The Fivetran API reports these as plain strings. Each one is converted
//! into an enum here before it reaches a collector; a value outside the
//! known set is a [`ConversionError`] and is never mapped to a default.

use std::fmt;
use std::str::FromStr;

/// An upstream string that does not belong to the expected state set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionError {
    kind: &'static str,
    value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }

    /// Name of the state set the value was checked against.
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    /// The rejected upstream value.
    pub fn value(&self) -> &str {
        &self.value
    }
}

impl fmt::Display for ConversionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "illegal {}: '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ConversionError {}

/// Current setup state of a connector.
///
/// - `incomplete`: the setup config is incomplete, setup tests never succeeded
/// - `connected`: the connector is properly set up
/// - `broken`: the connector setup config is broken
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupState {
    Broken,
    Connected,
    Incomplete,
}

impl SetupState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupState::Broken => "broken",
            SetupState::Connected => "connected",
            SetupState::Incomplete => "incomplete",
        }
    }
}

impl FromStr for SetupState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "broken" => Ok(SetupState::Broken),
            "connected" => Ok(SetupState::Connected),
            "incomplete" => Ok(SetupState::Incomplete),
            other => Err(ConversionError::new("setup state", other)),
        }
    }
}

impl fmt::Display for SetupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current sync state of a connector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SyncState {
    Scheduled,
    Syncing,
    Paused,
    Rescheduled,
}

impl SyncState {
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncState::Scheduled => "scheduled",
            SyncState::Syncing => "syncing",
            SyncState::Paused => "paused",
            SyncState::Rescheduled => "rescheduled",
        }
    }
}

impl FromStr for SyncState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(SyncState::Scheduled),
            "syncing" => Ok(SyncState::Syncing),
            "paused" => Ok(SyncState::Paused),
            "rescheduled" => Ok(SyncState::Rescheduled),
            other => Err(ConversionError::new("sync state", other)),
        }
    }
}

impl fmt::Display for SyncState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current data update state of a connector.
///
/// - `on_schedule`: the sync is running smoothly, no delays
/// - `delayed`: data is delayed for longer than expected for the update
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateState {
    OnSchedule,
    Delayed,
}

impl UpdateState {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateState::OnSchedule => "on_schedule",
            UpdateState::Delayed => "delayed",
        }
    }
}

impl FromStr for UpdateState {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "on_schedule" => Ok(UpdateState::OnSchedule),
            "delayed" => Ok(UpdateState::Delayed),
            other => Err(ConversionError::new("update state", other)),
        }
    }
}

impl fmt::Display for UpdateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Current setup status of a destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SetupStatus {
    Broken,
    Connected,
    Incomplete,
}

impl SetupStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SetupStatus::Broken => "broken",
            SetupStatus::Connected => "connected",
            SetupStatus::Incomplete => "incomplete",
        }
    }
}

impl FromStr for SetupStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "broken" => Ok(SetupStatus::Broken),
            "connected" => Ok(SetupStatus::Connected),
            "incomplete" => Ok(SetupStatus::Incomplete),
            other => Err(ConversionError::new("setup status", other)),
        }
    }
}

impl fmt::Display for SetupStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
