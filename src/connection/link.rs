//! Connection status smoothing.
//!
//! The writer's "connected" status bit drops briefly while the simulator
//! switches sessions, and some builds never set it for replays. [`LinkState`]
//! treats the link as connected once the status bit has been seen clear, the
//! `SessionNum` variable has been observed missing (or the source is a static
//! file), and `SessionNum` has then reappeared.

/// Progress of the smoothing state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkState {
    /// Status bit set, or nothing observed yet.
    #[default]
    Disconnected,
    /// Status bit seen clear.
    AwaitingFirstData,
    /// `SessionNum` seen missing, or the source is a static file.
    AwaitingSessionNum,
    /// `SessionNum` present again; treated as connected regardless of status.
    Connected,
}

impl LinkState {
    /// Advance with one observation. Rules apply in order, so one call may
    /// move more than one step.
    pub fn step(self, status_connected: bool, session_num_present: bool, file_backed: bool) -> Self {
        let mut state = self;
        if status_connected {
            state = LinkState::Disconnected;
        }
        if state == LinkState::Disconnected && !status_connected {
            state = LinkState::AwaitingFirstData;
        }
        if state == LinkState::AwaitingFirstData && (!session_num_present || file_backed) {
            state = LinkState::AwaitingSessionNum;
        }
        if state == LinkState::AwaitingSessionNum && session_num_present {
            state = LinkState::Connected;
        }
        state
    }

    /// Connected as far as smoothing is concerned.
    pub fn is_connected(self, status_connected: bool) -> bool {
        status_connected || self == LinkState::Connected
    }
}
