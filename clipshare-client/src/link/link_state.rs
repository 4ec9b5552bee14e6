#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Sends the first offer.
    Initiator,
    /// Waits for the remote's offer.
    Responder,
}

/// Lifecycle of one peer link.
///
/// `Idle -> Initiating | AwaitingOffer -> Negotiating -> Connected -> Closed`.
/// Any live state may close; nothing leaves `Closed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkState {
    Idle,
    Initiating,
    AwaitingOffer,
    Negotiating,
    Connected,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    Start(Role),
    /// An offer went out (initiator) or came in (responder). Trickled
    /// candidates repeat it.
    Negotiate,
    ChannelOpen,
    Close,
}

impl LinkState {
    /// Next state for `event`, or `None` if the transition is illegal.
    pub fn on(self, event: LinkEvent) -> Option<LinkState> {
        use LinkEvent::*;
        use LinkState::*;

        match (self, event) {
            (Closed, _) => None,
            (_, Close) => Some(Closed),

            (Idle, Start(Role::Initiator)) => Some(Initiating),
            (Idle, Start(Role::Responder)) => Some(AwaitingOffer),

            (Initiating | AwaitingOffer | Negotiating, Negotiate) => Some(Negotiating),
            (Connected, Negotiate) => Some(Connected),

            (Negotiating, ChannelOpen) => Some(Connected),

            _ => None,
        }
    }

    pub fn is_live(self) -> bool {
        self != LinkState::Closed
    }
}
