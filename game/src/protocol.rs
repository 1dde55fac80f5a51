use std::convert::From;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::model::{Card, Play, PlayerId, Seat};

/// Every possible kind of request that a client may send.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum Request {
    Play(PlayRequest),
}

/// Every possible kind of response that a server may send.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum Response {
    Welcome(WelcomeResponse),
    SessionFull,
    Players(PlayersResponse),
    SessionStarted,
    Hand(HandResponse),
    Stock(StockResponse),
    CardPlayed(CardPlayedResponse),
    TrickComplete(TrickCompleteResponse),
    NextTurn(NextTurnResponse),
    Rejected(Rejection),
}

// Auxillary macro for converting inner request/response types into their
// outermost counterparts.

macro_rules! derive_from {
    ($to:ident, $ty:ident, $r:ident) => {
        impl From<$r> for $to {
            fn from(r: $r) -> Self {
                $to::$ty(r)
            }
        }
    };
}

/// Lay a card from the hand onto the current trick.
///
/// Only accepted from the seat whose turn it is, and only for a card that seat
/// actually holds. Otherwise the server replies with `Rejected`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlayRequest {
    pub card: Card,
}

derive_from!(Request, Play, PlayRequest);

/// Sent to a client once it has taken a seat.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct WelcomeResponse {
    /// The identity the server knows this client by.
    pub player: PlayerId,
    pub seat: Seat,
}

derive_from!(Response, Welcome, WelcomeResponse);

/// Who sits where, by seat number.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct PlayersResponse {
    pub seats: Vec<Option<PlayerId>>,
}

derive_from!(Response, Players, PlayersResponse);

/// The cards dealt to the receiving client.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HandResponse {
    pub cards: Vec<Card>,
}

derive_from!(Response, Hand, HandResponse);

/// The cards set aside from the deal.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StockResponse {
    pub cards: Vec<Card>,
}

derive_from!(Response, Stock, StockResponse);

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct CardPlayedResponse {
    pub seat: Seat,
    pub player: PlayerId,
    pub card: Card,
}

derive_from!(Response, CardPlayed, CardPlayedResponse);

/// Every seat has played; the plays are listed in the order they were made.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct TrickCompleteResponse {
    pub plays: Vec<Play>,
}

derive_from!(Response, TrickComplete, TrickCompleteResponse);

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct NextTurnResponse {
    pub seat: Seat,
}

derive_from!(Response, NextTurn, NextTurnResponse);

/// Why a request was refused.
#[derive(Debug, Copy, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub enum Rejection {
    NotYourTurn,
    CardNotHeld,
    NotStarted,
    NotSeated,
    AlreadySeated,
    /// Every seat is taken. A connecting client is sent `SessionFull` instead.
    SeatsFull,
    /// The server cannot deal with its configured layout.
    InconsistentLayout,
}

derive_from!(Response, Rejected, Rejection);

impl From<&Error> for Rejection {
    fn from(e: &Error) -> Self {
        match e {
            Error::NotYourTurn { .. } => Rejection::NotYourTurn,
            Error::CardNotHeld { .. } => Rejection::CardNotHeld,
            Error::NotStarted => Rejection::NotStarted,
            Error::NotSeated => Rejection::NotSeated,
            Error::AlreadySeated => Rejection::AlreadySeated,
            Error::SeatsFull => Rejection::SeatsFull,
            Error::InconsistentLayout { .. } => Rejection::InconsistentLayout,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_error_keeps_its_reason() {
        let card = Card::Excuse;
        let cases = vec![
            (
                Error::NotYourTurn {
                    seat: Seat(2),
                    turn: Seat(0),
                },
                Rejection::NotYourTurn,
            ),
            (Error::CardNotHeld { card }, Rejection::CardNotHeld),
            (Error::NotStarted, Rejection::NotStarted),
            (Error::NotSeated, Rejection::NotSeated),
            (Error::AlreadySeated, Rejection::AlreadySeated),
            (Error::SeatsFull, Rejection::SeatsFull),
            (
                Error::InconsistentLayout {
                    players: 5,
                    hand_size: 15,
                    stock_size: 6,
                    deck_size: 78,
                },
                Rejection::InconsistentLayout,
            ),
        ];
        for (error, rejection) in cases {
            assert_eq!(Rejection::from(&error), rejection, "{}", error);
        }
    }
}
