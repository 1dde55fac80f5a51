use snafu::Snafu;

use crate::model::{Card, Seat};

/// Every way a table operation can be refused.
#[derive(Debug, Clone, Eq, PartialEq, Snafu)]
pub enum Error {
    #[snafu(display("every seat at the table is taken"))]
    SeatsFull,

    #[snafu(display("player already holds a seat"))]
    AlreadySeated,

    #[snafu(display("player does not hold a seat"))]
    NotSeated,

    #[snafu(display("the cards have not been dealt yet"))]
    NotStarted,

    #[snafu(display("{} tried to play, but it is the turn of {}", seat, turn))]
    NotYourTurn { seat: Seat, turn: Seat },

    #[snafu(display("{} is not in the player's hand", card))]
    CardNotHeld { card: Card },

    #[snafu(display(
        "{} hands of {} plus a stock of {} cannot cover a deck of {}",
        players,
        hand_size,
        stock_size,
        deck_size
    ))]
    InconsistentLayout {
        players: usize,
        hand_size: usize,
        stock_size: usize,
        deck_size: usize,
    },
}
