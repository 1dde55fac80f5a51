use log::debug;

use crate::deal::Deal;
use crate::error::Error;
use crate::model::{Card, Hand, Play, Seat};
use crate::seats::SeatRegistry;

/// What happened to the table after a turn moved on.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum PlayOutcome {
    /// The trick is still open; `0` is to play next.
    TurnAdvanced(Seat),
    /// Every seated player has played to the trick, which is now cleared.
    TrickResolved { plays: Vec<Play>, next: Seat },
}

/// Turn order and card ownership for the hands that were dealt.
#[derive(Debug, Clone)]
pub struct TrickEngine {
    hands: Vec<Hand>,
    stock: Vec<Card>,
    trick: Vec<Play>,
    turn: Seat,
}

impl TrickEngine {
    /// Start play with the first seat to act.
    pub fn new(deal: Deal) -> Self {
        TrickEngine {
            hands: deal.hands,
            stock: deal.stock,
            trick: Vec::new(),
            turn: Seat(0),
        }
    }

    pub fn turn(&self) -> Seat {
        self.turn
    }

    /// Plays made since the last trick was resolved.
    pub fn trick(&self) -> &[Play] {
        &self.trick
    }

    pub fn hand(&self, seat: Seat) -> Option<&Hand> {
        self.hands.get(seat.0)
    }

    pub fn stock(&self) -> &[Card] {
        &self.stock
    }

    /// Validate and apply a play by `seat`.
    ///
    /// A refused play leaves hands, trick and turn exactly as they were.
    pub fn play(
        &mut self,
        seat: Seat,
        card: Card,
        seats: &SeatRegistry,
    ) -> Result<PlayOutcome, Error> {
        if seat != self.turn {
            return Err(Error::NotYourTurn {
                seat,
                turn: self.turn,
            });
        }
        let hand = self.hands.get_mut(seat.0).ok_or(Error::NotSeated)?;
        if !hand.remove(&card) {
            return Err(Error::CardNotHeld { card });
        }
        debug!("{} plays {}", seat, card);
        self.trick.push(Play { seat, card });
        Ok(self.advance(seats))
    }

    /// Move the turn off a seat that has been vacated.
    ///
    /// Returns `None` if the seat to play is still occupied, or nobody is left
    /// to take the turn.
    pub fn skip_vacant(&mut self, seats: &SeatRegistry) -> Option<PlayOutcome> {
        if seats.player_at(self.turn).is_some() || seats.is_empty() {
            return None;
        }
        Some(self.advance(seats))
    }

    fn advance(&mut self, seats: &SeatRegistry) -> PlayOutcome {
        let next = seats
            .next_occupied_after(self.turn)
            .unwrap_or_else(|| Seat((self.turn.0 + 1) % seats.capacity()));
        self.turn = next;
        // the rotation has come back round to someone who already played
        if self.trick.iter().any(|p| p.seat == next) {
            let plays = std::mem::take(&mut self.trick);
            debug!("trick resolved after {} plays, {} leads", plays.len(), next);
            PlayOutcome::TrickResolved { plays, next }
        } else {
            PlayOutcome::TurnAdvanced(next)
        }
    }
}
