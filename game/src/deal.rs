use crate::deck::DECK_SIZE;
use crate::error::Error;
use crate::model::{Card, Hand};

/// How a deck is split between the seats and the stock.
///
/// A layout can only be constructed when the hands and the stock use up the
/// whole deck exactly.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct DealLayout {
    players: usize,
    hand_size: usize,
    stock_size: usize,
}

impl DealLayout {
    pub fn new(players: usize, hand_size: usize, stock_size: usize) -> Result<Self, Error> {
        Self::for_deck(players, hand_size, stock_size, DECK_SIZE)
    }

    pub(crate) fn for_deck(
        players: usize,
        hand_size: usize,
        stock_size: usize,
        deck_size: usize,
    ) -> Result<Self, Error> {
        if players == 0 || players * hand_size + stock_size != deck_size {
            return Err(Error::InconsistentLayout {
                players,
                hand_size,
                stock_size,
                deck_size,
            });
        }
        Ok(DealLayout {
            players,
            hand_size,
            stock_size,
        })
    }

    /// Five players with fifteen cards each, three in the stock.
    pub fn five_players() -> Self {
        DealLayout {
            players: 5,
            hand_size: 15,
            stock_size: 3,
        }
    }

    pub fn players(&self) -> usize {
        self.players
    }

    pub fn hand_size(&self) -> usize {
        self.hand_size
    }

    pub fn stock_size(&self) -> usize {
        self.stock_size
    }

    pub fn deck_size(&self) -> usize {
        self.players * self.hand_size + self.stock_size
    }
}

impl Default for DealLayout {
    fn default() -> Self {
        Self::five_players()
    }
}

/// The result of dealing: one hand per seat, plus the stock.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Deal {
    pub hands: Vec<Hand>,
    pub stock: Vec<Card>,
}

/// Deal round-robin from the end of `cards`, one card per seat per round,
/// leaving the stock behind.
pub(crate) fn deal(mut cards: Vec<Card>, layout: &DealLayout) -> Result<Deal, Error> {
    if cards.len() != layout.deck_size() {
        return Err(Error::InconsistentLayout {
            players: layout.players,
            hand_size: layout.hand_size,
            stock_size: layout.stock_size,
            deck_size: cards.len(),
        });
    }
    let mut hands = vec![Hand::default(); layout.players];
    for _ in 0..layout.hand_size {
        for hand in hands.iter_mut() {
            // length was checked against the layout above
            if let Some(card) = cards.pop() {
                hand.push(card);
            }
        }
    }
    Ok(Deal {
        hands,
        stock: cards,
    })
}
