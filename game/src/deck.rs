use rand::seq::SliceRandom;
use rand::Rng;

use crate::deal::{self, Deal, DealLayout};
use crate::error::Error;
use crate::model::{Card, Rank, Suit, HIGHEST_TRUMP};

/// Four suits of fourteen, twenty-one trumps and the Excuse.
pub const DECK_SIZE: usize = 78;

/// An ordered pile of cards, consumed by dealing.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// The complete Tarot deck, in a fixed order: each suit from the one to the
    /// King, then the trumps, then the Excuse.
    pub fn standard() -> Self {
        let mut cards = Vec::with_capacity(DECK_SIZE);
        for &suit in Suit::ALL.iter() {
            for rank in Rank::all() {
                cards.push(Card::suited(rank, suit));
            }
        }
        for n in 1..=HIGHEST_TRUMP {
            cards.push(Card::Trump(n));
        }
        cards.push(Card::Excuse);
        Deck { cards }
    }

    /// Uniformly permute the deck using the given source of randomness.
    pub fn shuffle<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        self.cards.shuffle(rng);
    }

    /// Split the deck into hands and a stock.
    pub fn deal(self, layout: &DealLayout) -> Result<Deal, Error> {
        deal::deal(self.cards, layout)
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}
