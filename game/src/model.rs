use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The four plain suits of a Tarot deck.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum Suit {
    Hearts,
    Diamonds,
    Clubs,
    Spades,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Hearts, Suit::Diamonds, Suit::Clubs, Suit::Spades];

    fn name(self) -> &'static str {
        match self {
            Suit::Hearts => "Cœur",
            Suit::Diamonds => "Carreau",
            Suit::Clubs => "Trèfle",
            Suit::Spades => "Pique",
        }
    }
}

/// The rank of a suited card: pips one through ten, then the four honors.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum Rank {
    Pip(u8),
    Jack,
    Knight,
    Queen,
    King,
}

impl Rank {
    pub const HIGHEST_PIP: u8 = 10;
    pub const HONORS: &[Rank] = &[Rank::Jack, Rank::Knight, Rank::Queen, Rank::King];

    /// Every rank of a suit, lowest first.
    pub fn all() -> impl Iterator<Item = Rank> {
        (1..=Self::HIGHEST_PIP)
            .map(Rank::Pip)
            .chain(Self::HONORS.iter().copied())
    }
}

/// Number of the highest trump.
pub const HIGHEST_TRUMP: u8 = 21;

/// A single card of the 78-card Tarot deck.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub enum Card {
    Suited { suit: Suit, rank: Rank },
    Trump(u8),
    Excuse,
}

impl Card {
    pub fn suited(rank: Rank, suit: Suit) -> Self {
        Card::Suited { suit, rank }
    }

    /// Whether the card can exist in a real deck at all.
    pub fn is_valid(&self) -> bool {
        match *self {
            Card::Suited {
                rank: Rank::Pip(n),
                ..
            } => (1..=Rank::HIGHEST_PIP).contains(&n),
            Card::Suited { .. } => true,
            Card::Trump(n) => (1..=HIGHEST_TRUMP).contains(&n),
            Card::Excuse => true,
        }
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Card::Suited { suit, rank } => {
                match rank {
                    Rank::Pip(n) => write!(f, "{}", n)?,
                    Rank::Jack => f.write_str("Valet")?,
                    Rank::Knight => f.write_str("Cavalier")?,
                    Rank::Queen => f.write_str("Dame")?,
                    Rank::King => f.write_str("Roi")?,
                }
                write!(f, " de {}", suit.name())
            }
            Card::Trump(n) => write!(f, "{} d'Atout", n),
            Card::Excuse => f.write_str("Excuse"),
        }
    }
}

/// The card token could not be understood.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct ParseCardError(String);

impl fmt::Display for ParseCardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "not a tarot card: {:?}", self.0)
    }
}

impl std::error::Error for ParseCardError {}

impl FromStr for Card {
    type Err = ParseCardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseCardError(s.into());
        let s = s.trim();
        if s == "Excuse" {
            return Ok(Card::Excuse);
        }
        if let Some(n) = s.strip_suffix(" d'Atout") {
            let n: u8 = n.parse().map_err(|_| err())?;
            let card = Card::Trump(n);
            return if card.is_valid() { Ok(card) } else { Err(err()) };
        }
        let mut parts = s.splitn(2, " de ");
        let rank = parts.next().ok_or_else(err)?;
        let suit = parts.next().ok_or_else(err)?;
        let suit = Suit::ALL
            .iter()
            .copied()
            .find(|candidate| candidate.name() == suit)
            .ok_or_else(err)?;
        let rank = match rank {
            "Valet" => Rank::Jack,
            "Cavalier" => Rank::Knight,
            "Dame" => Rank::Queen,
            "Roi" => Rank::King,
            n => Rank::Pip(n.parse().map_err(|_| err())?),
        };
        let card = Card::suited(rank, suit);
        if card.is_valid() {
            Ok(card)
        } else {
            Err(err())
        }
    }
}

/// The opaque identity of one connected player.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "player#{}", self.0)
    }
}

/// A position at the table.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize, Serialize)]
pub struct Seat(pub usize);

impl fmt::Display for Seat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "seat {}", self.0)
    }
}

/// The cards currently held by one seat.
#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct Hand(Vec<Card>);

impl Hand {
    pub fn new(cards: Vec<Card>) -> Self {
        Hand(cards)
    }

    pub fn cards(&self) -> &[Card] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, card: &Card) -> bool {
        self.0.contains(card)
    }

    /// Take exactly one instance of `card` out of the hand.
    pub fn remove(&mut self, card: &Card) -> bool {
        match self.0.iter().position(|c| c == card) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    pub(crate) fn push(&mut self, card: Card) {
        self.0.push(card);
    }
}

/// A card laid down by a seat during a trick.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Deserialize, Serialize)]
pub struct Play {
    pub seat: Seat,
    pub card: Card,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_match_the_table_language() {
        assert_eq!(Card::suited(Rank::Pip(7), Suit::Hearts).to_string(), "7 de Cœur");
        assert_eq!(
            Card::suited(Rank::Knight, Suit::Spades).to_string(),
            "Cavalier de Pique"
        );
        assert_eq!(Card::Trump(21).to_string(), "21 d'Atout");
        assert_eq!(Card::Excuse.to_string(), "Excuse");
    }

    #[test]
    fn tokens_parse_back() {
        for card in crate::deck::Deck::standard().cards() {
            assert_eq!(card.to_string().parse::<Card>(), Ok(*card));
        }
    }

    #[test]
    fn out_of_range_tokens_are_refused() {
        assert!("22 d'Atout".parse::<Card>().is_err());
        assert!("0 d'Atout".parse::<Card>().is_err());
        assert!("11 de Cœur".parse::<Card>().is_err());
        assert!("Roi de Bâton".parse::<Card>().is_err());
        assert!("".parse::<Card>().is_err());
    }

    #[test]
    fn removing_takes_one_card_only() {
        let seven = Card::suited(Rank::Pip(7), Suit::Clubs);
        let mut hand = Hand::new(vec![seven, Card::Excuse]);
        assert!(hand.remove(&seven));
        assert!(!hand.remove(&seven));
        assert_eq!(hand.cards(), &[Card::Excuse]);
    }
}
