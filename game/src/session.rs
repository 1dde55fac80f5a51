//! A single table, from the first player sitting down to the last card played.
use log::info;
use rand::rngs::StdRng;
use rand_core::{RngCore, SeedableRng};
use serde::Deserialize;

use crate::deal::DealLayout;
use crate::deck::Deck;
use crate::error::Error;
use crate::model::{Card, Hand, Play, PlayerId, Seat};
use crate::seats::SeatRegistry;
use crate::server::Settings;
use crate::trick::{PlayOutcome, TrickEngine};

/// Who gets to see the stock once the cards are dealt.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StockVisibility {
    /// Announce the stock to the whole table right after the deal.
    Public,
    /// Keep the stock to the server.
    Hidden,
}

impl Default for StockVisibility {
    fn default() -> Self {
        StockVisibility::Public
    }
}

/// Something the table needs to hear about after a change of state.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum Event {
    /// Occupants by seat number.
    PlayerListChanged(Vec<Option<PlayerId>>),
    SessionStarted,
    /// Only for the eyes of `player`.
    HandDealt { player: PlayerId, hand: Hand },
    StockRevealed(Vec<Card>),
    CardAccepted {
        seat: Seat,
        player: PlayerId,
        card: Card,
    },
    TrickResolved(Vec<Play>),
    TurnAdvanced(Seat),
    /// An event meant for `player` alone.
    Private { player: PlayerId, event: Box<Event> },
}

impl Event {
    fn to(self, player: PlayerId) -> Self {
        Event::Private {
            player,
            event: Box::new(self),
        }
    }
}

enum Phase {
    // Waiting for the table to fill.
    Waiting,
    // Cards are dealt and tricks are being played.
    Playing(TrickEngine),
}

/// The whole state of one game. Every mutation goes through its methods,
/// which report what happened as a list of events.
pub struct GameSession {
    layout: DealLayout,
    stock_visibility: StockVisibility,
    rng: Box<dyn RngCore + Send>,
    seats: SeatRegistry,
    phase: Phase,
}

impl GameSession {
    /// Create an empty table, shuffling with the configured seed or else a
    /// generator seeded by the operating system.
    pub fn new(settings: &Settings) -> Result<Self, Error> {
        let rng: Box<dyn RngCore + Send> = match settings.shuffle_seed {
            Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
            None => Box::new(StdRng::from_entropy()),
        };
        Self::with_rng(settings, rng)
    }

    /// Create an empty table that shuffles with the given source.
    pub fn with_rng(settings: &Settings, rng: Box<dyn RngCore + Send>) -> Result<Self, Error> {
        let layout = DealLayout::new(settings.seats, settings.hand_size, settings.stock_size)?;
        Ok(GameSession {
            layout,
            stock_visibility: settings.stock_visibility,
            rng,
            seats: SeatRegistry::new(layout.players()),
            phase: Phase::Waiting,
        })
    }

    pub fn layout(&self) -> &DealLayout {
        &self.layout
    }

    pub fn seats(&self) -> &SeatRegistry {
        &self.seats
    }

    pub fn is_started(&self) -> bool {
        matches!(self.phase, Phase::Playing(_))
    }

    pub fn turn(&self) -> Option<Seat> {
        self.engine().map(TrickEngine::turn)
    }

    pub fn trick(&self) -> &[Play] {
        self.engine().map(TrickEngine::trick).unwrap_or(&[])
    }

    pub fn hand(&self, seat: Seat) -> Option<&Hand> {
        self.engine().and_then(|e| e.hand(seat))
    }

    pub fn stock(&self) -> &[Card] {
        self.engine().map(TrickEngine::stock).unwrap_or(&[])
    }

    fn engine(&self) -> Option<&TrickEngine> {
        match &self.phase {
            Phase::Playing(engine) => Some(engine),
            Phase::Waiting => None,
        }
    }

    /// Seat a player. Filling the last seat deals the cards.
    pub fn join(&mut self, player: PlayerId) -> Result<(Seat, Vec<Event>), Error> {
        let seat = self.seats.join(player)?;
        let mut events = vec![Event::PlayerListChanged(self.seats.snapshot())];
        if !self.is_started() {
            if self.seats.is_full() {
                self.start(&mut events)?;
            }
        } else {
            self.catch_up(player, seat, &mut events);
        }
        Ok((seat, events))
    }

    // Someone is taking over a vacated seat: hand them its cards and tell them
    // what the rest of the table already knows.
    fn catch_up(&self, player: PlayerId, seat: Seat, events: &mut Vec<Event>) {
        let engine = match self.engine() {
            Some(engine) => engine,
            None => return,
        };
        if let Some(hand) = engine.hand(seat) {
            events.push(Event::HandDealt {
                player,
                hand: hand.clone(),
            });
        }
        events.push(Event::SessionStarted.to(player));
        if self.stock_visibility == StockVisibility::Public {
            events.push(Event::StockRevealed(engine.stock().to_vec()).to(player));
        }
        events.push(Event::TurnAdvanced(engine.turn()).to(player));
    }

    fn start(&mut self, events: &mut Vec<Event>) -> Result<(), Error> {
        let mut deck = Deck::standard();
        deck.shuffle(&mut *self.rng);
        let deal = deck.deal(&self.layout)?;
        info!(
            "table is full, dealing {} hands of {}",
            self.layout.players(),
            self.layout.hand_size()
        );
        for (seat, player) in self.seats.players() {
            events.push(Event::HandDealt {
                player,
                hand: deal.hands[seat.0].clone(),
            });
        }
        events.push(Event::SessionStarted);
        if self.stock_visibility == StockVisibility::Public {
            events.push(Event::StockRevealed(deal.stock.clone()));
        }
        self.phase = Phase::Playing(TrickEngine::new(deal));
        Ok(())
    }

    /// Free a player's seat. Passes the turn on if it was theirs, and closes
    /// the game once nobody is left.
    pub fn leave(&mut self, player: PlayerId) -> Vec<Event> {
        let seat = match self.seats.leave(player) {
            Some(seat) => seat,
            None => return Vec::new(),
        };
        let mut events = vec![Event::PlayerListChanged(self.seats.snapshot())];
        if self.seats.is_empty() {
            if self.is_started() {
                info!("table is empty, game over");
            }
            self.phase = Phase::Waiting;
            return events;
        }
        if let Phase::Playing(engine) = &mut self.phase {
            if let Some(outcome) = engine.skip_vacant(&self.seats) {
                info!("{} left on their turn, moving on", seat);
                push_outcome(&mut events, outcome);
            }
        }
        events
    }

    /// Play a card on behalf of a player.
    pub fn play_card(&mut self, player: PlayerId, card: Card) -> Result<Vec<Event>, Error> {
        let seat = self.seats.seat_of(player).ok_or(Error::NotSeated)?;
        let engine = match &mut self.phase {
            Phase::Playing(engine) => engine,
            Phase::Waiting => return Err(Error::NotStarted),
        };
        let outcome = engine.play(seat, card, &self.seats)?;
        let mut events = vec![Event::CardAccepted { seat, player, card }];
        push_outcome(&mut events, outcome);
        Ok(events)
    }
}

fn push_outcome(events: &mut Vec<Event>, outcome: PlayOutcome) {
    match outcome {
        PlayOutcome::TurnAdvanced(seat) => events.push(Event::TurnAdvanced(seat)),
        PlayOutcome::TrickResolved { plays, .. } => events.push(Event::TrickResolved(plays)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> GameSession {
        let settings = Settings {
            shuffle_seed: Some(1),
            ..Settings::default()
        };
        GameSession::new(&settings).unwrap()
    }

    fn full_session() -> GameSession {
        let mut session = session();
        for id in 1..=5 {
            session.join(PlayerId(id)).unwrap();
        }
        session
    }

    fn card_of(session: &GameSession, seat: usize) -> Card {
        session.hand(Seat(seat)).unwrap().cards()[0]
    }

    #[test]
    fn inconsistent_layout_prevents_the_session() {
        let settings = Settings {
            stock_size: 6,
            ..Settings::default()
        };
        assert!(matches!(
            GameSession::new(&settings),
            Err(Error::InconsistentLayout { .. })
        ));
    }

    #[test]
    fn partial_table_waits() {
        let mut session = session();
        let (seat, events) = session.join(PlayerId(1)).unwrap();
        assert_eq!(seat, Seat(0));
        assert_eq!(
            events,
            vec![Event::PlayerListChanged(vec![
                Some(PlayerId(1)),
                None,
                None,
                None,
                None
            ])]
        );
        assert!(!session.is_started());
        assert_eq!(session.turn(), None);
        assert_eq!(
            session.play_card(PlayerId(1), Card::Excuse),
            Err(Error::NotStarted)
        );
    }

    #[test]
    fn filling_the_table_deals_once() {
        let mut session = session();
        for id in 1..=4 {
            session.join(PlayerId(id)).unwrap();
        }
        let (seat, events) = session.join(PlayerId(5)).unwrap();
        assert_eq!(seat, Seat(4));
        assert!(session.is_started());
        assert_eq!(session.turn(), Some(Seat(0)));

        let dealt: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Event::HandDealt { player, hand } => Some((*player, hand.len())),
                _ => None,
            })
            .collect();
        assert_eq!(
            dealt,
            (1..=5).map(|id| (PlayerId(id), 15)).collect::<Vec<_>>()
        );
        assert!(events.contains(&Event::SessionStarted));
        assert!(events.contains(&Event::StockRevealed(session.stock().to_vec())));
        assert_eq!(session.stock().len(), 3);

        assert_eq!(session.join(PlayerId(6)), Err(Error::SeatsFull));
        assert!(session.is_started());
    }

    #[test]
    fn hidden_stock_is_not_announced() {
        let settings = Settings {
            stock_visibility: StockVisibility::Hidden,
            ..Settings::default()
        };
        let mut session = GameSession::new(&settings).unwrap();
        let mut events = Vec::new();
        for id in 1..=5 {
            events.extend(session.join(PlayerId(id)).unwrap().1);
        }
        assert!(events.contains(&Event::SessionStarted));
        assert!(!events
            .iter()
            .any(|e| matches!(e, Event::StockRevealed(_))));
        assert_eq!(session.stock().len(), 3);
    }

    #[test]
    fn same_seed_same_deal() {
        let a = full_session();
        let b = full_session();
        for seat in 0..5 {
            assert_eq!(a.hand(Seat(seat)), b.hand(Seat(seat)));
        }
    }

    #[test]
    fn first_play_then_foreign_card() {
        let mut session = full_session();
        let card = card_of(&session, 0);
        assert_eq!(
            session.play_card(PlayerId(1), card),
            Ok(vec![
                Event::CardAccepted {
                    seat: Seat(0),
                    player: PlayerId(1),
                    card
                },
                Event::TurnAdvanced(Seat(1)),
            ])
        );
        assert_eq!(session.turn(), Some(Seat(1)));

        let foreign = card_of(&session, 2);
        assert_eq!(
            session.play_card(PlayerId(2), foreign),
            Err(Error::CardNotHeld { card: foreign })
        );
        assert_eq!(session.turn(), Some(Seat(1)));
        assert_eq!(session.trick().len(), 1);
    }

    #[test]
    fn strangers_cannot_play() {
        let mut session = full_session();
        let card = card_of(&session, 0);
        assert_eq!(
            session.play_card(PlayerId(99), card),
            Err(Error::NotSeated)
        );
    }

    #[test]
    fn five_plays_make_a_trick() {
        let mut session = full_session();
        let mut last = Vec::new();
        for seat in 0..5 {
            let card = card_of(&session, seat);
            last = session.play_card(PlayerId(seat as u64 + 1), card).unwrap();
        }
        match last.last() {
            Some(Event::TrickResolved(plays)) => {
                let seats: Vec<_> = plays.iter().map(|p| p.seat).collect();
                assert_eq!(seats, (0..5).map(Seat).collect::<Vec<_>>());
            }
            other => panic!("expected a resolved trick, got {:?}", other),
        }
        assert!(session.trick().is_empty());
        assert_eq!(session.turn(), Some(Seat(0)));
    }

    #[test]
    fn newcomer_inherits_a_vacated_hand() {
        let mut session = full_session();
        let card = card_of(&session, 0);
        session.play_card(PlayerId(1), card).unwrap();
        let hand = session.hand(Seat(3)).cloned().unwrap();
        session.leave(PlayerId(4));
        let (seat, events) = session.join(PlayerId(7)).unwrap();
        assert_eq!(seat, Seat(3));
        let newcomer = PlayerId(7);
        assert_eq!(
            events,
            vec![
                Event::PlayerListChanged(vec![
                    Some(PlayerId(1)),
                    Some(PlayerId(2)),
                    Some(PlayerId(3)),
                    Some(newcomer),
                    Some(PlayerId(5)),
                ]),
                Event::HandDealt {
                    player: newcomer,
                    hand
                },
                Event::SessionStarted.to(newcomer),
                Event::StockRevealed(session.stock().to_vec()).to(newcomer),
                Event::TurnAdvanced(Seat(1)).to(newcomer),
            ]
        );
    }

    #[test]
    fn newcomer_is_not_shown_a_hidden_stock() {
        let settings = Settings {
            stock_visibility: StockVisibility::Hidden,
            ..Settings::default()
        };
        let mut session = GameSession::new(&settings).unwrap();
        for id in 1..=5 {
            session.join(PlayerId(id)).unwrap();
        }
        session.leave(PlayerId(2));
        let (_, events) = session.join(PlayerId(9)).unwrap();
        assert!(events.contains(&Event::SessionStarted.to(PlayerId(9))));
        assert!(events.contains(&Event::TurnAdvanced(Seat(0)).to(PlayerId(9))));
        assert!(!events.iter().any(|e| match e {
            Event::Private { event, .. } => matches!(**event, Event::StockRevealed(_)),
            _ => false,
        }));
    }

    #[test]
    fn leaving_on_turn_passes_it_on() {
        let mut session = full_session();
        let events = session.leave(PlayerId(1));
        assert_eq!(events.last(), Some(&Event::TurnAdvanced(Seat(1))));
        assert_eq!(session.turn(), Some(Seat(1)));
    }

    #[test]
    fn empty_table_starts_over() {
        let mut session = full_session();
        for id in 1..=5 {
            session.leave(PlayerId(id));
        }
        assert!(!session.is_started());
        assert!(session.seats().is_empty());
        assert!(session.leave(PlayerId(1)).is_empty());
    }
}
