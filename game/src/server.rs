/// The core business logic of the server.
use std::collections::BTreeMap;
use std::default::Default;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::channel::mpsc;
use futures::lock::Mutex;
use futures::SinkExt;
use log::{debug, error, info};
use serde::Deserialize;

use crate::error::Error;
use crate::model::{PlayerId, Seat};
use crate::protocol;
use crate::session::{Event, GameSession, StockVisibility};

/// Owns the one table of the server, and serializes every change to it.
pub struct Core {
    next_player_id: AtomicU64,
    table: Mutex<Table>,
}

#[derive(Copy, Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Number of seats; the cards are dealt once all are taken.
    pub seats: usize,
    pub hand_size: usize,
    pub stock_size: usize,
    pub stock_visibility: StockVisibility,
    /// Fixed seed for the shuffle, for reproducible games.
    pub shuffle_seed: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            seats: 5,
            hand_size: 15,
            stock_size: 3,
            stock_visibility: StockVisibility::Public,
            shuffle_seed: None,
        }
    }
}

impl Core {
    /// Create a new server core with an empty table.
    ///
    /// Fails if the settings describe a deal that does not use the whole deck.
    pub fn new(settings: Settings) -> Result<Self, Error> {
        let session = GameSession::new(&settings)?;
        Ok(Core {
            next_player_id: AtomicU64::new(1),
            table: Mutex::new(Table {
                session,
                members: BTreeMap::new(),
            }),
        })
    }

    /// Register a new client with the core.
    ///
    /// The response channel should have a consumer that somehow delivers the
    /// responses to the client. In the actual server, this would involve
    /// serializing and writing the response to a WebSocket; in a test, the
    /// client would have the receiving channel.
    ///
    /// The returned context provides the client-handling task the means to
    /// take a seat and execute incoming requests.
    pub async fn register(&self, response_tx: mpsc::Sender<protocol::Response>) -> Context<'_> {
        let player = PlayerId(self.next_player_id.fetch_add(1, Ordering::SeqCst));
        Context {
            core: self,
            response_tx,
            player,
            seated: false,
        }
    }

    /// Run a closure against the current state of the table.
    pub async fn inspect<T>(&self, f: impl FnOnce(&GameSession) -> T) -> T {
        f(&self.table.lock().await.session)
    }
}

/// The handle by which client tasks may send requests to the core.
pub struct Context<'core> {
    core: &'core Core,
    response_tx: mpsc::Sender<protocol::Response>,
    player: PlayerId,
    seated: bool,
}

impl<'core> Context<'core> {
    pub fn player(&self) -> PlayerId {
        self.player
    }

    /// Take the lowest free seat at the table.
    ///
    /// On success the client is welcomed and the table told of its arrival. If
    /// every seat is taken the client is told the session is full, and the
    /// caller is expected to drop the connection. Any other refusal is sent
    /// back as a rejection.
    pub async fn join(&mut self) -> Result<Seat, Error> {
        let core = self.core;
        let mut table = core.table.lock().await;
        match table.session.join(self.player) {
            Ok((seat, events)) => {
                info!("{} sits down at {}", self.player, seat);
                self.seated = true;
                table.members.insert(
                    self.player,
                    Member {
                        response_tx: self.response_tx.clone(),
                    },
                );
                let welcome = protocol::WelcomeResponse {
                    player: self.player,
                    seat,
                };
                self.send(welcome.into()).await;
                table.dispatch(events).await;
                Ok(seat)
            }
            Err(Error::SeatsFull) => {
                info!("turning away {}: every seat is taken", self.player);
                self.send(protocol::Response::SessionFull).await;
                Err(Error::SeatsFull)
            }
            Err(e) => {
                debug!("refused seat to {}: {}", self.player, e);
                self.send(protocol::Rejection::from(&e).into()).await;
                Err(e)
            }
        }
    }

    /// Send a request to the core.
    ///
    /// This does not return a value, but rather sends responses to the
    /// channel provided to `Core::register`, and to the rest of the table.
    pub async fn execute(&mut self, req: protocol::Request) {
        match req {
            protocol::Request::Play(protocol::PlayRequest { card }) => {
                let core = self.core;
                let mut table = core.table.lock().await;
                match table.session.play_card(self.player, card) {
                    Ok(events) => table.dispatch(events).await,
                    Err(e) => {
                        debug!("rejected play from {}: {}", self.player, e);
                        self.send(protocol::Rejection::from(&e).into()).await;
                    }
                }
            }
        }
    }

    /// Cleanup data for this client from the core, e.g. due to disconnection.
    ///
    /// This would be better done as a Drop destructor, but, unfortunately,
    /// those don't support async yet.
    pub async fn cleanup(&mut self) {
        if !self.seated {
            return;
        }
        self.seated = false;
        let mut table = self.core.table.lock().await;
        table.members.remove(&self.player);
        let events = table.session.leave(self.player);
        table.dispatch(events).await;
    }

    async fn send(&mut self, r: protocol::Response) {
        self.response_tx
            .send(r)
            .await
            .map_err(|e| error!("while sending response: {}", e))
            .ok();
    }
}

// The game session together with the clients who sit at it.
struct Table {
    session: GameSession,
    members: BTreeMap<PlayerId, Member>,
}

impl Table {
    // Deliver events to the whole table, or only to the player they concern.
    async fn dispatch(&mut self, events: Vec<Event>) {
        for event in events {
            let recipient = match &event {
                Event::HandDealt { player, .. } | Event::Private { player, .. } => Some(*player),
                _ => None,
            };
            let response = protocol::Response::from(event);
            match recipient {
                Some(player) => {
                    if let Some(m) = self.members.get_mut(&player) {
                        m.send(response).await;
                    }
                }
                None => {
                    for m in self.members.values_mut() {
                        m.send(response.clone()).await;
                    }
                }
            }
        }
    }
}

impl From<Event> for protocol::Response {
    fn from(event: Event) -> Self {
        use protocol::*;
        match event {
            Event::PlayerListChanged(seats) => PlayersResponse { seats }.into(),
            Event::SessionStarted => Response::SessionStarted,
            Event::HandDealt { hand, .. } => HandResponse {
                cards: hand.cards().to_vec(),
            }
            .into(),
            Event::StockRevealed(cards) => StockResponse { cards }.into(),
            Event::CardAccepted { seat, player, card } => {
                CardPlayedResponse { seat, player, card }.into()
            }
            Event::TrickResolved(plays) => TrickCompleteResponse { plays }.into(),
            Event::TurnAdvanced(seat) => NextTurnResponse { seat }.into(),
            Event::Private { event, .. } => Response::from(*event),
        }
    }
}

struct Member {
    response_tx: mpsc::Sender<protocol::Response>,
}

impl Member {
    async fn send(&mut self, r: protocol::Response) {
        self.response_tx
            .send(r)
            .await
            .map_err(|e| error!("while sending response: {}", e))
            .ok();
    }
}
