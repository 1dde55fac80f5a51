use std::error::Error;
use std::net::{SocketAddr, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};

use async_local_bounded_channel as spsc_async;
use futures::channel::mpsc;
use futures::future::select;
use futures::pin_mut;
use futures::SinkExt;
use log::{debug, error, info};
use tokio::stream::StreamExt;

use typenum::U2;
use warp::filters::ws::{Message, WebSocket};
use warp::Filter;

use tarot_game::protocol::{Request, Response};
use tarot_game::server::Core;

use crate::settings;

/// Execute the entire life-cycle of the tarot server.
pub async fn run(
    server: settings::Server,
    game: tarot_game::server::Settings,
    shutdown_rx: piper::Receiver<()>,
) -> Result<Stats, Box<dyn Error>> {
    // The table itself; refuses to exist if the deal doesn't add up.
    let core = Core::new(game)?;
    let layout = core.inspect(|session| *session.layout()).await;
    info!(
        "table of {} seats, {} cards per hand, {} in the stock",
        layout.players(),
        layout.hand_size(),
        layout.stock_size()
    );

    let bind_addr = server
        .bind_addr
        .to_socket_addrs()?
        .next()
        .ok_or("bind address resolved to nothing")?;

    // Closes once the web server and every connection task have let go of
    // their sender.
    let (terminated_tx, terminated_rx) = piper::chan(0);
    let total_accepted_connections = Arc::new(AtomicUsize::new(0));

    start_server(
        server,
        bind_addr,
        core,
        shutdown_rx,
        terminated_tx,
        total_accepted_connections.clone(),
    )
    .await;

    info!("waiting for seated players to be let go");
    terminated_rx.recv().await;

    Ok(Stats {
        total_accepted_connections: total_accepted_connections.load(Ordering::Acquire),
    })
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Stats {
    pub total_accepted_connections: usize,
}

async fn start_server(
    server: settings::Server,
    bind_addr: SocketAddr,
    core: Core,
    shutdown_rx: piper::Receiver<()>,
    terminated_tx: piper::Sender<()>,
    total_accepted_connections: Arc<AtomicUsize>,
) {
    let (guard, weak_guard) = make_guard(core, shutdown_rx.clone(), terminated_tx.clone());

    // GET /* serves the browser client, /server upgrades to the table socket.
    let client_files = warp::get().and(warp::fs::dir(server.client_files_path.clone()));

    let websocket_server = warp::path("server")
        .and(warp::ws())
        .and(warp::addr::remote())
        .map(move |ws: warp::ws::Ws, addr: Option<SocketAddr>| {
            let handle = {
                let guard = weak_guard.upgrade().expect("server running");
                guard.new_client()
            };
            let total_accepted_connections = total_accepted_connections.clone();
            ws.on_upgrade(move |stream| async move {
                if let Some(addr) = addr {
                    total_accepted_connections.fetch_add(1, Ordering::Release);
                    info!("accepted connection from {}", addr);
                    handle_client(handle, stream, addr).await;
                } else {
                    error!("no address for incoming connection")
                }
            })
        });

    let routes = client_files.or(websocket_server);

    let shutdown = shutdown_rx.clone();
    tokio::spawn(async move {
        let (addr, server) =
            warp::serve(routes).bind_with_graceful_shutdown(bind_addr, async move {
                shutdown_rx.recv().await;
                info!("received shutdown notice");
                drop(terminated_tx);
            });
        info!("table open on {}", addr);
        server.await;
        info!("web server stopped");
    });

    shutdown.recv().await;
    drop(guard);
}

// Responses queued for one client before the table blocks on it. Taking over a
// vacated seat is the largest burst, at six responses.
const RESPONSE_CAPACITY: usize = 8;

// Plays queued from one client before its socket reader waits.
type RequestCapacity = U2;

type RequestTx<'a> = spsc_async::Sender<'a, Request, RequestCapacity>;
type RequestRx<'a> = spsc_async::Receiver<'a, Request, RequestCapacity>;

async fn handle_client(handle: ClientHandle, stream: WebSocket, addr: SocketAddr) {
    let (state, shutdown_rx, terminated_tx) = handle.split();
    let (response_tx, response_rx) = mpsc::channel(RESPONSE_CAPACITY);
    let mut requests = spsc_async::channel::<Request, RequestCapacity>();
    let (request_tx, request_rx) = requests.split();
    let connection = process_connection(shutdown_rx.clone(), stream, addr, response_rx, request_tx);
    let request = handle_requests(state, shutdown_rx, addr, request_rx, response_tx);
    pin_mut!(connection, request);
    // whichever loop ends first, let the other one wind down too
    select(connection, request).await.factor_first().1.await;
    info!("{} has left the table", addr);
    drop(terminated_tx);
}

async fn process_connection(
    mut shutdown_rx: piper::Receiver<()>,
    mut stream: WebSocket,
    addr: SocketAddr,
    mut response_rx: mpsc::Receiver<Response>,
    mut request_tx: RequestTx<'_>,
) {
    debug!("starting connection processing loop for {}", addr);
    loop {
        tokio::select! {
            _ = shutdown_rx.next() => {
                break
            },
            // Write out response to socket, or hang up once the core has
            // nothing more to say (e.g. the table was full).
            resp = response_rx.next() => match resp {
                Some(resp) => send_response(&resp, &mut stream, &addr).await,
                None => break,
            },
            msg = stream.next() =>
                if forward_request(msg, &mut request_tx, &addr).await {
                    break;
                }
        }
    }
    if let Err(e) = stream.close().await {
        debug!("while closing connection to {}: {}", addr, e);
    }
}

async fn send_response(resp: &Response, stream: &mut WebSocket, addr: &SocketAddr) {
    match bincode::serialize(&resp) {
        Ok(data) => {
            if let Err(e) = stream.send(Message::binary(data)).await {
                error!("while sending response to {}: {}", addr, e);
            }
        }
        Err(e) => error!("while serializing response to {}: {}", addr, e),
    }
}

async fn forward_request(
    msg: Option<Result<Message, warp::Error>>,
    request_tx: &mut RequestTx<'_>,
    addr: &SocketAddr,
) -> bool {
    let msg = match msg {
        Some(msg) => msg,
        None => return true,
    };
    match msg {
        Ok(msg) => {
            if msg.is_close() {
                return true;
            }
            if msg.is_ping() || msg.is_pong() {
                return false;
            }
            let data = msg.into_bytes();
            if data.is_empty() {
                return true;
            }
            match bincode::deserialize(&data) {
                Ok(req) => {
                    if request_tx.send(req).await.is_err() {
                        return true;
                    }
                }
                Err(e) => error!("deserializing request from {}: {}", addr, e),
            }
        }
        Err(e) => error!("reading message from {}: {}", addr, e),
    }
    false
}

async fn handle_requests(
    state: Arc<State>,
    mut shutdown_rx: piper::Receiver<()>,
    addr: SocketAddr,
    mut request_rx: RequestRx<'_>,
    response_tx: mpsc::Sender<Response>,
) {
    let mut hard_stop = false;
    let mut context = state.core().register(response_tx).await;

    // Connecting is asking for a seat; without one, there is nothing to do.
    if let Err(e) = context.join().await {
        info!("disconnecting {} ({}): {}", addr, context.player(), e);
        return;
    }

    debug!("starting request handling loop for {}", addr);
    loop {
        tokio::select! {
            _ = shutdown_rx.next() => {
                debug!("received notification to stop handling {}", addr);
                hard_stop = true;
                break;
            },
            opt_request = request_rx.receive() => match opt_request {
                Ok(req) => context.execute(req).await,
                Err(_) => {
                    debug!("apparent death of sibling task for {}", addr);
                    break;
                },
            }
        }
    }

    if !(hard_stop || state.stopping()) {
        debug!("cleaning up {}", addr);
        context.cleanup().await;
    }
}

/// The table shared by every connection, and whether the server is closing.
pub struct State {
    stopping: AtomicBool,
    core: Arc<Core>,
}

impl State {
    fn new(core: Core) -> Self {
        State {
            stopping: AtomicBool::new(false),
            core: Arc::new(core),
        }
    }

    pub fn core(&self) -> &Arc<Core> {
        &self.core
    }

    /// Set once the guard is dropped; seats are then kept rather than freed.
    pub fn stopping(&self) -> bool {
        self.stopping.load(Ordering::Acquire)
    }
}

/// Wrap the table in shared state and return the guard that owns it, plus a
/// weak reference for the route closure.
pub fn make_guard(
    core: Core,
    shutdown_rx: piper::Receiver<()>,
    terminated_tx: piper::Sender<()>,
) -> (Arc<Guard>, Weak<Guard>) {
    let state = Arc::new(State::new(core));
    let guard = Guard {
        state,
        shutdown_rx,
        terminated_tx,
    };
    let guard = Arc::new(guard);
    let weak_guard = Arc::downgrade(&guard);
    (guard, weak_guard)
}

/// Hands out the shared state to new connections, and marks the server as
/// stopping when dropped.
///
/// Connection tasks wait on a clone of the `piper` shutdown channel; once it
/// closes they check `State::stopping` to tell a server shutdown apart from
/// their client hanging up, and only free the seat in the latter case.
pub struct Guard {
    state: Arc<State>,
    shutdown_rx: piper::Receiver<()>,
    terminated_tx: piper::Sender<()>,
}

impl Guard {
    /// Everything a connection task needs to reach the table.
    pub fn new_client(&self) -> ClientHandle {
        ClientHandle {
            state: self.state.clone(),
            shutdown_rx: self.shutdown_rx.clone(),
            terminated_tx: self.terminated_tx.clone(),
        }
    }
}

impl Drop for Guard {
    fn drop(&mut self) {
        debug!("marking the table as closing");
        self.state.stopping.store(true, Ordering::Release);
    }
}

/// The table, the shutdown notice, and the sender whose drop reports that the
/// connection task is done.
#[derive(Clone)]
pub struct ClientHandle {
    state: Arc<State>,
    shutdown_rx: piper::Receiver<()>,
    terminated_tx: piper::Sender<()>,
}

impl ClientHandle {
    pub fn split(self) -> (Arc<State>, piper::Receiver<()>, piper::Sender<()>) {
        (self.state, self.shutdown_rx, self.terminated_tx)
    }
}
