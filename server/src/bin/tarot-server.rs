#![warn(rust_2018_idioms)]

use std::str::FromStr;

use flexi_logger::LogSpecBuilder;
use futures::future::{select, Either};
use futures::pin_mut;
use futures::prelude::*;
use log::{error, info, warn, LevelFilter};

use tarot_server::{run, settings};

fn main() -> anyhow::Result<()> {
    let settings = settings::load()?;
    setup_logger(&settings.logging)?;
    info!("tarot server {}", tarot_game::GAME_VERSION);
    let signal_rx = setup_signal()?;
    let mut runtime = setup_runtime(&settings.runtime)?;

    let settings::Settings { server, game, .. } = settings;
    runtime.block_on(async move {
        let (shutdown_tx, shutdown_rx) = piper::chan(0);
        let table = tokio::spawn(async move {
            match run(server, game, shutdown_rx).await {
                Ok(stats) => info!(
                    "served {} connections in total",
                    stats.total_accepted_connections
                ),
                Err(e) => error!("server stopped: {}", e),
            }
        });
        // Ctrl-C closes the shutdown channel, which every task listens on.
        let signal = async move {
            signal_rx.recv().await;
            info!("sending shutdown notice");
            drop(shutdown_tx);
        };
        pin_mut!(signal);
        match select(signal, table).await {
            Either::Left((_, table)) => {
                if let Err(e) = table.await {
                    error!("server task: {}", e);
                }
            }
            // e.g. a bad bind address or a panic
            Either::Right((res, _)) => {
                error!("server stopped before any shutdown notice");
                if let Err(e) = res {
                    error!("server task: {}", e);
                }
            }
        };
    });
    info!("table closed");
    Ok(())
}

fn setup_logger(l: &settings::Logging) -> anyhow::Result<()> {
    let mut spec_builder = LogSpecBuilder::new();
    spec_builder.default(LevelFilter::from_str(&l.level)?);
    flexi_logger::Logger::with(spec_builder.build())
        .format(flexi_logger::colored_with_thread)
        .start()?;
    Ok(())
}

fn setup_signal() -> anyhow::Result<piper::Receiver<()>> {
    let (signal_tx, signal_rx) = piper::chan(2);
    ctrlc::set_handler(move || {
        info!("received interrupt signal");
        signal_tx.send(()).now_or_never();
    })?;
    Ok(signal_rx)
}

fn setup_runtime(r: &settings::Runtime) -> anyhow::Result<tokio::runtime::Runtime> {
    let mut builder = tokio::runtime::Builder::default();
    // tokio wants room for at least one blocking thread beyond the core ones
    let max_threads = if r.core_threads >= r.max_threads {
        warn!(
            "max_threads ({}) must exceed core_threads ({}); using {}",
            r.max_threads,
            r.core_threads,
            r.core_threads + 1
        );
        r.core_threads + 1
    } else {
        r.max_threads
    };
    builder
        .enable_all()
        .core_threads(r.core_threads)
        .max_threads(max_threads)
        .thread_name(&r.thread_name);
    if r.threaded {
        builder.threaded_scheduler();
    } else {
        builder.basic_scheduler();
    }
    Ok(builder.build()?)
}
