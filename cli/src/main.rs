//! Krait debug adapter binary.
//!
//! Serves the host protocol over stdio by default, or accepts host
//! connections on a TCP port with `--port`. Each connection gets its own
//! session controller backed by the demo engine.

use std::net::TcpListener;

use clap::Parser;
use color_eyre::eyre::WrapErr;
use log::{LevelFilter, info, warn};
use simple_logger::SimpleLogger;

use krait_debug::{AdapterServer, StdioTransport, TcpTransport};

mod demo;

use demo::DemoFactory;

#[derive(Debug, Parser)]
#[command(name = "krait", version, about = "Debug adapter for embedded scripts")]
struct Opt {
    /// Accept a host connection on this TCP port instead of serving stdio.
    #[arg(short, long)]
    port: Option<u16>,

    /// Increase log verbosity (-v debug, -vv trace). Logs go to stderr.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    let opt = Opt::parse();

    let level = match opt.verbose {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    SimpleLogger::new()
        .with_level(level)
        .init()
        .wrap_err("failed to initialize logging")?;

    match opt.port {
        Some(port) => serve_tcp(port),
        None => serve_stdio(),
    }
}

fn serve_stdio() -> color_eyre::Result<()> {
    let mut server = AdapterServer::new(DemoFactory);
    let mut transport = StdioTransport::new();
    server
        .serve(&mut transport)
        .wrap_err("stdio session failed")?;
    Ok(())
}

fn serve_tcp(port: u16) -> color_eyre::Result<()> {
    let listener = TcpListener::bind(("127.0.0.1", port))
        .wrap_err_with(|| format!("failed to bind 127.0.0.1:{port}"))?;
    info!("listening on 127.0.0.1:{port}");

    loop {
        let (stream, peer) = listener.accept().wrap_err("failed to accept connection")?;
        info!("host connected from {peer}");

        // One controller per connection; a dropped host must not leave a
        // session behind for the next one.
        let mut server = AdapterServer::new(DemoFactory);
        match TcpTransport::new(stream) {
            Ok(mut transport) => {
                if let Err(err) = server.serve(&mut transport) {
                    warn!("connection ended with error: {err}");
                }
            }
            Err(err) => warn!("failed to set up connection: {err}"),
        }
        info!("host disconnected");
    }
}
