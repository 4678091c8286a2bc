//! A minimal TLS echo client/server: negotiates a connection, prints the
//! parameters it settled on, then proxies stdin to the connection and the
//! connection's application data back out to stdout until either side closes.

use std::io::{self, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tls::config::Config;
use tls::connection::{Connection, Poll, TransportContext};
use tls::{CipherSuite, ServerName, TLSError};

#[derive(Parser, Debug)]
#[command(name = "echo")]
#[command(version, about = "Negotiate a TLS connection and proxy stdin/stdout through it", long_about = None)]
struct Arguments {
    #[command(subcommand)]
    mode: Mode,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Connect to a TLS server.
    Client {
        host: String,
        #[arg(long, default_value_t = 443)]
        port: u16,
    },
    /// Accept a single TLS connection.
    Server {
        #[arg(long, default_value_t = 443)]
        port: u16,
    },
}

/// A non-blocking [TransportContext] over a [TcpStream].
struct TcpTransport(TcpStream);

impl TransportContext for TcpTransport {
    fn recv(&mut self, buf: &mut [u8]) -> Result<usize, TLSError> {
        match self.0.read(buf) {
            Ok(n) => Ok(n),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(err) => Err(err.kind().into()),
        }
    }

    fn send(&mut self, buf: &[u8]) -> Result<usize, TLSError> {
        match self.0.write(buf) {
            Ok(n) => Ok(n),
            Err(err) if err.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(err) => Err(err.kind().into()),
        }
    }
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let arguments = Arguments::parse();
    let result = match arguments.mode {
        Mode::Client { host, port } => run_client(&host, port),
        Mode::Server { port } => run_server(port),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("{err}");
            ExitCode::FAILURE
        },
    }
}

fn run_client(host: &str, port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let stream = TcpStream::connect((host, port))?;
    stream.set_nonblocking(true)?;
    let mut transport = TcpTransport(stream);

    let config = Config::builder()
        .cipher_suites(vec![
            CipherSuite::TLS_AES_128_GCM_SHA256,
            CipherSuite::TLS_ECDHE_RSA_WITH_AES_128_GCM_SHA256,
            CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA,
        ])
        .build();

    let mut connection = Connection::client(config, ServerName::from(host.to_owned()));
    negotiate(&mut connection, &mut transport)?;
    echo(&mut connection, &mut transport)
}

fn run_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind(("0.0.0.0", port))?;
    log::info!("listening on port {port}");

    let (stream, peer) = listener.accept()?;
    log::info!("accepted connection from {peer}");
    stream.set_nonblocking(true)?;
    let mut transport = TcpTransport(stream);

    let config = Config::builder()
        .cipher_suites(vec![CipherSuite::TLS_AES_128_GCM_SHA256, CipherSuite::TLS_RSA_WITH_AES_128_CBC_SHA])
        .build();

    let mut connection = Connection::server(config);
    negotiate(&mut connection, &mut transport)?;
    echo(&mut connection, &mut transport)
}

/// Drives the handshake to completion, spinning gently while the transport
/// has nothing to offer yet.
fn negotiate(connection: &mut Connection, transport: &mut TcpTransport) -> Result<(), Box<dyn std::error::Error>> {
    loop {
        match connection.poll_handshake(transport) {
            Poll::Ready(()) => {
                log::info!("handshake complete");
                return Ok(());
            },
            Poll::BlockedOnRead | Poll::BlockedOnWrite | Poll::BlockedOnAppCallback => {
                std::thread::sleep(Duration::from_millis(10));
            },
            Poll::Err(err) => return Err(Box::new(err)),
        }
    }
}

/// Proxies stdin to the connection and the connection's application data to
/// stdout, until the peer closes the connection or stdin reaches EOF.
fn echo(connection: &mut Connection, transport: &mut TcpTransport) -> Result<(), Box<dyn std::error::Error>> {
    let mut stdin_buffer = [0u8; 4096];
    let mut recv_buffer = [0u8; 4096];
    let mut stdin_closed = false;

    loop {
        if let Some(alert) = connection.take_incoming_alert() {
            log::info!("received alert: {alert:?}");
            return Ok(());
        }

        if !stdin_closed {
            match io::stdin().read(&mut stdin_buffer) {
                Ok(0) => stdin_closed = true,
                Ok(n) => {
                    if let Poll::Err(err) = connection.send(&stdin_buffer[..n], transport) {
                        return Err(Box::new(err));
                    }
                },
                Err(err) if err.kind() == io::ErrorKind::WouldBlock => {},
                Err(err) => return Err(Box::new(err)),
            }
        }

        match connection.recv(&mut recv_buffer, transport) {
            Poll::Ready(n) => io::stdout().write_all(&recv_buffer[..n])?,
            Poll::BlockedOnRead | Poll::BlockedOnWrite | Poll::BlockedOnAppCallback => {
                if stdin_closed {
                    return match connection.shutdown(transport) {
                        Poll::Ready(()) => Ok(()),
                        Poll::Err(err) => Err(Box::new(err) as Box<dyn std::error::Error>),
                        _ => Ok(()),
                    };
                }
                std::thread::sleep(Duration::from_millis(10));
            },
            Poll::Err(err) => return Err(Box::new(err)),
        }
    }
}
