use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::{TcpListener, TcpStream};
use tokio_rustls::TlsAcceptor;
use tracing::info;

use crate::capsule::Registry;
use crate::config::Config;
use crate::dispatch::Dispatcher;
use crate::files::StaticFiles;
use crate::gemini::connection::Connection;
use crate::server::pool::WorkerPool;
use crate::server::tls;

/// Pause after a failed accept, so errors such as running out of file
/// descriptors do not turn the loop into a busy spin.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// How accepted sockets are wrapped before the request is read.
#[derive(Clone)]
pub enum Transport {
    Tls(TlsAcceptor),
    /// Unencrypted, for use behind a TLS-terminating proxy
    Plain,
}

pub struct Server {
    listener: TcpListener,
    transport: Transport,
    pool: WorkerPool,
    dispatcher: Arc<Dispatcher>,
    read_timeout: Option<Duration>,
}

impl Server {
    /// Binds the socket, sets up TLS and builds the worker pool.
    pub async fn init(cfg: &Config, registry: Registry) -> anyhow::Result<Self> {
        let addr = cfg.server.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .with_context(|| format!("cannot bind {addr}"))?;
        info!("Listening on {}", addr);

        let acceptor = tls::acceptor(&cfg.tls)?;

        let files = StaticFiles::from_root(cfg.server.document_root.as_deref());
        match &files {
            Some(files) => info!("Serving documents from '{}'", files.root().display()),
            None => info!("No document root configured, static serving disabled"),
        }
        if let Some(hostname) = cfg.server.virtual_host() {
            info!("Accepting requests for host '{}'", hostname);
        }

        info!(
            min = cfg.workers.min,
            max = cfg.workers.max,
            "Initializing worker pool"
        );

        let dispatcher = Dispatcher::new(cfg.server.virtual_host().map(str::to_string), registry, files);

        Ok(Self::new(
            listener,
            Transport::Tls(acceptor),
            WorkerPool::new(cfg.workers.max),
            dispatcher,
        )
        .with_read_timeout(cfg.server.read_timeout()))
    }

    pub fn new(
        listener: TcpListener,
        transport: Transport,
        pool: WorkerPool,
        dispatcher: Dispatcher,
    ) -> Self {
        Self {
            listener,
            transport,
            pool,
            dispatcher: Arc::new(dispatcher),
            read_timeout: None,
        }
    }

    pub fn with_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.read_timeout = timeout;
        self
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Accepts connections one at a time and hands each to the pool.
    ///
    /// Waits for a free worker before accepting the next connection. Accept
    /// errors are logged and skipped; this only returns if the pool is closed.
    pub async fn run(self) -> anyhow::Result<()> {
        info!("Starting Gemini server");

        loop {
            let (socket, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                    tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                    continue;
                }
            };
            info!(peer = %peer, "Accepted connection");

            let transport = self.transport.clone();
            let dispatcher = Arc::clone(&self.dispatcher);
            let read_timeout = self.read_timeout;

            self.pool
                .submit(async move {
                    if let Err(e) = serve(socket, transport, dispatcher, read_timeout).await {
                        tracing::error!(peer = %peer, error = %e, "Connection error");
                    }
                })
                .await
                .context("worker pool closed")?;
        }
    }
}

/// Runs one connection to completion on the current task.
async fn serve(
    socket: TcpStream,
    transport: Transport,
    dispatcher: Arc<Dispatcher>,
    read_timeout: Option<Duration>,
) -> anyhow::Result<()> {
    match transport {
        Transport::Plain => handle(socket, dispatcher, read_timeout).await,
        Transport::Tls(acceptor) => {
            let handshake = acceptor.accept(socket);
            let stream = match read_timeout {
                Some(timeout) => tokio::time::timeout(timeout, handshake)
                    .await
                    .context("TLS handshake timed out")?,
                None => handshake.await,
            }
            .context("TLS handshake failed")?;
            handle(stream, dispatcher, read_timeout).await
        }
    }
}

async fn handle<S>(
    stream: S,
    dispatcher: Arc<Dispatcher>,
    read_timeout: Option<Duration>,
) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut connection = Connection::new(stream, dispatcher).with_read_timeout(read_timeout);
    connection.run().await
}
