use crate::config::TransportKind;
use crate::history::DetectionRecord;
use crate::protocol::{
    BACKEND_TO_UI_CAP, ClientEnvelope, decode_detection, read_frame, write_envelope,
};
use std::fmt;
use std::io::{self, Read, Write};
use std::net::TcpStream;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub enum TransportEvent {
    Connected,
    Disconnected,
    Detection(DetectionRecord),
}

pub type LinkHalves = (Box<dyn Read + Send>, Box<dyn Write + Send>);

pub trait Connector {
    fn connect(&mut self) -> io::Result<LinkHalves>;

    fn reconnects(&self) -> bool;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub struct TcpConnector {
    addr: String,
}

impl TcpConnector {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }
}

impl Connector for TcpConnector {
    fn connect(&mut self) -> io::Result<LinkHalves> {
        let stream = TcpStream::connect(self.addr.as_str())?;
        stream.set_nodelay(true)?;
        let reader = stream.try_clone()?;
        Ok((Box::new(reader), Box::new(stream)))
    }

    fn reconnects(&self) -> bool {
        true
    }

    fn describe(&self) -> String {
        format!("tcp://{}", self.addr)
    }
}

/// Single session over stdin/stdout, for a backend that spawns the UI as a
/// child process. Once stdin closes the session is over.
#[derive(Debug, Default)]
pub struct StdioConnector {
    used: bool,
}

impl Connector for StdioConnector {
    fn connect(&mut self) -> io::Result<LinkHalves> {
        if self.used {
            return Err(io::Error::new(
                io::ErrorKind::NotConnected,
                "stdio link already consumed",
            ));
        }

        self.used = true;
        Ok((Box::new(io::stdin()), Box::new(io::stdout())))
    }

    fn reconnects(&self) -> bool {
        false
    }

    fn describe(&self) -> String {
        "stdio".to_string()
    }
}

pub fn connector_for(kind: &TransportKind) -> Box<dyn Connector + Send> {
    match kind {
        TransportKind::Tcp { addr } => Box::new(TcpConnector::new(addr.clone())),
        TransportKind::Stdio => Box::new(StdioConnector::default()),
    }
}

/// Write half of whichever link is currently up. Empty while disconnected.
#[derive(Clone, Default)]
pub struct LinkWriter {
    inner: Arc<Mutex<Option<Box<dyn Write + Send>>>>,
}

impl fmt::Debug for LinkWriter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkWriter")
            .field("attached", &self.is_attached())
            .finish()
    }
}

impl LinkWriter {
    pub fn is_attached(&self) -> bool {
        self.inner.lock().map(|slot| slot.is_some()).unwrap_or(false)
    }

    /// Returns `Ok(false)` when no link is attached and nothing was written.
    pub fn send(&self, envelope: &ClientEnvelope) -> io::Result<bool> {
        let mut slot = self
            .inner
            .lock()
            .map_err(|_| io::Error::other("link writer lock poisoned"))?;

        match slot.as_mut() {
            Some(writer) => {
                write_envelope(writer, envelope)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn attach(&self, writer: Box<dyn Write + Send>) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = Some(writer);
        }
    }

    fn detach(&self) {
        if let Ok(mut slot) = self.inner.lock() {
            *slot = None;
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutboundQueue {
    tx: SyncSender<ClientEnvelope>,
    dropped: Arc<AtomicU64>,
    capacity: usize,
}

impl OutboundQueue {
    pub fn bounded(capacity: usize) -> (Self, Receiver<ClientEnvelope>) {
        let (tx, rx) = mpsc::sync_channel(capacity);
        let queue = Self {
            tx,
            dropped: Arc::new(AtomicU64::new(0)),
            capacity,
        };
        (queue, rx)
    }

    /// Fire-and-forget: a full queue drops the message.
    pub fn send(&self, envelope: ClientEnvelope) -> bool {
        match self.tx.try_send(envelope) {
            Ok(()) => true,
            Err(TrySendError::Full(_envelope)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 || dropped.is_power_of_two() {
                    warn!(
                        capacity = self.capacity,
                        dropped, "outbound queue full; dropping message"
                    );
                }
                false
            }
            Err(TrySendError::Disconnected(envelope)) => {
                warn!(?envelope, "outbound writer stopped; dropping message");
                false
            }
        }
    }

    #[cfg(test)]
    fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

pub fn writer_loop(rx: Receiver<ClientEnvelope>, link: LinkWriter) {
    for envelope in rx {
        match link.send(&envelope) {
            Ok(true) => {}
            Ok(false) => debug!(?envelope, "backend offline; dropping outbound message"),
            Err(err) => warn!(%err, ?envelope, "failed to write outbound message"),
        }
    }
}

/// Reads frames until EOF, handing every well-formed detection to
/// `on_detection`. Malformed messages are logged and skipped.
pub fn reader_loop<F>(reader: &mut impl Read, mut on_detection: F) -> io::Result<()>
where
    F: FnMut(DetectionRecord),
{
    loop {
        match read_frame(reader, BACKEND_TO_UI_CAP) {
            Ok(payload) => match decode_detection(&payload) {
                Ok(record) => on_detection(record),
                Err(err) => warn!(%err, "dropping malformed backend message"),
            },
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err),
        }
    }
}

/// Keeps one link to the backend alive until `shutdown` is raised or the
/// connector gives up. `Disconnected` only follows a `Connected`.
pub fn run_link<C, F>(
    connector: &mut C,
    link: &LinkWriter,
    hello: &ClientEnvelope,
    reconnect_delay: Duration,
    shutdown: &AtomicBool,
    mut on_event: F,
) where
    C: Connector + ?Sized,
    F: FnMut(TransportEvent),
{
    let target = connector.describe();

    loop {
        if shutdown.load(Ordering::Acquire) {
            return;
        }

        match connector.connect() {
            Ok((mut reader, mut writer)) => match write_envelope(&mut writer, hello) {
                Ok(()) => {
                    link.attach(writer);
                    info!(%target, "connected to backend");
                    on_event(TransportEvent::Connected);

                    let outcome = reader_loop(&mut reader, |record| {
                        on_event(TransportEvent::Detection(record))
                    });

                    link.detach();
                    match outcome {
                        Ok(()) => info!(%target, "backend closed the link"),
                        Err(err) => warn!(%target, %err, "backend link failed"),
                    }
                    on_event(TransportEvent::Disconnected);
                }
                Err(err) => warn!(%target, %err, "handshake with backend failed"),
            },
            Err(err) => debug!(%target, %err, "backend unreachable"),
        }

        if !connector.reconnects() || shutdown.load(Ordering::Acquire) {
            return;
        }

        thread::sleep(reconnect_delay);
    }
}
