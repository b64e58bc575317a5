use std::sync::{Arc, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use bytes::Bytes;
use crossbeam_channel::{bounded, Receiver, Sender};
use tracing::debug;

use tcpframe_frame::{
    FrameConfig, FrameError, Message, MessageReader, MessageWriter, DEFAULT_MAX_FRAME, PREFIX_SIZE,
};
use tcpframe_transport::{ConnectionId, TcpConnection};

use crate::error::{HandlerError, Result};

/// Configuration for one connection handler, fixed at construction.
#[derive(Debug, Clone)]
pub struct HandlerConfig {
    /// Wall-clock budget per inbound message, from the start of its prefix
    /// read to the completion of assembly. `None` disables the budget.
    pub read_deadline: Option<Duration>,
    /// Number of worker threads started with the connection. Zero is valid:
    /// no workers run and something else must drain the inbound queue.
    pub worker_count: usize,
    /// Capacity of each of the inbound and outbound queues. Must be at
    /// least 1; lower values are clamped.
    pub queue_capacity: usize,
    /// Maximum accepted inbound message size, prefix included.
    pub max_frame_size: usize,
}

impl Default for HandlerConfig {
    fn default() -> Self {
        Self {
            read_deadline: Some(Duration::from_secs(30)),
            worker_count: 4,
            queue_capacity: 64,
            max_frame_size: DEFAULT_MAX_FRAME,
        }
    }
}

/// Join handles for the two pump loops of a started handler.
///
/// Each loop runs until its first error; the error is its final outcome and
/// surfaces here. Nothing restarts a dead loop — connection death is the
/// caller's signal to clean up and reconnect.
pub struct HandlerTask {
    reader: JoinHandle<Result<()>>,
    writer: JoinHandle<Result<()>>,
}

impl HandlerTask {
    /// Whether the read loop has terminated.
    pub fn reader_finished(&self) -> bool {
        self.reader.is_finished()
    }

    /// Whether the write loop has terminated.
    pub fn writer_finished(&self) -> bool {
        self.writer.is_finished()
    }

    /// Wait for the read loop and return its terminal outcome.
    ///
    /// Blocks until the loop ends, which for a healthy connection means
    /// until the peer closes or errors it.
    pub fn join_reader(self) -> Result<()> {
        self.reader
            .join()
            .unwrap_or(Err(HandlerError::LoopPanicked("read")))
    }

    /// Wait for both loops and return their terminal outcomes.
    pub fn join(self) -> (Result<()>, Result<()>) {
        let reader = self
            .reader
            .join()
            .unwrap_or(Err(HandlerError::LoopPanicked("read")));
        let writer = self
            .writer
            .join()
            .unwrap_or(Err(HandlerError::LoopPanicked("write")));
        (reader, writer)
    }
}

/// Pumps whole messages between one TCP connection and a pool of workers.
///
/// Owns a bounded inbound queue fed by a read loop and a bounded outbound
/// queue drained by a write loop. The queues are the only synchronization
/// points: the read loop is the sole reader of the connection, the write
/// loop its sole writer, and workers touch nothing but the queue accessors.
///
/// Construction takes configuration only; the connection and the processing
/// routine are supplied to [`start`](ConnectionHandler::start). One handler
/// serves exactly one connection for its lifetime.
pub struct ConnectionHandler {
    config: HandlerConfig,
    conn: OnceLock<ConnectionId>,
    inbound_tx: Sender<Message>,
    inbound_rx: Receiver<Message>,
    outbound_tx: Sender<Message>,
    outbound_rx: Receiver<Message>,
}

impl ConnectionHandler {
    /// Create a handler with the given configuration.
    pub fn new(mut config: HandlerConfig) -> Self {
        config.queue_capacity = config.queue_capacity.max(1);
        let (inbound_tx, inbound_rx) = bounded(config.queue_capacity);
        let (outbound_tx, outbound_rx) = bounded(config.queue_capacity);
        Self {
            config,
            conn: OnceLock::new(),
            inbound_tx,
            inbound_rx,
            outbound_tx,
            outbound_rx,
        }
    }

    /// Current handler configuration.
    pub fn config(&self) -> &HandlerConfig {
        &self.config
    }

    /// The connection this handler is bound to, once started.
    pub fn connection(&self) -> Option<ConnectionId> {
        self.conn.get().copied()
    }

    /// Bind the connection and start the read loop, the write loop, and the
    /// worker pool.
    ///
    /// Returns immediately; the returned [`HandlerTask`] carries the pump
    /// loops' terminal outcomes. Each worker thread invokes `routine` exactly
    /// once and is not supervised, restarted, or tracked afterwards — the
    /// routine is expected to run its own loop over
    /// [`recv`](ConnectionHandler::recv). Calling `start` twice on one
    /// handler is not guarded against.
    pub fn start<F>(&self, conn: TcpConnection, routine: F) -> Result<HandlerTask>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = conn.id();
        let _ = self.conn.set(id);

        let read_half = conn.try_clone()?;
        let write_half = conn;

        let routine = Arc::new(routine);
        for _ in 0..self.config.worker_count {
            let routine = Arc::clone(&routine);
            thread::spawn(move || routine());
        }
        debug!(
            peer = %id,
            workers = self.config.worker_count,
            capacity = self.config.queue_capacity,
            "connection handler started"
        );

        let frame_config = FrameConfig {
            max_frame_size: self.config.max_frame_size,
            read_deadline: self.config.read_deadline,
        };
        let inbound_tx = self.inbound_tx.clone();
        let reader = thread::spawn(move || read_loop(read_half, frame_config, id, inbound_tx));

        let outbound_rx = self.outbound_rx.clone();
        let writer = thread::spawn(move || write_loop(write_half, outbound_rx));

        Ok(HandlerTask { reader, writer })
    }

    /// Frame a payload and queue it for transmission.
    ///
    /// Blocks while the outbound queue is full.
    pub fn send(&self, payload: &[u8]) -> Result<()> {
        let total = PREFIX_SIZE + payload.len();
        if total > self.config.max_frame_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_frame_size.saturating_sub(PREFIX_SIZE),
            }
            .into());
        }

        let conn = self.connection().ok_or(HandlerError::NotStarted)?;
        let message = Message::from_payload(conn, payload)?;
        self.outbound_tx
            .send(message)
            .map_err(|_| HandlerError::QueueClosed)
    }

    /// Queue pre-framed wire bytes for transmission, verbatim.
    ///
    /// The bytes are written to the connection exactly as given; no prefix
    /// is added or checked. Blocks while the outbound queue is full.
    pub fn send_raw(&self, bytes: impl Into<Bytes>) -> Result<()> {
        let conn = self.connection().ok_or(HandlerError::NotStarted)?;
        let message = Message::new(conn, bytes);
        self.outbound_tx
            .send(message)
            .map_err(|_| HandlerError::QueueClosed)
    }

    /// Remove and return the next assembled inbound message.
    ///
    /// Blocks while the inbound queue is empty. FIFO relative to assembly
    /// completion order and to other `recv` calls.
    pub fn recv(&self) -> Result<Message> {
        self.inbound_rx.recv().map_err(|_| HandlerError::QueueClosed)
    }

    /// Number of assembled messages waiting in the inbound queue.
    pub fn pending_inbound(&self) -> usize {
        self.inbound_rx.len()
    }

    /// Number of messages waiting in the outbound queue.
    pub fn pending_outbound(&self) -> usize {
        self.outbound_rx.len()
    }
}

fn read_loop(
    conn: TcpConnection,
    config: FrameConfig,
    id: ConnectionId,
    queue: Sender<Message>,
) -> Result<()> {
    let mut reader = MessageReader::with_config(conn, config);
    loop {
        let bytes = reader.read_message()?;
        queue
            .send(Message::new(id, bytes))
            .map_err(|_| HandlerError::QueueClosed)?;
    }
}

fn write_loop(conn: TcpConnection, queue: Receiver<Message>) -> Result<()> {
    let mut writer = MessageWriter::new(conn);
    loop {
        let message = queue.recv().map_err(|_| HandlerError::QueueClosed)?;
        writer.write_message(&message)?;
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tcpframe_frame::encode_message;
    use tcpframe_transport::TcpAcceptor;

    use super::*;

    fn loopback() -> std::net::SocketAddr {
        "127.0.0.1:0".parse().expect("loopback addr should parse")
    }

    fn connected_pair(acceptor: &TcpAcceptor) -> (TcpConnection, TcpConnection) {
        let addr = acceptor.local_addr();
        let connector = thread::spawn(move || TcpAcceptor::connect(addr).unwrap());
        let server = acceptor.accept().unwrap();
        let client = connector.join().unwrap();
        (server, client)
    }

    fn wait_until(what: &str, cond: impl Fn() -> bool) {
        let give_up = Instant::now() + Duration::from_secs(5);
        while !cond() {
            assert!(Instant::now() < give_up, "timed out waiting: {what}");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn send_before_start_is_rejected() {
        let handler = ConnectionHandler::new(HandlerConfig::default());
        let err = handler.send(b"early").unwrap_err();
        assert!(matches!(err, HandlerError::NotStarted));
        assert!(handler.connection().is_none());
    }

    #[test]
    fn queue_capacity_is_clamped_to_one() {
        let handler = ConnectionHandler::new(HandlerConfig {
            queue_capacity: 0,
            ..HandlerConfig::default()
        });
        assert_eq!(handler.config().queue_capacity, 1);
    }

    #[test]
    fn inbound_messages_arrive_in_fifo_order() {
        let acceptor = TcpAcceptor::bind(loopback()).unwrap();
        let (server, client) = connected_pair(&acceptor);

        let handler = ConnectionHandler::new(HandlerConfig {
            worker_count: 0,
            ..HandlerConfig::default()
        });
        let _task = handler.start(server, || {}).unwrap();

        let feeder = thread::spawn(move || {
            let mut writer = MessageWriter::new(client);
            writer.send(b"first").unwrap();
            writer.send(b"second").unwrap();
            writer.send(b"third").unwrap();
            writer.into_inner()
        });

        assert_eq!(handler.recv().unwrap().payload(), b"first");
        assert_eq!(handler.recv().unwrap().payload(), b"second");
        assert_eq!(handler.recv().unwrap().payload(), b"third");

        let _client = feeder.join().unwrap();
    }

    #[test]
    fn outbound_messages_write_in_fifo_order() {
        let acceptor = TcpAcceptor::bind(loopback()).unwrap();
        let (server, client) = connected_pair(&acceptor);

        let handler = ConnectionHandler::new(HandlerConfig {
            worker_count: 0,
            ..HandlerConfig::default()
        });
        let _task = handler.start(server, || {}).unwrap();

        handler.send(b"a").unwrap();
        handler.send(b"bb").unwrap();
        handler.send(b"ccc").unwrap();

        let mut reader = MessageReader::new(client);
        assert_eq!(&reader.read_message().unwrap()[PREFIX_SIZE..], b"a");
        assert_eq!(&reader.read_message().unwrap()[PREFIX_SIZE..], b"bb");
        assert_eq!(&reader.read_message().unwrap()[PREFIX_SIZE..], b"ccc");
    }

    #[test]
    fn received_messages_carry_the_connection_identity() {
        let acceptor = TcpAcceptor::bind(loopback()).unwrap();
        let (server, client) = connected_pair(&acceptor);
        let peer = server.id();

        let handler = ConnectionHandler::new(HandlerConfig {
            worker_count: 0,
            ..HandlerConfig::default()
        });
        let _task = handler.start(server, || {}).unwrap();
        assert_eq!(handler.connection(), Some(peer));

        let mut writer = MessageWriter::new(client);
        writer.send(b"tagged").unwrap();

        let msg = handler.recv().unwrap();
        assert_eq!(msg.connection(), peer);
        assert_eq!(msg.payload(), b"tagged");
    }

    #[test]
    fn workers_drain_the_inbound_queue() {
        let acceptor = TcpAcceptor::bind(loopback()).unwrap();
        let (server, client) = connected_pair(&acceptor);

        let handler = Arc::new(ConnectionHandler::new(HandlerConfig {
            worker_count: 2,
            ..HandlerConfig::default()
        }));

        let (seen_tx, seen_rx) = crossbeam_channel::unbounded();
        let routine = {
            let handler = Arc::clone(&handler);
            move || {
                while let Ok(msg) = handler.recv() {
                    seen_tx.send(msg.payload().to_vec()).unwrap();
                }
            }
        };
        let _task = handler.start(server, routine).unwrap();

        let mut writer = MessageWriter::new(client);
        writer.send(b"x").unwrap();
        writer.send(b"y").unwrap();

        let mut got = vec![
            seen_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
            seen_rx.recv_timeout(Duration::from_secs(5)).unwrap(),
        ];
        got.sort();
        assert_eq!(got, vec![b"x".to_vec(), b"y".to_vec()]);
    }

    #[test]
    fn zero_workers_fill_the_queue_to_capacity() {
        let acceptor = TcpAcceptor::bind(loopback()).unwrap();
        let (server, client) = connected_pair(&acceptor);

        let handler = ConnectionHandler::new(HandlerConfig {
            worker_count: 0,
            queue_capacity: 2,
            read_deadline: None,
            ..HandlerConfig::default()
        });
        let _task = handler.start(server, || {}).unwrap();

        let feeder = thread::spawn(move || {
            let mut writer = MessageWriter::new(client);
            for i in 0..4u8 {
                writer.send(&[i]).unwrap();
            }
            writer.into_inner()
        });

        // With nothing draining, assembly stalls once the queue is full.
        wait_until("inbound queue full", || handler.pending_inbound() == 2);
        thread::sleep(Duration::from_millis(50));
        assert_eq!(handler.pending_inbound(), 2);

        // An external consumer still gets every message, in order.
        for i in 0..4u8 {
            assert_eq!(handler.recv().unwrap().payload(), &[i]);
        }

        let _client = feeder.join().unwrap();
    }

    #[test]
    fn stalled_peer_kills_the_read_loop_with_deadline_error() {
        let acceptor = TcpAcceptor::bind(loopback()).unwrap();
        let (server, mut client) = connected_pair(&acceptor);

        let handler = ConnectionHandler::new(HandlerConfig {
            worker_count: 0,
            read_deadline: Some(Duration::from_millis(50)),
            ..HandlerConfig::default()
        });
        let task = handler.start(server, || {}).unwrap();

        // Declare 16 bytes, deliver one body byte late, then stall.
        use std::io::Write;
        client.write_all(&[0x10, 0x00, 0x00, 0x00]).unwrap();
        thread::sleep(Duration::from_millis(120));
        client.write_all(&[0xAA]).unwrap();

        wait_until("read loop exit", || task.reader_finished());
        let err = task.join_reader().unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Frame(FrameError::DeadlineExceeded { .. })
        ));
        assert_eq!(handler.pending_inbound(), 0);
    }

    #[test]
    fn peer_close_kills_the_read_loop_with_connection_closed() {
        let acceptor = TcpAcceptor::bind(loopback()).unwrap();
        let (server, mut client) = connected_pair(&acceptor);

        let handler = ConnectionHandler::new(HandlerConfig {
            worker_count: 0,
            ..HandlerConfig::default()
        });
        let task = handler.start(server, || {}).unwrap();

        // Half a message, then drop the socket.
        use std::io::Write;
        client.write_all(&encode_message(b"never finished").unwrap()[..6]).unwrap();
        drop(client);

        wait_until("read loop exit", || task.reader_finished());
        let err = task.join_reader().unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Frame(FrameError::ConnectionClosed)
        ));
    }

    #[test]
    fn oversized_send_is_rejected_before_queueing() {
        let acceptor = TcpAcceptor::bind(loopback()).unwrap();
        let (server, _client) = connected_pair(&acceptor);

        let handler = ConnectionHandler::new(HandlerConfig {
            worker_count: 0,
            max_frame_size: 16,
            ..HandlerConfig::default()
        });
        let _task = handler.start(server, || {}).unwrap();

        let err = handler.send(&[0u8; 32]).unwrap_err();
        assert!(matches!(
            err,
            HandlerError::Frame(FrameError::PayloadTooLarge { .. })
        ));
        assert_eq!(handler.pending_outbound(), 0);
    }
}
