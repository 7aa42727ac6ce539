//! WebSocket presented as a byte stream
//!
//! Device tunnels (SSH, log streaming, TCP connect) are WebSockets whose
//! frames carry an opaque byte stream. [`TunnelConnection`] implements
//! `AsyncRead`/`AsyncWrite` over such a socket so it can be handed to
//! anything that expects a plain connection. A cloneable [`TunnelHandle`]
//! controls deadlines and closing from other tasks.

use std::fmt;
use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{ready, Context, Poll, Waker};

use bytes::{Buf, Bytes};
use futures::{Sink, Stream};
use parking_lot::Mutex;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::time::{Instant, Sleep};
use tokio_tungstenite::tungstenite::{Error as WsError, Message};

/// Largest payload written in a single binary frame
pub const MAX_FRAME_SIZE: usize = 32 * 1024;

fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::NotConnected, "tunnel connection closed")
}

fn timed_out(direction: &str) -> io::Error {
    io::Error::new(io::ErrorKind::TimedOut, format!("tunnel {direction} deadline exceeded"))
}

fn into_io_error(err: WsError) -> io::Error {
    match err {
        WsError::Io(err) => err,
        WsError::ConnectionClosed | WsError::AlreadyClosed => closed_error(),
        other => io::Error::other(other),
    }
}

#[derive(Debug, Default)]
struct State {
    closed: bool,
    read_deadline: Option<Instant>,
    write_deadline: Option<Instant>,
    read_waker: Option<Waker>,
    write_waker: Option<Waker>,
}

impl State {
    fn wake_all(&mut self) {
        if let Some(waker) = self.read_waker.take() {
            waker.wake();
        }
        if let Some(waker) = self.write_waker.take() {
            waker.wake();
        }
    }
}

#[derive(Debug)]
struct Shared {
    state: Mutex<State>,
    local_addr: Option<SocketAddr>,
    peer_addr: Option<SocketAddr>,
}

/// Control side of a [`TunnelConnection`].
///
/// Cheap to clone; every clone refers to the same connection.
#[derive(Debug, Clone)]
pub struct TunnelHandle {
    shared: Arc<Shared>,
}

impl TunnelHandle {
    /// Close the tunnel. Idempotent.
    ///
    /// Pending and future reads and writes fail with
    /// [`io::ErrorKind::NotConnected`]. The close frame goes out the next
    /// time the connection is polled.
    pub fn close(&self) {
        let mut state = self.shared.state.lock();
        if !state.closed {
            state.closed = true;
            state.wake_all();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.shared.state.lock().closed
    }

    /// Set both read and write deadlines. `None` clears them.
    ///
    /// # Errors
    ///
    /// Fails with [`io::ErrorKind::NotConnected`] once the tunnel is closed.
    pub fn set_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.update(|state| {
            state.read_deadline = deadline;
            state.write_deadline = deadline;
        })
    }

    /// # Errors
    ///
    /// Fails with [`io::ErrorKind::NotConnected`] once the tunnel is closed.
    pub fn set_read_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.update(|state| state.read_deadline = deadline)
    }

    /// # Errors
    ///
    /// Fails with [`io::ErrorKind::NotConnected`] once the tunnel is closed.
    pub fn set_write_deadline(&self, deadline: Option<Instant>) -> io::Result<()> {
        self.update(|state| state.write_deadline = deadline)
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.shared.local_addr
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.shared.peer_addr
    }

    // Pending I/O is woken so it re-arms against the new deadline.
    fn update(&self, apply: impl FnOnce(&mut State)) -> io::Result<()> {
        let mut state = self.shared.state.lock();
        if state.closed {
            return Err(closed_error());
        }
        apply(&mut state);
        state.wake_all();
        Ok(())
    }

    /// Store the waker for the given direction and return that direction's
    /// deadline, or `None` in the outer option once closed.
    fn register(&self, direction: Direction, waker: &Waker) -> Option<Option<Instant>> {
        let mut guard = self.shared.state.lock();
        let state = &mut *guard;
        if state.closed {
            return None;
        }
        let (slot, deadline) = match direction {
            Direction::Read => (&mut state.read_waker, state.read_deadline),
            Direction::Write => (&mut state.write_waker, state.write_deadline),
        };
        match slot {
            Some(existing) if existing.will_wake(waker) => {}
            _ => *slot = Some(waker.clone()),
        }
        Some(deadline)
    }
}

#[derive(Debug, Clone, Copy)]
enum Direction {
    Read,
    Write,
}

/// A timer that can be re-armed as deadlines change.
#[derive(Default)]
struct DeadlineTimer {
    sleep: Option<Pin<Box<Sleep>>>,
}

impl DeadlineTimer {
    /// Ready once `deadline` has passed; registers the waker otherwise.
    fn poll_expired(&mut self, deadline: Option<Instant>, cx: &mut Context<'_>) -> bool {
        let Some(at) = deadline else {
            self.sleep = None;
            return false;
        };
        if Instant::now() >= at {
            return true;
        }
        let sleep = self.sleep.get_or_insert_with(|| Box::pin(tokio::time::sleep_until(at)));
        if sleep.deadline() != at {
            sleep.as_mut().reset(at);
        }
        sleep.as_mut().poll(cx).is_ready()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteState {
    Idle,
    /// A frame of this many bytes was queued for the current write
    Flushing(usize),
    /// A frame queued by a write that timed out. It is flushed before the
    /// next frame and never counted towards a later write.
    Abandoned,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CloseState {
    Open,
    Closing,
    Closed,
}

/// Byte stream over a WebSocket.
///
/// Reads drain one frame at a time; binary and text frames carry payload,
/// ping and pong frames are skipped and a close frame reads as EOF. Every
/// write becomes one binary frame of at most [`MAX_FRAME_SIZE`] bytes,
/// flushed before the write completes.
pub struct TunnelConnection<S> {
    socket: S,
    handle: TunnelHandle,
    read_buf: Bytes,
    read_eof: bool,
    read_timer: DeadlineTimer,
    write_timer: DeadlineTimer,
    write_state: WriteState,
    close_state: CloseState,
}

impl<S> fmt::Debug for TunnelConnection<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TunnelConnection")
            .field("local_addr", &self.handle.local_addr())
            .field("peer_addr", &self.handle.peer_addr())
            .field("buffered", &self.read_buf.len())
            .field("read_eof", &self.read_eof)
            .field("close_state", &self.close_state)
            .finish_non_exhaustive()
    }
}

impl<S> TunnelConnection<S>
where
    S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
{
    /// Wrap an established socket. Addresses are reported as given.
    pub fn new(socket: S, local_addr: Option<SocketAddr>, peer_addr: Option<SocketAddr>) -> Self {
        let shared =
            Arc::new(Shared { state: Mutex::new(State::default()), local_addr, peer_addr });
        Self {
            socket,
            handle: TunnelHandle { shared },
            read_buf: Bytes::new(),
            read_eof: false,
            read_timer: DeadlineTimer::default(),
            write_timer: DeadlineTimer::default(),
            write_state: WriteState::Idle,
            close_state: CloseState::Open,
        }
    }

    /// Control handle sharing this connection's state
    pub fn handle(&self) -> TunnelHandle {
        self.handle.clone()
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.handle.local_addr()
    }

    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.handle.peer_addr()
    }

    /// Close the tunnel and wait for the close frame to be flushed.
    ///
    /// # Errors
    ///
    /// Returns the socket error if the close frame could not be sent.
    pub async fn close(&mut self) -> io::Result<()> {
        self.handle.close();
        std::future::poll_fn(|cx| self.poll_close_socket(cx)).await
    }

    /// Send the close frame once, however the close was requested.
    fn poll_close_socket(&mut self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        if self.close_state == CloseState::Closed {
            return Poll::Ready(Ok(()));
        }
        self.close_state = CloseState::Closing;
        let result = ready!(Pin::new(&mut self.socket).poll_close(cx));
        self.close_state = CloseState::Closed;
        match result {
            Ok(()) | Err(WsError::ConnectionClosed | WsError::AlreadyClosed) => Poll::Ready(Ok(())),
            Err(err) => Poll::Ready(Err(into_io_error(err))),
        }
    }

    /// Finish closing after a close through the handle, then report the
    /// connection as gone.
    fn poll_closed_error(&mut self, cx: &mut Context<'_>) -> Poll<io::Error> {
        // The close frame is best effort here; the caller only needs to learn
        // that the tunnel is gone.
        let _ = ready!(self.poll_close_socket(cx));
        Poll::Ready(closed_error())
    }
}

impl<S> AsyncRead for TunnelConnection<S>
where
    S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
{
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        loop {
            let Some(deadline) = this.handle.register(Direction::Read, cx.waker()) else {
                return this.poll_closed_error(cx).map(Err);
            };

            if !this.read_buf.is_empty() {
                let n = this.read_buf.len().min(buf.remaining());
                buf.put_slice(&this.read_buf[..n]);
                this.read_buf.advance(n);
                return Poll::Ready(Ok(()));
            }
            if this.read_eof {
                return Poll::Ready(Ok(()));
            }
            if this.read_timer.poll_expired(deadline, cx) {
                return Poll::Ready(Err(timed_out("read")));
            }

            match ready!(Pin::new(&mut this.socket).poll_next(cx)) {
                Some(Ok(Message::Binary(data))) => this.read_buf = data,
                Some(Ok(Message::Text(text))) => this.read_buf = Bytes::from(text),
                Some(Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_))) => {}
                Some(Ok(Message::Close(_))) | None => this.read_eof = true,
                Some(Err(WsError::ConnectionClosed | WsError::AlreadyClosed)) => {
                    this.read_eof = true;
                }
                Some(Err(err)) => return Poll::Ready(Err(into_io_error(err))),
            }
        }
    }
}

impl<S> AsyncWrite for TunnelConnection<S>
where
    S: Stream<Item = Result<Message, WsError>> + Sink<Message, Error = WsError> + Unpin,
{
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        let this = self.get_mut();
        let Some(deadline) = this.handle.register(Direction::Write, cx.waker()) else {
            return this.poll_closed_error(cx).map(Err);
        };
        if this.write_timer.poll_expired(deadline, cx) {
            if let WriteState::Flushing(_) = this.write_state {
                this.write_state = WriteState::Abandoned;
            }
            return Poll::Ready(Err(timed_out("write")));
        }

        if this.write_state == WriteState::Abandoned {
            let flushed = ready!(Pin::new(&mut this.socket).poll_flush(cx));
            this.write_state = WriteState::Idle;
            flushed.map_err(into_io_error)?;
        }

        if this.write_state == WriteState::Idle {
            if buf.is_empty() {
                return Poll::Ready(Ok(0));
            }
            ready!(Pin::new(&mut this.socket).poll_ready(cx)).map_err(into_io_error)?;
            let n = buf.len().min(MAX_FRAME_SIZE);
            let frame = Message::Binary(Bytes::copy_from_slice(&buf[..n]));
            Pin::new(&mut this.socket).start_send(frame).map_err(into_io_error)?;
            this.write_state = WriteState::Flushing(n);
        }

        let WriteState::Flushing(n) = this.write_state else {
            return Poll::Ready(Ok(0));
        };
        let flushed = ready!(Pin::new(&mut this.socket).poll_flush(cx));
        this.write_state = WriteState::Idle;
        flushed.map_err(into_io_error)?;
        Poll::Ready(Ok(n))
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        if this.handle.is_closed() {
            return this.poll_closed_error(cx).map(Err);
        }
        Pin::new(&mut this.socket).poll_flush(cx).map_err(into_io_error)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        let this = self.get_mut();
        this.handle.close();
        this.poll_close_socket(cx)
    }
}
