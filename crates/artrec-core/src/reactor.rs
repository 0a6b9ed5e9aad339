//! Socket loop driving a [`Session`].
//!
//! One task owns the session and multiplexes three inputs: inbound
//! datagrams, the playback tick and control commands. Nothing else touches
//! the session while the loop runs.

use std::io;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use tokio::net::UdpSocket;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, MissedTickBehavior};
use tracing::{info, trace};

use crate::config::Config;
use crate::engine::{ControlState, Session, SessionError, report_error};
use crate::{MergeMode, Mode};

/// Large enough for any Ethernet datagram; oversize ArtDMX is rejected by
/// the codec.
const RECV_BUFFER_LEN: usize = 1500;

/// Commands accepted from the control surface.
#[derive(Debug)]
pub enum Control {
    SetMode(Mode),
    SelectTimeline(String),
    SetMergeMode(MergeMode),
    SetLoop(bool),
    /// Reply with the current control state.
    Status(oneshot::Sender<ControlState>),
    Shutdown,
}

#[derive(Debug)]
pub struct Reactor {
    socket: UdpSocket,
    target: SocketAddr,
    tick: Duration,
}

impl Reactor {
    /// Bind the configured listen address with broadcast enabled.
    pub async fn bind(config: &Config) -> Result<Self, SessionError> {
        Self::bind_to(
            config.bind_addr(),
            config.broadcast_addr(),
            config.packet_delay(),
        )
        .await
    }

    pub async fn bind_to(
        local: SocketAddr,
        target: SocketAddr,
        tick: Duration,
    ) -> Result<Self, SessionError> {
        let socket = UdpSocket::bind(local).await?;
        socket.set_broadcast(true)?;
        info!(local = %socket.local_addr()?, %target, "socket bound");
        Ok(Self {
            socket,
            target,
            tick,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Run until `Shutdown`, the control channel closing, or a transport
    /// failure.
    ///
    /// The session is left Idle and disconnected on return.
    pub async fn run(
        self,
        session: &mut Session,
        mut control: mpsc::Receiver<Control>,
    ) -> Result<(), SessionError> {
        let mut buf = vec![0u8; RECV_BUFFER_LEN];
        let mut ticker = time::interval(self.tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        session.set_connected(true);

        let result = loop {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => {
                        trace!(%peer, len, "datagram received");
                        session.handle_datagram(&buf[..len], Instant::now());
                    }
                    Err(err) => break Err(SessionError::Transport(err)),
                },
                _ = ticker.tick() => {
                    if let Some(packet) = session.tick(Instant::now()) {
                        if let Err(err) = self.socket.send_to(&packet, self.target).await {
                            break Err(SessionError::Transport(err));
                        }
                    }
                }
                command = control.recv() => match command {
                    Some(Control::Shutdown) | None => break Ok(()),
                    Some(command) => apply(session, command),
                },
            }
        };

        if let Err(err) = &result {
            report_error("run", err);
        }
        session.shutdown();
        info!("reactor stopped");
        result
    }
}

fn apply(session: &mut Session, command: Control) {
    match command {
        Control::SetMode(mode) => {
            session.set_mode(mode, Instant::now());
        }
        Control::SelectTimeline(name) => session.select_timeline(name),
        Control::SetMergeMode(mode) => session.set_merge_mode(mode),
        Control::SetLoop(enabled) => session.set_loop(enabled),
        Control::Status(reply) => {
            // The requester may have given up waiting.
            let _ = reply.send(session.control_state());
        }
        Control::Shutdown => {}
    }
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::net::SocketAddr;
    use std::time::Duration;

    use tokio::net::UdpSocket;
    use tokio::sync::{mpsc, oneshot};

    use super::{Control, Reactor};
    use crate::config::Config;
    use crate::engine::{Session, SessionError};
    use crate::protocols::artnet::{PortAddress, decode, encode};
    use crate::workdir::WorkDir;
    use crate::{ControlState, Mode};

    fn loopback() -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }

    fn session(dir: &tempfile::TempDir) -> Session {
        let config = Config {
            max_dmx_address: 4,
            working_dir: dir.path().to_path_buf(),
            ..Config::default()
        };
        Session::new(config, WorkDir::open(dir.path()).unwrap()).unwrap()
    }

    async fn status(tx: &mpsc::Sender<Control>) -> ControlState {
        let (reply, rx) = oneshot::channel();
        tx.send(Control::Status(reply)).await.unwrap();
        rx.await.unwrap()
    }

    #[tokio::test]
    async fn inbound_frames_reach_the_session() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        let peer = UdpSocket::bind(loopback()).await.unwrap();
        let reactor = Reactor::bind_to(
            loopback(),
            peer.local_addr().unwrap(),
            Duration::from_millis(5),
        )
        .await
        .unwrap();
        let addr = reactor.local_addr().unwrap();
        let (tx, rx) = mpsc::channel(8);

        let driver = async {
            let packet = encode(PortAddress::default(), &[200, 0, 7]).unwrap();
            peer.send_to(&packet, addr).await.unwrap();
            tokio::time::sleep(Duration::from_millis(50)).await;
            let state = status(&tx).await;
            tx.send(Control::Shutdown).await.unwrap();
            state
        };
        let (result, state) = tokio::join!(reactor.run(&mut session, rx), driver);

        result.unwrap();
        assert!(state.connected);
        assert_eq!(session.buffer().get(1), Some(200));
        assert_eq!(session.buffer().get(3), Some(7));
        assert!(!session.control_state().connected);
    }

    #[tokio::test]
    async fn playback_is_broadcast_to_target() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("show.jsonl"),
            "{\"0\":[{\"channel\":2,\"value\":42}]}\n",
        )
        .unwrap();
        let mut session = session(&dir);
        let target = UdpSocket::bind(loopback()).await.unwrap();
        let reactor = Reactor::bind_to(
            loopback(),
            target.local_addr().unwrap(),
            Duration::from_millis(5),
        )
        .await
        .unwrap();
        let (tx, rx) = mpsc::channel(8);

        let driver = async {
            tx.send(Control::SelectTimeline("show.jsonl".to_string()))
                .await
                .unwrap();
            tx.send(Control::SetMode(Mode::Playback)).await.unwrap();
            let mut buf = [0u8; 600];
            let (len, _) = tokio::time::timeout(Duration::from_secs(2), target.recv_from(&mut buf))
                .await
                .expect("playback frame")
                .unwrap();
            tx.send(Control::Shutdown).await.unwrap();
            buf[..len].to_vec()
        };
        let (result, packet) = tokio::join!(reactor.run(&mut session, rx), driver);

        result.unwrap();
        let frame = decode(&packet).unwrap();
        assert_eq!(frame.data, vec![0, 42, 0, 0]);
        assert_eq!(session.mode(), Mode::Idle);
    }

    #[tokio::test]
    async fn send_failure_disconnects_and_stops() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("show.jsonl"),
            "{\"0\":[{\"channel\":1,\"value\":9}]}\n",
        )
        .unwrap();
        let mut session = session(&dir);
        session.select_timeline("show.jsonl");
        // An IPv4 socket cannot send to an IPv6 destination.
        let unreachable = SocketAddr::from(([0, 0, 0, 0, 0, 0, 0, 1], 9));
        let reactor = Reactor::bind_to(loopback(), unreachable, Duration::from_millis(5))
            .await
            .unwrap();
        let (tx, rx) = mpsc::channel(8);
        tx.send(Control::SetMode(Mode::Playback)).await.unwrap();

        let result = tokio::time::timeout(Duration::from_secs(2), reactor.run(&mut session, rx))
            .await
            .expect("reactor exits on its own");

        assert!(matches!(result, Err(SessionError::Transport(_))));
        let state = session.control_state();
        assert!(!state.connected);
        assert_eq!(state.mode, Mode::Idle);
        drop(tx);
    }

    #[tokio::test]
    async fn closed_control_channel_stops_the_loop() {
        let dir = tempfile::tempdir().unwrap();
        let mut session = session(&dir);
        let reactor = Reactor::bind_to(loopback(), loopback(), Duration::from_millis(5))
            .await
            .unwrap();
        let (tx, rx) = mpsc::channel::<Control>(1);
        drop(tx);

        reactor.run(&mut session, rx).await.unwrap();
        assert_eq!(session.mode(), Mode::Idle);
    }
}
