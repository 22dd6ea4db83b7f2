//! IEC 60870-5-104 (CS104) APCI layer: I/S/U frame encoding, the sliding
//! send window, the t0-t3 timeout regime, and client/server connections
//! built on `tokio::net::TcpStream`.
//!
//! Grounded in `t104_connection.c`'s `checkSequenceNumber` / `checkMessage`
//! / `handleTimeouts`.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, info, warn};

use crate::asdu::Asdu;
use crate::common::{ApplicationLayerParameters, CommonAddrSize, IecError, IecResult};

/// Default CS104 TCP port.
pub const DEFAULT_PORT: u16 = 2404;
/// Default CS104-over-TLS TCP port.
pub const DEFAULT_TLS_PORT: u16 = 19998;

pub const START_DT_ACT: u8 = 0x07;
pub const START_DT_CON: u8 = 0x0B;
pub const STOP_DT_ACT: u8 = 0x13;
pub const STOP_DT_CON: u8 = 0x23;
pub const TEST_FR_ACT: u8 = 0x43;
pub const TEST_FR_CON: u8 = 0x83;

const MAX_SEQ: u16 = 32768;

/// APCI control field, decoded into its three shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApciType {
    IFrame { send_seq: u16, recv_seq: u16 },
    SFrame { recv_seq: u16 },
    UFrame(u8),
}

/// A full APDU: APCI plus, for I-frames, an ASDU payload.
#[derive(Debug, Clone)]
pub struct Apdu {
    pub apci: ApciType,
    pub asdu: Option<Asdu>,
}

impl Apdu {
    pub fn new_i_frame(send_seq: u16, recv_seq: u16, asdu: Asdu) -> Self {
        Self {
            apci: ApciType::IFrame { send_seq, recv_seq },
            asdu: Some(asdu),
        }
    }

    pub fn new_s_frame(recv_seq: u16) -> Self {
        Self {
            apci: ApciType::SFrame { recv_seq },
            asdu: None,
        }
    }

    pub fn new_u_frame(code: u8) -> Self {
        Self {
            apci: ApciType::UFrame(code),
            asdu: None,
        }
    }

    pub fn encode(&self, params: &ApplicationLayerParameters) -> IecResult<Vec<u8>> {
        let mut buffer = Vec::new();
        buffer.push(0x68);
        buffer.push(0); // length placeholder

        match self.apci {
            ApciType::IFrame { send_seq, recv_seq } => {
                buffer.push(((send_seq << 1) & 0xFE) as u8);
                buffer.push((send_seq >> 7) as u8);
                buffer.push(((recv_seq << 1) & 0xFE) as u8);
                buffer.push((recv_seq >> 7) as u8);

                if let Some(asdu) = &self.asdu {
                    let asdu_bytes = asdu.encode(params)?;
                    buffer.extend_from_slice(&asdu_bytes);
                }
            }
            ApciType::SFrame { recv_seq } => {
                buffer.push(0x01);
                buffer.push(0x00);
                buffer.push(((recv_seq << 1) & 0xFE) as u8);
                buffer.push((recv_seq >> 7) as u8);
            }
            ApciType::UFrame(code) => {
                buffer.push(code);
                buffer.push(0x00);
                buffer.push(0x00);
                buffer.push(0x00);
            }
        }

        let length = buffer.len() - 2;
        if length > 253 {
            return Err(IecError::ProtocolError(format!(
                "APDU length {length} exceeds the 253-byte CS104 maximum"
            )));
        }
        buffer[1] = length as u8;

        Ok(buffer)
    }

    pub fn decode(data: &[u8], params: &ApplicationLayerParameters) -> IecResult<Self> {
        if data.len() < 6 {
            return Err(IecError::FrameTooShort {
                expected: 6,
                actual: data.len(),
            });
        }
        if data[0] != 0x68 {
            return Err(IecError::UnexpectedStartByte(data[0]));
        }

        let length = data[1] as usize;
        if data.len() < length + 2 {
            return Err(IecError::FrameTooShort {
                expected: length + 2,
                actual: data.len(),
            });
        }

        let control1 = data[2];

        if (control1 & 0x01) == 0 {
            let send_seq = (((data[3] as u16) << 7) | ((control1 as u16) >> 1)) & 0x7FFF;
            let recv_seq = (((data[5] as u16) << 7) | ((data[4] as u16) >> 1)) & 0x7FFF;

            let asdu = if length > 4 {
                Some(Asdu::parse(&data[6..2 + length], params)?)
            } else {
                None
            };

            Ok(Self {
                apci: ApciType::IFrame { send_seq, recv_seq },
                asdu,
            })
        } else if (control1 & 0x03) == 0x01 {
            let recv_seq = (((data[5] as u16) << 7) | ((data[4] as u16) >> 1)) & 0x7FFF;
            Ok(Self {
                apci: ApciType::SFrame { recv_seq },
                asdu: None,
            })
        } else if (control1 & 0x03) == 0x03 {
            Ok(Self {
                apci: ApciType::UFrame(control1),
                asdu: None,
            })
        } else {
            Err(IecError::ProtocolError(format!(
                "invalid control field: {control1:#04x}"
            )))
        }
    }

    /// The full frame length (start + length byte + declared body), if the
    /// length byte is already known to be present in `data`.
    pub fn frame_len(data: &[u8]) -> Option<usize> {
        if data.len() < 2 {
            return None;
        }
        Some(2 + data[1] as usize)
    }
}

/// IEC-104 client configuration.
#[derive(Debug, Clone)]
pub struct Iec104ClientConfig {
    pub host: String,
    pub port: u16,
    pub timeout: Duration,
    pub max_retries: u32,
    pub common_addr_size: CommonAddrSize,
    pub info_obj_addr_size: usize,
    pub keepalive_interval: Duration,
    /// k: max number of unacknowledged I-frames outstanding.
    pub k: u16,
    /// w: number of received I-frames before an S-frame ack is forced.
    pub w: u16,
    pub t1: Duration,
    pub t2: Duration,
    pub t3: Duration,
}

impl Default for Iec104ClientConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: DEFAULT_PORT,
            timeout: Duration::from_secs(5),
            max_retries: 3,
            common_addr_size: CommonAddrSize::TwoOctets,
            info_obj_addr_size: 3,
            keepalive_interval: Duration::from_secs(20),
            k: 12,
            w: 8,
            t1: Duration::from_secs(15),
            t2: Duration::from_secs(10),
            t3: Duration::from_secs(20),
        }
    }
}

impl Iec104ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn host<S: Into<String>>(mut self, host: S) -> Self {
        self.host = host.into();
        self
    }

    pub fn port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn common_addr_size(mut self, size: CommonAddrSize) -> Self {
        self.common_addr_size = size;
        self
    }

    pub fn info_obj_addr_size(mut self, size: usize) -> Self {
        if (1..=3).contains(&size) {
            self.info_obj_addr_size = size;
        }
        self
    }

    pub fn k(mut self, k: u16) -> Self {
        self.k = k;
        self
    }

    pub fn w(mut self, w: u16) -> Self {
        self.w = w;
        self
    }

    pub fn build(self) -> IecResult<Self> {
        if self.info_obj_addr_size < 1 || self.info_obj_addr_size > 3 {
            return Err(IecError::ConfigError(format!(
                "invalid info_obj_addr_size: {}",
                self.info_obj_addr_size
            )));
        }
        if self.w >= self.k {
            return Err(IecError::ConfigError(format!(
                "w ({}) must be less than k ({})",
                self.w, self.k
            )));
        }
        Ok(self)
    }

    fn application_layer_parameters(&self) -> ApplicationLayerParameters {
        ApplicationLayerParameters {
            common_addr_size: self.common_addr_size,
            ioa_size: crate::common::InfoObjAddrSize::try_from_len(self.info_obj_addr_size)
                .unwrap_or(crate::common::InfoObjAddrSize::ThreeOctets),
            ..ApplicationLayerParameters::default()
        }
    }
}

/// The k-buffer of unacknowledged sent I-frames, indexed by sequence number
/// mod 32768. Mirrors `t104_connection.c`'s `oldestSentASDU`/`newestSentASDU`
/// circular-index bookkeeping.
struct SendBuffer {
    k: u16,
    entries: VecDeque<(u16, Instant)>,
}

impl SendBuffer {
    fn new(k: u16) -> Self {
        Self {
            k,
            entries: VecDeque::new(),
        }
    }

    fn is_full(&self) -> bool {
        self.entries.len() as u16 >= self.k
    }

    fn push(&mut self, seq_no: u16, sent_at: Instant) {
        self.entries.push_back((seq_no, sent_at));
    }

    fn oldest_unconfirmed_time(&self) -> Option<Instant> {
        self.entries.front().map(|(_, t)| *t)
    }

    /// Validate N(R) against the outstanding window and drop every entry it
    /// confirms. Accepts `oldest.seq - 1` (mod 32768) as "nothing new
    /// confirmed", matching `checkSequenceNumber`'s tolerance for an N(R)
    /// that lags by exactly one.
    fn check_sequence_number(&mut self, recv_seq: u16) -> IecResult<()> {
        if self.entries.is_empty() {
            return Ok(());
        }

        let oldest = self.entries.front().unwrap().0;
        let newest = self.entries.back().unwrap().0;

        if recv_seq == (oldest + MAX_SEQ - 1) % MAX_SEQ {
            return Ok(());
        }

        // Walk forward from oldest to newest (mod 32768) checking that
        // recv_seq appears somewhere in [oldest, newest].
        let mut seq = oldest;
        loop {
            if seq == recv_seq {
                while let Some((front, _)) = self.entries.front() {
                    let matched = *front == recv_seq;
                    self.entries.pop_front();
                    if matched {
                        break;
                    }
                }
                return Ok(());
            }
            if seq == newest {
                break;
            }
            seq = (seq + 1) % MAX_SEQ;
        }

        Err(IecError::SequenceNumberError(format!(
            "N(R) {recv_seq} is outside the outstanding window [{oldest}, {newest}]"
        )))
    }
}

/// What happened as a result of feeding one incoming APDU to the core.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    DataIndication(Asdu),
    StartDtConfirmed,
    StopDtConfirmed,
    TestFrameConfirmed,
    None,
}

/// Pure (non-I/O) CS104 connection state: sequence numbers, the send
/// buffer, and the t1/t2/t3 timers. Shared by the client and server tasks.
pub struct ConnectionCore {
    params: ApplicationLayerParameters,
    send_state: u16,
    recv_state: u16,
    send_buffer: SendBuffer,
    unconfirmed_received: u16,
    w: u16,
    t1: Duration,
    t2: Duration,
    t3: Duration,
    last_confirmation_time: Option<Instant>,
    last_activity: Instant,
    data_transfer_started: bool,
    outstanding_test_fr: u32,
    /// Deadline for a pending STARTDT_ACT/TESTFR_ACT confirmation, set to
    /// `now + t1` whenever this side sends one; cleared on the matching
    /// CON. Tracked separately from the I-frame T1 check in
    /// `send_buffer.oldest_unconfirmed_time()`.
    u_message_timeout: Option<Instant>,
}

impl ConnectionCore {
    pub fn new(config: &Iec104ClientConfig) -> Self {
        Self {
            params: config.application_layer_parameters(),
            send_state: 0,
            recv_state: 0,
            send_buffer: SendBuffer::new(config.k),
            unconfirmed_received: 0,
            w: config.w,
            t1: config.t1,
            t2: config.t2,
            t3: config.t3,
            last_confirmation_time: None,
            last_activity: Instant::now(),
            data_transfer_started: false,
            outstanding_test_fr: 0,
            u_message_timeout: None,
        }
    }

    /// Record that `apdu` is about to be sent, starting the T1-on-U-message
    /// deadline if it is a STARTDT_ACT or TESTFR_ACT awaiting confirmation.
    pub fn record_outgoing(&mut self, apdu: &Apdu, now: Instant) {
        if let ApciType::UFrame(START_DT_ACT | TEST_FR_ACT) = apdu.apci {
            self.u_message_timeout = Some(now + self.t1);
        }
    }

    pub fn is_send_window_full(&self) -> bool {
        self.send_buffer.is_full()
    }

    pub fn prepare_i_frame(&mut self, asdu: Asdu, now: Instant) -> Apdu {
        let seq = self.send_state;
        self.send_state = (self.send_state + 1) % MAX_SEQ;
        self.send_buffer.push(seq, now);
        Apdu::new_i_frame(seq, self.recv_state, asdu)
    }

    pub fn encode(&self, apdu: &Apdu) -> IecResult<Vec<u8>> {
        apdu.encode(&self.params)
    }

    pub fn decode(&self, data: &[u8]) -> IecResult<Apdu> {
        Apdu::decode(data, &self.params)
    }

    pub fn handle_apdu(&mut self, apdu: &Apdu, now: Instant) -> IecResult<(ConnectionEvent, Option<Apdu>)> {
        self.last_activity = now;

        match apdu.apci {
            ApciType::IFrame { send_seq, recv_seq } => {
                if self.unconfirmed_received == 0 {
                    self.last_confirmation_time = Some(now);
                }

                if send_seq != self.recv_state {
                    return Err(IecError::SequenceNumberError(format!(
                        "expected N(S) {}, got {}",
                        self.recv_state, send_seq
                    )));
                }

                self.send_buffer.check_sequence_number(recv_seq)?;

                self.recv_state = (self.recv_state + 1) % MAX_SEQ;
                self.unconfirmed_received += 1;

                let ack = if self.unconfirmed_received >= self.w {
                    self.unconfirmed_received = 0;
                    self.last_confirmation_time = None;
                    Some(Apdu::new_s_frame(self.recv_state))
                } else {
                    None
                };

                let event = match &apdu.asdu {
                    Some(asdu) => ConnectionEvent::DataIndication(asdu.clone()),
                    None => ConnectionEvent::None,
                };

                Ok((event, ack))
            }
            ApciType::SFrame { recv_seq } => {
                self.send_buffer.check_sequence_number(recv_seq)?;
                Ok((ConnectionEvent::None, None))
            }
            ApciType::UFrame(code) => match code {
                TEST_FR_ACT => Ok((ConnectionEvent::None, Some(Apdu::new_u_frame(TEST_FR_CON)))),
                TEST_FR_CON => {
                    self.outstanding_test_fr = 0;
                    self.u_message_timeout = None;
                    Ok((ConnectionEvent::TestFrameConfirmed, None))
                }
                START_DT_ACT => {
                    self.data_transfer_started = true;
                    Ok((ConnectionEvent::None, Some(Apdu::new_u_frame(START_DT_CON))))
                }
                START_DT_CON => {
                    self.data_transfer_started = true;
                    self.u_message_timeout = None;
                    Ok((ConnectionEvent::StartDtConfirmed, None))
                }
                STOP_DT_ACT => {
                    self.data_transfer_started = false;
                    Ok((ConnectionEvent::None, Some(Apdu::new_u_frame(STOP_DT_CON))))
                }
                STOP_DT_CON => {
                    self.data_transfer_started = false;
                    Ok((ConnectionEvent::StopDtConfirmed, None))
                }
                other => Err(IecError::UnknownFunctionCode(other)),
            },
        }
    }

    /// T1/T2/T3 timeout regime. Returns APDUs that must be sent as a side
    /// effect (an S-frame ack for T2, a TESTFR_ACT for T3), or an error if
    /// T1 expired on an unconfirmed I-frame (connection must close).
    pub fn handle_timeouts(&mut self, now: Instant) -> IecResult<Vec<Apdu>> {
        let mut to_send = Vec::new();

        if let Some(oldest) = self.send_buffer.oldest_unconfirmed_time() {
            if now.duration_since(oldest) >= self.t1 {
                return Err(IecError::ConfirmTimeout);
            }
        }

        if let Some(deadline) = self.u_message_timeout {
            if now >= deadline {
                return Err(IecError::ConfirmTimeout);
            }
        }

        if let Some(last_confirmation) = self.last_confirmation_time {
            if now.duration_since(last_confirmation) >= self.t2 {
                to_send.push(Apdu::new_s_frame(self.recv_state));
                self.unconfirmed_received = 0;
                self.last_confirmation_time = None;
            }
        }

        if now.duration_since(self.last_activity) >= self.t3 {
            to_send.push(Apdu::new_u_frame(TEST_FR_ACT));
            self.u_message_timeout = Some(now + self.t1);
            self.outstanding_test_fr += 1;
            self.last_activity = now;
            if self.outstanding_test_fr > 2 {
                return Err(IecError::IdleTimeout);
            }
        }

        Ok(to_send)
    }

    pub fn is_data_transfer_started(&self) -> bool {
        self.data_transfer_started
    }
}

/// Connection lifecycle events surfaced to callers of `Iec104Client`.
#[derive(Debug, Clone)]
pub enum ConnectionStatusEvent {
    Opened,
    Closed,
    StartDtConReceived,
    StopDtConReceived,
}

/// An async CS104 client connection: one background task reads the socket
/// and runs the APCI core; the public API is a thin, cancel-safe facade
/// over a mutex-guarded core plus channels for received ASDUs and
/// lifecycle events.
pub struct Iec104Client {
    core: std::sync::Arc<Mutex<ConnectionCore>>,
    writer: std::sync::Arc<Mutex<tokio::net::tcp::OwnedWriteHalf>>,
    asdu_rx: mpsc::Receiver<Asdu>,
    status_rx: mpsc::Receiver<ConnectionStatusEvent>,
}

impl Iec104Client {
    pub async fn connect(config: Iec104ClientConfig) -> IecResult<Self> {
        let config = config.build()?;
        let addr = format!("{}:{}", config.host, config.port);
        info!(target: "rust_iec60870::iec104", %addr, "connecting to IEC 60870-5-104 server");

        let stream = tokio::time::timeout(config.timeout, TcpStream::connect(&addr))
            .await
            .map_err(|_| IecError::TimeoutError(format!("connect to {addr} timed out")))?
            .map_err(IecError::IoError)?;
        stream.set_nodelay(true).ok();

        let (read_half, write_half) = stream.into_split();
        let core = std::sync::Arc::new(Mutex::new(ConnectionCore::new(&config)));
        let writer = std::sync::Arc::new(Mutex::new(write_half));

        let (asdu_tx, asdu_rx) = mpsc::channel(64);
        let (status_tx, status_rx) = mpsc::channel(16);

        spawn_read_loop(read_half, core.clone(), writer.clone(), asdu_tx, status_tx.clone());
        spawn_timeout_loop(core.clone(), writer.clone(), status_tx);

        Ok(Self {
            core,
            writer,
            asdu_rx,
            status_rx,
        })
    }

    pub async fn start_data_transfer(&self) -> IecResult<()> {
        let apdu = Apdu::new_u_frame(START_DT_ACT);
        {
            let mut core = self.core.lock().await;
            core.record_outgoing(&apdu, Instant::now());
        }
        send_apdu(&self.core, &self.writer, &apdu).await
    }

    pub async fn stop_data_transfer(&self) -> IecResult<()> {
        let apdu = Apdu::new_u_frame(STOP_DT_ACT);
        send_apdu(&self.core, &self.writer, &apdu).await
    }

    pub async fn send_asdu(&self, asdu: Asdu) -> IecResult<()> {
        let apdu = {
            let mut core = self.core.lock().await;
            if !core.is_data_transfer_started() {
                return Err(IecError::DataTransferNotStarted);
            }
            if core.is_send_window_full() {
                return Err(IecError::ProtocolError(
                    "send window full (k limit reached)".to_string(),
                ));
            }
            core.prepare_i_frame(asdu, Instant::now())
        };
        send_apdu(&self.core, &self.writer, &apdu).await
    }

    /// Receive the next application-layer ASDU delivered by the connection.
    /// Returns `None` once the connection has closed.
    pub async fn receive(&mut self) -> Option<Asdu> {
        self.asdu_rx.recv().await
    }

    pub async fn next_status_event(&mut self) -> Option<ConnectionStatusEvent> {
        self.status_rx.recv().await
    }
}

async fn send_apdu(
    core: &std::sync::Arc<Mutex<ConnectionCore>>,
    writer: &std::sync::Arc<Mutex<tokio::net::tcp::OwnedWriteHalf>>,
    apdu: &Apdu,
) -> IecResult<()> {
    let bytes = {
        let core = core.lock().await;
        core.encode(apdu)?
    };
    let mut writer = writer.lock().await;
    writer.write_all(&bytes).await.map_err(IecError::IoError)
}

fn spawn_read_loop(
    mut read_half: tokio::net::tcp::OwnedReadHalf,
    core: std::sync::Arc<Mutex<ConnectionCore>>,
    writer: std::sync::Arc<Mutex<tokio::net::tcp::OwnedWriteHalf>>,
    asdu_tx: mpsc::Sender<Asdu>,
    status_tx: mpsc::Sender<ConnectionStatusEvent>,
) {
    tokio::spawn(async move {
        status_tx.send(ConnectionStatusEvent::Opened).await.ok();
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];

        loop {
            match read_half.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&chunk[..n]),
                Err(err) => {
                    warn!(target: "rust_iec60870::iec104", %err, "read error, closing connection");
                    break;
                }
            }

            while let Some(frame_len) = Apdu::frame_len(&buf) {
                if buf.len() < frame_len {
                    break;
                }
                let frame = buf.drain(..frame_len).collect::<Vec<u8>>();

                let decoded = {
                    let core = core.lock().await;
                    core.decode(&frame)
                };

                let apdu = match decoded {
                    Ok(apdu) => apdu,
                    Err(err) => {
                        warn!(target: "rust_iec60870::iec104", %err, "dropping malformed APDU");
                        continue;
                    }
                };

                let outcome = {
                    let mut core = core.lock().await;
                    core.handle_apdu(&apdu, Instant::now())
                };

                let (event, ack) = match outcome {
                    Ok(v) => v,
                    Err(err) => {
                        warn!(target: "rust_iec60870::iec104", %err, "connection-level protocol error");
                        break;
                    }
                };

                if let Some(ack) = ack {
                    if send_apdu(&core, &writer, &ack).await.is_err() {
                        break;
                    }
                }

                match event {
                    ConnectionEvent::DataIndication(asdu) => {
                        debug!(target: "rust_iec60870::iec104", type_id = ?asdu.type_id, "received ASDU");
                        if asdu_tx.send(asdu).await.is_err() {
                            return;
                        }
                    }
                    ConnectionEvent::StartDtConfirmed => {
                        status_tx.send(ConnectionStatusEvent::StartDtConReceived).await.ok();
                    }
                    ConnectionEvent::StopDtConfirmed => {
                        status_tx.send(ConnectionStatusEvent::StopDtConReceived).await.ok();
                    }
                    ConnectionEvent::TestFrameConfirmed | ConnectionEvent::None => {}
                }
            }
        }

        status_tx.send(ConnectionStatusEvent::Closed).await.ok();
    });
}

fn spawn_timeout_loop(
    core: std::sync::Arc<Mutex<ConnectionCore>>,
    writer: std::sync::Arc<Mutex<tokio::net::tcp::OwnedWriteHalf>>,
    status_tx: mpsc::Sender<ConnectionStatusEvent>,
) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_millis(250));
        loop {
            interval.tick().await;
            let outcome = {
                let mut core = core.lock().await;
                core.handle_timeouts(Instant::now())
            };

            match outcome {
                Ok(apdus) => {
                    for apdu in apdus {
                        if send_apdu(&core, &writer, &apdu).await.is_err() {
                            status_tx.send(ConnectionStatusEvent::Closed).await.ok();
                            return;
                        }
                    }
                }
                Err(err) => {
                    warn!(target: "rust_iec60870::iec104", %err, "connection timed out, closing");
                    status_tx.send(ConnectionStatusEvent::Closed).await.ok();
                    return;
                }
            }
        }
    });
}

/// IEC-104 server configuration.
#[derive(Debug, Clone)]
pub struct Iec104ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub common_addr_size: CommonAddrSize,
    pub info_obj_addr_size: usize,
    pub k: u16,
    pub w: u16,
    pub t1: Duration,
    pub t2: Duration,
    pub t3: Duration,
}

impl Default for Iec104ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0".to_string(),
            port: DEFAULT_PORT,
            common_addr_size: CommonAddrSize::TwoOctets,
            info_obj_addr_size: 3,
            k: 12,
            w: 8,
            t1: Duration::from_secs(15),
            t2: Duration::from_secs(10),
            t3: Duration::from_secs(20),
        }
    }
}

impl Iec104ServerConfig {
    fn as_client_config(&self) -> Iec104ClientConfig {
        Iec104ClientConfig {
            host: self.bind_address.clone(),
            port: self.port,
            timeout: Duration::from_secs(5),
            max_retries: 0,
            common_addr_size: self.common_addr_size,
            info_obj_addr_size: self.info_obj_addr_size,
            keepalive_interval: Duration::from_secs(20),
            k: self.k,
            w: self.w,
            t1: self.t1,
            t2: self.t2,
            t3: self.t3,
        }
    }
}

/// A single accepted CS104 server-side connection, symmetric to
/// `Iec104Client` (same `ConnectionCore`, same read/timeout tasks).
pub struct Iec104Connection {
    core: std::sync::Arc<Mutex<ConnectionCore>>,
    writer: std::sync::Arc<Mutex<tokio::net::tcp::OwnedWriteHalf>>,
    asdu_rx: mpsc::Receiver<Asdu>,
    status_rx: mpsc::Receiver<ConnectionStatusEvent>,
    pub peer: std::net::SocketAddr,
}

impl Iec104Connection {
    pub async fn send_asdu(&self, asdu: Asdu) -> IecResult<()> {
        let apdu = {
            let mut core = self.core.lock().await;
            if core.is_send_window_full() {
                return Err(IecError::ProtocolError(
                    "send window full (k limit reached)".to_string(),
                ));
            }
            core.prepare_i_frame(asdu, Instant::now())
        };
        send_apdu(&self.core, &self.writer, &apdu).await
    }

    pub async fn receive(&mut self) -> Option<Asdu> {
        self.asdu_rx.recv().await
    }

    pub async fn next_status_event(&mut self) -> Option<ConnectionStatusEvent> {
        self.status_rx.recv().await
    }
}

/// A listening CS104 server. `accept` yields one `Iec104Connection` per
/// incoming TCP connection; the caller decides how many to service
/// concurrently.
pub struct Iec104Server {
    listener: TcpListener,
    config: Iec104ServerConfig,
}

impl Iec104Server {
    pub async fn bind(config: Iec104ServerConfig) -> IecResult<Self> {
        let addr = format!("{}:{}", config.bind_address, config.port);
        let listener = TcpListener::bind(&addr).await.map_err(IecError::IoError)?;
        info!(target: "rust_iec60870::iec104", %addr, "listening for IEC 60870-5-104 connections");
        Ok(Self { listener, config })
    }

    pub async fn accept(&self) -> IecResult<Iec104Connection> {
        let (stream, peer) = self.listener.accept().await.map_err(IecError::IoError)?;
        stream.set_nodelay(true).ok();
        info!(target: "rust_iec60870::iec104", %peer, "accepted IEC 60870-5-104 connection");

        let client_config = self.config.as_client_config();
        let (read_half, write_half) = stream.into_split();
        let core = std::sync::Arc::new(Mutex::new(ConnectionCore::new(&client_config)));
        let writer = std::sync::Arc::new(Mutex::new(write_half));

        let (asdu_tx, asdu_rx) = mpsc::channel(64);
        let (status_tx, status_rx) = mpsc::channel(16);

        spawn_read_loop(read_half, core.clone(), writer.clone(), asdu_tx, status_tx.clone());
        spawn_timeout_loop(core.clone(), writer.clone(), status_tx);

        Ok(Iec104Connection {
            core,
            writer,
            asdu_rx,
            status_rx,
            peer,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::CauseOfTransmission;
    use crate::information_object::{InformationObject, SinglePointInfo, TypeId};

    fn sample_asdu() -> Asdu {
        let mut asdu = Asdu::new(TypeId::MSpNa1, CauseOfTransmission::Spontaneous, 1);
        asdu.add_information_object(InformationObject::SinglePoint(SinglePointInfo {
            ioa: 1,
            value: true,
            quality: crate::common::QualityDescriptor::new(),
        }))
        .unwrap();
        asdu
    }

    #[test]
    fn i_frame_apdu_roundtrip() {
        let params = ApplicationLayerParameters::default();
        let apdu = Apdu::new_i_frame(0, 0, sample_asdu());
        let bytes = apdu.encode(&params).unwrap();
        let decoded = Apdu::decode(&bytes, &params).unwrap();
        match decoded.apci {
            ApciType::IFrame { send_seq, recv_seq } => {
                assert_eq!(send_seq, 0);
                assert_eq!(recv_seq, 0);
            }
            _ => panic!("expected I-frame"),
        }
        assert!(decoded.asdu.is_some());
    }

    #[test]
    fn u_frame_startdt_roundtrip() {
        let params = ApplicationLayerParameters::default();
        let apdu = Apdu::new_u_frame(START_DT_ACT);
        let bytes = apdu.encode(&params).unwrap();
        assert_eq!(bytes.len(), 6);
        let decoded = Apdu::decode(&bytes, &params).unwrap();
        assert!(matches!(decoded.apci, ApciType::UFrame(START_DT_ACT)));
    }

    #[test]
    fn core_handles_startdt_handshake() {
        let config = Iec104ClientConfig::default();
        let mut core = ConnectionCore::new(&config);
        let act = Apdu::new_u_frame(START_DT_ACT);
        let (_, response) = core.handle_apdu(&act, Instant::now()).unwrap();
        assert!(matches!(
            response.map(|a| a.apci),
            Some(ApciType::UFrame(START_DT_CON))
        ));
        assert!(core.is_data_transfer_started());
    }

    #[test]
    fn core_rejects_out_of_order_send_sequence() {
        let config = Iec104ClientConfig::default();
        let mut core = ConnectionCore::new(&config);
        let apdu = Apdu::new_i_frame(5, 0, sample_asdu());
        let err = core.handle_apdu(&apdu, Instant::now());
        assert!(matches!(err, Err(IecError::SequenceNumberError(_))));
    }

    #[test]
    fn core_sends_s_frame_after_w_unconfirmed_i_frames() {
        let config = Iec104ClientConfig::default().w(2).k(8).build().unwrap();
        let mut core = ConnectionCore::new(&config);
        let now = Instant::now();

        let (_, ack1) = core.handle_apdu(&Apdu::new_i_frame(0, 0, sample_asdu()), now).unwrap();
        assert!(ack1.is_none());
        let (_, ack2) = core.handle_apdu(&Apdu::new_i_frame(1, 0, sample_asdu()), now).unwrap();
        assert!(matches!(ack2.map(|a| a.apci), Some(ApciType::SFrame { recv_seq: 2 })));
    }

    #[test]
    fn send_buffer_check_sequence_number_confirms_entries() {
        let mut buffer = SendBuffer::new(8);
        let now = Instant::now();
        buffer.push(0, now);
        buffer.push(1, now);
        buffer.push(2, now);
        buffer.check_sequence_number(2).unwrap();
        assert_eq!(buffer.entries.len(), 1);
    }

    #[test]
    fn config_rejects_w_greater_than_or_equal_to_k() {
        let err = Iec104ClientConfig::default().k(4).w(4).build();
        assert!(err.is_err());
    }
}
