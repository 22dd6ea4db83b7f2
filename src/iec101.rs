//! IEC 60870-5-101 (CS101) session management over a serial link.
//!
//! Ties `ft12` (framing) and `link_layer` (link-layer state machines)
//! together with `asdu` (the application layer) into a single polling
//! loop. Unlike CS104, CS101 is explicitly single-threaded: the standard's
//! "balanced"/"unbalanced" modes both assume one actor drives the link at
//! a time, so `run` owns the port and the caller drives it with an
//! explicit `tick`/`run` call rather than background tasks.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::asdu::Asdu;
use crate::common::{ApplicationLayerParameters, IecError, IecResult};
use crate::ft12::{Ft12Frame, LinkAddressSize};
use crate::link_layer::{LinkEvent, SecondaryEvent, SlaveConnection, UnbalancedMaster, UnbalancedSecondary};

/// Abstraction over a serial (or serial-emulating) transport, so the
/// session logic is testable without a real UART. Implementations are
/// expected to be non-blocking best-effort: `read` returns whatever bytes
/// are already available (possibly none), `write` sends a whole frame.
#[async_trait]
pub trait SerialPort: Send {
    async fn read(&mut self, buf: &mut [u8]) -> IecResult<usize>;
    async fn write_all(&mut self, data: &[u8]) -> IecResult<()>;
}

/// CS101 session configuration.
#[derive(Debug, Clone)]
pub struct Iec101Config {
    pub link_address_size: LinkAddressSize,
    pub application_layer_parameters: ApplicationLayerParameters,
    pub link_idle_timeout: Duration,
    pub link_response_timeout: Duration,
    pub max_retries: u32,
}

impl Default for Iec101Config {
    fn default() -> Self {
        Self {
            link_address_size: LinkAddressSize::OneOctet,
            application_layer_parameters: ApplicationLayerParameters::cs101_default(),
            link_idle_timeout: Duration::from_millis(500),
            link_response_timeout: Duration::from_secs(2),
            max_retries: 3,
        }
    }
}

/// A CS101 unbalanced-mode secondary (slave) station: reacts to requests
/// from a single primary, reassembling ASDUs from the user-data it is
/// handed.
pub struct Iec101Slave<P: SerialPort> {
    port: P,
    link: UnbalancedSecondary,
    params: ApplicationLayerParameters,
    pending_asdus: Vec<Asdu>,
    read_buf: Vec<u8>,
}

impl<P: SerialPort> Iec101Slave<P> {
    pub fn new(port: P, address: u16, config: &Iec101Config) -> Self {
        Self {
            port,
            link: UnbalancedSecondary::new(address, config.link_address_size),
            params: config.application_layer_parameters,
            pending_asdus: Vec::new(),
            read_buf: Vec::new(),
        }
    }

    /// Queue an ASDU for delivery to the primary the next time it polls
    /// for class-1 or class-2 data.
    pub fn enqueue_asdu(&mut self, asdu: Asdu) {
        self.pending_asdus.push(asdu);
        self.link.set_class1_pending(true);
    }

    /// Read whatever bytes are available, parse at most one link-layer
    /// frame, and run it through the secondary state machine. Returns any
    /// application-layer ASDU delivered by the frame.
    pub async fn poll(&mut self) -> IecResult<Option<Asdu>> {
        let mut chunk = [0u8; 256];
        let n = self.port.read(&mut chunk).await?;
        if n > 0 {
            self.read_buf.extend_from_slice(&chunk[..n]);
        }

        let (frame, consumed) = match Ft12Frame::parse(&self.read_buf, self.link.address_size) {
            Ok(v) => v,
            Err(IecError::FrameTooShort { .. }) => return Ok(None),
            Err(err) => {
                warn!(target: "rust_iec60870::iec101", %err, "dropping malformed FT 1.2 frame");
                self.read_buf.clear();
                return Err(err);
            }
        };
        self.read_buf.drain(..consumed);

        let address_size = self.link.address_size;
        let (event, response) = self.link.handle_message(&frame, Instant::now())?;

        if let Some(response) = response {
            self.port.write_all(&response.encode(address_size)).await?;
        }

        match event {
            SecondaryEvent::UserData(bytes) => {
                let asdu = Asdu::parse(&bytes, &self.params)?;
                debug!(target: "rust_iec60870::iec101", type_id = ?asdu.type_id, "received ASDU");
                Ok(Some(asdu))
            }
            SecondaryEvent::Reset | SecondaryEvent::None => Ok(None),
        }
    }

    /// Drain one pending ASDU, encode it, and send it as a confirmed
    /// user-data frame. Called in response to a class-1/2 data request
    /// once the primary side has asked for it (the secondary state
    /// machine currently answers every such request immediately with
    /// whatever is queued here).
    pub fn take_pending_asdu(&mut self) -> Option<IecResult<Vec<u8>>> {
        let asdu = self.pending_asdus.pop()?;
        Some(asdu.encode(&self.params))
    }
}

/// A CS101 unbalanced-mode primary (master) station driving one or more
/// secondaries in round-robin order.
pub struct Iec101Master<P: SerialPort> {
    port: P,
    master: UnbalancedMaster,
    params: ApplicationLayerParameters,
    address_size: LinkAddressSize,
    read_buf: Vec<u8>,
}

impl<P: SerialPort> Iec101Master<P> {
    pub fn new(port: P, config: &Iec101Config) -> Self {
        Self {
            port,
            master: UnbalancedMaster::new(),
            params: config.application_layer_parameters,
            address_size: config.link_address_size,
            read_buf: Vec::new(),
        }
    }

    pub fn add_slave(&mut self, address: u16, config: &Iec101Config) {
        self.master.add_slave(SlaveConnection::new(
            address,
            config.link_response_timeout,
            config.max_retries,
        ));
    }

    /// Advance the round-robin cursor and send one request (link status,
    /// then class-1/2 data requests once the link is established) to the
    /// next slave.
    pub async fn poll_next_slave(&mut self) -> IecResult<Option<(u16, Asdu)>> {
        let index = match self.master.advance() {
            Some(i) => i,
            None => return Ok(None),
        };

        let now = Instant::now();
        let (address, request) = {
            let slave = self.master.slave_mut(index).expect("advance returned a valid index");
            let address = slave.address;
            let request = match slave.state {
                crate::link_layer::PrimaryLinkState::Idle => slave.start(now),
                crate::link_layer::PrimaryLinkState::LinkLayersAvailable
                | crate::link_layer::PrimaryLinkState::ServiceRequestRespond => {
                    slave.request_user_data(true, now)
                }
                _ => return Ok(None),
            };
            (address, request)
        };

        self.port.write_all(&request.encode(self.address_size)).await?;

        let mut chunk = [0u8; 256];
        let n = self.port.read(&mut chunk).await?;
        if n > 0 {
            self.read_buf.extend_from_slice(&chunk[..n]);
        }

        let (frame, consumed) = match Ft12Frame::parse(&self.read_buf, self.address_size) {
            Ok(v) => v,
            Err(IecError::FrameTooShort { .. }) => return Ok(None),
            Err(err) => return Err(err),
        };
        self.read_buf.drain(..consumed);

        let slave = self.master.slave_mut(index).expect("advance returned a valid index");
        let event = slave.handle_response(&frame)?;

        match event {
            LinkEvent::UserData(bytes) => {
                let asdu = Asdu::parse(&bytes, &self.params)?;
                Ok(Some((address, asdu)))
            }
            LinkEvent::Available | LinkEvent::NoData | LinkEvent::Busy | LinkEvent::None => Ok(None),
        }
    }

    /// Send an ASDU as confirmed user data to the slave at `address`,
    /// toggling that slave's FCB.
    pub async fn send_asdu(&mut self, address: u16, asdu: &Asdu) -> IecResult<()> {
        let bytes = asdu.encode(&self.params)?;
        let index = self
            .master
            .slaves
            .iter()
            .position(|s| s.address == address)
            .ok_or_else(|| IecError::ProtocolError(format!("no slave registered at address {address}")))?;
        let slave = self.master.slave_mut(index).expect("position found a valid index");
        let frame = slave.send_user_data(bytes, Instant::now());
        self.port.write_all(&frame.encode(self.address_size)).await
    }

    /// Retransmit or give up on any slave whose response has timed out.
    pub async fn handle_timeouts(&mut self) -> IecResult<()> {
        let now = Instant::now();
        for slave in self.master.slaves.iter_mut() {
            if let Some(frame) = slave.check_timeout(now)? {
                self.port.write_all(&frame.encode(self.address_size)).await?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};

    /// An in-memory duplex pair standing in for a UART, so the session
    /// logic above can be driven without real serial hardware.
    struct LoopbackPort {
        inbound: Arc<Mutex<VecDeque<u8>>>,
        outbound: Arc<Mutex<VecDeque<u8>>>,
    }

    #[async_trait]
    impl SerialPort for LoopbackPort {
        async fn read(&mut self, buf: &mut [u8]) -> IecResult<usize> {
            let mut inbound = self.inbound.lock().unwrap();
            let n = inbound.len().min(buf.len());
            for slot in buf.iter_mut().take(n) {
                *slot = inbound.pop_front().unwrap();
            }
            Ok(n)
        }

        async fn write_all(&mut self, data: &[u8]) -> IecResult<()> {
            self.outbound.lock().unwrap().extend(data.iter().copied());
            Ok(())
        }
    }

    fn loopback_pair() -> (LoopbackPort, LoopbackPort) {
        let a_to_b = Arc::new(Mutex::new(VecDeque::new()));
        let b_to_a = Arc::new(Mutex::new(VecDeque::new()));
        (
            LoopbackPort {
                inbound: b_to_a.clone(),
                outbound: a_to_b.clone(),
            },
            LoopbackPort {
                inbound: a_to_b,
                outbound: b_to_a,
            },
        )
    }

    #[tokio::test]
    async fn slave_responds_to_reset_remote_link() {
        let (master_port, slave_port) = loopback_pair();
        let config = Iec101Config::default();
        let mut slave = Iec101Slave::new(slave_port, 1, &config);

        let reset = crate::ft12::Ft12Frame::FixedLength {
            control: crate::ft12::ControlField::primary(0, false, false),
            address: 1,
        };
        // bytes the master "sends" land in the slave's inbound queue, since
        // loopback_pair wires a_to_b/b_to_a symmetrically.
        master_port
            .outbound
            .lock()
            .unwrap()
            .extend(reset.encode(config.link_address_size));

        let event = slave.poll().await.unwrap();
        assert!(event.is_none());
        assert_eq!(slave.link.state, crate::link_layer::SecondaryLinkState::Available);
    }

    #[test]
    fn config_defaults_match_cs101() {
        let config = Iec101Config::default();
        assert_eq!(config.application_layer_parameters.header_len(), 2 + 1 + 1);
        assert_eq!(config.link_address_size, LinkAddressSize::OneOctet);
    }
}
