//! FT 1.2 link-layer state machines: unbalanced secondary (slave) and
//! unbalanced/balanced primary (master), built on top of `crate::ft12`.
//!
//! Grounded in `link_layer.c`'s `LinkLayerSecondaryUnbalanced_handleMessage`
//! / `LinkLayerPrimaryUnbalanced_*` / `LinkLayerPrimaryBalanced_*` families.

use std::time::{Duration, Instant};

use crate::common::{IecError, IecResult};
use crate::ft12::{ControlField, Ft12Frame, LinkAddressSize};

/// Secondary-station function codes (PRM=1 requests the secondary answers).
mod fc {
    pub const RESET_REMOTE_LINK: u8 = 0;
    /// Test function for the link (balanced-mode keepalive).
    pub const TEST_LINK: u8 = 2;
    pub const USER_DATA_CONFIRM: u8 = 3;
    pub const USER_DATA_NO_REPLY: u8 = 4;
    pub const REQUEST_STATUS_OF_LINK: u8 = 9;
    pub const REQUEST_USER_DATA_CLASS_1: u8 = 10;
    pub const REQUEST_USER_DATA_CLASS_2: u8 = 11;
    /// Reset FCB only (CS103 usage); same acknowledgment shape as
    /// RESET_REMOTE_LINK but the app layer is notified with
    /// `reset_cu(true)` instead of `reset_cu(false)`.
    pub const RESET_FCB: u8 = 7;

    pub const ACK: u8 = 0;
    pub const USER_DATA: u8 = 8;
    pub const STATUS_OF_LINK: u8 = 11;
    pub const NACK_NO_DATA: u8 = 9;
    /// Reply to any function code the secondary does not implement.
    pub const SERVICE_NOT_IMPLEMENTED: u8 = 15;
}

/// Default idle timeout before a secondary station drops its "last frame
/// seen" duplicate-detection state (500ms per spec.md §4.E).
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SecondaryLinkState {
    Idle,
    Available,
    Error,
    Busy,
}

/// Outcome of a secondary station processing one incoming frame.
#[derive(Debug, Clone, PartialEq)]
pub enum SecondaryEvent {
    /// New (non-duplicate) user data arrived; the ASDU bytes are ready for
    /// the application layer.
    UserData(Vec<u8>),
    /// Link reset acknowledged.
    Reset,
    /// Nothing of application interest happened (e.g. a duplicate retransmit
    /// was absorbed, or a no-reply broadcast was processed).
    None,
}

/// Unbalanced secondary (slave) link-layer state machine: reactive only,
/// answers whatever the primary polls it with.
pub struct UnbalancedSecondary {
    pub address: u16,
    pub address_size: LinkAddressSize,
    pub state: SecondaryLinkState,
    last_fcb: Option<bool>,
    last_response: Option<Ft12Frame>,
    idle_timeout: Duration,
    last_activity: Option<Instant>,
    class1_pending: bool,
    /// DIR stamped onto replies; only meaningful (and non-zero) on a
    /// balanced link, where both stations originate PRM=1 frames and DIR
    /// disambiguates which physical station sent one.
    dir: bool,
}

impl UnbalancedSecondary {
    pub fn new(address: u16, address_size: LinkAddressSize) -> Self {
        Self {
            address,
            address_size,
            state: SecondaryLinkState::Idle,
            last_fcb: None,
            last_response: None,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            last_activity: None,
            class1_pending: false,
            dir: false,
        }
    }

    /// Build a station that also answers to balanced-link FC 2 (test-link)
    /// and stamps `dir` onto every frame it originates.
    pub fn new_balanced(address: u16, address_size: LinkAddressSize, dir: bool) -> Self {
        let mut station = Self::new(address, address_size);
        station.dir = dir;
        station
    }

    /// Mark that class-1 (higher-priority) data is queued, so the next
    /// status-of-link response sets ACD (access demand).
    pub fn set_class1_pending(&mut self, pending: bool) {
        self.class1_pending = pending;
    }

    fn ack(&self) -> Ft12Frame {
        Ft12Frame::FixedLength {
            control: ControlField::secondary(fc::ACK, self.class1_pending, false).with_dir(self.dir),
            address: self.address,
        }
    }

    fn status_of_link_response(&self) -> Ft12Frame {
        Ft12Frame::FixedLength {
            control: ControlField::secondary(fc::STATUS_OF_LINK, self.class1_pending, false)
                .with_dir(self.dir),
            address: self.address,
        }
    }

    fn nack_no_data(&self) -> Ft12Frame {
        Ft12Frame::FixedLength {
            control: ControlField::secondary(fc::NACK_NO_DATA, false, false).with_dir(self.dir),
            address: self.address,
        }
    }

    /// Process one incoming frame from the primary. `now` drives the idle
    /// timeout that forgets the last-seen FCB (so a late repeat of a stale
    /// request is treated as new rather than silently dropped forever).
    pub fn handle_message(
        &mut self,
        frame: &Ft12Frame,
        now: Instant,
    ) -> IecResult<(SecondaryEvent, Option<Ft12Frame>)> {
        if let Some(last) = self.last_activity {
            if now.duration_since(last) > self.idle_timeout {
                self.last_fcb = None;
            }
        }
        self.last_activity = Some(now);

        let (control, address, user_data) = match frame {
            Ft12Frame::FixedLength { control, address } => (*control, *address, None),
            Ft12Frame::VariableLength {
                control,
                address,
                user_data,
            } => (*control, *address, Some(user_data.clone())),
            Ft12Frame::SingleChar(_) => {
                return Err(IecError::ProtocolError(
                    "secondary station does not expect a single control character".to_string(),
                ))
            }
        };

        let is_broadcast = address == self.address_size.broadcast();
        if address != self.address && !is_broadcast {
            return Ok((SecondaryEvent::None, None));
        }

        // Broadcast messages must be "no reply required" user data (FC4);
        // anything else addressed to the broadcast address is malformed and
        // drives the secondary into the error state without a reply.
        if is_broadcast && control.function_code != fc::USER_DATA_NO_REPLY {
            self.state = SecondaryLinkState::Error;
            return Ok((SecondaryEvent::None, None));
        }

        match control.function_code {
            fc::RESET_REMOTE_LINK => {
                self.last_fcb = None;
                self.state = SecondaryLinkState::Available;
                Ok((SecondaryEvent::Reset, Some(self.ack())))
            }
            fc::RESET_FCB => {
                // CS103 "reset FCB" carries the same acknowledgment as a
                // full reset but does not invalidate link-layer status.
                self.last_fcb = None;
                self.state = SecondaryLinkState::Available;
                Ok((SecondaryEvent::Reset, Some(self.ack())))
            }
            fc::TEST_LINK => Ok((SecondaryEvent::None, Some(self.ack()))),
            fc::USER_DATA_CONFIRM => {
                let data = user_data.ok_or_else(|| {
                    IecError::ProtocolError("FC3 user data frame carried no payload".to_string())
                })?;
                if Some(control.fcb()) == self.last_fcb {
                    let response = self.last_response.clone().unwrap_or_else(|| self.ack());
                    return Ok((SecondaryEvent::None, Some(response)));
                }
                self.last_fcb = Some(control.fcb());
                let response = self.ack();
                self.last_response = Some(response.clone());
                Ok((SecondaryEvent::UserData(data), Some(response)))
            }
            fc::USER_DATA_NO_REPLY => {
                let data = user_data.ok_or_else(|| {
                    IecError::ProtocolError("FC4 user data frame carried no payload".to_string())
                })?;
                Ok((SecondaryEvent::UserData(data), None))
            }
            fc::REQUEST_STATUS_OF_LINK => {
                Ok((SecondaryEvent::None, Some(self.status_of_link_response())))
            }
            fc::REQUEST_USER_DATA_CLASS_1 | fc::REQUEST_USER_DATA_CLASS_2 => {
                // The application layer supplies pending class-1/2 ASDUs
                // through a higher-level poll; absent that, answer "no data".
                Ok((SecondaryEvent::None, Some(self.nack_no_data())))
            }
            other => {
                self.state = SecondaryLinkState::Error;
                tracing::warn!(
                    target: "rust_iec60870::link_layer",
                    function_code = other,
                    "unimplemented function code, replying FC15"
                );
                let reply = Ft12Frame::FixedLength {
                    control: ControlField::secondary(fc::SERVICE_NOT_IMPLEMENTED, false, false)
                        .with_dir(self.dir),
                    address: self.address,
                };
                Ok((SecondaryEvent::None, Some(reply)))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryLinkState {
    Idle,
    RequestStatusOfLink,
    ResetRemoteLink,
    LinkLayersAvailable,
    ServiceSendConfirm,
    ServiceRequestRespond,
    /// Entered on receipt of NACK while a send was pending; held until the
    /// next response clears DFC.
    SecondaryBusy,
}

/// What happened as a result of feeding a response frame to a
/// `SlaveConnection`.
#[derive(Debug, Clone, PartialEq)]
pub enum LinkEvent {
    Available,
    UserData(Vec<u8>),
    NoData,
    Busy,
    None,
}

/// Primary-side per-slave state machine for an unbalanced link.
pub struct SlaveConnection {
    pub address: u16,
    pub state: PrimaryLinkState,
    fcb: bool,
    retry_count: u32,
    pub max_retries: u32,
    pending_frame: Option<Ft12Frame>,
    last_sent_at: Option<Instant>,
    pub timeout: Duration,
    /// Set by DFC=1 in the slave's last response; while true the primary
    /// must hold off sending further user data until the slave's DFC drops.
    pub busy: bool,
    /// Set by ACD=1 in the slave's last response: the slave has class-1
    /// data queued and should be polled for it at the next opportunity.
    pub class1_demand: bool,
    /// DIR stamped onto every frame this side originates; only set on a
    /// balanced link, where the two stations disambiguate originator via
    /// the DIR bit rather than PRM alone.
    dir: bool,
}

impl SlaveConnection {
    pub fn new(address: u16, timeout: Duration, max_retries: u32) -> Self {
        Self {
            address,
            state: PrimaryLinkState::Idle,
            fcb: false,
            retry_count: 0,
            max_retries,
            pending_frame: None,
            last_sent_at: None,
            timeout,
            busy: false,
            class1_demand: false,
            dir: false,
        }
    }

    /// Build a per-slave connection for a balanced link, stamping `dir` on
    /// every originated frame.
    pub fn new_balanced(address: u16, timeout: Duration, max_retries: u32, dir: bool) -> Self {
        let mut conn = Self::new(address, timeout, max_retries);
        conn.dir = dir;
        conn
    }

    /// True while the slave's last response carried DFC=1 (data flow
    /// control / busy); callers should hold off on further user-data
    /// requests until a subsequent response clears it.
    pub fn is_busy(&self) -> bool {
        self.busy
    }

    fn send(&mut self, frame: Ft12Frame, now: Instant) -> Ft12Frame {
        self.pending_frame = Some(frame.clone());
        self.last_sent_at = Some(now);
        frame
    }

    /// Begin (or restart) the link: request status of link (FC9).
    pub fn start(&mut self, now: Instant) -> Ft12Frame {
        self.state = PrimaryLinkState::RequestStatusOfLink;
        self.retry_count = 0;
        let frame = Ft12Frame::FixedLength {
            control: ControlField::primary(fc::REQUEST_STATUS_OF_LINK, false, false).with_dir(self.dir),
            address: self.address,
        };
        self.send(frame, now)
    }

    /// Request a new ASDU be delivered, confirmed (FC3), toggling the FCB.
    pub fn send_user_data(&mut self, asdu_bytes: Vec<u8>, now: Instant) -> Ft12Frame {
        self.fcb = !self.fcb;
        self.state = PrimaryLinkState::ServiceSendConfirm;
        self.retry_count = 0;
        let frame = Ft12Frame::VariableLength {
            control: ControlField::primary(fc::USER_DATA_CONFIRM, self.fcb, true).with_dir(self.dir),
            address: self.address,
            user_data: asdu_bytes,
        };
        self.send(frame, now)
    }

    /// Send a balanced-link keepalive (FC 2, test-link), toggling the FCB
    /// exactly like a confirmed user-data send.
    pub fn send_test_link(&mut self, now: Instant) -> Ft12Frame {
        self.fcb = !self.fcb;
        self.state = PrimaryLinkState::ServiceSendConfirm;
        self.retry_count = 0;
        let frame = Ft12Frame::FixedLength {
            control: ControlField::primary(fc::TEST_LINK, self.fcb, true).with_dir(self.dir),
            address: self.address,
        };
        self.send(frame, now)
    }

    /// Poll for class-1 (or class-2) queued data.
    pub fn request_user_data(&mut self, class1: bool, now: Instant) -> Ft12Frame {
        self.state = PrimaryLinkState::ServiceRequestRespond;
        self.retry_count = 0;
        let fc = if class1 {
            fc::REQUEST_USER_DATA_CLASS_1
        } else {
            fc::REQUEST_USER_DATA_CLASS_2
        };
        let frame = Ft12Frame::FixedLength {
            control: ControlField::primary(fc, false, false).with_dir(self.dir),
            address: self.address,
        };
        self.send(frame, now)
    }

    /// Process the secondary's response frame. A lone `ACK`/`NACK` control
    /// character is a valid reply to a pending fixed-length request (e.g. a
    /// minimal secondary that never sends the full fixed-frame ACK shape).
    pub fn handle_response(&mut self, frame: &Ft12Frame) -> IecResult<LinkEvent> {
        let (control, user_data) = match frame {
            Ft12Frame::FixedLength { control, .. } => (*control, None),
            Ft12Frame::VariableLength {
                control, user_data, ..
            } => (*control, Some(user_data.clone())),
            Ft12Frame::SingleChar(crate::ft12::ACK) => {
                self.pending_frame = None;
                self.retry_count = 0;
                self.state = match self.state {
                    PrimaryLinkState::RequestStatusOfLink => PrimaryLinkState::ResetRemoteLink,
                    _ => PrimaryLinkState::LinkLayersAvailable,
                };
                return Ok(LinkEvent::Available);
            }
            Ft12Frame::SingleChar(crate::ft12::NACK) => {
                self.pending_frame = None;
                self.retry_count = 0;
                self.busy = true;
                self.state = PrimaryLinkState::SecondaryBusy;
                return Ok(LinkEvent::Busy);
            }
            Ft12Frame::SingleChar(other) => {
                return Err(IecError::ProtocolError(format!(
                    "unexpected single control character {other:#x} from secondary station"
                )))
            }
        };

        self.pending_frame = None;
        self.retry_count = 0;
        self.busy = control.dfc();
        if control.acd() {
            self.class1_demand = true;
        }
        if self.busy {
            self.state = PrimaryLinkState::SecondaryBusy;
            return Ok(LinkEvent::Busy);
        }

        match control.function_code {
            fc::ACK => match self.state {
                PrimaryLinkState::RequestStatusOfLink => {
                    self.state = PrimaryLinkState::ResetRemoteLink;
                    Ok(LinkEvent::None)
                }
                _ => {
                    self.state = PrimaryLinkState::LinkLayersAvailable;
                    Ok(LinkEvent::Available)
                }
            },
            fc::STATUS_OF_LINK => {
                self.state = PrimaryLinkState::LinkLayersAvailable;
                Ok(LinkEvent::Available)
            }
            fc::USER_DATA => {
                self.state = PrimaryLinkState::LinkLayersAvailable;
                Ok(LinkEvent::UserData(user_data.unwrap_or_default()))
            }
            fc::NACK_NO_DATA => {
                self.state = PrimaryLinkState::LinkLayersAvailable;
                Ok(LinkEvent::NoData)
            }
            other => Err(IecError::UnknownFunctionCode(other)),
        }
    }

    /// Check for a t(ack) timeout. On expiry, retransmits without advancing
    /// the FCB (the toggle only advances when a *new* send is initiated, not
    /// on a retry of the same frame), up to `max_retries`.
    pub fn check_timeout(&mut self, now: Instant) -> IecResult<Option<Ft12Frame>> {
        let Some(sent_at) = self.last_sent_at else {
            return Ok(None);
        };
        if now.duration_since(sent_at) < self.timeout {
            return Ok(None);
        }

        if self.retry_count >= self.max_retries {
            self.state = PrimaryLinkState::Idle;
            self.pending_frame = None;
            return Err(IecError::TimeoutError(format!(
                "link layer to slave {} exceeded {} retries",
                self.address, self.max_retries
            )));
        }

        self.retry_count += 1;
        let Some(frame) = self.pending_frame.clone() else {
            return Ok(None);
        };
        self.last_sent_at = Some(now);
        Ok(Some(frame))
    }
}

/// Round-robin primary managing several slaves over one unbalanced link.
pub struct UnbalancedMaster {
    pub slaves: Vec<SlaveConnection>,
    pub current_slave: usize,
}

impl UnbalancedMaster {
    pub fn new() -> Self {
        Self {
            slaves: Vec::new(),
            current_slave: 0,
        }
    }

    pub fn add_slave(&mut self, conn: SlaveConnection) {
        self.slaves.push(conn);
    }

    /// Advance the round-robin cursor and return the now-current slave's
    /// index, if any slave is configured.
    pub fn advance(&mut self) -> Option<usize> {
        if self.slaves.is_empty() {
            return None;
        }
        let idx = self.current_slave;
        self.current_slave = (self.current_slave + 1) % self.slaves.len();
        Some(idx)
    }

    pub fn slave_mut(&mut self, index: usize) -> Option<&mut SlaveConnection> {
        self.slaves.get_mut(index)
    }
}

impl Default for UnbalancedMaster {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn secondary_acks_reset_remote_link() {
        let mut secondary = UnbalancedSecondary::new(1, LinkAddressSize::OneOctet);
        let request = Ft12Frame::FixedLength {
            control: ControlField::primary(fc::RESET_REMOTE_LINK, false, false),
            address: 1,
        };
        let (event, response) = secondary.handle_message(&request, Instant::now()).unwrap();
        assert_eq!(event, SecondaryEvent::Reset);
        assert!(response.is_some());
        assert_eq!(secondary.state, SecondaryLinkState::Available);
    }

    #[test]
    fn secondary_detects_duplicate_fcb_as_retransmission() {
        let mut secondary = UnbalancedSecondary::new(1, LinkAddressSize::OneOctet);
        let frame = Ft12Frame::VariableLength {
            control: ControlField::primary(fc::USER_DATA_CONFIRM, true, true),
            address: 1,
            user_data: vec![0xaa],
        };
        let (event1, _) = secondary.handle_message(&frame, Instant::now()).unwrap();
        assert_eq!(event1, SecondaryEvent::UserData(vec![0xaa]));

        // Same FCB again => duplicate, not delivered a second time.
        let (event2, _) = secondary.handle_message(&frame, Instant::now()).unwrap();
        assert_eq!(event2, SecondaryEvent::None);
    }

    #[test]
    fn primary_round_robin_cycles_through_slaves() {
        let mut master = UnbalancedMaster::new();
        master.add_slave(SlaveConnection::new(1, Duration::from_millis(200), 2));
        master.add_slave(SlaveConnection::new(2, Duration::from_millis(200), 2));

        assert_eq!(master.advance(), Some(0));
        assert_eq!(master.advance(), Some(1));
        assert_eq!(master.advance(), Some(0));
    }

    #[test]
    fn primary_retransmits_without_advancing_fcb() {
        let mut slave = SlaveConnection::new(1, Duration::from_millis(10), 3);
        let first = slave.send_user_data(vec![1, 2, 3], Instant::now());
        let fcb_first = match first {
            Ft12Frame::VariableLength { control, .. } => control.fcb(),
            _ => panic!("expected variable-length frame"),
        };

        std::thread::sleep(Duration::from_millis(15));
        let retry = slave
            .check_timeout(Instant::now())
            .unwrap()
            .expect("expected a retransmission");
        let fcb_retry = match retry {
            Ft12Frame::VariableLength { control, .. } => control.fcb(),
            _ => panic!("expected variable-length frame"),
        };
        assert_eq!(fcb_first, fcb_retry);
    }

    #[test]
    fn secondary_rejects_non_fc4_broadcast() {
        let mut secondary = UnbalancedSecondary::new(1, LinkAddressSize::OneOctet);
        let request = Ft12Frame::FixedLength {
            control: ControlField::primary(fc::REQUEST_STATUS_OF_LINK, false, false),
            address: LinkAddressSize::OneOctet.broadcast(),
        };
        let (event, response) = secondary.handle_message(&request, Instant::now()).unwrap();
        assert_eq!(event, SecondaryEvent::None);
        assert!(response.is_none());
        assert_eq!(secondary.state, SecondaryLinkState::Error);
    }

    #[test]
    fn secondary_accepts_fc4_broadcast_user_data() {
        let mut secondary = UnbalancedSecondary::new(1, LinkAddressSize::OneOctet);
        let request = Ft12Frame::VariableLength {
            control: ControlField::primary(fc::USER_DATA_NO_REPLY, false, false),
            address: LinkAddressSize::OneOctet.broadcast(),
            user_data: vec![0x01],
        };
        let (event, response) = secondary.handle_message(&request, Instant::now()).unwrap();
        assert_eq!(event, SecondaryEvent::UserData(vec![0x01]));
        assert!(response.is_none());
    }

    #[test]
    fn secondary_acks_reset_fcb() {
        let mut secondary = UnbalancedSecondary::new(1, LinkAddressSize::OneOctet);
        let request = Ft12Frame::FixedLength {
            control: ControlField::primary(fc::RESET_FCB, false, false),
            address: 1,
        };
        let (event, response) = secondary.handle_message(&request, Instant::now()).unwrap();
        assert_eq!(event, SecondaryEvent::Reset);
        assert!(response.is_some());
        assert_eq!(secondary.state, SecondaryLinkState::Available);
    }

    #[test]
    fn secondary_replies_service_not_implemented_and_errors_on_unknown_fc() {
        let mut secondary = UnbalancedSecondary::new(1, LinkAddressSize::OneOctet);
        let request = Ft12Frame::FixedLength {
            control: ControlField::primary(13, false, false),
            address: 1,
        };
        let (event, response) = secondary.handle_message(&request, Instant::now()).unwrap();
        assert_eq!(event, SecondaryEvent::None);
        match response {
            Some(Ft12Frame::FixedLength { control, .. }) => {
                assert_eq!(control.function_code, fc::SERVICE_NOT_IMPLEMENTED);
            }
            other => panic!("expected a fixed-length FC15 reply, got {other:?}"),
        }
        assert_eq!(secondary.state, SecondaryLinkState::Error);
    }

    #[test]
    fn primary_accepts_single_char_ack() {
        let mut slave = SlaveConnection::new(1, Duration::from_millis(200), 2);
        slave.start(Instant::now());
        let event = slave
            .handle_response(&Ft12Frame::SingleChar(crate::ft12::ACK))
            .unwrap();
        assert_eq!(event, LinkEvent::Available);
        assert_eq!(slave.state, PrimaryLinkState::ResetRemoteLink);
    }

    #[test]
    fn primary_tracks_busy_on_single_char_nack() {
        let mut slave = SlaveConnection::new(1, Duration::from_millis(200), 2);
        slave.send_user_data(vec![1], Instant::now());
        let event = slave
            .handle_response(&Ft12Frame::SingleChar(crate::ft12::NACK))
            .unwrap();
        assert_eq!(event, LinkEvent::Busy);
        assert!(slave.is_busy());
    }

    #[test]
    fn primary_tracks_dfc_busy_from_fixed_frame() {
        let mut slave = SlaveConnection::new(1, Duration::from_millis(200), 2);
        slave.send_user_data(vec![1], Instant::now());
        let response = Ft12Frame::FixedLength {
            control: ControlField::secondary(fc::ACK, false, true),
            address: 1,
        };
        let event = slave.handle_response(&response).unwrap();
        assert_eq!(event, LinkEvent::Busy);
        assert!(slave.is_busy());
    }

    #[test]
    fn primary_gives_up_after_max_retries() {
        let mut slave = SlaveConnection::new(1, Duration::from_millis(5), 1);
        slave.send_user_data(vec![1], Instant::now());
        std::thread::sleep(Duration::from_millis(10));
        slave.check_timeout(Instant::now()).unwrap();
        std::thread::sleep(Duration::from_millis(10));
        let err = slave.check_timeout(Instant::now());
        assert!(err.is_err());
    }

    #[test]
    fn balanced_stations_stamp_dir_on_originated_frames() {
        let mut secondary = UnbalancedSecondary::new_balanced(1, LinkAddressSize::OneOctet, true);
        let request = Ft12Frame::FixedLength {
            control: ControlField::primary(fc::RESET_REMOTE_LINK, false, false),
            address: 1,
        };
        let (_, response) = secondary.handle_message(&request, Instant::now()).unwrap();
        match response.unwrap() {
            Ft12Frame::FixedLength { control, .. } => assert!(control.dir),
            other => panic!("expected fixed-length reply, got {other:?}"),
        }
    }

    #[test]
    fn balanced_primary_test_link_toggles_fcb_like_user_data() {
        let mut slave = SlaveConnection::new_balanced(1, Duration::from_millis(200), 2, false);
        let frame = slave.send_test_link(Instant::now());
        match frame {
            Ft12Frame::FixedLength { control, .. } => {
                assert_eq!(control.function_code, fc::TEST_LINK);
                assert!(!control.dir);
            }
            other => panic!("expected fixed-length frame, got {other:?}"),
        }
        assert_eq!(slave.state, PrimaryLinkState::ServiceSendConfirm);
    }
}
