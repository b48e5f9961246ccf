//! Serial-frame network interface: frames Ethernet frames over a
//! byte-oriented serial endpoint so an IP stack can be attached to a narrow
//! pipe (SPEC_FULL.md §4.4). Described at the frame level only — the host
//! bridge and the IP stack itself are external collaborators.

pub mod frame;

use std::io;
use std::time::Duration;

pub use frame::{DEVICE_MAC, MAX_ETH_FRAME_LEN, MIN_ETH_FRAME_LEN, PEER_MAC};

#[derive(Debug)]
pub enum Error {
    InvalidArg,
    Timeout,
    IoError(io::Error),
}

impl From<io::Error> for Error {
    fn from(e: io::Error) -> Self {
        Error::IoError(e)
    }
}

/// Static link configuration (SPEC_FULL.md §6). MACs are fixed per spec;
/// IPv4 addressing is configuration with documented defaults.
#[derive(Debug, Clone, Copy)]
pub struct LinkConfig {
    pub device_mac: [u8; 6],
    pub peer_mac: [u8; 6],
    pub device_ip: [u8; 4],
    pub prefix_len: u8,
    pub gateway_ip: [u8; 4],
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            device_mac: DEVICE_MAC,
            peer_mac: PEER_MAC,
            device_ip: [192, 168, 100, 2],
            prefix_len: 24,
            gateway_ip: [192, 168, 100, 1],
        }
    }
}

/// Static ARP entry installed at init so the gateway never needs resolving
/// over the narrow serial pipe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip: [u8; 4],
    pub mac: [u8; 6],
}

impl LinkConfig {
    pub fn gateway_arp_entry(&self) -> ArpEntry {
        ArpEntry {
            ip: self.gateway_ip,
            mac: self.peer_mac,
        }
    }
}

/// Capability trait for the link: the IP stack calls `send` to transmit a
/// flattened Ethernet frame; `deliver` is how this interface hands a
/// received frame back in. Modeled this way (rather than a pointer-heavy
/// callback pair) per SPEC_FULL.md §9's re-architecture note.
pub trait LinkDevice {
    fn send(&mut self, eth_frame: &[u8]) -> Result<(), Error>;
}

/// A sink the RX worker delivers decoded Ethernet frames to (the IP stack's
/// input hook). Kept as an injected dependency so this crate has no
/// knowledge of the concrete IP-stack type.
pub trait DeliverSink {
    fn deliver(&mut self, eth_frame: &[u8]);
}

/// Minimal transport abstraction the RX worker needs: a byte read with a
/// per-byte timeout. Modeled narrowly so tests can mock it without pulling
/// in a concrete UART type.
pub trait TimedByteSource {
    /// Read one byte, waiting up to `timeout`. `Ok(None)` means the read
    /// timed out with no byte available.
    fn read_byte(&mut self, timeout: Duration) -> Result<Option<u8>, Error>;
}

/// Plain, blocking write sink for the TX path (no per-byte timeout needed:
/// §4.4 only bounds the RX path).
pub trait ByteSink {
    fn write_all(&mut self, buf: &[u8]) -> Result<(), Error>;
}

/// 1-second inter-byte timeout for the RX path, per SPEC_FULL.md §5.
pub const RX_INTER_BYTE_TIMEOUT: Duration = Duration::from_secs(1);

/// Every `ByteSink` is a `LinkDevice`: `send` is just `transmit` over the
/// same write path the TX side already uses. This is what gives a concrete
/// transport like `UartLink` its `LinkDevice` impl for free.
impl<W: ByteSink> LinkDevice for W {
    fn send(&mut self, eth_frame: &[u8]) -> Result<(), Error> {
        transmit(self, eth_frame)
    }
}

/// TX path: encode the length prefix and emit it followed by the frame
/// bytes. The caller has already flattened any scatter/gather chain into
/// `eth_frame` (SPEC_FULL.md §4.4).
pub fn transmit<W: ByteSink>(sink: &mut W, eth_frame: &[u8]) -> Result<(), Error> {
    let wire = frame::encode_wire_frame(eth_frame)?;
    sink.write_all(&wire)
}

/// RX worker step: read exactly one frame off the wire, or resynchronize
/// and report why the prior attempt failed.
///
/// On a length-prefix or inter-byte timeout violation, the partial frame is
/// discarded; the next call starts resynchronizing at the next byte, which
/// is the behavior this function gives for free since it always starts
/// fresh at a 2-byte length prefix.
pub fn receive_frame<R: TimedByteSource>(source: &mut R) -> Result<Vec<u8>, Error> {
    let mut prefix = [0u8; frame::LEN_PREFIX_LEN];
    for slot in &mut prefix {
        *slot = read_one(source)?;
    }
    let len = frame::decode_len_prefix(prefix)?;

    let mut buf = vec![0u8; len];
    for slot in &mut buf {
        *slot = read_one(source)?;
    }
    Ok(buf)
}

fn read_one<R: TimedByteSource>(source: &mut R) -> Result<u8, Error> {
    source
        .read_byte(RX_INTER_BYTE_TIMEOUT)?
        .ok_or(Error::Timeout)
}

/// Drive the RX worker loop: repeatedly read a frame and deliver it,
/// logging and resyncing on any malformed/timed-out frame. Never exits on
/// a transient error (SPEC_FULL.md §4.4 failure semantics); returns only if
/// `should_stop` reports true between frames.
pub fn run_rx_loop<R: TimedByteSource, S: DeliverSink>(
    source: &mut R,
    sink: &mut S,
    mut should_stop: impl FnMut() -> bool,
) {
    while !should_stop() {
        match receive_frame(source) {
            Ok(eth_frame) => sink.deliver(&eth_frame),
            Err(Error::Timeout) => {
                log::warn!("netif rx: inter-byte timeout, resynchronizing");
            }
            Err(Error::InvalidArg) => {
                log::warn!("netif rx: invalid frame length, resynchronizing");
            }
            Err(Error::IoError(e)) => {
                log::warn!("netif rx: io error {e}, resynchronizing");
            }
        }
    }
}
