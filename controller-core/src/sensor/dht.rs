//! DHT11 single-wire frame handling.
//!
//! The sensor answers a start pulse with 40 data bits, each a fixed ~50 µs low
//! phase followed by a high phase whose length encodes the bit: roughly 26 µs
//! for a zero and 70 µs for a one. The firmware measures the high phases;
//! everything after that is timing-independent and lives here.

use core::fmt;

/// Number of bits in one transfer.
pub const DHT_FRAME_BITS: usize = 40;

/// High phases longer than this are decoded as a one.
pub const DHT_ONE_THRESHOLD_US: u32 = 40;

/// Minimum spacing between acquisitions recommended for the DHT11.
pub const DHT_MIN_INTERVAL_MS: u64 = 2_000;

/// Failure modes of a single acquisition.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DhtError {
    /// The sensor did not answer or a bit edge never arrived.
    Timeout,
    /// The checksum byte does not match the payload.
    Checksum,
}

impl fmt::Display for DhtError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DhtError::Timeout => f.write_str("dht timeout"),
            DhtError::Checksum => f.write_str("dht checksum mismatch"),
        }
    }
}

/// Validated DHT11 payload.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct DhtFrame {
    pub humidity: f32,
    pub temperature: f32,
}

impl DhtFrame {
    /// Decodes the five raw bytes of a transfer.
    ///
    /// # Errors
    ///
    /// Returns [`DhtError::Checksum`] when the fifth byte is not the wrapping
    /// sum of the first four.
    pub fn decode(bytes: [u8; 5]) -> Result<Self, DhtError> {
        let sum = bytes[..4]
            .iter()
            .fold(0u8, |acc, byte| acc.wrapping_add(*byte));
        if sum != bytes[4] {
            return Err(DhtError::Checksum);
        }

        let humidity = f32::from(bytes[0]) + f32::from(bytes[1]) * 0.1;
        let magnitude = f32::from(bytes[2]) + f32::from(bytes[3] & 0x0F) * 0.1;
        let temperature = if bytes[3] & 0x80 != 0 {
            -magnitude
        } else {
            magnitude
        };

        Ok(Self {
            humidity,
            temperature,
        })
    }

    /// Decodes a transfer from measured high-phase widths, MSB first.
    ///
    /// # Errors
    ///
    /// Returns [`DhtError::Checksum`] when the packed frame fails its checksum.
    pub fn from_high_phases(high_us: &[u32; DHT_FRAME_BITS]) -> Result<Self, DhtError> {
        Self::decode(pack_bits(high_us))
    }
}

/// Packs high-phase widths into bytes, MSB first.
#[must_use]
pub fn pack_bits(high_us: &[u32; DHT_FRAME_BITS]) -> [u8; 5] {
    let mut bytes = [0u8; 5];
    for (index, width) in high_us.iter().enumerate() {
        if *width > DHT_ONE_THRESHOLD_US {
            bytes[index / 8] |= 0x80 >> (index % 8);
        }
    }
    bytes
}
