//! State that survives deep sleep but not a full power loss.
//!
//! The firmware keeps [`RetainedState`] in the backup-domain registers, which
//! hold five 32-bit words. [`RetainedImage`] is that five-word layout: a magic
//! marker, the three fields, and a checksum. A freshly powered backup domain
//! reads back as all zeroes, fails the magic check, and therefore decodes to
//! the zero state exactly like a cold power-on.

use core::fmt;

use crate::clock::EpochSeconds;

/// Number of 32-bit words in a [`RetainedImage`].
pub const RETAINED_WORDS: usize = 5;

/// Marker stored in word 0 of every valid image.
pub const RETAINED_MAGIC: u32 = 0xC01D_5747;

const CHECKSUM_SEED: u32 = 0x5A5A_A5A5;

/// Counters and timestamps carried from one wake episode to the next.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub struct RetainedState {
    /// Wake episodes since the last full power-on.
    pub boot_count: u32,
    /// Wall-clock time taken immediately before the last sleep entry.
    pub sleep_enter_time: EpochSeconds,
    /// Wall-clock time taken immediately after the most recent wake.
    pub wakeup_time: EpochSeconds,
}

impl RetainedState {
    /// State observed on the very first power-on.
    pub const COLD: Self = Self {
        boot_count: 0,
        sleep_enter_time: EpochSeconds::UNSET,
        wakeup_time: EpochSeconds::UNSET,
    };

    /// Returns `true` when a sleep entry has been recorded since power-on.
    #[must_use]
    pub const fn has_slept(&self) -> bool {
        !self.sleep_enter_time.is_unset()
    }

    /// Books a new wake episode: bumps the boot counter and stamps the wake time.
    ///
    /// Returns the new boot number.
    pub fn record_wake(&mut self, now: EpochSeconds) -> u32 {
        self.boot_count = self.boot_count.saturating_add(1);
        self.wakeup_time = now;
        self.boot_count
    }

    /// Stamps the sleep-entry time.
    pub fn record_sleep_entry(&mut self, now: EpochSeconds) {
        self.sleep_enter_time = now;
    }

    /// Seconds spent asleep before the current episode.
    ///
    /// `None` until a sleep entry has been recorded, so a cold power-on never
    /// measures against the zero baseline.
    #[must_use]
    pub const fn elapsed_sleep_secs(&self) -> Option<i64> {
        if self.has_slept() {
            Some(self.wakeup_time.seconds_since(self.sleep_enter_time))
        } else {
            None
        }
    }
}

/// Reasons a stored image was rejected.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RetainedImageError {
    /// Word 0 does not carry [`RETAINED_MAGIC`]; the backup domain was reset.
    BadMagic,
    /// The checksum word does not match the payload.
    Checksum,
}

impl fmt::Display for RetainedImageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RetainedImageError::BadMagic => f.write_str("retained image missing magic marker"),
            RetainedImageError::Checksum => f.write_str("retained image checksum mismatch"),
        }
    }
}

/// Five-word serialized form of [`RetainedState`].
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RetainedImage {
    words: [u32; RETAINED_WORDS],
}

impl RetainedImage {
    /// Wraps raw words read back from storage.
    #[must_use]
    pub const fn from_words(words: [u32; RETAINED_WORDS]) -> Self {
        Self { words }
    }

    /// Serializes `state`, including magic and checksum.
    #[must_use]
    pub fn encode(state: &RetainedState) -> Self {
        let mut words = [
            RETAINED_MAGIC,
            state.boot_count,
            state.sleep_enter_time.as_secs(),
            state.wakeup_time.as_secs(),
            0,
        ];
        words[4] = checksum(&words[..4]);
        Self { words }
    }

    /// Validates and deserializes the image.
    ///
    /// # Errors
    ///
    /// Returns [`RetainedImageError::BadMagic`] for a blank or foreign image and
    /// [`RetainedImageError::Checksum`] when the words were corrupted.
    pub fn decode(&self) -> Result<RetainedState, RetainedImageError> {
        if self.words[0] != RETAINED_MAGIC {
            return Err(RetainedImageError::BadMagic);
        }
        if self.words[4] != checksum(&self.words[..4]) {
            return Err(RetainedImageError::Checksum);
        }
        Ok(RetainedState {
            boot_count: self.words[1],
            sleep_enter_time: EpochSeconds::new(self.words[2]),
            wakeup_time: EpochSeconds::new(self.words[3]),
        })
    }

    /// Decodes the image, substituting [`RetainedState::COLD`] when it is invalid.
    #[must_use]
    pub fn decode_or_cold(&self) -> RetainedState {
        self.decode().unwrap_or(RetainedState::COLD)
    }

    #[must_use]
    pub const fn words(&self) -> &[u32; RETAINED_WORDS] {
        &self.words
    }
}

fn checksum(words: &[u32]) -> u32 {
    words
        .iter()
        .fold(CHECKSUM_SEED, |acc, word| acc.rotate_left(5) ^ word)
}

/// Storage for [`RetainedState`] across sleep transitions.
///
/// Implementations never fail: a corrupted or blank backing store loads as
/// [`RetainedState::COLD`], which is indistinguishable from a cold power-on.
pub trait RetainedStore {
    /// Reads the state left behind by the previous episode.
    fn load(&mut self) -> RetainedState;

    /// Persists `state` for the next episode.
    fn store(&mut self, state: &RetainedState);
}

/// In-memory store for host targets and tests.
#[derive(Copy, Clone, Debug, Default)]
pub struct MemoryStore {
    image: Option<RetainedImage>,
}

impl MemoryStore {
    #[must_use]
    pub const fn new() -> Self {
        Self { image: None }
    }

    /// Discards the stored state, simulating a full power loss.
    pub fn power_loss(&mut self) {
        self.image = None;
    }

    /// Returns the raw image if anything was stored.
    #[must_use]
    pub const fn image(&self) -> Option<&RetainedImage> {
        self.image.as_ref()
    }
}

impl RetainedStore for MemoryStore {
    fn load(&mut self) -> RetainedState {
        self.image
            .map_or(RetainedState::COLD, |image| image.decode_or_cold())
    }

    fn store(&mut self, state: &RetainedState) {
        self.image = Some(RetainedImage::encode(state));
    }
}
