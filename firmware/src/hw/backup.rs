//! Retained state in the TAMP backup registers.
//!
//! `BKP0R`..`BKP4R` hold one [`RetainedImage`]. The registers keep their
//! contents through standby and lose them only with the backup domain.

use embassy_stm32::pac;

use coldstart_core::retained::{RETAINED_WORDS, RetainedImage, RetainedState, RetainedStore};

/// [`RetainedStore`] over the first five backup registers.
pub struct BackupRegisterStore {
    _private: (),
}

impl BackupRegisterStore {
    /// Unlocks backup-domain writes and takes over the registers.
    pub fn unlock() -> Self {
        pac::PWR.cr1().modify(|w| w.set_dbp(true));
        Self { _private: () }
    }
}

impl RetainedStore for BackupRegisterStore {
    fn load(&mut self) -> RetainedState {
        let mut words = [0u32; RETAINED_WORDS];
        for (index, word) in words.iter_mut().enumerate() {
            *word = pac::TAMP.bkpr(index).read().bkp();
        }
        match RetainedImage::from_words(words).decode() {
            Ok(state) => state,
            Err(err) => {
                defmt::info!("backup: {}, starting cold", defmt::Display2Format(&err));
                RetainedState::COLD
            }
        }
    }

    fn store(&mut self, state: &RetainedState) {
        let image = RetainedImage::encode(state);
        for (index, word) in image.words().iter().enumerate() {
            pac::TAMP.bkpr(index).write(|w| w.set_bkp(*word));
        }
    }
}
