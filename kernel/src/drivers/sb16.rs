//! Sound Blaster 16 (§11), out of scope per §1 beyond the `soundctrl`
//! syscall's dispatch contract. `SoundCard` is the narrow trait the
//! `soundctrl` handler calls through; this no-op implementation always
//! succeeds so the syscall's success/failure shape is exercisable without
//! real hardware.

pub trait SoundCard {
    fn play(&self, filename: &str) -> Result<(), ()>;
    fn pause(&self) -> Result<(), ()>;
    fn resume(&self) -> Result<(), ()>;
    fn stop(&self) -> Result<(), ()>;
}

pub struct NullSoundCard;

impl SoundCard for NullSoundCard {
    fn play(&self, _filename: &str) -> Result<(), ()> {
        Ok(())
    }

    fn pause(&self) -> Result<(), ()> {
        Ok(())
    }

    fn resume(&self) -> Result<(), ()> {
        Ok(())
    }

    fn stop(&self) -> Result<(), ()> {
        Ok(())
    }
}

pub static SOUND_CARD: NullSoundCard = NullSoundCard;
