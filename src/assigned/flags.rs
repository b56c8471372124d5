//! Advertising Data: Flags

use super::*;

/// The flags assigned by the Bluetooth SIG that a BTHome device sets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CoreFlags {
    /// LE general discoverable mode
    LEGeneralDiscoverableMode,
    /// BR/EDR not supported
    BREDRNotSupported,
}

impl CoreFlags {
    fn get_position(&self) -> u8 {
        match *self {
            CoreFlags::LEGeneralDiscoverableMode => 1,
            CoreFlags::BREDRNotSupported => 2,
        }
    }
}

/// The flags AD structure
///
/// Only the first octet of the flags is supported, the remaining bits of it are reserved.
///
/// ```
/// # use bthome::assigned::flags::{CoreFlags, Flags};
/// let mut flags = Flags::new();
///
/// flags
///     .enable(CoreFlags::LEGeneralDiscoverableMode)
///     .enable(CoreFlags::BREDRNotSupported);
///
/// assert_eq!(0x06, flags.val());
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Flags(u8);

impl Flags {
    const AD_TYPE: AssignedTypes = AssignedTypes::Flags;

    /// Creates a flags object with no enabled flag
    pub fn new() -> Self {
        Flags(0)
    }

    /// The flags of a BTHome advertisement
    ///
    /// A BTHome device is always general discoverable and never supports BR/EDR.
    pub fn bthome() -> Self {
        let mut flags = Flags::new();

        flags
            .enable(CoreFlags::LEGeneralDiscoverableMode)
            .enable(CoreFlags::BREDRNotSupported);

        flags
    }

    pub fn enable(&mut self, flag: CoreFlags) -> &mut Self {
        self.0 |= 1 << flag.get_position();
        self
    }

    /// Get the flags octet
    pub fn val(&self) -> u8 {
        self.0
    }
}

impl IntoStruct for Flags {
    fn data_len(&self) -> Result<usize, usize> {
        Ok(1)
    }

    fn convert_into<'a>(&self, b: &'a mut [u8]) -> Option<EirOrAdStruct<'a>> {
        let mut interm = StructIntermediate::new(b, Self::AD_TYPE.val())?;

        *interm.next()? = self.0;

        interm.finish()
    }
}
