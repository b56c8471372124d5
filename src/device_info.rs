//! The BTHome device information byte
//!
//! The first byte after the UUID of the service data is the device information. Bit 0 is the
//! encryption flag, bit 2 is the trigger based flag (the device does not advertise at a regular
//! interval), and bits 5 to 7 are the BTHome version. Only version 2 is supported.

/// The BTHome version within the device information
const VERSION_2: u8 = 2 << 5;

const ENCRYPTION_FLAG: u8 = 1 << 0;

const TRIGGER_BASED_FLAG: u8 = 1 << 2;

/// Device information
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DeviceInfo {
    /// Not encrypted and advertising at a regular interval
    NoEncrypt,
    /// Not encrypted and advertising irregularly
    NoEncryptTrigger,
    /// Encrypted and advertising at a regular interval
    Encrypt,
    /// Encrypted and advertising irregularly
    EncryptTrigger,
}

impl DeviceInfo {
    /// Create the device information
    pub fn new(encrypted: bool, trigger_based: bool) -> Self {
        match (encrypted, trigger_based) {
            (false, false) => DeviceInfo::NoEncrypt,
            (false, true) => DeviceInfo::NoEncryptTrigger,
            (true, false) => DeviceInfo::Encrypt,
            (true, true) => DeviceInfo::EncryptTrigger,
        }
    }

    /// Get the byte value
    pub fn val(&self) -> u8 {
        match *self {
            DeviceInfo::NoEncrypt => VERSION_2,
            DeviceInfo::NoEncryptTrigger => VERSION_2 | TRIGGER_BASED_FLAG,
            DeviceInfo::Encrypt => VERSION_2 | ENCRYPTION_FLAG,
            DeviceInfo::EncryptTrigger => VERSION_2 | ENCRYPTION_FLAG | TRIGGER_BASED_FLAG,
        }
    }

    pub fn is_encrypted(&self) -> bool {
        self.val() & ENCRYPTION_FLAG != 0
    }

    pub fn is_trigger_based(&self) -> bool {
        self.val() & TRIGGER_BASED_FLAG != 0
    }
}

impl From<DeviceInfo> for u8 {
    fn from(info: DeviceInfo) -> Self {
        info.val()
    }
}

impl core::convert::TryFrom<u8> for DeviceInfo {
    type Error = u8;

    /// Try to convert a raw device information byte
    ///
    /// The raw byte is returned as the error if it is not one of the four BTHome v2 values.
    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        [
            DeviceInfo::NoEncrypt,
            DeviceInfo::NoEncryptTrigger,
            DeviceInfo::Encrypt,
            DeviceInfo::EncryptTrigger,
        ]
        .iter()
        .copied()
        .find(|info| info.val() == raw)
        .ok_or(raw)
    }
}
