//! Static random device address
//!
//! A static random address has the two most significant bits set. It is either fixed for the
//! lifetime of the device, derived from a factory programmed device id or the public MAC, or
//! generated once at power up.

use serde::{Deserialize, Serialize};

/// The bits that mark an address as static random
const STATIC_RANDOM_BITS: u8 = 0xC0;

/// A static random address
///
/// The bytes are in little endian order, the last byte is the most significant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StaticRandomAddress([u8; 6]);

impl StaticRandomAddress {
    /// Derive an address from a factory device id
    ///
    /// The low word is the first four bytes, the low byte of the high word is the fifth byte, and
    /// the next six bits of the high word form the sixth byte with the static random bits.
    pub fn from_device_id(low: u32, high: u32) -> Self {
        let mut address = [0u8; 6];

        address[..4].copy_from_slice(&low.to_le_bytes());
        address[4] = high as u8;
        address[5] = ((high >> 8) as u8 & 0x3F) | STATIC_RANDOM_BITS;

        StaticRandomAddress(address)
    }

    /// Derive an address from a base MAC
    ///
    /// The most significant byte is the last byte of `mac`.
    pub fn from_base_mac(mac: [u8; 6]) -> Self {
        let mut address = mac;

        address[5] |= STATIC_RANDOM_BITS;

        StaticRandomAddress(address)
    }

    /// Generate a random address
    ///
    /// # Error
    /// The operating system's random number generator failed.
    pub fn random() -> Result<Self, rand_core::Error> {
        use rand_core::RngCore;

        let mut address = [0u8; 6];

        // the random part must not be all zeros or all ones
        loop {
            rand_core::OsRng.try_fill_bytes(&mut address)?;

            address[5] |= STATIC_RANDOM_BITS;

            let random_part = u64::from_le_bytes([
                address[0],
                address[1],
                address[2],
                address[3],
                address[4],
                address[5] & !STATIC_RANDOM_BITS,
                0,
                0,
            ]);

            if random_part != 0 && random_part != 0x3F_FF_FF_FF_FF_FF {
                break;
            }
        }

        Ok(StaticRandomAddress(address))
    }

    /// Check that the static random bits are set
    ///
    /// This is always true for an address created by this library, it is only false for an address
    /// that was deserialized from something else.
    pub fn is_static_random(&self) -> bool {
        self.0[5] & STATIC_RANDOM_BITS == STATIC_RANDOM_BITS
    }

    /// Get the little endian address bytes
    pub fn into_inner(self) -> [u8; 6] {
        self.0
    }
}

impl core::ops::Deref for StaticRandomAddress {
    type Target = [u8; 6];

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl core::fmt::Display for StaticRandomAddress {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
            self.0[5], self.0[4], self.0[3], self.0[2], self.0[1], self.0[0]
        )
    }
}
