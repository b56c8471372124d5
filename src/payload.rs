//! The BTHome payload
//!
//! The payload is the sequence of objects that follows the device information byte within the
//! service data. The size of the payload is limited so that the service data, with the flags and
//! a short name, fits within a legacy advertising packet. The limit is lower for an encrypted
//! payload as the encrypted form also carries a counter and a message integrity check.

use crate::measurement::Measurement;
use crate::object_id::ObjectId;
use crate::Error;
use core::ops::Deref;

/// The maximum size of an unencrypted payload
pub const MAX_PAYLOAD_SIZE: usize = 23;

/// The maximum size of a payload that is to be encrypted
pub const MAX_PAYLOAD_SIZE_ENCRYPTED: usize = 15;

/// A payload of BTHome objects
///
/// The capacity of a `PayloadBuffer` is set when it is created and never changes. Objects are
/// appended whole, if an object does not fit then nothing of it is added.
///
/// ```
/// # use bthome::payload::PayloadBuffer;
/// # use bthome::ObjectId;
/// let mut payload = PayloadBuffer::new(false);
///
/// payload.append(ObjectId::BATTERY, &[97]).unwrap();
///
/// assert_eq!(&[0x01, 97], &*payload);
/// ```
#[derive(Clone)]
pub struct PayloadBuffer {
    bytes: [u8; MAX_PAYLOAD_SIZE],
    len: usize,
    capacity: usize,
}

impl PayloadBuffer {
    /// Create a new, empty payload
    ///
    /// The capacity is [`MAX_PAYLOAD_SIZE_ENCRYPTED`] if `encrypted` is true, otherwise it is
    /// [`MAX_PAYLOAD_SIZE`].
    pub fn new(encrypted: bool) -> Self {
        let capacity = if encrypted {
            MAX_PAYLOAD_SIZE_ENCRYPTED
        } else {
            MAX_PAYLOAD_SIZE
        };

        PayloadBuffer {
            bytes: [0u8; MAX_PAYLOAD_SIZE],
            len: 0,
            capacity,
        }
    }

    /// Append an object
    ///
    /// The object id followed by `value` is appended to the payload.
    ///
    /// # Error
    /// [`Error::CapacityExceeded`] is returned if there is not enough room for both the object id
    /// and the value. The payload is left unchanged.
    pub fn append<I: Into<ObjectId>>(&mut self, object_id: I, value: &[u8]) -> Result<(), Error> {
        let object_id = object_id.into();

        let required = 1 + value.len();

        if self.len + required > self.capacity {
            log::warn!("Payload full, cannot add object {}", object_id);

            return Err(Error::CapacityExceeded {
                required,
                remaining: self.remaining(),
            });
        }

        self.bytes[self.len] = object_id.val();

        self.bytes[(self.len + 1)..(self.len + required)].copy_from_slice(value);

        self.len += required;

        log::debug!(
            "Added object {}, size {}, total payload: {}",
            object_id,
            value.len(),
            self.len
        );

        Ok(())
    }

    /// Encode and append a measurement
    ///
    /// # Error
    /// Either the measurement could not be encoded or the payload does not have room for it.
    pub fn push_measurement(&mut self, measurement: &Measurement<'_>) -> Result<(), Error> {
        let value = measurement.encode()?;

        self.append(measurement.object_id(), &value)
    }

    /// Remove all objects
    ///
    /// The capacity is unchanged.
    pub fn reset(&mut self) {
        self.len = 0;

        log::debug!("Measurements reset");
    }

    /// Get the number of bytes within the payload
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get the maximum number of bytes of this payload
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Get the number of bytes that can still be appended
    pub fn remaining(&self) -> usize {
        self.capacity - self.len
    }
}

impl Deref for PayloadBuffer {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.bytes[..self.len]
    }
}

impl AsRef<[u8]> for PayloadBuffer {
    fn as_ref(&self) -> &[u8] {
        self.deref()
    }
}

impl core::fmt::Debug for PayloadBuffer {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PayloadBuffer")
            .field("capacity", &self.capacity)
            .field("bytes", &self.deref())
            .finish()
    }
}
