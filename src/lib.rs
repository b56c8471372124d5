//! BTHome v2 for Bluetooth LE sensors
//!
//! [BTHome](https://bthome.io/) is an open format for broadcasting sensor readings within the
//! service data of Bluetooth LE advertising. A BTHome advertisement is a *Service Data - 16 bit
//! UUID* AD structure with the UUID `0xFCD2`, a device information byte, and then a sequence of
//! objects. Each object is an object id followed by its value in little endian, where the size and
//! the fixed point scaling of the value is determined by the object id.
//!
//! A measurement cycle is
//! 1. reset the [`PayloadBuffer`](payload::PayloadBuffer)
//! 2. encode measurements into it (see [`measurement`])
//! 3. build the advertising data with [`advertise::build`]
//! 4. start broadcasting with an [`Advertiser`](advertiser::Advertiser), optionally for a limited
//!    duration.
//!
//! [`BtHomeDevice`](device::BtHomeDevice) wraps all of these into one type.
//!
//! This library does not talk to a Bluetooth controller. Broadcasting is done through an
//! implementation of [`AdvertisingTransport`](advertiser::AdvertisingTransport) and the deferred
//! stop of a limited advertisement through an implementation of
//! [`Scheduler`](advertiser::scheduler::Scheduler).

#![cfg_attr(docsrs, feature(doc_auto_cfg))]

pub mod address;
pub mod advertise;
pub mod advertiser;
pub mod assigned;
pub mod device;
pub mod device_info;
pub mod measurement;
pub mod object_id;
pub mod payload;

pub use advertise::{AdElement, AdElements, SERVICE_UUID};
pub use advertiser::{AdvertiseError, Advertiser, AdvertisingParameters, AdvertisingState, AdvertisingTransport};
pub use device::{BtHomeDevice, DeviceConfig};
pub use device_info::DeviceInfo;
pub use measurement::{Measurement, Value};
pub use object_id::ObjectId;
pub use payload::PayloadBuffer;

use core::fmt;

/// Errors of the payload codec
///
/// These are the errors for encoding measurements, filling a payload, and building an
/// advertisement. None of these are retried by this library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// An argument is not valid for the operation
    ///
    /// This is returned for a measurement value that cannot be represented (a NaN or infinite
    /// reading), a device name too long for an AD structure, or invalid advertising parameters.
    InvalidArgument,
    /// The payload does not have room for the object
    CapacityExceeded {
        /// The number of bytes needed for the object id and value
        required: usize,
        /// The number of bytes left in the payload
        remaining: usize,
    },
    /// There are no measurements to advertise
    NoData,
    /// A raw value is larger than the scratch space for encoding a value
    Unsupported,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::InvalidArgument => f.write_str("invalid argument"),
            Error::CapacityExceeded { required, remaining } => write!(
                f,
                "payload capacity exceeded, {} bytes are required but only {} bytes remain",
                required, remaining
            ),
            Error::NoData => f.write_str("no measurements to advertise"),
            Error::Unsupported => write!(
                f,
                "raw value is larger than {} bytes",
                measurement::SCRATCH_SIZE
            ),
        }
    }
}

impl std::error::Error for Error {}
