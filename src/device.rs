//! A BTHome device
//!
//! [`BtHomeDevice`] owns the payload of a device and its advertising lifecycle. The usual cycle
//! is to reset the measurements, add the new readings, and advertise them for a while.
//!
//! ```
//! # use bthome::advertiser::scheduler::Scheduler;
//! # use bthome::{AdElement, AdvertisingParameters, AdvertisingTransport, BtHomeDevice, DeviceConfig, ObjectId};
//! # use std::time::Duration;
//! # struct Radio;
//! # impl AdvertisingTransport for Radio {
//! #     type Error = ();
//! #     fn start(&mut self, _: &AdvertisingParameters, _: &[AdElement]) -> Result<(), ()> { Ok(()) }
//! #     fn update(&mut self, _: &[AdElement]) -> Result<(), ()> { Ok(()) }
//! #     fn stop(&mut self) -> Result<(), ()> { Ok(()) }
//! # }
//! # struct NoTimer;
//! # impl Scheduler for NoTimer {
//! #     type Handle = ();
//! #     fn schedule<F: FnOnce() + Send + 'static>(&self, _: Duration, _: F) {}
//! #     fn cancel(&self, _: ()) {}
//! # }
//! let mut device = BtHomeDevice::new(DeviceConfig::new("Kitchen"), Radio, NoTimer);
//!
//! device.reset_measurements();
//! device.add_sensor(ObjectId::TEMPERATURE, 21.5).unwrap();
//! device.add_sensor(ObjectId::HUMIDITY, 45.0).unwrap();
//!
//! device.advertise(Duration::from_secs(2)).unwrap();
//!
//! assert!(device.is_advertising());
//! ```

use crate::advertise::{self, AdElements};
use crate::advertiser::scheduler::Scheduler;
use crate::advertiser::{AdvertiseError, Advertiser, AdvertisingParameters, AdvertisingTransport};
use crate::device_info::DeviceInfo;
use crate::measurement::{encode_event, Measurement, Value};
use crate::object_id::ObjectId;
use crate::payload::PayloadBuffer;
use crate::Error;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// The configuration of a device
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceConfig {
    /// The complete local name that is advertised
    pub device_name: String,
    /// The payload is to be encrypted
    ///
    /// This only reduces the capacity of the payload and sets the encryption flag of the device
    /// information, the payload is not encrypted by this library.
    pub encryption: bool,
    /// The device advertises irregularly, such as when a button is pressed
    pub trigger_based: bool,
    pub parameters: AdvertisingParameters,
}

impl DeviceConfig {
    /// Create a configuration with the default flags and advertising parameters
    pub fn new<N: Into<String>>(device_name: N) -> Self {
        DeviceConfig {
            device_name: device_name.into(),
            encryption: false,
            trigger_based: false,
            parameters: AdvertisingParameters::default(),
        }
    }

    pub fn device_info(&self) -> DeviceInfo {
        DeviceInfo::new(self.encryption, self.trigger_based)
    }

    /// Serialize the configuration for storage
    pub fn to_bytes(&self) -> Result<Vec<u8>, bincode::Error> {
        bincode::serialize(self)
    }

    /// Deserialize a configuration that was created by [`to_bytes`](DeviceConfig::to_bytes)
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, bincode::Error> {
        bincode::deserialize(bytes)
    }
}

/// A BTHome device
pub struct BtHomeDevice<T, S: Scheduler> {
    config: DeviceConfig,
    payload: PayloadBuffer,
    advertiser: Advertiser<T, S>,
}

impl<T, S> BtHomeDevice<T, S>
where
    T: AdvertisingTransport + Send + 'static,
    T::Error: core::fmt::Debug,
    S: Scheduler,
{
    pub fn new(config: DeviceConfig, transport: T, scheduler: S) -> Self {
        log::info!("BTHome device initialized: {}", config.device_name);
        log::info!(
            "Encryption: {}, Trigger-based: {}",
            if config.encryption { "enabled" } else { "disabled" },
            if config.trigger_based { "yes" } else { "no" },
        );

        BtHomeDevice {
            payload: PayloadBuffer::new(config.encryption),
            advertiser: Advertiser::new(transport, scheduler),
            config,
        }
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Clear the measurements
    pub fn reset_measurements(&mut self) {
        self.payload.reset()
    }

    /// Add a measurement to the payload
    pub fn add_measurement(&mut self, measurement: &Measurement<'_>) -> Result<(), Error> {
        self.payload.push_measurement(measurement)
    }

    /// Add a sensor reading
    ///
    /// The reading is scaled by the scaling factor of the object id.
    pub fn add_sensor<I: Into<ObjectId>>(&mut self, object_id: I, reading: f32) -> Result<(), Error> {
        self.add_measurement(&Measurement::new(object_id, Value::Float(reading)))
    }

    /// Add a binary state
    pub fn add_state<I: Into<ObjectId>>(&mut self, object_id: I, state: bool) -> Result<(), Error> {
        self.add_measurement(&Measurement::state(object_id, state))
    }

    /// Add an event
    ///
    /// `steps` is only used for a dimmer event.
    ///
    /// # Error
    /// [`Error::InvalidArgument`] is returned if `object_id` is not the button or the dimmer.
    ///
    /// ```ignore
    /// device.add_event(ObjectId::BUTTON, ButtonEvent::DoublePress, 0)?;
    /// device.add_event(ObjectId::DIMMER, DimmerEvent::RotateLeft, 3)?;
    /// ```
    pub fn add_event<I, E>(&mut self, object_id: I, event: E, steps: u8) -> Result<(), Error>
    where
        I: Into<ObjectId>,
        E: Into<u8>,
    {
        let object_id = object_id.into();

        let value = encode_event(object_id, event.into(), steps)?;

        self.payload.append(object_id, &value)
    }

    /// Get the payload
    pub fn payload(&self) -> &PayloadBuffer {
        &self.payload
    }

    /// Build the advertising data of the current payload
    pub fn advertisement(&self) -> Result<AdElements, Error> {
        advertise::build(self.config.device_info(), &self.payload, &self.config.device_name)
    }

    /// Advertise the current payload
    ///
    /// Advertising stops after `duration`, or continues until
    /// [`stop_advertising`](BtHomeDevice::stop_advertising) is called if `duration` is zero. If the
    /// device is already advertising it is restarted.
    ///
    /// # Error
    /// [`Error::NoData`] (as [`AdvertiseError::Codec`]) is returned if there are no measurements.
    pub fn advertise(&mut self, duration: Duration) -> Result<(), AdvertiseError<T::Error>> {
        let elements = self.advertisement()?;

        self.advertiser.start(&self.config.parameters, &elements, duration)?;

        log::info!("BTHome advertising started (payload: {} bytes)", self.payload.len());

        Ok(())
    }

    /// Replace the advertised data with the current payload
    ///
    /// This does not change when advertising stops.
    ///
    /// # Error
    /// [`AdvertiseError::NotAdvertising`] is returned if the device is not advertising.
    pub fn update_advertisement(&mut self) -> Result<(), AdvertiseError<T::Error>> {
        if !self.advertiser.is_advertising() {
            return Err(AdvertiseError::NotAdvertising);
        }

        let elements = self.advertisement()?;

        self.advertiser.update(&elements)
    }

    /// Stop advertising
    pub fn stop_advertising(&mut self) -> Result<(), AdvertiseError<T::Error>> {
        self.advertiser.stop()
    }

    pub fn is_advertising(&self) -> bool {
        self.advertiser.is_advertising()
    }
}
