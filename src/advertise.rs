//! Building the advertising data
//!
//! A BTHome advertisement is made up of three AD structures, in this order
//! 1. the flags (LE general discoverable mode and BR/EDR not supported)
//! 2. the BTHome service data
//! 3. the complete local name

use crate::assigned::flags::Flags;
use crate::assigned::local_name::LocalName;
use crate::assigned::service_data::ServiceData;
use crate::assigned::{EirOrAdStruct, IntoStruct, HEADER_SIZE, MAX_DATA_SIZE};
use crate::device_info::DeviceInfo;
use crate::Error;

/// The 16 bit UUID assigned to BTHome
pub const SERVICE_UUID: u16 = 0xFCD2;

/// The BTHome service UUID as a full 128 bit UUID
#[cfg(feature = "uuid-crate")]
pub fn service_uuid() -> uuid::Uuid {
    const BLUETOOTH_BASE_UUID: u128 = 0x0000_0000_0000_1000_8000_0080_5F9B_34FB;

    uuid::Uuid::from_u128(BLUETOOTH_BASE_UUID | (u128::from(SERVICE_UUID) << 96))
}

/// A single AD structure
///
/// This is the full structure, the length byte, the AD type, and the AD data.
#[derive(Clone, PartialEq, Eq)]
pub struct AdElement(Vec<u8>);

impl AdElement {
    /// Convert a type into an AD element
    ///
    /// `None` is returned if the data of `data` is too large for an AD structure.
    pub fn from_struct<T: IntoStruct>(data: &T) -> Option<Self> {
        let data_len = match data.data_len() {
            Ok(len) | Err(len) => len,
        };

        if data_len > MAX_DATA_SIZE {
            return None;
        }

        let mut buffer = vec![0u8; data_len + HEADER_SIZE];

        let size = data.convert_into(&mut buffer)?.size();

        buffer.truncate(size);

        Some(AdElement(buffer))
    }

    /// Get the AD type
    pub fn get_type(&self) -> u8 {
        self.0[1]
    }

    /// Get the AD data
    pub fn get_data(&self) -> &[u8] {
        &self.0[HEADER_SIZE..]
    }

    /// Get the structure as it is sent
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Get the element as an [`EirOrAdStruct`]
    pub fn as_struct(&self) -> EirOrAdStruct<'_> {
        // an `AdElement` is always a single complete structure
        match EirOrAdStruct::try_new(&self.0) {
            Ok(Some((st, _))) => st,
            _ => unreachable!("AdElement is not a complete AD structure"),
        }
    }
}

impl core::fmt::Debug for AdElement {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdElement")
            .field("type", &format_args!("{:#04X}", self.get_type()))
            .field("data", &self.get_data())
            .finish()
    }
}

/// The AD elements of a BTHome advertisement
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdElements([AdElement; 3]);

impl AdElements {
    pub fn flags(&self) -> &AdElement {
        &self.0[0]
    }

    pub fn service_data(&self) -> &AdElement {
        &self.0[1]
    }

    pub fn local_name(&self) -> &AdElement {
        &self.0[2]
    }

    pub fn iter(&self) -> core::slice::Iter<'_, AdElement> {
        self.0.iter()
    }

    /// Get the elements in the order they are advertised
    pub fn as_slice(&self) -> &[AdElement] {
        &self.0
    }

    /// Concatenate the elements into advertising data
    pub fn to_bytes(&self) -> Vec<u8> {
        self.iter().flat_map(|element| element.as_bytes().iter().copied()).collect()
    }
}

impl<'a> IntoIterator for &'a AdElements {
    type Item = &'a AdElement;
    type IntoIter = core::slice::Iter<'a, AdElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

fn hex_dump(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02X}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Build the advertising data
///
/// # Errors
/// * [`Error::NoData`] if `payload` is empty
/// * [`Error::InvalidArgument`] if `device_name` is too long for an AD structure
///
/// ```
/// # use bthome::advertise::build;
/// # use bthome::DeviceInfo;
/// let elements = build(DeviceInfo::NoEncrypt, &[0x01, 97], "Sensor").unwrap();
///
/// assert_eq!(&[0xD2, 0xFC, 0x40, 0x01, 97], elements.service_data().get_data());
/// ```
pub fn build(device_info: DeviceInfo, payload: &[u8], device_name: &str) -> Result<AdElements, Error> {
    if payload.is_empty() {
        log::warn!("No measurements to advertise");

        return Err(Error::NoData);
    }

    let flags = AdElement::from_struct(&Flags::bthome()).ok_or(Error::InvalidArgument)?;

    let service_data =
        AdElement::from_struct(&ServiceData::new(device_info, payload)).ok_or(Error::InvalidArgument)?;

    let local_name = AdElement::from_struct(&LocalName::new(device_name)).ok_or_else(|| {
        log::warn!("device name of {} bytes is too long", device_name.len());

        Error::InvalidArgument
    })?;

    log::info!(
        "BTHome advertisement: device info {:#04X}, {} payload bytes, name \"{}\"",
        device_info.val(),
        payload.len(),
        device_name
    );

    log::debug!("service data: {}", hex_dump(service_data.get_data()));

    Ok(AdElements([flags, service_data, local_name]))
}
