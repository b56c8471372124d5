//! BTHome service data
//!
//! The BTHome AD structure is *Service Data - 16 bit UUID* with the UUID `0xFCD2`. The service
//! data is the device information byte followed by the payload of objects.

use super::*;
use crate::device_info::DeviceInfo;
use crate::object_id::ObjectId;
use core::convert::TryFrom;

/// The size of the UUID and the device information
const SERVICE_DATA_HEADER_SIZE: usize = 3;

/// BTHome service data
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ServiceData<'a> {
    device_info: DeviceInfo,
    payload: &'a [u8],
}

impl<'a> ServiceData<'a> {
    const AD_TYPE: AssignedTypes = AssignedTypes::ServiceData16BitUUID;

    pub fn new(device_info: DeviceInfo, payload: &'a [u8]) -> Self {
        ServiceData { device_info, payload }
    }

    /// Find the BTHome service data within advertising data
    ///
    /// `ad` is the full advertising data (a sequence of AD structures). Structures that are not
    /// service data for the BTHome UUID are skipped. Malformed AD structures end the search.
    pub fn find(ad: &'a [u8]) -> Option<Result<Self, Error>> {
        EirOrAdIterator::new(ad)
            .silent()
            .filter(|st| st.get_type() == Self::AD_TYPE.val())
            .map(|st| st.try_into::<ServiceData>())
            .find(|rslt| !matches!(rslt, Err(Error::IncorrectUuid(_))))
    }

    pub fn get_uuid(&self) -> u16 {
        crate::advertise::SERVICE_UUID
    }

    pub fn device_info(&self) -> DeviceInfo {
        self.device_info
    }

    /// Get the payload bytes
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Iterate over the objects of the payload
    ///
    /// The size of each value is looked up from the object id. An encrypted payload cannot be
    /// iterated, the iterator immediately returns `None`.
    pub fn objects(&self) -> Objects<'a> {
        let payload: &'a [u8] = if self.device_info.is_encrypted() {
            &[]
        } else {
            self.payload
        };

        Objects(payload)
    }
}

impl IntoStruct for ServiceData<'_> {
    fn data_len(&self) -> Result<usize, usize> {
        Ok(SERVICE_DATA_HEADER_SIZE + self.payload.len())
    }

    fn convert_into<'a>(&self, b: &'a mut [u8]) -> Option<EirOrAdStruct<'a>> {
        let mut interm = StructIntermediate::new(b, Self::AD_TYPE.val())?;

        interm.try_extend(&crate::advertise::SERVICE_UUID.to_le_bytes())?;

        *interm.next()? = self.device_info.val();

        interm.try_extend(self.payload)?;

        interm.finish()
    }
}

impl<'a> TryFromStruct<'a> for ServiceData<'a> {
    fn try_from_struct(st: EirOrAdStruct<'a>) -> Result<Self, Error> {
        if st.get_type() != Self::AD_TYPE.val() {
            return Err(Error::IncorrectAssignedType);
        }

        let data = st.get_data();

        if data.len() < SERVICE_DATA_HEADER_SIZE {
            return Err(Error::IncorrectLength);
        }

        let uuid = u16::from_le_bytes([data[0], data[1]]);

        if uuid != crate::advertise::SERVICE_UUID {
            return Err(Error::IncorrectUuid(uuid));
        }

        let device_info = DeviceInfo::try_from(data[2]).map_err(Error::InvalidDeviceInfo)?;

        Ok(ServiceData {
            device_info,
            payload: &data[SERVICE_DATA_HEADER_SIZE..],
        })
    }
}

/// An object within a payload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Object<'a> {
    object_id: ObjectId,
    value: &'a [u8],
}

impl<'a> Object<'a> {
    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    /// Get the little endian value bytes
    pub fn value(&self) -> &'a [u8] {
        self.value
    }

    /// Get the value as an unsigned integer
    pub fn to_unsigned(&self) -> u64 {
        let mut bytes = [0u8; 8];

        bytes[..self.value.len()].copy_from_slice(self.value);

        u64::from_le_bytes(bytes)
    }

    /// Get the value as a sign extended integer
    pub fn to_signed(&self) -> i64 {
        let bits = 8 * self.value.len() as u32;

        match bits {
            0 => 0,
            64 => self.to_unsigned() as i64,
            _ => {
                let shift = 64 - bits;

                ((self.to_unsigned() << shift) as i64) >> shift
            }
        }
    }
}

/// Iterator over the objects of a payload
///
/// Once an error is returned the iterator is finished.
#[derive(Clone, Debug)]
pub struct Objects<'a>(&'a [u8]);

impl<'a> Iterator for Objects<'a> {
    type Item = Result<Object<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let (id, rest) = self.0.split_first()?;

        let object_id = ObjectId::new(*id);

        // the registry never has a value wider than eight bytes
        let width = object_id.width();

        if rest.len() < width {
            self.0 = &[];

            return Some(Err(Error::IncorrectLength));
        }

        let (value, rest) = rest.split_at(width);

        self.0 = rest;

        Some(Ok(Object { object_id, value }))
    }
}
