//! AD structures
//!
//! Advertising data is a sequence of AD structures. Each structure is one byte for the length,
//! one byte for the AD type (an assigned number of the Bluetooth SIG), and the AD data. The length
//! is the size of the type plus the data, it does not count the length byte itself.
//!
//! A BTHome advertisement uses three AD types, the flags, the service data of a 16 bit UUID, and
//! the complete local name.

pub mod flags;
pub mod local_name;
pub mod service_data;

/// The size of the header of an AD structure
///
/// The full size of an AD structure is this plus the size of the data.
pub const HEADER_SIZE: usize = 2;

/// The maximum size of the data within an AD structure
pub const MAX_DATA_SIZE: usize = u8::MAX as usize - 1;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum AssignedTypes {
    Flags,
    CompleteLocalName,
    ServiceData16BitUUID,
}

impl AssignedTypes {
    pub fn val(&self) -> u8 {
        match *self {
            AssignedTypes::Flags => 0x01,
            AssignedTypes::CompleteLocalName => 0x09,
            AssignedTypes::ServiceData16BitUUID => 0x16,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// The assigned type within the structure is different from the expected type
    IncorrectAssignedType,
    /// The length byte contains an invalid value
    IncorrectLength,
    /// The buffer is too small for the structure
    RawTooSmall,
    /// The service data is for a different service
    IncorrectUuid(u16),
    /// The device information byte is not a BTHome v2 value
    InvalidDeviceInfo(u8),
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            Error::IncorrectAssignedType => write!(f, "Incorrect Assigned Type Field"),
            Error::IncorrectLength => write!(
                f,
                "The length of this type is larger than the remaining bytes in the packet"
            ),
            Error::RawTooSmall => write!(f, "Raw data length is too small"),
            Error::IncorrectUuid(uuid) => write!(f, "Service data is for UUID {:#06X}", uuid),
            Error::InvalidDeviceInfo(raw) => write!(f, "Invalid device information {:#04X}", raw),
        }
    }
}

impl std::error::Error for Error {}

/// An intermediary for help creating an AD Structure from a local type
///
/// The common format of an AD Structure is one byte for the length of the data, one byte for the
/// AD type, and zero or more bytes for the AD data.
struct StructIntermediate<'a> {
    len: u8,
    struct_type: u8,
    ad: &'a mut [u8],
}

impl<'a> StructIntermediate<'a> {
    /// Create an new `StructIntermediate`
    ///
    /// Input `b` is where the structure is to be placed.
    ///
    /// # Error
    /// The size of `b` is less than the header of a structure.
    fn new(b: &'a mut [u8], struct_type: u8) -> Option<Self> {
        const STRUCT_MAX_SIZE: usize = MAX_DATA_SIZE + HEADER_SIZE;

        let ad = match b.len() {
            0..=1 => return None,
            len if len > STRUCT_MAX_SIZE => &mut b[..STRUCT_MAX_SIZE],
            _ => b,
        };

        // The length starts at 1 because that is the size of the ad type
        Some(Self { len: 1, struct_type, ad })
    }

    /// Get the next byte
    fn next(&mut self) -> Option<&mut u8> {
        let len = self.len.checked_add(1)?;

        // AD struct -> [len, ad type, ad data .. ]
        let byte = self.ad.get_mut(len as usize)?;

        self.len = len;

        Some(byte)
    }

    /// Extend the AD data by `bytes`
    ///
    /// If there are not enough bytes available, then none of `bytes` are added and `None` is
    /// returned.
    fn try_extend(&mut self, bytes: &[u8]) -> Option<()> {
        let start = self.len as usize + 1;

        let end = start.checked_add(bytes.len())?;

        if end > self.ad.len() {
            return None;
        }

        self.ad[start..end].copy_from_slice(bytes);

        self.len = (end - 1) as u8;

        Some(())
    }

    /// Fill-out the length and AD type
    ///
    /// This is intended to be called at the end of an implementation of method
    /// [`convert_into`](IntoStruct::convert_into) so the return is always `Some(_)`.
    fn finish(self) -> Option<EirOrAdStruct<'a>> {
        self.ad[0] = self.len;
        self.ad[1] = self.struct_type;

        let size = 1 + self.len as usize;

        let ad: &'a [u8] = self.ad;

        Some(EirOrAdStruct(&ad[..size]))
    }
}

/// A trait for converting a local type into an AD Structure
pub trait IntoStruct {
    /// The required data length of an AD struct
    ///
    /// If the data does not have a set or required size, then an error is returned with the full
    /// size of the data. Some types that have a shortened version will return this Error.
    fn data_len(&self) -> Result<usize, usize>;

    /// Covert into its structure
    ///
    /// Input `b` is the buffer to contain the Structure. The implementor needs to create a
    /// structure and place it at the beginning of the buffer. If `b` is too small then the return
    /// is `None`.
    fn convert_into<'a>(&self, b: &'a mut [u8]) -> Option<EirOrAdStruct<'a>>;
}

/// A trait for attempting to convert an AD Structure to a local type
pub trait TryFromStruct<'a> {
    /// Attempt to convert an AD struct into this type
    fn try_from_struct(st: EirOrAdStruct<'a>) -> Result<Self, Error>
    where
        Self: Sized;
}

/// A wrapper around an AD structure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EirOrAdStruct<'a>(&'a [u8]);

impl<'a> EirOrAdStruct<'a> {
    /// Try to create a new `EirOrAdStruct`
    ///
    /// This will return a new `EirOrAdStruct` if `bytes` starts with and contains a complete AD
    /// struct. A slice to the rest of the bytes is returned with the new `EirOrAdStruct`.
    ///
    /// `None` is returned if the length in the structure is zero. This is used to indicate an
    /// early termination of the entire data sequence, so any bytes that come after it are to be
    /// ignored.
    pub fn try_new(bytes: &'a [u8]) -> Result<Option<(Self, &'a [u8])>, Error> {
        let len = *bytes.get(0).ok_or(Error::RawTooSmall)? as usize;

        match len {
            0 => Ok(None),
            len if len < bytes.len() => Ok(Some((Self(&bytes[..1 + len]), &bytes[1 + len..]))),
            _ => Err(Error::IncorrectLength),
        }
    }

    /// Return the AD type
    pub fn get_type(&self) -> u8 {
        self.0[1]
    }

    /// Get the data bytes
    pub fn get_data(&self) -> &'a [u8] {
        &self.0[HEADER_SIZE..]
    }

    /// Get the size of the structure
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Try to convert this struct into the type `T`
    pub fn try_into<T>(self) -> Result<T, Error>
    where
        T: TryFromStruct<'a>,
    {
        T::try_from_struct(self)
    }

    /// Convert into the inner struct data
    pub fn into_inner(self) -> &'a [u8] {
        self.0
    }
}

/// An iterator over AD structs
///
/// The iterator will stop if there is no more data or a length field is zero (which is used to
/// indicate an early termination).
#[derive(Clone, Copy, Debug)]
pub struct EirOrAdIterator<'a>(&'a [u8]);

impl<'a> EirOrAdIterator<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        EirOrAdIterator(data)
    }

    /// Create a iterator that doesn't report an error
    ///
    /// In general it is not the fault of the recipient when they receive incorrectly formatted AD
    /// structures, so instead of reporting an error this will just end the iteration.
    pub fn silent(self) -> impl Iterator<Item = EirOrAdStruct<'a>> + 'a {
        struct Silent<'a>(&'a [u8]);

        impl<'a> Iterator for Silent<'a> {
            type Item = EirOrAdStruct<'a>;

            fn next(&mut self) -> Option<Self::Item> {
                EirOrAdStruct::try_new(self.0).ok().flatten().map(|(ad, rest)| {
                    self.0 = rest;
                    ad
                })
            }
        }

        Silent(self.0)
    }
}

impl<'a> Iterator for EirOrAdIterator<'a> {
    type Item = Result<EirOrAdStruct<'a>, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.0.is_empty() {
            return None;
        }

        match EirOrAdStruct::try_new(self.0) {
            Ok(None) => {
                self.0 = &[];
                None
            }
            Ok(Some((ad, rest))) => {
                self.0 = rest;
                Some(Ok(ad))
            }
            Err(e) => {
                self.0 = &[];
                Some(Err(e))
            }
        }
    }
}
