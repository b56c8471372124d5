//! Measurements and their encoding
//!
//! A [`Measurement`] is an object id paired with a [`Value`]. Encoding a measurement produces the
//! little endian bytes of the value that follow the object id within the payload.
//!
//! # Scaling
//! A floating point reading is multiplied by the scaling factor of the object id and then
//! truncated toward zero. The integer is then narrowed to the size of the value by dropping the
//! high order bytes, so a negative reading ends up in two's complement.
//!
//! A scaled reading outside the range of an `i64` saturates to `i64::MAX` or `i64::MIN` before it
//! is narrowed.
//!
//! ```
//! # use bthome::measurement::encode;
//! # use bthome::{ObjectId, Value};
//! // temperature has a scale of 10 and a size of two bytes
//! let bytes = encode(ObjectId::TEMPERATURE, Value::Float(21.5)).unwrap();
//!
//! assert_eq!(&[0xD7, 0x00], &*bytes);
//! ```

use crate::object_id::ObjectId;
use crate::Error;
use core::ops::Deref;

/// The maximum size of an encoded value
///
/// A raw value larger than this cannot be encoded.
pub const SCRATCH_SIZE: usize = 8;

/// The value of a measurement
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Value<'a> {
    /// An integer already in the units of the object id
    ///
    /// Only the low order bytes that fit within the size of the object's value are used.
    Integer(u64),
    /// A reading that is scaled by the object id's scaling factor
    Float(f32),
    /// Bytes that are placed into the payload as they are
    Raw(&'a [u8]),
}

macro_rules! value_from_int {
    ( $($int:ty),* ) => {
        $(
            impl From<$int> for Value<'_> {
                fn from(v: $int) -> Self {
                    Value::Integer(v.into())
                }
            }
        )*
    }
}

value_from_int!(u8, u16, u32, u64);

impl From<bool> for Value<'_> {
    fn from(state: bool) -> Self {
        Value::Integer(state.into())
    }
}

impl From<f32> for Value<'_> {
    fn from(reading: f32) -> Self {
        Value::Float(reading)
    }
}

impl<'a> From<&'a [u8]> for Value<'a> {
    fn from(raw: &'a [u8]) -> Self {
        Value::Raw(raw)
    }
}

/// A single measurement
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Measurement<'a> {
    object_id: ObjectId,
    value: Value<'a>,
}

impl<'a> Measurement<'a> {
    /// Create a new measurement
    pub fn new<I, V>(object_id: I, value: V) -> Self
    where
        I: Into<ObjectId>,
        V: Into<Value<'a>>,
    {
        Measurement {
            object_id: object_id.into(),
            value: value.into(),
        }
    }

    /// Create a binary state measurement
    pub fn state<I: Into<ObjectId>>(object_id: I, state: bool) -> Self {
        Self::new(object_id, state)
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    pub fn value(&self) -> Value<'a> {
        self.value
    }

    /// Encode the value of this measurement
    ///
    /// See the [module](self) level documentation.
    pub fn encode(&self) -> Result<EncodedValue, Error> {
        encode(self.object_id, self.value)
    }
}

/// The bytes of an encoded value
///
/// This is a small stack buffer, it derefs to the encoded bytes.
#[derive(Clone, Copy, Default, PartialEq, Eq)]
pub struct EncodedValue {
    bytes: [u8; SCRATCH_SIZE],
    len: usize,
}

impl EncodedValue {
    fn from_le(value: u64, width: usize) -> Self {
        let mut bytes = [0u8; SCRATCH_SIZE];

        bytes[..width].copy_from_slice(&value.to_le_bytes()[..width]);

        EncodedValue { bytes, len: width }
    }

    fn from_raw(raw: &[u8]) -> Result<Self, Error> {
        if raw.len() > SCRATCH_SIZE {
            return Err(Error::Unsupported);
        }

        let mut bytes = [0u8; SCRATCH_SIZE];

        bytes[..raw.len()].copy_from_slice(raw);

        Ok(EncodedValue { bytes, len: raw.len() })
    }
}

impl Deref for EncodedValue {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        &self.bytes[..self.len]
    }
}

impl core::fmt::Debug for EncodedValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("EncodedValue")?;
        core::fmt::Debug::fmt(self.deref(), f)
    }
}

/// Scale a reading for an object id
///
/// The reading is multiplied by the scaling factor and truncated toward zero. The multiplication
/// is done in single precision. A result outside the range of an `i64` saturates.
///
/// # Error
/// The reading is NaN or infinite.
pub fn scale(object_id: ObjectId, reading: f32) -> Result<i64, Error> {
    if !reading.is_finite() {
        return Err(Error::InvalidArgument);
    }

    // `as` truncates toward zero and saturates at the bounds of i64
    Ok((reading * f32::from(object_id.scale())) as i64)
}

/// Encode a value for an object id
///
/// # Errors
/// * [`Error::InvalidArgument`] for a NaN or infinite reading
/// * [`Error::Unsupported`] for a raw value larger than [`SCRATCH_SIZE`]
pub fn encode<'a, V>(object_id: ObjectId, value: V) -> Result<EncodedValue, Error>
where
    V: Into<Value<'a>>,
{
    let value: Value<'a> = value.into();

    match value {
        Value::Integer(integer) => Ok(EncodedValue::from_le(integer, object_id.width())),
        Value::Float(reading) => {
            let scaled = scale(object_id, reading)?;

            let encoded = EncodedValue::from_le(scaled as u64, object_id.width());

            log::debug!(
                "encoded {}: value={:.2}, scaled={}, size={} bytes",
                object_id,
                reading,
                scaled,
                encoded.len()
            );

            Ok(encoded)
        }
        Value::Raw(raw) => EncodedValue::from_raw(raw),
    }
}

/// Button events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonEvent {
    None,
    Press,
    DoublePress,
    TriplePress,
    LongPress,
    LongDoublePress,
    LongTriplePress,
}

impl ButtonEvent {
    pub fn val(&self) -> u8 {
        match *self {
            ButtonEvent::None => 0x00,
            ButtonEvent::Press => 0x01,
            ButtonEvent::DoublePress => 0x02,
            ButtonEvent::TriplePress => 0x03,
            ButtonEvent::LongPress => 0x04,
            ButtonEvent::LongDoublePress => 0x05,
            ButtonEvent::LongTriplePress => 0x06,
        }
    }
}

impl From<ButtonEvent> for u8 {
    fn from(event: ButtonEvent) -> Self {
        event.val()
    }
}

/// Dimmer events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DimmerEvent {
    None,
    RotateLeft,
    RotateRight,
}

impl DimmerEvent {
    pub fn val(&self) -> u8 {
        match *self {
            DimmerEvent::None => 0x00,
            DimmerEvent::RotateLeft => 0x01,
            DimmerEvent::RotateRight => 0x02,
        }
    }
}

impl From<DimmerEvent> for u8 {
    fn from(event: DimmerEvent) -> Self {
        event.val()
    }
}

/// Encode an event
///
/// A dimmer event is followed by the number of steps the dimmer was rotated, a button event is the
/// single event byte.
///
/// # Error
/// [`Error::InvalidArgument`] is returned if `object_id` is neither [`ObjectId::BUTTON`] nor
/// [`ObjectId::DIMMER`].
pub fn encode_event(object_id: ObjectId, event: u8, steps: u8) -> Result<EncodedValue, Error> {
    match object_id {
        ObjectId::DIMMER => {
            // no steps are reported without a rotation
            let steps = if event == DimmerEvent::None.val() { 0 } else { steps };

            Ok(EncodedValue::from_le(u64::from(u16::from_le_bytes([event, steps])), 2))
        }
        ObjectId::BUTTON => Ok(EncodedValue::from_le(event.into(), 1)),
        _ => {
            log::warn!("{} is not an event object", object_id);

            Err(Error::InvalidArgument)
        }
    }
}
