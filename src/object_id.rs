//! BTHome object ids
//!
//! Every object within a BTHome payload starts with an object id. The object id is the assigned
//! meaning of the value that follows it, and it also determines the size of the value and the
//! factor the real reading was multiplied by before it was truncated into an integer. The receiver
//! has no other way of knowing where an object ends, so the size of every value must be known
//! by the sender.
//!
//! The registry within this module is a table of 256 entries, one for every possible object id.
//! Ids that are not assigned in the table have a default entry of a two byte unscaled value. Using
//! an unassigned id is allowed, but a warning is logged every time its size is looked up.

use lazy_static::lazy_static;

/// The size of the value for an object id that is not within the registry
pub const DEFAULT_WIDTH: usize = 2;

/// The scaling factor for an object id that is not within the registry
pub const DEFAULT_SCALE: u16 = 1;

/// An entry within the object id registry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ObjectIdEntry {
    id: u8,
    width: u8,
    scale: u16,
    name: &'static str,
    known: bool,
}

impl ObjectIdEntry {
    const UNKNOWN: ObjectIdEntry = ObjectIdEntry {
        id: 0,
        width: DEFAULT_WIDTH as u8,
        scale: DEFAULT_SCALE,
        name: "unknown",
        known: false,
    };

    const fn known(id: u8, width: u8, scale: u16, name: &'static str) -> Self {
        ObjectIdEntry {
            id,
            width,
            scale,
            name,
            known: true,
        }
    }

    /// Get the object id of this entry
    pub fn id(&self) -> ObjectId {
        ObjectId(self.id)
    }

    /// Get the number of bytes of the value
    pub fn width(&self) -> usize {
        self.width.into()
    }

    /// Get the factor a reading is multiplied by before it is truncated to an integer
    pub fn scale(&self) -> u16 {
        self.scale
    }

    /// Get the name of the object
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Check if the object id is assigned within the registry
    pub fn is_known(&self) -> bool {
        self.known
    }
}

/// An object id
///
/// The assigned object ids are associated constants of `ObjectId`, but any `u8` can be converted
/// into an `ObjectId`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectId(u8);

impl ObjectId {
    /// Create an object id from its raw value
    pub const fn new(raw: u8) -> Self {
        ObjectId(raw)
    }

    /// Get the raw value
    pub const fn val(self) -> u8 {
        self.0
    }

    /// Get the registry entry for this object id
    pub fn entry(self) -> &'static ObjectIdEntry {
        &REGISTRY[self.0 as usize]
    }

    /// Get the number of bytes of the value
    ///
    /// See [`width_of`].
    pub fn width(self) -> usize {
        width_of(self.0)
    }

    /// Get the scaling factor of the value
    ///
    /// See [`scale_of`].
    pub fn scale(self) -> u16 {
        scale_of(self.0)
    }
}

impl From<u8> for ObjectId {
    fn from(raw: u8) -> Self {
        ObjectId(raw)
    }
}

impl From<ObjectId> for u8 {
    fn from(id: ObjectId) -> Self {
        id.0
    }
}

impl core::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "{:#04X} ({})", self.0, self.entry().name)
    }
}

macro_rules! registry {
    ( $( $(#[$doc:meta])* $name:ident = ($id:literal, $width:literal, $scale:literal, $label:literal), )* ) => {
        impl ObjectId {
            $(
                $(#[$doc])*
                pub const $name: ObjectId = ObjectId($id);
            )*
        }

        const ASSIGNED: &[ObjectIdEntry] = &[
            $( ObjectIdEntry::known($id, $width, $scale, $label), )*
        ];
    };
}

registry! {
    /// Packet id, used by receivers to drop duplicated advertisements
    PACKET_ID = (0x00, 1, 1, "packet id"),
    /// Battery in %
    BATTERY = (0x01, 1, 1, "battery"),
    /// Temperature in 0.01 °C
    TEMPERATURE_PRECISE = (0x02, 2, 100, "temperature"),
    /// Humidity in 0.01 %
    HUMIDITY_PRECISE = (0x03, 2, 100, "humidity"),
    /// Pressure in 0.01 hPa
    PRESSURE = (0x04, 3, 100, "pressure"),
    /// Illuminance in 0.01 lux
    ILLUMINANCE = (0x05, 3, 100, "illuminance"),
    /// Mass in 0.01 kg
    MASS_KG = (0x06, 2, 100, "mass (kg)"),
    /// Mass in 0.01 lb
    MASS_LB = (0x07, 2, 100, "mass (lb)"),
    /// Dew point in 0.01 °C
    DEW_POINT = (0x08, 2, 100, "dew point"),
    /// 8 bit count
    COUNT = (0x09, 1, 1, "count"),
    /// Energy in 0.001 kWh
    ENERGY = (0x0A, 3, 1000, "energy"),
    /// Power in 0.01 W
    POWER = (0x0B, 3, 100, "power"),
    /// Voltage in 0.001 V
    VOLTAGE = (0x0C, 2, 1000, "voltage"),
    /// PM2.5 in µg/m³
    PM2_5 = (0x0D, 2, 1, "pm2.5"),
    /// PM10 in µg/m³
    PM10 = (0x0E, 2, 1, "pm10"),
    GENERIC_BOOLEAN = (0x0F, 1, 1, "generic boolean"),
    POWER_STATE = (0x10, 1, 1, "power state"),
    OPENING = (0x11, 1, 1, "opening"),
    /// CO2 in ppm
    CO2 = (0x12, 2, 1, "co2"),
    /// TVOC in µg/m³
    TVOC = (0x13, 2, 1, "tvoc"),
    /// Moisture in 0.01 %
    MOISTURE_PRECISE = (0x14, 2, 100, "moisture"),
    BATTERY_LOW = (0x15, 1, 1, "battery low"),
    BATTERY_CHARGING = (0x16, 1, 1, "battery charging"),
    CARBON_MONOXIDE = (0x17, 1, 1, "carbon monoxide"),
    COLD = (0x18, 1, 1, "cold"),
    CONNECTIVITY = (0x19, 1, 1, "connectivity"),
    DOOR = (0x1A, 1, 1, "door"),
    GARAGE_DOOR = (0x1B, 1, 1, "garage door"),
    GAS_DETECTED = (0x1C, 1, 1, "gas"),
    HEAT = (0x1D, 1, 1, "heat"),
    LIGHT = (0x1E, 1, 1, "light"),
    LOCK = (0x1F, 1, 1, "lock"),
    MOISTURE_DETECTED = (0x20, 1, 1, "moisture detected"),
    MOTION = (0x21, 1, 1, "motion"),
    MOVING = (0x22, 1, 1, "moving"),
    OCCUPANCY = (0x23, 1, 1, "occupancy"),
    PLUG = (0x24, 1, 1, "plug"),
    PRESENCE = (0x25, 1, 1, "presence"),
    PROBLEM = (0x26, 1, 1, "problem"),
    RUNNING = (0x27, 1, 1, "running"),
    SAFETY = (0x28, 1, 1, "safety"),
    SMOKE = (0x29, 1, 1, "smoke"),
    SOUND = (0x2A, 1, 1, "sound"),
    TAMPER = (0x2B, 1, 1, "tamper"),
    VIBRATION = (0x2C, 1, 1, "vibration"),
    WINDOW = (0x2D, 1, 1, "window"),
    /// Humidity in %
    HUMIDITY = (0x2E, 1, 1, "humidity (coarse)"),
    /// Moisture in %
    MOISTURE = (0x2F, 1, 1, "moisture (coarse)"),
    /// Button event, see [`ButtonEvent`](crate::measurement::ButtonEvent)
    BUTTON = (0x3A, 1, 1, "button"),
    /// Dimmer event and number of steps, see [`DimmerEvent`](crate::measurement::DimmerEvent)
    DIMMER = (0x3C, 2, 1, "dimmer"),
    /// 16 bit count
    COUNT_16 = (0x3D, 2, 1, "count (16 bit)"),
    /// 32 bit count
    COUNT_32 = (0x3E, 4, 1, "count (32 bit)"),
    /// Rotation in 0.1°
    ROTATION = (0x3F, 2, 10, "rotation"),
    /// Distance in mm
    DISTANCE_MM = (0x40, 2, 1, "distance (mm)"),
    /// Distance in 0.1 m
    DISTANCE_M = (0x41, 2, 10, "distance (m)"),
    /// Duration in 0.001 s
    DURATION = (0x42, 3, 1000, "duration"),
    /// Current in 0.001 A
    CURRENT = (0x43, 2, 1000, "current"),
    /// Speed in 0.01 m/s
    SPEED = (0x44, 2, 100, "speed"),
    /// Temperature in 0.1 °C
    TEMPERATURE = (0x45, 2, 10, "temperature (coarse)"),
    /// UV index in 0.1
    UV_INDEX = (0x46, 1, 10, "uv index"),
    /// Volume in 0.1 L
    VOLUME_LITERS = (0x47, 2, 10, "volume (L)"),
    /// Volume in mL
    VOLUME_MILLILITERS = (0x48, 2, 1, "volume (mL)"),
    /// Volume flow rate in m³/hr
    VOLUME_FLOW_RATE = (0x49, 2, 1, "volume flow rate"),
    /// Voltage in 0.1 V
    VOLTAGE_COARSE = (0x4A, 2, 10, "voltage (coarse)"),
    /// Gas in 0.001 m³
    GAS = (0x4B, 3, 1000, "gas"),
    /// Gas in 0.001 m³ (32 bit)
    GAS_32 = (0x4C, 4, 1000, "gas (32 bit)"),
    /// Energy in 0.001 kWh (32 bit)
    ENERGY_32 = (0x4D, 4, 1000, "energy (32 bit)"),
    /// Volume in 0.001 m³
    VOLUME = (0x4E, 4, 1000, "volume"),
    /// Water in 0.001 L
    WATER = (0x4F, 4, 1000, "water"),
    /// Unix timestamp
    TIMESTAMP = (0x50, 4, 1, "timestamp"),
}

lazy_static! {
    static ref REGISTRY: [ObjectIdEntry; 256] = {
        let mut table = [ObjectIdEntry::UNKNOWN; 256];

        for (id, entry) in table.iter_mut().enumerate() {
            entry.id = id as u8;
        }

        for entry in ASSIGNED {
            table[entry.id as usize] = *entry;
        }

        table
    };
}

/// Get the registry entry for a raw object id
///
/// This never fails, the default entry is returned for an unassigned object id.
pub fn entry_of(id: u8) -> &'static ObjectIdEntry {
    &REGISTRY[id as usize]
}

/// Get the size of the value for an object id
///
/// The return is always one of 1, 2, 3, or 4. For an unassigned object id a warning is logged and
/// [`DEFAULT_WIDTH`] is returned.
pub fn width_of(id: u8) -> usize {
    let entry = entry_of(id);

    if !entry.is_known() {
        log::warn!("Unknown object ID: {:#04X}, assuming {} bytes", id, DEFAULT_WIDTH);
    }

    entry.width()
}

/// Get the scaling factor for an object id
///
/// The return is always one of 1, 10, 100, or 1000. Unassigned object ids are unscaled.
pub fn scale_of(id: u8) -> u16 {
    entry_of(id).scale()
}

/// Iterate over the assigned entries of the registry
pub fn assigned() -> impl Iterator<Item = &'static ObjectIdEntry> {
    REGISTRY.iter().filter(|entry| entry.is_known())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn widths_and_scales_are_bounded() {
        for id in 0..=u8::MAX {
            assert!([1, 2, 3, 4].contains(&width_of(id)), "width of {:#04X}", id);
            assert!([1, 10, 100, 1000].contains(&scale_of(id)), "scale of {:#04X}", id);
        }
    }

    #[test]
    fn width_is_stable() {
        for entry in assigned() {
            let first = width_of(entry.id().val());

            assert_eq!(first, width_of(entry.id().val()));
            assert_eq!(first, entry.id().width());
        }
    }

    #[test]
    fn representative_entries() {
        let expected = [
            (ObjectId::BATTERY, 1, 1),
            (ObjectId::TEMPERATURE_PRECISE, 2, 100),
            (ObjectId::COUNT, 1, 1),
            (ObjectId::ENERGY, 3, 1000),
            (ObjectId::POWER, 3, 100),
            (ObjectId::COUNT_16, 2, 1),
            (ObjectId::COUNT_32, 4, 1),
            (ObjectId::TEMPERATURE, 2, 10),
            (ObjectId::DISTANCE_MM, 2, 1),
            (ObjectId::TIMESTAMP, 4, 1),
        ];

        for (id, width, scale) in expected.iter().copied() {
            assert_eq!(width, id.width(), "width of {}", id);
            assert_eq!(scale, id.scale(), "scale of {}", id);
            assert!(id.entry().is_known());
        }

        assert_eq!(0x01, ObjectId::BATTERY.val());
        assert_eq!(0x45, ObjectId::TEMPERATURE.val());
        assert_eq!(0x50, ObjectId::TIMESTAMP.val());
    }

    #[test]
    fn unknown_ids_use_default_entry() {
        for raw in [0x30u8, 0x3B, 0x51, 0xFF].iter().copied() {
            let entry = entry_of(raw);

            assert!(!entry.is_known());
            assert_eq!(raw, entry.id().val());
            assert_eq!(DEFAULT_WIDTH, width_of(raw));
            assert_eq!(DEFAULT_SCALE, scale_of(raw));
        }
    }

    #[test]
    fn assigned_entries_are_unique() {
        let mut seen = [false; 256];

        for entry in ASSIGNED {
            assert!(!seen[entry.id as usize], "duplicate entry {:#04X}", entry.id);

            seen[entry.id as usize] = true;
        }

        assert_eq!(ASSIGNED.len(), assigned().count());
    }
}
