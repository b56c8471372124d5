//! Local name data type
use super::*;

/// The complete local name of a device
///
/// The full name must fit within the buffer it is converted into, a BTHome advertisement never
/// shortens the name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LocalName<'a>(&'a str);

impl<'a> LocalName<'a> {
    const AD_TYPE: AssignedTypes = AssignedTypes::CompleteLocalName;

    /// Create a new local name data type
    pub fn new(name: &'a str) -> Self {
        LocalName(name)
    }
}

impl AsRef<str> for LocalName<'_> {
    fn as_ref(&self) -> &str {
        self.0
    }
}

impl core::ops::Deref for LocalName<'_> {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        self.0
    }
}

impl IntoStruct for LocalName<'_> {
    fn data_len(&self) -> Result<usize, usize> {
        Ok(self.0.len())
    }

    fn convert_into<'a>(&self, b: &'a mut [u8]) -> Option<EirOrAdStruct<'a>> {
        let mut interm = StructIntermediate::new(b, Self::AD_TYPE.val())?;

        interm.try_extend(self.0.as_bytes())?;

        interm.finish()
    }
}
