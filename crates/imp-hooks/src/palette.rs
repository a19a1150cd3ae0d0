//! Colours handed to the bottom-view customisation callback.

use imp_core::Value;

const OPAQUE_ALPHA: u32 = 0xFF00_0000;
const TRANSLUCENT_ALPHA: u32 = 0x6600_0000;

/// Palette derived from a captured navigation bar colour.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BottomViewPalette {
    pub raw: i32,
    /// `0xFFFFFFFF - raw`, i.e. every channel inverted.
    pub complement: u32,
    pub opaque: u32,
    pub translucent: u32,
}

impl BottomViewPalette {
    pub fn derive(raw: i32) -> Self {
        let complement = u32::MAX - raw as u32;
        Self {
            raw,
            complement,
            opaque: complement | OPAQUE_ALPHA,
            translucent: complement | TRANSLUCENT_ALPHA,
        }
    }

    /// Arguments of `customizeBottomViewColor(boolean, int, int, int)`.
    pub fn callback_args(&self) -> Vec<Value> {
        vec![
            Value::Bool(true),
            Value::Int(self.raw),
            Value::Int(self.opaque as i32),
            Value::Int(self.translucent as i32),
        ]
    }
}
