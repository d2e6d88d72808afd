use crate::error::{Error, Result};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Palette understood by the indexed-color firmware.
///
/// Index 3 and 31 carry the same grey; lookups resolve to the lower index.
pub const PALETTE_32: [Pixel; 32] = [
    Pixel::new(0x00, 0x00, 0x00),
    Pixel::new(0x20, 0x20, 0x20),
    Pixel::new(0x40, 0x40, 0x40),
    Pixel::new(0x60, 0x60, 0x60),
    Pixel::new(0x80, 0x80, 0x80),
    Pixel::new(0xa0, 0xa0, 0xa0),
    Pixel::new(0xc0, 0xc0, 0xc0),
    Pixel::new(0xff, 0xff, 0xff),
    Pixel::new(0xff, 0x00, 0x00),
    Pixel::new(0xff, 0x80, 0x00),
    Pixel::new(0xff, 0xff, 0x00),
    Pixel::new(0x80, 0xff, 0x00),
    Pixel::new(0x00, 0xff, 0x00),
    Pixel::new(0x00, 0xff, 0x80),
    Pixel::new(0x00, 0xff, 0xff),
    Pixel::new(0x00, 0x80, 0xff),
    Pixel::new(0x00, 0x00, 0xff),
    Pixel::new(0x80, 0x00, 0xff),
    Pixel::new(0xff, 0x00, 0xff),
    Pixel::new(0xff, 0x00, 0x80),
    Pixel::new(0x80, 0x40, 0x00),
    Pixel::new(0xc0, 0x60, 0x00),
    Pixel::new(0xff, 0xb0, 0x00),
    Pixel::new(0xff, 0xc0, 0xc0),
    Pixel::new(0xc0, 0x00, 0x00),
    Pixel::new(0x80, 0x00, 0x00),
    Pixel::new(0x40, 0x00, 0x00),
    Pixel::new(0x00, 0x40, 0x00),
    Pixel::new(0x00, 0x80, 0x80),
    Pixel::new(0x00, 0x40, 0x80),
    Pixel::new(0x80, 0x80, 0x00),
    Pixel::new(0x40, 0x40, 0x40),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Self = Self::new(0, 0, 0);
    /// Returned by [`Pixel::from_hex`] for anything it cannot parse.
    pub const FALLBACK: Self = Self::new(255, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Coerce an arbitrary number into a channel value.
    pub fn channel(value: f64) -> u8 {
        if value.is_nan() {
            return 0;
        }

        value.round().clamp(0.0, 255.0) as u8
    }

    /// Parse `#rrggbb` or `rrggbb`, case-insensitive.
    pub fn try_from_hex(hex: &str) -> Result<Self> {
        let digits = hex.strip_prefix('#').unwrap_or(hex);
        if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(Error::InvalidColor(hex.to_owned()));
        }

        let n = u32::from_str_radix(digits, 16).map_err(|_| Error::InvalidColor(hex.to_owned()))?;
        Ok(Self::new((n >> 16) as u8, (n >> 8) as u8, n as u8))
    }

    /// Like [`Pixel::try_from_hex`] but fails closed to [`Pixel::FALLBACK`].
    pub fn from_hex(hex: &str) -> Self {
        Self::try_from_hex(hex).unwrap_or(Self::FALLBACK)
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Grey used for panels outside the active set.
    pub fn dimmed(self) -> Self {
        let sum = f64::from(self.r) + f64::from(self.g) + f64::from(self.b);
        let v = Self::channel(sum / 12.0);
        Self::new(v, v, v)
    }

    /// Linear interpolation toward `tint`; `weight` 0 keeps `self`, 1 yields `tint`.
    pub fn blend_toward(self, tint: Self, weight: f32) -> Self {
        let weight = f64::from(weight.clamp(0.0, 1.0));
        let mix =
            |c: u8, t: u8| Self::channel(f64::from(c) * (1.0 - weight) + f64::from(t) * weight);
        Self::new(mix(self.r, tint.r), mix(self.g, tint.g), mix(self.b, tint.b))
    }

    pub fn distance_sq(self, other: Self) -> u32 {
        let d = |a: u8, b: u8| (i32::from(a) - i32::from(b)).pow(2) as u32;
        d(self.r, other.r) + d(self.g, other.g) + d(self.b, other.b)
    }

    pub fn to_array(self) -> [u8; 3] {
        [self.r, self.g, self.b]
    }
}

impl From<[u8; 3]> for Pixel {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self::new(r, g, b)
    }
}

impl fmt::Display for Pixel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

/// Index of the palette entry closest to `hex` (squared RGB distance).
///
/// Invalid input is matched as [`Pixel::FALLBACK`].
pub fn nearest_palette_index(hex: &str, palette: &[Pixel]) -> usize {
    let target = Pixel::from_hex(hex);

    let mut best = 0;
    let mut best_dist = u32::MAX;
    for (idx, entry) in palette.iter().enumerate() {
        let dist = target.distance_sq(*entry);
        if dist < best_dist {
            best_dist = dist;
            best = idx;
        }
    }

    best
}

impl Serialize for Pixel {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.to_array().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Pixel {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let channels = Vec::<Option<f64>>::deserialize(deserializer)?;
        let at = |idx: usize| Pixel::channel(channels.get(idx).copied().flatten().unwrap_or(0.0));
        Ok(Self::new(at(0), at(1), at(2)))
    }
}
