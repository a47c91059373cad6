use serde::{Deserialize, Serialize};

use crate::foundation::error::{EditorError, EditorResult};

pub use kurbo::{Affine, Point, Rect, Vec2};

/// Straight-alpha RGBA8 color.
///
/// Serializes as `#rrggbb` (opaque) or `#rrggbbaa`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (255 = opaque).
    pub a: u8,
}

impl Rgba8 {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(255, 255, 255);

    /// Build a color from straight-alpha channels.
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Build an opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa` (leading `#` optional).
    pub fn parse_hex(s: &str) -> EditorResult<Self> {
        let hex = s.trim().trim_start_matches('#');
        let bad = || EditorError::config(format!("invalid hex color '{s}'"));
        if !hex.is_ascii() {
            return Err(bad());
        }
        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| bad());
        match hex.len() {
            3 => {
                let nib = |i: usize| {
                    u8::from_str_radix(&hex[i..i + 1], 16)
                        .map(|v| v * 17)
                        .map_err(|_| bad())
                };
                Ok(Self::rgb(nib(0)?, nib(1)?, nib(2)?))
            }
            6 => Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?)),
            8 => Ok(Self::new(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => Err(bad()),
        }
    }

    /// Hex form, `#rrggbb` when opaque and `#rrggbbaa` otherwise.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Premultiplied RGBA8 bytes for writing directly into a surface.
    pub fn to_premul(self) -> [u8; 4] {
        crate::foundation::math::premul_rgba8([self.r, self.g, self.b, self.a])
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = EditorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<Rgba8> for String {
    fn from(value: Rgba8) -> Self {
        value.to_hex()
    }
}

/// Fill behind an overlay's text.
///
/// Serializes as `"transparent"` or a hex color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Background {
    /// No fill.
    #[default]
    Transparent,
    /// Solid fill with the given color.
    Solid(Rgba8),
}

impl TryFrom<String> for Background {
    type Error = EditorError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if value.trim().eq_ignore_ascii_case("transparent") {
            return Ok(Self::Transparent);
        }
        Rgba8::parse_hex(&value).map(Self::Solid)
    }
}

impl From<Background> for String {
    fn from(value: Background) -> Self {
        match value {
            Background::Transparent => "transparent".to_string(),
            Background::Solid(c) => c.to_hex(),
        }
    }
}

/// Pixel dimensions of the render surface (or of its hosting container).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl SurfaceSize {
    /// Build a size.
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// `true` when either dimension is zero; drawing is deferred in that case.
    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Geometric center in surface coordinates.
    pub fn center(self) -> Point {
        Point::new(f64::from(self.width) / 2.0, f64::from(self.height) / 2.0)
    }

    /// Full surface rectangle.
    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Return `true` when `p` lies inside `[0, w) x [0, h)`.
    pub fn contains(self, p: Point) -> bool {
        self.rect().contains(p)
    }
}

/// Placement of the render surface on screen.
///
/// `origin` is the screen-space position of the surface's top-left corner; `size` is the
/// container size the surface is matched to before each draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Screen-space origin of the surface.
    pub origin: Point,
    /// Container size in pixels.
    pub size: SurfaceSize,
}

impl Viewport {
    /// Build a viewport anchored at the screen origin.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            origin: Point::ORIGIN,
            size: SurfaceSize::new(width, height),
        }
    }

    /// Same viewport with a different screen origin.
    pub fn with_origin(mut self, origin: Point) -> Self {
        self.origin = origin;
        self
    }

    /// Convert a screen-space pointer position into surface-local coordinates.
    pub fn to_surface(self, screen: Point) -> Point {
        Point::new(screen.x - self.origin.x, screen.y - self.origin.y)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
