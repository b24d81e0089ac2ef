//! Data models for workpieces and materials
//!
//! This module provides:
//! - Workpiece parameters (material, diameter, length)
//! - The material palette with base and machined surface colours
//! - The `Rgba8` pixel type shared with the raster stock

use serde::{Deserialize, Serialize};
use std::fmt;

/// An 8-bit RGBA pixel.
///
/// Alpha is the material coverage channel: the raster normalises it to 0 or
/// 255 on creation, and anything painted with intermediate alpha is cosmetic
/// edge softening only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba8 {
    /// Red channel.
    pub r: u8,
    /// Green channel.
    pub g: u8,
    /// Blue channel.
    pub b: u8,
    /// Alpha channel (material coverage).
    pub a: u8,
}

impl Rgba8 {
    /// Create a fully opaque colour.
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// The fully transparent pixel.
    pub const TRANSPARENT: Self = Self {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    /// Keep this pixel's alpha but replace its colour.
    pub fn with_rgb_of(self, other: Rgba8) -> Self {
        Self {
            r: other.r,
            g: other.g,
            b: other.b,
            a: self.a,
        }
    }
}

/// Stock material selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MaterialType {
    /// Mild steel
    Steel,
    /// Aluminium alloy
    Aluminium,
    /// Brass
    Brass,
}

impl Default for MaterialType {
    fn default() -> Self {
        Self::Steel
    }
}

impl fmt::Display for MaterialType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Steel => write!(f, "Steel"),
            Self::Aluminium => write!(f, "Aluminium"),
            Self::Brass => write!(f, "Brass"),
        }
    }
}

impl MaterialType {
    /// Parse a material from a free-form name, defaulting to steel.
    ///
    /// Accepts common spellings so loader input like "aluminum" or "brass
    /// CZ121" resolves to the right palette entry.
    pub fn from_name(name: &str) -> Self {
        let n = name.trim().to_lowercase();
        if n.contains("alu") {
            Self::Aluminium
        } else if n.contains("brass") {
            Self::Brass
        } else {
            Self::Steel
        }
    }

    /// Look up the palette record for this material.
    pub fn record(&self) -> MaterialRecord {
        match self {
            Self::Steel => MaterialRecord {
                material: *self,
                base_color: Rgba8::opaque(191, 191, 199),
            },
            Self::Aluminium => MaterialRecord {
                material: *self,
                base_color: Rgba8::opaque(217, 222, 235),
            },
            Self::Brass => MaterialRecord {
                material: *self,
                base_color: Rgba8::opaque(230, 204, 89),
            },
        }
    }
}

/// Palette entry for one material.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MaterialRecord {
    /// The material this record describes.
    pub material: MaterialType,
    /// Colour of raw (unmachined) stock surface.
    pub base_color: Rgba8,
}

impl MaterialRecord {
    /// Colour of a freshly machined surface: slightly brighter, slightly
    /// desaturated relative to the raw stock.
    pub fn machined_color(&self) -> Rgba8 {
        derive_machined(self.base_color, 0.12, 0.10)
    }
}

fn derive_machined(base: Rgba8, brighten: f32, desaturate: f32) -> Rgba8 {
    let (r, g, b) = (
        base.r as f32 / 255.0,
        base.g as f32 / 255.0,
        base.b as f32 / 255.0,
    );
    let gray = (r + g + b) / 3.0;

    let adjust = |c: f32| {
        let desat = c + (gray - c) * desaturate;
        ((desat * (1.0 + brighten)).clamp(0.0, 1.0) * 255.0).round() as u8
    };

    Rgba8::opaque(adjust(r), adjust(g), adjust(b))
}

/// Parameters of a workpiece to load into the chuck.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WorkpieceParams {
    /// Stock material.
    pub material: MaterialType,
    /// Nominal stock diameter in millimeters.
    pub diameter_mm: f32,
    /// Nominal stock length in millimeters.
    pub length_mm: f32,
}

impl WorkpieceParams {
    /// Create workpiece parameters.
    pub fn new(material: MaterialType, diameter_mm: f32, length_mm: f32) -> Self {
        Self {
            material,
            diameter_mm,
            length_mm,
        }
    }
}

impl Default for WorkpieceParams {
    fn default() -> Self {
        Self {
            material: MaterialType::Aluminium,
            diameter_mm: 100.0,
            length_mm: 150.0,
        }
    }
}

impl fmt::Display for WorkpieceParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} Ø{:.1}mm x {:.1}mm",
            self.material, self.diameter_mm, self.length_mm
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_material_from_name() {
        assert_eq!(MaterialType::from_name("Aluminum 6061"), MaterialType::Aluminium);
        assert_eq!(MaterialType::from_name("brass"), MaterialType::Brass);
        assert_eq!(MaterialType::from_name("S235 steel"), MaterialType::Steel);
        assert_eq!(MaterialType::from_name(""), MaterialType::Steel);
    }

    #[test]
    fn test_machined_color_is_brighter() {
        for material in [MaterialType::Steel, MaterialType::Aluminium, MaterialType::Brass] {
            let record = material.record();
            let machined = record.machined_color();
            let base_sum =
                record.base_color.r as u32 + record.base_color.g as u32 + record.base_color.b as u32;
            let machined_sum = machined.r as u32 + machined.g as u32 + machined.b as u32;
            assert!(
                machined_sum > base_sum,
                "machined surface of {} should be brighter",
                material
            );
        }
    }

    #[test]
    fn test_rgba_with_rgb_of_preserves_alpha() {
        let px = Rgba8 {
            r: 1,
            g: 2,
            b: 3,
            a: 40,
        };
        let recolored = px.with_rgb_of(Rgba8::opaque(9, 9, 9));
        assert_eq!(recolored.a, 40);
        assert_eq!(recolored.r, 9);
    }

    #[test]
    fn test_workpiece_display() {
        let p = WorkpieceParams::new(MaterialType::Brass, 40.0, 80.0);
        assert_eq!(format!("{}", p), "Brass Ø40.0mm x 80.0mm");
    }
}
