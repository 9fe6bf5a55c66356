//! Colours, gradients and the quantized colour scale

use hicvis_core::QuantizeScale;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Colour {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Colour {
    pub const BLACK: Colour = Colour::rgb(0, 0, 0);
    pub const WHITE: Colour = Colour::rgb(255, 255, 255);
    pub const LIGHT_GRAY: Colour = Colour::rgb(211, 211, 211);
    pub const GRAY: Colour = Colour::rgb(128, 128, 128);
    pub const SADDLE_BROWN: Colour = Colour::rgb(139, 69, 19);
    pub const LIGHT_GREEN: Colour = Colour::rgb(144, 238, 144);
    pub const STEEL_BLUE: Colour = Colour::rgb(70, 130, 180);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn gray(v: u8) -> Self {
        Self::rgb(v, v, v)
    }

    /// Parse `#RRGGBB` (the `#` is optional).
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim();
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    pub fn lerp(self, other: Colour, t: f64) -> Colour {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Colour::rgb(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub fn rgba(self, alpha: f64) -> image::Rgba<u8> {
        image::Rgba([self.r, self.g, self.b, (alpha.clamp(0.0, 1.0) * 255.0).round() as u8])
    }
}

/// Piecewise-linear colour ramp over increasing stop positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Gradient {
    stops: Vec<(f64, Colour)>,
}

impl Gradient {
    pub fn new(stops: Vec<(f64, Colour)>) -> Self {
        Self { stops }
    }

    /// Brown through green to blue across `[0, colours]`.
    pub fn earth(colours: usize) -> Self {
        let n = colours as f64;
        Self::new(vec![
            (0.0, Colour::SADDLE_BROWN),
            (n / 2.0, Colour::LIGHT_GREEN),
            (n, Colour::STEEL_BLUE),
        ])
    }

    pub fn at(&self, v: f64) -> Colour {
        let (first, last) = match (self.stops.first(), self.stops.last()) {
            (Some(f), Some(l)) => (*f, *l),
            _ => return Colour::BLACK,
        };
        if !(v > first.0) {
            return first.1;
        }
        if v >= last.0 {
            return last.1;
        }
        for pair in self.stops.windows(2) {
            let ((p0, c0), (p1, c1)) = (pair[0], pair[1]);
            if v <= p1 {
                let span = p1 - p0;
                let t = if span > 0.0 { (v - p0) / span } else { 1.0 };
                return c0.lerp(c1, t);
            }
        }
        last.1
    }
}

/// Quantize a value, then colour its bucket.
#[derive(Debug, Clone, PartialEq)]
pub struct ColourScale {
    pub quantize: QuantizeScale,
    pub gradient: Gradient,
}

impl ColourScale {
    pub fn new(quantize: QuantizeScale) -> Self {
        Self {
            gradient: Gradient::earth(quantize.buckets),
            quantize,
        }
    }

    pub fn colour(&self, v: f64) -> Colour {
        self.gradient.at(self.quantize.bucket(v) as f64)
    }
}
