use std::fmt;

use serde::Serialize;

/// A colour as the backend and the display scene spell it (`#rrggbb`, `#rgb`
/// or one of a few CSS names).
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ColorToken(String);

impl ColorToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn to_rgb(&self) -> Option<[u8; 3]> {
        let token = self.0.as_str();
        if let Some(hex) = token.strip_prefix('#') {
            return parse_hex(hex);
        }

        match token.to_ascii_lowercase().as_str() {
            "red" => Some([255, 0, 0]),
            "blue" => Some([0, 0, 255]),
            "green" => Some([0, 128, 0]),
            "black" => Some([0, 0, 0]),
            "white" => Some([255, 255, 255]),
            "gray" | "grey" => Some([128, 128, 128]),
            "orange" => Some([255, 165, 0]),
            "purple" => Some([128, 0, 128]),
            _ => None,
        }
    }

    /// Evenly spaced fully saturated hue, `index` of `count`.
    pub fn from_hue_slot(index: usize, count: usize) -> Self {
        let count = count.max(1);
        let hue = (index % count) as f64 / count as f64;
        let [r, g, b] = hsv_to_rgb(hue, 1.0, 1.0);
        Self(format!("#{r:02x}{g:02x}{b:02x}"))
    }
}

impl From<&str> for ColorToken {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Display for ColorToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn parse_hex(hex: &str) -> Option<[u8; 3]> {
    let digit = |index: usize| -> Option<u8> {
        hex.get(index..index + 1)
            .and_then(|slice| u8::from_str_radix(slice, 16).ok())
    };

    match hex.len() {
        3 => Some([digit(0)? * 17, digit(1)? * 17, digit(2)? * 17]),
        6 | 8 => {
            let byte = |index: usize| -> Option<u8> {
                hex.get(index..index + 2)
                    .and_then(|slice| u8::from_str_radix(slice, 16).ok())
            };
            Some([byte(0)?, byte(2)?, byte(4)?])
        }
        _ => None,
    }
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let sector = (h * 6.0).floor();
    let f = h * 6.0 - sector;
    let p = v * (1.0 - s);
    let q = v * (1.0 - s * f);
    let t = v * (1.0 - s * (1.0 - f));

    let (r, g, b) = match (sector as i64).rem_euclid(6) {
        0 => (v, t, p),
        1 => (q, v, p),
        2 => (p, v, t),
        3 => (p, q, v),
        4 => (t, p, v),
        _ => (v, p, q),
    };

    [(r * 255.0) as u8, (g * 255.0) as u8, (b * 255.0) as u8]
}
