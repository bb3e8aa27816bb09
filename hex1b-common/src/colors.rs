// Copyright (C) 2024-2026 Fred Clausen
// Use of this source code is governed by an MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT.

use core::fmt;

/// A 24-bit color. Cells store `Option<Rgb>`, with `None` meaning the
/// terminal's default foreground or background.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgb({}, {}, {})", self.r, self.g, self.b)
    }
}

/// The standard xterm values for the 16 base colors (0-7 normal, 8-15 bright).
const ANSI_16: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(205, 0, 0),
    Rgb::new(0, 205, 0),
    Rgb::new(205, 205, 0),
    Rgb::new(0, 0, 238),
    Rgb::new(205, 0, 205),
    Rgb::new(0, 205, 205),
    Rgb::new(229, 229, 229),
    Rgb::new(127, 127, 127),
    Rgb::new(255, 0, 0),
    Rgb::new(0, 255, 0),
    Rgb::new(255, 255, 0),
    Rgb::new(92, 92, 255),
    Rgb::new(255, 0, 255),
    Rgb::new(0, 255, 255),
    Rgb::new(255, 255, 255),
];

#[must_use]
pub const fn lookup_16_color(index: usize) -> Rgb {
    ANSI_16[index % 16]
}

/// Resolve an index in the 256-color palette to an RGB value.
///
/// 0-15 are the base colors, 16-231 the 6x6x6 cube, 232-255 the
/// grayscale ramp.
#[must_use]
pub fn lookup_256_color_by_index(index: usize) -> Rgb {
    // https://stackoverflow.com/questions/69138165/how-to-get-the-rgb-values-of-a-256-color-palette-terminal-color
    match index {
        0..=15 => ANSI_16[index],
        232..=255 => {
            let value = (2056 + 2570 * (index - 232)) / 256;
            let value = u8::try_from(value).unwrap_or(u8::MAX);
            Rgb::new(value, value, value)
        }
        16..=231 => {
            let r = u8::try_from(cube_component(index, 36)).unwrap_or(0);
            let g = u8::try_from(cube_component(index, 6)).unwrap_or(0);
            let b = u8::try_from(cube_component(index, 1)).unwrap_or(0);
            Rgb::new(r, g, b)
        }
        _ => {
            debug!("256-color index {index} out of range; using black");
            Rgb::new(0, 0, 0)
        }
    }
}

#[must_use]
pub const fn cube_component(value: usize, modifier: usize) -> usize {
    let i = ((value - 16) / modifier) % 6;

    if i == 0 { 0 } else { (14135 + 10280 * i) / 256 }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn base_16_palette() {
        assert_eq!(lookup_256_color_by_index(0), Rgb::new(0, 0, 0));
        assert_eq!(lookup_256_color_by_index(1), Rgb::new(205, 0, 0));
        assert_eq!(lookup_256_color_by_index(15), Rgb::new(255, 255, 255));
    }

    #[test]
    fn grayscale_ramp_is_monotonic() {
        let mut last = 0;
        for idx in 232..=255 {
            let c = lookup_256_color_by_index(idx);
            assert_eq!(c.r, c.g);
            assert_eq!(c.g, c.b);
            assert!(c.r >= last);
            last = c.r;
        }
    }

    #[test]
    fn cube_corners() {
        // 16 is the black corner of the cube, 231 the white corner
        assert_eq!(lookup_256_color_by_index(16), Rgb::new(0, 0, 0));
        assert_eq!(lookup_256_color_by_index(231), Rgb::new(255, 255, 255));
    }

    #[test]
    fn out_of_range_is_black() {
        assert_eq!(lookup_256_color_by_index(500), Rgb::new(0, 0, 0));
    }
}
