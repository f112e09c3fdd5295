//! Palette entry decoders for the supported platforms.

/// One RGB palette entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Colour {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Colour {
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    /// PC/ST palette word: red in the low nybble of `big`, green and blue in
    /// the high and low nybbles of `small`. Components are 3-bit (0-7).
    pub fn pc_st(big: u8, small: u8) -> Self {
        let scale = |value: u8| ((u32::from(value & 0x0F) * 0x49) >> 1) as u8;
        Self {
            red: scale(big),
            green: scale(small >> 4),
            blue: scale(small),
        }
    }

    /// 6-bit EGA colour code. The high three bits carry the 25% level and the
    /// low three the 75% level of R, G, B in that order.
    pub fn ega(code: u8) -> Self {
        let red = ((code & 0x04) >> 1) | ((code & 0x20) >> 5);
        let green = (code & 0x02) | ((code & 0x10) >> 4);
        let blue = ((code & 0x01) << 1) | ((code & 0x08) >> 3);
        Self {
            red: red * 0x55,
            green: green * 0x55,
            blue: blue * 0x55,
        }
    }

    /// Amiga palette word: red, green and blue in the second, third and lowest
    /// nybbles, passed through [`amiga_intensity`].
    pub fn amiga(high: u8, low: u8) -> Self {
        Self {
            red: amiga_intensity(high & 0x0F),
            green: amiga_intensity(low >> 4),
            blue: amiga_intensity(low & 0x0F),
        }
    }
}

/// Gamma-corrected 8-bit intensity for a 4-bit Amiga colour component.
pub fn amiga_intensity(value: u8) -> u8 {
    ((f64::from(value) / 15.0).powf(1.0 / 0.8) * 255.0) as u8
}

/// Commodore 64 palette as rendered by VICE.
pub const C64_COLOURS: [Colour; 16] = [
    Colour::new(0x00, 0x00, 0x00),
    Colour::new(0xFF, 0xFF, 0xFF),
    Colour::new(0x89, 0x40, 0x36),
    Colour::new(0x7A, 0xBF, 0xC7),
    Colour::new(0x8A, 0x46, 0xAE),
    Colour::new(0x68, 0xA9, 0x41),
    Colour::new(0x3E, 0x31, 0xA2),
    Colour::new(0xD0, 0xDC, 0x71),
    Colour::new(0x90, 0x5F, 0x25),
    Colour::new(0x5C, 0x47, 0x00),
    Colour::new(0xBB, 0x77, 0x6D),
    Colour::new(0x55, 0x55, 0x55),
    Colour::new(0x80, 0x80, 0x80),
    Colour::new(0xAC, 0xEA, 0x88),
    Colour::new(0x7C, 0x70, 0xDA),
    Colour::new(0xAB, 0xAB, 0xAB),
];

/// The eight steady BBC Micro mode 2 colours.
pub const BBC_COLOURS: [Colour; 8] = [
    Colour::new(0x00, 0x00, 0x00),
    Colour::new(0xFF, 0x00, 0x00),
    Colour::new(0x00, 0xFF, 0x00),
    Colour::new(0xFF, 0xFF, 0x00),
    Colour::new(0x00, 0x00, 0xFF),
    Colour::new(0xFF, 0x00, 0xFF),
    Colour::new(0x00, 0xFF, 0xFF),
    Colour::new(0xFF, 0xFF, 0xFF),
];

pub const MAC_COLOURS: [Colour; 2] = [Colour::new(0, 0, 0), Colour::new(0xFF, 0xFF, 0xFF)];
