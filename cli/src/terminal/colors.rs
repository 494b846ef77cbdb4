use colored::Color;

pub const PRIMARY: Color = Color::BrightGreen;
pub const ACCENT: Color = Color::BrightYellow;
pub const SEPARATOR: Color = Color::BrightBlack;
pub const TEXT_DEFAULT: Color = Color::White;

pub const IPV4_ADDR: Color = Color::TrueColor {
    r: 120,
    g: 200,
    b: 255,
};
pub const IPV4_PREFIX: Color = Color::Cyan;

pub const FREE: Color = Color::Green;
pub const USED: Color = Color::Red;
pub const LEASED: Color = Color::Magenta;
pub const UNMANAGED: Color = Color::BrightBlack;
