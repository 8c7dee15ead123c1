//! Theme loading: btop-style `theme[key]="value"` files, tile colours by value, hex → ratatui Color.

use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Tile values with their own colour: 2, 4, ... 2048.
pub const COLOURED_TILES: usize = 11;

/// Tiles up to this value use the dark text colour.
const DARK_TEXT_MAX: u32 = 4;

const fn rgb(hex: u32) -> Color {
    Color::Rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
}

const CLASSIC_TILES: [Color; COLOURED_TILES] = [
    rgb(0xEEE4DA),
    rgb(0xECE0C8),
    rgb(0xF2B179),
    rgb(0xF59563),
    rgb(0xF67C5F),
    rgb(0xF65D3B),
    rgb(0xEDCF72),
    rgb(0xEDCC61),
    rgb(0xEDC850),
    rgb(0xEDC53F),
    rgb(0xEDC22E),
];

const HIGH_CONTRAST_TILES: [Color; COLOURED_TILES] = [
    rgb(0xFFFFFF),
    rgb(0xFFFF66),
    rgb(0xFFCC00),
    rgb(0xFF8800),
    rgb(0xFF4400),
    rgb(0xFF0000),
    rgb(0x00FF00),
    rgb(0x00CCFF),
    rgb(0x0088FF),
    rgb(0xFF00FF),
    rgb(0x00FFFF),
];

// Paul Tol's bright/vibrant sets, ordered light to dark
const COLORBLIND_TILES: [Color; COLOURED_TILES] = [
    rgb(0xDDDDDD),
    rgb(0xBBBB00),
    rgb(0xEE7733),
    rgb(0x33BBEE),
    rgb(0x009988),
    rgb(0x0077BB),
    rgb(0xEE3377),
    rgb(0xCC3311),
    rgb(0xAA3377),
    rgb(0x4477AA),
    rgb(0x228833),
];

/// Tile palette plus the One Dark UI colours around the board.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Tile backgrounds for 2, 4, ... 2048 (index = log2(value) - 1).
    pub tiles: [Color; COLOURED_TILES],
    /// Tiles above 2048.
    pub tile_big: Color,
    /// Label colour on light tiles (2 and 4).
    pub text_dark: Color,
    /// Label colour on every other tile.
    pub text_light: Color,
    /// Screen background.
    pub bg: Color,
    /// Board background (the gaps between cells).
    pub board_bg: Color,
    /// Cell with no tile.
    pub empty_cell: Color,
    /// Border lines.
    pub div_line: Color,
    /// Text (score, help).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    /// Classic tile colours on a One Dark frame.
    pub fn classic() -> Self {
        Self {
            tiles: CLASSIC_TILES,
            tile_big: rgb(0x3C3A32),
            text_dark: rgb(0x776E65),
            text_light: rgb(0xF9F6F2),
            bg: rgb(0x282C34),
            board_bg: rgb(0x3F444F),
            empty_cell: rgb(0x31353F),
            div_line: rgb(0x5C6370),
            main_fg: rgb(0xABB2BF),
            title: rgb(0xE5C07B),
        }
    }

    /// Load theme from a btop-style file: `theme[key]="value"` or `theme[key]='value'`.
    /// Falls back to the defaults if path is None or the file is missing; keys not in the file
    /// keep their default colour.
    pub fn load(path: Option<&Path>, palette: crate::Palette) -> Result<Self, ThemeError> {
        let path = match path {
            Some(p) if p.exists() => p,
            _ => return Ok(Self::default_for_palette(palette)),
        };
        let s = std::fs::read_to_string(path)?;
        let map = parse_theme_file(&s);
        let mut theme = Self::from_map(&map)?;
        theme.apply_palette(palette);
        Ok(theme)
    }

    /// Default theme for a palette when no file is loaded.
    pub fn default_for_palette(palette: crate::Palette) -> Self {
        let mut t = Self::classic();
        t.apply_palette(palette);
        t
    }

    /// Swap the tile colours for high-contrast or colorblind variants.
    pub fn apply_palette(&mut self, palette: crate::Palette) {
        match palette {
            crate::Palette::Normal => {}
            crate::Palette::HighContrast => {
                self.tiles = HIGH_CONTRAST_TILES;
                self.tile_big = rgb(0xFFFFFF);
                self.text_dark = rgb(0x000000);
                self.text_light = rgb(0x000000);
            }
            crate::Palette::Colorblind => {
                self.tiles = COLORBLIND_TILES;
                self.tile_big = rgb(0x000000);
                self.text_dark = rgb(0x222222);
                self.text_light = rgb(0xFFFFFF);
            }
        }
    }

    fn from_map(map: &HashMap<String, String>) -> Result<Self, ThemeError> {
        let mut theme = Self::classic();
        let set = |key: &str, slot: &mut Color| -> Result<(), ThemeError> {
            if let Some(v) = map.get(key) {
                *slot = parse_hex(v)?;
            }
            Ok(())
        };
        for (i, slot) in theme.tiles.iter_mut().enumerate() {
            set(&format!("tile_{}", 2u32 << i), slot)?;
        }
        set("tile_big", &mut theme.tile_big)?;
        set("text_dark", &mut theme.text_dark)?;
        set("text_light", &mut theme.text_light)?;
        set("main_bg", &mut theme.bg)?;
        set("meter_bg", &mut theme.empty_cell)?;
        set("board_bg", &mut theme.board_bg)?;
        set("div_line", &mut theme.div_line)?;
        set("main_fg", &mut theme.main_fg)?;
        set("title", &mut theme.title)?;
        Ok(theme)
    }

    /// Background colour for a tile value.
    pub fn tile_color(&self, value: u32) -> Color {
        let index = value.trailing_zeros() as usize;
        if value.is_power_of_two() && (1..=COLOURED_TILES).contains(&index) {
            self.tiles[index - 1]
        } else {
            self.tile_big
        }
    }

    /// Label colour for a tile value: dark on the pale low tiles, light elsewhere.
    pub fn text_color(&self, value: u32) -> Color {
        if value <= DARK_TEXT_MAX {
            self.text_dark
        } else {
            self.text_light
        }
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(stripped) = line.strip_prefix("theme[") {
            if let Some(end) = stripped.find(']') {
                let key = stripped[..end].trim();
                let rest = stripped[end + 1..].trim();
                if let Some(eq) = rest.find('=') {
                    let value = rest[eq + 1..]
                        .trim()
                        .trim_matches('"')
                        .trim_matches('\'')
                        .to_string();
                    if !value.is_empty() {
                        map.insert(key.to_string(), value);
                    }
                }
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let s = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.to_string());
    if !s.is_ascii() {
        return Err(invalid());
    }
    let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&s[range], 16).map_err(|_| invalid());
    match s.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}
