//! Token kind → visual style lookup.
//!
//! A [`Theme`] is a table from [`TokenKind`] to [`Style`] plus a default used for kinds the
//! table does not list. Themes can be loaded from JSON:
//!
//! ```json
//! {
//!   "name": "paper",
//!   "default": { "color": "#222222" },
//!   "styles": {
//!     "heading-text": { "color": "#0050b0", "bold": true },
//!     "link-url": { "underline": true }
//!   }
//! }
//! ```

use crate::tokenizer::{Emphasis, Token, TokenKind};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Errors from theme handling.
#[derive(Debug, thiserror::Error)]
pub enum StyleError {
    #[error("unknown theme: {0}")]
    /// No theme is registered under this name.
    UnknownTheme(String),

    #[error("theme parse error: {0}")]
    /// Theme JSON could not be parsed.
    Parse(#[from] serde_json::Error),

    #[error("invalid color '{0}', expected #rrggbb or #rrggbbaa")]
    /// A color string was malformed.
    InvalidColor(String),
}

/// An sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha (255 = opaque).
    pub a: u8,
}

impl Color {
    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(hex: &str) -> Result<Self, StyleError> {
        let invalid = || StyleError::InvalidColor(hex.to_string());
        let digits = hex.strip_prefix('#').ok_or_else(invalid)?;
        if !matches!(digits.len(), 6 | 8) || !digits.is_ascii() {
            return Err(invalid());
        }
        let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self {
            r: channel(0)?,
            g: channel(2)?,
            b: channel(4)?,
            a: if digits.len() == 8 { channel(6)? } else { 255 },
        })
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.r, self.g, self.b)?;
        if self.a != 255 {
            write!(f, "{:02x}", self.a)?;
        }
        Ok(())
    }
}

impl TryFrom<String> for Color {
    type Error = StyleError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_string()
    }
}

/// Visual attributes of a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Style {
    /// Foreground color; `None` inherits the theme default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Color>,
    /// Bold weight.
    pub bold: bool,
    /// Italic.
    pub italic: bool,
    /// Underlined.
    pub underline: bool,
    /// Struck through.
    pub strikethrough: bool,
}

impl Style {
    /// A plain style with `color`.
    pub const fn colored(color: Color) -> Self {
        Self {
            color: Some(color),
            bold: false,
            italic: false,
            underline: false,
            strikethrough: false,
        }
    }

    const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    const fn italic(mut self) -> Self {
        self.italic = true;
        self
    }

    const fn underline(mut self) -> Self {
        self.underline = true;
        self
    }

    const fn strikethrough(mut self) -> Self {
        self.strikethrough = true;
        self
    }

    /// Add the flags of enclosing emphasis.
    pub fn with_emphasis(mut self, emphasis: &Emphasis) -> Self {
        self.bold |= emphasis.bold;
        self.italic |= emphasis.italic;
        self.strikethrough |= emphasis.strikethrough;
        self
    }
}

/// A named style table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Theme {
    /// Theme name.
    pub name: String,
    /// Style for kinds missing from `styles`; also supplies the inherited color.
    #[serde(default)]
    pub default: Style,
    /// Per-kind styles.
    #[serde(default)]
    pub styles: HashMap<TokenKind, Style>,
}

struct Palette {
    text: Color,
    heading: Color,
    muted: Color,
    code: Color,
    link: Color,
    quote: Color,
    math: Color,
}

impl Theme {
    /// Parse a theme from JSON.
    pub fn from_json(json: &str) -> Result<Self, StyleError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Built-in light theme.
    pub fn light() -> Self {
        Self::from_palette(
            "light",
            &Palette {
                text: Color::rgb(0x24, 0x29, 0x2f),
                heading: Color::rgb(0x05, 0x50, 0xae),
                muted: Color::rgb(0x6e, 0x77, 0x81),
                code: Color::rgb(0x95, 0x38, 0x00),
                link: Color::rgb(0x09, 0x69, 0xda),
                quote: Color::rgb(0x57, 0x60, 0x6a),
                math: Color::rgb(0x82, 0x50, 0xdf),
            },
        )
    }

    /// Built-in dark theme.
    pub fn dark() -> Self {
        Self::from_palette(
            "dark",
            &Palette {
                text: Color::rgb(0xc9, 0xd1, 0xd9),
                heading: Color::rgb(0x79, 0xc0, 0xff),
                muted: Color::rgb(0x8b, 0x94, 0x9e),
                code: Color::rgb(0xff, 0xa6, 0x57),
                link: Color::rgb(0x58, 0xa6, 0xff),
                quote: Color::rgb(0xa5, 0xd6, 0xff),
                math: Color::rgb(0xd2, 0xa8, 0xff),
            },
        )
    }

    fn from_palette(name: &str, p: &Palette) -> Self {
        let muted = Style::colored(p.muted);
        let styles = TokenKind::ALL
            .into_iter()
            .filter_map(|kind| {
                let style = match kind {
                    TokenKind::Text => return None,
                    TokenKind::HeadingMarker => muted.bold(),
                    TokenKind::HeadingText => Style::colored(p.heading).bold(),
                    TokenKind::CodeBlock | TokenKind::CodeText => Style::colored(p.code),
                    TokenKind::BlockquoteMarker => Style::colored(p.quote),
                    TokenKind::TaskCheckbox
                    | TokenKind::FootnoteDefinition
                    | TokenKind::FootnoteReference => Style::colored(p.link),
                    TokenKind::BoldText => Style::colored(p.text).bold(),
                    TokenKind::ItalicText => Style::colored(p.text).italic(),
                    TokenKind::StrikethroughText => Style::colored(p.muted).strikethrough(),
                    TokenKind::LinkText => Style::colored(p.link).underline(),
                    TokenKind::ImageAlt => Style::colored(p.link).italic(),
                    TokenKind::LinkUrl | TokenKind::ImageUrl => muted.underline(),
                    TokenKind::MathText => Style::colored(p.math),
                    _ => muted,
                };
                Some((kind, style))
            })
            .collect();
        Self {
            name: name.to_string(),
            default: Style::colored(p.text),
            styles,
        }
    }

    /// Style for `kind`, falling back to the default style and color.
    pub fn style_for(&self, kind: TokenKind) -> Style {
        match self.styles.get(&kind) {
            Some(style) => Style {
                color: style.color.or(self.default.color),
                ..*style
            },
            None => self.default,
        }
    }
}

/// Resolves token kinds against the active theme.
#[derive(Debug, Clone)]
pub struct StyleResolver {
    themes: HashMap<String, Theme>,
    active: Theme,
}

impl StyleResolver {
    /// A resolver with the built-in `light` and `dark` themes, `light` active.
    pub fn new() -> Self {
        let light = Theme::light();
        let dark = Theme::dark();
        let mut themes = HashMap::new();
        themes.insert(dark.name.clone(), dark);
        themes.insert(light.name.clone(), light.clone());
        Self {
            themes,
            active: light,
        }
    }

    /// Add or replace a theme, returning the one it replaced.
    pub fn register_theme(&mut self, theme: Theme) -> Option<Theme> {
        if theme.name == self.active.name {
            self.active = theme.clone();
        }
        self.themes.insert(theme.name.clone(), theme)
    }

    /// Switch the active theme.
    pub fn set_active_theme(&mut self, name: &str) -> Result<(), StyleError> {
        let theme = self
            .themes
            .get(name)
            .ok_or_else(|| StyleError::UnknownTheme(name.to_string()))?;
        self.active = theme.clone();
        Ok(())
    }

    /// The active theme.
    pub fn active_theme(&self) -> &Theme {
        &self.active
    }

    /// Registered theme names, sorted.
    pub fn theme_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.themes.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Style for a token kind.
    pub fn resolve(&self, kind: TokenKind) -> Style {
        self.active.style_for(kind)
    }

    /// Style for a kind tag such as `"bold-text"`; unknown tags get the default style.
    pub fn resolve_tag(&self, tag: &str) -> Style {
        match tag.parse::<TokenKind>() {
            Ok(kind) => self.resolve(kind),
            Err(_) => self.active.default,
        }
    }

    /// Style for a token, including emphasis inherited from enclosing constructs.
    pub fn resolve_token(&self, token: &Token) -> Style {
        self.resolve(token.kind).with_emphasis(&token.meta.emphasis)
    }
}

impl Default for StyleResolver {
    fn default() -> Self {
        Self::new()
    }
}
