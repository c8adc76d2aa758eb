//! Indicator color palette
//!
//! The indicator is a three-channel LED with one on/off bit per channel,
//! which gives exactly eight colors including "off".

/// Colors the status indicator can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Color {
    /// All channels dark
    #[default]
    Off,
    Red,
    Green,
    Blue,
    Yellow,
    Cyan,
    Magenta,
    White,
}

/// Text keywords accepted from the network, in match order
pub const KEYWORDS: [(&str, Color); 7] = [
    ("red", Color::Red),
    ("green", Color::Green),
    ("blue", Color::Blue),
    ("yellow", Color::Yellow),
    ("cyan", Color::Cyan),
    ("magenta", Color::Magenta),
    ("white", Color::White),
];

impl Color {
    /// Color shown when the link comes up
    pub const GOOD: Color = Color::Green;

    /// Color shown when the link goes down
    pub const ALERT: Color = Color::Red;

    /// Look up a color keyword
    ///
    /// The payload is read as C text: it ends at the first NUL byte, or at
    /// the end of the payload if there is none. That text must equal the
    /// keyword; matching is case-sensitive and nothing is trimmed.
    pub fn from_keyword(payload: &[u8]) -> Option<Color> {
        let text = payload.split(|&b| b == 0).next().unwrap_or_default();
        KEYWORDS
            .iter()
            .find(|(word, _)| word.as_bytes() == text)
            .map(|&(_, color)| color)
    }

    /// Human-readable name
    pub fn name(self) -> &'static str {
        match self {
            Color::Off => "off",
            Color::Red => "red",
            Color::Green => "green",
            Color::Blue => "blue",
            Color::Yellow => "yellow",
            Color::Cyan => "cyan",
            Color::Magenta => "magenta",
            Color::White => "white",
        }
    }

    /// Channel states as (red, green, blue)
    pub fn channels(self) -> (bool, bool, bool) {
        match self {
            Color::Off => (false, false, false),
            Color::Red => (true, false, false),
            Color::Green => (false, true, false),
            Color::Blue => (false, false, true),
            Color::Yellow => (true, true, false),
            Color::Cyan => (false, true, true),
            Color::Magenta => (true, false, true),
            Color::White => (true, true, true),
        }
    }
}
