//! Window configuration schema
//!
//! `WindowConfig` mirrors the dictionary accepted by `nvim_win_set_config`
//! and returned by `nvim_win_get_config`. Every field is optional: absent
//! fields are omitted from the payload entirely, and a read tolerates any
//! subset being present. Unknown fields reported by newer hosts are ignored.
//!
//! Only the shape of a manual border is checked locally. Combinations such
//! as `external` together with `relative` are left for the host to judge.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{ApiError, HandleId};

/// Number of entries in a manual border, clockwise from the top
pub const MANUAL_BORDER_LEN: usize = 8;

/// What `row`/`col` are measured against
///
/// Values the host knows but this client doesn't (`mouse`, `laststatus`,
/// ...) are kept as `Other` and sent back unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Relative {
    /// Empty string: the window is not floating
    Unset,
    Editor,
    Win,
    Cursor,
    Other(String),
}

impl Relative {
    pub fn as_str(&self) -> &str {
        match self {
            Relative::Unset => "",
            Relative::Editor => "editor",
            Relative::Win => "win",
            Relative::Cursor => "cursor",
            Relative::Other(s) => s,
        }
    }
}

impl From<String> for Relative {
    fn from(s: String) -> Self {
        match s.as_str() {
            "" => Self::Unset,
            "editor" => Self::Editor,
            "win" => Self::Win,
            "cursor" => Self::Cursor,
            _ => Self::Other(s),
        }
    }
}

impl From<Relative> for String {
    fn from(relative: Relative) -> Self {
        match relative {
            Relative::Other(s) => s,
            known => known.as_str().to_string(),
        }
    }
}

/// Only the spellings this client knows; use `Relative::from` to accept any
impl FromStr for Relative {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Relative::from(s.to_string()) {
            Relative::Other(_) => Err(format!("Unknown relative: {}", s)),
            known => Ok(known),
        }
    }
}

/// Corner of the float placed at (`row`, `col`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Anchor {
    NW,
    NE,
    SW,
    SE,
}

impl FromStr for Anchor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "NW" => Ok(Self::NW),
            "NE" => Ok(Self::NE),
            "SW" => Ok(Self::SW),
            "SE" => Ok(Self::SE),
            _ => Err(format!("Unknown anchor: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Minimal,
}

impl FromStr for Style {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "minimal" => Ok(Self::Minimal),
            _ => Err(format!("Unknown style: {}", s)),
        }
    }
}

/// Host-defined border decorations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BorderPreset {
    None,
    Single,
    Double,
    Rounded,
    Solid,
    Shadow,
}

impl FromStr for BorderPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(Self::None),
            "single" => Ok(Self::Single),
            "double" => Ok(Self::Double),
            "rounded" => Ok(Self::Rounded),
            "solid" => Ok(Self::Solid),
            "shadow" => Ok(Self::Shadow),
            _ => Err(format!("Unknown border preset: {}", s)),
        }
    }
}

/// One cell of a manual border
///
/// Serialized as `"c"` or `["c", "HlGroup"]`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BorderChar {
    Char(String),
    CharWithHighlight(String, String),
}

impl BorderChar {
    pub fn text(&self) -> &str {
        match self {
            BorderChar::Char(c) | BorderChar::CharWithHighlight(c, _) => c,
        }
    }

    pub fn highlight(&self) -> Option<&str> {
        match self {
            BorderChar::Char(_) => None,
            BorderChar::CharWithHighlight(_, hl) => Some(hl),
        }
    }
}

impl From<&str> for BorderChar {
    fn from(c: &str) -> Self {
        BorderChar::Char(c.to_string())
    }
}

impl From<(&str, &str)> for BorderChar {
    fn from((c, hl): (&str, &str)) -> Self {
        BorderChar::CharWithHighlight(c.to_string(), hl.to_string())
    }
}

/// Border of a floating window
///
/// `Manual` entries run top, top-right, right, bottom-right, bottom,
/// bottom-left, left, top-left. The length is not enforced by the type so
/// that a host reply or a parsed file can be represented and then rejected
/// by [`WindowConfig::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Border {
    Preset(BorderPreset),
    Manual(Vec<BorderChar>),
}

impl Border {
    /// Build a manual border from exactly eight cells
    pub fn manual(cells: [BorderChar; MANUAL_BORDER_LEN]) -> Self {
        Border::Manual(cells.into())
    }
}

/// A row or column position; integral or fractional depending on `relative`
///
/// Compared by numeric value: the host reports positions as floats, so
/// `Int(2)` written is `Float(2.0)` read back.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Int(i64),
    Float(f64),
}

impl Coordinate {
    pub fn as_f64(self) -> f64 {
        match self {
            Coordinate::Int(v) => v as f64,
            Coordinate::Float(v) => v,
        }
    }
}

impl PartialEq for Coordinate {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Coordinate::Int(a), Coordinate::Int(b)) => a == b,
            (a, b) => a.as_f64() == b.as_f64(),
        }
    }
}

impl From<i64> for Coordinate {
    fn from(v: i64) -> Self {
        Coordinate::Int(v)
    }
}

impl From<f64> for Coordinate {
    fn from(v: f64) -> Self {
        Coordinate::Float(v)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Coordinate::Int(v) => write!(f, "{}", v),
            Coordinate::Float(v) => write!(f, "{}", v),
        }
    }
}

/// Placement and decoration of a window
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relative: Option<Relative>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focusable: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external: Option<bool>,

    /// Id of the window `row`/`col` refer to when `relative` is `win`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub win: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anchor: Option<Anchor>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,

    /// (line, column) in the relative window's buffer
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bufpos: Option<(i64, i64)>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub row: Option<Coordinate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub col: Option<Coordinate>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zindex: Option<i64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<Style>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub border: Option<Border>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noautocmd: Option<bool>,
}

impl WindowConfig {
    /// Position relative to another window
    pub fn relative_to(mut self, win: impl HandleId) -> Self {
        self.relative = Some(Relative::Win);
        self.win = Some(win.handle_id());
        self
    }

    /// Whether the config describes a floating window
    pub fn is_floating(&self) -> bool {
        matches!(&self.relative, Some(r) if *r != Relative::Unset)
    }

    /// Check the fields the client is responsible for
    ///
    /// # Errors
    ///
    /// Returns `ApiError::ConfigValidation` if a manual border does not have
    /// exactly eight entries.
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(Border::Manual(cells)) = &self.border {
            if cells.len() != MANUAL_BORDER_LEN {
                return Err(ApiError::ConfigValidation {
                    field: "border",
                    message: format!(
                        "manual border needs exactly {} entries, got {}",
                        MANUAL_BORDER_LEN,
                        cells.len()
                    ),
                });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn eight_cells() -> Vec<BorderChar> {
        ["─", "╮", "│", "╯", "─", "╰", "│", "╭"]
            .into_iter()
            .map(BorderChar::from)
            .collect()
    }

    #[test]
    fn test_empty_config_serializes_to_empty_object() {
        let value = serde_json::to_value(WindowConfig::default()).unwrap();
        assert_eq!(value, json!({}));
    }

    #[test]
    fn test_absent_fields_are_omitted() {
        let config = WindowConfig {
            relative: Some(Relative::Editor),
            row: Some(Coordinate::Int(2)),
            col: Some(Coordinate::Int(3)),
            width: Some(10),
            height: Some(5),
            ..Default::default()
        };

        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(
            value,
            json!({"relative": "editor", "row": 2, "col": 3, "width": 10, "height": 5})
        );
    }

    #[test]
    fn test_full_config_field_names() {
        let config = WindowConfig {
            relative: Some(Relative::Cursor),
            focusable: Some(false),
            external: Some(false),
            win: None,
            anchor: Some(Anchor::SE),
            width: Some(40),
            height: Some(8),
            bufpos: Some((10, 0)),
            row: Some(Coordinate::Float(1.5)),
            col: Some(Coordinate::Int(0)),
            zindex: Some(60),
            style: Some(Style::Minimal),
            border: Some(Border::Preset(BorderPreset::Rounded)),
            noautocmd: Some(true),
        };

        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(
            value,
            json!({
                "relative": "cursor",
                "focusable": false,
                "external": false,
                "anchor": "SE",
                "width": 40,
                "height": 8,
                "bufpos": [10, 0],
                "row": 1.5,
                "col": 0,
                "zindex": 60,
                "style": "minimal",
                "border": "rounded",
                "noautocmd": true
            })
        );
    }

    #[test]
    fn test_unset_relative_is_empty_string() {
        let config = WindowConfig {
            relative: Some(Relative::Unset),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&config).unwrap(), json!({"relative": ""}));
        assert!(!config.is_floating());
    }

    #[test]
    fn test_relative_to_window() {
        let config = WindowConfig::default().relative_to(1001_i64);
        assert_eq!(config.relative, Some(Relative::Win));
        assert_eq!(config.win, Some(1001));
        assert!(config.is_floating());
    }

    #[test]
    fn test_manual_border_mixed_cells_serialize() {
        let mut cells = eight_cells();
        cells[0] = BorderChar::from(("─", "FloatBorder"));
        let config = WindowConfig {
            border: Some(Border::Manual(cells)),
            ..Default::default()
        };

        let value = serde_json::to_value(&config).unwrap();

        assert_eq!(
            value["border"],
            json!([["─", "FloatBorder"], "╮", "│", "╯", "─", "╰", "│", "╭"])
        );
    }

    #[test]
    fn test_border_with_eight_cells_validates() {
        let config = WindowConfig {
            border: Some(Border::Manual(eight_cells())),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_border_with_wrong_length_fails_validation() {
        for len in [0, 1, 4, 7, 9, 16] {
            let cells = std::iter::repeat(BorderChar::from("x")).take(len).collect();
            let config = WindowConfig {
                border: Some(Border::Manual(cells)),
                ..Default::default()
            };

            match config.validate() {
                Err(ApiError::ConfigValidation { field, message }) => {
                    assert_eq!(field, "border");
                    assert!(message.contains(&len.to_string()), "message: {}", message);
                }
                other => panic!("Expected ConfigValidation for {} cells, got: {:?}", len, other),
            }
        }
    }

    #[test]
    fn test_presets_always_validate() {
        for preset in ["none", "single", "double", "rounded", "solid", "shadow"] {
            let config = WindowConfig {
                border: Some(Border::Preset(preset.parse().unwrap())),
                ..Default::default()
            };
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_external_with_relative_is_left_to_host() {
        let config = WindowConfig {
            relative: Some(Relative::Editor),
            external: Some(true),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_decode_tiled_window_reply() {
        // What the host reports for an ordinary split
        let reply = json!({
            "relative": "",
            "external": false,
            "focusable": true,
            "width": 80,
            "height": 24,
            "hide": false,
            "split": "left"
        });

        let config: WindowConfig = serde_json::from_value(reply).unwrap();

        assert_eq!(config.relative, Some(Relative::Unset));
        assert_eq!(config.width, Some(80));
        assert_eq!(config.height, Some(24));
        assert_eq!(config.border, None);
        assert!(!config.is_floating());
    }

    #[test]
    fn test_decode_float_reply_with_highlighted_border() {
        let reply = json!({
            "relative": "win",
            "win": 1000,
            "anchor": "NW",
            "row": 2.5,
            "col": 3,
            "width": 10,
            "height": 5,
            "zindex": 50,
            "border": [["╭", "FloatBorder"], "─", "╮", "│", "╯", "─", "╰", "│"]
        });

        let config: WindowConfig = serde_json::from_value(reply).unwrap();

        assert_eq!(config.win, Some(1000));
        assert_eq!(config.anchor, Some(Anchor::NW));
        assert_eq!(config.row, Some(Coordinate::Float(2.5)));
        assert_eq!(config.col, Some(Coordinate::Int(3)));
        match config.border {
            Some(Border::Manual(cells)) => {
                assert_eq!(cells.len(), MANUAL_BORDER_LEN);
                assert_eq!(cells[0].text(), "╭");
                assert_eq!(cells[0].highlight(), Some("FloatBorder"));
                assert_eq!(cells[1].highlight(), None);
            }
            other => panic!("Expected manual border, got: {:?}", other),
        }
    }

    #[test]
    fn test_float_coordinates_from_host_equal_written_ints() {
        let reply = json!({"relative": "editor", "row": 2.0, "col": 3.5});

        let config: WindowConfig = serde_json::from_value(reply).unwrap();

        assert_eq!(config.row, Some(Coordinate::Int(2)));
        assert_eq!(config.col, Some(Coordinate::Float(3.5)));
        assert_ne!(config.col, Some(Coordinate::Int(3)));
    }

    #[test]
    fn test_unknown_relative_round_trips() {
        let reply = json!({"relative": "mouse", "row": 1.0, "col": 1.0});

        let config: WindowConfig = serde_json::from_value(reply).unwrap();

        assert_eq!(config.relative, Some(Relative::Other("mouse".to_string())));
        assert!(config.is_floating());
        assert_eq!(serde_json::to_value(&config).unwrap()["relative"], json!("mouse"));
    }

    #[test]
    fn test_decode_empty_reply() {
        let config: WindowConfig = serde_json::from_value(json!({})).unwrap();
        assert_eq!(config, WindowConfig::default());
    }

    #[test]
    fn test_enum_parsing_rejects_unknown_spellings() {
        assert_eq!("editor".parse::<Relative>(), Ok(Relative::Editor));
        assert!("window".parse::<Relative>().is_err());
        assert_eq!("SW".parse::<Anchor>(), Ok(Anchor::SW));
        assert!("sw".parse::<Anchor>().is_err());
        assert!("fancy".parse::<BorderPreset>().is_err());
        assert!("compact".parse::<Style>().is_err());
    }
}
