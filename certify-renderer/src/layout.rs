//! Layout specifications — page geometry plus the text lines drawn on it.
//!
//! | Variant            | Page (in)    | Content                                        |
//! |--------------------|--------------|------------------------------------------------|
//! | `wide-landscape`   | 11.69 × 8.28 | blue name + program, two thank-you lines        |
//! | `narrow-landscape` | 11.69 × 8.26 | bold name, four-line paragraph with date range  |
//! | `portrait-badge`   | 3.54 × 5.11  | upper-cased name only                           |
//!
//! All coordinates are PDF points (1/72 in) from the bottom-left corner.
//! Vertical positions derive from `start_fraction * page height`.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use certify_core::types::Field;

use crate::error::{render_io, RenderError};

/// Points per inch.
pub const INCH: f32 = 72.0;

// ---------------------------------------------------------------------------
// Building blocks
// ---------------------------------------------------------------------------

/// Page dimensions in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f32,
    pub height: f32,
}

impl PageSize {
    pub fn inches(width: f32, height: f32) -> Self {
        Self {
            width: width * INCH,
            height: height * INCH,
        }
    }
}

/// The two standard-14 faces the overlay uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FontFace {
    #[serde(rename = "Helvetica")]
    Helvetica,
    #[serde(rename = "Helvetica-Bold")]
    HelveticaBold,
}

impl FontFace {
    /// PDF `BaseFont` name.
    pub fn base_font(self) -> &'static str {
        match self {
            FontFace::Helvetica => "Helvetica",
            FontFace::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Key under the page's `/Font` resources.
    pub fn resource_name(self) -> &'static str {
        match self {
            FontFace::Helvetica => "F1",
            FontFace::HelveticaBold => "F2",
        }
    }

    pub fn all() -> &'static [FontFace] {
        &[FontFace::Helvetica, FontFace::HelveticaBold]
    }
}

/// Fill color, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    pub const BLACK: Rgb = Rgb { r: 0.0, g: 0.0, b: 0.0 };
    pub const GRAY: Rgb = Rgb { r: 0.5, g: 0.5, b: 0.5 };

    /// `0xRRGGBB`.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| ((hex >> shift) & 0xff) as f32 / 255.0;
        Self {
            r: channel(16),
            g: channel(8),
            b: channel(0),
        }
    }
}

impl Default for Rgb {
    fn default() -> Self {
        Rgb::BLACK
    }
}

/// Where a line's baseline sits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Placement {
    /// At the layout's start position.
    Start,
    /// A fixed distance below the start position.
    BelowStart { offset: f32 },
    /// Below the previous line by this line's font size plus `padding`.
    Stacked { padding: f32 },
}

/// One line of certificate text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    /// Tera template rendered against the record's render context.
    pub content: String,
    pub font: FontFace,
    pub size: f32,
    #[serde(default)]
    pub color: Rgb,
    /// Added to the horizontally centered position.
    #[serde(default)]
    pub x_offset: f32,
    pub placement: Placement,
}

impl TextLine {
    fn new(content: &str, font: FontFace, size: f32, placement: Placement) -> Self {
        Self {
            content: content.to_string(),
            font,
            size,
            color: Rgb::BLACK,
            x_offset: 0.0,
            placement,
        }
    }

    fn color(mut self, color: Rgb) -> Self {
        self.color = color;
        self
    }

    fn shifted(mut self, x_offset: f32) -> Self {
        self.x_offset = x_offset;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Corner {
    TopLeft,
    BottomLeft,
}

/// The small gray traceability identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StampSpec {
    pub size: f32,
    pub corner: Corner,
    /// Distance from the left edge.
    pub inset_x: f32,
    /// Distance from the top (top-left) or bottom (bottom-left) edge.
    pub inset_y: f32,
    #[serde(default = "stamp_color")]
    pub color: Rgb,
}

fn stamp_color() -> Rgb {
    Rgb::GRAY
}

impl StampSpec {
    /// Baseline origin of the stamp on a page of `page` size.
    pub fn origin(&self, page: PageSize) -> (f32, f32) {
        match self.corner {
            Corner::TopLeft => (self.inset_x, page.height - self.inset_y),
            Corner::BottomLeft => (self.inset_x, self.inset_y),
        }
    }
}

/// Subject and body templates for the notification email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageSpec {
    pub subject: String,
    pub body: String,
}

// ---------------------------------------------------------------------------
// LayoutSpec
// ---------------------------------------------------------------------------

/// A complete certificate layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutSpec {
    pub name: String,
    pub page: PageSize,
    /// Start position as a fraction of page height.
    pub start_fraction: f32,
    pub lines: Vec<TextLine>,
    pub stamp: StampSpec,
    /// Fields that must be non-blank for a record to render.
    #[serde(default)]
    pub required: Vec<Field>,
    /// Output file prefix when the record has no specialization.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_prefix: Option<String>,
    pub message: MessageSpec,
}

impl LayoutSpec {
    /// Baseline of the `Start` placement.
    pub fn start_y(&self) -> f32 {
        self.page.height * self.start_fraction
    }

    /// Load a custom layout from YAML.
    pub fn from_yaml_file(path: &Path) -> Result<Self, RenderError> {
        let contents = std::fs::read_to_string(path).map_err(|e| render_io(path, e))?;
        serde_yaml::from_str(&contents).map_err(|source| RenderError::LayoutParse {
            path: path.to_path_buf(),
            source,
        })
    }
}

// ---------------------------------------------------------------------------
// LayoutVariant
// ---------------------------------------------------------------------------

const KAUST_BLUE: u32 = 0x0e53b5;

const SIGNATURE: &str = "Kindest regards,\nKAUST Academy Team";

/// Built-in layouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayoutVariant {
    /// Student certificate, 11.69 × 8.28 in.
    WideLandscape,
    /// Instructor certificate, 11.69 × 8.26 in.
    NarrowLandscape,
    /// Name badge, 3.54 × 5.11 in.
    PortraitBadge,
}

impl LayoutVariant {
    /// All variants in a stable order.
    pub fn all() -> &'static [LayoutVariant] {
        &[
            LayoutVariant::WideLandscape,
            LayoutVariant::NarrowLandscape,
            LayoutVariant::PortraitBadge,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            LayoutVariant::WideLandscape => "wide-landscape",
            LayoutVariant::NarrowLandscape => "narrow-landscape",
            LayoutVariant::PortraitBadge => "portrait-badge",
        }
    }

    /// The full layout definition for this variant.
    pub fn spec(self) -> LayoutSpec {
        match self {
            LayoutVariant::WideLandscape => wide_landscape(),
            LayoutVariant::NarrowLandscape => narrow_landscape(),
            LayoutVariant::PortraitBadge => portrait_badge(),
        }
    }
}

impl fmt::Display for LayoutVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LayoutVariant {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        LayoutVariant::all()
            .iter()
            .copied()
            .find(|v| v.name() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown layout '{s}'; expected: wide-landscape, narrow-landscape, portrait-badge"
                )
            })
    }
}

fn wide_landscape() -> LayoutSpec {
    let blue = Rgb::from_hex(KAUST_BLUE);
    let shift = 0.5 * INCH;
    LayoutSpec {
        name: LayoutVariant::WideLandscape.name().to_string(),
        page: PageSize::inches(11.69, 8.28),
        start_fraction: 0.6,
        lines: vec![
            TextLine::new("{{ full_name | upper }}", FontFace::HelveticaBold, 25.0, Placement::Start)
                .color(blue)
                .shifted(shift),
            TextLine::new(
                "Has made significant contribution to the",
                FontFace::Helvetica,
                15.0,
                Placement::BelowStart { offset: 0.6 * INCH },
            )
            .shifted(shift),
            TextLine::new(
                "{{ specialization | upper }}",
                FontFace::HelveticaBold,
                20.0,
                Placement::BelowStart { offset: 1.0 * INCH },
            )
            .color(blue)
            .shifted(shift),
            TextLine::new(
                "From deep down our hearts, Thank you",
                FontFace::Helvetica,
                15.0,
                Placement::BelowStart { offset: 1.4 * INCH },
            )
            .shifted(shift),
        ],
        stamp: StampSpec {
            size: 6.0,
            corner: Corner::TopLeft,
            inset_x: 0.125 * INCH,
            inset_y: 0.10 * INCH,
            color: Rgb::GRAY,
        },
        required: vec![Field::FullName, Field::Specialization],
        file_prefix: None,
        message: MessageSpec {
            subject: "Thanks on contributing to the {{ specialization }} - {{ full_name }}".to_string(),
            body: format!(
                "Dear {{{{ full_name }}}},\n\nPlease find attached your contribution certificate on {{{{ specialization }}}}.\n\n{SIGNATURE}"
            ),
        },
    }
}

fn narrow_landscape() -> LayoutSpec {
    // Name sits 25pt + 0.25in above the first paragraph line; the paragraph
    // itself is spaced 14pt + 0.125in.
    let first_gap = 25.0 + 0.25 * INCH - 14.0;
    let gap = 0.125 * INCH;
    LayoutSpec {
        name: LayoutVariant::NarrowLandscape.name().to_string(),
        page: PageSize::inches(11.69, 8.26),
        start_fraction: 0.52,
        lines: vec![
            TextLine::new("{{ full_name }}", FontFace::HelveticaBold, 25.0, Placement::Start),
            TextLine::new(
                "has significantly contributed to the success of the KAUST Academy Specialization",
                FontFace::Helvetica,
                14.0,
                Placement::Stacked { padding: first_gap },
            ),
            TextLine::new(
                "Program by delivering {{ specialization }} courses, {{ date_range }}.",
                FontFace::Helvetica,
                14.0,
                Placement::Stacked { padding: gap },
            ),
            TextLine::new(
                "Your commitment and expertise to enhancing our training programs are highly valued.",
                FontFace::Helvetica,
                14.0,
                Placement::Stacked { padding: gap },
            ),
            TextLine::new(
                "We extend our heartfelt gratitude and appreciation for your contribution.",
                FontFace::Helvetica,
                14.0,
                Placement::Stacked { padding: gap },
            ),
        ],
        stamp: StampSpec {
            size: 8.0,
            corner: Corner::TopLeft,
            inset_x: 0.5 * INCH,
            inset_y: 0.5 * INCH,
            color: Rgb::GRAY,
        },
        required: vec![
            Field::FullName,
            Field::Specialization,
            Field::StartDate,
            Field::EndDate,
        ],
        file_prefix: None,
        message: MessageSpec {
            subject: "Certificate of Contribution - KAUST Academy Specialization Program".to_string(),
            body: "Dear {{ full_name }},\n\n\
                   We are pleased to present you with the attached certificate in recognition of your \
                   significant contribution to the KAUST Academy Specialization Program.\n\n\
                   Your dedication in delivering {{ specialization }} courses {{ date_range }} has been \
                   instrumental to the success of our program.\n\n\
                   We highly value your commitment and expertise in enhancing our training programs. \
                   Please accept our heartfelt gratitude and appreciation for your contribution.\n\n\
                   Thank you for your outstanding service.\n\n\
                   Best regards,\nKAUST Academy Team"
                .to_string(),
        },
    }
}

fn portrait_badge() -> LayoutSpec {
    LayoutSpec {
        name: LayoutVariant::PortraitBadge.name().to_string(),
        page: PageSize::inches(3.54, 5.11),
        start_fraction: 0.5,
        lines: vec![TextLine::new(
            "{{ full_name | upper }}",
            FontFace::Helvetica,
            12.0,
            Placement::Start,
        )],
        stamp: StampSpec {
            size: 4.0,
            corner: Corner::BottomLeft,
            inset_x: 0.25 * INCH,
            inset_y: 0.25 * INCH,
            color: Rgb::GRAY,
        },
        required: vec![Field::FullName],
        file_prefix: Some("Oxford".to_string()),
        message: MessageSpec {
            subject: "Congratulation on finishing Oxford Training - {{ full_name }}".to_string(),
            body: format!(
                "Dear {{{{ full_name }}}},\n\nPlease find attached your certificate.\n\n{SIGNATURE}"
            ),
        },
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
