//! Parameter types for filters, edits and export.
//!
//! These structs describe *what* to do, not *how* to do it. They are the
//! interface between callers (the CLI, the [`Workspace`](crate::workspace::Workspace))
//! and the engines in [`filters`](super::filters), [`edits`](super::edits) and
//! [`export`](super::export).
//!
//! Every scalar is clamped into its declared range on construction, so the
//! engines never see an out-of-range value:
//!
//! | Type | Range | Default |
//! |---|---|---|
//! | [`Intensity`] | 0.0 – 1.0 | 0.5 |
//! | [`Percent`] | 0 – 100 | none |
//! | [`Factor`] | 0.0 – 2.0 | 1.0 |
//! | [`Quality`] | 1 – 100 | 95 |
//!
//! [`FilterKind`], [`EditSpec`] and [`ExportFormat`] parse from the short
//! text forms the CLI accepts (`sepia`, `crop:10,10,90,90`, `png`).

use super::error::ImagingError;
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Quality setting for lossy image encoding (1-100). Only JPEG uses it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Quality(u8);

impl Quality {
    pub fn new(value: u32) -> Self {
        Self(value.clamp(1, 100) as u8)
    }

    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(95)
    }
}

/// Filter strength in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Intensity(f32);

impl Intensity {
    pub fn new(value: f32) -> Self {
        // NaN collapses to "no effect"
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

impl Default for Intensity {
    fn default() -> Self {
        Self(0.5)
    }
}

/// Crop margin as a percentage of the image dimension, `[0, 100]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Percent(f32);

impl Percent {
    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(0.0);
        }
        Self(value.clamp(0.0, 100.0))
    }

    pub fn value(self) -> f32 {
        self.0
    }
}

/// Multiplicative enhancement factor: 0 = none/black, 1 = unchanged, 2 = double.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize)]
pub struct Factor(f32);

impl Factor {
    pub const MAX: f32 = 2.0;

    pub fn new(value: f32) -> Self {
        if value.is_nan() {
            return Self(1.0);
        }
        Self(value.clamp(0.0, Self::MAX))
    }

    pub fn value(self) -> f32 {
        self.0
    }

    pub fn is_identity(self) -> bool {
        self.0 == 1.0
    }
}

impl Default for Factor {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Stylistic whole-image filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterKind {
    None,
    Sepia,
    Grayscale,
    Blur,
    Sharpen,
    Vintage,
    Noir,
    Vibrant,
    Pastel,
}

impl FilterKind {
    pub const ALL: [FilterKind; 9] = [
        FilterKind::None,
        FilterKind::Sepia,
        FilterKind::Grayscale,
        FilterKind::Blur,
        FilterKind::Sharpen,
        FilterKind::Vintage,
        FilterKind::Noir,
        FilterKind::Vibrant,
        FilterKind::Pastel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FilterKind::None => "none",
            FilterKind::Sepia => "sepia",
            FilterKind::Grayscale => "grayscale",
            FilterKind::Blur => "blur",
            FilterKind::Sharpen => "sharpen",
            FilterKind::Vintage => "vintage",
            FilterKind::Noir => "noir",
            FilterKind::Vibrant => "vibrant",
            FilterKind::Pastel => "pastel",
        }
    }

    /// Whether intensity is a blend factor against the original image.
    ///
    /// Blur and Sharpen use intensity to scale their own parameter instead.
    /// Noir, Vibrant and Pastel have no transform and ignore it.
    pub fn is_blend(self) -> bool {
        matches!(
            self,
            FilterKind::Sepia | FilterKind::Grayscale | FilterKind::Vintage
        )
    }
}

impl fmt::Display for FilterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for FilterKind {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        FilterKind::ALL
            .into_iter()
            .find(|kind| kind.name().eq_ignore_ascii_case(wanted))
            .or_else(|| wanted.eq_ignore_ascii_case("greyscale").then_some(FilterKind::Grayscale))
            .ok_or_else(|| ImagingError::UnknownFilter(s.to_string()))
    }
}

/// A filter kind together with its strength.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FilterSpec {
    pub kind: FilterKind,
    pub intensity: Intensity,
}

impl FilterSpec {
    pub fn new(kind: FilterKind, intensity: f32) -> Self {
        Self {
            kind,
            intensity: Intensity::new(intensity),
        }
    }
}

impl fmt::Display for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} @ {:.2}", self.kind, self.intensity.value())
    }
}

/// Crop margins, each a percentage of the matching dimension.
///
/// `left`/`top` are where the kept box starts, `right`/`bottom` where it ends
/// (so a full-image crop is `0, 0, 100, 100`).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CropMargins {
    pub left: Percent,
    pub top: Percent,
    pub right: Percent,
    pub bottom: Percent,
}

impl CropMargins {
    pub fn new(left: f32, top: f32, right: f32, bottom: f32) -> Self {
        Self {
            left: Percent::new(left),
            top: Percent::new(top),
            right: Percent::new(right),
            bottom: Percent::new(bottom),
        }
    }
}

/// Brightness, contrast and saturation factors, applied in that order.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ColorAdjustment {
    pub brightness: Factor,
    pub contrast: Factor,
    pub saturation: Factor,
}

impl ColorAdjustment {
    pub fn new(brightness: f32, contrast: f32, saturation: f32) -> Self {
        Self {
            brightness: Factor::new(brightness),
            contrast: Factor::new(contrast),
            saturation: Factor::new(saturation),
        }
    }
}

/// A single geometric or colour-correction edit.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum EditSpec {
    Crop(CropMargins),
    Rotate { angle: f32 },
    Resize { width: u32, height: u32 },
    ColorAdjust(ColorAdjustment),
    BackgroundRemoval,
}

impl fmt::Display for EditSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EditSpec::Crop(m) => write!(
                f,
                "crop:{},{},{},{}",
                m.left.value(),
                m.top.value(),
                m.right.value(),
                m.bottom.value()
            ),
            EditSpec::Rotate { angle } => write!(f, "rotate:{angle}"),
            EditSpec::Resize { width, height } => write!(f, "resize:{width}x{height}"),
            EditSpec::ColorAdjust(c) => write!(
                f,
                "adjust:{},{},{}",
                c.brightness.value(),
                c.contrast.value(),
                c.saturation.value()
            ),
            EditSpec::BackgroundRemoval => f.write_str("remove-background"),
        }
    }
}

fn parse_numbers<const N: usize>(spec: &str, args: &str, sep: char) -> Result<[f32; N], ImagingError> {
    let parts: Vec<&str> = args.split(sep).map(str::trim).collect();
    if parts.len() != N {
        return Err(ImagingError::UnknownEdit(format!(
            "{spec}: expected {N} values separated by '{sep}'"
        )));
    }
    let mut values = [0.0; N];
    for (slot, part) in values.iter_mut().zip(parts) {
        *slot = part
            .parse()
            .map_err(|_| ImagingError::UnknownEdit(format!("{spec}: '{part}' is not a number")))?;
    }
    Ok(values)
}

impl FromStr for EditSpec {
    type Err = ImagingError;

    /// Parse `crop:L,T,R,B`, `rotate:DEG`, `resize:WxH`, `adjust:B,C,S` or
    /// `remove-background`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (op, args) = s.split_once(':').unwrap_or((s, ""));
        match op.to_ascii_lowercase().as_str() {
            "crop" => {
                let [l, t, r, b] = parse_numbers::<4>(s, args, ',')?;
                Ok(EditSpec::Crop(CropMargins::new(l, t, r, b)))
            }
            "rotate" => {
                let [angle] = parse_numbers::<1>(s, args, ',')?;
                Ok(EditSpec::Rotate { angle })
            }
            "resize" => {
                let [w, h] = parse_numbers::<2>(s, &args.to_ascii_lowercase(), 'x')?;
                if w < 1.0 || h < 1.0 || w.fract() != 0.0 || h.fract() != 0.0 {
                    return Err(ImagingError::UnknownEdit(format!(
                        "{s}: width and height must be positive integers"
                    )));
                }
                Ok(EditSpec::Resize {
                    width: w as u32,
                    height: h as u32,
                })
            }
            "adjust" => {
                let [b, c, sat] = parse_numbers::<3>(s, args, ',')?;
                Ok(EditSpec::ColorAdjust(ColorAdjustment::new(b, c, sat)))
            }
            "remove-background" | "background-removal" => Ok(EditSpec::BackgroundRemoval),
            _ => Err(ImagingError::UnknownEdit(s.to_string())),
        }
    }
}

/// Output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Jpeg,
    Png,
    Gif,
}

impl ExportFormat {
    /// File extension written by the exporter.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Jpeg => "jpeg",
            ExportFormat::Png => "png",
            ExportFormat::Gif => "gif",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = ImagingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Ok(ExportFormat::Jpeg),
            "png" => Ok(ExportFormat::Png),
            "gif" => Ok(ExportFormat::Gif),
            _ => Err(ImagingError::UnknownFormat(s.to_string())),
        }
    }
}

/// What to write and under which base name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportSpec {
    pub format: ExportFormat,
    pub quality: Quality,
    /// Base filename, without timestamp or extension.
    pub filename: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_clamps_to_valid_range() {
        assert_eq!(Quality::new(0).value(), 1);
        assert_eq!(Quality::new(50).value(), 50);
        assert_eq!(Quality::new(150).value(), 100);
    }

    #[test]
    fn quality_default_is_95() {
        assert_eq!(Quality::default().value(), 95);
    }

    #[test]
    fn intensity_clamps_and_rejects_nan() {
        assert_eq!(Intensity::new(-0.5).value(), 0.0);
        assert_eq!(Intensity::new(0.25).value(), 0.25);
        assert_eq!(Intensity::new(3.0).value(), 1.0);
        assert_eq!(Intensity::new(f32::NAN).value(), 0.0);
    }

    #[test]
    fn factor_clamps_to_zero_two() {
        assert_eq!(Factor::new(-1.0).value(), 0.0);
        assert_eq!(Factor::new(5.0).value(), 2.0);
        assert!(Factor::new(1.0).is_identity());
        assert!(Factor::new(f32::NAN).is_identity());
    }

    #[test]
    fn percent_clamps() {
        assert_eq!(Percent::new(-3.0).value(), 0.0);
        assert_eq!(Percent::new(140.0).value(), 100.0);
    }

    #[test]
    fn filter_kind_parses_case_insensitively() {
        assert_eq!("Sepia".parse::<FilterKind>().unwrap(), FilterKind::Sepia);
        assert_eq!("NOIR".parse::<FilterKind>().unwrap(), FilterKind::Noir);
        assert_eq!("greyscale".parse::<FilterKind>().unwrap(), FilterKind::Grayscale);
        assert!(matches!(
            "glitter".parse::<FilterKind>(),
            Err(ImagingError::UnknownFilter(_))
        ));
    }

    #[test]
    fn blend_kinds_exclude_blur_and_sharpen() {
        assert!(FilterKind::Sepia.is_blend());
        assert!(FilterKind::Vintage.is_blend());
        assert!(!FilterKind::Blur.is_blend());
        assert!(!FilterKind::Sharpen.is_blend());
        assert!(!FilterKind::None.is_blend());
        assert!(!FilterKind::Noir.is_blend());
    }

    #[test]
    fn edit_spec_parses_each_operation() {
        assert_eq!(
            "crop:10,10,90,90".parse::<EditSpec>().unwrap(),
            EditSpec::Crop(CropMargins::new(10.0, 10.0, 90.0, 90.0))
        );
        assert_eq!(
            "rotate:-45".parse::<EditSpec>().unwrap(),
            EditSpec::Rotate { angle: -45.0 }
        );
        assert_eq!(
            "resize:800x600".parse::<EditSpec>().unwrap(),
            EditSpec::Resize {
                width: 800,
                height: 600
            }
        );
        assert_eq!(
            "adjust:1.2,0.8,3".parse::<EditSpec>().unwrap(),
            EditSpec::ColorAdjust(ColorAdjustment::new(1.2, 0.8, 2.0))
        );
        assert_eq!(
            "remove-background".parse::<EditSpec>().unwrap(),
            EditSpec::BackgroundRemoval
        );
    }

    #[test]
    fn edit_spec_rejects_malformed_input() {
        assert!("crop:10,10".parse::<EditSpec>().is_err());
        assert!("resize:0x100".parse::<EditSpec>().is_err());
        assert!("resize:10.5x100".parse::<EditSpec>().is_err());
        assert!("rotate:left".parse::<EditSpec>().is_err());
        assert!("posterize:4".parse::<EditSpec>().is_err());
    }

    #[test]
    fn edit_spec_display_uses_parse_syntax() {
        let spec = EditSpec::Resize {
            width: 64,
            height: 32,
        };
        assert_eq!(spec.to_string(), "resize:64x32");
        assert_eq!(spec.to_string().parse::<EditSpec>().unwrap(), spec);
    }

    #[test]
    fn export_format_parses_aliases() {
        assert_eq!("JPG".parse::<ExportFormat>().unwrap(), ExportFormat::Jpeg);
        assert_eq!("png".parse::<ExportFormat>().unwrap(), ExportFormat::Png);
        assert_eq!("gif".parse::<ExportFormat>().unwrap(), ExportFormat::Gif);
        assert!("webp".parse::<ExportFormat>().is_err());
        assert_eq!(ExportFormat::Jpeg.extension(), "jpeg");
    }

    #[test]
    fn filter_spec_display() {
        let spec = FilterSpec::new(FilterKind::Vintage, 0.5);
        assert_eq!(spec.to_string(), "vintage @ 0.50");
    }
}
