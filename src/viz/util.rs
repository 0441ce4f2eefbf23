//! Utility functions for visualization: colors, locale mapping, font registration, label sizing.

use num_format::Locale;
use plotters::prelude::*;
use std::path::PathBuf;
use std::sync::Once;

/// Environment variable pointing at a `.ttf` to use for chart text.
pub const FONT_ENV: &str = "APPT_CHART_FONT";

/// Microsoft Office (2013+) chart series palette.
/// Order: Blue, Orange, Gray, Gold, Light Blue, Green.
const OFFICE6: [RGBColor; 6] = [
    RGBColor(68, 114, 196),  // blue      (#4472C4)
    RGBColor(237, 125, 49),  // orange    (#ED7D31)
    RGBColor(165, 165, 165), // gray      (#A5A5A5)
    RGBColor(255, 192, 0),   // gold      (#FFC000)
    RGBColor(91, 155, 213),  // light blue(#5B9BD5)
    RGBColor(112, 173, 71),  // green     (#70AD47)
];

/// Get a color from the Office palette.
#[inline]
pub fn office_color(idx: usize) -> RGBColor {
    OFFICE6[idx % OFFICE6.len()]
}

/// Map a user-provided locale tag to a `num_format::Locale`.
///
/// Supported tags (case-insensitive): `en`, `us`, `en_US`, `de`, `de_DE`, `german`,
/// `fr`, `es`, `it`, `pt`, `nl`. Defaults to English.
pub fn map_locale(tag: &str) -> &'static Locale {
    match tag.to_lowercase().as_str() {
        "de" | "de_de" | "german" => &Locale::de,
        "fr" | "fr_fr" => &Locale::fr,
        "es" | "es_es" => &Locale::es,
        "it" | "it_it" => &Locale::it,
        "pt" | "pt_pt" | "pt_br" => &Locale::pt,
        "nl" | "nl_nl" => &Locale::nl,
        _ => &Locale::en,
    }
}

/// DejaVu Sans, bundled so charts render text on any host.
static BUNDLED_FONT: &[u8] = include_bytes!("../../assets/DejaVuSans.ttf");

/// Register a "sans-serif" font for the `ab_glyph` text path, once per process.
///
/// `ab_glyph` doesn't discover OS fonts. `APPT_CHART_FONT` may point at another
/// `.ttf`; otherwise (or if that file can't be used) the bundled DejaVu Sans is used.
pub fn ensure_fonts_registered() {
    static INIT_FONTS: Once = Once::new();
    INIT_FONTS.call_once(|| {
        if let Some(path) = std::env::var_os(FONT_ENV).map(PathBuf::from) {
            match std::fs::read(&path) {
                Ok(bytes) => {
                    // plotters keeps a 'static reference for the life of the process.
                    let bytes: &'static [u8] = Box::leak(bytes.into_boxed_slice());
                    if plotters::style::register_font(
                        "sans-serif",
                        plotters::style::FontStyle::Normal,
                        bytes,
                    )
                    .is_ok()
                    {
                        log::debug!("chart font: {}", path.display());
                        return;
                    }
                    log::warn!("{} is not a usable font; using bundled font", path.display());
                }
                Err(e) => log::warn!("cannot read {}: {}; using bundled font", path.display(), e),
            }
        }
        let _ = plotters::style::register_font(
            "sans-serif",
            plotters::style::FontStyle::Normal,
            BUNDLED_FONT,
        );
    });
}

/// Rough pixel width of `text` at `font_px`, good enough for sizing label areas.
pub fn estimate_text_width_px(text: &str, font_px: u32) -> u32 {
    let chars = text.chars().count() as u32;
    (chars * font_px * 6).div_ceil(10)
}

/// Left label area wide enough for the largest Y tick, clamped to a sane range.
pub fn left_label_area_px(max_label: &str, font_px: u32) -> u32 {
    estimate_text_width_px(max_label, font_px)
        .saturating_add(18)
        .clamp(40, 120)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palette_wraps() {
        assert_eq!(office_color(0), office_color(6));
    }

    #[test]
    fn bundled_font_is_a_truetype_file() {
        assert_eq!(&BUNDLED_FONT[..4], &[0x00, 0x01, 0x00, 0x00]);
        ensure_fonts_registered();
        ensure_fonts_registered();
    }

    #[test]
    fn label_area_is_clamped() {
        assert_eq!(left_label_area_px("", 14), 40);
        assert_eq!(left_label_area_px(&"9".repeat(50), 14), 120);
    }
}
