//! Formatting helpers for presenting chart values.
//!
//! In the browser, numbers go through `Intl.NumberFormat` with the page's
//! default locale and at most one fraction digit. The separator table below
//! covers native builds and tests, and is the fallback when `Intl` is missing.

use unic_langid::LanguageIdentifier;

/// Where group separators go in the integer part.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Grouping {
    /// Every three digits: `1,234,567`.
    #[default]
    Thousands,
    /// Every three digits, but four-digit numbers stay ungrouped: `1234`, `12.345`.
    FromTenThousands,
    /// Last three digits, then pairs: `12,34,567`.
    Indian,
}

/// Separator conventions for a display locale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberLocale {
    pub group: char,
    pub decimal: char,
    pub grouping: Grouping,
    /// Prefer the browser's `Intl.NumberFormat` when it is available.
    pub intl: bool,
}

impl NumberLocale {
    pub const ENGLISH: Self = Self::separators(',', '.', Grouping::Thousands);

    const fn separators(group: char, decimal: char, grouping: Grouping) -> Self {
        Self {
            group,
            decimal,
            grouping,
            intl: false,
        }
    }

    /// Resolve separators from a BCP-47 tag such as `de-DE`; unparseable tags
    /// fall back to English.
    pub fn from_tag(tag: &str) -> Self {
        tag.parse::<LanguageIdentifier>()
            .map(|lang| Self::for_language(&lang))
            .unwrap_or_default()
    }

    pub fn for_language(lang: &LanguageIdentifier) -> Self {
        let region = lang.region.as_ref().map(|region| region.as_str());
        match (lang.language.as_str(), region) {
            ("de", Some("CH" | "LI")) => Self::separators('\u{2019}', '.', Grouping::Thousands),
            ("en" | "hi", Some("IN")) => Self::separators(',', '.', Grouping::Indian),
            ("pt", Some("PT")) => Self::separators('\u{a0}', ',', Grouping::FromTenThousands),
            ("es", _) => Self::separators('.', ',', Grouping::FromTenThousands),
            ("pl", _) => Self::separators('\u{a0}', ',', Grouping::FromTenThousands),
            ("de" | "it" | "nl" | "pt" | "da" | "id" | "tr", _) => {
                Self::separators('.', ',', Grouping::Thousands)
            }
            ("fr" | "cs" | "sv" | "fi" | "nb" | "ru" | "uk", _) => {
                Self::separators('\u{202f}', ',', Grouping::Thousands)
            }
            _ => Self::ENGLISH,
        }
    }

    /// Same separators, but format through `Intl` when running in a browser.
    pub fn with_intl(self) -> Self {
        Self { intl: true, ..self }
    }
}

impl Default for NumberLocale {
    fn default() -> Self {
        Self::ENGLISH
    }
}

/// Group the integer part and keep at most one fractional digit.
pub fn format_number(value: f64, locale: NumberLocale) -> String {
    if !value.is_finite() {
        return "—".to_string();
    }

    #[cfg(target_arch = "wasm32")]
    {
        if let Some(text) = locale.intl.then(|| intl::format(value)).flatten() {
            return text;
        }
    }

    let magnitude = value.abs();
    let mut whole = magnitude.trunc();
    let mut tenths = ((magnitude - whole) * 10.0).round();
    if tenths >= 10.0 {
        whole += 1.0;
        tenths = 0.0;
    }

    let mut out = String::new();
    if value < 0.0 && (whole > 0.0 || tenths > 0.0) {
        out.push('-');
    }
    out.push_str(&group_digits(&format!("{whole:.0}"), locale));
    if tenths > 0.0 {
        out.push(locale.decimal);
        out.push_str(&format!("{tenths:.0}"));
    }
    out
}

fn group_digits(digits: &str, locale: NumberLocale) -> String {
    let len = digits.len();
    if locale.grouping == Grouping::FromTenThousands && len < 5 {
        return digits.to_string();
    }

    let mut grouped = String::with_capacity(len + len / 2);
    for (idx, ch) in digits.chars().enumerate() {
        let remaining = len - idx;
        let boundary = match locale.grouping {
            Grouping::Indian => remaining == 3 || (remaining > 3 && (remaining - 3) % 2 == 0),
            Grouping::Thousands | Grouping::FromTenThousands => remaining % 3 == 0,
        };
        if idx > 0 && boundary {
            grouped.push(locale.group);
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(target_arch = "wasm32")]
mod intl {
    use js_sys::{Array, Function, Intl, Object, Reflect};
    use wasm_bindgen::JsValue;

    thread_local! {
        static FORMAT: Option<Function> = formatter();
    }

    fn formatter() -> Option<Function> {
        let options = Object::new();
        Reflect::set(
            &options,
            &JsValue::from_str("maximumFractionDigits"),
            &JsValue::from_f64(1.0),
        )
        .ok()?;
        Some(Intl::NumberFormat::new(&Array::new(), &options).format())
    }

    pub(super) fn format(value: f64) -> Option<String> {
        FORMAT.with(|format| {
            format
                .as_ref()?
                .call1(&JsValue::UNDEFINED, &JsValue::from_f64(value))
                .ok()?
                .as_string()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn english_grouping_and_single_fraction_digit() {
        let en = NumberLocale::ENGLISH;
        assert_eq!(format_number(1234.56, en), "1,234.6");
        assert_eq!(format_number(150.0, en), "150");
        assert_eq!(format_number(0.04, en), "0");
        assert_eq!(format_number(0.96, en), "1");
        assert_eq!(format_number(-2500.25, en), "-2,500.3");
        assert_eq!(format_number(1_000_000.0, en), "1,000,000");
    }

    #[test]
    fn very_large_values_keep_every_digit() {
        let en = NumberLocale::ENGLISH;
        assert_eq!(format_number(1e19, en), "10,000,000,000,000,000,000");
        assert_eq!(format_number(5e18, en), "5,000,000,000,000,000,000");
        assert_eq!(format_number(-2e21, en), "-2,000,000,000,000,000,000,000");
    }

    #[test]
    fn german_swaps_separators() {
        let de = NumberLocale::from_tag("de-DE");
        assert_eq!(format_number(1234.56, de), "1.234,6");
    }

    #[test]
    fn regional_conventions() {
        let es = NumberLocale::from_tag("es-ES");
        assert_eq!(format_number(1234.56, es), "1234,6");
        assert_eq!(format_number(12345.6, es), "12.345,6");

        let swiss = NumberLocale::from_tag("de-CH");
        assert_eq!(format_number(1234.56, swiss), "1\u{2019}234.6");

        let portugal = NumberLocale::from_tag("pt-PT");
        assert_eq!(format_number(12345.0, portugal), "12\u{a0}345");
        assert_eq!(NumberLocale::from_tag("pt-BR").group, '.');

        let india = NumberLocale::from_tag("en-IN");
        assert_eq!(format_number(1234567.8, india), "12,34,567.8");
        assert_eq!(format_number(999.0, india), "999");
    }

    #[test]
    fn unknown_tags_use_english() {
        assert_eq!(NumberLocale::from_tag("not a tag!"), NumberLocale::ENGLISH);
        assert_eq!(NumberLocale::from_tag("ja-JP"), NumberLocale::ENGLISH);
    }

    #[test]
    fn intl_flag_keeps_fallback_separators() {
        let locale = NumberLocale::from_tag("de-DE").with_intl();
        assert!(locale.intl);
        // Native builds have no Intl, so the separator table applies.
        assert_eq!(format_number(1234.56, locale), "1.234,6");
    }

    #[test]
    fn non_finite_values_render_as_dash() {
        assert_eq!(format_number(f64::NAN, NumberLocale::ENGLISH), "—");
    }
}
