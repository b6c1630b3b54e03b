//! Temporal-anachronism negative terms.
//!
//! Maps a free-text time-period string to a fixed list of things that must
//! not appear in the frame. This is a lookup table, not inference: the
//! buckets and their terms are deliberately hardcoded so the same period
//! string always yields the same terms.

/// Era bucket resolved from a time-period string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EraBucket {
    /// Before 1900: no machines of the 20th century at all.
    PreIndustrialModern,
    /// 1900s–1910s: early industrial, still no broadcast media.
    EarlyCentury,
    /// 1920s–1950s: automobiles exist, modern electronics do not.
    MidCentury,
    /// 1960s–1990s: television exists, the digital era does not.
    LateCentury,
    /// 2000s onward, or unrecognized: nothing excluded.
    Contemporary,
}

const PRE_1900_TERMS: &[&str] = &[
    "automobiles",
    "telephones",
    "electric streetlights",
    "power lines",
    "modern clothing",
];

const EARLY_CENTURY_TERMS: &[&str] = &[
    "television sets",
    "jet aircraft",
    "neon signage",
    "modern clothing",
];

const MID_CENTURY_TERMS: &[&str] = &[
    "smartphones",
    "computers",
    "flat-screen displays",
    "LED lighting",
    "modern cars",
];

const LATE_CENTURY_TERMS: &[&str] = &[
    "smartphones",
    "flat-screen displays",
    "electric scooters",
];

/// Resolve a period string to its era bucket.
///
/// Recognizes explicit years (`"1885"`), decade forms (`"1920s"`), and a
/// small set of era keywords. Unrecognized input is treated as
/// [`EraBucket::Contemporary`] — compilation never fails on a period string.
pub fn classify_period(period: &str) -> EraBucket {
    let p = period.trim().to_lowercase();

    for keyword in ["medieval", "ancient", "victorian", "renaissance", "wild west"] {
        if p.contains(keyword) {
            return EraBucket::PreIndustrialModern;
        }
    }

    // "1920s" / "1885" / "early 1900s" — take the first 4-digit run.
    let year: Option<i32> = p
        .as_bytes()
        .windows(4)
        .filter_map(|w| std::str::from_utf8(w).ok()?.parse::<i32>().ok())
        .next();

    match year {
        Some(y) if y < 1900 => EraBucket::PreIndustrialModern,
        Some(y) if y < 1920 => EraBucket::EarlyCentury,
        Some(y) if y < 1960 => EraBucket::MidCentury,
        Some(y) if y < 2000 => EraBucket::LateCentury,
        _ => EraBucket::Contemporary,
    }
}

/// Negative terms excluding period-inappropriate objects for `period`.
pub fn terms_for_period(period: &str) -> &'static [&'static str] {
    match classify_period(period) {
        EraBucket::PreIndustrialModern => PRE_1900_TERMS,
        EraBucket::EarlyCentury => EARLY_CENTURY_TERMS,
        EraBucket::MidCentury => MID_CENTURY_TERMS,
        EraBucket::LateCentury => LATE_CENTURY_TERMS,
        EraBucket::Contemporary => &[],
    }
}
