//! Canonical station names.
//!
//! The daily registers, the normals workbook, the metadata directory and the
//! monthly observation sheets all spell station names slightly differently
//! (case, accents, one hyphenated alias). Every lookup key goes through
//! [`normalize_station_name`] before it is compared.

const ALIASES: &[(&str, &str)] = &[("TAHUACO - YUNGUYO", "TAHUACO YUNGUYO")];

/// Uppercases, strips acute accents and diaeresis, trims, and applies the known aliases.
///
/// # Examples
///
/// ```
/// use planilla::normalize_station_name;
///
/// assert_eq!(normalize_station_name("  Juliaca "), "JULIACA");
/// assert_eq!(normalize_station_name("Tahuaco - Yunguyo"), "TAHUACO YUNGUYO");
/// assert_eq!(normalize_station_name("Capachica (Chucuíto)"), "CAPACHICA (CHUCUITO)");
/// ```
pub fn normalize_station_name(raw: &str) -> String {
    let mut name: String = raw.trim().chars().map(strip_accent).collect::<String>();
    name = name.to_uppercase();
    for (from, to) in ALIASES {
        if name.contains(from) {
            name = name.replace(from, to);
        }
    }
    name
}

/// Normalizes a header label (month names, column titles) with the same rules as
/// station names, so `"Setiembre"`, `"SETIEMBRE"` and `"Setiembre "` compare equal.
pub(crate) fn normalize_label(raw: &str) -> String {
    raw.trim().chars().map(strip_accent).collect::<String>().to_uppercase()
}

fn strip_accent(c: char) -> char {
    match c {
        'á' | 'à' => 'a',
        'é' | 'è' => 'e',
        'í' | 'ì' => 'i',
        'ó' | 'ò' => 'o',
        'ú' | 'ù' | 'ü' => 'u',
        'Á' | 'À' => 'A',
        'É' | 'È' => 'E',
        'Í' | 'Ì' => 'I',
        'Ó' | 'Ò' => 'O',
        'Ú' | 'Ù' | 'Ü' => 'U',
        other => other,
    }
}
