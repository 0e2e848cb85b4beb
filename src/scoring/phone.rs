// ============================================
// Phone scorer
// ============================================
//
// Calling-code resolution from a static prefix table, plus the synthetic
// report used when the validation API is unavailable.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use super::{Severity, string_hash};
use crate::lookup::FieldMap;

/// Longest calling-code prefix tried.
const MAX_CODE_LEN: usize = 5;

pub const UNKNOWN_COUNTRY_MESSAGE: &str =
    "Could not identify the country code for this phone number";

pub const FALLBACK_SOURCE: &str = "Enhanced Algorithm (NumVerify API access not available)";

const LINE_TYPES: [&str; 3] = ["mobile", "landline", "voip"];

const UNKNOWN_CARRIERS: &[&str] = &["Unknown Carrier"];

const COUNTRY_CODES: &[(&str, &str)] = &[
    ("1", "United States/Canada"),
    ("7", "Russia/Kazakhstan"),
    ("20", "Egypt"),
    ("27", "South Africa"),
    ("30", "Greece"),
    ("31", "Netherlands"),
    ("32", "Belgium"),
    ("33", "France"),
    ("34", "Spain"),
    ("36", "Hungary"),
    ("39", "Italy"),
    ("40", "Romania"),
    ("41", "Switzerland"),
    ("43", "Austria"),
    ("44", "United Kingdom"),
    ("45", "Denmark"),
    ("46", "Sweden"),
    ("47", "Norway"),
    ("48", "Poland"),
    ("49", "Germany"),
    ("51", "Peru"),
    ("52", "Mexico"),
    ("53", "Cuba"),
    ("54", "Argentina"),
    ("55", "Brazil"),
    ("56", "Chile"),
    ("57", "Colombia"),
    ("58", "Venezuela"),
    ("60", "Malaysia"),
    ("61", "Australia"),
    ("62", "Indonesia"),
    ("63", "Philippines"),
    ("64", "New Zealand"),
    ("65", "Singapore"),
    ("66", "Thailand"),
    ("81", "Japan"),
    ("82", "South Korea"),
    ("84", "Vietnam"),
    ("86", "China"),
    ("90", "Turkey"),
    ("91", "India"),
    ("92", "Pakistan"),
    ("93", "Afghanistan"),
    ("94", "Sri Lanka"),
    ("95", "Myanmar"),
    ("98", "Iran"),
    ("212", "Morocco"),
    ("213", "Algeria"),
    ("216", "Tunisia"),
    ("218", "Libya"),
    ("220", "Gambia"),
    ("221", "Senegal"),
    ("222", "Mauritania"),
    ("223", "Mali"),
    ("234", "Nigeria"),
    ("351", "Portugal"),
    ("352", "Luxembourg"),
    ("353", "Ireland"),
    ("358", "Finland"),
    ("420", "Czech Republic"),
    ("421", "Slovakia"),
    ("886", "Taiwan"),
    ("972", "Israel"),
    ("971", "United Arab Emirates"),
    ("966", "Saudi Arabia"),
    ("962", "Jordan"),
    ("961", "Lebanon"),
    ("960", "Maldives"),
];

fn carriers_for(code: &str) -> &'static [&'static str] {
    match code {
        "1" => &[
            "Verizon",
            "AT&T",
            "T-Mobile",
            "Sprint",
            "US Cellular",
            "Bell",
            "Rogers",
            "Telus",
        ],
        "44" => &["Vodafone", "EE", "O2", "Three", "Virgin Mobile", "BT Mobile"],
        "91" => &["Airtel", "Jio", "Vodafone Idea", "BSNL", "MTNL"],
        "86" => &["China Mobile", "China Unicom", "China Telecom"],
        "49" => &["T-Mobile", "Vodafone", "O2", "E-Plus"],
        "33" => &["Orange", "SFR", "Free Mobile", "Bouygues Telecom"],
        "81" => &["NTT Docomo", "KDDI", "SoftBank", "Rakuten Mobile"],
        "61" => &["Telstra", "Optus", "Vodafone"],
        "52" => &["Telcel", "Movistar", "AT&T México"],
        _ => UNKNOWN_CARRIERS,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryData {
    pub code: &'static str,
    pub name: &'static str,
    pub carriers: &'static [&'static str],
}

pub fn digits_only(number: &str) -> String {
    number.chars().filter(char::is_ascii_digit).collect()
}

/// Resolve the calling code, longest prefix first. A prefix is only tried
/// when digits remain after it.
pub fn country_for(number: &str) -> Option<CountryData> {
    let digits = digits_only(number);
    (1..=MAX_CODE_LEN).rev().find_map(|len| {
        if digits.len() <= len {
            return None;
        }
        let prefix = &digits[..len];
        COUNTRY_CODES
            .iter()
            .find(|(code, _)| *code == prefix)
            .map(|&(code, name)| CountryData {
                code,
                name,
                carriers: carriers_for(code),
            })
    })
}

/// International display format for a national number.
pub fn international_format(code: &str, national: &str) -> String {
    match code {
        "1" => format!(
            "+1 ({}) {}-{}",
            slice(national, 0, 3),
            slice(national, 3, 6),
            slice(national, 6, national.len())
        ),
        "44" => format!(
            "+44 {} {}",
            slice(national, 0, 4),
            slice(national, 4, national.len())
        ),
        _ => {
            let groups: Vec<&str> = national
                .as_bytes()
                .chunks(3)
                .filter_map(|c| std::str::from_utf8(c).ok())
                .collect();
            format!("+{} {}", code, groups.join(" ")).trim().to_string()
        }
    }
}

fn slice(s: &str, start: usize, end: usize) -> &str {
    let end = end.min(s.len());
    let start = start.min(end);
    &s[start..end]
}

/// Synthetic report for a number whose country resolved.
pub fn heuristic_report<R: Rng + ?Sized>(
    original: &str,
    country: &CountryData,
    rng: &mut R,
) -> FieldMap {
    let digits = digits_only(original);
    let national = &digits[country.code.len()..];
    let carrier = country
        .carriers
        .choose(rng)
        .copied()
        .unwrap_or("Unknown Carrier");
    let line_type = LINE_TYPES.choose(rng).copied().unwrap_or("mobile");

    let mut data = FieldMap::new();
    data.insert("Phone Number", original);
    data.insert("Country", country.name);
    data.insert("Country Code", country.code);
    data.insert("Country Prefix", format!("+{}", country.code));
    data.insert("Carrier", carrier);
    data.insert("Line Type", line_type);
    data.insert("Valid", "Yes");
    data.insert("Local Format", national);
    data.insert(
        "International Format",
        international_format(country.code, national),
    );
    data.insert("Number Length", national.len());
    data.insert("Source", FALLBACK_SOURCE);
    data
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhoneReputation {
    pub phone_number: String,
    /// 0..=100, higher means more likely spam
    pub spam_score: u8,
    pub risk: &'static str,
    pub color: &'static str,
    pub reports: u32,
    pub source: &'static str,
}

/// Deterministic reputation guess derived from the digit hash. Same number,
/// same answer.
pub fn reputation(number: &str) -> Option<PhoneReputation> {
    country_for(number)?;
    let digits = digits_only(number);
    let hash = string_hash(&digits);
    let spam_score = (hash % 101) as u8;
    let (risk, severity) = match spam_score {
        0..=24 => ("Low", Severity::Green),
        25..=49 => ("Moderate", Severity::Yellow),
        50..=74 => ("Elevated", Severity::Orange),
        _ => ("High", Severity::Red),
    };
    Some(PhoneReputation {
        phone_number: number.to_string(),
        spam_score,
        risk,
        color: severity.hex(),
        reports: (hash / 101) % (u32::from(spam_score) + 1),
        source: "heuristic",
    })
}
