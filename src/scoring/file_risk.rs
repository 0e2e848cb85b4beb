// ============================================
// File risk scorer
// ============================================
//
// Classifies a file by declared metadata only (extension and size) and turns
// that into a multi-engine style report. No content is inspected beyond the
// SHA-256 digest used as the report id.

use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::Severity;

/// Number of "engines" in the simulated panel.
pub const PANEL_SIZE: u32 = 73;

/// High-risk files smaller than this are flagged as suspiciously small.
const HIGH_RISK_SMALL_BYTES: u64 = 100 * 1024;

/// Medium-risk files smaller than this are flagged as somewhat suspicious.
const MEDIUM_RISK_SMALL_BYTES: u64 = 50 * 1024;

const HIGH_RISK_EXTENSIONS: &[&str] = &[
    "exe", "bat", "com", "cmd", "scr", "ps1", "vbs", "js", "wsf", "reg", "msi", "hta",
];
const MEDIUM_RISK_EXTENSIONS: &[&str] = &["zip", "rar", "7z", "jar", "py", "sh", "dll", "ocx"];
const DOCUMENT_EXTENSIONS: &[&str] = &["doc", "docm", "xls", "xlsm", "ppt", "pptm", "pdf"];
const SAFE_EXTENSIONS: &[&str] = &[
    "txt", "jpg", "jpeg", "png", "gif", "svg", "webp", "mp3", "wav", "mp4", "webm", "css", "html",
    "md", "json",
];

const SECURITY_VENDORS: &[&str] = &[
    "Microsoft", "Avast", "AVG", "Kaspersky", "Malwarebytes", "Norton", "McAfee", "Symantec",
    "Bitdefender", "ESET", "F-Secure", "Sophos", "Trend Micro", "ClamAV", "Ikarus", "DrWeb",
    "Google", "Cyren", "AhnLab", "Comodo", "TotalDefense", "Zillya", "K7", "MAX", "Fortinet",
];

const SUSPICIOUS_LABEL: &str = "Suspicious.Behavior";

fn detection_patterns(extension: &str) -> &'static [&'static str] {
    match extension {
        "exe" => &["Trojan.Win32", "Malware.Generic", "Suspicious.Behavior", "PUA.Win32", "Adware"],
        "py" => &[
            "Python.Agent",
            "Python.Trojan",
            "Suspicious.Script",
            "Python.MCCrash",
            "Python.Downloader",
        ],
        "js" => &["JS.Trojan", "JS.Downloader", "JS.Miner", "JS.Redirect", "JS.Obfuscated"],
        "bat" => &["BAT.Suspicious", "BAT.Trojan", "BAT.Downloader", "Script.Malicious", "BAT.Runner"],
        "zip" => &["Archive.Suspicious", "Packed.Malware", "Compressed.Trojan", "Archive.Infected"],
        "pdf" => &["PDF.Exploit", "PDF.Dropper", "PDF.Phishing", "PDF.Suspicious"],
        "doc" => &["DOC.Macro", "Office.Malicious", "DOC.Downloader", "DOC.Trojan"],
        _ => &[
            "Gen.Variant",
            "Suspicious.File",
            "Heuristic.Alert",
            "PUA",
            "Potentially Unwanted",
            "Suspicious.Behavior",
        ],
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "high")]
    High,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "low-medium")]
    LowMedium,
    #[serde(rename = "low")]
    Low,
    #[serde(rename = "unknown")]
    Unknown,
}

impl RiskLevel {
    pub fn for_extension(extension: &str) -> Self {
        if HIGH_RISK_EXTENSIONS.contains(&extension) {
            RiskLevel::High
        } else if MEDIUM_RISK_EXTENSIONS.contains(&extension) {
            RiskLevel::Medium
        } else if DOCUMENT_EXTENSIONS.contains(&extension) {
            RiskLevel::LowMedium
        } else if SAFE_EXTENSIONS.contains(&extension) {
            RiskLevel::Low
        } else {
            RiskLevel::Unknown
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RiskLevel::High => "high",
            RiskLevel::Medium => "medium",
            RiskLevel::LowMedium => "low-medium",
            RiskLevel::Low => "low",
            RiskLevel::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SizeRisk {
    #[serde(rename = "normal")]
    Normal,
    #[serde(rename = "somewhat suspicious")]
    SomewhatSuspicious,
    #[serde(rename = "suspicious")]
    Suspicious,
}

impl SizeRisk {
    pub fn assess(level: RiskLevel, size: u64) -> Self {
        match level {
            RiskLevel::High if size < HIGH_RISK_SMALL_BYTES => SizeRisk::Suspicious,
            RiskLevel::Medium if size < MEDIUM_RISK_SMALL_BYTES => SizeRisk::SomewhatSuspicious,
            _ => SizeRisk::Normal,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SizeRisk::Normal => "normal",
            SizeRisk::SomewhatSuspicious => "somewhat suspicious",
            SizeRisk::Suspicious => "suspicious",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileProperties {
    pub extension: String,
    pub mime_type: String,
    pub size: u64,
    pub risk_level: RiskLevel,
    pub size_risk: SizeRisk,
}

/// Extension as the text after the last dot, lowercased. A name without a dot
/// is its own extension.
pub fn file_extension(file_name: &str) -> String {
    file_name
        .rsplit('.')
        .next()
        .unwrap_or_default()
        .to_lowercase()
}

pub fn analyze_properties(file_name: &str, mime_type: &str, size: u64) -> FileProperties {
    let extension = file_extension(file_name);
    let risk_level = RiskLevel::for_extension(&extension);
    FileProperties {
        size_risk: SizeRisk::assess(risk_level, size),
        extension,
        mime_type: mime_type.to_string(),
        size,
        risk_level,
    }
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionDetail {
    pub vendor_name: String,
    pub detection: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnalysisStats {
    pub harmless: u32,
    pub malicious: u32,
    pub suspicious: u32,
    pub undetected: u32,
    pub timeout: u32,
}

impl AnalysisStats {
    pub fn total(&self) -> u32 {
        self.harmless + self.malicious + self.suspicious + self.undetected + self.timeout
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisAttributes {
    pub status: String,
    pub stats: AnalysisStats,
    pub detection_details: Vec<DetectionDetail>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisData {
    /// SHA-256 of the file bytes
    pub id: String,
    #[serde(rename = "type")]
    pub data_type: String,
    pub attributes: AnalysisAttributes,
}

/// Multi-engine style report envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub data: AnalysisData,
}

/// Draw the malicious/suspicious hit counts for a classified file.
pub fn draw_hit_counts<R: Rng + ?Sized>(props: &FileProperties, rng: &mut R) -> (u32, u32) {
    match (props.risk_level, props.size_risk) {
        (RiskLevel::High, SizeRisk::Suspicious) => (rng.gen_range(1..=3), rng.gen_range(1..=3)),
        (RiskLevel::High, _) => (0, rng.gen_range(0..=1)),
        (RiskLevel::Medium, SizeRisk::SomewhatSuspicious) => (0, rng.gen_range(0..=1)),
        _ => (0, 0),
    }
}

/// Build the report for a file from its bytes and declared metadata.
pub fn analyze_file<R: Rng + ?Sized>(
    file_name: &str,
    mime_type: &str,
    bytes: &[u8],
    rng: &mut R,
) -> (AnalysisReport, FileProperties) {
    let props = analyze_properties(file_name, mime_type, bytes.len() as u64);
    let report = build_report(sha256_hex(bytes), &props, rng);
    (report, props)
}

pub fn build_report<R: Rng + ?Sized>(
    file_hash: String,
    props: &FileProperties,
    rng: &mut R,
) -> AnalysisReport {
    let (malicious, suspicious) = draw_hit_counts(props, rng);

    let mut details = Vec::new();
    if malicious > 0 || suspicious > 0 {
        let patterns = detection_patterns(&props.extension);
        let mut vendors: Vec<&str> = SECURITY_VENDORS.to_vec();
        vendors.shuffle(rng);
        let mut vendors = vendors.into_iter();

        for _ in 0..malicious {
            let Some(vendor) = vendors.next() else { break };
            let pattern = patterns.choose(rng).copied().unwrap_or(SUSPICIOUS_LABEL);
            let variant = char::from(b'A' + rng.gen_range(0..26u8));
            details.push(DetectionDetail {
                vendor_name: vendor.to_string(),
                detection: format!("{}.{}", pattern, variant),
            });
        }
        for _ in 0..suspicious {
            let Some(vendor) = vendors.next() else { break };
            details.push(DetectionDetail {
                vendor_name: vendor.to_string(),
                detection: SUSPICIOUS_LABEL.to_string(),
            });
        }
    }
    details.sort_by(|a, b| a.vendor_name.cmp(&b.vendor_name));

    AnalysisReport {
        data: AnalysisData {
            id: file_hash,
            data_type: "analysis".to_string(),
            attributes: AnalysisAttributes {
                status: "completed".to_string(),
                stats: AnalysisStats {
                    harmless: PANEL_SIZE - malicious - suspicious,
                    malicious,
                    suspicious,
                    undetected: 0,
                    timeout: 0,
                },
                detection_details: details,
            },
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Safe,
    Suspicious,
    Malicious,
}

impl Rating {
    pub fn title(self) -> &'static str {
        match self {
            Rating::Safe => "File is safe",
            Rating::Suspicious => "File is suspicious",
            Rating::Malicious => "File is malicious",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictStats {
    pub total_vendors: u32,
    pub detections: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecurityVerdict {
    pub rating: Rating,
    pub color: String,
    pub message: String,
    pub detection_details: Vec<DetectionDetail>,
    pub stats: VerdictStats,
}

/// Turn a report into a safe/suspicious/malicious verdict.
pub fn security_rating(report: &AnalysisReport) -> SecurityVerdict {
    let attrs = &report.data.attributes;
    let stats = attrs.stats;
    let total = stats.total();
    let percent = |n: u32| {
        if total == 0 {
            0.0
        } else {
            f64::from(n) * 100.0 / f64::from(total)
        }
    };
    let malicious_pct = percent(stats.malicious);
    let suspicious_pct = percent(stats.suspicious);

    let (rating, severity, message, detections) = if malicious_pct >= 3.0 {
        (
            Rating::Malicious,
            Severity::Red,
            format!(
                "Detected as potentially malicious by {} out of {} security indicators.",
                stats.malicious, total
            ),
            stats.malicious + stats.suspicious,
        )
    } else if suspicious_pct >= 2.0 || malicious_pct > 0.0 {
        (
            Rating::Suspicious,
            Severity::Yellow,
            format!(
                "Flagged as potentially suspicious by {} out of {} security indicators.",
                stats.suspicious, total
            ),
            stats.malicious + stats.suspicious,
        )
    } else {
        (
            Rating::Safe,
            Severity::Green,
            "File appears to be safe based on analysis of file properties. No security concerns detected."
                .to_string(),
            0,
        )
    };

    SecurityVerdict {
        rating,
        color: severity.hex().to_string(),
        message,
        detection_details: attrs.detection_details.clone(),
        stats: VerdictStats {
            total_vendors: total,
            detections,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn extension_is_last_segment_lowercased() {
        assert_eq!(file_extension("payload.EXE"), "exe");
        assert_eq!(file_extension("archive.tar.gz"), "gz");
        assert_eq!(file_extension("Makefile"), "makefile");
        assert_eq!(file_extension("trailing."), "");
    }

    #[test]
    fn bucket_assignment_is_stable() {
        for _ in 0..3 {
            let p = analyze_properties("payload.exe", "application/x-msdownload", 10 * 1024);
            assert_eq!(p.risk_level, RiskLevel::High);
            assert_eq!(p.size_risk, SizeRisk::Suspicious);
        }
        let p = analyze_properties("big.exe", "", 5 * 1024 * 1024);
        assert_eq!(p.size_risk, SizeRisk::Normal);
        let p = analyze_properties("tool.py", "", 49 * 1024);
        assert_eq!((p.risk_level, p.size_risk), (RiskLevel::Medium, SizeRisk::SomewhatSuspicious));
        let p = analyze_properties("report.pdf", "", 10);
        assert_eq!((p.risk_level, p.size_risk), (RiskLevel::LowMedium, SizeRisk::Normal));
        let p = analyze_properties("notes.txt", "", 10);
        assert_eq!(p.risk_level, RiskLevel::Low);
        let p = analyze_properties("blob.xyz", "", 10);
        assert_eq!(p.risk_level, RiskLevel::Unknown);
    }

    #[test]
    fn size_risk_threshold_is_exclusive() {
        assert_eq!(SizeRisk::assess(RiskLevel::High, 100 * 1024 - 1), SizeRisk::Suspicious);
        assert_eq!(SizeRisk::assess(RiskLevel::High, 100 * 1024), SizeRisk::Normal);
        assert_eq!(SizeRisk::assess(RiskLevel::Medium, 50 * 1024), SizeRisk::Normal);
    }

    #[test]
    fn small_executable_always_gets_hits() {
        for seed in 0..100 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (report, _) = analyze_file("payload.exe", "", &[0x4d, 0x5a, 0x90], &mut rng);
            let stats = report.data.attributes.stats;
            assert!(stats.malicious >= 1 && stats.malicious <= 3);
            assert!(stats.suspicious >= 1 && stats.suspicious <= 3);
            assert_eq!(stats.total(), PANEL_SIZE);
            assert_eq!(
                report.data.attributes.detection_details.len() as u32,
                stats.malicious + stats.suspicious
            );
        }
    }

    #[test]
    fn text_file_is_always_clean() {
        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let (report, _) = analyze_file("notes.txt", "text/plain", b"hello", &mut rng);
            let stats = report.data.attributes.stats;
            assert_eq!((stats.malicious, stats.suspicious), (0, 0));
            assert_eq!(stats.harmless, PANEL_SIZE);
            assert!(report.data.attributes.detection_details.is_empty());
            assert_eq!(security_rating(&report).rating, Rating::Safe);
        }
    }

    #[test]
    fn detections_are_sorted_and_labelled() {
        let mut rng = StdRng::seed_from_u64(3);
        let (report, _) = analyze_file("dropper.exe", "", b"MZ", &mut rng);
        let details = &report.data.attributes.detection_details;
        let names: Vec<&str> = details.iter().map(|d| d.vendor_name.as_str()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
        assert!(details.iter().any(|d| d.detection == SUSPICIOUS_LABEL));
        assert!(details.iter().all(|d| SECURITY_VENDORS.contains(&d.vendor_name.as_str())));
    }

    #[test]
    fn report_id_is_sha256_of_bytes() {
        let mut rng = StdRng::seed_from_u64(1);
        let (report, _) = analyze_file("a.txt", "", b"abc", &mut rng);
        assert_eq!(
            report.data.id,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn rating_thresholds() {
        let mk = |malicious, suspicious| AnalysisReport {
            data: AnalysisData {
                id: String::new(),
                data_type: "analysis".into(),
                attributes: AnalysisAttributes {
                    status: "completed".into(),
                    stats: AnalysisStats {
                        harmless: PANEL_SIZE - malicious - suspicious,
                        malicious,
                        suspicious,
                        undetected: 0,
                        timeout: 0,
                    },
                    detection_details: Vec::new(),
                },
            },
        };

        // 3/73 = 4.1% malicious
        let v = security_rating(&mk(3, 0));
        assert_eq!(v.rating, Rating::Malicious);
        assert_eq!(v.color, "#dc2626");
        assert_eq!(v.stats.detections, 3);

        // 1/73 = 1.4% malicious -> suspicious
        let v = security_rating(&mk(1, 0));
        assert_eq!(v.rating, Rating::Suspicious);

        // 1/73 suspicious alone stays safe
        let v = security_rating(&mk(0, 1));
        assert_eq!(v.rating, Rating::Safe);
        assert_eq!(v.stats.detections, 0);

        // 2/73 = 2.7% suspicious
        let v = security_rating(&mk(0, 2));
        assert_eq!(v.rating, Rating::Suspicious);
        assert_eq!(v.color, "#f59e0b");
        assert!(v.message.contains("2 out of 73"));
    }
}
