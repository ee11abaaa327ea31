// ─── Java Version Normalizer ───
// Converts raw Java version strings into a canonical form that compares
// correctly as plain strings across the legacy `1.x` and the 9+ schemes.

use std::fmt;

use tracing::warn;

/// Zero-padding width applied to every segment after the first.
pub const VERSION_DIGITS_PER_PART: usize = 3;

/// Canonical Java version, e.g. `1.008.000_212` for `1.8.0_212`
/// and `1.017.000_001` for `17.0.1`.
///
/// Ordering is lexicographic on the canonical text, which matches semantic
/// ordering because every padded segment has the same width.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JavaVersion(String);

impl JavaVersion {
    /// Normalize a raw version string. Never fails; empty input yields the
    /// all-zero version, which sorts below every real runtime.
    pub fn normalize(raw: &str) -> Self {
        let mut canonical = String::new();
        let mut parts_added = 0usize;

        for part in version_parts(raw) {
            if parts_added == 0 && part != "1" {
                // Java 9+ starts at the major number; fold it under a synthetic "1".
                canonical.push('1');
                parts_added += 1;
            }

            match parts_added {
                0 => canonical.push_str(part),
                1 | 2 => {
                    canonical.push('.');
                    push_padded(&mut canonical, part);
                }
                3 => {
                    canonical.push('_');
                    push_padded(&mut canonical, part);
                }
                _ => {
                    warn!("Version {:?} has too many parts, ignoring {:?}", raw, part);
                    break;
                }
            }
            parts_added += 1;
        }

        if parts_added == 0 {
            canonical.push('0');
            parts_added = 1;
        }
        for _ in parts_added..3 {
            canonical.push('.');
            canonical.push_str(&"0".repeat(VERSION_DIGITS_PER_PART));
        }

        Self(canonical)
    }

    /// Normalized search bound, `None` when the configured text is blank.
    pub fn bound(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self::normalize(trimmed))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for JavaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parts separated by `.` or `_`, stopping at the first empty part.
fn version_parts(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(['.', '_']).take_while(|part| !part.is_empty())
}

fn push_padded(out: &mut String, number: &str) {
    for _ in number.len()..VERSION_DIGITS_PER_PART {
        out.push('0');
    }
    out.push_str(number);
}
