use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MobilePrivacyStatus {
    OptIn,
    OptOut,
    #[default]
    Unknown,
}

impl MobilePrivacyStatus {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            MobilePrivacyStatus::OptIn => "optedin",
            MobilePrivacyStatus::OptOut => "optedout",
            MobilePrivacyStatus::Unknown => "optunknown",
        }
    }

    /// Unrecognized values resolve to `Unknown`.
    #[inline]
    pub fn from_value(value: &str) -> Self {
        if value.eq_ignore_ascii_case("optedin") {
            MobilePrivacyStatus::OptIn
        } else if value.eq_ignore_ascii_case("optedout") {
            MobilePrivacyStatus::OptOut
        } else {
            MobilePrivacyStatus::Unknown
        }
    }
}

impl fmt::Display for MobilePrivacyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
