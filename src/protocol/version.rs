//! Protocol version table and negotiation.
//!
//! Versions are ISO dates, so lexicographic order is chronological order.

use std::fmt;

/// A protocol revision identifier, e.g. `2025-03-26`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProtocolVersion(&'static str);

impl ProtocolVersion {
    pub const fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

pub const V2024_10_07: ProtocolVersion = ProtocolVersion("2024-10-07");
pub const V2025_03_26: ProtocolVersion = ProtocolVersion("2025-03-26");

pub const LATEST_PROTOCOL_VERSION: ProtocolVersion = V2025_03_26;

/// The revision that introduced the streamable HTTP transport; that transport
/// uses it as the negotiation floor so older clients are steered to a
/// compatible revision.
pub const MINIMAL_FOR_STREAMABLE_HTTP: ProtocolVersion = V2025_03_26;

/// Supported revisions, newest first.
pub const SUPPORTED_PROTOCOL_VERSIONS: [ProtocolVersion; 2] = [V2025_03_26, V2024_10_07];

/// Picks the protocol version to answer an `initialize` with.
///
/// The requested version is echoed when the server supports it and it is not
/// below `minimum`; otherwise the newest supported version at or above the
/// floor wins.
pub fn negotiate(requested: &str, minimum: Option<ProtocolVersion>) -> ProtocolVersion {
    let floor = minimum.map(|v| v.as_str()).unwrap_or("");
    if let Some(version) = SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .find(|v| v.as_str() == requested)
    {
        if version.as_str() >= floor {
            return *version;
        }
    }
    SUPPORTED_PROTOCOL_VERSIONS
        .iter()
        .find(|v| v.as_str() >= floor)
        .copied()
        .unwrap_or(LATEST_PROTOCOL_VERSION)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_version_is_echoed() {
        assert_eq!(negotiate("2025-03-26", None), V2025_03_26);
        assert_eq!(negotiate("2024-10-07", None), V2024_10_07);
    }

    #[test]
    fn test_unknown_version_falls_back_to_latest() {
        assert_eq!(negotiate("1999-01-01", None), LATEST_PROTOCOL_VERSION);
        assert_eq!(negotiate("2099-12-31", None), LATEST_PROTOCOL_VERSION);
        assert_eq!(negotiate("", None), LATEST_PROTOCOL_VERSION);
    }

    #[test]
    fn test_supported_version_below_floor_is_upgraded() {
        assert_eq!(
            negotiate("2024-10-07", Some(MINIMAL_FOR_STREAMABLE_HTTP)),
            V2025_03_26
        );
    }

    #[test]
    fn test_requested_at_floor_is_kept() {
        assert_eq!(
            negotiate("2025-03-26", Some(MINIMAL_FOR_STREAMABLE_HTTP)),
            V2025_03_26
        );
    }

    #[test]
    fn test_ordering_is_chronological() {
        assert!(V2025_03_26 > V2024_10_07);
    }
}
