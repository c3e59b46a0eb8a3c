//! Network-quality-aware fidelity selection
//!
//! Pure policy mapping from the ambient connection signal to a
//! discrete fidelity tier. The tier must be selected once per element
//! instantiation, before any other component sees the resource;
//! re-querying mid-load would swap the URL under an in-flight decode.

use serde::{Deserialize, Serialize};

/// Coarse effective-connection class reported by the host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectionSignal {
    /// Effective "slow-2g"
    SlowTwoG,
    /// Effective "2g"
    TwoG,
    /// Effective "3g"
    ThreeG,
    /// Effective "4g"
    FourG,
    /// Signal missing or unrecognized
    Unknown,
}

impl ConnectionSignal {
    /// Parse the host's effective-connection-type string
    pub fn parse(signal: Option<&str>) -> Self {
        match signal {
            Some("slow-2g") => ConnectionSignal::SlowTwoG,
            Some("2g") => ConnectionSignal::TwoG,
            Some("3g") => ConnectionSignal::ThreeG,
            Some("4g") => ConnectionSignal::FourG,
            _ => ConnectionSignal::Unknown,
        }
    }
}

/// Discrete fidelity tier for media variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityTier {
    /// Smallest variant
    Low,
    /// Mid-size variant
    Medium,
    /// Full-fidelity variant
    High,
}

impl QualityTier {
    /// URL suffix for this tier's variant
    fn suffix(&self) -> Option<&'static str> {
        match self {
            QualityTier::Low => Some("-low"),
            QualityTier::Medium => Some("-med"),
            QualityTier::High => None,
        }
    }
}

/// Connection probe collaborator
///
/// The host observes the network; this crate only consumes the coarse
/// class it reports. Implementations must not probe the network from
/// here.
pub trait ConnectionInfo: Send + Sync {
    /// Current effective connection class
    fn effective_type(&self) -> ConnectionSignal;
}

/// Fixed connection signal, for hosts without a probe and for tests
#[derive(Debug, Clone, Copy)]
pub struct StaticConnection(pub ConnectionSignal);

impl ConnectionInfo for StaticConnection {
    fn effective_type(&self) -> ConnectionSignal {
        self.0
    }
}

/// Map a connection signal to a fidelity tier
///
/// Unknown signals map to `Medium`: a conservative default that avoids
/// both wasted bytes and visibly degraded media.
pub fn select_tier(signal: ConnectionSignal) -> QualityTier {
    match signal {
        ConnectionSignal::SlowTwoG | ConnectionSignal::TwoG => QualityTier::Low,
        ConnectionSignal::ThreeG => QualityTier::Medium,
        ConnectionSignal::FourG => QualityTier::High,
        ConnectionSignal::Unknown => QualityTier::Medium,
    }
}

/// Construct the variant URL for a tier
///
/// Low and medium tiers insert a suffix before the file extension
/// (`hero.jpg` -> `hero-low.jpg`); the high tier uses the base URL
/// unchanged. URLs without an extension get the suffix appended.
pub fn tier_url(base: &str, tier: QualityTier) -> String {
    let Some(suffix) = tier.suffix() else {
        return base.to_string();
    };

    match base.rfind('.') {
        Some(dot) if dot > base.rfind('/').map_or(0, |s| s + 1) => {
            format!("{}{}{}", &base[..dot], suffix, &base[dot..])
        }
        _ => format!("{base}{suffix}"),
    }
}
