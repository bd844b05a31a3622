use serde::{Serialize, Deserialize};

/// Tunables of point group detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParameters {
    /// Largest accepted RMSD between a structure and its transformed copy,
    /// relative to the radius of gyration
    pub threshold: f64,
    /// Axes of equal order closer than this angle are the same element
    pub angular_tolerance: f64
}

impl Default for DetectionParameters {
    fn default() -> DetectionParameters {
        DetectionParameters {
            threshold: 0.1,
            angular_tolerance: std::f64::consts::PI / 18.0
        }
    }
}

/// Tunables of face tracing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TopologyParameters {
    /// Traces reaching this many vertices are abandoned
    pub max_links: usize,
    /// Link pairs enclosing a smaller angle do not contribute to vertex normals
    pub min_pair_angle: f64
}

impl Default for TopologyParameters {
    fn default() -> TopologyParameters {
        TopologyParameters {
            max_links: 10,
            min_pair_angle: 0.001
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionParameters {
    /// Move vertices into the asymmetric unit before expanding
    pub snap_to_asymmetric_unit: bool,
    /// Directional distance below which a vertex counts as inside the asymmetric unit
    pub symmetrize_tolerance: f64
}

impl Default for ExpansionParameters {
    fn default() -> ExpansionParameters {
        ExpansionParameters {
            snap_to_asymmetric_unit: false,
            symmetrize_tolerance: 1e-4
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FingerprintParameters {
    /// Largest eigenvalue difference of matching spectra
    pub tolerance: f64
}

impl Default for FingerprintParameters {
    fn default() -> FingerprintParameters {
        FingerprintParameters {tolerance: 1e-6}
    }
}

/// All tunables, as read from a configuration document
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub detection: DetectionParameters,
    pub topology: TopologyParameters,
    pub expansion: ExpansionParameters,
    pub fingerprint: FingerprintParameters
}
