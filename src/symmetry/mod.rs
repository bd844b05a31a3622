extern crate nalgebra as na;
type Vector3 = na::Vector3<f64>;

use thiserror::Error;
use std::f64::consts::TAU;

use crate::quaternions::{Rotation, View};

/// Golden ratio
pub const PHI: f64 = 1.618_033_988_749_895;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ParseError {
    #[error("Unknown point group family in label '{0}'")]
    UnknownFamily(String),
    #[error("Invalid rotational order in label '{0}'")]
    InvalidOrder(String),
    #[error("Invalid modifier in label '{0}'")]
    InvalidModifier(String),
    #[error("Malformed helical parameters in label '{0}'")]
    Helical(String)
}

/// Point group families with their parameters
///
/// A suppressed fold removes the corresponding generator, leaving a subgroup.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Family {
    Cyclic {n: u32},
    Dihedral {n: u32},
    Tetrahedral {suppress: Option<u32>},
    Octahedral {suppress: Option<u32>},
    Icosahedral {suppress: Option<u32>, rot90: bool},
    /// Screw about z, angle in radians, with an optional dyad along x
    Helical {rise: f64, angle: f64, dyad: bool}
}

impl Family {
    /// Numeric family tag
    pub fn point_class(&self) -> u32 {
        match self {
            Family::Cyclic {n} => 100 + n,
            Family::Dihedral {n} => 200 + n,
            Family::Tetrahedral {..} => 320,
            Family::Octahedral {..} => 432,
            Family::Icosahedral {..} => 532,
            Family::Helical {..} => 600
        }
    }
}

/// Generator of a point group
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    pub axis: na::Unit<Vector3>,
    /// Rotational fold. One marks a pure reflection or screw marker.
    pub order: u32,
    /// Rotation angle in radians
    pub angle: f64,
    /// Translation along the axis, helical groups only
    pub shift: f64
}

impl Operation {
    fn rotation(axis: Vector3, order: u32) -> Operation {
        Operation {
            axis: na::Unit::new_normalize(axis),
            order,
            angle: TAU / order as f64,
            shift: 0.0
        }
    }

    /// Rotation matrix of the operation raised to a power
    pub fn matrix(&self, power: u32) -> Rotation {
        Rotation::from_axis_angle(&self.axis, power as f64 * self.angle)
    }
}

/// Bring a point group label into canonical form
///
/// Surrounding whitespace is removed and the family letter upper-cased.
/// Numeric (crystallographic) aliases map onto the family labels. An empty
/// label means no symmetry.
pub fn normalize_label(label: &str) -> String {
    let trimmed = label.trim();
    let mut chars = trimmed.chars();
    let first = match chars.next() {
        Some(c) => c,
        None => return "C1".to_string()
    };

    if first.is_ascii_digit() {
        if trimmed.contains("532") {
            return if trimmed.contains("90") { "I90" } else { "I" }.to_string();
        }
        if trimmed.contains("432") {
            return "O".to_string();
        }
        if trimmed == "23" {
            return "T".to_string();
        }
        // A single-fold dihedral is not a group of its own
        if first != '1' && chars.next() == Some('2') {
            return match first {
                '0' => "C1".to_string(),
                _ => format!("D{}", first)
            };
        }

        let (digits, _) = split_digits(trimmed);
        return match digits.parse::<u32>() {
            Ok(0) => "C1".to_string(),
            Ok(j) => format!("C{}", j),
            Err(_) => trimmed.to_string()
        };
    }

    first.to_ascii_uppercase().to_string() + chars.as_str()
}

/// Whether a label names a group containing mirror operations
pub fn has_reflection(label: &str) -> bool {
    label.chars().skip(1).any(|c| matches!(c, 's' | 'v' | 'h' | 'd'))
}

fn split_digits(s: &str) -> (&str, &str) {
    let end = s.find(|c: char| !c.is_ascii_digit()).unwrap_or(s.len());
    s.split_at(end)
}

fn parse_suppression(modifier: &str, allowed: &[u32], label: &str) -> Result<Option<u32>, ParseError> {
    if modifier.is_empty() {
        return Ok(None);
    }

    modifier.strip_prefix('-')
        .and_then(|fold| fold.parse::<u32>().ok())
        .filter(|fold| allowed.contains(fold))
        .map(Some)
        .ok_or_else(|| ParseError::InvalidModifier(label.to_string()))
}

fn parse_family(label: &str) -> Result<Family, ParseError> {
    let mut chars = label.chars();
    let letter = chars.next().ok_or_else(|| ParseError::UnknownFamily(label.to_string()))?;
    let rest = chars.as_str();
    let invalid_order = || ParseError::InvalidOrder(label.to_string());
    let invalid_modifier = || ParseError::InvalidModifier(label.to_string());

    match letter {
        'C' | 'D' => {
            let (digits, suffix) = split_digits(rest);
            if !matches!(suffix, "" | "s" | "v" | "h" | "d") {
                return Err(invalid_modifier());
            }
            let n = match (digits, letter, suffix) {
                ("", 'C', "s") => 1,
                _ => digits.parse::<u32>().map_err(|_| invalid_order())?
            };
            if n == 0 {
                return Err(invalid_order());
            }

            Ok(match letter {
                'C' => Family::Cyclic {n},
                _ => Family::Dihedral {n}
            })
        },
        'T' => {
            let modifier = rest.strip_prefix(&['d', 'h'][..]).unwrap_or(rest);
            Ok(Family::Tetrahedral {suppress: parse_suppression(modifier, &[3], label)?})
        },
        'O' => {
            let modifier = rest.strip_prefix('h').unwrap_or(rest);
            Ok(Family::Octahedral {suppress: parse_suppression(modifier, &[2, 3, 4], label)?})
        },
        'I' => {
            let modifier = rest.strip_prefix('h').unwrap_or(rest);
            let (modifier, rot90) = match modifier.strip_suffix("90") {
                Some(m) => (m, true),
                None => (modifier, false)
            };
            Ok(Family::Icosahedral {suppress: parse_suppression(modifier, &[2, 3, 5], label)?, rot90})
        },
        'H' => {
            let malformed = || ParseError::Helical(label.to_string());
            let fields: Vec<&str> = rest.split(',').map(str::trim).collect();
            if !(2..=3).contains(&fields.len()) {
                return Err(malformed());
            }
            let rise = fields[0].parse::<f64>().map_err(|_| malformed())?;
            let angle = fields[1].parse::<f64>().map_err(|_| malformed())?;
            let dyad = match fields.get(2) {
                Some(d) => d.parse::<u32>().map_err(|_| malformed())? == 2,
                None => false
            };
            if !rise.is_finite() || !angle.is_finite() {
                return Err(malformed());
            }
            Ok(Family::Helical {rise, angle: angle.to_radians(), dyad})
        },
        _ => Err(ParseError::UnknownFamily(label.to_string()))
    }
}

fn generators(family: &Family) -> Vec<Operation> {
    let x = Vector3::x();
    let z = Vector3::z();
    let diagonal = Vector3::new(1.0, 1.0, 1.0);
    let face_diagonal = Vector3::new(1.0, -1.0, 0.0);

    let mut operations = Vec::new();
    match *family {
        Family::Cyclic {n} => operations.push(Operation::rotation(z, n)),
        Family::Dihedral {n} => {
            operations.push(Operation::rotation(z, n));
            operations.push(Operation::rotation(x, 2));
        },
        Family::Tetrahedral {suppress} => {
            if suppress != Some(3) {
                operations.push(Operation::rotation(diagonal, 3));
            }
            operations.push(Operation::rotation(z, 2));
            operations.push(Operation::rotation(x, 2));
        },
        Family::Octahedral {suppress} => {
            if suppress != Some(3) {
                operations.push(Operation::rotation(diagonal, 3));
            }
            match suppress {
                Some(4) => operations.push(Operation::rotation(face_diagonal, 2)),
                Some(2) => operations.push(Operation::rotation(z, 4)),
                _ => {
                    operations.push(Operation::rotation(z, 4));
                    operations.push(Operation::rotation(x, 2));
                }
            }
        },
        Family::Icosahedral {suppress, rot90} => {
            if suppress != Some(3) {
                operations.push(Operation::rotation(diagonal, 3));
            }
            match suppress {
                Some(5) => operations.push(Operation::rotation(x, 2)),
                Some(2) => operations.push(Operation::rotation(face_diagonal, 2)),
                _ => operations.push(Operation::rotation(Vector3::new(1.0, 1.0 / PHI, PHI), 2))
            }
            if suppress != Some(5) {
                operations.push(Operation::rotation(Vector3::new(1.0 / PHI, 1.0, 0.0), 5));
            }
            if suppress != Some(2) {
                operations.push(Operation::rotation(z, 2));
            }

            if rot90 {
                let quarter = Rotation::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2);
                for operation in operations.iter_mut() {
                    operation.axis = quarter * operation.axis;
                }
            }
        },
        Family::Helical {rise, angle, dyad} => {
            operations.push(Operation {axis: Vector3::z_axis(), order: 1, angle, shift: rise});
            if dyad {
                operations.push(Operation::rotation(x, 2));
            }
        }
    }
    operations
}

/// Rotational point group with its generators and enumerated orbit
///
/// The orbit is built by applying each generator's non-trivial powers to every
/// matrix collected so far, in generator order, starting from the identity.
/// Its length is the product of generator orders. Helical groups contribute
/// no screw powers to the orbit, only their dyad.
#[derive(Debug, Clone)]
pub struct SymmetryGroup {
    label: String,
    family: Family,
    operations: Vec<Operation>,
    matrices: Vec<Rotation>
}

impl SymmetryGroup {
    pub fn new(label: &str) -> Result<SymmetryGroup, ParseError> {
        let label = normalize_label(label);
        let family = parse_family(&label)?;
        let operations = generators(&family);

        let mut matrices = vec![Rotation::identity()];
        for operation in operations.iter() {
            let existing = matrices.len();
            for power in 1..operation.order {
                let rotation = operation.matrix(power);
                for i in 0..existing {
                    let product = rotation * matrices[i];
                    matrices.push(product);
                }
            }
        }

        Ok(SymmetryGroup {label, family, operations, matrices})
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn family(&self) -> &Family {
        &self.family
    }

    pub fn point_class(&self) -> u32 {
        self.family.point_class()
    }

    pub fn operations(&self) -> &[Operation] {
        &self.operations
    }

    /// Orbit matrices, identity first
    pub fn matrices(&self) -> &[Rotation] {
        &self.matrices
    }

    /// Product of generator orders
    pub fn order(&self) -> usize {
        self.operations.iter().map(|op| op.order as usize).product()
    }

    /// Every view generated from a view by the orbit matrices
    pub fn view_orbit(&self, view: &View) -> Vec<View> {
        self.matrices.iter().map(|m| view.rotate(m)).collect()
    }
}

impl std::str::FromStr for SymmetryGroup {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SymmetryGroup::new(s)
    }
}

impl std::fmt::Display for SymmetryGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label)
    }
}

pub mod asymmetric_unit;
