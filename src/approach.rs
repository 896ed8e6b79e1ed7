use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::Error;

/// Variant of the uncertainty formula
///
/// `Gde` follows the GDE2010 guidance document and uses the first-pass orthogonal fit directly.
/// The `Nilu` variants re-estimate the fit with an equation error variance corrected for the
/// measurement error of the reference, and differ in how the corrected variance enters the
/// uncertainty.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "String", rename_all = "UPPERCASE")]
pub enum Approach {
    #[default]
    Gde,
    /// Residual variance of the second-pass fit
    Nilu1,
    /// Bias-corrected equation error variance plus a measurement error correction term
    Nilu2,
}

impl Approach {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Gde => "GDE",
            Self::Nilu1 => "NILU1",
            Self::Nilu2 => "NILU2",
        }
    }
}

impl fmt::Display for Approach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Approach {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "GDE" => Ok(Self::Gde),
            "NILU1" => Ok(Self::Nilu1),
            "NILU2" => Ok(Self::Nilu2),
            other => Err(Error::UnsupportedApproach(other.to_owned())),
        }
    }
}

impl TryFrom<String> for Approach {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
