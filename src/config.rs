use std::fs;
use std::path::Path;

use num_traits::Float;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

use crate::approach::Approach;
use crate::{Error, Result};

/// Parameters of an uncertainty computation
///
/// On disk the configuration is a TOML document, only `reference` is required:
///
/// ```toml
/// reference = "NO2"
/// lambda = 1.0
/// u_xi = 0.0
/// approach = "NILU2"
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields, bound(deserialize = "E: Float + Deserialize<'de>"))]
pub struct Config<E> {
    /// Name of the column treated as the true value
    pub reference: String,
    /// Ratio of the error variance of the candidate to that of the reference
    #[serde(default = "unit")]
    pub lambda: E,
    /// Standard deviation of the measurement error of the reference
    #[serde(default = "nil")]
    pub u_xi: E,
    #[serde(default)]
    pub approach: Approach,
}

fn unit<E: Float>() -> E {
    E::one()
}

fn nil<E: Float>() -> E {
    E::zero()
}

impl<E: Float> Config<E> {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            lambda: E::one(),
            u_xi: E::zero(),
            approach: Approach::default(),
        }
    }

    #[must_use]
    pub fn with_lambda(mut self, lambda: E) -> Self {
        self.lambda = lambda;
        self
    }

    #[must_use]
    pub fn with_measurement_error(mut self, u_xi: E) -> Self {
        self.u_xi = u_xi;
        self
    }

    #[must_use]
    pub fn with_approach(mut self, approach: Approach) -> Self {
        self.approach = approach;
        self
    }

    /// Check the parameters lie in the domain of the formulas
    ///
    /// # Errors
    /// Returns [`Error::InvalidParameter`] if `lambda` is not strictly positive or `u_xi` is
    /// negative, or if either is not finite.
    pub fn validate(&self) -> Result<()> {
        if !self.lambda.is_finite() || self.lambda <= E::zero() {
            return Err(Error::InvalidParameter {
                name: "lambda",
                value: self.lambda.to_f64().unwrap_or(f64::NAN),
            });
        }
        if !self.u_xi.is_finite() || self.u_xi < E::zero() {
            return Err(Error::InvalidParameter {
                name: "u_xi",
                value: self.u_xi.to_f64().unwrap_or(f64::NAN),
            });
        }
        Ok(())
    }
}

impl<E: Float + DeserializeOwned> Config<E> {
    /// Parse and validate a configuration from a TOML document
    ///
    /// # Errors
    /// Returns an error if the document is not valid TOML, names an unsupported approach, holds
    /// unknown keys or fails [`Config::validate`].
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Read a configuration file, see [`Config::from_toml_str`]
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or does not hold a valid configuration.
    pub fn from_file(path: &Path) -> Result<Self> {
        tracing::info!(?path, "reading configuration");
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }
}
