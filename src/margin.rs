use std::fmt::Debug;

use itertools::izip;
use ndarray::Array1;
use num_traits::{Float, FromPrimitive};

use crate::approach::Approach;
use crate::config::Config;
use crate::math::{as_float, corrected_fit, orthogonal_fit, pair, Line, Moments, Pairs};
use crate::table::{Series, Timestamp};
use crate::{Error, Result};

/// The number of pairs below which the equation error variance is undefined
const MIN_PAIRS: usize = 3;

/// Why a point of an uncertainty series does or does not hold a value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PointStatus {
    Defined,
    /// The reference or the candidate is missing at this timestamp
    Unpaired,
    /// The candidate is zero, so the relative uncertainty is undefined
    ZeroCandidate,
    /// The covariance of the column is exactly zero or the slope is not finite
    ///
    /// No tolerance is applied: a nearly uncorrelated column still gets a finite, if
    /// meaningless, slope and is computed like any other.
    ZeroCovariance,
    /// The value under the square root is negative, usually because `u_xi` exceeds the scatter
    /// about the line
    NegativeRadicand,
}

/// Summary of the regression behind an uncertainty series
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fit<E> {
    /// Number of paired observations
    pub pairs: usize,
    pub moments: Moments<E>,
    pub first_pass: Line<E>,
    /// Re-estimated line, only present for the corrected approaches
    pub second_pass: Option<Line<E>>,
    /// Equation error variance entering the radicand: `σ_v²` for `GDE` and `NILU1`, the
    /// corrected `σ_u²` for `NILU2`
    pub variance: E,
}

impl<E: Copy> Fit<E> {
    /// The line whose deviation from identity enters the uncertainty
    pub fn line(&self) -> Line<E> {
        self.second_pass.unwrap_or(self.first_pass)
    }
}

/// Relative expanded uncertainty of one candidate column, in percent
#[derive(Clone, Debug, PartialEq)]
pub struct UncertaintySeries<E> {
    column: String,
    name: String,
    values: Array1<E>,
    status: Vec<PointStatus>,
    negative_radicands: Vec<Timestamp>,
    fit: Fit<E>,
}

impl<E: Float> UncertaintySeries<E> {
    /// Name of the input column
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Output name, the candidate name prefixed with `u_`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Uncertainty on the full index, NaN wherever the status is not [`PointStatus::Defined`]
    pub const fn values(&self) -> &Array1<E> {
        &self.values
    }

    pub fn status(&self) -> &[PointStatus] {
        &self.status
    }

    pub const fn fit(&self) -> &Fit<E> {
        &self.fit
    }

    /// Timestamps with [`PointStatus::NegativeRadicand`], in index order
    pub fn negative_radicands(&self) -> &[Timestamp] {
        &self.negative_radicands
    }

    /// The points with a negative radicand as an error, if there are any
    pub fn negative_radicand_error(&self) -> Option<Error> {
        (!self.negative_radicands.is_empty()).then(|| Error::NegativeRadicand {
            column: self.column.clone(),
            timestamps: self.negative_radicands.clone(),
        })
    }

    pub fn get(&self, index: usize) -> Option<E> {
        self.values.get(index).copied().filter(|value| !value.is_nan())
    }
}

pub(crate) fn output_name(column: &str) -> String {
    format!("u_{column}")
}

/// Compute the uncertainty of `candidate` against `reference`
///
/// # Errors
/// - [`Error::InsufficientData`] if fewer than three positions hold both series
/// - [`Error::NegativeRadicand`] if the value under the square root is negative at every paired
///   timestamp. When only some are negative those points are NaN with
///   [`PointStatus::NegativeRadicand`] and the rest of the column is kept.
pub(crate) fn column_uncertainty<E: Float + FromPrimitive + Debug>(
    reference: &Series<E>,
    candidate: &Series<E>,
    timestamps: &[Timestamp],
    config: &Config<E>,
) -> Result<UncertaintySeries<E>> {
    let column = candidate.name();
    let pairs = pair(reference.values(), candidate.values());
    if pairs.len() < MIN_PAIRS {
        return Err(Error::InsufficientData {
            column: column.to_owned(),
            pairs: pairs.len(),
        });
    }

    let moments = Moments::from_pairs(&pairs);
    let first_pass = orthogonal_fit(&moments, config.lambda);
    let len = candidate.values().len();

    if moments.s_xy == E::zero() || !first_pass.is_finite() {
        tracing::warn!(column, "covariance with the reference vanishes, slope is undefined");
        let mut status = vec![PointStatus::Unpaired; len];
        for &ii in &pairs.indices {
            status[ii] = PointStatus::ZeroCovariance;
        }
        return Ok(UncertaintySeries {
            column: column.to_owned(),
            name: output_name(column),
            values: Array1::from_elem(len, E::nan()),
            status,
            negative_radicands: vec![],
            fit: Fit {
                pairs: pairs.len(),
                moments,
                first_pass,
                second_pass: None,
                variance: E::nan(),
            },
        });
    }

    let estimate = estimate(&pairs, &moments, first_pass, config);
    tracing::debug!(
        column,
        pairs = pairs.len(),
        slope = ?estimate.fit.line().slope,
        intercept = ?estimate.fit.line().intercept,
        variance = ?estimate.fit.variance,
        approach = %config.approach,
        "fitted orthogonal regression"
    );

    let hundred = as_float::<E>(100);
    let two = E::one() + E::one();
    let mut values = Array1::from_elem(len, E::nan());
    let mut status = vec![PointStatus::Unpaired; len];
    let mut negative = vec![];

    for (&ii, &y, &radicand) in izip!(&pairs.indices, &pairs.y, &estimate.radicands) {
        if radicand < E::zero() {
            negative.push(timestamps[ii].clone());
            status[ii] = PointStatus::NegativeRadicand;
        } else if y == E::zero() {
            status[ii] = PointStatus::ZeroCandidate;
        } else {
            values[ii] = two / y * radicand.sqrt() * hundred;
            status[ii] = PointStatus::Defined;
        }
    }

    if negative.len() == pairs.len() {
        return Err(Error::NegativeRadicand {
            column: column.to_owned(),
            timestamps: negative,
        });
    }
    if !negative.is_empty() {
        tracing::warn!(
            column,
            negative = negative.len(),
            first = %negative[0].0,
            "uncertainty undefined where the value under the square root is negative"
        );
    }

    let zero_candidates = status
        .iter()
        .filter(|&&point| point == PointStatus::ZeroCandidate)
        .count();
    if zero_candidates > 0 {
        tracing::warn!(
            column,
            zero_candidates,
            "uncertainty undefined where the candidate is zero"
        );
    }

    Ok(UncertaintySeries {
        column: column.to_owned(),
        name: output_name(column),
        values,
        status,
        negative_radicands: negative,
        fit: estimate.fit,
    })
}

struct Estimate<E> {
    fit: Fit<E>,
    /// Value under the square root at each pair
    radicands: Vec<E>,
}

fn estimate<E: Float + FromPrimitive>(
    pairs: &Pairs<E>,
    moments: &Moments<E>,
    first_pass: Line<E>,
    config: &Config<E>,
) -> Estimate<E> {
    let Config {
        lambda,
        u_xi,
        approach,
        ..
    } = *config;
    let degrees_of_freedom = as_float::<E>(pairs.len() - 2);
    let measurement_variance = u_xi.powi(2);
    let radicands_about = |line: &Line<E>, offset: E| -> Vec<E> {
        pairs
            .x
            .iter()
            .map(|&x| offset + line.identity_deviation(x))
            .collect()
    };

    let (second_pass, variance, radicands) = match approach {
        Approach::Gde => {
            let sigma_v_sqr = first_pass.residual_sum_of_squares(pairs) / degrees_of_freedom;
            let radicands = radicands_about(&first_pass, sigma_v_sqr - measurement_variance);
            (None, sigma_v_sqr, radicands)
        }
        Approach::Nilu1 => {
            let sigma_u_sqr =
                corrected_variance(pairs, &first_pass, lambda, measurement_variance);
            let line = corrected_fit(moments, lambda, sigma_u_sqr);
            let sigma_v_sqr = line.residual_sum_of_squares(pairs) / degrees_of_freedom;
            let radicands = radicands_about(&line, sigma_v_sqr - measurement_variance);
            (Some(line), sigma_v_sqr, radicands)
        }
        Approach::Nilu2 => {
            let sigma_u_sqr =
                corrected_variance(pairs, &first_pass, lambda, measurement_variance);
            let line = corrected_fit(moments, lambda, sigma_u_sqr);
            let correction = (lambda - (line.slope - E::one()).powi(2)) * measurement_variance;
            let radicands = radicands_about(&line, sigma_u_sqr + correction);
            (Some(line), sigma_u_sqr, radicands)
        }
    };

    Estimate {
        fit: Fit {
            pairs: pairs.len(),
            moments: *moments,
            first_pass,
            second_pass,
            variance,
        },
        radicands,
    }
}

/// Equation error variance of the first pass with the measurement error of the reference removed
fn corrected_variance<E: Float + FromPrimitive>(
    pairs: &Pairs<E>,
    first_pass: &Line<E>,
    lambda: E,
    measurement_variance: E,
) -> E {
    let correction = (first_pass.slope.powi(2) + lambda) * measurement_variance;
    pairs
        .x
        .iter()
        .zip(pairs.y.iter())
        .fold(E::zero(), |acc, (&x, &y)| {
            acc + (first_pass.residual(x, y).powi(2) - correction)
        })
        / as_float::<E>(pairs.len() - 2)
}
