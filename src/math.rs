use ndarray::Array1;
use num_traits::{Float, FromPrimitive};

/// Observations at which both the reference and the candidate are present
///
/// `indices` are positions in the original, unmasked index so values computed from the pairs can
/// be placed back on it.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Pairs<E> {
    pub(crate) indices: Vec<usize>,
    pub(crate) x: Array1<E>,
    pub(crate) y: Array1<E>,
}

impl<E> Pairs<E> {
    pub(crate) fn len(&self) -> usize {
        self.indices.len()
    }
}

/// Pairwise deletion: drop every position where either series is missing
pub(crate) fn pair<E: Float>(x: &Array1<E>, y: &Array1<E>) -> Pairs<E> {
    let (indices, (x, y)): (Vec<usize>, (Vec<E>, Vec<E>)) = x
        .iter()
        .zip(y.iter())
        .enumerate()
        .filter(|(_, (x, y))| !x.is_nan() && !y.is_nan())
        .map(|(ii, (x, y))| (ii, (*x, *y)))
        .unzip();

    Pairs {
        indices,
        x: Array1::from(x),
        y: Array1::from(y),
    }
}

/// Population moments of a set of pairs
///
/// All variances use the population denominator `n`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Moments<E> {
    pub x_mean: E,
    pub y_mean: E,
    pub s_x: E,
    pub s_y: E,
    pub s_xy: E,
}

impl<E: Float + FromPrimitive> Moments<E> {
    /// # Panics
    /// If `pairs` is empty; callers check the number of pairs first.
    pub(crate) fn from_pairs(pairs: &Pairs<E>) -> Self {
        assert!(!pairs.x.is_empty(), "moments of an empty sample are undefined");
        let n = as_float::<E>(pairs.len());

        let x_mean = pairs.x.sum() / n;
        let y_mean = pairs.y.sum() / n;
        let s_x = pairs.x.mapv(|x| (x - x_mean).powi(2)).sum() / n;
        let s_y = pairs.y.mapv(|y| (y - y_mean).powi(2)).sum() / n;
        let s_xy = (&pairs.x * &pairs.y).sum() / n - x_mean * y_mean;

        Self {
            x_mean,
            y_mean,
            s_x,
            s_y,
            s_xy,
        }
    }
}

/// A straight line `y = intercept + slope * x`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line<E> {
    pub intercept: E,
    pub slope: E,
}

impl<E: Float> Line<E> {
    /// The line of slope `slope` through the centroid of the pairs
    fn through_centroid(moments: &Moments<E>, slope: E) -> Self {
        Self {
            intercept: moments.y_mean - slope * moments.x_mean,
            slope,
        }
    }

    /// Equation error of the observation `(x, y)`
    pub(crate) fn residual(&self, x: E, y: E) -> E {
        y - self.intercept - self.slope * x
    }

    /// Squared deviation of the line from the identity line at `x`
    pub(crate) fn identity_deviation(&self, x: E) -> E {
        (self.intercept + (self.slope - E::one()) * x).powi(2)
    }

    pub(crate) fn residual_sum_of_squares(&self, pairs: &Pairs<E>) -> E {
        pairs
            .x
            .iter()
            .zip(pairs.y.iter())
            .fold(E::zero(), |acc, (&x, &y)| acc + self.residual(x, y).powi(2))
    }

    pub(crate) fn is_finite(&self) -> bool {
        self.slope.is_finite() && self.intercept.is_finite()
    }
}

/// First pass of the errors-in-variables regression
///
/// The slope is the positive root of the total least squares quadratic for the error variance
/// ratio `lambda`:
///
/// $$
///     b_1 = \frac{S_y - \lambda S_x + \sqrt{(S_y - S_x)^2 + 4 \lambda S_{xy}^2}}{2 S_{xy}}
/// $$
///
/// The slope is not finite when `S_xy` vanishes.
pub(crate) fn orthogonal_fit<E: Float>(moments: &Moments<E>, lambda: E) -> Line<E> {
    let two = E::one() + E::one();
    let discriminant =
        (moments.s_y - moments.s_x).powi(2) + two * two * lambda * moments.s_xy.powi(2);
    let slope = (moments.s_y - lambda * moments.s_x + discriminant.sqrt()) / (two * moments.s_xy);
    Line::through_centroid(moments, slope)
}

/// Second pass, with the equation error variance `sigma_u_sqr` removed from the candidate
/// variance
pub(crate) fn corrected_fit<E: Float>(moments: &Moments<E>, lambda: E, sigma_u_sqr: E) -> Line<E> {
    let two = E::one() + E::one();
    let excess = moments.s_y - lambda * moments.s_x - sigma_u_sqr;
    let discriminant = excess.powi(2) + two * two * lambda * moments.s_xy.powi(2);
    let slope = (excess + discriminant.sqrt()) / (two * moments.s_xy);
    Line::through_centroid(moments, slope)
}

/// `n` as a float
///
/// # Panics
/// If `n` cannot be represented in `E`, which does not happen for the float types.
pub(crate) fn as_float<E: FromPrimitive>(n: usize) -> E {
    E::from_usize(n).expect("usize must fit in `E`")
}
