#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// #![warn(clippy::cargo)]

pub mod approach;
pub mod config;
mod error;
pub(crate) mod margin;
pub mod math;
pub mod table;
pub mod uncertainty;

pub use approach::Approach;
pub use config::Config;
pub use error::Error;
pub use margin::{Fit, PointStatus, UncertaintySeries};
pub use table::{Series, Table, Timestamp};
pub use uncertainty::{compute, relative_expanded_uncertainty, UncertaintyTable};

pub type Result<T> = ::std::result::Result<T, Error>;
