//! Numeric building blocks for the HiCoNet engine.
//!
//! This crate collects the small statistical tools shared by community detection
//! and association-network construction:
//!
//! - **Descriptive statistics**: mean, median, variance, standard deviation, etc.
//! - **Percentiles**: interpolated percentiles and tail fractions of score samples
//! - **Correlation**: Pearson correlation between two equally sized samples
//! - **Polynomial fitting**: least-squares polynomial fit and evaluation
//! - **Goodness of fit**: coefficient of determination for multi-output predictions
//!
//! # Modules
//!
//! - [`descriptive`]: Descriptive statistics for summarizing datasets
//! - [`percentiles`]: Percentiles and exceedance fractions
//! - [`correlation`]: Pearson correlation
//! - [`polyfit`]: Least-squares polynomial fit
//! - [`goodness_of_fit`]: Coefficient of determination (R²)
//!
//! # Examples
//!
//! ## Computing descriptive statistics
//!
//! ```
//! use hiconet_stats::descriptive::DescriptiveStats;
//!
//! let values = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let stats = DescriptiveStats::new(values).unwrap();
//! assert_eq!(stats.mean, 3.0);
//! ```
//!
//! ## Correlating two features
//!
//! ```
//! use hiconet_stats::correlation::pearson;
//!
//! let a = [1.0, 2.0, 3.0, 4.0];
//! let b = [2.0, 4.0, 6.0, 8.0];
//! let r = pearson(&a, &b).unwrap();
//! assert!((r - 1.0).abs() < 1e-12);
//! ```
//!
//! ## Fitting a polynomial
//!
//! ```
//! use hiconet_stats::polyfit::Polynomial;
//!
//! let xs = [0.0, 1.0, 2.0, 3.0, 4.0];
//! let ys = xs.map(|x| 2.0 * x * x - x + 1.0);
//! let poly = Polynomial::fit(&xs, &ys, 2).unwrap();
//! assert!((poly.evaluate(5.0) - 46.0).abs() < 1e-8);
//! ```

pub mod correlation;
pub mod descriptive;
pub mod goodness_of_fit;
pub mod percentiles;
pub mod polyfit;
