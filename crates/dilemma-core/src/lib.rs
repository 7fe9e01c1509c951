//! Issue option forecasting: effect parsing, bias scoring, and probability ranking.

pub mod annotation;
pub mod bias_table;
pub mod config;
pub mod effect;
mod error;
pub mod forecast;
pub mod profile;
pub mod ranker;
pub mod row;
pub mod scorer;

pub use annotation::{Annotation, AnnotationRow};
pub use bias_table::{BiasCell, BiasRow, BiasTable};
pub use config::ForecastConfig;
pub use error::ForecastError;
pub use forecast::{Forecast, ForecastRequest, Forecaster};
pub use profile::{BiasProfile, DisplayToggles, Exclusions, PolicyRule, PolicyRules};
pub use ranker::ProbabilityRanker;
pub use row::{DocumentRow, TableRow};
pub use scorer::{DisplayRow, OptionRecord};
