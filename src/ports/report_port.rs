//! Report generation port trait.

use std::path::Path;

use crate::domain::backtest::BacktestResult;
use crate::domain::error::TradesimError;
use crate::domain::metrics::PerformanceSummary;

/// Port for handing a finished run to a presentation layer.
pub trait ReportPort {
    fn write(
        &self,
        result: &BacktestResult,
        summary: &PerformanceSummary,
        output_dir: &Path,
    ) -> Result<(), TradesimError>;
}
