//! Report generation port trait.

use crate::domain::error::RulesimError;
use crate::domain::simulation::SimulationResult;

/// Port for rendering a finished simulation for the user.
pub trait ReportPort {
    fn write(&self, result: &SimulationResult, output_path: &str) -> Result<(), RulesimError>;
}
