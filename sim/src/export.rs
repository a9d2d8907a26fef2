//! JSON export of a finished run
//!
//! Bundles the summary and the in-memory streams for external consumption.
//! Writing files, CSVs, or plots is a collaborator's concern; this module
//! only produces the JSON string.

use serde::{Deserialize, Serialize};

use crate::metrics::{EventRecord, FillRecord, Summary, TradeRecord};
use crate::scheduler::SimOutput;

/// Complete export of one simulation run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationExport {
    pub version: String,
    pub summary: Summary,
    pub records: Vec<EventRecord>,
    pub trades: Vec<TradeRecord>,
    pub mm_fills: Vec<FillRecord>,
}

/// Build an export from a finished run
pub fn build_export(output: &SimOutput) -> SimulationExport {
    SimulationExport {
        version: crate::VERSION.to_string(),
        summary: output.summary.clone(),
        records: output.records.clone(),
        trades: output.trades.clone(),
        mm_fills: output.mm_fills.clone(),
    }
}

/// Serialize an export as pretty JSON
pub fn export_json(export: &SimulationExport) -> String {
    serde_json::to_string_pretty(export).unwrap_or_default()
}
