//! Output persistence
//!
//! The runner hands each finished grid to an [`OutputSink`] exactly once per
//! key: one write per (year, month) and one per year. A grid is only written
//! once it is complete, so an interrupted run never leaves partial grids
//! behind. File formats are up to the sink implementation.

use crate::errors::{PipelineError, PipelineResult};
use ndarray::Array2;
use pmodel_core::broadcast::FloatValue;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Destination for monthly and annual GPP grids
pub trait OutputSink: Send + Sync {
    /// Store the monthly mean daily GPP (g C m⁻² day⁻¹) of `year`, zero-based `month`
    fn write_monthly(&self, year: i32, month: usize, grid: &Array2<FloatValue>) -> PipelineResult<()>;

    /// Store the annual total GPP (g C m⁻² yr⁻¹) of `year`
    fn write_annual(&self, year: i32, grid: &Array2<FloatValue>) -> PipelineResult<()>;
}

#[derive(Debug, Default)]
struct Stored {
    monthly: BTreeMap<(i32, usize), Array2<FloatValue>>,
    annual: BTreeMap<i32, Array2<FloatValue>>,
}

/// Sink keeping every grid in memory
#[derive(Debug, Default)]
pub struct MemorySink {
    stored: Mutex<Stored>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> PipelineResult<MutexGuard<'_, Stored>> {
        self.stored
            .lock()
            .map_err(|_| PipelineError::Sink("memory sink lock poisoned".to_string()))
    }

    pub fn monthly(&self, year: i32, month: usize) -> Option<Array2<FloatValue>> {
        self.lock().ok()?.monthly.get(&(year, month)).cloned()
    }

    pub fn annual(&self, year: i32) -> Option<Array2<FloatValue>> {
        self.lock().ok()?.annual.get(&year).cloned()
    }

    /// Years with a stored annual grid, in order
    pub fn annual_years(&self) -> Vec<i32> {
        self.lock()
            .map(|stored| stored.annual.keys().copied().collect())
            .unwrap_or_default()
    }

    /// Number of stored monthly grids
    pub fn monthly_count(&self) -> usize {
        self.lock().map(|stored| stored.monthly.len()).unwrap_or(0)
    }
}

impl OutputSink for MemorySink {
    fn write_monthly(&self, year: i32, month: usize, grid: &Array2<FloatValue>) -> PipelineResult<()> {
        let mut stored = self.lock()?;
        match stored.monthly.entry((year, month)) {
            Entry::Vacant(slot) => {
                slot.insert(grid.clone());
                Ok(())
            }
            Entry::Occupied(_) => Err(PipelineError::Sink(format!(
                "monthly grid {}-{:02} written twice",
                year,
                month + 1
            ))),
        }
    }

    fn write_annual(&self, year: i32, grid: &Array2<FloatValue>) -> PipelineResult<()> {
        let mut stored = self.lock()?;
        match stored.annual.entry(year) {
            Entry::Vacant(slot) => {
                slot.insert(grid.clone());
                Ok(())
            }
            Entry::Occupied(_) => Err(PipelineError::Sink(format!(
                "annual grid {} written twice",
                year
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_sink_stores_by_key() {
        let sink = MemorySink::new();
        let grid = Array2::from_elem((2, 2), 1.5);
        sink.write_monthly(2000, 0, &grid).unwrap();
        sink.write_monthly(2000, 1, &grid).unwrap();
        sink.write_annual(2000, &(&grid * 30.0)).unwrap();

        assert_eq!(sink.monthly_count(), 2);
        assert_eq!(sink.monthly(2000, 1), Some(grid.clone()));
        assert_eq!(sink.monthly(2000, 2), None);
        assert_eq!(sink.annual(2000).unwrap()[[0, 0]], 45.0);
        assert_eq!(sink.annual_years(), vec![2000]);
    }

    #[test]
    fn test_duplicate_writes_are_rejected() {
        let sink = MemorySink::new();
        let first = Array2::from_elem((1, 1), 1.0);
        let second = Array2::from_elem((1, 1), 999.0);

        sink.write_annual(1999, &first).unwrap();
        assert!(matches!(sink.write_annual(1999, &second), Err(PipelineError::Sink(_))));
        sink.write_monthly(1999, 3, &first).unwrap();
        assert!(matches!(
            sink.write_monthly(1999, 3, &second),
            Err(PipelineError::Sink(_))
        ));

        // The rejected writes leave the stored grids untouched
        assert_eq!(sink.annual(1999), Some(first.clone()));
        assert_eq!(sink.monthly(1999, 3), Some(first));
        assert_eq!(sink.monthly_count(), 1);
    }
}
