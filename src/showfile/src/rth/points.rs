use std::collections::HashMap;

use ordered_float::OrderedFloat;

use crate::rth::plan::RthPlan;

type PointKey = (OrderedFloat<f64>, OrderedFloat<f64>);

/// PointTable is the deduplicated list of RTH targets. Each distinct point is
/// indexed in the order it is first used by the plan.
#[derive(Debug, Clone, Default)]
pub struct PointTable {
    points: Vec<(f64, f64)>,
    index: HashMap<PointKey, usize>,
}

impl PointTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_plan(plan: &RthPlan) -> Self {
        let mut table = Self::new();
        for target in plan.iter().filter_map(|e| e.effective_target()) {
            table.insert(target);
        }
        table
    }

    /// insert adds the point if it is not in the table yet and returns its index.
    pub fn insert(&mut self, point: (f64, f64)) -> usize {
        let key = (OrderedFloat(point.0), OrderedFloat(point.1));
        if let Some(index) = self.index.get(&key) {
            return *index;
        }

        let index = self.points.len();
        self.points.push(point);
        self.index.insert(key, index);
        index
    }

    pub fn index_of(&self, point: (f64, f64)) -> Option<usize> {
        self.index
            .get(&(OrderedFloat(point.0), OrderedFloat(point.1)))
            .copied()
    }

    pub fn get(&self, index: usize) -> Option<(f64, f64)> {
        self.points.get(index).copied()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (f64, f64)> {
        self.points.iter()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
