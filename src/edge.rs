use num_traits::NumAssign;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct Edge<Flow> {
    pub start: usize,
    pub end: usize,
    pub capacity: Flow,
    pub flow: Flow,
    pub blocked: bool,
}

impl<Flow> Edge<Flow>
where
    Flow: NumAssign + Ord + Copy,
{
    pub(crate) fn new(start: usize, end: usize, capacity: Flow) -> Self {
        Edge { start, end, capacity, flow: Flow::zero(), blocked: false }
    }

    #[inline]
    pub fn residual_capacity(&self) -> Flow {
        self.capacity - self.flow
    }

    // rejects values outside [0, capacity]
    pub fn set_flow(&mut self, flow: Flow) -> bool {
        if flow < Flow::zero() || flow > self.capacity {
            return false;
        }
        self.flow = flow;
        true
    }
}

impl<Flow> fmt::Display for Edge<Flow>
where
    Flow: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},c:{},f:{})", self.start, self.end, self.capacity, self.flow)
    }
}
