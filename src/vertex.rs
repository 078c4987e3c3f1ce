use num_traits::NumAssign;
use serde::{Deserialize, Serialize};

// Position of the next edge the iterator will hand out: the forward
// adjacency list is walked first, then the reverse adjacency list.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize, Deserialize)]
pub enum Cursor {
    Forward(usize),
    Residual(usize),
}

impl Default for Cursor {
    fn default() -> Self {
        Cursor::Forward(0)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex<Flow> {
    pub id: usize,
    pub(crate) neighbors: Vec<usize>,
    pub(crate) res_neighbors: Vec<usize>,
    pub(crate) label: usize,
    pub(crate) layer: Option<usize>,
    pub(crate) excess: Flow,
    pub(crate) is_source: bool,
    pub(crate) dead_end: bool,
    pub(crate) increased_label: bool,
    pub(crate) cursor: Cursor,
}

impl<Flow> Vertex<Flow>
where
    Flow: NumAssign + Ord + Copy,
{
    pub(crate) fn new(id: usize) -> Self {
        Vertex {
            id,
            neighbors: Vec::new(),
            res_neighbors: Vec::new(),
            label: 0,
            layer: None,
            excess: Flow::zero(),
            is_source: false,
            dead_end: false,
            increased_label: false,
            cursor: Cursor::default(),
        }
    }

    #[inline]
    pub fn label(&self) -> usize {
        self.label
    }

    #[inline]
    pub fn layer(&self) -> Option<usize> {
        self.layer
    }

    // Advance the cursor and return the edge it passed over: forward edges
    // in insertion order, then residual edges in insertion order. Marks the
    // vertex a dead end once the sequence is exhausted.
    pub(crate) fn next_edge(&mut self) -> Option<usize> {
        if self.dead_end {
            return None;
        }
        loop {
            match self.cursor {
                Cursor::Forward(k) if k < self.neighbors.len() => {
                    self.cursor = Cursor::Forward(k + 1);
                    return Some(self.neighbors[k]);
                }
                Cursor::Forward(_) => {
                    self.cursor = Cursor::Residual(0);
                }
                Cursor::Residual(k) if k < self.res_neighbors.len() => {
                    self.cursor = Cursor::Residual(k + 1);
                    return Some(self.res_neighbors[k]);
                }
                Cursor::Residual(_) => {
                    self.dead_end = true;
                    return None;
                }
            }
        }
    }

    // One step back, so the edge in front of the cursor is handed out again.
    // Stepping back over the list boundary re-serves the last forward edge.
    pub(crate) fn previous_edge(&mut self) {
        self.dead_end = false;
        match self.cursor {
            Cursor::Forward(0) => {}
            Cursor::Forward(k) => self.cursor = Cursor::Forward(k - 1),
            Cursor::Residual(0) => self.cursor = Cursor::Forward(self.neighbors.len().saturating_sub(1)),
            Cursor::Residual(k) => self.cursor = Cursor::Residual(k - 1),
        }
    }

    pub(crate) fn reset_cursor(&mut self) {
        self.cursor = Cursor::default();
    }
}

#[cfg(test)]
mod test {
    use super::{Cursor, Vertex};

    fn vertex_with_lists(neighbors: Vec<usize>, res_neighbors: Vec<usize>) -> Vertex<i64> {
        let mut vertex = Vertex::new(0);
        vertex.neighbors = neighbors;
        vertex.res_neighbors = res_neighbors;
        vertex
    }

    #[test]
    fn cursor_walks_forward_then_residual() {
        let mut vertex = vertex_with_lists(vec![10, 11, 12], vec![20, 21]);
        let mut sequence = Vec::new();
        while let Some(edge) = vertex.next_edge() {
            sequence.push(edge);
        }
        assert_eq!(sequence, vec![10, 11, 12, 20, 21]);
        assert!(vertex.dead_end);
        assert_eq!(vertex.next_edge(), None);
    }

    #[test]
    fn cursor_rewind_repeats_last_edge() {
        let mut vertex = vertex_with_lists(vec![10, 11], vec![20]);
        assert_eq!(vertex.next_edge(), Some(10));
        assert_eq!(vertex.next_edge(), Some(11));
        vertex.previous_edge();
        assert_eq!(vertex.next_edge(), Some(11));
        assert_eq!(vertex.next_edge(), Some(20));
        vertex.previous_edge();
        assert_eq!(vertex.next_edge(), Some(20));
    }

    #[test]
    fn rewind_at_start_is_a_no_op() {
        let mut vertex = vertex_with_lists(vec![10], vec![]);
        vertex.previous_edge();
        assert_eq!(vertex.cursor, Cursor::Forward(0));
        assert_eq!(vertex.next_edge(), Some(10));
    }

    #[test]
    fn rewind_crosses_the_list_boundary() {
        let mut vertex = vertex_with_lists(vec![10], vec![20]);
        assert_eq!(vertex.next_edge(), Some(10));
        assert_eq!(vertex.next_edge(), Some(20));
        vertex.previous_edge();
        vertex.previous_edge();
        assert_eq!(vertex.next_edge(), Some(10));
    }

    #[test]
    fn rewind_revives_a_dead_end() {
        let mut vertex = vertex_with_lists(vec![10], vec![20, 21]);
        while vertex.next_edge().is_some() {}
        assert!(vertex.dead_end);
        vertex.previous_edge();
        assert!(!vertex.dead_end);
        assert_eq!(vertex.next_edge(), Some(21));
    }

    #[test]
    fn exhaustion_without_any_edges() {
        let mut vertex = vertex_with_lists(vec![], vec![]);
        assert_eq!(vertex.next_edge(), None);
        assert!(vertex.dead_end);
        vertex.previous_edge();
        assert!(!vertex.dead_end);
        assert_eq!(vertex.next_edge(), None);
        assert!(vertex.dead_end);
    }

    #[test]
    fn reset_restarts_the_walk() {
        let mut vertex = vertex_with_lists(vec![10, 11], vec![]);
        assert_eq!(vertex.next_edge(), Some(10));
        vertex.reset_cursor();
        assert_eq!(vertex.next_edge(), Some(10));
    }
}
