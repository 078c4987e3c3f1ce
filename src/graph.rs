use crate::edge::Edge;
use crate::vertex::Vertex;
use num_traits::NumAssign;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, VecDeque};
use std::fmt;

// Vertices are kept in insertion order; edges live in an arena addressed by
// index, with adjacency and reverse adjacency stored as index lists. There
// is exactly one Edge per directed pair: a traversal is residual iff the
// current vertex is the edge's end vertex.
#[derive(Serialize, Deserialize)]
pub struct Graph<Flow> {
    vertices: Vec<Vertex<Flow>>,
    slot_of: HashMap<usize, usize>,
    edges: Vec<Option<Edge<Flow>>>,
    free_edge_slots: Vec<usize>,

    #[serde(skip)]
    augmenting_path: Vec<usize>,
    #[serde(skip)]
    queue: VecDeque<usize>,
    #[serde(skip)]
    push_source: Option<usize>,
    #[serde(skip)]
    push_sink: Option<usize>,
}

impl<Flow> Default for Graph<Flow> {
    fn default() -> Self {
        Graph {
            vertices: Vec::new(),
            slot_of: HashMap::new(),
            edges: Vec::new(),
            free_edge_slots: Vec::new(),
            augmenting_path: Vec::new(),
            queue: VecDeque::new(),
            push_source: None,
            push_sink: None,
        }
    }
}

impl<Flow> Graph<Flow>
where
    Flow: NumAssign + Ord + Copy,
{
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len() - self.free_edge_slots.len()
    }

    #[inline]
    pub fn contains_vertex(&self, id: usize) -> bool {
        self.slot_of.contains_key(&id)
    }

    pub fn contains_edge(&self, start: usize, end: usize) -> bool {
        match self.slot_of.get(&start) {
            Some(&slot) => self.vertices[slot].neighbors.iter().any(|&e| self.edge(e).end == end),
            None => false,
        }
    }

    pub fn vertex(&self, id: usize) -> Option<&Vertex<Flow>> {
        self.slot_of.get(&id).map(|&slot| &self.vertices[slot])
    }

    pub fn add_vertex(&mut self, id: usize) -> bool {
        if self.contains_vertex(id) {
            return false;
        }
        self.slot_of.insert(id, self.vertices.len());
        self.vertices.push(Vertex::new(id));
        true
    }

    pub fn remove_vertex(&mut self, id: usize) -> bool {
        let Some(&slot) = self.slot_of.get(&id) else {
            return false;
        };
        // unlink outgoing edges from the end vertices' reverse lists
        let outgoing = self.vertices[slot].neighbors.clone();
        for e in outgoing {
            let end = self.edge(e).end;
            let end_slot = self.slot_of[&end];
            self.vertices[end_slot].res_neighbors.retain(|&other| other != e);
            self.release_edge(e);
        }
        // unlink incoming edges from the start vertices' neighbor lists
        let incoming = self.vertices[slot].res_neighbors.clone();
        for e in incoming {
            let start = self.edge(e).start;
            let start_slot = self.slot_of[&start];
            self.vertices[start_slot].neighbors.retain(|&other| other != e);
            self.release_edge(e);
        }
        self.vertices.remove(slot);
        self.slot_of = self.vertices.iter().enumerate().map(|(slot, v)| (v.id, slot)).collect();
        true
    }

    // Missing endpoints are created on the fly. Self-loops and duplicate
    // pairs are rejected.
    pub fn add_edge(&mut self, start: usize, end: usize, capacity: Flow) -> bool {
        if start == end {
            return false;
        }
        self.add_vertex(start);
        self.add_vertex(end);
        if self.contains_edge(start, end) {
            return false;
        }
        let edge = Edge::new(start, end, capacity);
        let e = match self.free_edge_slots.pop() {
            Some(slot) => {
                self.edges[slot] = Some(edge);
                slot
            }
            None => {
                self.edges.push(Some(edge));
                self.edges.len() - 1
            }
        };
        let start_slot = self.slot_of[&start];
        self.vertices[start_slot].neighbors.push(e);
        let end_slot = self.slot_of[&end];
        self.vertices[end_slot].res_neighbors.push(e);
        true
    }

    pub fn remove_edge(&mut self, start: usize, end: usize) -> bool {
        let (Some(&start_slot), Some(&end_slot)) = (self.slot_of.get(&start), self.slot_of.get(&end)) else {
            return false;
        };
        let Some(e) = self.vertices[start_slot].neighbors.iter().copied().find(|&e| self.edge(e).end == end) else {
            return false;
        };
        self.vertices[start_slot].neighbors.retain(|&other| other != e);
        self.vertices[end_slot].res_neighbors.retain(|&other| other != e);
        self.release_edge(e);
        true
    }

    #[inline]
    pub(crate) fn edge(&self, e: usize) -> &Edge<Flow> {
        self.edges[e].as_ref().unwrap()
    }

    #[inline]
    fn edge_mut(&mut self, e: usize) -> &mut Edge<Flow> {
        self.edges[e].as_mut().unwrap()
    }

    fn release_edge(&mut self, e: usize) {
        self.edges[e] = None;
        self.free_edge_slots.push(e);
    }

    pub fn reset_flow(&mut self) {
        for edge in self.edges.iter_mut().flatten() {
            edge.set_flow(Flow::zero());
        }
    }

    // Reinstall every edge into its end vertex's reverse adjacency list.
    pub fn build_residual_graph(&mut self) {
        for vertex in &mut self.vertices {
            vertex.res_neighbors.clear();
            vertex.dead_end = false;
        }
        for slot in 0..self.vertices.len() {
            for k in 0..self.vertices[slot].neighbors.len() {
                let e = self.vertices[slot].neighbors[k];
                let end = self.edge(e).end;
                let end_slot = self.slot_of[&end];
                self.vertices[end_slot].res_neighbors.push(e);
            }
        }
    }

    pub fn reset_excesses(&mut self, source: usize) {
        for vertex in &mut self.vertices {
            vertex.excess = Flow::zero();
            vertex.is_source = vertex.id == source;
        }
    }

    pub fn initialize_labels(&mut self, source: usize) {
        let num_vertices = self.vertices.len();
        for vertex in &mut self.vertices {
            vertex.label = if vertex.id == source { num_vertices } else { 0 };
        }
    }

    // BFS layering of the residual graph. Stops as soon as the sink enters
    // the next layer; other vertices of that layer are taken back out of the
    // layered network. Returns the sink's layer number, or None when the
    // sink is unreachable.
    pub fn build_layered_network(&mut self, source: usize, sink: usize) -> Option<usize> {
        for slot in 0..self.vertices.len() {
            self.vertices[slot].layer = None;
            self.vertices[slot].dead_end = false;
            self.vertices[slot].reset_cursor();
            for k in 0..self.vertices[slot].neighbors.len() {
                let e = self.vertices[slot].neighbors[k];
                self.edge_mut(e).blocked = true;
            }
        }

        let source_slot = self.slot_of[&source];
        self.vertices[source_slot].layer = Some(0);
        let mut layer_number = 0;
        let mut current_layer = vec![source];
        let mut next_layer: Vec<usize> = Vec::new();
        while !current_layer.is_empty() {
            layer_number += 1;
            for u in current_layer.drain(..) {
                let u_slot = self.slot_of[&u];
                for k in 0..self.vertices[u_slot].neighbors.len() {
                    let e = self.vertices[u_slot].neighbors[k];
                    let (end, usable) = {
                        let edge = self.edge(e);
                        (edge.end, edge.capacity > edge.flow)
                    };
                    if usable {
                        let end_slot = self.slot_of[&end];
                        if self.vertices[end_slot].layer.is_none() {
                            self.edge_mut(e).blocked = false;
                            self.vertices[end_slot].layer = Some(layer_number);
                            self.vertices[end_slot].dead_end = false;
                            next_layer.push(end);
                        }
                    }
                }
                for k in 0..self.vertices[u_slot].res_neighbors.len() {
                    let e = self.vertices[u_slot].res_neighbors[k];
                    let (start, usable) = {
                        let edge = self.edge(e);
                        (edge.start, edge.flow > Flow::zero())
                    };
                    if usable {
                        let start_slot = self.slot_of[&start];
                        if self.vertices[start_slot].layer.is_none() {
                            self.edge_mut(e).blocked = false;
                            self.vertices[start_slot].layer = Some(layer_number);
                            self.vertices[start_slot].dead_end = false;
                            next_layer.push(start);
                        }
                    }
                }
            }
            if next_layer.contains(&sink) {
                for &v in &next_layer {
                    let v_slot = self.slot_of[&v];
                    self.vertices[v_slot].layer = None;
                }
                let sink_slot = self.slot_of[&sink];
                self.vertices[sink_slot].layer = Some(layer_number);
                return Some(layer_number);
            }
            std::mem::swap(&mut current_layer, &mut next_layer);
        }
        None
    }

    // DFS through the layered network, resuming each vertex at its cursor.
    // The path under construction is a stack of edge indices.
    pub fn search_augmenting_path(&mut self, source: usize, sink: usize) -> bool {
        self.augmenting_path.clear();
        let mut active = source;
        while active != sink {
            let active_slot = self.slot_of[&active];
            if !self.vertices[active_slot].dead_end {
                let Some(e) = self.vertices[active_slot].next_edge() else {
                    continue;
                };
                let edge = self.edge(e).clone();
                let active_layer = self.vertices[active_slot].layer.unwrap();
                if edge.start == active {
                    let end_slot = self.slot_of[&edge.end];
                    if self.vertices[end_slot].layer == Some(active_layer + 1) && edge.capacity > edge.flow {
                        active = edge.end;
                        self.augmenting_path.push(e);
                    }
                } else if edge.flow > Flow::zero() {
                    let start_slot = self.slot_of[&edge.start];
                    if self.vertices[start_slot].layer == Some(active_layer + 1) {
                        active = edge.start;
                        self.augmenting_path.push(e);
                    }
                }
            } else {
                // fully explored: no augmenting path through here
                if active == source {
                    self.augmenting_path.clear();
                    return false;
                }
                let e = self.augmenting_path.pop().unwrap();
                self.edge_mut(e).blocked = true;
                let edge = self.edge(e);
                active = if active == edge.end { edge.start } else { edge.end };
            }
        }
        true
    }

    // Push the bottleneck residual capacity over the current augmenting
    // path. Saturated (or emptied) edges are blocked; for the others the
    // originating vertex's cursor is rewound so the edge can be reused.
    pub fn update_min_flow_increment(&mut self) -> Flow {
        if self.augmenting_path.is_empty() {
            return Flow::zero();
        }

        let first = self.edge(self.augmenting_path[0]).clone();
        let mut delta = first.residual_capacity();
        let mut position = first.end;
        for k in 1..self.augmenting_path.len() {
            let edge = self.edge(self.augmenting_path[k]).clone();
            if position == edge.start {
                position = edge.end;
                delta = delta.min(edge.residual_capacity());
            } else {
                position = edge.start;
                delta = delta.min(edge.flow);
            }
        }

        // the first step always leaves the source over a forward edge
        let first_e = self.augmenting_path[0];
        if delta == first.residual_capacity() {
            self.edge_mut(first_e).blocked = true;
        } else {
            let start_slot = self.slot_of[&first.start];
            self.vertices[start_slot].previous_edge();
        }
        self.edge_mut(first_e).flow += delta;
        let mut position = first.end;
        for k in 1..self.augmenting_path.len() {
            let e = self.augmenting_path[k];
            let edge = self.edge(e).clone();
            if position == edge.start {
                position = edge.end;
                if delta == edge.residual_capacity() {
                    self.edge_mut(e).blocked = true;
                } else {
                    let start_slot = self.slot_of[&edge.start];
                    self.vertices[start_slot].previous_edge();
                }
                self.edge_mut(e).flow += delta;
            } else {
                position = edge.start;
                if delta == edge.flow {
                    self.edge_mut(e).blocked = true;
                } else {
                    let end_slot = self.slot_of[&edge.end];
                    self.vertices[end_slot].previous_edge();
                }
                self.edge_mut(e).flow -= delta;
            }
        }
        delta
    }

    // Saturate every edge out of the source and enqueue the endpoints that
    // become active. Returns the queue length.
    pub fn initial_push(&mut self, source: usize, sink: usize) -> usize {
        self.push_source = Some(source);
        self.push_sink = Some(sink);
        self.queue.clear();
        let source_slot = self.slot_of[&source];
        let outgoing = self.vertices[source_slot].neighbors.clone();
        for e in outgoing {
            if let Some(activated) = self.push_flow_forward(e) {
                if activated != source && activated != sink {
                    self.queue.push_back(activated);
                }
            }
        }
        self.queue.len()
    }

    // Discharge the head of the FIFO queue: push-relabel steps until the
    // excess is gone or the label rose. Returns the queue length.
    pub fn discharge_queue(&mut self) -> usize {
        let Some(head) = self.queue.pop_front() else {
            return 0;
        };
        let head_slot = self.slot_of[&head];
        self.vertices[head_slot].reset_cursor();
        self.vertices[head_slot].increased_label = false;
        while self.vertices[head_slot].excess > Flow::zero() && !self.vertices[head_slot].increased_label {
            if let Some(activated) = self.push_relabel_step(head) {
                if Some(activated) != self.push_source && Some(activated) != self.push_sink {
                    self.queue.push_back(activated);
                }
            }
        }
        if self.vertices[head_slot].excess > Flow::zero() {
            self.vertices[head_slot].increased_label = false;
            self.queue.push_back(head);
        }
        self.queue.len()
    }

    // One push-relabel step: try the cursor's next edge; relabel when the
    // cursor is exhausted. Returns a vertex that became active, if any.
    fn push_relabel_step(&mut self, u: usize) -> Option<usize> {
        let u_slot = self.slot_of[&u];
        let Some(e) = self.vertices[u_slot].next_edge() else {
            self.relabel_vertex(u_slot);
            self.vertices[u_slot].dead_end = false;
            return None;
        };
        let edge = self.edge(e).clone();
        let admissible = if edge.start == u {
            let end_slot = self.slot_of[&edge.end];
            self.vertices[u_slot].label == self.vertices[end_slot].label + 1 && edge.capacity > edge.flow
        } else {
            let start_slot = self.slot_of[&edge.start];
            self.vertices[u_slot].label == self.vertices[start_slot].label + 1 && edge.flow > Flow::zero()
        };
        if admissible {
            if edge.start == u {
                self.push_flow_forward(e)
            } else {
                self.push_flow_backward(e)
            }
        } else if self.vertices[u_slot].dead_end {
            self.relabel_vertex(u_slot);
            self.vertices[u_slot].dead_end = false;
            None
        } else {
            None
        }
    }

    // Raise the label one above the smallest label reachable over a
    // residual arc. With no residual arc the label is left alone; a vertex
    // with positive excess always has an incoming edge carrying flow, so
    // that case cannot occur during a discharge.
    fn relabel_vertex(&mut self, slot: usize) {
        let mut new_label: Option<usize> = None;
        for &e in &self.vertices[slot].neighbors {
            let edge = self.edge(e);
            if edge.residual_capacity() > Flow::zero() {
                let end_slot = self.slot_of[&edge.end];
                let candidate = self.vertices[end_slot].label + 1;
                new_label = Some(new_label.map_or(candidate, |label| label.min(candidate)));
            }
        }
        for &e in &self.vertices[slot].res_neighbors {
            let edge = self.edge(e);
            if edge.flow > Flow::zero() {
                let start_slot = self.slot_of[&edge.start];
                let candidate = self.vertices[start_slot].label + 1;
                new_label = Some(new_label.map_or(candidate, |label| label.min(candidate)));
            }
        }
        if let Some(label) = new_label {
            self.vertices[slot].label = label;
            self.vertices[slot].increased_label = true;
        }
    }

    // Push excess along the edge's natural direction. From the source the
    // push always saturates and the source's excess stays untouched. A
    // non-saturating push rewinds the pushing vertex's cursor.
    fn push_flow_forward(&mut self, e: usize) -> Option<usize> {
        let edge = self.edge(e).clone();
        let start_slot = self.slot_of[&edge.start];
        let end_slot = self.slot_of[&edge.end];
        let previous_excess = self.vertices[end_slot].excess;
        let delta;
        if self.vertices[start_slot].is_source {
            delta = edge.residual_capacity();
        } else {
            let excess = self.vertices[start_slot].excess;
            let residual = edge.residual_capacity();
            if residual <= excess {
                delta = residual;
            } else {
                delta = excess;
                self.vertices[start_slot].previous_edge();
            }
            self.vertices[start_slot].excess -= delta;
        }
        self.edge_mut(e).flow += delta;
        self.vertices[end_slot].excess += delta;
        if previous_excess == Flow::zero() && delta > Flow::zero() {
            self.vertices[end_slot].dead_end = false;
            Some(edge.end)
        } else {
            None
        }
    }

    // Push excess against the edge's direction by cancelling flow.
    fn push_flow_backward(&mut self, e: usize) -> Option<usize> {
        let edge = self.edge(e).clone();
        let start_slot = self.slot_of[&edge.start];
        let end_slot = self.slot_of[&edge.end];
        let previous_excess = self.vertices[start_slot].excess;
        let excess = self.vertices[end_slot].excess;
        let delta = if edge.flow <= excess {
            edge.flow
        } else {
            self.vertices[end_slot].previous_edge();
            excess
        };
        self.edge_mut(e).flow -= delta;
        if !self.vertices[start_slot].is_source {
            self.vertices[start_slot].excess += delta;
        }
        self.vertices[end_slot].excess -= delta;
        if previous_excess == Flow::zero() && delta > Flow::zero() {
            self.vertices[start_slot].dead_end = false;
            Some(edge.start)
        } else {
            None
        }
    }

    pub fn out_flow(&self, id: usize) -> Flow {
        let slot = self.slot_of[&id];
        self.vertices[slot].neighbors.iter().fold(Flow::zero(), |sum, &e| sum + self.edge(e).flow)
    }

    pub fn in_flow(&self, id: usize) -> Flow {
        let slot = self.slot_of[&id];
        self.vertices[slot].res_neighbors.iter().fold(Flow::zero(), |sum, &e| sum + self.edge(e).flow)
    }

    // (start, end, capacity, flow) per edge, vertices in insertion order
    // and edges in insertion order within each vertex
    pub fn graph_data(&self) -> Vec<(usize, usize, Flow, Flow)> {
        let mut data = Vec::new();
        for vertex in &self.vertices {
            for &e in &vertex.neighbors {
                let edge = self.edge(e);
                data.push((edge.start, edge.end, edge.capacity, edge.flow));
            }
        }
        data
    }

    pub fn vertex_indices(&self) -> Vec<usize> {
        self.vertices.iter().map(|vertex| vertex.id).collect()
    }
}

impl<Flow> fmt::Display for Graph<Flow>
where
    Flow: NumAssign + Ord + Copy + fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for vertex in &self.vertices {
            write!(f, "Vertex {} (label {}):  ", vertex.id, vertex.label)?;
            for &e in &vertex.neighbors {
                write!(f, "{}  ", self.edge(e))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::Graph;

    fn diamond() -> Graph<i64> {
        // 0 -> {1,2} -> 3
        let mut graph = Graph::default();
        graph.add_edge(0, 1, 10);
        graph.add_edge(0, 2, 10);
        graph.add_edge(1, 3, 10);
        graph.add_edge(2, 3, 10);
        graph
    }

    #[test]
    fn add_edge_creates_missing_endpoints() {
        let mut graph: Graph<i64> = Graph::default();
        assert!(graph.add_edge(4, 7, 3));
        assert_eq!(graph.vertex_indices(), vec![4, 7]);
        assert!(graph.contains_edge(4, 7));
        assert!(!graph.contains_edge(7, 4));
    }

    #[test]
    fn duplicate_and_self_loop_edges_are_rejected() {
        let mut graph: Graph<i64> = Graph::default();
        assert!(graph.add_edge(0, 1, 5));
        assert!(!graph.add_edge(0, 1, 9));
        assert!(!graph.add_edge(2, 2, 1));
        assert_eq!(graph.num_edges(), 1);
        assert_eq!(graph.graph_data(), vec![(0, 1, 5, 0)]);
    }

    #[test]
    fn remove_vertex_unlinks_both_directions() {
        let mut graph = diamond();
        assert!(graph.remove_vertex(1));
        assert_eq!(graph.vertex_indices(), vec![0, 2, 3]);
        assert_eq!(graph.num_edges(), 2);
        assert!(!graph.contains_edge(0, 1));
        assert!(!graph.contains_edge(1, 3));
        assert_eq!(graph.graph_data(), vec![(0, 2, 10, 0), (2, 3, 10, 0)]);
    }

    #[test]
    fn removed_edge_slots_are_reused() {
        let mut graph = diamond();
        assert_eq!(graph.num_edges(), 4);
        assert!(graph.remove_edge(0, 2));
        assert_eq!(graph.num_edges(), 3);
        assert!(graph.add_edge(3, 0, 2));
        assert_eq!(graph.num_edges(), 4);
        assert!(graph.contains_edge(3, 0));
    }

    #[test]
    fn residual_graph_mirrors_adjacency() {
        let mut graph = diamond();
        graph.build_residual_graph();
        let sink = graph.vertex(3).unwrap();
        assert_eq!(sink.res_neighbors.len(), 2);
        let middle = graph.vertex(1).unwrap();
        assert_eq!(middle.res_neighbors.len(), 1);
    }

    #[test]
    fn layered_network_assigns_bfs_layers() {
        let mut graph = diamond();
        graph.build_residual_graph();
        let distance = graph.build_layered_network(0, 3);
        assert_eq!(distance, Some(2));
        assert_eq!(graph.vertex(0).unwrap().layer(), Some(0));
        assert_eq!(graph.vertex(1).unwrap().layer(), Some(1));
        assert_eq!(graph.vertex(2).unwrap().layer(), Some(1));
        assert_eq!(graph.vertex(3).unwrap().layer(), Some(2));
    }

    #[test]
    fn layered_network_reports_unreachable_sink() {
        let mut graph: Graph<i64> = Graph::default();
        graph.add_edge(0, 1, 5);
        graph.add_vertex(9);
        graph.build_residual_graph();
        assert_eq!(graph.build_layered_network(0, 9), None);
    }

    #[test]
    fn initial_push_saturates_source_edges() {
        let mut graph = diamond();
        graph.build_residual_graph();
        graph.reset_excesses(0);
        graph.initialize_labels(0);
        let queue_length = graph.initial_push(0, 3);
        assert_eq!(queue_length, 2);
        assert_eq!(graph.out_flow(0), 20);
        assert_eq!(graph.vertex(1).unwrap().excess, 10);
        assert_eq!(graph.vertex(2).unwrap().excess, 10);
        assert_eq!(graph.vertex(0).unwrap().label(), 4);
    }

    #[test]
    fn search_finds_a_layered_path_and_updates_flow() {
        let mut graph = diamond();
        graph.reset_flow();
        graph.build_residual_graph();
        assert_eq!(graph.build_layered_network(0, 3), Some(2));
        assert!(graph.search_augmenting_path(0, 3));
        assert_eq!(graph.update_min_flow_increment(), 10);
        assert_eq!(graph.out_flow(0), 10);
        assert!(graph.search_augmenting_path(0, 3));
        assert_eq!(graph.update_min_flow_increment(), 10);
        assert!(!graph.search_augmenting_path(0, 3));
        assert_eq!(graph.out_flow(0), 20);
        assert_eq!(graph.in_flow(3), 20);
    }
}
