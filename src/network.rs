use crate::event::{ChangeEvent, Subscriber};
use crate::graph::Graph;
use log::debug;
use num_traits::NumAssign;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::fs;
use std::path::Path;

#[derive(Serialize, Deserialize)]
pub struct FlowNetwork<Flow> {
    source: Option<usize>,
    sink: Option<usize>,
    graph: Graph<Flow>,
    max_flow: Flow,
    #[serde(skip)]
    prompt: String,
    #[serde(skip)]
    update_graph: bool,
    #[serde(skip)]
    draw_graph: bool,
    #[serde(skip)]
    subscribers: Vec<Subscriber>,
}

impl<Flow> FlowNetwork<Flow>
where
    Flow: NumAssign + Ord + Copy + Display,
{
    pub fn new() -> Self {
        FlowNetwork {
            source: None,
            sink: None,
            graph: Graph::default(),
            max_flow: Flow::zero(),
            prompt: String::new(),
            update_graph: false,
            draw_graph: false,
            subscribers: Vec::new(),
        }
    }

    // Every subscriber is called once per mutating operation with a
    // snapshot of the dirty flags.
    pub fn subscribe(&mut self, subscriber: impl FnMut(ChangeEvent) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn notify(&mut self) {
        let event = ChangeEvent { update_graph: self.update_graph, draw_graph: self.draw_graph };
        for subscriber in &mut self.subscribers {
            subscriber(event);
        }
    }

    pub fn add_vertex(&mut self, id: usize) -> bool {
        let added = self.graph.add_vertex(id);
        self.prompt = if added {
            format!("Vertex {id} added to Graph.")
        } else {
            format!("Vertex {id} already exists in Graph.")
        };
        self.update_graph = true;
        self.draw_graph = true;
        self.notify();
        added
    }

    pub fn remove_vertex(&mut self, id: usize) -> bool {
        let mut removed = false;
        if self.graph.contains_vertex(id) {
            self.graph.remove_vertex(id);
            if self.source == Some(id) {
                self.source = None;
            }
            if self.sink == Some(id) {
                self.sink = None;
            }
            self.prompt = format!("Vertex {id} removed from graph.");
            removed = true;
        } else {
            self.prompt = format!("Graph does not contain vertex {id}.");
        }
        self.update_graph = true;
        self.draw_graph = true;
        self.notify();
        removed
    }

    // Missing endpoints are created along with the edge.
    pub fn add_edge(&mut self, start: usize, end: usize, capacity: Flow) -> bool {
        let mut added = false;
        if capacity < Flow::one() {
            self.prompt =
                "Capacity has to be an integer larger than zero.\n(use a positive integer: 1,2,3,4,...)".to_string();
        } else if start == end {
            self.prompt = "Vertex identifiers have to be different.".to_string();
        } else {
            added = self.graph.add_edge(start, end, capacity);
            self.prompt = if added {
                format!("Edge ({start},{end}) added to Graph.")
            } else {
                format!("Edge ({start},{end}) not added to Graph.")
            };
        }
        self.update_graph = true;
        self.draw_graph = true;
        self.notify();
        added
    }

    pub fn remove_edge(&mut self, start: usize, end: usize) -> bool {
        let removed = self.graph.remove_edge(start, end);
        self.prompt = if removed {
            format!("Edge ({start},{end}) removed from Graph.")
        } else {
            format!("Edge ({start},{end}) not removed from Graph.")
        };
        self.update_graph = true;
        self.draw_graph = true;
        self.notify();
        removed
    }

    // Choosing the current sink as source clears the sink, so both
    // designations never coincide.
    pub fn set_source(&mut self, id: usize) -> bool {
        self.graph.add_vertex(id);
        self.source = Some(id);
        if self.sink == Some(id) {
            self.sink = None;
            self.prompt =
                format!("Source vertex set to be vertex {id}.\nSource and sink vertex have to be different.");
        } else {
            self.prompt = format!("Source vertex set to be vertex {id}.");
        }
        self.update_graph = true;
        self.draw_graph = true;
        self.notify();
        true
    }

    pub fn set_sink(&mut self, id: usize) -> bool {
        self.graph.add_vertex(id);
        self.sink = Some(id);
        if self.source == Some(id) {
            self.source = None;
            self.prompt =
                format!("Sink vertex set to be vertex {id}.\nSource and sink vertex have to be different.");
        } else {
            self.prompt = format!("Sink vertex set to be vertex {id}.");
        }
        self.update_graph = true;
        self.draw_graph = true;
        self.notify();
        true
    }

    #[inline]
    pub fn source(&self) -> Option<usize> {
        self.source
    }

    #[inline]
    pub fn sink(&self) -> Option<usize> {
        self.sink
    }

    #[inline]
    pub fn maximum_flow(&self) -> Flow {
        self.max_flow
    }

    // Blocking-flow algorithm: rebuild the layered network whenever the
    // depth-first search runs dry, stop once the sink is unreachable.
    pub fn dinic(&mut self) -> Flow {
        self.max_flow = Flow::zero();
        if let (Some(source), Some(sink)) = (self.source, self.sink) {
            debug!("dinic: source {source}, sink {sink}");
            self.graph.reset_flow();
            self.graph.build_residual_graph();
            let mut distance = self.graph.build_layered_network(source, sink);
            while distance.is_some() {
                if self.graph.search_augmenting_path(source, sink) {
                    self.max_flow += self.graph.update_min_flow_increment();
                } else {
                    distance = self.graph.build_layered_network(source, sink);
                }
            }
            debug!("dinic: maximum flow {}", self.max_flow);
            self.prompt = format!("Dinic: maximum flow F={}.", self.max_flow);
            self.update_graph = true;
            self.draw_graph = false;
        } else {
            self.prompt = format!("Dinic: maximum flow F={}.\n(No valid source or sink)", self.max_flow);
            self.update_graph = false;
            self.draw_graph = false;
        }
        self.notify();
        self.max_flow
    }

    // Push-relabel with a FIFO queue of active vertices.
    pub fn goldberg_tarjan(&mut self) -> Flow {
        self.max_flow = Flow::zero();
        if let (Some(source), Some(sink)) = (self.source, self.sink) {
            debug!("goldberg-tarjan: source {source}, sink {sink}");
            self.graph.reset_flow();
            self.graph.build_residual_graph();
            self.graph.reset_excesses(source);
            self.graph.initialize_labels(source);
            let mut queue_length = self.graph.initial_push(source, sink);
            while queue_length > 0 {
                queue_length = self.graph.discharge_queue();
            }
            self.max_flow = self.graph.out_flow(source) - self.graph.in_flow(source);
            debug!("goldberg-tarjan: maximum flow {}", self.max_flow);
            self.prompt = format!("Goldberg-Tarjan: maximum flow F={}.", self.max_flow);
            self.update_graph = true;
            self.draw_graph = false;
        } else {
            self.prompt = format!("Goldberg-Tarjan: maximum flow F={}.\n(No valid source or sink)", self.max_flow);
            self.update_graph = false;
            self.draw_graph = false;
        }
        self.notify();
        self.max_flow
    }

    pub fn reset_network(&mut self) {
        self.source = None;
        self.sink = None;
        self.graph = Graph::default();
        self.max_flow = Flow::zero();
        self.prompt = "Flow network reset.".to_string();
        self.update_graph = true;
        self.draw_graph = true;
        self.notify();
    }

    pub fn save_network(&mut self, path: &Path) -> bool
    where
        Flow: Serialize,
    {
        let mut saved = false;
        match serde_json::to_string(&*self) {
            Ok(text) => match fs::write(path, text) {
                Ok(()) => {
                    self.prompt = format!("Flow network saved ({}).", file_name(path));
                    saved = true;
                }
                Err(error) => {
                    debug!("save failed: {error}");
                    self.prompt = "Flow network not saved (I/O error).".to_string();
                }
            },
            Err(error) => {
                debug!("save failed: {error}");
                self.prompt = "Flow network not saved (encoding error).".to_string();
            }
        }
        self.update_graph = false;
        self.draw_graph = false;
        self.notify();
        saved
    }

    // On failure the network is left untouched; the loaded file's
    // presentation state (prompt, dirty flags) is not adopted.
    pub fn load_network(&mut self, path: &Path) -> bool
    where
        Flow: DeserializeOwned,
    {
        let mut loaded = false;
        match fs::read_to_string(path) {
            Ok(text) => match serde_json::from_str::<FlowNetwork<Flow>>(&text) {
                Ok(stored) => {
                    self.source = stored.source;
                    self.sink = stored.sink;
                    self.graph = stored.graph;
                    self.max_flow = stored.max_flow;
                    self.prompt = format!("Flow network loaded ({}).", file_name(path));
                    loaded = true;
                }
                Err(error) => {
                    debug!("load failed: {error}");
                    self.prompt = "Flow network not loaded (parse error).".to_string();
                }
            },
            Err(error) => {
                debug!("load failed: {error}");
                self.prompt = "Flow network not loaded (I/O error).".to_string();
            }
        }
        self.update_graph = true;
        self.draw_graph = true;
        self.notify();
        loaded
    }

    #[inline]
    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn display_flow_network(&self) -> String {
        let mut text = String::new();
        text.push_str("FLOW NETWORK\n");
        text.push_str("============\n");
        match self.source {
            Some(id) => text.push_str(&format!("Source vertex: {id}\n")),
            None => text.push_str("Source vertex: -\n"),
        }
        match self.sink {
            Some(id) => text.push_str(&format!("Sink vertex: {id}\n")),
            None => text.push_str("Sink vertex: -\n"),
        }
        if self.max_flow > Flow::zero() {
            text.push_str(&format!("Maximum flow: {}\n", self.max_flow));
        } else {
            text.push_str("Maximum flow: -\n");
        }
        text.push_str("---------------------------------------------------------------\n");
        text.push_str(&self.graph.to_string());
        text
    }

    #[inline]
    pub fn graph_data(&self) -> Vec<(usize, usize, Flow, Flow)> {
        self.graph.graph_data()
    }

    #[inline]
    pub fn vertex_indices(&self) -> Vec<usize> {
        self.graph.vertex_indices()
    }

    pub fn update_graph(&mut self) {
        self.update_graph = true;
        self.draw_graph = false;
        self.notify();
    }

    #[inline]
    pub fn is_update_graph(&self) -> bool {
        self.update_graph
    }

    pub fn draw_graph(&mut self) {
        self.update_graph = true;
        self.draw_graph = true;
        self.notify();
    }

    #[inline]
    pub fn is_draw_graph(&self) -> bool {
        self.draw_graph
    }
}

impl<Flow> Default for FlowNetwork<Flow>
where
    Flow: NumAssign + Ord + Copy + Display,
{
    fn default() -> Self {
        FlowNetwork::new()
    }
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap_or(path.as_os_str()).to_string_lossy().into_owned()
}
