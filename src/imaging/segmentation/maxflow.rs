//! Dinic max-flow over a forward-star graph with a source and a sink.
//!
//! Arcs are stored in pairs: arc `e` and its reverse `e ^ 1`. Residual
//! capacity lives on each arc; pushing flow along `e` moves capacity to `e ^ 1`.

use std::collections::VecDeque;

const NONE: u32 = u32::MAX;

/// Flows smaller than this are treated as zero.
const EPS: f64 = 1e-9;

#[derive(Debug)]
pub(crate) struct FlowGraph {
    source: usize,
    sink: usize,
    head: Vec<u32>,
    next: Vec<u32>,
    to: Vec<u32>,
    capacity: Vec<f64>,
}

impl FlowGraph {
    /// A graph of `nodes` ordinary nodes plus a source and a sink.
    pub(crate) fn new(nodes: usize) -> Self {
        Self {
            source: nodes,
            sink: nodes + 1,
            head: vec![NONE; nodes + 2],
            next: Vec::new(),
            to: Vec::new(),
            capacity: Vec::new(),
        }
    }

    fn push_arc(&mut self, from: usize, to: usize, capacity: f64) {
        let id = self.to.len() as u32;
        self.to.push(to as u32);
        self.capacity.push(capacity);
        self.next.push(self.head[from]);
        self.head[from] = id;
    }

    /// Link two nodes with `forward` capacity one way and `backward` the other.
    pub(crate) fn add_edge(&mut self, a: usize, b: usize, forward: f64, backward: f64) {
        self.push_arc(a, b, forward);
        self.push_arc(b, a, backward);
    }

    /// Connect a node to the terminals.
    ///
    /// Only the net difference is stored: a node tied to both terminals
    /// carries the common part straight through, so it never affects the cut.
    pub(crate) fn add_terminal(&mut self, node: usize, from_source: f64, to_sink: f64) {
        let delta = from_source - to_sink;
        if delta > 0.0 {
            self.add_edge(self.source, node, delta, 0.0);
        } else if delta < 0.0 {
            self.add_edge(node, self.sink, -delta, 0.0);
        }
    }

    fn levels(&self) -> Option<Vec<u32>> {
        let mut level = vec![NONE; self.head.len()];
        level[self.source] = 0;
        let mut queue = VecDeque::from([self.source]);
        while let Some(u) = queue.pop_front() {
            let mut e = self.head[u];
            while e != NONE {
                let v = self.to[e as usize] as usize;
                if level[v] == NONE && self.capacity[e as usize] > EPS {
                    level[v] = level[u] + 1;
                    queue.push_back(v);
                }
                e = self.next[e as usize];
            }
        }
        (level[self.sink] != NONE).then_some(level)
    }

    /// Find and saturate augmenting paths in the level graph until none remain.
    fn blocking_flow(&mut self, level: &[u32]) -> f64 {
        let mut cursor = self.head.clone();
        let mut path: Vec<u32> = Vec::new();
        let mut total = 0.0;
        let mut u = self.source;

        loop {
            if u == self.sink {
                let bottleneck = path
                    .iter()
                    .map(|&e| self.capacity[e as usize])
                    .fold(f64::INFINITY, f64::min);
                for &e in &path {
                    self.capacity[e as usize] -= bottleneck;
                    self.capacity[(e ^ 1) as usize] += bottleneck;
                }
                total += bottleneck;
                // Restart from the tail of the first saturated arc
                let cut = path
                    .iter()
                    .position(|&e| self.capacity[e as usize] <= EPS)
                    .unwrap_or(0);
                path.truncate(cut);
                u = match path.last() {
                    Some(&e) => self.to[e as usize] as usize,
                    None => self.source,
                };
                continue;
            }

            let mut advanced = false;
            while cursor[u] != NONE {
                let e = cursor[u];
                let v = self.to[e as usize] as usize;
                if self.capacity[e as usize] > EPS && level[v] == level[u] + 1 {
                    path.push(e);
                    u = v;
                    advanced = true;
                    break;
                }
                cursor[u] = self.next[e as usize];
            }
            if advanced {
                continue;
            }

            // Dead end: retreat and skip the arc that led here
            match path.pop() {
                Some(e) => {
                    u = self.to[(e ^ 1) as usize] as usize;
                    cursor[u] = self.next[cursor[u] as usize];
                }
                None => return total,
            }
        }
    }

    /// Run max-flow to completion and return the flow value.
    pub(crate) fn maxflow(&mut self) -> f64 {
        let mut flow = 0.0;
        while let Some(level) = self.levels() {
            let pushed = self.blocking_flow(&level);
            if pushed <= EPS {
                break;
            }
            flow += pushed;
        }
        flow
    }

    /// Nodes still reachable from the source in the residual graph.
    pub(crate) fn source_side(&self) -> Vec<bool> {
        let mut seen = vec![false; self.head.len()];
        seen[self.source] = true;
        let mut queue = VecDeque::from([self.source]);
        while let Some(u) = queue.pop_front() {
            let mut e = self.head[u];
            while e != NONE {
                let v = self.to[e as usize] as usize;
                if !seen[v] && self.capacity[e as usize] > EPS {
                    seen[v] = true;
                    queue.push_back(v);
                }
                e = self.next[e as usize];
            }
        }
        seen.truncate(self.source);
        seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chain_bottleneck() {
        let mut g = FlowGraph::new(2);
        g.add_terminal(0, 5.0, 0.0);
        g.add_edge(0, 1, 3.0, 0.0);
        g.add_terminal(1, 0.0, 4.0);
        assert!((g.maxflow() - 3.0).abs() < 1e-9);
        assert_eq!(g.source_side(), vec![true, false]);
    }

    #[test]
    fn classic_network() {
        // s→0:10, s→1:10, 0→1:2, 0→2:4, 0→3:8, 1→3:9, 3→2:6, 2→t:10, 3→t:10
        let mut g = FlowGraph::new(4);
        g.add_terminal(0, 10.0, 0.0);
        g.add_terminal(1, 10.0, 0.0);
        g.add_edge(0, 1, 2.0, 0.0);
        g.add_edge(0, 2, 4.0, 0.0);
        g.add_edge(0, 3, 8.0, 0.0);
        g.add_edge(1, 3, 9.0, 0.0);
        g.add_edge(3, 2, 6.0, 0.0);
        g.add_terminal(2, 0.0, 10.0);
        g.add_terminal(3, 0.0, 10.0);
        assert!((g.maxflow() - 19.0).abs() < 1e-9);
    }

    #[test]
    fn terminal_weights_are_netted() {
        let mut g = FlowGraph::new(1);
        g.add_terminal(0, 7.0, 3.0);
        assert!((g.maxflow() - 0.0).abs() < 1e-9);
        assert_eq!(g.source_side(), vec![true]);
    }

    #[test]
    fn disconnected_node_lands_on_sink_side() {
        let mut g = FlowGraph::new(3);
        g.add_terminal(0, 1.0, 0.0);
        g.add_edge(0, 1, 1.0, 1.0);
        assert_eq!(g.source_side(), vec![true, true, false]);
    }

    #[test]
    fn weak_link_is_cut() {
        // Two strongly-tied pairs joined by a weak edge
        let mut g = FlowGraph::new(4);
        g.add_terminal(0, 100.0, 0.0);
        g.add_edge(0, 1, 50.0, 50.0);
        g.add_edge(1, 2, 1.0, 1.0);
        g.add_edge(2, 3, 50.0, 50.0);
        g.add_terminal(3, 0.0, 100.0);
        assert!((g.maxflow() - 1.0).abs() < 1e-9);
        assert_eq!(g.source_side(), vec![true, true, false, false]);
    }
}
