use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;
use std::collections::HashMap;

use crate::domain::network_model::node::Node;
use crate::domain::utils::id::NodeId;

/// Parameters of the Poisson-shaped scoring curve of one node pair.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LambdaCfg {
    pub lambda: f64,

    /// Normalisation so that the curve peaks at roughly 1.
    pub max_for_lambda: f64,
}

impl Default for LambdaCfg {
    fn default() -> Self {
        Self { lambda: 2.84777403440728, max_for_lambda: 0.6831071864140762 }
    }
}

impl LambdaCfg {
    /// `exp(-λ)·λ^s / (Γ(s)·max)` for `s > 0`, zero otherwise.
    ///
    /// Evaluated in log space, `Γ(s)` and `λ^s` overflow long before the quotient does.
    pub fn score(&self, shared_entanglement: f64) -> f64 {
        if shared_entanglement <= 0.0 {
            return 0.0;
        }

        let ln_score = -self.lambda + shared_entanglement * self.lambda.ln() - ln_gamma(shared_entanglement);
        ln_score.exp() / self.max_for_lambda
    }
}

/// Unordered pair of nodes, stored with the smaller node name first.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodePair {
    first: NodeId,
    second: NodeId,
    entanglement_fidelity_capacity: f64,
}

impl NodePair {
    pub fn new(a: &Node, b: &Node) -> Self {
        let (first, second) = if a.name() <= b.name() { (a, b) } else { (b, a) };

        Self {
            first: first.id(),
            second: second.id(),
            entanglement_fidelity_capacity: first.params().entanglement_fidelity_capacity.min(second.params().entanglement_fidelity_capacity),
        }
    }

    /// Canonical lookup key of two node ids. Ids follow name order, so this is the same
    /// ordering `NodePair::new` applies to names.
    pub fn key(a: NodeId, b: NodeId) -> (NodeId, NodeId) {
        if a <= b { (a, b) } else { (b, a) }
    }

    pub fn first(&self) -> NodeId {
        self.first
    }

    pub fn second(&self) -> NodeId {
        self.second
    }

    pub fn entanglement_fidelity_capacity(&self) -> f64 {
        self.entanglement_fidelity_capacity
    }
}

/// Mutable per-pair statistics of a network: the accumulated shared entanglement and the
/// scoring parameters of every node pair.
///
/// Kept apart from the schedules so the tick engine can hand it to Store instructions
/// while the schedules are borrowed.
#[derive(Debug, Clone, PartialEq)]
pub struct EntanglementLedger {
    pairs: Vec<NodePair>,
    index: HashMap<(NodeId, NodeId), usize>,
    lambda_cfgs: Vec<LambdaCfg>,
    shared_entanglement: Vec<f64>,
}

impl EntanglementLedger {
    /// One entry for every unordered pair of distinct nodes. `nodes` must be in id order.
    pub fn new(nodes: &[Node], lambda_cfg: LambdaCfg) -> Self {
        let n_nodes = nodes.len();
        let n_pairs = n_nodes * n_nodes.saturating_sub(1) / 2;

        let mut pairs = Vec::with_capacity(n_pairs);
        let mut index = HashMap::with_capacity(n_pairs);

        for i in 0..n_nodes {
            for j in (i + 1)..n_nodes {
                let pair = NodePair::new(&nodes[i], &nodes[j]);
                debug_assert_eq!((pair.first(), pair.second()), NodePair::key(nodes[i].id(), nodes[j].id()), "Node ids must follow name order.");

                index.insert((pair.first(), pair.second()), pairs.len());
                pairs.push(pair);
            }
        }

        Self { lambda_cfgs: vec![lambda_cfg; pairs.len()], shared_entanglement: vec![0.0; pairs.len()], pairs, index }
    }

    pub fn pairs(&self) -> &[NodePair] {
        &self.pairs
    }

    pub fn lambda_cfg(&self, a: NodeId, b: NodeId) -> Option<LambdaCfg> {
        self.index.get(&NodePair::key(a, b)).map(|&i| self.lambda_cfgs[i])
    }

    pub fn shared_entanglement(&self, a: NodeId, b: NodeId) -> Option<f64> {
        self.index.get(&NodePair::key(a, b)).map(|&i| self.shared_entanglement[i])
    }

    /// Adds `entanglement` to the pair {a, b}. Returns `false` if the two ids do not form
    /// a tracked pair (same node, or unknown id).
    pub fn add_shared_entanglement(&mut self, a: NodeId, b: NodeId, entanglement: f64) -> bool {
        match self.index.get(&NodePair::key(a, b)) {
            Some(&i) => {
                self.shared_entanglement[i] += entanglement;
                true
            }
            None => false,
        }
    }

    /// Loss between two ticks, every accumulator shrinks by its pair's fidelity capacity.
    pub fn decay(&mut self) {
        for (shared, pair) in self.shared_entanglement.iter_mut().zip(&self.pairs) {
            *shared *= pair.entanglement_fidelity_capacity;
        }
    }

    pub fn reset(&mut self) {
        self.shared_entanglement.iter_mut().for_each(|shared| *shared = 0.0);
    }

    pub fn amount_entanglement(&self) -> f64 {
        self.shared_entanglement.iter().zip(&self.lambda_cfgs).map(|(shared, lambda_cfg)| lambda_cfg.score(*shared)).sum()
    }

    pub fn total_entanglement(&self) -> f64 {
        self.shared_entanglement.iter().sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_score_is_zero_without_entanglement() {
        let cfg = LambdaCfg::default();

        assert_eq!(cfg.score(0.0), 0.0);
        assert_eq!(cfg.score(-3.5), 0.0);
    }

    #[test]
    fn test_score_matches_poisson_shape() {
        let cfg = LambdaCfg { lambda: 2.0, max_for_lambda: 1.0 };

        // Γ(3) = 2, so the score at s = 3 is e^-2 · 2^3 / 2.
        assert_relative_eq!(cfg.score(3.0), (-2.0f64).exp() * 4.0, epsilon = 1e-12);
        // Γ(1) = 1.
        assert_relative_eq!(cfg.score(1.0), (-2.0f64).exp() * 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_score_stays_finite_for_large_accumulators() {
        let cfg = LambdaCfg::default();

        for shared in [171.0, 172.0, 700.0, 1e4, 1e7] {
            let score = cfg.score(shared);
            assert!(score.is_finite(), "score({}) = {}", shared, score);
            assert!((0.0..1e-12).contains(&score), "score({}) = {}", shared, score);
        }
    }

    #[test]
    fn test_default_lambda_peaks_near_one() {
        let cfg = LambdaCfg::default();
        let peak = (1..400).map(|i| cfg.score(i as f64 * 0.025)).fold(0.0, f64::max);

        assert!(peak > 0.9 && peak < 1.1, "peak was {}", peak);
    }
}
