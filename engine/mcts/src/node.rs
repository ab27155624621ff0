//! MCTS tree node representation.
//!
//! Each node represents a position reached by playing `action` from the
//! parent. Values are stored from the perspective of `mover`, the player who
//! played that action, so a high mean value means the move into this node was
//! good for whoever chose it.

use games_tictactoe::{Player, Position, StateKey};

/// Index into the node arena. Using a newtype for type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub const NONE: NodeId = NodeId(u32::MAX);

    pub fn is_none(self) -> bool {
        self == Self::NONE
    }

    pub fn is_some(self) -> bool {
        !self.is_none()
    }
}

/// A node in the MCTS tree.
#[derive(Debug, Clone)]
pub struct MctsNode {
    /// Canonical key of the position at this node
    pub key: StateKey,

    /// Parent node index (NONE for root). Fixed at creation.
    pub parent: NodeId,

    /// Move that led to this node from parent (None for root)
    pub action: Option<Position>,

    /// Player who played `action` (None for root)
    pub mover: Option<Player>,

    /// Player to move at this node
    pub to_move: Player,

    /// Moves between the search root and this position. Every route to a
    /// position has the same length, so transpositions agree on it.
    pub depth: u32,

    /// Number of iterations that passed through this node, including the
    /// one that created it. Never zero.
    pub visit_count: u32,

    /// Sum of rewards backpropagated through this node, from `mover`'s view.
    /// Q = value_sum / visit_count
    pub value_sum: f32,

    /// Whether the position is terminal (won or drawn)
    pub is_terminal: bool,

    /// Children: Vec of (move, NodeId) pairs in expansion order.
    pub children: Vec<(Position, NodeId)>,

    /// Legal moves not yet materialised as children.
    pub untried: Vec<Position>,
}

impl MctsNode {
    /// Create a new root node.
    pub fn new_root(key: StateKey, to_move: Player, legal_moves: Vec<Position>) -> Self {
        Self {
            key,
            parent: NodeId::NONE,
            action: None,
            mover: None,
            to_move,
            depth: 0,
            visit_count: 1,
            value_sum: 0.0,
            is_terminal: legal_moves.is_empty(),
            children: Vec::new(),
            untried: legal_moves,
        }
    }

    /// Create a new child node. The expansion itself counts as the first visit.
    pub fn new_child(
        parent: NodeId,
        action: Position,
        mover: Player,
        depth: u32,
        key: StateKey,
        legal_moves: Vec<Position>,
    ) -> Self {
        Self {
            key,
            parent,
            action: Some(action),
            mover: Some(mover),
            to_move: mover.opponent(),
            depth,
            visit_count: 1,
            value_sum: 0.0,
            is_terminal: legal_moves.is_empty(),
            children: Vec::new(),
            untried: legal_moves,
        }
    }

    /// Calculate mean value Q = value_sum / visit_count.
    #[inline]
    pub fn mean_value(&self) -> f32 {
        self.value_sum / self.visit_count.max(1) as f32
    }

    /// Mean value seen from `player`'s side of the board.
    #[inline]
    pub fn value_for(&self, player: Player) -> f32 {
        match self.mover {
            Some(mover) if mover != player => -self.mean_value(),
            _ => self.mean_value(),
        }
    }

    /// Exploration term `c * sqrt(ln(N_parent) / N)`.
    #[inline]
    pub fn exploration_term(&self, parent_visits_ln: f32, c: f32) -> f32 {
        c * (parent_visits_ln / self.visit_count.max(1) as f32).sqrt()
    }

    /// Upper confidence bound from `player`'s perspective.
    /// UCB = Q + c * sqrt(ln(N_parent) / N)
    ///
    /// Takes pre-computed ln(parent_visits) to avoid recomputing it for
    /// every sibling.
    #[inline]
    pub fn ucb_score(&self, player: Player, parent_visits_ln: f32, c: f32) -> f32 {
        self.value_for(player) + self.exploration_term(parent_visits_ln, c)
    }

    /// Lower confidence bound from `player`'s perspective.
    /// LCB = Q - c * sqrt(ln(N_parent) / N)
    #[inline]
    pub fn lcb_score(&self, player: Player, parent_visits_ln: f32, c: f32) -> f32 {
        self.value_for(player) - self.exploration_term(parent_visits_ln, c)
    }

    /// A node is fully expanded once every legal move has a child.
    #[inline]
    pub fn is_fully_expanded(&self) -> bool {
        self.untried.is_empty()
    }

    /// Check if this is a frontier node (some legal move is still untried).
    #[inline]
    pub fn is_frontier(&self) -> bool {
        !self.is_terminal && !self.untried.is_empty()
    }

    /// Add `reward` (already expressed for `mover`) and optionally count a visit.
    #[inline]
    pub fn record(&mut self, reward: f32, count_visit: bool) {
        if count_visit {
            self.visit_count += 1;
        }
        self.value_sum += reward;
    }
}
