//! The Earley chart (spec §3, §4.4): columns of states, one column per
//! token position, grounded on the teacher's `production`/`parsing`
//! bottom-up table idiom generalised to a full predict/scan/complete
//! engine (spec §9's redesign flag — the teacher's packrat-style table
//! does not support left recursion or ambiguity packing the way this
//! grammar needs).

mod parser;

pub use parser::parse;

use std::collections::HashMap;
use std::rc::Rc;

use crate::bnf::BnfRuleId;
use crate::predicate::Predicate;
use crate::relation::RelationGraph;
use crate::span::Span;
use crate::token::Token;

/// A fully-parsed piece of a match tree: either a single matched token or a
/// completed non-terminal with its own children (spec §4.4's `children`).
#[derive(Debug, Clone)]
pub enum ChartNode {
    Leaf { predicate: Rc<dyn Predicate>, token: Token },
    /// A run of tokens absorbed by a dictionary/phrase pipeline in one step,
    /// rather than one leaf per token (spec §4.3's pipeline rules).
    PipelineMatch { tokens: Vec<Token> },
    Node { rule: BnfRuleId, production: usize, rank: usize, children: Vec<ChartNode> },
}

impl ChartNode {
    pub fn span(&self) -> Span {
        match self {
            ChartNode::Leaf { token, .. } => token.span,
            ChartNode::PipelineMatch { tokens } => {
                let start = tokens.first().map(|t| t.span.start).unwrap_or(0);
                let stop = tokens.last().map(|t| t.span.stop).unwrap_or(0);
                Span::new(start, stop)
            }
            ChartNode::Node { children, .. } => {
                children.iter().map(|c| c.span()).reduce(|a, b| a.union(&b)).unwrap_or(Span::new(0, 0))
            }
        }
    }

    /// Every leaf token reachable under this node, in left-to-right order.
    pub fn tokens(&self) -> Vec<Token> {
        match self {
            ChartNode::Leaf { token, .. } => vec![token.clone()],
            ChartNode::PipelineMatch { tokens } => tokens.clone(),
            ChartNode::Node { children, .. } => children.iter().flat_map(|c| c.tokens()).collect(),
        }
    }
}

/// One Earley item: a partially (or fully) recognised production of `rule`,
/// anchored at `start` and currently reaching `stop`.
#[derive(Debug, Clone)]
pub struct State {
    pub rule: BnfRuleId,
    pub production: usize,
    pub dot: usize,
    pub start: usize,
    pub stop: usize,
    pub children: Vec<ChartNode>,
    pub relations: RelationGraph,
}

impl State {
    pub fn is_completed(&self, term_count: usize) -> bool {
        self.dot >= term_count
    }
}

/// One Earley column: every state currently anchored with `stop` equal to
/// this column's position, plus the bookkeeping spec §3/§4.4 calls for.
#[derive(Debug, Default)]
pub struct Column {
    pub states: Vec<State>,
    /// Dedup set keyed by `(rule, production, dot, start, stop)`; the value
    /// is every structural hash already seen for that key, so genuinely
    /// ambiguous derivations (different children) are kept side by side
    /// while exact duplicates are dropped (spec §4.4).
    seen: HashMap<(u32, usize, usize, usize, usize), Vec<u64>>,
    /// Non-terminals already predicted at this column, so `predict` expands
    /// each rule at most once per position.
    predicted: std::collections::HashSet<u32>,
    /// Maps a non-terminal to the indices (within this column) of states
    /// blocked on it — the wait-index of spec §3/§4.4.
    pub wait_index: HashMap<u32, Vec<usize>>,
    /// Completions of a rule whose production consumed no tokens at this
    /// column (`start == stop == this column`). A waiter that registers
    /// *after* such a completion already happened (the same nullable rule
    /// appearing twice in one production) would otherwise never be notified,
    /// since `complete_rule` only walks waiters registered so far.
    empty_completions: HashMap<u32, Vec<(ChartNode, RelationGraph)>>,
}

impl Column {
    /// Insert `state` if its `(key, structural hash)` pair hasn't been seen
    /// yet at this column. Returns the new state's index when inserted.
    pub fn insert(&mut self, state: State, hash: u64) -> Option<usize> {
        let key = (state.rule.0, state.production, state.dot, state.start, state.stop);
        let hashes = self.seen.entry(key).or_default();
        if hashes.contains(&hash) {
            return None;
        }
        hashes.push(hash);
        let index = self.states.len();
        self.states.push(state);
        Some(index)
    }

    pub fn mark_predicted(&mut self, rule: BnfRuleId) -> bool {
        self.predicted.insert(rule.0)
    }

    pub fn register_wait(&mut self, rule: BnfRuleId, state_index: usize) {
        self.wait_index.entry(rule.0).or_default().push(state_index);
    }

    pub fn waiting_on(&self, rule: BnfRuleId) -> Vec<usize> {
        self.wait_index.get(&rule.0).cloned().unwrap_or_default()
    }

    /// Record that `rule` completed with `start == stop == this column`
    /// (a nullable completion). A production referencing the same nullable
    /// rule twice registers its second wait *after* the first occurrence's
    /// completion already fired, and would otherwise never be told about
    /// it — `register_wait`'s caller replays these against any new waiter.
    pub fn record_empty_completion(&mut self, rule: BnfRuleId, node: ChartNode, relations: RelationGraph) {
        self.empty_completions.entry(rule.0).or_default().push((node, relations));
    }

    pub fn empty_completions_for(&self, rule: BnfRuleId) -> Vec<(ChartNode, RelationGraph)> {
        self.empty_completions.get(&rule.0).cloned().unwrap_or_default()
    }
}

/// The full sequence of columns produced by one parse (spec §3's `Chart`).
#[derive(Debug, Default)]
pub struct Chart {
    pub columns: Vec<Column>,
    /// Every satisfiable completion of the grammar's start rule, recorded as
    /// it completes regardless of whether any parent state was waiting on
    /// it (the start rule itself has no parent by definition).
    pub matches: Vec<ChartNode>,
}

impl Chart {
    pub fn new(token_count: usize) -> Self {
        Self { columns: (0..=token_count).map(|_| Column::default()).collect(), matches: Vec::new() }
    }
}
