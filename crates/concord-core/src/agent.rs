//! The per-agent solver state machine.
//!
//! Each `SolverAgent` is one autonomous participant in the distributed
//! Conflict-Based Search: it owns a replica of the constraint tree frontier
//! (its OPEN set), an incumbent, and a FIFO inbox, and talks to its peers
//! exclusively through typed messages. No agent ever sees another agent's
//! search tree.
//!
//! The lifecycle is Init → InProgress → Done:
//!
//! - **Init**: unconstrained paths are exchanged until every row of the
//!   root solution is known, then the root CT node is pushed.
//! - **InProgress**: every `act` call drains the inbox, performs exactly
//!   one bounded CT expansion step, and re-checks the termination
//!   consensus.
//! - **Done**: terminal; `act` is a no-op.
//!
//! The distribution invariant: an agent only ever branches on conflicts in
//! which it is the *first* party. The second party grows its mirror branch
//! when the conflict message arrives, so each conflict is branched by
//! exactly the two agents involved, each constraining itself.

use std::collections::{BTreeMap, VecDeque};
use std::sync::Arc;

use tracing::{debug, info};

use concord_contracts::{
    agent::AgentId,
    constraint::{Conflict, Constraint},
    error::{ConcordError, ConcordResult},
    message::{Envelope, Message},
    path::Location,
    problem::MapfProblem,
    solution::{CtNode, Incumbent, JointSolution},
};

use crate::open::OpenList;
use crate::traits::PathPlanner;

/// Lifecycle state of a solver agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentLifecycle {
    /// Exchanging initial paths; the root solution is still incomplete.
    Init,
    /// Expanding the local constraint tree and trading conflicts.
    InProgress,
    /// Termination consensus reached; the incumbent is final.
    Done,
}

/// Cost-and-owner fingerprint of an incumbent, the unit of consensus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct IncumbentSummary {
    cost: usize,
    owner: AgentId,
}

fn summarize(incumbent: &Incumbent) -> IncumbentSummary {
    IncumbentSummary {
        cost: incumbent.cost(),
        owner: incumbent.owner,
    }
}

/// Last known search state of a peer.
#[derive(Debug, Clone, PartialEq, Eq)]
enum PeerStatus {
    /// The peer has (or may have) unexpanded CT nodes.
    Searching,
    /// The peer announced an empty OPEN set, with this incumbent summary.
    Exhausted { incumbent: Option<IncumbentSummary> },
}

/// One autonomous solver process.
///
/// The driver-facing surface is exactly four operations: [`setup`],
/// [`receive_message`], [`act`], and [`is_done`]; everything else is
/// internal. The same contract holds whether the driver is the synchronous
/// round simulator or a real asynchronous message bus.
///
/// [`setup`]: SolverAgent::setup
/// [`receive_message`]: SolverAgent::receive_message
/// [`act`]: SolverAgent::act
/// [`is_done`]: SolverAgent::is_done
pub struct SolverAgent {
    id: AgentId,
    problem: Arc<MapfProblem>,
    planner: Arc<dyn PathPlanner>,

    inbox: VecDeque<Envelope>,
    lifecycle: AgentLifecycle,
    incumbent: Option<Incumbent>,

    /// Paths collected during Init, one row per agent once complete.
    root_solution: JointSolution,
    open: OpenList,

    /// Termination bookkeeping: what each peer last told us.
    peers: BTreeMap<AgentId, PeerStatus>,

    /// Conflict messages sent to each peer. An exhaustion report from a
    /// peer only counts when it accounts for all of these; anything less
    /// was produced before the last conflict arrived and is stale.
    conflicts_sent: BTreeMap<AgentId, u64>,

    /// Conflict messages received from each peer, echoed back inside
    /// every `DeclareEmptyOpen` so the peer can run the same staleness
    /// check.
    conflicts_received: BTreeMap<AgentId, u64>,

    /// The exhaustion state this agent last broadcast, if any. `None`
    /// means the next empty-OPEN step must announce; re-set whenever a
    /// conflict message puts the agent back to work.
    declared_exhaustion: Option<Option<IncumbentSummary>>,
}

impl SolverAgent {
    pub fn new(id: AgentId, problem: Arc<MapfProblem>, planner: Arc<dyn PathPlanner>) -> Self {
        Self {
            id,
            problem,
            planner,
            inbox: VecDeque::new(),
            lifecycle: AgentLifecycle::Init,
            incumbent: None,
            root_solution: JointSolution::new(),
            open: OpenList::new(),
            peers: BTreeMap::new(),
            conflicts_sent: BTreeMap::new(),
            conflicts_received: BTreeMap::new(),
            declared_exhaustion: None,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn lifecycle(&self) -> AgentLifecycle {
        self.lifecycle
    }

    pub fn is_done(&self) -> bool {
        self.lifecycle == AgentLifecycle::Done
    }

    /// The best valid joint solution this agent currently holds.
    pub fn incumbent(&self) -> Option<&Incumbent> {
        self.incumbent.as_ref()
    }

    /// Reset all state, plan this agent's own unconstrained path, and emit
    /// one path-exchange message per peer.
    ///
    /// Fails with `NoPathForAgent` when the agent cannot reach its goal at
    /// all, and with `InvalidProblem` when the agent id is not part of the
    /// problem; both surface before any distributed search begins.
    pub fn setup(&mut self) -> ConcordResult<Vec<Envelope>> {
        if self.problem.spec(self.id).is_none() {
            return Err(ConcordError::InvalidProblem {
                reason: format!("{} is not part of the problem", self.id),
            });
        }

        self.inbox.clear();
        self.incumbent = None;
        self.root_solution = JointSolution::new();
        self.open = OpenList::new();
        self.conflicts_sent = BTreeMap::new();
        self.conflicts_received = BTreeMap::new();
        self.declared_exhaustion = None;
        self.lifecycle = AgentLifecycle::Init;
        self.peers = self
            .problem
            .agent_ids()
            .filter(|&id| id != self.id)
            .map(|id| (id, PeerStatus::Searching))
            .collect();

        let own_path = self
            .planner
            .find_path(&self.problem, self.id, &[])
            .ok_or(ConcordError::NoPathForAgent { agent: self.id })?;

        debug!(agent = %self.id, cost = own_path.cost(), "planned unconstrained root path");
        self.root_solution.set_path(self.id, own_path.clone());

        Ok(self
            .peer_ids()
            .into_iter()
            .map(|to| {
                Envelope::new(
                    self.id,
                    to,
                    Message::PathForAgent {
                        path: own_path.clone(),
                    },
                )
            })
            .collect())
    }

    /// Queue an incoming message. FIFO: messages are handled in arrival
    /// order on the next `act`.
    pub fn receive_message(&mut self, envelope: Envelope) {
        self.inbox.push_back(envelope);
    }

    /// One bounded step of the agent: drain the inbox, expand at most one
    /// CT node, re-check termination. Always returns; never blocks on a
    /// peer.
    pub fn act(&mut self) -> ConcordResult<Vec<Envelope>> {
        match self.lifecycle {
            AgentLifecycle::Done => Ok(Vec::new()),
            AgentLifecycle::Init => {
                self.drain_init_messages()?;
                if self.root_solution.agent_count() < self.problem.agent_count() {
                    // Cannot search before the root solution is complete.
                    return Ok(Vec::new());
                }
                debug!(agent = %self.id, "root solution complete, starting constraint-tree search");
                self.open.push(CtNode::root(self.root_solution.clone()));
                self.lifecycle = AgentLifecycle::InProgress;
                self.step_in_progress()
            }
            AgentLifecycle::InProgress => self.step_in_progress(),
        }
    }

    // ── Init ─────────────────────────────────────────────────────────────

    /// Record every queued path exchange into the root solution, keeping
    /// all other messages buffered in arrival order. A sender outside the
    /// peer table would corrupt the root solution's row count, so it is a
    /// protocol violation here just as it is after Init.
    fn drain_init_messages(&mut self) -> ConcordResult<()> {
        let mut backlog = VecDeque::with_capacity(self.inbox.len());
        while let Some(envelope) = self.inbox.pop_front() {
            self.check_sender(&envelope)?;
            match envelope.payload {
                Message::PathForAgent { path } => {
                    self.root_solution.set_path(envelope.from, path);
                }
                _ => backlog.push_back(envelope),
            }
        }
        self.inbox = backlog;
        Ok(())
    }

    /// Every message must come from a known peer; anything else indicates
    /// a routing bug, never a search state.
    fn check_sender(&self, envelope: &Envelope) -> ConcordResult<()> {
        if self.peers.contains_key(&envelope.from) {
            Ok(())
        } else {
            Err(ConcordError::ProtocolViolation {
                reason: format!(
                    "{} received a {} message from unknown {}",
                    self.id,
                    envelope.payload.kind(),
                    envelope.from
                ),
            })
        }
    }

    // ── InProgress ───────────────────────────────────────────────────────

    fn step_in_progress(&mut self) -> ConcordResult<Vec<Envelope>> {
        let mut out = Vec::new();
        let mut adopted = false;

        while let Some(envelope) = self.inbox.pop_front() {
            self.handle_message(envelope, &mut adopted)?;
        }

        self.expand_once(&mut out, &mut adopted);
        self.try_finish(adopted);
        Ok(out)
    }

    fn handle_message(&mut self, envelope: Envelope, adopted: &mut bool) -> ConcordResult<()> {
        self.check_sender(&envelope)?;
        match envelope.payload {
            Message::PathForAgent { .. } => Err(ConcordError::ProtocolViolation {
                reason: format!(
                    "{} received a path exchange from {} after leaving Init",
                    self.id, envelope.from
                ),
            }),

            Message::DeclareSolution { incumbent } => {
                self.consider(incumbent, adopted);
                Ok(())
            }

            Message::DeclareConflict { ct_node, conflict } => {
                if conflict.agent2 != self.id {
                    return Err(ConcordError::ProtocolViolation {
                        reason: format!(
                            "{} received a conflict whose second party is {}",
                            self.id, conflict.agent2
                        ),
                    });
                }

                // The sender popped a node to detect this, so any earlier
                // exhaustion report from it is stale.
                self.peers.insert(envelope.from, PeerStatus::Searching);
                *self.conflicts_received.entry(envelope.from).or_insert(0) += 1;
                // This agent is searching again; re-announce when the OPEN
                // set next empties.
                self.declared_exhaustion = None;

                match self.branch(&ct_node, conflict.location, conflict.time_step) {
                    Some(child) => {
                        debug!(
                            agent = %self.id,
                            time_step = conflict.time_step,
                            cost = child.cost(),
                            "mirror branch created from peer conflict"
                        );
                        self.open.push(child);
                    }
                    None => {
                        debug!(
                            agent = %self.id,
                            time_step = conflict.time_step,
                            "mirror branch infeasible, pruned"
                        );
                    }
                }
                Ok(())
            }

            Message::DeclareEmptyOpen {
                incumbent,
                conflicts_seen,
            } => {
                let summary = incumbent.as_ref().map(summarize);
                if let Some(candidate) = incumbent {
                    self.consider(candidate, adopted);
                }

                // A report that does not account for every conflict sent
                // to this peer was produced before the last one arrived;
                // the peer is still working its mirror branch. Its
                // incumbent offer stands, its exhaustion claim does not.
                let sent = self.conflicts_sent.get(&envelope.from).copied().unwrap_or(0);
                if conflicts_seen < sent {
                    debug!(
                        agent = %self.id,
                        peer = %envelope.from,
                        conflicts_seen,
                        sent,
                        "stale exhaustion report ignored"
                    );
                    return Ok(());
                }

                self.peers
                    .insert(envelope.from, PeerStatus::Exhausted { incumbent: summary });
                Ok(())
            }
        }
    }

    /// Adopt `candidate` iff it orders strictly below the local incumbent.
    /// Re-declarations and worse candidates never change state.
    fn consider(&mut self, candidate: Incumbent, adopted: &mut bool) {
        let replaces = match &self.incumbent {
            Some(current) => candidate.orders_below(current),
            None => true,
        };
        if replaces {
            info!(
                agent = %self.id,
                cost = candidate.cost(),
                owner = %candidate.owner,
                "adopting incumbent"
            );
            self.incumbent = Some(candidate);
            *adopted = true;
        }
    }

    /// Exactly one CT expansion step: pop the cheapest node, maybe adopt it
    /// as incumbent, branch on the first self-owned conflict, and hand the
    /// conflict to its second party.
    fn expand_once(&mut self, out: &mut Vec<Envelope>, adopted: &mut bool) {
        let Some(node) = self.open.pop() else {
            self.announce_exhaustion(out);
            return;
        };

        if node.solution.is_valid() {
            let candidate = Incumbent::new(self.id, node.solution.clone());
            let improves = match &self.incumbent {
                Some(current) => candidate.orders_below(current),
                None => true,
            };
            if improves {
                info!(agent = %self.id, cost = candidate.cost(), "found new incumbent locally");
                self.incumbent = Some(candidate.clone());
                *adopted = true;
                for peer in self.peer_ids() {
                    out.push(Envelope::new(
                        self.id,
                        peer,
                        Message::DeclareSolution {
                            incumbent: candidate.clone(),
                        },
                    ));
                }
            }
        }

        let conflicts = self.find_conflicts(&node);
        let Some(conflict) = conflicts
            .into_iter()
            .min_by_key(|c| (c.time_step, c.agent2))
        else {
            // Valid or dead-ended with no self-owned conflict to branch on.
            return;
        };

        match self.branch(&node, conflict.location, conflict.time_step) {
            Some(child) => self.open.push(child),
            None => debug!(
                agent = %self.id,
                time_step = conflict.time_step,
                "own branch infeasible, pruned"
            ),
        }

        // The second party grows the mirror branch, so it is searching
        // again no matter what it reported before, and only an exhaustion
        // report acknowledging this conflict can say otherwise.
        self.peers.insert(conflict.agent2, PeerStatus::Searching);
        *self.conflicts_sent.entry(conflict.agent2).or_insert(0) += 1;
        out.push(Envelope::new(
            self.id,
            conflict.agent2,
            Message::DeclareConflict {
                ct_node: node,
                conflict,
            },
        ));
    }

    /// Broadcast the empty-OPEN declaration (and re-declare the incumbent,
    /// when one exists) unless the same exhaustion state was already
    /// announced.
    fn announce_exhaustion(&mut self, out: &mut Vec<Envelope>) {
        let summary = self.incumbent.as_ref().map(summarize);
        if self.declared_exhaustion.as_ref() == Some(&summary) {
            return;
        }

        debug!(
            agent = %self.id,
            has_incumbent = summary.is_some(),
            "OPEN set exhausted, announcing to peers"
        );

        if let Some(incumbent) = self.incumbent.clone() {
            for peer in self.peer_ids() {
                out.push(Envelope::new(
                    self.id,
                    peer,
                    Message::DeclareSolution {
                        incumbent: incumbent.clone(),
                    },
                ));
            }
        }

        let incumbent = self.incumbent.clone();
        for peer in self.peer_ids() {
            out.push(Envelope::new(
                self.id,
                peer,
                Message::DeclareEmptyOpen {
                    incumbent: incumbent.clone(),
                    conflicts_seen: self.conflicts_received.get(&peer).copied().unwrap_or(0),
                },
            ));
        }

        self.declared_exhaustion = Some(summary);
    }

    /// Transition to Done once nothing moved this step, the local OPEN is
    /// announced-empty, and every peer reported exhaustion with exactly the
    /// same incumbent summary (all `None` means the problem is infeasible).
    fn try_finish(&mut self, adopted: bool) {
        if adopted || !self.inbox.is_empty() || !self.open.is_empty() {
            return;
        }

        let mine = self.incumbent.as_ref().map(summarize);
        if self.declared_exhaustion.as_ref() != Some(&mine) {
            // Our own final word has not gone out yet.
            return;
        }

        let agreed = self.peers.values().all(|status| {
            matches!(status, PeerStatus::Exhausted { incumbent } if *incumbent == mine)
        });
        if !agreed {
            return;
        }

        info!(
            agent = %self.id,
            cost = ?mine.map(|s| s.cost),
            "termination consensus reached"
        );
        self.lifecycle = AgentLifecycle::Done;
    }

    // ── Conflict detection & branching ───────────────────────────────────

    /// All conflicts in `node` in which this agent is the first party, in
    /// (peer id, time step) detection order. Conflicts between two other
    /// agents are invisible here; each of those agents detects its own
    /// side.
    fn find_conflicts(&self, node: &CtNode) -> Vec<Conflict> {
        let Some(own) = node.solution.path(self.id) else {
            return Vec::new();
        };

        let mut conflicts = Vec::new();
        for (other, path) in node.solution.rows() {
            if other == self.id {
                continue;
            }
            let horizon = own.len().max(path.len());
            for t in 0..horizon {
                if own.location_at(t) == path.location_at(t) {
                    conflicts.push(Conflict {
                        location: own.location_at(t),
                        time_step: t,
                        agent1: self.id,
                        agent2: other,
                    });
                }
            }
        }
        conflicts
    }

    /// Generate this agent's child of `parent`: append one constraint on
    /// itself, replan its own path under the accumulated set, carry every
    /// other row over unchanged. `None` when replanning fails; the branch
    /// is pruned.
    fn branch(&self, parent: &CtNode, location: Location, time_step: usize) -> Option<CtNode> {
        let mut constraints = parent.constraints.clone();
        constraints.push(Constraint {
            agent: self.id,
            location,
            time_step,
        });

        let path = self.planner.find_path(&self.problem, self.id, &constraints)?;

        let mut solution = parent.solution.clone();
        solution.set_path(self.id, path);
        Some(CtNode { solution, constraints })
    }

    fn peer_ids(&self) -> Vec<AgentId> {
        self.peers.keys().copied().collect()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use concord_contracts::{
        path::Path,
        problem::{AgentSpec, SharedGraph},
    };

    use super::*;

    // ── Mock helpers ─────────────────────────────────────────────────────────

    /// A bidirectional corridor 0-1-...-(cells-1). Vertices 0/1/2 play the
    /// roles of A/B/C in the two-agent swap fixture.
    struct LineGraph {
        cells: u32,
    }

    impl SharedGraph for LineGraph {
        fn neighbors(&self, at: Location) -> Vec<Location> {
            let mut out = Vec::new();
            if at.0 > 0 {
                out.push(Location(at.0 - 1));
            }
            if at.0 + 1 < self.cells {
                out.push(Location(at.0 + 1));
            }
            out
        }
    }

    /// A planner scripted with exact (agent, constraint set) → path answers.
    /// Unscripted queries return `None`, i.e. the branch prunes.
    struct MockPlanner {
        routes: HashMap<(AgentId, Vec<Constraint>), Path>,
    }

    impl MockPlanner {
        fn new() -> Self {
            Self { routes: HashMap::new() }
        }

        fn route(mut self, agent: u32, constraints: Vec<Constraint>, steps: &[u32]) -> Self {
            let path = Path::new(steps.iter().map(|&v| Location(v)).collect());
            self.routes.insert((AgentId(agent), constraints), path);
            self
        }
    }

    impl PathPlanner for MockPlanner {
        fn find_path(
            &self,
            _problem: &MapfProblem,
            agent: AgentId,
            constraints: &[Constraint],
        ) -> Option<Path> {
            self.routes.get(&(agent, constraints.to_vec())).cloned()
        }
    }

    fn constraint(agent: u32, location: u32, time_step: usize) -> Constraint {
        Constraint {
            agent: AgentId(agent),
            location: Location(location),
            time_step,
        }
    }

    /// Swap fixture: a 3-cell line, agent 0 goes 0→2 and
    /// agent 1 goes 2→0. The scripted planner mirrors what the real
    /// space-time A* would answer.
    fn swap_problem() -> Arc<MapfProblem> {
        Arc::new(
            MapfProblem::new(
                Arc::new(LineGraph { cells: 3 }),
                vec![
                    AgentSpec {
                        id: AgentId(0),
                        start: Location(0),
                        goal: Location(2),
                    },
                    AgentSpec {
                        id: AgentId(1),
                        start: Location(2),
                        goal: Location(0),
                    },
                ],
            )
            .unwrap(),
        )
    }

    fn swap_planner() -> Arc<MockPlanner> {
        Arc::new(
            MockPlanner::new()
                .route(0, vec![], &[0, 1, 2])
                .route(1, vec![], &[2, 1, 0])
                // Constrained off the middle cell at t=1, each agent waits
                // one step at its start.
                .route(0, vec![constraint(0, 1, 1)], &[0, 0, 1, 2])
                .route(1, vec![constraint(1, 1, 1)], &[2, 2, 1, 0]),
        )
    }

    fn path(steps: &[u32]) -> Path {
        Path::new(steps.iter().map(|&v| Location(v)).collect())
    }

    fn peer_root_path_message() -> Envelope {
        Envelope::new(
            AgentId(1),
            AgentId(0),
            Message::PathForAgent { path: path(&[2, 1, 0]) },
        )
    }

    /// Agent 0 of the swap fixture, set up and fed agent 1's root path.
    fn agent_with_complete_root() -> SolverAgent {
        let mut agent = SolverAgent::new(AgentId(0), swap_problem(), swap_planner());
        agent.setup().unwrap();
        agent.receive_message(peer_root_path_message());
        agent
    }

    // ── Setup & Init ─────────────────────────────────────────────────────────

    #[test]
    fn setup_sends_own_path_to_every_peer() {
        let mut agent = SolverAgent::new(AgentId(0), swap_problem(), swap_planner());
        let out = agent.setup().unwrap();

        assert_eq!(out.len(), 1);
        assert_eq!(out[0].from, AgentId(0));
        assert_eq!(out[0].to, AgentId(1));
        match &out[0].payload {
            Message::PathForAgent { path: p } => assert_eq!(*p, path(&[0, 1, 2])),
            other => panic!("expected PathForAgent, got {:?}", other),
        }
        assert_eq!(agent.lifecycle(), AgentLifecycle::Init);
    }

    #[test]
    fn setup_fails_when_goal_is_unreachable() {
        // A planner with no scripted routes answers None even without
        // constraints.
        let planner = Arc::new(MockPlanner::new());
        let mut agent = SolverAgent::new(AgentId(0), swap_problem(), planner);

        match agent.setup() {
            Err(ConcordError::NoPathForAgent { agent: id }) => assert_eq!(id, AgentId(0)),
            other => panic!("expected NoPathForAgent, got {:?}", other),
        }
    }

    #[test]
    fn init_waits_for_all_root_paths() {
        let mut agent = SolverAgent::new(AgentId(0), swap_problem(), swap_planner());
        agent.setup().unwrap();

        // No peer path yet: act must do nothing and stay in Init.
        let out = agent.act().unwrap();
        assert!(out.is_empty());
        assert_eq!(agent.lifecycle(), AgentLifecycle::Init);
    }

    #[test]
    fn init_buffers_non_path_messages_until_search_starts() {
        let mut agent = SolverAgent::new(AgentId(0), swap_problem(), swap_planner());
        agent.setup().unwrap();

        // A solution declaration arrives before the peer's path.
        let mut declared = JointSolution::new();
        declared.set_path(AgentId(0), path(&[0, 0, 1, 2]));
        declared.set_path(AgentId(1), path(&[2, 1, 0]));
        let incumbent = Incumbent::new(AgentId(1), declared);
        agent.receive_message(Envelope::new(
            AgentId(1),
            AgentId(0),
            Message::DeclareSolution { incumbent: incumbent.clone() },
        ));
        agent.receive_message(peer_root_path_message());

        // One act: transition to InProgress and process the buffered
        // declaration in the same call.
        agent.act().unwrap();
        assert_eq!(agent.lifecycle(), AgentLifecycle::InProgress);
        assert_eq!(agent.incumbent(), Some(&incumbent));
    }

    // ── Conflict detection & branching ───────────────────────────────────────

    #[test]
    fn expansion_branches_on_own_conflict_and_notifies_second_party() {
        let mut agent = agent_with_complete_root();

        // The root paths collide on cell 1 at t=1. Agent 0 must detect the
        // conflict with itself as the first party and hand it to agent 1.
        let out = agent.act().unwrap();

        let conflict_messages: Vec<&Envelope> = out
            .iter()
            .filter(|env| matches!(env.payload, Message::DeclareConflict { .. }))
            .collect();
        assert_eq!(conflict_messages.len(), 1);
        let env = conflict_messages[0];
        assert_eq!(env.to, AgentId(1));
        match &env.payload {
            Message::DeclareConflict { ct_node, conflict } => {
                assert_eq!(conflict.agent1, AgentId(0));
                assert_eq!(conflict.agent2, AgentId(1));
                assert_eq!(conflict.location, Location(1));
                assert_eq!(conflict.time_step, 1);
                // The popped node travels with the conflict, unconstrained.
                assert!(ct_node.constraints.is_empty());
            }
            other => panic!("expected DeclareConflict, got {:?}", other),
        }

        // The invalid root must not have become the incumbent.
        assert!(agent.incumbent().is_none());
    }

    #[test]
    fn own_branch_resolves_conflict_and_becomes_incumbent() {
        let mut agent = agent_with_complete_root();

        agent.act().unwrap(); // pops root, pushes the constrained child
        let out = agent.act().unwrap(); // pops the child: valid, cost 5

        let incumbent = agent.incumbent().expect("child node should be adopted");
        assert_eq!(incumbent.owner, AgentId(0));
        assert_eq!(incumbent.cost(), 5);
        assert_eq!(
            incumbent.solution.path(AgentId(0)),
            Some(&path(&[0, 0, 1, 2]))
        );

        // The adoption is declared to the peer.
        assert!(out
            .iter()
            .any(|env| matches!(env.payload, Message::DeclareSolution { .. }) && env.to == AgentId(1)));
    }

    #[test]
    fn declare_conflict_builds_mirror_branch_constraining_self() {
        let mut agent = SolverAgent::new(AgentId(1), swap_problem(), swap_planner());
        agent.setup().unwrap();
        agent.receive_message(Envelope::new(
            AgentId(0),
            AgentId(1),
            Message::PathForAgent { path: path(&[0, 1, 2]) },
        ));
        agent.act().unwrap(); // root pop: detects (1, t=1) with agent1=1

        // Agent 0 detected the same collision on its side and hands it over.
        let root = CtNode::root({
            let mut s = JointSolution::new();
            s.set_path(AgentId(0), path(&[0, 1, 2]));
            s.set_path(AgentId(1), path(&[2, 1, 0]));
            s
        });
        agent.receive_message(Envelope::new(
            AgentId(0),
            AgentId(1),
            Message::DeclareConflict {
                ct_node: root,
                conflict: Conflict {
                    location: Location(1),
                    time_step: 1,
                    agent1: AgentId(0),
                    agent2: AgentId(1),
                },
            },
        ));

        // Work the OPEN set down; the mirror branch replans agent 1 and is
        // valid, so it ends up as agent 1's incumbent.
        for _ in 0..4 {
            agent.act().unwrap();
        }
        let incumbent = agent.incumbent().expect("mirror branch should be adopted");
        assert_eq!(incumbent.cost(), 5);
        assert_eq!(
            incumbent.solution.path(AgentId(1)),
            Some(&path(&[2, 2, 1, 0]))
        );
    }

    // ── Protocol violations ──────────────────────────────────────────────────

    #[test]
    fn path_exchange_after_init_is_a_protocol_violation() {
        let mut agent = agent_with_complete_root();
        agent.act().unwrap(); // now InProgress

        agent.receive_message(peer_root_path_message());
        match agent.act() {
            Err(ConcordError::ProtocolViolation { reason }) => {
                assert!(reason.contains("after leaving Init"), "reason: {}", reason);
            }
            other => panic!("expected ProtocolViolation, got {:?}", other),
        }
    }

    #[test]
    fn misaddressed_conflict_is_a_protocol_violation() {
        let mut agent = agent_with_complete_root();
        agent.act().unwrap();

        let bogus = CtNode::root(JointSolution::new());
        agent.receive_message(Envelope::new(
            AgentId(1),
            AgentId(0),
            Message::DeclareConflict {
                ct_node: bogus,
                conflict: Conflict {
                    location: Location(1),
                    time_step: 1,
                    agent1: AgentId(1),
                    // Second party is not this agent.
                    agent2: AgentId(7),
                },
            },
        ));
        match agent.act() {
            Err(ConcordError::ProtocolViolation { reason }) => {
                assert!(reason.contains("second party"), "reason: {}", reason);
            }
            other => panic!("expected ProtocolViolation, got {:?}", other),
        }
    }

    #[test]
    fn path_exchange_from_unknown_sender_is_a_protocol_violation() {
        let mut agent = SolverAgent::new(AgentId(0), swap_problem(), swap_planner());
        agent.setup().unwrap();

        // An id outside the problem's agent set must never complete the
        // root solution.
        agent.receive_message(Envelope::new(
            AgentId(9),
            AgentId(0),
            Message::PathForAgent { path: path(&[2, 1, 0]) },
        ));
        match agent.act() {
            Err(ConcordError::ProtocolViolation { reason }) => {
                assert!(reason.contains("unknown"), "reason: {}", reason);
            }
            other => panic!("expected ProtocolViolation, got {:?}", other),
        }
    }

    #[test]
    fn message_from_unknown_sender_is_a_protocol_violation() {
        let mut agent = agent_with_complete_root();
        agent.act().unwrap(); // now InProgress

        agent.receive_message(Envelope::new(
            AgentId(9),
            AgentId(0),
            Message::DeclareEmptyOpen {
                incumbent: None,
                conflicts_seen: 0,
            },
        ));
        match agent.act() {
            Err(ConcordError::ProtocolViolation { reason }) => {
                assert!(reason.contains("unknown"), "reason: {}", reason);
            }
            other => panic!("expected ProtocolViolation, got {:?}", other),
        }
    }

    // ── Incumbent adoption ───────────────────────────────────────────────────

    #[test]
    fn redeclaration_and_worse_candidates_change_nothing() {
        let mut agent = agent_with_complete_root();
        agent.act().unwrap();
        agent.act().unwrap(); // holds the cost-5, owner-0 incumbent
        let before = agent.incumbent().cloned().unwrap();

        // Same cost, higher owner id: not adopted.
        let mut other_solution = JointSolution::new();
        other_solution.set_path(AgentId(0), path(&[0, 1, 2]));
        other_solution.set_path(AgentId(1), path(&[2, 2, 1, 0]));
        agent.receive_message(Envelope::new(
            AgentId(1),
            AgentId(0),
            Message::DeclareSolution {
                incumbent: Incumbent::new(AgentId(1), other_solution),
            },
        ));
        // Exact re-declaration: also a no-op.
        agent.receive_message(Envelope::new(
            AgentId(1),
            AgentId(0),
            Message::DeclareSolution { incumbent: before.clone() },
        ));

        agent.act().unwrap();
        assert_eq!(agent.incumbent(), Some(&before));
    }

    // ── Exhaustion & termination ─────────────────────────────────────────────

    #[test]
    fn exhaustion_is_announced_once_per_state() {
        let mut agent = agent_with_complete_root();
        agent.act().unwrap(); // pop root
        agent.act().unwrap(); // pop child, adopt incumbent

        // OPEN is now empty: the next act announces the exhaustion.
        let out = agent.act().unwrap();
        assert!(out
            .iter()
            .any(|env| matches!(env.payload, Message::DeclareEmptyOpen { .. })));
        assert!(out
            .iter()
            .any(|env| matches!(env.payload, Message::DeclareSolution { .. })));

        // Unchanged state: nothing more goes out.
        let out = agent.act().unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn consensus_with_matching_peer_reports_finishes() {
        let mut agent = agent_with_complete_root();
        agent.act().unwrap();
        agent.act().unwrap();
        agent.act().unwrap(); // announces exhaustion
        let mine = agent.incumbent().cloned().unwrap();

        agent.receive_message(Envelope::new(
            AgentId(1),
            AgentId(0),
            Message::DeclareEmptyOpen {
                incumbent: Some(mine),
                conflicts_seen: 1,
            },
        ));
        agent.act().unwrap();

        assert!(agent.is_done());
        // Done is terminal: further acts are no-ops.
        let out = agent.act().unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn mismatched_peer_incumbent_blocks_termination() {
        let mut agent = agent_with_complete_root();
        agent.act().unwrap();
        agent.act().unwrap();
        agent.act().unwrap();

        // Peer claims exhaustion with no incumbent at all.
        agent.receive_message(Envelope::new(
            AgentId(1),
            AgentId(0),
            Message::DeclareEmptyOpen {
                incumbent: None,
                conflicts_seen: 1,
            },
        ));
        agent.act().unwrap();
        assert!(!agent.is_done());
    }

    #[test]
    fn stale_exhaustion_report_does_not_terminate() {
        let mut agent = agent_with_complete_root();
        agent.act().unwrap(); // pops root, sends the conflict to agent 1
        agent.act().unwrap(); // adopts the cost-5 incumbent
        agent.act().unwrap(); // announces its own exhaustion
        let mine = agent.incumbent().cloned().unwrap();

        // Crossing messages: agent 1 emptied its OPEN and announced in the
        // same round the conflict went out, so this report predates the
        // conflict. Even with a matching incumbent it must not count,
        // because agent 1's mirror branch is still pending.
        agent.receive_message(Envelope::new(
            AgentId(1),
            AgentId(0),
            Message::DeclareEmptyOpen {
                incumbent: Some(mine.clone()),
                conflicts_seen: 0,
            },
        ));
        for _ in 0..3 {
            agent.act().unwrap();
            assert!(!agent.is_done());
        }

        // Once agent 1 reports having seen the conflict, consensus holds.
        agent.receive_message(Envelope::new(
            AgentId(1),
            AgentId(0),
            Message::DeclareEmptyOpen {
                incumbent: Some(mine),
                conflicts_seen: 1,
            },
        ));
        agent.act().unwrap();
        assert!(agent.is_done());
    }

    #[test]
    fn infeasible_search_finishes_with_no_incumbent() {
        // Replanning always fails: every branch prunes and no valid
        // solution is ever found.
        let planner = Arc::new(
            MockPlanner::new()
                .route(0, vec![], &[0, 1, 2])
                .route(1, vec![], &[2, 1, 0]),
        );
        let mut agent = SolverAgent::new(AgentId(0), swap_problem(), planner);
        agent.setup().unwrap();
        agent.receive_message(peer_root_path_message());

        agent.act().unwrap(); // root pops, branch prunes
        let out = agent.act().unwrap(); // OPEN empty: announce, no incumbent
        assert!(out
            .iter()
            .any(|env| matches!(env.payload, Message::DeclareEmptyOpen { incumbent: None, .. })));

        // The peer's report accounts for the conflict sent in the first
        // act, so it is current.
        agent.receive_message(Envelope::new(
            AgentId(1),
            AgentId(0),
            Message::DeclareEmptyOpen {
                incumbent: None,
                conflicts_seen: 1,
            },
        ));
        agent.act().unwrap();
        assert!(agent.is_done());
        assert!(agent.incumbent().is_none());
    }
}
