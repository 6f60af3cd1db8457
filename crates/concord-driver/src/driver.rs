//! The synchronous round driver.
//!
//! The reference delivery harness for the distributed search: every round,
//! each non-done agent performs one `act` step, then all produced messages
//! are delivered to their inboxes. A message produced in round k is
//! therefore visible no earlier than round k+1, which is the causal-order
//! guarantee the agent contract assumes. A production deployment may
//! replace this loop with an asynchronous bus; the agents cannot tell the
//! difference.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info};
use uuid::Uuid;

use concord_contracts::{
    agent::AgentId,
    error::{ConcordError, ConcordResult},
    message::Envelope,
    problem::MapfProblem,
    solution::Incumbent,
};
use concord_core::{traits::PathPlanner, SolverAgent};
use concord_search::SpaceTimeAStar;

use crate::config::SolverConfig;
use crate::report::{Outcome, SolveReport};

/// Runs one `SolverAgent` per problem agent to global termination.
pub struct RoundDriver {
    config: SolverConfig,
    planner: Arc<dyn PathPlanner>,
}

impl RoundDriver {
    /// Driver with the reference space-time A* as the low-level search.
    pub fn new(config: SolverConfig) -> Self {
        let planner = Arc::new(SpaceTimeAStar::new(config.horizon_factor as usize));
        Self { config, planner }
    }

    /// Driver with a caller-supplied low-level search.
    pub fn with_planner(config: SolverConfig, planner: Arc<dyn PathPlanner>) -> Self {
        Self { config, planner }
    }

    /// Solve `problem` to consensus and return the report.
    ///
    /// Errors: setup failures (`NoPathForAgent`, `InvalidProblem`),
    /// protocol violations surfaced by any agent, `RoundLimitExceeded`
    /// when the round budget runs out, and `ConsensusViolation` if the
    /// terminated agents do not hold identical incumbents (which would be
    /// a bug in the search logic, not a property of the instance).
    pub fn solve(&self, problem: Arc<MapfProblem>) -> ConcordResult<SolveReport> {
        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        info!(
            %run_id,
            agents = problem.agent_count(),
            "starting distributed CBS solve"
        );

        let mut agents: Vec<SolverAgent> = problem
            .agent_ids()
            .map(|id| SolverAgent::new(id, problem.clone(), self.planner.clone()))
            .collect();
        let index: BTreeMap<AgentId, usize> = agents
            .iter()
            .enumerate()
            .map(|(i, a)| (a.id(), i))
            .collect();

        // Bootstrap: plan initial paths and exchange them.
        let mut outbox = Vec::new();
        for agent in &mut agents {
            outbox.extend(agent.setup()?);
        }
        deliver(&mut agents, &index, outbox)?;

        let mut rounds = 0u32;
        while !agents.iter().all(SolverAgent::is_done) {
            rounds += 1;
            if rounds > self.config.max_rounds {
                return Err(ConcordError::RoundLimitExceeded {
                    limit: self.config.max_rounds,
                });
            }

            let mut outbox = Vec::new();
            for agent in &mut agents {
                if !agent.is_done() {
                    outbox.extend(agent.act()?);
                }
            }
            debug!(%run_id, round = rounds, messages = outbox.len(), "round complete");
            deliver(&mut agents, &index, outbox)?;
        }

        let outcome = extract_outcome(&agents)?;
        let cost = outcome.solution().map(|s| s.cost());
        info!(
            %run_id,
            rounds,
            solved = outcome.is_solved(),
            cost = ?cost,
            "solve terminated"
        );

        Ok(SolveReport {
            run_id,
            outcome,
            rounds,
            cost,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

/// Route every envelope to its recipient's inbox.
fn deliver(
    agents: &mut [SolverAgent],
    index: &BTreeMap<AgentId, usize>,
    outbox: Vec<Envelope>,
) -> ConcordResult<()> {
    for envelope in outbox {
        let Some(&slot) = index.get(&envelope.to) else {
            return Err(ConcordError::ProtocolViolation {
                reason: format!("message addressed to unknown {}", envelope.to),
            });
        };
        agents[slot].receive_message(envelope);
    }
    Ok(())
}

/// Cross-check the terminated agents and map their shared incumbent to an
/// `Outcome`. Non-identical incumbents are a consensus violation.
fn extract_outcome(agents: &[SolverAgent]) -> ConcordResult<Outcome> {
    let first: Option<&Incumbent> = agents[0].incumbent();
    for agent in &agents[1..] {
        if agent.incumbent() != first {
            return Err(ConcordError::ConsensusViolation {
                reason: format!(
                    "{} finalized with a different incumbent than {}",
                    agent.id(),
                    agents[0].id()
                ),
            });
        }
    }

    match first {
        Some(incumbent) => {
            if !incumbent.solution.is_valid() {
                return Err(ConcordError::ConsensusViolation {
                    reason: "finalized incumbent is not conflict-free".to_string(),
                });
            }
            Ok(Outcome::Solved {
                solution: incumbent.solution.clone(),
            })
        }
        None => Ok(Outcome::Infeasible),
    }
}
