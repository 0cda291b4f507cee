use crate::core::types::{EnvironmentId, SolverId};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, OnceLock, PoisonError};

/// Execution strategy of a registered solver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SolverKind {
    Discrete,
    FixedStep,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnvironmentRecord {
    pub solver: SolverId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SolverRecord {
    pub kind: SolverKind,
    pub environment: EnvironmentId,
}

/// Process-wide lookup from identity to live environment and solver.
///
/// Environments and solvers have independent locks, so unrelated runs can be
/// created and dropped concurrently. Nothing inside one run takes these locks
/// while it executes.
pub struct Registry {
    environments: Mutex<HashMap<EnvironmentId, EnvironmentRecord>>,
    solvers: Mutex<HashMap<SolverId, SolverRecord>>,
}

/// Global registry instance
pub fn registry() -> &'static Registry {
    static REGISTRY: OnceLock<Registry> = OnceLock::new();
    REGISTRY.get_or_init(Registry::new)
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Registry {
    fn new() -> Self {
        Self {
            environments: Mutex::new(HashMap::new()),
            solvers: Mutex::new(HashMap::new()),
        }
    }

    /// Register an environment. Returns false if the identity is already live.
    pub fn register_environment(&self, id: EnvironmentId, record: EnvironmentRecord) -> bool {
        let mut environments = lock(&self.environments);
        if environments.contains_key(&id) {
            return false;
        }
        environments.insert(id, record);
        true
    }

    /// Register a solver. Returns false if the identity is already live.
    pub fn register_solver(&self, id: SolverId, record: SolverRecord) -> bool {
        let mut solvers = lock(&self.solvers);
        if solvers.contains_key(&id) {
            return false;
        }
        solvers.insert(id, record);
        true
    }

    pub fn deregister_environment(&self, id: EnvironmentId) -> Option<EnvironmentRecord> {
        lock(&self.environments).remove(&id)
    }

    pub fn deregister_solver(&self, id: SolverId) -> Option<SolverRecord> {
        lock(&self.solvers).remove(&id)
    }

    pub(crate) fn rebind_environment(&self, id: EnvironmentId, solver: SolverId) {
        lock(&self.environments).insert(id, EnvironmentRecord { solver });
    }

    pub fn environment(&self, id: EnvironmentId) -> Option<EnvironmentRecord> {
        lock(&self.environments).get(&id).copied()
    }

    pub fn solver(&self, id: SolverId) -> Option<SolverRecord> {
        lock(&self.solvers).get(&id).copied()
    }

    pub fn contains_environment(&self, id: EnvironmentId) -> bool {
        lock(&self.environments).contains_key(&id)
    }

    pub fn environment_count(&self) -> usize {
        lock(&self.environments).len()
    }

    pub fn solver_count(&self) -> usize {
        lock(&self.solvers).len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_lookup() {
        let env = EnvironmentId::new();
        let solver = SolverId::new();
        let reg = registry();

        assert!(reg.register_environment(env, EnvironmentRecord { solver }));
        assert!(!reg.register_environment(env, EnvironmentRecord { solver }));
        assert!(reg.register_solver(
            solver,
            SolverRecord {
                kind: SolverKind::Discrete,
                environment: env
            }
        ));

        assert_eq!(reg.solver(solver).map(|record| record.environment), Some(env));
        assert_eq!(reg.environment(env).map(|record| record.solver), Some(solver));

        assert!(reg.deregister_solver(solver).is_some());
        assert!(reg.deregister_environment(env).is_some());
        assert!(!reg.contains_environment(env));
        assert_eq!(reg.solver(solver), None);
    }

    #[test]
    fn test_concurrent_registration() {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                std::thread::spawn(|| {
                    let env = EnvironmentId::new();
                    let solver = SolverId::new();
                    assert!(registry().register_environment(env, EnvironmentRecord { solver }));
                    assert!(registry().contains_environment(env));
                    registry().deregister_environment(env);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
    }
}
