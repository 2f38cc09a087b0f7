use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::error::Error;

// Code to run right before a snapshot and right after a restore
#[async_trait]
pub trait SnapshotResource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn before_snapshot(&self) -> Result<(), Error>;

    async fn after_restore(&self) -> Result<(), Error> {
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum HookKind {
    BeforeSnapshot,
    AfterRestore,
}

impl fmt::Display for HookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookKind::BeforeSnapshot => f.write_str("before_snapshot"),
            HookKind::AfterRestore => f.write_str("after_restore"),
        }
    }
}

/// Outcome of running one hook kind across the registry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HookRun {
    pub succeeded: usize,
    pub failed: usize,
}

// Errors and panics from hooks are logged and dropped
#[derive(Default)]
pub struct HookRegistry {
    resources: Vec<Arc<dyn SnapshotResource>>,
}

impl HookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, resource: Arc<dyn SnapshotResource>) {
        info!(resource = resource.name(), "registered snapshot resource");
        self.resources.push(resource);
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.resources.iter().map(|r| r.name()).collect()
    }

    pub async fn run_before_snapshot(&self) -> HookRun {
        self.run(HookKind::BeforeSnapshot).await
    }

    pub async fn run_after_restore(&self) -> HookRun {
        self.run(HookKind::AfterRestore).await
    }

    // Each hook runs on its own task so a panic surfaces as a JoinError
    // instead of unwinding through initialization.
    async fn run(&self, kind: HookKind) -> HookRun {
        let mut outcome = HookRun::default();

        for resource in &self.resources {
            let name = resource.name();
            info!(resource = name, "{} started", kind);

            let resource = Arc::clone(resource);
            let result = tokio::spawn(async move {
                match kind {
                    HookKind::BeforeSnapshot => resource.before_snapshot().await,
                    HookKind::AfterRestore => resource.after_restore().await,
                }
            })
            .await;

            match result {
                Ok(Ok(())) => {
                    outcome.succeeded += 1;
                    info!(resource = name, "{} finished", kind);
                }
                Ok(Err(e)) => {
                    outcome.failed += 1;
                    warn!(resource = name, "{} failed, ignoring: {}", kind, e);
                }
                Err(e) => {
                    outcome.failed += 1;
                    warn!(resource = name, "{} panicked, ignoring: {}", kind, e);
                }
            }
        }

        outcome
    }
}

/// Lifecycle phase of one execution environment. Phases only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum Phase {
    Initialized = 0,
    PreCheckpointExecuted = 1,
    Running = 2,
}

impl Phase {
    fn from_u8(raw: u8) -> Self {
        match raw {
            0 => Phase::Initialized,
            1 => Phase::PreCheckpointExecuted,
            _ => Phase::Running,
        }
    }
}

#[derive(Debug)]
pub struct PhaseTracker(AtomicU8);

impl Default for PhaseTracker {
    fn default() -> Self {
        Self(AtomicU8::new(Phase::Initialized as u8))
    }
}

impl PhaseTracker {
    pub fn current(&self) -> Phase {
        Phase::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Moves to `next` if it is strictly after the current phase. Returns
    /// false, leaving the phase untouched, otherwise.
    pub fn advance(&self, next: Phase) -> bool {
        let moved = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                (current < next as u8).then_some(next as u8)
            })
            .is_ok();

        if !moved {
            warn!(current = ?self.current(), requested = ?next, "refused lifecycle transition");
        }
        moved
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counting {
        before: AtomicUsize,
        after: AtomicUsize,
    }

    #[async_trait]
    impl SnapshotResource for Counting {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn before_snapshot(&self) -> Result<(), Error> {
            self.before.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        async fn after_restore(&self) -> Result<(), Error> {
            self.after.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    struct Failing;

    #[async_trait]
    impl SnapshotResource for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        async fn before_snapshot(&self) -> Result<(), Error> {
            Err(Error::Hook {
                hook: "before_snapshot",
                reason: "warm-up request failed".to_string(),
            })
        }
    }

    struct Panicking;

    #[async_trait]
    impl SnapshotResource for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        async fn before_snapshot(&self) -> Result<(), Error> {
            panic!("priming blew up");
        }
    }

    #[tokio::test]
    async fn empty_registry_runs_nothing() {
        let registry = HookRegistry::new();

        assert!(registry.is_empty());
        assert_eq!(registry.run_before_snapshot().await, HookRun::default());
    }

    #[tokio::test]
    async fn failures_and_panics_are_swallowed() {
        let counting = Arc::new(Counting::default());
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(Failing));
        registry.register(Arc::new(Panicking));
        registry.register(counting.clone());

        let run = registry.run_before_snapshot().await;

        assert_eq!(run, HookRun { succeeded: 1, failed: 2 });
        assert_eq!(counting.before.load(Ordering::SeqCst), 1);
        assert_eq!(registry.names(), vec!["failing", "panicking", "counting"]);
    }

    #[tokio::test]
    async fn after_restore_defaults_to_noop() {
        let counting = Arc::new(Counting::default());
        let mut registry = HookRegistry::new();
        registry.register(Arc::new(Failing));
        registry.register(counting.clone());

        let run = registry.run_after_restore().await;

        assert_eq!(run, HookRun { succeeded: 2, failed: 0 });
        assert_eq!(counting.after.load(Ordering::SeqCst), 1);
        assert_eq!(counting.before.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn phases_only_move_forward() {
        let phase = PhaseTracker::default();
        assert_eq!(phase.current(), Phase::Initialized);

        assert!(phase.advance(Phase::PreCheckpointExecuted));
        assert!(!phase.advance(Phase::PreCheckpointExecuted));
        assert!(phase.advance(Phase::Running));
        assert!(!phase.advance(Phase::PreCheckpointExecuted));
        assert!(!phase.advance(Phase::Initialized));
        assert_eq!(phase.current(), Phase::Running);
    }

    #[test]
    fn pre_checkpoint_is_optional() {
        let phase = PhaseTracker::default();

        assert!(phase.advance(Phase::Running));
        assert!(!phase.advance(Phase::PreCheckpointExecuted));
    }
}
