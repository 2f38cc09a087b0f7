use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tracing::info;

use crate::handler::{ManualPrimer, RecordHandler};
use crate::lifecycle::{HookRegistry, HookRun, Phase, PhaseTracker};
use crate::repository::RecordSource;
use crate::response::{ProxyRequest, ProxyResponse};
use crate::strategy::PrimingStrategy;
use crate::warmup::{self, WarmupPlan, WarmupReport};

pub struct Environment<S> {
    strategy: PrimingStrategy,
    handler: Arc<RecordHandler<S>>,
    hooks: HookRegistry,
    phase: PhaseTracker,
    restore_pending: AtomicBool,
    warmup: Option<WarmupReport>,
}

impl<S: RecordSource + 'static> Environment<S> {
    /// Runs the initialization action of `strategy` and registers its
    /// pre-checkpoint hook, if any. `plan` is only consulted by
    /// class priming.
    pub fn initialize(
        strategy: PrimingStrategy,
        handler: Arc<RecordHandler<S>>,
        plan: &WarmupPlan,
        workers: usize,
    ) -> Self {
        info!(strategy = %strategy, "initialize started");

        let mut hooks = HookRegistry::new();
        let mut warmup = None;

        match strategy {
            PrimingStrategy::NoPriming => {}
            PrimingStrategy::InvokePriming => hooks.register(handler.clone()),
            PrimingStrategy::ManualPriming => {
                hooks.register(Arc::new(ManualPrimer::new(Arc::clone(&handler))))
            }
            PrimingStrategy::ClassPriming => warmup = Some(warmup::preload(plan, workers)),
        }

        info!(strategy = %strategy, hooks = hooks.len(), "initialize finished");

        Self {
            strategy,
            handler,
            hooks,
            phase: PhaseTracker::default(),
            restore_pending: AtomicBool::new(false),
            warmup,
        }
    }

    pub fn strategy(&self) -> PrimingStrategy {
        self.strategy
    }

    pub fn hooks(&self) -> &HookRegistry {
        &self.hooks
    }

    pub fn phase(&self) -> Phase {
        self.phase.current()
    }

    pub fn warmup_report(&self) -> Option<&WarmupReport> {
        self.warmup.as_ref()
    }

    pub fn handler(&self) -> &Arc<RecordHandler<S>> {
        &self.handler
    }

    /// Runs every registered pre-checkpoint hook. Only the first call
    /// does anything, and never once the environment is running.
    pub async fn before_checkpoint(&self) -> HookRun {
        if !self.phase.advance(Phase::PreCheckpointExecuted) {
            return HookRun::default();
        }

        info!("before_checkpoint started");
        let run = self.hooks.run_before_snapshot().await;
        self.restore_pending.store(true, Ordering::Release);
        info!(
            succeeded = run.succeeded,
            failed = run.failed,
            "before_checkpoint finished"
        );
        run
    }

    /// Marks the environment as ready for traffic.
    pub fn start(&self) {
        if self.phase.advance(Phase::Running) {
            info!(strategy = %self.strategy, "environment running");
        }
    }

    /// Serves one request. The first request after a checkpoint runs the
    /// after-restore hooks first.
    pub async fn invoke(&self, request: &ProxyRequest) -> ProxyResponse {
        if self.phase() != Phase::Running {
            self.start();
        }
        if self.restore_pending.swap(false, Ordering::AcqRel) {
            info!("after_restore started");
            let run = self.hooks.run_after_restore().await;
            info!(
                succeeded = run.succeeded,
                failed = run.failed,
                "after_restore finished"
            );
        }

        self.handler.handle(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::model::{Record, RecordTable};
    use crate::repository::RecordService;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;

    #[derive(Default)]
    struct Counted {
        reads: AtomicUsize,
        resets: AtomicUsize,
    }

    #[async_trait]
    impl RecordSource for Counted {
        async fn fetch_all(&self, _table: RecordTable) -> Result<Vec<Record>, DataError> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }

        async fn reset(&self) {
            self.resets.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn environment(strategy: PrimingStrategy) -> Environment<Counted> {
        let service = RecordService::new(Counted::default(), RecordTable::Unicorn);
        let handler = Arc::new(RecordHandler::new(service, Some("snap-start".to_string())));
        Environment::initialize(strategy, handler, &WarmupPlan::default(), 1)
    }

    fn calls(env: &Environment<Counted>) -> usize {
        env.handler().service().source().reads.load(Ordering::SeqCst)
    }

    fn resets(env: &Environment<Counted>) -> usize {
        env.handler().service().source().resets.load(Ordering::SeqCst)
    }

    #[test]
    fn registers_hooks_per_strategy() {
        assert!(environment(PrimingStrategy::NoPriming).hooks().is_empty());
        assert!(environment(PrimingStrategy::ClassPriming).hooks().is_empty());
        assert_eq!(
            environment(PrimingStrategy::InvokePriming).hooks().names(),
            vec!["invoke-priming"]
        );
        assert_eq!(
            environment(PrimingStrategy::ManualPriming).hooks().names(),
            vec!["manual-priming"]
        );
    }

    #[test]
    fn only_class_priming_warms_at_init() {
        assert!(environment(PrimingStrategy::ClassPriming).warmup_report().is_some());
        assert!(environment(PrimingStrategy::InvokePriming).warmup_report().is_none());
    }

    #[tokio::test]
    async fn checkpoint_runs_once() {
        let env = environment(PrimingStrategy::InvokePriming);

        assert_eq!(env.before_checkpoint().await.succeeded, 1);
        assert_eq!(env.before_checkpoint().await, HookRun::default());
        assert_eq!(env.phase(), Phase::PreCheckpointExecuted);
        assert_eq!(calls(&env), 1);
    }

    #[tokio::test]
    async fn no_checkpoint_after_running() {
        let env = environment(PrimingStrategy::ManualPriming);
        env.start();

        assert_eq!(env.before_checkpoint().await, HookRun::default());
        assert_eq!(calls(&env), 0);
    }

    #[tokio::test]
    async fn invoke_moves_to_running() {
        let env = environment(PrimingStrategy::InvokePriming);
        env.before_checkpoint().await;

        let response = env.invoke(&ProxyRequest::default()).await;

        assert_eq!(response.status_code, 200);
        assert_eq!(env.phase(), Phase::Running);
        assert_eq!(calls(&env), 2);
    }

    #[tokio::test]
    async fn after_restore_fires_once_after_checkpoint() {
        for strategy in [PrimingStrategy::InvokePriming, PrimingStrategy::ManualPriming] {
            let env = environment(strategy);
            env.before_checkpoint().await;
            env.start();
            // before_snapshot drops its connection once
            assert_eq!(resets(&env), 1, "{}", strategy);

            env.invoke(&ProxyRequest::default()).await;
            env.invoke(&ProxyRequest::default()).await;

            assert_eq!(resets(&env), 2, "{}", strategy);
            assert_eq!(calls(&env), 3, "{}", strategy);
        }
    }

    #[tokio::test]
    async fn after_restore_skipped_without_checkpoint() {
        let env = environment(PrimingStrategy::InvokePriming);
        env.start();

        env.invoke(&ProxyRequest::default()).await;
        env.invoke(&ProxyRequest::default()).await;

        assert_eq!(resets(&env), 0);
        assert_eq!(calls(&env), 2);
    }
}
