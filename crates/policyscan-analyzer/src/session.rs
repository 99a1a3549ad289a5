//! One-scan-at-a-time controller behind the presentation layer.
//!
//! Every scan is stamped with a generation number. `reset` (and nothing else)
//! bumps the generation; a scan whose generation is no longer current is
//! abandoned at its next suspension point and its result, if any, is
//! discarded instead of written to the view state.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use policyscan_core::{PipelineError, ScanOutcome};
use policyscan_detect::{ContentExtractor, PageInspector};
use tokio::sync::watch;
use tracing::Instrument;
use uuid::Uuid;

use crate::client::CompletionBackend;
use crate::error::SessionError;
use crate::pipeline::Analyzer;

/// What the presentation layer should currently show.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewState {
    Idle,
    Scanning,
    Completed(ScanOutcome),
    Failed(PipelineError),
}

/// Result of one `start_scan` / `analyze_link` call.
#[derive(Debug, Clone, PartialEq)]
pub enum ScanDelivery {
    /// The scan finished while still current; the view state now reflects it.
    Completed(Result<ScanOutcome, PipelineError>),
    /// A `reset` happened while the scan was in flight; its result was dropped.
    Superseded,
}

#[derive(Debug)]
struct SessionState {
    view: ViewState,
    active: Option<u64>,
}

pub struct ScanSession<I, C> {
    inspector: I,
    extractor: ContentExtractor,
    analyzer: Analyzer<C>,
    generation: watch::Sender<u64>,
    state: Mutex<SessionState>,
}

impl<I, C> ScanSession<I, C>
where
    I: PageInspector,
    C: CompletionBackend,
{
    pub fn new(inspector: I, extractor: ContentExtractor, analyzer: Analyzer<C>) -> Self {
        let (generation, _) = watch::channel(0);
        Self {
            inspector,
            extractor,
            analyzer,
            generation,
            state: Mutex::new(SessionState {
                view: ViewState::Idle,
                active: None,
            }),
        }
    }

    /// Current view state.
    #[must_use]
    pub fn view(&self) -> ViewState {
        self.lock_state().view.clone()
    }

    /// Inspects `page`, detects policy content, and analyzes it.
    ///
    /// # Errors
    ///
    /// [`SessionError::ScanInProgress`] if another scan is outstanding.
    pub async fn start_scan(&self, page: &str) -> Result<ScanDelivery, SessionError> {
        self.run("page", page, || async move {
            let signal = self.inspector.inspect(page).await?;
            let detection = self.extractor.detect(&signal);
            self.analyzer.run(detection).await
        })
        .await
    }

    /// Analyzes a user-supplied link directly, without page detection.
    ///
    /// # Errors
    ///
    /// [`SessionError::ScanInProgress`] if another scan is outstanding.
    pub async fn analyze_link(&self, url: &str) -> Result<ScanDelivery, SessionError> {
        let url = url.trim();
        self.run("link", url, || async move {
            if url.is_empty() {
                return Err(PipelineError::AccessDenied("empty link".to_string()));
            }
            self.analyzer.analyze(url, None).await
        })
        .await
    }

    /// Returns to `Idle` and invalidates any in-flight scan.
    pub fn reset(&self) {
        let mut state = self.lock_state();
        let mut current = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            current = *g;
        });
        if state.active.take().is_some() {
            tracing::info!(generation = current, "in-flight scan invalidated by reset");
        }
        state.view = ViewState::Idle;
    }

    async fn run<F, Fut>(
        &self,
        kind: &'static str,
        target: &str,
        work: F,
    ) -> Result<ScanDelivery, SessionError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ScanOutcome, PipelineError>>,
    {
        let generation = self.begin()?;
        let _abandon = AbandonGuard {
            state: &self.state,
            generation,
        };
        let scan_id = Uuid::new_v4();
        let span = tracing::info_span!("scan", %scan_id, generation, kind, subject = target);

        let superseded = wait_until_superseded(self.generation.subscribe(), generation);
        let result = async {
            tracing::info!("scan started");
            tokio::select! {
                result = work() => Some(result),
                () = superseded => None,
            }
        }
        .instrument(span.clone())
        .await;

        let _entered = span.enter();
        Ok(self.finish(generation, result))
    }

    fn begin(&self) -> Result<u64, SessionError> {
        let mut state = self.lock_state();
        if state.active.is_some() {
            tracing::warn!("scan rejected: another scan is in progress");
            return Err(SessionError::ScanInProgress);
        }
        let mut next = 0;
        self.generation.send_modify(|g| {
            *g += 1;
            next = *g;
        });
        state.active = Some(next);
        state.view = ViewState::Scanning;
        Ok(next)
    }

    fn finish(
        &self,
        generation: u64,
        result: Option<Result<ScanOutcome, PipelineError>>,
    ) -> ScanDelivery {
        let mut state = self.lock_state();
        let current = *self.generation.borrow();
        match result {
            Some(result) if current == generation => {
                state.active = None;
                state.view = match &result {
                    Ok(outcome) => ViewState::Completed(outcome.clone()),
                    Err(err) => ViewState::Failed(err.clone()),
                };
                match &result {
                    Ok(_) => tracing::info!("scan completed"),
                    Err(err) => tracing::warn!(error = %err, "scan failed"),
                }
                ScanDelivery::Completed(result)
            }
            _ => {
                tracing::info!(current, "discarding result of superseded scan");
                ScanDelivery::Superseded
            }
        }
    }

    fn lock_state(&self) -> MutexGuard<'_, SessionState> {
        lock(&self.state)
    }
}

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Releases the session if a scan's future is dropped before it finishes.
/// A no-op once the scan has finished or been superseded.
struct AbandonGuard<'a> {
    state: &'a Mutex<SessionState>,
    generation: u64,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        let mut state = lock(self.state);
        if state.active == Some(self.generation) {
            state.active = None;
            state.view = ViewState::Idle;
            tracing::info!(generation = self.generation, "scan abandoned by its caller");
        }
    }
}

/// Resolves once the published generation differs from `generation`.
async fn wait_until_superseded(mut rx: watch::Receiver<u64>, generation: u64) {
    while *rx.borrow_and_update() == generation {
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use policyscan_core::{CompletionAnswer, CompletionRequest, DetectionStrategy, PromptMode};
    use policyscan_detect::StaticPageInspector;
    use tokio::sync::Notify;

    use super::*;
    use crate::prompt::PromptBuilder;

    /// Answers only after `release` is notified, or immediately when `gate` is `None`.
    struct GatedBackend {
        answer: String,
        gate: Option<Arc<Notify>>,
    }

    impl CompletionBackend for GatedBackend {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionAnswer, PipelineError> {
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            Ok(CompletionAnswer(self.answer.clone()))
        }
    }

    const POLICY_PAGE: &str = "https://shop.test/";
    const PLAIN_PAGE: &str = "https://plain.test/";

    fn session(gate: Option<Arc<Notify>>) -> ScanSession<StaticPageInspector, GatedBackend> {
        let inspector = StaticPageInspector::new()
            .with_html(
                POLICY_PAGE,
                "<footer><a href='/privacy'>Privacy Policy</a></footer>",
                DetectionStrategy::Elements,
            )
            .with_html(PLAIN_PAGE, "<h1>Hello</h1>", DetectionStrategy::Elements);
        let backend = GatedBackend {
            answer: "## Data Collected: 6/10".to_string(),
            gate,
        };
        let analyzer = Analyzer::new(backend, PromptBuilder::new("m"), PromptMode::Narrative);
        ScanSession::new(inspector, ContentExtractor::url_mode(), analyzer)
    }

    async fn wait_for_view(
        session: &ScanSession<StaticPageInspector, GatedBackend>,
        want: &ViewState,
    ) {
        for _ in 0..100 {
            if session.view() == *want {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("view never became {want:?}, is {:?}", session.view());
    }

    #[tokio::test]
    async fn new_session_is_idle() {
        assert_eq!(session(None).view(), ViewState::Idle);
    }

    #[tokio::test]
    async fn scan_of_policy_page_completes_with_narrative() {
        let session = session(None);
        let delivery = session.start_scan(POLICY_PAGE).await.unwrap();
        let expected = ScanOutcome::Narrative {
            text: "## Data Collected: 6/10".to_string(),
        };
        assert_eq!(delivery, ScanDelivery::Completed(Ok(expected.clone())));
        assert_eq!(session.view(), ViewState::Completed(expected));
    }

    #[tokio::test]
    async fn scan_of_plain_page_is_not_found() {
        let session = session(None);
        let delivery = session.start_scan(PLAIN_PAGE).await.unwrap();
        assert_eq!(delivery, ScanDelivery::Completed(Ok(ScanOutcome::NotFound)));
        assert_eq!(session.view(), ViewState::Completed(ScanOutcome::NotFound));
    }

    #[tokio::test]
    async fn uninspectable_page_fails_with_access_denied() {
        let session = session(None);
        let delivery = session.start_scan("https://unknown.test/").await.unwrap();
        assert!(matches!(
            delivery,
            ScanDelivery::Completed(Err(PipelineError::AccessDenied(_)))
        ));
        assert!(matches!(
            session.view(),
            ViewState::Failed(PipelineError::AccessDenied(_))
        ));
    }

    #[tokio::test]
    async fn empty_link_is_rejected_without_a_call() {
        let session = session(None);
        let delivery = session.analyze_link("   ").await.unwrap();
        assert_eq!(
            delivery,
            ScanDelivery::Completed(Err(PipelineError::AccessDenied("empty link".to_string())))
        );
    }

    #[tokio::test]
    async fn reset_after_completion_returns_to_idle() {
        let session = session(None);
        session.analyze_link("https://a.test/privacy").await.unwrap();
        session.reset();
        assert_eq!(session.view(), ViewState::Idle);
    }

    #[tokio::test]
    async fn second_scan_while_outstanding_is_rejected() {
        let gate = Arc::new(Notify::new());
        let session = Arc::new(session(Some(Arc::clone(&gate))));

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.analyze_link("https://a.test/privacy").await }
        });
        wait_for_view(&session, &ViewState::Scanning).await;

        let second = session.start_scan(POLICY_PAGE).await;
        assert_eq!(second, Err(SessionError::ScanInProgress));

        gate.notify_one();
        let delivery = first.await.unwrap().unwrap();
        assert!(matches!(delivery, ScanDelivery::Completed(Ok(_))));
    }

    #[tokio::test]
    async fn reset_discards_in_flight_result() {
        let gate = Arc::new(Notify::new());
        let session = Arc::new(session(Some(Arc::clone(&gate))));

        let scan = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.start_scan(POLICY_PAGE).await }
        });
        wait_for_view(&session, &ViewState::Scanning).await;

        session.reset();
        // Releasing the backend after the reset must not resurrect the result.
        gate.notify_one();

        let delivery = scan.await.unwrap().unwrap();
        assert_eq!(delivery, ScanDelivery::Superseded);
        assert_eq!(session.view(), ViewState::Idle);
    }

    #[tokio::test]
    async fn dropped_scan_releases_the_session() {
        let gate = Arc::new(Notify::new());
        let session = session(Some(gate));

        let timed_out =
            tokio::time::timeout(Duration::from_millis(20), session.start_scan(POLICY_PAGE)).await;
        assert!(timed_out.is_err(), "gated scan should still be pending");
        assert_eq!(session.view(), ViewState::Idle);

        let delivery = session.start_scan(PLAIN_PAGE).await.unwrap();
        assert_eq!(delivery, ScanDelivery::Completed(Ok(ScanOutcome::NotFound)));
    }

    #[tokio::test]
    async fn new_scan_after_reset_is_accepted() {
        let gate = Arc::new(Notify::new());
        let session = Arc::new(session(Some(Arc::clone(&gate))));

        let stale = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.start_scan(POLICY_PAGE).await }
        });
        wait_for_view(&session, &ViewState::Scanning).await;
        session.reset();
        assert_eq!(stale.await.unwrap().unwrap(), ScanDelivery::Superseded);

        let fresh = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.start_scan(PLAIN_PAGE).await }
        });
        let delivery = fresh.await.unwrap().unwrap();
        assert_eq!(delivery, ScanDelivery::Completed(Ok(ScanOutcome::NotFound)));
        assert_eq!(session.view(), ViewState::Completed(ScanOutcome::NotFound));
    }
}
