use std::sync::{
    atomic::{
        AtomicBool,
        Ordering,
    },
    Arc,
};

use tokio::sync::{
    mpsc,
    Notify,
};

use super::{
    notifier::Notifier,
    report::{
        sync_and_export,
        CycleReport,
    },
};
use crate::{
    anki::FlashcardService,
    core::{
        Config,
        DuoSyncError,
        ExerciseState,
        SentencePair,
    },
    extract::{
        self,
        classify_exercise,
    },
    page::{
        selectors,
        Element,
        Page,
    },
    persistence,
    watch::{
        poll_until,
        wait_for_element_timeout,
        Condition,
        Hit,
        WatchHandle,
        WatchTarget,
    },
};

const SKILL_TREE_PROMPT: &str = "Continue to the skill tree?";
const NEXT_EXERCISE_PROMPT: &str = "Continue to the next exercise?";

/// What the driver is currently waiting for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Manual triggers only.
    Idle,
    /// Lesson end screens and checked exercises.
    Watching,
    /// A review was handled; wait until the user is back on the skill tree.
    AwaitHome,
    /// An exercise was handled; wait until its result panel goes away.
    AwaitNextExercise,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Scorecard,
    ReviewButton,
    ExerciseChecked,
    Home,
    ResultCleared,
}

fn watch_targets(phase: Phase) -> Vec<WatchTarget<Marker>> {
    match phase {
        Phase::Idle => Vec::new(),
        Phase::Watching => vec![
            WatchTarget::new(Marker::Scorecard, Condition::present(selectors::SCORECARD_CARD)),
            WatchTarget::new(
                Marker::ReviewButton,
                Condition::with_text(selectors::REVIEW_BUTTON, selectors::REVIEW_BUTTON_TEXT),
            ),
            WatchTarget::new(Marker::ExerciseChecked, Condition::present(selectors::BLAME)),
        ],
        Phase::AwaitHome => vec![WatchTarget::new(
            Marker::Home,
            Condition::with_text(selectors::LEARN_NAV, selectors::LEARN_NAV_TEXT),
        )],
        Phase::AwaitNextExercise => {
            vec![WatchTarget::new(Marker::ResultCleared, Condition::absent(selectors::BLAME))]
        }
    }
}

/// What is on screen, in manual-trigger priority order.
enum Found {
    Scorecard,
    ReviewButton(Element),
    Exercise(ExerciseState, Element),
    Story,
    Nothing,
}

impl Found {
    /// Where to go once this screen has been dealt with, successfully or not.
    fn follow_up(&self, current: Phase) -> Phase {
        match self {
            Found::Scorecard | Found::ReviewButton(_) => Phase::AwaitHome,
            Found::Exercise(..) => Phase::AwaitNextExercise,
            Found::Story | Found::Nothing => current,
        }
    }
}

/// Stops [`Driver::run`] at its next suspension point.
#[derive(Debug, Clone, Default)]
pub struct ShutdownHandle {
    flag: Arc<AtomicBool>,
    notify: Arc<Notify>,
}

impl ShutdownHandle {
    pub fn shutdown(&self) {
        self.flag.store(true, Ordering::SeqCst);
        // notify_one keeps a permit if the loop is busy handling a match
        self.notify.notify_one();
    }

    pub fn is_shutdown(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

pub struct Driver {
    config: Config,
    page: Arc<dyn Page>,
    service: Arc<dyn FlashcardService>,
    notifier: Arc<dyn Notifier>,
    shutdown: ShutdownHandle,
}

impl Driver {
    pub fn new(
        config: Config,
        page: Arc<dyn Page>,
        service: Arc<dyn FlashcardService>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self { config, page, service, notifier, shutdown: ShutdownHandle::default() }
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.shutdown.clone()
    }

    pub fn initial_phase(&self) -> Phase {
        if self.config.auto_run {
            Phase::Watching
        } else {
            Phase::Idle
        }
    }

    /// The session loop. Each round arms the watch set of the current phase and
    /// races it against the manual trigger. Whichever fires first is handled,
    /// the watch is cancelled and the next phase begins.
    pub async fn run(&self, triggers: mpsc::UnboundedReceiver<()>) {
        let mut triggers = Some(triggers);
        let mut phase = self.initial_phase();
        log::info!("Session started ({:?})", phase);

        while !self.shutdown.is_shutdown() {
            log::debug!("Phase {:?}", phase);
            let mut watch = self.arm(phase);

            tokio::select! {
                biased;
                _ = self.shutdown.notify.notified() => break,
                trigger = next_trigger(&mut triggers) => match trigger {
                    Some(()) => {
                        // the screen may change while the trigger is handled
                        drop(watch.take());
                        phase = self.manual_trigger(phase).await;
                    }
                    None => {
                        log::debug!("Manual trigger channel closed");
                        triggers = None;
                    }
                },
                hit = next_hit(&mut watch) => {
                    phase = match hit {
                        Some(hit) => self.on_hit(phase, hit).await,
                        None => {
                            log::debug!("Watch for {:?} ran out of attempts", phase);
                            exhausted(phase)
                        }
                    };
                }
            }
        }

        log::info!("Session stopped");
    }

    /// Inspect the page right now and handle the highest-priority screen.
    pub async fn manual_trigger(&self, current: Phase) -> Phase {
        log::info!("Manual trigger");
        let found = self.inspect();
        self.handle(found, current).await
    }

    /// Find and read whatever the page shows, without syncing.
    pub async fn extract_current(
        &self,
    ) -> Result<(ExerciseState, Vec<SentencePair>), DuoSyncError> {
        self.extract_found(self.inspect()).await
    }

    fn resume(&self, phase: Phase) -> Phase {
        if self.config.auto_run {
            phase
        } else {
            Phase::Idle
        }
    }

    fn arm(&self, phase: Phase) -> Option<WatchHandle<Marker>> {
        let targets = watch_targets(phase);
        if targets.is_empty() {
            return None;
        }
        Some(WatchHandle::arm(
            self.page.clone(),
            targets,
            self.config.poll_interval(),
            self.config.watch_attempts(),
        ))
    }

    fn inspect(&self) -> Found {
        let page = self.page.as_ref();
        if page.query(selectors::SCORECARD_CARD).is_some() {
            return Found::Scorecard;
        }
        if let Some(button) =
            page.query_with_text(selectors::REVIEW_BUTTON, Some(selectors::REVIEW_BUTTON_TEXT))
        {
            return Found::ReviewButton(button);
        }
        if let Some((state, challenge)) = classify_exercise(page) {
            return Found::Exercise(state, challenge);
        }
        if page.query(selectors::STORY_LINE).is_some() {
            return Found::Story;
        }
        Found::Nothing
    }

    async fn on_hit(&self, current: Phase, hit: Hit<Marker>) -> Phase {
        log::debug!("Watch matched {:?}", hit.key);
        match hit.key {
            Marker::Scorecard => self.handle(Found::Scorecard, current).await,
            Marker::ReviewButton => match hit.element {
                Some(button) => self.handle(Found::ReviewButton(button), current).await,
                None => current,
            },
            Marker::ExerciseChecked => match classify_exercise(self.page.as_ref()) {
                Some((state, challenge)) => {
                    self.handle(Found::Exercise(state, challenge), current).await
                }
                None => {
                    log::debug!("Result panel without a known exercise");
                    Phase::AwaitNextExercise
                }
            },
            Marker::Home | Marker::ResultCleared => Phase::Watching,
        }
    }

    async fn handle(&self, found: Found, current: Phase) -> Phase {
        let next = self.resume(found.follow_up(current));
        match self.extract_found(found).await {
            Ok((state, pairs)) => self.finish(state, pairs).await,
            Err(e) => {
                log::warn!("Extraction failed: {}", e);
                if self.config.notify_on_result {
                    self.notifier.notice(&format!("Could not extract sentences: {}", e)).await;
                }
            }
        }
        next
    }

    async fn extract_found(
        &self,
        found: Found,
    ) -> Result<(ExerciseState, Vec<SentencePair>), DuoSyncError> {
        let page = self.page.as_ref();
        let timeout = self.config.answer_timeout();
        let (state, challenge) = match found {
            Found::Scorecard => (ExerciseState::ReviewScorecard, None),
            Found::ReviewButton(button) => {
                page.click(&button)?;
                wait_for_element_timeout(page, None, selectors::SCORECARD_CARD, timeout).await?;
                (ExerciseState::ReviewScorecard, None)
            }
            Found::Exercise(state, challenge) => (state, Some(challenge)),
            Found::Story => (ExerciseState::Story, None),
            Found::Nothing => {
                return Err(DuoSyncError::missing("nothing to extract on this page"));
            }
        };

        log::info!("Extracting {}", state);
        let pairs = extract::extract(page, state, challenge.as_ref(), timeout).await?;
        Ok((state, pairs))
    }

    async fn finish(&self, state: ExerciseState, pairs: Vec<SentencePair>) {
        let tags = match state {
            ExerciseState::Story => &self.config.story_tags,
            _ => &self.config.tags,
        };
        let report =
            sync_and_export(self.service.as_ref(), &self.config.deck_name, &pairs, tags).await;

        if self.config.export_to_file {
            match persistence::save_export(&report.result.export_text) {
                Ok(path) => log::debug!("Export written to {}", path.display()),
                Err(e) => log::warn!("Failed to write export file: {}", e),
            }
        }

        let prompt = if state == ExerciseState::ReviewScorecard {
            Some(SKILL_TREE_PROMPT)
        } else if state.is_single_exercise() {
            Some(NEXT_EXERCISE_PROMPT)
        } else {
            None
        };
        if !self.present(&report, prompt).await {
            return;
        }

        if state == ExerciseState::ReviewScorecard {
            self.leave_scorecard().await;
        } else {
            self.continue_lesson();
        }
    }

    /// Show the result; true when the user agreed to move on.
    async fn present(&self, report: &CycleReport, prompt: Option<&str>) -> bool {
        let message = report.message();
        if !self.config.notify_on_result {
            log::info!("{}", message);
            return false;
        }

        match prompt {
            Some(prompt) if self.config.confirm_continue => {
                self.notifier.confirm(&format!("{}\n\n{}", message, prompt)).await
            }
            _ => {
                self.notifier.notice(&message).await;
                false
            }
        }
    }

    async fn leave_scorecard(&self) {
        let close = poll_until(
            self.page.as_ref(),
            Condition::present(selectors::SCORECARD_CLOSE),
            self.config.poll_interval(),
            self.config.click_attempts(),
        )
        .await;

        match close.and_then(|hit| hit.element) {
            Some(button) => self.click(&button),
            None => log::warn!("Scorecard close button did not appear"),
        }
        self.continue_lesson();
    }

    fn continue_lesson(&self) {
        if let Some(next) =
            self.page.query_with_text(selectors::PLAYER_NEXT, Some(selectors::CONTINUE_TEXT))
        {
            self.click(&next);
        }
    }

    fn click(&self, element: &Element) {
        if let Err(e) = self.page.click(element) {
            log::warn!("Click failed: {}", e);
        }
    }
}

fn exhausted(phase: Phase) -> Phase {
    match phase {
        Phase::AwaitHome | Phase::AwaitNextExercise => Phase::Watching,
        Phase::Idle | Phase::Watching => Phase::Idle,
    }
}

async fn next_hit(watch: &mut Option<WatchHandle<Marker>>) -> Option<Hit<Marker>> {
    match watch {
        Some(handle) => handle.outcome().await,
        None => std::future::pending().await,
    }
}

async fn next_trigger(triggers: &mut Option<mpsc::UnboundedReceiver<()>>) -> Option<()> {
    match triggers {
        Some(receiver) => receiver.recv().await,
        None => std::future::pending().await,
    }
}
