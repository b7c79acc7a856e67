//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Session state (latest assessment) and report export
//! - Background assessment via worker thread

use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::DirectoryExporter;
use crate::application::{AssessmentSession, ModelSlot, ReportService};
use crate::config::AppConfig;
use crate::domain::PatientProfile;

use super::ui::{
    assessment::{render_assessment, AssessmentViewState, ExportStatus, Phase},
    form::{render_patient_form, PatientFormState},
    render_disclaimer,
};
use super::worker::{AssessmentProgress, AssessmentWorker, AssessmentWorkerHandle};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    PatientForm,
    Assessment,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,

    /// Shared, load-once classifier
    model: Arc<ModelSlot>,

    reports: ReportService<DirectoryExporter>,

    /// Latest assessment; the only thing a report can be exported from
    session: AssessmentSession,

    form: PatientFormState,
    view: AssessmentViewState,

    pending_worker: Option<AssessmentWorkerHandle>,

    /// Profile of the last failed run, for retry
    retry_profile: Option<PatientProfile>,

    /// When the current phase started (for the progress animation)
    phase_started_at: Option<Instant>,
}

impl App {
    /// Create the application from configuration.
    ///
    /// The model is not loaded here; the first assessment loads it, so a
    /// missing artifact shows up as an on-screen error instead of a startup
    /// failure.
    ///
    /// # Errors
    /// Currently infallible; kept fallible for adapters that need setup.
    pub fn new(config: AppConfig) -> Result<Self> {
        tracing::info!(
            "Model artifact: {} ({} layout)",
            config.model_path.display(),
            config.feature_layout
        );
        tracing::info!("Reports directory: {}", config.export_dir.display());

        let model = Arc::new(ModelSlot::new(config.model_spec()));
        let reports = ReportService::new(DirectoryExporter::new(config.export_dir));
        Ok(Self::with_dependencies(model, reports))
    }

    /// Create application with injected dependencies (Composition Root pattern).
    #[must_use]
    pub fn with_dependencies(
        model: Arc<ModelSlot>,
        reports: ReportService<DirectoryExporter>,
    ) -> Self {
        Self {
            screen: Screen::PatientForm,
            should_quit: false,
            model,
            reports,
            session: AssessmentSession::new(),
            form: PatientFormState::default(),
            view: AssessmentViewState::default(),
            pending_worker: None,
            retry_profile: None,
            phase_started_at: None,
        }
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            self.poll_worker();
            self.tick_progress();

            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match self.screen {
                    Screen::PatientForm => render_patient_form(f, chunks[0], &self.form),
                    Screen::Assessment => {
                        render_assessment(f, chunks[0], &self.view, self.session.current());
                    }
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    /// Drain progress messages from the background worker.
    fn poll_worker(&mut self) {
        while let Some(progress) = self
            .pending_worker
            .as_ref()
            .and_then(AssessmentWorkerHandle::try_recv)
        {
            match progress {
                AssessmentProgress::LoadingModel => self.set_phase(Phase::LoadingModel),
                AssessmentProgress::Scoring => self.set_phase(Phase::Scoring),
                AssessmentProgress::Complete(done) => {
                    let (profile, assessment) = *done;
                    self.session.record(profile, assessment);
                    self.retry_profile = None;
                    self.view = AssessmentViewState::Complete { export: None };
                    self.finish_worker();
                    break;
                }
                AssessmentProgress::Failed { message, profile } => {
                    self.session.clear();
                    self.retry_profile = Some(*profile);
                    self.view = AssessmentViewState::Error { message };
                    self.finish_worker();
                    break;
                }
            }
        }
    }

    fn finish_worker(&mut self) {
        self.pending_worker = None;
        self.phase_started_at = None;
    }

    fn set_phase(&mut self, phase: Phase) {
        let floor = match phase {
            Phase::LoadingModel => 0.0,
            Phase::Scoring => 0.6,
        };
        let current = match self.view {
            AssessmentViewState::Running { progress, .. } => progress,
            _ => 0.0,
        };
        self.view = AssessmentViewState::Running {
            phase,
            progress: current.max(floor),
        };
        self.phase_started_at = Some(Instant::now());
    }

    /// Smooth, monotonic progress that approaches the phase target.
    fn tick_progress(&mut self) {
        let (AssessmentViewState::Running { phase, progress }, Some(started_at)) =
            (self.view.clone(), self.phase_started_at)
        else {
            return;
        };

        let (floor, target, tau) = match phase {
            Phase::LoadingModel => (0.05, 0.6, 0.8),
            Phase::Scoring => (0.6, 0.97, 0.3),
        };
        let elapsed = started_at.elapsed().as_secs_f64();
        let k = 1.0 - (-elapsed / tau).exp();
        let desired = floor + (target - floor) * k;

        self.view = AssessmentViewState::Running {
            phase,
            progress: desired.max(progress).min(target),
        };
    }

    fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::PatientForm => self.handle_form_key(key),
            Screen::Assessment => self.handle_assessment_key(key),
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                if self.session.current().is_some() {
                    self.screen = Screen::Assessment;
                }
            }
            KeyCode::Up | KeyCode::BackTab => self.form.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form.next_field(),
            KeyCode::Left => self.form.cycle_choice(false),
            KeyCode::Right => self.form.cycle_choice(true),
            KeyCode::Char('s') | KeyCode::Char('S') => self.form.load_sample_data(),
            KeyCode::Char(c) => self.form.input_char(c),
            KeyCode::Backspace => self.form.delete_char(),
            KeyCode::Delete => self.form.clear_field(),
            KeyCode::Enter => self.submit_form(),
            _ => {}
        }
    }

    fn handle_assessment_key(&mut self, key: KeyCode) {
        match &self.view {
            AssessmentViewState::Complete { .. } => match key {
                KeyCode::Char('e') | KeyCode::Char('E') => self.export_report(),
                KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                    self.form = PatientFormState::default();
                    self.screen = Screen::PatientForm;
                }
                KeyCode::Char('q') | KeyCode::Char('Q') => self.should_quit = true,
                _ => {}
            },
            AssessmentViewState::Error { .. } => match key {
                KeyCode::Enter => {
                    if let Some(profile) = self.retry_profile.take() {
                        self.start_assessment(profile);
                    }
                }
                KeyCode::Esc => self.screen = Screen::PatientForm,
                _ => {}
            },
            _ => {}
        }
    }

    fn submit_form(&mut self) {
        match self.form.to_profile() {
            Ok(profile) => {
                self.form.clear_sensitive();
                self.start_assessment(profile);
            }
            Err(message) => self.form.error_message = Some(message),
        }
    }

    fn start_assessment(&mut self, profile: PatientProfile) {
        self.screen = Screen::Assessment;
        self.view = AssessmentViewState::Running {
            phase: Phase::LoadingModel,
            progress: 0.0,
        };
        self.phase_started_at = Some(Instant::now());
        self.pending_worker = Some(AssessmentWorker::spawn(Arc::clone(&self.model), profile));
    }

    fn export_report(&mut self) {
        let status = match self.session.export(&self.reports) {
            Ok(path) => ExportStatus::Saved(path),
            Err(e) => {
                tracing::warn!("Report export failed: {e}");
                ExportStatus::Failed(e.to_string())
            }
        };
        self.view = AssessmentViewState::Complete {
            export: Some(status),
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ModelSpec;
    use crate::domain::{fixtures, FeatureLayout};
    use crate::tui::worker::WORKER_STOPPED;
    use tempfile::tempdir;

    fn app_in(dir: &std::path::Path) -> App {
        let model = Arc::new(ModelSlot::new(ModelSpec::new(
            dir.join("missing.json"),
            FeatureLayout::Standard,
        )));
        App::with_dependencies(model, ReportService::new(DirectoryExporter::new(dir)))
    }

    #[test]
    fn test_dead_worker_becomes_retryable_error() {
        let dir = tempdir().expect("tempdir");
        let mut app = app_in(dir.path());
        app.start_assessment(fixtures::high_risk());
        app.pending_worker = Some(AssessmentWorkerHandle::stopped(
            fixtures::high_risk(),
            vec![AssessmentProgress::LoadingModel],
        ));

        app.poll_worker();

        match &app.view {
            AssessmentViewState::Error { message } => assert_eq!(message, WORKER_STOPPED),
            other => panic!("expected error view, got {other:?}"),
        }
        assert!(app.pending_worker.is_none());
        assert!(app.session.current().is_none());
        assert_eq!(app.retry_profile, Some(fixtures::high_risk()));

        app.handle_key(KeyCode::Enter, KeyModifiers::NONE);
        assert!(matches!(app.view, AssessmentViewState::Running { .. }));
        assert!(app.pending_worker.is_some());
        assert!(app.retry_profile.is_none());
    }
}
