//! Assessment progress and result view.

use std::path::PathBuf;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::application::SessionEntry;
use crate::domain::factors::{contributing_factors, OPTIMAL_VITALS, OPTIMAL_VITALS_DETAIL};
use crate::domain::scoring::{self, MAX_HEART_SCORE};
use crate::tui::styles::ClinicalTheme;

/// Stage of a running assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    LoadingModel,
    Scoring,
}

/// Outcome of the last export attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum ExportStatus {
    Saved(PathBuf),
    Failed(String),
}

/// Assessment view state
#[derive(Debug, Clone, Default)]
pub enum AssessmentViewState {
    /// Nothing submitted yet
    #[default]
    Idle,
    Running { phase: Phase, progress: f64 },
    /// Result is in the session; `export` holds the last export attempt
    Complete { export: Option<ExportStatus> },
    Error { message: String },
}

/// Render the assessment view.
///
/// `entry` is the session's current assessment; it is only read in the
/// `Complete` state.
pub fn render_assessment(
    f: &mut Frame,
    area: Rect,
    state: &AssessmentViewState,
    entry: Option<&SessionEntry>,
) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(f, chunks[0]);
    match (state, entry) {
        (AssessmentViewState::Idle, _) => render_idle(f, chunks[1]),
        (AssessmentViewState::Running { phase, progress }, _) => {
            render_progress(f, chunks[1], *phase, *progress);
        }
        (AssessmentViewState::Complete { export }, Some(entry)) => {
            render_result(f, chunks[1], entry, export.as_ref());
        }
        (AssessmentViewState::Complete { .. }, None) => render_idle(f, chunks[1]),
        (AssessmentViewState::Error { message }, _) => render_error(f, chunks[1], message),
    }
    render_footer(f, chunks[2], state);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ClinicalTheme::text()),
        Span::styled("Risk Assessment", ClinicalTheme::title()),
        Span::styled(" | Model + Heart Score", ClinicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No assessment yet",
            ClinicalTheme::text_secondary(),
        )),
        Line::from(Span::styled(
            "Fill in the patient form to begin",
            ClinicalTheme::text_muted(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_progress(f: &mut Frame, area: Rect, phase: Phase, progress: f64) {
    let (stage, description) = match phase {
        Phase::LoadingModel => ("Loading model", "Reading and verifying the model artifact..."),
        Phase::Scoring => ("Scoring", "Encoding features and running the classifier..."),
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(4),
            Constraint::Min(0),
        ])
        .margin(2)
        .split(area);

    let stage_text = Paragraph::new(Line::from(vec![
        Span::styled("Stage: ", ClinicalTheme::text_secondary()),
        Span::styled(stage, ClinicalTheme::focused()),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(stage_text, chunks[0]);

    let ratio = progress.clamp(0.0, 1.0);
    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(ClinicalTheme::border()),
        )
        .gauge_style(ClinicalTheme::info())
        .ratio(ratio)
        .label(format!("{:.0}%", ratio * 100.0));
    f.render_widget(gauge, chunks[1]);

    let desc = Paragraph::new(Line::from(Span::styled(
        description,
        ClinicalTheme::text_muted(),
    )))
    .alignment(Alignment::Center);
    f.render_widget(desc, chunks[2]);
}

fn render_result(
    f: &mut Frame,
    area: Rect,
    entry: &SessionEntry,
    export: Option<&ExportStatus>,
) {
    let assessment = &entry.assessment;
    let block = Block::default()
        .title(Span::styled(" Assessment Result ", ClinicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Headline
            Constraint::Length(3), // Probability
            Constraint::Length(4), // Heart score
            Constraint::Min(0),    // Factors | insights + enhancers
            Constraint::Length(1), // Export status
        ])
        .margin(1)
        .split(inner);

    let label_style = ClinicalTheme::risk_label(assessment.label);
    let headline = Paragraph::new(vec![
        Line::from(Span::styled(
            assessment.label.headline(),
            label_style.add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            assessment.label.description(),
            ClinicalTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center);
    f.render_widget(headline, chunks[0]);

    let probability_block = Block::default()
        .title(Span::styled(" Model Probability ", ClinicalTheme::text_secondary()))
        .borders(Borders::ALL)
        .border_style(ClinicalTheme::border());
    match assessment.probability {
        Some(p) => {
            let gauge = Gauge::default()
                .block(probability_block)
                .gauge_style(label_style)
                .ratio(p.clamp(0.0, 1.0))
                .label(format!("{:.1}%", p * 100.0));
            f.render_widget(gauge, chunks[1]);
        }
        None => {
            let text = Paragraph::new(Span::styled(
                "Not reported by this model",
                ClinicalTheme::text_muted(),
            ))
            .block(probability_block);
            f.render_widget(text, chunks[1]);
        }
    }

    render_heart_score(f, chunks[2], entry);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[3]);
    render_factors(f, columns[0], entry);
    render_findings(f, columns[1], entry);

    let status = match export {
        Some(ExportStatus::Saved(path)) => Line::from(Span::styled(
            format!("Report saved to {}", path.display()),
            ClinicalTheme::success(),
        )),
        Some(ExportStatus::Failed(message)) => Line::from(Span::styled(
            format!("Export failed: {message}"),
            ClinicalTheme::danger(),
        )),
        None => Line::from(""),
    };
    f.render_widget(Paragraph::new(status), chunks[4]);
}

fn render_heart_score(f: &mut Frame, area: Rect, entry: &SessionEntry) {
    let score = entry.assessment.heart_score;
    let hearts: String = (0..MAX_HEART_SCORE)
        .map(|i| if i < score { '\u{2665}' } else { '\u{00b7}' })
        .collect();
    let fraction = f64::from(score) / f64::from(MAX_HEART_SCORE);

    let breakdown: Vec<Span> = scoring::score(&entry.profile)
        .points()
        .map(|(point, earned)| {
            let style = if earned {
                ClinicalTheme::success()
            } else {
                ClinicalTheme::text_muted()
            };
            Span::styled(format!("{} ", point.label()), style)
        })
        .collect();

    let content = Paragraph::new(vec![
        Line::from(vec![
            Span::styled(format!("{hearts}  "), ClinicalTheme::heart_score(fraction)),
            Span::styled(
                format!("{score}/{MAX_HEART_SCORE}"),
                ClinicalTheme::title(),
            ),
            Span::styled(
                format!("   BMI {:.1}", entry.assessment.bmi),
                ClinicalTheme::text_secondary(),
            ),
        ]),
        Line::from(breakdown),
    ])
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .title(Span::styled(" Heart Health Score ", ClinicalTheme::text_secondary()))
            .borders(Borders::ALL)
            .border_style(ClinicalTheme::border()),
    );
    f.render_widget(content, area);
}

fn render_factors(f: &mut Frame, area: Rect, entry: &SessionEntry) {
    let factors = contributing_factors(&entry.profile);
    let lines: Vec<Line> = if factors.is_empty() {
        vec![
            Line::from(Span::styled(
                format!("+ {OPTIMAL_VITALS}"),
                ClinicalTheme::success(),
            )),
            Line::from(Span::styled(OPTIMAL_VITALS_DETAIL, ClinicalTheme::text_muted())),
        ]
    } else {
        factors
            .iter()
            .map(|factor| {
                Line::from(vec![
                    Span::styled("! ", ClinicalTheme::warning()),
                    Span::styled(factor.to_string(), ClinicalTheme::text()),
                ])
            })
            .collect()
    };

    let content = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(Span::styled(" Contributing Factors ", ClinicalTheme::text_secondary()))
            .borders(Borders::ALL)
            .border_style(ClinicalTheme::border()),
    );
    f.render_widget(content, area);
}

fn render_findings(f: &mut Frame, area: Rect, entry: &SessionEntry) {
    let assessment = &entry.assessment;
    let mut lines: Vec<Line> = assessment
        .insights
        .iter()
        .map(|insight| {
            Line::from(vec![
                Span::styled("- ", ClinicalTheme::text_muted()),
                Span::styled(insight.message.as_str(), ClinicalTheme::severity(insight.severity)),
            ])
        })
        .collect();

    if !assessment.risk_enhancers.is_empty() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Clinical Risk Enhancers:",
            ClinicalTheme::subtitle(),
        )));
        lines.extend(assessment.enhancer_names().into_iter().map(|name| {
            Line::from(Span::styled(format!("  {name}"), ClinicalTheme::warning()))
        }));
    }

    let content = Paragraph::new(lines).wrap(Wrap { trim: false }).block(
        Block::default()
            .title(Span::styled(" Recommendations ", ClinicalTheme::text_secondary()))
            .borders(Borders::ALL)
            .border_style(ClinicalTheme::border()),
    );
    f.render_widget(content, area);
}

fn render_error(f: &mut Frame, area: Rect, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled("! Assessment failed", ClinicalTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, ClinicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(ClinicalTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_footer(f: &mut Frame, area: Rect, state: &AssessmentViewState) {
    let content = match state {
        AssessmentViewState::Complete { .. } => Line::from(vec![
            Span::styled("[E] ", ClinicalTheme::key_hint()),
            Span::styled("Export PDF ", ClinicalTheme::key_desc()),
            Span::styled("[N] ", ClinicalTheme::key_hint()),
            Span::styled("New Assessment ", ClinicalTheme::key_desc()),
            Span::styled("[Q] ", ClinicalTheme::key_hint()),
            Span::styled("Quit", ClinicalTheme::key_desc()),
        ]),
        AssessmentViewState::Error { .. } => Line::from(vec![
            Span::styled("[Enter] ", ClinicalTheme::key_hint()),
            Span::styled("Retry ", ClinicalTheme::key_desc()),
            Span::styled("[Esc] ", ClinicalTheme::key_hint()),
            Span::styled("Back to Form", ClinicalTheme::key_desc()),
        ]),
        _ => Line::from(vec![Span::styled(
            "Processing...",
            ClinicalTheme::text_muted(),
        )]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(footer, area);
}
