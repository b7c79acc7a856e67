//! UI module: View components for the TUI.

pub mod assessment;
pub mod form;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::ClinicalTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: Educational purposes only. Not a substitute for medical advice.",
            ClinicalTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Consult a qualified healthcare professional about any result.",
            ClinicalTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(ClinicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
