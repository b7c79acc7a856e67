//! Clinical colour palette and preset styles.

use ratatui::style::{Color, Modifier, Style};

use crate::domain::{InsightSeverity, RiskLabel};

/// Colour palette for the CardioCare screens.
pub struct ClinicalTheme;

impl ClinicalTheme {
    /// Cardio red, used for branding accents
    pub const PRIMARY: Color = Color::Rgb(220, 38, 38); // #DC2626
    pub const PRIMARY_LIGHT: Color = Color::Rgb(248, 113, 113); // #F87171

    pub const SECONDARY_LIGHT: Color = Color::Rgb(148, 163, 184); // #94A3B8

    pub const SUCCESS: Color = Color::Rgb(16, 185, 129); // #10B981
    pub const WARNING: Color = Color::Rgb(251, 191, 36); // #FBBF24
    pub const DANGER: Color = Color::Rgb(244, 63, 94); // #F43F5E
    pub const INFO: Color = Color::Rgb(59, 130, 246); // #3B82F6

    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252); // #F8FAFC
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184); // #94A3B8
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139); // #64748B

    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    #[must_use]
    pub fn info() -> Style {
        Style::default().fg(Self::INFO)
    }

    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn cursor() -> Style {
        Style::default().fg(Self::PRIMARY_LIGHT)
    }

    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::SECONDARY_LIGHT)
    }

    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Headline colour for a classifier label.
    #[must_use]
    pub fn risk_label(label: RiskLabel) -> Style {
        match label {
            RiskLabel::Low => Self::success(),
            RiskLabel::High => Self::danger(),
        }
    }

    #[must_use]
    pub fn severity(severity: InsightSeverity) -> Style {
        match severity {
            InsightSeverity::Warning => Self::warning(),
            InsightSeverity::Info => Self::info(),
            InsightSeverity::Success => Self::success(),
        }
    }

    /// Gauge colour for a heart score fraction (higher is healthier).
    #[must_use]
    pub fn heart_score(fraction: f64) -> Style {
        if fraction >= 0.7 {
            Self::success()
        } else if fraction >= 0.4 {
            Self::warning()
        } else {
            Self::danger()
        }
    }
}
