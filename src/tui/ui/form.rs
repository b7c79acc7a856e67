//! Patient data input form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{
    BiologicalSex, ClinicalLevel, FieldRange, PatientProfile, RiskEnhancer, AGE_RANGE,
    DIASTOLIC_RANGE, HEIGHT_RANGE, SYSTOLIC_RANGE, WEIGHT_RANGE,
};
use crate::tui::styles::ClinicalTheme;

const YES_NO: &[&str] = &["No", "Yes"];
const LEVELS: &[&str] = &["Normal", "Above Normal", "High"];
const SEXES: &[&str] = &["Female", "Male"];

/// How a field takes input.
#[derive(Debug, Clone)]
pub enum FieldKind {
    /// Typed number checked against a declared range
    Numeric { range: FieldRange, integer: bool },
    /// One of a fixed list, cycled with Left/Right/Space
    Choice { options: &'static [&'static str] },
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub kind: FieldKind,
    /// Typed text for numeric fields
    pub value: String,
    /// Selected option for choice fields
    pub choice: usize,
}

impl FormField {
    fn numeric(label: &'static str, range: FieldRange, integer: bool) -> Self {
        Self {
            label,
            kind: FieldKind::Numeric { range, integer },
            value: String::new(),
            choice: 0,
        }
    }

    fn choice(label: &'static str, options: &'static [&'static str]) -> Self {
        Self {
            label,
            kind: FieldKind::Choice { options },
            value: String::new(),
            choice: 0,
        }
    }

    /// Placeholder shown while a numeric field is empty.
    #[must_use]
    pub fn hint(&self) -> String {
        match &self.kind {
            FieldKind::Numeric { range, .. } => {
                format!("{} ({}-{})", range.unit, range.min, range.max)
            }
            FieldKind::Choice { options } => options.join(" / "),
        }
    }

    /// Text to display for the current value, if any.
    #[must_use]
    pub fn display(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Numeric { .. } if self.value.is_empty() => None,
            FieldKind::Numeric { .. } => Some(self.value.as_str()),
            FieldKind::Choice { options } => options.get(self.choice).copied(),
        }
    }
}

/// Field positions in [`PatientFormState::fields`].
mod slot {
    pub const AGE: usize = 0;
    pub const SEX: usize = 1;
    pub const HEIGHT: usize = 2;
    pub const WEIGHT: usize = 3;
    pub const SYSTOLIC: usize = 4;
    pub const DIASTOLIC: usize = 5;
    pub const CHOLESTEROL: usize = 6;
    pub const GLUCOSE: usize = 7;
    pub const SMOKER: usize = 8;
    pub const ALCOHOL: usize = 9;
    pub const ACTIVE: usize = 10;
    pub const FIRST_ENHANCER: usize = 11;
}

/// Patient form state
pub struct PatientFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl Default for PatientFormState {
    fn default() -> Self {
        let mut fields = vec![
            FormField::numeric("Age", AGE_RANGE, true),
            FormField::choice("Sex", SEXES),
            FormField::numeric("Height", HEIGHT_RANGE, false),
            FormField::numeric("Weight", WEIGHT_RANGE, false),
            FormField::numeric("Systolic BP", SYSTOLIC_RANGE, true),
            FormField::numeric("Diastolic BP", DIASTOLIC_RANGE, true),
            FormField::choice("Cholesterol", LEVELS),
            FormField::choice("Glucose", LEVELS),
            FormField::choice("Smoker", YES_NO),
            FormField::choice("Alcohol", YES_NO),
            FormField::choice("Physically Active", YES_NO),
        ];
        fields.extend(
            RiskEnhancer::ALL
                .iter()
                .map(|e| FormField::choice(e.label(), YES_NO)),
        );

        Self {
            fields,
            selected_field: 0,
            error_message: None,
        }
    }
}

impl PatientFormState {
    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Type into a numeric field, or toggle a choice field with space.
    pub fn input_char(&mut self, c: char) {
        let integer = match &self.fields[self.selected_field].kind {
            FieldKind::Numeric { integer, .. } => *integer,
            FieldKind::Choice { .. } => {
                if c == ' ' {
                    self.cycle_choice(true);
                }
                return;
            }
        };

        let value = &mut self.fields[self.selected_field].value;
        if c.is_ascii_digit() || (c == '.' && !integer && !value.contains('.')) {
            value.push(c);
            self.error_message = None;
        }
    }

    /// Step the selected choice field forwards or backwards.
    pub fn cycle_choice(&mut self, forward: bool) {
        let field = &mut self.fields[self.selected_field];
        if let FieldKind::Choice { options } = field.kind {
            let n = options.len();
            field.choice = if forward {
                (field.choice + 1) % n
            } else {
                (field.choice + n - 1) % n
            };
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.fields[self.selected_field].value.pop();
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        let field = &mut self.fields[self.selected_field];
        field.value.zeroize();
        field.choice = 0;
    }

    /// Wipe all field buffers and reset every choice.
    ///
    /// Called as soon as an assessment starts so plaintext inputs do not
    /// linger in UI state.
    pub fn clear_sensitive(&mut self) {
        for field in &mut self.fields {
            field.value.zeroize();
            field.choice.zeroize();
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    fn number(&self, index: usize) -> Result<f64, String> {
        let field = &self.fields[index];
        let FieldKind::Numeric { range, integer } = &field.kind else {
            return Err(format!("{}: not a numeric field", field.label));
        };

        if field.value.is_empty() {
            return Err(format!("{}: Required", field.label));
        }
        let value: f64 = field
            .value
            .parse()
            .map_err(|_| format!("{}: Invalid number", field.label))?;
        if *integer && value.fract() != 0.0 {
            return Err(format!("{}: Whole numbers only", field.label));
        }
        if !range.contains(value) {
            return Err(format!(
                "{}: Value must be between {} and {}",
                field.label, range.min, range.max
            ));
        }
        Ok(value)
    }

    fn whole(&self, index: usize) -> Result<u32, String> {
        // Range checked and integral, so the cast is exact.
        self.number(index).map(|v| v as u32)
    }

    fn yes(&self, index: usize) -> bool {
        self.fields[index].choice == 1
    }

    fn level(&self, index: usize) -> Result<ClinicalLevel, String> {
        let ordinal = u8::try_from(self.fields[index].choice + 1).map_err(|e| e.to_string())?;
        ClinicalLevel::from_ordinal(ordinal)
    }

    /// Validate and convert to a [`PatientProfile`].
    ///
    /// # Errors
    /// Returns the first field problem as a user-facing message.
    pub fn to_profile(&self) -> Result<PatientProfile, String> {
        let sex = if self.fields[slot::SEX].choice == 0 {
            BiologicalSex::Female
        } else {
            BiologicalSex::Male
        };

        let enhancers: Vec<RiskEnhancer> = RiskEnhancer::ALL
            .iter()
            .enumerate()
            .filter(|(i, _)| self.yes(slot::FIRST_ENHANCER + i))
            .map(|(_, e)| *e)
            .collect();

        let profile = PatientProfile {
            age_years: self.whole(slot::AGE)?,
            sex,
            height_cm: self.number(slot::HEIGHT)?,
            weight_kg: self.number(slot::WEIGHT)?,
            systolic: self.whole(slot::SYSTOLIC)?,
            diastolic: self.whole(slot::DIASTOLIC)?,
            cholesterol: self.level(slot::CHOLESTEROL)?,
            glucose: self.level(slot::GLUCOSE)?,
            smoker: self.yes(slot::SMOKER),
            drinks_alcohol: self.yes(slot::ALCOHOL),
            physically_active: self.yes(slot::ACTIVE),
            risk_enhancers: Vec::new(),
        }
        .with_enhancers(enhancers);

        profile.validate().map_err(|errors| errors.join(", "))?;
        Ok(profile)
    }

    /// Load sample data for a quick demo (hypertensive smoker).
    pub fn load_sample_data(&mut self) {
        let numbers = [
            (slot::AGE, "55"),
            (slot::HEIGHT, "172"),
            (slot::WEIGHT, "88"),
            (slot::SYSTOLIC, "142"),
            (slot::DIASTOLIC, "91"),
        ];
        for (index, value) in numbers {
            self.fields[index].value = value.to_string();
        }

        let choices = [
            (slot::SEX, 1),
            (slot::CHOLESTEROL, 1),
            (slot::GLUCOSE, 0),
            (slot::SMOKER, 1),
            (slot::ALCOHOL, 0),
            (slot::ACTIVE, 0),
            (slot::FIRST_ENHANCER, 1),
        ];
        for (index, choice) in choices {
            self.fields[index].choice = choice;
        }
        self.error_message = None;
    }
}

/// Render the patient data input form
pub fn render_patient_form(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", ClinicalTheme::text()),
        Span::styled("CardioCare", ClinicalTheme::title()),
        Span::styled(
            " | Cardiovascular Risk Assessment",
            ClinicalTheme::text_secondary(),
        ),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    let mid = (state.fields.len() + 1) / 2;

    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (ClinicalTheme::border_focused(), ClinicalTheme::focused())
        } else {
            (ClinicalTheme::border(), ClinicalTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value = match (field.display(), &field.kind) {
            (Some(text), FieldKind::Choice { .. }) => {
                Span::styled(format!("< {text} >"), ClinicalTheme::text())
            }
            (Some(text), FieldKind::Numeric { .. }) => {
                Span::styled(text.to_string(), ClinicalTheme::text())
            }
            (None, _) => Span::styled(field.hint(), ClinicalTheme::text_muted()),
        };

        let cursor = if is_selected && matches!(field.kind, FieldKind::Numeric { .. }) {
            Span::styled("_", ClinicalTheme::cursor())
        } else {
            Span::raw("")
        };

        let content = Paragraph::new(Line::from(vec![Span::raw(" "), value, cursor])).block(block);
        f.render_widget(content, chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &PatientFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", ClinicalTheme::danger()),
            Span::styled(err.clone(), ClinicalTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[Up/Down] ", ClinicalTheme::key_hint()),
            Span::styled("Navigate ", ClinicalTheme::key_desc()),
            Span::styled("[Left/Right] ", ClinicalTheme::key_hint()),
            Span::styled("Choose ", ClinicalTheme::key_desc()),
            Span::styled("[Enter] ", ClinicalTheme::key_hint()),
            Span::styled("Assess ", ClinicalTheme::key_desc()),
            Span::styled("[S] ", ClinicalTheme::key_hint()),
            Span::styled("Sample Data ", ClinicalTheme::key_desc()),
            Span::styled("[Ctrl+Q] ", ClinicalTheme::key_hint()),
            Span::styled("Quit", ClinicalTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(ClinicalTheme::border()),
    );

    f.render_widget(footer, area);
}
