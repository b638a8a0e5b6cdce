/// Wizard engine for the lead form
///
/// The whole form session lives in a `WizardSession`: the typed values
/// (`FormValues`) plus the set of revealed steps. Every user action is a
/// method call that re-validates synchronously, so the gating state of each
/// step is always current.
///
/// Flow:
/// 1. `select_lead_type` picks the branch (B2B: 6 steps, B2C: 2 steps)
/// 2. Field edits (`set_text`, `select`, `set_multi`, `set_toggle`)
/// 3. `advance` reveals the next step of the branch once the current one passes
/// 4. `can_submit` gates the terminal step; `FormValues` is the snapshot handed
///    to the submission pipeline
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use crate::validators::{
    digits, is_valid_business_id, is_valid_email, is_valid_phone, mask_business_id, mask_phone,
};
use crate::wizard_models::{
    next_step, Branch, ChoiceField, FieldIssue, FieldRef, IssueKind, LeadType, MultiChoiceField,
    StepId, TextField, ToggleField, SEGMENT_YES,
};

/// Minimum trimmed length for required free text (names, brands, product lines)
const MIN_TEXT_LEN: usize = 2;

/// Progress bar never drops below this percentage
const MIN_PROGRESS: u8 = 5;

/// Errors for inputs the engine refuses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WizardError {
    /// Advancing before a lead type was chosen
    NoLeadType,
    /// The step is not currently revealed
    StepHidden(StepId),
    /// The step belongs to the inactive branch
    StepNotInBranch(StepId),
    /// Some step up to the current one has failing fields
    StepIncomplete(Vec<FieldIssue>),
    /// Conditional field is hidden for the current answers
    FieldHidden(FieldRef),
    /// Value is not one of the field's options
    UnknownOption { field: String, option: String },
}

impl fmt::Display for WizardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WizardError::NoLeadType => write!(f, "No lead type selected"),
            WizardError::StepHidden(step) => write!(f, "Step {:?} is not visible", step),
            WizardError::StepNotInBranch(step) => {
                write!(f, "Step {:?} is not part of the active branch", step)
            }
            WizardError::StepIncomplete(issues) => {
                write!(f, "Step incomplete: {} field(s) failing", issues.len())
            }
            WizardError::FieldHidden(field) => write!(f, "Field {:?} is hidden", field),
            WizardError::UnknownOption { field, option } => {
                write!(f, "Unknown option '{}' for {}", option, field)
            }
        }
    }
}

impl std::error::Error for WizardError {}

/// Snapshot of every value in the form.
///
/// Free text is stored as typed (masked fields carry their mask); trimming and
/// normalization happen only when validating or building the lead payload.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    lead_type: Option<LeadType>,
    texts: BTreeMap<TextField, String>,
    choices: BTreeMap<ChoiceField, String>,
    multi: BTreeMap<MultiChoiceField, BTreeSet<String>>,
    toggles: BTreeMap<ToggleField, bool>,
}

impl FormValues {
    pub fn lead_type(&self) -> Option<LeadType> {
        self.lead_type
    }

    pub fn branch(&self) -> Option<Branch> {
        self.lead_type.map(LeadType::branch)
    }

    /// Raw value as typed, `""` when never set
    pub fn text(&self, field: TextField) -> &str {
        self.texts.get(&field).map(String::as_str).unwrap_or("")
    }

    /// Trimmed value, `None` when blank
    pub fn optional_text(&self, field: TextField) -> Option<String> {
        let trimmed = self.text(field).trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    pub fn choice(&self, field: ChoiceField) -> Option<&str> {
        self.choices.get(&field).map(String::as_str)
    }

    /// Checked options, in the field's option order
    pub fn multi(&self, field: MultiChoiceField) -> Vec<String> {
        let Some(checked) = self.multi.get(&field) else {
            return Vec::new();
        };
        field
            .options()
            .iter()
            .filter(|opt| checked.contains(**opt))
            .map(|opt| opt.to_string())
            .collect()
    }

    pub fn toggle(&self, field: ToggleField) -> bool {
        self.toggles
            .get(&field)
            .copied()
            .unwrap_or_else(|| field.default_on())
    }

    /// Whether a conditional field is currently shown (and required).
    pub fn is_text_active(&self, field: TextField) -> bool {
        match field {
            TextField::Brands => self.choice(ChoiceField::CurrentSegment) == Some(SEGMENT_YES),
            _ => true,
        }
    }

    pub fn is_choice_active(&self, field: ChoiceField) -> bool {
        match field {
            ChoiceField::InitialVolume => self.lead_type == Some(LeadType::Business),
            _ => true,
        }
    }

    /// Failing required fields of one step. Empty means the step passes.
    pub fn step_issues(&self, step: StepId) -> Vec<FieldIssue> {
        let mut issues = Vec::new();

        match step {
            StepId::LeadType => {
                if self.lead_type.is_none() {
                    issues.push(FieldIssue::new(FieldRef::LeadType, IssueKind::Missing));
                }
            }
            StepId::Company => {
                self.check_business_id(&mut issues);
            }
            StepId::Contact => {
                self.check_phone(TextField::BusinessPhone, &mut issues);
                if !is_valid_email(self.text(TextField::BusinessEmail), false) {
                    issues.push(FieldIssue::new(
                        FieldRef::Text(TextField::BusinessEmail),
                        IssueKind::Invalid,
                    ));
                }
            }
            StepId::Business => {
                self.check_choice(ChoiceField::CurrentSegment, &mut issues);
                if self.is_text_active(TextField::Brands) {
                    self.check_min_text(TextField::Brands, &mut issues);
                }
            }
            StepId::Partnership => {
                self.check_min_text(TextField::ProductLines, &mut issues);
                if self.is_choice_active(ChoiceField::InitialVolume) {
                    self.check_choice(ChoiceField::InitialVolume, &mut issues);
                }
            }
            StepId::Consent => {}
            StepId::Individual => {
                self.check_min_text(TextField::FullName, &mut issues);
                if !is_valid_email(self.text(TextField::PersonalEmail), true) {
                    let kind = if self.text(TextField::PersonalEmail).trim().is_empty() {
                        IssueKind::Missing
                    } else {
                        IssueKind::Invalid
                    };
                    issues.push(FieldIssue::new(
                        FieldRef::Text(TextField::PersonalEmail),
                        kind,
                    ));
                }
                self.check_phone(TextField::PersonalPhone, &mut issues);
            }
        }

        issues
    }

    /// Failing required fields across the whole active branch.
    pub fn branch_issues(&self) -> Vec<FieldIssue> {
        let Some(branch) = self.branch() else {
            return vec![FieldIssue::new(FieldRef::LeadType, IssueKind::Missing)];
        };
        branch
            .steps()
            .iter()
            .flat_map(|step| self.step_issues(*step))
            .collect()
    }

    fn check_business_id(&self, issues: &mut Vec<FieldIssue>) {
        let raw = self.text(TextField::BusinessId);
        if !is_valid_business_id(raw) {
            let kind = if digits(raw).is_empty() {
                IssueKind::Missing
            } else {
                IssueKind::Invalid
            };
            issues.push(FieldIssue::new(FieldRef::Text(TextField::BusinessId), kind));
        }
    }

    fn check_phone(&self, field: TextField, issues: &mut Vec<FieldIssue>) {
        let raw = self.text(field);
        if !is_valid_phone(raw) {
            let kind = if digits(raw).is_empty() {
                IssueKind::Missing
            } else {
                IssueKind::Invalid
            };
            issues.push(FieldIssue::new(FieldRef::Text(field), kind));
        }
    }

    fn check_min_text(&self, field: TextField, issues: &mut Vec<FieldIssue>) {
        let len = self.text(field).trim().chars().count();
        if len == 0 {
            issues.push(FieldIssue::new(FieldRef::Text(field), IssueKind::Missing));
        } else if len < MIN_TEXT_LEN {
            issues.push(FieldIssue::new(FieldRef::Text(field), IssueKind::TooShort));
        }
    }

    fn check_choice(&self, field: ChoiceField, issues: &mut Vec<FieldIssue>) {
        if self.choice(field).is_none() {
            issues.push(FieldIssue::new(FieldRef::Choice(field), IssueKind::Missing));
        }
    }

    /// Clears radio/checkbox state of one step, keeping free text.
    fn clear_selections(&mut self, step: StepId) {
        self.choices.retain(|field, _| field.step() != step);
        self.multi.retain(|field, _| field.step() != step);
        self.toggles.retain(|field, _| field.step() != step);
    }
}

/// One form session: values plus revealed steps.
#[derive(Debug, Clone)]
pub struct WizardSession {
    values: FormValues,
    visible: BTreeSet<StepId>,
}

impl Default for WizardSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WizardSession {
    /// Step 1 visible, everything else hidden, no branch chosen.
    pub fn new() -> Self {
        let mut visible = BTreeSet::new();
        visible.insert(StepId::LeadType);
        Self {
            values: FormValues::default(),
            visible,
        }
    }

    pub fn values(&self) -> &FormValues {
        &self.values
    }

    /// Owned copy handed to the submission pipeline
    pub fn snapshot(&self) -> FormValues {
        self.values.clone()
    }

    pub fn lead_type(&self) -> Option<LeadType> {
        self.values.lead_type
    }

    pub fn branch(&self) -> Option<Branch> {
        self.values.branch()
    }

    pub fn is_visible(&self, step: StepId) -> bool {
        self.visible.contains(&step)
    }

    /// Revealed steps in branch order
    pub fn visible_steps(&self) -> Vec<StepId> {
        let branch = self.branch().unwrap_or(Branch::B2b);
        branch
            .steps()
            .iter()
            .copied()
            .filter(|s| self.visible.contains(s))
            .collect()
    }

    /// Furthest revealed step
    pub fn current_step(&self) -> StepId {
        self.visible_steps()
            .last()
            .copied()
            .unwrap_or(StepId::LeadType)
    }

    /// Picks the lead type. When the branch changes, the other branch's steps
    /// are hidden and their selections cleared; free text survives so the
    /// respondent can switch back without retyping, except for conditional
    /// fields whose trigger was cleared. Choosing the end-consumer type
    /// reveals its step right away.
    pub fn select_lead_type(&mut self, lead_type: LeadType) {
        let previous = self.values.lead_type;
        if previous == Some(lead_type) {
            return;
        }

        self.values.lead_type = Some(lead_type);
        let active = lead_type.branch();

        if previous.map(LeadType::branch) != Some(active) {
            let inactive: Vec<StepId> = [Branch::B2b, Branch::B2c]
                .into_iter()
                .filter(|b| *b != active)
                .flat_map(|b| b.steps().iter().copied())
                .filter(|s| !active.contains(*s))
                .collect();

            for step in inactive {
                self.visible.remove(&step);
                self.values.clear_selections(step);
            }
            tracing::debug!("Branch switched to {:?}", active);
        }

        // step 1 is complete once a type is chosen; the consumer step shows at once
        if active == Branch::B2c {
            self.visible.insert(StepId::Individual);
        }

        // conditional fields hidden by the cleared answers lose their values
        if !self.values.is_text_active(TextField::Brands) {
            self.values.texts.remove(&TextField::Brands);
        }

        if !self.values.is_choice_active(ChoiceField::InitialVolume) {
            self.values.choices.remove(&ChoiceField::InitialVolume);
        }
    }

    /// Stores a free-text value. CNPJ and phone inputs are masked as typed.
    pub fn set_text(&mut self, field: TextField, raw: &str) -> Result<(), WizardError> {
        if !self.values.is_text_active(field) {
            return Err(WizardError::FieldHidden(FieldRef::Text(field)));
        }

        let value = match field {
            TextField::BusinessId => mask_business_id(raw),
            TextField::BusinessPhone | TextField::PersonalPhone => mask_phone(raw),
            _ => raw.to_string(),
        };
        self.values.texts.insert(field, value);
        Ok(())
    }

    /// Selects a radio option.
    pub fn select(&mut self, field: ChoiceField, option: &str) -> Result<(), WizardError> {
        if !self.values.is_choice_active(field) {
            return Err(WizardError::FieldHidden(FieldRef::Choice(field)));
        }
        if !field.options().contains(&option) {
            return Err(WizardError::UnknownOption {
                field: format!("{:?}", field),
                option: option.to_string(),
            });
        }

        self.values.choices.insert(field, option.to_string());

        // hiding the brands field drops its value and requirement
        if field == ChoiceField::CurrentSegment && !self.values.is_text_active(TextField::Brands) {
            self.values.texts.remove(&TextField::Brands);
        }
        Ok(())
    }

    /// Checks or unchecks one option of a checkbox group.
    pub fn set_multi(
        &mut self,
        field: MultiChoiceField,
        option: &str,
        checked: bool,
    ) -> Result<(), WizardError> {
        if !field.options().contains(&option) {
            return Err(WizardError::UnknownOption {
                field: format!("{:?}", field),
                option: option.to_string(),
            });
        }

        let set = self.values.multi.entry(field).or_default();
        if checked {
            set.insert(option.to_string());
        } else {
            set.remove(option);
        }
        Ok(())
    }

    pub fn set_toggle(&mut self, field: ToggleField, on: bool) {
        self.values.toggles.insert(field, on);
    }

    /// Visible and passing its validators.
    pub fn is_step_complete(&self, step: StepId) -> bool {
        self.is_visible(step) && self.values.step_issues(step).is_empty()
    }

    /// State of a step's "next" control.
    pub fn can_advance(&self, step: StepId) -> bool {
        let Some(branch) = self.branch() else {
            return false;
        };
        branch.contains(step) && self.is_step_complete(step)
    }

    /// State of the submit control on the branch's terminal step.
    pub fn can_submit(&self) -> bool {
        match self.branch() {
            Some(branch) => {
                self.is_visible(branch.terminal_step()) && self.values.branch_issues().is_empty()
            }
            None => false,
        }
    }

    /// Reveals and returns the step after `from`, or `None` when `from` is the
    /// branch's terminal step.
    ///
    /// Every step of the branch up to and including `from` must pass, so steps
    /// are only ever revealed in ascending order.
    pub fn advance(&mut self, from: StepId) -> Result<Option<StepId>, WizardError> {
        let branch = self.branch().ok_or(WizardError::NoLeadType)?;
        let position = branch
            .position(from)
            .ok_or(WizardError::StepNotInBranch(from))?;
        if !self.is_visible(from) {
            return Err(WizardError::StepHidden(from));
        }

        let issues: Vec<FieldIssue> = branch.steps()[..=position]
            .iter()
            .flat_map(|step| self.values.step_issues(*step))
            .collect();
        if !issues.is_empty() {
            tracing::debug!("Advance from {:?} blocked: {} issue(s)", from, issues.len());
            return Err(WizardError::StepIncomplete(issues));
        }

        let next = next_step(branch, from);
        if let Some(step) = next {
            self.visible.insert(step);
        }
        Ok(next)
    }

    /// `round(100 * completed / total)`, floored at 5%.
    pub fn progress_percent(&self) -> u8 {
        let branch = self.branch().unwrap_or(Branch::B2b);
        let total = branch.total_steps();
        let completed = branch
            .steps()
            .iter()
            .filter(|s| self.is_step_complete(**s))
            .count();

        let pct = (200 * completed + total) / (2 * total);
        (pct as u8).max(MIN_PROGRESS)
    }

    /// Errors to render next to fields of `step`.
    ///
    /// Gating always uses the full validators; display waits until the input
    /// is plausibly finished (14 CNPJ digits, 10 phone digits, non-blank
    /// optional e-mail) so the respondent is not nagged mid-typing.
    pub fn inline_errors(&self, step: StepId) -> Vec<FieldIssue> {
        if !self.is_visible(step) {
            return Vec::new();
        }

        self.values
            .step_issues(step)
            .into_iter()
            .filter(|issue| match issue.field {
                FieldRef::Text(TextField::BusinessId) => {
                    digits(self.values.text(TextField::BusinessId)).len() == 14
                }
                FieldRef::Text(field @ (TextField::BusinessPhone | TextField::PersonalPhone)) => {
                    digits(self.values.text(field)).len() >= 10
                }
                FieldRef::Text(TextField::BusinessEmail) => {
                    !self.values.text(TextField::BusinessEmail).trim().is_empty()
                }
                FieldRef::Text(TextField::FullName) | FieldRef::Text(TextField::PersonalEmail) => {
                    true
                }
                _ => false,
            })
            .collect()
    }
}
