use serde::{Deserialize, Serialize};

/// Which intake branch the respondent picked on step 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub enum LeadType {
    /// Reseller buying stock ("Lojista")
    #[serde(rename = "Lojista")]
    Business,
    /// Commissioned sales agent ("Representante")
    #[serde(rename = "Representante")]
    Agent,
    /// End consumer ("Consumidor Final")
    #[serde(rename = "Consumidor Final")]
    Individual,
}

impl LeadType {
    pub fn branch(self) -> Branch {
        match self {
            LeadType::Business | LeadType::Agent => Branch::B2b,
            LeadType::Individual => Branch::B2c,
        }
    }

    /// Label sent in the `tipo_parceria` field of the lead payload
    pub fn label(self) -> &'static str {
        match self {
            LeadType::Business => "Lojista",
            LeadType::Agent => "Representante",
            LeadType::Individual => "Consumidor Final",
        }
    }
}

/// Ordered subset of wizard steps applicable to a lead type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Branch {
    B2b,
    B2c,
}

impl Branch {
    /// Steps of this branch in reveal order (step 1 is shared)
    pub fn steps(self) -> &'static [StepId] {
        match self {
            Branch::B2b => &[
                StepId::LeadType,
                StepId::Company,
                StepId::Contact,
                StepId::Business,
                StepId::Partnership,
                StepId::Consent,
            ],
            Branch::B2c => &[StepId::LeadType, StepId::Individual],
        }
    }

    pub fn total_steps(self) -> usize {
        self.steps().len()
    }

    pub fn terminal_step(self) -> StepId {
        match self {
            Branch::B2b => StepId::Consent,
            Branch::B2c => StepId::Individual,
        }
    }

    /// Position of `step` within this branch, `None` when it belongs to the other branch
    pub fn position(self, step: StepId) -> Option<usize> {
        self.steps().iter().position(|s| *s == step)
    }

    pub fn contains(self, step: StepId) -> bool {
        self.position(step).is_some()
    }
}

/// A wizard step (a form section).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum StepId {
    /// 1/6: lead type choice, shared by both branches
    LeadType,
    /// 2/6: company data and CNPJ
    Company,
    /// 3/6: commercial contact
    Contact,
    /// 4/6: business profile
    Business,
    /// 5/6: partnership interest
    Partnership,
    /// 6/6: consent and notes
    Consent,
    /// End-consumer data
    Individual,
}

impl StepId {
    /// `None` for the shared first step
    pub fn branch(self) -> Option<Branch> {
        match self {
            StepId::LeadType => None,
            StepId::Individual => Some(Branch::B2c),
            _ => Some(Branch::B2b),
        }
    }
}

/// Outcome of a lookup in the transition table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Next(StepId),
    Terminal,
}

/// `(branch, current step) -> next step | terminal`
const TRANSITIONS: &[(Branch, StepId, Transition)] = &[
    (Branch::B2b, StepId::LeadType, Transition::Next(StepId::Company)),
    (Branch::B2b, StepId::Company, Transition::Next(StepId::Contact)),
    (Branch::B2b, StepId::Contact, Transition::Next(StepId::Business)),
    (Branch::B2b, StepId::Business, Transition::Next(StepId::Partnership)),
    (Branch::B2b, StepId::Partnership, Transition::Next(StepId::Consent)),
    (Branch::B2b, StepId::Consent, Transition::Terminal),
    (Branch::B2c, StepId::LeadType, Transition::Next(StepId::Individual)),
    (Branch::B2c, StepId::Individual, Transition::Terminal),
];

/// Looks up the transition for `step` in `branch`. `None` when the step is
/// not part of the branch.
pub fn transition(branch: Branch, step: StepId) -> Option<Transition> {
    TRANSITIONS
        .iter()
        .find(|(b, s, _)| *b == branch && *s == step)
        .map(|(_, _, t)| *t)
}

/// Next step after `step` in `branch`; `None` at the terminal step or for
/// steps of the other branch.
pub fn next_step(branch: Branch, step: StepId) -> Option<StepId> {
    match transition(branch, step)? {
        Transition::Next(next) => Some(next),
        Transition::Terminal => None,
    }
}

/// Free-text inputs. Values are kept exactly as typed (after masking).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum TextField {
    CompanyName,
    LegalName,
    CityState,
    BusinessId,
    ContactName,
    ContactRole,
    BusinessEmail,
    BusinessPhone,
    Brands,
    MainAudience,
    ProductLines,
    Notes,
    FullName,
    PersonalEmail,
    PersonalPhone,
}

impl TextField {
    pub fn step(self) -> StepId {
        match self {
            TextField::CompanyName
            | TextField::LegalName
            | TextField::CityState
            | TextField::BusinessId => StepId::Company,
            TextField::ContactName
            | TextField::ContactRole
            | TextField::BusinessEmail
            | TextField::BusinessPhone => StepId::Contact,
            TextField::Brands | TextField::MainAudience => StepId::Business,
            TextField::ProductLines => StepId::Partnership,
            TextField::Notes => StepId::Consent,
            TextField::FullName | TextField::PersonalEmail | TextField::PersonalPhone => {
                StepId::Individual
            }
        }
    }
}

/// Single-choice (radio) inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ChoiceField {
    CurrentSegment,
    TimeInMarket,
    SalesTeamSize,
    MonthlyOrders,
    HowFound,
    InitialVolume,
}

/// Answer to `CurrentSegment` that reveals the brands field
pub const SEGMENT_YES: &str = "Sim";

impl ChoiceField {
    pub fn step(self) -> StepId {
        match self {
            ChoiceField::CurrentSegment
            | ChoiceField::TimeInMarket
            | ChoiceField::SalesTeamSize
            | ChoiceField::MonthlyOrders => StepId::Business,
            ChoiceField::HowFound | ChoiceField::InitialVolume => StepId::Partnership,
        }
    }

    pub fn options(self) -> &'static [&'static str] {
        match self {
            ChoiceField::CurrentSegment => &[SEGMENT_YES, "Não"],
            ChoiceField::TimeInMarket => {
                &["Menos de 1 ano", "1 a 3 anos", "3 a 5 anos", "Mais de 5 anos"]
            }
            ChoiceField::SalesTeamSize => &["1 a 3", "4 a 10", "11 a 30", "Mais de 30"],
            ChoiceField::MonthlyOrders => &[
                "Até 50",
                "51 a 200",
                "201 a 500",
                "500 a 1000",
                "Mais de 1000",
            ],
            ChoiceField::HowFound => &[
                "Indicação",
                "Redes sociais",
                "Evento/Feira",
                "Google",
                "Outro",
            ],
            ChoiceField::InitialVolume => &[
                "Até R$2.000,00",
                "R$2.000,00 a R$5.000,00",
                "R$5.000,00 a R$10.000,00",
                "Acima de R$10.000,00",
            ],
        }
    }
}

/// Multi-choice (checkbox group) inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum MultiChoiceField {
    Activities,
    SalesChannels,
}

impl MultiChoiceField {
    pub fn step(self) -> StepId {
        StepId::Business
    }

    pub fn options(self) -> &'static [&'static str] {
        match self {
            MultiChoiceField::Activities => &[
                "Loja física",
                "Loja online / e-commerce",
                "Representante comercial",
                "Distribuidora",
                "Outro",
            ],
            MultiChoiceField::SalesChannels => &[
                "Loja física",
                "Loja online própria",
                "Marketplaces",
                "Redes sociais",
                "Vendas diretas / representantes",
            ],
        }
    }
}

/// Single checkbox inputs; both start checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum ToggleField {
    ContactConsent,
    PromoOptIn,
}

impl ToggleField {
    pub fn step(self) -> StepId {
        match self {
            ToggleField::ContactConsent => StepId::Consent,
            ToggleField::PromoOptIn => StepId::Individual,
        }
    }

    pub fn default_on(self) -> bool {
        true
    }
}

/// Reference to any validated input, used to anchor inline errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FieldRef {
    LeadType,
    Text(TextField),
    Choice(ChoiceField),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum IssueKind {
    /// Required value not provided
    Missing,
    /// Value present but fails its validator
    Invalid,
    /// Free text below the minimum length
    TooShort,
}

/// A failed validation anchored to its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FieldIssue {
    pub field: FieldRef,
    pub kind: IssueKind,
}

impl FieldIssue {
    pub fn new(field: FieldRef, kind: IssueKind) -> Self {
        Self { field, kind }
    }

    /// User-facing inline message shown next to the field
    pub fn message(&self) -> &'static str {
        match self.field {
            FieldRef::LeadType => "Selecione o tipo de cadastro.",
            FieldRef::Text(TextField::BusinessId) => "CNPJ inválido. Verifique e tente novamente.",
            FieldRef::Text(TextField::BusinessPhone) => {
                "Número inválido. Use DDD + número (10 a 11 dígitos) e evite sequências repetidas."
            }
            FieldRef::Text(TextField::PersonalPhone) => {
                "Número inválido. Use DDD + número (10 a 11 dígitos)."
            }
            FieldRef::Text(TextField::BusinessEmail) | FieldRef::Text(TextField::PersonalEmail) => {
                "E-mail inválido. Por favor, insira um e-mail válido."
            }
            FieldRef::Text(TextField::FullName) => "Informe seu nome.",
            FieldRef::Text(_) => "Preencha este campo.",
            FieldRef::Choice(_) => "Selecione uma opção.",
        }
    }
}

impl std::fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({:?})", self.field, self.kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lead_type_branches() {
        assert_eq!(LeadType::Business.branch(), Branch::B2b);
        assert_eq!(LeadType::Agent.branch(), Branch::B2b);
        assert_eq!(LeadType::Individual.branch(), Branch::B2c);
    }

    #[test]
    fn test_lead_type_serde_labels() {
        let json = serde_json::to_string(&LeadType::Individual).unwrap();
        assert_eq!(json, "\"Consumidor Final\"");
        let parsed: LeadType = serde_json::from_str("\"Lojista\"").unwrap();
        assert_eq!(parsed, LeadType::Business);
    }

    #[test]
    fn test_transition_table_b2b() {
        assert_eq!(next_step(Branch::B2b, StepId::LeadType), Some(StepId::Company));
        assert_eq!(next_step(Branch::B2b, StepId::Partnership), Some(StepId::Consent));
        assert_eq!(transition(Branch::B2b, StepId::Consent), Some(Transition::Terminal));
        assert_eq!(transition(Branch::B2b, StepId::Individual), None);
    }

    #[test]
    fn test_transition_table_b2c_skips_b2b_steps() {
        assert_eq!(next_step(Branch::B2c, StepId::LeadType), Some(StepId::Individual));
        assert_eq!(next_step(Branch::B2c, StepId::Individual), None);
        assert_eq!(transition(Branch::B2c, StepId::Company), None);
    }

    #[test]
    fn test_table_matches_branch_order() {
        for branch in [Branch::B2b, Branch::B2c] {
            let steps = branch.steps();
            for pair in steps.windows(2) {
                assert_eq!(next_step(branch, pair[0]), Some(pair[1]));
            }
            assert_eq!(steps.last().copied(), Some(branch.terminal_step()));
        }
    }

    #[test]
    fn test_field_steps_belong_to_one_branch() {
        assert_eq!(TextField::BusinessId.step().branch(), Some(Branch::B2b));
        assert_eq!(TextField::PersonalPhone.step().branch(), Some(Branch::B2c));
        assert_eq!(ToggleField::PromoOptIn.step(), StepId::Individual);
        assert_eq!(ChoiceField::InitialVolume.step(), StepId::Partnership);
    }
}
