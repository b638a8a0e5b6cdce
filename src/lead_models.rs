use serde::{Deserialize, Serialize};

use crate::validators::digits;
use crate::wizard::FormValues;
use crate::wizard_models::{
    Branch, ChoiceField, FieldIssue, FieldRef, IssueKind, LeadType, MultiChoiceField, TextField,
    ToggleField,
};

/// Schema tag of the B2B payload
pub const B2B_FORM_VERSION: &str = "b2b-v1";
/// Schema tag of the end-consumer payload
pub const B2C_FORM_VERSION: &str = "cf-v1";

/// Lead payload posted to the lead webhook.
///
/// Serialized with a `lead_tipo` discriminator (`"b2b"` / `"b2c"`). Blank
/// optional text is sent as `null`, never as `""`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "lead_tipo")]
pub enum LeadRecord {
    #[serde(rename = "b2b")]
    B2b(B2bLead),
    #[serde(rename = "b2c")]
    B2c(B2cLead),
}

/// Reseller / sales agent lead (steps 1-6)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct B2bLead {
    pub consumidor_final: bool,
    pub form_version: String,

    /// "Lojista" or "Representante"
    pub tipo_parceria: String,

    // Step 2
    #[serde(rename = "empresa")]
    pub company_name: Option<String>,
    #[serde(rename = "razao_social")]
    pub legal_name: Option<String>,
    #[serde(rename = "cidade_uf")]
    pub city_state: Option<String>,
    /// CNPJ, digits only
    pub cnpj: String,

    // Step 3
    #[serde(rename = "responsavel_nome")]
    pub contact_name: Option<String>,
    #[serde(rename = "responsavel_cargo")]
    pub contact_role: Option<String>,
    /// Lowercased
    #[serde(rename = "email_comercial")]
    pub business_email: Option<String>,
    /// Digits only
    #[serde(rename = "telefone")]
    pub phone: String,

    // Step 4
    #[serde(rename = "segmento_atual")]
    pub current_segment: String,
    #[serde(rename = "marcas")]
    pub brands: Option<String>,
    #[serde(rename = "atuacao")]
    pub activities: Vec<String>,
    #[serde(rename = "tempo_mercado")]
    pub time_in_market: Option<String>,
    #[serde(rename = "equipe_comercial")]
    pub sales_team_size: Option<String>,
    #[serde(rename = "onde_vende")]
    pub sales_channels: Vec<String>,
    #[serde(rename = "publico_principal")]
    pub main_audience: Option<String>,
    #[serde(rename = "media_pedidos")]
    pub monthly_orders: Option<String>,

    // Step 5
    #[serde(rename = "como_conheceu")]
    pub how_found: Option<String>,
    #[serde(rename = "linhas_interesse")]
    pub product_lines: String,
    /// Only answered by "Lojista"
    #[serde(rename = "volume_inicial")]
    pub initial_volume: Option<String>,

    // Step 6
    #[serde(rename = "autorizo_contato")]
    pub contact_consent: bool,
    #[serde(rename = "observacoes")]
    pub notes: Option<String>,
}

/// End-consumer lead
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct B2cLead {
    pub consumidor_final: bool,
    pub form_version: String,
    pub tipo_parceria: String,
    #[serde(rename = "nome")]
    pub name: String,
    /// Lowercased
    pub email: String,
    /// Digits only
    #[serde(rename = "telefone")]
    pub phone: String,
    #[serde(rename = "optin_promocoes")]
    pub promo_opt_in: bool,
}

impl LeadRecord {
    /// Builds the payload for the active branch, re-running every validator
    /// of that branch first.
    pub fn from_values(values: &FormValues) -> Result<Self, Vec<FieldIssue>> {
        let issues = values.branch_issues();
        if !issues.is_empty() {
            return Err(issues);
        }

        let lead_type = values
            .lead_type()
            .ok_or_else(|| vec![FieldIssue::new(FieldRef::LeadType, IssueKind::Missing)])?;

        let record = match lead_type.branch() {
            Branch::B2b => LeadRecord::B2b(build_b2b(values, lead_type)),
            Branch::B2c => LeadRecord::B2c(build_b2c(values)),
        };
        Ok(record)
    }

    pub fn branch(&self) -> Branch {
        match self {
            LeadRecord::B2b(_) => Branch::B2b,
            LeadRecord::B2c(_) => Branch::B2c,
        }
    }

    /// Contact fields reported with the conversion: (email, phone digits)
    pub fn contact(&self) -> (Option<&str>, &str) {
        match self {
            LeadRecord::B2b(lead) => (lead.business_email.as_deref(), lead.phone.as_str()),
            LeadRecord::B2c(lead) => (Some(lead.email.as_str()), lead.phone.as_str()),
        }
    }
}

fn build_b2b(values: &FormValues, lead_type: LeadType) -> B2bLead {
    let choice = |field: ChoiceField| values.choice(field).map(str::to_string);

    B2bLead {
        consumidor_final: false,
        form_version: B2B_FORM_VERSION.to_string(),
        tipo_parceria: lead_type.label().to_string(),

        company_name: values.optional_text(TextField::CompanyName),
        legal_name: values.optional_text(TextField::LegalName),
        city_state: values.optional_text(TextField::CityState),
        cnpj: digits(values.text(TextField::BusinessId)),

        contact_name: values.optional_text(TextField::ContactName),
        contact_role: values.optional_text(TextField::ContactRole),
        business_email: values
            .optional_text(TextField::BusinessEmail)
            .map(|e| e.to_lowercase()),
        phone: digits(values.text(TextField::BusinessPhone)),

        current_segment: choice(ChoiceField::CurrentSegment).unwrap_or_default(),
        brands: values.optional_text(TextField::Brands),
        activities: values.multi(MultiChoiceField::Activities),
        time_in_market: choice(ChoiceField::TimeInMarket),
        sales_team_size: choice(ChoiceField::SalesTeamSize),
        sales_channels: values.multi(MultiChoiceField::SalesChannels),
        main_audience: values.optional_text(TextField::MainAudience),
        monthly_orders: choice(ChoiceField::MonthlyOrders),

        how_found: choice(ChoiceField::HowFound),
        product_lines: values.text(TextField::ProductLines).trim().to_string(),
        initial_volume: if values.is_choice_active(ChoiceField::InitialVolume) {
            choice(ChoiceField::InitialVolume)
        } else {
            None
        },

        contact_consent: values.toggle(ToggleField::ContactConsent),
        notes: values.optional_text(TextField::Notes),
    }
}

fn build_b2c(values: &FormValues) -> B2cLead {
    B2cLead {
        consumidor_final: true,
        form_version: B2C_FORM_VERSION.to_string(),
        tipo_parceria: LeadType::Individual.label().to_string(),
        name: values.text(TextField::FullName).trim().to_string(),
        email: values.text(TextField::PersonalEmail).trim().to_lowercase(),
        phone: digits(values.text(TextField::PersonalPhone)),
        promo_opt_in: values.toggle(ToggleField::PromoOptIn),
    }
}
