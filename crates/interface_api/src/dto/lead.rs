//! Lead DTOs

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::{PartnerId, TaxId};
use domain_crm::{Lead, LeadFilter, LeadType, NewLead};

use crate::dto::non_blank;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct LeadQuery {
    pub tax_id: Option<String>,
    pub stage: Option<String>,
    #[serde(rename = "type")]
    pub lead_type: Option<String>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl LeadQuery {
    pub fn into_filter(self) -> Result<LeadFilter, ApiError> {
        Ok(LeadFilter {
            tax_id: non_blank(self.tax_id)
                .map(|raw| TaxId::parse(&raw))
                .transpose()?,
            stage: non_blank(self.stage),
            lead_type: non_blank(self.lead_type)
                .map(|raw| raw.parse::<LeadType>())
                .transpose()?,
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateLeadRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    #[serde(rename = "type")]
    pub lead_type: Option<LeadType>,
    pub partner_id: Option<i64>,
    pub tax_id: Option<String>,
    pub company_name: Option<String>,
    pub contact_name: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 64))]
    pub phone: Option<String>,
    pub expected_revenue: Option<Decimal>,
    pub description: Option<String>,
}

impl TryFrom<CreateLeadRequest> for NewLead {
    type Error = ApiError;

    fn try_from(request: CreateLeadRequest) -> Result<Self, Self::Error> {
        Ok(NewLead {
            title: request.title,
            lead_type: request.lead_type,
            partner_id: request.partner_id.map(PartnerId::new),
            tax_id: non_blank(request.tax_id)
                .map(|raw| TaxId::parse(&raw))
                .transpose()?,
            company_name: request.company_name,
            contact_name: request.contact_name,
            email: request.email,
            phone: request.phone,
            expected_revenue: request.expected_revenue,
            description: request.description,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct LeadsResponse {
    pub leads: Vec<Lead>,
}
