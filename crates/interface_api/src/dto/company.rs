//! Company DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

use core_kernel::TaxId;
use domain_partner::{Company, CompanyFilter, CompanyUpdate, NewCompany};

use crate::dto::non_blank;
use crate::error::ApiError;

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CompanyQuery {
    pub name: Option<String>,
    pub tax_id: Option<String>,
    pub city: Option<String>,
    #[validate(range(min = 1, max = 500))]
    pub limit: Option<u32>,
    pub offset: Option<u32>,
}

impl CompanyQuery {
    pub fn into_filter(self) -> Result<CompanyFilter, ApiError> {
        let tax_id = non_blank(self.tax_id)
            .map(|raw| TaxId::parse(&raw))
            .transpose()?;
        Ok(CompanyFilter {
            name: non_blank(self.name),
            tax_id,
            city: non_blank(self.city),
            limit: self.limit,
            offset: self.offset,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCompanyRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    pub tax_id: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 64))]
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    #[validate(length(max = 16))]
    pub zip: Option<String>,
}

impl TryFrom<CreateCompanyRequest> for NewCompany {
    type Error = ApiError;

    fn try_from(request: CreateCompanyRequest) -> Result<Self, Self::Error> {
        let tax_id = non_blank(request.tax_id)
            .map(|raw| TaxId::parse(&raw))
            .transpose()?;
        Ok(NewCompany {
            tax_id,
            email: request.email,
            phone: request.phone,
            street: request.street,
            city: request.city,
            zip: request.zip,
            ..NewCompany::new(request.name)
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateCompanyRequest {
    #[validate(length(min = 1, max = 255))]
    pub name: Option<String>,
    pub tax_id: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(length(max = 64))]
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
    #[validate(length(max = 16))]
    pub zip: Option<String>,
}

impl TryFrom<UpdateCompanyRequest> for CompanyUpdate {
    type Error = ApiError;

    fn try_from(request: UpdateCompanyRequest) -> Result<Self, Self::Error> {
        let tax_id = non_blank(request.tax_id)
            .map(|raw| TaxId::parse(&raw))
            .transpose()?;
        Ok(CompanyUpdate {
            name: request.name,
            tax_id,
            email: request.email,
            phone: request.phone,
            street: request.street,
            city: request.city,
            zip: request.zip,
        })
    }
}

#[derive(Debug, Serialize)]
pub struct CompaniesResponse {
    pub companies: Vec<Company>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}
