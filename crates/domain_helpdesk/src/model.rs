//! Ticket model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use core_kernel::erp_serde::{erp_datetime_opt, falsy_as_none};
use core_kernel::{Domain, Many2One, Operator, SearchReadOptions, TaxId, TeamId, TicketId};

pub const MODEL: &str = "helpdesk.ticket";

pub const TICKET_FIELDS: &[&str] = &[
    "name",
    "partner_id",
    "team_id",
    "stage_id",
    "user_id",
    "priority",
    "create_date",
    "close_date",
];

/// A helpdesk ticket as exposed by the gateway
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    pub id: TicketId,
    #[serde(rename(deserialize = "name", serialize = "subject"))]
    pub subject: String,
    #[serde(
        rename(deserialize = "partner_id", serialize = "customer"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub customer: Option<Many2One>,
    #[serde(
        rename(deserialize = "team_id", serialize = "team"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub team: Option<Many2One>,
    #[serde(
        rename(deserialize = "stage_id", serialize = "stage"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub stage: Option<Many2One>,
    #[serde(
        rename(deserialize = "user_id", serialize = "assignee"),
        default,
        deserialize_with = "falsy_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub assignee: Option<Many2One>,
    /// Priority code as the ERP stores it ("0" lowest)
    #[serde(default, deserialize_with = "falsy_as_none", skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(
        rename(deserialize = "create_date", serialize = "created_at"),
        default,
        deserialize_with = "erp_datetime_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        rename(deserialize = "close_date", serialize = "closed_at"),
        default,
        deserialize_with = "erp_datetime_opt",
        skip_serializing_if = "Option::is_none"
    )]
    pub closed_at: Option<DateTime<Utc>>,
}

impl Ticket {
    pub fn is_closed(&self) -> bool {
        self.closed_at.is_some()
    }
}

/// Ticket search criteria; tickets are always scoped to one customer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketFilter {
    pub tax_id: TaxId,
    pub team_id: Option<TeamId>,
    pub include_closed: bool,
}

impl TicketFilter {
    pub fn new(tax_id: TaxId) -> Self {
        Self {
            tax_id,
            team_id: None,
            include_closed: false,
        }
    }

    pub fn team(mut self, team_id: TeamId) -> Self {
        self.team_id = Some(team_id);
        self
    }

    pub fn include_closed(mut self, include_closed: bool) -> Self {
        self.include_closed = include_closed;
        self
    }

    pub fn to_domain(&self) -> Domain {
        let domain = Domain::new()
            .eq("partner_id.vat", self.tax_id.digits())
            .filter_opt("team_id", Operator::Eq, self.team_id);
        if self.include_closed {
            domain
        } else {
            domain.eq("close_date", false)
        }
    }

    pub fn options(&self) -> SearchReadOptions {
        SearchReadOptions::new()
            .fields(TICKET_FIELDS)
            .order("create_date desc")
    }
}
