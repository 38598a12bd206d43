use chrono::{NaiveDate, NaiveTime};
use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::AppError;

/// Declares a closed set of values that travel as display text, both over
/// IPC and in the database.
macro_rules! text_enum {
    ($(#[$meta:meta])* $name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = AppError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(AppError::validation(format!(
                        "Unknown {} '{}'",
                        stringify!($name),
                        other
                    ))),
                }
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_str())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let s = String::deserialize(deserializer)?;
                s.parse().map_err(serde::de::Error::custom)
            }
        }

        impl ToSql for $name {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $name {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                value
                    .as_str()?
                    .parse()
                    .map_err(|e: AppError| FromSqlError::Other(e.to_string().into()))
            }
        }
    };
}

text_enum!(
    /// Where a job sits in its lifecycle. Completed is terminal.
    JobStatus {
        Unscheduled => "Unscheduled",
        Scheduled => "Scheduled",
        InProgress => "In Progress",
        Completed => "Completed",
    }
);

text_enum!(StaffPosition {
    OwnerManager => "Owner/Manager",
    Staff => "Staff",
    Contractor => "Contractor",
});

text_enum!(ConsumableType {
    Consumable => "Consumable",
    PlantEquipment => "Plant & Equipment",
    OfficeEquipment => "Office Equipment",
});

text_enum!(InvoiceStatus {
    Paid => "Paid",
    Pending => "Pending",
    Overdue => "Overdue",
});

text_enum!(BillStatus {
    Paid => "Paid",
    Unpaid => "Unpaid",
});

text_enum!(QuoteStatus {
    Draft => "Draft",
    Sent => "Sent",
    Accepted => "Accepted",
    Declined => "Declined",
});

text_enum!(Role {
    Admin => "admin",
    Staff => "staff",
    Customer => "customer",
});

// ===== JOBS =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Job {
    pub id: String,
    pub client_name: String,
    pub address: String,
    pub date: String, // YYYY-MM-DD or empty
    pub time: String, // HH:MM or empty
    pub description: String,
    pub status: JobStatus,
    pub cleaner_ids: Vec<String>,
    pub estimated_duration: Option<u32>, // minutes
    pub quoted_price: Option<f64>,
    pub estimated_value: Option<f64>,
    pub notes: Option<String>,
    pub completed_at: Option<String>,
    pub price_charged: Option<f64>,
    pub created_at: String,
}

impl Job {
    pub fn scheduled_date(&self) -> Option<NaiveDate> {
        parse_date(&self.date)
    }

    pub fn start_time(&self) -> Option<NaiveTime> {
        parse_time(&self.time)
    }

    pub fn is_assigned_to(&self, staff_id: &str) -> bool {
        self.cleaner_ids.iter().any(|id| id == staff_id)
    }
}

#[derive(Debug, Serialize, Deserialize, Default)]
pub struct CreateJob {
    pub client_name: String,
    pub address: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub description: String,
    #[serde(default)]
    pub cleaner_ids: Vec<String>,
    pub estimated_duration: Option<u32>,
    pub quoted_price: Option<f64>,
    pub estimated_value: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateJob {
    pub id: String,
    pub client_name: String,
    pub address: String,
    pub date: Option<String>,
    pub time: Option<String>,
    pub description: String,
    #[serde(default)]
    pub cleaner_ids: Vec<String>,
    pub estimated_duration: Option<u32>,
    pub quoted_price: Option<f64>,
    pub estimated_value: Option<f64>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssignJob {
    pub job_id: String,
    pub cleaner_ids: Vec<String>,
    pub date: String,
    pub time: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CompleteJob {
    pub job_id: String,
    pub price_charged: f64,
    pub notes: Option<String>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Validation {
    pub is_valid: bool,
    pub errors: Vec<String>,
}

impl Validation {
    pub fn from_errors(errors: Vec<String>) -> Self {
        Validation {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn into_result(self) -> Result<(), AppError> {
        if self.is_valid {
            Ok(())
        } else {
            Err(AppError::Validation(self.errors.join("; ")))
        }
    }
}

// ===== JOB REGISTER =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct JobRecord {
    pub id: String,
    pub job_id: String,
    pub client_name: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub address: String,
    pub staff: Vec<String>,
    pub price_charged: f64,
    pub notes: Option<String>,
    pub completed_at: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MonthlyRevenue {
    pub month: String, // YYYY-MM
    pub label: String, // January 2024
    pub job_count: i64,
    pub revenue: f64,
    pub records: Vec<JobRecord>,
}

// ===== STAFF =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Staff {
    pub id: String,
    pub name: String,
    pub email: String,
    pub position: StaffPosition,
    pub skills: Vec<String>,
    pub location: String,
    pub availability: String,
    pub avatar: Option<String>,
    pub archived: bool,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateStaff {
    pub name: String,
    pub email: String,
    pub position: StaffPosition,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub availability: String,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateStaff {
    pub id: String,
    pub name: String,
    pub email: String,
    pub position: StaffPosition,
    #[serde(default)]
    pub skills: Vec<String>,
    pub location: String,
    pub availability: String,
    pub avatar: Option<String>,
}

// ===== CLIENTS =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Client {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar: Option<String>,
    pub upcoming_jobs: i64,
    pub total_spent: f64,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateClient {
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateClient {
    pub id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub avatar: Option<String>,
}

// ===== PURCHASES =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Consumable {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub consumable_type: ConsumableType,
    pub purchased_from: String,
    pub purchase_amount: f64,
    pub date_purchased: String,
    pub receipt_path: Option<String>,
    pub created_by: String,
    pub created_at: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateConsumable {
    pub name: String,
    #[serde(rename = "type")]
    pub consumable_type: ConsumableType,
    pub purchased_from: String,
    pub purchase_amount: f64,
    pub date_purchased: String,
    pub receipt_path: Option<String>,
    pub created_by: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConsumableMonth {
    pub month: String,
    pub label: String,
    pub total: f64,
    pub items: Vec<Consumable>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TypeTotal {
    #[serde(rename = "type")]
    pub consumable_type: ConsumableType,
    pub count: i64,
    pub total: f64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EofySummary {
    pub financial_year: String, // e.g. 2023-24
    pub start_date: String,
    pub end_date: String,
    pub totals_by_type: Vec<TypeTotal>,
    pub total: f64,
    pub records: Vec<Consumable>,
}

// ===== FINANCE DOCUMENTS =====

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Invoice {
    pub id: String,
    pub number: String,
    pub client_name: String,
    pub amount: f64,
    pub issue_date: String,
    pub due_date: String,
    pub status: InvoiceStatus,
    pub paid_date: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateInvoice {
    pub number: String,
    pub client_name: String,
    pub amount: f64,
    pub issue_date: String,
    pub due_date: String,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Bill {
    pub id: String,
    pub supplier: String,
    pub description: String,
    pub amount: f64,
    pub due_date: String,
    pub status: BillStatus,
    pub paid_date: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBill {
    pub supplier: String,
    pub description: String,
    pub amount: f64,
    pub due_date: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Quote {
    pub id: String,
    pub client_name: String,
    pub description: String,
    pub amount: f64,
    pub date: String,
    pub valid_until: Option<String>,
    pub status: QuoteStatus,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateQuote {
    pub client_name: String,
    pub description: String,
    pub amount: f64,
    pub date: String,
    pub valid_until: Option<String>,
}

// ===== SETTINGS =====

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

pub fn parse_time(value: &str) -> Option<NaiveTime> {
    let value = value.trim();
    NaiveTime::parse_from_str(value, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(value, "%H:%M:%S"))
        .ok()
}
