use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::collections::BTreeMap;

use crate::db::{new_id, now_timestamp};
use crate::error::{AppError, Result};
use crate::format::format_month;
use crate::models::{
    parse_date, Consumable, ConsumableMonth, ConsumableType, CreateConsumable, EofySummary,
    TypeTotal, Validation,
};

const CONSUMABLE_COLUMNS: &str =
    "id, name, type, purchased_from, purchase_amount, date_purchased, receipt_path, created_by, created_at";

fn consumable_from_row(row: &Row<'_>) -> rusqlite::Result<Consumable> {
    Ok(Consumable {
        id: row.get(0)?,
        name: row.get(1)?,
        consumable_type: row.get(2)?,
        purchased_from: row.get(3)?,
        purchase_amount: row.get(4)?,
        date_purchased: row.get(5)?,
        receipt_path: row.get(6)?,
        created_by: row.get(7)?,
        created_at: row.get(8)?,
    })
}

pub fn validate_purchase(purchase: &CreateConsumable) -> Validation {
    let mut errors = Vec::new();

    if purchase.name.trim().is_empty() {
        errors.push("Item name is required".to_string());
    }
    if !purchase.purchase_amount.is_finite() || purchase.purchase_amount <= 0.0 {
        errors.push("Purchase amount must be greater than zero".to_string());
    }
    if parse_date(&purchase.date_purchased).is_none() {
        errors.push(format!(
            "Invalid purchase date '{}', expected YYYY-MM-DD",
            purchase.date_purchased
        ));
    }

    Validation::from_errors(errors)
}

pub fn list_consumables(conn: &Connection) -> Result<Vec<Consumable>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CONSUMABLE_COLUMNS} FROM consumables ORDER BY date_purchased DESC, created_at DESC"
    ))?;
    let items = stmt
        .query_map([], consumable_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(items)
}

pub fn get_consumable(conn: &Connection, id: &str) -> Result<Consumable> {
    conn.query_row(
        &format!("SELECT {CONSUMABLE_COLUMNS} FROM consumables WHERE id = ?1"),
        [id],
        consumable_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Purchase", id))
}

pub fn create_consumable(conn: &Connection, purchase: CreateConsumable) -> Result<Consumable> {
    validate_purchase(&purchase).into_result()?;

    let id = new_id();
    conn.execute(
        &format!("INSERT INTO consumables ({CONSUMABLE_COLUMNS}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)"),
        params![
            id,
            purchase.name.trim(),
            purchase.consumable_type,
            purchase.purchased_from,
            purchase.purchase_amount,
            purchase.date_purchased.trim(),
            purchase.receipt_path,
            purchase.created_by,
            now_timestamp(),
        ],
    )?;

    tracing::info!(purchase_id = %id, amount = purchase.purchase_amount, "Purchase recorded");
    get_consumable(conn, &id)
}

pub fn update_consumable(conn: &Connection, id: &str, purchase: CreateConsumable) -> Result<Consumable> {
    validate_purchase(&purchase).into_result()?;

    let changed = conn.execute(
        "UPDATE consumables SET name = ?1, type = ?2, purchased_from = ?3, purchase_amount = ?4,
                                date_purchased = ?5, receipt_path = ?6
         WHERE id = ?7",
        params![
            purchase.name.trim(),
            purchase.consumable_type,
            purchase.purchased_from,
            purchase.purchase_amount,
            purchase.date_purchased.trim(),
            purchase.receipt_path,
            id,
        ],
    )?;

    if changed == 0 {
        return Err(AppError::not_found("Purchase", id));
    }

    get_consumable(conn, id)
}

pub fn delete_consumable(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM consumables WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(AppError::not_found("Purchase", id));
    }
    Ok(())
}

/// Purchases grouped by month, newest month first.
pub fn group_by_month(items: Vec<Consumable>) -> Vec<ConsumableMonth> {
    let mut months: BTreeMap<String, Vec<Consumable>> = BTreeMap::new();
    for item in items {
        let month = item.date_purchased.get(..7).unwrap_or_default().to_string();
        months.entry(month).or_default().push(item);
    }

    months
        .into_iter()
        .rev()
        .map(|(month, items)| ConsumableMonth {
            label: format_month(&month),
            total: items.iter().map(|i| i.purchase_amount).sum(),
            month,
            items,
        })
        .collect()
}

/// Australian financial year ending 30 June of `fy_end_year`.
pub fn financial_year_bounds(fy_end_year: i32) -> Result<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(fy_end_year - 1, 7, 1);
    let end = NaiveDate::from_ymd_opt(fy_end_year, 6, 30);
    match (start, end) {
        (Some(start), Some(end)) => Ok((start, end)),
        _ => Err(AppError::validation(format!(
            "Invalid financial year {fy_end_year}"
        ))),
    }
}

pub fn eofy_summary(conn: &Connection, fy_end_year: i32) -> Result<EofySummary> {
    let (start, end) = financial_year_bounds(fy_end_year)?;
    let start_date = start.format("%Y-%m-%d").to_string();
    let end_date = end.format("%Y-%m-%d").to_string();

    let mut stmt = conn.prepare(&format!(
        "SELECT {CONSUMABLE_COLUMNS} FROM consumables
         WHERE date_purchased >= ?1 AND date_purchased <= ?2
         ORDER BY date_purchased, created_at"
    ))?;
    let records = stmt
        .query_map(params![start_date, end_date], consumable_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    let totals_by_type = ConsumableType::ALL
        .iter()
        .map(|&consumable_type| {
            let matching = records.iter().filter(|r| r.consumable_type == consumable_type);
            TypeTotal {
                consumable_type,
                count: matching.clone().count() as i64,
                total: matching.map(|r| r.purchase_amount).sum(),
            }
        })
        .collect::<Vec<_>>();

    let total: f64 = records.iter().map(|r| r.purchase_amount).sum();

    tracing::debug!(fy_end_year, records = records.len(), "Built EOFY summary");

    Ok(EofySummary {
        financial_year: format!("{}-{:02}", fy_end_year - 1, fy_end_year.rem_euclid(100)),
        start_date,
        end_date,
        totals_by_type,
        total,
        records,
    })
}
