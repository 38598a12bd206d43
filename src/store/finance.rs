//! Invoices, bills and quotes. Status is user-driven; the only enforced
//! transition is marking an invoice or bill as paid.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::new_id;
use crate::error::{AppError, Result};
use crate::models::{
    parse_date, Bill, BillStatus, CreateBill, CreateInvoice, CreateQuote, Invoice, InvoiceStatus,
    Quote,
};

fn check_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(AppError::validation("Amount must be greater than zero"));
    }
    Ok(())
}

fn check_date(label: &str, value: &str) -> Result<()> {
    if parse_date(value).is_none() {
        return Err(AppError::validation(format!(
            "Invalid {label} '{value}', expected YYYY-MM-DD"
        )));
    }
    Ok(())
}

// ===== INVOICES =====

const INVOICE_COLUMNS: &str =
    "id, number, client_name, amount, issue_date, due_date, status, paid_date, notes";

fn invoice_from_row(row: &Row<'_>) -> rusqlite::Result<Invoice> {
    Ok(Invoice {
        id: row.get(0)?,
        number: row.get(1)?,
        client_name: row.get(2)?,
        amount: row.get(3)?,
        issue_date: row.get(4)?,
        due_date: row.get(5)?,
        status: row.get(6)?,
        paid_date: row.get(7)?,
        notes: row.get(8)?,
    })
}

pub fn list_invoices(conn: &Connection) -> Result<Vec<Invoice>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INVOICE_COLUMNS} FROM invoices ORDER BY due_date"
    ))?;
    let invoices = stmt
        .query_map([], invoice_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(invoices)
}

pub fn get_invoice(conn: &Connection, id: &str) -> Result<Invoice> {
    conn.query_row(
        &format!("SELECT {INVOICE_COLUMNS} FROM invoices WHERE id = ?1"),
        [id],
        invoice_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Invoice", id))
}

pub fn create_invoice(conn: &Connection, invoice: CreateInvoice) -> Result<Invoice> {
    if invoice.number.trim().is_empty() {
        return Err(AppError::validation("Invoice number is required"));
    }
    check_amount(invoice.amount)?;
    check_date("issue date", &invoice.issue_date)?;
    check_date("due date", &invoice.due_date)?;

    let id = new_id();
    conn.execute(
        "INSERT INTO invoices (id, number, client_name, amount, issue_date, due_date, status, notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            id,
            invoice.number.trim(),
            invoice.client_name,
            invoice.amount,
            invoice.issue_date,
            invoice.due_date,
            InvoiceStatus::Pending,
            invoice.notes,
        ],
    )?;

    tracing::info!(invoice_id = %id, number = %invoice.number, "Invoice created");
    get_invoice(conn, &id)
}

/// Edit an invoice. Payment is recorded only through `mark_invoice_paid`, so
/// the status may not move to or from Paid here and `paid_date` is kept.
pub fn update_invoice(conn: &Connection, invoice: Invoice) -> Result<Invoice> {
    check_amount(invoice.amount)?;
    check_date("issue date", &invoice.issue_date)?;
    check_date("due date", &invoice.due_date)?;

    let current = get_invoice(conn, &invoice.id)?;
    if current.status != invoice.status
        && (current.status == InvoiceStatus::Paid || invoice.status == InvoiceStatus::Paid)
    {
        return Err(AppError::validation(format!(
            "Invoice {} cannot move from {} to {} by editing; use mark as paid",
            current.number, current.status, invoice.status
        )));
    }

    conn.execute(
        "UPDATE invoices SET number = ?1, client_name = ?2, amount = ?3, issue_date = ?4, due_date = ?5,
                             status = ?6, notes = ?7
         WHERE id = ?8",
        params![
            invoice.number,
            invoice.client_name,
            invoice.amount,
            invoice.issue_date,
            invoice.due_date,
            invoice.status,
            invoice.notes,
            invoice.id,
        ],
    )?;

    get_invoice(conn, &invoice.id)
}

pub fn mark_invoice_paid(conn: &Connection, id: &str, paid_date: &str) -> Result<Invoice> {
    check_date("payment date", paid_date)?;

    let invoice = get_invoice(conn, id)?;
    if invoice.status == InvoiceStatus::Paid {
        return Err(AppError::validation(format!(
            "Invoice {} is already paid",
            invoice.number
        )));
    }

    conn.execute(
        "UPDATE invoices SET status = ?1, paid_date = ?2 WHERE id = ?3",
        params![InvoiceStatus::Paid, paid_date, id],
    )?;

    tracing::info!(invoice_id = %id, paid_date, "Invoice marked paid");
    get_invoice(conn, id)
}

pub fn delete_invoice(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM invoices WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(AppError::not_found("Invoice", id));
    }
    Ok(())
}

// ===== BILLS =====

const BILL_COLUMNS: &str = "id, supplier, description, amount, due_date, status, paid_date";

fn bill_from_row(row: &Row<'_>) -> rusqlite::Result<Bill> {
    Ok(Bill {
        id: row.get(0)?,
        supplier: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        due_date: row.get(4)?,
        status: row.get(5)?,
        paid_date: row.get(6)?,
    })
}

pub fn list_bills(conn: &Connection) -> Result<Vec<Bill>> {
    let mut stmt = conn.prepare(&format!("SELECT {BILL_COLUMNS} FROM bills ORDER BY due_date"))?;
    let bills = stmt
        .query_map([], bill_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(bills)
}

pub fn get_bill(conn: &Connection, id: &str) -> Result<Bill> {
    conn.query_row(
        &format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = ?1"),
        [id],
        bill_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Bill", id))
}

pub fn create_bill(conn: &Connection, bill: CreateBill) -> Result<Bill> {
    if bill.supplier.trim().is_empty() {
        return Err(AppError::validation("Supplier is required"));
    }
    check_amount(bill.amount)?;
    check_date("due date", &bill.due_date)?;

    let id = new_id();
    conn.execute(
        "INSERT INTO bills (id, supplier, description, amount, due_date, status) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            id,
            bill.supplier.trim(),
            bill.description,
            bill.amount,
            bill.due_date,
            BillStatus::Unpaid,
        ],
    )?;

    get_bill(conn, &id)
}

/// Edit a bill's details. Status and payment date only change through
/// `mark_bill_paid`.
pub fn update_bill(conn: &Connection, bill: Bill) -> Result<Bill> {
    check_amount(bill.amount)?;
    check_date("due date", &bill.due_date)?;

    let current = get_bill(conn, &bill.id)?;
    if current.status != bill.status {
        return Err(AppError::validation(format!(
            "Bill from {} cannot move from {} to {} by editing",
            current.supplier, current.status, bill.status
        )));
    }

    conn.execute(
        "UPDATE bills SET supplier = ?1, description = ?2, amount = ?3, due_date = ?4 WHERE id = ?5",
        params![
            bill.supplier,
            bill.description,
            bill.amount,
            bill.due_date,
            bill.id,
        ],
    )?;

    get_bill(conn, &bill.id)
}

pub fn mark_bill_paid(conn: &Connection, id: &str, paid_date: &str) -> Result<Bill> {
    check_date("payment date", paid_date)?;

    let bill = get_bill(conn, id)?;
    if bill.status == BillStatus::Paid {
        return Err(AppError::validation(format!(
            "Bill from {} is already paid",
            bill.supplier
        )));
    }

    conn.execute(
        "UPDATE bills SET status = ?1, paid_date = ?2 WHERE id = ?3",
        params![BillStatus::Paid, paid_date, id],
    )?;

    tracing::info!(bill_id = %id, paid_date, "Bill marked paid");
    get_bill(conn, id)
}

pub fn delete_bill(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM bills WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(AppError::not_found("Bill", id));
    }
    Ok(())
}

// ===== QUOTES =====

const QUOTE_COLUMNS: &str = "id, client_name, description, amount, date, valid_until, status";

fn quote_from_row(row: &Row<'_>) -> rusqlite::Result<Quote> {
    Ok(Quote {
        id: row.get(0)?,
        client_name: row.get(1)?,
        description: row.get(2)?,
        amount: row.get(3)?,
        date: row.get(4)?,
        valid_until: row.get(5)?,
        status: row.get(6)?,
    })
}

pub fn list_quotes(conn: &Connection) -> Result<Vec<Quote>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {QUOTE_COLUMNS} FROM quotes ORDER BY date DESC"
    ))?;
    let quotes = stmt
        .query_map([], quote_from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    Ok(quotes)
}

pub fn get_quote(conn: &Connection, id: &str) -> Result<Quote> {
    conn.query_row(
        &format!("SELECT {QUOTE_COLUMNS} FROM quotes WHERE id = ?1"),
        [id],
        quote_from_row,
    )
    .optional()?
    .ok_or_else(|| AppError::not_found("Quote", id))
}

pub fn create_quote(conn: &Connection, quote: CreateQuote) -> Result<Quote> {
    if quote.client_name.trim().is_empty() {
        return Err(AppError::validation("Client name is required"));
    }
    check_amount(quote.amount)?;
    check_date("quote date", &quote.date)?;

    let id = new_id();
    conn.execute(
        "INSERT INTO quotes (id, client_name, description, amount, date, valid_until, status)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'Draft')",
        params![
            id,
            quote.client_name.trim(),
            quote.description,
            quote.amount,
            quote.date,
            quote.valid_until,
        ],
    )?;

    get_quote(conn, &id)
}

pub fn update_quote(conn: &Connection, quote: Quote) -> Result<Quote> {
    check_amount(quote.amount)?;
    check_date("quote date", &quote.date)?;

    let changed = conn.execute(
        "UPDATE quotes SET client_name = ?1, description = ?2, amount = ?3, date = ?4, valid_until = ?5, status = ?6
         WHERE id = ?7",
        params![
            quote.client_name,
            quote.description,
            quote.amount,
            quote.date,
            quote.valid_until,
            quote.status,
            quote.id,
        ],
    )?;

    if changed == 0 {
        return Err(AppError::not_found("Quote", quote.id));
    }

    get_quote(conn, &quote.id)
}

pub fn delete_quote(conn: &Connection, id: &str) -> Result<()> {
    let changed = conn.execute("DELETE FROM quotes WHERE id = ?1", [id])?;
    if changed == 0 {
        return Err(AppError::not_found("Quote", id));
    }
    Ok(())
}
