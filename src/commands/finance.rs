use tauri::AppHandle;

use super::with_conn;
use crate::models::{Bill, CreateBill, CreateInvoice, CreateQuote, Invoice, Quote};
use crate::store::finance;

// Invoices

#[tauri::command]
pub fn get_invoices(app: AppHandle) -> Result<Vec<Invoice>, String> {
    with_conn(&app, "get_invoices", finance::list_invoices)
}

#[tauri::command]
pub fn create_invoice(app: AppHandle, invoice: CreateInvoice) -> Result<Invoice, String> {
    with_conn(&app, "create_invoice", |conn| finance::create_invoice(conn, invoice))
}

#[tauri::command]
pub fn update_invoice(app: AppHandle, invoice: Invoice) -> Result<Invoice, String> {
    with_conn(&app, "update_invoice", |conn| finance::update_invoice(conn, invoice))
}

#[tauri::command]
pub fn mark_invoice_paid(app: AppHandle, id: String, paid_date: String) -> Result<Invoice, String> {
    with_conn(&app, "mark_invoice_paid", |conn| {
        finance::mark_invoice_paid(conn, &id, &paid_date)
    })
}

#[tauri::command]
pub fn delete_invoice(app: AppHandle, id: String) -> Result<(), String> {
    with_conn(&app, "delete_invoice", |conn| finance::delete_invoice(conn, &id))
}

// Bills

#[tauri::command]
pub fn get_bills(app: AppHandle) -> Result<Vec<Bill>, String> {
    with_conn(&app, "get_bills", finance::list_bills)
}

#[tauri::command]
pub fn create_bill(app: AppHandle, bill: CreateBill) -> Result<Bill, String> {
    with_conn(&app, "create_bill", |conn| finance::create_bill(conn, bill))
}

#[tauri::command]
pub fn update_bill(app: AppHandle, bill: Bill) -> Result<Bill, String> {
    with_conn(&app, "update_bill", |conn| finance::update_bill(conn, bill))
}

#[tauri::command]
pub fn mark_bill_paid(app: AppHandle, id: String, paid_date: String) -> Result<Bill, String> {
    with_conn(&app, "mark_bill_paid", |conn| {
        finance::mark_bill_paid(conn, &id, &paid_date)
    })
}

#[tauri::command]
pub fn delete_bill(app: AppHandle, id: String) -> Result<(), String> {
    with_conn(&app, "delete_bill", |conn| finance::delete_bill(conn, &id))
}

// Quotes

#[tauri::command]
pub fn get_quotes(app: AppHandle) -> Result<Vec<Quote>, String> {
    with_conn(&app, "get_quotes", finance::list_quotes)
}

#[tauri::command]
pub fn create_quote(app: AppHandle, quote: CreateQuote) -> Result<Quote, String> {
    with_conn(&app, "create_quote", |conn| finance::create_quote(conn, quote))
}

#[tauri::command]
pub fn update_quote(app: AppHandle, quote: Quote) -> Result<Quote, String> {
    with_conn(&app, "update_quote", |conn| finance::update_quote(conn, quote))
}

#[tauri::command]
pub fn delete_quote(app: AppHandle, id: String) -> Result<(), String> {
    with_conn(&app, "delete_quote", |conn| finance::delete_quote(conn, &id))
}
