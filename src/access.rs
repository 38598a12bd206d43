use crate::config::AppConfig;
use crate::models::Role;

/// Role for a signed-in account. Configured admin emails always win; then
/// the role stored with the account; everyone else is a customer.
pub fn resolve_role(config: &AppConfig, email: &str, stored: Option<Role>) -> Role {
    let email = email.trim();
    if config
        .admin_emails
        .iter()
        .any(|admin| admin.trim().eq_ignore_ascii_case(email))
    {
        return Role::Admin;
    }
    stored.unwrap_or(Role::Customer)
}
