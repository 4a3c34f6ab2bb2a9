//! Built-in business domains.
//!
//! Tables are listed parents-first for readability, but the generation order
//! is always derived from the foreign keys, never from this listing.

use crate::schema::types::{ColumnSpec, TableSpec, TextKind};

/// Every built-in domain in registration order.
pub fn domains() -> Vec<(&'static str, Vec<TableSpec>)> {
    vec![
        ("retail", retail()),
        ("healthcare", healthcare()),
        ("technology", technology()),
        ("finance", finance()),
    ]
}

pub fn retail() -> Vec<TableSpec> {
    vec![
        TableSpec::new("categories")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("name", TextKind::Word))
            .column(ColumnSpec::text("description", TextKind::Sentence).nullable()),
        TableSpec::new("products")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("name", TextKind::ProductName))
            .column(ColumnSpec::text("sku", TextKind::Sku))
            .column(ColumnSpec::reference("category_id"))
            .column(ColumnSpec::decimal("price", 5.0, 500.0))
            .column(ColumnSpec::decimal("cost", 2.0, 250.0))
            .column(ColumnSpec::integer("stock_quantity", 0, 1000))
            .column(ColumnSpec::timestamp("created_at"))
            .column(ColumnSpec::timestamp("updated_at"))
            .references("category_id", "categories")
            .below("cost", "price")
            .not_before("updated_at", "created_at"),
        TableSpec::new("customers")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("first_name", TextKind::FirstName))
            .column(ColumnSpec::text("last_name", TextKind::LastName))
            .column(ColumnSpec::text("email", TextKind::Email))
            .column(ColumnSpec::text("phone", TextKind::Phone).nullable())
            .column(ColumnSpec::text("address", TextKind::StreetAddress))
            .column(ColumnSpec::text("city", TextKind::City))
            .column(ColumnSpec::text("postal_code", TextKind::PostalCode))
            .column(ColumnSpec::date("registration_date")),
        TableSpec::new("orders")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("customer_id"))
            .column(ColumnSpec::timestamp("order_date"))
            .column(ColumnSpec::decimal("total_amount", 10.0, 2000.0))
            .column(ColumnSpec::status(
                "status",
                &["pending", "processing", "shipped", "delivered", "cancelled"],
            ))
            .column(ColumnSpec::text("shipping_address", TextKind::StreetAddress))
            .references("customer_id", "customers"),
        TableSpec::new("order_items")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("order_id"))
            .column(ColumnSpec::reference("product_id"))
            .column(ColumnSpec::integer("quantity", 1, 10))
            .column(ColumnSpec::decimal("unit_price", 5.0, 500.0))
            .references("order_id", "orders")
            .references("product_id", "products"),
        TableSpec::new("reviews")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("product_id"))
            .column(ColumnSpec::reference("customer_id"))
            .column(ColumnSpec::integer("rating", 1, 5))
            .column(ColumnSpec::text("comment", TextKind::Sentence).nullable())
            .column(ColumnSpec::date("review_date"))
            .references("product_id", "products")
            .references("customer_id", "customers"),
    ]
}

pub fn healthcare() -> Vec<TableSpec> {
    vec![
        TableSpec::new("specialties")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("name", TextKind::Word))
            .column(ColumnSpec::text("description", TextKind::Sentence).nullable()),
        TableSpec::new("doctors")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("first_name", TextKind::FirstName))
            .column(ColumnSpec::text("last_name", TextKind::LastName))
            .column(ColumnSpec::reference("specialty_id"))
            .column(ColumnSpec::text("license_number", TextKind::Code))
            .column(ColumnSpec::text("email", TextKind::Email))
            .column(ColumnSpec::text("phone", TextKind::Phone))
            .column(ColumnSpec::date("hire_date"))
            .references("specialty_id", "specialties"),
        TableSpec::new("patients")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("first_name", TextKind::FirstName))
            .column(ColumnSpec::text("last_name", TextKind::LastName))
            .column(ColumnSpec::date("date_of_birth"))
            .column(ColumnSpec::status("gender", &["female", "male", "other"]))
            .column(ColumnSpec::text("phone", TextKind::Phone))
            .column(ColumnSpec::text("email", TextKind::Email).nullable())
            .column(ColumnSpec::text("address", TextKind::StreetAddress))
            .column(ColumnSpec::text("insurance_number", TextKind::AccountNumber).nullable())
            .column(ColumnSpec::text("emergency_contact", TextKind::FullName).nullable()),
        TableSpec::new("appointments")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("patient_id"))
            .column(ColumnSpec::reference("doctor_id").nullable())
            .column(ColumnSpec::timestamp("appointment_date"))
            .column(ColumnSpec::integer("duration_minutes", 15, 120))
            .column(ColumnSpec::status(
                "status",
                &["scheduled", "completed", "cancelled", "no_show"],
            ))
            .column(ColumnSpec::text("notes", TextKind::Sentence).nullable())
            .references("patient_id", "patients")
            .references("doctor_id", "doctors"),
        TableSpec::new("medical_records")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("patient_id"))
            .column(ColumnSpec::reference("appointment_id").nullable())
            .column(ColumnSpec::text("diagnosis", TextKind::Sentence))
            .column(ColumnSpec::text("treatment", TextKind::Sentence))
            .column(ColumnSpec::text("medications", TextKind::Word).nullable())
            .column(ColumnSpec::date("record_date"))
            .references("patient_id", "patients")
            .references("appointment_id", "appointments"),
    ]
}

pub fn technology() -> Vec<TableSpec> {
    vec![
        TableSpec::new("product_categories")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("name", TextKind::Word))
            .column(ColumnSpec::text("description", TextKind::Sentence).nullable()),
        TableSpec::new("products")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("name", TextKind::ProductName))
            .column(ColumnSpec::reference("category_id"))
            .column(ColumnSpec::text("version", TextKind::Code))
            .column(ColumnSpec::decimal("monthly_price", 0.0, 299.0))
            .column(ColumnSpec::boolean("is_active"))
            .column(ColumnSpec::date("launch_date"))
            .references("category_id", "product_categories"),
        TableSpec::new("users")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("username", TextKind::Word))
            .column(ColumnSpec::text("email", TextKind::Email))
            .column(ColumnSpec::text("full_name", TextKind::FullName))
            .column(ColumnSpec::text("company", TextKind::CompanyName).nullable())
            .column(ColumnSpec::status("plan", &["free", "starter", "pro", "enterprise"]))
            .column(ColumnSpec::timestamp("signup_date"))
            .column(ColumnSpec::timestamp("last_login").nullable())
            .not_before("last_login", "signup_date"),
        TableSpec::new("subscriptions")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("user_id"))
            .column(ColumnSpec::status("plan_type", &["monthly", "annual"]))
            .column(ColumnSpec::date("start_date"))
            .column(ColumnSpec::date("end_date").nullable())
            .column(ColumnSpec::decimal("monthly_cost", 0.0, 999.0))
            .column(ColumnSpec::status(
                "status",
                &["active", "trialing", "past_due", "cancelled"],
            ))
            .references("user_id", "users")
            .not_before("end_date", "start_date"),
        TableSpec::new("support_tickets")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("user_id"))
            .column(ColumnSpec::reference("product_id"))
            .column(ColumnSpec::text("subject", TextKind::Sentence))
            .column(ColumnSpec::text("description", TextKind::Paragraph))
            .column(ColumnSpec::status("priority", &["low", "medium", "high", "urgent"]))
            .column(ColumnSpec::status("status", &["open", "in_progress", "resolved", "closed"]))
            .column(ColumnSpec::timestamp("created_at"))
            .references("user_id", "users")
            .references("product_id", "products"),
    ]
}

pub fn finance() -> Vec<TableSpec> {
    vec![
        TableSpec::new("customers")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("first_name", TextKind::FirstName))
            .column(ColumnSpec::text("last_name", TextKind::LastName))
            .column(ColumnSpec::text("email", TextKind::Email))
            .column(ColumnSpec::text("phone", TextKind::Phone))
            .column(ColumnSpec::text("address", TextKind::StreetAddress))
            .column(ColumnSpec::date("date_of_birth"))
            .column(ColumnSpec::integer("credit_score", 300, 850))
            .column(ColumnSpec::decimal("annual_income", 15000.0, 400000.0)),
        TableSpec::new("financial_products")
            .column(ColumnSpec::id())
            .column(ColumnSpec::text("name", TextKind::ProductName))
            .column(ColumnSpec::status(
                "product_type",
                &["checking", "savings", "credit_card", "loan", "investment"],
            ))
            .column(ColumnSpec::decimal("interest_rate", 0.0, 25.0))
            .column(ColumnSpec::decimal("minimum_balance", 0.0, 5000.0))
            .column(ColumnSpec::decimal("annual_fee", 0.0, 500.0)),
        TableSpec::new("accounts")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("customer_id"))
            .column(ColumnSpec::reference("product_id"))
            .column(ColumnSpec::text("account_number", TextKind::AccountNumber))
            .column(ColumnSpec::decimal("balance", 0.0, 250000.0))
            .column(ColumnSpec::date("opened_date"))
            .column(ColumnSpec::status("status", &["active", "frozen", "closed"]))
            .references("customer_id", "customers")
            .references("product_id", "financial_products"),
        TableSpec::new("transactions")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("account_id"))
            .column(ColumnSpec::status(
                "transaction_type",
                &["deposit", "withdrawal", "transfer", "payment", "fee"],
            ))
            .column(ColumnSpec::decimal("amount", 1.0, 10000.0))
            .column(ColumnSpec::text("description", TextKind::Sentence).nullable())
            .column(ColumnSpec::timestamp("transaction_date"))
            .column(ColumnSpec::decimal("balance_after", 0.0, 250000.0))
            .references("account_id", "accounts"),
        TableSpec::new("loans")
            .column(ColumnSpec::id())
            .column(ColumnSpec::reference("customer_id"))
            .column(ColumnSpec::status("loan_type", &["personal", "auto", "mortgage", "business"]))
            .column(ColumnSpec::decimal("principal_amount", 1000.0, 750000.0))
            .column(ColumnSpec::decimal("interest_rate", 2.0, 18.0))
            .column(ColumnSpec::integer("term_months", 12, 360))
            .column(ColumnSpec::date("start_date"))
            .column(ColumnSpec::status("status", &["active", "paid_off", "defaulted"]))
            .references("customer_id", "customers"),
    ]
}
