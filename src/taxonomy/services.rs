//! Service-name registry
//!
//! `SERVICE_ABBREVIATIONS` maps a token to its canonical service name.
//! `EQUIVALENCE_GROUPS` lists spellings that mean the same service; the
//! first member of each group is the canonical name.

pub(super) const SERVICE_ABBREVIATIONS: &[(&str, &str)] = &[
    ("api", "api"),
    ("web", "web"),
    ("auth", "authentication"),
    ("authn", "authentication"),
    ("bi", "business-intelligence"),
    ("cmp", "compute"),
    ("crm", "crm"),
    ("erp", "erp"),
    ("hr", "human-resources"),
    ("fin", "finance"),
    ("mktg", "marketing"),
    ("ops", "operations"),
    ("mon", "monitoring"),
    ("mgmt", "management"),
    ("sec", "security"),
    ("net", "networking"),
    ("etl", "etl"),
    ("ml", "machine-learning"),
    ("iot", "iot"),
    ("pay", "payments"),
    ("pmt", "payments"),
    ("inv", "inventory"),
    ("ord", "orders"),
    ("cust", "customer"),
    ("svc", "service"),
    ("db", "database"),
    ("stg", "storage"),
    ("stor", "storage"),
    ("store", "storage"),
    ("msg", "messaging"),
    ("ident", "identity"),
    ("bkp", "backup"),
    ("dr", "disaster-recovery"),
];

pub(super) const EQUIVALENCE_GROUPS: &[&[&str]] = &[
    &["storage", "stg", "stor", "store"],
    &["database", "db", "data-store"],
    &["authentication", "auth", "authn", "login"],
    &["payments", "pay", "pmt", "payment"],
    &["monitoring", "mon", "monitor"],
    &["management", "mgmt", "mgt"],
    &["networking", "net", "network"],
    &["messaging", "msg", "queue"],
    &["backup", "bkp", "bak"],
    &["operations", "ops"],
];
