use serde::{Deserialize, Serialize};
use std::fmt;

/// Reserved name of the metadata table the materializer attaches to every
/// store. Catalog entries may not declare a table with this name.
pub const METADATA_TABLE: &str = "_company_metadata";

/// Definition of one table in a domain's catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableSpec {
    pub name: String,
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeySpec>,
    /// Relations between columns of the same row, applied after the row's
    /// values are drawn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rules: Vec<RowRule>,
}

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            rules: Vec::new(),
        }
    }

    /// Append a column (builder style, used by the built-in catalog).
    pub fn column(mut self, column: ColumnSpec) -> Self {
        self.columns.push(column);
        self
    }

    /// Declare that `column` references the primary key `id` of `table`.
    pub fn references(mut self, column: impl Into<String>, table: impl Into<String>) -> Self {
        self.foreign_keys.push(ForeignKeySpec {
            column: column.into(),
            references: table.into(),
            referenced_column: default_referenced_column(),
        });
        self
    }

    /// Keep `column` strictly below `bound` in every row.
    pub fn below(mut self, column: impl Into<String>, bound: impl Into<String>) -> Self {
        self.rules.push(RowRule::Below {
            column: column.into(),
            bound: bound.into(),
        });
        self
    }

    /// Keep `column` at or after `reference` in every row.
    pub fn not_before(mut self, column: impl Into<String>, reference: impl Into<String>) -> Self {
        self.rules.push(RowRule::NotBefore {
            column: column.into(),
            reference: reference.into(),
        });
        self
    }

    pub fn column_spec(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// The table's primary-key column, if one is declared.
    pub fn primary_key(&self) -> Option<&ColumnSpec> {
        self.columns.iter().find(|c| c.is_primary_key())
    }

    /// The foreign key whose child column is `column`, if any.
    pub fn foreign_key_for(&self, column: &str) -> Option<&ForeignKeySpec> {
        self.foreign_keys.iter().find(|fk| fk.column == column)
    }

    /// Names of the tables this table depends on, in declaration order,
    /// without duplicates.
    pub fn parent_tables(&self) -> Vec<&str> {
        let mut parents: Vec<&str> = Vec::new();
        for fk in &self.foreign_keys {
            if !parents.contains(&fk.references.as_str()) {
                parents.push(&fk.references);
            }
        }
        parents
    }
}

/// A relation between two columns of one row.
///
/// ```toml
/// rules = [
///     { rule = "below", column = "cost", bound = "price" },
///     { rule = "not_before", column = "updated_at", reference = "created_at" },
/// ]
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum RowRule {
    /// Numeric `column` < `bound`. Both columns share a numeric type.
    Below { column: String, bound: String },
    /// Temporal `column` >= `reference`. Both columns share a temporal type.
    NotBefore { column: String, reference: String },
}

impl RowRule {
    /// The column the rule adjusts.
    pub fn column(&self) -> &str {
        match self {
            RowRule::Below { column, .. } | RowRule::NotBefore { column, .. } => column,
        }
    }

    /// The column the adjusted value is compared against.
    pub fn other(&self) -> &str {
        match self {
            RowRule::Below { bound, .. } => bound,
            RowRule::NotBefore { reference, .. } => reference,
        }
    }
}

impl fmt::Display for RowRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowRule::Below { column, bound } => write!(f, "{} < {}", column, bound),
            RowRule::NotBefore { column, reference } => write!(f, "{} >= {}", column, reference),
        }
    }
}

/// A single column: name, semantic type, nullability and, for the primary
/// key, its generation strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    #[serde(flatten)]
    pub column_type: ColumnType,
    #[serde(default)]
    pub nullable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub primary_key: Option<KeyStrategy>,
}

impl ColumnSpec {
    /// A non-null column of the given type.
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: false,
            primary_key: None,
        }
    }

    /// The conventional `id` primary key with sequential generation.
    pub fn id() -> Self {
        Self {
            primary_key: Some(KeyStrategy::Sequential),
            ..Self::new("id", ColumnType::Id)
        }
    }

    /// An integer id column meant to hold a foreign key.
    pub fn reference(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Id)
    }

    pub fn text(name: impl Into<String>, kind: TextKind) -> Self {
        Self::new(name, ColumnType::Text { kind })
    }

    pub fn integer(name: impl Into<String>, min: i64, max: i64) -> Self {
        Self::new(name, ColumnType::Integer { min, max })
    }

    pub fn decimal(name: impl Into<String>, min: f64, max: f64) -> Self {
        Self::new(
            name,
            ColumnType::Decimal {
                min,
                max,
                scale: default_scale(),
            },
        )
    }

    pub fn date(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Date)
    }

    pub fn timestamp(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Timestamp)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, ColumnType::Boolean)
    }

    pub fn status(name: impl Into<String>, values: &[&str]) -> Self {
        Self::new(
            name,
            ColumnType::Status {
                values: values.iter().map(|v| v.to_string()).collect(),
            },
        )
    }

    /// Mark the column as nullable.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn is_primary_key(&self) -> bool {
        self.primary_key.is_some()
    }
}

/// How primary-key values are produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyStrategy {
    /// 1, 2, 3, ... in row order.
    Sequential,
}

/// Semantic type of a column. Drives both the SQL type used at table
/// creation and the value generator used during synthesis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ColumnType {
    /// Integer identifier (primary keys and foreign-key columns).
    Id,
    /// Realistic free text of the given flavour.
    Text { kind: TextKind },
    /// Integer in `[min, max]`.
    Integer { min: i64, max: i64 },
    /// Decimal in `[min, max]`, rounded to `scale` fractional digits.
    Decimal {
        min: f64,
        max: f64,
        #[serde(default = "default_scale")]
        scale: u32,
    },
    /// Calendar date inside the run's date window.
    Date,
    /// Date and time inside the run's date window.
    Timestamp,
    Boolean,
    /// One of a fixed set of values.
    Status { values: Vec<String> },
}

impl ColumnType {
    /// SQLite type used in `CREATE TABLE`.
    pub fn sql_type(&self) -> String {
        match self {
            ColumnType::Id | ColumnType::Integer { .. } => "INTEGER".to_string(),
            ColumnType::Text { .. } | ColumnType::Status { .. } => "TEXT".to_string(),
            ColumnType::Decimal { scale, .. } => format!("DECIMAL(12,{})", scale),
            ColumnType::Date => "DATE".to_string(),
            ColumnType::Timestamp => "TIMESTAMP".to_string(),
            ColumnType::Boolean => "BOOLEAN".to_string(),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnType::Id => write!(f, "id"),
            ColumnType::Text { kind } => write!(f, "text({})", kind),
            ColumnType::Integer { min, max } => write!(f, "integer[{}..{}]", min, max),
            ColumnType::Decimal { min, max, scale } => {
                write!(f, "decimal({})[{}..{}]", scale, min, max)
            }
            ColumnType::Date => write!(f, "date"),
            ColumnType::Timestamp => write!(f, "timestamp"),
            ColumnType::Boolean => write!(f, "boolean"),
            ColumnType::Status { values } => write!(f, "status{{{}}}", values.join("|")),
        }
    }
}

/// Flavour of generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextKind {
    FirstName,
    LastName,
    FullName,
    Email,
    Phone,
    StreetAddress,
    City,
    PostalCode,
    Country,
    CompanyName,
    ProductName,
    Word,
    Sentence,
    Paragraph,
    Sku,
    Code,
    TickerSymbol,
    AccountNumber,
    Url,
}

impl fmt::Display for TextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextKind::FirstName => "first_name",
            TextKind::LastName => "last_name",
            TextKind::FullName => "full_name",
            TextKind::Email => "email",
            TextKind::Phone => "phone",
            TextKind::StreetAddress => "street_address",
            TextKind::City => "city",
            TextKind::PostalCode => "postal_code",
            TextKind::Country => "country",
            TextKind::CompanyName => "company_name",
            TextKind::ProductName => "product_name",
            TextKind::Word => "word",
            TextKind::Sentence => "sentence",
            TextKind::Paragraph => "paragraph",
            TextKind::Sku => "sku",
            TextKind::Code => "code",
            TextKind::TickerSymbol => "ticker_symbol",
            TextKind::AccountNumber => "account_number",
            TextKind::Url => "url",
        };
        write!(f, "{}", name)
    }
}

/// A foreign key: `column` of the owning table holds a primary-key value of
/// `references`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeySpec {
    pub column: String,
    pub references: String,
    #[serde(default = "default_referenced_column")]
    pub referenced_column: String,
}

fn default_referenced_column() -> String {
    "id".to_string()
}

fn default_scale() -> u32 {
    2
}
