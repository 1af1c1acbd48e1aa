use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (missing current source, duplicate names, etc.).
    ConfigValidation(String),
    /// Fewer row-sets supplied than the operation requires.
    MissingInput { required: usize, supplied: usize },
    /// A named source has no rows in the pipeline input.
    MissingSource(String),
    /// An identifier with no counterpart record.
    UnresolvedIdentifier(String),
    /// No directory record carries this email.
    UnknownAuthority { email: String },
    /// The resolved manager manages nobody.
    NoManagedEmployees { manager: String },
    /// Edit attempted on an employee outside the active grant.
    NotEditable { employee_id: String },
    /// Edit attempted on a field the employee's record does not list.
    UnknownField { employee_id: String, field: String },
    /// Malformed tabular input (CSV syntax, etc.).
    Io(String),
}

impl fmt::Display for ReconError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::MissingInput { required, supplied } => {
                write!(f, "missing input: {required} row-set(s) required, {supplied} supplied")
            }
            Self::MissingSource(name) => write!(f, "missing input: source '{name}' has no rows"),
            Self::UnresolvedIdentifier(id) => write!(f, "no record for employee '{id}'"),
            Self::UnknownAuthority { email } => {
                write!(f, "manager not found for email '{email}'")
            }
            Self::NoManagedEmployees { manager } => {
                write!(f, "no employees found under manager '{manager}'")
            }
            Self::NotEditable { employee_id } => {
                write!(f, "employee '{employee_id}' is not editable under the current grant")
            }
            Self::UnknownField { employee_id, field } => {
                write!(f, "employee '{employee_id}': no difference on field '{field}'")
            }
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for ReconError {}
