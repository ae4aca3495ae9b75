//! Engine error taxonomy.
//!
//! Structural mismatches are never errors -- they are `MatchResult` data.
//! Everything here aborts the current evaluation: schema defects
//! (unresolved or cyclic references, invalid examples, malformed contract
//! JSON) and configuration faults (missing reference files).

/// All errors the pattern engine can return.
#[derive(Debug, thiserror::Error)]
pub enum PatternError {
    /// A named pattern is missing from the registry.
    #[error("pattern '{name}' is not defined in the contract")]
    UnresolvedReference { name: String },

    /// A lookup chain that never reaches a concrete pattern.
    #[error("pattern '{name}' refers back to itself and never resolves")]
    CyclicReference { name: String },

    /// An example row override that does not match its own pattern.
    #[error("example value for '{key}' does not match the contract: {message}")]
    InvalidExample { key: String, message: String },

    /// A literal could not be parsed into the target type. The
    /// content-match path catches this variant locally and falls back to
    /// raw string comparison.
    #[error("could not parse '{text}' as {type_name}")]
    Parse { text: String, type_name: String },

    /// An exact-file multipart pattern whose backing file is absent.
    #[error("reference file '{path}' does not exist")]
    MissingReferenceFile { path: String },

    /// An I/O failure reading a reference file.
    #[error("error reading reference file '{path}': {message}")]
    FileRead { path: String, message: String },

    /// Contract interchange JSON that does not describe a pattern tree.
    #[error("malformed contract: {message}")]
    MalformedContract { message: String },
}

impl PatternError {
    /// Whether this error is a defect in the contract itself, as opposed
    /// to an environmental or internal fault. Report classification maps
    /// contract defects to `ContractException`.
    pub fn is_contract_defect(&self) -> bool {
        matches!(
            self,
            PatternError::UnresolvedReference { .. }
                | PatternError::CyclicReference { .. }
                | PatternError::InvalidExample { .. }
                | PatternError::MalformedContract { .. }
        )
    }
}
