use thiserror::Error;

#[derive(Error, Debug)]
pub enum PKError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid model configuration: {0}")]
    InvalidModel(String),

    #[error("Parameter validation error: {0}")]
    Validation(String),

    #[error("Integration error: {0}")]
    Integration(String),
}

impl PKError {
    /// A value of the right kind that falls outside its allowed domain.
    pub fn is_range_violation(&self) -> bool {
        matches!(self, PKError::Validation(_))
    }

    /// A value of the wrong kind, e.g. a string where a rate was expected.
    pub fn is_type_violation(&self) -> bool {
        matches!(self, PKError::Json(e) if e.is_data())
    }
}

pub type PKResult<T> = Result<T, PKError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_classification() {
        let range = PKError::Validation("run_time must be positive".to_string());
        assert!(range.is_range_violation());
        assert!(!range.is_type_violation());

        let json_err = serde_json::from_str::<f64>("\"1\"").unwrap_err();
        let wrong_kind = PKError::from(json_err);
        assert!(wrong_kind.is_type_violation());
        assert!(!wrong_kind.is_range_violation());
    }
}
