use thiserror::Error;

#[derive(Error, Debug)]
pub enum SlaError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Unknown priority '{priority}' on ticket {ticket_id}: no SLA tier configured")]
    Configuration { ticket_id: String, priority: String },

    #[error("Invalid capacity '{value}': must be a positive integer or \"All\"")]
    InvalidCapacity { value: String },

    #[error("Missing column '{column}': required by the capacity simulator")]
    MissingColumn { column: String },

    #[error("Invalid breach probability {value} on ticket {ticket_id}: must be within [0, 1]")]
    InvalidProbability { ticket_id: String, value: f64 },

    #[error("Invalid intervention cost {value}: must be a non-negative amount")]
    InvalidInterventionCost { value: f64 },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type SlaResult<T> = Result<T, SlaError>;
