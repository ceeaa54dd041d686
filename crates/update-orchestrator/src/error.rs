use thiserror::Error;

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("orchestration for skill at '{skill}' is already in progress")]
    SkillBusy { skill: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Store(#[from] cdc_store::StoreError),

    #[error(transparent)]
    Process(#[from] cdc_core::CdcError),
}

pub type Result<T> = std::result::Result<T, OrchestratorError>;
