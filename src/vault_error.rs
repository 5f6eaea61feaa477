use thiserror::Error;

/// Protocol violations reported by singleton slots.
///
/// Every variant carries the type name of the singleton it concerns
/// (e.g. `"my_app::Database"`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SingletonError {
    /// The factory re-entered its own slot before construction finished.
    #[error("Recursive initialization of singleton: {type_name}")]
    RecursiveInitialization { type_name: &'static str },

    /// A second handle with a different factory was declared for the same (type, tag).
    #[error("Duplicated singleton declaration: {type_name}")]
    DuplicatedSingleton { type_name: &'static str },

    /// The slot was already destroyed or is waiting to be destroyed.
    #[error("Singleton used after destruction: {type_name}")]
    UseAfterDestroy { type_name: &'static str },
}

impl SingletonError {
    /// Type name of the singleton the error concerns.
    pub fn type_name(&self) -> &'static str {
        match self {
            SingletonError::RecursiveInitialization { type_name }
            | SingletonError::DuplicatedSingleton { type_name }
            | SingletonError::UseAfterDestroy { type_name } => type_name,
        }
    }
}

/// Result alias used across the crate.
pub type Result<T, E = SingletonError> = std::result::Result<T, E>;
