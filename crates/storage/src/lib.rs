#![forbid(unsafe_code)]

pub mod http;
pub mod repository;

pub use repository::{
    ExerciseRepository, InMemoryRepository, ModulePage, ModuleRepository, ProgressRepository,
    Storage, StorageError,
};
