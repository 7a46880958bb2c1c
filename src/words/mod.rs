pub mod model;
pub mod repository;

pub use model::{ALL_LEVELS, Level, LevelFilter, Word, WordId};
pub use repository::WordRepository;
