pub mod rank;
pub mod replacements;
