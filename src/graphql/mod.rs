pub mod error;
pub mod model;
pub mod mutation;
pub mod mutation_input_structs;
pub mod query;
