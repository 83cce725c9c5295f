mod mapping;

pub use mapping::{CreateMappingDto, CreateMappingResponse, Mapping};
