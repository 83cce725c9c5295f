pub mod hash;
pub mod id_generator;
pub mod url_policy;

pub use id_generator::HashCodeGenerator;
pub use url_policy::UrlPolicy;
