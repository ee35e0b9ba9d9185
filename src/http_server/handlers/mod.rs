pub mod contracts;
pub mod status;
pub mod verification;
pub mod version_list;
