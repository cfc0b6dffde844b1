pub mod claim;
pub mod claims;
pub mod sections;
pub mod serve;
