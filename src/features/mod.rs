pub mod company_profiles;
pub mod documents;
