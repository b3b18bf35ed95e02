mod company_attributes;
mod user_profile;

pub use company_attributes::CompanyAttributes;
pub use user_profile::UserProfile;
