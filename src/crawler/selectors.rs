//! CSS selectors for the listing source's markup

// Listing page
pub const LISTING_CARD: &str = ".job-card-wrapper";
pub const CARD_TITLE: &str = ".job-title";
pub const CARD_COMPANY: &str = ".company-name";
pub const CARD_LINK: &str = ".job-card-left";
pub const PAGINATION: &str = ".options-pages";
pub const PAGINATION_LINKS: &str = ".options-pages a";
pub const CURRENT_PAGE: &str = ".options-pages .selected";

// Detail page
pub const DETAIL_ROOT: &str = ".job-detail";
pub const DETAIL_TITLE: &str = ".job-detail .name";
pub const DETAIL_SALARY: &str = ".job-detail .salary";
pub const DETAIL_COMPANY: &str = ".company-info .name";
pub const COMPANY_TAGS: &str = ".company-info .tag-list span";
pub const REQUIREMENT_TAGS: &str = ".job-detail .tag-list span";
pub const JOB_TAGS: &str = ".job-tags span";
pub const WORK_ADDRESS: &str = ".location-address";
pub const DESCRIPTION: &str = ".job-detail .job-sec-text";
pub const BENEFIT_TAGS: &str = ".job-tags .tag-list span";
pub const INTERVIEW_ADDRESS: &str = ".interview-description";
