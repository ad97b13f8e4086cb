pub mod email_service;
pub mod pdf_generator_service;
pub mod report_analysis_service;
pub mod report_service;
pub mod scheduler_service;
pub mod valuation_service;
