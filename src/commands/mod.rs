pub mod analyze;
pub mod assess;
pub mod embed;
pub mod highlight;
pub mod search;
mod shared;
pub mod status;
