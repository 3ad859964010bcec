pub mod answer;
pub mod assessment;
pub mod evaluation;
pub mod question;
