pub mod attempt;
pub mod audit;
pub mod department;
pub mod event_type;
pub mod incident;
pub mod user;
