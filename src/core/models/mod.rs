pub mod audit;
pub mod expense;
pub mod participant;
pub mod settlement;
pub mod spending;
pub mod trip;
