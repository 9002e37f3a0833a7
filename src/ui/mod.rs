pub mod catalog;
pub mod chart;
pub mod docs;
pub mod notes;
pub mod panels;
pub mod table;
