pub mod csv;
pub mod report;
pub mod row;
pub mod table;
