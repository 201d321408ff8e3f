pub mod checkin;
pub mod department;
pub mod employee;
