pub mod cleaner;
pub mod district;
pub mod location;
