pub mod profile;
pub mod verdict;
