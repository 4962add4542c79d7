pub mod icon;
pub mod zip;
