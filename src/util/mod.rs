pub mod currency;
pub mod password;
pub mod random;
