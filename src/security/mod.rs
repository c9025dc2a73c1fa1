pub mod fingerprint;
pub mod otp;
pub mod password;
pub mod token;
