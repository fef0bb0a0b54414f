pub mod capture;
pub mod decoder;
pub mod encoder;
pub mod resample;

/// Canonical analysis sample rate. Every frequency constant downstream is
/// expressed relative to this rate.
pub const TARGET_SAMPLE_RATE: u32 = 44_100;
